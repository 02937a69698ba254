use std::io::Read;
use std::process;

use tracing::{debug, warn};
use tracing_subscriber::{fmt, EnvFilter};

use cipherscript::cli::{self, ConfigFile, ScriptSource};
use cipherscript::config::Config;
use cipherscript::console::StdConsole;
use cipherscript::{Interpreter, RunOutcome, Runtime};

#[tokio::main(flavor = "current_thread")]
async fn main() {
    let args = match cli::parse_args() {
        Ok(a) => a,
        Err(e) => {
            eprintln!("cipherscript: {e}");
            eprintln!("{}", cli::USAGE);
            process::exit(2);
        }
    };
    if args.help {
        println!("{}", cli::USAGE);
        return;
    }

    // ── Configuration ─────────────────────────────────────────────────────────
    let (mut config, mut config_errors) = match &args.config {
        ConfigFile::Skip => (Config::default(), Vec::new()),
        ConfigFile::Explicit(path) => match Config::load_file(path) {
            Ok(loaded) => loaded,
            Err(e) => {
                eprintln!("cipherscript: {}: {e}", path.display());
                process::exit(1);
            }
        },
        ConfigFile::Search => cli::find_user_config()
            .and_then(|path| Config::load_file(&path).ok())
            .unwrap_or_default(),
    };
    config_errors.extend(config.apply_env());

    init_tracing(&config, args.debug);
    for e in &config_errors {
        warn!("config: {e}");
    }

    // ── Program text ──────────────────────────────────────────────────────────
    let source = match (&args.command, &args.script) {
        (Some(src), _) => src.clone(),
        (None, ScriptSource::File(path)) => match std::fs::read_to_string(path) {
            Ok(s) => s,
            Err(e) => {
                eprintln!("cipherscript: {}: {e}", path.display());
                process::exit(1);
            }
        },
        (None, ScriptSource::Stdin) => {
            let mut s = String::new();
            if let Err(e) = std::io::stdin().read_to_string(&mut s) {
                eprintln!("cipherscript: reading stdin: {e}");
                process::exit(1);
            }
            s
        }
    };

    // ── Run ───────────────────────────────────────────────────────────────────
    let console = StdConsole::new(config.echo_prompt);
    let interp = Interpreter::with_config(&config, Box::new(console));
    let mut runtime = Runtime::new(interp);

    match runtime.run_source(&source).await {
        Ok(RunOutcome::Completed) => {}
        Ok(RunOutcome::Halted) => {
            debug!("exiting after final scheduled run");
            process::exit(0);
        }
        Err(e) => {
            eprintln!("cipherscript: {e}");
            process::exit(1);
        }
    }
}

/// Log filter precedence: `-d`, `CIPHERSCRIPT_LOG`, `RUST_LOG`, the config
/// file's `log` key, then `warn`.
fn init_tracing(config: &Config, debug: bool) {
    let directive = if debug {
        Some("debug".to_owned())
    } else {
        std::env::var("CIPHERSCRIPT_LOG")
            .or_else(|_| std::env::var("RUST_LOG"))
            .ok()
            .or_else(|| config.log.clone())
    };
    let filter = directive
        .and_then(|d| EnvFilter::try_new(d).ok())
        .unwrap_or_else(|| EnvFilter::new("warn"));

    fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}
