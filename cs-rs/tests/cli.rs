/// Binary tests: run scripts through the built `cipherscript` executable and
/// check stdout, stderr and the exit status.
///
/// Scripts are passed as temp files, via `-c`, or piped on stdin.  A bare
/// `-f` (followed by `--` or another flag) skips any user config so the
/// developer's `~/.cipherscriptrc` cannot leak into the results.

use std::io::Write;
use std::path::PathBuf;
use std::process::{Command, Output, Stdio};

// ── Helpers ───────────────────────────────────────────────────────────────────

fn binary() -> PathBuf {
    PathBuf::from(env!("CARGO_BIN_EXE_cipherscript"))
}

fn command() -> Command {
    let mut cmd = Command::new(binary());
    cmd.env_remove("CIPHERSCRIPT_LOG")
        .env_remove("RUST_LOG")
        .env_remove("CIPHERSCRIPT_KEY")
        .env_remove("CIPHERSCRIPT_IV")
        .env_remove("CIPHERSCRIPT_MAX_DEPTH");
    cmd
}

fn run_file(script: &str, extra: &[&str]) -> Output {
    let mut file = tempfile::NamedTempFile::new().expect("temp file");
    file.write_all(script.as_bytes()).expect("write script");
    command()
        .args(extra)
        .args(["-f", "--"])
        .arg(file.path())
        .output()
        .expect("failed to run cipherscript")
}

fn run_stdin(script: &str, input_lines: &str) -> Output {
    let mut child = command()
        .arg("-f")
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .expect("failed to spawn cipherscript");
    {
        let stdin = child.stdin.as_mut().expect("stdin not open");
        stdin.write_all(script.as_bytes()).expect("write to stdin");
        stdin.write_all(input_lines.as_bytes()).expect("write to stdin");
    }
    child.wait_with_output().expect("wait failed")
}

fn stdout_lines(out: &Output) -> Vec<String> {
    String::from_utf8_lossy(&out.stdout).lines().map(str::to_owned).collect()
}

fn stderr(out: &Output) -> String {
    String::from_utf8_lossy(&out.stderr).into_owned()
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[test]
fn runs_a_script_file() {
    let out = run_file("x = 6;\nprint -> x * 7;\nprint -> \"done\";\n", &[]);
    assert!(out.status.success(), "stderr: {}", stderr(&out));
    assert_eq!(stdout_lines(&out), vec!["42", "done"]);
}

#[test]
fn runs_inline_source() {
    let out = command()
        .args(["-f", "-c", "print -> 1 + 2;"])
        .output()
        .expect("run");
    assert!(out.status.success());
    assert_eq!(stdout_lines(&out), vec!["3"]);
}

#[test]
fn reads_program_from_stdin() {
    let out = run_stdin("print -> \"from stdin\";\n", "");
    assert!(out.status.success(), "stderr: {}", stderr(&out));
    assert_eq!(stdout_lines(&out), vec!["from stdin"]);
}

#[test]
fn runtime_error_exits_nonzero_after_partial_output() {
    let out = run_file("print -> 1;\nx = 1 / 0;\nprint -> 2;\n", &[]);
    assert_eq!(out.status.code(), Some(1));
    assert_eq!(stdout_lines(&out), vec!["1"]);
    assert!(stderr(&out).contains("cipherscript: division by zero"), "{}", stderr(&out));
}

#[test]
fn parse_error_reports_position() {
    let out = run_file("print -> 1;\nprint -> ;\n", &[]);
    assert_eq!(out.status.code(), Some(1));
    assert!(stdout_lines(&out).is_empty());
    assert!(stderr(&out).contains("parse error at 2:"), "{}", stderr(&out));
}

#[test]
fn deeply_nested_source_is_rejected() {
    let src = format!("x = {}1{};\nprint -> x;\n", "(".repeat(20_000), ")".repeat(20_000));
    let out = run_file(&src, &[]);
    assert_eq!(out.status.code(), Some(1));
    assert!(stdout_lines(&out).is_empty());
    assert!(stderr(&out).contains("nesting exceeds maximum"), "{}", stderr(&out));
}

#[test]
fn unbounded_recursion_reports_overflow_at_default_depth() {
    let out = run_file("function f() { return f(); };\nf();\n", &[]);
    assert_eq!(out.status.code(), Some(1));
    assert!(stderr(&out).contains("maximum of 256"), "{}", stderr(&out));
}

#[test]
fn counted_trigger_exits_zero() {
    let out = run_file(
        "@EVENT_TRIGGER(0.05 seconds, 3) -> print -> \"tick\";\nprint -> \"armed\";\n",
        &[],
    );
    assert!(out.status.success(), "stderr: {}", stderr(&out));
    assert_eq!(stdout_lines(&out), vec!["armed", "tick", "tick", "tick"]);
}

#[test]
fn encrypted_variable_prints_ciphertext() {
    let out = run_file("@ENCpin = 1234;\nprint -> pin;\nprint -> pin == 1234;\ny = pin + 1;\nprint -> y;\n", &[]);
    assert!(out.status.success());
    let lines = stdout_lines(&out);
    assert_eq!(lines.len(), 3);
    assert_ne!(lines[0], "1234");
    assert_eq!(lines[2], "1235");
}

#[test]
fn config_file_changes_cipher_and_depth() {
    let mut rc = tempfile::NamedTempFile::new().expect("temp rc");
    writeln!(rc, "cipher_key = ABCDEFGHIJKLMNOP\nmax_call_depth = 5").expect("write rc");
    let mut script = tempfile::NamedTempFile::new().expect("temp script");
    write!(script, "@ENCx = 1; print -> x;").expect("write script");

    let default = command()
        .args(["-f", "--"])
        .arg(script.path())
        .output()
        .expect("run");
    let custom = command()
        .arg("-f")
        .arg(rc.path())
        .arg(script.path())
        .output()
        .expect("run");
    assert!(custom.status.success(), "stderr: {}", stderr(&custom));
    assert_ne!(stdout_lines(&default), stdout_lines(&custom));

    let deep = command()
        .arg("-f")
        .arg(rc.path())
        .args(["-c", "function f() { return f(); }; f();"])
        .output()
        .expect("run");
    assert_eq!(deep.status.code(), Some(1));
    assert!(stderr(&deep).contains("maximum of 5"), "{}", stderr(&deep));
}

#[test]
fn bad_arguments_print_usage() {
    let out = command().arg("-z").output().expect("run");
    assert_eq!(out.status.code(), Some(2));
    let err = stderr(&out);
    assert!(err.contains("unknown option: -z"));
    assert!(err.contains("usage: cipherscript"));
}

#[test]
fn missing_script_file_fails() {
    let out = command()
        .args(["-f", "--", "/definitely/not/here.cs"])
        .output()
        .expect("run");
    assert_eq!(out.status.code(), Some(1));
}

#[test]
fn debug_flag_logs_to_stderr_only() {
    let out = run_file("function f() { return 1; };\nprint -> f();\n", &["-d"]);
    assert!(out.status.success());
    assert_eq!(stdout_lines(&out), vec!["1"]);
    assert!(stderr(&out).contains("DEBUG"), "{}", stderr(&out));
}
