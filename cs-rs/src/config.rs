//! `.cipherscriptrc` configuration file parser.
//!
//! The file is a list of `key = value` lines:
//!
//! | Key | Value |
//! |-----|-------|
//! | `max_call_depth` | maximum nested function calls (≥ 1, default 256) |
//! | `cipher_key` | 16-byte key for `@ENC` variables |
//! | `cipher_iv` | 16-byte IV for `@ENC` variables |
//! | `log` | default tracing filter, e.g. `debug` or `cipherscript=trace` |
//! | `echo_prompt` | whether `input` shows its prompt (`true` / `false`) |
//!
//! Lines starting with `#` or `;` are comments.  Values may be wrapped in
//! double quotes.  Unknown keys are skipped so newer files load on older
//! builds.  Environment variables (`CIPHERSCRIPT_MAX_DEPTH`,
//! `CIPHERSCRIPT_KEY`, `CIPHERSCRIPT_IV`) override the file.

use std::path::Path;

use thiserror::Error;

use crate::script::cipher::{AesCbcCipher, LEGACY_IV, LEGACY_KEY};
use crate::script::interp::DEFAULT_MAX_CALL_DEPTH;

// ── Public API ────────────────────────────────────────────────────────────────

/// A non-fatal problem found while loading configuration.  The offending
/// setting keeps its previous value.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    #[error("line {line}: {message}")]
    Line { line: usize, message: String },
    #[error("{var}: {message}")]
    Env { var: &'static str, message: String },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub max_call_depth: usize,
    pub cipher_key: [u8; 16],
    pub cipher_iv: [u8; 16],
    /// Tracing filter used when neither `CIPHERSCRIPT_LOG` nor `RUST_LOG`
    /// is set.
    pub log: Option<String>,
    pub echo_prompt: bool,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            max_call_depth: DEFAULT_MAX_CALL_DEPTH,
            cipher_key: *LEGACY_KEY,
            cipher_iv: *LEGACY_IV,
            log: None,
            echo_prompt: true,
        }
    }
}

impl Config {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse a config string.
    ///
    /// Returns the config and a list of errors on recognised lines.
    pub fn load_str(s: &str) -> (Self, Vec<ConfigError>) {
        let mut config = Config::new();
        let mut errors = Vec::new();

        for (i, raw) in s.lines().enumerate() {
            let lineno = i + 1;
            let line = raw.trim();

            if line.is_empty() || line.starts_with('#') || line.starts_with(';') {
                continue;
            }

            let Some((key, value)) = line.split_once('=') else {
                errors.push(ConfigError::Line {
                    line: lineno,
                    message: format!("expected `key = value`, found {line:?}"),
                });
                continue;
            };
            let key = key.trim();
            let value = unquote(value.trim());

            if let Err(message) = config.set(key, value) {
                errors.push(ConfigError::Line { line: lineno, message });
            }
        }

        (config, errors)
    }

    /// Read and parse a config file from disk.
    pub fn load_file(path: &Path) -> std::io::Result<(Self, Vec<ConfigError>)> {
        let s = std::fs::read_to_string(path)?;
        Ok(Self::load_str(&s))
    }

    /// Apply `CIPHERSCRIPT_*` overrides from the process environment.
    pub fn apply_env(&mut self) -> Vec<ConfigError> {
        self.apply_overrides(|var| std::env::var(var).ok())
    }

    /// Apply overrides from `lookup` (an environment stand-in).
    pub fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) -> Vec<ConfigError> {
        const OVERRIDES: [(&str, &str); 3] = [
            ("CIPHERSCRIPT_MAX_DEPTH", "max_call_depth"),
            ("CIPHERSCRIPT_KEY", "cipher_key"),
            ("CIPHERSCRIPT_IV", "cipher_iv"),
        ];
        let mut errors = Vec::new();
        for (var, key) in OVERRIDES {
            if let Some(value) = lookup(var) {
                if let Err(message) = self.set(key, &value) {
                    errors.push(ConfigError::Env { var, message });
                }
            }
        }
        errors
    }

    /// The cipher for `@ENC` variables.
    pub fn cipher(&self) -> AesCbcCipher {
        AesCbcCipher::new(self.cipher_key, self.cipher_iv)
    }

    /// Set one recognised key.  Unknown keys are accepted and ignored.
    fn set(&mut self, key: &str, value: &str) -> Result<(), String> {
        match key {
            "max_call_depth" => {
                self.max_call_depth = match value.parse::<usize>() {
                    Ok(n) if n >= 1 => n,
                    _ => return Err(format!("max_call_depth must be a positive integer, got {value:?}")),
                };
            }
            "cipher_key" => self.cipher_key = block(key, value)?,
            "cipher_iv" => self.cipher_iv = block(key, value)?,
            "log" => self.log = Some(value.to_owned()).filter(|s| !s.is_empty()),
            "echo_prompt" => self.echo_prompt = parse_bool(value)
                .ok_or_else(|| format!("echo_prompt must be true or false, got {value:?}"))?,
            _ => {}
        }
        Ok(())
    }
}

// ── Value helpers ─────────────────────────────────────────────────────────────

fn unquote(s: &str) -> &str {
    s.strip_prefix('"')
        .and_then(|rest| rest.strip_suffix('"'))
        .unwrap_or(s)
}

fn block(key: &str, value: &str) -> Result<[u8; 16], String> {
    value
        .as_bytes()
        .try_into()
        .map_err(|_| format!("{key} must be exactly 16 bytes, got {}", value.len()))
}

fn parse_bool(s: &str) -> Option<bool> {
    match s.to_ascii_lowercase().as_str() {
        "true" | "on" | "yes" | "1" => Some(true),
        "false" | "off" | "no" | "0" => Some(false),
        _ => None,
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::script::cipher::Cipher;

    #[test]
    fn empty_config_is_default() {
        let (cfg, errs) = Config::load_str("");
        assert!(errs.is_empty());
        assert_eq!(cfg, Config::default());
        assert_eq!(cfg.max_call_depth, 256);
        assert!(cfg.echo_prompt);
    }

    #[test]
    fn comments_and_blank_lines_are_skipped() {
        let (cfg, errs) = Config::load_str("# comment\n\n; another\n   \n");
        assert!(errs.is_empty());
        assert_eq!(cfg, Config::default());
    }

    #[test]
    fn recognised_keys() {
        let src = "max_call_depth = 64\n\
                   cipher_key = \"ABCDEFGHIJKLMNOP\"\n\
                   cipher_iv=0000000000000000\n\
                   log = cipherscript=debug\n\
                   echo_prompt = off\n";
        let (cfg, errs) = Config::load_str(src);
        assert!(errs.is_empty(), "{errs:?}");
        assert_eq!(cfg.max_call_depth, 64);
        assert_eq!(&cfg.cipher_key, b"ABCDEFGHIJKLMNOP");
        assert_eq!(&cfg.cipher_iv, b"0000000000000000");
        assert_eq!(cfg.log.as_deref(), Some("cipherscript=debug"));
        assert!(!cfg.echo_prompt);
    }

    #[test]
    fn unknown_keys_are_ignored() {
        let (cfg, errs) = Config::load_str("colour = blue\n");
        assert!(errs.is_empty());
        assert_eq!(cfg, Config::default());
    }

    #[test]
    fn bad_lines_report_line_numbers_and_keep_defaults() {
        let src = "# header\nmax_call_depth = 0\ncipher_key = short\nnonsense\necho_prompt = maybe\n";
        let (cfg, errs) = Config::load_str(src);
        let lines: Vec<usize> = errs
            .iter()
            .map(|e| match e {
                ConfigError::Line { line, .. } => *line,
                ConfigError::Env { .. } => 0,
            })
            .collect();
        assert_eq!(lines, vec![2, 3, 4, 5]);
        assert_eq!(cfg, Config::default());
        assert!(errs[1].to_string().starts_with("line 3: cipher_key must be exactly 16 bytes"));
    }

    #[test]
    fn env_overrides_win() {
        let (mut cfg, _) = Config::load_str("max_call_depth = 10\n");
        let errs = cfg.apply_overrides(|var| match var {
            "CIPHERSCRIPT_MAX_DEPTH" => Some("20".into()),
            "CIPHERSCRIPT_IV" => Some("too long for an iv".into()),
            _ => None,
        });
        assert_eq!(cfg.max_call_depth, 20);
        assert_eq!(cfg.cipher_iv, *LEGACY_IV);
        assert_eq!(errs.len(), 1);
        assert!(matches!(errs[0], ConfigError::Env { var: "CIPHERSCRIPT_IV", .. }));
    }

    #[test]
    fn configured_cipher_round_trips() {
        let (cfg, _) = Config::load_str("cipher_key = fedcba9876543210\n");
        let cipher = cfg.cipher();
        let ct = cipher.encrypt("secret").unwrap();
        assert_eq!(cipher.decrypt(&ct).unwrap(), "secret");
        assert_ne!(ct, AesCbcCipher::default().encrypt("secret").unwrap());
    }

    #[test]
    fn load_file_reads_from_disk() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("rc");
        std::fs::write(&path, "max_call_depth = 7\n").unwrap();
        let (cfg, errs) = Config::load_file(&path).unwrap();
        assert!(errs.is_empty());
        assert_eq!(cfg.max_call_depth, 7);
        assert!(Config::load_file(&dir.path().join("missing")).is_err());
    }
}
