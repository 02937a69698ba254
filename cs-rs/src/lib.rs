//! CipherScript: a small scripting language with encrypted variables and
//! timed event triggers.
//!
//! The [`script`] module holds the language itself; [`runtime::Runtime`]
//! drives a program and its scheduled tasks on a single tokio task.

pub mod cli;
pub mod config;
pub mod console;
pub mod runtime;
pub mod scheduler;
pub mod script;

pub use runtime::{RunOutcome, Runtime};
pub use script::{Error, Interpreter, Value};
