//! The CipherScript language.
//!
//! Source text goes through [`lexer::tokenize`], [`parser::parse`] and then
//! the tree-walking [`Interpreter`].  Variables whose names carry the
//! `@ENC` marker are stored encrypted by a pluggable [`cipher::Cipher`];
//! `use` binds builtin objects from a [`library::LibraryRegistry`].
//!
//! # Quick start
//!
//! ```rust
//! use cipherscript::console::BufferConsole;
//! use cipherscript::script::Interpreter;
//!
//! let console = BufferConsole::new();
//! let mut interp = Interpreter::new(Box::new(console.clone()));
//! interp.exec_source("x = 6; print -> x * 7;").unwrap();
//! assert_eq!(console.output(), vec!["42"]);
//! ```

pub mod ast;
pub mod cipher;
pub mod error;
pub mod interp;
pub mod lexer;
pub mod library;
pub mod parser;
pub mod token;
pub mod value;

// Re-exports for convenience.
pub use error::{Error, LexError, ParseError, RuntimeError};
pub use interp::Interpreter;
pub use lexer::tokenize;
pub use parser::{parse, parse_program};
pub use value::Value;
