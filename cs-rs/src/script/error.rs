//! Error taxonomy for lexing, parsing and evaluation.
//!
//! Every failure aborts the current top-level execution; there is no
//! recovery construct in the language, so these types only travel outward.

use thiserror::Error;

use super::cipher::CipherError;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LexErrorKind {
    #[error("unexpected character '{0}'")]
    UnexpectedChar(char),
    #[error("unterminated string literal")]
    UnterminatedString,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("lex error at {line}:{column}: {kind}")]
pub struct LexError {
    pub line: usize,
    pub column: usize,
    pub kind: LexErrorKind,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseError {
    #[error("parse error at {line}:{column}: expected {expected}, found {found}")]
    Unexpected { line: usize, column: usize, expected: String, found: String },
    #[error("parse error at {line}:{column}: invalid assignment target")]
    InvalidAssignmentTarget { line: usize, column: usize },
    #[error("parse error at {line}:{column}: invalid number literal '{lexeme}'")]
    InvalidNumber { line: usize, column: usize, lexeme: String },
    #[error("parse error at {line}:{column}: nesting exceeds maximum of {max} levels")]
    TooDeep { line: usize, column: usize, max: usize },
}

impl ParseError {
    /// Source position of the offending token.
    pub fn position(&self) -> (usize, usize) {
        match self {
            ParseError::Unexpected { line, column, .. }
            | ParseError::InvalidAssignmentTarget { line, column }
            | ParseError::InvalidNumber { line, column, .. }
            | ParseError::TooDeep { line, column, .. } => (*line, *column),
        }
    }
}

#[derive(Debug, Error)]
pub enum RuntimeError {
    #[error("undefined variable: {0}")]
    UndefinedVariable(String),
    #[error("undefined function: {0}")]
    UndefinedFunction(String),
    #[error("function {name} expects {expected} arguments but got {found}")]
    ArityMismatch { name: String, expected: usize, found: usize },
    #[error("division by zero")]
    DivisionByZero,
    #[error("index {index} out of range (length {len})")]
    IndexOutOfRange { index: i64, len: usize },
    #[error("unsupported operator '{op}' for {operands}")]
    UnsupportedOperator { op: &'static str, operands: String },
    #[error("type mismatch: {0}")]
    TypeMismatch(String),
    #[error("encryption failed: {0}")]
    Encryption(#[source] CipherError),
    #[error("decryption failed: {0}")]
    Decryption(#[source] CipherError),
    #[error("invalid schedule parameters: {0}")]
    InvalidScheduleParameters(String),
    #[error("unknown library: {0}")]
    UnknownLibrary(String),
    #[error("unknown method '{method}' on {target}")]
    UnknownMethod { target: String, method: String },
    #[error("return statement outside of function")]
    ReturnOutsideFunction,
    #[error("call stack overflow: depth {depth} exceeds maximum of {max}")]
    StackOverflow { depth: usize, max: usize },
    #[error("input failed: {0}")]
    Input(String),
    /// Not a failure: a counted scheduled task made its last run while the
    /// main program was still executing, and the run stops here.
    #[error("halted by scheduled task {task_id}")]
    Halted { task_id: u32 },
}

/// Any failure from source text through execution.
#[derive(Debug, Error)]
pub enum Error {
    #[error(transparent)]
    Lex(#[from] LexError),
    #[error(transparent)]
    Parse(#[from] ParseError),
    #[error(transparent)]
    Runtime(#[from] RuntimeError),
}
