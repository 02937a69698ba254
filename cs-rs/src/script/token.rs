//! Token types produced by the [lexer](super::lexer).

use std::fmt;

/// Lexeme prefix marking a reference to an encrypted variable.
pub const ENC_MARKER: &str = "@ENC";

/// Lexeme prefix that introduces an event-trigger statement.
pub const EVENT_TRIGGER_MARKER: &str = "@EVENT_TRIGGER";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenKind {
    // Literals
    Number,
    Str,
    Ident,
    True,
    False,

    // Keywords
    Print,
    If,
    Else,
    For,
    To,
    Input,
    While,
    Function,
    Return,
    Use,
    EventTrigger,

    // Operators
    Plus,
    Minus,
    Star,
    Slash,
    Percent,
    Bang,
    Dot,
    Assign,      // =
    PlusAssign,  // +=
    MinusAssign, // -=
    StarAssign,  // *=
    SlashAssign, // /=
    PlusPlus,    // ++
    MinusMinus,  // --
    Arrow,       // ->
    Eq,          // ==
    Ne,          // !=
    Lt,
    Le,
    Gt,
    Ge,
    And, // &&
    Or,  // ||

    // Punctuation
    Comma,
    Semicolon,
    LParen,
    RParen,
    LBrace,
    RBrace,
    LBracket,
    RBracket,

    Eof,
}

impl TokenKind {
    /// Map identifier text (marker prefix already removed) to a keyword.
    pub fn keyword(word: &str) -> Option<TokenKind> {
        Some(match word {
            "print" => TokenKind::Print,
            "if" => TokenKind::If,
            "else" => TokenKind::Else,
            "for" => TokenKind::For,
            "to" => TokenKind::To,
            "input" => TokenKind::Input,
            "while" => TokenKind::While,
            "function" => TokenKind::Function,
            "return" => TokenKind::Return,
            "true" => TokenKind::True,
            "false" => TokenKind::False,
            "use" => TokenKind::Use,
            _ => return None,
        })
    }
}

/// A single lexeme with its source position (1-based line and column).
#[derive(Debug, Clone, PartialEq)]
pub struct Token {
    pub kind: TokenKind,
    pub lexeme: String,
    pub line: usize,
    pub column: usize,
}

impl Token {
    pub fn new(kind: TokenKind, lexeme: impl Into<String>, line: usize, column: usize) -> Self {
        Token { kind, lexeme: lexeme.into(), line, column }
    }

    pub fn is_eof(&self) -> bool {
        self.kind == TokenKind::Eof
    }
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.kind {
            TokenKind::Eof => write!(f, "end of input"),
            TokenKind::Str => write!(f, "\"{}\"", self.lexeme),
            _ => write!(f, "'{}'", self.lexeme),
        }
    }
}
