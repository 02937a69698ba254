//! Source text → token stream.
//!
//! Single pass with one character of lookahead.  Whitespace and `//` line
//! comments are skipped; every other unrecognised character is an error.
//! Identifier markers (`@ENC…`, `@EVENT_TRIGGER…`) stay in the lexeme and are
//! interpreted by the parser.

use super::error::{LexError, LexErrorKind};
use super::token::{Token, TokenKind, ENC_MARKER, EVENT_TRIGGER_MARKER};

struct Lexer {
    src: Vec<char>,
    pos: usize,
    line: usize,
    column: usize,
}

impl Lexer {
    fn new(src: &str) -> Self {
        Lexer { src: src.chars().collect(), pos: 0, line: 1, column: 1 }
    }

    fn peek(&self) -> Option<char> {
        self.src.get(self.pos).copied()
    }

    fn peek2(&self) -> Option<char> {
        self.src.get(self.pos + 1).copied()
    }

    fn advance(&mut self) -> Option<char> {
        let ch = self.src.get(self.pos).copied()?;
        self.pos += 1;
        if ch == '\n' {
            self.line += 1;
            self.column = 1;
        } else {
            self.column += 1;
        }
        Some(ch)
    }

    fn eat(&mut self, ch: char) -> bool {
        if self.peek() == Some(ch) {
            self.advance();
            true
        } else {
            false
        }
    }

    fn skip_ws_and_comments(&mut self) {
        loop {
            match self.peek() {
                Some(c) if c.is_whitespace() => {
                    self.advance();
                }
                Some('/') if self.peek2() == Some('/') => {
                    while !matches!(self.peek(), None | Some('\n')) {
                        self.advance();
                    }
                }
                _ => break,
            }
        }
    }

    fn read_number(&mut self, first: char) -> String {
        let mut s = String::new();
        s.push(first);
        let mut seen_dot = false;
        while let Some(c) = self.peek() {
            if c == '.' {
                if seen_dot {
                    break;
                }
                seen_dot = true;
            } else if !c.is_ascii_digit() {
                break;
            }
            s.push(c);
            self.advance();
        }
        s
    }

    fn read_string(&mut self, line: usize, column: usize) -> Result<String, LexError> {
        let mut s = String::new();
        loop {
            match self.advance() {
                None => {
                    return Err(LexError { line, column, kind: LexErrorKind::UnterminatedString });
                }
                Some('"') => return Ok(s),
                Some('\\') => match self.advance() {
                    Some('n') => s.push('\n'),
                    Some('t') => s.push('\t'),
                    Some(c) => s.push(c),
                    None => {
                        return Err(LexError {
                            line,
                            column,
                            kind: LexErrorKind::UnterminatedString,
                        });
                    }
                },
                Some(c) => s.push(c),
            }
        }
    }

    fn read_word(&mut self, first: char) -> String {
        let mut s = String::new();
        s.push(first);
        while let Some(c) = self.peek() {
            if !is_ident_continue(c) {
                break;
            }
            s.push(c);
            self.advance();
        }
        s
    }

    fn word_kind(word: &str) -> TokenKind {
        if word.starts_with(EVENT_TRIGGER_MARKER) {
            return TokenKind::EventTrigger;
        }
        let bare = word.strip_prefix(ENC_MARKER).unwrap_or(word);
        TokenKind::keyword(bare).unwrap_or(TokenKind::Ident)
    }

    fn next_token(&mut self) -> Result<Token, LexError> {
        use TokenKind as K;

        self.skip_ws_and_comments();
        let (line, column) = (self.line, self.column);
        let tok = |kind: K, lexeme: &str| -> Result<Token, LexError> {
            Ok(Token::new(kind, lexeme, line, column))
        };

        let ch = match self.advance() {
            None => return tok(K::Eof, ""),
            Some(c) => c,
        };

        match ch {
            c if c.is_ascii_digit() => {
                let lexeme = self.read_number(c);
                tok(K::Number, &lexeme)
            }
            '"' => {
                let s = self.read_string(line, column)?;
                tok(K::Str, &s)
            }
            c if is_ident_start(c) => {
                let word = self.read_word(c);
                tok(Self::word_kind(&word), &word)
            }
            '@' if self.peek().is_some_and(char::is_alphabetic) => {
                let word = self.read_word('@');
                tok(Self::word_kind(&word), &word)
            }
            '+' => {
                if self.eat('+') {
                    tok(K::PlusPlus, "++")
                } else if self.eat('=') {
                    tok(K::PlusAssign, "+=")
                } else {
                    tok(K::Plus, "+")
                }
            }
            '-' => {
                if self.eat('-') {
                    tok(K::MinusMinus, "--")
                } else if self.eat('=') {
                    tok(K::MinusAssign, "-=")
                } else if self.eat('>') {
                    tok(K::Arrow, "->")
                } else {
                    tok(K::Minus, "-")
                }
            }
            '*' => {
                if self.eat('=') {
                    tok(K::StarAssign, "*=")
                } else {
                    tok(K::Star, "*")
                }
            }
            '/' => {
                if self.eat('=') {
                    tok(K::SlashAssign, "/=")
                } else {
                    tok(K::Slash, "/")
                }
            }
            '%' => tok(K::Percent, "%"),
            '=' => {
                if self.eat('=') {
                    tok(K::Eq, "==")
                } else {
                    tok(K::Assign, "=")
                }
            }
            '!' => {
                if self.eat('=') {
                    tok(K::Ne, "!=")
                } else {
                    tok(K::Bang, "!")
                }
            }
            '<' => {
                if self.eat('=') {
                    tok(K::Le, "<=")
                } else {
                    tok(K::Lt, "<")
                }
            }
            '>' => {
                if self.eat('=') {
                    tok(K::Ge, ">=")
                } else {
                    tok(K::Gt, ">")
                }
            }
            '&' if self.eat('&') => tok(K::And, "&&"),
            '|' if self.eat('|') => tok(K::Or, "||"),
            '.' => tok(K::Dot, "."),
            ',' => tok(K::Comma, ","),
            ';' => tok(K::Semicolon, ";"),
            '(' => tok(K::LParen, "("),
            ')' => tok(K::RParen, ")"),
            '{' => tok(K::LBrace, "{"),
            '}' => tok(K::RBrace, "}"),
            '[' => tok(K::LBracket, "["),
            ']' => tok(K::RBracket, "]"),
            c => Err(LexError { line, column, kind: LexErrorKind::UnexpectedChar(c) }),
        }
    }

    fn tokenize(mut self) -> Result<Vec<Token>, LexError> {
        let mut tokens = Vec::new();
        loop {
            let t = self.next_token()?;
            let done = t.is_eof();
            tokens.push(t);
            if done {
                break;
            }
        }
        Ok(tokens)
    }
}

fn is_ident_start(c: char) -> bool {
    c.is_alphabetic() || c == '_'
}

fn is_ident_continue(c: char) -> bool {
    c.is_alphanumeric() || c == '_'
}

/// Tokenize `source`.  The returned sequence always ends with an
/// [`TokenKind::Eof`] token.
pub fn tokenize(source: &str) -> Result<Vec<Token>, LexError> {
    Lexer::new(source).tokenize()
}

// ── Tests ─────────────────────────────────────────────────────────────────────
