//! Recursive-descent parser: token stream → statement list.
//!
//! One token of lookahead, no backtracking.  The first malformed construct
//! aborts the parse.  Expression precedence, lowest first:
//!
//! ```text
//! assignment  (right-assoc; target must be a variable or index expression)
//! ||
//! &&
//! == !=
//! < <= > >=
//! + -
//! * / %
//! prefix  ++ -- ! -
//! postfix ++ --
//! call / index / method chain
//! primary
//! ```

use std::rc::Rc;

use super::ast::{AssignOp, BinOp, EventTrigger, Expr, FunctionDef, Step, Stmt, VarRef};
use super::error::{Error, ParseError};
use super::lexer::tokenize;
use super::token::{Token, TokenKind};
use super::value::Value;

use TokenKind as K;

/// Deepest nesting of statements and sub-expressions the parser accepts.
pub const MAX_NESTING: usize = 256;

const STACK_RED_ZONE: usize = 64 * 1024;
const STACK_GROW_SIZE: usize = 1024 * 1024;

struct Parser {
    tokens: Vec<Token>,
    pos: usize,
    depth: usize,
}

impl Parser {
    fn new(mut tokens: Vec<Token>) -> Self {
        if !tokens.last().is_some_and(Token::is_eof) {
            let (line, column) = tokens.last().map_or((1, 1), |t| (t.line, t.column));
            tokens.push(Token::new(K::Eof, "", line, column));
        }
        Parser { tokens, pos: 0, depth: 0 }
    }

    fn peek(&self) -> &Token {
        // `new` guarantees a trailing Eof, and `advance` never steps past it.
        &self.tokens[self.pos]
    }

    fn peek_kind(&self) -> TokenKind {
        self.peek().kind
    }

    fn at_eof(&self) -> bool {
        self.peek().is_eof()
    }

    fn advance(&mut self) -> Token {
        let t = self.peek().clone();
        if !t.is_eof() {
            self.pos += 1;
        }
        t
    }

    fn eat(&mut self, kind: TokenKind) -> bool {
        if self.peek_kind() == kind {
            self.advance();
            true
        } else {
            false
        }
    }

    fn expect(&mut self, kind: TokenKind, expected: &str) -> Result<Token, ParseError> {
        if self.peek_kind() == kind {
            Ok(self.advance())
        } else {
            Err(self.unexpected(expected))
        }
    }

    fn unexpected(&self, expected: &str) -> ParseError {
        let t = self.peek();
        ParseError::Unexpected {
            line: t.line,
            column: t.column,
            expected: expected.to_owned(),
            found: t.to_string(),
        }
    }

    /// Run `f` one nesting level deeper, failing past [`MAX_NESTING`].
    fn nested<T>(&mut self, f: impl FnOnce(&mut Self) -> Result<T, ParseError>) -> Result<T, ParseError> {
        if self.depth >= MAX_NESTING {
            let t = self.peek();
            return Err(ParseError::TooDeep { line: t.line, column: t.column, max: MAX_NESTING });
        }
        self.depth += 1;
        let result = stacker::maybe_grow(STACK_RED_ZONE, STACK_GROW_SIZE, || f(self));
        self.depth -= 1;
        result
    }

    // ── Statements ────────────────────────────────────────────────────────────

    fn parse_program(&mut self) -> Result<Vec<Stmt>, ParseError> {
        let mut stmts = Vec::new();
        while !self.at_eof() {
            stmts.push(self.parse_statement()?);
        }
        Ok(stmts)
    }

    fn parse_statement(&mut self) -> Result<Stmt, ParseError> {
        self.nested(Self::parse_statement_inner)
    }

    fn parse_statement_inner(&mut self) -> Result<Stmt, ParseError> {
        match self.peek_kind() {
            K::Function => self.parse_function(),
            K::Return => {
                self.advance();
                let value = if self.peek_kind() == K::Semicolon {
                    None
                } else {
                    Some(self.parse_expr()?)
                };
                self.expect(K::Semicolon, "';' after return")?;
                Ok(Stmt::Return(value))
            }
            K::For => self.parse_for(),
            K::While => {
                self.advance();
                self.expect(K::LParen, "'(' after 'while'")?;
                let cond = self.parse_expr()?;
                self.expect(K::RParen, "')' after while condition")?;
                let body = self.parse_block()?;
                Ok(Stmt::While { cond, body })
            }
            K::If => self.parse_if(),
            K::Print => {
                self.advance();
                self.expect(K::Arrow, "'->' after 'print'")?;
                let expr = self.parse_expr()?;
                self.expect(K::Semicolon, "';' after print statement")?;
                Ok(Stmt::Print(expr))
            }
            K::Input => self.parse_input(),
            K::Use => {
                self.advance();
                let name = match self.peek_kind() {
                    K::Ident | K::Str => self.advance().lexeme,
                    _ => return Err(self.unexpected("library name after 'use'")),
                };
                self.expect(K::Semicolon, "';' after use statement")?;
                Ok(Stmt::Use(name))
            }
            K::EventTrigger => self.parse_event_trigger(),
            _ => {
                let expr = self.parse_expr()?;
                self.expect(K::Semicolon, "';' after expression")?;
                Ok(Stmt::Expression(expr))
            }
        }
    }

    /// `{ stmt* }`
    fn parse_block(&mut self) -> Result<Vec<Stmt>, ParseError> {
        self.expect(K::LBrace, "'{'")?;
        let mut stmts = Vec::new();
        while !matches!(self.peek_kind(), K::RBrace | K::Eof) {
            stmts.push(self.parse_statement()?);
        }
        self.expect(K::RBrace, "'}'")?;
        Ok(stmts)
    }

    /// `function name(a, b) { body };`
    fn parse_function(&mut self) -> Result<Stmt, ParseError> {
        self.advance();
        let name = self.expect(K::Ident, "function name")?.lexeme;
        self.expect(K::LParen, "'(' after function name")?;
        let mut params = Vec::new();
        if !self.eat(K::RParen) {
            loop {
                params.push(self.expect(K::Ident, "parameter name")?.lexeme);
                if !self.eat(K::Comma) {
                    break;
                }
            }
            self.expect(K::RParen, "')' after parameters")?;
        }
        let body = self.parse_block()?;
        self.expect(K::Semicolon, "';' after function definition")?;
        Ok(Stmt::FunctionDef(Rc::new(FunctionDef { name, params, body })))
    }

    /// `for (init; cond; step) { body }`
    fn parse_for(&mut self) -> Result<Stmt, ParseError> {
        self.advance();
        self.expect(K::LParen, "'(' after 'for'")?;
        let init = self.parse_expr()?;
        self.expect(K::Semicolon, "';' after for initialization")?;
        let cond = self.parse_expr()?;
        self.expect(K::Semicolon, "';' after for condition")?;
        let step = self.parse_expr()?;
        self.expect(K::RParen, "')' after for clauses")?;
        let body = self.parse_block()?;
        Ok(Stmt::For { init, cond, step, body })
    }

    /// `if (cond) { … } [else { … } | else if …]`
    fn parse_if(&mut self) -> Result<Stmt, ParseError> {
        self.advance();
        self.expect(K::LParen, "'(' after 'if'")?;
        let cond = self.parse_expr()?;
        self.expect(K::RParen, "')' after if condition")?;
        let then_block = self.parse_block()?;
        let else_block = if self.eat(K::Else) {
            if self.peek_kind() == K::If {
                Some(vec![self.parse_if()?])
            } else {
                Some(self.parse_block()?)
            }
        } else {
            None
        };
        Ok(Stmt::If { cond, then_block, else_block })
    }

    /// `input -> prompt -> target;`
    fn parse_input(&mut self) -> Result<Stmt, ParseError> {
        self.advance();
        self.expect(K::Arrow, "'->' after 'input'")?;
        let prompt = self.parse_expr()?;
        self.expect(K::Arrow, "'->' before input target")?;
        let at = self.peek().clone();
        let target = match self.parse_expr()? {
            Expr::Variable(v) => v,
            _ => {
                return Err(ParseError::InvalidAssignmentTarget { line: at.line, column: at.column });
            }
        };
        self.expect(K::Semicolon, "';' after input statement")?;
        Ok(Stmt::Input { prompt, target })
    }

    /// `@EVENT_TRIGGER(time [unit] [, times]) -> statement`
    fn parse_event_trigger(&mut self) -> Result<Stmt, ParseError> {
        self.advance();
        self.expect(K::LParen, "'(' after event trigger")?;
        let time = self.parse_expr()?;
        let unit = if self.peek_kind() == K::Ident {
            Some(self.advance().lexeme)
        } else {
            None
        };
        let times = if self.eat(K::Comma) { Some(self.parse_expr()?) } else { None };
        self.expect(K::RParen, "')' after event trigger arguments")?;
        self.expect(K::Arrow, "'->' before event trigger action")?;
        let action = Rc::new(self.parse_statement()?);
        Ok(Stmt::EventTrigger(EventTrigger { time, unit, times, action }))
    }

    // ── Expressions ───────────────────────────────────────────────────────────

    fn parse_expr(&mut self) -> Result<Expr, ParseError> {
        self.parse_assign()
    }

    fn parse_assign(&mut self) -> Result<Expr, ParseError> {
        self.nested(Self::parse_assign_inner)
    }

    fn parse_assign_inner(&mut self) -> Result<Expr, ParseError> {
        let lhs = self.parse_or()?;
        let op = match self.peek_kind() {
            K::Assign => AssignOp::Set,
            K::PlusAssign => AssignOp::Add,
            K::MinusAssign => AssignOp::Sub,
            K::StarAssign => AssignOp::Mul,
            K::SlashAssign => AssignOp::Div,
            _ => return Ok(lhs),
        };
        let op_tok = self.advance();
        let value = Box::new(self.parse_assign()?);
        match lhs {
            Expr::Variable(target) => Ok(Expr::Assign { target, op, value }),
            Expr::Index { target, index } => Ok(Expr::AssignIndex { target, index, op, value }),
            _ => Err(ParseError::InvalidAssignmentTarget {
                line: op_tok.line,
                column: op_tok.column,
            }),
        }
    }

    fn parse_or(&mut self) -> Result<Expr, ParseError> {
        let mut lhs = self.parse_and()?;
        while self.eat(K::Or) {
            let rhs = self.parse_and()?;
            lhs = Expr::Binary(BinOp::Or, Box::new(lhs), Box::new(rhs));
        }
        Ok(lhs)
    }

    fn parse_and(&mut self) -> Result<Expr, ParseError> {
        let mut lhs = self.parse_equality()?;
        while self.eat(K::And) {
            let rhs = self.parse_equality()?;
            lhs = Expr::Binary(BinOp::And, Box::new(lhs), Box::new(rhs));
        }
        Ok(lhs)
    }

    fn parse_equality(&mut self) -> Result<Expr, ParseError> {
        let mut lhs = self.parse_relational()?;
        loop {
            let op = match self.peek_kind() {
                K::Eq => BinOp::Eq,
                K::Ne => BinOp::Ne,
                _ => break,
            };
            self.advance();
            let rhs = self.parse_relational()?;
            lhs = Expr::Binary(op, Box::new(lhs), Box::new(rhs));
        }
        Ok(lhs)
    }

    fn parse_relational(&mut self) -> Result<Expr, ParseError> {
        let mut lhs = self.parse_additive()?;
        loop {
            let op = match self.peek_kind() {
                K::Lt => BinOp::Lt,
                K::Le => BinOp::Le,
                K::Gt => BinOp::Gt,
                K::Ge => BinOp::Ge,
                _ => break,
            };
            self.advance();
            let rhs = self.parse_additive()?;
            lhs = Expr::Binary(op, Box::new(lhs), Box::new(rhs));
        }
        Ok(lhs)
    }

    fn parse_additive(&mut self) -> Result<Expr, ParseError> {
        let mut lhs = self.parse_multiplicative()?;
        loop {
            let op = match self.peek_kind() {
                K::Plus => BinOp::Add,
                K::Minus => BinOp::Sub,
                _ => break,
            };
            self.advance();
            let rhs = self.parse_multiplicative()?;
            lhs = Expr::Binary(op, Box::new(lhs), Box::new(rhs));
        }
        Ok(lhs)
    }

    fn parse_multiplicative(&mut self) -> Result<Expr, ParseError> {
        let mut lhs = self.parse_unary()?;
        loop {
            let op = match self.peek_kind() {
                K::Star => BinOp::Mul,
                K::Slash => BinOp::Div,
                K::Percent => BinOp::Rem,
                _ => break,
            };
            self.advance();
            let rhs = self.parse_unary()?;
            lhs = Expr::Binary(op, Box::new(lhs), Box::new(rhs));
        }
        Ok(lhs)
    }

    fn parse_unary(&mut self) -> Result<Expr, ParseError> {
        self.nested(Self::parse_unary_inner)
    }

    fn parse_unary_inner(&mut self) -> Result<Expr, ParseError> {
        let step = match self.peek_kind() {
            K::Bang => {
                self.advance();
                return Ok(Expr::Not(Box::new(self.parse_unary()?)));
            }
            K::Minus => {
                // Negation is subtraction from zero.
                self.advance();
                let operand = self.parse_unary()?;
                return Ok(Expr::Binary(
                    BinOp::Sub,
                    Box::new(Expr::Literal(Value::Int(0))),
                    Box::new(operand),
                ));
            }
            K::PlusPlus => Step::Increment,
            K::MinusMinus => Step::Decrement,
            _ => return self.parse_postfix(),
        };
        let op_tok = self.advance();
        match self.parse_unary()? {
            Expr::Variable(target) => Ok(Expr::Step { target, step, postfix: false }),
            _ => Err(ParseError::InvalidAssignmentTarget {
                line: op_tok.line,
                column: op_tok.column,
            }),
        }
    }

    fn parse_postfix(&mut self) -> Result<Expr, ParseError> {
        let mut expr = self.parse_chain()?;
        loop {
            let step = match self.peek_kind() {
                K::PlusPlus => Step::Increment,
                K::MinusMinus => Step::Decrement,
                _ => break,
            };
            let op_tok = self.advance();
            expr = match expr {
                Expr::Variable(target) => Expr::Step { target, step, postfix: true },
                _ => {
                    return Err(ParseError::InvalidAssignmentTarget {
                        line: op_tok.line,
                        column: op_tok.column,
                    });
                }
            };
        }
        Ok(expr)
    }

    /// A primary followed by any number of `[index]` and `.method(args)`.
    fn parse_chain(&mut self) -> Result<Expr, ParseError> {
        let mut expr = self.parse_primary()?;
        loop {
            if self.eat(K::LBracket) {
                let index = self.parse_expr()?;
                self.expect(K::RBracket, "']' after index")?;
                expr = Expr::Index { target: Box::new(expr), index: Box::new(index) };
            } else if self.eat(K::Dot) {
                let method = self.expect(K::Ident, "method name after '.'")?.lexeme;
                self.expect(K::LParen, "'(' after method name")?;
                let args = self.parse_args(K::RParen, "')' after arguments")?;
                expr = Expr::MethodCall { target: Box::new(expr), method, args };
            } else {
                return Ok(expr);
            }
        }
    }

    /// Comma-separated expressions up to `close`; the opener is already consumed.
    fn parse_args(&mut self, close: TokenKind, expected: &str) -> Result<Vec<Expr>, ParseError> {
        let mut args = Vec::new();
        if self.eat(close) {
            return Ok(args);
        }
        loop {
            args.push(self.parse_expr()?);
            if !self.eat(K::Comma) {
                break;
            }
        }
        self.expect(close, expected)?;
        Ok(args)
    }

    fn parse_primary(&mut self) -> Result<Expr, ParseError> {
        match self.peek_kind() {
            K::Number => {
                let tok = self.advance();
                parse_number(&tok).map(Expr::Literal)
            }
            K::Str => Ok(Expr::Literal(Value::Str(self.advance().lexeme))),
            K::True => {
                self.advance();
                Ok(Expr::Literal(Value::Bool(true)))
            }
            K::False => {
                self.advance();
                Ok(Expr::Literal(Value::Bool(false)))
            }
            K::Ident => {
                let name = self.advance().lexeme;
                if self.eat(K::LParen) {
                    let args = self.parse_args(K::RParen, "')' after arguments")?;
                    Ok(Expr::Call { name, args })
                } else {
                    Ok(Expr::Variable(VarRef::from_lexeme(&name)))
                }
            }
            K::LParen => {
                self.advance();
                let inner = self.parse_expr()?;
                self.expect(K::RParen, "')'")?;
                Ok(inner)
            }
            K::LBracket => {
                self.advance();
                let items = self.parse_args(K::RBracket, "']' after list elements")?;
                Ok(Expr::Array(items))
            }
            _ => Err(self.unexpected("expression")),
        }
    }
}

fn parse_number(tok: &Token) -> Result<Value, ParseError> {
    let invalid = || ParseError::InvalidNumber {
        line: tok.line,
        column: tok.column,
        lexeme: tok.lexeme.clone(),
    };
    if tok.lexeme.contains('.') {
        tok.lexeme.parse().map(Value::Float).map_err(|_| invalid())
    } else {
        tok.lexeme.parse().map(Value::Int).map_err(|_| invalid())
    }
}

/// Parse a token sequence (as produced by [`tokenize`]) into statements.
pub fn parse(tokens: Vec<Token>) -> Result<Vec<Stmt>, ParseError> {
    Parser::new(tokens).parse_program()
}

/// Tokenize and parse source text.
pub fn parse_program(source: &str) -> Result<Vec<Stmt>, Error> {
    let tokens = tokenize(source)?;
    Ok(parse(tokens)?)
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    fn stmts(src: &str) -> Vec<Stmt> {
        parse_program(src).expect("parse failed")
    }

    fn expr(src: &str) -> Expr {
        match stmts(&format!("{src};")).pop() {
            Some(Stmt::Expression(e)) => e,
            other => panic!("expected expression statement, got {other:?}"),
        }
    }

    fn parse_err(src: &str) -> ParseError {
        match parse_program(src) {
            Err(Error::Parse(e)) => e,
            other => panic!("expected parse error, got {other:?}"),
        }
    }

    #[test]
    fn precedence() {
        // 1 + 2 * 3 == 7 || false  →  ((1 + (2 * 3)) == 7) || false
        let Expr::Binary(BinOp::Or, lhs, _) = expr("1 + 2 * 3 == 7 || false") else {
            panic!("expected ||");
        };
        let Expr::Binary(BinOp::Eq, sum, _) = *lhs else { panic!("expected ==") };
        let Expr::Binary(BinOp::Add, _, product) = *sum else { panic!("expected +") };
        assert!(matches!(*product, Expr::Binary(BinOp::Mul, _, _)));
    }

    #[test]
    fn and_binds_tighter_than_or() {
        let Expr::Binary(BinOp::Or, _, rhs) = expr("a || b && c") else { panic!("expected ||") };
        assert!(matches!(*rhs, Expr::Binary(BinOp::And, _, _)));
    }

    #[test]
    fn assignment_is_right_associative() {
        let Expr::Assign { target, op: AssignOp::Set, value } = expr("a = b = 3") else {
            panic!("expected assignment");
        };
        assert_eq!(target.name, "a");
        assert!(matches!(*value, Expr::Assign { ref target, .. } if target.name == "b"));
    }

    #[test]
    fn compound_and_index_assignment() {
        assert!(matches!(expr("x += 1"), Expr::Assign { op: AssignOp::Add, .. }));
        assert!(matches!(expr("xs[0] *= 2"), Expr::AssignIndex { op: AssignOp::Mul, .. }));
    }

    #[test]
    fn invalid_assignment_targets() {
        assert!(matches!(parse_err("1 = 2;"), ParseError::InvalidAssignmentTarget { .. }));
        assert!(matches!(parse_err("f() = 2;"), ParseError::InvalidAssignmentTarget { .. }));
        assert!(matches!(parse_err("++3;"), ParseError::InvalidAssignmentTarget { .. }));
        assert!(matches!(parse_err("x++ ++;"), ParseError::InvalidAssignmentTarget { .. }));
        assert!(matches!(
            parse_err("input -> \"p\" -> 5;"),
            ParseError::InvalidAssignmentTarget { .. }
        ));
    }

    #[test]
    fn steps_and_not() {
        assert!(matches!(expr("i++"), Expr::Step { postfix: true, step: Step::Increment, .. }));
        assert!(matches!(expr("--i"), Expr::Step { postfix: false, step: Step::Decrement, .. }));
        assert!(matches!(expr("!done"), Expr::Not(_)));
    }

    #[test]
    fn encrypted_marker_is_split_off() {
        let Expr::Assign { target, .. } = expr("@ENCpin = 1234") else { panic!() };
        assert_eq!(target, VarRef { name: "pin".into(), encrypted: true });
    }

    #[test]
    fn literals() {
        assert!(matches!(expr("42"), Expr::Literal(Value::Int(42))));
        assert!(matches!(expr("2.5"), Expr::Literal(Value::Float(x)) if x == 2.5));
        assert!(matches!(expr("\"s\""), Expr::Literal(Value::Str(ref s)) if s == "s"));
        assert!(matches!(expr("true"), Expr::Literal(Value::Bool(true))));
        assert!(matches!(expr("[]"), Expr::Array(ref v) if v.is_empty()));
        assert!(matches!(expr("[1, [2], \"x\"]"), Expr::Array(ref v) if v.len() == 3));
        assert!(matches!(expr("-4"), Expr::Binary(BinOp::Sub, _, _)));
        assert!(matches!(
            parse_err("x = 99999999999999999999;"),
            ParseError::InvalidNumber { .. }
        ));
    }

    #[test]
    fn calls_indexes_and_methods_chain() {
        assert!(matches!(expr("f(1, 2)"), Expr::Call { ref args, .. } if args.len() == 2));
        assert!(matches!(expr("g()"), Expr::Call { ref args, .. } if args.is_empty()));
        let Expr::MethodCall { target, method, args } = expr("m[1][2].add(3)") else {
            panic!("expected method call");
        };
        assert_eq!(method, "add");
        assert_eq!(args.len(), 1);
        let Expr::Index { target: inner, .. } = *target else { panic!("expected index") };
        assert!(matches!(*inner, Expr::Index { .. }));
    }

    #[test]
    fn nested_blocks_keep_their_semicolons() {
        let prog = stmts(
            "function f(a, b) { if (a > b) { return a; } else { return b; } };
             for (i = 0; i < 3; i++) { while (x < i) { x = x + 1; } }
             print -> f(1, 2);",
        );
        assert_eq!(prog.len(), 3);
        let Stmt::FunctionDef(def) = &prog[0] else { panic!("expected function") };
        assert_eq!(def.params, vec!["a", "b"]);
        assert_eq!(def.body.len(), 1);
        assert!(matches!(&prog[1], Stmt::For { body, .. } if body.len() == 1));
        assert!(matches!(prog[2], Stmt::Print(_)));
    }

    #[test]
    fn else_if_chains() {
        let prog = stmts("if (a) { x = 1; } else if (b) { x = 2; } else { x = 3; }");
        let Stmt::If { else_block: Some(else_block), .. } = &prog[0] else { panic!() };
        assert!(matches!(else_block[0], Stmt::If { else_block: Some(_), .. }));
    }

    #[test]
    fn statement_forms() {
        let prog = stmts(
            "use blockchain; input -> \"name?\" -> @ENCname; return; return 1 + 1;",
        );
        assert!(matches!(&prog[0], Stmt::Use(n) if n == "blockchain"));
        assert!(matches!(&prog[1], Stmt::Input { target, .. } if target.encrypted));
        assert!(matches!(prog[2], Stmt::Return(None)));
        assert!(matches!(prog[3], Stmt::Return(Some(_))));
    }

    #[test]
    fn event_trigger_forms() {
        let prog = stmts(
            "@EVENT_TRIGGER(2 seconds, 3) -> print -> \"tick\";
             @EVENT_TRIGGER(1 + 1 Minutes) -> x++;
             @EVENT_TRIGGER(\"2030-01-01 00:00:00\") -> print -> \"later\";",
        );
        let Stmt::EventTrigger(t) = &prog[0] else { panic!() };
        assert_eq!(t.unit.as_deref(), Some("seconds"));
        assert!(t.times.is_some());
        assert!(matches!(*t.action, Stmt::Print(_)));
        let Stmt::EventTrigger(t) = &prog[1] else { panic!() };
        assert_eq!(t.unit.as_deref(), Some("Minutes"));
        assert!(t.times.is_none());
        assert!(matches!(t.time, Expr::Binary(BinOp::Add, _, _)));
        let Stmt::EventTrigger(t) = &prog[2] else { panic!() };
        assert!(t.unit.is_none());
    }

    #[test]
    fn errors_carry_position_and_expectation() {
        let err = parse_err("x = 1\ny = 2;");
        assert_eq!(err.position(), (2, 1));
        assert!(err.to_string().contains("expected ';' after expression"));

        let err = parse_err("print 5;");
        assert!(err.to_string().contains("'->' after 'print'"));

        // Function definitions need their trailing semicolon.
        let err = parse_err("function f() { }");
        assert!(err.to_string().contains("end of input"));

        assert!(matches!(parse_err("if (x) { y = 1;"), ParseError::Unexpected { .. }));
        assert!(matches!(parse_err("for (i = 0; i < 3) { }"), ParseError::Unexpected { .. }));
    }

    #[test]
    fn deep_nesting_is_a_parse_error() {
        let parens = format!("x = {}1{};", "(".repeat(10_000), ")".repeat(10_000));
        assert!(matches!(parse_err(&parens), ParseError::TooDeep { max: MAX_NESTING, .. }));

        let lists = format!("x = {}{};", "[".repeat(10_000), "]".repeat(10_000));
        assert!(matches!(parse_err(&lists), ParseError::TooDeep { .. }));

        let nots = format!("x = {}true;", "!".repeat(10_000));
        assert!(matches!(parse_err(&nots), ParseError::TooDeep { .. }));

        let blocks = format!("{}{}", "if (true) { ".repeat(10_000), "}".repeat(10_000));
        let err = parse_err(&blocks);
        assert!(err.to_string().contains("nesting exceeds maximum of 256 levels"), "{err}");
    }

    #[test]
    fn moderate_nesting_parses() {
        let parens = format!("x = {}1{};", "(".repeat(60), ")".repeat(60));
        assert_eq!(stmts(&parens).len(), 1);
        let blocks = format!("{}x = 1;{}", "while (a) { ".repeat(60), "}".repeat(60));
        assert_eq!(stmts(&blocks).len(), 1);
    }

    #[test]
    fn empty_program() {
        assert!(stmts("").is_empty());
        assert!(stmts("// only a comment").is_empty());
        assert!(parse(Vec::new()).unwrap().is_empty());
    }
}
