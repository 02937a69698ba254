//! Syntax tree built by the [parser](super::parser).
//!
//! Trees are immutable once built.  Function bodies and scheduled actions are
//! reference-counted so the function table and the scheduler can hold on to
//! them after the statement list that defined them has been dropped.

use std::rc::Rc;

use super::token::ENC_MARKER;
use super::value::Value;

/// A variable name as written, split into the bare name and the
/// encrypted-variable marker.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VarRef {
    pub name: String,
    pub encrypted: bool,
}

impl VarRef {
    /// Split a lexeme like `@ENCsecret` into `secret` + marker.
    pub fn from_lexeme(lexeme: &str) -> Self {
        match lexeme.strip_prefix(ENC_MARKER) {
            Some(bare) => VarRef { name: bare.to_owned(), encrypted: true },
            None => VarRef { name: lexeme.to_owned(), encrypted: false },
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinOp {
    Add,
    Sub,
    Mul,
    Div,
    Rem,
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
    And,
    Or,
}

impl BinOp {
    pub fn symbol(self) -> &'static str {
        match self {
            BinOp::Add => "+",
            BinOp::Sub => "-",
            BinOp::Mul => "*",
            BinOp::Div => "/",
            BinOp::Rem => "%",
            BinOp::Eq => "==",
            BinOp::Ne => "!=",
            BinOp::Lt => "<",
            BinOp::Le => "<=",
            BinOp::Gt => ">",
            BinOp::Ge => ">=",
            BinOp::And => "&&",
            BinOp::Or => "||",
        }
    }
}

/// `=` or one of the compound forms.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AssignOp {
    Set,
    Add,
    Sub,
    Mul,
    Div,
}

impl AssignOp {
    /// The binary operator a compound assignment applies; `None` for `=`.
    pub fn binop(self) -> Option<BinOp> {
        match self {
            AssignOp::Set => None,
            AssignOp::Add => Some(BinOp::Add),
            AssignOp::Sub => Some(BinOp::Sub),
            AssignOp::Mul => Some(BinOp::Mul),
            AssignOp::Div => Some(BinOp::Div),
        }
    }
}

/// `++` or `--`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Step {
    Increment,
    Decrement,
}

#[derive(Debug, Clone)]
pub enum Expr {
    Literal(Value),
    Array(Vec<Expr>),
    Variable(VarRef),
    Assign {
        target: VarRef,
        op: AssignOp,
        value: Box<Expr>,
    },
    AssignIndex {
        target: Box<Expr>,
        index: Box<Expr>,
        op: AssignOp,
        value: Box<Expr>,
    },
    Index {
        target: Box<Expr>,
        index: Box<Expr>,
    },
    Binary(BinOp, Box<Expr>, Box<Expr>),
    /// Logical `!`.
    Not(Box<Expr>),
    /// Prefix or postfix `++` / `--` on a bare variable.
    Step {
        target: VarRef,
        step: Step,
        postfix: bool,
    },
    Call {
        name: String,
        args: Vec<Expr>,
    },
    MethodCall {
        target: Box<Expr>,
        method: String,
        args: Vec<Expr>,
    },
}

#[derive(Debug)]
pub struct FunctionDef {
    pub name: String,
    pub params: Vec<String>,
    pub body: Vec<Stmt>,
}

/// Arguments of an `@EVENT_TRIGGER(...) -> action` statement.
#[derive(Debug, Clone)]
pub struct EventTrigger {
    pub time: Expr,
    /// `seconds` / `minutes` / `hours`; absent for an absolute date-time.
    pub unit: Option<String>,
    pub times: Option<Expr>,
    pub action: Rc<Stmt>,
}

#[derive(Debug, Clone)]
pub enum Stmt {
    Print(Expr),
    If {
        cond: Expr,
        then_block: Vec<Stmt>,
        else_block: Option<Vec<Stmt>>,
    },
    For {
        init: Expr,
        cond: Expr,
        step: Expr,
        body: Vec<Stmt>,
    },
    While {
        cond: Expr,
        body: Vec<Stmt>,
    },
    Input {
        prompt: Expr,
        target: VarRef,
    },
    FunctionDef(Rc<FunctionDef>),
    Return(Option<Expr>),
    Use(String),
    EventTrigger(EventTrigger),
    Expression(Expr),
}
