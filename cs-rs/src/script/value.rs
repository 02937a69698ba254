//! Runtime value type.
//!
//! Values are dynamically typed and coerce freely: arithmetic converts both
//! operands to numbers, `+` with a string operand concatenates, and every
//! value has a truthiness.  Lists are shared by reference, so writes through
//! one binding are visible through every other binding of the same list.

use std::cell::RefCell;
use std::cmp::Ordering;
use std::fmt;
use std::rc::Rc;

use super::ast::{BinOp, Step};
use super::error::RuntimeError;
use super::library::BuiltinObject;

pub type ListRef = Rc<RefCell<Vec<Value>>>;
pub type ObjectRef = Rc<RefCell<dyn BuiltinObject>>;

/// A script runtime value.
#[derive(Debug, Clone, Default)]
pub enum Value {
    /// The absent value: what a function without `return` yields.
    #[default]
    Nil,
    Bool(bool),
    Int(i64),
    Float(f64),
    Str(String),
    List(ListRef),
    /// A builtin library object bound by `use`.
    Object(ObjectRef),
}

/// A value after numeric coercion.
#[derive(Debug, Clone, Copy, PartialEq)]
enum Num {
    Int(i64),
    Float(f64),
}

impl Num {
    fn as_f64(self) -> f64 {
        match self {
            Num::Int(n) => n as f64,
            Num::Float(x) => x,
        }
    }

    fn truncate(self) -> i64 {
        match self {
            Num::Int(n) => n,
            Num::Float(x) => x as i64,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Nil => write!(f, "null"),
            Value::Bool(b) => write!(f, "{b}"),
            Value::Int(n) => write!(f, "{n}"),
            Value::Float(x) => {
                // Whole floats keep a trailing ".0" so they read back as floats.
                if x.is_finite() && x.fract() == 0.0 {
                    write!(f, "{x:.1}")
                } else {
                    write!(f, "{x}")
                }
            }
            Value::Str(s) => write!(f, "{s}"),
            Value::List(items) => {
                write!(f, "[")?;
                for (i, item) in items.borrow().iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    match item {
                        Value::List(inner) if Rc::ptr_eq(inner, items) => write!(f, "(this list)")?,
                        other => write!(f, "{other}")?,
                    }
                }
                write!(f, "]")
            }
            Value::Object(obj) => match obj.try_borrow() {
                Ok(obj) => write!(f, "<{}>", obj.type_name()),
                // Printed from inside one of its own methods.
                Err(_) => write!(f, "<object>"),
            },
        }
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        self.structural_eq(other)
    }
}

impl Value {
    pub fn list(items: Vec<Value>) -> Value {
        Value::List(Rc::new(RefCell::new(items)))
    }

    pub fn str(s: impl Into<String>) -> Value {
        Value::Str(s.into())
    }

    /// Truthiness: booleans as-is, numbers non-zero, strings and lists
    /// non-empty, objects always true, `Nil` false.
    pub fn is_truthy(&self) -> bool {
        match self {
            Value::Nil => false,
            Value::Bool(b) => *b,
            Value::Int(n) => *n != 0,
            Value::Float(x) => *x != 0.0,
            Value::Str(s) => !s.is_empty(),
            Value::List(items) => !items.borrow().is_empty(),
            Value::Object(_) => true,
        }
    }

    /// Name of the type, used in error messages.
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Nil => "null",
            Value::Bool(_) => "boolean",
            Value::Int(_) => "integer",
            Value::Float(_) => "float",
            Value::Str(_) => "string",
            Value::List(_) => "list",
            Value::Object(_) => "object",
        }
    }

    /// Element-wise equality.  Integers and floats are distinct types here;
    /// objects compare by identity.
    pub fn structural_eq(&self, other: &Value) -> bool {
        match (self, other) {
            (Value::Nil, Value::Nil) => true,
            (Value::Bool(a), Value::Bool(b)) => a == b,
            (Value::Int(a), Value::Int(b)) => a == b,
            (Value::Float(a), Value::Float(b)) => a == b,
            (Value::Str(a), Value::Str(b)) => a == b,
            (Value::List(a), Value::List(b)) => {
                if Rc::ptr_eq(a, b) {
                    return true;
                }
                let (a, b) = (a.borrow(), b.borrow());
                a.len() == b.len() && a.iter().zip(b.iter()).all(|(x, y)| x.structural_eq(y))
            }
            (Value::Object(a), Value::Object(b)) => Rc::ptr_eq(a, b),
            _ => false,
        }
    }

    /// Numeric coercion.  Unparseable strings become `0`, booleans `1`/`0`,
    /// `Nil` `0`; lists and objects have no numeric form.
    fn to_num(&self) -> Option<Num> {
        match self {
            Value::Nil => Some(Num::Int(0)),
            Value::Bool(b) => Some(Num::Int(i64::from(*b))),
            Value::Int(n) => Some(Num::Int(*n)),
            Value::Float(x) => Some(Num::Float(*x)),
            Value::Str(s) => {
                let t = s.trim();
                if let Ok(n) = t.parse::<i64>() {
                    Some(Num::Int(n))
                } else if looks_numeric(t) {
                    Some(t.parse::<f64>().map(Num::Float).unwrap_or(Num::Int(0)))
                } else {
                    Some(Num::Int(0))
                }
            }
            Value::List(_) | Value::Object(_) => None,
        }
    }

    /// Coerce to a list index: integers as-is, floats truncated, numeric
    /// strings parsed.
    pub fn as_index(&self) -> Result<i64, RuntimeError> {
        match self {
            Value::Int(n) => Ok(*n),
            Value::Float(x) => Ok(*x as i64),
            Value::Str(s) => s
                .trim()
                .parse()
                .map_err(|_| RuntimeError::TypeMismatch(format!("cannot convert \"{s}\" to an index"))),
            other => Err(RuntimeError::TypeMismatch(format!(
                "cannot convert {} to an index",
                other.type_name()
            ))),
        }
    }

    /// Coerce to an integer the way arithmetic does (strings that do not
    /// parse become `0`).  `None` for lists and objects.
    pub fn as_int(&self) -> Option<i64> {
        self.to_num().map(Num::truncate)
    }

    /// Coerce to a float the way arithmetic does.
    pub fn as_float(&self) -> Option<f64> {
        self.to_num().map(Num::as_f64)
    }

    /// `++` / `--`: integers stay integers, everything else numeric becomes
    /// whatever its coercion yields, plus or minus one.
    pub fn step(&self, step: Step) -> Result<Value, RuntimeError> {
        let delta = match step {
            Step::Increment => 1,
            Step::Decrement => -1,
        };
        match self.to_num() {
            Some(Num::Int(n)) => Ok(Value::Int(n.wrapping_add(delta))),
            Some(Num::Float(x)) => Ok(Value::Float(x + delta as f64)),
            None => Err(RuntimeError::UnsupportedOperator {
                op: if delta > 0 { "++" } else { "--" },
                operands: self.type_name().to_owned(),
            }),
        }
    }

    /// Recover a typed value from its textual form.
    ///
    /// Tried in order: boolean keyword (any case), integer, float, bracketed
    /// comma-separated list (elements sniffed recursively), quoted string
    /// (quotes stripped), and finally the raw text.
    pub fn sniff(text: &str) -> Value {
        let t = text.trim();
        if t.eq_ignore_ascii_case("true") {
            return Value::Bool(true);
        }
        if t.eq_ignore_ascii_case("false") {
            return Value::Bool(false);
        }
        if let Ok(n) = t.parse::<i64>() {
            return Value::Int(n);
        }
        if looks_numeric(t) {
            if let Ok(x) = t.parse::<f64>() {
                return Value::Float(x);
            }
        }
        if t.len() >= 2 && t.starts_with('[') && t.ends_with(']') {
            let inner = t[1..t.len() - 1].trim();
            if inner.is_empty() {
                return Value::list(Vec::new());
            }
            return Value::list(split_top_level(inner).into_iter().map(Value::sniff).collect());
        }
        if t.len() >= 2 && t.starts_with('"') && t.ends_with('"') {
            return Value::Str(t[1..t.len() - 1].to_owned());
        }
        Value::Str(text.to_owned())
    }
}

/// Whether `s` is shaped like a decimal number (excludes `inf`, `NaN`, …).
fn looks_numeric(s: &str) -> bool {
    s.chars().any(|c| c.is_ascii_digit())
        && s.chars().all(|c| c.is_ascii_digit() || matches!(c, '+' | '-' | '.' | 'e' | 'E'))
}

/// Split list text on commas that are not nested in brackets or quotes.
fn split_top_level(s: &str) -> Vec<&str> {
    let mut parts = Vec::new();
    let mut depth = 0usize;
    let mut in_quotes = false;
    let mut start = 0;
    for (i, c) in s.char_indices() {
        match c {
            '"' => in_quotes = !in_quotes,
            '[' if !in_quotes => depth += 1,
            ']' if !in_quotes => depth = depth.saturating_sub(1),
            ',' if !in_quotes && depth == 0 => {
                parts.push(s[start..i].trim());
                start = i + 1;
            }
            _ => {}
        }
    }
    parts.push(s[start..].trim());
    parts
}

// ── Binary operators ──────────────────────────────────────────────────────────

/// Apply a binary operator to two already-evaluated operands.
pub fn apply_binop(op: BinOp, l: &Value, r: &Value) -> Result<Value, RuntimeError> {
    match op {
        BinOp::And => return Ok(Value::Bool(l.is_truthy() && r.is_truthy())),
        BinOp::Or => return Ok(Value::Bool(l.is_truthy() || r.is_truthy())),
        _ => {}
    }

    if op == BinOp::Add && (matches!(l, Value::Str(_)) || matches!(r, Value::Str(_))) {
        return Ok(Value::Str(format!("{l}{r}")));
    }

    if let (BinOp::Add, Value::List(a), Value::List(b)) = (op, l, r) {
        let mut joined = a.borrow().clone();
        joined.extend(b.borrow().iter().cloned());
        return Ok(Value::list(joined));
    }

    let structured = |v: &Value| matches!(v, Value::List(_) | Value::Object(_));
    if matches!(op, BinOp::Eq | BinOp::Ne) && (structured(l) || structured(r)) {
        let eq = l.structural_eq(r);
        return Ok(Value::Bool(if op == BinOp::Eq { eq } else { !eq }));
    }

    let (a, b) = match (l.to_num(), r.to_num()) {
        (Some(a), Some(b)) => (a, b),
        _ => {
            return Err(RuntimeError::UnsupportedOperator {
                op: op.symbol(),
                operands: format!("{} and {}", l.type_name(), r.type_name()),
            });
        }
    };

    match op {
        BinOp::Add => Ok(arith(a, b, i64::wrapping_add, |x, y| x + y)),
        BinOp::Sub => Ok(arith(a, b, i64::wrapping_sub, |x, y| x - y)),
        BinOp::Mul => Ok(arith(a, b, i64::wrapping_mul, |x, y| x * y)),
        BinOp::Div => {
            if b.as_f64() == 0.0 {
                return Err(RuntimeError::DivisionByZero);
            }
            Ok(arith(a, b, i64::wrapping_div, |x, y| x / y))
        }
        BinOp::Rem => {
            let divisor = b.truncate();
            if divisor == 0 {
                return Err(RuntimeError::DivisionByZero);
            }
            Ok(Value::Int(a.truncate().wrapping_rem(divisor)))
        }
        BinOp::Eq => Ok(Value::Bool(compare(a, b) == Some(Ordering::Equal))),
        BinOp::Ne => Ok(Value::Bool(compare(a, b) != Some(Ordering::Equal))),
        BinOp::Lt => Ok(Value::Bool(compare(a, b) == Some(Ordering::Less))),
        BinOp::Le => Ok(Value::Bool(matches!(
            compare(a, b),
            Some(Ordering::Less | Ordering::Equal)
        ))),
        BinOp::Gt => Ok(Value::Bool(compare(a, b) == Some(Ordering::Greater))),
        BinOp::Ge => Ok(Value::Bool(matches!(
            compare(a, b),
            Some(Ordering::Greater | Ordering::Equal)
        ))),
        BinOp::And => Ok(Value::Bool(l.is_truthy() && r.is_truthy())),
        BinOp::Or => Ok(Value::Bool(l.is_truthy() || r.is_truthy())),
    }
}

/// Integer result when both operands are integers, float otherwise.
fn arith(a: Num, b: Num, int_op: fn(i64, i64) -> i64, float_op: fn(f64, f64) -> f64) -> Value {
    match (a, b) {
        (Num::Int(x), Num::Int(y)) => Value::Int(int_op(x, y)),
        _ => Value::Float(float_op(a.as_f64(), b.as_f64())),
    }
}

fn compare(a: Num, b: Num) -> Option<Ordering> {
    match (a, b) {
        (Num::Int(x), Num::Int(y)) => Some(x.cmp(&y)),
        _ => a.as_f64().partial_cmp(&b.as_f64()),
    }
}

impl From<i64> for Value {
    fn from(n: i64) -> Self {
        Value::Int(n)
    }
}

impl From<f64> for Value {
    fn from(x: f64) -> Self {
        Value::Float(x)
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::Str(s.to_owned())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::Str(s)
    }
}

impl From<Vec<Value>> for Value {
    fn from(items: Vec<Value>) -> Self {
        Value::list(items)
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    fn op(op: BinOp, l: impl Into<Value>, r: impl Into<Value>) -> Result<Value, RuntimeError> {
        apply_binop(op, &l.into(), &r.into())
    }

    fn ints(ns: &[i64]) -> Value {
        Value::list(ns.iter().map(|&n| Value::Int(n)).collect())
    }

    #[test]
    fn display() {
        assert_eq!(Value::Int(-7).to_string(), "-7");
        assert_eq!(Value::Float(5.0).to_string(), "5.0");
        assert_eq!(Value::Float(2.5).to_string(), "2.5");
        assert_eq!(Value::Bool(true).to_string(), "true");
        assert_eq!(Value::Nil.to_string(), "null");
        let nested = Value::list(vec![Value::Int(1), Value::str("a"), ints(&[2, 3])]);
        assert_eq!(nested.to_string(), "[1, a, [2, 3]]");
    }

    #[test]
    fn truthiness() {
        assert!(Value::Bool(true).is_truthy());
        assert!(!Value::Int(0).is_truthy());
        assert!(Value::Float(0.5).is_truthy());
        assert!(!Value::str("").is_truthy());
        assert!(Value::str("0").is_truthy());
        assert!(!Value::list(vec![]).is_truthy());
        assert!(ints(&[0]).is_truthy());
        assert!(!Value::Nil.is_truthy());
    }

    #[test]
    fn arithmetic_typing() {
        assert_eq!(op(BinOp::Add, 2i64, 3i64).unwrap(), Value::Int(5));
        assert_eq!(op(BinOp::Add, 2i64, 3.0).unwrap(), Value::Float(5.0));
        assert_eq!(op(BinOp::Add, "a", 1i64).unwrap(), Value::str("a1"));
        assert_eq!(op(BinOp::Add, 1i64, "a").unwrap(), Value::str("1a"));
        assert_eq!(op(BinOp::Add, ints(&[1, 2]), ints(&[3])).unwrap(), ints(&[1, 2, 3]));
        assert_eq!(op(BinOp::Mul, "4", 2i64).unwrap(), Value::Int(8));
        assert_eq!(op(BinOp::Sub, true, 3i64).unwrap(), Value::Int(-2));
        assert_eq!(op(BinOp::Mul, "abc", 2i64).unwrap(), Value::Int(0));
    }

    #[test]
    fn division_and_modulo() {
        assert_eq!(op(BinOp::Div, 7i64, 2i64).unwrap(), Value::Int(3));
        assert_eq!(op(BinOp::Div, 7.0, 2i64).unwrap(), Value::Float(3.5));
        assert_eq!(op(BinOp::Rem, 7.9, 2i64).unwrap(), Value::Int(1));
        assert!(matches!(op(BinOp::Div, 1i64, 0i64), Err(RuntimeError::DivisionByZero)));
        assert!(matches!(op(BinOp::Div, 1i64, "zero"), Err(RuntimeError::DivisionByZero)));
        assert!(matches!(op(BinOp::Rem, 5i64, 0i64), Err(RuntimeError::DivisionByZero)));
        assert!(matches!(op(BinOp::Rem, 5i64, 0.5), Err(RuntimeError::DivisionByZero)));
    }

    #[test]
    fn comparisons_use_numeric_coercion() {
        assert_eq!(op(BinOp::Lt, 2i64, 3.5).unwrap(), Value::Bool(true));
        assert_eq!(op(BinOp::Eq, 3i64, 3.0).unwrap(), Value::Bool(true));
        assert_eq!(op(BinOp::Ge, "10", 9i64).unwrap(), Value::Bool(true));
        // Non-numeric strings both coerce to 0.
        assert_eq!(op(BinOp::Eq, "abc", "xyz").unwrap(), Value::Bool(true));
    }

    #[test]
    fn list_equality_is_structural() {
        assert_eq!(op(BinOp::Eq, ints(&[1, 2]), ints(&[1, 2])).unwrap(), Value::Bool(true));
        assert_eq!(op(BinOp::Ne, ints(&[1, 2]), ints(&[2, 1])).unwrap(), Value::Bool(true));
        assert_eq!(op(BinOp::Eq, ints(&[1]), 1i64).unwrap(), Value::Bool(false));
        assert!(matches!(
            op(BinOp::Sub, ints(&[1]), 1i64),
            Err(RuntimeError::UnsupportedOperator { op: "-", .. })
        ));
    }

    #[test]
    fn logical_operators_use_truthiness() {
        assert_eq!(op(BinOp::And, "x", ints(&[1])).unwrap(), Value::Bool(true));
        assert_eq!(op(BinOp::And, 1i64, 0i64).unwrap(), Value::Bool(false));
        assert_eq!(op(BinOp::Or, "", 0.0).unwrap(), Value::Bool(false));
        assert_eq!(op(BinOp::Or, Value::list(vec![]), true).unwrap(), Value::Bool(true));
    }

    #[test]
    fn step_keeps_integer_type() {
        assert_eq!(Value::Int(1).step(Step::Increment).unwrap(), Value::Int(2));
        assert_eq!(Value::Float(1.5).step(Step::Decrement).unwrap(), Value::Float(0.5));
        assert_eq!(Value::str("9").step(Step::Increment).unwrap(), Value::Int(10));
        assert!(ints(&[1]).step(Step::Increment).is_err());
    }

    #[test]
    fn sniff_order() {
        assert_eq!(Value::sniff("TRUE"), Value::Bool(true));
        assert_eq!(Value::sniff("42"), Value::Int(42));
        assert_eq!(Value::sniff("-4.5"), Value::Float(-4.5));
        assert_eq!(Value::sniff("\"quoted\""), Value::str("quoted"));
        assert_eq!(Value::sniff("plain text"), Value::str("plain text"));
        assert_eq!(Value::sniff("inf"), Value::str("inf"));
        assert_eq!(Value::sniff("[]"), Value::list(vec![]));
        assert_eq!(
            Value::sniff("[1, 2.5, true, \"x\", y]"),
            Value::list(vec![
                Value::Int(1),
                Value::Float(2.5),
                Value::Bool(true),
                Value::str("x"),
                Value::str("y"),
            ])
        );
        assert_eq!(Value::sniff("[[1, 2], [3]]"), Value::list(vec![ints(&[1, 2]), ints(&[3])]));
    }

    #[test]
    fn display_then_sniff_preserves_values() {
        for v in [
            Value::Int(-12),
            Value::Float(3.0),
            Value::Float(0.25),
            Value::Bool(false),
            Value::list(vec![Value::Int(1), Value::str("b"), ints(&[2])]),
        ] {
            assert_eq!(Value::sniff(&v.to_string()), v);
        }
    }

    #[test]
    fn index_coercion() {
        assert_eq!(Value::Int(2).as_index().unwrap(), 2);
        assert_eq!(Value::Float(2.9).as_index().unwrap(), 2);
        assert_eq!(Value::str("3").as_index().unwrap(), 3);
        assert!(Value::str("x").as_index().is_err());
        assert!(Value::Nil.as_index().is_err());
    }

    #[test]
    fn lists_are_shared() {
        let a = ints(&[1, 2]);
        let b = a.clone();
        if let Value::List(items) = &b {
            items.borrow_mut()[0] = Value::Int(9);
        }
        assert_eq!(a, ints(&[9, 2]));
    }
}
