//! Builtin objects reachable through `use` and method calls.
//!
//! `use name;` looks `name` up in a [`LibraryRegistry`], constructs a fresh
//! object and binds it in global scope.  Method calls on that binding go
//! through [`BuiltinObject::call_method`]; each object type owns its own
//! method table.  Lists carry a small method table of their own
//! ([`call_list_method`]).

use std::cell::RefCell;
use std::collections::HashMap;
use std::fmt;
use std::rc::Rc;

use crate::console::Console;

use super::error::RuntimeError;
use super::value::{ListRef, ObjectRef, Value};

/// An object a script can call methods on.
pub trait BuiltinObject: fmt::Debug {
    /// Name used in `<…>` display text and error messages.
    fn type_name(&self) -> &str;

    /// Invoke `method` with already-evaluated arguments.  Output goes to
    /// `console`.
    fn call_method(
        &mut self,
        method: &str,
        args: Vec<Value>,
        console: &mut dyn Console,
    ) -> Result<Value, RuntimeError>;
}

/// Creates a fresh library object for each `use`.
pub type Constructor = Rc<dyn Fn() -> ObjectRef>;

#[derive(Clone)]
struct Entry {
    binding: String,
    make: Constructor,
}

/// Library name → (global binding name, constructor).
#[derive(Clone)]
pub struct LibraryRegistry {
    entries: HashMap<String, Entry>,
}

impl LibraryRegistry {
    /// A registry that knows no libraries.
    pub fn empty() -> Self {
        LibraryRegistry { entries: HashMap::new() }
    }

    /// Register (or replace) a library.  `use name;` binds the constructed
    /// object as `binding`.
    pub fn register(
        &mut self,
        name: impl Into<String>,
        binding: impl Into<String>,
        make: impl Fn() -> ObjectRef + 'static,
    ) {
        self.entries.insert(
            name.into(),
            Entry { binding: binding.into(), make: Rc::new(make) },
        );
    }

    pub fn contains(&self, name: &str) -> bool {
        self.entries.contains_key(name)
    }

    /// Sorted library names, for diagnostics.
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.entries.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    /// Construct the library `name`, returning its binding name and object.
    pub fn instantiate(&self, name: &str) -> Result<(String, Value), RuntimeError> {
        let entry = self
            .entries
            .get(name)
            .ok_or_else(|| RuntimeError::UnknownLibrary(name.to_owned()))?;
        Ok((entry.binding.clone(), Value::Object((entry.make)())))
    }
}

impl Default for LibraryRegistry {
    /// The builtin set: just `blockchain`.
    fn default() -> Self {
        let mut reg = LibraryRegistry::empty();
        reg.register("blockchain", "blockchain", || {
            Rc::new(RefCell::new(Ledger::default())) as ObjectRef
        });
        reg
    }
}

impl fmt::Debug for LibraryRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.names()).finish()
    }
}

fn expect_arity(method: &str, args: &[Value], expected: usize) -> Result<(), RuntimeError> {
    if args.len() == expected {
        Ok(())
    } else {
        Err(RuntimeError::ArityMismatch {
            name: method.to_owned(),
            expected,
            found: args.len(),
        })
    }
}

// ── Lists ─────────────────────────────────────────────────────────────────────

/// Method table for list values: `numInstances()`, `add(x)`, `remove(i)`.
pub fn call_list_method(
    items: &ListRef,
    method: &str,
    args: Vec<Value>,
) -> Result<Value, RuntimeError> {
    match method {
        "numInstances" => {
            expect_arity(method, &args, 0)?;
            Ok(Value::Int(items.borrow().len() as i64))
        }
        "add" => {
            expect_arity(method, &args, 1)?;
            items.borrow_mut().extend(args);
            Ok(Value::Nil)
        }
        "remove" => {
            expect_arity(method, &args, 1)?;
            let index = args[0].as_index()?;
            let mut items = items.borrow_mut();
            let len = items.len();
            match usize::try_from(index) {
                Ok(i) if i < len => {
                    items.remove(i);
                    Ok(Value::Nil)
                }
                _ => Err(RuntimeError::IndexOutOfRange { index, len }),
            }
        }
        _ => Err(RuntimeError::UnknownMethod {
            target: "list".to_owned(),
            method: method.to_owned(),
        }),
    }
}

// ── Ledger ────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone)]
struct Transaction {
    id: String,
    to: String,
    amount: f64,
    hash: i32,
}

/// A toy single-account ledger, bound by `use blockchain;`.
///
/// Nothing is persisted or verified.  The "address" is a 32-bit string hash
/// of the key, and transaction hashes are the same hash over the
/// transaction's fields.
#[derive(Debug, Default)]
pub struct Ledger {
    address: Option<String>,
    balance: f64,
    history: Vec<Transaction>,
}

impl Ledger {
    pub fn balance(&self) -> f64 {
        self.balance
    }

    fn from_address(&self) -> &str {
        self.address.as_deref().unwrap_or("null")
    }

    fn init(&mut self, key: &str, amount: f64, console: &mut dyn Console) {
        let address = format!("{:x}", string_hash(key) as u32);
        self.balance = amount;
        console.print_line("[blockchain] Initialized:");
        console.print_line(&format!("    Address: {address}"));
        console.print_line(&format!("    Balance: {}", Value::Float(amount)));
        self.address = Some(address);
    }

    fn transaction(&mut self, to: String, amount: f64, console: &mut dyn Console) -> Value {
        if amount > self.balance {
            console.print_line("[blockchain] Transaction failed: insufficient funds.");
            return Value::Bool(false);
        }
        self.balance -= amount;
        let id = format!("tx-{:06}", self.history.len() + 1);
        let hash = string_hash(&format!(
            "{}{}{}{}",
            self.from_address(),
            to,
            Value::Float(amount),
            id
        ));
        console.print_line("[blockchain] Transaction successful!");
        console.print_line(&format!("    hashCode: {hash}"));
        console.print_line(&format!("    transactionID: {id}"));
        console.print_line(&format!("    amount: {}", Value::Float(amount)));
        console.print_line(&format!("    to Address: {to}"));
        self.history.push(Transaction { id, to, amount, hash });
        Value::Bool(true)
    }

    fn show_history(&self, console: &mut dyn Console) -> Value {
        if self.history.is_empty() {
            console.print_line("[blockchain] No transactions found.");
            return Value::list(Vec::new());
        }
        console.print_line("[blockchain] Transaction History:");
        for (i, tx) in self.history.iter().enumerate() {
            console.print_line(&format!("  Transaction {}:", i + 1));
            console.print_line(&format!("    To Address: {}", tx.to));
            console.print_line(&format!("    Amount: {}", Value::Float(tx.amount)));
            console.print_line(&format!("    Transaction ID: {}", tx.id));
            console.print_line(&format!("    Hash Code: {}", tx.hash));
        }
        Value::list(self.history.iter().map(|tx| Value::str(tx.id.as_str())).collect())
    }
}

impl BuiltinObject for Ledger {
    fn type_name(&self) -> &str {
        "blockchain"
    }

    fn call_method(
        &mut self,
        method: &str,
        args: Vec<Value>,
        console: &mut dyn Console,
    ) -> Result<Value, RuntimeError> {
        match method {
            "init" => {
                expect_arity(method, &args, 2)?;
                let key = string_arg(method, &args[0])?;
                let amount = amount_arg(method, &args[1])?;
                self.init(&key, amount, console);
                Ok(Value::Nil)
            }
            "transaction" => {
                expect_arity(method, &args, 2)?;
                let to = string_arg(method, &args[0])?;
                let amount = amount_arg(method, &args[1])?;
                Ok(self.transaction(to, amount, console))
            }
            "showCurrentBalance" => {
                expect_arity(method, &args, 0)?;
                console.print_line(&format!(
                    "[blockchain] Current Balance: {}",
                    Value::Float(self.balance)
                ));
                Ok(Value::Float(self.balance))
            }
            "showTransactionHistory" => {
                expect_arity(method, &args, 0)?;
                Ok(self.show_history(console))
            }
            _ => Err(RuntimeError::UnknownMethod {
                target: self.type_name().to_owned(),
                method: method.to_owned(),
            }),
        }
    }
}

fn string_arg(method: &str, v: &Value) -> Result<String, RuntimeError> {
    match v {
        Value::Str(s) => Ok(s.clone()),
        other => Err(RuntimeError::TypeMismatch(format!(
            "{method} expects a string, got {}",
            other.type_name()
        ))),
    }
}

fn amount_arg(method: &str, v: &Value) -> Result<f64, RuntimeError> {
    match v {
        Value::Int(n) => Ok(*n as f64),
        Value::Float(x) => Ok(*x),
        other => Err(RuntimeError::TypeMismatch(format!(
            "{method} expects a number, got {}",
            other.type_name()
        ))),
    }
}

/// 32-bit polynomial string hash (`h = 31*h + unit` over UTF-16 units).
fn string_hash(s: &str) -> i32 {
    s.encode_utf16()
        .fold(0i32, |h, unit| h.wrapping_mul(31).wrapping_add(i32::from(unit)))
}

// ── Tests ─────────────────────────────────────────────────────────────────────
