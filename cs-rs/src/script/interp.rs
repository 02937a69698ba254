//! Tree-walking evaluator.
//!
//! The [`Interpreter`] owns the call stack, the function table, the
//! [`Scheduler`] and the host seams ([`Console`], [`Cipher`], the
//! [`LibraryRegistry`]).  It executes parsed [`Stmt`] trees one top-level
//! statement at a time; the async [`Runtime`](crate::runtime::Runtime)
//! drives it and sleeps until the next scheduled task once the program body
//! is done.
//!
//! Scheduled tasks that fall due while the program is running fire at the
//! next statement boundary, at the top of every loop iteration, or while an
//! `input` statement is waiting for a line.  A task body runs against the
//! global scope only and never services other tasks itself.
//!
//! Variable lookup is dynamic: reads and writes search every active frame
//! from the innermost call outward to the global scope, so a function sees
//! (and can overwrite) its callers' locals.

use std::collections::HashMap;
use std::rc::Rc;
use std::time::Duration;

use chrono::{Local, NaiveDateTime, TimeZone};
use tokio::time::Instant;
use tracing::{debug, error, info, warn};

use crate::config::Config;
use crate::console::{Console, LineRead};
use crate::scheduler::Scheduler;

use super::ast::{AssignOp, EventTrigger, Expr, FunctionDef, Step, Stmt, VarRef};
use super::cipher::{AesCbcCipher, Cipher};
use super::error::{Error, RuntimeError};
use super::library::{call_list_method, LibraryRegistry};
use super::parser::parse_program;
use super::value::{apply_binop, ListRef, ObjectRef, Value};

/// Default limit on nested function calls.
pub const DEFAULT_MAX_CALL_DEPTH: usize = 256;

/// Date-time format accepted by absolute event triggers (local time).
pub const EVENT_TIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

// Evaluation recurses on the native stack; grow it on the heap once less
// than the red zone remains.
const STACK_RED_ZONE: usize = 128 * 1024;
const STACK_GROW_SIZE: usize = 4 * 1024 * 1024;

// ── Variables and frames ──────────────────────────────────────────────────────

/// A stored binding.  When `encrypted` is set, `value` is the ciphertext
/// string; it is decrypted and re-sniffed on every decrypting read.
#[derive(Debug, Clone)]
pub struct Variable {
    pub value: Value,
    pub encrypted: bool,
}

impl Variable {
    fn plain(value: Value) -> Self {
        Variable { value, encrypted: false }
    }
}

type Scope = HashMap<String, Variable>;

/// Outcome of running a statement.
#[derive(Debug)]
pub enum Flow {
    Normal,
    /// A `return` is unwinding toward the nearest function call.
    Return(Value),
}

/// A counted scheduled task ran its last time; the host should stop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Halt {
    pub task_id: u32,
}

// ── Interpreter ───────────────────────────────────────────────────────────────

pub struct Interpreter {
    /// Call stack; index 0 is the global scope and is never popped.
    frames: Vec<Scope>,
    functions: HashMap<String, Rc<FunctionDef>>,
    console: Box<dyn Console>,
    cipher: Box<dyn Cipher>,
    libraries: LibraryRegistry,
    scheduler: Scheduler,
    max_depth: usize,
    /// Set while a scheduled task body runs.
    in_task: bool,
}

impl Interpreter {
    /// An interpreter with the default cipher, libraries and call-depth
    /// limit, talking to `console`.
    pub fn new(console: Box<dyn Console>) -> Self {
        Interpreter {
            frames: vec![Scope::new()],
            functions: HashMap::new(),
            console,
            cipher: Box::new(AesCbcCipher::default()),
            libraries: LibraryRegistry::default(),
            scheduler: Scheduler::new(),
            max_depth: DEFAULT_MAX_CALL_DEPTH,
            in_task: false,
        }
    }

    /// An interpreter configured from a loaded [`Config`].
    pub fn with_config(config: &Config, console: Box<dyn Console>) -> Self {
        let mut interp = Interpreter::new(console);
        interp.cipher = Box::new(config.cipher());
        interp.max_depth = config.max_call_depth;
        interp
    }

    /// Replace the cipher used for `@ENC` variables.
    pub fn with_cipher(mut self, cipher: Box<dyn Cipher>) -> Self {
        self.cipher = cipher;
        self
    }

    pub fn set_max_depth(&mut self, max: usize) {
        self.max_depth = max;
    }

    /// Make `use name;` bind a fresh object from `make` as `binding`.
    pub fn register_library(
        &mut self,
        name: impl Into<String>,
        binding: impl Into<String>,
        make: impl Fn() -> ObjectRef + 'static,
    ) {
        self.libraries.register(name, binding, make);
    }

    /// Construct library `name` and bind it in global scope (what `use`
    /// does).
    pub fn bind_library(&mut self, name: &str) -> Result<(), RuntimeError> {
        let (binding, object) = self.libraries.instantiate(name)?;
        info!(library = name, binding = %binding, "library bound");
        self.frames[0].insert(binding, Variable::plain(object));
        Ok(())
    }

    /// Set a plain global, shadowing nothing.
    pub fn set_global_var(&mut self, name: impl Into<String>, value: Value) {
        self.frames[0].insert(name.into(), Variable::plain(value));
    }

    /// The raw binding for `name` (ciphertext for encrypted variables).
    pub fn variable(&self, name: &str) -> Option<&Variable> {
        self.frames.iter().rev().find_map(|scope| scope.get(name))
    }

    /// Read `name` as a script would, decrypting if needed.
    pub fn get_var(&self, name: &str) -> Result<Value, RuntimeError> {
        self.read_var(name, true)
    }

    /// Number of active function calls.
    pub fn depth(&self) -> usize {
        self.frames.len() - 1
    }

    pub fn has_function(&self, name: &str) -> bool {
        self.functions.contains_key(name)
    }

    // ── Execution ─────────────────────────────────────────────────────────────

    /// Parse and execute `source`.  Tasks that fall due while it runs fire
    /// in between its statements; use [`Runtime`](crate::runtime::Runtime)
    /// to keep servicing them afterwards.
    pub fn exec_source(&mut self, source: &str) -> Result<(), Error> {
        let stmts = parse_program(source)?;
        self.execute(&stmts)?;
        Ok(())
    }

    /// Execute top-level statements in order, stopping at the first error.
    pub fn execute(&mut self, stmts: &[Stmt]) -> Result<(), RuntimeError> {
        for stmt in stmts {
            self.exec_top_level(stmt)?;
        }
        Ok(())
    }

    /// Execute one statement outside any function.  A `return` that escapes
    /// is an error.
    pub fn exec_top_level(&mut self, stmt: &Stmt) -> Result<(), RuntimeError> {
        match self.exec_stmt(stmt)? {
            Flow::Normal => Ok(()),
            Flow::Return(_) => {
                error!("return statement outside of function");
                Err(RuntimeError::ReturnOutsideFunction)
            }
        }
    }

    pub fn exec_block(&mut self, stmts: &[Stmt]) -> Result<Flow, RuntimeError> {
        for stmt in stmts {
            if let Flow::Return(v) = self.exec_stmt(stmt)? {
                return Ok(Flow::Return(v));
            }
        }
        Ok(Flow::Normal)
    }

    pub fn exec_stmt(&mut self, stmt: &Stmt) -> Result<Flow, RuntimeError> {
        self.service_tasks()?;
        stacker::maybe_grow(STACK_RED_ZONE, STACK_GROW_SIZE, || self.exec_stmt_inner(stmt))
    }

    fn exec_stmt_inner(&mut self, stmt: &Stmt) -> Result<Flow, RuntimeError> {
        match stmt {
            Stmt::Print(expr) => {
                let v = self.evaluate(expr, false)?;
                self.console.print_line(&v.to_string());
                Ok(Flow::Normal)
            }

            Stmt::If { cond, then_block, else_block } => {
                if self.evaluate(cond, true)?.is_truthy() {
                    self.exec_block(then_block)
                } else if let Some(block) = else_block {
                    self.exec_block(block)
                } else {
                    Ok(Flow::Normal)
                }
            }

            Stmt::For { init, cond, step, body } => {
                self.evaluate(init, true)?;
                while self.evaluate(cond, true)?.is_truthy() {
                    if let Flow::Return(v) = self.exec_block(body)? {
                        return Ok(Flow::Return(v));
                    }
                    self.evaluate(step, true)?;
                    self.service_tasks()?;
                }
                Ok(Flow::Normal)
            }

            Stmt::While { cond, body } => {
                while self.evaluate(cond, true)?.is_truthy() {
                    if let Flow::Return(v) = self.exec_block(body)? {
                        return Ok(Flow::Return(v));
                    }
                    self.service_tasks()?;
                }
                Ok(Flow::Normal)
            }

            Stmt::Input { prompt, target } => {
                self.exec_input(prompt, target)?;
                Ok(Flow::Normal)
            }

            Stmt::FunctionDef(def) => {
                debug!(function = %def.name, params = def.params.len(), "function defined");
                self.functions.insert(def.name.clone(), Rc::clone(def));
                Ok(Flow::Normal)
            }

            Stmt::Return(value) => {
                let v = match value {
                    Some(expr) => self.evaluate(expr, true)?,
                    None => Value::Nil,
                };
                Ok(Flow::Return(v))
            }

            Stmt::Use(name) => {
                self.bind_library(name)?;
                Ok(Flow::Normal)
            }

            Stmt::EventTrigger(trigger) => {
                self.exec_event_trigger(trigger)?;
                Ok(Flow::Normal)
            }

            Stmt::Expression(expr) => {
                self.evaluate(expr, true)?;
                Ok(Flow::Normal)
            }
        }
    }

    fn exec_input(&mut self, prompt: &Expr, target: &VarRef) -> Result<(), RuntimeError> {
        let prompt = match self.evaluate(prompt, true)? {
            Value::Str(s) => s,
            other => {
                return Err(RuntimeError::TypeMismatch(format!(
                    "input prompt must be a string, got {}",
                    other.type_name()
                )));
            }
        };
        // Wait for the line in slices that end at the next task deadline, so
        // timers keep firing while the user types.
        let line = loop {
            let deadline = if self.in_task { None } else { self.scheduler.next_wakeup() };
            let read = match deadline {
                None => self
                    .console
                    .read_line(&prompt)
                    .map(|line| line.map_or(LineRead::Eof, LineRead::Line)),
                Some(at) => {
                    let wait = at.saturating_duration_since(Instant::now());
                    self.console.read_line_timeout(&prompt, wait)
                }
            };
            match read.map_err(|e| RuntimeError::Input(e.to_string()))? {
                LineRead::Line(line) => break line,
                LineRead::Eof => return Err(RuntimeError::Input("end of input".to_owned())),
                LineRead::TimedOut => self.service_tasks()?,
            }
        };
        self.store(&target.name, Value::sniff(&line), target.encrypted)?;
        Ok(())
    }

    fn exec_event_trigger(&mut self, trigger: &EventTrigger) -> Result<(), RuntimeError> {
        let time = self.evaluate(&trigger.time, true)?;
        let times = match &trigger.times {
            Some(expr) => Some(self.evaluate(expr, true)?),
            None => None,
        };
        self.schedule_event(time, trigger.unit.as_deref(), Rc::clone(&trigger.action), times)?;
        Ok(())
    }

    // ── Scheduling ────────────────────────────────────────────────────────────

    /// Arm `action`.
    ///
    /// With a `unit` (`seconds`, `minutes`, `hours`), `time` is a delay and
    /// the action repeats every delay, forever or `times` times.  Without
    /// one, `time` must be a `YYYY-MM-DD HH:MM:SS` local date-time in the
    /// future and the action fires once.  Returns the task ID.
    pub fn schedule_event(
        &mut self,
        time: Value,
        unit: Option<&str>,
        action: Rc<Stmt>,
        times: Option<Value>,
    ) -> Result<u32, RuntimeError> {
        let invalid = |msg: String| RuntimeError::InvalidScheduleParameters(msg);

        let runs = match times {
            None => None,
            Some(v) => {
                let n = v
                    .as_index()
                    .map_err(|_| invalid(format!("repeat count must be an integer, got {v}")))?;
                if n < 1 {
                    return Err(invalid(format!("repeat count must be at least 1, got {n}")));
                }
                Some(u32::try_from(n).map_err(|_| invalid(format!("repeat count {n} is too large")))?)
            }
        };

        let Some(unit) = unit else {
            if runs.is_some() {
                return Err(invalid("an absolute time cannot take a repeat count".to_owned()));
            }
            let Value::Str(text) = &time else {
                return Err(invalid(format!("expected a date-time string, got {}", time.type_name())));
            };
            let delay = delay_until(text).map_err(invalid)?;
            let id = self.scheduler.schedule_at(action, Instant::now() + delay);
            debug!(task = id, at = %text, "one-shot task armed");
            return Ok(id);
        };

        let scale = match unit.to_ascii_lowercase().as_str() {
            "second" | "seconds" => 1.0,
            "minute" | "minutes" => 60.0,
            "hour" | "hours" => 3600.0,
            _ => return Err(invalid(format!("unknown time unit '{unit}'"))),
        };
        let secs = time
            .as_float()
            .map(|x| x * scale)
            .filter(|s| s.is_finite() && *s > 0.0)
            .ok_or_else(|| invalid(format!("delay must be a positive number, got {time}")))?;
        let interval = Duration::try_from_secs_f64(secs)
            .map_err(|e| invalid(format!("delay out of range: {e}")))?;
        let id = self.scheduler.schedule_every(action, interval, runs);
        debug!(task = id, ?interval, runs = ?runs, "repeating task armed");
        Ok(id)
    }

    /// When the next scheduled task is due.
    pub fn next_wakeup(&self) -> Option<Instant> {
        self.scheduler.next_wakeup()
    }

    pub fn pending_tasks(&self) -> usize {
        self.scheduler.len()
    }

    /// Disarm every scheduled task.
    pub fn cancel_tasks(&mut self) {
        if !self.scheduler.is_empty() {
            debug!(count = self.scheduler.len(), "cancelling scheduled tasks");
        }
        self.scheduler.clear();
    }

    /// Fire whatever is due now, unless a task body is already running.
    /// A counted task finishing here unwinds the program with
    /// [`RuntimeError::Halted`].
    fn service_tasks(&mut self) -> Result<(), RuntimeError> {
        if self.in_task {
            return Ok(());
        }
        let now = match self.scheduler.next_wakeup() {
            Some(at) if at <= Instant::now() => Instant::now(),
            _ => return Ok(()),
        };
        match self.run_due_tasks(now) {
            Some(Halt { task_id }) => Err(RuntimeError::Halted { task_id }),
            None => Ok(()),
        }
    }

    /// Run every task due at `now` against the global scope.  A failing
    /// task is logged and dropped.  Returns [`Halt`] once a counted task
    /// completes its final run.
    pub fn run_due_tasks(&mut self, now: Instant) -> Option<Halt> {
        // Park the active call frames so task bodies see globals only.
        let locals = self.frames.split_off(1);
        let in_task = std::mem::replace(&mut self.in_task, true);
        let halt = self.fire_ready(now);
        self.in_task = in_task;
        self.frames.extend(locals);
        halt
    }

    fn fire_ready(&mut self, now: Instant) -> Option<Halt> {
        let mut ready = self.scheduler.take_ready(now).into_iter();
        while let Some(mut task) = ready.next() {
            debug!(task = task.id, "firing scheduled task");
            if let Err(err) = self.exec_top_level(&task.action) {
                warn!(task = task.id, error = %err, "scheduled task failed; dropping it");
                continue;
            }
            if task.tick() {
                self.scheduler.reschedule(task);
            } else if task.halts_when_done() {
                info!(task = task.id, "counted task finished; halting");
                for rest in ready {
                    self.scheduler.reschedule(rest);
                }
                return Some(Halt { task_id: task.id });
            }
        }
        None
    }

    // ── Variables ─────────────────────────────────────────────────────────────

    fn lookup(&self, name: &str) -> Result<&Variable, RuntimeError> {
        self.variable(name)
            .ok_or_else(|| RuntimeError::UndefinedVariable(name.to_owned()))
    }

    fn read_var(&self, name: &str, decrypt: bool) -> Result<Value, RuntimeError> {
        let var = self.lookup(name)?;
        if var.encrypted && decrypt {
            self.decrypt(&var.value)
        } else {
            Ok(var.value.clone())
        }
    }

    /// Current typed value of `name`, decrypted regardless of mode, plus
    /// whether it is stored encrypted.
    fn read_plain(&self, name: &str) -> Result<(Value, bool), RuntimeError> {
        let var = self.lookup(name)?;
        let value = if var.encrypted { self.decrypt(&var.value)? } else { var.value.clone() };
        Ok((value, var.encrypted))
    }

    fn decrypt(&self, stored: &Value) -> Result<Value, RuntimeError> {
        let text = self
            .cipher
            .decrypt(&stored.to_string())
            .map_err(RuntimeError::Decryption)?;
        Ok(Value::sniff(&text))
    }

    /// Store `value` under `name`, encrypting it first if asked.  The
    /// binding goes to the innermost frame that already holds `name`, or the
    /// current frame if none does.  Returns what was stored.
    fn store(&mut self, name: &str, value: Value, encrypt: bool) -> Result<Value, RuntimeError> {
        let var = if encrypt {
            let ct = self
                .cipher
                .encrypt(&value.to_string())
                .map_err(RuntimeError::Encryption)?;
            Variable { value: Value::Str(ct), encrypted: true }
        } else {
            Variable::plain(value)
        };
        let stored = var.value.clone();
        let depth = self
            .frames
            .iter()
            .rposition(|scope| scope.contains_key(name))
            .unwrap_or(self.frames.len() - 1);
        self.frames[depth].insert(name.to_owned(), var);
        Ok(stored)
    }

    // ── Expressions ───────────────────────────────────────────────────────────

    /// Evaluate `expr`.  With `decrypt` false, encrypted variables yield
    /// their ciphertext (what `print` shows).
    pub fn evaluate(&mut self, expr: &Expr, decrypt: bool) -> Result<Value, RuntimeError> {
        stacker::maybe_grow(STACK_RED_ZONE, STACK_GROW_SIZE, || self.evaluate_inner(expr, decrypt))
    }

    fn evaluate_inner(&mut self, expr: &Expr, decrypt: bool) -> Result<Value, RuntimeError> {
        match expr {
            Expr::Literal(v) => Ok(v.clone()),

            Expr::Array(items) => {
                let values = items
                    .iter()
                    .map(|e| self.evaluate(e, decrypt))
                    .collect::<Result<Vec<_>, _>>()?;
                Ok(Value::list(values))
            }

            Expr::Variable(var) => self.read_var(&var.name, decrypt),

            Expr::Assign { target, op: AssignOp::Set, value } => {
                let v = self.evaluate(value, decrypt)?;
                self.store(&target.name, v, target.encrypted)
            }

            Expr::Assign { target, op, value } => {
                let rhs = self.evaluate(value, decrypt)?;
                let (current, was_encrypted) = self.read_plain(&target.name)?;
                let updated = match op.binop() {
                    Some(binop) => apply_binop(binop, &current, &rhs)?,
                    None => rhs,
                };
                self.store(&target.name, updated, target.encrypted || was_encrypted)
            }

            Expr::AssignIndex { target, index, op, value } => {
                let items = self.list_operand(target, decrypt)?;
                let len = items.borrow().len();
                let i = self.checked_index(index, decrypt, len)?;
                let rhs = self.evaluate(value, decrypt)?;
                // The right-hand side may be this very list, so no borrow is
                // held while the new element is computed.
                let updated = match op.binop() {
                    Some(binop) => {
                        let current = items.borrow().get(i).cloned();
                        let current = current.ok_or(RuntimeError::IndexOutOfRange {
                            index: i as i64,
                            len: items.borrow().len(),
                        })?;
                        apply_binop(binop, &current, &rhs)?
                    }
                    None => rhs,
                };
                let mut slots = items.borrow_mut();
                let len = slots.len();
                let slot = slots
                    .get_mut(i)
                    .ok_or(RuntimeError::IndexOutOfRange { index: i as i64, len })?;
                *slot = updated.clone();
                Ok(updated)
            }

            Expr::Index { target, index } => {
                let items = self.list_operand(target, decrypt)?;
                let len = items.borrow().len();
                let i = self.checked_index(index, decrypt, len)?;
                let items = items.borrow();
                items
                    .get(i)
                    .cloned()
                    .ok_or(RuntimeError::IndexOutOfRange { index: i as i64, len })
            }

            Expr::Binary(op, lhs, rhs) => {
                let l = self.evaluate(lhs, decrypt)?;
                let r = self.evaluate(rhs, decrypt)?;
                apply_binop(*op, &l, &r)
            }

            Expr::Not(inner) => Ok(Value::Bool(!self.evaluate(inner, decrypt)?.is_truthy())),

            Expr::Step { target, step, postfix } => self.eval_step(target, *step, *postfix),

            Expr::Call { name, args } => {
                let def = self.function(name)?;
                check_arity(&def, args.len())?;
                let values = args
                    .iter()
                    .map(|e| self.evaluate(e, decrypt))
                    .collect::<Result<Vec<_>, _>>()?;
                self.invoke(&def, values)
            }

            Expr::MethodCall { target, method, args } => {
                let target = self.evaluate(target, decrypt)?;
                let values = args
                    .iter()
                    .map(|e| self.evaluate(e, decrypt))
                    .collect::<Result<Vec<_>, _>>()?;
                self.call_method(&target, method, values)
            }
        }
    }

    fn eval_step(&mut self, target: &VarRef, step: Step, postfix: bool) -> Result<Value, RuntimeError> {
        let (old, was_encrypted) = self.read_plain(&target.name)?;
        let new = old.step(step)?;
        self.store(&target.name, new.clone(), target.encrypted || was_encrypted)?;
        Ok(if postfix { old } else { new })
    }

    fn list_operand(&mut self, target: &Expr, decrypt: bool) -> Result<ListRef, RuntimeError> {
        match self.evaluate(target, decrypt)? {
            Value::List(items) => Ok(items),
            other => Err(RuntimeError::TypeMismatch(format!(
                "cannot index into {}",
                other.type_name()
            ))),
        }
    }

    fn checked_index(&mut self, index: &Expr, decrypt: bool, len: usize) -> Result<usize, RuntimeError> {
        let i = self.evaluate(index, decrypt)?.as_index()?;
        match usize::try_from(i) {
            Ok(u) if u < len => Ok(u),
            _ => Err(RuntimeError::IndexOutOfRange { index: i, len }),
        }
    }

    // ── Calls ─────────────────────────────────────────────────────────────────

    fn function(&self, name: &str) -> Result<Rc<FunctionDef>, RuntimeError> {
        self.functions
            .get(name)
            .cloned()
            .ok_or_else(|| RuntimeError::UndefinedFunction(name.to_owned()))
    }

    /// Call a script function with already-evaluated arguments.
    pub fn call_function(&mut self, name: &str, args: Vec<Value>) -> Result<Value, RuntimeError> {
        let def = self.function(name)?;
        check_arity(&def, args.len())?;
        self.invoke(&def, args)
    }

    fn invoke(&mut self, def: &FunctionDef, args: Vec<Value>) -> Result<Value, RuntimeError> {
        let depth = self.frames.len();
        if depth > self.max_depth {
            return Err(RuntimeError::StackOverflow { depth, max: self.max_depth });
        }
        let scope: Scope = def
            .params
            .iter()
            .cloned()
            .zip(args.into_iter().map(Variable::plain))
            .collect();
        self.frames.push(scope);
        debug!(function = %def.name, depth, "call");
        let result = self.exec_block(&def.body);
        self.frames.pop();
        match result? {
            Flow::Return(v) => Ok(v),
            Flow::Normal => Ok(Value::Nil),
        }
    }

    fn call_method(&mut self, target: &Value, method: &str, args: Vec<Value>) -> Result<Value, RuntimeError> {
        match target {
            Value::List(items) => call_list_method(items, method, args),
            Value::Object(obj) => {
                let mut obj = obj.try_borrow_mut().map_err(|_| {
                    RuntimeError::TypeMismatch(format!("object is busy; cannot call {method}"))
                })?;
                obj.call_method(method, args, self.console.as_mut())
            }
            other => Err(RuntimeError::UnknownMethod {
                target: other.type_name().to_owned(),
                method: method.to_owned(),
            }),
        }
    }
}

fn check_arity(def: &FunctionDef, found: usize) -> Result<(), RuntimeError> {
    if def.params.len() == found {
        Ok(())
    } else {
        Err(RuntimeError::ArityMismatch {
            name: def.name.clone(),
            expected: def.params.len(),
            found,
        })
    }
}

/// Time from now until the local date-time `text`; errors if it is
/// malformed, ambiguous or not in the future.
fn delay_until(text: &str) -> Result<Duration, String> {
    let naive = NaiveDateTime::parse_from_str(text.trim(), EVENT_TIME_FORMAT)
        .map_err(|e| format!("invalid date-time '{text}' (expected YYYY-MM-DD HH:MM:SS): {e}"))?;
    let at = Local
        .from_local_datetime(&naive)
        .earliest()
        .ok_or_else(|| format!("'{text}' does not exist in the local time zone"))?;
    let delta = at.signed_duration_since(Local::now());
    if delta <= chrono::Duration::zero() {
        return Err(format!("'{text}' is in the past"));
    }
    delta.to_std().map_err(|e| e.to_string())
}

// ── Tests ─────────────────────────────────────────────────────────────────────
