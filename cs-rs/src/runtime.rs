//! Async driver for a CipherScript program.
//!
//! ## Architecture
//!
//! Everything runs on one task.  While the main program executes, the
//! interpreter fires due tasks at every statement boundary, every loop
//! iteration and while `input` waits.  Once the program body is done the
//! runtime sleeps until the next task deadline and repeats until nothing is
//! armed or a counted task halts the run.
//!
//! ```text
//!   ┌──────────────────────────────┐
//!   │  Runtime::run()              │
//!   │  for stmt in program:        │
//!   │    exec_top_level(stmt)      │──▶ tasks fire inside
//!   │  loop:                       │
//!   │    sleep_until(next_wakeup)  │
//!   │    run_due_tasks(now)        │
//!   └──────────────────────────────┘
//! ```
//!
//! Because firings interleave with the main program on the same thread, a
//! task body never observes a single statement half-executed.

use tokio::time::{sleep_until, Instant};
use tracing::{debug, info};

use crate::script::ast::Stmt;
use crate::script::error::{Error, RuntimeError};
use crate::script::interp::Interpreter;
use crate::script::parser::parse_program;

/// How a run ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunOutcome {
    /// The program finished and no scheduled tasks remain.
    Completed,
    /// A counted scheduled task ran its last time.
    Halted,
}

pub struct Runtime {
    interp: Interpreter,
}

impl Runtime {
    pub fn new(interp: Interpreter) -> Self {
        Runtime { interp }
    }

    pub fn interpreter(&self) -> &Interpreter {
        &self.interp
    }

    pub fn interpreter_mut(&mut self) -> &mut Interpreter {
        &mut self.interp
    }

    /// Parse and run `source` to completion.
    pub async fn run_source(&mut self, source: &str) -> Result<RunOutcome, Error> {
        let program = parse_program(source)?;
        debug!(statements = program.len(), "program parsed");
        self.run(&program).await
    }

    /// Run `program`, then service scheduled tasks until none remain or one
    /// halts the run.
    ///
    /// If a main-program statement fails, pending tasks are discarded and
    /// the error is returned.
    pub async fn run(&mut self, program: &[Stmt]) -> Result<RunOutcome, Error> {
        for stmt in program {
            match self.interp.exec_top_level(stmt) {
                Ok(()) => {}
                Err(RuntimeError::Halted { task_id }) => {
                    info!(task = task_id, "run halted by counted task");
                    return Ok(RunOutcome::Halted);
                }
                Err(e) => {
                    self.interp.cancel_tasks();
                    return Err(e.into());
                }
            }
        }

        while let Some(deadline) = self.interp.next_wakeup() {
            debug!(pending = self.interp.pending_tasks(), "waiting for next task");
            sleep_until(deadline).await;
            if let Some(halt) = self.interp.run_due_tasks(Instant::now()) {
                info!(task = halt.task_id, "run halted by counted task");
                return Ok(RunOutcome::Halted);
            }
        }
        Ok(RunOutcome::Completed)
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
