//! Timer bookkeeping for `@EVENT_TRIGGER` statements.
//!
//! [`Scheduler`] keeps the armed [`ScheduledTask`]s and knows when the next
//! one is due (for use as a `tokio::time::sleep_until` deadline).  It never
//! runs anything itself: the interpreter calls [`Scheduler::take_ready`],
//! executes each action, then [`Scheduler::reschedule`]s the tasks whose
//! [`ScheduledTask::tick`] says they continue.
//!
//! Times are [`tokio::time::Instant`]s so paused-clock tests can drive the
//! schedule deterministically.

use std::rc::Rc;
use std::time::Duration;

use tokio::time::Instant;

use crate::script::ast::Stmt;

/// How a task was armed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Trigger {
    /// Fires every `interval`, starting one interval after arming.
    Every(Duration),
    /// Fires once at an absolute instant.
    At(Instant),
}

/// One armed timer.
#[derive(Debug, Clone)]
pub struct ScheduledTask {
    /// Monotonically increasing task ID.
    pub id: u32,
    /// Statement executed on each firing.
    pub action: Rc<Stmt>,
    pub trigger: Trigger,
    /// When this task should next fire.
    pub next_run: Instant,
    /// Remaining firings; `None` means fire forever.
    pub runs_left: Option<u32>,
}

impl ScheduledTask {
    /// Consume one firing and move `next_run` forward one interval.
    ///
    /// Returns `true` if the task should be rescheduled.
    pub fn tick(&mut self) -> bool {
        let interval = match self.trigger {
            Trigger::At(_) => return false,
            Trigger::Every(interval) => interval,
        };
        if let Some(ref mut n) = self.runs_left {
            *n = n.saturating_sub(1);
            if *n == 0 {
                return false;
            }
        }
        // Step from the planned time, not from now, so the period doesn't drift.
        self.next_run += interval;
        true
    }

    /// Whether finishing this task should stop the whole program.
    /// True for counted repeating tasks only.
    pub fn halts_when_done(&self) -> bool {
        matches!(self.trigger, Trigger::Every(_)) && self.runs_left.is_some()
    }
}

/// The set of armed tasks.
#[derive(Debug)]
pub struct Scheduler {
    tasks: Vec<ScheduledTask>,
    next_id: u32,
}

impl Default for Scheduler {
    fn default() -> Self {
        Self::new()
    }
}

impl Scheduler {
    pub fn new() -> Self {
        Scheduler { tasks: Vec::new(), next_id: 1 }
    }

    /// Arm a repeating task: `runs = None` fires forever, `Some(n)` fires
    /// `n` times.  Returns the task ID.
    pub fn schedule_every(&mut self, action: Rc<Stmt>, interval: Duration, runs: Option<u32>) -> u32 {
        let next_run = Instant::now() + interval;
        self.add(action, Trigger::Every(interval), next_run, runs)
    }

    /// Arm a one-shot task at `at`.  Returns the task ID.
    pub fn schedule_at(&mut self, action: Rc<Stmt>, at: Instant) -> u32 {
        self.add(action, Trigger::At(at), at, Some(1))
    }

    fn add(&mut self, action: Rc<Stmt>, trigger: Trigger, next_run: Instant, runs_left: Option<u32>) -> u32 {
        let id = self.next_id;
        self.next_id += 1;
        self.tasks.push(ScheduledTask { id, action, trigger, next_run, runs_left });
        id
    }

    /// Remove a task by ID.  Returns `true` if found.
    pub fn cancel(&mut self, id: u32) -> bool {
        let before = self.tasks.len();
        self.tasks.retain(|t| t.id != id);
        self.tasks.len() < before
    }

    /// Drop every armed task.
    pub fn clear(&mut self) {
        self.tasks.clear();
    }

    /// The soonest `next_run` across all tasks, or `None` if nothing is armed.
    pub fn next_wakeup(&self) -> Option<Instant> {
        self.tasks.iter().map(|t| t.next_run).min()
    }

    /// Remove and return every task with `next_run <= now`, earliest first
    /// (ties broken by arming order).
    pub fn take_ready(&mut self, now: Instant) -> Vec<ScheduledTask> {
        let (mut ready, pending): (Vec<_>, Vec<_>) =
            self.tasks.drain(..).partition(|t| t.next_run <= now);
        self.tasks = pending;
        ready.sort_by_key(|t| (t.next_run, t.id));
        ready
    }

    /// Put a task back after it fired (call [`ScheduledTask::tick`] first).
    pub fn reschedule(&mut self, task: ScheduledTask) {
        self.tasks.push(task);
    }

    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::script::ast::Expr;
    use crate::script::value::Value;

    fn ms(n: u64) -> Duration {
        Duration::from_millis(n)
    }

    fn action() -> Rc<Stmt> {
        Rc::new(Stmt::Print(Expr::Literal(Value::Int(1))))
    }

    fn task(id: u32, trigger: Trigger, next_run: Instant, runs_left: Option<u32>) -> ScheduledTask {
        ScheduledTask { id, action: action(), trigger, next_run, runs_left }
    }

    #[test]
    fn schedule_and_cancel() {
        let mut s = Scheduler::new();
        let id = s.schedule_every(action(), ms(100), Some(3));
        assert_eq!(s.len(), 1);
        assert!(s.cancel(id));
        assert!(!s.cancel(id));
        assert!(s.is_empty());
    }

    #[test]
    fn ids_increase() {
        let mut s = Scheduler::new();
        let a = s.schedule_every(action(), ms(10), None);
        let b = s.schedule_at(action(), Instant::now() + ms(10));
        assert!(b > a);
    }

    #[test]
    fn next_wakeup_returns_soonest() {
        let mut s = Scheduler::new();
        assert!(s.next_wakeup().is_none());
        let now = Instant::now();
        s.schedule_at(action(), now + ms(200));
        s.schedule_at(action(), now + ms(50));
        assert_eq!(s.next_wakeup(), Some(now + ms(50)));
    }

    #[test]
    fn take_ready_only_returns_due_tasks_in_order() {
        let mut s = Scheduler::new();
        let now = Instant::now();
        s.reschedule(task(3, Trigger::Every(ms(10)), now - ms(1), None));
        s.reschedule(task(1, Trigger::Every(ms(10)), now - ms(5), None));
        s.reschedule(task(2, Trigger::Every(ms(10)), now + ms(1000), None));
        let ready = s.take_ready(now);
        assert_eq!(ready.iter().map(|t| t.id).collect::<Vec<_>>(), vec![1, 3]);
        assert_eq!(s.len(), 1);
    }

    #[test]
    fn counted_task_ticks_down_and_halts() {
        let now = Instant::now();
        let mut t = task(1, Trigger::Every(ms(10)), now, Some(2));
        assert!(t.halts_when_done());
        assert!(t.tick());
        assert_eq!(t.next_run, now + ms(10));
        assert_eq!(t.runs_left, Some(1));
        assert!(!t.tick());
    }

    #[test]
    fn unlimited_task_never_stops() {
        let mut t = task(1, Trigger::Every(ms(10)), Instant::now(), None);
        assert!(!t.halts_when_done());
        for _ in 0..1000 {
            assert!(t.tick());
        }
    }

    #[test]
    fn absolute_task_fires_once_without_halting() {
        let at = Instant::now() + ms(10);
        let mut t = task(1, Trigger::At(at), at, Some(1));
        assert!(!t.halts_when_done());
        assert!(!t.tick());
    }

    #[test]
    fn clear_drops_everything() {
        let mut s = Scheduler::new();
        s.schedule_every(action(), ms(100), None);
        s.schedule_every(action(), ms(200), Some(1));
        s.clear();
        assert!(s.is_empty());
        assert!(s.next_wakeup().is_none());
    }
}
