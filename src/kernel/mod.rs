//! Task kernel: the periodic-task contract and the two ways of running it.
//!
//! ```text
//!            ┌──────────── Task ────────────┐
//!            │ init(now)   once, first      │
//!            │ tick(now)   every period     │
//!            └──────────────┬───────────────┘
//!                           │
//!        ┌──────────────────┴──────────────────┐
//!        ▼                                     ▼
//!   Scheduler (WCS)                      TaskRunner (TMS)
//!   one thread, fixed base period,       one pinned thread per task,
//!   ticks in registration order          ticks concurrently
//! ```
//!
//! Tasks never block.  Long activities are split into FSM states that
//! advance one step per tick, using [`StateTracker`] for time-in-state.

pub mod runner;
pub mod scheduler;
pub mod state;
pub mod task_pin;

pub use runner::TaskRunner;
pub use scheduler::Scheduler;
pub use state::StateTracker;

/// Milliseconds since boot.
pub type Millis = u64;

/// A periodic unit of work.
///
/// Both runners guarantee `init` is called exactly once, before the first
/// `tick`, and that ticks of one task never overlap.
pub trait Task {
    /// Short name for log lines.
    fn name(&self) -> &'static str;

    /// One-time set-up.  `now` is the time base later ticks are measured in.
    fn init(&mut self, _now: Millis) {}

    /// One step of work.  Must return promptly.
    fn tick(&mut self, now: Millis);
}
