//! Parallel task runner: one core-pinned thread per task.
//!
//! Each thread calls `init` once and then `tick` on a fixed-rate
//! schedule (`next_wake += period`), so tick spacing does not drift with
//! the tick's own run time.  An overrun skips ahead instead of bursting.
//! Tasks run concurrently, so anything they share must be guarded; see
//! [`TmsContext`](crate::context::TmsContext).

use core::ffi::CStr;
use core::time::Duration;
use std::io;
use std::thread::JoinHandle;

use log::warn;

use super::task_pin::{Core, spawn_on_core};
use super::{Millis, Task};
use crate::app::ports::Clock;

/// Spawn parameters for one task thread.
#[derive(Debug, Clone, Copy)]
pub struct TaskRunner {
    name: &'static CStr,
    period: Millis,
    priority: u8,
    stack_kb: usize,
    core: Core,
}

impl TaskRunner {
    pub fn new(name: &'static CStr, period: Millis) -> Self {
        Self {
            name,
            period,
            priority: 5,
            stack_kb: 4,
            core: Core::App,
        }
    }

    pub fn priority(mut self, priority: u8) -> Self {
        self.priority = priority;
        self
    }

    pub fn stack_kb(mut self, stack_kb: usize) -> Self {
        self.stack_kb = stack_kb;
        self
    }

    pub fn core(mut self, core: Core) -> Self {
        self.core = core;
        self
    }

    /// Move `task` onto its own thread and run it forever.
    pub fn spawn<T, C>(self, mut task: T, clock: C) -> io::Result<JoinHandle<()>>
    where
        T: Task + Send + 'static,
        C: Clock + Send + 'static,
    {
        let period = self.period;
        spawn_on_core(self.core, self.priority, self.stack_kb, self.name, move || {
            run_periodic(&mut task, &clock, period, || true);
        })
    }
}

/// The loop each runner thread executes.  Returns once `keep_going`
/// reports `false`; the firmware passes `|| true`.
pub fn run_periodic<T, C>(
    task: &mut T,
    clock: &C,
    period: Millis,
    mut keep_going: impl FnMut() -> bool,
) where
    T: Task + ?Sized,
    C: Clock + ?Sized,
{
    let start = clock.now_ms();
    task.init(start);
    let mut next_wake = start;

    while keep_going() {
        task.tick(clock.now_ms());

        next_wake = next_wake.saturating_add(period);
        let now = clock.now_ms();
        if next_wake > now {
            std::thread::sleep(Duration::from_millis(next_wake - now));
        } else {
            warn!("{}: overran its {} ms period by {} ms", task.name(), period, now - next_wake);
            next_wake = now;
        }
    }
}
