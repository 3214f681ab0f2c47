//! Cooperative fixed-period scheduler.
//!
//! One thread, one base period.  Each pass adds the elapsed time to every
//! task's accumulator and ticks, in registration order, each task whose
//! accumulator reached its period.  A task fires at most once per pass.
//!
//! ```text
//!  pass ──▶ slot 0: elapsed += Δ ── ≥ period? ──▶ tick(now)
//!           slot 1: elapsed += Δ ── ≥ period? ──▶ tick(now)
//!           ...
//! ```
//!
//! A task is initialised on the first pass after it was registered, just
//! before that pass's period check, so `init` always precedes `tick`.

use core::time::Duration;

use log::{info, warn};

use super::{Millis, Task};
use crate::app::ports::Clock;
use crate::config::MAX_TASKS;

/// What happens to a task's accumulator when it fires.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Accounting {
    /// Reset to zero: ticks are spaced at least one period apart, and a
    /// late pass shifts every later tick.
    #[default]
    Reset,
    /// Keep the overshoot, capped below one period, so the average rate
    /// holds without catch-up bursts after a late pass.
    Carry,
}

struct Entry<'a> {
    task: &'a mut dyn Task,
    period: Millis,
    elapsed: Millis,
    initialized: bool,
}

pub struct Scheduler<'a, const N: usize = MAX_TASKS> {
    entries: heapless::Vec<Entry<'a>, N>,
    base_period: Millis,
    accounting: Accounting,
    now: Millis,
}

impl<'a, const N: usize> Scheduler<'a, N> {
    pub fn new(base_period: Millis) -> Self {
        Self {
            entries: heapless::Vec::new(),
            base_period,
            accounting: Accounting::Reset,
            now: 0,
        }
    }

    pub fn with_accounting(mut self, accounting: Accounting) -> Self {
        self.accounting = accounting;
        self
    }

    /// Add a task.  Returns the slot index, or `None` if the table is full
    /// or the period is zero.
    pub fn register(&mut self, task: &'a mut dyn Task, period: Millis) -> Option<usize> {
        let name = task.name();
        if period == 0 {
            warn!("Scheduler: '{}' rejected, period must be > 0", name);
            return None;
        }
        if period % self.base_period != 0 {
            warn!(
                "Scheduler: '{}' period {} ms is not a multiple of base {} ms",
                name, period, self.base_period
            );
        }
        let slot = self.entries.len();
        let entry = Entry {
            task,
            period,
            elapsed: 0,
            initialized: false,
        };
        if self.entries.push(entry).is_err() {
            warn!("Scheduler: table full ({}), '{}' rejected", N, name);
            return None;
        }
        info!("Scheduler: added '{}' every {} ms at slot {}", name, period, slot);
        Some(slot)
    }

    /// Run one pass after `elapsed` ms.  Returns how many tasks ticked.
    pub fn run_once(&mut self, elapsed: Millis) -> usize {
        self.now = self.now.saturating_add(elapsed);
        let now = self.now;
        let mut fired = 0;

        for entry in &mut self.entries {
            if !entry.initialized {
                entry.task.init(now);
                entry.initialized = true;
                entry.elapsed = 0;
            }

            entry.elapsed = entry.elapsed.saturating_add(elapsed);
            if entry.elapsed >= entry.period {
                entry.elapsed = match self.accounting {
                    Accounting::Reset => 0,
                    Accounting::Carry => (entry.elapsed - entry.period) % entry.period,
                };
                entry.task.tick(now);
                fired += 1;
            }
        }

        fired
    }

    /// Drive the table forever at the base period, measuring each pass's
    /// elapsed time on `clock`.
    pub fn run(&mut self, clock: &impl Clock) -> ! {
        self.now = clock.now_ms();
        let mut last = self.now;
        info!(
            "Scheduler: running {} task(s), base period {} ms",
            self.entries.len(),
            self.base_period
        );
        loop {
            std::thread::sleep(Duration::from_millis(self.base_period));
            let now = clock.now_ms();
            self.run_once(now.saturating_sub(last));
            last = now;
        }
    }

    /// Virtual time of the last pass.
    pub fn now(&self) -> Millis {
        self.now
    }

    pub fn base_period(&self) -> Millis {
        self.base_period
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

// ═══════════════════════════════════════════════════════════════
//  Tests
// ═══════════════════════════════════════════════════════════════

#[cfg(test)]
mod tests {
    use super::*;

    /// Records init/tick calls and fails loudly on a tick before init.
    struct RecordingTask {
        name: &'static str,
        inits: u32,
        ticks: Vec<Millis>,
    }

    impl RecordingTask {
        fn new(name: &'static str) -> Self {
            Self {
                name,
                inits: 0,
                ticks: Vec::new(),
            }
        }
    }

    impl Task for RecordingTask {
        fn name(&self) -> &'static str {
            self.name
        }

        fn init(&mut self, _now: Millis) {
            self.inits += 1;
        }

        fn tick(&mut self, now: Millis) {
            assert_eq!(self.inits, 1, "tick before init");
            self.ticks.push(now);
        }
    }

    #[test]
    fn init_once_before_first_tick() {
        let mut t = RecordingTask::new("t");
        {
            let mut sched: Scheduler<'_, 4> = Scheduler::new(50);
            sched.register(&mut t, 50).unwrap();
            for _ in 0..10 {
                sched.run_once(50);
            }
        }
        assert_eq!(t.inits, 1);
        assert_eq!(t.ticks.len(), 10);
    }

    #[test]
    fn fires_at_period() {
        let mut fast = RecordingTask::new("fast");
        let mut slow = RecordingTask::new("slow");
        {
            let mut sched: Scheduler<'_, 4> = Scheduler::new(50);
            sched.register(&mut fast, 100).unwrap();
            sched.register(&mut slow, 200).unwrap();
            for _ in 0..8 {
                sched.run_once(50);
            }
        }
        assert_eq!(fast.ticks, vec![100, 200, 300, 400]);
        assert_eq!(slow.ticks, vec![200, 400]);
    }

    #[test]
    fn first_tick_within_one_period() {
        let mut t = RecordingTask::new("t");
        {
            let mut sched: Scheduler<'_, 2> = Scheduler::new(50);
            sched.register(&mut t, 100).unwrap();
            assert_eq!(sched.run_once(50), 0);
            assert_eq!(sched.run_once(50), 1);
        }
        assert_eq!(t.inits, 1);
        assert_eq!(t.ticks, vec![100]);
    }

    #[test]
    fn full_table_rejects() {
        let mut a = RecordingTask::new("a");
        let mut b = RecordingTask::new("b");
        let mut c = RecordingTask::new("c");
        let mut sched: Scheduler<'_, 2> = Scheduler::new(50);
        assert_eq!(sched.register(&mut a, 50), Some(0));
        assert_eq!(sched.register(&mut b, 50), Some(1));
        assert_eq!(sched.register(&mut c, 50), None);
        assert_eq!(sched.len(), 2);
    }

    #[test]
    fn zero_period_rejected() {
        let mut a = RecordingTask::new("a");
        let mut sched: Scheduler<'_, 2> = Scheduler::new(50);
        assert_eq!(sched.register(&mut a, 0), None);
        assert!(sched.is_empty());
    }

    #[test]
    fn fires_at_most_once_per_pass() {
        let mut t = RecordingTask::new("t");
        {
            let mut sched: Scheduler<'_, 2> = Scheduler::new(50);
            sched.register(&mut t, 100).unwrap();
            // A pass five periods late still produces one tick.
            assert_eq!(sched.run_once(500), 1);
            assert_eq!(sched.run_once(50), 0);
        }
        assert_eq!(t.ticks.len(), 1);
    }

    #[test]
    fn carry_keeps_overshoot_below_one_period() {
        let mut t = RecordingTask::new("t");
        {
            let mut sched: Scheduler<'_, 2> =
                Scheduler::new(50).with_accounting(Accounting::Carry);
            sched.register(&mut t, 100).unwrap();
            sched.run_once(150); // fires, carries 50
            sched.run_once(50); // 100 accumulated, fires
            sched.run_once(50); // 50, no fire
        }
        assert_eq!(t.ticks, vec![150, 200]);
    }

    #[test]
    fn registration_order_is_tick_order() {
        use std::cell::RefCell;
        use std::rc::Rc;

        struct Ordered {
            name: &'static str,
            log: Rc<RefCell<Vec<&'static str>>>,
        }
        impl Task for Ordered {
            fn name(&self) -> &'static str {
                self.name
            }
            fn tick(&mut self, _now: Millis) {
                self.log.borrow_mut().push(self.name);
            }
        }

        let log = Rc::new(RefCell::new(Vec::new()));
        let mut first = Ordered { name: "first", log: log.clone() };
        let mut second = Ordered { name: "second", log: log.clone() };
        {
            let mut sched: Scheduler<'_, 2> = Scheduler::new(50);
            sched.register(&mut second, 50).unwrap();
            sched.register(&mut first, 50).unwrap();
            sched.run_once(50);
        }
        assert_eq!(*log.borrow(), vec!["second", "first"]);
    }
}
