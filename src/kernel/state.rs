//! Per-task FSM bookkeeping.
//!
//! Every task FSM needs the same three things: the current state, when it
//! was entered, and a one-shot "just entered" latch so entry actions run on
//! the first tick after a transition and never again.

use super::Millis;

#[derive(Debug, Clone, Copy)]
pub struct StateTracker<S> {
    state: S,
    entered_at: Millis,
    just_entered: bool,
}

impl<S: Copy + PartialEq> StateTracker<S> {
    /// Start in `initial`.  The latch is armed so the first tick runs the
    /// initial state's entry action.
    pub const fn new(initial: S) -> Self {
        Self {
            state: initial,
            entered_at: 0,
            just_entered: true,
        }
    }

    /// Enter `next` at `now` and re-arm the latch.  Re-entering the current
    /// state is a real transition too.
    pub fn set(&mut self, next: S, now: Millis) {
        self.state = next;
        self.entered_at = now;
        self.just_entered = true;
    }

    pub fn current(&self) -> S {
        self.state
    }

    pub fn is(&self, state: S) -> bool {
        self.state == state
    }

    /// Read-and-clear the entry latch.
    pub fn take_just_entered(&mut self) -> bool {
        core::mem::take(&mut self.just_entered)
    }

    pub fn elapsed(&self, now: Millis) -> Millis {
        now.saturating_sub(self.entered_at)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Clone, Copy, PartialEq)]
    enum S {
        A,
        B,
    }

    #[test]
    fn latch_fires_once_per_entry() {
        let mut t = StateTracker::new(S::A);
        assert!(t.take_just_entered());
        assert!(!t.take_just_entered());

        t.set(S::B, 100);
        assert!(t.is(S::B));
        assert!(t.take_just_entered());
        assert!(!t.take_just_entered());
    }

    #[test]
    fn elapsed_measured_from_entry() {
        let mut t = StateTracker::new(S::A);
        t.set(S::A, 1_000);
        assert_eq!(t.elapsed(1_250), 250);
        // A clock that appears to go backwards clamps to zero.
        assert_eq!(t.elapsed(900), 0);
    }
}
