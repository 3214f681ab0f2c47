//! Blackboard threaded through every level-policy handler.
//!
//! The engine fills in the timing fields before each update; the caller
//! fills in the latest level.  Entry actions write the commanded opening.

use crate::config::LevelThresholds;
use crate::kernel::Millis;

pub struct PolicyContext {
    // -- Timing --
    /// Time of the current evaluation.
    pub now: Millis,
    /// Milliseconds since the current state was entered.
    pub ms_in_state: Millis,

    // -- Input --
    /// Latest level reading.
    pub level: f32,

    // -- Output --
    /// Valve opening the current state commands, 0-100.
    pub opening: u8,

    // -- Configuration --
    pub thresholds: LevelThresholds,
}

impl PolicyContext {
    pub fn new(thresholds: LevelThresholds) -> Self {
        Self {
            now: 0,
            ms_in_state: 0,
            level: 0.0,
            opening: 0,
            thresholds,
        }
    }

    /// Strictly between the two thresholds.
    pub fn in_tracking_band(&self) -> bool {
        self.level > self.thresholds.l1 && self.level < self.thresholds.l2
    }

    pub fn at_or_below_l1(&self) -> bool {
        self.level <= self.thresholds.l1
    }

    pub fn at_or_above_l2(&self) -> bool {
        self.level >= self.thresholds.l2
    }
}
