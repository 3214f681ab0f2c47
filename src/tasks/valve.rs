//! Valve actuation by dead reckoning.
//!
//! The servo has no position feedback, so the valve's opening is inferred
//! from time: a move of `Δ` percent takes `|Δ| × msec_per_percent` ms and
//! the opening is committed only once that time has passed.
//!
//! ```text
//!   IDLE ──target ≠ opening──▶ MOVING ──elapsed ≥ duration──▶ IDLE
//! ```
//!
//! Target and duration are frozen when a move starts.  A new target that
//! arrives mid-move is picked up from `IDLE` once the move completes.

use core::cell::RefCell;

use log::info;

use crate::app::ports::ServoMotor;
use crate::config::{VALVE_MAX_ANGLE, VALVE_MIN_ANGLE};
use crate::context::WcsContext;
use crate::kernel::{Millis, StateTracker, Task};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValveState {
    Idle,
    Moving,
}

pub struct ValveTask<'a, S> {
    ctx: &'a RefCell<WcsContext>,
    servo: S,
    state: StateTracker<ValveState>,
    current: u8,
    target: u8,
    move_duration: Millis,
    msec_per_percent: Millis,
}

impl<'a, S: ServoMotor> ValveTask<'a, S> {
    pub fn new(ctx: &'a RefCell<WcsContext>, servo: S, msec_per_percent: Millis) -> Self {
        Self {
            ctx,
            servo,
            state: StateTracker::new(ValveState::Idle),
            current: 0,
            target: 0,
            move_duration: 0,
            msec_per_percent,
        }
    }

    pub fn state(&self) -> ValveState {
        self.state.current()
    }

    /// Last committed opening.
    pub fn position(&self) -> u8 {
        self.current
    }

    pub fn servo(&self) -> &S {
        &self.servo
    }

    /// Valve percent to servo angle.
    fn angle_for(percent: u8) -> u8 {
        let span = u16::from(VALVE_MAX_ANGLE - VALVE_MIN_ANGLE);
        VALVE_MIN_ANGLE + (span * u16::from(percent.min(100)) / 100) as u8
    }
}

impl<S: ServoMotor> Task for ValveTask<'_, S> {
    fn name(&self) -> &'static str {
        "valve"
    }

    fn init(&mut self, now: Millis) {
        self.servo.set_angle(Self::angle_for(self.current));
        self.state.set(ValveState::Idle, now);
    }

    fn tick(&mut self, now: Millis) {
        match self.state.current() {
            ValveState::Idle => {
                if self.state.take_just_entered() {
                    info!("VT: IDLE at {}%", self.current);
                    self.servo.off();
                }
                let requested = self.ctx.borrow().valve_target();
                if requested != self.current {
                    self.target = requested;
                    self.move_duration =
                        Millis::from(requested.abs_diff(self.current)) * self.msec_per_percent;
                    self.servo.set_angle(Self::angle_for(requested));
                    self.state.set(ValveState::Moving, now);
                }
            }
            ValveState::Moving => {
                if self.state.take_just_entered() {
                    info!(
                        "VT: MOVING {}% -> {}% over {} ms",
                        self.current, self.target, self.move_duration
                    );
                    self.servo.on();
                }
                if self.state.elapsed(now) >= self.move_duration {
                    self.current = self.target;
                    self.ctx.borrow_mut().set_valve_opening(self.current);
                    self.state.set(ValveState::Idle, now);
                }
            }
        }
    }
}
