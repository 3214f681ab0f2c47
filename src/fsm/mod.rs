//! Function-pointer finite state machine driving the level policy.
//!
//! Classic embedded FSM pattern:
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────┐
//! │  StateTable                                                     │
//! │  ┌────────────────────┬───────────┬──────────┬───────────────┐  │
//! │  │ StateId            │ on_enter  │ on_exit  │ on_update     │  │
//! │  ├────────────────────┼───────────┼──────────┼───────────────┤  │
//! │  │ Normal             │ fn(ctx)   │ -        │ fn(ctx)->Opt  │  │
//! │  │ TrackingPreAlarm   │ fn(ctx)   │ -        │ fn(ctx)->Opt  │  │
//! │  │ PreAlarm           │ fn(ctx)   │ -        │ fn(ctx)->Opt  │  │
//! │  │ Alarm              │ fn(ctx)   │ fn(ctx)  │ fn(ctx)->Opt  │  │
//! │  └────────────────────┴───────────┴──────────┴───────────────┘  │
//! └─────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Each evaluation the engine calls `on_update` for the current state.
//! If it returns `Some(next)`, the engine runs `on_exit` for the current
//! state, then `on_enter` for the next.  All handlers receive
//! `&mut PolicyContext`; entry actions set the commanded valve opening.
//!
//! [`LevelPolicy`] wraps the engine for the central unit: feed it level
//! reports, get back a new opening whenever the commanded one changes.

pub mod context;
pub mod states;

use context::PolicyContext;
use log::{debug, info};

use crate::config::LevelThresholds;
use crate::kernel::Millis;

// ---------------------------------------------------------------------------
// State identity
// ---------------------------------------------------------------------------

/// Must stay in sync with the table built in [`states::build_state_table`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum StateId {
    Normal = 0,
    TrackingPreAlarm = 1,
    PreAlarm = 2,
    Alarm = 3,
}

impl StateId {
    pub const COUNT: usize = 4;

    /// Convert an index back to `StateId`.  Out of range falls back to
    /// `Alarm`, the state that opens the valve.
    pub fn from_index(idx: usize) -> Self {
        match idx {
            0 => Self::Normal,
            1 => Self::TrackingPreAlarm,
            2 => Self::PreAlarm,
            3 => Self::Alarm,
            _ => {
                debug_assert!(false, "invalid state index: {idx}");
                Self::Alarm
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Function-pointer type aliases
// ---------------------------------------------------------------------------

/// `on_enter` / `on_exit` action, run once per transition.
pub type StateActionFn = fn(&mut PolicyContext);

/// Per-evaluation handler.  `Some(next)` triggers a transition.
pub type StateUpdateFn = fn(&mut PolicyContext) -> Option<StateId>;

/// One row of the state table.
pub struct StateDescriptor {
    pub id: StateId,
    pub name: &'static str,
    pub on_enter: Option<StateActionFn>,
    pub on_exit: Option<StateActionFn>,
    pub on_update: StateUpdateFn,
}

// ---------------------------------------------------------------------------
// FSM engine
// ---------------------------------------------------------------------------

pub struct Fsm {
    /// Indexed by `StateId as usize`.
    table: [StateDescriptor; StateId::COUNT],
    current: usize,
    entered_at: Millis,
}

impl Fsm {
    pub fn new(table: [StateDescriptor; StateId::COUNT], initial: StateId) -> Self {
        debug_assert!(
            table.iter().enumerate().all(|(i, d)| d.id as usize == i),
            "state table out of order"
        );
        Self {
            table,
            current: initial as usize,
            entered_at: 0,
        }
    }

    /// Run the initial state's `on_enter`.  Call once before the first
    /// [`Fsm::tick`].
    pub fn start(&mut self, ctx: &mut PolicyContext) {
        self.entered_at = ctx.now;
        ctx.ms_in_state = 0;
        info!("Policy: starting in {}", self.table[self.current].name);
        if let Some(enter) = self.table[self.current].on_enter {
            enter(ctx);
        }
    }

    /// Evaluate the current state at `ctx.now` and take at most one
    /// transition.
    pub fn tick(&mut self, ctx: &mut PolicyContext) {
        ctx.ms_in_state = ctx.now.saturating_sub(self.entered_at);
        if let Some(next) = (self.table[self.current].on_update)(ctx) {
            self.transition(next, ctx);
        }
    }

    pub fn current_state(&self) -> StateId {
        StateId::from_index(self.current)
    }

    fn transition(&mut self, next: StateId, ctx: &mut PolicyContext) {
        let next_idx = next as usize;
        info!(
            "Policy: {} -> {}",
            self.table[self.current].name, self.table[next_idx].name
        );
        if let Some(exit) = self.table[self.current].on_exit {
            exit(ctx);
        }
        self.current = next_idx;
        self.entered_at = ctx.now;
        ctx.ms_in_state = 0;
        if let Some(enter) = self.table[self.current].on_enter {
            enter(ctx);
        }
    }
}

// ---------------------------------------------------------------------------
// Level policy
// ---------------------------------------------------------------------------

/// The central unit's automatic valve policy.
pub struct LevelPolicy {
    fsm: Fsm,
    ctx: PolicyContext,
}

impl LevelPolicy {
    pub fn new(thresholds: LevelThresholds) -> Self {
        Self {
            fsm: Fsm::new(states::build_state_table(), StateId::Normal),
            ctx: PolicyContext::new(thresholds),
        }
    }

    /// Enter `NORMAL` at `now`.  Returns the opening it commands.
    pub fn start(&mut self, now: Millis) -> u8 {
        self.ctx.now = now;
        self.fsm.start(&mut self.ctx);
        self.ctx.opening
    }

    /// Feed one level report.  Returns the new opening if it changed.
    ///
    /// A negative level is the sensor's no-echo sentinel: the policy holds
    /// its state and the report is ignored.
    pub fn on_level(&mut self, level: f32, now: Millis) -> Option<u8> {
        if level.is_nan() || level < 0.0 {
            debug!("Policy: ignoring level {}", level);
            return None;
        }
        let before = self.ctx.opening;
        self.ctx.level = level;
        self.ctx.now = now;
        self.fsm.tick(&mut self.ctx);
        (self.ctx.opening != before).then_some(self.ctx.opening)
    }

    pub fn state(&self) -> StateId {
        self.fsm.current_state()
    }

    pub fn opening(&self) -> u8 {
        self.ctx.opening
    }
}
