//! Level-policy state handlers and table builder.
//!
//! ```text
//!  NORMAL ──[L1 < level < L2]──▶ TRACKING_PRE_ALARM ──[> T1 in state]──▶ PRE_ALARM
//!    ▲  ▲                              │                                   │   ▲
//!    │  └──────────[level ≤ L1]────────┘                                   │   │
//!    └──────────────────────────────[level ≤ L1]───────────────────────────┘   │
//!                                                                          [≤ L2]
//!  NORMAL / TRACKING / PRE_ALARM ──[level ≥ L2]──▶ ALARM ──────────────────────┘
//! ```
//!
//! | State              | Opening |
//! |--------------------|---------|
//! | NORMAL             | 0 %     |
//! | TRACKING_PRE_ALARM | 0 %     |
//! | PRE_ALARM          | 50 %    |
//! | ALARM              | 100 %   |

use log::{info, warn};

use super::context::PolicyContext;
use super::{StateDescriptor, StateId};

pub const OPENING_NORMAL: u8 = 0;
pub const OPENING_PRE_ALARM: u8 = 50;
pub const OPENING_ALARM: u8 = 100;

/// Build the static state table.  Called once at startup.
pub fn build_state_table() -> [StateDescriptor; StateId::COUNT] {
    [
        StateDescriptor {
            id: StateId::Normal,
            name: "NORMAL",
            on_enter: Some(normal_enter),
            on_exit: None,
            on_update: normal_update,
        },
        StateDescriptor {
            id: StateId::TrackingPreAlarm,
            name: "TRACKING_PRE_ALARM",
            on_enter: Some(tracking_enter),
            on_exit: None,
            on_update: tracking_update,
        },
        StateDescriptor {
            id: StateId::PreAlarm,
            name: "PRE_ALARM",
            on_enter: Some(pre_alarm_enter),
            on_exit: None,
            on_update: pre_alarm_update,
        },
        StateDescriptor {
            id: StateId::Alarm,
            name: "ALARM",
            on_enter: Some(alarm_enter),
            on_exit: Some(alarm_exit),
            on_update: alarm_update,
        },
    ]
}

// ═══════════════════════════════════════════════════════════════════════════
//  NORMAL
// ═══════════════════════════════════════════════════════════════════════════

fn normal_enter(ctx: &mut PolicyContext) {
    ctx.opening = OPENING_NORMAL;
}

fn normal_update(ctx: &mut PolicyContext) -> Option<StateId> {
    if ctx.at_or_above_l2() {
        return Some(StateId::Alarm);
    }
    if ctx.in_tracking_band() {
        return Some(StateId::TrackingPreAlarm);
    }
    None
}

// ═══════════════════════════════════════════════════════════════════════════
//  TRACKING_PRE_ALARM: above L1, waiting out T1 before acting
// ═══════════════════════════════════════════════════════════════════════════

fn tracking_enter(ctx: &mut PolicyContext) {
    ctx.opening = OPENING_NORMAL;
    info!(
        "Policy: level {:.2} above L1, pre-alarm in {} ms",
        ctx.level, ctx.thresholds.t1_ms
    );
}

fn tracking_update(ctx: &mut PolicyContext) -> Option<StateId> {
    if ctx.at_or_above_l2() {
        return Some(StateId::Alarm);
    }
    if ctx.at_or_below_l1() {
        return Some(StateId::Normal);
    }
    if ctx.ms_in_state > ctx.thresholds.t1_ms {
        return Some(StateId::PreAlarm);
    }
    None
}

// ═══════════════════════════════════════════════════════════════════════════
//  PRE_ALARM
// ═══════════════════════════════════════════════════════════════════════════

fn pre_alarm_enter(ctx: &mut PolicyContext) {
    ctx.opening = OPENING_PRE_ALARM;
}

fn pre_alarm_update(ctx: &mut PolicyContext) -> Option<StateId> {
    if ctx.at_or_above_l2() {
        return Some(StateId::Alarm);
    }
    if ctx.at_or_below_l1() {
        return Some(StateId::Normal);
    }
    None
}

// ═══════════════════════════════════════════════════════════════════════════
//  ALARM
// ═══════════════════════════════════════════════════════════════════════════

fn alarm_enter(ctx: &mut PolicyContext) {
    ctx.opening = OPENING_ALARM;
    warn!("Policy: level {:.2} at or above L2, valve fully open", ctx.level);
}

fn alarm_exit(ctx: &mut PolicyContext) {
    info!("Policy: level {:.2} back under L2", ctx.level);
}

fn alarm_update(ctx: &mut PolicyContext) -> Option<StateId> {
    if ctx.level <= ctx.thresholds.l2 {
        return Some(StateId::PreAlarm);
    }
    None
}
