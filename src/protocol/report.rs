//! Outbound reports.
//!
//! - TMS → broker, topic `tank/level`: `{"level":12.34,"timestamp":5000}`
//! - WCS → central unit, one line each:
//!   `{"event":"heartbeat","mode":"AUTOMATIC","valve_pos":40,"uptime":5000}`,
//!   `{"event":"button_pressed","timestamp":5000}`,
//!   `{"event":"pot_changed","value":35,"timestamp":5000}`

use core::fmt::Write;

use serde::{Deserialize, Serialize};

use crate::config::PAYLOAD_MAX_LEN;
use crate::context::Mode;
use crate::error::QueueError;
use crate::kernel::Millis;

/// Level payload with the reading at two decimals.  A no-echo sentinel is
/// formatted like any other reading.
pub fn level_payload(
    level: f32,
    timestamp: Millis,
) -> Result<heapless::String<PAYLOAD_MAX_LEN>, QueueError> {
    let mut out = heapless::String::new();
    write!(out, "{{\"level\":{:.2},\"timestamp\":{}}}", level, timestamp)
        .map_err(|_| QueueError::PayloadTooLong)?;
    Ok(out)
}

/// Decoded level payload, as the central unit sees it.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
pub struct LevelReport {
    pub level: f32,
    pub timestamp: Millis,
}

pub fn parse_level(payload: &str) -> Option<LevelReport> {
    serde_json::from_str(payload).ok()
}

/// WCS event line.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum Report {
    Heartbeat {
        mode: Mode,
        valve_pos: u8,
        uptime: Millis,
    },
    ButtonPressed {
        timestamp: Millis,
    },
    PotChanged {
        value: u8,
        timestamp: Millis,
    },
}

impl Report {
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }
}
