//! Port traits: the boundary between task logic and the outside world.
//!
//! ```text
//!   Adapter / driver ──▶ Port trait ──▶ Task (domain)
//! ```
//!
//! Drivers and adapters implement these traits; tasks consume them via
//! generics, so no task touches a peripheral directly and every task can be
//! driven on the host with the simulation adapters.
//!
//! ## Layering
//!
//! The uplink is two ports stacked on each other: a
//! [`NetworkConnectionService`] (WiFi) and a [`ProtocolService`] (MQTT).
//! Neither knows about the other; [`LayeredConnection`] combines them and
//! refuses to report or use the protocol layer while the network is down.
//!
//! [`LayeredConnection`]: crate::adapters::connection::LayeredConnection

use crate::config::LINE_MAX_LEN;
use crate::error::{CommsError, SensorError};
use crate::kernel::Millis;

// ───────────────────────────────────────────────────────────────
// Time
// ───────────────────────────────────────────────────────────────

/// Monotonic time since boot.
pub trait Clock {
    fn now_ms(&self) -> Millis;
    fn now_us(&self) -> u64;
}

// ───────────────────────────────────────────────────────────────
// Simple devices
// ───────────────────────────────────────────────────────────────

/// An on/off indicator.
pub trait Light {
    fn switch_on(&mut self);
    fn switch_off(&mut self);
    fn is_on(&self) -> bool;
}

/// Returned by [`ProximitySensor::distance_cm`] when no echo came back.
pub const NO_ECHO: f32 = -1.0;

/// Distance ranging.  Never fails: a missing echo is reported as
/// [`NO_ECHO`] and propagated unchanged to consumers.
pub trait ProximitySensor {
    fn distance_cm(&mut self) -> f32;
}

/// Debounced push button.
pub trait Button {
    /// Current debounced level.
    fn is_pressed(&mut self, now: Millis) -> bool;
    /// `true` exactly once per debounced released→pressed transition.
    fn was_pressed(&mut self, now: Millis) -> bool;
}

/// Raw analog channel.
pub trait AnalogInput {
    /// Raw count corresponding to full scale.
    fn full_scale(&self) -> u16;
    fn read_raw(&mut self) -> Result<u16, SensorError>;
}

/// Two-phase potentiometer: `sync` samples, `value` reads the last sample.
pub trait Potentiometer {
    fn sync(&mut self, now: Millis);
    /// Last synced position, 0-100.
    fn value(&self) -> u8;
}

/// Positional servo with a power switch.
pub trait ServoMotor {
    fn on(&mut self);
    fn off(&mut self);
    fn set_angle(&mut self, degrees: u8);
}

/// Character display addressed by row.
pub trait Display {
    fn print_line(&mut self, row: u8, text: &str);
}

// ───────────────────────────────────────────────────────────────
// Connectivity
// ───────────────────────────────────────────────────────────────

/// Link layer (e.g. WiFi station).
pub trait NetworkConnectionService {
    /// Non-blocking connect attempt.  `Ok` means the link is up now.
    fn connect(&mut self) -> Result<(), CommsError>;
    fn is_connected(&self) -> bool;
}

/// Session layer on top of the network (e.g. MQTT).
pub trait ProtocolService {
    /// Non-blocking connect attempt.  `Ok` means the session is up now.
    fn connect(&mut self) -> Result<(), CommsError>;
    fn is_connected(&self) -> bool;
    fn send(&mut self, topic: &str, payload: &str) -> Result<(), CommsError>;
    /// Service keep-alives and inbound traffic.
    fn poll(&mut self) {}
}

/// Newline-framed serial link.
pub trait SerialLink {
    /// Next complete inbound line without its terminator, if any.
    fn read_line(&mut self) -> Option<heapless::String<LINE_MAX_LEN>>;
    /// Write `line` followed by `\n`.
    fn write_line(&mut self, line: &str) -> Result<(), CommsError>;
}
