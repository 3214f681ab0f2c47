//! System configuration parameters
//!
//! Tunables for both nodes.  The constants are the single source of the
//! defaults; [`TmsConfig`] and [`WcsConfig`] carry them at run time and are
//! checked once at start-up with `validate()`.  Nothing here is reloaded or
//! persisted after boot.

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

// --- Scheduling (WCS, cooperative) ---
/// Base period of the cooperative scheduler (ms).
pub const WCS_BASE_PERIOD_MS: u64 = 50;
/// Capacity of the cooperative task table.
pub const MAX_TASKS: usize = 8;
pub const SYSTEM_TASK_PERIOD_MS: u64 = 200;
pub const VALVE_TASK_PERIOD_MS: u64 = 100;
pub const LINK_TASK_PERIOD_MS: u64 = 100;
pub const LCD_TASK_PERIOD_MS: u64 = 250;

// --- Scheduling (TMS, parallel) ---
/// Level sampling period, also the minimum spacing between mailbox flushes.
pub const SAMPLING_INTERVAL_MS: u64 = 1000;
pub const NETWORK_TASK_PERIOD_MS: u64 = 500;

// --- Mailbox ---
pub const MAILBOX_CAPACITY: usize = 10;
pub const TOPIC_MAX_LEN: usize = 32;
pub const PAYLOAD_MAX_LEN: usize = 64;

// --- Valve ---
/// Servo travel time per percentage point of opening.
pub const MSEC_PER_PERCENT: u64 = 6;
pub const VALVE_MIN_ANGLE: u8 = 0;
pub const VALVE_MAX_ANGLE: u8 = 90;

// --- Serial link (WCS <-> central unit) ---
pub const SERIAL_BAUD: u32 = 115_200;
/// Longest accepted line including the terminator.
pub const LINE_MAX_LEN: usize = 128;
/// Complete frames buffered between link task ticks.
pub const FRAME_QUEUE_DEPTH: usize = 4;
/// No valid inbound message for this long forces UNCONNECTED (T2).
pub const LINK_STALE_TIMEOUT_MS: u64 = 10_000;
pub const HEARTBEAT_PERIOD_MS: u64 = 1000;
/// Potentiometer movement (percentage points) that triggers a report.
pub const POT_CHANGE_THRESHOLD: u8 = 5;

// --- LCD ---
pub const LCD_COLS: usize = 20;
pub const LCD_ROWS: usize = 4;
pub const LCD_I2C_ADDR: u8 = 0x27;
pub const LCD_AUTOMATIC_MODE: &str = "Automatic Mode";
pub const LCD_MANUAL_MODE: &str = "Manual Mode";
pub const LCD_UNCONNECTED: &str = "Unconnected";

// --- Sonar ---
pub const SONAR_TIMEOUT_US: u64 = 30_000;
pub const SONAR_DEFAULT_TEMPERATURE_C: f32 = 20.0;

// --- MQTT ---
pub const MQTT_BROKER: &str = "192.168.1.100";
pub const MQTT_PORT: u16 = 1883;
pub const MQTT_CLIENT_ID: &str = "ESP32_TMS";
pub const MQTT_TOPIC_LEVEL: &str = "tank/level";

// --- Level policy (central unit) ---
pub const LEVEL_L1: f32 = 50.0;
pub const LEVEL_L2: f32 = 80.0;
/// Time spent between L1 and L2 before the partial opening (T1).
pub const TIME_T1_MS: u64 = 30_000;

/// Copy `s` into a fixed-capacity string, truncating at a char boundary.
pub fn bounded<const N: usize>(s: &str) -> heapless::String<N> {
    let mut out = heapless::String::new();
    for c in s.chars() {
        if out.push(c).is_err() {
            break;
        }
    }
    out
}

// ═══════════════════════════════════════════════════════════════
//  TMS
// ═══════════════════════════════════════════════════════════════

/// Tank monitoring node configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TmsConfig {
    // --- WiFi ---
    pub wifi_ssid: heapless::String<32>,
    /// Empty for an open network, otherwise 8-64 bytes (WPA2).
    pub wifi_password: heapless::String<64>,

    // --- MQTT ---
    pub mqtt_host: heapless::String<64>,
    pub mqtt_port: u16,
    pub mqtt_client_id: heapless::String<32>,
    pub level_topic: heapless::String<TOPIC_MAX_LEN>,

    // --- Timing ---
    pub sampling_period_ms: u64,
    pub network_period_ms: u64,
    /// Minimum spacing between mailbox flushes while connected.
    pub send_interval_ms: u64,
    pub sonar_timeout_us: u64,
}

impl Default for TmsConfig {
    fn default() -> Self {
        Self {
            wifi_ssid: bounded(option_env!("TANKFLOW_WIFI_SSID").unwrap_or("tankflow")),
            wifi_password: bounded(option_env!("TANKFLOW_WIFI_PASS").unwrap_or("")),
            mqtt_host: bounded(option_env!("TANKFLOW_MQTT_HOST").unwrap_or(MQTT_BROKER)),
            mqtt_port: MQTT_PORT,
            mqtt_client_id: bounded(MQTT_CLIENT_ID),
            level_topic: bounded(MQTT_TOPIC_LEVEL),
            sampling_period_ms: SAMPLING_INTERVAL_MS,
            network_period_ms: NETWORK_TASK_PERIOD_MS,
            send_interval_ms: SAMPLING_INTERVAL_MS,
            sonar_timeout_us: SONAR_TIMEOUT_US,
        }
    }
}

impl TmsConfig {
    pub fn validate(&self) -> Result<()> {
        if self.wifi_ssid.is_empty()
            || !self.wifi_ssid.bytes().all(|b| (0x20..=0x7E).contains(&b))
        {
            return Err(Error::Config("wifi_ssid"));
        }
        let pw = self.wifi_password.len();
        if pw != 0 && !(8..=64).contains(&pw) {
            return Err(Error::Config("wifi_password"));
        }
        if self.mqtt_host.is_empty() {
            return Err(Error::Config("mqtt_host"));
        }
        if self.mqtt_port == 0 {
            return Err(Error::Config("mqtt_port"));
        }
        if self.mqtt_client_id.is_empty() {
            return Err(Error::Config("mqtt_client_id"));
        }
        if self.level_topic.is_empty() {
            return Err(Error::Config("level_topic"));
        }
        if self.sampling_period_ms == 0 {
            return Err(Error::Config("sampling_period_ms"));
        }
        if self.network_period_ms == 0 {
            return Err(Error::Config("network_period_ms"));
        }
        if self.sonar_timeout_us == 0 {
            return Err(Error::Config("sonar_timeout_us"));
        }
        Ok(())
    }
}

// ═══════════════════════════════════════════════════════════════
//  WCS
// ═══════════════════════════════════════════════════════════════

/// Water channel node configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WcsConfig {
    // --- Scheduling ---
    pub base_period_ms: u64,
    pub system_period_ms: u64,
    pub valve_period_ms: u64,
    pub link_period_ms: u64,
    pub lcd_period_ms: u64,

    // --- Valve ---
    pub msec_per_percent: u64,

    // --- Link ---
    pub serial_baud: u32,
    pub link_stale_timeout_ms: u64,
    pub heartbeat_period_ms: u64,
    pub pot_change_threshold: u8,
}

impl Default for WcsConfig {
    fn default() -> Self {
        Self {
            base_period_ms: WCS_BASE_PERIOD_MS,
            system_period_ms: SYSTEM_TASK_PERIOD_MS,
            valve_period_ms: VALVE_TASK_PERIOD_MS,
            link_period_ms: LINK_TASK_PERIOD_MS,
            lcd_period_ms: LCD_TASK_PERIOD_MS,
            msec_per_percent: MSEC_PER_PERCENT,
            serial_baud: SERIAL_BAUD,
            link_stale_timeout_ms: LINK_STALE_TIMEOUT_MS,
            heartbeat_period_ms: HEARTBEAT_PERIOD_MS,
            pot_change_threshold: POT_CHANGE_THRESHOLD,
        }
    }
}

impl WcsConfig {
    pub fn validate(&self) -> Result<()> {
        if self.base_period_ms == 0 {
            return Err(Error::Config("base_period_ms"));
        }
        // The scheduler cannot fire a task faster than its base period.
        let periods = [
            ("system_period_ms", self.system_period_ms),
            ("valve_period_ms", self.valve_period_ms),
            ("link_period_ms", self.link_period_ms),
            ("lcd_period_ms", self.lcd_period_ms),
        ];
        for (name, period) in periods {
            if period < self.base_period_ms {
                return Err(Error::Config(name));
            }
        }
        if self.serial_baud == 0 {
            return Err(Error::Config("serial_baud"));
        }
        if self.link_stale_timeout_ms <= self.link_period_ms {
            return Err(Error::Config("link_stale_timeout_ms"));
        }
        if self.heartbeat_period_ms == 0 {
            return Err(Error::Config("heartbeat_period_ms"));
        }
        if self.pot_change_threshold == 0 || self.pot_change_threshold > 100 {
            return Err(Error::Config("pot_change_threshold"));
        }
        Ok(())
    }
}

// ═══════════════════════════════════════════════════════════════
//  Level policy
// ═══════════════════════════════════════════════════════════════

/// Thresholds for the central unit's level policy.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LevelThresholds {
    /// Above this the policy starts tracking a pre-alarm.
    pub l1: f32,
    /// At or above this the valve opens fully.
    pub l2: f32,
    /// Tracking time before the partial opening.
    pub t1_ms: u64,
}

impl Default for LevelThresholds {
    fn default() -> Self {
        Self {
            l1: LEVEL_L1,
            l2: LEVEL_L2,
            t1_ms: TIME_T1_MS,
        }
    }
}

impl LevelThresholds {
    pub fn validate(&self) -> Result<()> {
        if !self.l1.is_finite() || !self.l2.is_finite() || self.l1 >= self.l2 {
            return Err(Error::Config("l1/l2"));
        }
        if self.t1_ms == 0 {
            return Err(Error::Config("t1_ms"));
        }
        Ok(())
    }
}
