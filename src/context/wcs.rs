//! Blackboard of the water channel node.
//!
//! The WCS tasks all run on the cooperative scheduler's thread, so this is
//! a plain struct shared as `&RefCell<WcsContext>`.  Each field has one
//! writer:
//!
//! | Field                 | Written by   | Read by              |
//! |-----------------------|--------------|----------------------|
//! | mode, valve target    | system task  | valve, link, lcd     |
//! | pot percent           | system task  | link task            |
//! | button latch          | system task  | link task (consumes) |
//! | valve/mode commands   | link task    | system task (consumes)|
//! | last valid message    | link task    | system task          |
//! | valve opening         | valve task   | link task            |
//! | lcd lines             | system task  | lcd task             |

use serde::{Deserialize, Serialize};

use crate::config::{self, LCD_COLS, LCD_ROWS};
use crate::kernel::Millis;

/// Operating mode of the water channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Mode {
    /// No central unit: the potentiometer drives the valve.
    #[default]
    Unconnected,
    /// The central unit's level policy drives the valve.
    Automatic,
    /// An operator drives the valve through the central unit.
    Manual,
}

impl Mode {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Unconnected => "UNCONNECTED",
            Self::Automatic => "AUTOMATIC",
            Self::Manual => "MANUAL",
        }
    }

    pub fn lcd_text(self) -> &'static str {
        match self {
            Self::Unconnected => config::LCD_UNCONNECTED,
            Self::Automatic => config::LCD_AUTOMATIC_MODE,
            Self::Manual => config::LCD_MANUAL_MODE,
        }
    }
}

#[derive(Debug, Default)]
pub struct WcsContext {
    mode: Mode,
    pot_percent: u8,
    valve_target: u8,
    valve_opening: u8,
    button_pressed: bool,
    valve_command: Option<u8>,
    mode_command: Option<Mode>,
    last_valid_msg: Option<Millis>,
    lcd: [heapless::String<LCD_COLS>; LCD_ROWS],
}

impl WcsContext {
    pub fn new() -> Self {
        Self::default()
    }

    // --- mode ---

    pub fn mode(&self) -> Mode {
        self.mode
    }

    pub fn set_mode(&mut self, mode: Mode) {
        self.mode = mode;
    }

    // --- potentiometer ---

    pub fn pot_percent(&self) -> u8 {
        self.pot_percent
    }

    pub fn set_pot_percent(&mut self, percent: u8) {
        self.pot_percent = percent.min(100);
    }

    // --- valve ---

    /// Opening the valve task should move to, 0-100.
    pub fn valve_target(&self) -> u8 {
        self.valve_target
    }

    pub fn set_valve_target(&mut self, percent: u8) {
        self.valve_target = percent.min(100);
    }

    /// Opening the valve last completed a move to.
    pub fn valve_opening(&self) -> u8 {
        self.valve_opening
    }

    pub fn set_valve_opening(&mut self, percent: u8) {
        self.valve_opening = percent.min(100);
    }

    // --- button latch (read-then-clear) ---

    pub fn set_button_pressed(&mut self) {
        self.button_pressed = true;
    }

    /// `true` once per latched press.
    pub fn consume_button_pressed(&mut self) -> bool {
        core::mem::take(&mut self.button_pressed)
    }

    // --- remote commands ---

    /// Latch a remote valve command.  A newer command replaces an
    /// unconsumed one.
    pub fn set_valve_command(&mut self, percent: u8) {
        self.valve_command = Some(percent.min(100));
    }

    pub fn has_valve_command(&self) -> bool {
        self.valve_command.is_some()
    }

    pub fn consume_valve_command(&mut self) -> Option<u8> {
        self.valve_command.take()
    }

    pub fn set_mode_command(&mut self, mode: Mode) {
        self.mode_command = Some(mode);
    }

    pub fn has_mode_command(&self) -> bool {
        self.mode_command.is_some()
    }

    pub fn consume_mode_command(&mut self) -> Option<Mode> {
        self.mode_command.take()
    }

    // --- link freshness ---

    pub fn mark_valid_message(&mut self, now: Millis) {
        self.last_valid_msg = Some(now);
    }

    pub fn last_valid_message(&self) -> Option<Millis> {
        self.last_valid_msg
    }

    /// No valid message within `timeout`, or none ever.
    pub fn is_link_stale(&self, now: Millis, timeout: Millis) -> bool {
        match self.last_valid_msg {
            Some(at) => now.saturating_sub(at) > timeout,
            None => true,
        }
    }

    // --- LCD ---

    /// Set a display row, truncated to the display width.  Rows past the
    /// display are ignored.
    pub fn set_lcd_line(&mut self, row: usize, text: &str) {
        if let Some(line) = self.lcd.get_mut(row) {
            *line = config::bounded(text);
        }
    }

    pub fn lcd_line(&self, row: usize) -> &str {
        self.lcd.get(row).map_or("", heapless::String::as_str)
    }
}
