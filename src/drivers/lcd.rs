//! HD44780 character LCD behind a PCF8574 I2C backpack.
//!
//! The backpack maps its eight outputs onto the controller as
//! `P0=RS P1=RW P2=EN P3=backlight P4..P7=D4..D7`, so every byte goes out
//! as two 4-bit nibbles, each latched by pulsing EN.
//!
//! Generic over `embedded_hal` [`I2c`] and [`DelayNs`]; on the host it runs
//! against [`SimI2c`](crate::adapters::sim::SimI2c).

use embedded_hal::delay::DelayNs;
use embedded_hal::i2c::I2c;
use log::{info, warn};

use crate::app::ports::Display;

const RS: u8 = 0x01;
const EN: u8 = 0x04;
const BACKLIGHT: u8 = 0x08;

const CMD_CLEAR: u8 = 0x01;
const CMD_ENTRY_INCREMENT: u8 = 0x06;
const CMD_DISPLAY_ON: u8 = 0x0C;
const CMD_FUNCTION_4BIT_2LINE: u8 = 0x28;
const CMD_SET_DDRAM: u8 = 0x80;

/// DDRAM address of column 0 for each row of a 20x4 panel.
const ROW_OFFSETS: [u8; 4] = [0x00, 0x40, 0x14, 0x54];

pub struct Hd44780<I, D> {
    i2c: I,
    delay: D,
    addr: u8,
    cols: u8,
    rows: u8,
    failed: bool,
}

impl<I: I2c, D: DelayNs> Hd44780<I, D> {
    pub fn new(i2c: I, delay: D, addr: u8, cols: u8, rows: u8) -> Self {
        Self {
            i2c,
            delay,
            addr,
            cols,
            rows: rows.min(ROW_OFFSETS.len() as u8),
            failed: false,
        }
    }

    /// Power-on reset into 4-bit mode, then clear the panel.
    pub fn init(&mut self) {
        self.delay.delay_ms(50);
        // Three 8-bit "function set" nibbles resync the controller from any
        // state, the fourth switches to 4-bit transfers.
        for wait_us in [4_500, 4_500, 150] {
            self.write_nibble(0x30, 0);
            self.delay.delay_us(wait_us);
        }
        self.write_nibble(0x20, 0);

        self.command(CMD_FUNCTION_4BIT_2LINE);
        self.command(CMD_DISPLAY_ON);
        self.command(CMD_CLEAR);
        self.delay.delay_ms(2);
        self.command(CMD_ENTRY_INCREMENT);
        info!("LCD: {}x{} at 0x{:02X} ready", self.cols, self.rows, self.addr);
    }

    fn command(&mut self, byte: u8) {
        self.write_byte(byte, 0);
    }

    fn write_byte(&mut self, byte: u8, mode: u8) {
        self.write_nibble(byte & 0xF0, mode);
        self.write_nibble(byte << 4, mode);
    }

    fn write_nibble(&mut self, high_nibble: u8, mode: u8) {
        let data = high_nibble | mode | BACKLIGHT;
        let ok = self.i2c.write(self.addr, &[data | EN]).is_ok()
            && self.i2c.write(self.addr, &[data]).is_ok();
        self.delay.delay_us(50);
        // One warning per outage, not one per nibble.
        if ok {
            self.failed = false;
        } else if !self.failed {
            self.failed = true;
            warn!("LCD: I2C write to 0x{:02X} failed", self.addr);
        }
    }
}

impl<I: I2c, D: DelayNs> Display for Hd44780<I, D> {
    /// Rewrites the whole row, padding with spaces so no stale characters
    /// remain.  Non-ASCII characters show as `?`.
    fn print_line(&mut self, row: u8, text: &str) {
        if row >= self.rows {
            return;
        }
        self.command(CMD_SET_DDRAM | ROW_OFFSETS[usize::from(row)]);
        let mut chars = text.chars();
        for _ in 0..self.cols {
            let c = match chars.next() {
                Some(c) if c.is_ascii() => c as u8,
                Some(_) => b'?',
                None => b' ',
            };
            self.write_byte(c, RS);
        }
    }
}
