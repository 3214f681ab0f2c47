//! Newline line framer for the serial link.
//!
//! Wire format: one JSON object per line.
//! ```text
//! {"cmd":"set_valve","value":42}\n
//! ```
//!
//! The framer accumulates incoming bytes and yields complete lines.  A
//! single UART read may hold part of a line or several lines.  `\r` is
//! ignored, empty lines are skipped, and a line that outgrows the buffer
//! is discarded whole up to its terminator.

use log::warn;

use crate::config::LINE_MAX_LEN;

pub type Line = heapless::String<LINE_MAX_LEN>;

/// Streaming line decoder.
pub struct LineFramer {
    buf: heapless::Vec<u8, LINE_MAX_LEN>,
    overflowed: bool,
}

impl Default for LineFramer {
    fn default() -> Self {
        Self::new()
    }
}

impl LineFramer {
    pub fn new() -> Self {
        Self {
            buf: heapless::Vec::new(),
            overflowed: false,
        }
    }

    /// Feed one byte.  Returns a line when `b` terminates one.
    pub fn push_byte(&mut self, b: u8) -> Option<Line> {
        match b {
            b'\r' => None,
            b'\n' => {
                if core::mem::take(&mut self.overflowed) {
                    self.buf.clear();
                    warn!("LINK: line longer than {} bytes discarded", LINE_MAX_LEN - 1);
                    return None;
                }
                if self.buf.is_empty() {
                    return None;
                }
                let line = core::str::from_utf8(&self.buf)
                    .ok()
                    .and_then(|s| Line::try_from(s).ok());
                self.buf.clear();
                if line.is_none() {
                    warn!("LINK: non UTF-8 line discarded");
                }
                line
            }
            _ => {
                // One byte of the buffer is reserved for the terminator.
                if !self.overflowed
                    && (self.buf.len() >= LINE_MAX_LEN - 1 || self.buf.push(b).is_err())
                {
                    self.overflowed = true;
                }
                None
            }
        }
    }

    /// Feed a chunk, handing every completed line to `on_line`.
    pub fn feed(&mut self, data: &[u8], mut on_line: impl FnMut(Line)) {
        for &b in data {
            if let Some(line) = self.push_byte(b) {
                on_line(line);
            }
        }
    }

    /// Drop any partial line (e.g. after a UART error).
    pub fn reset(&mut self) {
        self.buf.clear();
        self.overflowed = false;
    }
}
