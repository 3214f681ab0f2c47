//! UART link to the Central Unit.
//!
//! [`UartLink`] turns a raw byte channel into the line-oriented
//! [`SerialLink`] port: received bytes go through a [`LineFramer`] into a
//! small frame queue; outbound lines get a `\n` appended.
//!
//! ```text
//!   UART RX ──▶ LineFramer ──▶ frames (≤ FRAME_QUEUE_DEPTH) ──▶ read_line()
//!   write_line() ──▶ "<line>\n" ──▶ UART TX
//! ```

use heapless::Deque;
use log::warn;

use crate::app::ports::SerialLink;
use crate::config::FRAME_QUEUE_DEPTH;
use crate::error::CommsError;
use crate::protocol::{Line, LineFramer};

/// Non-blocking byte transport under a [`UartLink`].
pub trait ByteChannel {
    /// Copy whatever has arrived into `buf`; `0` when nothing is pending.
    fn read_available(&mut self, buf: &mut [u8]) -> usize;
    fn write_all(&mut self, data: &[u8]) -> Result<(), CommsError>;
}

/// Reads per `read_line` call are capped so a chattering peer cannot hold
/// the link task.
const MAX_CHUNKS_PER_PUMP: usize = 4;
const CHUNK: usize = 64;

pub struct UartLink<C> {
    channel: C,
    framer: LineFramer,
    frames: Deque<Line, FRAME_QUEUE_DEPTH>,
    dropped: u32,
}

impl<C: ByteChannel> UartLink<C> {
    pub fn new(channel: C) -> Self {
        Self {
            channel,
            framer: LineFramer::new(),
            frames: Deque::new(),
            dropped: 0,
        }
    }

    /// Frames discarded because the queue was full.
    pub fn dropped(&self) -> u32 {
        self.dropped
    }

    fn pump(&mut self) {
        let mut buf = [0u8; CHUNK];
        for _ in 0..MAX_CHUNKS_PER_PUMP {
            let n = self.channel.read_available(&mut buf);
            if n == 0 {
                break;
            }
            for &b in &buf[..n] {
                if let Some(line) = self.framer.push_byte(b) {
                    if self.frames.push_back(line).is_err() {
                        self.dropped = self.dropped.wrapping_add(1);
                        warn!("LINK: frame queue full ({}), frame dropped", FRAME_QUEUE_DEPTH);
                    }
                }
            }
        }
    }
}

impl<C: ByteChannel> SerialLink for UartLink<C> {
    fn read_line(&mut self) -> Option<Line> {
        if self.frames.is_empty() {
            self.pump();
        }
        self.frames.pop_front()
    }

    fn write_line(&mut self, line: &str) -> Result<(), CommsError> {
        self.channel.write_all(line.as_bytes())?;
        self.channel.write_all(b"\n")
    }
}

// ───────────────────────────────────────────────────────────────
// Channels
// ───────────────────────────────────────────────────────────────

#[cfg(target_os = "espidf")]
impl ByteChannel for esp_idf_svc::hal::uart::UartDriver<'_> {
    fn read_available(&mut self, buf: &mut [u8]) -> usize {
        match self.read(buf, esp_idf_svc::hal::delay::NON_BLOCK) {
            Ok(n) => n,
            Err(e) => {
                warn!("LINK: UART read failed: {}", e);
                0
            }
        }
    }

    fn write_all(&mut self, mut data: &[u8]) -> Result<(), CommsError> {
        while !data.is_empty() {
            match self.write(data) {
                Ok(0) | Err(_) => return Err(CommsError::SerialWriteFailed),
                Ok(n) => data = &data[n..],
            }
        }
        Ok(())
    }
}

#[cfg(not(target_os = "espidf"))]
impl ByteChannel for crate::adapters::sim::SimWire {
    fn read_available(&mut self, buf: &mut [u8]) -> usize {
        self.read(buf)
    }

    /// The sim wire is line-oriented on the outbound side; bytes are
    /// collected until a `\n` completes the line.
    fn write_all(&mut self, data: &[u8]) -> Result<(), CommsError> {
        if self.write_bytes(data) {
            Ok(())
        } else {
            Err(CommsError::SerialWriteFailed)
        }
    }
}

#[cfg(all(test, not(target_os = "espidf")))]
mod tests {
    use super::*;
    use crate::adapters::sim::SimWire;

    #[test]
    fn delivers_lines_in_order() {
        let wire = SimWire::new();
        let mut link = UartLink::new(wire.clone());
        wire.inject("{\"a\":1}\r\n{\"b\":2}\n");
        assert_eq!(link.read_line().as_deref(), Some("{\"a\":1}"));
        assert_eq!(link.read_line().as_deref(), Some("{\"b\":2}"));
        assert_eq!(link.read_line(), None);
    }

    #[test]
    fn partial_line_waits_for_terminator() {
        let wire = SimWire::new();
        let mut link = UartLink::new(wire.clone());
        wire.inject("{\"cmd\":");
        assert_eq!(link.read_line(), None);
        wire.inject("\"set_mode\"}\n");
        assert_eq!(link.read_line().as_deref(), Some("{\"cmd\":\"set_mode\"}"));
    }

    #[test]
    fn burst_beyond_queue_depth_is_dropped() {
        let wire = SimWire::new();
        let mut link = UartLink::new(wire.clone());
        for i in 0..6 {
            wire.inject(&format!("{i}\n"));
        }
        let got: Vec<_> = core::iter::from_fn(|| link.read_line()).collect();
        assert_eq!(got.len(), FRAME_QUEUE_DEPTH);
        assert_eq!(got[0].as_str(), "0");
        assert_eq!(link.dropped(), 2);
    }

    #[test]
    fn write_appends_newline() {
        let wire = SimWire::new();
        let mut link = UartLink::new(wire.clone());
        link.write_line("{\"event\":\"x\"}").unwrap();
        assert_eq!(wire.sent(), vec!["{\"event\":\"x\"}".to_owned()]);

        wire.fail_writes(true);
        assert_eq!(link.write_line("y"), Err(CommsError::SerialWriteFailed));
    }
}
