//! WCS side of the serial link to the central unit.
//!
//! Inbound: up to [`FRAME_QUEUE_DEPTH`] frames per tick are parsed and
//! latched into the context; bad frames are logged and dropped one by one.
//! Outbound, one JSON line each:
//!
//! - `button_pressed` once per consumed press, retried until written,
//! - `pot_changed` when the pot moved by at least the threshold since the
//!   last report (and once at start),
//! - `heartbeat` every heartbeat period regardless of traffic.

use core::cell::RefCell;

use log::warn;

use crate::app::ports::SerialLink;
use crate::config::FRAME_QUEUE_DEPTH;
use crate::context::WcsContext;
use crate::error::CommandError;
use crate::kernel::{Millis, Task};
use crate::protocol::{Report, parse_frame};

pub struct LinkTask<'a, L> {
    ctx: &'a RefCell<WcsContext>,
    link: L,
    heartbeat_period: Millis,
    pot_threshold: u8,
    last_heartbeat: Millis,
    last_pot: Option<u8>,
    pending_press: bool,
}

impl<'a, L: SerialLink> LinkTask<'a, L> {
    pub fn new(
        ctx: &'a RefCell<WcsContext>,
        link: L,
        heartbeat_period: Millis,
        pot_threshold: u8,
    ) -> Self {
        Self {
            ctx,
            link,
            heartbeat_period,
            pot_threshold,
            last_heartbeat: 0,
            last_pot: None,
            pending_press: false,
        }
    }

    fn receive(&mut self, now: Millis) {
        let ctx = self.ctx;
        for _ in 0..FRAME_QUEUE_DEPTH {
            let Some(line) = self.link.read_line() else {
                break;
            };
            match parse_frame(&line) {
                Ok(cmd) => cmd.apply(&mut ctx.borrow_mut(), now),
                // Already logged with the command name.
                Err(CommandError::UnknownCommand) => {}
                Err(e) => warn!("LINK: frame dropped: {}", e),
            }
        }
    }

    fn send(&mut self, report: &Report) -> bool {
        let line = match report.to_json() {
            Ok(line) => line,
            Err(e) => {
                warn!("LINK: cannot encode report: {}", e);
                return false;
            }
        };
        match self.link.write_line(&line) {
            Ok(()) => true,
            Err(e) => {
                warn!("LINK: {}", e);
                false
            }
        }
    }
}

impl<L: SerialLink> Task for LinkTask<'_, L> {
    fn name(&self) -> &'static str {
        "link"
    }

    fn init(&mut self, now: Millis) {
        self.last_heartbeat = now;
        self.last_pot = None;
        self.pending_press = false;
    }

    fn tick(&mut self, now: Millis) {
        self.receive(now);

        let (pressed, pot, mode, opening) = {
            let mut ctx = self.ctx.borrow_mut();
            (
                ctx.consume_button_pressed(),
                ctx.pot_percent(),
                ctx.mode(),
                ctx.valve_opening(),
            )
        };

        // A consumed press stays pending until it is on the wire.
        self.pending_press |= pressed;
        if self.pending_press && self.send(&Report::ButtonPressed { timestamp: now }) {
            self.pending_press = false;
        }

        let moved = self
            .last_pot
            .is_none_or(|last| last.abs_diff(pot) >= self.pot_threshold);
        if moved && self.send(&Report::PotChanged { value: pot, timestamp: now }) {
            self.last_pot = Some(pot);
        }

        if now.saturating_sub(self.last_heartbeat) >= self.heartbeat_period {
            self.last_heartbeat = now;
            self.send(&Report::Heartbeat {
                mode,
                valve_pos: opening,
                uptime: now,
            });
        }
    }
}
