//! WCS mode FSM.
//!
//! ```text
//!             mode command            mode command
//!   UNCONNECTED ◀──────────▶ AUTOMATIC ◀──────────▶ MANUAL
//!        ▲                                            │
//!        └──────────── link stale (no valid frame) ───┘
//! ```
//!
//! Per tick: latch a button press, sample the pot, apply a pending mode
//! command, check link freshness, then derive the valve target.  While
//! `UNCONNECTED` the target follows the potentiometer; otherwise it holds
//! the last valve command from the central unit.

use core::cell::RefCell;
use core::fmt::Write;

use log::{debug, info, warn};

use crate::app::ports::{Button, Potentiometer};
use crate::config::LCD_COLS;
use crate::context::{Mode, WcsContext};
use crate::kernel::{Millis, StateTracker, Task};

/// LCD rows owned by this task.
pub const LCD_ROW_MODE: usize = 0;
pub const LCD_ROW_VALVE: usize = 1;

pub struct SystemTask<'a, B, P> {
    ctx: &'a RefCell<WcsContext>,
    button: B,
    pot: P,
    mode: StateTracker<Mode>,
    remote_valve: u8,
    stale_timeout: Millis,
}

impl<'a, B: Button, P: Potentiometer> SystemTask<'a, B, P> {
    pub fn new(ctx: &'a RefCell<WcsContext>, button: B, pot: P, stale_timeout: Millis) -> Self {
        Self {
            ctx,
            button,
            pot,
            mode: StateTracker::new(Mode::Unconnected),
            remote_valve: 0,
            stale_timeout,
        }
    }

    pub fn mode(&self) -> Mode {
        self.mode.current()
    }
}

impl<B: Button, P: Potentiometer> Task for SystemTask<'_, B, P> {
    fn name(&self) -> &'static str {
        "system"
    }

    fn init(&mut self, now: Millis) {
        self.mode.set(Mode::Unconnected, now);
    }

    fn tick(&mut self, now: Millis) {
        let mut ctx = self.ctx.borrow_mut();

        if self.button.was_pressed(now) {
            debug!("SYS: button press latched");
            ctx.set_button_pressed();
        }

        self.pot.sync(now);
        ctx.set_pot_percent(self.pot.value());

        if let Some(requested) = ctx.consume_mode_command() {
            if !self.mode.is(requested) {
                self.mode.set(requested, now);
            }
        }

        if !self.mode.is(Mode::Unconnected) && ctx.is_link_stale(now, self.stale_timeout) {
            warn!(
                "SYS: no valid frame for {} ms, falling back to local control",
                self.stale_timeout
            );
            self.mode.set(Mode::Unconnected, now);
        }

        if let Some(percent) = ctx.consume_valve_command() {
            self.remote_valve = percent;
        }

        let mode = self.mode.current();
        if self.mode.take_just_entered() {
            info!("SYS: {}", mode.as_str());
            ctx.set_mode(mode);
            ctx.set_lcd_line(LCD_ROW_MODE, mode.lcd_text());
        }

        let target = match mode {
            Mode::Unconnected => ctx.pot_percent(),
            Mode::Automatic | Mode::Manual => self.remote_valve,
        };
        ctx.set_valve_target(target);

        let mut line: heapless::String<LCD_COLS> = heapless::String::new();
        // Fits: "Valve: 100%" is 11 columns.
        let _ = write!(line, "Valve: {}%", target);
        ctx.set_lcd_line(LCD_ROW_VALVE, &line);
    }
}
