//! Mirrors the context's LCD lines onto the display.
//!
//! Keeps a copy of what each row last showed and only rewrites rows whose
//! text changed, so an unchanged screen costs no bus traffic.

use core::cell::RefCell;

use crate::app::ports::Display;
use crate::config::{LCD_COLS, LCD_ROWS};
use crate::context::WcsContext;
use crate::kernel::{Millis, Task};

pub struct LcdTask<'a, D> {
    ctx: &'a RefCell<WcsContext>,
    display: D,
    shown: [heapless::String<LCD_COLS>; LCD_ROWS],
}

impl<'a, D: Display> LcdTask<'a, D> {
    pub fn new(ctx: &'a RefCell<WcsContext>, display: D) -> Self {
        Self {
            ctx,
            display,
            shown: Default::default(),
        }
    }
}

impl<D: Display> Task for LcdTask<'_, D> {
    fn name(&self) -> &'static str {
        "lcd"
    }

    fn tick(&mut self, _now: Millis) {
        let ctx = self.ctx.borrow();
        for (row, shown) in self.shown.iter_mut().enumerate() {
            let wanted = ctx.lcd_line(row);
            if shown.as_str() != wanted {
                self.display.print_line(row as u8, wanted);
                *shown = crate::config::bounded(wanted);
            }
        }
    }
}
