//! Debounced push-button driver.
//!
//! ## Hardware
//!
//! Momentary switch on any `embedded_hal` input pin; `active_low` for the
//! usual pull-up wiring.  The pin is sampled whenever the owning task asks,
//! there is no ISR.
//!
//! ## Debounce
//!
//! The debounced level only follows the raw level once the raw level has
//! been seen unchanged for at least [`DEBOUNCE_MS`].  Each debounced
//! released→pressed transition arms one press; [`Button::was_pressed`]
//! reports it once and disarms it, so holding the button reports nothing
//! further until it is released and pressed again.

use embedded_hal::digital::InputPin;

use crate::app::ports::Button;
use crate::kernel::Millis;

pub const DEBOUNCE_MS: Millis = 50;

pub struct DebouncedButton<P> {
    pin: P,
    active_low: bool,
    raw: bool,
    raw_since: Millis,
    stable: bool,
    press_pending: bool,
}

impl<P: InputPin> DebouncedButton<P> {
    pub fn new(pin: P, active_low: bool) -> Self {
        Self {
            pin,
            active_low,
            raw: false,
            raw_since: 0,
            stable: false,
            press_pending: false,
        }
    }

    fn sample(&mut self, now: Millis) {
        // A failed read keeps the last known level.
        let Ok(high) = self.pin.is_high() else {
            return;
        };
        let raw = high != self.active_low;

        if raw != self.raw {
            self.raw = raw;
            self.raw_since = now;
            return;
        }

        if raw != self.stable && now.wrapping_sub(self.raw_since) >= DEBOUNCE_MS {
            self.stable = raw;
            if raw {
                self.press_pending = true;
            }
        }
    }
}

impl<P: InputPin> Button for DebouncedButton<P> {
    fn is_pressed(&mut self, now: Millis) -> bool {
        self.sample(now);
        self.stable
    }

    fn was_pressed(&mut self, now: Millis) -> bool {
        self.sample(now);
        core::mem::take(&mut self.press_pending)
    }
}
