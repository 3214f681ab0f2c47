//! Rotary potentiometer on an ADC channel.
//!
//! Two-phase: [`Potentiometer::sync`] samples the ADC and caches the
//! position, [`Potentiometer::value`] returns the cached position scaled
//! to 0-100.  A failed sample keeps the previous position.

use log::warn;

use crate::app::ports::{AnalogInput, Potentiometer};
use crate::kernel::Millis;

pub struct AnalogPotentiometer<A> {
    adc: A,
    value: u8,
    last_sync: Option<Millis>,
}

impl<A: AnalogInput> AnalogPotentiometer<A> {
    pub fn new(adc: A) -> Self {
        Self {
            adc,
            value: 0,
            last_sync: None,
        }
    }

    /// When the cached value was last refreshed.
    pub fn last_sync(&self) -> Option<Millis> {
        self.last_sync
    }

    fn scale(raw: u16, full_scale: u16) -> u8 {
        if full_scale == 0 {
            return 0;
        }
        let raw = u32::from(raw.min(full_scale));
        let fs = u32::from(full_scale);
        ((raw * 100 + fs / 2) / fs) as u8
    }
}

impl<A: AnalogInput> Potentiometer for AnalogPotentiometer<A> {
    fn sync(&mut self, now: Millis) {
        match self.adc.read_raw() {
            Ok(raw) => {
                self.value = Self::scale(raw, self.adc.full_scale());
                self.last_sync = Some(now);
            }
            Err(e) => warn!("Pot: {}, keeping {}%", e, self.value),
        }
    }

    fn value(&self) -> u8 {
        self.value
    }
}
