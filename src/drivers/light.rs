//! Single-colour indicator LED on a GPIO.
//!
//! ## Dual-target design
//!
//! Generic over any `embedded_hal` output pin: an esp-idf-hal `PinDriver`
//! on the device, a [`SimPin`](crate::adapters::sim::SimPin) on the host.

use embedded_hal::digital::OutputPin;
use log::warn;

use crate::app::ports::Light;

pub struct GpioLight<P> {
    pin: P,
    on: bool,
}

impl<P: OutputPin> GpioLight<P> {
    /// Takes the pin and drives it low.
    pub fn new(mut pin: P) -> Self {
        if pin.set_low().is_err() {
            warn!("Light: initial set_low failed");
        }
        Self { pin, on: false }
    }
}

impl<P: OutputPin> Light for GpioLight<P> {
    fn switch_on(&mut self) {
        if self.pin.set_high().is_err() {
            warn!("Light: set_high failed");
        }
        self.on = true;
    }

    fn switch_off(&mut self) {
        if self.pin.set_low().is_err() {
            warn!("Light: set_low failed");
        }
        self.on = false;
    }

    fn is_on(&self) -> bool {
        self.on
    }
}
