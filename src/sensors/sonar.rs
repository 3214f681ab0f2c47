//! HC-SR04 ultrasonic distance sensor.
//!
//! ## Measurement
//!
//! A 10 µs trigger pulse starts a ping; the echo pin then stays high for
//! the round-trip time.  Both the wait for the rising edge and the echo
//! width are bounded by `timeout_us`; either timing out yields
//! [`NO_ECHO`].
//!
//! ```text
//! distance_cm = width_s · v / 2 · 100,   v = 331.5 + 0.6 · T  (m/s, T in °C)
//! ```

use embedded_hal::delay::DelayNs;
use embedded_hal::digital::{InputPin, OutputPin};

use crate::app::ports::{Clock, NO_ECHO, ProximitySensor};
use crate::config::SONAR_DEFAULT_TEMPERATURE_C;

pub struct Sonar<T, E, D, C> {
    trig: T,
    echo: E,
    delay: D,
    clock: C,
    timeout_us: u64,
    temperature_c: f32,
}

impl<T, E, D, C> Sonar<T, E, D, C>
where
    T: OutputPin,
    E: InputPin,
    D: DelayNs,
    C: Clock,
{
    pub fn new(trig: T, echo: E, delay: D, clock: C, timeout_us: u64) -> Self {
        Self {
            trig,
            echo,
            delay,
            clock,
            timeout_us,
            temperature_c: SONAR_DEFAULT_TEMPERATURE_C,
        }
    }

    /// Air temperature used for the speed of sound.
    pub fn set_temperature(&mut self, celsius: f32) {
        self.temperature_c = celsius;
    }

    fn speed_of_sound(&self) -> f32 {
        331.5 + 0.6 * self.temperature_c
    }

    fn trigger(&mut self) -> bool {
        let ok = self.trig.set_low().is_ok();
        self.delay.delay_us(2);
        let ok = ok && self.trig.set_high().is_ok();
        self.delay.delay_us(10);
        ok && self.trig.set_low().is_ok()
    }

    /// Wait until the echo pin reads `level`.  Returns the time it did,
    /// or `None` on timeout or read error.
    fn wait_for(&mut self, level: bool, since_us: u64) -> Option<u64> {
        loop {
            let now = self.clock.now_us();
            match self.echo.is_high() {
                Ok(high) if high == level => return Some(now),
                Ok(_) => {}
                Err(_) => return None,
            }
            if now.saturating_sub(since_us) > self.timeout_us {
                return None;
            }
        }
    }

    /// Echo high time in µs.
    fn echo_width_us(&mut self) -> Option<u64> {
        if !self.trigger() {
            return None;
        }
        let rise = self.wait_for(true, self.clock.now_us())?;
        let fall = self.wait_for(false, rise)?;
        Some(fall - rise)
    }
}

impl<T, E, D, C> ProximitySensor for Sonar<T, E, D, C>
where
    T: OutputPin,
    E: InputPin,
    D: DelayNs,
    C: Clock,
{
    fn distance_cm(&mut self) -> f32 {
        match self.echo_width_us() {
            Some(width) => width as f32 / 1_000_000.0 * self.speed_of_sound() / 2.0 * 100.0,
            None => NO_ECHO,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::sim::SimPin;
    use crate::adapters::time::ManualClock;
    use core::convert::Infallible;

    struct NoDelay;

    impl DelayNs for NoDelay {
        fn delay_ns(&mut self, _ns: u32) {}
    }

    /// Echo pin that moves the clock 10 µs per read and is high in
    /// `[rise, fall)`.
    struct ScriptedEcho {
        clock: ManualClock,
        rise_us: u64,
        fall_us: u64,
    }

    impl embedded_hal::digital::ErrorType for ScriptedEcho {
        type Error = Infallible;
    }

    impl InputPin for ScriptedEcho {
        fn is_high(&mut self) -> Result<bool, Infallible> {
            self.clock.advance_us(10);
            let t = self.clock.now_us();
            Ok(t >= self.rise_us && t < self.fall_us)
        }

        fn is_low(&mut self) -> Result<bool, Infallible> {
            self.is_high().map(|h| !h)
        }
    }

    fn sonar(rise_us: u64, fall_us: u64) -> Sonar<SimPin, ScriptedEcho, NoDelay, ManualClock> {
        let clock = ManualClock::new(0);
        let echo = ScriptedEcho {
            clock: clock.clone(),
            rise_us,
            fall_us,
        };
        Sonar::new(SimPin::new(false), echo, NoDelay, clock, 30_000)
    }

    #[test]
    fn distance_from_echo_width() {
        // 1000 µs at 20 °C: 0.001 · 343.5 / 2 · 100 ≈ 17.18 cm.
        let mut s = sonar(200, 1_200);
        let d = s.distance_cm();
        assert!((d - 17.175).abs() < 0.5, "got {d}");
    }

    #[test]
    fn temperature_changes_speed() {
        let mut s = sonar(200, 1_200);
        s.set_temperature(0.0);
        let d = s.distance_cm();
        // 331.5 m/s → ≈ 16.58 cm.
        assert!((d - 16.575).abs() < 0.5, "got {d}");
    }

    #[test]
    fn no_rising_edge_is_no_echo() {
        let mut s = sonar(u64::MAX, u64::MAX);
        assert_eq!(s.distance_cm(), NO_ECHO);
    }

    #[test]
    fn stuck_high_echo_is_no_echo() {
        let mut s = sonar(100, u64::MAX);
        assert_eq!(s.distance_cm(), NO_ECHO);
    }
}
