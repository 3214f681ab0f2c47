//! Hobby servo on a 50 Hz PWM channel (valve actuator).
//!
//! Pulse width maps linearly from 500 µs at 0° to 2500 µs at 180°.
//! Switching the servo off drops the pulse entirely so the horn can rest
//! unpowered between moves; switching it back on re-emits the last angle.

use embedded_hal::pwm::SetDutyCycle;
use log::warn;

use crate::app::ports::ServoMotor;

/// PWM frame length at 50 Hz.
const FRAME_US: u16 = 20_000;
const MIN_PULSE_US: u32 = 500;
const MAX_PULSE_US: u32 = 2_500;
const MAX_ANGLE: u8 = 180;

pub struct PwmServo<P> {
    pwm: P,
    angle: u8,
    powered: bool,
}

impl<P: SetDutyCycle> PwmServo<P> {
    pub fn new(pwm: P) -> Self {
        Self {
            pwm,
            angle: 0,
            powered: false,
        }
    }

    pub fn angle(&self) -> u8 {
        self.angle
    }

    pub fn is_powered(&self) -> bool {
        self.powered
    }

    fn pulse_us(angle: u8) -> u16 {
        let span = MAX_PULSE_US - MIN_PULSE_US;
        (MIN_PULSE_US + span * u32::from(angle.min(MAX_ANGLE)) / u32::from(MAX_ANGLE)) as u16
    }

    fn write(&mut self) {
        let pulse = Self::pulse_us(self.angle);
        if self.pwm.set_duty_cycle_fraction(pulse, FRAME_US).is_err() {
            warn!("Servo: duty write failed ({} us)", pulse);
        }
    }
}

impl<P: SetDutyCycle> ServoMotor for PwmServo<P> {
    fn on(&mut self) {
        self.powered = true;
        self.write();
    }

    fn off(&mut self) {
        self.powered = false;
        if self.pwm.set_duty_cycle_fully_off().is_err() {
            warn!("Servo: PWM off failed");
        }
    }

    fn set_angle(&mut self, degrees: u8) {
        self.angle = degrees.min(MAX_ANGLE);
        if self.powered {
            self.write();
        }
    }
}
