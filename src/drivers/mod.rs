//! Actuator, input and display drivers over `embedded_hal` traits.

pub mod button;
pub mod lcd;
pub mod light;
pub mod servo;

pub use button::DebouncedButton;
pub use lcd::Hd44780;
pub use light::GpioLight;
pub use servo::PwmServo;
