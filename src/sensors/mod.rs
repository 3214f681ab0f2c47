//! Input devices: distance ranging (TMS) and the operator potentiometer (WCS).

pub mod potentiometer;
pub mod sonar;

pub use potentiometer::AnalogPotentiometer;
pub use sonar::Sonar;
