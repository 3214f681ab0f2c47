//! Application boundary.
//!
//! Task logic lives in [`crate::tasks`]; everything it needs from the
//! hardware or the network is reached through the traits in [`ports`].

pub mod ports;
