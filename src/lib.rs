//! Tankflow firmware library.
//!
//! Shared by the two rig nodes: the tank monitoring subsystem (`tms`
//! binary) and the water channel subsystem (`wcs` binary).  Everything
//! except the binaries, the ESP-IDF adapters and the link shims builds on
//! the host so the task logic can be tested against the simulated
//! peripherals in [`adapters::sim`].

#![deny(unused_must_use)]

pub mod adapters;
pub mod app;
pub mod config;
pub mod context;
pub mod drivers;
pub mod error;
pub mod fsm;
pub mod kernel;
pub mod pins;
pub mod protocol;
pub mod sensors;
pub mod tasks;

#[cfg(target_os = "espidf")]
mod esp_link_shims;
