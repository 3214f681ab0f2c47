//! Shared state between the tasks of a node.
//!
//! Tasks never call each other; they communicate only through these
//! blackboards, each held by non-owning reference for the life of the
//! firmware.

pub mod mailbox;
pub mod tms;
pub mod wcs;

pub use mailbox::{Mailbox, Message};
pub use tms::{LevelReading, TmsContext};
pub use wcs::{Mode, WcsContext};
