//! Shared state of the tank monitoring node.
//!
//! The TMS tasks run on separate threads, so each field group sits behind
//! its own blocking mutex.  Critical sections are short and never span a
//! network call: the network task copies the head message out, releases
//! the lock, sends, then acks.

use core::cell::{Cell, RefCell};

use embassy_sync::blocking_mutex::Mutex;
use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;

use super::mailbox::{Mailbox, Message};
use crate::error::QueueError;
use crate::kernel::Millis;

/// One distance sample.  `level` may be [`NO_ECHO`](crate::app::ports::NO_ECHO).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LevelReading {
    pub level: f32,
    pub timestamp: Millis,
}

pub struct TmsContext {
    /// Written by the sensor task.
    level: Mutex<CriticalSectionRawMutex, Cell<Option<LevelReading>>>,
    /// Produced by the sensor task, drained by the network task.
    outbox: Mutex<CriticalSectionRawMutex, RefCell<Mailbox>>,
}

impl Default for TmsContext {
    fn default() -> Self {
        Self::new()
    }
}

impl TmsContext {
    pub const fn new() -> Self {
        Self {
            level: Mutex::new(Cell::new(None)),
            outbox: Mutex::new(RefCell::new(Mailbox::new())),
        }
    }

    pub fn set_water_level(&self, reading: LevelReading) {
        self.level.lock(|l| l.set(Some(reading)));
    }

    /// Latest sample, `None` before the first one.
    pub fn water_level(&self) -> Option<LevelReading> {
        self.level.lock(Cell::get)
    }

    pub fn enqueue(&self, topic: &str, payload: &str) -> Result<u32, QueueError> {
        self.outbox.lock(|m| m.borrow_mut().push(topic, payload))
    }

    /// Copy of the oldest pending message.
    pub fn next_outbound(&self) -> Option<Message> {
        self.outbox.lock(|m| m.borrow().front().cloned())
    }

    /// Remove the head if it is `seq`.
    pub fn ack(&self, seq: u32) -> bool {
        self.outbox.lock(|m| m.borrow_mut().ack(seq))
    }

    pub fn pending(&self) -> usize {
        self.outbox.lock(|m| m.borrow().len())
    }
}
