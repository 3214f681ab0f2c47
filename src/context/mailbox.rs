//! Bounded outbound mailbox.
//!
//! FIFO of fixed-size messages.  When full, the *new* message is dropped
//! and the queued ones are kept.  Every accepted message gets a sequence
//! number; the sender copies the head out with [`Mailbox::front`], sends
//! it without holding any lock, and only then removes it with
//! [`Mailbox::ack`].  A failed send leaves the head in place for the
//! next attempt, and an ack for anything but the current head is ignored,
//! so a message is neither lost nor sent twice.

use log::warn;

use crate::config::{MAILBOX_CAPACITY, PAYLOAD_MAX_LEN, TOPIC_MAX_LEN};
use crate::error::QueueError;

/// One queued publication.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Message {
    pub seq: u32,
    pub topic: heapless::String<TOPIC_MAX_LEN>,
    pub payload: heapless::String<PAYLOAD_MAX_LEN>,
}

pub struct Mailbox<const N: usize = MAILBOX_CAPACITY> {
    queue: heapless::Deque<Message, N>,
    next_seq: u32,
}

impl<const N: usize> Default for Mailbox<N> {
    fn default() -> Self {
        Self::new()
    }
}

impl<const N: usize> Mailbox<N> {
    pub const fn new() -> Self {
        Self {
            queue: heapless::Deque::new(),
            next_seq: 0,
        }
    }

    /// Queue a message.  Returns its sequence number.
    pub fn push(&mut self, topic: &str, payload: &str) -> Result<u32, QueueError> {
        if self.queue.is_full() {
            warn!("Mailbox: queue full ({}), dropping message for '{}'", N, topic);
            return Err(QueueError::Full);
        }
        let topic = heapless::String::try_from(topic).map_err(|_| {
            warn!("Mailbox: topic '{}' exceeds {} bytes, dropped", topic, TOPIC_MAX_LEN);
            QueueError::TopicTooLong
        })?;
        let payload = heapless::String::try_from(payload).map_err(|_| {
            warn!("Mailbox: payload exceeds {} bytes, dropped", PAYLOAD_MAX_LEN);
            QueueError::PayloadTooLong
        })?;

        let seq = self.next_seq;
        self.next_seq = self.next_seq.wrapping_add(1);
        // Cannot fail: fullness checked above.
        let _ = self.queue.push_back(Message { seq, topic, payload });
        Ok(seq)
    }

    /// Oldest message, left in place.
    pub fn front(&self) -> Option<&Message> {
        self.queue.front()
    }

    /// Remove the head if it is `seq`.  Returns whether anything was removed.
    pub fn ack(&mut self, seq: u32) -> bool {
        if self.queue.front().is_some_and(|m| m.seq == seq) {
            self.queue.pop_front();
            true
        } else {
            false
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = &Message> {
        self.queue.iter()
    }

    pub fn len(&self) -> usize {
        self.queue.len()
    }

    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }

    pub fn is_full(&self) -> bool {
        self.queue.is_full()
    }

    pub fn clear(&mut self) {
        self.queue.clear();
    }
}
