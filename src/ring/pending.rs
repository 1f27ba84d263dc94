// ring/pending.rs - Pending Attestation Queue

use std::collections::VecDeque;

use crate::crypto::KeyExchangeMessage;

/// FIFO of attestations whose signer's key is not yet trusted.
///
/// The updater drains the queue each tick, replays every message, and puts
/// back only those that are still waiting for their signer. Synchronization
/// lives in the ring, which wraps the queue in its own mutex.
#[derive(Debug, Default)]
pub struct PendingQueue {
    queue: VecDeque<KeyExchangeMessage>,
}

impl PendingQueue {
    /// Create an empty queue
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a message at the back
    pub fn push(&mut self, msg: KeyExchangeMessage) {
        self.queue.push_back(msg);
    }

    /// Remove and return every queued message, oldest first
    pub fn take_all(&mut self) -> Vec<KeyExchangeMessage> {
        self.queue.drain(..).collect()
    }

    /// Put still-unresolved messages back at the front, keeping their
    /// relative order ahead of anything enqueued during the replay.
    pub fn restore_front(&mut self, msgs: Vec<KeyExchangeMessage>) {
        for msg in msgs.into_iter().rev() {
            self.queue.push_front(msg);
        }
    }

    /// Number of queued messages
    pub fn len(&self) -> usize {
        self.queue.len()
    }

    /// True when nothing is pending
    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }
}
