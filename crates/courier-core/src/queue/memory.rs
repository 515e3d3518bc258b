//! In-memory message queue.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use crate::domain::{Message, MessageId};

/// Concurrency-safe FIFO of pending messages.
///
/// Design:
/// - One `Mutex` around the container, held only for the container operation.
///   Serialization and publish never run under it.
/// - Starts uninitialized (`None`); every operation is a silent no-op until
///   [`initialize`](Self::initialize) runs. A poisoned lock degrades the same way.
/// - Clones share the same queue. Producers should get a [`MessageSender`]
///   instead, which can only append.
///
/// [`MessageSender`]: super::MessageSender
#[derive(Debug, Clone, Default)]
pub struct MessageQueue {
    inner: Arc<Mutex<Option<VecDeque<Message>>>>,
}

impl MessageQueue {
    /// An uninitialized queue.
    pub fn new() -> Self {
        Self::default()
    }

    /// Allocate the container. Idempotent; existing messages are kept.
    pub fn initialize(&self) {
        match self.inner.lock() {
            Ok(mut guard) => {
                guard.get_or_insert_with(VecDeque::new);
            }
            Err(_) => tracing::warn!("message queue lock poisoned, cannot initialize"),
        }
    }

    pub fn is_initialized(&self) -> bool {
        self.with_queue(|_| ()).is_some()
    }

    /// Run `f` on the container under the lock, or `None` if unavailable.
    fn with_queue<R>(&self, f: impl FnOnce(&mut VecDeque<Message>) -> R) -> Option<R> {
        let mut guard = self.inner.lock().ok()?;
        guard.as_mut().map(f)
    }

    /// Append to the tail, stamping id and queue time.
    ///
    /// Returns the assigned id, or `None` if the queue is not usable (the
    /// message is dropped silently in that case).
    pub fn enqueue(&self, mut message: Message, now_ms: u32) -> Option<MessageId> {
        let id = MessageId::generate();
        message.stamp(id, now_ms);
        let queued = self.with_queue(|q| q.push_back(message));
        if queued.is_none() {
            tracing::debug!("enqueue before setup ignored");
        }
        queued.map(|()| id)
    }

    /// Copy of the head, without removing it.
    pub fn peek_front(&self) -> Option<Message> {
        self.with_queue(|q| q.front().cloned()).flatten()
    }

    /// Remove and return the head. No-op on an empty queue.
    pub fn pop_front(&self) -> Option<Message> {
        self.with_queue(|q| q.pop_front()).flatten()
    }

    /// Remove the head only if it is the message with `id`.
    pub fn pop_front_if(&self, id: MessageId) -> Option<Message> {
        self.with_queue(|q| {
            if q.front().and_then(Message::id) == Some(id) {
                q.pop_front()
            } else {
                None
            }
        })
        .flatten()
    }

    pub fn len(&self) -> usize {
        self.with_queue(|q| q.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
