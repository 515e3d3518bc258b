//! Producer handle for the message queue.

use std::sync::Arc;

use super::MessageQueue;
use crate::domain::message::MAX_BODY_CHARS;
use crate::domain::{Message, MessageId};
use crate::ports::Clock;

/// Append-only handle given to producers (button handlers, other tasks).
///
/// Cheap to clone and safe to use from any thread. It only appends; removal is
/// reserved for the delivery state machine. A sender taken before the machine's
/// `setup()` starts accepting messages once setup has run; until then `enqueue`
/// is a silent no-op.
///
/// May allocate, so it must not be called from an interrupt context.
#[derive(Clone)]
pub struct MessageSender {
    queue: MessageQueue,
    clock: Arc<dyn Clock>,
}

impl MessageSender {
    pub(crate) fn new(queue: MessageQueue, clock: Arc<dyn Clock>) -> Self {
        Self { queue, clock }
    }

    /// Queue a message for delivery. Returns the assigned id, if it was queued.
    pub fn enqueue(&self, message: Message) -> Option<MessageId> {
        let chars = message.body().chars().count();
        if chars == 0 {
            tracing::warn!("queueing message with empty body");
        } else if chars > MAX_BODY_CHARS {
            tracing::warn!(chars, max = MAX_BODY_CHARS, "message body longer than one sms");
        }

        let id = self.queue.enqueue(message, self.clock.now_ms())?;
        tracing::debug!(message_id = %id, pending = self.queue.len(), "message queued");
        Some(id)
    }

    /// Number of messages waiting, including the one being delivered.
    pub fn pending(&self) -> usize {
        self.queue.len()
    }
}

impl std::fmt::Debug for MessageSender {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MessageSender")
            .field("pending", &self.pending())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ports::ManualClock;

    #[test]
    fn stamps_queue_time_from_clock() {
        let queue = MessageQueue::new();
        queue.initialize();
        let clock = ManualClock::new(500);
        let sender = MessageSender::new(queue.clone(), Arc::new(clock.clone()));

        clock.advance(250);
        let id = sender.enqueue(Message::new("Hi")).unwrap();

        let head = queue.peek_front().unwrap();
        assert_eq!(head.id(), Some(id));
        assert_eq!(head.queued_ms(), 750);
        assert_eq!(sender.pending(), 1);
    }

    #[test]
    fn sender_created_before_initialize_goes_live_after() {
        let queue = MessageQueue::new();
        let sender = MessageSender::new(queue.clone(), Arc::new(ManualClock::new(0)));

        assert!(sender.enqueue(Message::new("early")).is_none());
        queue.initialize();
        assert!(sender.enqueue(Message::new("late")).is_some());

        assert_eq!(queue.len(), 1);
        assert_eq!(queue.peek_front().unwrap().body(), "late");
    }

    #[tokio::test]
    async fn clones_from_many_tasks_share_the_queue() {
        let queue = MessageQueue::new();
        queue.initialize();
        let sender = MessageSender::new(queue.clone(), Arc::new(ManualClock::new(0)));

        let tasks: Vec<_> = (0..4)
            .map(|n| {
                let s = sender.clone();
                tokio::spawn(async move {
                    for i in 0..25 {
                        s.enqueue(Message::new(format!("task {n} msg {i}")));
                        tokio::task::yield_now().await;
                    }
                })
            })
            .collect();
        for t in tasks {
            t.await.unwrap();
        }

        assert_eq!(sender.pending(), 100);
    }
}
