//! DeliveryStateMachine - キュー先頭のメッセージを 1 tick に 1 ステップ進める
//!
//! # フロー
//! 1. WaitForMessage: 先頭を peek、宛先を解決、payload を作って publish
//! 2. WaitPublish: handle を poll、成功なら先頭を削除
//! 3. WaitRetry: 遅延が経過したら 1 に戻る
//!
//! tick はブロックせず、スレッドも起動しない。ホストのメインループが呼び続ける。

use std::sync::Arc;

use super::config::WebhookConfig;
use super::status::{DeliveryCounters, DeliveryStatus};
use crate::domain::{DeliveryPhase, Message, MessageId, RetryReason, encode_payload};
use crate::ports::{
    Clock, PublishHandle, PublishRequest, PublishStatus, PublishTransport, RecipientResolver,
};
use crate::queue::{MessageQueue, MessageSender};

/// The head message paired with its outstanding publish.
struct PendingPublish {
    message: Message,
    handle: PublishHandle,
}

enum State {
    WaitForMessage,
    WaitPublish {
        started_ms: u32,
        pending: PendingPublish,
    },
    WaitRetry {
        entered_ms: u32,
        delay_ms: u32,
        reason: RetryReason,
    },
}

impl State {
    fn phase(&self) -> DeliveryPhase {
        match self {
            State::WaitForMessage => DeliveryPhase::WaitForMessage,
            State::WaitPublish { .. } => DeliveryPhase::WaitPublish,
            State::WaitRetry { .. } => DeliveryPhase::WaitRetry,
        }
    }
}

/// Turns a failure-prone async publish into at-least-once, rate-limited delivery
/// of queued messages.
///
/// Owned by the host application. Producers get [`MessageSender`] clones via
/// [`sender`](Self::sender); the host calls [`tick`](Self::tick) from its main
/// loop. Build one with [`WebhookBuilder`](super::WebhookBuilder).
pub struct DeliveryStateMachine<T> {
    config: WebhookConfig,
    resolver: Option<Box<dyn RecipientResolver>>,
    transport: T,
    clock: Arc<dyn Clock>,
    queue: MessageQueue,
    /// `None` until `setup()`.
    state: Option<State>,
    counters: DeliveryCounters,
}

impl<T: PublishTransport> DeliveryStateMachine<T> {
    pub(crate) fn new(
        config: WebhookConfig,
        resolver: Option<Box<dyn RecipientResolver>>,
        transport: T,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            config,
            resolver,
            transport,
            clock,
            queue: MessageQueue::new(),
            state: None,
            counters: DeliveryCounters::default(),
        }
    }

    /// Allocate the queue and enter WaitForMessage. Idempotent.
    ///
    /// Until this runs, `enqueue` and `tick` are silent no-ops.
    pub fn setup(&mut self) {
        self.queue.initialize();
        if self.state.is_none() {
            self.state = Some(State::WaitForMessage);
            tracing::debug!(event_name = %self.config.event_name, "sms webhook ready");
        }
    }

    pub fn is_setup(&self) -> bool {
        self.state.is_some()
    }

    /// Producer handle. Works from any thread; usable once `setup()` has run.
    pub fn sender(&self) -> MessageSender {
        MessageSender::new(self.queue.clone(), Arc::clone(&self.clock))
    }

    /// Queue a message. Same as `self.sender().enqueue(message)`.
    pub fn enqueue(&self, message: Message) -> Option<MessageId> {
        self.sender().enqueue(message)
    }

    pub fn config(&self) -> &WebhookConfig {
        &self.config
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    pub fn phase(&self) -> Option<DeliveryPhase> {
        self.state.as_ref().map(State::phase)
    }

    pub fn status(&self) -> DeliveryStatus {
        let (retry_reason, next_attempt_in_ms) = match &self.state {
            Some(State::WaitRetry {
                entered_ms,
                delay_ms,
                reason,
            }) => {
                let elapsed = self.clock.elapsed_since(*entered_ms);
                (Some(*reason), Some(delay_ms.saturating_sub(elapsed)))
            }
            _ => (None, None),
        };
        DeliveryStatus {
            phase: self.phase(),
            retry_reason,
            next_attempt_in_ms,
            queued: self.queue.len(),
            counters: self.counters,
        }
    }

    /// Advance delivery by one step. Never blocks.
    pub fn tick(&mut self) {
        let Some(state) = self.state.take() else {
            return;
        };
        let before = state.phase();

        let next = match state {
            State::WaitForMessage => self.wait_for_message(),
            State::WaitPublish {
                started_ms,
                pending,
            } => self.wait_publish(started_ms, pending),
            State::WaitRetry {
                entered_ms,
                delay_ms,
                reason,
            } => self.wait_retry(entered_ms, delay_ms, reason),
        };

        if next.phase() != before {
            tracing::debug!(from = ?before, to = ?next.phase(), "delivery state changed");
        }
        self.state = Some(next);
    }

    fn retry_after(&self, delay_ms: u32, reason: RetryReason) -> State {
        State::WaitRetry {
            entered_ms: self.clock.now_ms(),
            delay_ms,
            reason,
        }
    }

    fn wait_for_message(&mut self) -> State {
        // No message to send, or can't reach the cloud.
        let Some(message) = self.queue.peek_front() else {
            return State::WaitForMessage;
        };
        if !self.transport.is_connected() {
            return State::WaitForMessage;
        }

        let now = self.clock.now_ms();
        if message.is_expired(now) {
            match message.id() {
                Some(id) => {
                    self.queue.pop_front_if(id);
                }
                None => {
                    self.queue.pop_front();
                }
            }
            tracing::warn!(message_id = ?message.id(), "message expired before it was sent, discarding");
            self.counters.expired += 1;
            self.counters.consecutive_failures = 0;
            return State::WaitForMessage;
        }

        let recipient = match message.recipient() {
            Some(r) => Some(r.to_string()),
            None => match self.resolver.as_mut() {
                Some(resolver) => {
                    let mut slot = String::new();
                    if !resolver.resolve(&mut slot) || slot.is_empty() {
                        tracing::info!(
                            delay_ms = self.config.retry_no_recipient_ms,
                            "no recipient"
                        );
                        self.counters.recipient_misses += 1;
                        return self.retry_after(
                            self.config.retry_no_recipient_ms,
                            RetryReason::NoRecipient,
                        );
                    }
                    Some(slot)
                }
                // No resolver: the webhook's default recipient applies.
                None => None,
            },
        };

        let payload = encode_payload(
            message.body(),
            recipient.as_deref(),
            self.config.payload_limit_bytes,
        );
        tracing::info!(
            message_id = ?message.id(),
            attempt = self.counters.consecutive_failures.saturating_add(1),
            %payload,
            "publishing"
        );

        let handle = self.transport.publish(PublishRequest::private_with_ack(
            &self.config.event_name,
            &payload,
        ));
        self.counters.publish_attempts += 1;

        State::WaitPublish {
            started_ms: now,
            pending: PendingPublish { message, handle },
        }
    }

    fn wait_publish(&mut self, started_ms: u32, mut pending: PendingPublish) -> State {
        match pending.handle.poll() {
            PublishStatus::Pending => State::WaitPublish {
                started_ms,
                pending,
            },
            PublishStatus::Succeeded => {
                let took_ms = self.clock.elapsed_since(started_ms);
                if let Some(id) = pending.message.id()
                    && self.queue.pop_front_if(id).is_none()
                {
                    tracing::warn!(message_id = %id, "published message was no longer at the head");
                }
                tracing::info!(message_id = ?pending.message.id(), took_ms, "successfully published");
                self.counters.published += 1;
                self.counters.consecutive_failures = 0;
                self.retry_after(self.config.publish_rate_limit_ms, RetryReason::RateLimit)
            }
            PublishStatus::Failed(error) => {
                self.counters.publish_failures += 1;
                self.counters.consecutive_failures =
                    self.counters.consecutive_failures.saturating_add(1);
                tracing::warn!(
                    message_id = ?pending.message.id(),
                    %error,
                    failures = self.counters.consecutive_failures,
                    delay_ms = self.config.retry_publish_fail_ms,
                    "failed to publish, will try again"
                );
                self.retry_after(self.config.retry_publish_fail_ms, RetryReason::PublishFailed)
            }
        }
    }

    fn wait_retry(&self, entered_ms: u32, delay_ms: u32, reason: RetryReason) -> State {
        if self.clock.elapsed_since(entered_ms) >= delay_ms {
            State::WaitForMessage
        } else {
            State::WaitRetry {
                entered_ms,
                delay_ms,
                reason,
            }
        }
    }
}
