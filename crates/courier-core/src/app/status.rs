//! Status - 状態機械のスナップショット
//!
//! ホスト側がログやアラートに使う。retry には上限がないので、
//! 「詰まっている」ことは `consecutive_failures` などで外から判断する。

use serde::{Deserialize, Serialize};

use crate::domain::{DeliveryPhase, RetryReason};

/// Counters kept by the state machine over its lifetime.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeliveryCounters {
    /// Publishes started.
    pub publish_attempts: u64,
    /// Publishes that resolved as succeeded (messages removed).
    pub published: u64,
    /// Publishes that resolved as failed.
    pub publish_failures: u64,
    /// Times the resolver did not know the recipient.
    pub recipient_misses: u64,
    /// Messages discarded because their expiration passed.
    pub expired: u64,
    /// Failed attempts for the current head; reset when it leaves the queue.
    pub consecutive_failures: u32,
}

/// Point-in-time view of a [`DeliveryStateMachine`](super::DeliveryStateMachine).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeliveryStatus {
    /// `None` until `setup()` has run.
    pub phase: Option<DeliveryPhase>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub retry_reason: Option<RetryReason>,

    /// Time left before leaving WaitRetry.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub next_attempt_in_ms: Option<u32>,

    /// Messages in the queue, including the head being delivered.
    pub queued: usize,

    #[serde(flatten)]
    pub counters: DeliveryCounters,
}

impl DeliveryStatus {
    /// Nothing queued and nothing in flight.
    pub fn is_idle(&self) -> bool {
        self.queued == 0 && !self.phase.is_some_and(DeliveryPhase::is_publishing)
    }
}
