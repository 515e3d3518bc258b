//! Delivery phase of the state machine.

use serde::{Deserialize, Serialize};

/// Which step the delivery state machine is waiting on.
///
/// State transitions:
/// - WaitForMessage -> WaitPublish (head has a recipient, publish started)
/// - WaitForMessage -> WaitRetry (recipient unknown)
/// - WaitPublish -> WaitRetry (publish resolved, success or failure)
/// - WaitRetry -> WaitForMessage (delay elapsed)
///
/// There is no terminal phase.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DeliveryPhase {
    /// Idle, or waiting for the queue to fill / the cloud to connect.
    WaitForMessage,

    /// A publish for the head message is outstanding.
    WaitPublish,

    /// Sleeping before the next attempt.
    WaitRetry,
}

/// Why the machine entered [`DeliveryPhase::WaitRetry`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RetryReason {
    /// Resolver did not know the recipient yet.
    NoRecipient,

    /// The publish resolved as failed; the head is kept.
    PublishFailed,

    /// The publish succeeded; spacing before the next one.
    RateLimit,
}

impl DeliveryPhase {
    /// Is a publish in flight?
    pub fn is_publishing(self) -> bool {
        matches!(self, DeliveryPhase::WaitPublish)
    }
}
