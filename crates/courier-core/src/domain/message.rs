//! Message: the value object producers hand to the queue.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use super::MessageId;

/// Practical body limit for a single SMS segment. Not enforced, only logged.
pub const MAX_BODY_CHARS: usize = 140;

/// A text message waiting to be published.
///
/// Design:
/// - Built fluently by the producer, then copied into the queue by value.
/// - The queue stamps `id` and `queued_ms` on insertion; nothing else changes it.
/// - `recipient` is optional. When absent the machine asks its resolver.
/// - Deserializing applies the same rules as the builders: an empty recipient
///   and a zero expiration both mean "not set".
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(from = "MessageRepr")]
pub struct Message {
    #[serde(skip_serializing_if = "Option::is_none")]
    id: Option<MessageId>,

    body: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    recipient: Option<String>,

    /// Max age in milliseconds, measured from `queued_ms`. `None` never expires.
    #[serde(skip_serializing_if = "Option::is_none")]
    expiration_ms: Option<u32>,

    queued_ms: u32,
}

/// Wire shape of [`Message`] before normalization.
#[derive(Deserialize)]
struct MessageRepr {
    #[serde(default)]
    id: Option<MessageId>,
    body: String,
    #[serde(default)]
    recipient: Option<String>,
    #[serde(default)]
    expiration_ms: Option<u32>,
    #[serde(default)]
    queued_ms: u32,
}

impl From<MessageRepr> for Message {
    fn from(repr: MessageRepr) -> Self {
        Self {
            id: repr.id,
            body: repr.body,
            recipient: repr.recipient.filter(|r| !r.is_empty()),
            expiration_ms: repr.expiration_ms.filter(|&ms| ms > 0),
            queued_ms: repr.queued_ms,
        }
    }
}

impl Message {
    pub fn new(body: impl Into<String>) -> Self {
        Self {
            body: body.into(),
            ..Self::default()
        }
    }

    /// Set an explicit recipient. Phone numbers start with `+` and the country code.
    pub fn with_recipient(mut self, recipient: impl Into<String>) -> Self {
        let recipient = recipient.into();
        self.recipient = (!recipient.is_empty()).then_some(recipient);
        self
    }

    pub fn with_body(mut self, body: impl Into<String>) -> Self {
        self.body = body.into();
        self
    }

    /// Discard the message if it is still queued after `max_age`.
    ///
    /// A zero duration clears the expiration.
    pub fn with_expiration(mut self, max_age: Duration) -> Self {
        let ms = u32::try_from(max_age.as_millis()).unwrap_or(u32::MAX);
        self.expiration_ms = (ms > 0).then_some(ms);
        self
    }

    pub fn id(&self) -> Option<MessageId> {
        self.id
    }

    pub fn body(&self) -> &str {
        &self.body
    }

    pub fn recipient(&self) -> Option<&str> {
        self.recipient.as_deref()
    }

    pub fn has_recipient(&self) -> bool {
        self.recipient.is_some()
    }

    pub fn expiration_ms(&self) -> Option<u32> {
        self.expiration_ms
    }

    pub fn queued_ms(&self) -> u32 {
        self.queued_ms
    }

    /// Has the message outlived its expiration?
    ///
    /// Uses wrapping subtraction so the answer stays right across a clock wrap.
    pub fn is_expired(&self, now_ms: u32) -> bool {
        match self.expiration_ms {
            Some(max_age) => now_ms.wrapping_sub(self.queued_ms) >= max_age,
            None => false,
        }
    }

    /// Bookkeeping done by the queue on insertion.
    pub(crate) fn stamp(&mut self, id: MessageId, now_ms: u32) {
        self.id = Some(id);
        self.queued_ms = now_ms;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[test]
    fn builder_sets_fields() {
        let msg = Message::new("Hi").with_recipient("+15551234567");
        assert_eq!(msg.body(), "Hi");
        assert_eq!(msg.recipient(), Some("+15551234567"));
        assert!(msg.has_recipient());
        assert!(msg.id().is_none());
    }

    #[test]
    fn empty_recipient_is_no_recipient() {
        let msg = Message::new("Hi").with_recipient("");
        assert!(!msg.has_recipient());
        assert_eq!(msg.recipient(), None);
    }

    #[test]
    fn deserialized_blanks_mean_unset() {
        let msg: Message =
            serde_json::from_str(r#"{"body":"Hi","recipient":"","expiration_ms":0}"#).unwrap();
        assert_eq!(msg.recipient(), None);
        assert!(!msg.has_recipient());
        assert_eq!(msg.expiration_ms(), None);
        assert!(!msg.is_expired(u32::MAX));
    }

    #[test]
    fn deserialize_keeps_real_values() {
        let msg: Message = serde_json::from_str(
            r#"{"body":"Hi","recipient":"+15551234567","expiration_ms":1000,"queued_ms":5}"#,
        )
        .unwrap();
        assert_eq!(msg.recipient(), Some("+15551234567"));
        assert_eq!(msg.expiration_ms(), Some(1_000));
        assert!(msg.is_expired(1_005));
        assert!(!msg.is_expired(1_004));
    }

    #[test]
    fn stamp_records_id_and_queue_time() {
        let mut msg = Message::new("Hi");
        let id = MessageId::generate();
        msg.stamp(id, 1234);
        assert_eq!(msg.id(), Some(id));
        assert_eq!(msg.queued_ms(), 1234);
    }

    #[test]
    fn without_expiration_never_expires() {
        let mut msg = Message::new("Hi");
        msg.stamp(MessageId::generate(), 0);
        assert!(!msg.is_expired(u32::MAX));
    }

    #[test]
    fn zero_expiration_clears() {
        let msg = Message::new("Hi")
            .with_expiration(Duration::from_secs(5))
            .with_expiration(Duration::ZERO);
        assert_eq!(msg.expiration_ms(), None);
    }

    #[rstest]
    #[case::fresh(1_000, 5_999, false)]
    #[case::exactly_at_limit(1_000, 6_000, true)]
    #[case::long_past(1_000, 60_000, true)]
    #[case::across_wrap(u32::MAX - 1_000, 3_000, false)]
    #[case::expired_across_wrap(u32::MAX - 1_000, 4_000, true)]
    fn expiration_uses_wrapping_age(#[case] queued: u32, #[case] now: u32, #[case] expired: bool) {
        let mut msg = Message::new("Hi").with_expiration(Duration::from_millis(5_000));
        msg.stamp(MessageId::generate(), queued);
        assert_eq!(msg.is_expired(now), expired);
    }
}
