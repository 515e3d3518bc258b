//! RecipientResolver port - 宛先の遅延解決
//!
//! メッセージに宛先がないとき、状態機械が毎回呼び出します。
//! 呼び出し回数に上限はないので、実装は何度呼ばれても良いように書くこと。

/// Looks up the recipient for a message that was queued without one.
///
/// Returns `true` and fills `recipient` when it is known. Returning `false`, or
/// `true` with an empty string, means "not yet known, try again later".
/// Implementations must not block.
pub trait RecipientResolver: Send {
    fn resolve(&mut self, recipient: &mut String) -> bool;
}

impl<F> RecipientResolver for F
where
    F: FnMut(&mut String) -> bool + Send,
{
    fn resolve(&mut self, recipient: &mut String) -> bool {
        self(recipient)
    }
}

/// A resolver that always answers with the same number.
///
/// An empty number means the recipient is never known.
#[derive(Debug, Clone, Default)]
pub struct StaticRecipient {
    number: String,
}

impl StaticRecipient {
    pub fn new(number: impl Into<String>) -> Self {
        Self {
            number: number.into(),
        }
    }
}

impl RecipientResolver for StaticRecipient {
    fn resolve(&mut self, recipient: &mut String) -> bool {
        if self.number.is_empty() {
            return false;
        }
        recipient.clone_from(&self.number);
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn closures_are_resolvers() {
        let mut calls = 0;
        let mut resolver = |out: &mut String| {
            calls += 1;
            out.push_str("+15551234567");
            true
        };
        let mut slot = String::new();
        assert!(resolver.resolve(&mut slot));
        assert_eq!(slot, "+15551234567");
        drop(resolver);
        assert_eq!(calls, 1);
    }

    #[test]
    fn static_recipient_fills_slot() {
        let mut resolver = StaticRecipient::new("+12125551212");
        let mut slot = String::new();
        assert!(resolver.resolve(&mut slot));
        assert_eq!(slot, "+12125551212");
    }

    #[test]
    fn empty_static_recipient_is_unknown() {
        let mut resolver = StaticRecipient::default();
        let mut slot = String::new();
        assert!(!resolver.resolve(&mut slot));
        assert!(slot.is_empty());
    }
}
