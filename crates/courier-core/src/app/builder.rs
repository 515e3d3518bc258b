//! WebhookBuilder - 状態機械の構築とワイヤリング
//!
//! # Fail-fast 設計
//! - 設定値の検証は build() 時にまとめて行う
//! - 不正な設定は ConfigError を返し、実行時には失敗しない

use std::sync::Arc;
use std::time::Duration;

use super::config::{WebhookConfig, duration_to_ms};
use super::machine::DeliveryStateMachine;
use crate::error::ConfigError;
use crate::ports::{Clock, PublishTransport, RecipientResolver, SystemClock};

/// WebhookBuilder は DeliveryStateMachine を構築
///
/// # 使用例
/// ```ignore
/// let mut sms = WebhookBuilder::new(cloud)
///     .with_event_name("SendSmsEvent")
///     .with_recipient_resolver(|phone: &mut String| {
///         phone.push_str(&settings.phone());
///         !phone.is_empty()
///     })
///     .build()?;
/// sms.setup();
/// ```
pub struct WebhookBuilder<T> {
    config: WebhookConfig,
    resolver: Option<Box<dyn RecipientResolver>>,
    transport: T,
    clock: Arc<dyn Clock>,
}

impl<T: PublishTransport> WebhookBuilder<T> {
    /// Default config, system clock, no resolver.
    pub fn new(transport: T) -> Self {
        Self {
            config: WebhookConfig::default(),
            resolver: None,
            transport,
            clock: Arc::new(SystemClock::new()),
        }
    }

    /// Replace the whole config (e.g. one loaded from a file).
    pub fn with_config(mut self, config: WebhookConfig) -> Self {
        self.config = config;
        self
    }

    pub fn with_event_name(mut self, event_name: impl Into<String>) -> Self {
        self.config.event_name = event_name.into();
        self
    }

    /// Called when a message has no explicit recipient.
    pub fn with_recipient_resolver(mut self, resolver: impl RecipientResolver + 'static) -> Self {
        self.resolver = Some(Box::new(resolver));
        self
    }

    pub fn with_retry_no_recipient(mut self, delay: Duration) -> Self {
        self.config.retry_no_recipient_ms = duration_to_ms(delay);
        self
    }

    pub fn with_retry_publish_fail(mut self, delay: Duration) -> Self {
        self.config.retry_publish_fail_ms = duration_to_ms(delay);
        self
    }

    pub fn with_publish_rate_limit(mut self, spacing: Duration) -> Self {
        self.config.publish_rate_limit_ms = duration_to_ms(spacing);
        self
    }

    pub fn with_payload_limit(mut self, bytes: usize) -> Self {
        self.config.payload_limit_bytes = bytes;
        self
    }

    pub fn with_clock(mut self, clock: impl Clock + 'static) -> Self {
        self.clock = Arc::new(clock);
        self
    }

    /// Validate the config and build the machine.
    ///
    /// The machine still needs `setup()` before it accepts messages.
    pub fn build(self) -> Result<DeliveryStateMachine<T>, ConfigError> {
        self.config.validate()?;
        Ok(DeliveryStateMachine::new(
            self.config,
            self.resolver,
            self.transport,
            self.clock,
        ))
    }
}
