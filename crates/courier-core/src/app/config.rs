//! Webhook configuration.

use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::domain::DEFAULT_PAYLOAD_LIMIT;
use crate::error::ConfigError;

/// Cloud event names are limited to 64 characters.
pub const MAX_EVENT_NAME_LEN: usize = 64;

/// Smallest payload bound that still holds an empty body and a phone number.
pub const MIN_PAYLOAD_LIMIT: usize = 32;

/// Tunables of the delivery state machine.
///
/// Keys are camelCase in JSON (`eventName`, `retryNoRecipientMs`, ...). Every
/// field is optional and falls back to its default; unknown keys are rejected.
/// The recipient resolver is a capability, not data, so it is set on the
/// builder instead.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct WebhookConfig {
    /// Event name the webhook integration listens on.
    #[serde(default = "default_event_name")]
    pub event_name: String,

    /// Delay before asking the resolver again.
    #[serde(default = "default_retry_ms")]
    pub retry_no_recipient_ms: u32,

    /// Delay before retrying a failed publish.
    #[serde(default = "default_retry_ms")]
    pub retry_publish_fail_ms: u32,

    /// Minimum spacing after a successful publish.
    #[serde(default = "default_publish_rate_limit_ms")]
    pub publish_rate_limit_ms: u32,

    /// Upper bound of the encoded payload in bytes.
    #[serde(default = "default_payload_limit_bytes")]
    pub payload_limit_bytes: usize,
}

fn default_event_name() -> String {
    "SendSmsEvent".to_string()
}

fn default_retry_ms() -> u32 {
    15_000
}

fn default_publish_rate_limit_ms() -> u32 {
    1_010 // one publish per second, plus margin
}

fn default_payload_limit_bytes() -> usize {
    DEFAULT_PAYLOAD_LIMIT
}

impl Default for WebhookConfig {
    fn default() -> Self {
        Self {
            event_name: default_event_name(),
            retry_no_recipient_ms: default_retry_ms(),
            retry_publish_fail_ms: default_retry_ms(),
            publish_rate_limit_ms: default_publish_rate_limit_ms(),
            payload_limit_bytes: default_payload_limit_bytes(),
        }
    }
}

/// Milliseconds for the `u32` device counter, saturating.
pub(crate) fn duration_to_ms(d: Duration) -> u32 {
    u32::try_from(d.as_millis()).unwrap_or(u32::MAX)
}

impl WebhookConfig {
    pub fn from_json_str(s: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(s)?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json_str(&text)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.event_name.is_empty() {
            return Err(ConfigError::EmptyEventName);
        }
        let len = self.event_name.chars().count();
        if len > MAX_EVENT_NAME_LEN {
            return Err(ConfigError::EventNameTooLong {
                len,
                max: MAX_EVENT_NAME_LEN,
            });
        }
        if self.payload_limit_bytes < MIN_PAYLOAD_LIMIT {
            return Err(ConfigError::PayloadLimitTooSmall {
                limit: self.payload_limit_bytes,
                min: MIN_PAYLOAD_LIMIT,
            });
        }
        Ok(())
    }
}
