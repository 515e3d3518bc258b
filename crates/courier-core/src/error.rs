use std::path::PathBuf;

use thiserror::Error;

/// Errors raised while loading or validating a [`WebhookConfig`](crate::WebhookConfig).
///
/// These only happen at construction time. Once a machine is built nothing in the
/// delivery path returns an error; failures there are retried.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid config json: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("event name must not be empty")]
    EmptyEventName,

    #[error("event name is {len} characters, max is {max}")]
    EventNameTooLong { len: usize, max: usize },

    #[error("payload limit {limit} bytes is below the minimum of {min}")]
    PayloadLimitTooSmall { limit: usize, min: usize },
}
