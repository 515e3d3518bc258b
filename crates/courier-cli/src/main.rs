mod cloud;

use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;
use tokio::time::Instant;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

use courier_core::{Message, WebhookBuilder, WebhookConfig};

use crate::cloud::SimulatedCloud;

/// Drive the SMS webhook state machine against a simulated cloud.
#[derive(Debug, Parser)]
#[command(name = "courier", version)]
struct Args {
    /// JSON config file (eventName, retryNoRecipientMs, ...).
    #[arg(long, env = "COURIER_CONFIG")]
    config: Option<PathBuf>,

    #[arg(long, env = "COURIER_EVENT_NAME")]
    event_name: Option<String>,

    #[arg(long, env = "COURIER_RETRY_NO_RECIPIENT_MS")]
    retry_no_recipient_ms: Option<u32>,

    #[arg(long, env = "COURIER_RETRY_PUBLISH_FAIL_MS")]
    retry_publish_fail_ms: Option<u32>,

    #[arg(long, env = "COURIER_PUBLISH_RATE_LIMIT_MS")]
    publish_rate_limit_ms: Option<u32>,

    #[arg(long, env = "COURIER_PAYLOAD_LIMIT_BYTES")]
    payload_limit_bytes: Option<usize>,

    /// Messages to queue.
    #[arg(long, default_value_t = 3)]
    count: u32,

    /// Spacing between queued messages.
    #[arg(long, default_value_t = 200)]
    interval_ms: u64,

    /// Recipient the resolver hands out. Without it the webhook default is used.
    #[arg(long)]
    recipient: Option<String>,

    /// The resolver only knows the recipient after this long.
    #[arg(long, default_value_t = 0)]
    resolve_after_ms: u64,

    /// Put the recipient on each message instead of using the resolver.
    #[arg(long)]
    explicit_recipient: bool,

    /// Drop messages still queued after this long.
    #[arg(long)]
    expire_ms: Option<u64>,

    /// Fail the first N publishes.
    #[arg(long, default_value_t = 0)]
    fail_first: u32,

    /// Time the simulated cloud takes to ack a publish.
    #[arg(long, default_value_t = 150)]
    latency_ms: u64,

    /// Stay disconnected from the cloud for this long.
    #[arg(long, default_value_t = 0)]
    offline_ms: u64,

    /// Main loop period.
    #[arg(long, default_value_t = 10)]
    tick_ms: u64,
}

impl Args {
    fn webhook_config(&self) -> Result<WebhookConfig> {
        let mut config = match &self.config {
            Some(path) => WebhookConfig::from_path(path)
                .with_context(|| format!("loading {}", path.display()))?,
            None => WebhookConfig::default(),
        };
        if let Some(name) = &self.event_name {
            config.event_name = name.clone();
        }
        if let Some(ms) = self.retry_no_recipient_ms {
            config.retry_no_recipient_ms = ms;
        }
        if let Some(ms) = self.retry_publish_fail_ms {
            config.retry_publish_fail_ms = ms;
        }
        if let Some(ms) = self.publish_rate_limit_ms {
            config.publish_rate_limit_ms = ms;
        }
        if let Some(bytes) = self.payload_limit_bytes {
            config.payload_limit_bytes = bytes;
        }
        Ok(config)
    }
}

fn init_tracing() {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer())
        .init();
}

#[tokio::main]
async fn main() -> Result<()> {
    init_tracing();

    let args = Args::parse();
    let config = args.webhook_config()?;
    tracing::info!(event_name = %config.event_name, "configuration loaded");

    let cloud = SimulatedCloud::new(
        Duration::from_millis(args.latency_ms),
        Duration::from_millis(args.offline_ms),
        args.fail_first,
    );

    let mut builder = WebhookBuilder::new(cloud).with_config(config);
    if let Some(recipient) = args.recipient.clone().filter(|_| !args.explicit_recipient) {
        let known_at = Instant::now() + Duration::from_millis(args.resolve_after_ms);
        builder = builder.with_recipient_resolver(move |phone: &mut String| {
            if Instant::now() < known_at {
                return false;
            }
            phone.clone_from(&recipient);
            true
        });
    }
    let mut sms = builder.build()?;
    sms.setup();

    // (A) producer: queues messages from its own task
    let sender = sms.sender();
    let explicit = args.recipient.clone().filter(|_| args.explicit_recipient);
    let (count, interval, expire) = (args.count, args.interval_ms, args.expire_ms);
    let producer = tokio::spawn(async move {
        for n in 1..=count {
            let mut msg = Message::new(format!("Message {n}!"));
            if let Some(r) = &explicit {
                msg = msg.with_recipient(r.as_str());
            }
            if let Some(ms) = expire {
                msg = msg.with_expiration(Duration::from_millis(ms));
            }
            if let Some(id) = sender.enqueue(msg) {
                tracing::info!(message_id = %id, n, "queued");
            }
            tokio::time::sleep(Duration::from_millis(interval)).await;
        }
    });

    // (B) main loop: tick until everything is delivered or Ctrl-C
    let mut ticker = tokio::time::interval(Duration::from_millis(args.tick_ms.max(1)));
    let shutdown = tokio::signal::ctrl_c();
    tokio::pin!(shutdown);

    loop {
        tokio::select! {
            _ = ticker.tick() => {
                sms.tick();
                let status = sms.status();
                let settled = status.counters.published + status.counters.expired;
                if producer.is_finished() && settled >= u64::from(count) && status.is_idle() {
                    break;
                }
            }
            _ = &mut shutdown => {
                tracing::warn!(queued = sms.status().queued, "interrupted, undelivered messages are lost");
                break;
            }
        }
    }

    producer.abort();
    println!("{}", serde_json::to_string_pretty(&sms.status())?);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flags_override_config_defaults() {
        let args = Args::parse_from([
            "courier",
            "--event-name",
            "SmsAlert",
            "--publish-rate-limit-ms",
            "2000",
            "--payload-limit-bytes",
            "128",
        ]);
        let config = args.webhook_config().unwrap();
        assert_eq!(config.event_name, "SmsAlert");
        assert_eq!(config.publish_rate_limit_ms, 2_000);
        assert_eq!(config.payload_limit_bytes, 128);
        assert_eq!(config.retry_publish_fail_ms, 15_000);
    }
}
