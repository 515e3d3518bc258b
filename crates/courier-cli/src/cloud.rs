//! SimulatedCloud - tokio 上で publish を遅延解決する疑似クラウド
//!
//! publish() はすぐに handle を返し、spawn したタスクが latency 後に結果を書き込む。
//! 最初の `fail_first` 回は失敗させ、`online_at` までは未接続として振る舞う。

use std::sync::Arc;
use std::sync::atomic::{AtomicU32, Ordering};
use std::time::Duration;

use tokio::time::Instant;

use courier_core::ports::{PublishError, PublishHandle, PublishRequest, PublishTransport};

pub struct SimulatedCloud {
    latency: Duration,
    online_at: Instant,
    failures_left: Arc<AtomicU32>,
}

impl SimulatedCloud {
    pub fn new(latency: Duration, offline_for: Duration, fail_first: u32) -> Self {
        Self {
            latency,
            online_at: Instant::now() + offline_for,
            failures_left: Arc::new(AtomicU32::new(fail_first)),
        }
    }

    /// Take one scripted failure, if any are left.
    fn take_failure(&self) -> bool {
        self.failures_left
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok()
    }
}

impl PublishTransport for SimulatedCloud {
    fn is_connected(&self) -> bool {
        Instant::now() >= self.online_at
    }

    fn publish(&self, request: PublishRequest<'_>) -> PublishHandle {
        let (completer, handle) = PublishHandle::channel();
        let fail = self.take_failure();
        let latency = self.latency;
        let event = request.event_name.to_string();
        let payload = request.payload.to_string();

        tokio::spawn(async move {
            tokio::time::sleep(latency).await;
            if fail {
                tracing::debug!(%event, "cloud: ack not received");
                completer.fail(PublishError::AckTimeout);
            } else {
                tracing::info!(%event, %payload, "cloud: event delivered to webhook");
                completer.succeed();
            }
        });

        handle
    }
}
