//! PublishTransport port - クラウドへの非同期 publish
//!
//! publish はすぐに `PublishHandle` を返し、結果は後で解決されます。
//! 状態機械は毎 tick `poll()` するだけで、決して待ちません（キャンセルもなし）。

use thiserror::Error;
use tokio::sync::oneshot;
use tokio::sync::oneshot::error::TryRecvError;

/// Why a publish attempt failed. All of these are transient.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PublishError {
    #[error("cloud not connected")]
    NotConnected,

    #[error("ack not received")]
    AckTimeout,

    #[error("transport error: {0}")]
    Transport(String),

    /// The transport dropped the completer without reporting an outcome.
    #[error("publish abandoned before it resolved")]
    Abandoned,
}

/// Event visibility on the cloud bus. SMS events stay private to the account.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Visibility {
    Private,
}

/// Ack requirement. The transport resolves only after the cloud acks.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AckMode {
    WithAck,
}

/// One publish call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PublishRequest<'a> {
    pub event_name: &'a str,
    pub payload: &'a str,
    pub visibility: Visibility,
    pub ack: AckMode,
}

impl<'a> PublishRequest<'a> {
    /// Private event with ack required; what the webhook integration expects.
    pub fn private_with_ack(event_name: &'a str, payload: &'a str) -> Self {
        Self {
            event_name,
            payload,
            visibility: Visibility::Private,
            ack: AckMode::WithAck,
        }
    }
}

/// Result of polling a [`PublishHandle`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PublishStatus {
    Pending,
    Succeeded,
    Failed(PublishError),
}

/// Polled handle for an outstanding publish.
///
/// Only exposes "is it done" and "what was the outcome". Once resolved the
/// outcome is remembered, so polling again returns the same answer.
#[derive(Debug)]
pub struct PublishHandle {
    rx: Option<oneshot::Receiver<Result<(), PublishError>>>,
    outcome: Option<Result<(), PublishError>>,
}

/// Write side of a [`PublishHandle`], held by the transport.
///
/// Dropping it without calling [`complete`](Self::complete) resolves the handle
/// as [`PublishError::Abandoned`].
#[derive(Debug)]
pub struct PublishCompleter {
    tx: oneshot::Sender<Result<(), PublishError>>,
}

impl PublishHandle {
    /// A pending handle and the completer that resolves it.
    pub fn channel() -> (PublishCompleter, PublishHandle) {
        let (tx, rx) = oneshot::channel();
        (
            PublishCompleter { tx },
            PublishHandle {
                rx: Some(rx),
                outcome: None,
            },
        )
    }

    /// A handle that is already resolved.
    pub fn resolved(outcome: Result<(), PublishError>) -> Self {
        Self {
            rx: None,
            outcome: Some(outcome),
        }
    }

    /// Non-blocking check of the outcome.
    pub fn poll(&mut self) -> PublishStatus {
        if self.outcome.is_none()
            && let Some(rx) = self.rx.as_mut()
        {
            match rx.try_recv() {
                Ok(outcome) => self.outcome = Some(outcome),
                Err(TryRecvError::Empty) => return PublishStatus::Pending,
                Err(TryRecvError::Closed) => self.outcome = Some(Err(PublishError::Abandoned)),
            }
            self.rx = None;
        }

        match &self.outcome {
            Some(Ok(())) => PublishStatus::Succeeded,
            Some(Err(e)) => PublishStatus::Failed(e.clone()),
            None => PublishStatus::Failed(PublishError::Abandoned),
        }
    }
}

impl PublishCompleter {
    pub fn complete(self, outcome: Result<(), PublishError>) {
        // The handle may already be gone; nobody is left to tell.
        let _ = self.tx.send(outcome);
    }

    pub fn succeed(self) {
        self.complete(Ok(()));
    }

    pub fn fail(self, error: PublishError) {
        self.complete(Err(error));
    }
}

/// Publish transport (the cloud connection).
///
/// `publish` must return immediately; the work happens elsewhere and resolves
/// the returned handle later.
pub trait PublishTransport {
    /// Is the device currently connected to the cloud?
    fn is_connected(&self) -> bool;

    fn publish(&self, request: PublishRequest<'_>) -> PublishHandle;
}

impl<T: PublishTransport + ?Sized> PublishTransport for Box<T> {
    fn is_connected(&self) -> bool {
        (**self).is_connected()
    }

    fn publish(&self, request: PublishRequest<'_>) -> PublishHandle {
        (**self).publish(request)
    }
}
