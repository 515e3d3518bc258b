//! ScriptedTransport - 台本どおりに振る舞う PublishTransport
//!
//! # 使い方
//! - `then(...)` で次の publish の結果を順に積む（尽きたら default）
//! - `Hold` は保留にして、後から `resolve_held()` で解決する
//! - clone は内部状態を共有するので、状態機械に渡した後も検査できる

use std::collections::VecDeque;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use crate::ports::{
    AckMode, PublishCompleter, PublishError, PublishHandle, PublishRequest, PublishTransport,
    Visibility,
};

/// What the next publish resolves to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScriptedOutcome {
    Succeed,
    Fail(PublishError),
    /// Stay pending until [`ScriptedTransport::resolve_held`].
    Hold,
}

/// A publish call as the transport saw it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PublishedEvent {
    pub event_name: String,
    pub payload: String,
    pub visibility: Visibility,
    pub ack: AckMode,
}

impl PublishedEvent {
    fn json(&self) -> Option<serde_json::Value> {
        serde_json::from_str(&self.payload).ok()
    }

    /// `"b"` field of the payload.
    pub fn body(&self) -> Option<String> {
        self.json()?.get("b")?.as_str().map(str::to_string)
    }

    /// `"t"` field of the payload, if present.
    pub fn recipient(&self) -> Option<String> {
        self.json()?.get("t")?.as_str().map(str::to_string)
    }
}

#[derive(Debug)]
struct ScriptState {
    connected: bool,
    script: VecDeque<ScriptedOutcome>,
    fallback: ScriptedOutcome,
    published: Vec<PublishedEvent>,
    held: VecDeque<PublishCompleter>,
}

#[derive(Debug, Clone)]
pub struct ScriptedTransport {
    state: Arc<Mutex<ScriptState>>,
}

impl ScriptedTransport {
    /// Connected; every publish succeeds immediately.
    pub fn new() -> Self {
        Self {
            state: Arc::new(Mutex::new(ScriptState {
                connected: true,
                script: VecDeque::new(),
                fallback: ScriptedOutcome::Succeed,
                published: Vec::new(),
                held: VecDeque::new(),
            })),
        }
    }

    fn lock(&self) -> MutexGuard<'_, ScriptState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Queue the outcome of the next unscripted publish.
    pub fn then(self, outcome: ScriptedOutcome) -> Self {
        self.lock().script.push_back(outcome);
        self
    }

    /// Outcome used once the script runs out.
    pub fn otherwise(self, outcome: ScriptedOutcome) -> Self {
        self.lock().fallback = outcome;
        self
    }

    pub fn set_connected(&self, connected: bool) {
        self.lock().connected = connected;
    }

    pub fn published(&self) -> Vec<PublishedEvent> {
        self.lock().published.clone()
    }

    pub fn publish_count(&self) -> usize {
        self.lock().published.len()
    }

    pub fn held_count(&self) -> usize {
        self.lock().held.len()
    }

    /// Resolve the oldest held publish. Returns `false` if none was held.
    pub fn resolve_held(&self, outcome: Result<(), PublishError>) -> bool {
        let completer = self.lock().held.pop_front();
        match completer {
            Some(c) => {
                c.complete(outcome);
                true
            }
            None => false,
        }
    }
}

impl Default for ScriptedTransport {
    fn default() -> Self {
        Self::new()
    }
}

impl PublishTransport for ScriptedTransport {
    fn is_connected(&self) -> bool {
        self.lock().connected
    }

    fn publish(&self, request: PublishRequest<'_>) -> PublishHandle {
        let mut state = self.lock();
        state.published.push(PublishedEvent {
            event_name: request.event_name.to_string(),
            payload: request.payload.to_string(),
            visibility: request.visibility,
            ack: request.ack,
        });

        let outcome = match state.script.pop_front() {
            Some(o) => o,
            None => state.fallback.clone(),
        };
        match outcome {
            ScriptedOutcome::Succeed => PublishHandle::resolved(Ok(())),
            ScriptedOutcome::Fail(e) => PublishHandle::resolved(Err(e)),
            ScriptedOutcome::Hold => {
                let (completer, handle) = PublishHandle::channel();
                state.held.push_back(completer);
                handle
            }
        }
    }
}
