//! Clock port - 単調増加のミリ秒カウンタ
//!
//! デバイスの `millis()` と同じく `u32` で、約 49.7 日で一周します。
//! 経過時間は必ず `now.wrapping_sub(since)` で計算すること。

use std::sync::Arc;
use std::sync::atomic::{AtomicU32, Ordering};
use std::time::Instant;

/// Clock は現在のミリ秒カウンタを提供
///
/// # Thread Safety
/// - `Send + Sync` を要求（producer 側でも enqueue 時刻の記録に使う）
pub trait Clock: Send + Sync {
    fn now_ms(&self) -> u32;

    /// Milliseconds from `since` to now, correct across a counter wrap.
    fn elapsed_since(&self, since: u32) -> u32 {
        self.now_ms().wrapping_sub(since)
    }
}

/// 本番用: プロセス起動からの経過時間
#[derive(Debug, Clone)]
pub struct SystemClock {
    origin: Instant,
}

impl SystemClock {
    pub fn new() -> Self {
        Self {
            origin: Instant::now(),
        }
    }
}

impl Default for SystemClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for SystemClock {
    fn now_ms(&self) -> u32 {
        // Truncation is the wrap.
        self.origin.elapsed().as_millis() as u32
    }
}

/// テスト用: 手で進める時計
///
/// clone は同じカウンタを共有するので、状態機械に渡した後も外から進められる。
#[derive(Debug, Clone, Default)]
pub struct ManualClock {
    now: Arc<AtomicU32>,
}

impl ManualClock {
    pub fn new(start_ms: u32) -> Self {
        Self {
            now: Arc::new(AtomicU32::new(start_ms)),
        }
    }

    pub fn set(&self, ms: u32) {
        self.now.store(ms, Ordering::SeqCst);
    }

    /// Advance by `ms`, wrapping like the device counter.
    pub fn advance(&self, ms: u32) {
        // fetch_add wraps on overflow.
        self.now.fetch_add(ms, Ordering::SeqCst);
    }
}

impl Clock for ManualClock {
    fn now_ms(&self) -> u32 {
        self.now.load(Ordering::SeqCst)
    }
}
