//! Impls - ports の実装（テスト・デモ用）
//!
//! # 含まれる実装
//! - **ScriptedTransport**: 結果を台本どおりに返す PublishTransport
//!
//! 本物のクラウド接続はデバイス側（ホストアプリ）が提供します。

pub mod scripted;

pub use self::scripted::{PublishedEvent, ScriptedOutcome, ScriptedTransport};
