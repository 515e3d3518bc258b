//! App - アプリケーション層
//!
//! ports と queue を組み合わせて配送ロジックを実装します。
//!
//! # 主要コンポーネント
//! - **WebhookBuilder**: 構築と起動時検証
//! - **DeliveryStateMachine**: tick 駆動の状態機械
//! - **WebhookConfig**: 遅延・イベント名などの設定
//! - **DeliveryStatus**: 観測用スナップショット

pub mod builder;
pub mod config;
pub mod machine;
pub mod status;

pub use self::builder::WebhookBuilder;
pub use self::config::WebhookConfig;
pub use self::machine::DeliveryStateMachine;
pub use self::status::{DeliveryCounters, DeliveryStatus};
