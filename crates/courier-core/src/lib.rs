//! courier-core
//!
//! Queued, rate-limited delivery of SMS requests to a cloud webhook.
//!
//! # モジュール構成
//! - **domain**: ドメインモデル（message, ids, payload, state）
//! - **ports**: 抽象化レイヤー（Clock, PublishTransport, RecipientResolver）
//! - **queue**: ロック付き FIFO（MessageQueue, MessageSender）
//! - **app**: 状態機械とその構築（DeliveryStateMachine, WebhookBuilder, config, status）
//! - **impls**: ports の実装（ScriptedTransport などテスト・デモ用）
//! - **error**: 構築時のエラー型

pub mod app;
pub mod domain;
pub mod error;
pub mod impls;
pub mod ports;
pub mod queue;

pub use app::{DeliveryStateMachine, DeliveryStatus, WebhookBuilder, WebhookConfig};
pub use domain::{DeliveryPhase, Message, MessageId};
pub use error::ConfigError;
pub use queue::MessageSender;
