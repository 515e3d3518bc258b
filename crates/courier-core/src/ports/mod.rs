//! Ports - 抽象化レイヤー
//!
//! 状態機械が外部に依存する部分をここで trait として定義します。
//! 実機では Particle クラウドやデバイス設定が実装を提供し、
//! テストでは ManualClock / ScriptedTransport に差し替えます。

pub mod clock;
pub mod resolver;
pub mod transport;

pub use self::clock::{Clock, ManualClock, SystemClock};
pub use self::resolver::{RecipientResolver, StaticRecipient};
pub use self::transport::{
    AckMode, PublishCompleter, PublishError, PublishHandle, PublishRequest, PublishStatus,
    PublishTransport, Visibility,
};
