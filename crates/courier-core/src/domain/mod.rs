//! Domain model (message, ids, wire payload, delivery phase).

pub mod ids;
pub mod message;
pub mod payload;
pub mod state;

pub use ids::MessageId;
pub use message::Message;
pub use payload::{DEFAULT_PAYLOAD_LIMIT, encode_payload};
pub use state::{DeliveryPhase, RetryReason};
