//! Queue module: the lock-guarded FIFO and its producer handle.

mod memory;
mod sender;

pub use memory::MessageQueue;
pub use sender::MessageSender;
