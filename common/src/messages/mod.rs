pub mod channel_messages;
pub mod shared_messages;

pub use channel_messages::*;
pub use shared_messages::*;
