pub mod channel_client;
pub mod events;

pub use channel_client::{ChannelClient, ChannelState, ChannelStatus, Connect, Disconnect, GetChannelStatus};
pub use events::{ChannelEvent, EventSubscription, Subscribe, SubscriptionHandle, Unsubscribe};
