use actix::prelude::*;
use common::messages::shared_messages::NetworkMessage;
use common::types::dtos::{VendorDTO, VendorId};
use futures_channel::mpsc::UnboundedReceiver;
use uuid::Uuid;

/// Vendor events delivered to subscribers of a [`ChannelClient`].
///
/// [`ChannelClient`]: crate::channel::ChannelClient
#[derive(Debug, Clone, PartialEq)]
pub enum ChannelEvent {
    VendorOnline(VendorDTO),
    PositionUpdate {
        vendor_id: VendorId,
        latitude: f64,
        longitude: f64,
    },
    VendorOffline(VendorId),
    /// The client re-joined its zone after losing the connection. The
    /// server replays `vendor:online` for every live vendor right after it.
    Resubscribed,
}

impl ChannelEvent {
    /// `None` for messages that are not vendor events.
    pub fn from_network(msg: NetworkMessage) -> Option<Self> {
        match msg {
            NetworkMessage::VendorOnline(online) => Some(ChannelEvent::VendorOnline(online.vendor)),
            NetworkMessage::PositionUpdate(update) => Some(ChannelEvent::PositionUpdate {
                vendor_id: update.vendor_id,
                latitude: update.latitude,
                longitude: update.longitude,
            }),
            NetworkMessage::VendorOffline(offline) => {
                Some(ChannelEvent::VendorOffline(offline.vendor_id))
            }
            NetworkMessage::JoinZone(_) | NetworkMessage::ConnectionClosed(_) => None,
        }
    }
}

/// Registers a new subscriber.
#[derive(Message)]
#[rtype(result = "EventSubscription")]
pub struct Subscribe;

/// Detaches a subscriber. Sent by [`SubscriptionHandle`] when dropped.
#[derive(Message, Debug)]
#[rtype(result = "()")]
pub struct Unsubscribe {
    pub id: Uuid,
}

/// Disposable handle of a subscription: the subscriber stops receiving
/// events once it is dropped or [`unsubscribe`](Self::unsubscribe)d.
pub struct SubscriptionHandle {
    id: Uuid,
    client: Recipient<Unsubscribe>,
}

impl SubscriptionHandle {
    pub(crate) fn new(id: Uuid, client: Recipient<Unsubscribe>) -> Self {
        Self { id, client }
    }

    pub fn unsubscribe(self) {
        drop(self);
    }
}

impl Drop for SubscriptionHandle {
    fn drop(&mut self) {
        self.client.do_send(Unsubscribe { id: self.id });
    }
}

/// What [`Subscribe`] returns: the handle plus the event stream it controls.
pub struct EventSubscription {
    pub handle: SubscriptionHandle,
    pub events: UnboundedReceiver<ChannelEvent>,
}
