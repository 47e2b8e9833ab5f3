use actix::prelude::*;
use common::messages::shared_messages::NetworkMessage;
use common::types::dtos::VendorPosition;
use std::net::SocketAddr;

/// Message sent by a session to register its connection with the hub.
///
/// ## Contents
/// - `peer`: Remote address of the connection, used as its identity.
/// - `outbox`: Where the hub delivers events for this peer.
#[derive(Message)]
#[rtype(result = "()")]
pub struct RegisterPeer {
    pub peer: SocketAddr,
    pub outbox: Recipient<NetworkMessage>,
}

/// A channel message received from a peer.
#[derive(Message, Debug)]
#[rtype(result = "()")]
pub struct Inbound {
    pub peer: SocketAddr,
    pub message: NetworkMessage,
}

/// Message sent by a session when its connection is gone.
#[derive(Message, Debug)]
#[rtype(result = "()")]
pub struct PeerDisconnected {
    pub peer: SocketAddr,
}

/// Query for the vendors currently online in a zone.
#[derive(Message, Debug)]
#[rtype(result = "Vec<VendorPosition>")]
pub struct GetZoneVendors {
    pub zone: String,
}
