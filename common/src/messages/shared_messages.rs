use crate::messages::channel_messages::*;
use actix::prelude::*;
use serde::{Deserialize, Serialize};
use std::net::SocketAddr;

/// Enum representing every message exchanged over the live position channel.
///
/// # Wire format
/// One JSON object per line, internally tagged by `"type"`:
/// `{"type":"position:update","vendor_id":7,"latitude":30.1,"longitude":31.3}`.
#[derive(Serialize, Deserialize, Debug, Message, Clone, PartialEq)]
#[serde(tag = "type")]
#[rtype(result = "()")]
pub enum NetworkMessage {
    /// Subscribe to a zone topic.
    #[serde(rename = "join:zone")]
    JoinZone(JoinZone),
    /// A vendor begins broadcasting.
    #[serde(rename = "vendor:online")]
    VendorOnline(VendorOnline),
    /// A vendor moved.
    #[serde(rename = "position:update")]
    PositionUpdate(PositionUpdate),
    /// A vendor stops broadcasting.
    #[serde(rename = "vendor:offline")]
    VendorOffline(VendorOffline),

    /// Notifies the local actor that the TCP connection has been closed.
    /// Never written to the wire.
    #[serde(skip)]
    ConnectionClosed(ConnectionClosed),
}

/// Message sent to notify that a TCP connection has been closed.
///
/// ## Contents
/// - `remote_addr`: The address of the remote peer whose connection was closed.
#[derive(Debug, Message, Clone, PartialEq)]
#[rtype(result = "()")]
pub struct ConnectionClosed {
    pub remote_addr: SocketAddr,
}

/// Stops a transport actor.
#[derive(Message)]
#[rtype(result = "()")]
pub struct Shutdown;
