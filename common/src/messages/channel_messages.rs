use crate::types::dtos::{VendorDTO, VendorId};
use actix::prelude::*;
use serde::{Deserialize, Serialize};

/// Message sent by a peer to subscribe to a zone topic.
///
/// ## Purpose
/// Map clients join to receive the zone's vendor events; vendor devices join
/// before publishing. Joining a zone replays `vendor:online` for every vendor
/// currently online in it.
///
/// ## Contents
/// - `zone`: Name of the zone topic.
#[derive(Serialize, Deserialize, Debug, Message, Clone, PartialEq)]
#[rtype(result = "()")]
pub struct JoinZone {
    pub zone: String,
}

/// Message announcing that a vendor started broadcasting.
///
/// ## Contents
/// - `vendor`: Identity, initial position and status of the vendor.
#[derive(Serialize, Deserialize, Debug, Message, Clone, PartialEq)]
#[rtype(result = "()")]
pub struct VendorOnline {
    pub vendor: VendorDTO,
}

/// Periodic position refresh of an online vendor.
///
/// ## Contents
/// - `vendor_id`: The vendor that moved.
/// - `latitude`, `longitude`: New position in degrees.
#[derive(Serialize, Deserialize, Debug, Message, Clone, PartialEq)]
#[rtype(result = "()")]
pub struct PositionUpdate {
    pub vendor_id: VendorId,
    pub latitude: f64,
    pub longitude: f64,
}

/// Message announcing that a vendor stopped broadcasting.
///
/// ## Contents
/// - `vendor_id`: The vendor whose marker must be removed.
#[derive(Serialize, Deserialize, Debug, Message, Clone, PartialEq)]
#[rtype(result = "()")]
pub struct VendorOffline {
    pub vendor_id: VendorId,
}
