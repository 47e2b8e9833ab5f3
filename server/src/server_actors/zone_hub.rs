use crate::messages::internal_messages::{GetZoneVendors, Inbound, PeerDisconnected, RegisterPeer};
use actix::prelude::*;
use colored::Color;
use common::constants::DEFAULT_ZONE;
use common::geo::{GeoPoint, ZonePolygon, evaluate};
use common::logger::Logger;
use common::messages::channel_messages::{JoinZone, PositionUpdate, VendorOffline, VendorOnline};
use common::messages::shared_messages::NetworkMessage;
use common::types::dtos::{VendorId, VendorPosition};
use std::collections::{HashMap, HashSet};
use std::net::SocketAddr;
use std::sync::Arc;

/// Subscribers and live vendors of one zone topic.
#[derive(Default)]
struct ZoneTopic {
    subscribers: HashSet<SocketAddr>,
    vendors: HashMap<VendorId, VendorPosition>,
}

struct PeerState {
    outbox: Recipient<NetworkMessage>,
    /// Zone joined by this peer. A connection belongs to at most one zone.
    zone: Option<String>,
    /// Vendors announced through this connection.
    published: HashSet<VendorId>,
}

/// The `ZoneHub` actor is the server side of the live position channel.
///
/// # Responsibilities
/// - Keeps the subscribers of every zone topic.
/// - Owns the authoritative registry of online vendors, one record per
///   vendor, last update wins.
/// - Fans `vendor:online`, `position:update` and `vendor:offline` out to the
///   other subscribers of the publisher's zone.
/// - Replays `vendor:online` for every live vendor to a peer joining a zone.
/// - Takes the vendors of a closed connection offline.
pub struct ZoneHub {
    service_zone: Arc<ZonePolygon>,
    service_zone_name: String,
    zones: HashMap<String, ZoneTopic>,
    peers: HashMap<SocketAddr, PeerState>,
    logger: Logger,
}

impl ZoneHub {
    pub fn new(service_zone: Arc<ZonePolygon>) -> Self {
        let service_zone_name = service_zone.name().unwrap_or(DEFAULT_ZONE).to_string();
        Self {
            service_zone,
            service_zone_name,
            zones: HashMap::new(),
            peers: HashMap::new(),
            logger: Logger::new("Zone Hub", Color::Cyan),
        }
    }

    fn peer_zone(&self, peer: SocketAddr) -> Option<String> {
        self.peers.get(&peer).and_then(|p| p.zone.clone())
    }

    /// Sends `message` to every subscriber of `zone` except `origin`.
    fn broadcast(&self, zone: &str, origin: SocketAddr, message: NetworkMessage) {
        let Some(topic) = self.zones.get(zone) else {
            return;
        };
        for subscriber in topic.subscribers.iter().filter(|s| **s != origin) {
            if let Some(peer) = self.peers.get(subscriber) {
                peer.outbox.do_send(message.clone());
            }
        }
    }

    fn warn_if_outside(&self, zone: &str, vendor_id: VendorId, latitude: f64, longitude: f64) {
        if zone != self.service_zone_name {
            return;
        }
        match evaluate(latitude, longitude, &self.service_zone) {
            Ok(result) => {
                if let Some(distance_km) = result.distance_to_zone_km {
                    self.logger.warn(format!(
                        "Vendor {} is outside {} ({:.2} km away)",
                        vendor_id, zone, distance_km
                    ));
                }
            }
            Err(e) => self.logger.warn(format!("Vendor {}: {}", vendor_id, e)),
        }
    }

    fn join_zone(&mut self, peer: SocketAddr, msg: JoinZone) {
        let Some(state) = self.peers.get_mut(&peer) else {
            self.logger.warn(format!("JoinZone from unregistered peer {}", peer));
            return;
        };
        let previous = state.zone.replace(msg.zone.clone());
        let mut published = state.published.clone();
        let outbox = state.outbox.clone();

        if let Some(previous) = previous {
            if let Some(topic) = self.zones.get_mut(&previous) {
                topic.subscribers.remove(&peer);
            }
            // Vendors announced here belong to the zone they were announced in.
            if previous != msg.zone {
                for vendor_id in published.drain() {
                    if self.take_offline(&previous, vendor_id) {
                        self.broadcast(
                            &previous,
                            peer,
                            NetworkMessage::VendorOffline(VendorOffline { vendor_id }),
                        );
                    }
                }
            }
        }

        let topic = self.zones.entry(msg.zone.clone()).or_default();
        topic.subscribers.insert(peer);

        let mut replayed = 0;
        for vendor in topic.vendors.values() {
            if published.contains(&vendor.vendor_id) {
                continue;
            }
            outbox.do_send(NetworkMessage::VendorOnline(VendorOnline {
                vendor: vendor.to_announcement(),
            }));
            replayed += 1;
        }
        self.logger.info(format!(
            "{} joined zone {} ({} vendors replayed)",
            peer, msg.zone, replayed
        ));
    }

    fn vendor_online(&mut self, peer: SocketAddr, msg: VendorOnline) {
        let Some(zone) = self.peer_zone(peer) else {
            self.logger
                .warn(format!("{} announced a vendor before joining a zone", peer));
            return;
        };
        let vendor = msg.vendor;
        if let Err(e) = GeoPoint::checked(vendor.latitude, vendor.longitude) {
            self.logger
                .warn(format!("Rejecting vendor {} from {}: {}", vendor.id, peer, e));
            return;
        }

        // A vendor reconnecting through a new connection changes owner.
        for (addr, state) in self.peers.iter_mut() {
            if *addr != peer {
                state.published.remove(&vendor.id);
            }
        }
        if let Some(state) = self.peers.get_mut(&peer) {
            state.published.insert(vendor.id);
        }

        let topic = self.zones.entry(zone.clone()).or_default();
        let broadcast = match topic.vendors.get_mut(&vendor.id) {
            Some(existing) => {
                // Already online: refresh the record and let subscribers
                // catch up on the position only.
                existing.name = vendor.name.clone();
                existing.status = vendor.status;
                existing.move_to(vendor.latitude, vendor.longitude);
                self.logger
                    .debug(format!("Duplicate vendor:online for {}", vendor.id));
                NetworkMessage::PositionUpdate(PositionUpdate {
                    vendor_id: vendor.id,
                    latitude: vendor.latitude,
                    longitude: vendor.longitude,
                })
            }
            None => {
                topic
                    .vendors
                    .insert(vendor.id, VendorPosition::from_announcement(&vendor));
                self.logger.info(format!(
                    "Vendor {} ({}) online in {}",
                    vendor.id, vendor.name, zone
                ));
                NetworkMessage::VendorOnline(VendorOnline {
                    vendor: vendor.clone(),
                })
            }
        };

        self.warn_if_outside(&zone, vendor.id, vendor.latitude, vendor.longitude);
        self.broadcast(&zone, peer, broadcast);
    }

    fn position_update(&mut self, peer: SocketAddr, msg: PositionUpdate) {
        let Some(zone) = self.peer_zone(peer) else {
            return;
        };
        if let Err(e) = GeoPoint::checked(msg.latitude, msg.longitude) {
            self.logger.warn(format!(
                "Dropping position of vendor {}: {}",
                msg.vendor_id, e
            ));
            return;
        }
        let Some(record) = self
            .zones
            .get_mut(&zone)
            .and_then(|topic| topic.vendors.get_mut(&msg.vendor_id))
        else {
            self.logger.debug(format!(
                "position:update for unknown vendor {} ignored",
                msg.vendor_id
            ));
            return;
        };

        record.move_to(msg.latitude, msg.longitude);
        self.warn_if_outside(&zone, msg.vendor_id, msg.latitude, msg.longitude);
        self.broadcast(&zone, peer, NetworkMessage::PositionUpdate(msg));
    }

    fn vendor_offline(&mut self, peer: SocketAddr, msg: VendorOffline) {
        let Some(zone) = self.peer_zone(peer) else {
            return;
        };
        if self.take_offline(&zone, msg.vendor_id) {
            self.broadcast(&zone, peer, NetworkMessage::VendorOffline(msg));
        } else {
            self.logger.debug(format!(
                "vendor:offline for unknown vendor {} ignored",
                msg.vendor_id
            ));
        }
    }

    /// Removes the vendor from the zone registry and from its owner.
    fn take_offline(&mut self, zone: &str, vendor_id: VendorId) -> bool {
        let removed = self
            .zones
            .get_mut(zone)
            .and_then(|topic| topic.vendors.remove(&vendor_id))
            .is_some();
        if removed {
            for state in self.peers.values_mut() {
                state.published.remove(&vendor_id);
            }
            self.logger
                .info(format!("Vendor {} offline in {}", vendor_id, zone));
        }
        removed
    }
}

impl Actor for ZoneHub {
    type Context = Context<Self>;

    fn started(&mut self, _ctx: &mut Self::Context) {
        self.logger.info(format!(
            "Zone hub started, service zone {} with {} vertices",
            self.service_zone_name,
            self.service_zone.vertices().len()
        ));
    }
}

impl Handler<RegisterPeer> for ZoneHub {
    type Result = ();

    fn handle(&mut self, msg: RegisterPeer, _ctx: &mut Self::Context) -> Self::Result {
        self.logger.info(format!("Registered connection from {}", msg.peer));
        self.peers.insert(
            msg.peer,
            PeerState {
                outbox: msg.outbox,
                zone: None,
                published: HashSet::new(),
            },
        );
    }
}

impl Handler<Inbound> for ZoneHub {
    type Result = ();

    fn handle(&mut self, msg: Inbound, _ctx: &mut Self::Context) -> Self::Result {
        match msg.message {
            NetworkMessage::JoinZone(join) => self.join_zone(msg.peer, join),
            NetworkMessage::VendorOnline(online) => self.vendor_online(msg.peer, online),
            NetworkMessage::PositionUpdate(update) => self.position_update(msg.peer, update),
            NetworkMessage::VendorOffline(offline) => self.vendor_offline(msg.peer, offline),
            NetworkMessage::ConnectionClosed(_) => {
                self.logger
                    .warn(format!("Unexpected ConnectionClosed routed from {}", msg.peer));
            }
        }
    }
}

impl Handler<PeerDisconnected> for ZoneHub {
    type Result = ();

    fn handle(&mut self, msg: PeerDisconnected, _ctx: &mut Self::Context) -> Self::Result {
        let Some(state) = self.peers.remove(&msg.peer) else {
            return;
        };
        self.logger.info(format!("Connection from {} closed", msg.peer));

        let Some(zone) = state.zone else {
            return;
        };
        if let Some(topic) = self.zones.get_mut(&zone) {
            topic.subscribers.remove(&msg.peer);
        }
        for vendor_id in state.published {
            if self.take_offline(&zone, vendor_id) {
                self.broadcast(
                    &zone,
                    msg.peer,
                    NetworkMessage::VendorOffline(VendorOffline { vendor_id }),
                );
            }
        }
    }
}

impl Handler<GetZoneVendors> for ZoneHub {
    type Result = MessageResult<GetZoneVendors>;

    fn handle(&mut self, msg: GetZoneVendors, _ctx: &mut Self::Context) -> Self::Result {
        let mut vendors: Vec<VendorPosition> = self
            .zones
            .get(&msg.zone)
            .map(|topic| topic.vendors.values().cloned().collect())
            .unwrap_or_default();
        vendors.sort_by_key(|v| v.vendor_id);
        MessageResult(vendors)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use common::types::dtos::VendorDTO;
    use common::types::vendor_status::VendorStatus;

    /// Stands in for a connection's `TCPSender`.
    #[derive(Default)]
    struct Outbox {
        received: Vec<NetworkMessage>,
    }

    impl Actor for Outbox {
        type Context = Context<Self>;
    }

    impl Handler<NetworkMessage> for Outbox {
        type Result = ();

        fn handle(&mut self, msg: NetworkMessage, _ctx: &mut Self::Context) {
            self.received.push(msg);
        }
    }

    struct Drain;

    impl Message for Drain {
        type Result = Vec<NetworkMessage>;
    }

    impl Handler<Drain> for Outbox {
        type Result = MessageResult<Drain>;

        fn handle(&mut self, _msg: Drain, _ctx: &mut Self::Context) -> Self::Result {
            MessageResult(std::mem::take(&mut self.received))
        }
    }

    fn peer(port: u16) -> SocketAddr {
        SocketAddr::from(([127, 0, 0, 1], port))
    }

    fn vendor(id: VendorId, latitude: f64, longitude: f64) -> VendorDTO {
        VendorDTO {
            id,
            name: format!("vendor-{}", id),
            latitude,
            longitude,
            status: VendorStatus::Active,
        }
    }

    async fn connect(hub: &Addr<ZoneHub>, port: u16, zone: &str) -> Addr<Outbox> {
        let outbox = Outbox::default().start();
        hub.send(RegisterPeer {
            peer: peer(port),
            outbox: outbox.clone().recipient(),
        })
        .await
        .unwrap();
        send(hub, port, NetworkMessage::JoinZone(JoinZone { zone: zone.into() })).await;
        outbox
    }

    async fn send(hub: &Addr<ZoneHub>, port: u16, message: NetworkMessage) {
        hub.send(Inbound {
            peer: peer(port),
            message,
        })
        .await
        .unwrap();
    }

    fn online(id: VendorId, latitude: f64, longitude: f64) -> NetworkMessage {
        NetworkMessage::VendorOnline(VendorOnline {
            vendor: vendor(id, latitude, longitude),
        })
    }

    fn update(vendor_id: VendorId, latitude: f64, longitude: f64) -> NetworkMessage {
        NetworkMessage::PositionUpdate(PositionUpdate {
            vendor_id,
            latitude,
            longitude,
        })
    }

    fn hub() -> Addr<ZoneHub> {
        ZoneHub::new(Arc::new(ZonePolygon::nozha().unwrap())).start()
    }

    #[actix_rt::test]
    async fn events_reach_other_subscribers_of_the_zone_only() {
        let hub = hub();
        let map = connect(&hub, 5000, "nozha2").await;
        let elsewhere = connect(&hub, 5001, "maadi").await;
        let device = connect(&hub, 5002, "nozha2").await;

        send(&hub, 5002, online(7, 30.14, 31.38)).await;
        send(&hub, 5002, update(7, 30.141, 31.381)).await;

        assert_eq!(
            map.send(Drain).await.unwrap(),
            vec![online(7, 30.14, 31.38), update(7, 30.141, 31.381)]
        );
        assert!(elsewhere.send(Drain).await.unwrap().is_empty());
        assert!(device.send(Drain).await.unwrap().is_empty());
    }

    #[actix_rt::test]
    async fn registry_keeps_the_last_position() {
        let hub = hub();
        let _device = connect(&hub, 5010, "nozha2").await;

        send(&hub, 5010, online(7, 30.14, 31.38)).await;
        send(&hub, 5010, update(7, 30.142, 31.383)).await;
        send(&hub, 5010, update(7, 30.143, 31.384)).await;

        let vendors = hub
            .send(GetZoneVendors {
                zone: "nozha2".into(),
            })
            .await
            .unwrap();
        assert_eq!(vendors.len(), 1);
        assert_eq!((vendors[0].latitude, vendors[0].longitude), (30.143, 31.384));
    }

    #[actix_rt::test]
    async fn late_joiner_gets_a_fresh_wave_of_online_events() {
        let hub = hub();
        let _device = connect(&hub, 5020, "nozha2").await;
        send(&hub, 5020, online(1, 30.13, 31.37)).await;
        send(&hub, 5020, online(2, 30.14, 31.38)).await;
        send(&hub, 5020, update(2, 30.145, 31.385)).await;

        let map = connect(&hub, 5021, "nozha2").await;
        let mut replayed = map.send(Drain).await.unwrap();
        replayed.sort_by_key(|m| match m {
            NetworkMessage::VendorOnline(o) => o.vendor.id,
            _ => u64::MAX,
        });
        assert_eq!(
            replayed,
            vec![online(1, 30.13, 31.37), online(2, 30.145, 31.385)]
        );
    }

    #[actix_rt::test]
    async fn unknown_vendors_are_no_ops() {
        let hub = hub();
        let map = connect(&hub, 5030, "nozha2").await;
        let _device = connect(&hub, 5031, "nozha2").await;

        send(&hub, 5031, update(99, 30.14, 31.38)).await;
        send(
            &hub,
            5031,
            NetworkMessage::VendorOffline(VendorOffline { vendor_id: 99 }),
        )
        .await;

        assert!(map.send(Drain).await.unwrap().is_empty());
    }

    #[actix_rt::test]
    async fn duplicate_online_is_forwarded_as_a_move() {
        let hub = hub();
        let map = connect(&hub, 5040, "nozha2").await;
        let _device = connect(&hub, 5041, "nozha2").await;

        send(&hub, 5041, online(7, 30.14, 31.38)).await;
        send(&hub, 5041, online(7, 30.15, 31.39)).await;

        assert_eq!(
            map.send(Drain).await.unwrap(),
            vec![online(7, 30.14, 31.38), update(7, 30.15, 31.39)]
        );
        let vendors = hub
            .send(GetZoneVendors {
                zone: "nozha2".into(),
            })
            .await
            .unwrap();
        assert_eq!(vendors.len(), 1);
    }

    #[actix_rt::test]
    async fn closed_connection_takes_its_vendors_offline() {
        let hub = hub();
        let map = connect(&hub, 5050, "nozha2").await;
        let _device = connect(&hub, 5051, "nozha2").await;
        send(&hub, 5051, online(7, 30.14, 31.38)).await;
        map.send(Drain).await.unwrap();

        hub.send(PeerDisconnected { peer: peer(5051) }).await.unwrap();

        assert_eq!(
            map.send(Drain).await.unwrap(),
            vec![NetworkMessage::VendorOffline(VendorOffline { vendor_id: 7 })]
        );
        assert!(
            hub.send(GetZoneVendors {
                zone: "nozha2".into()
            })
            .await
            .unwrap()
            .is_empty()
        );
    }

    #[actix_rt::test]
    async fn publishing_before_joining_is_ignored() {
        let hub = hub();
        let map = connect(&hub, 5060, "nozha2").await;
        let outbox = Outbox::default().start();
        hub.send(RegisterPeer {
            peer: peer(5061),
            outbox: outbox.recipient(),
        })
        .await
        .unwrap();

        send(&hub, 5061, online(7, 30.14, 31.38)).await;
        assert!(map.send(Drain).await.unwrap().is_empty());
    }

    #[actix_rt::test]
    async fn invalid_coordinates_are_dropped() {
        let hub = hub();
        let map = connect(&hub, 5070, "nozha2").await;
        let _device = connect(&hub, 5071, "nozha2").await;

        send(&hub, 5071, online(7, 120.0, 31.38)).await;
        send(&hub, 5071, online(8, 30.14, 31.38)).await;
        send(&hub, 5071, update(8, f64::NAN, 31.38)).await;

        assert_eq!(map.send(Drain).await.unwrap(), vec![online(8, 30.14, 31.38)]);
    }

    #[actix_rt::test]
    async fn switching_zones_takes_published_vendors_offline_in_the_old_one() {
        let hub = hub();
        let map = connect(&hub, 5080, "nozha2").await;
        let _device = connect(&hub, 5081, "nozha2").await;
        send(&hub, 5081, online(7, 30.14, 31.38)).await;
        map.send(Drain).await.unwrap();

        send(&hub, 5081, NetworkMessage::JoinZone(JoinZone { zone: "maadi".into() })).await;

        assert_eq!(
            map.send(Drain).await.unwrap(),
            vec![NetworkMessage::VendorOffline(VendorOffline { vendor_id: 7 })]
        );
        assert!(
            hub.send(GetZoneVendors {
                zone: "nozha2".into()
            })
            .await
            .unwrap()
            .is_empty()
        );

        // Closing the connection later has nothing left to clean up.
        hub.send(PeerDisconnected { peer: peer(5081) }).await.unwrap();
        assert!(map.send(Drain).await.unwrap().is_empty());
        let late = connect(&hub, 5082, "nozha2").await;
        assert!(late.send(Drain).await.unwrap().is_empty());
    }

    #[actix_rt::test]
    async fn rejoining_the_same_zone_keeps_published_vendors() {
        let hub = hub();
        let map = connect(&hub, 5090, "nozha2").await;
        let _device = connect(&hub, 5091, "nozha2").await;
        send(&hub, 5091, online(7, 30.14, 31.38)).await;
        map.send(Drain).await.unwrap();

        send(&hub, 5091, NetworkMessage::JoinZone(JoinZone { zone: "nozha2".into() })).await;

        assert!(map.send(Drain).await.unwrap().is_empty());
        assert_eq!(
            hub.send(GetZoneVendors {
                zone: "nozha2".into()
            })
            .await
            .unwrap()
            .len(),
            1
        );
    }
}
