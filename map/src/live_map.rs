use crate::channel::events::{ChannelEvent, EventSubscription, SubscriptionHandle};
use crate::view::{MapView, Marker, MarkerChange};
use actix::prelude::*;
use colored::Color;
use common::config::MapViewConfig;
use common::geo::ZonePolygon;
use common::logger::Logger;
use common::types::dtos::VendorId;
use futures_channel::mpsc::UnboundedReceiver;
use std::sync::Arc;
use std::time::Duration;

/// Returns every marker currently on the map, ordered by vendor id.
#[derive(Message)]
#[rtype(result = "Vec<Marker>")]
pub struct GetMarkers;

#[derive(Message)]
#[rtype(result = "Option<Marker>")]
pub struct GetMarker {
    pub vendor_id: VendorId,
}

/// Returns the same text snapshot the map logs periodically.
#[derive(Message)]
#[rtype(result = "String")]
pub struct RenderMap;

/// Live vendor map fed by a [`ChannelClient`] subscription.
///
/// [`ChannelClient`]: crate::channel::ChannelClient
pub struct LiveMap {
    view: MapView,
    events: Option<UnboundedReceiver<ChannelEvent>>,
    // Held so the subscription lives as long as the map.
    subscription: Option<SubscriptionHandle>,
    render_interval: Duration,
    logger: Logger,
}

impl LiveMap {
    pub fn new(
        zone: Arc<ZonePolygon>,
        config: &MapViewConfig,
        subscription: EventSubscription,
    ) -> Self {
        Self {
            view: MapView::new(zone, config),
            events: Some(subscription.events),
            subscription: Some(subscription.handle),
            render_interval: config.render_interval,
            logger: Logger::new("LiveMap", Color::Cyan),
        }
    }
}

impl Actor for LiveMap {
    type Context = Context<Self>;

    fn started(&mut self, ctx: &mut Self::Context) {
        let center = self.view.viewport().center();
        self.logger.info(format!(
            "Map centered at ({:.6}, {:.6}) zoom {}, zone overlay with {} points",
            center.latitude,
            center.longitude,
            self.view.viewport().zoom(),
            self.view.zone_overlay().len()
        ));
        if let Some(events) = self.events.take() {
            ctx.add_stream(events);
        }
        ctx.run_interval(self.render_interval, |act, _ctx| {
            act.logger.info(act.view.render());
        });
    }

    fn stopped(&mut self, _ctx: &mut Self::Context) {
        if let Some(subscription) = self.subscription.take() {
            subscription.unsubscribe();
        }
    }
}

impl StreamHandler<ChannelEvent> for LiveMap {
    fn handle(&mut self, event: ChannelEvent, _ctx: &mut Self::Context) {
        match self.view.apply(event) {
            MarkerChange::Created(vendor_id) => {
                if let Some(marker) = self.view.marker(vendor_id) {
                    self.logger.info(format!(
                        "Vendor {} ({}) online at ({:.6}, {:.6})",
                        vendor_id,
                        marker.icon.label,
                        marker.position.latitude,
                        marker.position.longitude
                    ));
                }
            }
            MarkerChange::Moved {
                vendor_id,
                distance_m,
            } => self
                .logger
                .debug(format!("Vendor {} moved {:.1} m", vendor_id, distance_m)),
            MarkerChange::Removed(vendor_id) => {
                self.logger.info(format!("Vendor {} offline", vendor_id))
            }
            MarkerChange::Reset(cleared) => self.logger.info(format!(
                "Resubscribed, dropped {} markers until the zone replays",
                cleared
            )),
            MarkerChange::Ignored(vendor_id, reason) => self
                .logger
                .debug(format!("Ignored event for vendor {}: {:?}", vendor_id, reason)),
        }
    }

    // The channel client outlives its subscribers; keep answering queries
    // with the last known state.
    fn finished(&mut self, _ctx: &mut Self::Context) {
        self.logger.warn("Event stream closed");
    }
}

impl Handler<GetMarkers> for LiveMap {
    type Result = MessageResult<GetMarkers>;

    fn handle(&mut self, _msg: GetMarkers, _ctx: &mut Self::Context) -> Self::Result {
        MessageResult(self.view.markers().into_iter().cloned().collect())
    }
}

impl Handler<GetMarker> for LiveMap {
    type Result = MessageResult<GetMarker>;

    fn handle(&mut self, msg: GetMarker, _ctx: &mut Self::Context) -> Self::Result {
        MessageResult(self.view.marker(msg.vendor_id).cloned())
    }
}

impl Handler<RenderMap> for LiveMap {
    type Result = MessageResult<RenderMap>;

    fn handle(&mut self, _msg: RenderMap, _ctx: &mut Self::Context) -> Self::Result {
        MessageResult(self.view.render())
    }
}
