use crate::channel::events::ChannelEvent;
use crate::view::marker::Marker;
use common::config::MapViewConfig;
use common::geo::zone::BoundingBox;
use common::geo::{GeoPoint, ZonePolygon, haversine_km, is_inside};
use common::types::dtos::VendorId;
use std::collections::HashMap;
use std::fmt::Write;
use std::sync::Arc;

/// What applying a channel event did to the marker registry.
#[derive(Debug, Clone, PartialEq)]
pub enum MarkerChange {
    Created(VendorId),
    Moved { vendor_id: VendorId, distance_m: f64 },
    Removed(VendorId),
    /// Every marker was dropped ahead of a replay; holds how many there were.
    Reset(usize),
    Ignored(VendorId, IgnoredReason),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IgnoredReason {
    /// `vendor:online` for a vendor that already has a marker.
    AlreadyOnline,
    /// `position:update` or `vendor:offline` for a vendor without a marker.
    UnknownVendor,
    InvalidCoordinates,
}

/// Visible window of the map, kept within the zone's bounds.
#[derive(Debug, Clone, PartialEq)]
pub struct Viewport {
    center: GeoPoint,
    zoom: u8,
    min_zoom: u8,
    max_zoom: u8,
    bounds: BoundingBox,
}

impl Viewport {
    pub fn new(config: &MapViewConfig, bounds: BoundingBox) -> Self {
        let mut viewport = Self {
            center: config.center,
            zoom: config.zoom,
            min_zoom: config.min_zoom,
            max_zoom: config.max_zoom,
            bounds,
        };
        viewport.set_zoom(config.zoom);
        viewport.pan_to(config.center);
        viewport
    }

    pub fn center(&self) -> GeoPoint {
        self.center
    }

    pub fn zoom(&self) -> u8 {
        self.zoom
    }

    pub fn set_zoom(&mut self, zoom: u8) {
        self.zoom = zoom.clamp(self.min_zoom, self.max_zoom);
    }

    /// Centers the map on `target`, clamped to the zone's bounding box.
    pub fn pan_to(&mut self, target: GeoPoint) {
        self.center = GeoPoint::new(
            target
                .latitude
                .clamp(self.bounds.min_latitude, self.bounds.max_latitude),
            target
                .longitude
                .clamp(self.bounds.min_longitude, self.bounds.max_longitude),
        );
    }
}

/// State of the live map: the zone overlay, the viewport and one marker per
/// online vendor.
///
/// Markers follow `absent → present` on `vendor:online`, move in place on
/// `position:update` and return to `absent` on `vendor:offline`. Every other
/// event is ignored, so duplicated, reordered or missed events never produce
/// a second marker for the same vendor. After a resubscription the registry
/// starts over and is rebuilt by the replayed `vendor:online` wave.
pub struct MapView {
    zone: Arc<ZonePolygon>,
    viewport: Viewport,
    markers: HashMap<VendorId, Marker>,
}

impl MapView {
    pub fn new(zone: Arc<ZonePolygon>, config: &MapViewConfig) -> Self {
        let viewport = Viewport::new(config, zone.bounding_box());
        Self {
            zone,
            viewport,
            markers: HashMap::new(),
        }
    }

    pub fn apply(&mut self, event: ChannelEvent) -> MarkerChange {
        match event {
            ChannelEvent::VendorOnline(vendor) => {
                if self.markers.contains_key(&vendor.id) {
                    return MarkerChange::Ignored(vendor.id, IgnoredReason::AlreadyOnline);
                }
                let Ok(inside) = is_inside(vendor.latitude, vendor.longitude, &self.zone) else {
                    return MarkerChange::Ignored(vendor.id, IgnoredReason::InvalidCoordinates);
                };
                self.markers.insert(vendor.id, Marker::new(&vendor, inside));
                MarkerChange::Created(vendor.id)
            }
            ChannelEvent::PositionUpdate {
                vendor_id,
                latitude,
                longitude,
            } => {
                let Some(marker) = self.markers.get_mut(&vendor_id) else {
                    return MarkerChange::Ignored(vendor_id, IgnoredReason::UnknownVendor);
                };
                let Ok(inside) = is_inside(latitude, longitude, &self.zone) else {
                    return MarkerChange::Ignored(vendor_id, IgnoredReason::InvalidCoordinates);
                };
                let from = marker.position;
                marker.set_position(GeoPoint::new(latitude, longitude), inside);
                MarkerChange::Moved {
                    vendor_id,
                    distance_m: haversine_km(from.latitude, from.longitude, latitude, longitude)
                        * 1000.0,
                }
            }
            ChannelEvent::VendorOffline(vendor_id) => match self.markers.remove(&vendor_id) {
                Some(_) => MarkerChange::Removed(vendor_id),
                None => MarkerChange::Ignored(vendor_id, IgnoredReason::UnknownVendor),
            },
            ChannelEvent::Resubscribed => {
                let cleared = self.markers.len();
                self.markers.clear();
                MarkerChange::Reset(cleared)
            }
        }
    }

    pub fn marker(&self, vendor_id: VendorId) -> Option<&Marker> {
        self.markers.get(&vendor_id)
    }

    /// Markers ordered by vendor id.
    pub fn markers(&self) -> Vec<&Marker> {
        let mut markers: Vec<&Marker> = self.markers.values().collect();
        markers.sort_by_key(|m| m.vendor_id);
        markers
    }

    pub fn len(&self) -> usize {
        self.markers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.markers.is_empty()
    }

    /// Closed ring drawn as the zone boundary overlay.
    pub fn zone_overlay(&self) -> &[[f64; 2]] {
        self.zone.ring()
    }

    pub fn viewport(&self) -> &Viewport {
        &self.viewport
    }

    pub fn viewport_mut(&mut self) -> &mut Viewport {
        &mut self.viewport
    }

    /// Text snapshot of the map, one line per marker.
    pub fn render(&self) -> String {
        let center = self.viewport.center();
        let mut out = format!(
            "zone {} ({} vertices) | center ({:.6}, {:.6}) zoom {} | {} vendors online",
            self.zone.name().unwrap_or("-"),
            self.zone.vertices().len(),
            center.latitude,
            center.longitude,
            self.viewport.zoom(),
            self.markers.len()
        );
        for marker in self.markers() {
            let _ = write!(
                out,
                "\n  #{:<5} {:<24} {:<22} ({:.6}, {:.6}){}",
                marker.vendor_id,
                marker.icon.label,
                marker.icon.class_name(),
                marker.position.latitude,
                marker.position.longitude,
                if marker.inside_zone { "" } else { "  [outside zone]" }
            );
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use common::types::dtos::VendorDTO;
    use common::types::vendor_status::VendorStatus;
    use ntest::assert_about_eq;

    fn view() -> MapView {
        MapView::new(
            Arc::new(ZonePolygon::nozha().unwrap()),
            &MapViewConfig::default(),
        )
    }

    fn online(id: VendorId, latitude: f64, longitude: f64) -> ChannelEvent {
        ChannelEvent::VendorOnline(VendorDTO {
            id,
            name: format!("vendor-{}", id),
            latitude,
            longitude,
            status: VendorStatus::Active,
        })
    }

    fn update(vendor_id: VendorId, latitude: f64, longitude: f64) -> ChannelEvent {
        ChannelEvent::PositionUpdate {
            vendor_id,
            latitude,
            longitude,
        }
    }

    #[test]
    fn online_then_update_moves_the_single_marker() {
        let mut view = view();
        assert_eq!(view.apply(online(7, 30.14, 31.38)), MarkerChange::Created(7));
        assert!(matches!(
            view.apply(update(7, 30.141, 31.381)),
            MarkerChange::Moved { vendor_id: 7, .. }
        ));

        assert_eq!(view.len(), 1);
        let marker = view.marker(7).unwrap();
        assert_eq!(marker.position, GeoPoint::new(30.141, 31.381));
        assert_eq!(marker.moves, 1);
    }

    #[test]
    fn offline_for_an_unseen_vendor_is_a_no_op() {
        let mut view = view();
        assert_eq!(
            view.apply(ChannelEvent::VendorOffline(42)),
            MarkerChange::Ignored(42, IgnoredReason::UnknownVendor)
        );
        assert!(view.is_empty());
    }

    #[test]
    fn duplicate_online_keeps_one_marker_in_place() {
        let mut view = view();
        view.apply(online(7, 30.14, 31.38));
        assert_eq!(
            view.apply(online(7, 30.15, 31.39)),
            MarkerChange::Ignored(7, IgnoredReason::AlreadyOnline)
        );
        assert_eq!(view.len(), 1);
        assert_eq!(view.marker(7).unwrap().position, GeoPoint::new(30.14, 31.38));
    }

    #[test]
    fn update_before_online_is_ignored() {
        let mut view = view();
        assert_eq!(
            view.apply(update(7, 30.14, 31.38)),
            MarkerChange::Ignored(7, IgnoredReason::UnknownVendor)
        );
        assert!(view.marker(7).is_none());
    }

    #[test]
    fn offline_removes_and_a_later_online_recreates() {
        let mut view = view();
        view.apply(online(7, 30.14, 31.38));
        view.apply(update(7, 30.141, 31.381));
        assert_eq!(view.apply(ChannelEvent::VendorOffline(7)), MarkerChange::Removed(7));
        assert!(view.is_empty());

        assert_eq!(view.apply(online(7, 30.13, 31.37)), MarkerChange::Created(7));
        assert_eq!(view.marker(7).unwrap().moves, 0);
    }

    #[test]
    fn resubscription_rebuilds_the_registry_from_the_replay() {
        let mut view = view();
        view.apply(online(7, 30.14, 31.38));
        view.apply(online(8, 30.14, 31.38));

        assert_eq!(view.apply(ChannelEvent::Resubscribed), MarkerChange::Reset(2));
        assert!(view.is_empty());

        // Only 8 is still online, and it moved while the map was away.
        assert_eq!(view.apply(online(8, 30.15, 31.39)), MarkerChange::Created(8));
        assert_eq!(view.len(), 1);
        assert!(view.marker(7).is_none());
        assert_eq!(view.marker(8).unwrap().position, GeoPoint::new(30.15, 31.39));
    }

    #[test]
    fn markers_track_zone_membership() {
        let mut view = view();
        view.apply(online(1, 30.139785, 31.381158));
        view.apply(online(2, 30.0444, 31.2357));
        assert!(view.marker(1).unwrap().inside_zone);
        assert!(!view.marker(2).unwrap().inside_zone);

        view.apply(update(1, 30.0444, 31.2357));
        assert!(!view.marker(1).unwrap().inside_zone);
    }

    #[test]
    fn invalid_coordinates_never_create_or_move_markers() {
        let mut view = view();
        assert_eq!(
            view.apply(online(1, f64::NAN, 31.38)),
            MarkerChange::Ignored(1, IgnoredReason::InvalidCoordinates)
        );
        view.apply(online(2, 30.14, 31.38));
        assert_eq!(
            view.apply(update(2, 30.14, 181.0)),
            MarkerChange::Ignored(2, IgnoredReason::InvalidCoordinates)
        );
        assert_eq!(view.len(), 1);
        assert_eq!(view.marker(2).unwrap().position, GeoPoint::new(30.14, 31.38));
    }

    #[test]
    fn moved_distance_is_reported_in_metres() {
        let mut view = view();
        view.apply(online(7, 30.14, 31.38));
        let MarkerChange::Moved { distance_m, .. } = view.apply(update(7, 30.141, 31.38)) else {
            panic!("expected a move");
        };
        // 0.001 degrees of latitude.
        assert_about_eq!(distance_m, 111.195, 0.01);
    }

    #[test]
    fn viewport_is_clamped_to_zoom_range_and_zone() {
        let mut view = view();
        assert_eq!(view.viewport().zoom(), 14);

        view.viewport_mut().set_zoom(3);
        assert_eq!(view.viewport().zoom(), 12);
        view.viewport_mut().set_zoom(22);
        assert_eq!(view.viewport().zoom(), 18);

        view.viewport_mut().pan_to(GeoPoint::new(31.0, 29.0));
        let bbox = ZonePolygon::nozha().unwrap().bounding_box();
        assert_eq!(
            view.viewport().center(),
            GeoPoint::new(bbox.max_latitude, bbox.min_longitude)
        );
    }

    #[test]
    fn render_lists_markers_by_id() {
        let mut view = view();
        view.apply(online(9, 30.14, 31.38));
        view.apply(online(3, 30.0444, 31.2357));
        let text = view.render();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 3);
        assert!(lines[0].contains("2 vendors online"));
        assert!(lines[1].contains("#3"));
        assert!(lines[1].contains("[outside zone]"));
        assert!(lines[2].contains("#9"));
        assert!(lines[2].contains("custom-marker active"));
        assert_eq!(view.zone_overlay().first(), view.zone_overlay().last());
    }
}
