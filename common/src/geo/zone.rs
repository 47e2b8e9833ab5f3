use crate::errors::NozhaError;
use crate::geo::{GeoPoint, validate_coordinates};
use serde::Deserialize;
use std::path::Path;

const NOZHA_ZONE_GEOJSON: &str = include_str!("../../data/zone-polygon.json");

/// The service area boundary: a closed ring of `[longitude, latitude]`
/// positions, in GeoJSON order.
///
/// A `ZonePolygon` is validated on construction and never mutated afterwards,
/// so it can be shared between actors behind an `Arc`.
#[derive(Debug, Clone, PartialEq)]
pub struct ZonePolygon {
    name: Option<String>,
    ring: Vec<[f64; 2]>,
}

/// Axis-aligned bounds of a zone, in degrees.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoundingBox {
    pub min_latitude: f64,
    pub min_longitude: f64,
    pub max_latitude: f64,
    pub max_longitude: f64,
}

impl BoundingBox {
    pub fn contains(&self, latitude: f64, longitude: f64) -> bool {
        (self.min_latitude..=self.max_latitude).contains(&latitude)
            && (self.min_longitude..=self.max_longitude).contains(&longitude)
    }
}

#[derive(Deserialize)]
#[serde(tag = "type")]
enum GeoJsonDocument {
    FeatureCollection { features: Vec<GeoJsonFeature> },
    Feature(GeoJsonFeature),
}

#[derive(Deserialize)]
struct GeoJsonFeature {
    geometry: Option<GeoJsonGeometry>,
    #[serde(default)]
    properties: Option<serde_json::Value>,
}

#[derive(Deserialize)]
struct GeoJsonGeometry {
    #[serde(rename = "type")]
    kind: String,
    coordinates: serde_json::Value,
}

impl ZonePolygon {
    /// Builds a zone from `[longitude, latitude]` vertices. An open ring is
    /// closed by repeating the first vertex.
    pub fn new(vertices: Vec<[f64; 2]>) -> Result<Self, NozhaError> {
        let mut ring = vertices;
        if let (Some(first), Some(last)) = (ring.first().copied(), ring.last().copied()) {
            if first != last {
                ring.push(first);
            }
        }
        Self::from_closed_ring(None, ring)
    }

    /// Parses a GeoJSON `Feature` with `Polygon` geometry, or a
    /// `FeatureCollection` whose first feature is one. Only the outer ring is
    /// used; holes are ignored.
    pub fn from_geojson(raw: &str) -> Result<Self, NozhaError> {
        let document: GeoJsonDocument = serde_json::from_str(raw)
            .map_err(|e| NozhaError::invalid(format!("zone file is not valid GeoJSON: {}", e)))?;

        let feature = match document {
            GeoJsonDocument::Feature(feature) => feature,
            GeoJsonDocument::FeatureCollection { features } => features
                .into_iter()
                .next()
                .ok_or_else(|| NozhaError::invalid("feature collection is empty"))?,
        };

        let geometry = feature
            .geometry
            .ok_or_else(|| NozhaError::invalid("zone feature has no geometry"))?;
        if geometry.kind != "Polygon" {
            return Err(NozhaError::invalid(format!(
                "zone geometry must be a Polygon, got {}",
                geometry.kind
            )));
        }

        let rings: Vec<Vec<Vec<f64>>> = serde_json::from_value(geometry.coordinates)
            .map_err(|e| NozhaError::invalid(format!("malformed polygon coordinates: {}", e)))?;
        let outer = rings
            .into_iter()
            .next()
            .ok_or_else(|| NozhaError::invalid("polygon has no linear ring"))?;

        let ring = outer
            .into_iter()
            .map(|position| match position.as_slice() {
                [lon, lat, ..] => Ok([*lon, *lat]),
                _ => Err(NozhaError::invalid(format!(
                    "position needs at least two members, got {:?}",
                    position
                ))),
            })
            .collect::<Result<Vec<_>, _>>()?;

        if ring.first() != ring.last() {
            return Err(NozhaError::invalid(
                "linear ring is not closed: first and last positions differ",
            ));
        }

        let name = feature
            .properties
            .as_ref()
            .and_then(|p| p.get("name"))
            .and_then(|n| n.as_str())
            .map(str::to_string);

        Self::from_closed_ring(name, ring)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, NozhaError> {
        let raw = std::fs::read_to_string(path)?;
        Self::from_geojson(&raw)
    }

    /// The Nozha 2 service area shipped with the workspace.
    pub fn nozha() -> Result<Self, NozhaError> {
        Self::from_geojson(NOZHA_ZONE_GEOJSON)
    }

    fn from_closed_ring(name: Option<String>, ring: Vec<[f64; 2]>) -> Result<Self, NozhaError> {
        if ring.len() < 4 {
            return Err(NozhaError::invalid(format!(
                "a polygon ring needs at least 3 vertices plus the closing one, got {}",
                ring.len()
            )));
        }
        for [lon, lat] in &ring {
            validate_coordinates(*lat, *lon)?;
        }

        let open = &ring[..ring.len() - 1];
        let mut distinct: Vec<[f64; 2]> = Vec::with_capacity(open.len());
        for vertex in open {
            if !distinct.contains(vertex) {
                distinct.push(*vertex);
            }
        }
        if distinct.len() < 3 {
            return Err(NozhaError::invalid(format!(
                "a polygon needs at least 3 distinct vertices, got {}",
                distinct.len()
            )));
        }

        Ok(Self { name, ring })
    }

    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    /// The closed ring, first position repeated at the end.
    pub fn ring(&self) -> &[[f64; 2]] {
        &self.ring
    }

    /// The ring without its closing position.
    pub fn vertices(&self) -> &[[f64; 2]] {
        &self.ring[..self.ring.len() - 1]
    }

    pub fn bounding_box(&self) -> BoundingBox {
        let mut bbox = BoundingBox {
            min_latitude: f64::INFINITY,
            min_longitude: f64::INFINITY,
            max_latitude: f64::NEG_INFINITY,
            max_longitude: f64::NEG_INFINITY,
        };
        for [lon, lat] in self.vertices() {
            bbox.min_latitude = bbox.min_latitude.min(*lat);
            bbox.max_latitude = bbox.max_latitude.max(*lat);
            bbox.min_longitude = bbox.min_longitude.min(*lon);
            bbox.max_longitude = bbox.max_longitude.max(*lon);
        }
        bbox
    }

    /// Mean of the vertices. Inside the zone for convex shapes only.
    pub fn centroid(&self) -> GeoPoint {
        let vertices = self.vertices();
        let n = vertices.len() as f64;
        let (lon_sum, lat_sum) = vertices
            .iter()
            .fold((0.0, 0.0), |(lon, lat), v| (lon + v[0], lat + v[1]));
        GeoPoint::new(lat_sum / n, lon_sum / n)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn square_feature(coordinates: &str) -> String {
        format!(
            r#"{{"type":"Feature","properties":{{}},"geometry":{{"type":"Polygon","coordinates":[{}]}}}}"#,
            coordinates
        )
    }

    #[test]
    fn embedded_nozha_zone_loads() {
        let zone = ZonePolygon::nozha().unwrap();
        assert_eq!(zone.name(), Some("nozha2"));
        assert_eq!(zone.vertices().len(), 6);
        assert_eq!(zone.ring().first(), zone.ring().last());
    }

    #[test]
    fn parses_a_bare_feature() {
        let raw = square_feature("[[0,0],[10,0],[10,10],[0,10],[0,0]]");
        let zone = ZonePolygon::from_geojson(&raw).unwrap();
        assert_eq!(zone.vertices(), &[[0.0, 0.0], [10.0, 0.0], [10.0, 10.0], [0.0, 10.0]]);
    }

    #[test]
    fn altitude_members_are_ignored() {
        let raw = square_feature("[[0,0,5],[10,0,5],[10,10,5],[0,10,5],[0,0,5]]");
        let zone = ZonePolygon::from_geojson(&raw).unwrap();
        assert_eq!(zone.vertices()[2], [10.0, 10.0]);
    }

    #[test]
    fn open_geojson_ring_is_rejected() {
        let raw = square_feature("[[0,0],[10,0],[10,10],[0,10]]");
        assert!(matches!(
            ZonePolygon::from_geojson(&raw),
            Err(NozhaError::InvalidInput(_))
        ));
    }

    #[test]
    fn non_polygon_geometry_is_rejected() {
        let raw = r#"{"type":"Feature","geometry":{"type":"Point","coordinates":[1,2]}}"#;
        assert!(matches!(
            ZonePolygon::from_geojson(raw),
            Err(NozhaError::InvalidInput(_))
        ));
    }

    #[test]
    fn empty_feature_collection_is_rejected() {
        let raw = r#"{"type":"FeatureCollection","features":[]}"#;
        assert!(ZonePolygon::from_geojson(raw).is_err());
    }

    #[test]
    fn new_closes_an_open_ring() {
        let zone = ZonePolygon::new(vec![[0.0, 0.0], [1.0, 0.0], [1.0, 1.0]]).unwrap();
        assert_eq!(zone.ring().len(), 4);
        assert_eq!(zone.ring()[3], [0.0, 0.0]);
    }

    #[test]
    fn degenerate_rings_are_rejected() {
        assert!(ZonePolygon::new(vec![]).is_err());
        assert!(ZonePolygon::new(vec![[0.0, 0.0], [1.0, 1.0]]).is_err());
        assert!(ZonePolygon::new(vec![[0.0, 0.0], [1.0, 1.0], [1.0, 1.0], [0.0, 0.0]]).is_err());
    }

    #[test]
    fn out_of_range_vertices_are_rejected() {
        assert!(ZonePolygon::new(vec![[0.0, 0.0], [200.0, 0.0], [1.0, 1.0]]).is_err());
        assert!(ZonePolygon::new(vec![[0.0, f64::NAN], [1.0, 0.0], [1.0, 1.0]]).is_err());
    }

    #[test]
    fn bounding_box_and_centroid() {
        let zone =
            ZonePolygon::new(vec![[0.0, 0.0], [10.0, 0.0], [10.0, 10.0], [0.0, 10.0]]).unwrap();
        let bbox = zone.bounding_box();
        assert_eq!(bbox.min_latitude, 0.0);
        assert_eq!(bbox.max_longitude, 10.0);
        assert!(bbox.contains(5.0, 5.0));
        assert!(!bbox.contains(11.0, 5.0));
        assert_eq!(zone.centroid(), GeoPoint::new(5.0, 5.0));
    }
}
