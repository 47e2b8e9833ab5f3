//! Point-in-zone membership and distance to the zone.
//!
//! Coordinates are decimal degrees. Query functions take `(lat, lon)`; the
//! polygon stores GeoJSON `[lon, lat]` positions.

use crate::constants::EARTH_RADIUS_KM;
use crate::errors::NozhaError;
use crate::geo::{ZonePolygon, validate_coordinates};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Outcome of a geofence query. `distance_to_zone_km` is only filled in when
/// the point is outside the zone.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeofenceResult {
    pub inside: bool,
    pub distance_to_zone_km: Option<f64>,
}

impl GeofenceResult {
    pub fn inside() -> Self {
        Self {
            inside: true,
            distance_to_zone_km: None,
        }
    }

    pub fn outside(distance_km: f64) -> Self {
        Self {
            inside: false,
            distance_to_zone_km: Some(distance_km),
        }
    }

    pub fn notice(&self) -> Option<OutOfZoneNotice> {
        match (self.inside, self.distance_to_zone_km) {
            (false, Some(distance_km)) => Some(OutOfZoneNotice { distance_km }),
            _ => None,
        }
    }
}

/// Warning shown to someone located outside the service area.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OutOfZoneNotice {
    pub distance_km: f64,
}

impl fmt::Display for OutOfZoneNotice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "You are outside the service area ({:.2} km from the zone)",
            self.distance_km
        )
    }
}

/// Great-circle distance between two points, in kilometres.
pub fn haversine_km(lat1: f64, lon1: f64, lat2: f64, lon2: f64) -> f64 {
    let d_lat = (lat2 - lat1).to_radians();
    let d_lon = (lon2 - lon1).to_radians();

    let a = (d_lat / 2.0).sin().powi(2)
        + lat1.to_radians().cos() * lat2.to_radians().cos() * (d_lon / 2.0).sin().powi(2);

    // Rounding can push `a` a hair over 1 for antipodal points.
    let a = a.clamp(0.0, 1.0);
    2.0 * EARTH_RADIUS_KM * a.sqrt().atan2((1.0 - a).sqrt())
}

/// Even-odd ray casting. A horizontal ray is cast from the query point
/// towards increasing longitude and every edge it crosses flips the result.
///
/// Membership of points lying exactly on an edge is unspecified.
pub fn is_inside(lat: f64, lon: f64, polygon: &ZonePolygon) -> Result<bool, NozhaError> {
    validate_coordinates(lat, lon)?;

    let ring = polygon.ring();
    let mut inside = false;
    let mut j = ring.len() - 1;
    for i in 0..ring.len() {
        let [xi, yi] = ring[i];
        let [xj, yj] = ring[j];

        // The first condition guarantees `yi != yj`.
        let crosses = (yi > lat) != (yj > lat) && lon < (xj - xi) * (lat - yi) / (yj - yi) + xi;
        if crosses {
            inside = !inside;
        }
        j = i;
    }

    Ok(inside)
}

/// Distance in kilometres from the point to the nearest polygon *vertex*.
///
/// Edges are not projected onto, so for long edges this overestimates the
/// true distance to the boundary.
pub fn distance_to_zone(lat: f64, lon: f64, polygon: &ZonePolygon) -> Result<f64, NozhaError> {
    validate_coordinates(lat, lon)?;

    let distance = polygon
        .vertices()
        .iter()
        .map(|[v_lon, v_lat]| haversine_km(lat, lon, *v_lat, *v_lon))
        .fold(f64::INFINITY, f64::min);

    Ok(distance)
}

pub fn evaluate(lat: f64, lon: f64, polygon: &ZonePolygon) -> Result<GeofenceResult, NozhaError> {
    if is_inside(lat, lon, polygon)? {
        Ok(GeofenceResult::inside())
    } else {
        Ok(GeofenceResult::outside(distance_to_zone(lat, lon, polygon)?))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ntest::{assert_about_eq, timeout};

    fn unit_square() -> ZonePolygon {
        ZonePolygon::new(vec![
            [0.0, 0.0],
            [10.0, 0.0],
            [10.0, 10.0],
            [0.0, 10.0],
            [0.0, 0.0],
        ])
        .unwrap()
    }

    fn rotated(polygon: &ZonePolygon, by: usize) -> ZonePolygon {
        let mut open = polygon.vertices().to_vec();
        open.rotate_left(by);
        ZonePolygon::new(open).unwrap()
    }

    #[test]
    fn square_center_is_inside() {
        assert!(is_inside(5.0, 5.0, &unit_square()).unwrap());
    }

    #[test]
    fn far_point_is_outside_with_nearest_vertex_distance() {
        let square = unit_square();
        assert!(!is_inside(20.0, 20.0, &square).unwrap());

        let distance = distance_to_zone(20.0, 20.0, &square).unwrap();
        assert_about_eq!(distance, haversine_km(20.0, 20.0, 10.0, 10.0), 1e-9);
    }

    #[test]
    fn evaluate_only_measures_outside_points() {
        let square = unit_square();
        assert_eq!(evaluate(5.0, 5.0, &square).unwrap(), GeofenceResult::inside());

        let outside = evaluate(20.0, 20.0, &square).unwrap();
        assert!(!outside.inside);
        assert!(outside.distance_to_zone_km.unwrap() > 0.0);
        assert!(outside.notice().is_some());
    }

    #[test]
    fn convex_polygon_interior_points_are_inside() {
        let hexagon = ZonePolygon::new(vec![
            [2.0, 0.0],
            [4.0, 0.0],
            [6.0, 3.0],
            [4.0, 6.0],
            [2.0, 6.0],
            [0.0, 3.0],
        ])
        .unwrap();
        for (lat, lon) in [(3.0, 3.0), (1.0, 3.0), (5.0, 3.0), (3.0, 1.0), (3.0, 5.0)] {
            assert!(is_inside(lat, lon, &hexagon).unwrap(), "({}, {})", lat, lon);
        }
        for (lat, lon) in [(50.0, 50.0), (-40.0, 3.0), (3.0, -40.0), (80.0, 170.0)] {
            assert!(!is_inside(lat, lon, &hexagon).unwrap(), "({}, {})", lat, lon);
        }
    }

    #[test]
    fn concave_notch_is_outside() {
        // U shape opening northwards between longitudes 4 and 6.
        let u_shape = ZonePolygon::new(vec![
            [0.0, 0.0],
            [10.0, 0.0],
            [10.0, 10.0],
            [6.0, 10.0],
            [6.0, 4.0],
            [4.0, 4.0],
            [4.0, 10.0],
            [0.0, 10.0],
        ])
        .unwrap();
        assert!(!is_inside(8.0, 5.0, &u_shape).unwrap());
        assert!(is_inside(8.0, 2.0, &u_shape).unwrap());
        assert!(is_inside(2.0, 5.0, &u_shape).unwrap());
    }

    #[test]
    fn membership_is_invariant_under_ring_rotation() {
        let square = unit_square();
        let queries = [(5.0, 5.0), (20.0, 20.0), (9.5, 0.5), (-1.0, 5.0), (5.0, 10.5)];
        for by in 1..square.vertices().len() {
            let other = rotated(&square, by);
            for (lat, lon) in queries {
                assert_eq!(
                    is_inside(lat, lon, &square).unwrap(),
                    is_inside(lat, lon, &other).unwrap(),
                    "rotation {} query ({}, {})",
                    by,
                    lat,
                    lon
                );
            }
        }
    }

    #[test]
    fn distance_is_zero_on_a_vertex() {
        let square = unit_square();
        assert_eq!(distance_to_zone(10.0, 10.0, &square).unwrap(), 0.0);
        assert_eq!(distance_to_zone(0.0, 0.0, &square).unwrap(), 0.0);
    }

    #[test]
    #[timeout(1000)]
    fn distance_is_never_negative() {
        let square = unit_square();
        let mut lat = -90.0;
        while lat <= 90.0 {
            let mut lon = -180.0;
            while lon <= 180.0 {
                assert!(distance_to_zone(lat, lon, &square).unwrap() >= 0.0);
                lon += 7.5;
            }
            lat += 7.5;
        }
    }

    #[test]
    fn one_degree_of_longitude_at_the_equator() {
        assert_about_eq!(haversine_km(0.0, 0.0, 0.0, 1.0), 111.195, 0.001);
        assert_about_eq!(haversine_km(0.0, 0.0, 0.0, 180.0), 20015.087, 0.001);
    }

    #[test]
    fn invalid_query_coordinates_are_rejected() {
        let square = unit_square();
        assert!(matches!(
            is_inside(f64::NAN, 0.0, &square),
            Err(NozhaError::InvalidInput(_))
        ));
        assert!(matches!(
            distance_to_zone(91.0, 0.0, &square),
            Err(NozhaError::InvalidInput(_))
        ));
        assert!(evaluate(0.0, f64::INFINITY, &square).is_err());
    }

    #[test]
    fn nozha_center_is_inside_the_service_area() {
        let zone = ZonePolygon::nozha().unwrap();
        assert!(is_inside(30.139785, 31.381158, &zone).unwrap());
        assert!(!is_inside(30.0444, 31.2357, &zone).unwrap());
    }

    #[test]
    fn notice_formats_distance_with_two_decimals() {
        let notice = GeofenceResult::outside(3.14159).notice().unwrap();
        assert_eq!(
            notice.to_string(),
            "You are outside the service area (3.14 km from the zone)"
        );
    }
}
