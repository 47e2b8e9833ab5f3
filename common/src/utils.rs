use crate::constants::{EARTH_RADIUS_KM, TOKIO_CONSOLE_ENV};
use crate::geo::{GeoPoint, ZonePolygon, is_inside};
use rand::Rng;
use std::f64::consts::PI;

const MAX_SAMPLING_ATTEMPTS: usize = 100;

/// Starts the tokio-console instrumentation when `NOZHA_TOKIO_CONSOLE` is set.
pub fn init_tokio_console() {
    if std::env::var_os(TOKIO_CONSOLE_ENV).is_some() {
        console_subscriber::init();
    }
}

/// Uniformly samples the zone's bounding box until a point falls inside the
/// zone. Gives up and returns the centroid after a bounded number of tries.
pub fn random_point_in_zone<R: Rng>(zone: &ZonePolygon, rng: &mut R) -> GeoPoint {
    let bbox = zone.bounding_box();
    for _ in 0..MAX_SAMPLING_ATTEMPTS {
        let latitude = rng.gen_range(bbox.min_latitude..=bbox.max_latitude);
        let longitude = rng.gen_range(bbox.min_longitude..=bbox.max_longitude);
        if let Ok(true) = is_inside(latitude, longitude, zone) {
            return GeoPoint::new(latitude, longitude);
        }
    }
    zone.centroid()
}

/// Moves `from` by a random bearing and a random distance of at most
/// `max_meters`.
pub fn random_step<R: Rng>(from: GeoPoint, max_meters: f64, rng: &mut R) -> GeoPoint {
    let bearing = rng.gen_range(0.0..2.0 * PI);
    let distance_km = rng.gen_range(0.0..=max_meters.max(0.0)) / 1000.0;
    offset(from, bearing, distance_km)
}

/// Small-distance flat-earth offset. Good enough for steps of a few hundred
/// metres away from the poles.
pub fn offset(from: GeoPoint, bearing: f64, distance_km: f64) -> GeoPoint {
    let angular = distance_km / EARTH_RADIUS_KM;
    let d_lat = angular * bearing.cos();
    let d_lon = angular * bearing.sin() / from.latitude.to_radians().cos();
    GeoPoint::new(
        (from.latitude + d_lat.to_degrees()).clamp(-90.0, 90.0),
        wrap_longitude(from.longitude + d_lon.to_degrees()),
    )
}

/// Brings a longitude back into [-180, 180) after crossing the antimeridian.
fn wrap_longitude(longitude: f64) -> f64 {
    ((longitude + 540.0) % 360.0) - 180.0
}
