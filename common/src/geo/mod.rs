pub mod geofence;
pub mod location;
pub mod zone;

use crate::errors::NozhaError;
use serde::{Deserialize, Serialize};

pub use geofence::{GeofenceResult, OutOfZoneNotice, distance_to_zone, evaluate, haversine_km, is_inside};
pub use location::{LocationProvider, check_device_location};
pub use zone::ZonePolygon;

/// A geographic point in decimal degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoPoint {
    pub latitude: f64,
    pub longitude: f64,
}

impl GeoPoint {
    pub fn new(latitude: f64, longitude: f64) -> Self {
        Self {
            latitude,
            longitude,
        }
    }

    /// Builds a point checking that both coordinates are finite and in range.
    pub fn checked(latitude: f64, longitude: f64) -> Result<Self, NozhaError> {
        validate_coordinates(latitude, longitude)?;
        Ok(Self::new(latitude, longitude))
    }
}

pub(crate) fn validate_coordinates(latitude: f64, longitude: f64) -> Result<(), NozhaError> {
    if !latitude.is_finite() || !longitude.is_finite() {
        return Err(NozhaError::invalid(format!(
            "coordinates must be finite, got ({}, {})",
            latitude, longitude
        )));
    }
    if !(-90.0..=90.0).contains(&latitude) {
        return Err(NozhaError::invalid(format!(
            "latitude {} outside [-90, 90]",
            latitude
        )));
    }
    if !(-180.0..=180.0).contains(&longitude) {
        return Err(NozhaError::invalid(format!(
            "longitude {} outside [-180, 180]",
            longitude
        )));
    }
    Ok(())
}
