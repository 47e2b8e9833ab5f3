use crate::errors::NozhaError;
use crate::geo::{GeoPoint, GeofenceResult, ZonePolygon, evaluate};
use crate::logger::Logger;
use std::future::Future;
use std::time::Duration;

/// Source of the device's current position (GPS, OS location service, a
/// simulator).
pub trait LocationProvider {
    fn current_position(&self) -> impl Future<Output = Result<GeoPoint, NozhaError>> + Send;
}

/// Checks whether the device stands inside `zone`.
///
/// The check fails open: when no fix arrives within `timeout`, or the
/// provider reports [`NozhaError::LocationUnavailable`], the device is
/// treated as inside the zone.
pub async fn check_device_location<P: LocationProvider>(
    provider: &P,
    zone: &ZonePolygon,
    timeout: Duration,
    logger: &Logger,
) -> GeofenceResult {
    let position = match tokio::time::timeout(timeout, provider.current_position()).await {
        Ok(Ok(position)) => position,
        Ok(Err(e)) => {
            logger.warn(format!("Skipping zone check: {}", e));
            return GeofenceResult::inside();
        }
        Err(_) => {
            logger.warn(format!(
                "Skipping zone check: no location fix within {:?}",
                timeout
            ));
            return GeofenceResult::inside();
        }
    };

    match evaluate(position.latitude, position.longitude, zone) {
        Ok(result) => {
            if let Some(notice) = result.notice() {
                logger.warn(notice.to_string());
            }
            result
        }
        Err(e) => {
            logger.warn(format!("Skipping zone check: {}", e));
            GeofenceResult::inside()
        }
    }
}
