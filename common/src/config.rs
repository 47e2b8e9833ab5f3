use crate::constants::*;
use crate::errors::NozhaError;
use crate::geo::GeoPoint;
use serde::{Deserialize, Serialize};
use serde_with::{DurationMilliSeconds, serde_as};
use std::net::SocketAddr;
use std::path::Path;
use std::time::Duration;

/// Where and how a peer reaches the live position channel.
#[serde_as]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ChannelConfig {
    /// Zone topic joined after every (re)connection.
    pub zone: String,
    pub server_addr: SocketAddr,
    #[serde_as(as = "DurationMilliSeconds<u64>")]
    pub reconnect_delay: Duration,
}

impl Default for ChannelConfig {
    fn default() -> Self {
        Self {
            zone: DEFAULT_ZONE.to_string(),
            server_addr: SocketAddr::from((SERVER_IP_ADDRESS, BASE_PORT)),
            reconnect_delay: RECONNECT_DELAY,
        }
    }
}

/// Viewport of the live map.
#[serde_as]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MapViewConfig {
    pub center: GeoPoint,
    pub zoom: u8,
    pub min_zoom: u8,
    pub max_zoom: u8,
    #[serde_as(as = "DurationMilliSeconds<u64>")]
    pub render_interval: Duration,
}

impl Default for MapViewConfig {
    fn default() -> Self {
        Self {
            center: GeoPoint::new(MAP_CENTER.0, MAP_CENTER.1),
            zoom: MAP_ZOOM,
            min_zoom: MAP_MIN_ZOOM,
            max_zoom: MAP_MAX_ZOOM,
            render_interval: RENDER_INTERVAL,
        }
    }
}

/// Behaviour of a vendor device.
#[serde_as]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DeviceConfig {
    #[serde_as(as = "DurationMilliSeconds<u64>")]
    pub location_timeout: Duration,
    #[serde_as(as = "DurationMilliSeconds<u64>")]
    pub position_interval: Duration,
    pub max_step_meters: f64,
}

impl Default for DeviceConfig {
    fn default() -> Self {
        Self {
            location_timeout: LOCATION_TIMEOUT,
            position_interval: POSITION_UPDATE_INTERVAL,
            max_step_meters: MAX_STEP_METERS,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub channel: ChannelConfig,
    pub map: MapViewConfig,
    pub device: DeviceConfig,
}

impl Config {
    /// Reads an optional JSON config file, then applies the
    /// `NOZHA_SERVER_ADDR` and `NOZHA_ZONE` environment overrides.
    pub fn load(path: Option<&Path>) -> Result<Self, NozhaError> {
        let config = match path {
            Some(path) => Self::from_json(&std::fs::read_to_string(path)?)?,
            None => Self::default(),
        };
        config.with_overrides(
            std::env::var(SERVER_ADDR_ENV).ok().as_deref(),
            std::env::var(ZONE_ENV).ok().as_deref(),
        )
    }

    pub fn from_json(raw: &str) -> Result<Self, NozhaError> {
        let config: Config = serde_json::from_str(raw)?;
        config.validate()?;
        Ok(config)
    }

    pub fn with_overrides(
        mut self,
        server_addr: Option<&str>,
        zone: Option<&str>,
    ) -> Result<Self, NozhaError> {
        if let Some(raw) = server_addr {
            self.channel.server_addr = raw.parse().map_err(|e| {
                NozhaError::invalid(format!("{} is not a socket address: {}", SERVER_ADDR_ENV, e))
            })?;
        }
        if let Some(zone) = zone {
            self.channel.zone = zone.to_string();
        }
        self.validate()?;
        Ok(self)
    }

    fn validate(&self) -> Result<(), NozhaError> {
        if self.channel.zone.trim().is_empty() {
            return Err(NozhaError::invalid("zone name cannot be empty"));
        }
        if self.map.min_zoom > self.map.max_zoom {
            return Err(NozhaError::invalid(format!(
                "min_zoom {} is above max_zoom {}",
                self.map.min_zoom, self.map.max_zoom
            )));
        }
        GeoPoint::checked(self.map.center.latitude, self.map.center.longitude)?;
        if !self.device.max_step_meters.is_finite() || self.device.max_step_meters < 0.0 {
            return Err(NozhaError::invalid("max_step_meters must be a non-negative number"));
        }
        Ok(())
    }
}
