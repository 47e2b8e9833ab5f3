use std::net::Ipv4Addr;
use std::time::Duration;

/// Mean Earth radius used by the haversine formula, in kilometres.
pub const EARTH_RADIUS_KM: f64 = 6371.0;

pub const DEFAULT_ZONE: &str = "nozha2";
pub const SERVER_IP_ADDRESS: Ipv4Addr = Ipv4Addr::new(127, 0, 0, 1);
pub const BASE_PORT: u16 = 3001;

pub const RECONNECT_DELAY: Duration = Duration::from_secs(2);
/// Device location fixes slower than this are treated as unavailable.
pub const LOCATION_TIMEOUT: Duration = Duration::from_secs(10);
pub const POSITION_UPDATE_INTERVAL: Duration = Duration::from_secs(3);
/// Largest distance a simulated vendor moves between two updates.
pub const MAX_STEP_METERS: f64 = 60.0;
pub const RENDER_INTERVAL: Duration = Duration::from_secs(5);

// Live map viewport
pub const MAP_CENTER: (f64, f64) = (30.139785, 31.381158);
pub const MAP_ZOOM: u8 = 14;
pub const MAP_MIN_ZOOM: u8 = 12;
pub const MAP_MAX_ZOOM: u8 = 18;

pub const SERVER_ADDR_ENV: &str = "NOZHA_SERVER_ADDR";
pub const ZONE_ENV: &str = "NOZHA_ZONE";
pub const DEBUG_ENV: &str = "NOZHA_DEBUG";
pub const TOKIO_CONSOLE_ENV: &str = "NOZHA_TOKIO_CONSOLE";
