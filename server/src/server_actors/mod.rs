pub mod session;
pub mod zone_hub;
