pub mod config;
pub mod constants;
pub mod errors;
pub mod geo;
pub mod logger;
pub mod messages;
pub mod network;
pub mod types;
pub mod utils;
