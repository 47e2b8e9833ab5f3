pub mod channel;
pub mod live_map;
pub mod view;
