pub mod map_view;
pub mod marker;

pub use map_view::{IgnoredReason, MapView, MarkerChange, Viewport};
pub use marker::{Marker, MarkerIcon};
