use common::geo::GeoPoint;
use common::types::dtos::{VendorDTO, VendorId};
use common::types::vendor_status::VendorStatus;

/// Appearance of a vendor marker: the store pin, the vendor name as label
/// and a style class per status.
#[derive(Debug, Clone, PartialEq)]
pub struct MarkerIcon {
    pub label: String,
    pub status: VendorStatus,
}

impl MarkerIcon {
    pub fn for_vendor(vendor: &VendorDTO) -> Self {
        Self {
            label: vendor.name.clone(),
            status: vendor.status,
        }
    }

    pub fn class_name(&self) -> String {
        format!("custom-marker {}", self.status)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Marker {
    pub vendor_id: VendorId,
    pub icon: MarkerIcon,
    pub position: GeoPoint,
    pub inside_zone: bool,
    /// Number of in-place moves since the marker was created.
    pub moves: u32,
}

impl Marker {
    pub fn new(vendor: &VendorDTO, inside_zone: bool) -> Self {
        Self {
            vendor_id: vendor.id,
            icon: MarkerIcon::for_vendor(vendor),
            position: GeoPoint::new(vendor.latitude, vendor.longitude),
            inside_zone,
            moves: 0,
        }
    }

    pub fn set_position(&mut self, position: GeoPoint, inside_zone: bool) {
        self.position = position;
        self.inside_zone = inside_zone;
        self.moves += 1;
    }
}
