use crate::types::vendor_status::VendorStatus;
use serde::{Deserialize, Serialize};
use std::time::SystemTime;

pub type VendorId = u64;

/// Vendor as announced on `vendor:online`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VendorDTO {
    /// ID único del vendor.
    pub id: VendorId,
    /// Nombre visible en el marcador.
    pub name: String,
    pub latitude: f64,
    pub longitude: f64,
    pub status: VendorStatus,
}

/// Live record of an online vendor. One per vendor; the last update to
/// arrive wins.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VendorPosition {
    pub vendor_id: VendorId,
    pub name: String,
    pub latitude: f64,
    pub longitude: f64,
    pub status: VendorStatus,
    /// Marca de tiempo de la última posición recibida.
    pub last_updated: SystemTime,
}

impl VendorPosition {
    pub fn from_announcement(vendor: &VendorDTO) -> Self {
        Self {
            vendor_id: vendor.id,
            name: vendor.name.clone(),
            latitude: vendor.latitude,
            longitude: vendor.longitude,
            status: vendor.status,
            last_updated: SystemTime::now(),
        }
    }

    pub fn move_to(&mut self, latitude: f64, longitude: f64) {
        self.latitude = latitude;
        self.longitude = longitude;
        self.last_updated = SystemTime::now();
    }

    /// The `vendor:online` payload that reproduces this record.
    pub fn to_announcement(&self) -> VendorDTO {
        VendorDTO {
            id: self.vendor_id,
            name: self.name.clone(),
            latitude: self.latitude,
            longitude: self.longitude,
            status: self.status,
        }
    }
}
