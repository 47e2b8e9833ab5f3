use serde::{Deserialize, Serialize};
use std::fmt;

/// Availability a vendor advertises while broadcasting its position.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum VendorStatus {
    /// Open and taking orders
    #[default]
    Active,
    /// Online but serving someone
    Busy,
    /// Online, not taking orders right now
    Away,
}

impl fmt::Display for VendorStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            VendorStatus::Active => write!(f, "active"),
            VendorStatus::Busy => write!(f, "busy"),
            VendorStatus::Away => write!(f, "away"),
        }
    }
}
