pub mod dtos;
pub mod vendor_status;
