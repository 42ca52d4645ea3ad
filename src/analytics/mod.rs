//! Scan analytics
//!
//! Reduces the scan events of one QR code into three independent summaries:
//! counts by calendar date, by device class, and by country. Geolocation
//! uses a MaxMind GeoLite2 Country MMDB; the database being absent is a
//! configuration state, not an error.

pub mod aggregator;
pub mod device;
pub mod geoip;
pub mod ip_extractor;

pub use aggregator::{aggregate_scans, DeviceCounts, ScanStats};
pub use device::{classify_device, DeviceClass};
pub use geoip::{GeoIpReader, UNKNOWN_COUNTRY};
pub use ip_extractor::extract_client_ip;
