//! Scan aggregation
//!
//! Single pass over all scans of one QR code, producing the three summaries
//! served by the stats endpoint. Dates are bucketed in UTC at day
//! granularity; the BTreeMap keeps date keys in ascending order.

use chrono::DateTime;
use serde::Serialize;
use std::collections::{BTreeMap, HashMap};

use crate::analytics::device::{classify_device, DeviceClass};
use crate::analytics::geoip::GeoIpReader;
use crate::models::Scan;

/// Per-class scan counts. Both fields are always serialized, zero or not.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct DeviceCounts {
    pub mobile: u64,
    pub desktop: u64,
}

/// Aggregated statistics for one QR code.
#[derive(Debug, Clone, Serialize)]
pub struct ScanStats {
    pub total: u64,
    pub by_date: BTreeMap<String, u64>,
    pub devices: DeviceCounts,
    pub locations: HashMap<String, u64>,
}

/// Reduce a scan set into date, device, and location summaries.
///
/// Geolocation failures never abort the pass; the affected scan still counts
/// under the `"Unknown"` location bucket.
pub fn aggregate_scans(scans: &[Scan], geoip: &GeoIpReader) -> ScanStats {
    let mut by_date: BTreeMap<String, u64> = BTreeMap::new();
    let mut devices = DeviceCounts::default();
    let mut locations: HashMap<String, u64> = HashMap::new();

    for scan in scans {
        let day = DateTime::from_timestamp(scan.timestamp, 0)
            .unwrap_or(DateTime::UNIX_EPOCH)
            .format("%Y-%m-%d")
            .to_string();
        *by_date.entry(day).or_insert(0) += 1;

        match classify_device(&scan.user_agent) {
            DeviceClass::Mobile => devices.mobile += 1,
            DeviceClass::Desktop => devices.desktop += 1,
        }

        let country = geoip.country_for_ip(&scan.ip_address);
        *locations.entry(country).or_insert(0) += 1;
    }

    ScanStats {
        total: scans.len() as u64,
        by_date,
        devices,
        locations,
    }
}
