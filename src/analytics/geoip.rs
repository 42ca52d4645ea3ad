//! Country lookup backed by a MaxMind GeoLite2/GeoIP2 Country MMDB
//!
//! The reader is memory-mapped once at startup and shared; resolution is a
//! total function that falls back to the `"Unknown"` sentinel on every
//! failure path (unparsable address, unresolvable address, no database).

use anyhow::{Context, Result};
use maxminddb::{geoip2, Mmap, Reader};
use std::net::IpAddr;
use std::path::Path;
use std::sync::Arc;
use tracing::warn;

/// Sentinel bucket for scans whose country cannot be resolved.
pub const UNKNOWN_COUNTRY: &str = "Unknown";

/// Country lookup handle.
///
/// Constructed once at startup and passed into aggregation explicitly; a
/// missing database file leaves the handle disabled rather than failing
/// requests.
pub struct GeoIpReader {
    reader: Option<Arc<Reader<Mmap>>>,
}

impl GeoIpReader {
    /// Open the country database at `path`, if one is configured.
    ///
    /// A configured path that does not exist on disk disables lookups with a
    /// warning. A file that exists but cannot be opened as an MMDB is a
    /// startup error.
    pub fn open(path: Option<&str>) -> Result<Self> {
        let reader = match path {
            Some(p) if Path::new(p).exists() => {
                let reader = unsafe { Reader::open_mmap(p) }
                    .with_context(|| format!("Failed to open GeoIP database at {}", p))?;
                Some(Arc::new(reader))
            }
            Some(p) => {
                warn!(path = %p, "GeoIP database not found, all scans will resolve as Unknown");
                None
            }
            None => None,
        };

        Ok(Self { reader })
    }

    /// Build a reader with lookups disabled
    pub fn disabled() -> Self {
        Self { reader: None }
    }

    pub fn is_enabled(&self) -> bool {
        self.reader.is_some()
    }

    /// Resolve the country display name for an IP address given in textual
    /// form. Never fails; any unresolvable input yields [`UNKNOWN_COUNTRY`].
    pub fn country_for_ip(&self, ip_address: &str) -> String {
        let Ok(ip) = ip_address.parse::<IpAddr>() else {
            return UNKNOWN_COUNTRY.to_string();
        };

        self.country_name(ip)
            .unwrap_or_else(|| UNKNOWN_COUNTRY.to_string())
    }

    fn country_name(&self, ip: IpAddr) -> Option<String> {
        let reader = self.reader.as_ref()?;
        let result = reader.lookup(ip).ok()?;
        let country = result.decode::<geoip2::Country>().ok()??;
        country.country.names.english.map(|s| s.to_string())
    }
}

impl Clone for GeoIpReader {
    fn clone(&self) -> Self {
        Self {
            reader: self.reader.clone(),
        }
    }
}
