use ipnet::IpNet;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub database: DatabaseConfig,
    pub server: ServerConfig,
    /// Public base URL of the frontend; redirect URLs are built as
    /// `<frontend_base_url>/r/<id>`
    pub frontend_base_url: String,
    /// Public base URL of this service, echoed by /api/config
    pub backend_base_url: String,
    /// Path to the MaxMind GeoLite2 Country database; a missing file
    /// disables geolocation rather than failing startup
    pub geoip_db_path: Option<String>,
    pub trusted_proxy: TrustedProxyConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    pub backend: DatabaseBackend,
    pub url: String,
    pub max_connections: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DatabaseBackend {
    Sqlite,
    Postgres,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

/// Which request header to trust for the client IP, and through how many
/// proxy hops. This is the trust boundary for scan recording.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrustedProxyConfig {
    pub mode: TrustedProxyMode,
    /// CIDR ranges of proxies whose X-Forwarded-For entries are trusted
    #[serde(default)]
    pub trusted_proxies: Vec<IpNet>,
    /// Fixed number of trusted hops, counted from the right of the chain
    #[serde(default)]
    pub num_trusted_proxies: Option<usize>,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TrustedProxyMode {
    /// Use the socket address only
    None,
    /// X-Forwarded-For with trust validation
    Standard,
    /// CF-Connecting-IP
    Cloudflare,
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();

        let backend_str =
            std::env::var("DATABASE_BACKEND").unwrap_or_else(|_| "sqlite".to_string());

        let backend = match backend_str.to_lowercase().as_str() {
            "postgres" | "postgresql" => DatabaseBackend::Postgres,
            _ => DatabaseBackend::Sqlite,
        };

        let database_url =
            std::env::var("DATABASE_URL").unwrap_or_else(|_| "sqlite://./qrtrail.db".to_string());

        let max_connections = std::env::var("DATABASE_MAX_CONNECTIONS")
            .unwrap_or_else(|_| "5".to_string())
            .parse::<u32>()?;

        let host = std::env::var("HOST").unwrap_or_else(|_| "127.0.0.1".to_string());
        let port = std::env::var("PORT")
            .unwrap_or_else(|_| "8080".to_string())
            .parse::<u16>()?;

        let frontend_base_url = std::env::var("FRONTEND_BASE_URL")
            .unwrap_or_else(|_| "http://localhost:3000".to_string())
            .trim_end_matches('/')
            .to_string();

        let backend_base_url = std::env::var("BACKEND_BASE_URL")
            .unwrap_or_else(|_| format!("http://{}:{}", host, port))
            .trim_end_matches('/')
            .to_string();

        let geoip_db_path = match std::env::var("GEOIP_DB_PATH") {
            Ok(p) if p.is_empty() => None,
            Ok(p) => Some(p),
            Err(_) => Some("./data/GeoLite2-Country.mmdb".to_string()),
        };

        let mode = match std::env::var("TRUSTED_PROXY_MODE")
            .unwrap_or_else(|_| "standard".to_string())
            .to_lowercase()
            .as_str()
        {
            "cloudflare" => TrustedProxyMode::Cloudflare,
            "none" => TrustedProxyMode::None,
            "standard" => TrustedProxyMode::Standard,
            other => {
                tracing::warn!(
                    "Unknown TRUSTED_PROXY_MODE '{other}', falling back to 'standard'. \
                     Supported values: none, standard, cloudflare"
                );
                TrustedProxyMode::Standard
            }
        };

        let trusted_proxies = std::env::var("TRUSTED_PROXIES")
            .map(|v| {
                v.split(',')
                    .filter_map(|s| {
                        let s = s.trim();
                        if s.is_empty() {
                            return None;
                        }
                        match s.parse::<IpNet>() {
                            Ok(net) => Some(net),
                            Err(_) => {
                                tracing::warn!("Ignoring invalid CIDR '{s}' in TRUSTED_PROXIES");
                                None
                            }
                        }
                    })
                    .collect()
            })
            .unwrap_or_default();

        let num_trusted_proxies = std::env::var("NUM_TRUSTED_PROXIES")
            .ok()
            .and_then(|v| v.parse::<usize>().ok());

        Ok(Config {
            database: DatabaseConfig {
                backend,
                url: database_url,
                max_connections,
            },
            server: ServerConfig { host, port },
            frontend_base_url,
            backend_base_url,
            geoip_db_path,
            trusted_proxy: TrustedProxyConfig {
                mode,
                trusted_proxies,
                num_trusted_proxies,
            },
        })
    }

    /// Redirect URL served for a QR code id; this is also the string the
    /// generated image encodes.
    pub fn redirect_url_for(&self, id: i64) -> String {
        format!("{}/r/{}", self.frontend_base_url, id)
    }
}
