use anyhow::Result;
use std::net::SocketAddr;
use std::sync::Arc;
use tracing::info;

use qrtrail::analytics::GeoIpReader;
use qrtrail::api::{create_router, AppState};
use qrtrail::config::{Config, DatabaseBackend};
use qrtrail::storage::{PostgresStorage, SqliteStorage, Storage};

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt::init();

    // Load configuration
    let config = Config::from_env()?;
    info!("Loaded configuration");

    // Initialize storage
    let storage: Arc<dyn Storage> = match config.database.backend {
        DatabaseBackend::Sqlite => {
            info!("Using SQLite storage: {}", config.database.url);
            Arc::new(
                SqliteStorage::new(&config.database.url, config.database.max_connections).await?,
            )
        }
        DatabaseBackend::Postgres => {
            info!("Using PostgreSQL storage: {}", config.database.url);
            Arc::new(
                PostgresStorage::new(&config.database.url, config.database.max_connections)
                    .await?,
            )
        }
    };

    // Initialize database
    info!("Initializing database...");
    storage.init().await?;
    info!("Database initialized successfully");

    // Open the GeoIP country database once; aggregation borrows this handle
    let geoip = GeoIpReader::open(config.geoip_db_path.as_deref())?;
    if geoip.is_enabled() {
        info!("GeoIP country lookups enabled");
    } else {
        info!("GeoIP country lookups disabled, locations will report Unknown");
    }

    let addr = format!("{}:{}", config.server.host, config.server.port);

    let state = Arc::new(AppState {
        storage,
        geoip,
        config,
    });
    let router = create_router(state);

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    info!("🚀 Server listening on http://{}", addr);
    info!("   - API endpoints available at http://{}/api/...", addr);

    axum::serve(
        listener,
        router.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .await?;

    Ok(())
}
