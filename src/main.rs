use anyhow::Result;
use std::net::SocketAddr;
use std::sync::Arc;
use tracing::info;

use utmrelay::config::{RelayConfig, StoreBackend};
use utmrelay::relay::{create_relay_router, RelayState};
use utmrelay::sender::HttpBeaconSender;
use utmrelay::store::{PostgresVisitStore, SqliteVisitStore, VisitStore};

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt::init();

    // Load configuration
    let config = RelayConfig::from_env()?;
    info!("Loaded configuration");

    // Initialize the optional visit store
    let store: Option<Arc<dyn VisitStore>> = match &config.store {
        Some(store_config) => {
            let store: Arc<dyn VisitStore> = match store_config.backend {
                StoreBackend::Sqlite => {
                    info!("Using SQLite visit store: {}", store_config.url);
                    Arc::new(SqliteVisitStore::new(&store_config.url, 5).await?)
                }
                StoreBackend::Postgres => {
                    info!("Using PostgreSQL visit store: {}", store_config.url);
                    Arc::new(PostgresVisitStore::new(&store_config.url).await?)
                }
            };
            store.init().await?;
            info!("Visit store initialized successfully");
            Some(store)
        }
        None => {
            info!("No visit store configured - visits will not be persisted");
            None
        }
    };

    if config.debug {
        info!("Debug mode is on - beacons are computed but not delivered");
    }

    let state = Arc::new(RelayState {
        config: config.clone(),
        sender: Arc::new(HttpBeaconSender::new()),
        store,
    });
    let router = create_relay_router(state);

    let addr = format!("{}:{}", config.server.host, config.server.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    info!("Beacon relay listening on http://{}", addr);
    info!("   - Tracking pixel at http://{}/utm.gif", addr);

    axum::serve(
        listener,
        router.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .await?;

    Ok(())
}
