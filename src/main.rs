use anyhow::Result;
use std::net::SocketAddr;
use std::sync::Arc;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

use folio::api::{self, AppState};
use folio::auth::AuthService;
use folio::config::{AuthMode, Config};
use folio::contact::ContactRelay;
use folio::storage::{self, CachedStorage, Storage};

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("folio=info,tower_http=info")),
        )
        .init();

    let config = Config::from_env()?;
    info!("Loaded configuration");

    info!(
        "Connecting to {:?} storage: {}",
        config.database.backend, config.database.url
    );
    let storage: Option<Arc<dyn Storage>> = match storage::connect(&config.database).await {
        Ok(inner) => {
            info!("Database initialized successfully");
            Some(Arc::new(CachedStorage::new(
                inner,
                config.cache.max_entries,
                config.cache.ttl_secs,
            )))
        }
        Err(e) => {
            // Keep serving; handlers report the missing database per request
            error!("Database unavailable, starting without storage: {:#}", e);
            None
        }
    };

    let auth = Arc::new(AuthService::new(config.auth.clone())?);
    match config.auth.mode {
        AuthMode::None => warn!("Authentication is disabled - admin endpoints are open"),
        AuthMode::Password => info!("Password authentication enabled for admin endpoints"),
    }

    let contact = ContactRelay::from_config(&config.contact)?.map(Arc::new);
    if contact.is_none() {
        info!("CONTACT_FORM_URL not set; contact form submissions will be rejected");
    }

    let state = Arc::new(AppState {
        storage,
        auth,
        contact,
        analytics: config.analytics.clone(),
        blog: config.blog.clone(),
    });

    let router = api::create_api_router(state, &config.frontend);

    if let Some(ref static_dir) = config.frontend.static_dir {
        info!("Serving frontend from directory: {}", static_dir);
    }

    let addr = format!("{}:{}", config.api_server.host, config.api_server.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    info!("API server listening on http://{}", addr);

    axum::serve(
        listener,
        router.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .await?;

    Ok(())
}
