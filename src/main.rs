use anyhow::Context;
use std::{net::SocketAddr, sync::Arc};
use tokio::signal;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use blog_backend::{
    build_router,
    services::{media_storage::CloudinaryStorage, mongo_store::MongoStore},
    utils::config::AppConfig,
    AppState,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // A missing .env file is normal in deployed environments
    let dotenv_loaded = dotenvy::dotenv().is_ok();

    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "blog_backend=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Starting blog backend (.env loaded: {})", dotenv_loaded);

    // Load configuration
    let config = AppConfig::from_env();
    tracing::info!("Configuration loaded: {:?}", config);

    if config.uses_default_jwt_secret() {
        tracing::warn!("JWT_SECRET is not set; tokens are signed with an insecure development secret");
    }
    if !config.cloudinary.is_configured() {
        tracing::warn!("Cloudinary credentials are incomplete; uploads will fail");
    }

    let store = MongoStore::connect(&config.mongo_url, &config.mongo_db)
        .await
        .context("Failed to configure MongoDB client")?;

    // Connection problems are logged and requests fail individually until the database is back
    let startup_store = store.clone();
    tokio::spawn(async move { startup_store.initialize_with_retry().await });

    let media = CloudinaryStorage::new(config.cloudinary.clone());
    let addr: SocketAddr = config
        .bind_address()
        .parse()
        .with_context(|| format!("Invalid bind address {}", config.bind_address()))?;

    // Create shared state
    let app_state = AppState::new(config, Arc::new(store), Arc::new(media));
    let app = build_router(app_state);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;
    tracing::info!("Backend is running on {}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("Server shutdown complete");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            tracing::info!("Received Ctrl+C, starting graceful shutdown");
        },
        _ = terminate => {
            tracing::info!("Received terminate signal, starting graceful shutdown");
        },
    }
}
