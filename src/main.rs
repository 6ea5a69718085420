use std::sync::Arc;
use tokio::net::TcpListener;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use poolrota::store::{MemoryStore, PgStore};
use poolrota::{db, startup, AppConfig, AppState};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize tracing with conditional JSON/text output
    let use_json = std::env::var("LOG_FORMAT")
        .unwrap_or_else(|_| "text".to_string()) == "json";

    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "info,poolrota=debug,tower_http=debug".into());

    if use_json {
        tracing_subscriber::registry()
            .with(env_filter)
            .with(tracing_subscriber::fmt::layer().json())
            .init();
    } else {
        tracing_subscriber::registry()
            .with(env_filter)
            .with(tracing_subscriber::fmt::layer())
            .init();
    }

    // Load environment variables
    dotenvy::dotenv().ok();

    let config = AppConfig::from_env().map_err(|e| {
        tracing::error!("Configuration error: {}", e);
        e
    })?;

    let state = match &config.database_url {
        Some(url) => {
            let pool = db::create_pool(url).await.map_err(|e| {
                tracing::error!("Failed to create database pool: {}", e);
                e
            })?;
            tracing::info!("Database pool created successfully");

            let store = Arc::new(PgStore::new(pool));
            Arc::new(AppState::new(
                config.clone(),
                store.clone(),
                store.clone(),
                store,
            ))
        }
        None => {
            tracing::warn!("DATABASE_URL not set, using the in-memory backend");
            let store = Arc::new(MemoryStore::new());
            Arc::new(AppState::new(
                config.clone(),
                store.clone(),
                store.clone(),
                store,
            ))
        }
    };

    let app = startup::build_router(state);

    let listener = TcpListener::bind(&config.bind_addr).await?;
    tracing::info!("Server listening on {}", listener.local_addr()?);

    axum::serve(listener, app).await?;

    Ok(())
}
