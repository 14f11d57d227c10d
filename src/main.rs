mod db;
mod domain;
mod error;
mod services;
mod state;
mod taxonomy;
mod web;

use crate::state::SharedState;
use axum::Router;
use base64::{engine::general_purpose, Engine as _};
use sqlx::postgres::PgPoolOptions;
use std::path::Path;
use std::sync::Arc;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let database_url = std::env::var("DATABASE_URL")?;
    tracing::info!("Connecting to database...");
    let pool = PgPoolOptions::new()
        .max_connections(10)
        .connect(&database_url)
        .await
        .map_err(|e| {
            tracing::error!("Failed to connect to database: {}", e);
            e
        })?;
    tracing::info!("Database connection established");

    tracing::info!("Running database migrations...");
    sqlx::migrate!("./migrations").run(&pool).await.map_err(|e| {
        tracing::error!("Failed to run database migrations: {}", e);
        e
    })?;
    tracing::info!("Database migrations completed");

    let session_key_b64 = std::env::var("SESSION_KEY")?;
    let session_key = general_purpose::STANDARD
        .decode(session_key_b64)
        .map_err(|e| anyhow::anyhow!("SESSION_KEY must be base64: {e}"))?;

    let data_dir = std::env::var("DATA_DIR").unwrap_or_else(|_| "data".to_string());
    let taxonomy = Arc::new(taxonomy::TaxonomyStore::load(Path::new(&data_dir)));
    tracing::info!(
        "Loaded catalogs: {} poses, {} remedies",
        taxonomy.poses.len(),
        taxonomy.remedies.len()
    );

    let genai = Arc::new(services::genai::GenAiService::from_env());
    if !genai.is_enabled() {
        tracing::warn!("GEMINI_API_KEY not set; generative recommendations will use the bundled fallback");
    }
    let music = Arc::new(services::music::MusicService::from_env());

    let shared: SharedState = Arc::new(state::AppState {
        pool,
        taxonomy,
        genai,
        music,
        session_key,
    });

    let app = Router::new()
        .merge(web::routes(shared.clone()))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http());

    let addr = std::env::var("BIND_ADDR").unwrap_or_else(|_| {
        let port = std::env::var("PORT").unwrap_or_else(|_| "3000".to_string());
        format!("0.0.0.0:{}", port)
    });
    tracing::info!("Listening on {addr}");
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;
    Ok(())
}
