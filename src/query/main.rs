//! Query server for geographic normalization.
//!
//! Exposes the resolver over HTTP: normalize raw state / LGA / ward /
//! polling-unit identifiers and list the entries below an ancestor.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Result;
use axum::{
    routing::{get, post},
    Router,
};
use clap::Parser;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::{info, warn};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

use georesolve::config::Config;
use georesolve::GeoResolver;

mod routes;
use routes::{
    children_handler, health_handler, normalize_batch_handler, normalize_body_handler,
    normalize_query_handler, AppState,
};

#[cfg(not(target_env = "msvc"))]
#[global_allocator]
static GLOBAL: tikv_jemallocator::Jemalloc = tikv_jemallocator::Jemalloc;

#[derive(Parser, Debug)]
#[command(name = "query")]
#[command(about = "Geographic reference normalization server")]
struct Args {
    /// Listen address (overrides the config file)
    #[arg(short, long)]
    listen: Option<String>,

    /// TOML config file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Dataset file or directory (overrides the config file)
    #[arg(long)]
    dataset: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    let subscriber = FmtSubscriber::builder()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    let args = Args::parse();
    let config = Config::load_or_default(args.config.as_deref())?;
    let source = config.dataset_source(args.dataset)?;

    info!("georesolve query server");
    info!("Dataset: {}", source.path().display());

    if GeoResolver::init_global(GeoResolver::new(source)).is_err() {
        anyhow::bail!("Resolver already initialized");
    }
    let resolver = GeoResolver::global()
        .map(Arc::clone)
        .ok_or_else(|| anyhow::anyhow!("Resolver not initialized"))?;

    // Warm the index; on failure requests are served in degraded mode and
    // every request retries the load
    let warm = Arc::clone(&resolver);
    match tokio::task::spawn_blocking(move || warm.ensure_loaded()).await? {
        Ok(()) => info!("Dataset loaded"),
        Err(e) => warn!("Dataset not loaded, serving degraded results: {}", e),
    }

    let state = Arc::new(AppState { resolver });

    let app = Router::new()
        .route("/health", get(health_handler))
        .route("/v1/normalize", get(normalize_query_handler).post(normalize_body_handler))
        .route("/v1/normalize/batch", post(normalize_batch_handler))
        .route("/v1/children", get(children_handler))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state);

    let listen = args.listen.unwrap_or(config.server.listen);
    info!("Starting server on {}", listen);

    let listener = tokio::net::TcpListener::bind(&listen).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
