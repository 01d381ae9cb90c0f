//! HTTP handlers. The resolver may block on its first load, so every call
//! into it runs on the blocking pool.

use std::sync::Arc;

use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::Json,
};
use serde::{Deserialize, Serialize};
use tracing::error;

use georesolve::index::{GeoEntry, LoadReport};
use georesolve::{GeoLevel, GeoResolver, NormalizedGeo, RawGeo};

/// Upper bound on inputs accepted by the batch endpoint
const MAX_BATCH: usize = 1000;

/// Application state shared across handlers
pub struct AppState {
    pub resolver: Arc<GeoResolver>,
}

type HandlerError = (StatusCode, String);

async fn run_blocking<T, F>(f: F) -> Result<T, HandlerError>
where
    T: Send + 'static,
    F: FnOnce() -> T + Send + 'static,
{
    tokio::task::spawn_blocking(f).await.map_err(|e| {
        error!("Resolver task failed: {}", e);
        (StatusCode::INTERNAL_SERVER_ERROR, e.to_string())
    })
}

#[derive(Serialize)]
pub struct HealthResponse {
    status: &'static str,
    dataset_loaded: bool,
    source: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    report: Option<LoadReport>,
}

/// Health check endpoint. Reports without triggering a load.
pub async fn health_handler(State(state): State<Arc<AppState>>) -> Json<HealthResponse> {
    let report = state.resolver.report().cloned();
    Json(HealthResponse {
        status: if report.is_some() { "ok" } else { "degraded" },
        dataset_loaded: report.is_some(),
        source: state.resolver.source(),
        report,
    })
}

/// Normalize identifiers given as query parameters
pub async fn normalize_query_handler(
    State(state): State<Arc<AppState>>,
    Query(raw): Query<RawGeo>,
) -> Result<Json<NormalizedGeo>, HandlerError> {
    let resolver = Arc::clone(&state.resolver);
    let result = run_blocking(move || resolver.normalize(&raw)).await?;
    Ok(Json(result))
}

/// Normalize identifiers given as a JSON body
pub async fn normalize_body_handler(
    State(state): State<Arc<AppState>>,
    Json(raw): Json<RawGeo>,
) -> Result<Json<NormalizedGeo>, HandlerError> {
    let resolver = Arc::clone(&state.resolver);
    let result = run_blocking(move || resolver.normalize(&raw)).await?;
    Ok(Json(result))
}

/// Normalize a list of inputs, results in input order
pub async fn normalize_batch_handler(
    State(state): State<Arc<AppState>>,
    Json(inputs): Json<Vec<RawGeo>>,
) -> Result<Json<Vec<NormalizedGeo>>, HandlerError> {
    if inputs.len() > MAX_BATCH {
        return Err((
            StatusCode::BAD_REQUEST,
            format!("batch of {} exceeds limit of {}", inputs.len(), MAX_BATCH),
        ));
    }
    let resolver = Arc::clone(&state.resolver);
    let results = run_blocking(move || {
        inputs
            .iter()
            .map(|raw| resolver.normalize(raw))
            .collect::<Vec<_>>()
    })
    .await?;
    Ok(Json(results))
}

#[derive(Debug, Default, Deserialize)]
pub struct ChildrenParams {
    state: Option<String>,
    lga: Option<String>,
    ward: Option<String>,
}

impl ChildrenParams {
    /// Ancestor path from the supplied parameters; rejects skipped levels.
    fn parent_keys(&self) -> Result<Vec<String>, String> {
        let supplied = [&self.state, &self.lga, &self.ward];
        let mut keys = Vec::new();
        for (value, level) in supplied.iter().zip(GeoLevel::all()) {
            match value.as_deref().map(str::trim).filter(|v| !v.is_empty()) {
                Some(v) if keys.len() == level.depth() => keys.push(v.to_string()),
                Some(_) => return Err(format!("{} given without its parent level", level)),
                None => {}
            }
        }
        Ok(keys)
    }
}

#[derive(Debug, Serialize)]
pub struct ChildrenResponse {
    level: GeoLevel,
    entries: Vec<GeoEntry>,
}

/// List the entries directly below the given ancestors (states if none)
pub async fn children_handler(
    State(state): State<Arc<AppState>>,
    Query(params): Query<ChildrenParams>,
) -> Result<Json<ChildrenResponse>, HandlerError> {
    let keys = params
        .parent_keys()
        .map_err(|e| (StatusCode::BAD_REQUEST, e))?;
    let level = GeoLevel::from_depth(keys.len())
        .ok_or_else(|| (StatusCode::BAD_REQUEST, "too many levels".to_string()))?;

    let resolver = Arc::clone(&state.resolver);
    let listed = run_blocking(move || {
        let parent_keys: Vec<&str> = keys.iter().map(String::as_str).collect();
        resolver.children(&parent_keys)
    })
    .await?;

    match listed {
        Ok(Some(entries)) => Ok(Json(ChildrenResponse { level, entries })),
        Ok(None) => Err((StatusCode::NOT_FOUND, "unknown parent".to_string())),
        Err(e) => {
            error!("Children listing failed: {}", e);
            Err((StatusCode::SERVICE_UNAVAILABLE, e.to_string()))
        }
    }
}
