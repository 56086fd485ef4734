//! Resolution endpoints
//!
//! - `GET /locate/:gov_id?ranked=false` - evidence map (validated and ranked by default)
//! - `GET /path/:item` - hierarchy path of a Wikidata item
//! - `GET /resolve/:gov_id?materialize=missing` - full resolution
//! - `GET /parts?items=Q183,Q40` - `has part` relations

use axum::{
    extract::{Path, Query, State},
    routing::get,
    Json, Router,
};
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::error::{ApiError, ApiResult, LocatorError};
use crate::evidence::EvidenceMap;
use crate::extractors::sparql_client::is_item_id;
use crate::locator::{Materialize, Resolution};
use crate::types::PartRecord;
use crate::AppState;

#[derive(Debug, Deserialize)]
pub struct LocateParams {
    #[serde(default = "default_ranked")]
    pub ranked: bool,
}

fn default_ranked() -> bool {
    true
}

#[derive(Debug, Serialize)]
pub struct LocateResponse {
    pub gov_id: String,
    pub ranked: bool,
    pub evidence: EvidenceMap,
}

#[derive(Debug, Serialize)]
pub struct PathResponse {
    pub item: String,
    pub path: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct ResolveParams {
    #[serde(default)]
    pub materialize: Materialize,
}

#[derive(Debug, Deserialize)]
pub struct PartsParams {
    /// Comma separated item ids
    pub items: String,
}

#[derive(Debug, Serialize)]
pub struct PartsResponse {
    pub parts: Vec<PartRecord>,
}

/// Remember the failure for /health, then hand it to the client
async fn record_failure(state: &AppState, err: LocatorError) -> ApiError {
    warn!(error = %err, "Request failed");
    *state.last_error.write().await = Some(err.to_string());
    ApiError::Locator(err)
}

fn check_item(item: &str) -> ApiResult<()> {
    if is_item_id(item) {
        Ok(())
    } else {
        Err(ApiError::BadRequest(format!("Not a Wikidata item id: {}", item)))
    }
}

/// GET /locate/:gov_id
pub async fn locate(
    State(state): State<AppState>,
    Path(gov_id): Path<String>,
    Query(params): Query<LocateParams>,
) -> ApiResult<Json<LocateResponse>> {
    let result = if params.ranked {
        state.locator.locate(&gov_id).await
    } else {
        state.locator.locate_unranked(&gov_id).await
    };
    let evidence = match result {
        Ok(evidence) => evidence,
        Err(e) => return Err(record_failure(&state, e).await),
    };

    Ok(Json(LocateResponse {
        gov_id,
        ranked: params.ranked,
        evidence,
    }))
}

/// GET /path/:item
pub async fn path(
    State(state): State<AppState>,
    Path(item): Path<String>,
) -> ApiResult<Json<PathResponse>> {
    check_item(&item)?;
    let path = match state.locator.resolver().path_for(&item).await {
        Ok(path) => path,
        Err(e) => return Err(record_failure(&state, e).await),
    };

    Ok(Json(PathResponse { item, path }))
}

/// GET /resolve/:gov_id
pub async fn resolve(
    State(state): State<AppState>,
    Path(gov_id): Path<String>,
    Query(params): Query<ResolveParams>,
) -> ApiResult<Json<Resolution>> {
    match state.locator.resolve(&gov_id, params.materialize).await {
        Ok(resolution) => Ok(Json(resolution)),
        Err(e) => Err(record_failure(&state, e).await),
    }
}

/// GET /parts
pub async fn parts(
    State(state): State<AppState>,
    Query(params): Query<PartsParams>,
) -> ApiResult<Json<PartsResponse>> {
    let items: Vec<String> = params
        .items
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect();
    if items.is_empty() {
        return Err(ApiError::BadRequest("No items given".to_string()));
    }
    for item in &items {
        check_item(item)?;
    }

    match state.locator.resolver().parts_of(&items).await {
        Ok(parts) => Ok(Json(PartsResponse { parts })),
        Err(e) => Err(record_failure(&state, e).await),
    }
}

/// Build resolution routes
pub fn locate_routes() -> Router<AppState> {
    Router::new()
        .route("/locate/:gov_id", get(locate))
        .route("/path/:item", get(path))
        .route("/resolve/:gov_id", get(resolve))
        .route("/parts", get(parts))
}
