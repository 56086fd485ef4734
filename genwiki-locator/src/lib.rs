//! genwiki-locator library interface
//!
//! Resolves GOV gazetteer ids to Wikidata items and hierarchy paths.
//! Exposes the engine, its collaborator clients and the HTTP router.

pub mod api;
pub mod config;
pub mod error;
pub mod evidence;
pub mod extractors;
pub mod fusion;
pub mod gatherer;
pub mod geo;
pub mod hierarchy;
pub mod locator;
pub mod types;
pub mod utils;
pub mod validators;

pub use crate::error::{ApiError, ApiResult, LocatorError, LocatorResult};
pub use crate::evidence::EvidenceMap;
pub use crate::locator::{Collaborators, Locator, Materialize, Resolution};

use axum::Router;
use chrono::{DateTime, Utc};
use std::sync::Arc;
use tokio::sync::RwLock;

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub locator: Arc<Locator>,
    /// Service startup timestamp for uptime tracking
    pub startup_time: DateTime<Utc>,
    /// Last error for diagnostic purposes
    pub last_error: Arc<RwLock<Option<String>>>,
}

impl AppState {
    pub fn new(locator: Arc<Locator>) -> Self {
        Self {
            locator,
            startup_time: Utc::now(),
            last_error: Arc::new(RwLock::new(None)),
        }
    }
}

/// Build application router
pub fn build_router(state: AppState) -> Router {
    Router::new()
        .merge(api::health_routes())
        .merge(api::locate_routes())
        .with_state(state)
}
