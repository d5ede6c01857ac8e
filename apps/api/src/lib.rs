//! # stockbook API
//!
//! REST server for the stockbook inventory ledger.
//!
//! ## Architecture
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         API Server                                      │
//! │                                                                         │
//! │  Browser ───► HTTP (5000) ───► Routes ───► Repositories ───► SQLite    │
//! │                                  │                                      │
//! │                                  ▼                                      │
//! │                              ApiError                                   │
//! │                        (status + JSON body)                             │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! The router is exposed from the library so integration tests can drive it
//! with `tower::ServiceExt::oneshot` without binding a socket.

pub mod config;
pub mod error;
pub mod routes;

use axum::routing::get;
use axum::{Json, Router};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use stockbook_db::Database;

use crate::config::ApiConfig;
use crate::error::{ApiError, ApiResult};

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    pub db: Database,
    pub config: ApiConfig,
}

/// Builds the full application router.
pub fn app(state: AppState) -> Router {
    let api = Router::new()
        .nest("/products", routes::products::router())
        .nest("/customers", routes::customers::router())
        .nest("/transactions", routes::transactions::router())
        .nest("/reports", routes::reports::router())
        .route("/health", get(health));

    Router::new()
        .nest("/api", api)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

/// Liveness probe: verifies the database answers a trivial query.
async fn health(
    axum::extract::State(state): axum::extract::State<AppState>,
) -> ApiResult<Json<serde_json::Value>> {
    if state.db.health_check().await {
        Ok(Json(serde_json::json!({ "status": "ok" })))
    } else {
        Err(ApiError::Storage(stockbook_db::DbError::ConnectionFailed(
            "health check query failed".to_string(),
        )))
    }
}
