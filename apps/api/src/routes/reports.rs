//! Report routes. Read-only, recomputed per request.

use axum::extract::{Query, State};
use axum::routing::get;
use axum::{Json, Router};
use chrono::{DateTime, Utc};
use serde::Deserialize;

use stockbook_db::{CategorySummary, CustomerActivity, InventoryValuation, TransactionSummary};

use crate::error::ApiResult;
use crate::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/inventory", get(inventory))
        .route("/categories", get(categories))
        .route("/transactions", get(transactions))
        .route("/customers", get(customers))
}

async fn inventory(State(state): State<AppState>) -> ApiResult<Json<InventoryValuation>> {
    Ok(Json(state.db.reports().inventory_valuation().await?))
}

async fn categories(State(state): State<AppState>) -> ApiResult<Json<Vec<CategorySummary>>> {
    Ok(Json(state.db.reports().category_summary().await?))
}

#[derive(Debug, Default, Deserialize)]
struct TransactionReportQuery {
    /// Only count entries at or after this instant (RFC3339).
    since: Option<DateTime<Utc>>,
}

async fn transactions(
    State(state): State<AppState>,
    Query(query): Query<TransactionReportQuery>,
) -> ApiResult<Json<TransactionSummary>> {
    Ok(Json(
        state.db.reports().transaction_summary(query.since).await?,
    ))
}

#[derive(Debug, Default, Deserialize)]
struct CustomerReportQuery {
    /// Trim the ranking to the top N spenders.
    limit: Option<u32>,
}

async fn customers(
    State(state): State<AppState>,
    Query(query): Query<CustomerReportQuery>,
) -> ApiResult<Json<Vec<CustomerActivity>>> {
    Ok(Json(state.db.reports().customer_activity(query.limit).await?))
}
