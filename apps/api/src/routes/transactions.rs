//! Transaction routes: the HTTP face of the ledger.
//!
//! The create payload is a `type`-tagged object; the tag selects the
//! direction and the price field the caller supplies:
//!
//! ```json
//! { "type": "stock-in",  "productId": "...", "quantity": 5,
//!   "purchasePriceCents": 300 }
//! { "type": "stock-out", "productId": "...", "quantity": 2,
//!   "reason": "sale", "sellingPriceCents": 500, "customerId": "..." }
//! ```
//!
//! An unknown tag (or otherwise malformed body) is a 400, so the handler
//! takes the extraction `Result` instead of letting axum reject it.

use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::routing::get;
use axum::{Json, Router};
use chrono::{DateTime, Utc};
use serde::Deserialize;

use stockbook_core::validation::{validate_price_cents, validate_quantity, validate_uuid, Violations};
use stockbook_core::{
    Money, NewStockTransaction, StockOutReason, TransactionKind, TransactionRecord,
};
use stockbook_db::TransactionFilter;

use crate::error::{ApiError, ApiResult};
use crate::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list).post(create))
        .route("/:id", get(get_one).delete(delete_one))
}

// =============================================================================
// Request DTOs
// =============================================================================

#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
enum CreateTransactionRequest {
    #[serde(rename_all = "camelCase")]
    StockIn {
        product_id: String,
        quantity: i64,
        purchase_price_cents: i64,
        /// Accepted for wire compatibility; the supplier of record lives on
        /// the product.
        #[serde(default)]
        supplier: Option<String>,
        reference_number: Option<String>,
        notes: Option<String>,
    },
    #[serde(rename_all = "camelCase")]
    StockOut {
        product_id: String,
        quantity: i64,
        reason: StockOutReason,
        selling_price_cents: i64,
        customer_id: Option<String>,
        reference_number: Option<String>,
        notes: Option<String>,
    },
}

impl CreateTransactionRequest {
    /// Structural validation, collecting every violated field.
    fn into_input(self) -> Result<NewStockTransaction, ApiError> {
        let mut v = Violations::new();

        let input = match self {
            CreateTransactionRequest::StockIn {
                product_id,
                quantity,
                purchase_price_cents,
                supplier: _,
                reference_number,
                notes,
            } => {
                v.check(validate_uuid("productId", &product_id));
                v.check(validate_quantity(quantity));
                v.check(validate_price_cents("purchasePriceCents", purchase_price_cents));

                NewStockTransaction {
                    kind: TransactionKind::StockIn,
                    product_id,
                    customer_id: None,
                    quantity,
                    unit_price: Money::from_cents(purchase_price_cents),
                    reason: None,
                    reference_number,
                    notes,
                }
            }

            CreateTransactionRequest::StockOut {
                product_id,
                quantity,
                reason,
                selling_price_cents,
                customer_id,
                reference_number,
                notes,
            } => {
                v.check(validate_uuid("productId", &product_id));
                v.check(validate_quantity(quantity));
                v.check(validate_price_cents("sellingPriceCents", selling_price_cents));

                if let Some(ref customer_id) = customer_id {
                    v.check(validate_uuid("customerId", customer_id));
                } else if reason.requires_customer() {
                    v.push("customerId", "customerId is required for sale transactions");
                }

                NewStockTransaction {
                    kind: TransactionKind::StockOut,
                    product_id,
                    customer_id,
                    quantity,
                    unit_price: Money::from_cents(selling_price_cents),
                    reason: Some(reason),
                    reference_number,
                    notes,
                }
            }
        };

        v.into_result().map_err(ApiError::Validation)?;
        Ok(input)
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ListQuery {
    /// `stock-in` or `stock-out`.
    kind: Option<TransactionKind>,
    /// Only entries at or after this instant (RFC3339).
    since: Option<DateTime<Utc>>,
    /// Substring match on product name, SKU or customer name.
    search: Option<String>,
    /// Overrides the configured listing cap.
    limit: Option<u32>,
}

// =============================================================================
// Handlers
// =============================================================================

async fn list(
    State(state): State<AppState>,
    Query(query): Query<ListQuery>,
) -> ApiResult<Json<Vec<TransactionRecord>>> {
    let filter = TransactionFilter {
        kind: query.kind,
        since: query.since,
        search: query.search,
        limit: query.limit.unwrap_or(state.config.transaction_list_cap),
    };

    Ok(Json(state.db.ledger().list(&filter).await?))
}

async fn create(
    State(state): State<AppState>,
    payload: Result<Json<CreateTransactionRequest>, JsonRejection>,
) -> ApiResult<(StatusCode, Json<TransactionRecord>)> {
    let Json(req) = payload.map_err(|e| ApiError::BadRequest(e.body_text()))?;
    let input = req.into_input()?;

    let record = state.db.ledger().record(&input).await?;
    Ok((StatusCode::CREATED, Json(record)))
}

async fn get_one(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Json<TransactionRecord>> {
    match state.db.ledger().get(&id).await? {
        Some(record) => Ok(Json(record)),
        None => Err(ApiError::NotFound(format!("Transaction not found: {id}"))),
    }
}

/// Reverses the quantity effect and removes the entry.
async fn delete_one(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Json<serde_json::Value>> {
    state.db.ledger().reverse(&id).await?;
    Ok(Json(
        serde_json::json!({ "message": "Transaction reversed and deleted" }),
    ))
}
