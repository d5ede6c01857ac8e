//! Customer routes: CRUD plus the per-customer transaction history.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::routing::get;
use axum::{Json, Router};
use serde::Deserialize;

use stockbook_core::validation::{validate_name, Violations};
use stockbook_core::{Customer, CustomerUpdate, NewCustomer, TransactionRecord};

use crate::error::{ApiError, ApiResult};
use crate::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list).post(create))
        .route("/:id", get(get_one).put(update).delete(delete_one))
        .route("/:id/transactions", get(transactions))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CustomerRequest {
    name: String,
    #[serde(default)]
    mobile: String,
    email: Option<String>,
    #[serde(default)]
    address: String,
    notes: Option<String>,
}

impl CustomerRequest {
    fn validate(&self) -> Result<(), ApiError> {
        let mut v = Violations::new();
        v.check(validate_name("name", &self.name));
        v.into_result().map_err(ApiError::Validation)
    }
}

async fn list(State(state): State<AppState>) -> ApiResult<Json<Vec<Customer>>> {
    Ok(Json(state.db.customers().list().await?))
}

async fn create(
    State(state): State<AppState>,
    Json(req): Json<CustomerRequest>,
) -> ApiResult<(StatusCode, Json<Customer>)> {
    req.validate()?;

    let customer = state
        .db
        .customers()
        .insert(&NewCustomer {
            name: req.name.trim().to_string(),
            mobile: req.mobile,
            email: req.email,
            address: req.address,
            notes: req.notes,
        })
        .await?;

    Ok((StatusCode::CREATED, Json(customer)))
}

async fn get_one(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Json<Customer>> {
    match state.db.customers().get_by_id(&id).await? {
        Some(customer) => Ok(Json(customer)),
        None => Err(ApiError::NotFound(format!("Customer not found: {id}"))),
    }
}

async fn update(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(req): Json<CustomerRequest>,
) -> ApiResult<Json<Customer>> {
    req.validate()?;

    let customer = state
        .db
        .customers()
        .update(
            &id,
            &CustomerUpdate {
                name: req.name.trim().to_string(),
                mobile: req.mobile,
                email: req.email,
                address: req.address,
                notes: req.notes,
            },
        )
        .await?;

    Ok(Json(customer))
}

async fn delete_one(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Json<serde_json::Value>> {
    state.db.customers().delete(&id).await?;
    Ok(Json(serde_json::json!({ "message": "Customer deleted" })))
}

/// Unbounded history for one customer, newest first.
async fn transactions(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Json<Vec<TransactionRecord>>> {
    if state.db.customers().get_by_id(&id).await?.is_none() {
        return Err(ApiError::NotFound(format!("Customer not found: {id}")));
    }

    Ok(Json(state.db.ledger().list_for_customer(&id).await?))
}
