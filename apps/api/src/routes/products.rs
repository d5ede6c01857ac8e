//! Product routes: catalogue CRUD plus the low-stock and category views.
//!
//! Stock quantity is writable only at creation (opening stock); the update
//! payload has no quantity field because stock moves through the ledger.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::routing::get;
use axum::{Json, Router};
use serde::Deserialize;

use stockbook_core::validation::{
    validate_category, validate_name, validate_price_cents, validate_reorder_level, validate_sku,
    Violations,
};
use stockbook_core::{NewProduct, Product, ProductUpdate, DEFAULT_REORDER_LEVEL};

use crate::error::{ApiError, ApiResult};
use crate::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list).post(create))
        .route("/low-stock", get(low_stock))
        .route("/category/:category", get(by_category))
        .route("/:id", get(get_one).put(update).delete(delete_one))
}

// =============================================================================
// Request DTOs
// =============================================================================

fn default_reorder_level() -> i64 {
    DEFAULT_REORDER_LEVEL
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CreateProductRequest {
    sku: String,
    name: String,
    category: String,
    #[serde(default)]
    description: String,
    /// Opening stock level.
    #[serde(default)]
    quantity: i64,
    price_cents: i64,
    #[serde(default)]
    cost_price_cents: i64,
    #[serde(default = "default_reorder_level")]
    reorder_level: i64,
    #[serde(default)]
    supplier: String,
    #[serde(default)]
    location: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct UpdateProductRequest {
    name: String,
    category: String,
    #[serde(default)]
    description: String,
    price_cents: i64,
    #[serde(default)]
    cost_price_cents: i64,
    #[serde(default = "default_reorder_level")]
    reorder_level: i64,
    #[serde(default)]
    supplier: String,
    #[serde(default)]
    location: String,
}

// =============================================================================
// Handlers
// =============================================================================

async fn list(State(state): State<AppState>) -> ApiResult<Json<Vec<Product>>> {
    Ok(Json(state.db.products().list().await?))
}

async fn create(
    State(state): State<AppState>,
    Json(req): Json<CreateProductRequest>,
) -> ApiResult<(StatusCode, Json<Product>)> {
    let mut v = Violations::new();
    v.check(validate_sku(&req.sku));
    v.check(validate_name("name", &req.name));
    v.check(validate_category(&req.category));
    v.check(validate_price_cents("priceCents", req.price_cents));
    v.check(validate_price_cents("costPriceCents", req.cost_price_cents));
    v.check(validate_reorder_level(req.reorder_level));
    if req.quantity < 0 {
        v.push("quantity", "quantity must be non-negative");
    }
    v.into_result().map_err(ApiError::Validation)?;

    let product = state
        .db
        .products()
        .insert(&NewProduct {
            sku: req.sku.trim().to_string(),
            name: req.name.trim().to_string(),
            category: req.category.trim().to_string(),
            description: req.description,
            quantity: req.quantity,
            price_cents: req.price_cents,
            cost_price_cents: req.cost_price_cents,
            reorder_level: req.reorder_level,
            supplier: req.supplier,
            location: req.location,
        })
        .await?;

    Ok((StatusCode::CREATED, Json(product)))
}

async fn get_one(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Json<Product>> {
    match state.db.products().get_by_id(&id).await? {
        Some(product) => Ok(Json(product)),
        None => Err(ApiError::NotFound(format!("Product not found: {id}"))),
    }
}

async fn update(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(req): Json<UpdateProductRequest>,
) -> ApiResult<Json<Product>> {
    let mut v = Violations::new();
    v.check(validate_name("name", &req.name));
    v.check(validate_category(&req.category));
    v.check(validate_price_cents("priceCents", req.price_cents));
    v.check(validate_price_cents("costPriceCents", req.cost_price_cents));
    v.check(validate_reorder_level(req.reorder_level));
    v.into_result().map_err(ApiError::Validation)?;

    let product = state
        .db
        .products()
        .update(
            &id,
            &ProductUpdate {
                name: req.name.trim().to_string(),
                category: req.category.trim().to_string(),
                description: req.description,
                price_cents: req.price_cents,
                cost_price_cents: req.cost_price_cents,
                reorder_level: req.reorder_level,
                supplier: req.supplier,
                location: req.location,
            },
        )
        .await?;

    Ok(Json(product))
}

async fn delete_one(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Json<serde_json::Value>> {
    state.db.products().delete(&id).await?;
    Ok(Json(serde_json::json!({ "message": "Product deleted" })))
}

async fn low_stock(State(state): State<AppState>) -> ApiResult<Json<Vec<Product>>> {
    Ok(Json(state.db.products().low_stock().await?))
}

async fn by_category(
    State(state): State<AppState>,
    Path(category): Path<String>,
) -> ApiResult<Json<Vec<Product>>> {
    Ok(Json(state.db.products().by_category(&category).await?))
}
