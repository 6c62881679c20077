//! # Product Routes
//!
//! Catalog listing/search, manual creation, bulk import and restock
//! adjustments.

use axum::extract::{Path, Query, State};
use axum::routing::{get, patch, post};
use axum::{Json, Router};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::error::ApiError;
use crate::AppState;
use shop_core::validation::{validate_price_cents, validate_product_name, validate_search_query, validate_stock};
use shop_core::{ImportRecord, ImportReport, ProductWithCategory};
use shop_db::repository::product::NewProduct;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/api/products", get(list).post(create))
        .route("/api/products/bulk", post(bulk_import))
        .route("/api/products/{id}/stock", patch(adjust_stock))
}

#[derive(Debug, Deserialize)]
pub struct ProductQuery {
    /// Case-insensitive substring over name / custom id.
    pub search: Option<String>,
    /// Restrict to one category id.
    pub category: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateProductRequest {
    pub name: String,
    pub price_cents: i64,
    #[serde(default)]
    pub stock: i64,
    pub category: Option<String>,
    pub custom_id: Option<String>,
    pub description: Option<String>,
    pub image_url: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct BulkImportRequest {
    pub products: Vec<ImportRecord>,
}

#[derive(Debug, Deserialize)]
pub struct StockAdjustRequest {
    /// Positive to restock, negative to remove.
    pub delta: i64,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StockAdjustResponse {
    pub product_id: String,
    pub stock: i64,
}

/// GET /api/products - catalog listing with category names.
pub async fn list(
    State(state): State<AppState>,
    Query(query): Query<ProductQuery>,
) -> Result<Json<Vec<ProductWithCategory>>, ApiError> {
    let products = match query.search.as_deref() {
        Some(search) => {
            let search = validate_search_query(search).map_err(shop_core::CoreError::from)?;
            state.db.products().search(&search).await?
        }
        None => state.db.products().list(query.category.as_deref()).await?,
    };

    Ok(Json(products))
}

/// POST /api/products - manual product entry.
pub async fn create(
    State(state): State<AppState>,
    Json(req): Json<CreateProductRequest>,
) -> Result<Json<ProductWithCategory>, ApiError> {
    validate_product_name(&req.name).map_err(shop_core::CoreError::from)?;
    validate_price_cents(req.price_cents).map_err(shop_core::CoreError::from)?;
    validate_stock(req.stock).map_err(shop_core::CoreError::from)?;

    let product = state
        .db
        .products()
        .create(NewProduct {
            name: req.name,
            price_cents: req.price_cents,
            stock: req.stock,
            category: req.category,
            custom_id: req.custom_id,
            description: req.description,
            image_url: req.image_url,
        })
        .await?;

    // re-read through the listing join so the response carries the
    // resolved category name
    let with_category = state
        .db
        .products()
        .list(Some(&product.category_id))
        .await?
        .into_iter()
        .find(|p| p.product.id == product.id)
        .ok_or_else(|| ApiError::internal("created product vanished"))?;

    info!(id = %with_category.product.id, name = %with_category.product.name, "Product created");
    Ok(Json(with_category))
}

/// POST /api/products/bulk - bulk catalog import.
///
/// Per-record failures land in the report; the batch itself only fails
/// when it is empty.
pub async fn bulk_import(
    State(state): State<AppState>,
    Json(req): Json<BulkImportRequest>,
) -> Result<Json<ImportReport>, ApiError> {
    if req.products.is_empty() {
        return Err(ApiError::validation("no products provided"));
    }

    let report = state.db.products().import(&req.products).await;

    info!(
        success = report.success_count,
        failed = report.failed_count,
        "Bulk import finished"
    );
    Ok(Json(report))
}

/// PATCH /api/products/{id}/stock - restock or correction.
pub async fn adjust_stock(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(req): Json<StockAdjustRequest>,
) -> Result<Json<StockAdjustResponse>, ApiError> {
    let stock = state.db.stock().adjust(&id, req.delta).await?;

    Ok(Json(StockAdjustResponse {
        product_id: id,
        stock,
    }))
}
