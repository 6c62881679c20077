//! # Sale Routes
//!
//! The checkout endpoint and the receipt view.
//!
//! ## Checkout Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  POST /api/sales                                                        │
//! │                                                                         │
//! │  1. resolve identity (Identity extractor, never rejects)                │
//! │  2. price the cart  (shop-core: empty/quantity/total checks)            │
//! │  3. commit          (shop-db: one transaction)                          │
//! │       └── Busy? retry the whole commit, bounded, with backoff           │
//! │  4. 200 {saleId, receiptId, …}  - the receipt view reads this id        │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use axum::extract::{Path, State};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::warn;

use crate::error::ApiError;
use crate::identity::Identity;
use crate::AppState;
use shop_core::{CartLine, CheckoutDraft, Money, PaymentMode, SaleMeta};

/// How many times a checkout that lost the write lock is retried before
/// the conflict is reported to the caller.
const COMMIT_RETRIES: u32 = 3;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/api/sales", post(checkout))
        .route("/api/sales/{id}", get(receipt))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckoutItem {
    pub product_id: String,
    /// Name as shown in the cart; snapshotted onto the receipt.
    pub name: String,
    pub quantity: i64,
    /// Unit price captured at add-to-cart time.
    pub price_cents: i64,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckoutRequest {
    pub items: Vec<CheckoutItem>,
    pub buyer_name: Option<String>,
    pub buyer_contact: Option<String>,
    pub payment_mode: PaymentMode,
    #[serde(default)]
    pub discount_cents: i64,
    /// The cart's own total; checked against the recomputed one.
    pub total_cents: Option<i64>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckoutResponse {
    pub sale_id: String,
    pub receipt_id: String,
    pub total_cents: i64,
    pub item_count: usize,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReceiptResponse {
    pub sale_id: String,
    pub receipt_id: String,
    pub buyer_name: String,
    pub payment_mode: PaymentMode,
    pub date: String,
    pub items: Vec<ReceiptItem>,
    pub subtotal_cents: i64,
    pub discount_cents: i64,
    pub total_cents: i64,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReceiptItem {
    pub name: String,
    pub quantity: i64,
    pub price_cents: i64,
    pub line_total_cents: i64,
}

/// POST /api/sales - commit a checkout.
pub async fn checkout(
    State(state): State<AppState>,
    identity: Identity,
    Json(req): Json<CheckoutRequest>,
) -> Result<Json<CheckoutResponse>, ApiError> {
    let draft = CheckoutDraft {
        lines: req
            .items
            .into_iter()
            .map(|item| CartLine {
                product_id: item.product_id,
                product_name: item.name,
                quantity: item.quantity,
                unit_price: Money::from_cents(item.price_cents),
            })
            .collect(),
        discount: Money::from_cents(req.discount_cents),
        claimed_total: req.total_cents.map(Money::from_cents),
    };
    let order = draft.price()?;

    let meta = SaleMeta {
        user_id: identity.user_id,
        buyer_name: req.buyer_name,
        buyer_contact: req.buyer_contact,
        payment_mode: req.payment_mode,
    };

    // The commit is all-or-nothing, so a transient Busy can rerun it
    // from scratch without observable duplication
    let mut attempt = 0;
    let sale = loop {
        match state.db.sales().commit_checkout(&order, &meta).await {
            Ok(sale) => break sale,
            Err(err) if err.is_transient() && attempt < COMMIT_RETRIES => {
                attempt += 1;
                warn!(attempt, "Checkout hit write contention, retrying");
                tokio::time::sleep(Duration::from_millis(25 * u64::from(attempt))).await;
            }
            Err(err) => return Err(err.into()),
        }
    };

    Ok(Json(CheckoutResponse {
        sale_id: sale.id,
        receipt_id: sale.receipt_id,
        total_cents: sale.total_cents,
        item_count: order.lines.len(),
    }))
}

/// GET /api/sales/{id} - the data behind a receipt view.
///
/// Called with the id a successful checkout returned, so the committed
/// row is already visible (the commit's unit of work finished first).
pub async fn receipt(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<ReceiptResponse>, ApiError> {
    let sale = state
        .db
        .sales()
        .get_by_id(&id)
        .await?
        .ok_or_else(|| ApiError::not_found("Sale", &id))?;

    let items = state.db.sales().get_items(&sale.id).await?;
    let subtotal_cents: i64 = items.iter().map(|i| i.quantity * i.price_cents).sum();

    Ok(Json(ReceiptResponse {
        sale_id: sale.id,
        receipt_id: sale.receipt_id,
        buyer_name: sale.buyer_name,
        payment_mode: sale.payment_mode,
        date: sale.date.to_rfc3339(),
        items: items
            .into_iter()
            .map(|i| ReceiptItem {
                name: i.product_name,
                quantity: i.quantity,
                price_cents: i.price_cents,
                line_total_cents: i.quantity * i.price_cents,
            })
            .collect(),
        subtotal_cents,
        discount_cents: sale.discount_cents,
        total_cents: sale.total_cents,
    }))
}
