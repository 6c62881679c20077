//! # Domain Types
//!
//! Core domain types used throughout ProShop.
//!
//! ## Type Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Domain Types                                    │
//! │                                                                         │
//! │  ┌─────────────────┐   ┌─────────────────┐   ┌─────────────────┐       │
//! │  │    Product      │   │      Sale       │   │    SaleItem     │       │
//! │  │  ─────────────  │   │  ─────────────  │   │  ─────────────  │       │
//! │  │  id (UUID)      │   │  id (UUID)      │   │  id (UUID)      │       │
//! │  │  custom_id      │   │  receipt_id     │   │  sale_id (FK)   │       │
//! │  │  stock          │   │  payment_mode   │   │  product_name   │       │
//! │  │  price_cents    │   │  total_cents    │   │  price_cents    │       │
//! │  └─────────────────┘   └─────────────────┘   └─────────────────┘       │
//! │                                                                         │
//! │  ┌─────────────────┐   ┌─────────────────┐   ┌─────────────────┐       │
//! │  │    Category     │   │      User       │   │  PaymentMode    │       │
//! │  │  ─────────────  │   │  ─────────────  │   │  ─────────────  │       │
//! │  │  name (unique)  │   │  username       │   │  Cash           │       │
//! │  └─────────────────┘   │  role           │   │  Online         │       │
//! │                        └─────────────────┘   │  Credit         │       │
//! │                                              └─────────────────┘       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Dual-Key Identity Pattern
//! Sales have two identifiers:
//! - `id`: UUID v4 - immutable, used for storage relations
//! - `receipt_id`: human-presentable, date-scoped sequence shown to buyers

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

// =============================================================================
// Category
// =============================================================================

/// A product category. `name` is the natural key; categories are created
/// on demand (upsert-by-name) and never deleted by in-scope operations.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct Category {
    pub id: String,
    pub name: String,
}

// =============================================================================
// Product
// =============================================================================

/// A product available for sale.
///
/// `stock` is the single source of truth for availability. It is mutated
/// by manual creation, bulk import, restock adjustments, and the stock
/// decrement inside a sale commit - never derived from sale history.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[serde(rename_all = "camelCase")]
pub struct Product {
    /// Unique identifier (UUID v4).
    pub id: String,

    /// Optional external code (barcode, supplier SKU). Unique when present.
    pub custom_id: Option<String>,

    /// Display name shown to staff and snapshotted onto receipts.
    pub name: String,

    /// Unit price in cents.
    pub price_cents: i64,

    /// On-hand quantity. Never driven below zero by a committed sale.
    pub stock: i64,

    /// Owning category.
    pub category_id: String,

    pub description: Option<String>,

    pub image_url: Option<String>,

    pub created_at: DateTime<Utc>,
}

/// A product joined with its category name, the shape catalog listings
/// return.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[serde(rename_all = "camelCase")]
pub struct ProductWithCategory {
    #[cfg_attr(feature = "sqlx", sqlx(flatten))]
    #[serde(flatten)]
    pub product: Product,

    pub category_name: String,
}

// =============================================================================
// User
// =============================================================================

/// Staff role. Access control happens at the boundary; the core only
/// records the role for attribution.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "lowercase"))]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Admin,
    Staff,
}

impl Default for Role {
    fn default() -> Self {
        Role::Staff
    }
}

/// A staff account. Sales are attributed to users; credential material is
/// managed outside this store entirely.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: String,
    pub username: String,
    pub name: Option<String>,
    pub role: Role,
    pub created_at: DateTime<Utc>,
}

// =============================================================================
// Payment Mode
// =============================================================================

/// How the buyer paid. A label on the sale record - settlement against a
/// payment gateway is out of scope.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "lowercase"))]
#[serde(rename_all = "lowercase")]
pub enum PaymentMode {
    Cash,
    Online,
    Credit,
}

impl Default for PaymentMode {
    fn default() -> Self {
        PaymentMode::Cash
    }
}

// =============================================================================
// Sale
// =============================================================================

/// A committed sale. Immutable once written - there is no edit, void or
/// refund path in this core.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[serde(rename_all = "camelCase")]
pub struct Sale {
    pub id: String,

    /// Human-presentable identifier, format `YYYYMMDD-NNNN`. Unique and
    /// strictly increasing in observed-commit order within a day.
    pub receipt_id: String,

    /// Staff member the sale is attributed to.
    pub user_id: String,

    pub buyer_name: String,

    pub buyer_contact: Option<String>,

    pub payment_mode: PaymentMode,

    pub discount_cents: i64,

    /// Amount actually charged: `max(subtotal - discount, 0)`.
    pub total_cents: i64,

    /// Commit timestamp (UTC).
    pub date: DateTime<Utc>,
}

// =============================================================================
// Sale Item
// =============================================================================

/// A line item in a sale.
///
/// Uses the snapshot pattern: `product_name` and `price_cents` are frozen
/// at cart time so the receipt reflects the price actually charged,
/// immune to later catalog edits. `product_id` is a weak back-reference
/// that may outlive the product.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[serde(rename_all = "camelCase")]
pub struct SaleItem {
    pub id: String,
    pub sale_id: String,
    pub product_id: String,
    pub product_name: String,
    pub quantity: i64,
    pub price_cents: i64,
}

// =============================================================================
// Sale Metadata
// =============================================================================

/// Attribution and buyer details carried alongside a priced cart into the
/// commit. Assembled by the boundary layer after identity resolution.
#[derive(Debug, Clone)]
pub struct SaleMeta {
    /// Resolved caller identity (or the documented default fallback).
    pub user_id: String,
    pub buyer_name: Option<String>,
    pub buyer_contact: Option<String>,
    pub payment_mode: PaymentMode,
}

// =============================================================================
// Bulk Import Report
// =============================================================================

/// One record of a bulk catalog import. Fields arrive as text (CSV rows);
/// the importer parses and validates each record independently.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImportRecord {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub price: Option<String>,
    #[serde(default)]
    pub stock: Option<String>,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub custom_id: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
}

/// Outcome of a bulk import. Per-record failures are collected here so a
/// bad row never blocks the rest of the batch.
#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ImportReport {
    pub success_count: usize,
    pub failed_count: usize,
    pub errors: Vec<String>,
}

impl ImportReport {
    pub fn record_success(&mut self) {
        self.success_count += 1;
    }

    pub fn record_failure(&mut self, message: impl Into<String>) {
        self.failed_count += 1;
        self.errors.push(message.into());
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
