//! # shop-core: Pure Business Logic for ProShop
//!
//! This crate is the **heart** of ProShop. It contains all business logic
//! as pure functions with zero I/O dependencies.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        ProShop Architecture                             │
//! │                                                                         │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                     HTTP Routes (axum)                          │   │
//! │  │    /api/products ── /api/sales ── /api/reports ── /api/backup   │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │               ★ shop-core (THIS CRATE) ★                        │   │
//! │  │                                                                 │   │
//! │  │   ┌───────────┐  ┌───────────┐  ┌───────────┐  ┌───────────┐  │   │
//! │  │   │   types   │  │   money   │  │  checkout │  │ validation│  │   │
//! │  │   │  Product  │  │   Money   │  │ CartLine  │  │   rules   │  │   │
//! │  │   │   Sale    │  │  parsing  │  │PricedOrder│  │  checks   │  │   │
//! │  │   └───────────┘  └───────────┘  └───────────┘  └───────────┘  │   │
//! │  │                                                                 │   │
//! │  │   NO I/O • NO DATABASE • NO NETWORK • PURE FUNCTIONS           │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │                    shop-db (Database Layer)                     │   │
//! │  │         SQLite queries, migrations, checkout transaction        │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`types`] - Domain types (Product, Sale, User, etc.)
//! - [`money`] - Money type with integer arithmetic (no floating point!)
//! - [`checkout`] - Cart pricing and the checkout accounting identity
//! - [`error`] - Domain error types
//! - [`validation`] - Business rule validation
//!
//! ## Design Principles
//!
//! 1. **Pure Functions**: Every function is deterministic - same input = same output
//! 2. **No I/O**: Database, network, file system access is FORBIDDEN here
//! 3. **Integer Money**: All monetary values are in cents (i64) to avoid float errors
//! 4. **Explicit Errors**: All errors are typed, never strings or panics

// =============================================================================
// Module Declarations
// =============================================================================

pub mod checkout;
pub mod error;
pub mod money;
pub mod types;
pub mod validation;

// =============================================================================
// Re-exports for Convenience
// =============================================================================
// These allow users to do `use shop_core::Money` instead of
// `use shop_core::money::Money`

pub use checkout::{CartLine, CheckoutDraft, PricedOrder};
pub use error::{CoreError, ValidationError};
pub use money::Money;
pub use types::*;

// =============================================================================
// Crate-Level Constants
// =============================================================================

/// Identity the sale recorder falls back to when the caller's session
/// cannot be resolved. Seeded by migration 002; keeping the register
/// sellable under session loss wins over strict attribution.
pub const DEFAULT_USER_ID: &str = "00000000-0000-0000-0000-000000000001";

/// Buyer label recorded when the caller does not supply one.
pub const GUEST_BUYER: &str = "Guest";

/// Category that products without an explicit category land in.
/// Created once (migration 002) and reused.
pub const DEFAULT_CATEGORY: &str = "Others";

/// Maximum distinct lines allowed in a single cart.
///
/// ## Business Reason
/// Prevents runaway carts and ensures reasonable transaction sizes.
pub const MAX_CART_ITEMS: usize = 100;

/// Maximum quantity of a single line in a cart.
///
/// ## Business Reason
/// Prevents accidental over-ordering (e.g., typing 1000 instead of 10)
pub const MAX_ITEM_QUANTITY: i64 = 999;

/// Default stock level below which a product counts as "low stock"
/// on the dashboard.
pub const LOW_STOCK_THRESHOLD: i64 = 10;
