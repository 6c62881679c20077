//! # Repository Module
//!
//! Database repository implementations for ProShop.
//!
//! ## Repository Pattern
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Repository Pattern Explained                         │
//! │                                                                         │
//! │  The Repository pattern abstracts database access behind a clean API.  │
//! │                                                                         │
//! │  HTTP handler                                                           │
//! │       │                                                                 │
//! │       │  db.sales().commit_checkout(&order, &meta)                      │
//! │       ▼                                                                 │
//! │  SaleRepository                                                         │
//! │  ├── commit_checkout(&self, order, meta)   ← one transaction            │
//! │  ├── get_by_id(&self, id)                                               │
//! │  └── get_items(&self, sale_id)                                          │
//! │       │                                                                 │
//! │       │  SQL                                                            │
//! │       ▼                                                                 │
//! │  SQLite Database                                                        │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Available Repositories
//!
//! - [`category::CategoryRepository`] - Category upsert and listing
//! - [`product::ProductRepository`] - Catalog CRUD, search, bulk import
//! - [`stock::StockLedger`] - Floor-checked stock movements
//! - [`sale::SaleRepository`] - The checkout transaction and receipt reads
//! - [`report::ReportRepository`] - Read-only aggregates for dashboards
//! - [`user::UserRepository`] - Staff accounts for attribution

pub mod category;
pub mod product;
pub mod report;
pub mod sale;
pub mod stock;
pub mod user;
