//! # Product Repository
//!
//! Database operations for the catalog.
//!
//! ## Key Operations
//! - Create (manual entry and bulk import share one path)
//! - Listing with category join, optional category filter
//! - Case-insensitive substring search on name / custom_id
//!
//! ## Bulk Import
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    How Bulk Import Works                                │
//! │                                                                         │
//! │  CSV rows arrive as text records                                        │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  per record: parse price/stock ── invalid? ──► report.failed++          │
//! │       │                                        (batch continues)        │
//! │       ▼                                                                 │
//! │  resolve category (named, or the 'Others' default)                      │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  create product ── duplicate custom_id? ──► report.failed++             │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  report { successCount, failedCount, errors[] }                         │
//! │                                                                         │
//! │  One bad row never aborts the batch.                                    │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use chrono::Utc;
use sqlx::SqlitePool;
use tracing::debug;
use uuid::Uuid;

use crate::error::DbResult;
use crate::repository::category::CategoryRepository;
use shop_core::validation::validate_stock;
use shop_core::{ImportRecord, ImportReport, Money, Product, ProductWithCategory, DEFAULT_CATEGORY};

/// Input for creating a product. Shared by manual entry and bulk import.
#[derive(Debug, Clone, Default)]
pub struct NewProduct {
    pub name: String,
    pub price_cents: i64,
    pub stock: i64,
    /// Category name; `None` or blank lands in the default category.
    pub category: Option<String>,
    pub custom_id: Option<String>,
    pub description: Option<String>,
    pub image_url: Option<String>,
}

/// Repository for product database operations.
///
/// ## Usage
/// ```rust,ignore
/// let repo = db.products();
///
/// let results = repo.search("coke").await?;
/// let product = repo.get_by_id("uuid-here").await?;
/// ```
#[derive(Debug, Clone)]
pub struct ProductRepository {
    pool: SqlitePool,
}

const PRODUCT_WITH_CATEGORY_COLUMNS: &str = r#"
    p.id, p.custom_id, p.name, p.price_cents, p.stock,
    p.category_id, p.description, p.image_url, p.created_at,
    c.name AS category_name
"#;

impl ProductRepository {
    /// Creates a new ProductRepository.
    pub fn new(pool: SqlitePool) -> Self {
        ProductRepository { pool }
    }

    /// Inserts a new product, resolving its category first.
    ///
    /// ## Category Resolution
    /// An explicit category name is upserted; a missing/blank one falls
    /// back to the well-known default category, created once and reused.
    ///
    /// ## Returns
    /// * `Ok(Product)` - Inserted product
    /// * `Err(DbError::UniqueViolation)` - custom_id already exists
    pub async fn create(&self, new: NewProduct) -> DbResult<Product> {
        debug!(name = %new.name, "Creating product");

        let categories = CategoryRepository::new(self.pool.clone());
        let category_name = new
            .category
            .as_deref()
            .map(str::trim)
            .filter(|c| !c.is_empty())
            .unwrap_or(DEFAULT_CATEGORY);
        let category = categories.find_or_create(category_name).await?;

        let product = Product {
            id: Uuid::new_v4().to_string(),
            custom_id: new.custom_id.filter(|c| !c.trim().is_empty()),
            name: new.name.trim().to_string(),
            price_cents: new.price_cents,
            stock: new.stock,
            category_id: category.id,
            description: new.description,
            image_url: new.image_url,
            created_at: Utc::now(),
        };

        sqlx::query(
            r#"
            INSERT INTO products (
                id, custom_id, name, price_cents, stock,
                category_id, description, image_url, created_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)
            "#,
        )
        .bind(&product.id)
        .bind(&product.custom_id)
        .bind(&product.name)
        .bind(product.price_cents)
        .bind(product.stock)
        .bind(&product.category_id)
        .bind(&product.description)
        .bind(&product.image_url)
        .bind(product.created_at)
        .execute(&self.pool)
        .await?;

        Ok(product)
    }

    /// Gets a product by its ID.
    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<Product>> {
        let product = sqlx::query_as::<_, Product>(
            r#"
            SELECT id, custom_id, name, price_cents, stock,
                   category_id, description, image_url, created_at
            FROM products
            WHERE id = ?1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(product)
    }

    /// Lists products joined with their category, newest first.
    ///
    /// ## Arguments
    /// * `category_id` - Optional filter to one category
    pub async fn list(&self, category_id: Option<&str>) -> DbResult<Vec<ProductWithCategory>> {
        let products = match category_id {
            Some(category_id) => {
                sqlx::query_as::<_, ProductWithCategory>(&format!(
                    r#"
                    SELECT {PRODUCT_WITH_CATEGORY_COLUMNS}
                    FROM products p
                    INNER JOIN categories c ON c.id = p.category_id
                    WHERE p.category_id = ?1
                    ORDER BY p.created_at DESC
                    "#
                ))
                .bind(category_id)
                .fetch_all(&self.pool)
                .await?
            }
            None => {
                sqlx::query_as::<_, ProductWithCategory>(&format!(
                    r#"
                    SELECT {PRODUCT_WITH_CATEGORY_COLUMNS}
                    FROM products p
                    INNER JOIN categories c ON c.id = p.category_id
                    ORDER BY p.created_at DESC
                    "#
                ))
                .fetch_all(&self.pool)
                .await?
            }
        };

        Ok(products)
    }

    /// Searches products by name or custom_id, case-insensitive substring.
    ///
    /// An empty query returns the full listing.
    pub async fn search(&self, query: &str) -> DbResult<Vec<ProductWithCategory>> {
        let query = query.trim();

        debug!(query = %query, "Searching products");

        if query.is_empty() {
            return self.list(None).await;
        }

        // Escape LIKE wildcards so a literal '%' in a custom_id still matches
        let escaped = query.replace('\\', "\\\\").replace('%', "\\%").replace('_', "\\_");
        let pattern = format!("%{escaped}%");

        let products = sqlx::query_as::<_, ProductWithCategory>(&format!(
            r#"
            SELECT {PRODUCT_WITH_CATEGORY_COLUMNS}
            FROM products p
            INNER JOIN categories c ON c.id = p.category_id
            WHERE p.name LIKE ?1 ESCAPE '\'
               OR p.custom_id LIKE ?1 ESCAPE '\'
            ORDER BY p.name
            "#
        ))
        .bind(&pattern)
        .fetch_all(&self.pool)
        .await?;

        debug!(count = products.len(), "Search returned products");
        Ok(products)
    }

    /// Bulk catalog import. Records are processed independently; failures
    /// are collected into the report instead of aborting the batch.
    ///
    /// ## Per-Record Validation
    /// - `name` must be present and non-blank
    /// - `price` must parse as a non-negative decimal amount
    /// - `stock` defaults to 0 when missing or unparseable, but an
    ///   explicit negative value fails the record
    pub async fn import(&self, records: &[ImportRecord]) -> ImportReport {
        let mut report = ImportReport::default();

        for record in records {
            let label = record
                .name
                .as_deref()
                .map(str::trim)
                .filter(|n| !n.is_empty())
                .unwrap_or("Unknown");

            let name = match record.name.as_deref().map(str::trim) {
                Some(n) if !n.is_empty() => n,
                _ => {
                    report.record_failure(format!("Skipped {label}: missing name or price"));
                    continue;
                }
            };

            let price = record
                .price
                .as_deref()
                .and_then(|p| p.parse::<Money>().ok())
                .filter(|p| !p.is_negative());
            let price = match price {
                Some(p) => p,
                None => {
                    report.record_failure(format!("Skipped {label}: missing name or price"));
                    continue;
                }
            };

            let stock = record
                .stock
                .as_deref()
                .and_then(|s| s.trim().parse::<i64>().ok())
                .unwrap_or(0);
            if let Err(e) = validate_stock(stock) {
                report.record_failure(format!("Skipped {label}: {e}"));
                continue;
            }

            let result = self
                .create(NewProduct {
                    name: name.to_string(),
                    price_cents: price.cents(),
                    stock,
                    category: record.category.clone(),
                    custom_id: record.custom_id.clone(),
                    description: record.description.clone(),
                    image_url: None,
                })
                .await;

            match result {
                Ok(_) => report.record_success(),
                Err(e) => report.record_failure(format!("Failed {label}: {e}")),
            }
        }

        report
    }

    /// Counts products with stock below the threshold.
    pub async fn low_stock_count(&self, threshold: i64) -> DbResult<i64> {
        let count: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM products WHERE stock < ?1")
                .bind(threshold)
                .fetch_one(&self.pool)
                .await?;

        Ok(count)
    }

    /// Counts total products (for diagnostics).
    pub async fn count(&self) -> DbResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM products")
            .fetch_one(&self.pool)
            .await?;

        Ok(count)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pool::{Database, DbConfig};
    use crate::DbError;

    async fn test_db() -> Database {
        Database::new(DbConfig::in_memory()).await.unwrap()
    }

    fn record(name: Option<&str>, price: Option<&str>) -> ImportRecord {
        ImportRecord {
            name: name.map(String::from),
            price: price.map(String::from),
            ..ImportRecord::default()
        }
    }

    #[tokio::test]
    async fn test_create_defaults_to_others_category() {
        let db = test_db().await;

        let product = db
            .products()
            .create(NewProduct {
                name: "Widget".to_string(),
                price_cents: 500,
                stock: 3,
                ..NewProduct::default()
            })
            .await
            .unwrap();

        let others = db
            .categories()
            .find_by_name(DEFAULT_CATEGORY)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(product.category_id, others.id);
    }

    #[tokio::test]
    async fn test_create_upserts_named_category() {
        let db = test_db().await;

        let a = db
            .products()
            .create(NewProduct {
                name: "Cola".to_string(),
                price_cents: 150,
                stock: 10,
                category: Some("Beverages".to_string()),
                ..NewProduct::default()
            })
            .await
            .unwrap();
        let b = db
            .products()
            .create(NewProduct {
                name: "Lemonade".to_string(),
                price_cents: 120,
                stock: 8,
                category: Some("Beverages".to_string()),
                ..NewProduct::default()
            })
            .await
            .unwrap();

        assert_eq!(a.category_id, b.category_id);
    }

    #[tokio::test]
    async fn test_duplicate_custom_id_is_rejected() {
        let db = test_db().await;

        let make = |custom_id: &str| NewProduct {
            name: "Thing".to_string(),
            price_cents: 100,
            stock: 1,
            custom_id: Some(custom_id.to_string()),
            ..NewProduct::default()
        };

        db.products().create(make("EXT-1")).await.unwrap();
        let err = db.products().create(make("EXT-1")).await.unwrap_err();

        assert!(matches!(err, DbError::UniqueViolation { .. }));
    }

    #[tokio::test]
    async fn test_search_matches_name_and_custom_id() {
        let db = test_db().await;

        db.products()
            .create(NewProduct {
                name: "Coca-Cola 330ml".to_string(),
                price_cents: 150,
                stock: 10,
                custom_id: Some("BEV-001".to_string()),
                ..NewProduct::default()
            })
            .await
            .unwrap();
        db.products()
            .create(NewProduct {
                name: "Bread".to_string(),
                price_cents: 220,
                stock: 5,
                ..NewProduct::default()
            })
            .await
            .unwrap();

        // case-insensitive substring on the name
        let hits = db.products().search("cola").await.unwrap();
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].product.name, "Coca-Cola 330ml");

        // substring on the custom id
        let hits = db.products().search("bev-0").await.unwrap();
        assert_eq!(hits.len(), 1);

        // empty query lists everything
        let hits = db.products().search("  ").await.unwrap();
        assert_eq!(hits.len(), 2);
    }

    #[tokio::test]
    async fn test_list_filters_by_category() {
        let db = test_db().await;

        let p = db
            .products()
            .create(NewProduct {
                name: "Chips".to_string(),
                price_cents: 180,
                stock: 7,
                category: Some("Snacks".to_string()),
                ..NewProduct::default()
            })
            .await
            .unwrap();
        db.products()
            .create(NewProduct {
                name: "Soap".to_string(),
                price_cents: 90,
                stock: 4,
                ..NewProduct::default()
            })
            .await
            .unwrap();

        let all = db.products().list(None).await.unwrap();
        assert_eq!(all.len(), 2);

        let snacks = db.products().list(Some(&p.category_id)).await.unwrap();
        assert_eq!(snacks.len(), 1);
        assert_eq!(snacks[0].category_name, "Snacks");
    }

    #[tokio::test]
    async fn test_import_isolates_bad_records() {
        let db = test_db().await;

        // record 2 has no price: the batch continues around it
        let records = vec![
            record(Some("Pencil"), Some("1.50")),
            record(Some("Eraser"), None),
            record(Some("Notebook"), Some("3")),
        ];

        let report = db.products().import(&records).await;

        assert_eq!(report.success_count, 2);
        assert_eq!(report.failed_count, 1);
        assert_eq!(report.errors.len(), 1);
        assert!(report.errors[0].contains("Eraser"));

        assert_eq!(db.products().count().await.unwrap(), 2);
        let notebook = &db.products().search("Notebook").await.unwrap()[0];
        assert_eq!(notebook.product.price_cents, 300);
    }

    #[tokio::test]
    async fn test_import_parses_stock_leniently() {
        let db = test_db().await;

        let mut rec = record(Some("Tape"), Some("2.00"));
        rec.stock = Some("not-a-number".to_string());

        let report = db.products().import(&[rec]).await;
        assert_eq!(report.success_count, 1);

        // unparseable stock lands at 0, matching manual-entry defaults
        let tape = &db.products().search("Tape").await.unwrap()[0];
        assert_eq!(tape.product.stock, 0);
    }

    #[tokio::test]
    async fn test_low_stock_count() {
        let db = test_db().await;

        for (name, stock) in [("A", 2), ("B", 9), ("C", 10), ("D", 50)] {
            db.products()
                .create(NewProduct {
                    name: name.to_string(),
                    price_cents: 100,
                    stock,
                    ..NewProduct::default()
                })
                .await
                .unwrap();
        }

        // strictly-below threshold
        assert_eq!(db.products().low_stock_count(10).await.unwrap(), 2);
    }
}
