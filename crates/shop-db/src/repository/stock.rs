//! # Stock Ledger
//!
//! Floor-checked stock movements. All writes to `products.stock` outside
//! product creation go through here.
//!
//! ## Floor Check
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Stock Movement Strategy                              │
//! │                                                                         │
//! │  The guard rides in the UPDATE itself:                                  │
//! │                                                                         │
//! │     UPDATE products SET stock = stock - ?qty                            │
//! │     WHERE id = ?id AND stock >= ?qty                                    │
//! │                                                                         │
//! │  Zero rows affected means the movement did NOT happen - either the      │
//! │  product is gone or the floor would be broken. A follow-up SELECT       │
//! │  tells the two apart.                                                   │
//! │                                                                         │
//! │  Check-then-update as two statements would race between readers;        │
//! │  a single guarded UPDATE cannot.                                        │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use sqlx::{SqliteConnection, SqlitePool};
use tracing::debug;

use crate::error::{DbError, DbResult};

/// Atomic, floor-checked stock movements.
#[derive(Debug, Clone)]
pub struct StockLedger {
    pool: SqlitePool,
}

impl StockLedger {
    /// Creates a new StockLedger.
    pub fn new(pool: SqlitePool) -> Self {
        StockLedger { pool }
    }

    /// Standalone stock adjustment (restock, shrinkage correction).
    ///
    /// ## Arguments
    /// * `product_id` - Product to adjust
    /// * `delta` - Positive to add stock, negative to remove
    ///
    /// ## Returns
    /// The new stock level.
    ///
    /// ## Errors
    /// * `NotFound` - No such product
    /// * `InsufficientStock` - A negative delta would cross the floor
    ///
    /// Never use this for a sale: sale decrements belong inside the
    /// checkout transaction so they commit or vanish with the sale row.
    pub async fn adjust(&self, product_id: &str, delta: i64) -> DbResult<i64> {
        debug!(product_id = %product_id, delta = %delta, "Adjusting stock");

        let new_stock: Option<i64> = sqlx::query_scalar(
            r#"
            UPDATE products
            SET stock = stock + ?2
            WHERE id = ?1 AND stock + ?2 >= 0
            RETURNING stock
            "#,
        )
        .bind(product_id)
        .bind(delta)
        .fetch_optional(&self.pool)
        .await?;

        match new_stock {
            Some(stock) => Ok(stock),
            None => Err(Self::diagnose(&self.pool, product_id, -delta).await?),
        }
    }

    /// Decrements stock inside an open checkout transaction.
    ///
    /// This is the primitive behind invariant "no sale without an equal
    /// stock movement": it only ever runs on the transaction that is
    /// inserting the sale, so an aborted commit leaves stock untouched.
    pub(crate) async fn decrement_in_tx(
        conn: &mut SqliteConnection,
        product_id: &str,
        qty: i64,
    ) -> DbResult<()> {
        let result = sqlx::query(
            r#"
            UPDATE products
            SET stock = stock - ?2
            WHERE id = ?1 AND stock >= ?2
            "#,
        )
        .bind(product_id)
        .bind(qty)
        .execute(&mut *conn)
        .await?;

        if result.rows_affected() == 0 {
            return Err(Self::diagnose(&mut *conn, product_id, qty).await?);
        }

        Ok(())
    }

    /// Resolves a failed guarded UPDATE into the right error: the product
    /// is either missing or short on stock.
    async fn diagnose<'e, E>(executor: E, product_id: &str, requested: i64) -> DbResult<DbError>
    where
        E: sqlx::Executor<'e, Database = sqlx::Sqlite>,
    {
        let available: Option<i64> =
            sqlx::query_scalar("SELECT stock FROM products WHERE id = ?1")
                .bind(product_id)
                .fetch_optional(executor)
                .await?;

        Ok(match available {
            None => DbError::not_found("Product", product_id),
            Some(available) => DbError::InsufficientStock {
                product_id: product_id.to_string(),
                available,
                requested,
            },
        })
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pool::{Database, DbConfig};
    use crate::repository::product::NewProduct;

    async fn db_with_product(stock: i64) -> (Database, String) {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let product = db
            .products()
            .create(NewProduct {
                name: "Widget".to_string(),
                price_cents: 500,
                stock,
                ..NewProduct::default()
            })
            .await
            .unwrap();
        (db, product.id)
    }

    #[tokio::test]
    async fn test_adjust_restocks() {
        let (db, id) = db_with_product(2).await;

        let new_stock = db.stock().adjust(&id, 10).await.unwrap();
        assert_eq!(new_stock, 12);
    }

    #[tokio::test]
    async fn test_adjust_refuses_to_cross_floor() {
        let (db, id) = db_with_product(3).await;

        let err = db.stock().adjust(&id, -5).await.unwrap_err();
        assert!(matches!(
            err,
            DbError::InsufficientStock {
                available: 3,
                requested: 5,
                ..
            }
        ));

        // the failed adjustment left stock untouched
        let product = db.products().get_by_id(&id).await.unwrap().unwrap();
        assert_eq!(product.stock, 3);
    }

    #[tokio::test]
    async fn test_adjust_to_exactly_zero_is_allowed() {
        let (db, id) = db_with_product(3).await;

        let new_stock = db.stock().adjust(&id, -3).await.unwrap();
        assert_eq!(new_stock, 0);
    }

    #[tokio::test]
    async fn test_adjust_unknown_product() {
        let (db, _) = db_with_product(1).await;

        let err = db.stock().adjust("missing-id", 1).await.unwrap_err();
        assert!(matches!(err, DbError::NotFound { .. }));
    }
}
