//! # Sale Repository
//!
//! The commit half of the checkout protocol, plus receipt reads.
//!
//! ## Commit Protocol
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    One Checkout, One Transaction                        │
//! │                                                                         │
//! │  BEGIN                                                                  │
//! │    1. allocate receipt id  (upsert-increment on receipt_counters)       │
//! │    2. INSERT sale header   (totals recomputed by shop-core)             │
//! │    3. INSERT every item    (name/price snapshots from the cart)         │
//! │    4. decrement stock per item, floor-checked                           │
//! │         └── any failure here ──► ROLLBACK, nothing persists             │
//! │  COMMIT                                                                 │
//! │                                                                         │
//! │  Concurrency: SQLite serializes writers. Two checkouts racing over      │
//! │  the last unit of stock resolve inside the storage engine - the loser   │
//! │  sees the guarded UPDATE match nothing and aborts with                  │
//! │  InsufficientStock. Receipt allocation rides the same transaction,      │
//! │  so receipt ids are unique and increase in observed-commit order.       │
//! │  A writer that cannot get the lock in time surfaces Busy; callers       │
//! │  retry the whole commit.                                                │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use chrono::{DateTime, Local, Utc};
use sqlx::{SqliteConnection, SqlitePool};
use tracing::{debug, info};
use uuid::Uuid;

use crate::error::DbResult;
use crate::repository::stock::StockLedger;
use shop_core::{PricedOrder, Sale, SaleItem, SaleMeta, GUEST_BUYER};

/// Repository for sale database operations.
#[derive(Debug, Clone)]
pub struct SaleRepository {
    pool: SqlitePool,
}

impl SaleRepository {
    /// Creates a new SaleRepository.
    pub fn new(pool: SqlitePool) -> Self {
        SaleRepository { pool }
    }

    /// Commits a priced checkout as one atomic unit of work.
    ///
    /// ## Arguments
    /// * `order` - A priced cart from `CheckoutDraft::price()`; its totals
    ///   already satisfy the accounting identity
    /// * `meta` - Attribution and buyer details from the boundary layer
    ///
    /// ## Returns
    /// The committed sale, receipt id included. Once this returns, a read
    /// of the sale by id observes the committed row (read-your-writes for
    /// the receipt page).
    ///
    /// ## Errors
    /// * `InsufficientStock` / `NotFound` - a line item failed its stock
    ///   decrement; the whole sale is rolled back
    /// * `Busy` - lost the write lock; safe to retry the entire commit
    pub async fn commit_checkout(&self, order: &PricedOrder, meta: &SaleMeta) -> DbResult<Sale> {
        let now = Utc::now();
        let mut tx = self.pool.begin().await?;

        let receipt_id = allocate_receipt_id(&mut tx, now).await?;

        let sale = Sale {
            id: Uuid::new_v4().to_string(),
            receipt_id,
            user_id: meta.user_id.clone(),
            buyer_name: meta
                .buyer_name
                .clone()
                .filter(|b| !b.trim().is_empty())
                .unwrap_or_else(|| GUEST_BUYER.to_string()),
            buyer_contact: meta.buyer_contact.clone(),
            payment_mode: meta.payment_mode,
            discount_cents: order.discount.cents(),
            total_cents: order.total.cents(),
            date: now,
        };

        debug!(id = %sale.id, receipt_id = %sale.receipt_id, "Inserting sale");

        sqlx::query(
            r#"
            INSERT INTO sales (
                id, receipt_id, user_id, buyer_name, buyer_contact,
                payment_mode, discount_cents, total_cents, date
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)
            "#,
        )
        .bind(&sale.id)
        .bind(&sale.receipt_id)
        .bind(&sale.user_id)
        .bind(&sale.buyer_name)
        .bind(&sale.buyer_contact)
        .bind(sale.payment_mode)
        .bind(sale.discount_cents)
        .bind(sale.total_cents)
        .bind(sale.date)
        .execute(&mut *tx)
        .await?;

        for line in &order.lines {
            sqlx::query(
                r#"
                INSERT INTO sale_items (
                    id, sale_id, product_id, product_name, quantity, price_cents
                ) VALUES (?1, ?2, ?3, ?4, ?5, ?6)
                "#,
            )
            .bind(Uuid::new_v4().to_string())
            .bind(&sale.id)
            .bind(&line.product_id)
            .bind(&line.product_name)
            .bind(line.quantity)
            .bind(line.unit_price.cents())
            .execute(&mut *tx)
            .await?;

            // Dropping the transaction on error rolls everything back,
            // stock movements included
            StockLedger::decrement_in_tx(&mut tx, &line.product_id, line.quantity).await?;
        }

        tx.commit().await?;

        info!(
            receipt_id = %sale.receipt_id,
            total = %order.total,
            items = order.lines.len(),
            "Sale committed"
        );

        Ok(sale)
    }

    /// Gets a sale by ID.
    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<Sale>> {
        let sale = sqlx::query_as::<_, Sale>(
            r#"
            SELECT id, receipt_id, user_id, buyer_name, buyer_contact,
                   payment_mode, discount_cents, total_cents, date
            FROM sales
            WHERE id = ?1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(sale)
    }

    /// Gets all items for a sale, in insertion order.
    pub async fn get_items(&self, sale_id: &str) -> DbResult<Vec<SaleItem>> {
        let items = sqlx::query_as::<_, SaleItem>(
            r#"
            SELECT id, sale_id, product_id, product_name, quantity, price_cents
            FROM sale_items
            WHERE sale_id = ?1
            ORDER BY rowid
            "#,
        )
        .bind(sale_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(items)
    }

    /// Counts committed sales (for diagnostics and tests).
    pub async fn count(&self) -> DbResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM sales")
            .fetch_one(&self.pool)
            .await?;

        Ok(count)
    }
}

/// Allocates the next receipt id inside the checkout transaction.
///
/// ## Format
/// `YYYYMMDD-NNNN`, e.g. `20260807-0042`: the local calendar day plus a
/// per-day sequence.
///
/// ## Uniqueness
/// The sequence is an upsert-increment on a counter row, executed inside
/// the same transaction as the sale insert. Writers are serialized by the
/// storage engine, so no two commits can read the same value; the UNIQUE
/// constraint on `sales.receipt_id` is the backstop. Counters survive
/// process restarts and are shared by every server instance on the file.
async fn allocate_receipt_id(
    conn: &mut SqliteConnection,
    now: DateTime<Utc>,
) -> DbResult<String> {
    let day = now.with_timezone(&Local).format("%Y%m%d").to_string();

    let seq: i64 = sqlx::query_scalar(
        r#"
        INSERT INTO receipt_counters (day, last_seq) VALUES (?1, 1)
        ON CONFLICT (day) DO UPDATE SET last_seq = last_seq + 1
        RETURNING last_seq
        "#,
    )
    .bind(&day)
    .fetch_one(&mut *conn)
    .await?;

    Ok(format!("{day}-{seq:04}"))
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::DbError;
    use crate::pool::{Database, DbConfig};
    use crate::repository::product::NewProduct;
    use shop_core::{CartLine, CheckoutDraft, Money, PaymentMode, DEFAULT_USER_ID};
    use std::collections::HashSet;

    async fn test_db() -> Database {
        Database::new(DbConfig::in_memory()).await.unwrap()
    }

    async fn seed_product(db: &Database, name: &str, price_cents: i64, stock: i64) -> String {
        db.products()
            .create(NewProduct {
                name: name.to_string(),
                price_cents,
                stock,
                ..NewProduct::default()
            })
            .await
            .unwrap()
            .id
    }

    fn priced(lines: Vec<CartLine>, discount_cents: i64) -> PricedOrder {
        CheckoutDraft {
            lines,
            discount: Money::from_cents(discount_cents),
            claimed_total: None,
        }
        .price()
        .unwrap()
    }

    fn cart_line(product_id: &str, qty: i64, price_cents: i64) -> CartLine {
        CartLine {
            product_id: product_id.to_string(),
            product_name: "Widget".to_string(),
            quantity: qty,
            unit_price: Money::from_cents(price_cents),
        }
    }

    fn meta() -> SaleMeta {
        SaleMeta {
            user_id: DEFAULT_USER_ID.to_string(),
            buyer_name: None,
            buyer_contact: None,
            payment_mode: PaymentMode::Cash,
        }
    }

    #[tokio::test]
    async fn test_commit_records_sale_and_decrements_stock() {
        let db = test_db().await;
        let product_id = seed_product(&db, "Widget", 1000, 5).await;

        // qty 2 at 1000 cents, no discount
        let order = priced(vec![cart_line(&product_id, 2, 1000)], 0);
        let sale = db.sales().commit_checkout(&order, &meta()).await.unwrap();

        assert_eq!(sale.total_cents, 2000);
        assert_eq!(sale.buyer_name, GUEST_BUYER);

        // stock moved by exactly the sold quantity
        let product = db.products().get_by_id(&product_id).await.unwrap().unwrap();
        assert_eq!(product.stock, 3);

        // read-your-writes: the committed sale and its items are visible
        let found = db.sales().get_by_id(&sale.id).await.unwrap().unwrap();
        assert_eq!(found.receipt_id, sale.receipt_id);

        let items = db.sales().get_items(&sale.id).await.unwrap();
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].quantity, 2);
        assert_eq!(items[0].price_cents, 1000);
    }

    #[tokio::test]
    async fn test_accounting_identity_holds_on_committed_rows() {
        let db = test_db().await;
        let p1 = seed_product(&db, "A", 700, 10).await;
        let p2 = seed_product(&db, "B", 250, 10).await;

        let order = priced(vec![cart_line(&p1, 2, 700), cart_line(&p2, 3, 250)], 150);
        let sale = db.sales().commit_checkout(&order, &meta()).await.unwrap();

        let items = db.sales().get_items(&sale.id).await.unwrap();
        let subtotal: i64 = items.iter().map(|i| i.quantity * i.price_cents).sum();
        assert_eq!(subtotal - sale.discount_cents, sale.total_cents);
    }

    #[tokio::test]
    async fn test_insufficient_stock_aborts_whole_commit() {
        let db = test_db().await;
        let product_id = seed_product(&db, "Widget", 1000, 1).await;

        // requesting 2 with only 1 on hand
        let order = priced(vec![cart_line(&product_id, 2, 1000)], 0);
        let err = db.sales().commit_checkout(&order, &meta()).await.unwrap_err();

        assert!(matches!(
            err,
            DbError::InsufficientStock {
                available: 1,
                requested: 2,
                ..
            }
        ));

        // no sale row, no item row, stock untouched
        assert_eq!(db.sales().count().await.unwrap(), 0);
        let product = db.products().get_by_id(&product_id).await.unwrap().unwrap();
        assert_eq!(product.stock, 1);
    }

    #[tokio::test]
    async fn test_partial_cart_failure_rolls_back_earlier_lines() {
        let db = test_db().await;
        let ok_id = seed_product(&db, "Plenty", 100, 50).await;
        let short_id = seed_product(&db, "Short", 100, 1).await;

        // first line would succeed alone; the second cannot
        let order = priced(
            vec![cart_line(&ok_id, 5, 100), cart_line(&short_id, 3, 100)],
            0,
        );
        db.sales().commit_checkout(&order, &meta()).await.unwrap_err();

        // the first line's decrement was rolled back with the rest
        let ok = db.products().get_by_id(&ok_id).await.unwrap().unwrap();
        assert_eq!(ok.stock, 50);
        assert_eq!(db.sales().count().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_unknown_product_aborts_commit() {
        let db = test_db().await;
        seed_product(&db, "Widget", 1000, 5).await;

        let order = priced(vec![cart_line("no-such-product", 1, 1000)], 0);
        let err = db.sales().commit_checkout(&order, &meta()).await.unwrap_err();

        assert!(matches!(err, DbError::NotFound { .. }));
        assert_eq!(db.sales().count().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_concurrent_commits_never_oversell() {
        let db = test_db().await;
        let product_id = seed_product(&db, "Last One", 1000, 1).await;

        let order_a = priced(vec![cart_line(&product_id, 1, 1000)], 0);
        let order_b = priced(vec![cart_line(&product_id, 1, 1000)], 0);

        let meta_a = meta();
        let meta_b = meta();
        let sales_a = db.sales();
        let sales_b = db.sales();
        let (a, b) = tokio::join!(
            sales_a.commit_checkout(&order_a, &meta_a),
            sales_b.commit_checkout(&order_b, &meta_b),
        );

        // exactly one wins; the loser reports insufficient stock
        let successes = [&a, &b].iter().filter(|r| r.is_ok()).count();
        assert_eq!(successes, 1);
        let loser = if a.is_ok() { b } else { a };
        assert!(matches!(
            loser.unwrap_err(),
            DbError::InsufficientStock { .. }
        ));

        let product = db.products().get_by_id(&product_id).await.unwrap().unwrap();
        assert_eq!(product.stock, 0);
        assert_eq!(db.sales().count().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_receipt_ids_are_unique_and_increasing() {
        let db = test_db().await;
        let product_id = seed_product(&db, "Widget", 100, 100).await;

        let mut receipts = Vec::new();
        for _ in 0..6 {
            let order = priced(vec![cart_line(&product_id, 1, 100)], 0);
            let sale = db.sales().commit_checkout(&order, &meta()).await.unwrap();
            receipts.push(sale.receipt_id);
        }

        let distinct: HashSet<&String> = receipts.iter().collect();
        assert_eq!(distinct.len(), receipts.len());

        // date-scoped sequence increases in commit order
        let mut sorted = receipts.clone();
        sorted.sort();
        assert_eq!(receipts, sorted);
        assert!(receipts[0].ends_with("-0001"));
    }

    #[tokio::test]
    async fn test_receipt_ids_distinct_under_concurrent_commits() {
        let db = test_db().await;
        let product_id = seed_product(&db, "Widget", 100, 100).await;

        let mut handles = Vec::new();
        for _ in 0..8 {
            let sales = db.sales();
            let order = priced(vec![cart_line(&product_id, 1, 100)], 0);
            handles.push(tokio::spawn(async move {
                sales.commit_checkout(&order, &meta()).await
            }));
        }

        let mut receipts = HashSet::new();
        for handle in handles {
            let sale = handle.await.unwrap().unwrap();
            assert!(receipts.insert(sale.receipt_id));
        }
        assert_eq!(receipts.len(), 8);
    }

    #[tokio::test]
    async fn test_snapshot_price_wins_over_live_price() {
        let db = test_db().await;
        let product_id = seed_product(&db, "Widget", 1000, 5).await;

        // the cart captured 900 before a price change; the receipt must
        // show what was actually charged
        let order = priced(vec![cart_line(&product_id, 1, 900)], 0);
        let sale = db.sales().commit_checkout(&order, &meta()).await.unwrap();

        assert_eq!(sale.total_cents, 900);
        let items = db.sales().get_items(&sale.id).await.unwrap();
        assert_eq!(items[0].price_cents, 900);
    }

    #[tokio::test]
    async fn test_oversized_discount_commits_as_free_sale() {
        let db = test_db().await;
        let product_id = seed_product(&db, "Widget", 10, 5).await;

        // discount 15 on a subtotal of 10: charged 0, never negative
        let order = priced(vec![cart_line(&product_id, 1, 10)], 15);
        let sale = db.sales().commit_checkout(&order, &meta()).await.unwrap();

        assert_eq!(sale.total_cents, 0);
        assert_eq!(sale.discount_cents, 15);
    }

    #[tokio::test]
    async fn test_buyer_details_are_recorded() {
        let db = test_db().await;
        let product_id = seed_product(&db, "Widget", 100, 5).await;

        let order = priced(vec![cart_line(&product_id, 1, 100)], 0);
        let meta = SaleMeta {
            user_id: DEFAULT_USER_ID.to_string(),
            buyer_name: Some("Alice".to_string()),
            buyer_contact: Some("555-0100".to_string()),
            payment_mode: PaymentMode::Online,
        };
        let sale = db.sales().commit_checkout(&order, &meta).await.unwrap();

        let found = db.sales().get_by_id(&sale.id).await.unwrap().unwrap();
        assert_eq!(found.buyer_name, "Alice");
        assert_eq!(found.buyer_contact.as_deref(), Some("555-0100"));
        assert_eq!(found.payment_mode, PaymentMode::Online);
    }
}
