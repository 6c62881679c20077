//! # Report Repository
//!
//! The read-only aggregation layer behind dashboards and reports. Never in
//! the write path: everything here is a query over committed sales and the
//! catalog.
//!
//! ## Calendar Bucketing
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Revenue Series Bucketing                             │
//! │                                                                         │
//! │  Sales store UTC timestamps. The revenue chart buckets by the           │
//! │  LOCAL calendar date of each sale - a shop closes its day at local      │
//! │  midnight, not a rolling 24h window.                                    │
//! │                                                                         │
//! │  revenue_series(7), today = Aug 07                                      │
//! │                                                                         │
//! │  Aug 01  Aug 02  Aug 03  Aug 04  Aug 05  Aug 06  Aug 07                 │
//! │  ┌────┐  ┌────┐  ┌────┐  ┌────┐  ┌────┐  ┌────┐  ┌────┐                 │
//! │  │ 120│  │   0│  │ 310│  │   0│  │   0│  │ 45 │  │ 88 │                 │
//! │  └────┘  └────┘  └────┘  └────┘  └────┘  └────┘  └────┘                 │
//! │                                                                         │
//! │  Days without sales report 0 - the bucket is present, not absent.       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use chrono::{DateTime, Duration, Local, LocalResult, NaiveDate, NaiveTime, TimeZone, Utc};
use serde::Serialize;
use sqlx::SqlitePool;

use crate::error::DbResult;
use shop_core::Role;

// =============================================================================
// Report Rows
// =============================================================================

/// Revenue and order count over some window.
#[derive(Debug, Clone, Default, Serialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct SalesTotals {
    pub revenue_cents: i64,
    pub orders: i64,
}

/// One bucket of the revenue chart.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RevenuePoint {
    /// Display label, e.g. `"Aug 07"`.
    pub label: String,
    pub total_cents: i64,
}

/// A recent sale with just enough item data for a dashboard row: one
/// representative line item plus how many more there are.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct RecentSale {
    pub id: String,
    pub receipt_id: String,
    pub buyer_name: String,
    pub total_cents: i64,
    pub date: DateTime<Utc>,
    /// Name snapshot of the first line item.
    pub lead_item: Option<String>,
    pub item_count: i64,
}

/// Per-staff rollup. Zero-filled: every known user appears, with or
/// without sales.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct UserPerformance {
    pub user_id: String,
    pub username: String,
    pub name: Option<String>,
    pub role: Role,
    pub sales_count: i64,
    pub revenue_cents: i64,
}

// =============================================================================
// Repository
// =============================================================================

/// Read-only aggregate queries for dashboards and reports.
#[derive(Debug, Clone)]
pub struct ReportRepository {
    pool: SqlitePool,
}

impl ReportRepository {
    /// Creates a new ReportRepository.
    pub fn new(pool: SqlitePool) -> Self {
        ReportRepository { pool }
    }

    /// All-time revenue and order count.
    pub async fn totals(&self) -> DbResult<SalesTotals> {
        let totals = sqlx::query_as::<_, SalesTotals>(
            r#"
            SELECT COALESCE(SUM(total_cents), 0) AS revenue_cents,
                   COUNT(*) AS orders
            FROM sales
            "#,
        )
        .fetch_one(&self.pool)
        .await?;

        Ok(totals)
    }

    /// Revenue and order count for sales committed at or after `cutoff`.
    pub async fn totals_since(&self, cutoff: DateTime<Utc>) -> DbResult<SalesTotals> {
        let totals = sqlx::query_as::<_, SalesTotals>(
            r#"
            SELECT COALESCE(SUM(total_cents), 0) AS revenue_cents,
                   COUNT(*) AS orders
            FROM sales
            WHERE date >= ?1
            "#,
        )
        .bind(cutoff)
        .fetch_one(&self.pool)
        .await?;

        Ok(totals)
    }

    /// Today's revenue and order count, where "today" starts at local
    /// midnight.
    pub async fn today_totals(&self) -> DbResult<SalesTotals> {
        self.totals_since(start_of_local_day(Local::now().date_naive()))
            .await
    }

    /// Revenue per local calendar day for the trailing `days` days
    /// including today, oldest first. Days without sales report 0.
    pub async fn revenue_series(&self, days: u32) -> DbResult<Vec<RevenuePoint>> {
        self.revenue_series_ending(Local::now().date_naive(), days)
            .await
    }

    /// Same as [`revenue_series`](Self::revenue_series) with an explicit
    /// final day, so tests can pin the window.
    pub async fn revenue_series_ending(
        &self,
        end_day: NaiveDate,
        days: u32,
    ) -> DbResult<Vec<RevenuePoint>> {
        let days = days.max(1);
        let start_day = end_day - Duration::days(days as i64 - 1);
        let cutoff = start_of_local_day(start_day);

        let rows: Vec<(DateTime<Utc>, i64)> = sqlx::query_as(
            r#"
            SELECT date, total_cents
            FROM sales
            WHERE date >= ?1
            "#,
        )
        .bind(cutoff)
        .fetch_all(&self.pool)
        .await?;

        let mut series = Vec::with_capacity(days as usize);
        for offset in 0..days {
            let day = start_day + Duration::days(offset as i64);
            let total_cents = rows
                .iter()
                .filter(|(date, _)| date.with_timezone(&Local).date_naive() == day)
                .map(|(_, cents)| cents)
                .sum();
            series.push(RevenuePoint {
                label: day.format("%b %d").to_string(),
                total_cents,
            });
        }

        Ok(series)
    }

    /// Most recent sales, newest first, with representative item data.
    pub async fn recent_sales(&self, limit: u32) -> DbResult<Vec<RecentSale>> {
        let sales = sqlx::query_as::<_, RecentSale>(
            r#"
            SELECT s.id, s.receipt_id, s.buyer_name, s.total_cents, s.date,
                   (SELECT i.product_name FROM sale_items i
                    WHERE i.sale_id = s.id ORDER BY i.rowid LIMIT 1) AS lead_item,
                   (SELECT COUNT(*) FROM sale_items i
                    WHERE i.sale_id = s.id) AS item_count
            FROM sales s
            ORDER BY s.date DESC, s.receipt_id DESC
            LIMIT ?1
            "#,
        )
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        Ok(sales)
    }

    /// Sales count and revenue per user, for every known user.
    pub async fn user_performance(&self) -> DbResult<Vec<UserPerformance>> {
        let performance = sqlx::query_as::<_, UserPerformance>(
            r#"
            SELECT u.id AS user_id, u.username, u.name, u.role,
                   COUNT(s.id) AS sales_count,
                   COALESCE(SUM(s.total_cents), 0) AS revenue_cents
            FROM users u
            LEFT JOIN sales s ON s.user_id = u.id
            GROUP BY u.id
            ORDER BY revenue_cents DESC, u.username
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(performance)
    }
}

/// Local midnight of `day`, as a UTC instant, for date-window cutoffs.
fn start_of_local_day(day: NaiveDate) -> DateTime<Utc> {
    let midnight = day.and_time(NaiveTime::MIN);
    match Local.from_local_datetime(&midnight) {
        LocalResult::Single(dt) | LocalResult::Ambiguous(dt, _) => dt.with_timezone(&Utc),
        // DST gap where local midnight does not exist
        LocalResult::None => Utc.from_utc_datetime(&midnight),
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
