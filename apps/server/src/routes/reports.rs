//! # Report Routes
//!
//! Read-only dashboard and staff-performance queries. These never touch
//! the write path; they serialize whatever the aggregation layer reads
//! out of committed state.

use axum::extract::State;
use axum::routing::get;
use axum::{Json, Router};
use serde::Serialize;

use crate::error::ApiError;
use crate::AppState;
use shop_core::LOW_STOCK_THRESHOLD;
use shop_db::repository::report::{RecentSale, RevenuePoint, UserPerformance};

/// Buckets on the dashboard revenue chart.
const CHART_DAYS: u32 = 7;

/// Rows in the dashboard's recent-sales panel.
const RECENT_SALES: u32 = 5;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/api/reports/dashboard", get(dashboard))
        .route("/api/reports/users", get(user_performance))
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardResponse {
    pub total_revenue_cents: i64,
    pub total_orders: i64,
    pub today_revenue_cents: i64,
    pub today_orders: i64,
    /// Products with stock below the low-stock threshold.
    pub low_stock: i64,
    /// Trailing revenue series, oldest day first, zero-filled.
    pub chart: Vec<RevenuePoint>,
    pub recent: Vec<RecentSale>,
}

/// GET /api/reports/dashboard - everything the dashboard shows, in one
/// round trip.
pub async fn dashboard(
    State(state): State<AppState>,
) -> Result<Json<DashboardResponse>, ApiError> {
    let reports = state.db.reports();

    let totals = reports.totals().await?;
    let today = reports.today_totals().await?;
    let low_stock = state.db.products().low_stock_count(LOW_STOCK_THRESHOLD).await?;
    let chart = reports.revenue_series(CHART_DAYS).await?;
    let recent = reports.recent_sales(RECENT_SALES).await?;

    Ok(Json(DashboardResponse {
        total_revenue_cents: totals.revenue_cents,
        total_orders: totals.orders,
        today_revenue_cents: today.revenue_cents,
        today_orders: today.orders,
        low_stock,
        chart,
        recent,
    }))
}

/// GET /api/reports/users - per-staff sales count and revenue, every
/// known user included.
pub async fn user_performance(
    State(state): State<AppState>,
) -> Result<Json<Vec<UserPerformance>>, ApiError> {
    let performance = state.db.reports().user_performance().await?;
    Ok(Json(performance))
}
