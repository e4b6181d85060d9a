use crate::schemas::{ErrorResponse, ApiResponse, AppState, CachedData, DASHBOARD_CACHE_KEY};
use axum::{extract::State, http::StatusCode, response::Json};
use chrono::Utc;
use common::{DashboardData, DashboardStats, MonthRef};
use compute::dashboard::compute_dashboard;
use model::entities::{group, group_orphan_payment, orphan, payment, sponsor};
use sea_orm::{EntityTrait, PaginatorTrait, TransactionTrait};
use tracing::{debug, error, instrument, trace};

/// Get the dashboard
///
/// Entity counts plus the ledger aggregates (balance, monthly income, total
/// debt, top debtors). Served from the cache slot when warm; otherwise
/// recomputed from one database snapshot and cached for five minutes. Ledger
/// writes invalidate the slot, so a cache hit is never stale.
#[utoipa::path(
    get,
    path = "/api/v1/dashboard",
    tag = "dashboard",
    responses(
        (status = 200, description = "Dashboard retrieved successfully", body = ApiResponse<DashboardData>),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    )
)]
#[instrument(skip(state))]
pub async fn get_dashboard(
    State(state): State<AppState>,
) -> Result<Json<ApiResponse<DashboardData>>, StatusCode> {
    trace!("Entering get_dashboard function");

    // Check cache first
    if let Some(CachedData::Dashboard(data)) = state.cache.get(DASHBOARD_CACHE_KEY).await {
        debug!("Serving dashboard from cache");
        let response = ApiResponse {
            data,
            message: "Dashboard retrieved from cache".to_string(),
            success: true,
        };
        return Ok(Json(response));
    }

    // One transaction so counts and ledger sums describe the same snapshot.
    let txn = state.db.begin().await.map_err(|db_error| {
        error!("Failed to open transaction: {}", db_error);
        StatusCode::INTERNAL_SERVER_ERROR
    })?;

    let total_groups = group::Entity::find().count(&txn).await.map_err(|db_error| {
        error!("Failed to count groups: {}", db_error);
        StatusCode::INTERNAL_SERVER_ERROR
    })?;
    let total_sponsors = sponsor::Entity::find().count(&txn).await.map_err(|db_error| {
        error!("Failed to count sponsors: {}", db_error);
        StatusCode::INTERNAL_SERVER_ERROR
    })?;
    let total_orphans = orphan::Entity::find().count(&txn).await.map_err(|db_error| {
        error!("Failed to count orphans: {}", db_error);
        StatusCode::INTERNAL_SERVER_ERROR
    })?;

    let payments = payment::Entity::find().all(&txn).await.map_err(|db_error| {
        error!("Failed to load payment ledger: {}", db_error);
        StatusCode::INTERNAL_SERVER_ERROR
    })?;
    let orphan_payments = group_orphan_payment::Entity::find()
        .all(&txn)
        .await
        .map_err(|db_error| {
            error!("Failed to load disbursement ledger: {}", db_error);
            StatusCode::INTERNAL_SERVER_ERROR
        })?;
    let sponsors = sponsor::Entity::find().all(&txn).await.map_err(|db_error| {
        error!("Failed to load sponsors: {}", db_error);
        StatusCode::INTERNAL_SERVER_ERROR
    })?;

    txn.commit().await.map_err(|db_error| {
        error!("Failed to commit dashboard transaction: {}", db_error);
        StatusCode::INTERNAL_SERVER_ERROR
    })?;

    let as_of = MonthRef::from_date(Utc::now().date_naive());
    let figures = compute_dashboard(&payments, &orphan_payments, &sponsors, as_of);

    let data = DashboardData {
        stats: DashboardStats {
            total_groups,
            total_sponsors,
            total_orphans,
        },
        balance: figures.balance,
        debtors: figures.debtors,
    };

    // Cache the result
    state
        .cache
        .insert(DASHBOARD_CACHE_KEY.to_string(), CachedData::Dashboard(data.clone()))
        .await;

    debug!("Dashboard recomputed: {} payments, {} disbursements",
           payments.len(), orphan_payments.len());
    let response = ApiResponse {
        data,
        message: "Dashboard retrieved successfully".to_string(),
        success: true,
    };
    Ok(Json(response))
}
