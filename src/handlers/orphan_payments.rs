use crate::schemas::{ErrorResponse, ApiResponse, AppState, DASHBOARD_CACHE_KEY};
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::Json,
};
use chrono::{DateTime, Utc};
use common::MonthRef;
use model::entities::{group, group_orphan_payment};
use rust_decimal::Decimal;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, EntityTrait, PaginatorTrait, QueryFilter, QueryOrder, Set,
};
use serde::{Deserialize, Serialize};
use tracing::{debug, error, info, instrument, trace, warn};
use utoipa::ToSchema;

/// Request body for recording a group's monthly disbursement to its orphans
///
/// Upserts on the (group, month, year) key.
#[derive(Debug, Deserialize, Serialize, ToSchema)]
pub struct RecordOrphanPaymentRequest {
    /// Calendar month (1-12)
    pub month: i32,
    pub year: i32,
    /// Amount disbursed (must be positive)
    pub amount: Decimal,
    /// Whether the disbursement went out
    pub is_paid: bool,
    /// Free-form note
    pub description: Option<String>,
}

/// Query parameters for listing disbursements
#[derive(Debug, Deserialize, ToSchema)]
pub struct OrphanPaymentsQuery {
    /// Calendar month (1-12)
    pub month: Option<i32>,
    pub year: Option<i32>,
}

/// Disbursement response model
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct OrphanPaymentResponse {
    pub id: i32,
    pub group_id: i32,
    pub month: i32,
    pub year: i32,
    pub amount: Decimal,
    pub is_paid: bool,
    pub paid_at: Option<DateTime<Utc>>,
    pub description: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl From<group_orphan_payment::Model> for OrphanPaymentResponse {
    fn from(model: group_orphan_payment::Model) -> Self {
        Self {
            id: model.id,
            group_id: model.group_id,
            month: model.month,
            year: model.year,
            amount: model.amount,
            is_paid: model.is_paid,
            paid_at: model.paid_at,
            description: model.description,
            created_at: model.created_at,
        }
    }
}

/// Get a group's recorded disbursements
#[utoipa::path(
    get,
    path = "/api/v1/groups/{group_id}/orphan-payments",
    tag = "payments",
    params(
        ("group_id" = i32, Path, description = "Group ID"),
        ("month" = Option<i32>, Query, description = "Filter by month (1-12)"),
        ("year" = Option<i32>, Query, description = "Filter by year"),
    ),
    responses(
        (status = 200, description = "Disbursements retrieved successfully", body = ApiResponse<Vec<OrphanPaymentResponse>>),
        (status = 404, description = "Group not found", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    )
)]
#[instrument(skip(state))]
pub async fn get_orphan_payments(
    Path(group_id): Path<i32>,
    Query(query): Query<OrphanPaymentsQuery>,
    State(state): State<AppState>,
) -> Result<Json<ApiResponse<Vec<OrphanPaymentResponse>>>, StatusCode> {
    trace!("Entering get_orphan_payments function for group_id: {}", group_id);

    let group_exists = group::Entity::find_by_id(group_id)
        .count(&state.db)
        .await
        .map_err(|_| StatusCode::INTERNAL_SERVER_ERROR)?
        > 0;
    if !group_exists {
        warn!("Group with ID {} not found", group_id);
        return Err(StatusCode::NOT_FOUND);
    }

    let mut finder = group_orphan_payment::Entity::find()
        .filter(group_orphan_payment::Column::GroupId.eq(group_id));
    if let Some(month) = query.month {
        finder = finder.filter(group_orphan_payment::Column::Month.eq(month));
    }
    if let Some(year) = query.year {
        finder = finder.filter(group_orphan_payment::Column::Year.eq(year));
    }

    match finder
        .order_by_desc(group_orphan_payment::Column::Year)
        .order_by_desc(group_orphan_payment::Column::Month)
        .all(&state.db)
        .await
    {
        Ok(rows) => {
            debug!("Retrieved {} disbursements for group {}", rows.len(), group_id);
            let response = ApiResponse {
                data: rows.into_iter().map(OrphanPaymentResponse::from).collect(),
                message: "Disbursements retrieved successfully".to_string(),
                success: true,
            };
            Ok(Json(response))
        }
        Err(db_error) => {
            error!("Failed to retrieve disbursements for group {}: {}", group_id, db_error);
            Err(StatusCode::INTERNAL_SERVER_ERROR)
        }
    }
}

/// Record a group's monthly disbursement
///
/// Upserts on the (group, month, year) key and invalidates the cached
/// dashboard.
#[utoipa::path(
    post,
    path = "/api/v1/groups/{group_id}/orphan-payments",
    tag = "payments",
    params(
        ("group_id" = i32, Path, description = "Group ID"),
    ),
    request_body = RecordOrphanPaymentRequest,
    responses(
        (status = 200, description = "Disbursement recorded successfully", body = ApiResponse<OrphanPaymentResponse>),
        (status = 400, description = "Invalid request", body = ErrorResponse),
        (status = 404, description = "Group not found", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    )
)]
#[instrument(skip(state))]
pub async fn record_orphan_payment(
    Path(group_id): Path<i32>,
    State(state): State<AppState>,
    Json(request): Json<RecordOrphanPaymentRequest>,
) -> Result<Json<ApiResponse<OrphanPaymentResponse>>, StatusCode> {
    trace!("Entering record_orphan_payment function for group_id: {}", group_id);
    debug!("Recording disbursement: group {}, {}-{}, amount {}",
           group_id, request.year, request.month, request.amount);

    if MonthRef::new(request.year, request.month).is_none() {
        warn!("Rejecting disbursement with invalid month: {}", request.month);
        return Err(StatusCode::BAD_REQUEST);
    }
    if request.amount <= Decimal::ZERO {
        warn!("Rejecting disbursement with non-positive amount: {}", request.amount);
        return Err(StatusCode::BAD_REQUEST);
    }

    let group_exists = group::Entity::find_by_id(group_id)
        .count(&state.db)
        .await
        .map_err(|_| StatusCode::INTERNAL_SERVER_ERROR)?
        > 0;
    if !group_exists {
        warn!("Group with ID {} not found", group_id);
        return Err(StatusCode::NOT_FOUND);
    }

    let existing = group_orphan_payment::Entity::find()
        .filter(group_orphan_payment::Column::GroupId.eq(group_id))
        .filter(group_orphan_payment::Column::Month.eq(request.month))
        .filter(group_orphan_payment::Column::Year.eq(request.year))
        .one(&state.db)
        .await
        .map_err(|db_error| {
            error!("Failed to lookup disbursement for upsert: {}", db_error);
            StatusCode::INTERNAL_SERVER_ERROR
        })?;

    let paid_at = request.is_paid.then(Utc::now);
    let saved = match existing {
        Some(row) => {
            debug!("Updating existing disbursement row {}", row.id);
            let mut active: group_orphan_payment::ActiveModel = row.into();
            active.amount = Set(request.amount);
            active.is_paid = Set(request.is_paid);
            active.paid_at = Set(paid_at);
            active.description = Set(request.description.clone());
            active.update(&state.db).await
        }
        None => {
            debug!("Inserting new disbursement row");
            let active = group_orphan_payment::ActiveModel {
                group_id: Set(group_id),
                month: Set(request.month),
                year: Set(request.year),
                amount: Set(request.amount),
                is_paid: Set(request.is_paid),
                paid_at: Set(paid_at),
                description: Set(request.description.clone()),
                created_at: Set(Utc::now()),
                ..Default::default()
            };
            active.insert(&state.db).await
        }
    };

    match saved {
        Ok(row) => {
            info!("Disbursement recorded: group {}, {}-{}, is_paid {}",
                  row.group_id, row.year, row.month, row.is_paid);
            state.cache.invalidate(DASHBOARD_CACHE_KEY).await;
            let response = ApiResponse {
                data: OrphanPaymentResponse::from(row),
                message: "Disbursement recorded successfully".to_string(),
                success: true,
            };
            Ok(Json(response))
        }
        Err(db_error) => {
            error!("Failed to record disbursement for group {}: {}", group_id, db_error);
            Err(StatusCode::INTERNAL_SERVER_ERROR)
        }
    }
}
