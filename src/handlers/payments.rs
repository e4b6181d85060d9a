use crate::schemas::{ErrorResponse, ApiResponse, AppState, DASHBOARD_CACHE_KEY};
use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::Json,
};
use chrono::{DateTime, Utc};
use common::MonthRef;
use model::entities::payment;
use rust_decimal::Decimal;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, EntityTrait, QueryFilter, QueryOrder, Set,
};
use serde::{Deserialize, Serialize};
use tracing::{debug, error, info, instrument, trace, warn};
use utoipa::ToSchema;

/// Request body for recording a payment
///
/// Upserts on the (sponsor, group, month, year) key: posting the same month
/// twice updates the existing row instead of creating a duplicate.
#[derive(Debug, Deserialize, Serialize, ToSchema)]
pub struct RecordPaymentRequest {
    pub sponsor_id: i32,
    pub group_id: i32,
    /// Calendar month (1-12)
    pub month: i32,
    pub year: i32,
    /// Amount paid or owed (must be positive)
    pub amount: Decimal,
    /// Whether the month is settled
    pub is_paid: bool,
    /// Free-form note
    pub description: Option<String>,
}

/// Query parameters for the payment ledger
#[derive(Debug, Deserialize, ToSchema)]
pub struct PaymentsQuery {
    pub sponsor_id: Option<i32>,
    pub group_id: Option<i32>,
    /// Calendar month (1-12)
    pub month: Option<i32>,
    pub year: Option<i32>,
}

/// Full ledger key identifying one payment row
#[derive(Debug, Deserialize, ToSchema)]
pub struct PaymentKeyQuery {
    pub sponsor_id: i32,
    pub group_id: i32,
    /// Calendar month (1-12)
    pub month: i32,
    pub year: i32,
}

/// Payment response model
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct PaymentResponse {
    pub id: i32,
    pub sponsor_id: i32,
    pub group_id: i32,
    pub month: i32,
    pub year: i32,
    pub amount: Decimal,
    pub is_paid: bool,
    pub paid_at: Option<DateTime<Utc>>,
    pub description: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl From<payment::Model> for PaymentResponse {
    fn from(model: payment::Model) -> Self {
        Self {
            id: model.id,
            sponsor_id: model.sponsor_id,
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

/// Record a payment
///
/// Upserts on the unique ledger key and invalidates the cached dashboard so
/// the next dashboard read reflects the new totals.
#[utoipa::path(
    post,
    path = "/api/v1/payments",
    tag = "payments",
    request_body = RecordPaymentRequest,
    responses(
        (status = 200, description = "Payment recorded successfully", body = ApiResponse<PaymentResponse>),
        (status = 400, description = "Invalid request", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    )
)]
#[instrument(skip(state))]
pub async fn record_payment(
    State(state): State<AppState>,
    Json(request): Json<RecordPaymentRequest>,
) -> Result<Json<ApiResponse<PaymentResponse>>, StatusCode> {
    trace!("Entering record_payment function");
    debug!("Recording payment: sponsor {}, group {}, {}-{}, amount {}",
           request.sponsor_id, request.group_id, request.year, request.month, request.amount);

    if MonthRef::new(request.year, request.month).is_none() {
        warn!("Rejecting payment with invalid month: {}", request.month);
        return Err(StatusCode::BAD_REQUEST);
    }
    if request.amount <= Decimal::ZERO {
        warn!("Rejecting payment with non-positive amount: {}", request.amount);
        return Err(StatusCode::BAD_REQUEST);
    }

    let existing = payment::Entity::find()
        .filter(payment::Column::SponsorId.eq(request.sponsor_id))
        .filter(payment::Column::GroupId.eq(request.group_id))
        .filter(payment::Column::Month.eq(request.month))
        .filter(payment::Column::Year.eq(request.year))
        .one(&state.db)
        .await
        .map_err(|db_error| {
            error!("Failed to lookup payment for upsert: {}", db_error);
            StatusCode::INTERNAL_SERVER_ERROR
        })?;

    let paid_at = request.is_paid.then(Utc::now);
    let saved = match existing {
        Some(row) => {
            debug!("Updating existing payment row {}", row.id);
            let mut active: payment::ActiveModel = row.into();
            active.amount = Set(request.amount);
            active.is_paid = Set(request.is_paid);
            active.paid_at = Set(paid_at);
            active.description = Set(request.description.clone());
            active.update(&state.db).await
        }
        None => {
            debug!("Inserting new payment row");
            let active = payment::ActiveModel {
                sponsor_id: Set(request.sponsor_id),
                group_id: Set(request.group_id),
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
        Ok(payment_model) => {
            info!("Payment recorded: sponsor {}, group {}, {}-{}, is_paid {}",
                  payment_model.sponsor_id, payment_model.group_id,
                  payment_model.year, payment_model.month, payment_model.is_paid);

            // The dashboard must never serve stale totals after a write.
            state.cache.invalidate(DASHBOARD_CACHE_KEY).await;

            let response = ApiResponse {
                data: PaymentResponse::from(payment_model),
                message: "Payment recorded successfully".to_string(),
                success: true,
            };
            Ok(Json(response))
        }
        Err(db_error) => {
            error!("Failed to record payment: {}", db_error);
            Err(StatusCode::INTERNAL_SERVER_ERROR)
        }
    }
}

/// Get payment ledger rows
///
/// With all four key fields the result is the single matching row; with a
/// partial filter it is a list ordered newest month first.
#[utoipa::path(
    get,
    path = "/api/v1/payments",
    tag = "payments",
    params(
        ("sponsor_id" = Option<i32>, Query, description = "Filter by sponsor"),
        ("group_id" = Option<i32>, Query, description = "Filter by group"),
        ("month" = Option<i32>, Query, description = "Filter by month (1-12)"),
        ("year" = Option<i32>, Query, description = "Filter by year"),
    ),
    responses(
        (status = 200, description = "Payments retrieved successfully", body = ApiResponse<Vec<PaymentResponse>>),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    )
)]
#[instrument(skip(state))]
pub async fn get_payments(
    Query(query): Query<PaymentsQuery>,
    State(state): State<AppState>,
) -> Result<Json<ApiResponse<Vec<PaymentResponse>>>, StatusCode> {
    trace!("Entering get_payments function");

    let mut finder = payment::Entity::find();
    if let Some(sponsor_id) = query.sponsor_id {
        finder = finder.filter(payment::Column::SponsorId.eq(sponsor_id));
    }
    if let Some(group_id) = query.group_id {
        finder = finder.filter(payment::Column::GroupId.eq(group_id));
    }
    if let Some(month) = query.month {
        finder = finder.filter(payment::Column::Month.eq(month));
    }
    if let Some(year) = query.year {
        finder = finder.filter(payment::Column::Year.eq(year));
    }

    match finder
        .order_by_desc(payment::Column::Year)
        .order_by_desc(payment::Column::Month)
        .all(&state.db)
        .await
    {
        Ok(payments) => {
            debug!("Retrieved {} payments from database", payments.len());
            let response = ApiResponse {
                data: payments.into_iter().map(PaymentResponse::from).collect(),
                message: "Payments retrieved successfully".to_string(),
                success: true,
            };
            Ok(Json(response))
        }
        Err(db_error) => {
            error!("Failed to retrieve payments from database: {}", db_error);
            Err(StatusCode::INTERNAL_SERVER_ERROR)
        }
    }
}

/// Delete a payment by its full ledger key
#[utoipa::path(
    delete,
    path = "/api/v1/payments",
    tag = "payments",
    params(
        ("sponsor_id" = i32, Query, description = "Sponsor ID"),
        ("group_id" = i32, Query, description = "Group ID"),
        ("month" = i32, Query, description = "Month (1-12)"),
        ("year" = i32, Query, description = "Year"),
    ),
    responses(
        (status = 200, description = "Payment deleted successfully", body = ApiResponse<String>),
        (status = 404, description = "Payment not found", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    )
)]
#[instrument(skip(state))]
pub async fn delete_payment(
    Query(query): Query<PaymentKeyQuery>,
    State(state): State<AppState>,
) -> Result<Json<ApiResponse<String>>, StatusCode> {
    trace!("Entering delete_payment function");
    debug!("Deleting payment: sponsor {}, group {}, {}-{}",
           query.sponsor_id, query.group_id, query.year, query.month);

    let delete_result = payment::Entity::delete_many()
        .filter(payment::Column::SponsorId.eq(query.sponsor_id))
        .filter(payment::Column::GroupId.eq(query.group_id))
        .filter(payment::Column::Month.eq(query.month))
        .filter(payment::Column::Year.eq(query.year))
        .exec(&state.db)
        .await
        .map_err(|db_error| {
            error!("Failed to delete payment: {}", db_error);
            StatusCode::INTERNAL_SERVER_ERROR
        })?;

    if delete_result.rows_affected > 0 {
        info!("Payment deleted: sponsor {}, group {}, {}-{}",
              query.sponsor_id, query.group_id, query.year, query.month);
        state.cache.invalidate(DASHBOARD_CACHE_KEY).await;
        let response = ApiResponse {
            data: format!(
                "Payment for sponsor {} in group {} ({}-{:02}) deleted",
                query.sponsor_id, query.group_id, query.year, query.month
            ),
            message: "Payment deleted successfully".to_string(),
            success: true,
        };
        Ok(Json(response))
    } else {
        warn!("No payment found for sponsor {}, group {}, {}-{}",
              query.sponsor_id, query.group_id, query.year, query.month);
        Err(StatusCode::NOT_FOUND)
    }
}
