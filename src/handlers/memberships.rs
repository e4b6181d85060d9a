use crate::schemas::{ErrorResponse, ApiResponse, AppState};
use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::Json,
};
use compute::calendar::{validate_periods, Period};
use common::MonthRef;
use model::entities::{group, membership, membership_period, sponsor};
use rust_decimal::Decimal;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, EntityTrait, PaginatorTrait, QueryFilter, Set, TransactionTrait,
};
use serde::{Deserialize, Serialize};
use tracing::{debug, error, info, instrument, trace, warn};
use utoipa::ToSchema;

/// One obligation period in a request or response body
#[derive(Debug, Clone, Deserialize, Serialize, ToSchema)]
pub struct PeriodBody {
    /// First obligated month (1-12)
    pub from_month: i32,
    /// First obligated year
    pub from_year: i32,
    /// Last obligated month, absent for an open-ended period
    pub to_month: Option<i32>,
    /// Last obligated year, absent for an open-ended period
    pub to_year: Option<i32>,
}

impl From<membership_period::Model> for PeriodBody {
    fn from(model: membership_period::Model) -> Self {
        Self {
            from_month: model.from_month,
            from_year: model.from_year,
            to_month: model.to_month,
            to_year: model.to_year,
        }
    }
}

/// Request body for adding a sponsor to a group
#[derive(Debug, Deserialize, Serialize, ToSchema)]
pub struct AddMemberRequest {
    /// Sponsor to enroll
    pub sponsor_id: i32,
    /// Overrides the group's per-person fee when set
    pub custom_amount: Option<Decimal>,
    /// Initial obligation periods; may be set later via the periods endpoint
    pub periods: Option<Vec<PeriodBody>>,
}

/// Request body for updating a membership
#[derive(Debug, Deserialize, Serialize, ToSchema)]
pub struct UpdateMemberRequest {
    /// Overrides the group's per-person fee; explicit `null` reverts the
    /// member to the group default, an absent key leaves it unchanged
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        deserialize_with = "crate::schemas::double_option"
    )]
    #[schema(value_type = Option<Decimal>)]
    pub custom_amount: Option<Option<Decimal>>,
    /// Whether the membership participates in accrual
    pub is_active: Option<bool>,
}

/// Membership response model
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct MembershipResponse {
    pub id: i32,
    pub group_id: i32,
    pub sponsor_id: i32,
    pub custom_amount: Option<Decimal>,
    pub is_active: bool,
    pub periods: Vec<PeriodBody>,
}

/// Converts request bodies into calendar periods, rejecting out-of-range
/// months and half-set end bounds, then runs the calendar's overlap and
/// ordering validation.
fn periods_from_bodies(bodies: &[PeriodBody]) -> Result<Vec<Period>, StatusCode> {
    let mut periods = Vec::with_capacity(bodies.len());
    for body in bodies {
        let from = MonthRef::new(body.from_year, body.from_month).ok_or_else(|| {
            warn!("Rejecting period: invalid from month {}", body.from_month);
            StatusCode::BAD_REQUEST
        })?;
        let to = match (body.to_month, body.to_year) {
            (None, None) => None,
            (Some(m), Some(y)) => Some(MonthRef::new(y, m).ok_or_else(|| {
                warn!("Rejecting period: invalid to month {}", m);
                StatusCode::BAD_REQUEST
            })?),
            _ => {
                warn!("Rejecting period: to_month and to_year must be set together");
                return Err(StatusCode::BAD_REQUEST);
            }
        };
        periods.push(Period { from, to });
    }
    validate_periods(&periods).map_err(|engine_error| {
        warn!("Rejecting period list: {}", engine_error);
        StatusCode::BAD_REQUEST
    })?;
    Ok(periods)
}

async fn find_membership(
    state: &AppState,
    group_id: i32,
    sponsor_id: i32,
) -> Result<membership::Model, StatusCode> {
    match membership::Entity::find()
        .filter(membership::Column::GroupId.eq(group_id))
        .filter(membership::Column::SponsorId.eq(sponsor_id))
        .one(&state.db)
        .await
    {
        Ok(Some(membership_model)) => Ok(membership_model),
        Ok(None) => {
            warn!("No membership of sponsor {} in group {}", sponsor_id, group_id);
            Err(StatusCode::NOT_FOUND)
        }
        Err(db_error) => {
            error!("Failed to lookup membership of sponsor {} in group {}: {}",
                   sponsor_id, group_id, db_error);
            Err(StatusCode::INTERNAL_SERVER_ERROR)
        }
    }
}

async fn membership_periods(
    state: &AppState,
    membership_id: i32,
) -> Result<Vec<PeriodBody>, StatusCode> {
    membership_period::Entity::find()
        .filter(membership_period::Column::MembershipId.eq(membership_id))
        .all(&state.db)
        .await
        .map(|rows| rows.into_iter().map(PeriodBody::from).collect())
        .map_err(|db_error| {
            error!("Failed to load periods for membership {}: {}", membership_id, db_error);
            StatusCode::INTERNAL_SERVER_ERROR
        })
}

/// Enroll a sponsor in a group
#[utoipa::path(
    post,
    path = "/api/v1/groups/{group_id}/members",
    tag = "memberships",
    params(
        ("group_id" = i32, Path, description = "Group ID"),
    ),
    request_body = AddMemberRequest,
    responses(
        (status = 201, description = "Member added successfully", body = ApiResponse<MembershipResponse>),
        (status = 400, description = "Invalid period list or custom amount", body = ErrorResponse),
        (status = 404, description = "Group or sponsor not found", body = ErrorResponse),
        (status = 409, description = "Sponsor already a member", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    )
)]
#[instrument(skip(state))]
pub async fn add_member(
    Path(group_id): Path<i32>,
    State(state): State<AppState>,
    Json(request): Json<AddMemberRequest>,
) -> Result<(StatusCode, Json<ApiResponse<MembershipResponse>>), StatusCode> {
    trace!("Entering add_member function for group_id: {}", group_id);
    debug!("Adding sponsor {} to group {}", request.sponsor_id, group_id);

    // Periods and the rate override are validated before any write.
    if let Some(bodies) = &request.periods {
        periods_from_bodies(bodies)?;
    }
    if let Some(amount) = request.custom_amount {
        if amount <= Decimal::ZERO {
            warn!("Rejecting membership with non-positive custom amount: {}", amount);
            return Err(StatusCode::BAD_REQUEST);
        }
    }

    let group_exists = group::Entity::find_by_id(group_id)
        .count(&state.db)
        .await
        .map_err(|_| StatusCode::INTERNAL_SERVER_ERROR)?
        > 0;
    let sponsor_exists = sponsor::Entity::find_by_id(request.sponsor_id)
        .count(&state.db)
        .await
        .map_err(|_| StatusCode::INTERNAL_SERVER_ERROR)?
        > 0;
    if !group_exists || !sponsor_exists {
        warn!("Group {} or sponsor {} not found", group_id, request.sponsor_id);
        return Err(StatusCode::NOT_FOUND);
    }

    let already_member = membership::Entity::find()
        .filter(membership::Column::GroupId.eq(group_id))
        .filter(membership::Column::SponsorId.eq(request.sponsor_id))
        .count(&state.db)
        .await
        .map_err(|_| StatusCode::INTERNAL_SERVER_ERROR)?
        > 0;
    if already_member {
        warn!("Sponsor {} already a member of group {}", request.sponsor_id, group_id);
        return Err(StatusCode::CONFLICT);
    }

    let txn = state.db.begin().await.map_err(|db_error| {
        error!("Failed to open transaction: {}", db_error);
        StatusCode::INTERNAL_SERVER_ERROR
    })?;

    let new_membership = membership::ActiveModel {
        group_id: Set(group_id),
        sponsor_id: Set(request.sponsor_id),
        custom_amount: Set(request.custom_amount),
        is_active: Set(true),
        ..Default::default()
    };
    let membership_model = new_membership.insert(&txn).await.map_err(|db_error| {
        error!("Failed to add sponsor {} to group {}: {}", request.sponsor_id, group_id, db_error);
        StatusCode::INTERNAL_SERVER_ERROR
    })?;

    let mut period_bodies = Vec::new();
    if let Some(bodies) = request.periods {
        for body in &bodies {
            let row = membership_period::ActiveModel {
                membership_id: Set(membership_model.id),
                from_month: Set(body.from_month),
                from_year: Set(body.from_year),
                to_month: Set(body.to_month),
                to_year: Set(body.to_year),
                ..Default::default()
            };
            row.insert(&txn).await.map_err(|db_error| {
                error!("Failed to insert period for membership {}: {}",
                       membership_model.id, db_error);
                StatusCode::INTERNAL_SERVER_ERROR
            })?;
        }
        period_bodies = bodies;
    }

    txn.commit().await.map_err(|db_error| {
        error!("Failed to commit membership transaction: {}", db_error);
        StatusCode::INTERNAL_SERVER_ERROR
    })?;

    info!("Sponsor {} enrolled in group {} as membership {}",
          request.sponsor_id, group_id, membership_model.id);
    let response = ApiResponse {
        data: MembershipResponse {
            id: membership_model.id,
            group_id: membership_model.group_id,
            sponsor_id: membership_model.sponsor_id,
            custom_amount: membership_model.custom_amount,
            is_active: membership_model.is_active,
            periods: period_bodies,
        },
        message: "Member added successfully".to_string(),
        success: true,
    };
    Ok((StatusCode::CREATED, Json(response)))
}

/// Update a membership
#[utoipa::path(
    patch,
    path = "/api/v1/groups/{group_id}/members/{sponsor_id}",
    tag = "memberships",
    params(
        ("group_id" = i32, Path, description = "Group ID"),
        ("sponsor_id" = i32, Path, description = "Sponsor ID"),
    ),
    request_body = UpdateMemberRequest,
    responses(
        (status = 200, description = "Membership updated successfully", body = ApiResponse<MembershipResponse>),
        (status = 400, description = "Invalid custom amount", body = ErrorResponse),
        (status = 404, description = "Membership not found", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    )
)]
#[instrument(skip(state))]
pub async fn update_member(
    Path((group_id, sponsor_id)): Path<(i32, i32)>,
    State(state): State<AppState>,
    Json(request): Json<UpdateMemberRequest>,
) -> Result<Json<ApiResponse<MembershipResponse>>, StatusCode> {
    trace!("Entering update_member function");

    if let Some(Some(amount)) = request.custom_amount {
        if amount <= Decimal::ZERO {
            warn!("Rejecting non-positive custom amount for sponsor {} in group {}: {}",
                  sponsor_id, group_id, amount);
            return Err(StatusCode::BAD_REQUEST);
        }
    }

    let existing = find_membership(&state, group_id, sponsor_id).await?;
    let membership_id = existing.id;

    let mut membership_active: membership::ActiveModel = existing.into();
    if let Some(amount) = request.custom_amount {
        membership_active.custom_amount = Set(amount);
    }
    if let Some(is_active) = request.is_active {
        membership_active.is_active = Set(is_active);
    }

    match membership_active.update(&state.db).await {
        Ok(updated) => {
            info!("Membership {} updated successfully", membership_id);
            let periods = membership_periods(&state, membership_id).await?;
            let response = ApiResponse {
                data: MembershipResponse {
                    id: updated.id,
                    group_id: updated.group_id,
                    sponsor_id: updated.sponsor_id,
                    custom_amount: updated.custom_amount,
                    is_active: updated.is_active,
                    periods,
                },
                message: "Membership updated successfully".to_string(),
                success: true,
            };
            Ok(Json(response))
        }
        Err(db_error) => {
            error!("Failed to update membership {}: {}", membership_id, db_error);
            Err(StatusCode::INTERNAL_SERVER_ERROR)
        }
    }
}

/// Remove a sponsor from a group
///
/// The membership's periods are removed by cascade; payment ledger rows are
/// kept as history.
#[utoipa::path(
    delete,
    path = "/api/v1/groups/{group_id}/members/{sponsor_id}",
    tag = "memberships",
    params(
        ("group_id" = i32, Path, description = "Group ID"),
        ("sponsor_id" = i32, Path, description = "Sponsor ID"),
    ),
    responses(
        (status = 200, description = "Member removed successfully", body = ApiResponse<String>),
        (status = 404, description = "Membership not found", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    )
)]
#[instrument(skip(state))]
pub async fn remove_member(
    Path((group_id, sponsor_id)): Path<(i32, i32)>,
    State(state): State<AppState>,
) -> Result<Json<ApiResponse<String>>, StatusCode> {
    trace!("Entering remove_member function");

    let existing = find_membership(&state, group_id, sponsor_id).await?;

    match membership::Entity::delete_by_id(existing.id).exec(&state.db).await {
        Ok(_) => {
            info!("Sponsor {} removed from group {}", sponsor_id, group_id);
            let response = ApiResponse {
                data: format!("Sponsor {} removed from group {}", sponsor_id, group_id),
                message: "Member removed successfully".to_string(),
                success: true,
            };
            Ok(Json(response))
        }
        Err(db_error) => {
            error!("Failed to remove membership {}: {}", existing.id, db_error);
            Err(StatusCode::INTERNAL_SERVER_ERROR)
        }
    }
}

/// Replace a membership's obligation periods
///
/// The whole list is validated before any write: months must be 1-12,
/// periods must not overlap, and an open-ended period must come last.
#[utoipa::path(
    put,
    path = "/api/v1/groups/{group_id}/members/{sponsor_id}/periods",
    tag = "memberships",
    params(
        ("group_id" = i32, Path, description = "Group ID"),
        ("sponsor_id" = i32, Path, description = "Sponsor ID"),
    ),
    request_body = Vec<PeriodBody>,
    responses(
        (status = 200, description = "Periods replaced successfully", body = ApiResponse<MembershipResponse>),
        (status = 400, description = "Invalid period list", body = ErrorResponse),
        (status = 404, description = "Membership not found", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    )
)]
#[instrument(skip(state, request))]
pub async fn set_member_periods(
    Path((group_id, sponsor_id)): Path<(i32, i32)>,
    State(state): State<AppState>,
    Json(request): Json<Vec<PeriodBody>>,
) -> Result<Json<ApiResponse<MembershipResponse>>, StatusCode> {
    trace!("Entering set_member_periods function");
    debug!("Replacing {} periods for sponsor {} in group {}",
           request.len(), sponsor_id, group_id);

    periods_from_bodies(&request)?;
    let existing = find_membership(&state, group_id, sponsor_id).await?;

    let txn = state.db.begin().await.map_err(|db_error| {
        error!("Failed to open transaction: {}", db_error);
        StatusCode::INTERNAL_SERVER_ERROR
    })?;

    membership_period::Entity::delete_many()
        .filter(membership_period::Column::MembershipId.eq(existing.id))
        .exec(&txn)
        .await
        .map_err(|db_error| {
            error!("Failed to clear periods for membership {}: {}", existing.id, db_error);
            StatusCode::INTERNAL_SERVER_ERROR
        })?;

    for body in &request {
        let row = membership_period::ActiveModel {
            membership_id: Set(existing.id),
            from_month: Set(body.from_month),
            from_year: Set(body.from_year),
            to_month: Set(body.to_month),
            to_year: Set(body.to_year),
            ..Default::default()
        };
        row.insert(&txn).await.map_err(|db_error| {
            error!("Failed to insert period for membership {}: {}", existing.id, db_error);
            StatusCode::INTERNAL_SERVER_ERROR
        })?;
    }

    txn.commit().await.map_err(|db_error| {
        error!("Failed to commit period transaction: {}", db_error);
        StatusCode::INTERNAL_SERVER_ERROR
    })?;

    info!("Replaced periods for membership {} ({} periods)", existing.id, request.len());
    let response = ApiResponse {
        data: MembershipResponse {
            id: existing.id,
            group_id: existing.group_id,
            sponsor_id: existing.sponsor_id,
            custom_amount: existing.custom_amount,
            is_active: existing.is_active,
            periods: request,
        },
        message: "Periods replaced successfully".to_string(),
        success: true,
    };
    Ok(Json(response))
}
