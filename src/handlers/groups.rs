use crate::handlers::orphan_payments::OrphanPaymentResponse;
use crate::schemas::{ErrorResponse, ApiResponse, AppState};
use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::Json,
};
use chrono::{DateTime, Utc};
use common::MonthRef;
use model::entities::{group, group_orphan_payment, membership, orphan, orphan_assignment, sponsor};
use rust_decimal::Decimal;
use sea_orm::{ActiveModelTrait, ColumnTrait, EntityTrait, PaginatorTrait, QueryFilter, Set};
use serde::{Deserialize, Serialize};
use tracing::{debug, error, info, instrument, trace, warn};
use utoipa::ToSchema;

/// Request body for creating a new group
#[derive(Debug, Deserialize, Serialize, ToSchema)]
pub struct CreateGroupRequest {
    /// Group name (unique)
    pub name: String,
    /// Default monthly amount per member
    pub per_person_fee: Option<Decimal>,
    /// Month accrual starts from (1-12)
    pub start_month: Option<i32>,
    /// Year accrual starts from
    pub start_year: Option<i32>,
}

/// Request body for updating a group
#[derive(Debug, Deserialize, Serialize, ToSchema)]
pub struct UpdateGroupRequest {
    /// Group name (unique)
    pub name: Option<String>,
    /// Default monthly amount per member; explicit `null` clears it,
    /// an absent key leaves it unchanged
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        deserialize_with = "crate::schemas::double_option"
    )]
    #[schema(value_type = Option<Decimal>)]
    pub per_person_fee: Option<Option<Decimal>>,
    /// Month accrual starts from (1-12)
    pub start_month: Option<i32>,
    /// Year accrual starts from
    pub start_year: Option<i32>,
}

/// Group response model
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct GroupResponse {
    pub id: i32,
    pub name: String,
    pub per_person_fee: Option<Decimal>,
    pub start_month: Option<i32>,
    pub start_year: Option<i32>,
    pub created_at: DateTime<Utc>,
}

impl From<group::Model> for GroupResponse {
    fn from(model: group::Model) -> Self {
        Self {
            id: model.id,
            name: model.name,
            per_person_fee: model.per_person_fee,
            start_month: model.start_month,
            start_year: model.start_year,
            created_at: model.created_at,
        }
    }
}

/// One member row in the group roster
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct GroupMemberEntry {
    pub membership_id: i32,
    pub sponsor_id: i32,
    pub sponsor_name: String,
    pub custom_amount: Option<Decimal>,
    pub is_active: bool,
}

/// One assigned orphan in the group roster
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct GroupOrphanEntry {
    pub orphan_id: i32,
    pub name: String,
    pub monthly_fee: Decimal,
}

/// Full group roster: members, assigned orphans, and recorded disbursements
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct GroupDetailResponse {
    #[serde(flatten)]
    pub group: GroupResponse,
    pub members: Vec<GroupMemberEntry>,
    pub orphans: Vec<GroupOrphanEntry>,
    /// Sum of the assigned orphans' monthly fees
    pub total_monthly_amount: Decimal,
    pub orphan_payments: Vec<OrphanPaymentResponse>,
}

/// Rejects a start month/year pair where only one half is set or the month
/// is out of range.
fn validate_start(month: Option<i32>, year: Option<i32>) -> Result<(), StatusCode> {
    match (month, year) {
        (None, None) => Ok(()),
        (Some(m), Some(y)) => {
            if MonthRef::new(y, m).is_none() {
                warn!("Rejecting group start {}-{}: invalid month", y, m);
                return Err(StatusCode::BAD_REQUEST);
            }
            Ok(())
        }
        _ => {
            warn!("Rejecting group start: month and year must be set together");
            Err(StatusCode::BAD_REQUEST)
        }
    }
}

/// Returns true when another group already uses the name.
async fn name_taken(state: &AppState, name: &str, exclude_id: Option<i32>) -> Result<bool, StatusCode> {
    let mut query = group::Entity::find().filter(group::Column::Name.eq(name));
    if let Some(id) = exclude_id {
        query = query.filter(group::Column::Id.ne(id));
    }
    match query.count(&state.db).await {
        Ok(count) => Ok(count > 0),
        Err(db_error) => {
            error!("Failed to check name uniqueness for '{}': {}", name, db_error);
            Err(StatusCode::INTERNAL_SERVER_ERROR)
        }
    }
}

/// Create a new group
#[utoipa::path(
    post,
    path = "/api/v1/groups",
    tag = "groups",
    request_body = CreateGroupRequest,
    responses(
        (status = 201, description = "Group created successfully", body = ApiResponse<GroupResponse>),
        (status = 400, description = "Invalid request", body = ErrorResponse),
        (status = 409, description = "Group name already in use", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    )
)]
#[instrument(skip(state))]
pub async fn create_group(
    State(state): State<AppState>,
    Json(request): Json<CreateGroupRequest>,
) -> Result<(StatusCode, Json<ApiResponse<GroupResponse>>), StatusCode> {
    trace!("Entering create_group function");
    debug!("Creating group with name: {}", request.name);

    if request.name.trim().is_empty() {
        warn!("Rejecting group with empty name");
        return Err(StatusCode::BAD_REQUEST);
    }
    if let Some(fee) = request.per_person_fee {
        if fee <= Decimal::ZERO {
            warn!("Rejecting group with non-positive per-person fee: {}", fee);
            return Err(StatusCode::BAD_REQUEST);
        }
    }
    validate_start(request.start_month, request.start_year)?;
    if name_taken(&state, &request.name, None).await? {
        warn!("Group name '{}' already in use", request.name);
        return Err(StatusCode::CONFLICT);
    }

    let new_group = group::ActiveModel {
        name: Set(request.name.clone()),
        per_person_fee: Set(request.per_person_fee),
        start_month: Set(request.start_month),
        start_year: Set(request.start_year),
        created_at: Set(Utc::now()),
        ..Default::default()
    };

    match new_group.insert(&state.db).await {
        Ok(group_model) => {
            info!("Group created successfully with ID: {}, name: {}",
                  group_model.id, group_model.name);
            let response = ApiResponse {
                data: GroupResponse::from(group_model),
                message: "Group created successfully".to_string(),
                success: true,
            };
            Ok((StatusCode::CREATED, Json(response)))
        }
        Err(db_error) => {
            error!("Failed to create group '{}': {}", request.name, db_error);
            Err(StatusCode::INTERNAL_SERVER_ERROR)
        }
    }
}

/// Get all groups
#[utoipa::path(
    get,
    path = "/api/v1/groups",
    tag = "groups",
    responses(
        (status = 200, description = "Groups retrieved successfully", body = ApiResponse<Vec<GroupResponse>>),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    )
)]
#[instrument(skip(state))]
pub async fn get_groups(
    State(state): State<AppState>,
) -> Result<Json<ApiResponse<Vec<GroupResponse>>>, StatusCode> {
    trace!("Entering get_groups function");

    match group::Entity::find().all(&state.db).await {
        Ok(groups) => {
            debug!("Retrieved {} groups from database", groups.len());
            let response = ApiResponse {
                data: groups.into_iter().map(GroupResponse::from).collect(),
                message: "Groups retrieved successfully".to_string(),
                success: true,
            };
            Ok(Json(response))
        }
        Err(db_error) => {
            error!("Failed to retrieve groups from database: {}", db_error);
            Err(StatusCode::INTERNAL_SERVER_ERROR)
        }
    }
}

/// Get a group with its full roster
#[utoipa::path(
    get,
    path = "/api/v1/groups/{group_id}",
    tag = "groups",
    params(
        ("group_id" = i32, Path, description = "Group ID"),
    ),
    responses(
        (status = 200, description = "Group retrieved successfully", body = ApiResponse<GroupDetailResponse>),
        (status = 404, description = "Group not found", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    )
)]
#[instrument(skip(state))]
pub async fn get_group(
    Path(group_id): Path<i32>,
    State(state): State<AppState>,
) -> Result<Json<ApiResponse<GroupDetailResponse>>, StatusCode> {
    trace!("Entering get_group function for group_id: {}", group_id);

    let group_model = match group::Entity::find_by_id(group_id).one(&state.db).await {
        Ok(Some(group_model)) => group_model,
        Ok(None) => {
            warn!("Group with ID {} not found", group_id);
            return Err(StatusCode::NOT_FOUND);
        }
        Err(db_error) => {
            error!("Failed to retrieve group with ID {}: {}", group_id, db_error);
            return Err(StatusCode::INTERNAL_SERVER_ERROR);
        }
    };

    let memberships = membership::Entity::find()
        .filter(membership::Column::GroupId.eq(group_id))
        .find_also_related(sponsor::Entity)
        .all(&state.db)
        .await
        .map_err(|db_error| {
            error!("Failed to load members for group {}: {}", group_id, db_error);
            StatusCode::INTERNAL_SERVER_ERROR
        })?;

    let members = memberships
        .into_iter()
        .map(|(m, s)| GroupMemberEntry {
            membership_id: m.id,
            sponsor_id: m.sponsor_id,
            sponsor_name: s.map(|s| s.name).unwrap_or_default(),
            custom_amount: m.custom_amount,
            is_active: m.is_active,
        })
        .collect();

    let assignments = orphan_assignment::Entity::find()
        .filter(orphan_assignment::Column::GroupId.eq(group_id))
        .find_also_related(orphan::Entity)
        .all(&state.db)
        .await
        .map_err(|db_error| {
            error!("Failed to load orphans for group {}: {}", group_id, db_error);
            StatusCode::INTERNAL_SERVER_ERROR
        })?;

    let orphans: Vec<GroupOrphanEntry> = assignments
        .into_iter()
        .filter_map(|(a, o)| {
            o.map(|o| GroupOrphanEntry {
                orphan_id: a.orphan_id,
                name: o.name,
                monthly_fee: o.monthly_fee,
            })
        })
        .collect();
    let total_monthly_amount = orphans.iter().map(|o| o.monthly_fee).sum();

    let orphan_payments = group_orphan_payment::Entity::find()
        .filter(group_orphan_payment::Column::GroupId.eq(group_id))
        .all(&state.db)
        .await
        .map_err(|db_error| {
            error!("Failed to load disbursements for group {}: {}", group_id, db_error);
            StatusCode::INTERNAL_SERVER_ERROR
        })?
        .into_iter()
        .map(OrphanPaymentResponse::from)
        .collect();

    let response = ApiResponse {
        data: GroupDetailResponse {
            group: GroupResponse::from(group_model),
            members,
            orphans,
            total_monthly_amount,
            orphan_payments,
        },
        message: "Group retrieved successfully".to_string(),
        success: true,
    };
    Ok(Json(response))
}

/// Update a group
#[utoipa::path(
    put,
    path = "/api/v1/groups/{group_id}",
    tag = "groups",
    params(
        ("group_id" = i32, Path, description = "Group ID"),
    ),
    request_body = UpdateGroupRequest,
    responses(
        (status = 200, description = "Group updated successfully", body = ApiResponse<GroupResponse>),
        (status = 404, description = "Group not found", body = ErrorResponse),
        (status = 400, description = "Invalid request", body = ErrorResponse),
        (status = 409, description = "Group name already in use", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    )
)]
#[instrument(skip(state))]
pub async fn update_group(
    Path(group_id): Path<i32>,
    State(state): State<AppState>,
    Json(request): Json<UpdateGroupRequest>,
) -> Result<Json<ApiResponse<GroupResponse>>, StatusCode> {
    trace!("Entering update_group function for group_id: {}", group_id);

    let existing = match group::Entity::find_by_id(group_id).one(&state.db).await {
        Ok(Some(group_model)) => group_model,
        Ok(None) => {
            warn!("Group with ID {} not found for update", group_id);
            return Err(StatusCode::NOT_FOUND);
        }
        Err(db_error) => {
            error!("Failed to lookup group with ID {} for update: {}", group_id, db_error);
            return Err(StatusCode::INTERNAL_SERVER_ERROR);
        }
    };

    if let Some(ref name) = request.name {
        if name.trim().is_empty() {
            warn!("Rejecting empty name for group ID {}", group_id);
            return Err(StatusCode::BAD_REQUEST);
        }
        if name_taken(&state, name, Some(group_id)).await? {
            warn!("Group name '{}' already in use", name);
            return Err(StatusCode::CONFLICT);
        }
    }
    if let Some(Some(fee)) = request.per_person_fee {
        if fee <= Decimal::ZERO {
            warn!("Rejecting non-positive per-person fee for group ID {}: {}", group_id, fee);
            return Err(StatusCode::BAD_REQUEST);
        }
    }
    let effective_month = request.start_month.or(existing.start_month);
    let effective_year = request.start_year.or(existing.start_year);
    validate_start(effective_month, effective_year)?;

    let mut group_active: group::ActiveModel = existing.into();
    if let Some(name) = request.name {
        group_active.name = Set(name);
    }
    if let Some(fee) = request.per_person_fee {
        group_active.per_person_fee = Set(fee);
    }
    if let Some(month) = request.start_month {
        group_active.start_month = Set(Some(month));
    }
    if let Some(year) = request.start_year {
        group_active.start_year = Set(Some(year));
    }

    match group_active.update(&state.db).await {
        Ok(updated) => {
            info!("Group with ID {} updated successfully", group_id);
            let response = ApiResponse {
                data: GroupResponse::from(updated),
                message: "Group updated successfully".to_string(),
                success: true,
            };
            Ok(Json(response))
        }
        Err(db_error) => {
            error!("Failed to update group with ID {}: {}", group_id, db_error);
            Err(StatusCode::INTERNAL_SERVER_ERROR)
        }
    }
}

/// Delete a group
///
/// Rejected while the roster is non-empty; members and orphan assignments
/// must be removed first.
#[utoipa::path(
    delete,
    path = "/api/v1/groups/{group_id}",
    tag = "groups",
    params(
        ("group_id" = i32, Path, description = "Group ID"),
    ),
    responses(
        (status = 200, description = "Group deleted successfully", body = ApiResponse<String>),
        (status = 404, description = "Group not found", body = ErrorResponse),
        (status = 409, description = "Group roster is not empty", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    )
)]
#[instrument(skip(state))]
pub async fn delete_group(
    Path(group_id): Path<i32>,
    State(state): State<AppState>,
) -> Result<Json<ApiResponse<String>>, StatusCode> {
    trace!("Entering delete_group function for group_id: {}", group_id);

    let member_count = membership::Entity::find()
        .filter(membership::Column::GroupId.eq(group_id))
        .count(&state.db)
        .await
        .map_err(|db_error| {
            error!("Failed to count members for group {}: {}", group_id, db_error);
            StatusCode::INTERNAL_SERVER_ERROR
        })?;
    let assignment_count = orphan_assignment::Entity::find()
        .filter(orphan_assignment::Column::GroupId.eq(group_id))
        .count(&state.db)
        .await
        .map_err(|db_error| {
            error!("Failed to count assignments for group {}: {}", group_id, db_error);
            StatusCode::INTERNAL_SERVER_ERROR
        })?;

    if member_count > 0 || assignment_count > 0 {
        warn!("Refusing to delete group {}: {} members, {} orphan assignments still reference it",
              group_id, member_count, assignment_count);
        return Err(StatusCode::CONFLICT);
    }

    match group::Entity::delete_by_id(group_id).exec(&state.db).await {
        Ok(delete_result) => {
            if delete_result.rows_affected > 0 {
                info!("Group with ID {} deleted successfully", group_id);
                let response = ApiResponse {
                    data: format!("Group {} deleted", group_id),
                    message: "Group deleted successfully".to_string(),
                    success: true,
                };
                Ok(Json(response))
            } else {
                warn!("Group with ID {} not found for deletion", group_id);
                Err(StatusCode::NOT_FOUND)
            }
        }
        Err(db_error) => {
            error!("Failed to delete group with ID {}: {}", group_id, db_error);
            Err(StatusCode::INTERNAL_SERVER_ERROR)
        }
    }
}

/// Assign an orphan to a group
#[utoipa::path(
    post,
    path = "/api/v1/groups/{group_id}/orphans/{orphan_id}",
    tag = "groups",
    params(
        ("group_id" = i32, Path, description = "Group ID"),
        ("orphan_id" = i32, Path, description = "Orphan ID"),
    ),
    responses(
        (status = 201, description = "Orphan assigned successfully", body = ApiResponse<String>),
        (status = 404, description = "Group or orphan not found", body = ErrorResponse),
        (status = 409, description = "Orphan already assigned to this group", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    )
)]
#[instrument(skip(state))]
pub async fn assign_orphan(
    Path((group_id, orphan_id)): Path<(i32, i32)>,
    State(state): State<AppState>,
) -> Result<(StatusCode, Json<ApiResponse<String>>), StatusCode> {
    trace!("Entering assign_orphan function for group_id: {}, orphan_id: {}", group_id, orphan_id);

    let group_exists = group::Entity::find_by_id(group_id)
        .count(&state.db)
        .await
        .map_err(|_| StatusCode::INTERNAL_SERVER_ERROR)?
        > 0;
    let orphan_exists = orphan::Entity::find_by_id(orphan_id)
        .count(&state.db)
        .await
        .map_err(|_| StatusCode::INTERNAL_SERVER_ERROR)?
        > 0;
    if !group_exists || !orphan_exists {
        warn!("Group {} or orphan {} not found for assignment", group_id, orphan_id);
        return Err(StatusCode::NOT_FOUND);
    }

    let already_assigned = orphan_assignment::Entity::find()
        .filter(orphan_assignment::Column::GroupId.eq(group_id))
        .filter(orphan_assignment::Column::OrphanId.eq(orphan_id))
        .count(&state.db)
        .await
        .map_err(|_| StatusCode::INTERNAL_SERVER_ERROR)?
        > 0;
    if already_assigned {
        warn!("Orphan {} already assigned to group {}", orphan_id, group_id);
        return Err(StatusCode::CONFLICT);
    }

    let assignment = orphan_assignment::ActiveModel {
        group_id: Set(group_id),
        orphan_id: Set(orphan_id),
        ..Default::default()
    };

    match assignment.insert(&state.db).await {
        Ok(_) => {
            info!("Orphan {} assigned to group {}", orphan_id, group_id);
            let response = ApiResponse {
                data: format!("Orphan {} assigned to group {}", orphan_id, group_id),
                message: "Orphan assigned successfully".to_string(),
                success: true,
            };
            Ok((StatusCode::CREATED, Json(response)))
        }
        Err(db_error) => {
            error!("Failed to assign orphan {} to group {}: {}", orphan_id, group_id, db_error);
            Err(StatusCode::INTERNAL_SERVER_ERROR)
        }
    }
}

/// Remove an orphan from a group
#[utoipa::path(
    delete,
    path = "/api/v1/groups/{group_id}/orphans/{orphan_id}",
    tag = "groups",
    params(
        ("group_id" = i32, Path, description = "Group ID"),
        ("orphan_id" = i32, Path, description = "Orphan ID"),
    ),
    responses(
        (status = 200, description = "Orphan unassigned successfully", body = ApiResponse<String>),
        (status = 404, description = "Assignment not found", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    )
)]
#[instrument(skip(state))]
pub async fn unassign_orphan(
    Path((group_id, orphan_id)): Path<(i32, i32)>,
    State(state): State<AppState>,
) -> Result<Json<ApiResponse<String>>, StatusCode> {
    trace!("Entering unassign_orphan function for group_id: {}, orphan_id: {}", group_id, orphan_id);

    let delete_result = orphan_assignment::Entity::delete_many()
        .filter(orphan_assignment::Column::GroupId.eq(group_id))
        .filter(orphan_assignment::Column::OrphanId.eq(orphan_id))
        .exec(&state.db)
        .await
        .map_err(|db_error| {
            error!("Failed to unassign orphan {} from group {}: {}", orphan_id, group_id, db_error);
            StatusCode::INTERNAL_SERVER_ERROR
        })?;

    if delete_result.rows_affected > 0 {
        info!("Orphan {} unassigned from group {}", orphan_id, group_id);
        let response = ApiResponse {
            data: format!("Orphan {} unassigned from group {}", orphan_id, group_id),
            message: "Orphan unassigned successfully".to_string(),
            success: true,
        };
        Ok(Json(response))
    } else {
        warn!("No assignment of orphan {} to group {} found", orphan_id, group_id);
        Err(StatusCode::NOT_FOUND)
    }
}
