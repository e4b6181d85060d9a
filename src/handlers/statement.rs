use crate::schemas::{ErrorResponse, ApiResponse, AppState};
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::Json,
};
use chrono::Utc;
use common::{MonthRef, MonthlyStatus};
use compute::accrual::{accrual_start, compute_accrual};
use compute::calendar::periods_from_models;
use model::entities::{group, membership, membership_period, payment, sponsor};
use rust_decimal::Decimal;
use sea_orm::{ColumnTrait, DatabaseTransaction, EntityTrait, QueryFilter, TransactionTrait};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::{debug, error, instrument, trace, warn};
use utoipa::ToSchema;

/// As-of month selector; defaults to the current month.
#[derive(Debug, Deserialize, ToSchema)]
pub struct AsOfQuery {
    /// As-of month (1-12)
    pub as_of_month: Option<i32>,
    /// As-of year
    pub as_of_year: Option<i32>,
}

impl AsOfQuery {
    /// Resolves the query to a concrete month, falling back to today.
    fn resolve(&self) -> Result<MonthRef, StatusCode> {
        match (self.as_of_month, self.as_of_year) {
            (None, None) => Ok(MonthRef::from_date(Utc::now().date_naive())),
            (Some(month), Some(year)) => MonthRef::new(year, month).ok_or_else(|| {
                warn!("Rejecting as-of month {}: out of range", month);
                StatusCode::BAD_REQUEST
            }),
            _ => {
                warn!("Rejecting as-of query: month and year must be set together");
                Err(StatusCode::BAD_REQUEST)
            }
        }
    }
}

/// One member's accrual statement
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct MemberStatement {
    pub sponsor_id: i32,
    pub sponsor_name: String,
    /// Obligated months keyed "YYYY-MM"
    pub monthly_status: BTreeMap<String, MonthlyStatus>,
    pub total_debt: Decimal,
}

/// Accrual statement for a whole group
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct GroupStatementResponse {
    pub group_id: i32,
    pub group_name: String,
    /// As-of month, "YYYY-MM"
    pub as_of: String,
    pub members: Vec<MemberStatement>,
    /// Sum of all members' unpaid amounts
    pub total_debt: Decimal,
}

/// One group's share of a sponsor's debt
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct GroupDebtEntry {
    pub group_id: i32,
    pub group_name: String,
    pub total_debt: Decimal,
}

/// A sponsor's accrued debt across all active memberships
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct SponsorDebtResponse {
    pub sponsor_id: i32,
    pub sponsor_name: String,
    /// As-of month, "YYYY-MM"
    pub as_of: String,
    pub groups: Vec<GroupDebtEntry>,
    pub total_debt: Decimal,
}

/// Runs the accrual walk for one membership against rows fetched inside the
/// caller's transaction.
async fn membership_accrual(
    txn: &DatabaseTransaction,
    membership_model: &membership::Model,
    group_model: &group::Model,
    as_of: MonthRef,
) -> Result<compute::accrual::AccrualOutcome, StatusCode> {
    let period_rows = membership_period::Entity::find()
        .filter(membership_period::Column::MembershipId.eq(membership_model.id))
        .all(txn)
        .await
        .map_err(|db_error| {
            error!("Failed to load periods for membership {}: {}", membership_model.id, db_error);
            StatusCode::INTERNAL_SERVER_ERROR
        })?;
    let periods = periods_from_models(&period_rows).map_err(|engine_error| {
        error!("Stored periods for membership {} are invalid: {}",
               membership_model.id, engine_error);
        StatusCode::INTERNAL_SERVER_ERROR
    })?;

    let payments = payment::Entity::find()
        .filter(payment::Column::SponsorId.eq(membership_model.sponsor_id))
        .filter(payment::Column::GroupId.eq(membership_model.group_id))
        .all(txn)
        .await
        .map_err(|db_error| {
            error!("Failed to load payments for membership {}: {}", membership_model.id, db_error);
            StatusCode::INTERNAL_SERVER_ERROR
        })?;

    // A membership with no accrual anchor contributes an empty statement.
    let from = match accrual_start(group_model, &periods) {
        Some(from) => from,
        None => {
            debug!("Membership {} has no accrual start, skipping walk", membership_model.id);
            return Ok(compute::accrual::AccrualOutcome::default());
        }
    };

    compute_accrual(membership_model, group_model, &payments, &periods, from, as_of).map_err(
        |engine_error| {
            error!("Accrual walk failed for membership {}: {}", membership_model.id, engine_error);
            StatusCode::INTERNAL_SERVER_ERROR
        },
    )
}

/// Get the accrual statement for a group
///
/// Walks every active membership from the group's start month through the
/// as-of month and reports each member's per-month status and unpaid total.
#[utoipa::path(
    get,
    path = "/api/v1/groups/{group_id}/statement",
    tag = "statement",
    params(
        ("group_id" = i32, Path, description = "Group ID"),
        ("as_of_month" = Option<i32>, Query, description = "As-of month (1-12), defaults to current"),
        ("as_of_year" = Option<i32>, Query, description = "As-of year, defaults to current"),
    ),
    responses(
        (status = 200, description = "Statement computed successfully", body = ApiResponse<GroupStatementResponse>),
        (status = 400, description = "Invalid as-of month", body = ErrorResponse),
        (status = 404, description = "Group not found", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    )
)]
#[instrument(skip(state))]
pub async fn get_group_statement(
    Path(group_id): Path<i32>,
    Query(query): Query<AsOfQuery>,
    State(state): State<AppState>,
) -> Result<Json<ApiResponse<GroupStatementResponse>>, StatusCode> {
    trace!("Entering get_group_statement function for group_id: {}", group_id);
    let as_of = query.resolve()?;

    // All rows come from one snapshot so the statement is self-consistent.
    let txn = state.db.begin().await.map_err(|db_error| {
        error!("Failed to open transaction: {}", db_error);
        StatusCode::INTERNAL_SERVER_ERROR
    })?;

    let group_model = match group::Entity::find_by_id(group_id).one(&txn).await {
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
        .filter(membership::Column::IsActive.eq(true))
        .find_also_related(sponsor::Entity)
        .all(&txn)
        .await
        .map_err(|db_error| {
            error!("Failed to load members for group {}: {}", group_id, db_error);
            StatusCode::INTERNAL_SERVER_ERROR
        })?;

    let mut members = Vec::with_capacity(memberships.len());
    let mut total_debt = Decimal::ZERO;
    for (membership_model, sponsor_model) in &memberships {
        let outcome = membership_accrual(&txn, membership_model, &group_model, as_of).await?;
        total_debt += outcome.total_debt;
        members.push(MemberStatement {
            sponsor_id: membership_model.sponsor_id,
            sponsor_name: sponsor_model.as_ref().map(|s| s.name.clone()).unwrap_or_default(),
            monthly_status: outcome.monthly_status,
            total_debt: outcome.total_debt,
        });
    }

    txn.commit().await.map_err(|db_error| {
        error!("Failed to commit statement transaction: {}", db_error);
        StatusCode::INTERNAL_SERVER_ERROR
    })?;

    debug!("Computed statement for group {} with {} members, total_debt {}",
           group_id, members.len(), total_debt);
    let response = ApiResponse {
        data: GroupStatementResponse {
            group_id,
            group_name: group_model.name,
            as_of: as_of.to_string(),
            members,
            total_debt,
        },
        message: "Statement computed successfully".to_string(),
        success: true,
    };
    Ok(Json(response))
}

/// Get a sponsor's accrued debt
///
/// Sums the unpaid totals of every active membership the sponsor holds.
#[utoipa::path(
    get,
    path = "/api/v1/sponsors/{sponsor_id}/debt",
    tag = "statement",
    params(
        ("sponsor_id" = i32, Path, description = "Sponsor ID"),
        ("as_of_month" = Option<i32>, Query, description = "As-of month (1-12), defaults to current"),
        ("as_of_year" = Option<i32>, Query, description = "As-of year, defaults to current"),
    ),
    responses(
        (status = 200, description = "Debt computed successfully", body = ApiResponse<SponsorDebtResponse>),
        (status = 400, description = "Invalid as-of month", body = ErrorResponse),
        (status = 404, description = "Sponsor not found", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    )
)]
#[instrument(skip(state))]
pub async fn get_sponsor_debt(
    Path(sponsor_id): Path<i32>,
    Query(query): Query<AsOfQuery>,
    State(state): State<AppState>,
) -> Result<Json<ApiResponse<SponsorDebtResponse>>, StatusCode> {
    trace!("Entering get_sponsor_debt function for sponsor_id: {}", sponsor_id);
    let as_of = query.resolve()?;

    let txn = state.db.begin().await.map_err(|db_error| {
        error!("Failed to open transaction: {}", db_error);
        StatusCode::INTERNAL_SERVER_ERROR
    })?;

    let sponsor_model = match sponsor::Entity::find_by_id(sponsor_id).one(&txn).await {
        Ok(Some(sponsor_model)) => sponsor_model,
        Ok(None) => {
            warn!("Sponsor with ID {} not found", sponsor_id);
            return Err(StatusCode::NOT_FOUND);
        }
        Err(db_error) => {
            error!("Failed to retrieve sponsor with ID {}: {}", sponsor_id, db_error);
            return Err(StatusCode::INTERNAL_SERVER_ERROR);
        }
    };

    let memberships = membership::Entity::find()
        .filter(membership::Column::SponsorId.eq(sponsor_id))
        .filter(membership::Column::IsActive.eq(true))
        .find_also_related(group::Entity)
        .all(&txn)
        .await
        .map_err(|db_error| {
            error!("Failed to load memberships for sponsor {}: {}", sponsor_id, db_error);
            StatusCode::INTERNAL_SERVER_ERROR
        })?;

    let mut groups = Vec::with_capacity(memberships.len());
    let mut total_debt = Decimal::ZERO;
    for (membership_model, group_model) in &memberships {
        let group_model = match group_model {
            Some(group_model) => group_model,
            None => {
                warn!("Membership {} references a missing group", membership_model.id);
                continue;
            }
        };
        let outcome = membership_accrual(&txn, membership_model, group_model, as_of).await?;
        total_debt += outcome.total_debt;
        groups.push(GroupDebtEntry {
            group_id: group_model.id,
            group_name: group_model.name.clone(),
            total_debt: outcome.total_debt,
        });
    }

    txn.commit().await.map_err(|db_error| {
        error!("Failed to commit debt transaction: {}", db_error);
        StatusCode::INTERNAL_SERVER_ERROR
    })?;

    debug!("Computed debt for sponsor {} across {} groups: {}",
           sponsor_id, groups.len(), total_debt);
    let response = ApiResponse {
        data: SponsorDebtResponse {
            sponsor_id,
            sponsor_name: sponsor_model.name,
            as_of: as_of.to_string(),
            groups,
            total_debt,
        },
        message: "Debt computed successfully".to_string(),
        success: true,
    };
    Ok(Json(response))
}
