use crate::schemas::{ErrorResponse, ApiResponse, AppState};
use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::Json,
};
use chrono::{DateTime, Utc};
use model::entities::{membership, payment, sponsor};
use sea_orm::{ActiveModelTrait, ColumnTrait, EntityTrait, PaginatorTrait, QueryFilter, Set};
use serde::{Deserialize, Serialize};
use tracing::{debug, error, info, instrument, trace, warn};
use utoipa::ToSchema;

/// Request body for creating a new sponsor
#[derive(Debug, Deserialize, Serialize, ToSchema)]
pub struct CreateSponsorRequest {
    /// Sponsor name (must be non-empty)
    pub name: String,
    /// Contact email, unique across sponsors when present
    pub email: Option<String>,
    /// Contact phone number
    pub phone: Option<String>,
}

/// Request body for updating a sponsor
#[derive(Debug, Deserialize, Serialize, ToSchema)]
pub struct UpdateSponsorRequest {
    /// Sponsor name
    pub name: Option<String>,
    /// Contact email, unique across sponsors when present
    pub email: Option<String>,
    /// Contact phone number
    pub phone: Option<String>,
}

/// Sponsor response model
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct SponsorResponse {
    pub id: i32,
    pub name: String,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl From<sponsor::Model> for SponsorResponse {
    fn from(model: sponsor::Model) -> Self {
        Self {
            id: model.id,
            name: model.name,
            email: model.email,
            phone: model.phone,
            created_at: model.created_at,
        }
    }
}

/// Returns true when another sponsor already uses the email.
async fn email_taken(state: &AppState, email: &str, exclude_id: Option<i32>) -> Result<bool, StatusCode> {
    let mut query = sponsor::Entity::find().filter(sponsor::Column::Email.eq(email));
    if let Some(id) = exclude_id {
        query = query.filter(sponsor::Column::Id.ne(id));
    }
    match query.count(&state.db).await {
        Ok(count) => Ok(count > 0),
        Err(db_error) => {
            error!("Failed to check email uniqueness for '{}': {}", email, db_error);
            Err(StatusCode::INTERNAL_SERVER_ERROR)
        }
    }
}

/// Create a new sponsor
#[utoipa::path(
    post,
    path = "/api/v1/sponsors",
    tag = "sponsors",
    request_body = CreateSponsorRequest,
    responses(
        (status = 201, description = "Sponsor created successfully", body = ApiResponse<SponsorResponse>),
        (status = 400, description = "Invalid request", body = ErrorResponse),
        (status = 409, description = "Email already in use", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    )
)]
#[instrument(skip(state))]
pub async fn create_sponsor(
    State(state): State<AppState>,
    Json(request): Json<CreateSponsorRequest>,
) -> Result<(StatusCode, Json<ApiResponse<SponsorResponse>>), StatusCode> {
    trace!("Entering create_sponsor function");
    debug!("Creating sponsor with name: {}", request.name);

    if request.name.trim().is_empty() {
        warn!("Rejecting sponsor with empty name");
        return Err(StatusCode::BAD_REQUEST);
    }

    if let Some(ref email) = request.email {
        if email_taken(&state, email, None).await? {
            warn!("Sponsor email '{}' already in use", email);
            return Err(StatusCode::CONFLICT);
        }
    }

    let new_sponsor = sponsor::ActiveModel {
        name: Set(request.name.clone()),
        email: Set(request.email.clone()),
        phone: Set(request.phone.clone()),
        created_at: Set(Utc::now()),
        ..Default::default()
    };

    match new_sponsor.insert(&state.db).await {
        Ok(sponsor_model) => {
            info!("Sponsor created successfully with ID: {}, name: {}",
                  sponsor_model.id, sponsor_model.name);
            let response = ApiResponse {
                data: SponsorResponse::from(sponsor_model),
                message: "Sponsor created successfully".to_string(),
                success: true,
            };
            Ok((StatusCode::CREATED, Json(response)))
        }
        Err(db_error) => {
            error!("Failed to create sponsor '{}': {}", request.name, db_error);
            Err(StatusCode::INTERNAL_SERVER_ERROR)
        }
    }
}

/// Get all sponsors
#[utoipa::path(
    get,
    path = "/api/v1/sponsors",
    tag = "sponsors",
    responses(
        (status = 200, description = "Sponsors retrieved successfully", body = ApiResponse<Vec<SponsorResponse>>),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    )
)]
#[instrument(skip(state))]
pub async fn get_sponsors(
    State(state): State<AppState>,
) -> Result<Json<ApiResponse<Vec<SponsorResponse>>>, StatusCode> {
    trace!("Entering get_sponsors function");

    match sponsor::Entity::find().all(&state.db).await {
        Ok(sponsors) => {
            debug!("Retrieved {} sponsors from database", sponsors.len());
            let response = ApiResponse {
                data: sponsors.into_iter().map(SponsorResponse::from).collect(),
                message: "Sponsors retrieved successfully".to_string(),
                success: true,
            };
            Ok(Json(response))
        }
        Err(db_error) => {
            error!("Failed to retrieve sponsors from database: {}", db_error);
            Err(StatusCode::INTERNAL_SERVER_ERROR)
        }
    }
}

/// Get a specific sponsor by ID
#[utoipa::path(
    get,
    path = "/api/v1/sponsors/{sponsor_id}",
    tag = "sponsors",
    params(
        ("sponsor_id" = i32, Path, description = "Sponsor ID"),
    ),
    responses(
        (status = 200, description = "Sponsor retrieved successfully", body = ApiResponse<SponsorResponse>),
        (status = 404, description = "Sponsor not found", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    )
)]
#[instrument(skip(state))]
pub async fn get_sponsor(
    Path(sponsor_id): Path<i32>,
    State(state): State<AppState>,
) -> Result<Json<ApiResponse<SponsorResponse>>, StatusCode> {
    trace!("Entering get_sponsor function for sponsor_id: {}", sponsor_id);

    match sponsor::Entity::find_by_id(sponsor_id).one(&state.db).await {
        Ok(Some(sponsor_model)) => {
            let response = ApiResponse {
                data: SponsorResponse::from(sponsor_model),
                message: "Sponsor retrieved successfully".to_string(),
                success: true,
            };
            Ok(Json(response))
        }
        Ok(None) => {
            warn!("Sponsor with ID {} not found", sponsor_id);
            Err(StatusCode::NOT_FOUND)
        }
        Err(db_error) => {
            error!("Failed to retrieve sponsor with ID {}: {}", sponsor_id, db_error);
            Err(StatusCode::INTERNAL_SERVER_ERROR)
        }
    }
}

/// Update a sponsor
#[utoipa::path(
    put,
    path = "/api/v1/sponsors/{sponsor_id}",
    tag = "sponsors",
    params(
        ("sponsor_id" = i32, Path, description = "Sponsor ID"),
    ),
    request_body = UpdateSponsorRequest,
    responses(
        (status = 200, description = "Sponsor updated successfully", body = ApiResponse<SponsorResponse>),
        (status = 404, description = "Sponsor not found", body = ErrorResponse),
        (status = 400, description = "Invalid request", body = ErrorResponse),
        (status = 409, description = "Email already in use", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    )
)]
#[instrument(skip(state))]
pub async fn update_sponsor(
    Path(sponsor_id): Path<i32>,
    State(state): State<AppState>,
    Json(request): Json<UpdateSponsorRequest>,
) -> Result<Json<ApiResponse<SponsorResponse>>, StatusCode> {
    trace!("Entering update_sponsor function for sponsor_id: {}", sponsor_id);

    let existing = match sponsor::Entity::find_by_id(sponsor_id).one(&state.db).await {
        Ok(Some(sponsor_model)) => sponsor_model,
        Ok(None) => {
            warn!("Sponsor with ID {} not found for update", sponsor_id);
            return Err(StatusCode::NOT_FOUND);
        }
        Err(db_error) => {
            error!("Failed to lookup sponsor with ID {} for update: {}", sponsor_id, db_error);
            return Err(StatusCode::INTERNAL_SERVER_ERROR);
        }
    };

    if let Some(ref name) = request.name {
        if name.trim().is_empty() {
            warn!("Rejecting empty name for sponsor ID {}", sponsor_id);
            return Err(StatusCode::BAD_REQUEST);
        }
    }
    if let Some(ref email) = request.email {
        if email_taken(&state, email, Some(sponsor_id)).await? {
            warn!("Sponsor email '{}' already in use", email);
            return Err(StatusCode::CONFLICT);
        }
    }

    let mut sponsor_active: sponsor::ActiveModel = existing.into();
    if let Some(name) = request.name {
        sponsor_active.name = Set(name);
    }
    if let Some(email) = request.email {
        sponsor_active.email = Set(Some(email));
    }
    if let Some(phone) = request.phone {
        sponsor_active.phone = Set(Some(phone));
    }

    match sponsor_active.update(&state.db).await {
        Ok(updated) => {
            info!("Sponsor with ID {} updated successfully", sponsor_id);
            let response = ApiResponse {
                data: SponsorResponse::from(updated),
                message: "Sponsor updated successfully".to_string(),
                success: true,
            };
            Ok(Json(response))
        }
        Err(db_error) => {
            error!("Failed to update sponsor with ID {}: {}", sponsor_id, db_error);
            Err(StatusCode::INTERNAL_SERVER_ERROR)
        }
    }
}

/// Delete a sponsor
///
/// Rejected while memberships or payment ledger rows still reference the
/// sponsor; the ledger is a historical record and is never cascaded away.
#[utoipa::path(
    delete,
    path = "/api/v1/sponsors/{sponsor_id}",
    tag = "sponsors",
    params(
        ("sponsor_id" = i32, Path, description = "Sponsor ID"),
    ),
    responses(
        (status = 200, description = "Sponsor deleted successfully", body = ApiResponse<String>),
        (status = 404, description = "Sponsor not found", body = ErrorResponse),
        (status = 409, description = "Sponsor still has memberships or payments", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    )
)]
#[instrument(skip(state))]
pub async fn delete_sponsor(
    Path(sponsor_id): Path<i32>,
    State(state): State<AppState>,
) -> Result<Json<ApiResponse<String>>, StatusCode> {
    trace!("Entering delete_sponsor function for sponsor_id: {}", sponsor_id);

    let membership_count = membership::Entity::find()
        .filter(membership::Column::SponsorId.eq(sponsor_id))
        .count(&state.db)
        .await
        .map_err(|db_error| {
            error!("Failed to count memberships for sponsor {}: {}", sponsor_id, db_error);
            StatusCode::INTERNAL_SERVER_ERROR
        })?;
    let payment_count = payment::Entity::find()
        .filter(payment::Column::SponsorId.eq(sponsor_id))
        .count(&state.db)
        .await
        .map_err(|db_error| {
            error!("Failed to count payments for sponsor {}: {}", sponsor_id, db_error);
            StatusCode::INTERNAL_SERVER_ERROR
        })?;

    if membership_count > 0 || payment_count > 0 {
        warn!("Refusing to delete sponsor {}: {} memberships, {} payments still reference it",
              sponsor_id, membership_count, payment_count);
        return Err(StatusCode::CONFLICT);
    }

    match sponsor::Entity::delete_by_id(sponsor_id).exec(&state.db).await {
        Ok(delete_result) => {
            if delete_result.rows_affected > 0 {
                info!("Sponsor with ID {} deleted successfully", sponsor_id);
                let response = ApiResponse {
                    data: format!("Sponsor {} deleted", sponsor_id),
                    message: "Sponsor deleted successfully".to_string(),
                    success: true,
                };
                Ok(Json(response))
            } else {
                warn!("Sponsor with ID {} not found for deletion", sponsor_id);
                Err(StatusCode::NOT_FOUND)
            }
        }
        Err(db_error) => {
            error!("Failed to delete sponsor with ID {}: {}", sponsor_id, db_error);
            Err(StatusCode::INTERNAL_SERVER_ERROR)
        }
    }
}
