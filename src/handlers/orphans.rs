use crate::schemas::{ErrorResponse, ApiResponse, AppState};
use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::Json,
};
use chrono::{DateTime, Utc};
use model::entities::orphan;
use rust_decimal::Decimal;
use sea_orm::{ActiveModelTrait, EntityTrait, Set};
use serde::{Deserialize, Serialize};
use tracing::{debug, error, info, instrument, trace, warn};
use utoipa::ToSchema;

/// Request body for creating a new orphan
#[derive(Debug, Deserialize, Serialize, ToSchema)]
pub struct CreateOrphanRequest {
    /// Orphan name
    pub name: String,
    /// Monthly support fee (must be positive)
    pub monthly_fee: Decimal,
    /// Age in years
    pub age: Option<i32>,
    /// Location
    pub location: Option<String>,
    /// Free-form notes
    pub description: Option<String>,
}

/// Request body for updating an orphan
#[derive(Debug, Deserialize, Serialize, ToSchema)]
pub struct UpdateOrphanRequest {
    /// Orphan name
    pub name: Option<String>,
    /// Monthly support fee (must be positive)
    pub monthly_fee: Option<Decimal>,
    /// Age in years
    pub age: Option<i32>,
    /// Location
    pub location: Option<String>,
    /// Free-form notes
    pub description: Option<String>,
}

/// Orphan response model
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct OrphanResponse {
    pub id: i32,
    pub name: String,
    pub monthly_fee: Decimal,
    pub age: Option<i32>,
    pub location: Option<String>,
    pub description: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl From<orphan::Model> for OrphanResponse {
    fn from(model: orphan::Model) -> Self {
        Self {
            id: model.id,
            name: model.name,
            monthly_fee: model.monthly_fee,
            age: model.age,
            location: model.location,
            description: model.description,
            created_at: model.created_at,
        }
    }
}

/// Create a new orphan
#[utoipa::path(
    post,
    path = "/api/v1/orphans",
    tag = "orphans",
    request_body = CreateOrphanRequest,
    responses(
        (status = 201, description = "Orphan created successfully", body = ApiResponse<OrphanResponse>),
        (status = 400, description = "Invalid request", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    )
)]
#[instrument(skip(state))]
pub async fn create_orphan(
    State(state): State<AppState>,
    Json(request): Json<CreateOrphanRequest>,
) -> Result<(StatusCode, Json<ApiResponse<OrphanResponse>>), StatusCode> {
    trace!("Entering create_orphan function");
    debug!("Creating orphan with name: {}, monthly_fee: {}", request.name, request.monthly_fee);

    if request.name.trim().is_empty() {
        warn!("Rejecting orphan with empty name");
        return Err(StatusCode::BAD_REQUEST);
    }
    if request.monthly_fee <= Decimal::ZERO {
        warn!("Rejecting orphan with non-positive monthly_fee: {}", request.monthly_fee);
        return Err(StatusCode::BAD_REQUEST);
    }

    let new_orphan = orphan::ActiveModel {
        name: Set(request.name.clone()),
        monthly_fee: Set(request.monthly_fee),
        age: Set(request.age),
        location: Set(request.location.clone()),
        description: Set(request.description.clone()),
        created_at: Set(Utc::now()),
        ..Default::default()
    };

    match new_orphan.insert(&state.db).await {
        Ok(orphan_model) => {
            info!("Orphan created successfully with ID: {}, name: {}",
                  orphan_model.id, orphan_model.name);
            let response = ApiResponse {
                data: OrphanResponse::from(orphan_model),
                message: "Orphan created successfully".to_string(),
                success: true,
            };
            Ok((StatusCode::CREATED, Json(response)))
        }
        Err(db_error) => {
            error!("Failed to create orphan '{}': {}", request.name, db_error);
            Err(StatusCode::INTERNAL_SERVER_ERROR)
        }
    }
}

/// Get all orphans
#[utoipa::path(
    get,
    path = "/api/v1/orphans",
    tag = "orphans",
    responses(
        (status = 200, description = "Orphans retrieved successfully", body = ApiResponse<Vec<OrphanResponse>>),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    )
)]
#[instrument(skip(state))]
pub async fn get_orphans(
    State(state): State<AppState>,
) -> Result<Json<ApiResponse<Vec<OrphanResponse>>>, StatusCode> {
    trace!("Entering get_orphans function");

    match orphan::Entity::find().all(&state.db).await {
        Ok(orphans) => {
            debug!("Retrieved {} orphans from database", orphans.len());
            let response = ApiResponse {
                data: orphans.into_iter().map(OrphanResponse::from).collect(),
                message: "Orphans retrieved successfully".to_string(),
                success: true,
            };
            Ok(Json(response))
        }
        Err(db_error) => {
            error!("Failed to retrieve orphans from database: {}", db_error);
            Err(StatusCode::INTERNAL_SERVER_ERROR)
        }
    }
}

/// Get a specific orphan by ID
#[utoipa::path(
    get,
    path = "/api/v1/orphans/{orphan_id}",
    tag = "orphans",
    params(
        ("orphan_id" = i32, Path, description = "Orphan ID"),
    ),
    responses(
        (status = 200, description = "Orphan retrieved successfully", body = ApiResponse<OrphanResponse>),
        (status = 404, description = "Orphan not found", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    )
)]
#[instrument(skip(state))]
pub async fn get_orphan(
    Path(orphan_id): Path<i32>,
    State(state): State<AppState>,
) -> Result<Json<ApiResponse<OrphanResponse>>, StatusCode> {
    trace!("Entering get_orphan function for orphan_id: {}", orphan_id);

    match orphan::Entity::find_by_id(orphan_id).one(&state.db).await {
        Ok(Some(orphan_model)) => {
            let response = ApiResponse {
                data: OrphanResponse::from(orphan_model),
                message: "Orphan retrieved successfully".to_string(),
                success: true,
            };
            Ok(Json(response))
        }
        Ok(None) => {
            warn!("Orphan with ID {} not found", orphan_id);
            Err(StatusCode::NOT_FOUND)
        }
        Err(db_error) => {
            error!("Failed to retrieve orphan with ID {}: {}", orphan_id, db_error);
            Err(StatusCode::INTERNAL_SERVER_ERROR)
        }
    }
}

/// Update an orphan
#[utoipa::path(
    put,
    path = "/api/v1/orphans/{orphan_id}",
    tag = "orphans",
    params(
        ("orphan_id" = i32, Path, description = "Orphan ID"),
    ),
    request_body = UpdateOrphanRequest,
    responses(
        (status = 200, description = "Orphan updated successfully", body = ApiResponse<OrphanResponse>),
        (status = 404, description = "Orphan not found", body = ErrorResponse),
        (status = 400, description = "Invalid request", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    )
)]
#[instrument(skip(state))]
pub async fn update_orphan(
    Path(orphan_id): Path<i32>,
    State(state): State<AppState>,
    Json(request): Json<UpdateOrphanRequest>,
) -> Result<Json<ApiResponse<OrphanResponse>>, StatusCode> {
    trace!("Entering update_orphan function for orphan_id: {}", orphan_id);

    let existing = match orphan::Entity::find_by_id(orphan_id).one(&state.db).await {
        Ok(Some(orphan_model)) => orphan_model,
        Ok(None) => {
            warn!("Orphan with ID {} not found for update", orphan_id);
            return Err(StatusCode::NOT_FOUND);
        }
        Err(db_error) => {
            error!("Failed to lookup orphan with ID {} for update: {}", orphan_id, db_error);
            return Err(StatusCode::INTERNAL_SERVER_ERROR);
        }
    };

    if let Some(ref name) = request.name {
        if name.trim().is_empty() {
            warn!("Rejecting empty name for orphan ID {}", orphan_id);
            return Err(StatusCode::BAD_REQUEST);
        }
    }
    if let Some(fee) = request.monthly_fee {
        if fee <= Decimal::ZERO {
            warn!("Rejecting non-positive monthly_fee {} for orphan ID {}", fee, orphan_id);
            return Err(StatusCode::BAD_REQUEST);
        }
    }

    let mut orphan_active: orphan::ActiveModel = existing.into();
    if let Some(name) = request.name {
        orphan_active.name = Set(name);
    }
    if let Some(fee) = request.monthly_fee {
        orphan_active.monthly_fee = Set(fee);
    }
    if let Some(age) = request.age {
        orphan_active.age = Set(Some(age));
    }
    if let Some(location) = request.location {
        orphan_active.location = Set(Some(location));
    }
    if let Some(description) = request.description {
        orphan_active.description = Set(Some(description));
    }

    match orphan_active.update(&state.db).await {
        Ok(updated) => {
            info!("Orphan with ID {} updated successfully", orphan_id);
            let response = ApiResponse {
                data: OrphanResponse::from(updated),
                message: "Orphan updated successfully".to_string(),
                success: true,
            };
            Ok(Json(response))
        }
        Err(db_error) => {
            error!("Failed to update orphan with ID {}: {}", orphan_id, db_error);
            Err(StatusCode::INTERNAL_SERVER_ERROR)
        }
    }
}

/// Delete an orphan
///
/// Group assignments referencing the orphan are removed by cascade.
#[utoipa::path(
    delete,
    path = "/api/v1/orphans/{orphan_id}",
    tag = "orphans",
    params(
        ("orphan_id" = i32, Path, description = "Orphan ID"),
    ),
    responses(
        (status = 200, description = "Orphan deleted successfully", body = ApiResponse<String>),
        (status = 404, description = "Orphan not found", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    )
)]
#[instrument(skip(state))]
pub async fn delete_orphan(
    Path(orphan_id): Path<i32>,
    State(state): State<AppState>,
) -> Result<Json<ApiResponse<String>>, StatusCode> {
    trace!("Entering delete_orphan function for orphan_id: {}", orphan_id);

    match orphan::Entity::delete_by_id(orphan_id).exec(&state.db).await {
        Ok(delete_result) => {
            if delete_result.rows_affected > 0 {
                info!("Orphan with ID {} deleted successfully", orphan_id);
                let response = ApiResponse {
                    data: format!("Orphan {} deleted", orphan_id),
                    message: "Orphan deleted successfully".to_string(),
                    success: true,
                };
                Ok(Json(response))
            } else {
                warn!("Orphan with ID {} not found for deletion", orphan_id);
                Err(StatusCode::NOT_FOUND)
            }
        }
        Err(db_error) => {
            error!("Failed to delete orphan with ID {}: {}", orphan_id, db_error);
            Err(StatusCode::INTERNAL_SERVER_ERROR)
        }
    }
}
