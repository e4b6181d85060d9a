use crate::handlers::{
    dashboard::get_dashboard,
    groups::{
        assign_orphan, create_group, delete_group, get_group, get_groups, unassign_orphan,
        update_group,
    },
    health::health_check,
    memberships::{add_member, remove_member, set_member_periods, update_member},
    orphan_payments::{get_orphan_payments, record_orphan_payment},
    orphans::{create_orphan, delete_orphan, get_orphan, get_orphans, update_orphan},
    payments::{delete_payment, get_payments, record_payment},
    sponsors::{create_sponsor, delete_sponsor, get_sponsor, get_sponsors, update_sponsor},
    statement::{get_group_statement, get_sponsor_debt},
};
use crate::schemas::{ApiDoc, AppState};
use axum::{
    routing::{delete, get, patch, post, put},
    Router,
};
use std::time::Duration;
use tower::ServiceBuilder;
use tower_http::{
    compression::CompressionLayer, cors::CorsLayer, timeout::TimeoutLayer, trace::TraceLayer,
};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

/// Create application router with all routes and middleware
pub fn create_router(state: AppState) -> Router {
    Router::new()
        // Health check
        .route("/health", get(health_check))
        // Sponsor CRUD routes
        .route("/api/v1/sponsors", post(create_sponsor))
        .route("/api/v1/sponsors", get(get_sponsors))
        .route("/api/v1/sponsors/:sponsor_id", get(get_sponsor))
        .route("/api/v1/sponsors/:sponsor_id", put(update_sponsor))
        .route("/api/v1/sponsors/:sponsor_id", delete(delete_sponsor))
        .route("/api/v1/sponsors/:sponsor_id/debt", get(get_sponsor_debt))
        // Orphan CRUD routes
        .route("/api/v1/orphans", post(create_orphan))
        .route("/api/v1/orphans", get(get_orphans))
        .route("/api/v1/orphans/:orphan_id", get(get_orphan))
        .route("/api/v1/orphans/:orphan_id", put(update_orphan))
        .route("/api/v1/orphans/:orphan_id", delete(delete_orphan))
        // Group CRUD and roster routes
        .route("/api/v1/groups", post(create_group))
        .route("/api/v1/groups", get(get_groups))
        .route("/api/v1/groups/:group_id", get(get_group))
        .route("/api/v1/groups/:group_id", put(update_group))
        .route("/api/v1/groups/:group_id", delete(delete_group))
        .route("/api/v1/groups/:group_id/orphans/:orphan_id", post(assign_orphan))
        .route("/api/v1/groups/:group_id/orphans/:orphan_id", delete(unassign_orphan))
        // Membership routes
        .route("/api/v1/groups/:group_id/members", post(add_member))
        .route("/api/v1/groups/:group_id/members/:sponsor_id", patch(update_member))
        .route("/api/v1/groups/:group_id/members/:sponsor_id", delete(remove_member))
        .route(
            "/api/v1/groups/:group_id/members/:sponsor_id/periods",
            put(set_member_periods),
        )
        // Accrual statement
        .route("/api/v1/groups/:group_id/statement", get(get_group_statement))
        // Payment ledger routes
        .route("/api/v1/payments", post(record_payment))
        .route("/api/v1/payments", get(get_payments))
        .route("/api/v1/payments", delete(delete_payment))
        .route("/api/v1/groups/:group_id/orphan-payments", get(get_orphan_payments))
        .route("/api/v1/groups/:group_id/orphan-payments", post(record_orphan_payment))
        // Dashboard
        .route("/api/v1/dashboard", get(get_dashboard))
        // Swagger UI
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        // Add middleware
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(CompressionLayer::new())
                .layer(TimeoutLayer::new(Duration::from_secs(30)))
                .layer(CorsLayer::permissive()),
        )
        .with_state(state)
}
