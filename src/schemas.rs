use common::{
    BalanceSummary, DashboardData, DashboardStats, DebtorEntry, MonthRef, MonthlyStatus,
};
use moka::future::Cache;
use sea_orm::DatabaseConnection;
use serde::{Deserialize, Serialize};
use utoipa::{OpenApi, ToSchema};

/// Cache slot holding the assembled dashboard payload. Invalidated by every
/// successful ledger mutation.
pub const DASHBOARD_CACHE_KEY: &str = "dashboard";

/// Deserializes a PATCH field that distinguishes an absent key (leave the
/// value unchanged) from an explicit `null` (clear the value). Pair with
/// `#[serde(default)]` so an absent key stays `None`.
pub fn double_option<'de, T, D>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    T: Deserialize<'de>,
    D: serde::Deserializer<'de>,
{
    Deserialize::deserialize(deserializer).map(Some)
}

/// Application state shared across handlers
#[derive(Clone, Debug)]
pub struct AppState {
    /// Database connection
    pub db: DatabaseConnection,
    /// Cache for expensive operations
    pub cache: Cache<String, CachedData>,
}

/// Cached data types
#[derive(Clone, Debug)]
pub enum CachedData {
    Dashboard(DashboardData),
}

/// API response wrapper
#[derive(Serialize, Deserialize, ToSchema)]
pub struct ApiResponse<T> {
    /// Response data
    pub data: T,
    /// Response message
    pub message: String,
    /// Success status
    pub success: bool,
}

/// Error response
#[derive(Serialize, Deserialize, ToSchema)]
pub struct ErrorResponse {
    /// Error message
    pub error: String,
    /// Error code
    pub code: String,
    /// Success status (always false for errors)
    pub success: bool,
}

/// Health check response
#[derive(Serialize, Deserialize, ToSchema)]
pub struct HealthResponse {
    /// Service status
    pub status: String,
    /// Service version
    pub version: String,
    /// Database connection status
    pub database: String,
}

/// OpenAPI documentation
#[derive(OpenApi)]
#[openapi(
    paths(
        crate::handlers::health::health_check,
        crate::handlers::sponsors::create_sponsor,
        crate::handlers::sponsors::get_sponsors,
        crate::handlers::sponsors::get_sponsor,
        crate::handlers::sponsors::update_sponsor,
        crate::handlers::sponsors::delete_sponsor,
        crate::handlers::orphans::create_orphan,
        crate::handlers::orphans::get_orphans,
        crate::handlers::orphans::get_orphan,
        crate::handlers::orphans::update_orphan,
        crate::handlers::orphans::delete_orphan,
        crate::handlers::groups::create_group,
        crate::handlers::groups::get_groups,
        crate::handlers::groups::get_group,
        crate::handlers::groups::update_group,
        crate::handlers::groups::delete_group,
        crate::handlers::groups::assign_orphan,
        crate::handlers::groups::unassign_orphan,
        crate::handlers::memberships::add_member,
        crate::handlers::memberships::update_member,
        crate::handlers::memberships::remove_member,
        crate::handlers::memberships::set_member_periods,
        crate::handlers::statement::get_group_statement,
        crate::handlers::statement::get_sponsor_debt,
        crate::handlers::payments::record_payment,
        crate::handlers::payments::get_payments,
        crate::handlers::payments::delete_payment,
        crate::handlers::orphan_payments::get_orphan_payments,
        crate::handlers::orphan_payments::record_orphan_payment,
        crate::handlers::dashboard::get_dashboard,
    ),
    components(
        schemas(
            ErrorResponse,
            HealthResponse,
            MonthRef,
            MonthlyStatus,
            DashboardData,
            DashboardStats,
            BalanceSummary,
            DebtorEntry,
            crate::handlers::sponsors::CreateSponsorRequest,
            crate::handlers::sponsors::UpdateSponsorRequest,
            crate::handlers::sponsors::SponsorResponse,
            crate::handlers::orphans::CreateOrphanRequest,
            crate::handlers::orphans::UpdateOrphanRequest,
            crate::handlers::orphans::OrphanResponse,
            crate::handlers::groups::CreateGroupRequest,
            crate::handlers::groups::UpdateGroupRequest,
            crate::handlers::groups::GroupResponse,
            crate::handlers::groups::GroupDetailResponse,
            crate::handlers::groups::GroupMemberEntry,
            crate::handlers::groups::GroupOrphanEntry,
            crate::handlers::memberships::AddMemberRequest,
            crate::handlers::memberships::UpdateMemberRequest,
            crate::handlers::memberships::MembershipResponse,
            crate::handlers::memberships::PeriodBody,
            crate::handlers::statement::GroupStatementResponse,
            crate::handlers::statement::MemberStatement,
            crate::handlers::statement::SponsorDebtResponse,
            crate::handlers::statement::GroupDebtEntry,
            crate::handlers::payments::RecordPaymentRequest,
            crate::handlers::payments::PaymentResponse,
            crate::handlers::orphan_payments::RecordOrphanPaymentRequest,
            crate::handlers::orphan_payments::OrphanPaymentResponse,
        )
    ),
    tags(
        (name = "health", description = "Health check endpoints"),
        (name = "sponsors", description = "Sponsor management endpoints"),
        (name = "orphans", description = "Orphan management endpoints"),
        (name = "groups", description = "Group and roster management endpoints"),
        (name = "memberships", description = "Group membership and period endpoints"),
        (name = "statement", description = "Accrual statement and debt endpoints"),
        (name = "payments", description = "Payment ledger endpoints"),
        (name = "dashboard", description = "Dashboard aggregate endpoints"),
    ),
    info(
        title = "Kefalet API",
        description = "Sponsorship bookkeeping API - tracks groups, sponsors, orphans, and the monthly payment ledger",
        version = "0.1.0",
        license(
            name = "MIT",
            url = "https://opensource.org/licenses/MIT"
        )
    )
)]
pub struct ApiDoc;
