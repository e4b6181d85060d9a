//! Common transport-layer types shared between the backend handlers and the
//! obligation engine. These structs mirror the API payloads so the engine can
//! produce them directly without a reshaping layer in the handlers.

mod dashboard;
mod month;

pub use dashboard::{BalanceSummary, DashboardData, DashboardStats, DebtorEntry};
pub use month::MonthRef;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Payment status of a single obligated month within a membership.
///
/// Either a verbatim copy of a recorded ledger row or a synthesized pending
/// entry when no row exists yet for that month.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, PartialEq)]
pub struct MonthlyStatus {
    /// Whether the obligation for this month has been settled.
    pub is_paid: bool,
    /// Amount owed or paid for this month.
    pub amount: Decimal,
    /// When the payment was recorded as paid, if it was.
    pub paid_at: Option<DateTime<Utc>>,
}

impl MonthlyStatus {
    /// A pending entry for a month that has no ledger row yet.
    pub fn pending(amount: Decimal) -> Self {
        Self {
            is_paid: false,
            amount,
            paid_at: None,
        }
    }
}
