use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Entity counts displayed on the dashboard.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, PartialEq)]
pub struct DashboardStats {
    pub total_groups: u64,
    pub total_sponsors: u64,
    pub total_orphans: u64,
}

/// System-wide money figures, all derived from one snapshot of the ledger.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, PartialEq)]
pub struct BalanceSummary {
    /// Total paid income minus total paid disbursements, all time.
    pub current: Decimal,
    /// Paid income recorded for the as-of month.
    pub monthly_income: Decimal,
    /// Total paid disbursements to orphans, all time.
    pub monthly_expense: Decimal,
    /// Sum of all unpaid ledger rows, all time.
    pub total_debt: Decimal,
    /// Shown as the month-over-month delta; equals `monthly_income`.
    pub monthly_change: Decimal,
}

/// One entry in the ranked list of sponsors with outstanding debt.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, PartialEq)]
pub struct DebtorEntry {
    pub sponsor_id: i32,
    pub name: String,
    /// Unpaid amounts summed across all of the sponsor's groups.
    pub amount: Decimal,
}

/// The full dashboard payload.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, PartialEq)]
pub struct DashboardData {
    pub stats: DashboardStats,
    pub balance: BalanceSummary,
    /// At most ten entries, sorted non-increasing by amount.
    pub debtors: Vec<DebtorEntry>,
}
