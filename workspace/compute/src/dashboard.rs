//! Balance aggregator: folds the two ledgers into the system-wide figures
//! shown on the dashboard.
//!
//! All figures must come from one snapshot of the ledger tables; the caller
//! is responsible for fetching every row collection inside a single
//! transaction so the totals stay mutually consistent.

use std::collections::HashMap;

use common::{BalanceSummary, DebtorEntry, MonthRef};
use model::entities::{group_orphan_payment, payment, sponsor};
use rust_decimal::Decimal;
use tracing::{instrument, warn};

/// How many debtors the dashboard lists.
const DEBTOR_LIMIT: usize = 10;

/// Money figures plus the ranked debtor list, ready for the dashboard
/// payload. Entity counts are the caller's concern.
#[derive(Debug, Clone, PartialEq)]
pub struct DashboardFigures {
    pub balance: BalanceSummary,
    pub debtors: Vec<DebtorEntry>,
}

/// Computes all dashboard figures from one ledger snapshot.
///
/// - income = paid sponsor-ledger amounts, all time;
/// - disbursed = paid orphan-ledger amounts, all time;
/// - current balance = income - disbursed, exact decimal arithmetic;
/// - monthly income = paid sponsor-ledger amounts in the as-of month;
/// - total debt = unpaid sponsor-ledger amounts, all time;
/// - debtors = unpaid amounts summed per sponsor, sorted descending,
///   first-encountered sponsor winning ties, truncated to ten.
#[instrument(skip_all, fields(payments = payments.len(), orphan_payments = orphan_payments.len(), %as_of))]
pub fn compute_dashboard(
    payments: &[payment::Model],
    orphan_payments: &[group_orphan_payment::Model],
    sponsors: &[sponsor::Model],
    as_of: MonthRef,
) -> DashboardFigures {
    let mut total_income = Decimal::ZERO;
    let mut monthly_income = Decimal::ZERO;
    let mut total_debt = Decimal::ZERO;

    // One sum per sponsor, remembering first-encounter order for stable
    // tie-breaking in the ranked list.
    let mut debts: Vec<DebtorEntry> = Vec::new();
    let mut debt_index: HashMap<i32, usize> = HashMap::new();
    let names: HashMap<i32, &str> = sponsors.iter().map(|s| (s.id, s.name.as_str())).collect();

    for row in payments {
        if row.is_paid {
            total_income += row.amount;
            if row.year == as_of.year && row.month == as_of.month {
                monthly_income += row.amount;
            }
        } else {
            total_debt += row.amount;
            match debt_index.get(&row.sponsor_id) {
                Some(&i) => debts[i].amount += row.amount,
                None => {
                    let name = match names.get(&row.sponsor_id) {
                        Some(name) => (*name).to_string(),
                        None => {
                            // Ledger rows outlive memberships but not
                            // sponsors; an unknown id means the snapshot
                            // is inconsistent.
                            warn!(sponsor_id = row.sponsor_id, "unpaid ledger row for unknown sponsor");
                            format!("sponsor #{}", row.sponsor_id)
                        }
                    };
                    debt_index.insert(row.sponsor_id, debts.len());
                    debts.push(DebtorEntry {
                        sponsor_id: row.sponsor_id,
                        name,
                        amount: row.amount,
                    });
                }
            }
        }
    }

    let total_disbursed: Decimal = orphan_payments
        .iter()
        .filter(|row| row.is_paid)
        .map(|row| row.amount)
        .sum();

    // Stable sort keeps first-encountered order among equal amounts.
    debts.sort_by(|a, b| b.amount.cmp(&a.amount));
    debts.truncate(DEBTOR_LIMIT);

    DashboardFigures {
        balance: BalanceSummary {
            current: total_income - total_disbursed,
            monthly_income,
            monthly_expense: total_disbursed,
            total_debt,
            monthly_change: monthly_income,
        },
        debtors: debts,
    }
}
