//! Accrual calculator: walks a span of calendar months for one membership
//! and determines, per month, the amount owed and whether it has been
//! recorded as paid.

use std::collections::{BTreeMap, HashMap};

use common::{MonthRef, MonthlyStatus};
use model::entities::{group, membership, payment};
use rust_decimal::Decimal;
use tracing::{instrument, warn};

use crate::calendar::{self, Period};
use crate::error::Result;

/// Per-month status plus the running total of unpaid amounts.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AccrualOutcome {
    /// Keyed `YYYY-MM`; zero-padded so map order is chronological.
    /// Months where the sponsor was not obligated are absent.
    pub monthly_status: BTreeMap<String, MonthlyStatus>,
    /// Sum of `amount` over all unpaid entries.
    pub total_debt: Decimal,
}

/// The month accrual starts for a membership: the group's configured start
/// month, or the earliest period start when the group has none.
pub fn accrual_start(group: &group::Model, periods: &[Period]) -> Option<MonthRef> {
    match (group.start_year, group.start_month) {
        (Some(year), Some(month)) => MonthRef::new(year, month),
        _ => periods.iter().map(|p| p.from).min(),
    }
}

/// Computes the accrual for one membership over `[from, to]`, both months
/// inclusive.
///
/// For each month the sponsor was obligated (per the membership calendar):
/// an existing ledger row for the (sponsor, group, month, year) key is
/// recorded verbatim; a missing row becomes a pending entry priced at the
/// membership's custom amount, falling back to the group fee. A membership
/// with neither rate accrues zero — that is a data-quality problem, not an
/// error, so it is logged and the walk continues.
///
/// Pure function of its inputs: same periods, payments, and bounds always
/// yield the same outcome.
#[instrument(skip(group, payments, periods), fields(membership_id = membership.id))]
pub fn compute_accrual(
    membership: &membership::Model,
    group: &group::Model,
    payments: &[payment::Model],
    periods: &[Period],
    from: MonthRef,
    to: MonthRef,
) -> Result<AccrualOutcome> {
    let mut outcome = AccrualOutcome::default();

    // Index this membership's ledger rows by month. Extraneous rows for
    // other keys are tolerated and ignored.
    let by_month: HashMap<MonthRef, &payment::Model> = payments
        .iter()
        .filter(|p| p.sponsor_id == membership.sponsor_id && p.group_id == membership.group_id)
        .filter_map(|p| MonthRef::new(p.year, p.month).map(|m| (m, p)))
        .collect();

    let rate = membership.custom_amount.or(group.per_person_fee);
    if rate.is_none() {
        warn!(
            membership_id = membership.id,
            group_id = group.id,
            "no custom amount and no group fee, months without a ledger row accrue zero"
        );
    }

    for month in from.iter_through(to) {
        if !calendar::is_obligated(periods, month) {
            continue;
        }

        let status = match by_month.get(&month) {
            Some(row) => MonthlyStatus {
                is_paid: row.is_paid,
                amount: row.amount,
                paid_at: row.paid_at,
            },
            None => MonthlyStatus::pending(rate.unwrap_or(Decimal::ZERO)),
        };

        if !status.is_paid {
            outcome.total_debt += status.amount;
        }
        outcome.monthly_status.insert(month.to_string(), status);
    }

    Ok(outcome)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn month(year: i32, m: i32) -> MonthRef {
        MonthRef::new(year, m).unwrap()
    }

    fn test_group(per_person_fee: Option<Decimal>) -> group::Model {
        group::Model {
            id: 1,
            name: "Siyer".to_string(),
            per_person_fee,
            start_month: Some(1),
            start_year: Some(2024),
            created_at: Utc::now(),
        }
    }

    fn test_membership(custom_amount: Option<Decimal>) -> membership::Model {
        membership::Model {
            id: 1,
            group_id: 1,
            sponsor_id: 7,
            custom_amount,
            is_active: true,
        }
    }

    fn open_periods(from_year: i32, from_month: i32) -> Vec<Period> {
        vec![Period {
            from: month(from_year, from_month),
            to: None,
        }]
    }

    fn paid_row(m: i32, year: i32, amount: Decimal) -> payment::Model {
        payment::Model {
            id: 0,
            sponsor_id: 7,
            group_id: 1,
            month: m,
            year,
            amount,
            is_paid: true,
            paid_at: Some(Utc::now()),
            description: None,
            created_at: Utc::now(),
        }
    }

    fn unpaid_row(m: i32, year: i32, amount: Decimal) -> payment::Model {
        payment::Model {
            is_paid: false,
            paid_at: None,
            ..paid_row(m, year, amount)
        }
    }

    #[test]
    fn test_missing_row_synthesizes_pending_at_group_fee() {
        // Group fee 100, no custom amount, no ledger row for March 2024.
        let group = test_group(Some(Decimal::new(10000, 2)));
        let membership = test_membership(None);
        let outcome = compute_accrual(
            &membership,
            &group,
            &[],
            &open_periods(2024, 1),
            month(2024, 3),
            month(2024, 3),
        )
        .unwrap();

        let entry = &outcome.monthly_status["2024-03"];
        assert!(!entry.is_paid);
        assert_eq!(entry.amount, Decimal::new(10000, 2));
        assert_eq!(outcome.total_debt, Decimal::new(10000, 2));
    }

    #[test]
    fn test_custom_amount_overrides_group_fee() {
        let group = test_group(Some(Decimal::new(10000, 2)));
        let membership = test_membership(Some(Decimal::new(12500, 2)));
        let outcome = compute_accrual(
            &membership,
            &group,
            &[],
            &open_periods(2024, 1),
            month(2024, 1),
            month(2024, 2),
        )
        .unwrap();

        assert_eq!(outcome.total_debt, Decimal::new(25000, 2));
        assert_eq!(
            outcome.monthly_status["2024-01"].amount,
            Decimal::new(12500, 2)
        );
    }

    #[test]
    fn test_missing_rates_degrade_to_zero() {
        // No custom amount and no group fee: pending entries at zero, never
        // an error.
        let group = test_group(None);
        let membership = test_membership(None);
        let outcome = compute_accrual(
            &membership,
            &group,
            &[],
            &open_periods(2024, 1),
            month(2024, 1),
            month(2024, 3),
        )
        .unwrap();

        assert_eq!(outcome.monthly_status.len(), 3);
        assert_eq!(outcome.total_debt, Decimal::ZERO);
    }

    #[test]
    fn test_existing_rows_recorded_verbatim() {
        let group = test_group(Some(Decimal::new(10000, 2)));
        let membership = test_membership(None);
        // The recorded amount differs from the current rate; the row wins.
        let rows = vec![
            paid_row(1, 2024, Decimal::new(8000, 2)),
            unpaid_row(2, 2024, Decimal::new(9000, 2)),
        ];
        let outcome = compute_accrual(
            &membership,
            &group,
            &rows,
            &open_periods(2024, 1),
            month(2024, 1),
            month(2024, 3),
        )
        .unwrap();

        let jan = &outcome.monthly_status["2024-01"];
        assert!(jan.is_paid);
        assert_eq!(jan.amount, Decimal::new(8000, 2));
        assert!(jan.paid_at.is_some());

        // Unpaid recorded row plus the synthesized March entry.
        assert_eq!(
            outcome.total_debt,
            Decimal::new(9000, 2) + Decimal::new(10000, 2)
        );
    }

    #[test]
    fn test_unobligated_months_emit_nothing() {
        let group = test_group(Some(Decimal::new(10000, 2)));
        let membership = test_membership(None);
        // Obligated only from March.
        let outcome = compute_accrual(
            &membership,
            &group,
            &[],
            &open_periods(2024, 3),
            month(2024, 1),
            month(2024, 4),
        )
        .unwrap();

        assert!(!outcome.monthly_status.contains_key("2024-01"));
        assert!(!outcome.monthly_status.contains_key("2024-02"));
        assert_eq!(outcome.monthly_status.len(), 2);
        assert_eq!(outcome.total_debt, Decimal::new(20000, 2));
    }

    #[test]
    fn test_rows_for_other_keys_are_ignored() {
        let group = test_group(Some(Decimal::new(10000, 2)));
        let membership = test_membership(None);
        let mut foreign = paid_row(1, 2024, Decimal::new(5000, 2));
        foreign.sponsor_id = 99;
        let outcome = compute_accrual(
            &membership,
            &group,
            &[foreign],
            &open_periods(2024, 1),
            month(2024, 1),
            month(2024, 1),
        )
        .unwrap();

        // The foreign row must not mask the synthesized pending entry.
        assert_eq!(outcome.total_debt, Decimal::new(10000, 2));
    }

    #[test]
    fn test_idempotent() {
        let group = test_group(Some(Decimal::new(10000, 2)));
        let membership = test_membership(None);
        let rows = vec![unpaid_row(2, 2024, Decimal::new(9000, 2))];
        let periods = open_periods(2024, 1);

        let first = compute_accrual(
            &membership,
            &group,
            &rows,
            &periods,
            month(2024, 1),
            month(2024, 6),
        )
        .unwrap();
        let second = compute_accrual(
            &membership,
            &group,
            &rows,
            &periods,
            month(2024, 1),
            month(2024, 6),
        )
        .unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_total_debt_equals_sum_of_unpaid_entries() {
        let group = test_group(Some(Decimal::new(10000, 2)));
        let membership = test_membership(None);
        let rows = vec![
            paid_row(1, 2024, Decimal::new(10000, 2)),
            unpaid_row(3, 2024, Decimal::new(7500, 2)),
        ];
        let outcome = compute_accrual(
            &membership,
            &group,
            &rows,
            &open_periods(2024, 1),
            month(2024, 1),
            month(2024, 5),
        )
        .unwrap();

        let unpaid_sum: Decimal = outcome
            .monthly_status
            .values()
            .filter(|s| !s.is_paid)
            .map(|s| s.amount)
            .sum();
        assert_eq!(outcome.total_debt, unpaid_sum);
    }

    #[test]
    fn test_reversed_bounds_yield_empty_outcome() {
        let group = test_group(Some(Decimal::new(10000, 2)));
        let membership = test_membership(None);
        let outcome = compute_accrual(
            &membership,
            &group,
            &[],
            &open_periods(2024, 1),
            month(2024, 6),
            month(2024, 1),
        )
        .unwrap();
        assert!(outcome.monthly_status.is_empty());
        assert_eq!(outcome.total_debt, Decimal::ZERO);
    }

    #[test]
    fn test_accrual_start_prefers_group_date() {
        let group = test_group(Some(Decimal::new(10000, 2)));
        let periods = open_periods(2023, 5);
        assert_eq!(accrual_start(&group, &periods), Some(month(2024, 1)));
    }

    #[test]
    fn test_accrual_start_falls_back_to_earliest_period() {
        let mut group = test_group(None);
        group.start_month = None;
        group.start_year = None;
        let periods = vec![
            Period {
                from: month(2024, 7),
                to: None,
            },
            Period {
                from: month(2023, 5),
                to: Some(month(2023, 12)),
            },
        ];
        assert_eq!(accrual_start(&group, &periods), Some(month(2023, 5)));
        assert_eq!(accrual_start(&group, &[]), None);
    }
}
