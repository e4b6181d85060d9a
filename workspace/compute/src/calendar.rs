//! Membership calendar: decides whether a sponsor was an obligated member of
//! a group during a given calendar month.
//!
//! The period data used to live as hardcoded lookup tables inside the
//! dashboard UI; here it is first-class input read from the membership's
//! `membership_period` rows. A membership with no periods is never
//! obligated — callers must supply explicit periods for every membership
//! that should accrue.

use common::MonthRef;
use model::entities::membership_period;

use crate::error::{EngineError, Result};

/// A closed-or-open range of calendar months, both bounds inclusive.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Period {
    pub from: MonthRef,
    /// `None` means open-ended (still obligated).
    pub to: Option<MonthRef>,
}

impl Period {
    /// True when the month falls inside this period. Comparison is
    /// lexicographic on (year, month); the month right after a closed `to`
    /// is already outside.
    pub fn contains(&self, at: MonthRef) -> bool {
        at >= self.from && self.to.map_or(true, |to| at <= to)
    }

    fn from_model(row: &membership_period::Model) -> Result<Self> {
        let from = MonthRef::new(row.from_year, row.from_month)
            .ok_or(EngineError::InvalidMonth { month: row.from_month })?;
        let to = match (row.to_year, row.to_month) {
            (Some(year), Some(month)) => Some(
                MonthRef::new(year, month).ok_or(EngineError::InvalidMonth { month })?,
            ),
            _ => None,
        };
        Ok(Self { from, to })
    }
}

/// Converts a membership's period rows into engine periods,
/// ordered by start month.
pub fn periods_from_models(rows: &[membership_period::Model]) -> Result<Vec<Period>> {
    let mut periods = rows
        .iter()
        .map(Period::from_model)
        .collect::<Result<Vec<_>>>()?;
    periods.sort_by_key(|p| p.from);
    Ok(periods)
}

/// Whether the sponsor was obligated in the given month: true iff the month
/// falls within any period. Pure function of the period list; re-evaluated
/// on every query because admins edit periods.
pub fn is_obligated(periods: &[Period], at: MonthRef) -> bool {
    periods.iter().any(|p| p.contains(at))
}

/// Validates a period list the way the write path must before persisting:
/// every period well-formed, no two periods overlapping, and an open-ended
/// period only in the last position. The engine itself assumes this holds.
pub fn validate_periods(periods: &[Period]) -> Result<()> {
    let mut sorted = periods.to_vec();
    sorted.sort_by_key(|p| p.from);

    for pair in sorted.windows(2) {
        let (a, b) = (pair[0], pair[1]);
        match a.to {
            None => {
                return Err(EngineError::OpenPeriodNotLast {
                    from: a.from.to_string(),
                });
            }
            Some(to) if b.from <= to => {
                return Err(EngineError::OverlappingPeriods {
                    first: a.from.to_string(),
                    second: b.from.to_string(),
                });
            }
            Some(_) => {}
        }
    }

    for p in &sorted {
        if let Some(to) = p.to {
            if to < p.from {
                return Err(EngineError::InvertedPeriod {
                    from: p.from.to_string(),
                    to: to.to_string(),
                });
            }
        }
    }

    Ok(())
}
