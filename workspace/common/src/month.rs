use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};
use std::fmt;
use utoipa::ToSchema;

/// A calendar month identified by year and month number (1-12).
///
/// Ordering is lexicographic on (year, month), which is exactly the
/// chronological order, so `MonthRef` can be compared and used as a range
/// bound directly. The derived field order matters for `Ord`.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, ToSchema,
)]
pub struct MonthRef {
    pub year: i32,
    pub month: i32,
}

impl MonthRef {
    /// Builds a month reference, returning `None` for an out-of-range month.
    pub fn new(year: i32, month: i32) -> Option<Self> {
        if (1..=12).contains(&month) {
            Some(Self { year, month })
        } else {
            None
        }
    }

    /// The month a given calendar date falls in.
    pub fn from_date(date: NaiveDate) -> Self {
        Self {
            year: date.year(),
            month: date.month() as i32,
        }
    }

    /// The month immediately after this one.
    pub fn succ(self) -> Self {
        if self.month == 12 {
            Self {
                year: self.year + 1,
                month: 1,
            }
        } else {
            Self {
                year: self.year,
                month: self.month + 1,
            }
        }
    }

    /// Iterates every month from `self` through `to`, both inclusive.
    /// Empty when `to` precedes `self`.
    pub fn iter_through(self, to: MonthRef) -> impl Iterator<Item = MonthRef> {
        let mut cursor = self;
        std::iter::from_fn(move || {
            if cursor > to {
                return None;
            }
            let current = cursor;
            cursor = cursor.succ();
            Some(current)
        })
    }
}

impl fmt::Display for MonthRef {
    /// Renders as `YYYY-MM`, zero padded so string order matches
    /// chronological order.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:04}-{:02}", self.year, self.month)
    }
}
