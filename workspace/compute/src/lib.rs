//! The obligation engine: pure, synchronous computation over ledger rows
//! already fetched into memory.
//!
//! Three cooperating parts, leaf first:
//! - [`calendar`] answers whether a sponsor was obligated in a given month,
//!   based on the membership's period list. No dependencies.
//! - [`accrual`] walks a span of months for one membership and reports, per
//!   month, the amount owed and whether it was recorded as paid.
//! - [`dashboard`] combines ledger rows across all sponsors and groups into
//!   system-wide totals and a ranked debtor list.
//!
//! Nothing here touches the database or the clock; the caller fetches rows
//! (in one transaction when consistency across figures matters) and passes
//! an explicit as-of month.

pub mod accrual;
pub mod calendar;
pub mod dashboard;
pub mod error;

pub use error::{EngineError, Result};
