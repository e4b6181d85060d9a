use thiserror::Error;

/// Error types for the obligation engine.
///
/// The engine assumes pre-validated input, so these only surface when the
/// caller hands in malformed period data that the write-time validation
/// should have rejected.
#[derive(Error, Debug, PartialEq, Eq)]
pub enum EngineError {
    /// A month number outside 1-12.
    #[error("invalid month {month}, expected 1-12")]
    InvalidMonth { month: i32 },

    /// A period whose end precedes its start.
    #[error("period ends {to} before it starts {from}")]
    InvertedPeriod { from: String, to: String },

    /// Two periods of the same membership cover a common month.
    #[error("periods starting {first} and {second} overlap")]
    OverlappingPeriods { first: String, second: String },

    /// An open-ended period that is not the chronologically last one.
    #[error("open-ended period starting {from} must be the last period")]
    OpenPeriodNotLast { from: String },
}

/// Type alias for Result with EngineError.
pub type Result<T> = std::result::Result<T, EngineError>;
