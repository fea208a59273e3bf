//! Error types shared by the TRS crates.
//!
//! These cover malformed upstream data (dates, schedules, amortization feeds)
//! and failures reported by external price calculators.

use thiserror::Error;

/// A specialized Result type for core TRS operations.
pub type TrsResult<T> = Result<T, TrsError>;

/// The main error type for core TRS operations.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum TrsError {
    /// Error in date calculations or invalid date.
    #[error("Invalid date: {message}")]
    InvalidDate {
        /// Description of the date error.
        message: String,
    },

    /// Currency code not recognized.
    #[error("Unknown currency code: {code}")]
    UnknownCurrency {
        /// The unrecognized code.
        code: String,
    },

    /// Valuation schedule violates its ordering contract.
    #[error("Invalid valuation schedule: {reason}")]
    InvalidSchedule {
        /// Description of what's invalid.
        reason: String,
    },

    /// Notional-change events are not sorted ascending by date.
    #[error("Notional change feed out of order: {later} listed before {earlier}")]
    UnsortedNotionalFeed {
        /// The date that appears first in the feed.
        later: String,
        /// The earlier date that follows it.
        earlier: String,
    },

    /// Notional-change event carries a non-finite or otherwise unusable amount.
    #[error("Invalid notional change on {date}: {reason}")]
    InvalidNotionalChange {
        /// Date of the offending event.
        date: String,
        /// Reason for invalidity.
        reason: String,
    },

    /// Price could not be resolved for a date.
    #[error("Price unavailable on {date}: {reason}")]
    PriceUnavailable {
        /// Date of the requested observation.
        date: String,
        /// Reason reported by the calculator.
        reason: String,
    },
}

impl TrsError {
    /// Creates an invalid date error.
    #[must_use]
    pub fn invalid_date(message: impl Into<String>) -> Self {
        Self::InvalidDate {
            message: message.into(),
        }
    }

    /// Creates an invalid schedule error.
    #[must_use]
    pub fn invalid_schedule(reason: impl Into<String>) -> Self {
        Self::InvalidSchedule {
            reason: reason.into(),
        }
    }

    /// Creates a price unavailable error.
    #[must_use]
    pub fn price_unavailable(date: impl ToString, reason: impl Into<String>) -> Self {
        Self::PriceUnavailable {
            date: date.to_string(),
            reason: reason.into(),
        }
    }
}
