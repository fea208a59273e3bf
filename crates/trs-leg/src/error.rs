//! Error types for return-leg operations.

use thiserror::Error;

use crate::config::ValidationError;

/// A specialized Result type for return-leg operations.
pub type LegResult<T> = Result<T, LegError>;

/// Errors that can occur while building or sequencing a return leg.
///
/// A credit default is not an error: it ends the payment sequence with a
/// final settlement payment.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum LegError {
    /// Invalid leg specification.
    #[error("Invalid return leg: {reason}")]
    InvalidLeg {
        /// Description of what's invalid.
        reason: String,
    },

    /// Missing required field.
    #[error("Missing required field: {field}")]
    MissingField {
        /// The missing field name.
        field: String,
    },

    /// A valuation date does not advance past the previous boundary.
    #[error("Valuation period {period} out of order: {date} is not after {previous}")]
    ScheduleOutOfOrder {
        /// One-based period number.
        period: usize,
        /// Offending date.
        date: String,
        /// Boundary it should have followed.
        previous: String,
    },

    /// Outstanding balance fell below the round-off tolerance.
    #[error("Outstanding balance {balance} on {date} is negative")]
    NegativeBalance {
        /// Date the balance was observed.
        date: String,
        /// The offending balance.
        balance: f64,
    },

    /// Configuration failed validation.
    #[error("Invalid configuration: {0:?}")]
    InvalidConfig(Vec<ValidationError>),

    /// Core library error.
    #[error("Core error: {0}")]
    CoreError(#[from] trs_core::TrsError),
}

impl LegError {
    /// Creates an invalid leg error.
    #[must_use]
    pub fn invalid_leg(reason: impl Into<String>) -> Self {
        Self::InvalidLeg {
            reason: reason.into(),
        }
    }

    /// Creates a missing field error.
    #[must_use]
    pub fn missing_field(field: impl Into<String>) -> Self {
        Self::MissingField {
            field: field.into(),
        }
    }

    /// Returns true if the error reports malformed schedule or amortization data.
    #[must_use]
    pub fn is_contract_violation(&self) -> bool {
        matches!(
            self,
            LegError::ScheduleOutOfOrder { .. }
                | LegError::NegativeBalance { .. }
                | LegError::CoreError(
                    trs_core::TrsError::InvalidSchedule { .. }
                        | trs_core::TrsError::UnsortedNotionalFeed { .. }
                        | trs_core::TrsError::InvalidNotionalChange { .. }
                )
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use trs_core::TrsError;

    #[test]
    fn test_error_display() {
        let err = LegError::ScheduleOutOfOrder {
            period: 2,
            date: "2020-06-01".to_string(),
            previous: "2020-07-01".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "Valuation period 2 out of order: 2020-06-01 is not after 2020-07-01"
        );
    }

    #[test]
    fn test_contract_violation_classification() {
        let negative = LegError::NegativeBalance {
            date: "2021-01-01".to_string(),
            balance: -0.1,
        };
        assert!(negative.is_contract_violation());

        let unsorted: LegError = TrsError::UnsortedNotionalFeed {
            later: "2021-01-01".to_string(),
            earlier: "2020-01-01".to_string(),
        }
        .into();
        assert!(unsorted.is_contract_violation());

        let price: LegError = TrsError::price_unavailable("2021-01-01", "stale").into();
        assert!(!price.is_contract_violation());
        assert!(!LegError::missing_field("schedule").is_contract_violation());
    }
}
