//! Return-leg configuration.
//!
//! Numeric tolerances and conventions that shape payment sequencing. The
//! configuration is passed explicitly to each leg; nothing is read from
//! global state.

use serde::{Deserialize, Serialize};

use crate::error::{LegError, LegResult};

// =============================================================================
// RETURN LEG CONFIGURATION
// =============================================================================

/// Configuration for return-leg payment generation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReturnLegConfig {
    /// Round-off tolerance below zero for the outstanding balance.
    #[serde(default = "default_balance_tolerance")]
    pub balance_tolerance: f64,

    /// Scale factors within this distance of 1.0 are not applied.
    #[serde(default = "default_scale_tolerance")]
    pub scale_tolerance: f64,

    /// Days after the default settle date at which the final accrual ends.
    #[serde(default = "default_accrual_lag_days")]
    pub default_accrual_lag_days: i64,
}

fn default_balance_tolerance() -> f64 {
    1e-15
}

fn default_scale_tolerance() -> f64 {
    1e-12
}

fn default_accrual_lag_days() -> i64 {
    1
}

impl Default for ReturnLegConfig {
    fn default() -> Self {
        Self {
            balance_tolerance: default_balance_tolerance(),
            scale_tolerance: default_scale_tolerance(),
            default_accrual_lag_days: default_accrual_lag_days(),
        }
    }
}

impl ReturnLegConfig {
    /// Creates the default configuration.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the negative-balance tolerance.
    #[must_use]
    pub fn with_balance_tolerance(mut self, tolerance: f64) -> Self {
        self.balance_tolerance = tolerance;
        self
    }

    /// Sets the scale-factor tolerance.
    #[must_use]
    pub fn with_scale_tolerance(mut self, tolerance: f64) -> Self {
        self.scale_tolerance = tolerance;
        self
    }

    /// Sets the accrual lag applied after a default settle date.
    #[must_use]
    pub fn with_default_accrual_lag_days(mut self, days: i64) -> Self {
        self.default_accrual_lag_days = days;
        self
    }

    /// Parses a configuration from JSON, filling omitted fields with defaults.
    pub fn from_json_str(json: &str) -> LegResult<Self> {
        let config: Self = serde_json::from_str(json)
            .map_err(|e| LegError::invalid_leg(format!("config parse error: {e}")))?;
        config.validate_or_error()?;
        Ok(config)
    }

    /// Validates the configuration.
    ///
    /// Returns a list of validation errors, or an empty vector if valid.
    pub fn validate(&self) -> Vec<ValidationError> {
        let mut errors = Vec::new();

        if !(self.balance_tolerance >= 0.0 && self.balance_tolerance <= 1e-6) {
            errors.push(ValidationError::with_rule(
                "balance_tolerance",
                "Balance tolerance must be between 0 and 1e-6",
                "valid_tolerance",
            ));
        }

        if !(self.scale_tolerance >= 0.0 && self.scale_tolerance <= 1e-6) {
            errors.push(ValidationError::with_rule(
                "scale_tolerance",
                "Scale tolerance must be between 0 and 1e-6",
                "valid_tolerance",
            ));
        }

        if self.default_accrual_lag_days < 0 || self.default_accrual_lag_days > 30 {
            errors.push(ValidationError::with_rule(
                "default_accrual_lag_days",
                format!(
                    "Accrual lag {} must be between 0 and 30 days",
                    self.default_accrual_lag_days
                ),
                "valid_lag",
            ));
        }

        errors
    }

    /// Validates and returns an error if invalid.
    pub fn validate_or_error(&self) -> LegResult<()> {
        let errors = self.validate();
        if errors.is_empty() {
            Ok(())
        } else {
            Err(LegError::InvalidConfig(errors))
        }
    }
}

/// A single validation error.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationError {
    /// Field that failed validation.
    pub field: String,
    /// Validation error message.
    pub message: String,
    /// Validation rule that was violated.
    pub rule: Option<String>,
}

impl ValidationError {
    /// Creates a new validation error.
    pub fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
            rule: None,
        }
    }

    /// Creates a validation error with a rule name.
    pub fn with_rule(
        field: impl Into<String>,
        message: impl Into<String>,
        rule: impl Into<String>,
    ) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
            rule: Some(rule.into()),
        }
    }
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if let Some(ref rule) = self.rule {
            write!(f, "{}: {} (rule: {})", self.field, self.message, rule)
        } else {
            write!(f, "{}: {}", self.field, self.message)
        }
    }
}
