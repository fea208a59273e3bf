//! Collaborator interfaces consumed by the return leg.
//!
//! - [`ValuationSchedule`]: indexed (value date, payment date) pairs
//! - [`NotionalChangeInfo`]: a single amortization event
//! - [`PriceCalculator`]: price observation and return conventions of the underlying
//! - [`RecoveryRate`]: recovery-rate term structure used after a credit event

use std::fmt;

use crate::error::TrsResult;
use crate::types::Date;

/// An ordered valuation schedule.
///
/// Implementations must present strictly increasing value dates. Indexing is
/// zero-based and callers never ask for an index `>= len()`.
pub trait ValuationSchedule: Send + Sync {
    /// Number of valuation periods.
    fn len(&self) -> usize;

    /// Returns true if there are no periods.
    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Observation date of period `i`.
    fn value_date(&self, i: usize) -> Date;

    /// Settlement date of period `i`.
    fn payment_date(&self, i: usize) -> Date;
}

/// A change of outstanding notional on the underlying.
pub trait NotionalChangeInfo {
    /// Date the change takes effect.
    fn date(&self) -> Date;

    /// Outstanding notional just before the change.
    fn notional_before_change(&self) -> f64;

    /// Outstanding notional just after the change.
    fn notional_after_change(&self) -> f64;

    /// End of credit-risk exposure, present only when the change is itself a payment.
    fn credit_risk_end_date(&self) -> Option<Date> {
        None
    }
}

/// Price observation capability for the underlying asset.
///
/// Prices are quoted per unit of face by default (`par_price() == 1.0`).
/// Failures are reported through `price` and surface as failures of the
/// individual payment amount that needed them.
pub trait PriceCalculator: Send + Sync + fmt::Debug {
    /// Observes the underlying's price on `date`.
    fn price(&self, date: Date) -> TrsResult<f64>;

    /// Price at which principal redeems.
    fn par_price(&self) -> f64 {
        1.0
    }

    /// Return between two price levels.
    ///
    /// Absolute returns are price differences; relative returns are the
    /// percentage move from `begin_price`.
    fn calculate_return(&self, begin_price: f64, end_price: f64, is_absolute: bool) -> f64 {
        if is_absolute {
            end_price - begin_price
        } else {
            end_price / begin_price - 1.0
        }
    }
}

/// Recovery rate as a function of date.
pub trait RecoveryRate: Send + Sync {
    /// Recovery rate (fraction of par) applying on `date`.
    fn recovery_rate(&self, date: Date) -> f64;
}

impl<F> RecoveryRate for F
where
    F: Fn(Date) -> f64 + Send + Sync,
{
    fn recovery_rate(&self, date: Date) -> f64 {
        self(date)
    }
}

/// A constant recovery rate.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FlatRecoveryRate(pub f64);

impl RecoveryRate for FlatRecoveryRate {
    fn recovery_rate(&self, _date: Date) -> f64 {
        self.0
    }
}
