//! Valuation schedule for a return leg.

use serde::{Deserialize, Serialize};

use super::Date;
use crate::error::{TrsError, TrsResult};
use crate::traits::ValuationSchedule;

/// One valuation period: the observation (value) date and the lagged
/// settlement (payment) date.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ValuationPeriod {
    /// Date on which the underlying's price is observed.
    pub value_date: Date,
    /// Date on which cash settles.
    pub payment_date: Date,
}

impl ValuationPeriod {
    /// Creates a new valuation period.
    #[must_use]
    pub fn new(value_date: Date, payment_date: Date) -> Self {
        Self {
            value_date,
            payment_date,
        }
    }
}

/// An ordered list of valuation periods following a leg's effective date.
///
/// Construction validates that value dates are strictly increasing, that the
/// first one falls after the effective date, and that no payment date precedes
/// its own value date.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValuationPeriods {
    effective_date: Date,
    periods: Vec<ValuationPeriod>,
}

impl ValuationPeriods {
    /// Creates a validated schedule.
    ///
    /// # Errors
    ///
    /// Returns `TrsError::InvalidSchedule` when the ordering contract is broken.
    pub fn new(effective_date: Date, periods: Vec<ValuationPeriod>) -> TrsResult<Self> {
        let mut begin = effective_date;
        for (i, period) in periods.iter().enumerate() {
            if period.value_date <= begin {
                return Err(TrsError::invalid_schedule(format!(
                    "value date {} of period {} is not after {}",
                    period.value_date,
                    i + 1,
                    begin
                )));
            }
            if period.payment_date < period.value_date {
                return Err(TrsError::invalid_schedule(format!(
                    "payment date {} of period {} precedes its value date {}",
                    period.payment_date,
                    i + 1,
                    period.value_date
                )));
            }
            begin = period.value_date;
        }

        Ok(Self {
            effective_date,
            periods,
        })
    }

    /// Creates a schedule from `(value_date, payment_date)` pairs.
    pub fn from_pairs(effective_date: Date, pairs: &[(Date, Date)]) -> TrsResult<Self> {
        Self::new(
            effective_date,
            pairs
                .iter()
                .map(|&(value, pay)| ValuationPeriod::new(value, pay))
                .collect(),
        )
    }

    /// Returns the effective date the schedule was validated against.
    #[must_use]
    pub fn effective_date(&self) -> Date {
        self.effective_date
    }

    /// Returns the periods as a slice.
    #[must_use]
    pub fn periods(&self) -> &[ValuationPeriod] {
        &self.periods
    }

    /// Returns the last payment date, if any.
    #[must_use]
    pub fn last_payment_date(&self) -> Option<Date> {
        self.periods.last().map(|p| p.payment_date)
    }
}

impl ValuationSchedule for ValuationPeriods {
    fn len(&self) -> usize {
        self.periods.len()
    }

    fn value_date(&self, i: usize) -> Date {
        self.periods[i].value_date
    }

    fn payment_date(&self, i: usize) -> Date {
        self.periods[i].payment_date
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> Date {
        Date::from_ymd(y, m, d).unwrap()
    }

    #[test]
    fn test_valid_schedule() {
        let schedule = ValuationPeriods::from_pairs(
            date(2020, 1, 1),
            &[
                (date(2020, 7, 1), date(2020, 7, 3)),
                (date(2021, 1, 1), date(2021, 1, 5)),
            ],
        )
        .unwrap();

        assert_eq!(schedule.len(), 2);
        assert_eq!(schedule.value_date(1), date(2021, 1, 1));
        assert_eq!(schedule.payment_date(0), date(2020, 7, 3));
        assert_eq!(schedule.last_payment_date(), Some(date(2021, 1, 5)));
    }

    #[test]
    fn test_first_value_date_must_follow_effective() {
        let result = ValuationPeriods::from_pairs(
            date(2020, 1, 1),
            &[(date(2020, 1, 1), date(2020, 1, 3))],
        );
        assert!(matches!(result, Err(TrsError::InvalidSchedule { .. })));
    }

    #[test]
    fn test_out_of_order_value_dates_rejected() {
        let result = ValuationPeriods::from_pairs(
            date(2020, 1, 1),
            &[
                (date(2021, 1, 1), date(2021, 1, 5)),
                (date(2020, 7, 1), date(2020, 7, 3)),
            ],
        );
        assert!(result.is_err());
    }

    #[test]
    fn test_payment_before_value_date_rejected() {
        let result = ValuationPeriods::from_pairs(
            date(2020, 1, 1),
            &[(date(2020, 7, 1), date(2020, 6, 30))],
        );
        assert!(result.is_err());
    }

    #[test]
    fn test_empty_schedule() {
        let schedule = ValuationPeriods::new(date(2020, 1, 1), Vec::new()).unwrap();
        assert!(schedule.is_empty());
        assert_eq!(schedule.last_payment_date(), None);
    }
}
