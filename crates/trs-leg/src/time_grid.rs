//! Time-grid merging across payments.

use std::collections::BTreeSet;

use trs_core::types::Date;

use crate::payments::Payment;

/// Accumulates the observation dates of a set of payments.
///
/// Each payment contributes its explicit time grid when it has a non-empty
/// one, and its begin and end dates otherwise.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TimeGridMerger {
    dates: BTreeSet<Date>,
}

impl TimeGridMerger {
    /// Creates an empty merger.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds one payment's dates.
    pub fn add(&mut self, payment: &Payment) {
        match payment.time_grids() {
            Some(grid) if !grid.is_empty() => self.dates.extend(grid.iter().copied()),
            _ => {
                self.dates.insert(payment.begin_date());
                self.dates.insert(payment.end_date());
            }
        }
    }

    /// Adds a single date.
    pub fn add_date(&mut self, date: Date) {
        self.dates.insert(date);
    }

    /// Number of distinct dates collected.
    pub fn len(&self) -> usize {
        self.dates.len()
    }

    /// Returns true if no dates have been collected.
    pub fn is_empty(&self) -> bool {
        self.dates.is_empty()
    }

    /// Collected dates in ascending order.
    pub fn dates(&self) -> impl Iterator<Item = Date> + '_ {
        self.dates.iter().copied()
    }

    /// Consumes the merger, returning the sorted, duplicate-free dates.
    pub fn into_dates(self) -> Vec<Date> {
        self.dates.into_iter().collect()
    }
}

impl<'a> Extend<&'a Payment> for TimeGridMerger {
    fn extend<T: IntoIterator<Item = &'a Payment>>(&mut self, iter: T) {
        for payment in iter {
            self.add(payment);
        }
    }
}

impl<'a> FromIterator<&'a Payment> for TimeGridMerger {
    fn from_iter<T: IntoIterator<Item = &'a Payment>>(iter: T) -> Self {
        let mut merger = Self::new();
        merger.extend(iter);
        merger
    }
}

/// Merges the time grids of `payments` into one sorted sequence.
pub fn merge_time_grids<'a, I>(payments: I) -> Vec<Date>
where
    I: IntoIterator<Item = &'a Payment>,
{
    payments
        .into_iter()
        .collect::<TimeGridMerger>()
        .into_dates()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::payments::{PriceReturnPayment, RecoveryReturnPayment};
    use crate::scale::scale_by;
    use std::sync::Arc;
    use trs_core::traits::PriceCalculator;
    use trs_core::{Currency, TrsResult};

    #[derive(Debug)]
    struct Flat;

    impl PriceCalculator for Flat {
        fn price(&self, _date: Date) -> TrsResult<f64> {
            Ok(1.0)
        }
    }

    fn date(y: i32, m: u32, d: u32) -> Date {
        Date::from_ymd(y, m, d).unwrap()
    }

    fn price_return(begin: Date, end: Date) -> Payment {
        PriceReturnPayment::new(begin, end, Currency::USD, begin, end, Arc::new(Flat), None, false)
            .into()
    }

    #[test]
    fn test_begin_end_pairs_deduplicated() {
        let payments = vec![
            price_return(date(2020, 1, 1), date(2020, 7, 1)),
            price_return(date(2020, 7, 1), date(2021, 1, 1)),
        ];
        let dates = merge_time_grids(&payments);
        assert_eq!(
            dates,
            vec![date(2020, 1, 1), date(2020, 7, 1), date(2021, 1, 1)]
        );
    }

    #[test]
    fn test_price_return_contributes_accrual_begin() {
        let payment: Payment = PriceReturnPayment::new(
            date(2020, 1, 3),
            date(2020, 7, 3),
            Currency::USD,
            date(2020, 1, 1),
            date(2020, 7, 1),
            Arc::new(Flat),
            None,
            false,
        )
        .into();
        assert_eq!(
            merge_time_grids(std::slice::from_ref(&payment)),
            vec![date(2020, 1, 1), date(2020, 7, 3)]
        );
    }

    #[test]
    fn test_explicit_grid_replaces_pair() {
        let grid: BTreeSet<Date> = [date(2020, 3, 1), date(2020, 2, 1)].into_iter().collect();
        let recovery: Payment = RecoveryReturnPayment::new(
            date(2020, 1, 1),
            date(2020, 12, 1),
            Currency::USD,
            0.4,
            false,
            Arc::new(Flat),
            None,
        )
        .with_time_grids(Some(grid))
        .into();
        let payments = vec![scale_by(recovery, 0.5), price_return(date(2021, 1, 1), date(2021, 6, 1))];

        let dates = merge_time_grids(&payments);
        assert_eq!(
            dates,
            vec![
                date(2020, 2, 1),
                date(2020, 3, 1),
                date(2021, 1, 1),
                date(2021, 6, 1)
            ]
        );
    }

    #[test]
    fn test_empty_grid_falls_back_to_pair() {
        let recovery: Payment = RecoveryReturnPayment::new(
            date(2020, 1, 1),
            date(2020, 12, 1),
            Currency::USD,
            0.4,
            false,
            Arc::new(Flat),
            None,
        )
        .with_time_grids(Some(BTreeSet::new()))
        .into();

        let mut merger = TimeGridMerger::new();
        merger.add(&recovery);
        merger.add_date(date(2020, 1, 1));
        assert_eq!(merger.len(), 2);
        assert_eq!(merger.into_dates(), vec![date(2020, 1, 1), date(2020, 12, 1)]);
    }

    #[test]
    fn test_empty_input() {
        let payments: Vec<Payment> = Vec::new();
        assert!(merge_time_grids(&payments).is_empty());
        assert!(TimeGridMerger::new().is_empty());
    }
}
