//! Amortization schedules for the underlying asset.
//!
//! Provides a percentage-of-face redemption schedule that can be turned into
//! the normalized notional-change feed consumed by the return leg.

use serde::{Deserialize, Serialize};

use super::{Date, NotionalChange, NotionalChangeFeed};
use crate::error::TrsResult;

/// A single scheduled redemption.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AmortizationEntry {
    /// Date of principal payment
    pub date: Date,
    /// Principal amount as percentage of original face (e.g., 10.0 = 10%)
    pub principal_pct: f64,
    /// End of credit-risk exposure for this redemption, if it settles later
    #[serde(default)]
    pub credit_risk_end_date: Option<Date>,
}

impl AmortizationEntry {
    /// Creates a new amortization entry.
    #[must_use]
    pub fn new(date: Date, principal_pct: f64) -> Self {
        Self {
            date,
            principal_pct,
            credit_risk_end_date: None,
        }
    }

    /// Sets the credit-risk end date of this redemption.
    #[must_use]
    pub fn with_credit_risk_end_date(mut self, date: Date) -> Self {
        self.credit_risk_end_date = Some(date);
        self
    }

    /// Returns the principal payment as a decimal (e.g., 0.10 for 10%).
    #[must_use]
    pub fn principal_decimal(&self) -> f64 {
        self.principal_pct / 100.0
    }
}

/// Redemption schedule of the underlying.
///
/// # Example
///
/// ```
/// use trs_core::types::{AmortizationEntry, AmortizationSchedule, Date};
///
/// let schedule = AmortizationSchedule::new()
///     .with_entry(AmortizationEntry::new(Date::from_ymd(2025, 6, 15).unwrap(), 40.0))
///     .with_entry(AmortizationEntry::new(Date::from_ymd(2026, 6, 15).unwrap(), 60.0));
///
/// let feed = schedule.to_notional_feed().unwrap();
/// assert_eq!(feed.len(), 2);
/// assert!((feed.as_slice()[0].notional_after - 0.6).abs() < 1e-12);
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AmortizationSchedule {
    /// Schedule of principal payments
    pub entries: Vec<AmortizationEntry>,
}

impl AmortizationSchedule {
    /// Creates an empty (bullet) schedule.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a level principal schedule with given number of payments.
    ///
    /// No dates gives a bullet schedule.
    #[must_use]
    pub fn level_principal(dates: Vec<Date>) -> Self {
        if dates.is_empty() {
            return Self::new();
        }
        let n = dates.len() as f64;
        let principal_per_payment = 100.0 / n;

        Self {
            entries: dates
                .into_iter()
                .map(|date| AmortizationEntry::new(date, principal_per_payment))
                .collect(),
        }
    }

    /// Adds an amortization entry.
    #[must_use]
    pub fn with_entry(mut self, entry: AmortizationEntry) -> Self {
        self.entries.push(entry);
        self
    }

    /// Returns the total principal percentage in the schedule.
    #[must_use]
    pub fn total_principal_pct(&self) -> f64 {
        self.entries.iter().map(|e| e.principal_pct).sum()
    }

    /// Returns true if the schedule retires the full face amount.
    #[must_use]
    pub fn is_complete(&self) -> bool {
        (self.total_principal_pct() - 100.0).abs() < 0.001
    }

    /// Returns the factor (remaining principal / original face) as of a date.
    #[must_use]
    pub fn factor_as_of(&self, date: Date) -> f64 {
        let paid_pct: f64 = self
            .entries
            .iter()
            .filter(|e| e.date <= date)
            .map(|e| e.principal_pct)
            .sum();

        (100.0 - paid_pct).max(0.0) / 100.0
    }

    /// Converts the schedule into a normalized notional-change feed.
    ///
    /// Entries are ordered by date (stable for equal dates) and the running
    /// notional starts at 1.0. The final balance is floored at zero so an
    /// over-complete schedule does not produce a negative notional.
    pub fn to_notional_feed(&self) -> TrsResult<NotionalChangeFeed> {
        let mut entries: Vec<&AmortizationEntry> = self.entries.iter().collect();
        entries.sort_by_key(|e| e.date);

        let mut remaining = 1.0_f64;
        let mut changes = Vec::with_capacity(entries.len());
        for entry in entries {
            let before = remaining;
            remaining = (remaining - entry.principal_decimal()).max(0.0);
            let mut change = NotionalChange::new(entry.date, before, remaining);
            change.credit_risk_end_date = entry.credit_risk_end_date;
            changes.push(change);
        }

        NotionalChangeFeed::new(changes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn date(y: i32, m: u32, d: u32) -> Date {
        Date::from_ymd(y, m, d).unwrap()
    }

    #[test]
    fn test_level_principal_feed() {
        let schedule = AmortizationSchedule::level_principal(vec![
            date(2025, 6, 15),
            date(2026, 6, 15),
            date(2027, 6, 15),
            date(2028, 6, 15),
        ]);
        assert!(schedule.is_complete());

        let feed = schedule.to_notional_feed().unwrap();
        let afters: Vec<f64> = feed.iter().map(|c| c.notional_after).collect();
        assert_relative_eq!(afters[0], 0.75, epsilon = 1e-12);
        assert_relative_eq!(afters[1], 0.50, epsilon = 1e-12);
        assert_relative_eq!(afters[2], 0.25, epsilon = 1e-12);
        assert!(afters[3].abs() < 1e-12);
        assert_relative_eq!(feed.as_slice()[1].notional_before, 0.75, epsilon = 1e-12);
    }

    #[test]
    fn test_level_principal_without_dates_is_bullet() {
        let schedule = AmortizationSchedule::level_principal(Vec::new());
        assert_eq!(schedule.total_principal_pct(), 0.0);
        assert!(!schedule.is_complete());
        assert!(schedule.to_notional_feed().unwrap().is_empty());
    }

    #[test]
    fn test_unsorted_entries_are_ordered() {
        let schedule = AmortizationSchedule::new()
            .with_entry(AmortizationEntry::new(date(2026, 6, 15), 50.0))
            .with_entry(AmortizationEntry::new(date(2025, 6, 15), 25.0));

        let feed = schedule.to_notional_feed().unwrap();
        assert_eq!(feed.as_slice()[0].date, date(2025, 6, 15));
        assert_relative_eq!(feed.as_slice()[1].notional_after, 0.25, epsilon = 1e-12);
    }

    #[test]
    fn test_over_redemption_floors_at_zero() {
        let schedule = AmortizationSchedule::new()
            .with_entry(AmortizationEntry::new(date(2025, 6, 15), 70.0))
            .with_entry(AmortizationEntry::new(date(2026, 6, 15), 70.0));

        let feed = schedule.to_notional_feed().unwrap();
        assert_eq!(feed.as_slice()[1].notional_after, 0.0);
    }

    #[test]
    fn test_factor_as_of() {
        let schedule = AmortizationSchedule::new()
            .with_entry(AmortizationEntry::new(date(2025, 6, 15), 25.0))
            .with_entry(AmortizationEntry::new(date(2026, 6, 15), 25.0));

        assert_relative_eq!(schedule.factor_as_of(date(2025, 1, 1)), 1.0);
        assert_relative_eq!(schedule.factor_as_of(date(2025, 6, 15)), 0.75);
        assert_relative_eq!(schedule.factor_as_of(date(2027, 1, 1)), 0.50);
    }

    #[test]
    fn test_credit_risk_end_date_propagates() {
        let schedule = AmortizationSchedule::new().with_entry(
            AmortizationEntry::new(date(2025, 6, 15), 100.0)
                .with_credit_risk_end_date(date(2025, 6, 20)),
        );
        let feed = schedule.to_notional_feed().unwrap();
        assert_eq!(
            feed.as_slice()[0].credit_risk_end_date,
            Some(date(2025, 6, 20))
        );
    }
}
