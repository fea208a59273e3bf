//! Notional-change (amortization) events on the underlying asset.

use serde::{Deserialize, Serialize};

use super::Date;
use crate::error::{TrsError, TrsResult};
use crate::traits::NotionalChangeInfo;

/// A single amortization event: the outstanding notional just before and
/// just after `date`, in units where 1.0 is the full initial investment.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct NotionalChange {
    /// Date the notional changes.
    pub date: Date,
    /// Outstanding notional before the change.
    pub notional_before: f64,
    /// Outstanding notional after the change.
    pub notional_after: f64,
    /// End of credit-risk exposure, when the source event is itself a payment.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub credit_risk_end_date: Option<Date>,
}

impl NotionalChange {
    /// Creates a new notional change.
    #[must_use]
    pub fn new(date: Date, notional_before: f64, notional_after: f64) -> Self {
        Self {
            date,
            notional_before,
            notional_after,
            credit_risk_end_date: None,
        }
    }

    /// Sets the credit-risk end date carried by this event.
    #[must_use]
    pub fn with_credit_risk_end_date(mut self, date: Date) -> Self {
        self.credit_risk_end_date = Some(date);
        self
    }

    /// Returns the amount redeemed by this event.
    #[must_use]
    pub fn redeemed(&self) -> f64 {
        self.notional_before - self.notional_after
    }

    /// Copies any notional-change source into a concrete event.
    pub fn from_info<I: NotionalChangeInfo + ?Sized>(info: &I) -> Self {
        Self {
            date: info.date(),
            notional_before: info.notional_before_change(),
            notional_after: info.notional_after_change(),
            credit_risk_end_date: info.credit_risk_end_date(),
        }
    }
}

impl NotionalChangeInfo for NotionalChange {
    fn date(&self) -> Date {
        self.date
    }

    fn notional_before_change(&self) -> f64 {
        self.notional_before
    }

    fn notional_after_change(&self) -> f64 {
        self.notional_after
    }

    fn credit_risk_end_date(&self) -> Option<Date> {
        self.credit_risk_end_date
    }
}

/// A date-sorted feed of notional changes.
///
/// Events sharing a date are kept as separate entries in the order supplied.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct NotionalChangeFeed {
    changes: Vec<NotionalChange>,
}

impl NotionalChangeFeed {
    /// Creates a feed with no amortization.
    #[must_use]
    pub fn empty() -> Self {
        Self::default()
    }

    /// Creates a validated feed.
    ///
    /// # Errors
    ///
    /// Returns `TrsError::UnsortedNotionalFeed` if dates decrease anywhere,
    /// or `TrsError::InvalidNotionalChange` for non-finite notionals.
    pub fn new(changes: Vec<NotionalChange>) -> TrsResult<Self> {
        for change in &changes {
            if !change.notional_before.is_finite() || !change.notional_after.is_finite() {
                return Err(TrsError::InvalidNotionalChange {
                    date: change.date.to_string(),
                    reason: "notional must be finite".to_string(),
                });
            }
        }
        if let Some(pair) = changes.windows(2).find(|w| w[1].date < w[0].date) {
            return Err(TrsError::UnsortedNotionalFeed {
                later: pair[0].date.to_string(),
                earlier: pair[1].date.to_string(),
            });
        }
        Ok(Self { changes })
    }

    /// Builds a feed from any notional-change sources, such as previously
    /// generated reference-amount payments.
    pub fn from_changes<I: NotionalChangeInfo>(items: &[I]) -> TrsResult<Self> {
        Self::new(items.iter().map(NotionalChange::from_info).collect())
    }

    /// Returns the events as a slice.
    #[must_use]
    pub fn as_slice(&self) -> &[NotionalChange] {
        &self.changes
    }

    /// Returns the number of events.
    #[must_use]
    pub fn len(&self) -> usize {
        self.changes.len()
    }

    /// Returns true if there is no amortization.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.changes.is_empty()
    }

    /// Returns an iterator over the events.
    pub fn iter(&self) -> impl Iterator<Item = &NotionalChange> {
        self.changes.iter()
    }
}

impl<'de> Deserialize<'de> for NotionalChangeFeed {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let changes = Vec::<NotionalChange>::deserialize(deserializer)?;
        NotionalChangeFeed::new(changes).map_err(serde::de::Error::custom)
    }
}

impl<'a> IntoIterator for &'a NotionalChangeFeed {
    type Item = &'a NotionalChange;
    type IntoIter = std::slice::Iter<'a, NotionalChange>;

    fn into_iter(self) -> Self::IntoIter {
        self.changes.iter()
    }
}
