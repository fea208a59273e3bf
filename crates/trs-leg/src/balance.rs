//! Outstanding-balance lookup over a notional-change feed.
//!
//! The cursor is threaded explicitly through successive calls: each lookup
//! returns the balance together with the position to resume from. Query dates
//! must be non-decreasing across one pass, so the cursor never rewinds.

use trs_core::types::{Date, NotionalChange};

/// Balance when the feed holds no amortization events.
pub const UNAMORTIZED_BALANCE: f64 = 1.0;

/// Returns the balance in effect on `date`, scanning forward from `cursor`.
///
/// - An event dated after `date` has not happened yet: its `notional_before`
///   applies and the cursor stops on it.
/// - An event dated exactly on `date` is consumed and its `notional_after`
///   applies.
/// - Earlier events are consumed.
///
/// Once the feed is exhausted the last event's `notional_after` applies
/// (or [`UNAMORTIZED_BALANCE`] for an empty feed).
#[must_use]
pub fn balance_at(changes: &[NotionalChange], date: Date, cursor: usize) -> (f64, usize) {
    let mut index = cursor;
    while let Some(change) = changes.get(index) {
        if date < change.date {
            return (change.notional_before, index);
        }
        index += 1;
        if date == change.date {
            return (change.notional_after, index);
        }
    }

    let balance = changes
        .last()
        .map_or(UNAMORTIZED_BALANCE, |last| last.notional_after);
    (balance, index)
}
