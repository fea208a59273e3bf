//! Domain types for return-leg analytics.
//!
//! - [`Date`]: Calendar date
//! - [`Currency`]: ISO currency codes
//! - [`ValuationPeriods`]: Ordered (value date, payment date) schedule
//! - [`NotionalChangeFeed`]: Sorted amortization events on the underlying
//! - [`AmortizationSchedule`]: Percentage redemptions convertible into a feed

mod amortization;
mod currency;
mod date;
mod notional;
mod schedule;

pub use amortization::{AmortizationEntry, AmortizationSchedule};
pub use currency::Currency;
pub use date::Date;
pub use notional::{NotionalChange, NotionalChangeFeed};
pub use schedule::{ValuationPeriod, ValuationPeriods};
