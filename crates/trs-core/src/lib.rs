//! # TRS Core
//!
//! Core types and collaborator interfaces for Total Return Swap return-leg analytics.
//!
//! This crate provides the building blocks consumed by the payment sequencer:
//!
//! - **Types**: `Date`, `Currency`, valuation periods and notional-change feeds
//! - **Amortization**: Percentage redemption schedules convertible into a feed
//! - **Traits**: Price calculators, recovery-rate functions, schedule and
//!   notional-change abstractions implemented by external pricing code
//!
//! ## Example
//!
//! ```rust
//! use trs_core::prelude::*;
//!
//! let effective = Date::from_ymd(2020, 1, 1).unwrap();
//! let periods = ValuationPeriods::new(
//!     effective,
//!     vec![ValuationPeriod::new(
//!         Date::from_ymd(2021, 1, 1).unwrap(),
//!         Date::from_ymd(2021, 1, 5).unwrap(),
//!     )],
//! )
//! .unwrap();
//! assert_eq!(periods.len(), 1);
//!
//! let feed = NotionalChangeFeed::empty();
//! assert!(feed.is_empty());
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]
#![allow(clippy::must_use_candidate)]
#![allow(clippy::doc_markdown)]
#![allow(clippy::cast_precision_loss)]
#![allow(clippy::float_cmp)]
#![allow(clippy::return_self_not_must_use)]
#![allow(clippy::uninlined_format_args)]

pub mod error;
pub mod traits;
pub mod types;

/// Prelude module for convenient imports.
pub mod prelude {
    pub use crate::error::{TrsError, TrsResult};
    pub use crate::traits::{
        FlatRecoveryRate, NotionalChangeInfo, PriceCalculator, RecoveryRate, ValuationSchedule,
    };
    pub use crate::types::{
        AmortizationEntry, AmortizationSchedule, Currency, Date, NotionalChange,
        NotionalChangeFeed, ValuationPeriod, ValuationPeriods,
    };
}

// Re-export commonly used types at crate root
pub use error::{TrsError, TrsResult};
pub use types::{Currency, Date};
