//! # TRS Leg
//!
//! Payment sequencing for the return leg of a Total Return Swap.
//!
//! Given a valuation schedule, the amortization events of the underlying and
//! a price source, a [`ReturnLeg`] produces, period by period:
//!
//! - **Price returns**: capital gain/loss of the underlying, scaled by the
//!   outstanding notional
//! - **Reference amounts**: compensation for principal redeemed at par while
//!   the swap carries the underlying at its market price
//! - **Recovery returns**: recovery-contingent counterparts of the above,
//!   bounded by the underlying's maturity
//! - **Notional factor schedule**: the swap's notional level through time
//!
//! Payments are immutable records with lazily computed amounts, so sequencing
//! never touches market data.
//!
//! ## Example
//!
//! ```rust
//! use std::sync::Arc;
//! use trs_core::prelude::*;
//! use trs_leg::prelude::*;
//!
//! #[derive(Debug)]
//! struct Quote;
//!
//! impl PriceCalculator for Quote {
//!     fn price(&self, _date: Date) -> TrsResult<f64> {
//!         Ok(102.0)
//!     }
//! }
//!
//! let leg = ReturnLeg::builder()
//!     .effective_date(Date::from_ymd(2020, 1, 1).unwrap())
//!     .initial_price(100.0)
//!     .periods(vec![ValuationPeriod::new(
//!         Date::from_ymd(2021, 1, 1).unwrap(),
//!         Date::from_ymd(2021, 1, 5).unwrap(),
//!     )])
//!     .price_calculator(Arc::new(Quote))
//!     .build()
//!     .unwrap();
//!
//! let payments: Vec<Payment> = leg
//!     .payments(Date::from_ymd(2019, 12, 31).unwrap())
//!     .collect::<LegResult<_>>()
//!     .unwrap();
//! assert_eq!(payments.len(), 1);
//! assert!((payments[0].amount().unwrap() - 0.02).abs() < 1e-12);
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]
#![allow(clippy::must_use_candidate)]
#![allow(clippy::doc_markdown)]
#![allow(clippy::float_cmp)]
#![allow(clippy::return_self_not_must_use)]

pub mod balance;
pub mod config;
pub mod error;
pub mod leg;
pub mod notional_schedule;
pub mod payments;
pub mod recovery;
pub mod scale;
pub mod sequencer;
pub mod time_grid;

/// Prelude module for convenient imports.
pub mod prelude {
    pub use crate::config::ReturnLegConfig;
    pub use crate::error::{LegError, LegResult};
    pub use crate::leg::{ReturnLeg, ReturnLegBuilder};
    pub use crate::notional_schedule::{
        NotionalBreakpoint, NotionalFactor, NotionalFactorSchedule, NotionalFactorScheduleBuilder,
    };
    pub use crate::payments::{
        Payment, PaymentKind, PriceReturnPayment, RecoveryReturnPayment, ReferenceAmountPayment,
    };
    pub use crate::recovery::RecoveryReturnProjector;
    pub use crate::scale::{flatten, scale_by, ScaleComposer};
    pub use crate::sequencer::PaymentSequencer;
    pub use crate::time_grid::{merge_time_grids, TimeGridMerger};
}

pub use error::{LegError, LegResult};
pub use leg::{ReturnLeg, ReturnLegBuilder};
pub use payments::Payment;
