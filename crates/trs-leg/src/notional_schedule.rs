//! Notional factor step function.
//!
//! Consumers that need the swap's notional level through time use
//! [`NotionalFactorSchedule`] instead of re-deriving it from payments. A leg
//! whose notional never moves has no schedule at all.

use std::fmt;
use std::sync::Arc;

use tracing::debug;
use trs_core::traits::PriceCalculator;
use trs_core::types::Date;

use crate::balance::balance_at;
use crate::error::{LegError, LegResult};
use crate::leg::ReturnLeg;

/// Notional level after a breakpoint, resolved on demand.
#[derive(Clone)]
pub enum NotionalFactor {
    /// A fixed level.
    Fixed(f64),
    /// Units of the underlying valued at the observation date's price.
    Resetting {
        /// Price source of the underlying
        price_calculator: Arc<dyn PriceCalculator>,
        /// Date the reset price is observed
        observation_date: Date,
        /// Units held, `balance / InitialPrice`
        units: f64,
    },
}

impl NotionalFactor {
    /// Resolves the factor, observing a price when resetting.
    pub fn value(&self) -> LegResult<f64> {
        match self {
            NotionalFactor::Fixed(value) => Ok(*value),
            NotionalFactor::Resetting {
                price_calculator,
                observation_date,
                units,
            } => Ok(price_calculator.price(*observation_date)? * units),
        }
    }
}

impl fmt::Debug for NotionalFactor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NotionalFactor::Fixed(value) => f.debug_tuple("Fixed").field(value).finish(),
            NotionalFactor::Resetting {
                observation_date,
                units,
                ..
            } => f
                .debug_struct("Resetting")
                .field("observation_date", observation_date)
                .field("units", units)
                .finish_non_exhaustive(),
        }
    }
}

/// A step in the notional schedule.
#[derive(Debug, Clone)]
pub struct NotionalBreakpoint {
    /// Date from which the factor applies.
    pub date: Date,
    /// Factor in effect from `date`.
    pub factor: NotionalFactor,
}

/// Piecewise-constant notional factor.
#[derive(Debug, Clone)]
pub struct NotionalFactorSchedule {
    initial_factor: f64,
    breakpoints: Vec<NotionalBreakpoint>,
}

impl NotionalFactorSchedule {
    /// Factor in effect before the first breakpoint.
    pub fn initial_factor(&self) -> f64 {
        self.initial_factor
    }

    /// Breakpoints in ascending date order.
    pub fn breakpoints(&self) -> &[NotionalBreakpoint] {
        &self.breakpoints
    }

    /// Number of breakpoints.
    pub fn len(&self) -> usize {
        self.breakpoints.len()
    }

    /// Returns true if there are no breakpoints.
    pub fn is_empty(&self) -> bool {
        self.breakpoints.is_empty()
    }

    /// Evaluates the factor on `date`.
    ///
    /// The latest breakpoint on or before `date` applies; before the first
    /// one the initial factor does.
    pub fn factor_at(&self, date: Date) -> LegResult<f64> {
        let index = self.breakpoints.partition_point(|b| b.date <= date);
        match index.checked_sub(1) {
            Some(i) => self.breakpoints[i].factor.value(),
            None => Ok(self.initial_factor),
        }
    }
}

/// Builds a [`NotionalFactorSchedule`] from a leg's period walk.
///
/// A breakpoint is recorded on each unsettled period's payment date when the
/// notional resets, or when amortization happened in the period. It carries
/// the notional in force over the period ending on that date: units held at
/// period start, priced at the period's begin date when resetting. Full
/// redemption and credit default record a final zero factor.
#[derive(Debug)]
pub struct NotionalFactorScheduleBuilder<'a> {
    leg: &'a ReturnLeg,
}

impl<'a> NotionalFactorScheduleBuilder<'a> {
    /// Creates a builder over `leg`.
    pub fn new(leg: &'a ReturnLeg) -> Self {
        Self { leg }
    }

    fn factor(&self, units: f64, observation_date: Date) -> NotionalFactor {
        if self.leg.resetting_notional() {
            NotionalFactor::Resetting {
                price_calculator: self.leg.price_calculator().clone(),
                observation_date,
                units,
            }
        } else {
            NotionalFactor::Fixed(units)
        }
    }

    /// Walks the schedule and collects breakpoints after `from_date`.
    ///
    /// Returns `None` if the notional never changes.
    pub fn build(&self, from_date: Date) -> LegResult<Option<NotionalFactorSchedule>> {
        let leg = self.leg;
        let changes = leg.notional_changes().as_slice();
        let schedule = leg.schedule();
        let tolerance = leg.config().balance_tolerance;

        let (initial_factor, mut cursor) = balance_at(changes, leg.effective_date(), 0);
        if initial_factor <= 0.0 {
            debug!("underlying not funded, no notional schedule");
            return Ok(None);
        }
        let mut balance = initial_factor;

        let mut breakpoints = Vec::new();
        let mut begin = leg.effective_date();

        for i in 0..schedule.len() {
            let date = schedule.value_date(i);
            let pay_date = schedule.payment_date(i);
            if date <= begin {
                return Err(LegError::ScheduleOutOfOrder {
                    period: i + 1,
                    date: date.to_string(),
                    previous: begin.to_string(),
                });
            }

            if let Some(settle) = leg.default_settle_date() {
                if settle <= pay_date {
                    if from_date < settle {
                        breakpoints.push(NotionalBreakpoint {
                            date: settle,
                            factor: NotionalFactor::Fixed(0.0),
                        });
                    }
                    break;
                }
            }

            let units = leg.notional_units(balance);
            let last_index = cursor;
            let (next_balance, next) = balance_at(changes, pay_date, cursor);
            balance = next_balance;
            cursor = next;

            if from_date >= pay_date {
                if balance <= 0.0 {
                    break;
                }
            } else {
                if balance < -tolerance {
                    return Err(LegError::NegativeBalance {
                        date: pay_date.to_string(),
                        balance,
                    });
                }
                if balance <= 0.0 {
                    breakpoints.push(NotionalBreakpoint {
                        date: pay_date,
                        factor: NotionalFactor::Fixed(0.0),
                    });
                    break;
                }
                if leg.resetting_notional() || cursor > last_index {
                    breakpoints.push(NotionalBreakpoint {
                        date: pay_date,
                        factor: self.factor(units, begin),
                    });
                }
            }

            begin = date;
        }

        if breakpoints.is_empty() {
            debug!("static notional, no schedule");
            return Ok(None);
        }
        debug!(breakpoints = breakpoints.len(), "built notional schedule");
        Ok(Some(NotionalFactorSchedule {
            initial_factor,
            breakpoints,
        }))
    }
}
