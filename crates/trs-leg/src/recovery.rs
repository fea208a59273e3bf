//! Recovery-return projection.
//!
//! Converts a generated payment sequence into recovery-contingent payments:
//! each price return or reference amount is replaced by a
//! [`RecoveryReturnPayment`] whose window ends no later than the
//! underlying's maturity, carrying the source's notional scaling.

use std::collections::BTreeSet;
use std::fmt;
use std::sync::Arc;

use tracing::trace;
use trs_core::traits::RecoveryRate;
use trs_core::types::Date;

use crate::error::LegResult;
use crate::payments::{Payment, RecoveryReturnPayment};
use crate::scale::{flatten, ScaleComposer};

/// Projects payments onto recovery-contingent payments.
#[derive(Clone)]
pub struct RecoveryReturnProjector {
    underlying_maturity: Date,
    time_grids: Option<BTreeSet<Date>>,
    recovery_rate: Option<Arc<dyn RecoveryRate>>,
    composer: ScaleComposer,
}

impl fmt::Debug for RecoveryReturnProjector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RecoveryReturnProjector")
            .field("underlying_maturity", &self.underlying_maturity)
            .field("time_grids", &self.time_grids)
            .field("has_recovery_rate", &self.recovery_rate.is_some())
            .field("composer", &self.composer)
            .finish()
    }
}

impl RecoveryReturnProjector {
    /// Creates a projector bounded by the underlying's maturity.
    ///
    /// Without a recovery-rate function the rate is zero.
    #[must_use]
    pub fn new(underlying_maturity: Date) -> Self {
        Self {
            underlying_maturity,
            time_grids: None,
            recovery_rate: None,
            composer: ScaleComposer::default(),
        }
    }

    /// Sets the recovery-rate function.
    #[must_use]
    pub fn with_recovery_rate(mut self, rate: Arc<dyn RecoveryRate>) -> Self {
        self.recovery_rate = Some(rate);
        self
    }

    /// Sets the time grids given to every projected payment.
    #[must_use]
    pub fn with_time_grids(mut self, grids: BTreeSet<Date>) -> Self {
        self.time_grids = Some(grids);
        self
    }

    /// Sets the scale composer.
    #[must_use]
    pub fn with_composer(mut self, composer: ScaleComposer) -> Self {
        self.composer = composer;
        self
    }

    /// Maturity of the underlying.
    pub fn underlying_maturity(&self) -> Date {
        self.underlying_maturity
    }

    fn rate(&self, date: Date) -> f64 {
        self.recovery_rate
            .as_ref()
            .map_or(0.0, |r| r.recovery_rate(date))
    }

    fn grids_for(&self, source: &Payment) -> Option<BTreeSet<Date>> {
        self.time_grids
            .clone()
            .or_else(|| source.time_grids().cloned())
    }

    /// Projects one payment.
    ///
    /// Price returns and reference amounts become recovery returns; other
    /// payments are returned unchanged.
    pub fn project(&self, payment: &Payment) -> Payment {
        let (concrete, factor) = flatten(payment);
        match concrete {
            Payment::PriceReturn(p) => {
                let end = p.credit_risk_end_date().min(self.underlying_maturity);
                let recovery = RecoveryReturnPayment::new(
                    p.accrual_begin_date(),
                    end,
                    p.currency(),
                    self.rate(p.period_end_pay_date()),
                    p.is_absolute(),
                    p.price_calculator().clone(),
                    p.begin_price_override(),
                )
                .with_cutoff_date(p.cutoff_date())
                .with_time_grids(self.grids_for(concrete));
                trace!(begin = %p.accrual_begin_date(), %end, factor, "projected price return");
                self.composer.scale_by(recovery.into(), factor)
            }
            Payment::ReferenceAmount(r) => {
                let end = r.credit_risk_end_date().min(self.underlying_maturity);
                let recovery = RecoveryReturnPayment::new(
                    r.anchor_value_date(),
                    end,
                    r.currency(),
                    self.rate(r.pay_date()),
                    true,
                    r.price_calculator().clone(),
                    r.price_override(),
                )
                .with_cutoff_date(r.cutoff_date())
                .with_time_grids(self.grids_for(concrete));
                trace!(anchor = %r.anchor_value_date(), %end, "projected reference amount");
                self.composer
                    .scale_by(recovery.into(), r.principal_payment_amount() * factor)
            }
            Payment::RecoveryReturn(_) | Payment::Scaled { .. } => payment.clone(),
        }
    }

    /// Lazily projects a payment sequence, passing errors through.
    pub fn project_all<'p, I>(&'p self, payments: I) -> impl Iterator<Item = LegResult<Payment>> + 'p
    where
        I: IntoIterator<Item = LegResult<Payment>>,
        I::IntoIter: 'p,
    {
        payments
            .into_iter()
            .map(move |item| item.map(|payment| self.project(&payment)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::payments::{PaymentKind, PriceReturnPayment, ReferenceAmountPayment};
    use crate::scale::scale_by;
    use approx::assert_relative_eq;
    use trs_core::traits::{FlatRecoveryRate, PriceCalculator};
    use trs_core::{Currency, TrsResult};

    #[derive(Debug)]
    struct Flat(f64);

    impl PriceCalculator for Flat {
        fn price(&self, _date: Date) -> TrsResult<f64> {
            Ok(self.0)
        }
    }

    fn date(y: i32, m: u32, d: u32) -> Date {
        Date::from_ymd(y, m, d).unwrap()
    }

    fn price_return() -> PriceReturnPayment {
        PriceReturnPayment::new(
            date(2020, 1, 3),
            date(2021, 1, 5),
            Currency::USD,
            date(2020, 1, 1),
            date(2021, 1, 1),
            Arc::new(Flat(0.9)),
            None,
            false,
        )
    }

    fn projector() -> RecoveryReturnProjector {
        RecoveryReturnProjector::new(date(2020, 10, 1))
            .with_recovery_rate(Arc::new(FlatRecoveryRate(0.4)))
    }

    #[test]
    fn test_price_return_capped_at_maturity_and_rescaled() {
        let source = scale_by(price_return().into(), 0.6);
        let projected = projector().project(&source);

        assert_eq!(projected.kind(), PaymentKind::RecoveryReturn);
        assert_relative_eq!(projected.scale_factor(), 0.6);
        let r = projected.as_recovery_return().unwrap();
        assert_eq!(r.begin_date(), date(2020, 1, 1));
        assert_eq!(r.end_date(), date(2020, 10, 1));
        assert_eq!(projected.pay_date(), date(2020, 10, 1));
        assert_relative_eq!(r.recovery_rate(), 0.4);
        assert!(!r.is_absolute());
        assert_relative_eq!(
            projected.amount().unwrap(),
            (0.4 / 0.9 - 1.0) * 0.6,
            epsilon = 1e-12
        );
    }

    #[test]
    fn test_projection_keeps_begin_date() {
        let source: Payment = price_return().into();
        let projected = projector().project(&source);
        assert_eq!(source.begin_date(), date(2020, 1, 1));
        assert_eq!(projected.begin_date(), source.begin_date());
    }

    #[test]
    fn test_explicit_credit_risk_end_before_maturity() {
        let source: Payment = price_return()
            .with_credit_risk_end_date(date(2020, 6, 1))
            .into();
        let projected = projector().project(&source);
        assert_eq!(projected.pay_date(), date(2020, 6, 1));
    }

    #[test]
    fn test_reference_amount_scaled_by_principal() {
        let source: Payment = ReferenceAmountPayment::new(
            date(2020, 5, 1),
            Currency::USD,
            1.0,
            0.25,
            date(2020, 1, 1),
            Arc::new(Flat(0.9)),
            None,
        )
        .into();
        let projected = projector().project(&source);
        let r = projected.as_recovery_return().unwrap();
        assert!(r.is_absolute());
        assert_eq!(r.end_date(), date(2020, 5, 1));
        assert_relative_eq!(projected.scale_factor(), 0.25);
        assert_relative_eq!(projected.amount().unwrap(), (0.4 - 0.9) * 0.25, epsilon = 1e-12);
    }

    #[test]
    fn test_missing_rate_function_is_zero() {
        let projected = RecoveryReturnProjector::new(date(2030, 1, 1)).project(&price_return().into());
        assert_relative_eq!(projected.as_recovery_return().unwrap().recovery_rate(), 0.0);
    }

    #[test]
    fn test_time_grids_override_and_fallback() {
        let own: BTreeSet<Date> = [date(2020, 2, 1)].into_iter().collect();
        let source: Payment = price_return().with_time_grids(own.clone()).into();

        let copied = projector().project(&source);
        assert_eq!(copied.time_grids(), Some(&own));

        let grid: BTreeSet<Date> = [date(2020, 3, 1), date(2020, 9, 1)].into_iter().collect();
        let replaced = projector().with_time_grids(grid.clone()).project(&source);
        assert_eq!(replaced.time_grids(), Some(&grid));
    }

    #[test]
    fn test_recovery_return_passes_through() {
        let source: Payment = RecoveryReturnPayment::new(
            date(2020, 1, 1),
            date(2020, 6, 1),
            Currency::USD,
            0.3,
            false,
            Arc::new(Flat(0.9)),
            None,
        )
        .into();
        let projected = projector().project(&source);
        assert_relative_eq!(projected.as_recovery_return().unwrap().recovery_rate(), 0.3);
    }
}
