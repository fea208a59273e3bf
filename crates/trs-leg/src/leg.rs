//! Return-leg terms and payment entry points.

use std::fmt;
use std::sync::Arc;

use trs_core::traits::{PriceCalculator, ValuationSchedule};
use trs_core::types::{Currency, Date, NotionalChangeFeed, ValuationPeriod, ValuationPeriods};

use crate::config::ReturnLegConfig;
use crate::error::{LegError, LegResult};
use crate::notional_schedule::{NotionalFactorSchedule, NotionalFactorScheduleBuilder};
use crate::payments::{Payment, PaymentKind};
use crate::recovery::RecoveryReturnProjector;
use crate::scale::ScaleComposer;
use crate::sequencer::PaymentSequencer;

/// The return leg of a Total Return Swap.
///
/// Holds the contractual terms and the read-only collaborators needed to
/// sequence payments. Every entry point starts a fresh pass over the
/// schedule, so the same leg can be sequenced repeatedly and from several
/// threads at once.
#[derive(Clone)]
pub struct ReturnLeg {
    effective_date: Date,
    currency: Currency,
    initial_price: f64,
    resetting_notional: bool,
    default_settle_date: Option<Date>,
    schedule: Arc<dyn ValuationSchedule>,
    notional_changes: NotionalChangeFeed,
    price_calculator: Arc<dyn PriceCalculator>,
    config: ReturnLegConfig,
}

impl fmt::Debug for ReturnLeg {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ReturnLeg")
            .field("effective_date", &self.effective_date)
            .field("currency", &self.currency)
            .field("initial_price", &self.initial_price)
            .field("resetting_notional", &self.resetting_notional)
            .field("default_settle_date", &self.default_settle_date)
            .field("periods", &self.schedule.len())
            .field("notional_changes", &self.notional_changes.len())
            .field("price_calculator", &self.price_calculator)
            .field("config", &self.config)
            .finish()
    }
}

impl ReturnLeg {
    /// Creates a builder.
    #[must_use]
    pub fn builder() -> ReturnLegBuilder {
        ReturnLegBuilder::new()
    }

    /// Effective date of the leg.
    pub fn effective_date(&self) -> Date {
        self.effective_date
    }

    /// Settlement currency.
    pub fn currency(&self) -> Currency {
        self.currency
    }

    /// Contractual initial price of the underlying.
    pub fn initial_price(&self) -> f64 {
        self.initial_price
    }

    /// True if the notional resets to the prevailing price each period.
    pub fn resetting_notional(&self) -> bool {
        self.resetting_notional
    }

    /// Settle date of a credit default, if one occurred.
    pub fn default_settle_date(&self) -> Option<Date> {
        self.default_settle_date
    }

    /// Valuation schedule.
    pub fn schedule(&self) -> &dyn ValuationSchedule {
        self.schedule.as_ref()
    }

    /// Amortization events on the underlying.
    pub fn notional_changes(&self) -> &NotionalChangeFeed {
        &self.notional_changes
    }

    /// Price calculator of the underlying.
    pub fn price_calculator(&self) -> &Arc<dyn PriceCalculator> {
        &self.price_calculator
    }

    /// Leg configuration.
    pub fn config(&self) -> &ReturnLegConfig {
        &self.config
    }

    /// Scale composer configured with this leg's tolerance.
    pub fn scale_composer(&self) -> ScaleComposer {
        ScaleComposer::new(self.config.scale_tolerance)
    }

    /// Notional units carried by a balance.
    ///
    /// A resetting leg holds `balance / InitialPrice` units of the underlying;
    /// a fixed leg scales directly by the balance.
    pub fn notional_units(&self, balance: f64) -> f64 {
        if self.resetting_notional {
            balance / self.initial_price
        } else {
            balance
        }
    }

    /// Full payment sequence relevant after `from_date`: reference amounts
    /// and price returns in settlement order.
    pub fn payments(&self, from_date: Date) -> PaymentSequencer<'_> {
        PaymentSequencer::new(self, from_date)
    }

    /// Price-return payments relevant after `from_date`.
    pub fn price_return_payments(
        &self,
        from_date: Date,
    ) -> impl Iterator<Item = LegResult<Payment>> + '_ {
        self.payments(from_date)
            .filter(|item| is_kind(item, PaymentKind::PriceReturn))
    }

    /// Reference-amount payments relevant after `from_date`.
    pub fn reference_amounts(
        &self,
        from_date: Date,
    ) -> impl Iterator<Item = LegResult<Payment>> + '_ {
        self.payments(from_date)
            .filter(|item| is_kind(item, PaymentKind::ReferenceAmount))
    }

    /// Notional factor step function, or `None` when the notional is static.
    pub fn notional_schedule(&self, from_date: Date) -> LegResult<Option<NotionalFactorSchedule>> {
        NotionalFactorScheduleBuilder::new(self).build(from_date)
    }

    /// Recovery-contingent counterparts of this leg's payments.
    pub fn recovery_return_payments<'a>(
        &'a self,
        from_date: Date,
        projector: &'a RecoveryReturnProjector,
    ) -> impl Iterator<Item = LegResult<Payment>> + 'a {
        projector.project_all(self.payments(from_date))
    }
}

fn is_kind(item: &LegResult<Payment>, kind: PaymentKind) -> bool {
    match item {
        Ok(payment) => payment.kind() == kind,
        Err(_) => true,
    }
}

// =============================================================================
// BUILDER
// =============================================================================

/// Builder for [`ReturnLeg`].
#[derive(Default)]
pub struct ReturnLegBuilder {
    effective_date: Option<Date>,
    currency: Option<Currency>,
    initial_price: Option<f64>,
    resetting_notional: bool,
    default_settle_date: Option<Date>,
    schedule: Option<Arc<dyn ValuationSchedule>>,
    periods: Option<Vec<ValuationPeriod>>,
    notional_changes: Option<NotionalChangeFeed>,
    price_calculator: Option<Arc<dyn PriceCalculator>>,
    config: Option<ReturnLegConfig>,
}

impl fmt::Debug for ReturnLegBuilder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ReturnLegBuilder")
            .field("effective_date", &self.effective_date)
            .field("currency", &self.currency)
            .field("initial_price", &self.initial_price)
            .field("resetting_notional", &self.resetting_notional)
            .field("default_settle_date", &self.default_settle_date)
            .field("has_schedule", &(self.schedule.is_some() || self.periods.is_some()))
            .field("notional_changes", &self.notional_changes)
            .field("price_calculator", &self.price_calculator)
            .field("config", &self.config)
            .finish()
    }
}

impl ReturnLegBuilder {
    /// Creates a new builder.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the effective date.
    #[must_use]
    pub fn effective_date(mut self, date: Date) -> Self {
        self.effective_date = Some(date);
        self
    }

    /// Sets the currency.
    #[must_use]
    pub fn currency(mut self, currency: Currency) -> Self {
        self.currency = Some(currency);
        self
    }

    /// Sets the contractual initial price.
    #[must_use]
    pub fn initial_price(mut self, price: f64) -> Self {
        self.initial_price = Some(price);
        self
    }

    /// Sets the notional regime.
    #[must_use]
    pub fn resetting_notional(mut self, resetting: bool) -> Self {
        self.resetting_notional = resetting;
        self
    }

    /// Sets the settle date of a credit default.
    #[must_use]
    pub fn default_settle_date(mut self, date: Date) -> Self {
        self.default_settle_date = Some(date);
        self
    }

    /// Sets an externally built valuation schedule.
    #[must_use]
    pub fn schedule(mut self, schedule: Arc<dyn ValuationSchedule>) -> Self {
        self.schedule = Some(schedule);
        self.periods = None;
        self
    }

    /// Sets the valuation schedule from (value date, payment date) periods.
    ///
    /// The periods are validated against the effective date on `build`.
    #[must_use]
    pub fn periods(mut self, periods: Vec<ValuationPeriod>) -> Self {
        self.periods = Some(periods);
        self.schedule = None;
        self
    }

    /// Sets the amortization feed. Defaults to no amortization.
    #[must_use]
    pub fn notional_changes(mut self, feed: NotionalChangeFeed) -> Self {
        self.notional_changes = Some(feed);
        self
    }

    /// Sets the price calculator of the underlying.
    #[must_use]
    pub fn price_calculator(mut self, calculator: Arc<dyn PriceCalculator>) -> Self {
        self.price_calculator = Some(calculator);
        self
    }

    /// Sets the configuration. Defaults to [`ReturnLegConfig::default`].
    #[must_use]
    pub fn config(mut self, config: ReturnLegConfig) -> Self {
        self.config = Some(config);
        self
    }

    /// Builds the `ReturnLeg`.
    ///
    /// # Errors
    ///
    /// Returns an error if a required field is missing, the initial price is
    /// not a positive finite number, the configuration is invalid, or the
    /// schedule does not advance strictly past the effective date.
    pub fn build(self) -> LegResult<ReturnLeg> {
        let effective_date = self
            .effective_date
            .ok_or_else(|| LegError::missing_field("effective_date"))?;
        let initial_price = self
            .initial_price
            .ok_or_else(|| LegError::missing_field("initial_price"))?;
        let price_calculator = self
            .price_calculator
            .ok_or_else(|| LegError::missing_field("price_calculator"))?;

        if !(initial_price.is_finite() && initial_price > 0.0) {
            return Err(LegError::invalid_leg(format!(
                "initial price must be positive and finite, got {initial_price}"
            )));
        }

        let schedule: Arc<dyn ValuationSchedule> = match (self.schedule, self.periods) {
            (Some(schedule), _) => schedule,
            (None, Some(periods)) => Arc::new(ValuationPeriods::new(effective_date, periods)?),
            (None, None) => return Err(LegError::missing_field("schedule")),
        };
        check_schedule_order(effective_date, schedule.as_ref())?;

        let config = self.config.unwrap_or_default();
        config.validate_or_error()?;

        Ok(ReturnLeg {
            effective_date,
            currency: self.currency.unwrap_or_default(),
            initial_price,
            resetting_notional: self.resetting_notional,
            default_settle_date: self.default_settle_date,
            schedule,
            notional_changes: self.notional_changes.unwrap_or_default(),
            price_calculator,
            config,
        })
    }
}

/// Checks that value dates advance strictly from the effective date.
pub(crate) fn check_schedule_order(
    effective_date: Date,
    schedule: &dyn ValuationSchedule,
) -> LegResult<()> {
    let mut previous = effective_date;
    for i in 0..schedule.len() {
        let date = schedule.value_date(i);
        if date <= previous {
            return Err(LegError::ScheduleOutOfOrder {
                period: i + 1,
                date: date.to_string(),
                previous: previous.to_string(),
            });
        }
        previous = date;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use trs_core::TrsResult;

    #[derive(Debug)]
    struct Flat;

    impl PriceCalculator for Flat {
        fn price(&self, _date: Date) -> TrsResult<f64> {
            Ok(100.0)
        }
    }

    /// A schedule that skips validation, as external schedules may.
    struct RawSchedule(Vec<(Date, Date)>);

    impl ValuationSchedule for RawSchedule {
        fn len(&self) -> usize {
            self.0.len()
        }

        fn value_date(&self, i: usize) -> Date {
            self.0[i].0
        }

        fn payment_date(&self, i: usize) -> Date {
            self.0[i].1
        }
    }

    fn date(y: i32, m: u32, d: u32) -> Date {
        Date::from_ymd(y, m, d).unwrap()
    }

    fn builder() -> ReturnLegBuilder {
        ReturnLeg::builder()
            .effective_date(date(2020, 1, 1))
            .currency(Currency::EUR)
            .initial_price(100.0)
            .periods(vec![ValuationPeriod::new(date(2021, 1, 1), date(2021, 1, 5))])
            .price_calculator(Arc::new(Flat))
    }

    #[test]
    fn test_build_defaults() {
        let leg = builder().build().unwrap();
        assert_eq!(leg.effective_date(), date(2020, 1, 1));
        assert_eq!(leg.currency(), Currency::EUR);
        assert!(!leg.resetting_notional());
        assert!(leg.default_settle_date().is_none());
        assert!(leg.notional_changes().is_empty());
        assert_eq!(leg.schedule().len(), 1);
        assert_eq!(leg.config(), &ReturnLegConfig::default());
    }

    #[test]
    fn test_missing_fields() {
        let err = ReturnLeg::builder().build().unwrap_err();
        assert_eq!(err, LegError::missing_field("effective_date"));

        let err = ReturnLeg::builder()
            .effective_date(date(2020, 1, 1))
            .initial_price(100.0)
            .price_calculator(Arc::new(Flat))
            .build()
            .unwrap_err();
        assert_eq!(err, LegError::missing_field("schedule"));
    }

    #[test]
    fn test_rejects_bad_initial_price() {
        assert!(matches!(
            builder().initial_price(0.0).build(),
            Err(LegError::InvalidLeg { .. })
        ));
        assert!(matches!(
            builder().initial_price(f64::NAN).build(),
            Err(LegError::InvalidLeg { .. })
        ));
    }

    #[test]
    fn test_rejects_invalid_config() {
        let config = ReturnLegConfig::new().with_default_accrual_lag_days(-1);
        assert!(matches!(
            builder().config(config).build(),
            Err(LegError::InvalidConfig(_))
        ));
    }

    #[test]
    fn test_rejects_out_of_order_external_schedule() {
        let schedule = RawSchedule(vec![
            (date(2020, 7, 1), date(2020, 7, 3)),
            (date(2020, 6, 1), date(2020, 6, 3)),
        ]);
        let err = builder().schedule(Arc::new(schedule)).build().unwrap_err();
        assert!(err.is_contract_violation());
        assert!(matches!(err, LegError::ScheduleOutOfOrder { period: 2, .. }));
    }

    #[test]
    fn test_rejects_periods_before_effective_date() {
        let err = builder()
            .periods(vec![ValuationPeriod::new(date(2019, 6, 1), date(2019, 6, 3))])
            .build()
            .unwrap_err();
        assert!(err.is_contract_violation());
    }

    #[test]
    fn test_notional_units() {
        let fixed = builder().build().unwrap();
        assert_relative_eq!(fixed.notional_units(0.6), 0.6);

        let resetting = builder().resetting_notional(true).build().unwrap();
        assert_relative_eq!(resetting.notional_units(0.6), 0.006, epsilon = 1e-15);
    }
}
