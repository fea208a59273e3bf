//! Payment records produced by the return leg.
//!
//! Records are immutable value objects. They store the price calculator and
//! the observation dates they depend on, and resolve their amount lazily, so
//! sequencing never needs live market data and a missing price fails only the
//! payment that needs it.

use std::collections::BTreeSet;
use std::fmt;
use std::sync::Arc;

use trs_core::traits::{NotionalChangeInfo, PriceCalculator};
use trs_core::types::{Currency, Date};

use crate::error::LegResult;

/// Kind of a concrete payment record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PaymentKind {
    /// Period capital gain/loss on the underlying
    PriceReturn,
    /// Par-versus-price compensation on a partial redemption
    ReferenceAmount,
    /// Recovery-contingent replacement of one of the above
    RecoveryReturn,
}

impl fmt::Display for PaymentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            PaymentKind::PriceReturn => "Price Return",
            PaymentKind::ReferenceAmount => "Reference Amount",
            PaymentKind::RecoveryReturn => "Recovery Return",
        };
        write!(f, "{name}")
    }
}

fn resolve_price(
    calculator: &Arc<dyn PriceCalculator>,
    price_override: Option<f64>,
    date: Date,
) -> LegResult<f64> {
    match price_override {
        Some(price) => Ok(price),
        None => Ok(calculator.price(date)?),
    }
}

// =============================================================================
// PRICE RETURN
// =============================================================================

/// Capital gain/loss of the underlying over one valuation period.
///
/// The begin price is the contractual initial price for the first period and
/// is observed on `accrual_begin_date` afterwards. With `is_absolute` set
/// (resetting notional) the amount is a price difference; otherwise it is a
/// relative return.
#[derive(Debug, Clone)]
pub struct PriceReturnPayment {
    period_start_pay_date: Date,
    period_end_pay_date: Date,
    currency: Currency,
    accrual_begin_date: Date,
    accrual_end_date: Date,
    price_calculator: Arc<dyn PriceCalculator>,
    begin_price_override: Option<f64>,
    is_absolute: bool,
    credit_risk_end_date: Option<Date>,
    cutoff_date: Option<Date>,
    time_grids: Option<BTreeSet<Date>>,
}

impl PriceReturnPayment {
    /// Creates a price-return payment.
    ///
    /// A NaN override is treated as absent.
    #[allow(clippy::too_many_arguments)]
    #[must_use]
    pub fn new(
        period_start_pay_date: Date,
        period_end_pay_date: Date,
        currency: Currency,
        accrual_begin_date: Date,
        accrual_end_date: Date,
        price_calculator: Arc<dyn PriceCalculator>,
        begin_price_override: Option<f64>,
        is_absolute: bool,
    ) -> Self {
        Self {
            period_start_pay_date,
            period_end_pay_date,
            currency,
            accrual_begin_date,
            accrual_end_date,
            price_calculator,
            begin_price_override: begin_price_override.filter(|p| !p.is_nan()),
            is_absolute,
            credit_risk_end_date: None,
            cutoff_date: None,
            time_grids: None,
        }
    }

    /// Sets an explicit credit-risk end date.
    #[must_use]
    pub fn with_credit_risk_end_date(mut self, date: Date) -> Self {
        self.credit_risk_end_date = Some(date);
        self
    }

    /// Sets the cutoff date.
    #[must_use]
    pub fn with_cutoff_date(mut self, date: Date) -> Self {
        self.cutoff_date = Some(date);
        self
    }

    /// Sets explicit time grids.
    #[must_use]
    pub fn with_time_grids(mut self, grids: BTreeSet<Date>) -> Self {
        self.time_grids = Some(grids);
        self
    }

    /// Payment date of the previous period (start of this one).
    pub fn period_start_pay_date(&self) -> Date {
        self.period_start_pay_date
    }

    /// Payment date of this period.
    pub fn period_end_pay_date(&self) -> Date {
        self.period_end_pay_date
    }

    /// Settlement currency.
    pub fn currency(&self) -> Currency {
        self.currency
    }

    /// Date the begin price is observed.
    pub fn accrual_begin_date(&self) -> Date {
        self.accrual_begin_date
    }

    /// Date the end price is observed.
    pub fn accrual_end_date(&self) -> Date {
        self.accrual_end_date
    }

    /// The price calculator resolving this payment.
    pub fn price_calculator(&self) -> &Arc<dyn PriceCalculator> {
        &self.price_calculator
    }

    /// Contractual begin price, present only for the first period.
    pub fn begin_price_override(&self) -> Option<f64> {
        self.begin_price_override
    }

    /// True for price-difference (resetting notional) semantics.
    pub fn is_absolute(&self) -> bool {
        self.is_absolute
    }

    /// End of credit-risk exposure; defaults to the period's payment date.
    pub fn credit_risk_end_date(&self) -> Date {
        self.credit_risk_end_date
            .unwrap_or(self.period_end_pay_date)
    }

    /// Cutoff date, if any.
    pub fn cutoff_date(&self) -> Option<Date> {
        self.cutoff_date
    }

    /// Explicit time grids, if any.
    pub fn time_grids(&self) -> Option<&BTreeSet<Date>> {
        self.time_grids.as_ref()
    }

    /// Resolves the begin price.
    pub fn begin_price(&self) -> LegResult<f64> {
        resolve_price(
            &self.price_calculator,
            self.begin_price_override,
            self.accrual_begin_date,
        )
    }

    /// Computes the unscaled amount.
    pub fn amount(&self) -> LegResult<f64> {
        let begin = self.begin_price()?;
        let end = self.price_calculator.price(self.accrual_end_date)?;
        Ok(self
            .price_calculator
            .calculate_return(begin, end, self.is_absolute))
    }
}

// =============================================================================
// REFERENCE AMOUNT
// =============================================================================

/// Compensation for a partial redemption of the underlying at par while the
/// swap carries it at the observed price.
///
/// Balances are normalized to one unit of initial investment.
#[derive(Debug, Clone)]
pub struct ReferenceAmountPayment {
    pay_date: Date,
    currency: Currency,
    balance_before_change: f64,
    principal_payment_amount: f64,
    anchor_value_date: Date,
    price_calculator: Arc<dyn PriceCalculator>,
    price_override: Option<f64>,
    credit_risk_end_date: Option<Date>,
    cutoff_date: Option<Date>,
    time_grids: Option<BTreeSet<Date>>,
}

impl ReferenceAmountPayment {
    /// Creates a reference-amount payment.
    ///
    /// A NaN override is treated as absent.
    #[allow(clippy::too_many_arguments)]
    #[must_use]
    pub fn new(
        pay_date: Date,
        currency: Currency,
        balance_before_change: f64,
        principal_payment_amount: f64,
        anchor_value_date: Date,
        price_calculator: Arc<dyn PriceCalculator>,
        price_override: Option<f64>,
    ) -> Self {
        Self {
            pay_date,
            currency,
            balance_before_change,
            principal_payment_amount,
            anchor_value_date,
            price_calculator,
            price_override: price_override.filter(|p| !p.is_nan()),
            credit_risk_end_date: None,
            cutoff_date: None,
            time_grids: None,
        }
    }

    /// Sets the credit-risk end date copied from the source event.
    #[must_use]
    pub fn with_credit_risk_end_date(mut self, date: Option<Date>) -> Self {
        self.credit_risk_end_date = date;
        self
    }

    /// Sets the cutoff date.
    #[must_use]
    pub fn with_cutoff_date(mut self, date: Date) -> Self {
        self.cutoff_date = Some(date);
        self
    }

    /// Sets explicit time grids.
    #[must_use]
    pub fn with_time_grids(mut self, grids: BTreeSet<Date>) -> Self {
        self.time_grids = Some(grids);
        self
    }

    /// Payment (redemption) date.
    pub fn pay_date(&self) -> Date {
        self.pay_date
    }

    /// Settlement currency.
    pub fn currency(&self) -> Currency {
        self.currency
    }

    /// Normalized balance before the redemption.
    pub fn balance_before_change(&self) -> f64 {
        self.balance_before_change
    }

    /// Normalized principal redeemed.
    pub fn principal_payment_amount(&self) -> f64 {
        self.principal_payment_amount
    }

    /// Value date the reference price is observed on.
    pub fn anchor_value_date(&self) -> Date {
        self.anchor_value_date
    }

    /// The price calculator resolving this payment.
    pub fn price_calculator(&self) -> &Arc<dyn PriceCalculator> {
        &self.price_calculator
    }

    /// Contractual price, present only in the first period.
    pub fn price_override(&self) -> Option<f64> {
        self.price_override
    }

    /// Credit-risk end date copied from the source event, if any.
    pub fn source_credit_risk_end_date(&self) -> Option<Date> {
        self.credit_risk_end_date
    }

    /// End of credit-risk exposure; defaults to the payment date.
    pub fn credit_risk_end_date(&self) -> Date {
        self.credit_risk_end_date.unwrap_or(self.pay_date)
    }

    /// Cutoff date, if any.
    pub fn cutoff_date(&self) -> Option<Date> {
        self.cutoff_date
    }

    /// Explicit time grids, if any.
    pub fn time_grids(&self) -> Option<&BTreeSet<Date>> {
        self.time_grids.as_ref()
    }

    /// Resolves the reference price.
    pub fn reference_price(&self) -> LegResult<f64> {
        resolve_price(
            &self.price_calculator,
            self.price_override,
            self.anchor_value_date,
        )
    }

    /// Computes the amount: `(par - price) * principal`.
    pub fn amount(&self) -> LegResult<f64> {
        let price = self.reference_price()?;
        Ok((self.price_calculator.par_price() - price) * self.principal_payment_amount)
    }
}

impl NotionalChangeInfo for ReferenceAmountPayment {
    fn date(&self) -> Date {
        self.pay_date
    }

    fn notional_before_change(&self) -> f64 {
        self.balance_before_change
    }

    fn notional_after_change(&self) -> f64 {
        self.balance_before_change - self.principal_payment_amount
    }

    fn credit_risk_end_date(&self) -> Option<Date> {
        self.credit_risk_end_date
    }
}

// =============================================================================
// RECOVERY RETURN
// =============================================================================

/// Recovery-contingent return: the underlying is assumed to settle at its
/// recovery value instead of its market price.
#[derive(Debug, Clone)]
pub struct RecoveryReturnPayment {
    begin_date: Date,
    end_date: Date,
    currency: Currency,
    recovery_rate: f64,
    is_absolute: bool,
    price_calculator: Arc<dyn PriceCalculator>,
    begin_price_override: Option<f64>,
    cutoff_date: Option<Date>,
    time_grids: Option<BTreeSet<Date>>,
}

impl RecoveryReturnPayment {
    /// Creates a recovery-return payment paying on `end_date`.
    #[allow(clippy::too_many_arguments)]
    #[must_use]
    pub fn new(
        begin_date: Date,
        end_date: Date,
        currency: Currency,
        recovery_rate: f64,
        is_absolute: bool,
        price_calculator: Arc<dyn PriceCalculator>,
        begin_price_override: Option<f64>,
    ) -> Self {
        Self {
            begin_date,
            end_date,
            currency,
            recovery_rate,
            is_absolute,
            price_calculator,
            begin_price_override: begin_price_override.filter(|p| !p.is_nan()),
            cutoff_date: None,
            time_grids: None,
        }
    }

    /// Sets the cutoff date.
    #[must_use]
    pub fn with_cutoff_date(mut self, date: Option<Date>) -> Self {
        self.cutoff_date = date;
        self
    }

    /// Sets explicit time grids.
    #[must_use]
    pub fn with_time_grids(mut self, grids: Option<BTreeSet<Date>>) -> Self {
        self.time_grids = grids;
        self
    }

    /// Start of the credit-risk window.
    pub fn begin_date(&self) -> Date {
        self.begin_date
    }

    /// End of the credit-risk window, also the payment date.
    pub fn end_date(&self) -> Date {
        self.end_date
    }

    /// Settlement currency.
    pub fn currency(&self) -> Currency {
        self.currency
    }

    /// Recovery rate applied.
    pub fn recovery_rate(&self) -> f64 {
        self.recovery_rate
    }

    /// True for price-difference semantics.
    pub fn is_absolute(&self) -> bool {
        self.is_absolute
    }

    /// Contractual begin price, if any.
    pub fn begin_price_override(&self) -> Option<f64> {
        self.begin_price_override
    }

    /// Cutoff date, if any.
    pub fn cutoff_date(&self) -> Option<Date> {
        self.cutoff_date
    }

    /// Explicit time grids, if any.
    pub fn time_grids(&self) -> Option<&BTreeSet<Date>> {
        self.time_grids.as_ref()
    }

    /// Computes the unscaled amount from the begin price and the recovery value.
    pub fn amount(&self) -> LegResult<f64> {
        let begin = resolve_price(
            &self.price_calculator,
            self.begin_price_override,
            self.begin_date,
        )?;
        let recovered = self.recovery_rate * self.price_calculator.par_price();
        Ok(self
            .price_calculator
            .calculate_return(begin, recovered, self.is_absolute))
    }
}

// =============================================================================
// PAYMENT
// =============================================================================

/// A return-leg payment.
///
/// `Scaled` multiplies the inner payment's amount; see [`crate::scale`] for
/// how chains are composed and flattened.
#[derive(Debug, Clone)]
pub enum Payment {
    /// Period price return
    PriceReturn(PriceReturnPayment),
    /// Redemption compensation
    ReferenceAmount(ReferenceAmountPayment),
    /// Recovery-contingent return
    RecoveryReturn(RecoveryReturnPayment),
    /// A payment multiplied by a notional factor
    Scaled {
        /// The wrapped payment
        inner: Box<Payment>,
        /// Multiplier applied to the inner amount
        factor: f64,
    },
}

impl Payment {
    /// Returns the innermost concrete record.
    pub fn concrete(&self) -> &Payment {
        let mut current = self;
        while let Payment::Scaled { inner, .. } = current {
            current = inner;
        }
        current
    }

    /// Kind of the innermost record.
    pub fn kind(&self) -> PaymentKind {
        match self {
            Payment::PriceReturn(_) => PaymentKind::PriceReturn,
            Payment::ReferenceAmount(_) => PaymentKind::ReferenceAmount,
            Payment::RecoveryReturn(_) => PaymentKind::RecoveryReturn,
            Payment::Scaled { inner, .. } => inner.kind(),
        }
    }

    /// Cumulative scale factor (1.0 when unwrapped).
    pub fn scale_factor(&self) -> f64 {
        let mut factor = 1.0;
        let mut current = self;
        while let Payment::Scaled { inner, factor: f } = current {
            factor *= f;
            current = inner;
        }
        factor
    }

    /// True if the payment carries a scale factor.
    pub fn is_scaled(&self) -> bool {
        matches!(self, Payment::Scaled { .. })
    }

    /// Payment date.
    pub fn pay_date(&self) -> Date {
        match self {
            Payment::PriceReturn(p) => p.period_end_pay_date(),
            Payment::ReferenceAmount(p) => p.pay_date(),
            Payment::RecoveryReturn(p) => p.end_date(),
            Payment::Scaled { inner, .. } => inner.pay_date(),
        }
    }

    /// Settlement currency.
    pub fn currency(&self) -> Currency {
        match self {
            Payment::PriceReturn(p) => p.currency(),
            Payment::ReferenceAmount(p) => p.currency(),
            Payment::RecoveryReturn(p) => p.currency(),
            Payment::Scaled { inner, .. } => inner.currency(),
        }
    }

    /// Value date the payment's exposure starts from.
    ///
    /// This is the accrual begin of a price return and the anchor of a
    /// reference amount, which is also where a projected recovery return
    /// begins.
    pub fn begin_date(&self) -> Date {
        match self {
            Payment::PriceReturn(p) => p.accrual_begin_date(),
            Payment::ReferenceAmount(p) => p.anchor_value_date(),
            Payment::RecoveryReturn(p) => p.begin_date(),
            Payment::Scaled { inner, .. } => inner.begin_date(),
        }
    }

    /// End of the period the payment covers.
    pub fn end_date(&self) -> Date {
        match self {
            Payment::PriceReturn(p) => p.period_end_pay_date(),
            Payment::ReferenceAmount(p) => p.pay_date(),
            Payment::RecoveryReturn(p) => p.end_date(),
            Payment::Scaled { inner, .. } => inner.end_date(),
        }
    }

    /// End of credit-risk exposure.
    pub fn credit_risk_end_date(&self) -> Date {
        match self {
            Payment::PriceReturn(p) => p.credit_risk_end_date(),
            Payment::ReferenceAmount(p) => p.credit_risk_end_date(),
            Payment::RecoveryReturn(p) => p.end_date(),
            Payment::Scaled { inner, .. } => inner.credit_risk_end_date(),
        }
    }

    /// Cutoff date, if any.
    pub fn cutoff_date(&self) -> Option<Date> {
        match self {
            Payment::PriceReturn(p) => p.cutoff_date(),
            Payment::ReferenceAmount(p) => p.cutoff_date(),
            Payment::RecoveryReturn(p) => p.cutoff_date(),
            Payment::Scaled { inner, .. } => inner.cutoff_date(),
        }
    }

    /// Explicit time grids, if any.
    pub fn time_grids(&self) -> Option<&BTreeSet<Date>> {
        match self {
            Payment::PriceReturn(p) => p.time_grids(),
            Payment::ReferenceAmount(p) => p.time_grids(),
            Payment::RecoveryReturn(p) => p.time_grids(),
            Payment::Scaled { inner, .. } => inner.time_grids(),
        }
    }

    /// Resolves the amount, including any scale factor.
    ///
    /// Price lookups happen here; a failure affects this payment only.
    pub fn amount(&self) -> LegResult<f64> {
        match self {
            Payment::PriceReturn(p) => p.amount(),
            Payment::ReferenceAmount(p) => p.amount(),
            Payment::RecoveryReturn(p) => p.amount(),
            Payment::Scaled { inner, factor } => Ok(inner.amount()? * factor),
        }
    }

    /// Returns the price-return record, if that is the concrete kind.
    pub fn as_price_return(&self) -> Option<&PriceReturnPayment> {
        match self.concrete() {
            Payment::PriceReturn(p) => Some(p),
            _ => None,
        }
    }

    /// Returns the reference-amount record, if that is the concrete kind.
    pub fn as_reference_amount(&self) -> Option<&ReferenceAmountPayment> {
        match self.concrete() {
            Payment::ReferenceAmount(p) => Some(p),
            _ => None,
        }
    }

    /// Returns the recovery-return record, if that is the concrete kind.
    pub fn as_recovery_return(&self) -> Option<&RecoveryReturnPayment> {
        match self.concrete() {
            Payment::RecoveryReturn(p) => Some(p),
            _ => None,
        }
    }
}

impl fmt::Display for Payment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {}..{} paid {} ({})",
            self.kind(),
            self.begin_date(),
            self.end_date(),
            self.pay_date(),
            self.currency()
        )?;
        if self.is_scaled() {
            write!(f, " x{}", self.scale_factor())?;
        }
        Ok(())
    }
}

impl From<PriceReturnPayment> for Payment {
    fn from(p: PriceReturnPayment) -> Self {
        Payment::PriceReturn(p)
    }
}

impl From<ReferenceAmountPayment> for Payment {
    fn from(p: ReferenceAmountPayment) -> Self {
        Payment::ReferenceAmount(p)
    }
}

impl From<RecoveryReturnPayment> for Payment {
    fn from(p: RecoveryReturnPayment) -> Self {
        Payment::RecoveryReturn(p)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use trs_core::{TrsError, TrsResult};

    #[derive(Debug)]
    struct StepPrice {
        switch: Date,
        before: f64,
        after: f64,
    }

    impl PriceCalculator for StepPrice {
        fn price(&self, date: Date) -> TrsResult<f64> {
            Ok(if date < self.switch {
                self.before
            } else {
                self.after
            })
        }
    }

    #[derive(Debug)]
    struct NoPrices;

    impl PriceCalculator for NoPrices {
        fn price(&self, date: Date) -> TrsResult<f64> {
            Err(TrsError::price_unavailable(date, "no market data"))
        }
    }

    fn date(y: i32, m: u32, d: u32) -> Date {
        Date::from_ymd(y, m, d).unwrap()
    }

    fn calculator() -> Arc<dyn PriceCalculator> {
        Arc::new(StepPrice {
            switch: date(2021, 1, 1),
            before: 0.95,
            after: 0.99,
        })
    }

    fn price_return(override_price: Option<f64>, is_absolute: bool) -> PriceReturnPayment {
        PriceReturnPayment::new(
            date(2020, 1, 1),
            date(2021, 1, 5),
            Currency::USD,
            date(2020, 1, 1),
            date(2021, 1, 1),
            calculator(),
            override_price,
            is_absolute,
        )
    }

    #[test]
    fn test_price_return_uses_override() {
        let p = price_return(Some(0.9), false);
        assert_relative_eq!(p.amount().unwrap(), 0.99 / 0.9 - 1.0, epsilon = 1e-12);

        let absolute = price_return(Some(0.9), true);
        assert_relative_eq!(absolute.amount().unwrap(), 0.09, epsilon = 1e-12);
    }

    #[test]
    fn test_nan_override_resolves_through_calculator() {
        let p = price_return(Some(f64::NAN), true);
        assert_eq!(p.begin_price_override(), None);
        assert_relative_eq!(p.begin_price().unwrap(), 0.95);
        assert_relative_eq!(p.amount().unwrap(), 0.04, epsilon = 1e-12);
    }

    #[test]
    fn test_price_failure_is_per_payment() {
        let p = PriceReturnPayment::new(
            date(2020, 1, 1),
            date(2021, 1, 5),
            Currency::USD,
            date(2020, 1, 1),
            date(2021, 1, 1),
            Arc::new(NoPrices),
            Some(1.0),
            false,
        );
        assert!(p.amount().is_err());
    }

    #[test]
    fn test_reference_amount_formula_and_notional_info() {
        let r = ReferenceAmountPayment::new(
            date(2020, 6, 1),
            Currency::EUR,
            1.0,
            0.4,
            date(2020, 1, 1),
            calculator(),
            None,
        );
        // (1 - 0.95) * 0.4
        assert_relative_eq!(r.amount().unwrap(), 0.02, epsilon = 1e-12);
        assert_eq!(r.date(), date(2020, 6, 1));
        assert_relative_eq!(r.notional_after_change(), 0.6, epsilon = 1e-12);
        assert_eq!(r.credit_risk_end_date(), date(2020, 6, 1));
        assert_eq!(NotionalChangeInfo::credit_risk_end_date(&r), None);
    }

    #[test]
    fn test_recovery_return_amount() {
        let r = RecoveryReturnPayment::new(
            date(2020, 1, 1),
            date(2020, 12, 31),
            Currency::USD,
            0.4,
            true,
            calculator(),
            None,
        );
        assert_relative_eq!(r.amount().unwrap(), 0.4 - 0.95, epsilon = 1e-12);
    }

    #[test]
    fn test_payment_accessors_through_scaling() {
        let inner = Payment::from(price_return(Some(0.9), false));
        let scaled = Payment::Scaled {
            inner: Box::new(Payment::Scaled {
                inner: Box::new(inner.clone()),
                factor: 0.5,
            }),
            factor: 0.4,
        };

        assert_eq!(scaled.kind(), PaymentKind::PriceReturn);
        assert_eq!(scaled.pay_date(), date(2021, 1, 5));
        assert_eq!(scaled.currency(), Currency::USD);
        assert_relative_eq!(scaled.scale_factor(), 0.2, epsilon = 1e-12);
        assert_relative_eq!(
            scaled.amount().unwrap(),
            inner.amount().unwrap() * 0.2,
            epsilon = 1e-12
        );
        assert!(scaled.as_price_return().is_some());
        assert!(scaled.as_reference_amount().is_none());
    }

    #[test]
    fn test_display() {
        let p = Payment::from(price_return(None, false));
        assert_eq!(
            p.to_string(),
            "Price Return 2020-01-01..2021-01-05 paid 2021-01-05 (USD)"
        );
    }
}
