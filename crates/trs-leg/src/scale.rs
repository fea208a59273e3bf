//! Scale-factor composition for payments.
//!
//! A payment is scaled by wrapping it in [`Payment::Scaled`]. Factors close to
//! one are not applied, and scaling an already scaled payment multiplies into
//! the existing wrapper, so a chain always reduces to one concrete record and
//! one cumulative factor.

use crate::payments::Payment;

/// Default distance from 1.0 below which a factor is not applied.
pub const DEFAULT_SCALE_TOLERANCE: f64 = 1e-12;

/// Applies and flattens payment scale factors.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScaleComposer {
    tolerance: f64,
}

impl Default for ScaleComposer {
    fn default() -> Self {
        Self::new(DEFAULT_SCALE_TOLERANCE)
    }
}

impl ScaleComposer {
    /// Creates a composer with the given tolerance.
    #[must_use]
    pub fn new(tolerance: f64) -> Self {
        Self { tolerance }
    }

    /// Returns the tolerance.
    pub fn tolerance(&self) -> f64 {
        self.tolerance
    }

    /// Returns true if `factor` is close enough to 1.0 to be left off.
    pub fn is_unit(&self, factor: f64) -> bool {
        (factor - 1.0).abs() < self.tolerance
    }

    /// Scales a payment by `factor`.
    ///
    /// The result is never more than one wrapper deep. If the cumulative
    /// factor ends up within tolerance of one the concrete payment is
    /// returned unwrapped.
    pub fn scale_by(&self, payment: Payment, factor: f64) -> Payment {
        if self.is_unit(factor) {
            return payment;
        }
        let (inner, existing) = into_flattened(payment);
        let cumulative = existing * factor;
        if self.is_unit(cumulative) {
            inner
        } else {
            Payment::Scaled {
                inner: Box::new(inner),
                factor: cumulative,
            }
        }
    }
}

/// Returns the innermost concrete payment and the cumulative factor.
pub fn flatten(payment: &Payment) -> (&Payment, f64) {
    let mut factor = 1.0;
    let mut current = payment;
    while let Payment::Scaled { inner, factor: f } = current {
        factor *= f;
        current = inner;
    }
    (current, factor)
}

/// Owned form of [`flatten`].
pub fn into_flattened(payment: Payment) -> (Payment, f64) {
    let mut factor = 1.0;
    let mut current = payment;
    while let Payment::Scaled { inner, factor: f } = current {
        factor *= f;
        current = *inner;
    }
    (current, factor)
}

/// Scales a payment with the default tolerance.
pub fn scale_by(payment: Payment, factor: f64) -> Payment {
    ScaleComposer::default().scale_by(payment, factor)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::payments::{PaymentKind, PriceReturnPayment};
    use approx::assert_relative_eq;
    use std::sync::Arc;
    use trs_core::traits::PriceCalculator;
    use trs_core::{Currency, Date, TrsResult};

    #[derive(Debug)]
    struct Flat;

    impl PriceCalculator for Flat {
        fn price(&self, _date: Date) -> TrsResult<f64> {
            Ok(1.0)
        }
    }

    fn payment() -> Payment {
        let begin = Date::from_ymd(2020, 1, 1).unwrap();
        let end = Date::from_ymd(2021, 1, 1).unwrap();
        PriceReturnPayment::new(begin, end, Currency::USD, begin, end, Arc::new(Flat), None, false)
            .into()
    }

    #[test]
    fn test_unit_factor_not_wrapped() {
        let p = scale_by(payment(), 1.0);
        assert!(!p.is_scaled());

        let near = scale_by(payment(), 1.0 + 1e-14);
        assert!(!near.is_scaled());
    }

    #[test]
    fn test_scale_wraps_once() {
        let p = scale_by(payment(), 0.6);
        assert!(p.is_scaled());
        assert_relative_eq!(p.scale_factor(), 0.6);
    }

    #[test]
    fn test_nested_scaling_collapses() {
        let p = scale_by(scale_by(payment(), 0.5), 0.4);
        match &p {
            Payment::Scaled { inner, factor } => {
                assert!(!inner.is_scaled());
                assert_relative_eq!(*factor, 0.2, epsilon = 1e-15);
            }
            other => panic!("expected scaled payment, got {other}"),
        }
    }

    #[test]
    fn test_inverse_factors_cancel() {
        let p = scale_by(scale_by(payment(), 0.5), 2.0);
        assert!(!p.is_scaled());
    }

    #[test]
    fn test_flatten_hand_built_chain() {
        let chain = Payment::Scaled {
            inner: Box::new(Payment::Scaled {
                inner: Box::new(payment()),
                factor: 3.0,
            }),
            factor: 0.25,
        };
        let (inner, factor) = flatten(&chain);
        assert_eq!(inner.kind(), PaymentKind::PriceReturn);
        assert!(!inner.is_scaled());
        assert_relative_eq!(factor, 0.75);

        let (owned, owned_factor) = into_flattened(chain);
        assert!(!owned.is_scaled());
        assert_relative_eq!(owned_factor, 0.75);
    }

    #[test]
    fn test_flatten_concrete_is_identity() {
        let p = payment();
        let (inner, factor) = flatten(&p);
        assert!(!inner.is_scaled());
        assert_relative_eq!(factor, 1.0);
    }

    #[test]
    fn test_custom_tolerance() {
        let composer = ScaleComposer::new(1e-3);
        assert!(composer.is_unit(1.0005));
        assert!(!composer.scale_by(payment(), 1.0005).is_scaled());
        assert!(composer.scale_by(payment(), 1.01).is_scaled());
    }
}
