//! Settlement currencies.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::TrsError;

/// ISO 4217 currency of a swap leg.
///
/// Variant order matches [`CURRENCY_TABLE`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum Currency {
    /// United States Dollar
    #[default]
    USD,
    /// Euro
    EUR,
    /// British Pound Sterling
    GBP,
    /// Japanese Yen
    JPY,
    /// Swiss Franc
    CHF,
    /// Canadian Dollar
    CAD,
    /// Australian Dollar
    AUD,
    /// Hong Kong Dollar
    HKD,
    /// Singapore Dollar
    SGD,
    /// Chinese Yuan Renminbi
    CNY,
}

/// (currency, ISO code, minor units) in variant order.
const CURRENCY_TABLE: [(Currency, &str, u32); 10] = [
    (Currency::USD, "USD", 2),
    (Currency::EUR, "EUR", 2),
    (Currency::GBP, "GBP", 2),
    (Currency::JPY, "JPY", 0),
    (Currency::CHF, "CHF", 2),
    (Currency::CAD, "CAD", 2),
    (Currency::AUD, "AUD", 2),
    (Currency::HKD, "HKD", 2),
    (Currency::SGD, "SGD", 2),
    (Currency::CNY, "CNY", 2),
];

impl Currency {
    /// All supported currencies.
    pub fn all() -> impl Iterator<Item = Currency> {
        CURRENCY_TABLE.iter().map(|&(ccy, _, _)| ccy)
    }

    /// ISO 4217 code.
    #[must_use]
    pub fn code(self) -> &'static str {
        CURRENCY_TABLE[self as usize].1
    }

    /// Digits after the decimal point in settlement amounts.
    #[must_use]
    pub fn minor_units(self) -> u32 {
        CURRENCY_TABLE[self as usize].2
    }

    /// Looks up a currency by code, ignoring case.
    #[must_use]
    pub fn from_code(code: &str) -> Option<Self> {
        CURRENCY_TABLE
            .iter()
            .find(|(_, iso, _)| iso.eq_ignore_ascii_case(code.trim()))
            .map(|&(ccy, _, _)| ccy)
    }
}

impl FromStr for Currency {
    type Err = TrsError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_code(s).ok_or_else(|| TrsError::UnknownCurrency {
            code: s.to_string(),
        })
    }
}

impl fmt::Display for Currency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}
