//! Money representation and currency conversion.
//!
//! Catalog prices are stored in Chilean pesos, which have no minor unit,
//! so an amount is always a whole `i64`. USD display prices are derived
//! from the brand's configured exchange rate with ceiling division (a
//! quote should never undershoot the peso price).

use rust_decimal::Decimal;
use rust_decimal::prelude::ToPrimitive;
use serde::{Deserialize, Serialize};

/// Fallback USD exchange rate when the brand settings carry none.
const DEFAULT_USD_EXCHANGE_RATE: i64 = 950;

/// A catalog price in Chilean pesos.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, Default,
)]
#[serde(transparent)]
pub struct Price(i64);

impl Price {
    /// Create a price from a peso amount.
    #[must_use]
    pub const fn new(clp: i64) -> Self {
        Self(clp)
    }

    /// The peso amount.
    #[must_use]
    pub const fn clp(&self) -> i64 {
        self.0
    }

    /// Line total for `quantity` units, saturating on overflow.
    #[must_use]
    pub const fn times(&self, quantity: u32) -> Self {
        Self(self.0.saturating_mul(quantity as i64))
    }

    /// Sum two prices, saturating on overflow.
    #[must_use]
    pub const fn plus(&self, other: Self) -> Self {
        Self(self.0.saturating_add(other.0))
    }

    /// Amount in the requested display currency.
    ///
    /// Pesos pass through untouched; dollars are `ceil(clp / rate)`.
    #[must_use]
    pub fn in_currency(&self, currency: Currency, rate: ExchangeRate) -> i64 {
        match currency {
            Currency::Clp => self.0,
            Currency::Usd => rate.convert_clp(self.0),
        }
    }

    /// Format for display in the requested currency, e.g. `$11.875.000`
    /// or `USD $12.500`.
    #[must_use]
    pub fn display(&self, currency: Currency, rate: ExchangeRate) -> String {
        format_amount(self.in_currency(currency, rate), currency)
    }
}

impl From<i64> for Price {
    fn from(clp: i64) -> Self {
        Self(clp)
    }
}

/// Display currencies offered by the storefront toggle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "UPPERCASE")]
pub enum Currency {
    #[default]
    Clp,
    Usd,
}

impl Currency {
    /// ISO 4217 code.
    #[must_use]
    pub const fn code(&self) -> &'static str {
        match self {
            Self::Clp => "CLP",
            Self::Usd => "USD",
        }
    }

    /// Display prefix used in front of formatted amounts.
    #[must_use]
    pub const fn symbol(&self) -> &'static str {
        match self {
            Self::Clp => "$",
            Self::Usd => "USD $",
        }
    }

    /// The other currency (the storefront offers exactly two).
    #[must_use]
    pub const fn toggled(&self) -> Self {
        match self {
            Self::Clp => Self::Usd,
            Self::Usd => Self::Clp,
        }
    }
}

/// CLP-per-USD exchange rate from the brand settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExchangeRate(Decimal);

impl ExchangeRate {
    /// Build from the settings row value; nonpositive or non-finite input
    /// falls back to the default rate.
    #[must_use]
    pub fn from_f64(rate: f64) -> Self {
        match Decimal::from_f64_retain(rate) {
            Some(d) if d > Decimal::ZERO => Self(d),
            _ => Self::default(),
        }
    }

    /// Convert a peso amount to dollars, rounding up.
    #[must_use]
    pub fn convert_clp(&self, clp: i64) -> i64 {
        (Decimal::from(clp) / self.0).ceil().to_i64().unwrap_or(clp)
    }
}

impl Default for ExchangeRate {
    fn default() -> Self {
        Self(Decimal::from(DEFAULT_USD_EXCHANGE_RATE))
    }
}

/// Format a raw amount in the display style of the given currency.
///
/// CLP groups thousands with `.` (es-CL), USD with `,` (en-US).
#[must_use]
pub fn format_amount(amount: i64, currency: Currency) -> String {
    let separator = match currency {
        Currency::Clp => '.',
        Currency::Usd => ',',
    };
    format!(
        "{}{}",
        currency.symbol(),
        group_thousands(amount, separator)
    )
}

/// Insert a separator every three digits, preserving a leading sign.
fn group_thousands(amount: i64, separator: char) -> String {
    let digits = amount.unsigned_abs().to_string();
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3 + 1);
    if amount < 0 {
        grouped.push('-');
    }
    let first_group = digits.len() % 3;
    for (i, c) in digits.chars().enumerate() {
        if i != 0 && i % 3 == first_group % 3 {
            grouped.push(separator);
        }
        grouped.push(c);
    }
    grouped
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn clp_formatting_groups_with_dots() {
        assert_eq!(
            Price::new(11_875_000).display(Currency::Clp, ExchangeRate::default()),
            "$11.875.000"
        );
        assert_eq!(
            Price::new(950).display(Currency::Clp, ExchangeRate::default()),
            "$950"
        );
        assert_eq!(
            Price::new(0).display(Currency::Clp, ExchangeRate::default()),
            "$0"
        );
    }

    #[test]
    fn usd_conversion_rounds_up() {
        let rate = ExchangeRate::from_f64(950.0);
        // 1000 / 950 = 1.05... -> 2
        assert_eq!(Price::new(1000).in_currency(Currency::Usd, rate), 2);
        assert_eq!(Price::new(950).in_currency(Currency::Usd, rate), 1);
        assert_eq!(
            Price::new(11_875_000).display(Currency::Usd, rate),
            "USD $12,500"
        );
    }

    #[test]
    fn invalid_rate_falls_back_to_default() {
        assert_eq!(ExchangeRate::from_f64(0.0), ExchangeRate::default());
        assert_eq!(ExchangeRate::from_f64(-12.0), ExchangeRate::default());
        assert_eq!(ExchangeRate::from_f64(f64::NAN), ExchangeRate::default());
    }

    #[test]
    fn currency_toggle_is_an_involution() {
        assert_eq!(Currency::Clp.toggled(), Currency::Usd);
        assert_eq!(Currency::Usd.toggled().toggled(), Currency::Usd);
    }

    #[test]
    fn line_totals_saturate() {
        let total = Price::new(i64::MAX).times(2);
        assert_eq!(total.clp(), i64::MAX);
        assert_eq!(Price::new(2500).times(3).clp(), 7500);
    }
}
