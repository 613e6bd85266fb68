//! Menu price using decimal arithmetic.
//!
//! Prices are in Brazilian reais. They travel as plain JSON numbers
//! (`20.0`) because that is what the extraction model returns and what the
//! persisted menu blob has always contained.

use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};

/// A price in reais.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Default)]
#[serde(transparent)]
pub struct Price(#[serde(with = "rust_decimal::serde::float")] Decimal);

impl Price {
    /// Create a new price.
    #[must_use]
    pub const fn new(amount: Decimal) -> Self {
        Self(amount)
    }

    /// Create a price from centavos.
    #[must_use]
    pub fn from_cents(cents: i64) -> Self {
        Self(Decimal::new(cents, 2))
    }

    /// The underlying amount.
    #[must_use]
    pub const fn amount(&self) -> Decimal {
        self.0
    }

    /// Format for display the way Brazilian menus print it: `R$ 1.234,50`.
    #[must_use]
    pub fn display(&self) -> String {
        let rounded = self
            .0
            .round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero);
        let text = format!("{:.2}", rounded.abs());
        let (whole, cents) = text.split_once('.').unwrap_or((text.as_str(), "00"));

        let mut grouped = String::with_capacity(whole.len() + whole.len() / 3);
        for (i, ch) in whole.chars().enumerate() {
            if i > 0 && (whole.len() - i) % 3 == 0 {
                grouped.push('.');
            }
            grouped.push(ch);
        }

        let sign = if rounded.is_sign_negative() && !rounded.is_zero() {
            "-"
        } else {
            ""
        };
        format!("{sign}R$ {grouped},{cents}")
    }
}

impl From<Decimal> for Price {
    fn from(amount: Decimal) -> Self {
        Self(amount)
    }
}

impl std::fmt::Display for Price {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.display())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_brl() {
        assert_eq!(Price::from_cents(2000).display(), "R$ 20,00");
        assert_eq!(Price::from_cents(123_450).display(), "R$ 1.234,50");
        assert_eq!(Price::from_cents(100_000_000).display(), "R$ 1.000.000,00");
        assert_eq!(Price::from_cents(5).display(), "R$ 0,05");
    }

    #[test]
    fn test_display_rounds_half_up() {
        let price = Price::new(Decimal::new(19_995, 3));
        assert_eq!(price.display(), "R$ 20,00");
    }

    #[test]
    fn test_price_is_a_json_number() {
        let price = Price::from_cents(2250);
        let json = serde_json::to_string(&price).expect("serialize");
        assert_eq!(json, "22.5");

        let back: Price = serde_json::from_str("20").expect("deserialize");
        assert_eq!(back, Price::from_cents(2000));
    }
}
