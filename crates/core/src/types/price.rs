//! Type-safe price representation using decimal arithmetic.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// A price with currency information.
///
/// Amounts are held in the currency's standard unit (dirhams, not centimes)
/// as [`Decimal`] so no arithmetic ever passes through floating point.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Price {
    /// Amount in the currency's standard unit.
    pub amount: Decimal,
    /// ISO 4217 currency code.
    pub currency_code: CurrencyCode,
}

impl Price {
    /// Create a new price.
    #[must_use]
    pub const fn new(amount: Decimal, currency_code: CurrencyCode) -> Self {
        Self {
            amount,
            currency_code,
        }
    }

    /// Create a price in the store currency (MAD).
    #[must_use]
    pub const fn mad(amount: Decimal) -> Self {
        Self::new(amount, CurrencyCode::MAD)
    }

    /// Format for display, e.g. `12 500 MAD`.
    ///
    /// Whole amounts drop the fractional part; anything else keeps two
    /// decimal places. Thousands are grouped with a narrow space the way the
    /// storefront renders prices.
    #[must_use]
    pub fn display(&self) -> String {
        format!(
            "{} {}",
            format_amount(self.amount),
            self.currency_code.code()
        )
    }
}

impl std::fmt::Display for Price {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.display())
    }
}

/// ISO 4217 currency codes accepted by the storefront.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum CurrencyCode {
    /// Moroccan dirham, the store currency.
    #[default]
    MAD,
    EUR,
    USD,
}

impl CurrencyCode {
    /// The ISO 4217 code as a string.
    #[must_use]
    pub const fn code(self) -> &'static str {
        match self {
            Self::MAD => "MAD",
            Self::EUR => "EUR",
            Self::USD => "USD",
        }
    }
}

/// Group an amount's integer digits in threes.
#[must_use]
pub fn format_amount(amount: Decimal) -> String {
    let rendered = if amount.fract().is_zero() {
        amount.trunc().to_string()
    } else {
        format!("{amount:.2}")
    };

    let (int_part, frac_part) = match rendered.split_once('.') {
        Some((i, f)) => (i.to_string(), Some(f.to_string())),
        None => (rendered, None),
    };

    let (sign, digits) = int_part
        .strip_prefix('-')
        .map_or(("", int_part.as_str()), |rest| ("-", rest));

    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push('\u{202f}');
        }
        grouped.push(c);
    }

    match frac_part {
        Some(f) => format!("{sign}{grouped}.{f}"),
        None => format!("{sign}{grouped}"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_groups_thousands() {
        let price = Price::mad(Decimal::from(12_500));
        assert_eq!(price.display(), "12\u{202f}500 MAD");
    }

    #[test]
    fn display_keeps_fractional_part() {
        // 1234.5 as mantissa 12345, scale 1
        let price = Price::mad(Decimal::new(12_345, 1));
        assert_eq!(price.display(), "1\u{202f}234.50 MAD");
    }

    #[test]
    fn small_amounts_are_not_grouped() {
        assert_eq!(format_amount(Decimal::from(290)), "290");
        assert_eq!(format_amount(Decimal::ZERO), "0");
    }

    #[test]
    fn negative_amounts_keep_the_sign_outside_groups() {
        assert_eq!(
            format_amount(Decimal::from(-1_000_000)),
            "-1\u{202f}000\u{202f}000"
        );
    }
}
