//! Custom Askama template filters.

#![allow(clippy::unnecessary_wraps)]

use std::fmt::Display;

use rust_decimal::Decimal;

use lumine_core::Price;

/// Returns the current year.
///
/// Usage in templates: `{{ ""|current_year }}`
#[allow(clippy::unnecessary_wraps)]
#[askama::filter_fn]
pub fn current_year(_value: impl Display, _env: &dyn askama::Values) -> askama::Result<i32> {
    use chrono::Datelike;
    Ok(chrono::Utc::now().year())
}

/// Formats a decimal amount as a store-currency price.
///
/// Usage in templates: `{{ product.base_price|format_price }}`
#[allow(clippy::unnecessary_wraps)]
#[askama::filter_fn]
pub fn format_price(amount: &Decimal, _env: &dyn askama::Values) -> askama::Result<String> {
    Ok(Price::mad(*amount).display())
}
