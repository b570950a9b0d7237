//! Checkout domain types and order pricing.
//!
//! The step state machine itself lives in the storefront crate (it is
//! session-scoped); this module owns the vocabulary it speaks and the one
//! derivation with money in it. [`quote`] is a pure function of the cart
//! and the selected add-ons and is recomputed on every read - a total is
//! never stored apart from its inputs.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::types::{Price, ProductId};

/// The three checkout steps, in order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum CheckoutStep {
    #[default]
    Shipping,
    Payment,
    Confirmation,
}

impl CheckoutStep {
    /// Zero-based ordinal of the step, for progress display.
    #[must_use]
    pub const fn index(self) -> usize {
        match self {
            Self::Shipping => 0,
            Self::Payment => 1,
            Self::Confirmation => 2,
        }
    }

    /// The following step, if any.
    #[must_use]
    pub const fn next(self) -> Option<Self> {
        match self {
            Self::Shipping => Some(Self::Payment),
            Self::Payment => Some(Self::Confirmation),
            Self::Confirmation => None,
        }
    }

    /// The preceding step, if any.
    #[must_use]
    pub const fn previous(self) -> Option<Self> {
        match self {
            Self::Shipping => None,
            Self::Payment => Some(Self::Shipping),
            Self::Confirmation => Some(Self::Payment),
        }
    }

    /// Label shown in the step indicator.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Shipping => "Livraison",
            Self::Payment => "Paiement",
            Self::Confirmation => "Confirmation",
        }
    }
}

/// How the shipping address gets resolved.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ShippingOption {
    /// Boutique pickup: the configured store address.
    Store,
    /// The customer's saved profile address.
    Profile,
    /// Manual entry.
    New,
}

/// Accepted payment methods.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentMethod {
    /// Card payment through the hosted gateway page.
    Card,
    /// Cash on delivery.
    CashOnDelivery,
}

impl PaymentMethod {
    /// Label shown on the confirmation page.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Card => "Carte Bancaire",
            Self::CashOnDelivery => "Paiement à la Livraison",
        }
    }
}

/// A shipping address in the shape the order gateway expects.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShippingAddress {
    pub address: String,
    pub city: String,
    pub postal_code: String,
    pub country: String,
}

impl ShippingAddress {
    /// Whether every field has been filled in.
    #[must_use]
    pub fn is_complete(&self) -> bool {
        ![&self.address, &self.city, &self.postal_code, &self.country]
            .iter()
            .any(|field| field.trim().is_empty())
    }

    /// Whether no field has been filled in.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        [&self.address, &self.city, &self.postal_code, &self.country]
            .iter()
            .all(|field| field.trim().is_empty())
    }

    /// Reset all fields for manual entry.
    pub fn clear(&mut self) {
        *self = Self::default();
    }
}

/// Optional checkout extras, each with its own fee rule.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AddOns {
    /// Flat-fee signature gift packaging.
    pub luxury_packaging: bool,
    /// Transit insurance billed as a percentage of the subtotal.
    pub insurance: bool,
    pub gift_message: Option<String>,
}

/// One cart line as the pricing derivation sees it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CartLine {
    pub product_id: ProductId,
    pub unit_price: Decimal,
    pub quantity: u32,
}

impl CartLine {
    /// `unit_price x quantity`.
    #[must_use]
    pub fn line_total(&self) -> Decimal {
        self.unit_price * Decimal::from(self.quantity)
    }
}

/// Fee parameters for the pricing derivation.
///
/// These are configuration values surfaced through the storefront config,
/// never literals buried in the derivation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PricingConfig {
    /// Flat fee charged when luxury packaging is selected.
    pub packaging_fee: Decimal,
    /// Fraction of the subtotal charged when insurance is selected.
    pub insurance_rate: Decimal,
}

impl Default for PricingConfig {
    fn default() -> Self {
        Self {
            packaging_fee: Decimal::from(290),
            // 1% of the subtotal
            insurance_rate: Decimal::new(1, 2),
        }
    }
}

/// The derived order total and its components.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderQuote {
    pub subtotal: Decimal,
    pub packaging_fee: Decimal,
    pub insurance_fee: Decimal,
    pub total: Decimal,
}

impl OrderQuote {
    /// The total as a display [`Price`].
    #[must_use]
    pub const fn total_price(&self) -> Price {
        Price::mad(self.total)
    }
}

/// Derive the order total from the cart and selected add-ons.
///
/// The insurance fee rounds up to the next whole unit so fractional
/// currency amounts are never undercharged.
#[must_use]
pub fn quote(lines: &[CartLine], add_ons: &AddOns, pricing: &PricingConfig) -> OrderQuote {
    let subtotal: Decimal = lines.iter().map(CartLine::line_total).sum();

    let packaging_fee = if add_ons.luxury_packaging {
        pricing.packaging_fee
    } else {
        Decimal::ZERO
    };

    let insurance_fee = if add_ons.insurance {
        (subtotal * pricing.insurance_rate).ceil()
    } else {
        Decimal::ZERO
    };

    OrderQuote {
        subtotal,
        packaging_fee,
        insurance_fee,
        total: subtotal + packaging_fee + insurance_fee,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn line(unit_price: i64, quantity: u32) -> CartLine {
        CartLine {
            product_id: ProductId::new(1),
            unit_price: Decimal::from(unit_price),
            quantity,
        }
    }

    #[test]
    fn quote_sums_lines_and_fees() {
        let lines = [line(1_000, 2)];
        let add_ons = AddOns {
            luxury_packaging: true,
            insurance: true,
            gift_message: None,
        };

        let quote = quote(&lines, &add_ons, &PricingConfig::default());
        assert_eq!(quote.subtotal, Decimal::from(2_000));
        assert_eq!(quote.packaging_fee, Decimal::from(290));
        assert_eq!(quote.insurance_fee, Decimal::from(20));
        assert_eq!(quote.total, Decimal::from(2_310));
    }

    #[test]
    fn insurance_off_means_no_fee_regardless_of_subtotal() {
        let lines = [line(500_000, 3)];
        let add_ons = AddOns {
            luxury_packaging: false,
            insurance: false,
            gift_message: None,
        };

        let quote = quote(&lines, &add_ons, &PricingConfig::default());
        assert_eq!(quote.insurance_fee, Decimal::ZERO);
        assert_eq!(quote.packaging_fee, Decimal::ZERO);
        assert_eq!(quote.total, quote.subtotal);
    }

    #[test]
    fn insurance_fee_rounds_up() {
        // 1 050 x 1% = 10.5, charged as 11.
        let lines = [line(1_050, 1)];
        let add_ons = AddOns {
            insurance: true,
            ..AddOns::default()
        };

        let quote = quote(&lines, &add_ons, &PricingConfig::default());
        assert_eq!(quote.insurance_fee, Decimal::from(11));
    }

    #[test]
    fn fee_parameters_are_overridable() {
        let lines = [line(1_000, 1)];
        let add_ons = AddOns {
            luxury_packaging: true,
            insurance: true,
            gift_message: None,
        };
        let pricing = PricingConfig {
            packaging_fee: Decimal::from(500),
            insurance_rate: Decimal::new(5, 2),
        };

        let quote = quote(&lines, &add_ons, &pricing);
        assert_eq!(quote.packaging_fee, Decimal::from(500));
        assert_eq!(quote.insurance_fee, Decimal::from(50));
        assert_eq!(quote.total, Decimal::from(1_550));
    }

    #[test]
    fn empty_cart_quotes_to_zero_subtotal() {
        let quote = quote(&[], &AddOns::default(), &PricingConfig::default());
        assert_eq!(quote.subtotal, Decimal::ZERO);
        assert_eq!(quote.total, Decimal::ZERO);
    }

    #[test]
    fn quote_is_recomputed_from_inputs() {
        let mut lines = vec![line(2_000, 1)];
        let add_ons = AddOns::default();
        let pricing = PricingConfig::default();

        let before = quote(&lines, &add_ons, &pricing);
        lines.push(line(3_000, 2));
        let after = quote(&lines, &add_ons, &pricing);

        assert_eq!(before.subtotal, Decimal::from(2_000));
        assert_eq!(after.subtotal, Decimal::from(8_000));
    }

    #[test]
    fn steps_are_ordered() {
        assert_eq!(CheckoutStep::Shipping.index(), 0);
        assert_eq!(CheckoutStep::Shipping.next(), Some(CheckoutStep::Payment));
        assert_eq!(
            CheckoutStep::Payment.next(),
            Some(CheckoutStep::Confirmation)
        );
        assert_eq!(CheckoutStep::Confirmation.next(), None);
        assert_eq!(CheckoutStep::Shipping.previous(), None);
        assert_eq!(
            CheckoutStep::Confirmation.previous(),
            Some(CheckoutStep::Payment)
        );
    }

    #[test]
    fn address_completeness_ignores_whitespace() {
        let mut address = ShippingAddress {
            address: "12 Rue des Bijoutiers".to_string(),
            city: "Casablanca".to_string(),
            postal_code: "20000".to_string(),
            country: "Maroc".to_string(),
        };
        assert!(address.is_complete());

        address.city = "   ".to_string();
        assert!(!address.is_complete());
        assert!(!address.is_empty());

        address.clear();
        assert!(address.is_empty());
    }
}
