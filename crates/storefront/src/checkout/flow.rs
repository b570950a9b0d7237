//! The checkout step state machine.
//!
//! Holds everything the user has entered so far and enforces the step
//! invariants: `advance` validates before moving forward, `retreat` always
//! moves back one step and clears any error, and changing the shipping
//! option re-derives the address fields. Pricing is never stored on the
//! flow; [`CheckoutFlow::quote`] recomputes it from the cart on every read.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use lumine_core::checkout::{
    AddOns, CartLine, CheckoutStep, OrderQuote, PaymentMethod, PricingConfig, ShippingAddress,
    ShippingOption, quote,
};

/// Step validation failures. All user-correctable; none advance the step.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("Veuillez sélectionner une option de livraison.")]
    ShippingOptionRequired,

    #[error("Veuillez remplir tous les champs pour la livraison.")]
    IncompleteAddress,

    #[error("Aucune adresse enregistrée sur votre profil. Choisissez une autre option.")]
    NoSavedAddress,

    #[error("Veuillez sélectionner un mode de paiement.")]
    PaymentMethodRequired,
}

/// One user's in-progress checkout.
///
/// Created when the user enters the checkout flow with a non-empty cart,
/// mutated step by step, and discarded on completion or navigation away.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CheckoutFlow {
    step: CheckoutStep,
    shipping_option: Option<ShippingOption>,
    address: ShippingAddress,
    payment_method: Option<PaymentMethod>,
    add_ons: AddOns,
    customer_email: Option<String>,
    error: Option<String>,
    profile_address_missing: bool,
    complete: bool,
    submitting: bool,
}

impl CheckoutFlow {
    /// Start a fresh checkout, seeding the email from the session user.
    #[must_use]
    pub fn begin(customer_email: Option<String>) -> Self {
        Self {
            customer_email,
            ..Self::default()
        }
    }

    #[must_use]
    pub const fn step(&self) -> CheckoutStep {
        self.step
    }

    #[must_use]
    pub const fn shipping_option(&self) -> Option<ShippingOption> {
        self.shipping_option
    }

    #[must_use]
    pub const fn address(&self) -> &ShippingAddress {
        &self.address
    }

    #[must_use]
    pub const fn payment_method(&self) -> Option<PaymentMethod> {
        self.payment_method
    }

    #[must_use]
    pub const fn add_ons(&self) -> &AddOns {
        &self.add_ons
    }

    #[must_use]
    pub fn customer_email(&self) -> Option<&str> {
        self.customer_email.as_deref()
    }

    /// The current user-visible error, if any.
    #[must_use]
    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    /// Non-blocking indicator that the profile option found no saved address.
    #[must_use]
    pub const fn profile_address_missing(&self) -> bool {
        self.profile_address_missing
    }

    /// Whether the checkout reached its terminal completed state.
    #[must_use]
    pub const fn is_complete(&self) -> bool {
        self.complete
    }

    /// Whether a submission request is currently in flight.
    #[must_use]
    pub const fn is_submitting(&self) -> bool {
        self.submitting
    }

    /// Select a shipping option and derive the address fields from it.
    ///
    /// - `Store` copies the configured boutique pickup address.
    /// - `Profile` copies the saved profile address; if none exists the
    ///   fields stay empty and the non-blocking "no saved address"
    ///   indicator is raised.
    /// - `New` clears all four fields for manual entry.
    pub fn select_shipping(
        &mut self,
        option: ShippingOption,
        store_pickup: &ShippingAddress,
        saved: Option<&ShippingAddress>,
    ) {
        self.shipping_option = Some(option);
        self.error = None;
        self.profile_address_missing = false;

        match option {
            ShippingOption::Store => {
                self.address = store_pickup.clone();
            }
            ShippingOption::Profile => match saved {
                Some(address) if !address.is_empty() => {
                    self.address = address.clone();
                }
                _ => {
                    self.address.clear();
                    self.profile_address_missing = true;
                }
            },
            ShippingOption::New => {
                self.address.clear();
            }
        }
    }

    /// Record manually entered address fields (the `New` option).
    pub fn enter_address(&mut self, address: ShippingAddress) {
        self.address = address;
    }

    /// Select the payment method.
    pub fn select_payment(&mut self, method: PaymentMethod) {
        self.payment_method = Some(method);
        self.error = None;
    }

    /// Record the email used for the card payment session.
    pub fn set_customer_email(&mut self, email: String) {
        if !email.trim().is_empty() {
            self.customer_email = Some(email);
        }
    }

    /// Replace the selected add-ons.
    pub fn set_add_ons(&mut self, add_ons: AddOns) {
        self.add_ons = add_ons;
    }

    /// Validate the current step and move forward on success.
    ///
    /// On failure the step does not change and the validation message is
    /// recorded for display. From `Confirmation` there is no further step;
    /// submission takes over (see [`super::submit`]).
    ///
    /// # Errors
    ///
    /// Returns the step's [`ValidationError`] when its input is missing or
    /// incomplete.
    pub fn advance(&mut self) -> Result<(), ValidationError> {
        let result = match self.step {
            CheckoutStep::Shipping => self.validate_shipping(),
            CheckoutStep::Payment => self.validate_payment(),
            CheckoutStep::Confirmation => Ok(()),
        };

        match result {
            Ok(()) => {
                if let Some(next) = self.step.next() {
                    self.step = next;
                }
                self.error = None;
                Ok(())
            }
            Err(e) => {
                self.error = Some(e.to_string());
                Err(e)
            }
        }
    }

    /// Move back one step. Never validates; always clears the error.
    pub fn retreat(&mut self) {
        if let Some(previous) = self.step.previous() {
            self.step = previous;
        }
        self.error = None;
    }

    /// Derive the order total from the cart and the selected add-ons.
    #[must_use]
    pub fn quote(&self, lines: &[CartLine], pricing: &PricingConfig) -> OrderQuote {
        quote(lines, &self.add_ons, pricing)
    }

    /// Record a user-visible error without touching the step.
    pub fn record_error(&mut self, message: String) {
        self.error = Some(message);
    }

    /// Mark a submission as started; rejects re-entry while one is in
    /// flight so a double-click cannot place two orders.
    pub fn begin_submission(&mut self) -> Result<(), super::CheckoutError> {
        if self.submitting {
            return Err(super::CheckoutError::SubmissionInFlight);
        }
        self.submitting = true;
        self.error = None;
        Ok(())
    }

    /// A submission request finished without completing the checkout
    /// (card redirect handed off to the gateway).
    pub fn end_submission(&mut self) {
        self.submitting = false;
    }

    /// A submission request failed; surface the message and allow retry.
    pub fn fail_submission(&mut self, message: String) {
        self.submitting = false;
        self.error = Some(message);
    }

    /// The order was placed; the flow is terminal.
    pub fn complete_submission(&mut self) {
        self.submitting = false;
        self.complete = true;
        self.error = None;
    }

    fn validate_shipping(&self) -> Result<(), ValidationError> {
        let Some(option) = self.shipping_option else {
            return Err(ValidationError::ShippingOptionRequired);
        };

        match option {
            ShippingOption::Store => Ok(()),
            ShippingOption::New => {
                if self.address.is_complete() {
                    Ok(())
                } else {
                    Err(ValidationError::IncompleteAddress)
                }
            }
            ShippingOption::Profile => {
                if self.profile_address_missing || self.address.is_empty() {
                    Err(ValidationError::NoSavedAddress)
                } else {
                    Ok(())
                }
            }
        }
    }

    fn validate_payment(&self) -> Result<(), ValidationError> {
        if self.payment_method.is_none() {
            return Err(ValidationError::PaymentMethodRequired);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn store_pickup() -> ShippingAddress {
        ShippingAddress {
            address: "Maison Lumine, 12 Rue des Bijoutiers".to_string(),
            city: "Casablanca".to_string(),
            postal_code: "20000".to_string(),
            country: "Maroc".to_string(),
        }
    }

    fn saved_address() -> ShippingAddress {
        ShippingAddress {
            address: "7 Avenue des Palmiers".to_string(),
            city: "Rabat".to_string(),
            postal_code: "10000".to_string(),
            country: "Maroc".to_string(),
        }
    }

    #[test]
    fn advance_without_shipping_option_stays_put_with_error() {
        let mut flow = CheckoutFlow::default();

        let result = flow.advance();
        assert_eq!(result, Err(ValidationError::ShippingOptionRequired));
        assert_eq!(flow.step(), CheckoutStep::Shipping);
        assert!(flow.error().is_some());
    }

    #[test]
    fn store_pickup_always_passes_shipping_validation() {
        let mut flow = CheckoutFlow::default();
        flow.select_shipping(ShippingOption::Store, &store_pickup(), None);

        assert!(flow.advance().is_ok());
        assert_eq!(flow.step(), CheckoutStep::Payment);
        assert_eq!(flow.address(), &store_pickup());
    }

    #[test]
    fn profile_copies_the_saved_address() {
        let mut flow = CheckoutFlow::default();
        flow.select_shipping(
            ShippingOption::Profile,
            &store_pickup(),
            Some(&saved_address()),
        );

        assert_eq!(flow.address(), &saved_address());
        assert!(!flow.profile_address_missing());
        assert!(flow.advance().is_ok());
    }

    #[test]
    fn profile_without_saved_address_raises_indicator_and_blocks_advance() {
        let mut flow = CheckoutFlow::default();
        flow.select_shipping(ShippingOption::Profile, &store_pickup(), None);

        assert!(flow.profile_address_missing());
        assert!(flow.address().is_empty());

        let result = flow.advance();
        assert_eq!(result, Err(ValidationError::NoSavedAddress));
        assert_eq!(flow.step(), CheckoutStep::Shipping);

        // Switching to manual entry and filling the fields proceeds.
        flow.select_shipping(ShippingOption::New, &store_pickup(), None);
        flow.enter_address(saved_address());
        assert!(flow.advance().is_ok());
    }

    #[test]
    fn new_address_with_missing_city_fails_then_succeeds_once_filled() {
        let mut flow = CheckoutFlow::default();
        flow.select_shipping(ShippingOption::New, &store_pickup(), None);

        let mut address = saved_address();
        address.city = String::new();
        flow.enter_address(address);

        assert_eq!(flow.advance(), Err(ValidationError::IncompleteAddress));
        assert_eq!(flow.step(), CheckoutStep::Shipping);

        flow.enter_address(saved_address());
        assert!(flow.advance().is_ok());
        assert_eq!(flow.step(), CheckoutStep::Payment);
    }

    #[test]
    fn switching_back_to_new_clears_derived_fields() {
        let mut flow = CheckoutFlow::default();
        flow.select_shipping(ShippingOption::Store, &store_pickup(), None);
        assert!(!flow.address().is_empty());

        flow.select_shipping(ShippingOption::New, &store_pickup(), None);
        assert!(flow.address().is_empty());
    }

    #[test]
    fn payment_step_requires_a_method() {
        let mut flow = CheckoutFlow::default();
        flow.select_shipping(ShippingOption::Store, &store_pickup(), None);
        assert!(flow.advance().is_ok());

        assert_eq!(flow.advance(), Err(ValidationError::PaymentMethodRequired));
        assert_eq!(flow.step(), CheckoutStep::Payment);

        flow.select_payment(lumine_core::checkout::PaymentMethod::CashOnDelivery);
        assert!(flow.advance().is_ok());
        assert_eq!(flow.step(), CheckoutStep::Confirmation);
    }

    #[test]
    fn retreat_steps_back_and_clears_the_error() {
        let mut flow = CheckoutFlow::default();
        flow.select_shipping(ShippingOption::Store, &store_pickup(), None);
        assert!(flow.advance().is_ok());

        let _ = flow.advance(); // payment validation fails, error recorded
        assert!(flow.error().is_some());

        flow.retreat();
        assert_eq!(flow.step(), CheckoutStep::Shipping);
        assert!(flow.error().is_none());

        // Retreating from the first step is a no-op.
        flow.retreat();
        assert_eq!(flow.step(), CheckoutStep::Shipping);
    }

    #[test]
    fn advance_from_confirmation_is_not_a_step_change() {
        let mut flow = CheckoutFlow::default();
        flow.select_shipping(ShippingOption::Store, &store_pickup(), None);
        assert!(flow.advance().is_ok());
        flow.select_payment(lumine_core::checkout::PaymentMethod::Card);
        assert!(flow.advance().is_ok());
        assert_eq!(flow.step(), CheckoutStep::Confirmation);

        assert!(flow.advance().is_ok());
        assert_eq!(flow.step(), CheckoutStep::Confirmation);
    }

    #[test]
    fn set_customer_email_ignores_blank_input() {
        let mut flow = CheckoutFlow::begin(Some("client@example.test".to_string()));
        flow.set_customer_email("   ".to_string());
        assert_eq!(flow.customer_email(), Some("client@example.test"));

        flow.set_customer_email("autre@example.test".to_string());
        assert_eq!(flow.customer_email(), Some("autre@example.test"));
    }
}
