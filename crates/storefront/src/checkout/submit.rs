//! Order submission.
//!
//! The terminal action of the checkout flow. Exactly one of two outbound
//! calls is made per submission: a card payment initiates a hosted gateway
//! session and the caller redirects to the returned URL; cash on delivery
//! places the order directly, clears the cart, and completes the flow.
//! Gateway failures never corrupt the flow - everything the user entered
//! survives for a retry.

use async_trait::async_trait;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use lumine_core::checkout::{
    AddOns, CartLine, CheckoutStep, OrderQuote, PaymentMethod, PricingConfig, ShippingAddress,
};
use lumine_core::{OrderId, OrderReference};

use super::flow::{CheckoutFlow, ValidationError};
use crate::models::cart::SessionCart;

/// Errors from the payment or order gateway.
#[derive(Debug, Error)]
pub enum GatewayError {
    /// HTTP request failed (connection, timeout).
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The gateway returned an error response.
    #[error("API error: {status} - {message}")]
    Api { status: u16, message: String },

    /// Failed to parse the gateway response.
    #[error("Parse error: {0}")]
    Parse(String),
}

impl GatewayError {
    /// The message shown to the customer.
    ///
    /// Server-provided messages pass through; transport failures get a
    /// generic retry prompt.
    #[must_use]
    pub fn user_message(&self) -> String {
        match self {
            Self::Api { message, .. } if !message.trim().is_empty() => message.clone(),
            _ => "Une erreur est survenue lors du traitement de votre commande. Veuillez réessayer."
                .to_string(),
        }
    }
}

/// Checkout submission failures.
#[derive(Debug, Error)]
pub enum CheckoutError {
    /// A step's input is missing or incomplete.
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// Submission attempted before the confirmation step.
    #[error("La commande ne peut pas encore être soumise.")]
    NotAtConfirmation,

    /// A submission request is already in flight.
    #[error("Votre commande est déjà en cours de traitement.")]
    SubmissionInFlight,

    /// The checkout already completed.
    #[error("Cette commande a déjà été confirmée.")]
    AlreadyComplete,

    /// The cart emptied out from under the checkout.
    #[error("Votre panier est vide.")]
    EmptyCart,

    /// Card payment needs an email for the gateway session.
    #[error("Veuillez renseigner votre adresse e-mail pour le paiement par carte.")]
    EmailRequired,

    /// The payment or order gateway failed; the submission is retryable.
    #[error(transparent)]
    Gateway(#[from] GatewayError),
}

/// Payment initiation request.
#[derive(Debug, Clone, Serialize)]
pub struct InitiatePayment {
    pub amount: Decimal,
    pub order_reference: OrderReference,
    pub customer_email: String,
}

/// Payment initiation response: where to send the customer.
#[derive(Debug, Clone, Deserialize)]
pub struct PaymentRedirect {
    pub redirect_url: String,
}

/// Direct order placement request.
#[derive(Debug, Clone, Serialize)]
pub struct OrderRequest {
    pub order_reference: OrderReference,
    pub lines: Vec<CartLine>,
    pub shipping_address: ShippingAddress,
    pub payment_method: PaymentMethod,
    pub add_ons: AddOns,
    pub quote: OrderQuote,
    pub customer_email: Option<String>,
}

/// A placed order.
#[derive(Debug, Clone, Deserialize)]
pub struct PlacedOrder {
    pub order_id: OrderId,
}

/// Card payment collaborator.
#[async_trait]
pub trait PaymentGateway: Send + Sync {
    /// Open a hosted payment session for the given amount.
    async fn initiate(&self, request: InitiatePayment) -> Result<PaymentRedirect, GatewayError>;
}

/// Order placement collaborator.
#[async_trait]
pub trait OrderGateway: Send + Sync {
    /// Place an order with the full cart, shipping, and add-on data.
    async fn place(&self, request: OrderRequest) -> Result<PlacedOrder, GatewayError>;
}

/// What the caller should do after a successful submission.
#[derive(Debug, Clone)]
pub enum SubmitOutcome {
    /// Send the customer to the gateway's hosted payment page.
    RedirectToPayment { redirect_url: String },
    /// The order is placed; show the completion page.
    OrderPlaced { order_id: OrderId },
}

/// Submit the order. Only reachable from the confirmation step.
///
/// On `Card` the cart is left untouched - it is cleared once the gateway
/// confirms payment, outside this flow. On `CashOnDelivery` success the
/// cart collaborator is cleared and the flow becomes terminal.
///
/// # Errors
///
/// Returns [`CheckoutError`] when the flow is not ready, a duplicate
/// submission is in flight, or a gateway call fails. Gateway failures
/// record a retryable message on the flow and preserve its state.
pub async fn submit(
    flow: &mut CheckoutFlow,
    cart: &mut SessionCart,
    lines: &[CartLine],
    pricing: &PricingConfig,
    payment: &dyn PaymentGateway,
    orders: &dyn OrderGateway,
) -> Result<SubmitOutcome, CheckoutError> {
    if flow.is_complete() {
        return Err(CheckoutError::AlreadyComplete);
    }
    if flow.step() != CheckoutStep::Confirmation {
        return Err(CheckoutError::NotAtConfirmation);
    }
    let Some(method) = flow.payment_method() else {
        return Err(CheckoutError::Validation(
            ValidationError::PaymentMethodRequired,
        ));
    };
    if lines.is_empty() {
        return Err(CheckoutError::EmptyCart);
    }

    // Card sessions need an email before anything is sent.
    let customer_email = flow.customer_email().map(str::to_string);
    if method == PaymentMethod::Card && customer_email.is_none() {
        return Err(CheckoutError::EmailRequired);
    }

    flow.begin_submission()?;

    let quote = flow.quote(lines, pricing);
    let order_reference = new_order_reference();

    match method {
        PaymentMethod::Card => {
            let request = InitiatePayment {
                amount: quote.total,
                order_reference,
                customer_email: customer_email.unwrap_or_default(),
            };

            match payment.initiate(request).await {
                Ok(redirect) => {
                    flow.end_submission();
                    Ok(SubmitOutcome::RedirectToPayment {
                        redirect_url: redirect.redirect_url,
                    })
                }
                Err(e) => {
                    tracing::error!("payment initiation failed: {e}");
                    flow.fail_submission(
                        "Le paiement n'a pas pu être initié. Veuillez réessayer.".to_string(),
                    );
                    Err(CheckoutError::Gateway(e))
                }
            }
        }
        PaymentMethod::CashOnDelivery => {
            let request = OrderRequest {
                order_reference,
                lines: lines.to_vec(),
                shipping_address: flow.address().clone(),
                payment_method: method,
                add_ons: flow.add_ons().clone(),
                quote,
                customer_email,
            };

            match orders.place(request).await {
                Ok(placed) => {
                    cart.clear();
                    flow.complete_submission();
                    Ok(SubmitOutcome::OrderPlaced {
                        order_id: placed.order_id,
                    })
                }
                Err(e) => {
                    tracing::error!("order placement failed: {e}");
                    flow.fail_submission(e.user_message());
                    Err(CheckoutError::Gateway(e))
                }
            }
        }
    }
}

/// Generate an opaque order reference for gateway correlation.
fn new_order_reference() -> OrderReference {
    use rand::Rng;

    let suffix: String = rand::rng()
        .sample_iter(rand::distr::Alphanumeric)
        .take(10)
        .map(char::from)
        .collect::<String>()
        .to_uppercase();

    OrderReference::new(format!("LM-{suffix}"))
}
