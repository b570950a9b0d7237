//! Checkout flow controller.
//!
//! A linear three-step state machine scoped to one in-progress checkout:
//! shipping-option selection, payment-method selection, then confirmation.
//! The flow value lives in the tower-session between requests; submission
//! talks to the payment and order gateways through the traits in
//! [`submit`], so the whole controller is testable with in-memory fakes.

pub mod flow;
pub mod submit;

pub use flow::{CheckoutFlow, ValidationError};
pub use submit::{
    CheckoutError, GatewayError, InitiatePayment, OrderGateway, OrderRequest, PaymentGateway,
    PaymentRedirect, PlacedOrder, SubmitOutcome, submit,
};
