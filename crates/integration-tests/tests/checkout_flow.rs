//! Integration tests for the checkout flow controller.
//!
//! Drives the full controller - step transitions, validation, pricing, and
//! submission - against recording gateway fakes. Exactly one outbound call
//! per submission, mutual exclusion between the two payment paths, and
//! retry-without-data-loss are the properties under test.

use rust_decimal::Decimal;

use lumine_core::ProductId;
use lumine_core::checkout::{
    AddOns, CheckoutStep, PaymentMethod, PricingConfig, ShippingAddress, ShippingOption,
};
use lumine_storefront::checkout::{CheckoutError, CheckoutFlow, SubmitOutcome, submit};
use lumine_storefront::models::cart::SessionCart;

use lumine_integration_tests::fakes::{FakeOrderGateway, FakePaymentGateway};

fn store_pickup() -> ShippingAddress {
    ShippingAddress {
        address: "Maison Lumine, 12 Rue des Bijoutiers".to_string(),
        city: "Casablanca".to_string(),
        postal_code: "20000".to_string(),
        country: "Maroc".to_string(),
    }
}

fn cart_with_one_piece() -> SessionCart {
    let mut cart = SessionCart::default();
    cart.add(ProductId::new(1), 2);
    cart
}

fn lines() -> Vec<lumine_core::checkout::CartLine> {
    vec![lumine_core::checkout::CartLine {
        product_id: ProductId::new(1),
        unit_price: Decimal::from(1_000),
        quantity: 2,
    }]
}

/// Walk a flow to the confirmation step with the given payment method.
fn flow_at_confirmation(method: PaymentMethod, email: Option<&str>) -> CheckoutFlow {
    let mut flow = CheckoutFlow::begin(email.map(str::to_string));
    flow.select_shipping(ShippingOption::Store, &store_pickup(), None);
    flow.advance().expect("shipping step should pass");
    flow.select_payment(method);
    flow.advance().expect("payment step should pass");
    assert_eq!(flow.step(), CheckoutStep::Confirmation);
    flow
}

#[tokio::test]
async fn cash_on_delivery_places_the_order_and_clears_the_cart() {
    let mut flow = flow_at_confirmation(PaymentMethod::CashOnDelivery, None);
    flow.set_add_ons(AddOns {
        luxury_packaging: true,
        insurance: true,
        gift_message: Some("Joyeux anniversaire".to_string()),
    });

    let mut cart = cart_with_one_piece();
    let payment = FakePaymentGateway::succeeding("https://pay.example.test/session/1");
    let orders = FakeOrderGateway::succeeding(42);

    let outcome = submit(
        &mut flow,
        &mut cart,
        &lines(),
        &PricingConfig::default(),
        &payment,
        &orders,
    )
    .await
    .expect("submission should succeed");

    let SubmitOutcome::OrderPlaced { order_id } = outcome else {
        panic!("expected an order placement outcome");
    };
    assert_eq!(order_id.as_i32(), 42);

    // Terminal state: cart cleared, flow complete, no error.
    assert!(cart.is_empty());
    assert!(flow.is_complete());
    assert!(flow.error().is_none());

    // Exactly one outbound call, to the order service only.
    assert_eq!(orders.call_count(), 1);
    assert_eq!(payment.call_count(), 0);

    // The request carries the full cart, shipping, and add-on data.
    let requests = orders.requests.lock().expect("requests recorded");
    let request = requests.first().expect("one request");
    assert_eq!(request.lines.len(), 1);
    assert_eq!(request.shipping_address, store_pickup());
    assert_eq!(request.payment_method, PaymentMethod::CashOnDelivery);
    assert!(request.add_ons.luxury_packaging);
    // 2 000 subtotal + 290 packaging + ceil(2 000 x 1%) insurance
    assert_eq!(request.quote.subtotal, Decimal::from(2_000));
    assert_eq!(request.quote.insurance_fee, Decimal::from(20));
    assert_eq!(request.quote.total, Decimal::from(2_310));
}

#[tokio::test]
async fn card_payment_initiates_a_session_and_leaves_the_cart_alone() {
    let mut flow = flow_at_confirmation(PaymentMethod::Card, Some("cliente@example.test"));
    let mut cart = cart_with_one_piece();
    let payment = FakePaymentGateway::succeeding("https://pay.example.test/session/9");
    let orders = FakeOrderGateway::succeeding(1);

    let outcome = submit(
        &mut flow,
        &mut cart,
        &lines(),
        &PricingConfig::default(),
        &payment,
        &orders,
    )
    .await
    .expect("submission should succeed");

    let SubmitOutcome::RedirectToPayment { redirect_url } = outcome else {
        panic!("expected a payment redirect outcome");
    };
    assert_eq!(redirect_url, "https://pay.example.test/session/9");

    // The cart is cleared after the gateway confirms, not here.
    assert!(!cart.is_empty());
    assert!(!flow.is_complete());

    // Exactly one outbound call, to the payment gateway only.
    assert_eq!(payment.call_count(), 1);
    assert_eq!(orders.call_count(), 0);

    let requests = payment.requests.lock().expect("requests recorded");
    let request = requests.first().expect("one request");
    assert_eq!(request.amount, Decimal::from(2_000));
    assert_eq!(request.customer_email, "cliente@example.test");
    assert!(request.order_reference.as_str().starts_with("LM-"));
}

#[tokio::test]
async fn card_payment_without_an_email_is_rejected_before_any_call() {
    let mut flow = flow_at_confirmation(PaymentMethod::Card, None);
    let mut cart = cart_with_one_piece();
    let payment = FakePaymentGateway::succeeding("https://pay.example.test/session/1");
    let orders = FakeOrderGateway::succeeding(1);

    let result = submit(
        &mut flow,
        &mut cart,
        &lines(),
        &PricingConfig::default(),
        &payment,
        &orders,
    )
    .await;

    assert!(matches!(result, Err(CheckoutError::EmailRequired)));
    assert_eq!(payment.call_count(), 0);
    assert_eq!(orders.call_count(), 0);
}

#[tokio::test]
async fn order_failure_surfaces_the_server_message_and_stays_retryable() {
    let mut flow = flow_at_confirmation(PaymentMethod::CashOnDelivery, None);
    let mut cart = cart_with_one_piece();
    let payment = FakePaymentGateway::succeeding("https://pay.example.test/session/1");
    let failing_orders = FakeOrderGateway::failing("Stock insuffisant pour cette pièce.");

    let result = submit(
        &mut flow,
        &mut cart,
        &lines(),
        &PricingConfig::default(),
        &payment,
        &failing_orders,
    )
    .await;

    assert!(matches!(result, Err(CheckoutError::Gateway(_))));

    // Controller state survives for a retry: step, method, cart, address.
    assert_eq!(flow.step(), CheckoutStep::Confirmation);
    assert_eq!(flow.payment_method(), Some(PaymentMethod::CashOnDelivery));
    assert_eq!(flow.error(), Some("Stock insuffisant pour cette pièce."));
    assert!(!flow.is_complete());
    assert!(!flow.is_submitting());
    assert!(!cart.is_empty());

    // Retrying against a healthy service completes without re-entering data.
    let orders = FakeOrderGateway::succeeding(7);
    let outcome = submit(
        &mut flow,
        &mut cart,
        &lines(),
        &PricingConfig::default(),
        &payment,
        &orders,
    )
    .await
    .expect("retry should succeed");

    assert!(matches!(outcome, SubmitOutcome::OrderPlaced { .. }));
    assert!(flow.is_complete());
    assert!(cart.is_empty());
}

#[tokio::test]
async fn payment_failure_keeps_the_flow_in_confirmation() {
    let mut flow = flow_at_confirmation(PaymentMethod::Card, Some("cliente@example.test"));
    let mut cart = cart_with_one_piece();
    let failing_payment = FakePaymentGateway::failing("gateway unavailable");
    let orders = FakeOrderGateway::succeeding(1);

    let result = submit(
        &mut flow,
        &mut cart,
        &lines(),
        &PricingConfig::default(),
        &failing_payment,
        &orders,
    )
    .await;

    assert!(matches!(result, Err(CheckoutError::Gateway(_))));
    assert_eq!(flow.step(), CheckoutStep::Confirmation);
    assert!(flow.error().is_some());
    assert!(!cart.is_empty());
    assert_eq!(orders.call_count(), 0);
}

#[tokio::test]
async fn duplicate_submission_is_rejected_while_in_flight() {
    let mut flow = flow_at_confirmation(PaymentMethod::CashOnDelivery, None);
    flow.begin_submission().expect("first submission starts");

    let mut cart = cart_with_one_piece();
    let payment = FakePaymentGateway::succeeding("https://pay.example.test/session/1");
    let orders = FakeOrderGateway::succeeding(1);

    let result = submit(
        &mut flow,
        &mut cart,
        &lines(),
        &PricingConfig::default(),
        &payment,
        &orders,
    )
    .await;

    assert!(matches!(result, Err(CheckoutError::SubmissionInFlight)));
    assert_eq!(payment.call_count(), 0);
    assert_eq!(orders.call_count(), 0);
}

#[tokio::test]
async fn submission_is_only_reachable_from_confirmation() {
    let mut flow = CheckoutFlow::begin(None);
    flow.select_shipping(ShippingOption::Store, &store_pickup(), None);

    let mut cart = cart_with_one_piece();
    let payment = FakePaymentGateway::succeeding("https://pay.example.test/session/1");
    let orders = FakeOrderGateway::succeeding(1);

    let result = submit(
        &mut flow,
        &mut cart,
        &lines(),
        &PricingConfig::default(),
        &payment,
        &orders,
    )
    .await;

    assert!(matches!(result, Err(CheckoutError::NotAtConfirmation)));
    assert_eq!(payment.call_count(), 0);
    assert_eq!(orders.call_count(), 0);
}

#[tokio::test]
async fn an_emptied_cart_blocks_submission() {
    let mut flow = flow_at_confirmation(PaymentMethod::CashOnDelivery, None);
    let mut cart = SessionCart::default();
    let payment = FakePaymentGateway::succeeding("https://pay.example.test/session/1");
    let orders = FakeOrderGateway::succeeding(1);

    let result = submit(
        &mut flow,
        &mut cart,
        &[],
        &PricingConfig::default(),
        &payment,
        &orders,
    )
    .await;

    assert!(matches!(result, Err(CheckoutError::EmptyCart)));
    assert_eq!(orders.call_count(), 0);
}

#[tokio::test]
async fn a_completed_flow_rejects_further_submissions() {
    let mut flow = flow_at_confirmation(PaymentMethod::CashOnDelivery, None);
    let mut cart = cart_with_one_piece();
    let payment = FakePaymentGateway::succeeding("https://pay.example.test/session/1");
    let orders = FakeOrderGateway::succeeding(3);

    submit(
        &mut flow,
        &mut cart,
        &lines(),
        &PricingConfig::default(),
        &payment,
        &orders,
    )
    .await
    .expect("first submission succeeds");

    let result = submit(
        &mut flow,
        &mut cart,
        &lines(),
        &PricingConfig::default(),
        &payment,
        &orders,
    )
    .await;

    assert!(matches!(result, Err(CheckoutError::AlreadyComplete)));
    assert_eq!(orders.call_count(), 1, "no second placement");
}

#[test]
fn the_full_shipping_scenario_from_entry_to_payment() {
    // New address with a missing city fails, then succeeds once filled.
    let mut flow = CheckoutFlow::begin(None);
    flow.select_shipping(ShippingOption::New, &store_pickup(), None);
    flow.enter_address(ShippingAddress {
        address: "3 Impasse du Figuier".to_string(),
        city: String::new(),
        postal_code: "40000".to_string(),
        country: "Maroc".to_string(),
    });

    assert!(flow.advance().is_err());
    assert_eq!(flow.step(), CheckoutStep::Shipping);
    assert!(flow.error().is_some());

    flow.enter_address(ShippingAddress {
        address: "3 Impasse du Figuier".to_string(),
        city: "Marrakech".to_string(),
        postal_code: "40000".to_string(),
        country: "Maroc".to_string(),
    });

    assert!(flow.advance().is_ok());
    assert_eq!(flow.step(), CheckoutStep::Payment);
    assert!(flow.error().is_none());
}

#[test]
fn pricing_follows_the_spelled_out_example() {
    let flow = {
        let mut flow = CheckoutFlow::begin(None);
        flow.set_add_ons(AddOns {
            luxury_packaging: true,
            insurance: true,
            gift_message: None,
        });
        flow
    };

    let quote = flow.quote(&lines(), &PricingConfig::default());
    assert_eq!(quote.subtotal, Decimal::from(2_000));
    assert_eq!(quote.packaging_fee, Decimal::from(290));
    assert_eq!(quote.insurance_fee, Decimal::from(20));
    assert_eq!(quote.total, Decimal::from(2_310));
}
