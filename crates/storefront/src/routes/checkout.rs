//! Checkout route handlers.
//!
//! Each POST binds one form to the flow controller and redirects back to
//! `GET /checkout` (post/redirect/get), which renders whichever step the
//! flow is on. Validation failures are recorded on the flow and displayed
//! there; they never 4xx the redirect round-trip.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Form,
    extract::State,
    response::{IntoResponse, Redirect, Response},
};
use serde::Deserialize;
use tower_sessions::Session;
use tracing::instrument;

use lumine_core::Price;
use lumine_core::checkout::{AddOns, PaymentMethod, ShippingAddress, ShippingOption};

use crate::checkout::{CheckoutError, CheckoutFlow, SubmitOutcome, submit};
use crate::db::users::UserRepository;
use crate::error::Result;
use crate::filters;
use crate::models::session::{CurrentUser, keys};
use crate::state::AppState;

use super::cart::{CartView, load_cart, save_cart};

// =============================================================================
// Session Helpers
// =============================================================================

async fn current_user(session: &Session) -> Result<Option<CurrentUser>> {
    Ok(session.get::<CurrentUser>(keys::CURRENT_USER).await?)
}

async fn load_flow(session: &Session) -> Result<Option<CheckoutFlow>> {
    Ok(session.get::<CheckoutFlow>(keys::CHECKOUT).await?)
}

async fn save_flow(session: &Session, flow: &CheckoutFlow) -> Result<()> {
    session.insert(keys::CHECKOUT, flow).await?;
    Ok(())
}

/// Load the in-progress flow, or start one seeded with the session user's
/// email.
async fn load_or_begin_flow(session: &Session) -> Result<CheckoutFlow> {
    if let Some(flow) = load_flow(session).await? {
        return Ok(flow);
    }
    let user = current_user(session).await?;
    let flow = CheckoutFlow::begin(user.map(|u| u.email));
    save_flow(session, &flow).await?;
    Ok(flow)
}

// =============================================================================
// Forms
// =============================================================================

/// Shipping step form data.
#[derive(Debug, Deserialize)]
pub struct ShippingForm {
    pub shipping_option: Option<ShippingOption>,
    pub address: Option<String>,
    pub city: Option<String>,
    pub postal_code: Option<String>,
    pub country: Option<String>,
}

/// Payment step form data.
#[derive(Debug, Deserialize)]
pub struct PaymentForm {
    pub payment_method: Option<PaymentMethod>,
    pub customer_email: Option<String>,
}

/// Add-ons form data (checkboxes post "on" when checked).
#[derive(Debug, Deserialize)]
pub struct AddOnsForm {
    pub luxury_packaging: Option<String>,
    pub insurance: Option<String>,
    pub gift_message: Option<String>,
}

// =============================================================================
// Views
// =============================================================================

/// Order quote display data.
#[derive(Clone)]
pub struct QuoteView {
    pub subtotal: String,
    pub packaging_fee: String,
    pub insurance_fee: String,
    pub total: String,
}

/// One step indicator entry.
#[derive(Clone)]
pub struct StepView {
    pub label: &'static str,
    pub reached: bool,
}

/// Checkout page template: renders whichever step the flow is on.
#[derive(Template, WebTemplate)]
#[template(path = "checkout/show.html")]
pub struct CheckoutTemplate {
    pub step_index: usize,
    pub steps: Vec<StepView>,
    pub shipping_option: String,
    pub address: String,
    pub city: String,
    pub postal_code: String,
    pub country: String,
    pub store_pickup: String,
    pub profile_address_missing: bool,
    pub payment_method: String,
    pub payment_method_label: String,
    pub customer_email: String,
    pub luxury_packaging: bool,
    pub insurance: bool,
    /// The configured flat fee, shown next to the packaging add-on.
    pub packaging_fee_price: String,
    pub gift_message: String,
    pub error: Option<String>,
    pub cart: CartView,
    pub quote: QuoteView,
    pub submitting: bool,
}

/// Checkout completion template (terminal state).
#[derive(Template, WebTemplate)]
#[template(path = "checkout/complete.html")]
pub struct CheckoutCompleteTemplate {}

fn option_value(option: Option<ShippingOption>) -> String {
    match option {
        Some(ShippingOption::Store) => "store".to_string(),
        Some(ShippingOption::Profile) => "profile".to_string(),
        Some(ShippingOption::New) => "new".to_string(),
        None => String::new(),
    }
}

fn method_value(method: Option<PaymentMethod>) -> String {
    match method {
        Some(PaymentMethod::Card) => "card".to_string(),
        Some(PaymentMethod::CashOnDelivery) => "cash_on_delivery".to_string(),
        None => String::new(),
    }
}

// =============================================================================
// Handlers
// =============================================================================

/// Display the current checkout step.
#[instrument(skip(state, session))]
pub async fn show(State(state): State<AppState>, session: Session) -> Result<Response> {
    let cart = load_cart(&session).await?;
    let mut flow = load_or_begin_flow(&session).await?;

    if flow.is_complete() {
        if cart.is_empty() {
            return Ok(CheckoutCompleteTemplate {}.into_response());
        }
        // A completed flow with a refilled cart starts a fresh checkout.
        let user = current_user(&session).await?;
        flow = CheckoutFlow::begin(user.map(|u| u.email));
        save_flow(&session, &flow).await?;
    }

    if cart.is_empty() {
        return Ok(Redirect::to("/cart").into_response());
    }

    let products = state.catalog().products().await?;
    let lines = cart.lines(&products);
    let quote = flow.quote(&lines, &state.config().checkout.pricing());

    let store_pickup = &state.config().checkout.store_pickup;
    let step_index = flow.step().index();

    Ok(CheckoutTemplate {
        step_index,
        steps: [
            lumine_core::checkout::CheckoutStep::Shipping,
            lumine_core::checkout::CheckoutStep::Payment,
            lumine_core::checkout::CheckoutStep::Confirmation,
        ]
        .iter()
        .map(|step| StepView {
            label: step.label(),
            reached: step.index() <= step_index,
        })
        .collect(),
        shipping_option: option_value(flow.shipping_option()),
        address: flow.address().address.clone(),
        city: flow.address().city.clone(),
        postal_code: flow.address().postal_code.clone(),
        country: flow.address().country.clone(),
        store_pickup: format!("{}, {}", store_pickup.address, store_pickup.city),
        profile_address_missing: flow.profile_address_missing(),
        payment_method: method_value(flow.payment_method()),
        payment_method_label: flow
            .payment_method()
            .map(|m| m.label().to_string())
            .unwrap_or_default(),
        customer_email: flow.customer_email().unwrap_or_default().to_string(),
        luxury_packaging: flow.add_ons().luxury_packaging,
        insurance: flow.add_ons().insurance,
        packaging_fee_price: Price::mad(state.config().checkout.packaging_fee).display(),
        gift_message: flow.add_ons().gift_message.clone().unwrap_or_default(),
        error: flow.error().map(str::to_string),
        cart: CartView::build(&cart, &products),
        quote: QuoteView {
            subtotal: Price::mad(quote.subtotal).display(),
            packaging_fee: Price::mad(quote.packaging_fee).display(),
            insurance_fee: Price::mad(quote.insurance_fee).display(),
            total: Price::mad(quote.total).display(),
        },
        submitting: flow.is_submitting(),
    }
    .into_response())
}

/// Record the shipping selection and try to advance.
#[instrument(skip(state, session))]
pub async fn shipping(
    State(state): State<AppState>,
    session: Session,
    Form(form): Form<ShippingForm>,
) -> Result<Response> {
    let mut flow = load_or_begin_flow(&session).await?;

    if let Some(option) = form.shipping_option {
        let saved = match (option, current_user(&session).await?) {
            (ShippingOption::Profile, Some(user)) => {
                UserRepository::new(state.pool())
                    .get_saved_address(user.id)
                    .await?
            }
            _ => None,
        };

        flow.select_shipping(
            option,
            &state.config().checkout.store_pickup,
            saved.as_ref(),
        );

        if option == ShippingOption::New {
            flow.enter_address(ShippingAddress {
                address: form.address.unwrap_or_default(),
                city: form.city.unwrap_or_default(),
                postal_code: form.postal_code.unwrap_or_default(),
                country: form.country.unwrap_or_default(),
            });
        }
    }

    // A validation failure stays on the step with the message recorded.
    let _ = flow.advance();
    save_flow(&session, &flow).await?;

    Ok(Redirect::to("/checkout").into_response())
}

/// Record the payment selection and try to advance.
#[instrument(skip(session))]
pub async fn payment(session: Session, Form(form): Form<PaymentForm>) -> Result<Response> {
    let mut flow = load_or_begin_flow(&session).await?;

    if let Some(email) = form.customer_email {
        flow.set_customer_email(email);
    }
    if let Some(method) = form.payment_method {
        flow.select_payment(method);
    }

    let _ = flow.advance();
    save_flow(&session, &flow).await?;

    Ok(Redirect::to("/checkout").into_response())
}

/// Update the selected add-ons.
#[instrument(skip(session))]
pub async fn add_ons(session: Session, Form(form): Form<AddOnsForm>) -> Result<Response> {
    let mut flow = load_or_begin_flow(&session).await?;

    flow.set_add_ons(AddOns {
        luxury_packaging: form.luxury_packaging.is_some(),
        insurance: form.insurance.is_some(),
        gift_message: form.gift_message.filter(|m| !m.trim().is_empty()),
    });
    save_flow(&session, &flow).await?;

    Ok(Redirect::to("/checkout").into_response())
}

/// Step back one step.
#[instrument(skip(session))]
pub async fn back(session: Session) -> Result<Response> {
    let mut flow = load_or_begin_flow(&session).await?;
    flow.retreat();
    save_flow(&session, &flow).await?;

    Ok(Redirect::to("/checkout").into_response())
}

/// Submit the order from the confirmation step.
///
/// Card payments redirect to the gateway's hosted page; cash on delivery
/// renders the completion page. Gateway failures come back to the
/// confirmation step with a retryable message.
#[instrument(skip(state, session))]
pub async fn submit_order(State(state): State<AppState>, session: Session) -> Result<Response> {
    let mut cart = load_cart(&session).await?;
    let mut flow = load_or_begin_flow(&session).await?;

    let products = state.catalog().products().await?;
    let lines = cart.lines(&products);
    let pricing = state.config().checkout.pricing();

    let outcome = submit(
        &mut flow,
        &mut cart,
        &lines,
        &pricing,
        state.payment(),
        state.orders(),
    )
    .await;

    save_flow(&session, &flow).await?;
    save_cart(&session, &cart).await?;

    match outcome {
        Ok(SubmitOutcome::RedirectToPayment { redirect_url }) => {
            Ok(Redirect::to(&redirect_url).into_response())
        }
        Ok(SubmitOutcome::OrderPlaced { order_id }) => {
            tracing::info!(%order_id, "order placed");
            Ok(Redirect::to("/checkout").into_response())
        }
        Err(CheckoutError::Gateway(_)) => {
            // Retryable; the flow carries the user-facing message.
            Ok(Redirect::to("/checkout").into_response())
        }
        Err(e) => {
            flow.record_error(e.to_string());
            save_flow(&session, &flow).await?;
            Ok(Redirect::to("/checkout").into_response())
        }
    }
}
