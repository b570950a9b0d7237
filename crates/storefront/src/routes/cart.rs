//! Cart route handlers.
//!
//! Cart operations use HTMX for dynamic updates without full page reloads.
//! The cart itself lives in the session; prices are resolved against the
//! catalog snapshot on every read.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Form,
    extract::State,
    response::{AppendHeaders, IntoResponse, Redirect, Response},
};
use rust_decimal::Decimal;
use serde::Deserialize;
use tower_sessions::Session;
use tracing::instrument;

use lumine_core::catalog::Product;
use lumine_core::{Price, ProductId};

use crate::error::Result;
use crate::filters;
use crate::models::cart::SessionCart;
use crate::models::session::keys;
use crate::state::AppState;

/// Cart item display data for templates.
#[derive(Clone)]
pub struct CartItemView {
    pub product_id: i32,
    pub slug: String,
    pub name: String,
    pub quantity: u32,
    pub price: String,
    pub line_price: String,
    pub image: Option<String>,
}

/// Cart display data for templates.
#[derive(Clone)]
pub struct CartView {
    pub items: Vec<CartItemView>,
    pub subtotal: String,
    pub item_count: u32,
}

impl CartView {
    /// Create an empty cart.
    #[must_use]
    pub fn empty() -> Self {
        Self {
            items: Vec::new(),
            subtotal: Price::mad(Decimal::ZERO).display(),
            item_count: 0,
        }
    }

    /// Resolve a session cart against the catalog snapshot.
    #[must_use]
    pub fn build(cart: &SessionCart, products: &[Product]) -> Self {
        let mut items = Vec::new();
        let mut subtotal = Decimal::ZERO;

        for item in cart.items() {
            let Some(product) = products.iter().find(|p| p.id == item.product_id) else {
                continue;
            };
            let line_total = product.base_price * Decimal::from(item.quantity);
            subtotal += line_total;
            items.push(CartItemView {
                product_id: product.id.as_i32(),
                slug: product.slug.clone(),
                name: product.name.clone(),
                quantity: item.quantity,
                price: product.price().display(),
                line_price: Price::mad(line_total).display(),
                image: product.image.clone(),
            });
        }

        Self {
            items,
            subtotal: Price::mad(subtotal).display(),
            item_count: cart.item_count(),
        }
    }
}

// =============================================================================
// Session Helpers
// =============================================================================

/// Get the cart from the session, defaulting to an empty one.
pub(crate) async fn load_cart(session: &Session) -> Result<SessionCart> {
    Ok(session
        .get::<SessionCart>(keys::CART)
        .await?
        .unwrap_or_default())
}

/// Write the cart back to the session.
pub(crate) async fn save_cart(session: &Session, cart: &SessionCart) -> Result<()> {
    session.insert(keys::CART, cart).await?;
    Ok(())
}

/// Add to cart form data.
#[derive(Debug, Deserialize)]
pub struct AddToCartForm {
    pub product_id: i32,
    pub quantity: Option<u32>,
}

/// Update cart form data.
#[derive(Debug, Deserialize)]
pub struct UpdateCartForm {
    pub product_id: i32,
    pub quantity: u32,
}

/// Remove from cart form data.
#[derive(Debug, Deserialize)]
pub struct RemoveFromCartForm {
    pub product_id: i32,
}

/// Cart page template.
#[derive(Template, WebTemplate)]
#[template(path = "cart/show.html")]
pub struct CartShowTemplate {
    pub cart: CartView,
}

/// Cart items fragment template (for HTMX).
#[derive(Template, WebTemplate)]
#[template(path = "partials/cart_items.html")]
pub struct CartItemsTemplate {
    pub cart: CartView,
}

/// Cart count badge fragment template (for HTMX).
#[derive(Template, WebTemplate)]
#[template(path = "partials/cart_count.html")]
pub struct CartCountTemplate {
    pub count: u32,
}

/// Display cart page.
#[instrument(skip(state, session))]
pub async fn show(State(state): State<AppState>, session: Session) -> Result<Response> {
    let cart = load_cart(&session).await?;
    let products = state.catalog().products().await?;

    Ok(CartShowTemplate {
        cart: CartView::build(&cart, &products),
    }
    .into_response())
}

/// Add item to cart (HTMX).
///
/// Returns the cart count badge with an HTMX trigger to update other
/// fragments.
#[instrument(skip(state, session))]
pub async fn add(
    State(state): State<AppState>,
    session: Session,
    Form(form): Form<AddToCartForm>,
) -> Result<Response> {
    let products = state.catalog().products().await?;
    let product_id = ProductId::new(form.product_id);

    // Refuse references to pieces that are no longer in the catalog.
    if !products.iter().any(|p| p.id == product_id) {
        return Err(crate::error::AppError::BadRequest(
            "unknown product".to_string(),
        ));
    }

    let mut cart = load_cart(&session).await?;
    cart.add(product_id, form.quantity.unwrap_or(1));
    save_cart(&session, &cart).await?;

    Ok((
        AppendHeaders([("HX-Trigger", "cart-updated")]),
        CartCountTemplate {
            count: cart.item_count(),
        },
    )
        .into_response())
}

/// Update cart item quantity (HTMX).
#[instrument(skip(state, session))]
pub async fn update(
    State(state): State<AppState>,
    session: Session,
    Form(form): Form<UpdateCartForm>,
) -> Result<Response> {
    let mut cart = load_cart(&session).await?;
    cart.set_quantity(ProductId::new(form.product_id), form.quantity);
    save_cart(&session, &cart).await?;

    let products = state.catalog().products().await?;
    Ok((
        AppendHeaders([("HX-Trigger", "cart-updated")]),
        CartItemsTemplate {
            cart: CartView::build(&cart, &products),
        },
    )
        .into_response())
}

/// Remove item from cart (HTMX).
#[instrument(skip(state, session))]
pub async fn remove(
    State(state): State<AppState>,
    session: Session,
    Form(form): Form<RemoveFromCartForm>,
) -> Result<Response> {
    let mut cart = load_cart(&session).await?;
    cart.remove(ProductId::new(form.product_id));
    save_cart(&session, &cart).await?;

    let products = state.catalog().products().await?;
    Ok((
        AppendHeaders([("HX-Trigger", "cart-updated")]),
        CartItemsTemplate {
            cart: CartView::build(&cart, &products),
        },
    )
        .into_response())
}

/// Get cart count badge (HTMX).
#[instrument(skip(session))]
pub async fn count(session: Session) -> Result<Response> {
    let cart = load_cart(&session).await?;
    Ok(CartCountTemplate {
        count: cart.item_count(),
    }
    .into_response())
}

/// Enter the checkout flow; an empty cart goes back to the cart page.
#[instrument(skip(session))]
pub async fn begin_checkout(session: Session) -> Result<Response> {
    let cart = load_cart(&session).await?;
    if cart.is_empty() {
        return Ok(Redirect::to("/cart").into_response());
    }
    Ok(Redirect::to("/checkout").into_response())
}
