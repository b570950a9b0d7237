//! Home page route handler.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    extract::State,
    response::{IntoResponse, Response},
};
use tracing::instrument;

use lumine_core::catalog::{self, FilterCriteria};

use crate::error::Result;
use crate::filters;
use crate::state::AppState;

use super::products::ProductCardView;

/// Featured products shown on the home page.
const FEATURED_PRODUCTS: usize = 8;

/// Home page template.
#[derive(Template, WebTemplate)]
#[template(path = "home.html")]
pub struct HomeTemplate {
    pub products: Vec<ProductCardView>,
}

/// Display the home page with curated pieces first.
#[instrument(skip(state))]
pub async fn home(State(state): State<AppState>) -> Result<Response> {
    let products = state.catalog().products().await?;

    let featured = catalog::query(&products, &FilterCriteria::default());

    Ok(HomeTemplate {
        products: featured
            .iter()
            .take(FEATURED_PRODUCTS)
            .map(ProductCardView::from)
            .collect(),
    }
    .into_response())
}
