//! Product route handlers.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    extract::{Path, State},
    response::{IntoResponse, Response},
};
use tracing::instrument;

use lumine_core::catalog::{self, FilterCriteria, Product};

use crate::error::Result;
use crate::filters;
use crate::state::AppState;

/// Product card data for grids.
#[derive(Clone)]
pub struct ProductCardView {
    pub slug: String,
    pub name: String,
    pub price: String,
    pub image: Option<String>,
    pub featured: bool,
}

impl From<&Product> for ProductCardView {
    fn from(product: &Product) -> Self {
        Self {
            slug: product.slug.clone(),
            name: product.name.clone(),
            price: product.price().display(),
            image: product.image.clone(),
            featured: product.featured,
        }
    }
}

/// Variation display data for the detail page.
#[derive(Clone)]
pub struct VariationView {
    pub label: String,
    pub value: String,
}

/// Product display data for the detail page.
#[derive(Clone)]
pub struct ProductView {
    pub id: i32,
    pub slug: String,
    pub name: String,
    pub price: String,
    pub image: Option<String>,
    pub variations: Vec<VariationView>,
}

impl From<&Product> for ProductView {
    fn from(product: &Product) -> Self {
        Self {
            id: product.id.as_i32(),
            slug: product.slug.clone(),
            name: product.name.clone(),
            price: product.price().display(),
            image: product.image.clone(),
            variations: product
                .variations
                .iter()
                .map(|v| VariationView {
                    label: v.variation_type.clone(),
                    value: v.variation_value.clone(),
                })
                .collect(),
        }
    }
}

/// Product detail page template.
#[derive(Template, WebTemplate)]
#[template(path = "products/show.html")]
pub struct ProductShowTemplate {
    pub product: ProductView,
    pub related_products: Vec<ProductCardView>,
}

/// Related products shown under the detail page.
const RELATED_PRODUCTS: usize = 4;

/// Display product detail page.
#[instrument(skip(state))]
pub async fn show(State(state): State<AppState>, Path(slug): Path<String>) -> Result<Response> {
    let Some(product) = state.catalog().product_by_slug(&slug).await? else {
        return Err(crate::error::AppError::NotFound(slug));
    };

    // Other pieces from the same category, curated first.
    let related_products = match &product.category {
        Some(category) => {
            let products = state.catalog().products().await?;
            let criteria = FilterCriteria {
                category: Some(category.clone()),
                ..FilterCriteria::default()
            };
            catalog::query(&products, &criteria)
                .iter()
                .filter(|p| p.id != product.id)
                .take(RELATED_PRODUCTS)
                .map(ProductCardView::from)
                .collect()
        }
        None => Vec::new(),
    };

    Ok(ProductShowTemplate {
        product: ProductView::from(&product),
        related_products,
    }
    .into_response())
}
