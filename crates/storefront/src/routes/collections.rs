//! Collections route handlers.
//!
//! The catalog browsing page: query-string criteria feed the pure query
//! engine in `lumine-core` and the filtered, sorted result is rendered
//! server-side. Malformed criteria degrade to defaults rather than erroring.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    extract::{Query, State},
    response::{IntoResponse, Response},
};
use rust_decimal::Decimal;
use serde::Deserialize;
use tracing::instrument;

use lumine_core::catalog::{
    self, Category, FilterCriteria, PriceBounds, Product, SortOption, price_ceiling,
};

use crate::error::Result;
use crate::filters;
use crate::state::AppState;

pub use super::products::ProductCardView;

/// Category display data for the filter bar.
#[derive(Clone)]
pub struct CategoryView {
    pub slug: String,
    pub name: String,
}

impl From<&Category> for CategoryView {
    fn from(category: &Category) -> Self {
        Self {
            slug: category.slug.clone(),
            name: category.name.clone(),
        }
    }
}

/// Catalog filter query parameters. All optional; bad values degrade.
#[derive(Debug, Deserialize)]
pub struct CatalogQuery {
    pub category: Option<String>,
    pub material: Option<String>,
    pub gem: Option<String>,
    pub min_price: Option<String>,
    pub max_price: Option<String>,
    pub sort: Option<String>,
}

impl CatalogQuery {
    /// Bind the query string to engine criteria.
    ///
    /// Empty strings count as unset; unparseable prices are dropped; an
    /// unknown sort value falls back to the default.
    fn criteria(&self) -> FilterCriteria {
        let min = parse_price(self.min_price.as_deref());
        let max = parse_price(self.max_price.as_deref());
        let price = (min.is_some() || max.is_some())
            .then(|| PriceBounds::new(min.unwrap_or(Decimal::ZERO), max));

        FilterCriteria {
            category: non_empty(self.category.as_deref()),
            material: non_empty(self.material.as_deref()),
            gem_type: non_empty(self.gem.as_deref()),
            price,
            sort: self
                .sort
                .as_deref()
                .map(SortOption::parse_or_default)
                .unwrap_or_default(),
        }
    }
}

fn non_empty(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

fn parse_price(value: Option<&str>) -> Option<Decimal> {
    value.and_then(|s| s.trim().parse::<Decimal>().ok())
}

/// Distinct variation values of one type, for the filter dropdowns.
fn variation_values(products: &[Product], variation_type: &str) -> Vec<String> {
    let mut values: Vec<String> = products
        .iter()
        .flat_map(|p| p.variations.iter())
        .filter(|v| v.variation_type == variation_type)
        .map(|v| v.variation_value.clone())
        .collect();
    values.sort();
    values.dedup();
    values
}

/// Collections page template.
#[derive(Template, WebTemplate)]
#[template(path = "collections/index.html")]
pub struct CollectionsTemplate {
    pub products: Vec<ProductCardView>,
    pub categories: Vec<CategoryView>,
    pub materials: Vec<String>,
    pub gem_types: Vec<String>,
    pub result_count: usize,
    pub selected_category: String,
    pub selected_material: String,
    pub selected_gem: String,
    pub selected_sort: String,
    pub min_price: String,
    pub max_price: String,
    pub price_ceiling: Decimal,
}

/// Display the collections page with filters applied.
#[instrument(skip(state))]
pub async fn index(
    State(state): State<AppState>,
    Query(query): Query<CatalogQuery>,
) -> Result<Response> {
    let products = state.catalog().products().await?;
    let categories = state.catalog().categories().await?;

    let criteria = query.criteria();
    let results = catalog::query(&products, &criteria);

    let ceiling = price_ceiling(&products, state.config().checkout.price_bucket);

    Ok(CollectionsTemplate {
        result_count: results.len(),
        products: results.iter().map(ProductCardView::from).collect(),
        categories: categories.iter().map(CategoryView::from).collect(),
        materials: variation_values(&products, "material"),
        gem_types: variation_values(&products, "gem"),
        selected_category: criteria.category.unwrap_or_default(),
        selected_material: criteria.material.unwrap_or_default(),
        selected_gem: criteria.gem_type.unwrap_or_default(),
        selected_sort: criteria.sort.to_string(),
        min_price: query.min_price.unwrap_or_default(),
        max_price: query.max_price.unwrap_or_default(),
        price_ceiling: ceiling,
    }
    .into_response())
}
