//! Catalog query engine.
//!
//! Pure filtering and sorting over the in-memory product catalog. The
//! storefront loads products once (see the storefront crate's catalog
//! service) and runs every collections-page request through [`query`], so
//! this module must stay free of I/O and cheap enough to re-run per request.
//!
//! Filtering is a pure predicate over immutable input; sorting is stable, so
//! products that compare equal keep their original relative order.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::types::{CategoryId, Price, ProductId};

/// A named attribute/value pair on a product, e.g. `material = or-jaune`.
///
/// Values are matched case-insensitively; the set semantics mean insertion
/// order never affects filtering.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Variation {
    /// Attribute name, e.g. `material` or `gem`.
    pub variation_type: String,
    /// Attribute value, e.g. `or-blanc` or `diamant`.
    pub variation_value: String,
}

/// A catalog product as the query engine sees it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Product {
    pub id: ProductId,
    /// URL handle, unique within the catalog.
    pub slug: String,
    /// Display name.
    pub name: String,
    /// Base price in the store currency.
    pub base_price: Decimal,
    /// Manually curated flag promoting the product in the default sort.
    pub featured: bool,
    pub created_at: DateTime<Utc>,
    /// Slug of the owning category, if any.
    pub category: Option<String>,
    /// Primary image URL.
    pub image: Option<String>,
    pub variations: Vec<Variation>,
}

impl Product {
    /// The base price as a display [`Price`] in the store currency.
    #[must_use]
    pub const fn price(&self) -> Price {
        Price::mad(self.base_price)
    }

    /// Whether any variation value equals `value`, ignoring case.
    #[must_use]
    pub fn has_variation_value(&self, value: &str) -> bool {
        let needle = value.to_lowercase();
        self.variations
            .iter()
            .any(|v| v.variation_value.to_lowercase() == needle)
    }
}

/// A product category. Opaque to filtering beyond slug equality.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Category {
    pub id: CategoryId,
    /// Unique URL handle, the filtering key.
    pub slug: String,
    /// Display name.
    pub name: String,
}

/// Sort orders offered by the collections page.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "kebab-case")]
pub enum SortOption {
    /// Curated products first, catalog order within each group.
    #[default]
    Featured,
    /// Most recently added first.
    Newest,
    /// Cheapest first.
    PriceAsc,
    /// Most expensive first.
    PriceDesc,
}

impl std::fmt::Display for SortOption {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::Featured => "featured",
            Self::Newest => "newest",
            Self::PriceAsc => "price-asc",
            Self::PriceDesc => "price-desc",
        };
        write!(f, "{name}")
    }
}

impl std::str::FromStr for SortOption {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "featured" => Ok(Self::Featured),
            "newest" => Ok(Self::Newest),
            "price-asc" => Ok(Self::PriceAsc),
            "price-desc" => Ok(Self::PriceDesc),
            _ => Err(format!("invalid sort option: {s}")),
        }
    }
}

impl SortOption {
    /// Parse a query-string value, falling back to the default sort.
    ///
    /// Malformed criteria degrade rather than error.
    #[must_use]
    pub fn parse_or_default(s: &str) -> Self {
        s.parse().unwrap_or_default()
    }
}

/// Inclusive price bounds. `max = None` means unbounded above.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PriceBounds {
    pub min: Decimal,
    pub max: Option<Decimal>,
}

impl PriceBounds {
    #[must_use]
    pub const fn new(min: Decimal, max: Option<Decimal>) -> Self {
        Self { min, max }
    }

    /// Whether `price` falls within the bounds, inclusive on both ends.
    ///
    /// Bounds with `min > max` contain nothing; callers get an empty result
    /// instead of an error.
    #[must_use]
    pub fn contains(&self, price: Decimal) -> bool {
        price >= self.min && self.max.is_none_or(|max| price <= max)
    }
}

impl Default for PriceBounds {
    fn default() -> Self {
        Self::new(Decimal::ZERO, None)
    }
}

/// Filter and sort criteria for one catalog query. All filters optional.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FilterCriteria {
    /// Retain only products in this category (by slug).
    pub category: Option<String>,
    /// Retain only products carrying this variation value (case-insensitive).
    pub material: Option<String>,
    /// Retain only products carrying this variation value (case-insensitive).
    pub gem_type: Option<String>,
    /// Retain only products priced within these bounds.
    pub price: Option<PriceBounds>,
    pub sort: SortOption,
}

impl FilterCriteria {
    /// Whether a product satisfies every set filter.
    #[must_use]
    pub fn matches(&self, product: &Product) -> bool {
        if let Some(category) = &self.category {
            if product.category.as_deref() != Some(category.as_str()) {
                return false;
            }
        }

        if let Some(bounds) = &self.price {
            if !bounds.contains(product.base_price) {
                return false;
            }
        }

        if let Some(material) = &self.material {
            if !product.has_variation_value(material) {
                return false;
            }
        }

        if let Some(gem_type) = &self.gem_type {
            if !product.has_variation_value(gem_type) {
                return false;
            }
        }

        true
    }
}

/// Run one catalog query: filter, then stable-sort.
///
/// The result is always a subset of `products` in the requested order; the
/// input is never mutated and the call never fails. Unset criteria are the
/// identity filter with the default sort applied.
#[must_use]
pub fn query(products: &[Product], criteria: &FilterCriteria) -> Vec<Product> {
    let mut hits: Vec<Product> = products
        .iter()
        .filter(|p| criteria.matches(p))
        .cloned()
        .collect();

    match criteria.sort {
        // Stable partition: curated products first, catalog order within
        // each group.
        SortOption::Featured => hits.sort_by_key(|p| !p.featured),
        SortOption::Newest => hits.sort_by(|a, b| b.created_at.cmp(&a.created_at)),
        SortOption::PriceAsc => hits.sort_by(|a, b| a.base_price.cmp(&b.base_price)),
        SortOption::PriceDesc => hits.sort_by(|a, b| b.base_price.cmp(&a.base_price)),
    }

    hits
}

/// Upper slider bound for the price filter: the maximum observed price
/// rounded up to the nearest `bucket`.
///
/// The bucket size is a presentation choice owned by configuration, not by
/// this engine. A non-positive bucket returns the raw maximum.
#[must_use]
pub fn price_ceiling(products: &[Product], bucket: Decimal) -> Decimal {
    let max = products
        .iter()
        .map(|p| p.base_price)
        .max()
        .unwrap_or(Decimal::ZERO);

    if bucket <= Decimal::ZERO {
        return max;
    }

    (max / bucket).ceil() * bucket
}
