//! Catalog repository.
//!
//! Loads the full product and category lists for the in-memory catalog
//! service. The query engine never touches the database; everything it
//! consumes comes out of these two loaders.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::PgPool;

use lumine_core::catalog::{Category, Product, Variation};
use lumine_core::{CategoryId, ProductId};

use super::RepositoryError;

#[derive(sqlx::FromRow)]
struct ProductRow {
    id: i32,
    slug: String,
    name: String,
    base_price: Decimal,
    featured: bool,
    created_at: DateTime<Utc>,
    category_slug: Option<String>,
    image: Option<String>,
}

#[derive(sqlx::FromRow)]
struct VariationRow {
    product_id: i32,
    variation_type: String,
    variation_value: String,
}

#[derive(sqlx::FromRow)]
struct CategoryRow {
    id: i32,
    slug: String,
    name: String,
}

/// Repository for catalog reads.
pub struct ProductRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> ProductRepository<'a> {
    /// Create a new product repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Load every product with its variations, in catalog (insertion) order.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if a query fails.
    pub async fn list_products(&self) -> Result<Vec<Product>, RepositoryError> {
        let rows: Vec<ProductRow> = sqlx::query_as(
            r"
            SELECT p.id, p.slug, p.name, p.base_price, p.featured, p.created_at,
                   c.slug AS category_slug, p.image
            FROM products p
            LEFT JOIN categories c ON c.id = p.category_id
            ORDER BY p.id
            ",
        )
        .fetch_all(self.pool)
        .await?;

        let variation_rows: Vec<VariationRow> = sqlx::query_as(
            r"
            SELECT product_id, variation_type, variation_value
            FROM product_variations
            ORDER BY product_id, id
            ",
        )
        .fetch_all(self.pool)
        .await?;

        let mut variations: std::collections::HashMap<i32, Vec<Variation>> =
            std::collections::HashMap::new();
        for row in variation_rows {
            variations
                .entry(row.product_id)
                .or_default()
                .push(Variation {
                    variation_type: row.variation_type,
                    variation_value: row.variation_value,
                });
        }

        Ok(rows
            .into_iter()
            .map(|row| Product {
                id: ProductId::new(row.id),
                slug: row.slug,
                name: row.name,
                base_price: row.base_price,
                featured: row.featured,
                created_at: row.created_at,
                category: row.category_slug,
                image: row.image,
                variations: variations.remove(&row.id).unwrap_or_default(),
            })
            .collect())
    }

    /// Load every category in display order.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list_categories(&self) -> Result<Vec<Category>, RepositoryError> {
        let rows: Vec<CategoryRow> =
            sqlx::query_as("SELECT id, slug, name FROM categories ORDER BY name")
                .fetch_all(self.pool)
                .await?;

        Ok(rows
            .into_iter()
            .map(|row| Category {
                id: CategoryId::new(row.id),
                slug: row.slug,
                name: row.name,
            })
            .collect())
    }
}
