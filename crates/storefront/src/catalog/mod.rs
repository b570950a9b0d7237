//! In-memory catalog service.
//!
//! The query engine in `lumine-core` works over a pre-loaded product list;
//! this service owns that list. Products and categories are loaded from
//! `PostgreSQL` and cached with `moka` (5-minute TTL) so every
//! collections-page request filters against a shared immutable snapshot
//! instead of hitting the database.

use std::sync::Arc;
use std::time::Duration;

use moka::future::Cache;
use sqlx::PgPool;

use lumine_core::catalog::{Category, Product};

use crate::db::RepositoryError;
use crate::db::products::ProductRepository;

/// Cache key for catalog snapshots.
#[derive(Debug, Clone, Hash, PartialEq, Eq)]
enum CacheKey {
    Products,
    Categories,
}

/// Cached snapshot types.
#[derive(Debug, Clone)]
enum CacheValue {
    Products(Arc<Vec<Product>>),
    Categories(Arc<Vec<Category>>),
}

/// Shared catalog snapshot provider.
///
/// Cheaply cloneable; all clones share the same cache.
#[derive(Clone)]
pub struct CatalogService {
    inner: Arc<CatalogServiceInner>,
}

struct CatalogServiceInner {
    pool: PgPool,
    cache: Cache<CacheKey, CacheValue>,
}

impl CatalogService {
    /// Create a new catalog service backed by the given pool.
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        let cache = Cache::builder()
            .max_capacity(4)
            .time_to_live(Duration::from_secs(300)) // 5 minutes
            .build();

        Self {
            inner: Arc::new(CatalogServiceInner { pool, cache }),
        }
    }

    /// The current product snapshot, loading it on a cache miss.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError` if the catalog cannot be loaded.
    pub async fn products(&self) -> Result<Arc<Vec<Product>>, RepositoryError> {
        if let Some(CacheValue::Products(products)) =
            self.inner.cache.get(&CacheKey::Products).await
        {
            return Ok(products);
        }

        let products = Arc::new(
            ProductRepository::new(&self.inner.pool)
                .list_products()
                .await?,
        );
        self.inner
            .cache
            .insert(CacheKey::Products, CacheValue::Products(Arc::clone(&products)))
            .await;

        Ok(products)
    }

    /// The current category snapshot, loading it on a cache miss.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError` if the categories cannot be loaded.
    pub async fn categories(&self) -> Result<Arc<Vec<Category>>, RepositoryError> {
        if let Some(CacheValue::Categories(categories)) =
            self.inner.cache.get(&CacheKey::Categories).await
        {
            return Ok(categories);
        }

        let categories = Arc::new(
            ProductRepository::new(&self.inner.pool)
                .list_categories()
                .await?,
        );
        self.inner
            .cache
            .insert(
                CacheKey::Categories,
                CacheValue::Categories(Arc::clone(&categories)),
            )
            .await;

        Ok(categories)
    }

    /// Look up one product by its URL slug.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError` if the catalog cannot be loaded.
    pub async fn product_by_slug(
        &self,
        slug: &str,
    ) -> Result<Option<Product>, RepositoryError> {
        let products = self.products().await?;
        Ok(products.iter().find(|p| p.slug == slug).cloned())
    }
}
