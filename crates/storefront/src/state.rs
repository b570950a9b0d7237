//! Application state shared across handlers.

use std::sync::Arc;

use sqlx::PgPool;

use crate::catalog::CatalogService;
use crate::checkout::GatewayError;
use crate::config::StorefrontConfig;
use crate::services::{OrderClient, PaymentClient};

/// Application state shared across all handlers.
///
/// This struct is cheaply cloneable via `Arc` and provides access to
/// shared resources like database connections and configuration.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    config: StorefrontConfig,
    pool: PgPool,
    catalog: CatalogService,
    payment: PaymentClient,
    orders: OrderClient,
}

impl AppState {
    /// Create a new application state.
    ///
    /// # Arguments
    ///
    /// * `config` - Storefront configuration
    /// * `pool` - `PostgreSQL` connection pool
    ///
    /// # Errors
    ///
    /// Returns an error if a gateway client cannot be built from the
    /// configuration.
    pub fn new(config: StorefrontConfig, pool: PgPool) -> Result<Self, GatewayError> {
        let catalog = CatalogService::new(pool.clone());
        let payment = PaymentClient::new(&config.payment)?;
        let orders = OrderClient::new(&config.orders)?;

        Ok(Self {
            inner: Arc::new(AppStateInner {
                config,
                pool,
                catalog,
                payment,
                orders,
            }),
        })
    }

    /// Get a reference to the storefront configuration.
    #[must_use]
    pub fn config(&self) -> &StorefrontConfig {
        &self.inner.config
    }

    /// Get a reference to the database connection pool.
    #[must_use]
    pub fn pool(&self) -> &PgPool {
        &self.inner.pool
    }

    /// Get a reference to the in-memory catalog service.
    #[must_use]
    pub fn catalog(&self) -> &CatalogService {
        &self.inner.catalog
    }

    /// Get a reference to the card payment gateway client.
    #[must_use]
    pub fn payment(&self) -> &PaymentClient {
        &self.inner.payment
    }

    /// Get a reference to the order placement client.
    #[must_use]
    pub fn orders(&self) -> &OrderClient {
        &self.inner.orders
    }
}
