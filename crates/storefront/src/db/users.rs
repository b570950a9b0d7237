//! User repository for database operations.
//!
//! The storefront only reads the saved shipping address; identity comes from
//! the session and account management is handled elsewhere.

use sqlx::PgPool;

use lumine_core::UserId;
use lumine_core::checkout::ShippingAddress;

use super::RepositoryError;

#[derive(sqlx::FromRow)]
struct AddressRow {
    address: String,
    city: String,
    postal_code: String,
    country: String,
}

/// Repository for user database operations.
pub struct UserRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> UserRepository<'a> {
    /// Create a new user repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Get the user's default saved shipping address, if any.
    ///
    /// Feeds the "profile" shipping option; an absent address is not an
    /// error, the checkout degrades to manual entry.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get_saved_address(
        &self,
        id: UserId,
    ) -> Result<Option<ShippingAddress>, RepositoryError> {
        let row: Option<AddressRow> = sqlx::query_as(
            r"
            SELECT address, city, postal_code, country
            FROM addresses
            WHERE user_id = $1
            ORDER BY is_default DESC, id
            LIMIT 1
            ",
        )
        .bind(id)
        .fetch_optional(self.pool)
        .await?;

        Ok(row.map(|r| ShippingAddress {
            address: r.address,
            city: r.city,
            postal_code: r.postal_code,
            country: r.country,
        }))
    }
}
