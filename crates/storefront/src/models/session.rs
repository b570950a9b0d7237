//! Session-related types.
//!
//! Types stored in the session for authentication and checkout state.

use serde::{Deserialize, Serialize};

use lumine_core::UserId;

/// Session-stored user identity.
///
/// Minimal data stored in the session to identify the logged-in user.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CurrentUser {
    /// User's database ID.
    pub id: UserId,
    /// User's email address.
    pub email: String,
}

/// Session keys.
pub mod keys {
    /// Key for storing the current logged-in user.
    pub const CURRENT_USER: &str = "current_user";

    /// Key for the session cart.
    pub const CART: &str = "cart";

    /// Key for the in-progress checkout flow.
    pub const CHECKOUT: &str = "checkout";
}
