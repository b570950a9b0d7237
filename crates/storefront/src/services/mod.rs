//! External service clients.
//!
//! HTTP implementations of the checkout collaborator traits. Both clients
//! carry a conservative request timeout; a failed call surfaces a single
//! retry prompt in the checkout rather than retrying automatically.

pub mod orders;
pub mod payment;

pub use orders::OrderClient;
pub use payment::PaymentClient;

/// Request timeout applied to every gateway call.
pub(crate) const REQUEST_TIMEOUT: std::time::Duration = std::time::Duration::from_secs(10);
