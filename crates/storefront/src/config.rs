//! Storefront configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! ## Required
//! - `STOREFRONT_DATABASE_URL` - `PostgreSQL` connection string
//! - `STOREFRONT_BASE_URL` - Public URL for the storefront
//! - `STOREFRONT_SESSION_SECRET` - Session signing secret (min 32 chars, high entropy)
//! - `PAYMENT_GATEWAY_URL` - Base URL of the card payment gateway
//! - `PAYMENT_GATEWAY_MERCHANT_ID` - Merchant identifier at the gateway
//! - `PAYMENT_GATEWAY_API_KEY` - Gateway API key
//! - `ORDER_SERVICE_URL` - Base URL of the order placement service
//! - `ORDER_SERVICE_API_KEY` - Order service API key
//!
//! ## Optional
//! - `STOREFRONT_HOST` - Bind address (default: 127.0.0.1)
//! - `STOREFRONT_PORT` - Listen port (default: 3000)
//! - `CHECKOUT_PACKAGING_FEE` - Flat luxury packaging fee (default: 290)
//! - `CHECKOUT_INSURANCE_RATE` - Insurance fraction of subtotal (default: 0.01)
//! - `CATALOG_PRICE_BUCKET` - Price slider rounding bucket (default: 10000)
//! - `STORE_PICKUP_ADDRESS` / `STORE_PICKUP_CITY` / `STORE_PICKUP_POSTAL_CODE`
//!   / `STORE_PICKUP_COUNTRY` - Boutique pickup address
//! - `SENTRY_DSN` - Sentry error tracking DSN

use std::collections::HashMap;
use std::net::{IpAddr, SocketAddr};

use rust_decimal::Decimal;
use secrecy::{ExposeSecret, SecretString};
use thiserror::Error;

use lumine_core::checkout::ShippingAddress;

const MIN_SESSION_SECRET_LENGTH: usize = 32;
const MIN_ENTROPY_BITS_PER_CHAR: f64 = 3.3;

/// Blocklist of common placeholder patterns (case-insensitive)
const PLACEHOLDER_PATTERNS: &[&str] = &[
    "your-",
    "changeme",
    "replace",
    "placeholder",
    "example",
    "secret",
    "password",
    "xxx",
    "todo",
    "fixme",
    "insert",
    "enter-",
    "put-your",
    "add-your",
];

/// Configuration errors that can occur during loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(String),
    #[error("Invalid environment variable {0}: {1}")]
    InvalidEnvVar(String, String),
    #[error("Insecure secret in {0}: {1}")]
    InsecureSecret(String, String),
}

/// Storefront application configuration.
#[derive(Debug, Clone)]
pub struct StorefrontConfig {
    /// `PostgreSQL` database connection URL (contains password)
    pub database_url: SecretString,
    /// IP address to bind the server to
    pub host: IpAddr,
    /// Port to listen on
    pub port: u16,
    /// Public base URL for the storefront
    pub base_url: String,
    /// Session signing secret
    pub session_secret: SecretString,
    /// Card payment gateway configuration
    pub payment: PaymentGatewayConfig,
    /// Order placement service configuration
    pub orders: OrderServiceConfig,
    /// Checkout fees and boutique pickup address
    pub checkout: CheckoutConfig,
    /// Sentry DSN for error tracking
    pub sentry_dsn: Option<String>,
}

/// Card payment gateway configuration.
///
/// Implements `Debug` manually to redact the API key.
#[derive(Clone)]
pub struct PaymentGatewayConfig {
    /// Gateway base URL, e.g. `https://pay.example.com/api/v1`
    pub endpoint: String,
    /// Merchant identifier at the gateway
    pub merchant_id: String,
    /// Gateway API key (server-side only)
    pub api_key: SecretString,
}

impl std::fmt::Debug for PaymentGatewayConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PaymentGatewayConfig")
            .field("endpoint", &self.endpoint)
            .field("merchant_id", &self.merchant_id)
            .field("api_key", &"[REDACTED]")
            .finish()
    }
}

/// Order placement service configuration.
///
/// Implements `Debug` manually to redact the API key.
#[derive(Clone)]
pub struct OrderServiceConfig {
    /// Order service base URL
    pub endpoint: String,
    /// Order service API key (server-side only)
    pub api_key: SecretString,
}

impl std::fmt::Debug for OrderServiceConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OrderServiceConfig")
            .field("endpoint", &self.endpoint)
            .field("api_key", &"[REDACTED]")
            .finish()
    }
}

/// Checkout fee parameters and the boutique pickup address.
///
/// These are the named, overridable knobs the pricing derivation and the
/// shipping-option derivation consume; none of them appear as literals in
/// the checkout logic.
#[derive(Debug, Clone)]
pub struct CheckoutConfig {
    /// Flat fee for luxury packaging
    pub packaging_fee: Decimal,
    /// Insurance fee as a fraction of the subtotal
    pub insurance_rate: Decimal,
    /// Rounding bucket for the catalog price slider upper bound
    pub price_bucket: Decimal,
    /// Address used by the boutique pickup shipping option
    pub store_pickup: ShippingAddress,
}

impl CheckoutConfig {
    /// The fee parameters in the shape the pricing derivation expects.
    #[must_use]
    pub const fn pricing(&self) -> lumine_core::checkout::PricingConfig {
        lumine_core::checkout::PricingConfig {
            packaging_fee: self.packaging_fee,
            insurance_rate: self.insurance_rate,
        }
    }
}

impl StorefrontConfig {
    /// Load configuration from environment variables.
    ///
    /// Calls `dotenvy::dotenv()` to load from `.env` file if present.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if required variables are missing, invalid, or
    /// if secrets fail validation (placeholder detection, entropy check).
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();

        let database_url = get_database_url("STOREFRONT_DATABASE_URL")?;
        let host = get_env_or_default("STOREFRONT_HOST", "127.0.0.1")
            .parse::<IpAddr>()
            .map_err(|e| {
                ConfigError::InvalidEnvVar("STOREFRONT_HOST".to_string(), e.to_string())
            })?;
        let port = get_env_or_default("STOREFRONT_PORT", "3000")
            .parse::<u16>()
            .map_err(|e| {
                ConfigError::InvalidEnvVar("STOREFRONT_PORT".to_string(), e.to_string())
            })?;
        let base_url = get_required_env("STOREFRONT_BASE_URL")?;
        let session_secret = get_validated_secret("STOREFRONT_SESSION_SECRET")?;
        validate_session_secret(&session_secret, "STOREFRONT_SESSION_SECRET")?;

        let payment = PaymentGatewayConfig::from_env()?;
        let orders = OrderServiceConfig::from_env()?;
        let checkout = CheckoutConfig::from_env()?;
        let sentry_dsn = get_optional_env("SENTRY_DSN");

        Ok(Self {
            database_url,
            host,
            port,
            base_url,
            session_secret,
            payment,
            orders,
            checkout,
            sentry_dsn,
        })
    }

    /// Returns the socket address for binding the server.
    #[must_use]
    pub const fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }
}

impl PaymentGatewayConfig {
    fn from_env() -> Result<Self, ConfigError> {
        Ok(Self {
            endpoint: get_endpoint_env("PAYMENT_GATEWAY_URL")?,
            merchant_id: get_required_env("PAYMENT_GATEWAY_MERCHANT_ID")?,
            api_key: get_validated_secret("PAYMENT_GATEWAY_API_KEY")?,
        })
    }
}

impl OrderServiceConfig {
    fn from_env() -> Result<Self, ConfigError> {
        Ok(Self {
            endpoint: get_endpoint_env("ORDER_SERVICE_URL")?,
            api_key: get_validated_secret("ORDER_SERVICE_API_KEY")?,
        })
    }
}

impl CheckoutConfig {
    fn from_env() -> Result<Self, ConfigError> {
        Ok(Self {
            packaging_fee: get_decimal_env("CHECKOUT_PACKAGING_FEE", "290")?,
            insurance_rate: get_decimal_env("CHECKOUT_INSURANCE_RATE", "0.01")?,
            price_bucket: get_decimal_env("CATALOG_PRICE_BUCKET", "10000")?,
            store_pickup: ShippingAddress {
                address: get_env_or_default(
                    "STORE_PICKUP_ADDRESS",
                    "Maison Lumine, 12 Rue des Bijoutiers",
                ),
                city: get_env_or_default("STORE_PICKUP_CITY", "Casablanca"),
                postal_code: get_env_or_default("STORE_PICKUP_POSTAL_CODE", "20000"),
                country: get_env_or_default("STORE_PICKUP_COUNTRY", "Maroc"),
            },
        })
    }
}

// =============================================================================
// Helper Functions
// =============================================================================

/// Get a required environment variable.
fn get_required_env(key: &str) -> Result<String, ConfigError> {
    std::env::var(key).map_err(|_| ConfigError::MissingEnvVar(key.to_string()))
}

/// Get database URL with fallback to generic `DATABASE_URL` (used by Fly.io postgres attach).
fn get_database_url(primary_key: &str) -> Result<SecretString, ConfigError> {
    // Try primary key first (e.g., STOREFRONT_DATABASE_URL)
    if let Ok(value) = std::env::var(primary_key) {
        return Ok(SecretString::from(value));
    }
    // Fallback to generic DATABASE_URL (set by Fly.io postgres attach)
    if let Ok(value) = std::env::var("DATABASE_URL") {
        return Ok(SecretString::from(value));
    }
    Err(ConfigError::MissingEnvVar(primary_key.to_string()))
}

/// Get an optional environment variable.
fn get_optional_env(key: &str) -> Option<String> {
    std::env::var(key).ok()
}

/// Get an environment variable with a default value.
fn get_env_or_default(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}

/// Get a required environment variable that must parse as a URL.
fn get_endpoint_env(key: &str) -> Result<String, ConfigError> {
    let value = get_required_env(key)?;
    url::Url::parse(&value)
        .map_err(|e| ConfigError::InvalidEnvVar(key.to_string(), e.to_string()))?;
    // Gateways build paths by appending segments; a trailing slash would
    // produce double slashes.
    Ok(value.trim_end_matches('/').to_string())
}

/// Get an environment variable that must parse as a decimal, with a default.
fn get_decimal_env(key: &str, default: &str) -> Result<Decimal, ConfigError> {
    get_env_or_default(key, default)
        .parse::<Decimal>()
        .map_err(|e| ConfigError::InvalidEnvVar(key.to_string(), e.to_string()))
}

/// Validate that a session secret meets minimum length requirements.
fn validate_session_secret(secret: &SecretString, var_name: &str) -> Result<(), ConfigError> {
    let value = secret.expose_secret();
    if value.len() < MIN_SESSION_SECRET_LENGTH {
        return Err(ConfigError::InsecureSecret(
            var_name.to_string(),
            format!(
                "must be at least {} characters (got {})",
                MIN_SESSION_SECRET_LENGTH,
                value.len()
            ),
        ));
    }
    Ok(())
}

/// Calculate Shannon entropy in bits per character.
fn shannon_entropy(s: &str) -> f64 {
    if s.is_empty() {
        return 0.0;
    }

    let mut freq: HashMap<char, usize> = HashMap::new();
    for c in s.chars() {
        *freq.entry(c).or_insert(0) += 1;
    }

    #[allow(clippy::cast_precision_loss)] // String length will never exceed f64 precision
    let len = s.len() as f64;
    freq.values()
        .map(|&count| {
            #[allow(clippy::cast_precision_loss)] // Character count will never exceed f64 precision
            let p = count as f64 / len;
            -p * p.log2()
        })
        .sum()
}

/// Validate that a secret is not a placeholder and has sufficient entropy.
fn validate_secret_strength(secret: &str, var_name: &str) -> Result<(), ConfigError> {
    let lower = secret.to_lowercase();

    // Check blocklist
    for pattern in PLACEHOLDER_PATTERNS {
        if lower.contains(pattern) {
            return Err(ConfigError::InsecureSecret(
                var_name.to_string(),
                format!("appears to be a placeholder (contains '{pattern}')"),
            ));
        }
    }

    // Check entropy (real secrets like API keys have high entropy)
    let entropy = shannon_entropy(secret);
    if entropy < MIN_ENTROPY_BITS_PER_CHAR {
        return Err(ConfigError::InsecureSecret(
            var_name.to_string(),
            format!(
                "entropy too low ({entropy:.2} bits/char, need >= {MIN_ENTROPY_BITS_PER_CHAR:.1}). Use a randomly generated secret."
            ),
        ));
    }

    Ok(())
}

/// Load and validate a secret from environment.
fn get_validated_secret(key: &str) -> Result<SecretString, ConfigError> {
    let value = get_required_env(key)?;
    validate_secret_strength(&value, key)?;
    Ok(SecretString::from(value))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_shannon_entropy_empty() {
        assert!((shannon_entropy("") - 0.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_shannon_entropy_single_char() {
        // All same character = 0 entropy
        assert!((shannon_entropy("aaaaaaa") - 0.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_shannon_entropy_two_chars() {
        // "ab" has entropy of 1 bit per char (50% a, 50% b)
        let entropy = shannon_entropy("ab");
        assert!((entropy - 1.0).abs() < 0.01);
    }

    #[test]
    fn test_shannon_entropy_high() {
        // Random-looking string should have high entropy
        let entropy = shannon_entropy("aB3$xY9!mK2@nL5#");
        assert!(entropy > 3.3);
    }

    #[test]
    fn test_validate_secret_strength_placeholder() {
        let result = validate_secret_strength("your-api-key-here", "TEST_VAR");
        assert!(result.is_err());
        let err = result.unwrap_err();
        assert!(matches!(err, ConfigError::InsecureSecret(_, _)));
    }

    #[test]
    fn test_validate_secret_strength_low_entropy() {
        let result = validate_secret_strength("aaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaa", "TEST_VAR");
        assert!(result.is_err());
        let err = result.unwrap_err();
        assert!(matches!(err, ConfigError::InsecureSecret(_, _)));
    }

    #[test]
    fn test_validate_secret_strength_valid() {
        // High-entropy random string
        let result = validate_secret_strength("aB3$xY9!mK2@nL5#pQ7&rT0*uW4^zC6", "TEST_VAR");
        assert!(result.is_ok());
    }

    #[test]
    fn test_validate_session_secret_too_short() {
        let secret = SecretString::from("short");
        let result = validate_session_secret(&secret, "TEST_SESSION");
        assert!(result.is_err());
    }

    #[test]
    fn test_validate_session_secret_valid_length() {
        let secret = SecretString::from("a".repeat(32));
        let result = validate_session_secret(&secret, "TEST_SESSION");
        assert!(result.is_ok());
    }

    fn test_config() -> StorefrontConfig {
        StorefrontConfig {
            database_url: SecretString::from("postgres://localhost/test"),
            host: "127.0.0.1".parse().unwrap(),
            port: 3000,
            base_url: "http://localhost:3000".to_string(),
            session_secret: SecretString::from("x".repeat(32)),
            payment: PaymentGatewayConfig {
                endpoint: "https://pay.example.test/api/v1".to_string(),
                merchant_id: "maison-lumine".to_string(),
                api_key: SecretString::from("gateway_key_value"),
            },
            orders: OrderServiceConfig {
                endpoint: "https://orders.example.test/api".to_string(),
                api_key: SecretString::from("order_key_value"),
            },
            checkout: CheckoutConfig {
                packaging_fee: Decimal::from(290),
                insurance_rate: Decimal::new(1, 2),
                price_bucket: Decimal::from(10_000),
                store_pickup: ShippingAddress {
                    address: "Maison Lumine, 12 Rue des Bijoutiers".to_string(),
                    city: "Casablanca".to_string(),
                    postal_code: "20000".to_string(),
                    country: "Maroc".to_string(),
                },
            },
            sentry_dsn: None,
        }
    }

    #[test]
    fn test_socket_addr() {
        let config = test_config();
        let addr = config.socket_addr();
        assert_eq!(addr.ip().to_string(), "127.0.0.1");
        assert_eq!(addr.port(), 3000);
    }

    #[test]
    fn test_checkout_pricing_view() {
        let config = test_config();
        let pricing = config.checkout.pricing();
        assert_eq!(pricing.packaging_fee, Decimal::from(290));
        assert_eq!(pricing.insurance_rate, Decimal::new(1, 2));
    }

    #[test]
    fn test_gateway_config_debug_redacts_secrets() {
        let config = test_config();

        let debug_output = format!("{:?} {:?}", config.payment, config.orders);

        // Public fields should be visible
        assert!(debug_output.contains("pay.example.test"));
        assert!(debug_output.contains("maison-lumine"));

        // Secret fields should be redacted
        assert!(debug_output.contains("[REDACTED]"));
        assert!(!debug_output.contains("gateway_key_value"));
        assert!(!debug_output.contains("order_key_value"));
    }
}
