//! Card payment gateway client.
//!
//! Opens hosted payment sessions: the storefront posts the amount and an
//! order reference, the gateway answers with the URL the customer is
//! redirected to. Settlement callbacks are handled out of band by the
//! order service.

use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue};
use rust_decimal::Decimal;
use secrecy::ExposeSecret;
use serde::{Deserialize, Serialize};

use crate::checkout::{GatewayError, InitiatePayment, PaymentGateway, PaymentRedirect};
use crate::config::PaymentGatewayConfig;

#[derive(Serialize)]
struct PaymentSessionBody<'a> {
    merchant_id: &'a str,
    amount: Decimal,
    currency: &'a str,
    order_reference: &'a str,
    customer_email: &'a str,
}

#[derive(Deserialize)]
struct PaymentSessionResponse {
    redirect_url: String,
}

/// Client for the hosted card payment gateway.
#[derive(Clone)]
pub struct PaymentClient {
    client: reqwest::Client,
    endpoint: String,
    merchant_id: String,
}

impl PaymentClient {
    /// Create a new payment gateway client.
    ///
    /// # Errors
    ///
    /// Returns error if the HTTP client fails to build.
    pub fn new(config: &PaymentGatewayConfig) -> Result<Self, GatewayError> {
        let mut headers = HeaderMap::new();

        let auth_value = format!("Bearer {}", config.api_key.expose_secret());
        headers.insert(
            "Authorization",
            HeaderValue::from_str(&auth_value)
                .map_err(|e| GatewayError::Parse(format!("Invalid API key format: {e}")))?,
        );

        let client = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(super::REQUEST_TIMEOUT)
            .build()?;

        Ok(Self {
            client,
            endpoint: config.endpoint.clone(),
            merchant_id: config.merchant_id.clone(),
        })
    }
}

#[async_trait]
impl PaymentGateway for PaymentClient {
    async fn initiate(&self, request: InitiatePayment) -> Result<PaymentRedirect, GatewayError> {
        let url = format!("{}/payment-sessions", self.endpoint);

        let body = PaymentSessionBody {
            merchant_id: &self.merchant_id,
            amount: request.amount,
            currency: "MAD",
            order_reference: request.order_reference.as_str(),
            customer_email: &request.customer_email,
        };

        let response = self.client.post(&url).json(&body).send().await?;
        let status = response.status();

        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(GatewayError::Api {
                status: status.as_u16(),
                message,
            });
        }

        let session: PaymentSessionResponse = response
            .json()
            .await
            .map_err(|e| GatewayError::Parse(e.to_string()))?;

        Ok(PaymentRedirect {
            redirect_url: session.redirect_url,
        })
    }
}
