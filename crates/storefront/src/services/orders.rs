//! Order placement service client.
//!
//! Used by the cash-on-delivery path: the full cart, shipping, and add-on
//! data go out in one request and the service answers with the created
//! order's id. Error bodies are passed through to the customer as the
//! retry message.

use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue};
use secrecy::ExposeSecret;
use serde::Deserialize;

use lumine_core::OrderId;

use crate::checkout::{GatewayError, OrderGateway, OrderRequest, PlacedOrder};
use crate::config::OrderServiceConfig;

#[derive(Deserialize)]
struct PlaceOrderResponse {
    order_id: i32,
}

#[derive(Deserialize)]
struct OrderErrorResponse {
    error: Option<String>,
}

/// Client for the order placement service.
#[derive(Clone)]
pub struct OrderClient {
    client: reqwest::Client,
    endpoint: String,
}

impl OrderClient {
    /// Create a new order service client.
    ///
    /// # Errors
    ///
    /// Returns error if the HTTP client fails to build.
    pub fn new(config: &OrderServiceConfig) -> Result<Self, GatewayError> {
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
        })
    }
}

#[async_trait]
impl OrderGateway for OrderClient {
    async fn place(&self, request: OrderRequest) -> Result<PlacedOrder, GatewayError> {
        let url = format!("{}/orders", self.endpoint);

        let response = self.client.post(&url).json(&request).send().await?;
        let status = response.status();

        if !status.is_success() {
            // The service reports user-facing failures as {"error": "..."}.
            let body = response.text().await.unwrap_or_default();
            let message = serde_json::from_str::<OrderErrorResponse>(&body)
                .ok()
                .and_then(|e| e.error)
                .unwrap_or(body);
            return Err(GatewayError::Api {
                status: status.as_u16(),
                message,
            });
        }

        let placed: PlaceOrderResponse = response
            .json()
            .await
            .map_err(|e| GatewayError::Parse(e.to_string()))?;

        Ok(PlacedOrder {
            order_id: OrderId::new(placed.order_id),
        })
    }
}
