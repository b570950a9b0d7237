//! In-memory fakes for the checkout collaborators.
//!
//! Each fake records the requests it receives so tests can assert exactly
//! which gateway was called, how often, and with what payload.

use std::sync::Mutex;

use async_trait::async_trait;

use lumine_core::OrderId;
use lumine_storefront::checkout::{
    GatewayError, InitiatePayment, OrderGateway, OrderRequest, PaymentGateway, PaymentRedirect,
    PlacedOrder,
};

/// Recording fake for the card payment gateway.
pub struct FakePaymentGateway {
    /// Every initiation request received, in order.
    pub requests: Mutex<Vec<InitiatePayment>>,
    redirect_url: String,
    failure: Option<String>,
}

impl FakePaymentGateway {
    /// A gateway that answers every initiation with `redirect_url`.
    #[must_use]
    pub fn succeeding(redirect_url: &str) -> Self {
        Self {
            requests: Mutex::new(Vec::new()),
            redirect_url: redirect_url.to_string(),
            failure: None,
        }
    }

    /// A gateway that rejects every initiation with `message`.
    #[must_use]
    pub fn failing(message: &str) -> Self {
        Self {
            requests: Mutex::new(Vec::new()),
            redirect_url: String::new(),
            failure: Some(message.to_string()),
        }
    }

    /// Number of initiation requests received.
    #[must_use]
    pub fn call_count(&self) -> usize {
        self.requests.lock().map(|r| r.len()).unwrap_or(0)
    }
}

#[async_trait]
impl PaymentGateway for FakePaymentGateway {
    async fn initiate(&self, request: InitiatePayment) -> Result<PaymentRedirect, GatewayError> {
        if let Ok(mut requests) = self.requests.lock() {
            requests.push(request);
        }

        match &self.failure {
            Some(message) => Err(GatewayError::Api {
                status: 502,
                message: message.clone(),
            }),
            None => Ok(PaymentRedirect {
                redirect_url: self.redirect_url.clone(),
            }),
        }
    }
}

/// Recording fake for the order placement service.
pub struct FakeOrderGateway {
    /// Every placement request received, in order.
    pub requests: Mutex<Vec<OrderRequest>>,
    order_id: i32,
    failure: Option<String>,
}

impl FakeOrderGateway {
    /// A service that places every order as `order_id`.
    #[must_use]
    pub fn succeeding(order_id: i32) -> Self {
        Self {
            requests: Mutex::new(Vec::new()),
            order_id,
            failure: None,
        }
    }

    /// A service that rejects every placement with `message`.
    #[must_use]
    pub fn failing(message: &str) -> Self {
        Self {
            requests: Mutex::new(Vec::new()),
            order_id: 0,
            failure: Some(message.to_string()),
        }
    }

    /// Number of placement requests received.
    #[must_use]
    pub fn call_count(&self) -> usize {
        self.requests.lock().map(|r| r.len()).unwrap_or(0)
    }
}

#[async_trait]
impl OrderGateway for FakeOrderGateway {
    async fn place(&self, request: OrderRequest) -> Result<PlacedOrder, GatewayError> {
        if let Ok(mut requests) = self.requests.lock() {
            requests.push(request);
        }

        match &self.failure {
            Some(message) => Err(GatewayError::Api {
                status: 422,
                message: message.clone(),
            }),
            None => Ok(PlacedOrder {
                order_id: OrderId::new(self.order_id),
            }),
        }
    }
}
