/// Boundary to the external order/checkout subsystem.
/// The core only ever asks it to open an order for a win; payment capture
/// and card/bank mechanics live entirely on the other side.
// region:    --- Imports
use crate::error::CoreError;
use async_trait::async_trait;
use serde::Deserialize;
use tracing::info;

// endregion: --- Imports

// region:    --- CheckoutGateway

#[async_trait]
pub trait CheckoutGateway: Send + Sync {
    /// Open an order for a pending win, returning the external order
    /// reference. Must not mutate winner state.
    async fn create_order_for_win(&self, winner_id: i64) -> Result<String, CoreError>;
}

// endregion: --- CheckoutGateway

// region:    --- HttpCheckout

/// Production gateway: POSTs to the order service.
pub struct HttpCheckout {
    client: reqwest::Client,
    base_url: String,
}

#[derive(Deserialize)]
struct OrderResponse {
    order_ref: String,
}

impl HttpCheckout {
    pub fn new(base_url: String) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url,
        }
    }
}

#[async_trait]
impl CheckoutGateway for HttpCheckout {
    async fn create_order_for_win(&self, winner_id: i64) -> Result<String, CoreError> {
        info!("{:<12} --> create order: winner={}", "Checkout", winner_id);
        let response = self
            .client
            .post(format!("{}/orders", self.base_url))
            .json(&serde_json::json!({ "winner_id": winner_id }))
            .send()
            .await
            .map_err(|e| CoreError::Checkout(e.to_string()))?
            .error_for_status()
            .map_err(|e| CoreError::Checkout(e.to_string()))?;

        let order: OrderResponse = response
            .json()
            .await
            .map_err(|e| CoreError::Checkout(e.to_string()))?;
        Ok(order.order_ref)
    }
}

// endregion: --- HttpCheckout

// region:    --- NoopCheckout

/// Test gateway: hands back a synthetic order reference.
#[derive(Default)]
pub struct NoopCheckout;

#[async_trait]
impl CheckoutGateway for NoopCheckout {
    async fn create_order_for_win(&self, winner_id: i64) -> Result<String, CoreError> {
        Ok(format!("order-{winner_id}"))
    }
}

// endregion: --- NoopCheckout
