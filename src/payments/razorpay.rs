use async_trait::async_trait;

use super::{GatewayError, GatewayOrder, OrderRequest, PaymentGateway};
use crate::config::PaymentConfig;

/// Razorpay orders API client.
pub struct RazorpayGateway {
    client: reqwest::Client,
    api_base: String,
    key_id: Option<String>,
    key_secret: Option<String>,
}

impl RazorpayGateway {
    pub fn new(config: &PaymentConfig) -> Self {
        Self {
            client: reqwest::Client::new(),
            api_base: config.api_base.trim_end_matches('/').to_string(),
            key_id: config.key_id.clone(),
            key_secret: config.key_secret.clone(),
        }
    }
}

#[async_trait]
impl PaymentGateway for RazorpayGateway {
    async fn create_order(&self, request: &OrderRequest) -> Result<GatewayOrder, GatewayError> {
        let (Some(key_id), Some(key_secret)) = (&self.key_id, &self.key_secret) else {
            return Err(GatewayError::NotConfigured);
        };

        let raw: serde_json::Value = self
            .client
            .post(format!("{}/orders", self.api_base))
            .basic_auth(key_id, Some(key_secret))
            .json(request)
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;

        parse_order(raw)
    }
}

fn parse_order(raw: serde_json::Value) -> Result<GatewayOrder, GatewayError> {
    let id = raw["id"]
        .as_str()
        .ok_or_else(|| GatewayError::InvalidResponse("order has no id".into()))?
        .to_string();
    let amount = raw["amount"]
        .as_i64()
        .ok_or_else(|| GatewayError::InvalidResponse("order has no amount".into()))?;
    Ok(GatewayOrder { id, amount, raw })
}
