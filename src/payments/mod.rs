mod razorpay;

use async_trait::async_trait;
use hmac::{Hmac, Mac};
use serde::Serialize;
use sha2::Sha256;

pub use self::razorpay::RazorpayGateway;

type HmacSha256 = Hmac<Sha256>;

#[derive(Debug, thiserror::Error)]
pub enum GatewayError {
    #[error("payment gateway is not configured")]
    NotConfigured,

    #[error("payment gateway request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("unexpected gateway response: {0}")]
    InvalidResponse(String),
}

/// Body sent to the gateway's order endpoint. Amount is in minor units.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OrderRequest {
    pub amount: i64,
    pub currency: String,
    pub receipt: String,
}

/// An order as created by the gateway. `raw` is returned to the client verbatim.
#[derive(Debug, Clone)]
pub struct GatewayOrder {
    pub id: String,
    pub amount: i64,
    pub raw: serde_json::Value,
}

#[async_trait]
pub trait PaymentGateway: Send + Sync {
    async fn create_order(&self, request: &OrderRequest) -> Result<GatewayOrder, GatewayError>;
}

/// Convert a major-unit amount (rupees) into minor units (paise).
/// Returns `None` for anything that is not a positive, finite amount.
pub fn to_minor_units(amount: f64) -> Option<i64> {
    if !amount.is_finite() || amount <= 0.0 {
        return None;
    }
    let minor = (amount * 100.0).round() as i64;
    (minor > 0).then_some(minor)
}

pub fn new_receipt() -> String {
    use rand::Rng;
    format!("receipt_{}", rand::thread_rng().gen_range(0..10_000))
}

fn signing_mac(secret: &str, order_id: &str, payment_id: &str) -> Option<HmacSha256> {
    let mut mac = <HmacSha256 as Mac>::new_from_slice(secret.as_bytes()).ok()?;
    mac.update(format!("{}|{}", order_id, payment_id).as_bytes());
    Some(mac)
}

/// Hex HMAC-SHA256 of `"<order_id>|<payment_id>"`, as the gateway signs it.
pub fn expected_signature(secret: &str, order_id: &str, payment_id: &str) -> String {
    signing_mac(secret, order_id, payment_id)
        .map(|mac| hex::encode(mac.finalize().into_bytes()))
        .unwrap_or_default()
}

/// Constant-time check of a hex signature supplied by the client.
pub fn verify_signature(secret: &str, order_id: &str, payment_id: &str, signature: &str) -> bool {
    let Ok(provided) = hex::decode(signature.trim()) else {
        return false;
    };
    signing_mac(secret, order_id, payment_id)
        .map(|mac| mac.verify_slice(&provided).is_ok())
        .unwrap_or(false)
}
