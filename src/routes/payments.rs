use axum::extract::State;
use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::Deserialize;
use serde_json::{json, Value};

use crate::db::models::{Payment, PaymentStatus};
use crate::db::payments;
use crate::error::{AppError, AppResult};
use crate::extractors::JsonBody;
use crate::payments::{new_receipt, to_minor_units, verify_signature, OrderRequest};
use crate::routes::present;
use crate::state::AppState;

/// Recorded on every payment row; orders only go through Razorpay.
const PAYMENT_METHOD: &str = "Razorpay";

#[derive(Deserialize)]
pub struct CreateOrderBody {
    pub amount: Option<Value>,
}

#[derive(Deserialize)]
pub struct VerifyBody {
    pub razorpay_order_id: Option<String>,
    pub razorpay_payment_id: Option<String>,
    pub razorpay_signature: Option<String>,
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/payment/create-order", post(create_order))
        .route("/payment/verify", post(verify))
        .route("/payment/all", get(recent_payments))
}

/// Amounts arrive as JSON numbers or numeric strings.
fn amount_from(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

async fn create_order(
    State(state): State<AppState>,
    JsonBody(body): JsonBody<CreateOrderBody>,
) -> AppResult<Json<Value>> {
    let amount = body
        .amount
        .as_ref()
        .and_then(amount_from)
        .and_then(to_minor_units)
        .ok_or_else(|| AppError::validation("Invalid amount"))?;

    let request = OrderRequest {
        amount,
        currency: state.config.payment.currency.clone(),
        receipt: new_receipt(),
    };
    let order = state.payments.create_order(&request).await?;

    let conn = state.db.get()?;
    payments::insert_pending(&conn, &order.id, order.amount, &request.currency, PAYMENT_METHOD)?;
    tracing::info!("Created payment order {} for {}", order.id, order.amount);

    Ok(Json(order.raw))
}

async fn verify(
    State(state): State<AppState>,
    JsonBody(body): JsonBody<VerifyBody>,
) -> AppResult<(StatusCode, Json<Value>)> {
    let (Some(order_id), Some(payment_id), Some(signature)) = (
        present(&body.razorpay_order_id),
        present(&body.razorpay_payment_id),
        present(&body.razorpay_signature),
    ) else {
        return Err(AppError::validation("Payment details are required"));
    };
    let secret = state
        .config
        .payment
        .key_secret
        .as_deref()
        .ok_or_else(|| AppError::Gateway("payment gateway is not configured".into()))?;

    let conn = state.db.get()?;
    if verify_signature(secret, order_id, payment_id, signature) {
        payments::settle(&conn, order_id, PaymentStatus::Paid, Some(payment_id))?;
        tracing::info!("Payment {} verified for order {}", payment_id, order_id);
        Ok((StatusCode::OK, Json(json!({ "status": "success" }))))
    } else {
        payments::fail_pending(&conn, order_id)?;
        tracing::warn!("Signature mismatch for order {}", order_id);
        Ok((StatusCode::BAD_REQUEST, Json(json!({ "status": "failed" }))))
    }
}

async fn recent_payments(State(state): State<AppState>) -> AppResult<Json<Vec<Payment>>> {
    let conn = state.db.get()?;
    Ok(Json(payments::recent(&conn)?))
}
