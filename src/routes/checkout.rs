//! Checkout routes — payment intents and hosted sessions.
//!
//! DESIGN
//! ======
//! Both routes accept the same cart payload but treat amounts differently:
//! the intent route computes an authoritative server-side total, while the
//! session route forwards per-item prices and lets the provider sum them.
//! Both fail fast with a configuration error before reading the cart when
//! no payment gateway is present.

#[cfg(test)]
#[path = "checkout_test.rs"]
mod tests;

use std::sync::Arc;

use axum::extract::State;
use axum::http::HeaderMap;
use axum::http::header::{HOST, ORIGIN};
use axum::response::Json;
use serde::Deserialize;

use crate::card;
use crate::error::ApiError;
use crate::payments::PaymentGateway;
use crate::services::checkout::{self, CartItem, ChargeDecision};
use crate::state::AppState;

#[derive(Deserialize)]
pub struct CheckoutBody {
    pub items: Vec<CartItem>,
}

fn require_gateway(state: &AppState) -> Result<Arc<dyn PaymentGateway>, ApiError> {
    state
        .payments
        .clone()
        .ok_or(ApiError::NotConfigured("payment provider"))
}

/// `POST /api/checkout-intent` — compute the order total and create a
/// payment intent for it.
pub async fn create_intent(
    State(state): State<AppState>,
    Json(body): Json<CheckoutBody>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let gateway = require_gateway(&state)?;

    let total_cents =
        checkout::order_total_cents(&body.items).map_err(|e| ApiError::Validation(e.to_string()))?;

    match checkout::decide_charge(total_cents) {
        ChargeDecision::Free => Ok(Json(serde_json::json!({ "free": true }))),
        ChargeDecision::BelowMinimum { .. } => Err(ApiError::minimum_amount()),
        ChargeDecision::Charge { amount_cents } => {
            let intent = gateway.create_payment_intent(amount_cents, "usd").await?;
            tracing::info!(amount_cents, intent = %intent.id, "payment intent created");
            Ok(Json(serde_json::json!({ "clientSecret": intent.client_secret })))
        }
    }
}

/// `POST /api/checkout` — create a provider-hosted checkout session and
/// return its redirect URL.
pub async fn create_session(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(body): Json<CheckoutBody>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let gateway = require_gateway(&state)?;

    let line_items =
        checkout::session_line_items(&body.items).map_err(|e| ApiError::Validation(e.to_string()))?;

    let base = request_base_url(state.config.base_url.as_deref(), &headers);
    let success_url = format!("{base}/marketplace?success=true");
    let cancel_url = format!("{base}/marketplace?canceled=true");

    let session = gateway
        .create_checkout_session(&line_items, &success_url, &cancel_url)
        .await?;
    tracing::info!(session = %session.id, "checkout session created");
    Ok(Json(serde_json::json!({ "url": session.url })))
}

#[derive(Deserialize)]
pub struct ValidateCardBody {
    pub number: Option<String>,
}

/// `POST /api/validate-card` — advisory Luhn and brand check for checkout
/// forms. Nothing is stored or forwarded.
pub async fn validate_card(Json(body): Json<ValidateCardBody>) -> Result<Json<serde_json::Value>, ApiError> {
    let number = body
        .number
        .as_deref()
        .ok_or_else(|| ApiError::Validation("number is required".into()))?;

    Ok(Json(serde_json::json!({
        "valid": card::validate_card_number(number),
        "brand": card::detect_brand(number).as_str(),
    })))
}

/// Redirect destination base: the configured public URL, else the incoming
/// request's origin.
pub(crate) fn request_base_url(configured: Option<&str>, headers: &HeaderMap) -> String {
    if let Some(base) = configured {
        return base.trim_end_matches('/').to_owned();
    }
    if let Some(origin) = headers.get(ORIGIN).and_then(|v| v.to_str().ok()) {
        return origin.trim_end_matches('/').to_owned();
    }
    if let Some(host) = headers.get(HOST).and_then(|v| v.to_str().ok()) {
        return format!("http://{host}");
    }
    "http://localhost:3000".to_owned()
}
