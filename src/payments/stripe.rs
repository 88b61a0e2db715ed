//! Stripe REST client.
//!
//! Thin HTTP wrapper over `/v1/payment_intents` and `/v1/checkout/sessions`.
//! Stripe speaks form-encoded requests with bracketed nested keys. Pure
//! parsing lives in free functions for testability.

#[cfg(test)]
#[path = "stripe_test.rs"]
mod tests;

use std::time::Duration;

use async_trait::async_trait;

use super::types::{CheckoutSession, PaymentError, PaymentGateway, PaymentIntent, SessionLineItem};

const API_BASE: &str = "https://api.stripe.com/v1";
const SECRET_KEY_VAR: &str = "STRIPE_SECRET_KEY";
const REQUEST_TIMEOUT_SECS: u64 = 30;
const CONNECT_TIMEOUT_SECS: u64 = 10;

// =============================================================================
// CLIENT
// =============================================================================

pub struct StripeGateway {
    http: reqwest::Client,
    secret_key: String,
}

impl StripeGateway {
    /// Build a gateway from `STRIPE_SECRET_KEY`.
    ///
    /// # Errors
    ///
    /// Returns an error if the key is missing or the HTTP client fails to
    /// build.
    pub fn from_env() -> Result<Self, PaymentError> {
        let secret_key = std::env::var(SECRET_KEY_VAR)
            .map_err(|_| PaymentError::MissingSecretKey { var: SECRET_KEY_VAR.to_owned() })?;
        Self::new(secret_key)
    }

    /// Build a gateway with an explicit secret key.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client fails to build.
    pub fn new(secret_key: String) -> Result<Self, PaymentError> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .connect_timeout(Duration::from_secs(CONNECT_TIMEOUT_SECS))
            .build()
            .map_err(|e| PaymentError::HttpClientBuild(e.to_string()))?;
        Ok(Self { http, secret_key })
    }

    async fn post_form(&self, path: &str, form: &[(String, String)]) -> Result<String, PaymentError> {
        let response = self
            .http
            .post(format!("{API_BASE}{path}"))
            .bearer_auth(&self.secret_key)
            .form(form)
            .send()
            .await
            .map_err(|e| PaymentError::ApiRequest(e.to_string()))?;

        let status = response.status().as_u16();
        let text = response
            .text()
            .await
            .map_err(|e| PaymentError::ApiRequest(e.to_string()))?;

        if !(200..300).contains(&status) {
            return Err(PaymentError::ApiResponse { status, message: provider_error_message(&text) });
        }

        Ok(text)
    }
}

#[async_trait]
impl PaymentGateway for StripeGateway {
    async fn create_payment_intent(&self, amount_cents: i64, currency: &str) -> Result<PaymentIntent, PaymentError> {
        let form = intent_form(amount_cents, currency);
        let body = self.post_form("/payment_intents", &form).await?;
        parse_intent_response(&body)
    }

    async fn create_checkout_session(
        &self,
        line_items: &[SessionLineItem],
        success_url: &str,
        cancel_url: &str,
    ) -> Result<CheckoutSession, PaymentError> {
        let form = session_form(line_items, success_url, cancel_url);
        let body = self.post_form("/checkout/sessions", &form).await?;
        parse_session_response(&body)
    }
}

// =============================================================================
// FORM ENCODING
// =============================================================================

fn intent_form(amount_cents: i64, currency: &str) -> Vec<(String, String)> {
    vec![
        ("amount".into(), amount_cents.to_string()),
        ("currency".into(), currency.to_owned()),
        ("automatic_payment_methods[enabled]".into(), "true".into()),
    ]
}

fn session_form(line_items: &[SessionLineItem], success_url: &str, cancel_url: &str) -> Vec<(String, String)> {
    let mut form = vec![
        ("mode".into(), "payment".into()),
        ("success_url".into(), success_url.to_owned()),
        ("cancel_url".into(), cancel_url.to_owned()),
    ];
    for (i, item) in line_items.iter().enumerate() {
        form.push((format!("line_items[{i}][price_data][currency]"), "usd".into()));
        form.push((format!("line_items[{i}][price_data][product_data][name]"), item.name.clone()));
        form.push((format!("line_items[{i}][price_data][unit_amount]"), item.unit_amount_cents.to_string()));
        form.push((format!("line_items[{i}][quantity]"), item.quantity.to_string()));
    }
    form
}

// =============================================================================
// WIRE TYPES / PARSING
// =============================================================================

#[derive(serde::Deserialize)]
struct IntentResponse {
    id: String,
    client_secret: String,
}

#[derive(serde::Deserialize)]
struct SessionResponse {
    id: String,
    url: String,
}

#[derive(serde::Deserialize)]
struct ErrorEnvelope {
    error: ErrorBody,
}

#[derive(serde::Deserialize)]
struct ErrorBody {
    message: String,
}

fn parse_intent_response(json: &str) -> Result<PaymentIntent, PaymentError> {
    let api: IntentResponse = serde_json::from_str(json).map_err(|e| PaymentError::ApiParse(e.to_string()))?;
    Ok(PaymentIntent { id: api.id, client_secret: api.client_secret })
}

fn parse_session_response(json: &str) -> Result<CheckoutSession, PaymentError> {
    let api: SessionResponse = serde_json::from_str(json).map_err(|e| PaymentError::ApiParse(e.to_string()))?;
    Ok(CheckoutSession { id: api.id, url: api.url })
}

/// Extract the provider's human-readable error message, falling back to the
/// raw body when the envelope doesn't parse.
fn provider_error_message(body: &str) -> String {
    serde_json::from_str::<ErrorEnvelope>(body).map_or_else(|_| body.to_owned(), |envelope| envelope.error.message)
}
