//! Payment types — provider-neutral records and errors.

use async_trait::async_trait;

// =============================================================================
// ERROR
// =============================================================================

/// Errors produced by payment gateway operations.
#[derive(Debug, thiserror::Error)]
pub enum PaymentError {
    /// The required secret key environment variable is not set.
    #[error("missing provider credential: env var {var} not set")]
    MissingSecretKey { var: String },

    /// The HTTP request to the provider failed.
    #[error("provider request failed: {0}")]
    ApiRequest(String),

    /// The provider returned a non-success HTTP status.
    #[error("{message}")]
    ApiResponse { status: u16, message: String },

    /// The provider response body could not be deserialized.
    #[error("provider response parse failed: {0}")]
    ApiParse(String),

    /// The underlying HTTP client could not be constructed.
    #[error("HTTP client build failed: {0}")]
    HttpClientBuild(String),
}

impl crate::frame::ErrorCode for PaymentError {
    fn error_code(&self) -> &'static str {
        match self {
            Self::MissingSecretKey { .. } => "E_MISSING_SECRET_KEY",
            Self::ApiRequest(_) => "E_API_REQUEST",
            Self::ApiResponse { .. } => "E_API_RESPONSE",
            Self::ApiParse(_) => "E_API_PARSE",
            Self::HttpClientBuild(_) => "E_HTTP_CLIENT_BUILD",
        }
    }
}

// =============================================================================
// RECORDS
// =============================================================================

/// A provider-side authorized-but-not-captured charge. The `client_secret`
/// is the opaque confirmation handle returned to the browser.
#[derive(Debug, Clone)]
pub struct PaymentIntent {
    pub id: String,
    pub client_secret: String,
}

/// A provider-hosted redirect checkout flow.
#[derive(Debug, Clone)]
pub struct CheckoutSession {
    pub id: String,
    pub url: String,
}

/// One line of a hosted checkout session: display name, unit price in minor
/// currency units, and quantity. No local total is computed for sessions —
/// the provider sums these itself.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionLineItem {
    pub name: String,
    pub unit_amount_cents: i64,
    pub quantity: u32,
}

// =============================================================================
// GATEWAY TRAIT
// =============================================================================

/// Seam between checkout routes and the hosted payment provider.
///
/// Every call maps to at most one provider API request; retries and
/// idempotency are the provider's/caller's concern, never this layer's.
#[async_trait]
pub trait PaymentGateway: Send + Sync {
    /// Create a payment intent for `amount_cents` in `currency`.
    async fn create_payment_intent(&self, amount_cents: i64, currency: &str) -> Result<PaymentIntent, PaymentError>;

    /// Create a hosted checkout session in payment mode.
    async fn create_checkout_session(
        &self,
        line_items: &[SessionLineItem],
        success_url: &str,
        cancel_url: &str,
    ) -> Result<CheckoutSession, PaymentError>;
}
