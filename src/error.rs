//! HTTP error taxonomy.
//!
//! DESIGN
//! ======
//! Every route handler returns `Result<_, ApiError>`; the `IntoResponse`
//! impl guarantees a structured JSON body for every failure instead of a
//! bare status or an unhandled fault. No variant triggers a retry anywhere —
//! each external call is attempted at most once per incoming request.

#[cfg(test)]
#[path = "error_test.rs"]
mod tests;

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};

use crate::payments::PaymentError;
use crate::services::conversation::ConversationError;
use crate::services::mentor::MentorError;
use crate::services::checkout::MIN_CHARGE_CENTS;

#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// Bad or missing request fields. 400.
    #[error("{0}")]
    Validation(String),

    /// Missing or incorrect credential. 401.
    #[error("{0}")]
    Authorization(String),

    /// Computed charge is positive but under the provider floor. 400, with
    /// the floor in the body so the caller can adjust.
    #[error("amount below the payment minimum")]
    MinimumAmount { min_cents: i64 },

    /// A required environment credential is absent. 500, raised before any
    /// external call is made.
    #[error("{0} is not configured")]
    NotConfigured(&'static str),

    /// The external provider rejected or failed a call. 500, provider
    /// message passed through.
    #[error("{0}")]
    Provider(String),

    /// Target resource does not exist. 404.
    #[error("not found")]
    NotFound,

    /// Forbidden resource access. 403.
    #[error("forbidden")]
    Forbidden,

    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
}

impl ApiError {
    #[must_use]
    pub fn status(&self) -> StatusCode {
        match self {
            Self::Validation(_) | Self::MinimumAmount { .. } => StatusCode::BAD_REQUEST,
            Self::Authorization(_) => StatusCode::UNAUTHORIZED,
            Self::Forbidden => StatusCode::FORBIDDEN,
            Self::NotFound => StatusCode::NOT_FOUND,
            Self::NotConfigured(_) | Self::Provider(_) | Self::Database(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::error!(error = %self, "request failed");
        }

        let body = match &self {
            #[allow(clippy::cast_precision_loss)]
            Self::MinimumAmount { min_cents } => serde_json::json!({
                "error": "MIN_AMOUNT",
                "minAmount": *min_cents as f64 / 100.0,
            }),
            other => serde_json::json!({ "error": other.to_string() }),
        };

        (status, Json(body)).into_response()
    }
}

/// Convenience constructor for the common below-floor rejection.
impl ApiError {
    #[must_use]
    pub fn minimum_amount() -> Self {
        Self::MinimumAmount { min_cents: MIN_CHARGE_CENTS }
    }
}

impl From<PaymentError> for ApiError {
    fn from(err: PaymentError) -> Self {
        match err {
            PaymentError::MissingSecretKey { .. } => Self::NotConfigured("payment provider"),
            other => Self::Provider(other.to_string()),
        }
    }
}

impl From<ConversationError> for ApiError {
    fn from(err: ConversationError) -> Self {
        match err {
            ConversationError::NotFound(_) => Self::NotFound,
            ConversationError::NotParticipant(_) => Self::Forbidden,
            ConversationError::Database(e) => Self::Database(e),
        }
    }
}

impl From<MentorError> for ApiError {
    fn from(err: MentorError) -> Self {
        match err {
            // The guarded route treats an unknown target user as a caller
            // mistake, not a missing resource.
            MentorError::NotFound(id) => Self::Validation(format!("unknown user: {id}")),
            MentorError::Database(e) => Self::Database(e),
        }
    }
}
