//! CSP violation report sink.
//!
//! Browsers post reports with a `application/csp-report` content type and an
//! arbitrary body shape, so the handler takes raw bytes and parses leniently.
//! The sink never fails the client: malformed reports are still 204.

#[cfg(test)]
#[path = "csp_test.rs"]
mod tests;

use axum::body::Bytes;
use axum::http::StatusCode;

/// `POST /api/csp-report` — log a browser security-policy violation.
pub async fn report(body: Bytes) -> StatusCode {
    log_report(&body);
    StatusCode::NO_CONTENT
}

pub(crate) fn log_report(body: &[u8]) {
    match serde_json::from_slice::<serde_json::Value>(body) {
        Ok(value) => {
            let report = value.get("csp-report").unwrap_or(&value);
            let directive = report
                .get("violated-directive")
                .and_then(|v| v.as_str())
                .unwrap_or("unknown");
            let blocked = report
                .get("blocked-uri")
                .and_then(|v| v.as_str())
                .unwrap_or("unknown");
            tracing::warn!(directive, blocked, "csp violation reported");
        }
        Err(_) => {
            tracing::warn!(bytes = body.len(), "unparseable csp report");
        }
    }
}
