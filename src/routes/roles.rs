//! Role routes — service-to-service mentor activation.
//!
//! The caller is a trusted external workflow, not a browser session, so the
//! guard is a shared service key in the `x-service-key` header rather than a
//! cookie. Configuration is checked before anything else: an unset key is a
//! deployment fault and must not read as "unauthorized".

#[cfg(test)]
#[path = "roles_test.rs"]
mod tests;

use axum::extract::State;
use axum::http::HeaderMap;
use axum::response::Json;
use serde::Deserialize;
use uuid::Uuid;

use crate::error::ApiError;
use crate::services::mentor;
use crate::state::AppState;

const SERVICE_KEY_HEADER: &str = "x-service-key";

#[derive(Deserialize)]
pub struct ActivateMentorBody {
    #[serde(rename = "userId")]
    pub user_id: Option<String>,
}

pub(crate) fn check_service_key(configured: Option<&str>, headers: &HeaderMap) -> Result<(), ApiError> {
    let Some(expected) = configured else {
        return Err(ApiError::NotConfigured("service key"));
    };

    let presented = headers
        .get(SERVICE_KEY_HEADER)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default();
    if presented.is_empty() {
        return Err(ApiError::Authorization("missing service key".into()));
    }
    if presented != expected {
        return Err(ApiError::Authorization("invalid service key".into()));
    }
    Ok(())
}

pub(crate) fn parse_user_id(body: &ActivateMentorBody) -> Result<Uuid, ApiError> {
    let raw = body
        .user_id
        .as_deref()
        .ok_or_else(|| ApiError::Validation("userId is required".into()))?;
    Uuid::parse_str(raw).map_err(|_| ApiError::Validation(format!("invalid userId: {raw}")))
}

/// `POST /api/roles/activate-mentor` — flag a user as mentor.
pub async fn activate_mentor(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(body): Json<ActivateMentorBody>,
) -> Result<Json<serde_json::Value>, ApiError> {
    check_service_key(state.config.service_key.as_deref(), &headers)?;
    let user_id = parse_user_id(&body)?;

    let user = mentor::activate_mentor(&state.pool, user_id).await?;
    Ok(Json(serde_json::json!({ "ok": true, "user": user })))
}
