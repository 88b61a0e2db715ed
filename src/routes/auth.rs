//! Auth routes — session extractor, social OAuth hand-off, WS tickets.

#[cfg(test)]
#[path = "auth_test.rs"]
mod tests;

use axum::extract::{FromRef, Path, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Json, Redirect, Response};
use axum_extra::extract::cookie::{Cookie, CookieJar};
use time::Duration;

use crate::error::ApiError;
use crate::services::session;
use crate::state::AppState;

const COOKIE_NAME: &str = "session_token";
const OAUTH_STATE_COOKIE_NAME: &str = "oauth_state";

pub(crate) fn env_bool(key: &str) -> Option<bool> {
    std::env::var(key)
        .ok()
        .and_then(|raw| match raw.trim().to_ascii_lowercase().as_str() {
            "1" | "true" | "yes" | "on" => Some(true),
            "0" | "false" | "no" | "off" => Some(false),
            _ => None,
        })
}

pub(crate) fn cookie_secure() -> bool {
    if let Some(value) = env_bool("COOKIE_SECURE") {
        return value;
    }

    std::env::var("APP_BASE_URL")
        .map(|url| url.starts_with("https://"))
        .unwrap_or(false)
}

// =============================================================================
// AUTH EXTRACTOR
// =============================================================================

/// Authenticated user extracted from the session cookie.
/// Use as a handler parameter to require authentication.
pub struct AuthUser {
    pub user: session::SessionUser,
    pub token: String,
}

impl<S> axum::extract::FromRequestParts<S> for AuthUser
where
    AppState: FromRef<S>,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut axum::http::request::Parts, state: &S) -> Result<Self, Self::Rejection> {
        let jar = CookieJar::from_headers(&parts.headers);
        let token = jar.get(COOKIE_NAME).map(Cookie::value).unwrap_or_default();
        if token.is_empty() {
            return Err(ApiError::Authorization("missing session".into()));
        }

        let app_state = AppState::from_ref(state);
        let user = session::validate_session(&app_state.pool, token)
            .await?
            .ok_or_else(|| ApiError::Authorization("invalid or expired session".into()))?;

        Ok(Self { user, token: token.to_owned() })
    }
}

// =============================================================================
// SOCIAL PLATFORMS
// =============================================================================

/// Social platform supported by the OAuth hand-off route.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Platform {
    Instagram,
    Facebook,
    Tiktok,
    Linkedin,
}

impl Platform {
    #[must_use]
    pub fn from_str(value: &str) -> Option<Self> {
        match value {
            "instagram" => Some(Self::Instagram),
            "facebook" => Some(Self::Facebook),
            "tiktok" => Some(Self::Tiktok),
            "linkedin" => Some(Self::Linkedin),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Instagram => "instagram",
            Self::Facebook => "facebook",
            Self::Tiktok => "tiktok",
            Self::Linkedin => "linkedin",
        }
    }

    /// Environment variable holding this platform's OAuth client id.
    #[must_use]
    pub fn client_id_var(self) -> &'static str {
        match self {
            Self::Instagram => "INSTAGRAM_CLIENT_ID",
            Self::Facebook => "FACEBOOK_CLIENT_ID",
            Self::Tiktok => "TIKTOK_CLIENT_KEY",
            Self::Linkedin => "LINKEDIN_CLIENT_ID",
        }
    }

    /// Build the platform's authorization URL.
    #[must_use]
    pub fn authorize_url(self, client_id: &str, redirect_uri: &str, state: &str) -> String {
        match self {
            Self::Instagram => format!(
                "https://api.instagram.com/oauth/authorize?client_id={client_id}&redirect_uri={redirect_uri}&scope=user_profile,user_media&response_type=code&state={state}"
            ),
            Self::Facebook => format!(
                "https://www.facebook.com/v18.0/dialog/oauth?client_id={client_id}&redirect_uri={redirect_uri}&scope=public_profile&response_type=code&state={state}"
            ),
            Self::Tiktok => format!(
                "https://www.tiktok.com/v2/auth/authorize?client_key={client_id}&redirect_uri={redirect_uri}&scope=user.info.basic&response_type=code&state={state}"
            ),
            Self::Linkedin => format!(
                "https://www.linkedin.com/oauth/v2/authorization?client_id={client_id}&redirect_uri={redirect_uri}&scope=openid%20profile&response_type=code&state={state}"
            ),
        }
    }
}

// =============================================================================
// HANDLERS
// =============================================================================

/// `GET /api/auth/:platform` — set a CSRF state cookie and redirect to the
/// platform's authorization page.
pub async fn platform_redirect(
    State(state): State<AppState>,
    Path(platform): Path<String>,
) -> Result<Response, ApiError> {
    let Some(platform) = Platform::from_str(&platform) else {
        return Err(ApiError::Validation(format!("unsupported platform: {platform}")));
    };

    let client_id =
        std::env::var(platform.client_id_var()).map_err(|_| ApiError::NotConfigured("oauth client id"))?;
    let base_url = state
        .config
        .base_url
        .as_deref()
        .ok_or(ApiError::NotConfigured("APP_BASE_URL"))?;
    let redirect_uri = format!("{base_url}/api/auth/{}/callback", platform.as_str());

    let oauth_state = session::generate_token();
    let secure = cookie_secure();
    let cookie = Cookie::build((OAUTH_STATE_COOKIE_NAME, oauth_state.clone()))
        .path("/")
        .http_only(true)
        .same_site(axum_extra::extract::cookie::SameSite::Lax)
        .secure(secure)
        .max_age(Duration::minutes(10));

    let jar = CookieJar::new().add(cookie);
    let url = platform.authorize_url(&client_id, &redirect_uri, &oauth_state);
    Ok((jar, Redirect::temporary(&url)).into_response())
}

/// `GET /api/auth/me` — return current user.
pub async fn me(auth: AuthUser) -> Json<session::SessionUser> {
    Json(auth.user)
}

/// `POST /api/auth/logout` — delete session, clear cookie.
pub async fn logout(State(state): State<AppState>, auth: AuthUser) -> impl IntoResponse {
    let _ = session::delete_session(&state.pool, &auth.token).await;

    let secure = cookie_secure();
    let cookie = Cookie::build((COOKIE_NAME, ""))
        .path("/")
        .http_only(true)
        .same_site(axum_extra::extract::cookie::SameSite::Lax)
        .secure(secure)
        .max_age(Duration::ZERO);

    let jar = CookieJar::new().add(cookie);
    (jar, StatusCode::NO_CONTENT)
}

/// `POST /api/auth/ws-ticket` — mint a one-time websocket ticket.
pub async fn ws_ticket(State(state): State<AppState>, auth: AuthUser) -> Result<Json<serde_json::Value>, ApiError> {
    let ticket = session::create_ws_ticket(&state.pool, auth.user.id).await?;
    Ok(Json(serde_json::json!({ "ticket": ticket })))
}
