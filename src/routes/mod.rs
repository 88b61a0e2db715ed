//! Router assembly.
//!
//! SYSTEM CONTEXT
//! ==============
//! Binds the HTTP API and the websocket endpoint under a single Axum router.
//! The browser app is hosted elsewhere; this process serves `/api` and
//! `/healthz` only, with permissive CORS for the app origin.

pub mod auth;
pub mod checkout;
pub mod conversations;
pub mod csp;
pub mod numerology;
pub mod roles;
pub mod ws;

use axum::Router;
use axum::http::StatusCode;
use axum::routing::{get, patch, post};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::state::AppState;

pub fn app(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/api/checkout-intent", post(checkout::create_intent))
        .route("/api/checkout", post(checkout::create_session))
        .route("/api/validate-card", post(checkout::validate_card))
        .route("/api/csp-report", post(csp::report))
        .route("/api/roles/activate-mentor", post(roles::activate_mentor))
        .route("/api/auth/me", get(auth::me))
        .route("/api/auth/logout", post(auth::logout))
        .route("/api/auth/ws-ticket", post(auth::ws_ticket))
        .route("/api/auth/{platform}", get(auth::platform_redirect))
        .route(
            "/api/conversations",
            get(conversations::list_conversations).post(conversations::open_conversation),
        )
        .route(
            "/api/conversations/{id}",
            patch(conversations::set_archived),
        )
        .route(
            "/api/conversations/{id}/messages",
            get(conversations::list_messages).post(conversations::send_message),
        )
        .route("/api/conversations/{id}/read", post(conversations::mark_read))
        .route("/api/numerology/life-path", get(numerology::life_path))
        .route("/api/ws", get(ws::handle_ws))
        .route("/healthz", get(healthz))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn healthz() -> StatusCode {
    StatusCode::OK
}
