//! WebSocket handler — chat session and signaling relay.
//!
//! DESIGN
//! ======
//! On upgrade, generates a client ID and enters a `select!` loop:
//! - Incoming client frames → parse + dispatch by syscall prefix
//! - Broadcast frames from conversation peers → forward to client
//!
//! Handler functions are pure business logic — they validate, mutate session
//! state, and return an `Outcome`. The dispatch layer owns all outbound
//! concerns: reply to sender and broadcast to peers. Signal payloads are
//! relayed verbatim; the server never inspects SDP or ICE candidates.
//!
//! LIFECYCLE
//! =========
//! 1. Upgrade (one-time ticket) → mark online → send `session:connected`
//! 2. Client selects/opens a conversation → join its broadcast channel
//! 3. Chat + signaling frames flow until close
//! 4. Close → leave channel (evicting it if last) → mark offline

#[cfg(test)]
#[path = "ws_test.rs"]
mod tests;

use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use std::collections::HashMap;
use tokio::sync::mpsc;
use tracing::info;
use uuid::Uuid;

use crate::chat::ChatSession;
use crate::frame::{Data, ErrorCode, Frame};
use crate::routes::conversations::{broadcast_new_message, message_to_data};
use crate::services::conversation::{self, ConversationError, MessageType};
use crate::services::session as session_svc;
use crate::signaling;
use crate::state::AppState;

// =============================================================================
// OUTCOME
// =============================================================================

/// Result returned by handler functions. The dispatch layer uses this to
/// decide who receives what — handlers never send frames directly.
enum Outcome {
    /// Send done+data to sender only.
    Reply(Data),
    /// Send empty done to sender only.
    Done,
    /// Relay data to all conversation peers EXCLUDING sender. No reply.
    /// Used for signaling and typing (ephemeral, no persistence).
    RelayExcludeSender(Data),
}

#[derive(Debug, thiserror::Error)]
enum WsError {
    #[error("{0}")]
    BadRequest(String),
    #[error("no conversation selected")]
    NoSelection,
    #[error(transparent)]
    Conversation(#[from] ConversationError),
}

impl ErrorCode for WsError {
    fn error_code(&self) -> &'static str {
        match self {
            Self::BadRequest(_) => "E_BAD_REQUEST",
            Self::NoSelection => "E_NO_SELECTION",
            Self::Conversation(inner) => inner.error_code(),
        }
    }
}

// =============================================================================
// UPGRADE
// =============================================================================

pub async fn handle_ws(
    State(state): State<AppState>,
    Query(params): Query<HashMap<String, String>>,
    ws: WebSocketUpgrade,
) -> Response {
    let Some(ticket) = params.get("ticket") else {
        return (StatusCode::UNAUTHORIZED, "ticket required").into_response();
    };

    let user_id = match session_svc::consume_ws_ticket(&state.pool, ticket).await {
        Ok(Some(uid)) => uid,
        Ok(None) => return (StatusCode::UNAUTHORIZED, "invalid or expired ticket").into_response(),
        Err(e) => {
            tracing::error!(error = %e, "ws ticket validation failed");
            return (StatusCode::INTERNAL_SERVER_ERROR, "ticket validation error").into_response();
        }
    };

    ws.on_upgrade(move |socket| run_ws(socket, state, user_id))
}

// =============================================================================
// CONNECTION
// =============================================================================

async fn run_ws(mut socket: WebSocket, state: AppState, user_id: Uuid) {
    let client_id = Uuid::new_v4();

    // Per-connection queue for frames broadcast by conversation peers.
    let (client_tx, mut client_rx) = mpsc::channel::<Frame>(256);

    if let Err(e) = session_svc::set_online(&state.pool, user_id, true).await {
        tracing::warn!(error = %e, %user_id, "presence update failed");
    }

    let welcome = Frame::request("session:connected", Data::new())
        .with_data("client_id", client_id.to_string())
        .with_data("user_id", user_id.to_string());
    if send_frame(&mut socket, &welcome).await.is_err() {
        return;
    }

    info!(%client_id, %user_id, "ws: client connected");

    let mut session = ChatSession::new();

    loop {
        tokio::select! {
            msg = socket.recv() => {
                let Some(msg) = msg else { break };
                let Ok(msg) = msg else { break };
                match msg {
                    Message::Text(text) => {
                        let replies =
                            process_inbound_text(&state, &mut session, client_id, user_id, &client_tx, &text).await;
                        let mut closed = false;
                        for frame in replies {
                            if send_frame(&mut socket, &frame).await.is_err() {
                                closed = true;
                                break;
                            }
                        }
                        if closed {
                            break;
                        }
                    }
                    Message::Close(_) => break,
                    _ => {}
                }
            }
            Some(frame) = client_rx.recv() => {
                if send_frame(&mut socket, &frame).await.is_err() {
                    break;
                }
            }
        }
    }

    if let Some(conversation_id) = session.selected() {
        signaling::leave_channel(&state, conversation_id, client_id).await;
        session.clear_selection();
    }
    if let Err(e) = session_svc::set_online(&state.pool, user_id, false).await {
        tracing::warn!(error = %e, %user_id, "presence update failed");
    }
    info!(%client_id, "ws: client disconnected");
}

async fn send_frame(socket: &mut WebSocket, frame: &Frame) -> Result<(), axum::Error> {
    let Ok(text) = serde_json::to_string(frame) else {
        return Ok(());
    };
    socket.send(Message::Text(text.into())).await
}

// =============================================================================
// FRAME DISPATCH
// =============================================================================

fn done_with(req: &Frame, data: Data) -> Frame {
    let mut frame = req.done();
    frame.data = data;
    frame
}

/// Parse and process one inbound text frame and return frames for the sender.
///
/// Kept separate from the websocket transport so tests can exercise dispatch
/// end-to-end against seeded state.
async fn process_inbound_text(
    state: &AppState,
    session: &mut ChatSession,
    client_id: Uuid,
    user_id: Uuid,
    client_tx: &mpsc::Sender<Frame>,
    text: &str,
) -> Vec<Frame> {
    let Ok(req) = serde_json::from_str::<Frame>(text) else {
        tracing::warn!(%client_id, "ws: unparseable frame");
        return Vec::new();
    };

    let outcome = handle_frame(state, session, client_id, user_id, client_tx, &req).await;

    match outcome {
        Ok(Outcome::Reply(data)) => vec![done_with(&req, data)],
        Ok(Outcome::Done) => vec![req.done()],
        Ok(Outcome::RelayExcludeSender(data)) => {
            // Relays only occur with an active selection.
            if let Some(conversation_id) = session.selected() {
                let frame = Frame {
                    conversation_id: Some(conversation_id),
                    from: Some(user_id.to_string()),
                    data,
                    ..Frame::request(req.syscall.clone(), Data::new())
                };
                signaling::broadcast(state, conversation_id, &frame, Some(client_id)).await;
            }
            Vec::new()
        }
        Err(err) => vec![req.error_from(&err)],
    }
}

fn data_uuid(data: &Data, key: &str) -> Result<Uuid, WsError> {
    data.get(key)
        .and_then(|v| v.as_str())
        .and_then(|s| Uuid::parse_str(s).ok())
        .ok_or_else(|| WsError::BadRequest(format!("{key} is required")))
}

fn data_str<'a>(data: &'a Data, key: &str) -> Result<&'a str, WsError> {
    data.get(key)
        .and_then(|v| v.as_str())
        .ok_or_else(|| WsError::BadRequest(format!("{key} is required")))
}

async fn handle_frame(
    state: &AppState,
    session: &mut ChatSession,
    client_id: Uuid,
    user_id: Uuid,
    client_tx: &mpsc::Sender<Frame>,
    req: &Frame,
) -> Result<Outcome, WsError> {
    match req.syscall.as_str() {
        "conversation:select" => {
            let conversation_id = req
                .conversation_id
                .map_or_else(|| data_uuid(&req.data, "conversation_id"), Ok)?;
            select_conversation(state, session, client_id, user_id, client_tx, conversation_id).await
        }
        "conversation:open" => {
            let peer_id = data_uuid(&req.data, "user_id")?;
            if peer_id == user_id {
                return Err(WsError::BadRequest("cannot open a conversation with yourself".into()));
            }
            // Selection stays untouched until resolution succeeds.
            let conversation_id = conversation::resolve_or_create(&state.pool, user_id, peer_id).await?;
            select_conversation(state, session, client_id, user_id, client_tx, conversation_id).await
        }
        "sidebar:open" => {
            session.open_sidebar();
            Ok(Outcome::Done)
        }
        "sidebar:close" => {
            session.close_sidebar();
            Ok(Outcome::Done)
        }
        "signal:join" => {
            let conversation_id = session.selected().ok_or(WsError::NoSelection)?;
            let mut data = Data::new();
            data.insert("channel".into(), serde_json::json!(signaling::channel_name(conversation_id)));
            data.insert("ice_servers".into(), serde_json::json!(signaling::DEFAULT_ICE_SERVERS));
            Ok(Outcome::Reply(data))
        }
        "signal:leave" => Ok(Outcome::Done),
        "signal:offer" | "signal:answer" | "signal:ice" => {
            session.selected().ok_or(WsError::NoSelection)?;
            Ok(Outcome::RelayExcludeSender(req.data.clone()))
        }
        "typing:start" | "typing:stop" => {
            session.selected().ok_or(WsError::NoSelection)?;
            let mut data = req.data.clone();
            data.insert("user_id".into(), serde_json::json!(user_id));
            Ok(Outcome::RelayExcludeSender(data))
        }
        "message:send" => {
            let conversation_id = session.selected().ok_or(WsError::NoSelection)?;
            let content = data_str(&req.data, "content")?.trim();
            if content.is_empty() {
                return Err(WsError::BadRequest("content is required".into()));
            }
            let message_type = match req.data.get("message_type").and_then(|v| v.as_str()) {
                None => MessageType::Text,
                Some(raw) => MessageType::from_str(raw)
                    .ok_or_else(|| WsError::BadRequest(format!("invalid message_type: {raw}")))?,
            };

            let message =
                conversation::append_message(&state.pool, conversation_id, user_id, content, message_type).await?;
            broadcast_new_message(state, &message, Some(client_id)).await;
            Ok(Outcome::Reply(message_to_data(&message)))
        }
        other => Err(WsError::BadRequest(format!("unknown syscall: {other}"))),
    }
}

/// Verify membership, move the channel subscription, and perform the
/// `select` transition (which also closes the sidebar).
async fn select_conversation(
    state: &AppState,
    session: &mut ChatSession,
    client_id: Uuid,
    user_id: Uuid,
    client_tx: &mpsc::Sender<Frame>,
    conversation_id: Uuid,
) -> Result<Outcome, WsError> {
    conversation::ensure_participant(&state.pool, conversation_id, user_id).await?;

    if let Some(previous) = session.selected() {
        if previous != conversation_id {
            signaling::leave_channel(state, previous, client_id).await;
        }
    }
    let channel = signaling::join_channel(state, conversation_id, client_id, client_tx.clone()).await;
    session.select(conversation_id);

    let mut data = Data::new();
    data.insert("conversation_id".into(), serde_json::json!(conversation_id));
    data.insert("channel".into(), serde_json::json!(channel));
    Ok(Outcome::Reply(data))
}
