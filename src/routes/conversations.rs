//! Conversation routes — list, open, messages, read receipts, archival.

#[cfg(test)]
#[path = "conversations_test.rs"]
mod tests;

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::Json;
use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use uuid::Uuid;

use crate::error::ApiError;
use crate::frame::{Frame, Status};
use crate::routes::auth::AuthUser;
use crate::services::conversation::{self, ConversationSummary, MessageRow, MessageType, Participant};
use crate::signaling;
use crate::state::AppState;

// =============================================================================
// RESPONSE SHAPES
// =============================================================================

#[allow(clippy::cast_possible_truncation)]
pub(crate) fn ms(t: OffsetDateTime) -> i64 {
    (t.unix_timestamp_nanos() / 1_000_000) as i64
}

#[derive(Serialize)]
pub struct ParticipantResponse {
    pub user_id: Uuid,
    pub name: String,
    pub avatar_url: Option<String>,
    pub is_online: bool,
    pub last_seen_ms: i64,
}

#[derive(Serialize)]
pub struct MessageResponse {
    pub id: Uuid,
    pub conversation_id: Uuid,
    pub sender_id: Uuid,
    pub sender_name: String,
    pub sender_avatar_url: Option<String>,
    pub content: String,
    pub message_type: String,
    pub read: bool,
    pub ts: i64,
}

#[derive(Serialize)]
pub struct ConversationResponse {
    pub id: Uuid,
    pub archived: bool,
    pub updated_ms: i64,
    pub unread_count: i32,
    pub participants: Vec<ParticipantResponse>,
    pub last_message: Option<MessageResponse>,
}

fn participant_to_response(p: Participant) -> ParticipantResponse {
    ParticipantResponse {
        user_id: p.user_id,
        name: p.name,
        avatar_url: p.avatar_url,
        is_online: p.is_online,
        last_seen_ms: ms(p.last_seen_at),
    }
}

pub(crate) fn message_to_response(m: MessageRow) -> MessageResponse {
    MessageResponse {
        id: m.id,
        conversation_id: m.conversation_id,
        sender_id: m.sender_id,
        sender_name: m.sender_name,
        sender_avatar_url: m.sender_avatar_url,
        content: m.content,
        message_type: m.message_type,
        read: m.read,
        ts: ms(m.created_at),
    }
}

fn summary_to_response(summary: ConversationSummary) -> ConversationResponse {
    ConversationResponse {
        id: summary.id,
        archived: summary.archived,
        updated_ms: ms(summary.updated_at),
        unread_count: summary.unread_count,
        participants: summary.participants.into_iter().map(participant_to_response).collect(),
        last_message: summary.last_message.map(message_to_response),
    }
}

/// Flatten a message into broadcast frame data.
pub(crate) fn message_to_data(message: &MessageRow) -> crate::frame::Data {
    match serde_json::to_value(message_to_response(message.clone())) {
        Ok(serde_json::Value::Object(map)) => map.into_iter().collect(),
        _ => crate::frame::Data::new(),
    }
}

/// Push a freshly persisted message to the conversation's live channel.
pub(crate) async fn broadcast_new_message(state: &AppState, message: &MessageRow, exclude: Option<Uuid>) {
    let frame = Frame {
        id: Uuid::new_v4(),
        parent_id: None,
        ts: ms(message.created_at),
        conversation_id: Some(message.conversation_id),
        from: Some(message.sender_id.to_string()),
        syscall: "message:new".to_owned(),
        status: Status::Done,
        data: message_to_data(message),
    };
    signaling::broadcast(state, message.conversation_id, &frame, exclude).await;
}

// =============================================================================
// HANDLERS
// =============================================================================

/// `GET /api/conversations` — the viewer's conversation list.
pub async fn list_conversations(
    State(state): State<AppState>,
    auth: AuthUser,
) -> Result<Json<Vec<ConversationResponse>>, ApiError> {
    let summaries = conversation::list_conversations(&state.pool, auth.user.id).await?;
    Ok(Json(summaries.into_iter().map(summary_to_response).collect()))
}

#[derive(Deserialize)]
pub struct OpenConversationBody {
    #[serde(rename = "userId")]
    pub user_id: Option<String>,
}

/// `POST /api/conversations` — resolve or create the thread with a peer.
pub async fn open_conversation(
    State(state): State<AppState>,
    auth: AuthUser,
    Json(body): Json<OpenConversationBody>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let raw = body
        .user_id
        .as_deref()
        .ok_or_else(|| ApiError::Validation("userId is required".into()))?;
    let peer_id = Uuid::parse_str(raw).map_err(|_| ApiError::Validation(format!("invalid userId: {raw}")))?;
    if peer_id == auth.user.id {
        return Err(ApiError::Validation("cannot open a conversation with yourself".into()));
    }

    let id = conversation::resolve_or_create(&state.pool, auth.user.id, peer_id)
        .await
        .map_err(|err| match err {
            // An unknown peer is a caller mistake on this route.
            conversation::ConversationError::NotFound(_) => ApiError::Validation(format!("unknown user: {peer_id}")),
            other => other.into(),
        })?;
    Ok(Json(serde_json::json!({ "id": id })))
}

/// `GET /api/conversations/:id/messages` — full message history, oldest first.
pub async fn list_messages(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(conversation_id): Path<Uuid>,
) -> Result<Json<Vec<MessageResponse>>, ApiError> {
    let rows = conversation::list_messages(&state.pool, conversation_id, auth.user.id).await?;
    Ok(Json(rows.into_iter().map(message_to_response).collect()))
}

#[derive(Deserialize)]
pub struct SendMessageBody {
    pub content: Option<String>,
    #[serde(rename = "messageType")]
    pub message_type: Option<String>,
}

pub(crate) fn parse_send_body(body: &SendMessageBody) -> Result<(&str, MessageType), ApiError> {
    let content = body
        .content
        .as_deref()
        .map(str::trim)
        .filter(|c| !c.is_empty())
        .ok_or_else(|| ApiError::Validation("content is required".into()))?;

    let message_type = match body.message_type.as_deref() {
        None => MessageType::Text,
        Some(raw) => MessageType::from_str(raw)
            .ok_or_else(|| ApiError::Validation(format!("invalid messageType: {raw}")))?,
    };

    Ok((content, message_type))
}

/// `POST /api/conversations/:id/messages` — append and broadcast a message.
pub async fn send_message(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(conversation_id): Path<Uuid>,
    Json(body): Json<SendMessageBody>,
) -> Result<(StatusCode, Json<MessageResponse>), ApiError> {
    let (content, message_type) = parse_send_body(&body)?;

    let message = conversation::append_message(&state.pool, conversation_id, auth.user.id, content, message_type).await?;
    broadcast_new_message(&state, &message, None).await;

    Ok((StatusCode::CREATED, Json(message_to_response(message))))
}

/// `POST /api/conversations/:id/read` — mark the thread read for the viewer.
pub async fn mark_read(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(conversation_id): Path<Uuid>,
) -> Result<Json<serde_json::Value>, ApiError> {
    conversation::mark_read(&state.pool, conversation_id, auth.user.id).await?;
    Ok(Json(serde_json::json!({ "ok": true })))
}

#[derive(Deserialize)]
pub struct ArchiveBody {
    pub archived: bool,
}

/// `PATCH /api/conversations/:id` — set the archival flag.
pub async fn set_archived(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(conversation_id): Path<Uuid>,
    Json(body): Json<ArchiveBody>,
) -> Result<Json<serde_json::Value>, ApiError> {
    conversation::set_archived(&state.pool, conversation_id, auth.user.id, body.archived).await?;
    Ok(Json(serde_json::json!({ "ok": true })))
}
