//! Conversation service — resolve/create, messages, unread counts.
//!
//! DESIGN
//! ======
//! Conversations are two-party threads created lazily: either when a chat is
//! opened against a user id with no prior thread, or on first message
//! exchange. They are never hard-deleted — archival is a status flag.
//! Messages are immutable once written except for the read flag; unread
//! counts live on the participant rows and are maintained inside the same
//! transaction as the message insert.

#[cfg(test)]
#[path = "conversation_test.rs"]
mod tests;

use std::collections::HashMap;

use sqlx::PgPool;
use sqlx::QueryBuilder;
use time::OffsetDateTime;
use uuid::Uuid;

// =============================================================================
// TYPES
// =============================================================================

#[derive(Debug, thiserror::Error)]
pub enum ConversationError {
    #[error("conversation not found: {0}")]
    NotFound(Uuid),
    #[error("user {0} is not a participant")]
    NotParticipant(Uuid),
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
}

impl crate::frame::ErrorCode for ConversationError {
    fn error_code(&self) -> &'static str {
        match self {
            Self::NotFound(_) => "E_CONVERSATION_NOT_FOUND",
            Self::NotParticipant(_) => "E_NOT_PARTICIPANT",
            Self::Database(_) => "E_DATABASE",
        }
    }
}

/// Kind of message payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MessageType {
    #[default]
    Text,
    Image,
    File,
}

impl MessageType {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Text => "text",
            Self::Image => "image",
            Self::File => "file",
        }
    }

    #[must_use]
    pub fn from_str(value: &str) -> Option<Self> {
        match value {
            "text" => Some(Self::Text),
            "image" => Some(Self::Image),
            "file" => Some(Self::File),
            _ => None,
        }
    }
}

/// One participant as shown in the conversation list.
#[derive(Debug, Clone)]
pub struct Participant {
    pub user_id: Uuid,
    pub name: String,
    pub avatar_url: Option<String>,
    pub is_online: bool,
    pub last_seen_at: OffsetDateTime,
}

/// A message row joined with its sender's display fields.
#[derive(Debug, Clone)]
pub struct MessageRow {
    pub id: Uuid,
    pub conversation_id: Uuid,
    pub sender_id: Uuid,
    pub sender_name: String,
    pub sender_avatar_url: Option<String>,
    pub content: String,
    pub message_type: String,
    pub read: bool,
    pub created_at: OffsetDateTime,
}

/// A conversation as shown in the list pane: participants, last message,
/// and the viewer's unread count.
#[derive(Debug, Clone)]
pub struct ConversationSummary {
    pub id: Uuid,
    pub archived: bool,
    pub updated_at: OffsetDateTime,
    pub unread_count: i32,
    pub participants: Vec<Participant>,
    pub last_message: Option<MessageRow>,
}

// =============================================================================
// RESOLVE / CREATE
// =============================================================================

/// Find the two-party conversation between `user_id` and `peer_id`, creating
/// it if none exists. Returns the conversation id.
///
/// # Errors
///
/// Returns `NotFound` if the peer user does not exist, or a database error.
pub async fn resolve_or_create(pool: &PgPool, user_id: Uuid, peer_id: Uuid) -> Result<Uuid, ConversationError> {
    let peer_exists: bool = sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM users WHERE id = $1)")
        .bind(peer_id)
        .fetch_one(pool)
        .await?;
    if !peer_exists {
        return Err(ConversationError::NotFound(peer_id));
    }

    let existing = sqlx::query_scalar::<_, Uuid>(
        "SELECT p1.conversation_id
         FROM conversation_participants p1
         JOIN conversation_participants p2 ON p2.conversation_id = p1.conversation_id
         WHERE p1.user_id = $1 AND p2.user_id = $2
           AND (SELECT COUNT(*) FROM conversation_participants p3
                WHERE p3.conversation_id = p1.conversation_id) = 2
         LIMIT 1",
    )
    .bind(user_id)
    .bind(peer_id)
    .fetch_optional(pool)
    .await?;

    if let Some(id) = existing {
        return Ok(id);
    }

    let id = Uuid::new_v4();
    let mut tx = pool.begin().await?;
    sqlx::query("INSERT INTO conversations (id) VALUES ($1)")
        .bind(id)
        .execute(&mut *tx)
        .await?;
    sqlx::query("INSERT INTO conversation_participants (conversation_id, user_id) VALUES ($1, $2), ($1, $3)")
        .bind(id)
        .bind(user_id)
        .bind(peer_id)
        .execute(&mut *tx)
        .await?;
    tx.commit().await?;

    tracing::info!(conversation_id = %id, %user_id, %peer_id, "created conversation");
    Ok(id)
}

/// Verify the conversation exists and `user_id` participates in it.
///
/// # Errors
///
/// `NotFound` for a missing conversation, `NotParticipant` otherwise.
pub async fn ensure_participant(pool: &PgPool, conversation_id: Uuid, user_id: Uuid) -> Result<(), ConversationError> {
    let exists: bool = sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM conversations WHERE id = $1)")
        .bind(conversation_id)
        .fetch_one(pool)
        .await?;
    if !exists {
        return Err(ConversationError::NotFound(conversation_id));
    }

    let participates: bool = sqlx::query_scalar(
        "SELECT EXISTS(SELECT 1 FROM conversation_participants WHERE conversation_id = $1 AND user_id = $2)",
    )
    .bind(conversation_id)
    .bind(user_id)
    .fetch_one(pool)
    .await?;
    if !participates {
        return Err(ConversationError::NotParticipant(user_id));
    }
    Ok(())
}

// =============================================================================
// LISTING
// =============================================================================

/// List the viewer's conversations, most recently updated first, each with
/// participants, last message, and the viewer's unread count.
///
/// # Errors
///
/// Returns a database error if any query fails.
pub async fn list_conversations(pool: &PgPool, user_id: Uuid) -> Result<Vec<ConversationSummary>, ConversationError> {
    let rows = sqlx::query_as::<_, (Uuid, bool, OffsetDateTime, i32)>(
        "SELECT c.id, c.archived, c.updated_at, p.unread_count
         FROM conversations c
         JOIN conversation_participants p ON p.conversation_id = c.id
         WHERE p.user_id = $1
         ORDER BY c.updated_at DESC",
    )
    .bind(user_id)
    .fetch_all(pool)
    .await?;

    let ids: Vec<Uuid> = rows.iter().map(|(id, ..)| *id).collect();
    let mut participants = load_participants(pool, &ids).await?;
    let mut last_messages = load_last_messages(pool, &ids).await?;

    Ok(rows
        .into_iter()
        .map(|(id, archived, updated_at, unread_count)| ConversationSummary {
            id,
            archived,
            updated_at,
            unread_count,
            participants: participants.remove(&id).unwrap_or_default(),
            last_message: last_messages.remove(&id),
        })
        .collect())
}

async fn load_participants(
    pool: &PgPool,
    conversation_ids: &[Uuid],
) -> Result<HashMap<Uuid, Vec<Participant>>, ConversationError> {
    if conversation_ids.is_empty() {
        return Ok(HashMap::new());
    }

    let mut builder = QueryBuilder::new(
        "SELECT p.conversation_id, u.id, u.name, u.avatar_url, u.is_online, u.last_seen_at
         FROM conversation_participants p
         JOIN users u ON u.id = p.user_id
         WHERE p.conversation_id IN (",
    );
    {
        let mut separated = builder.separated(", ");
        for id in conversation_ids {
            separated.push_bind(id);
        }
    }
    builder.push(") ORDER BY u.name ASC");

    let rows = builder
        .build_query_as::<(Uuid, Uuid, String, Option<String>, bool, OffsetDateTime)>()
        .fetch_all(pool)
        .await?;

    let mut out: HashMap<Uuid, Vec<Participant>> = HashMap::new();
    for (conversation_id, user_id, name, avatar_url, is_online, last_seen_at) in rows {
        out.entry(conversation_id)
            .or_default()
            .push(Participant { user_id, name, avatar_url, is_online, last_seen_at });
    }
    Ok(out)
}

async fn load_last_messages(
    pool: &PgPool,
    conversation_ids: &[Uuid],
) -> Result<HashMap<Uuid, MessageRow>, ConversationError> {
    if conversation_ids.is_empty() {
        return Ok(HashMap::new());
    }

    let mut builder = QueryBuilder::new(
        "SELECT conversation_id, id, sender_id, sender_name, sender_avatar_url, content, message_type, read, created_at
         FROM (
            SELECT m.conversation_id, m.id, m.sender_id, u.name AS sender_name,
                   u.avatar_url AS sender_avatar_url, m.content, m.message_type, m.read, m.created_at,
                   row_number() OVER (PARTITION BY m.conversation_id ORDER BY m.created_at DESC, m.id DESC) AS row_num
            FROM messages m
            JOIN users u ON u.id = m.sender_id
            WHERE m.conversation_id IN (",
    );
    {
        let mut separated = builder.separated(", ");
        for id in conversation_ids {
            separated.push_bind(id);
        }
    }
    builder.push(")
         ) ranked
         WHERE row_num = 1");

    let rows = builder
        .build_query_as::<(Uuid, Uuid, Uuid, String, Option<String>, String, String, bool, OffsetDateTime)>()
        .fetch_all(pool)
        .await?;

    let mut out = HashMap::new();
    for (conversation_id, id, sender_id, sender_name, sender_avatar_url, content, message_type, read, created_at) in
        rows
    {
        out.insert(
            conversation_id,
            MessageRow {
                id,
                conversation_id,
                sender_id,
                sender_name,
                sender_avatar_url,
                content,
                message_type,
                read,
                created_at,
            },
        );
    }
    Ok(out)
}

/// List a conversation's messages, oldest first.
///
/// # Errors
///
/// Propagates participant/permission errors and database failures.
pub async fn list_messages(
    pool: &PgPool,
    conversation_id: Uuid,
    user_id: Uuid,
) -> Result<Vec<MessageRow>, ConversationError> {
    ensure_participant(pool, conversation_id, user_id).await?;

    let rows = sqlx::query_as::<_, (Uuid, Uuid, String, Option<String>, String, String, bool, OffsetDateTime)>(
        "SELECT m.id, m.sender_id, u.name, u.avatar_url, m.content, m.message_type, m.read, m.created_at
         FROM messages m
         JOIN users u ON u.id = m.sender_id
         WHERE m.conversation_id = $1
         ORDER BY m.created_at ASC, m.id ASC",
    )
    .bind(conversation_id)
    .fetch_all(pool)
    .await?;

    Ok(rows
        .into_iter()
        .map(|(id, sender_id, sender_name, sender_avatar_url, content, message_type, read, created_at)| MessageRow {
            id,
            conversation_id,
            sender_id,
            sender_name,
            sender_avatar_url,
            content,
            message_type,
            read,
            created_at,
        })
        .collect())
}

// =============================================================================
// MUTATION
// =============================================================================

/// Append a message. Bumps the conversation's `updated_at` and increments
/// every other participant's unread count in the same transaction.
///
/// # Errors
///
/// Propagates participant/permission errors and database failures.
pub async fn append_message(
    pool: &PgPool,
    conversation_id: Uuid,
    sender_id: Uuid,
    content: &str,
    message_type: MessageType,
) -> Result<MessageRow, ConversationError> {
    ensure_participant(pool, conversation_id, sender_id).await?;

    let id = Uuid::new_v4();
    let mut tx = pool.begin().await?;

    let (created_at,): (OffsetDateTime,) = sqlx::query_as(
        "INSERT INTO messages (id, conversation_id, sender_id, content, message_type)
         VALUES ($1, $2, $3, $4, $5)
         RETURNING created_at",
    )
    .bind(id)
    .bind(conversation_id)
    .bind(sender_id)
    .bind(content)
    .bind(message_type.as_str())
    .fetch_one(&mut *tx)
    .await?;

    sqlx::query("UPDATE conversations SET updated_at = now() WHERE id = $1")
        .bind(conversation_id)
        .execute(&mut *tx)
        .await?;

    sqlx::query(
        "UPDATE conversation_participants SET unread_count = unread_count + 1
         WHERE conversation_id = $1 AND user_id <> $2",
    )
    .bind(conversation_id)
    .bind(sender_id)
    .execute(&mut *tx)
    .await?;

    let (sender_name, sender_avatar_url): (String, Option<String>) =
        sqlx::query_as("SELECT name, avatar_url FROM users WHERE id = $1")
            .bind(sender_id)
            .fetch_one(&mut *tx)
            .await?;

    tx.commit().await?;

    Ok(MessageRow {
        id,
        conversation_id,
        sender_id,
        sender_name,
        sender_avatar_url,
        content: content.to_owned(),
        message_type: message_type.as_str().to_owned(),
        read: false,
        created_at,
    })
}

/// Mark the conversation read for the viewer: zero their unread count and
/// flip the read flag on peers' messages.
///
/// # Errors
///
/// Propagates participant/permission errors and database failures.
pub async fn mark_read(pool: &PgPool, conversation_id: Uuid, user_id: Uuid) -> Result<(), ConversationError> {
    ensure_participant(pool, conversation_id, user_id).await?;

    let mut tx = pool.begin().await?;
    sqlx::query("UPDATE conversation_participants SET unread_count = 0 WHERE conversation_id = $1 AND user_id = $2")
        .bind(conversation_id)
        .bind(user_id)
        .execute(&mut *tx)
        .await?;
    sqlx::query("UPDATE messages SET read = TRUE WHERE conversation_id = $1 AND sender_id <> $2 AND NOT read")
        .bind(conversation_id)
        .bind(user_id)
        .execute(&mut *tx)
        .await?;
    tx.commit().await?;
    Ok(())
}

/// Set the archival flag. Archival never deletes rows.
///
/// # Errors
///
/// Propagates participant/permission errors and database failures.
pub async fn set_archived(
    pool: &PgPool,
    conversation_id: Uuid,
    user_id: Uuid,
    archived: bool,
) -> Result<(), ConversationError> {
    ensure_participant(pool, conversation_id, user_id).await?;

    sqlx::query("UPDATE conversations SET archived = $2 WHERE id = $1")
        .bind(conversation_id)
        .bind(archived)
        .execute(pool)
        .await?;
    Ok(())
}
