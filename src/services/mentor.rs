//! Mentor role activation.
//!
//! Invoked only from the service-key-guarded route: an external workflow
//! (application review) calls in to flip the mentor flag once a candidate is
//! approved.

#[cfg(test)]
#[path = "mentor_test.rs"]
mod tests;

use sqlx::PgPool;
use uuid::Uuid;

use super::session::SessionUser;

#[derive(Debug, thiserror::Error)]
pub enum MentorError {
    #[error("user not found: {0}")]
    NotFound(Uuid),
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
}

impl crate::frame::ErrorCode for MentorError {
    fn error_code(&self) -> &'static str {
        match self {
            Self::NotFound(_) => "E_USER_NOT_FOUND",
            Self::Database(_) => "E_DATABASE",
        }
    }
}

/// Activate the mentor role for a user, returning the updated row.
/// Idempotent: re-activating an active mentor succeeds.
///
/// # Errors
///
/// `NotFound` for an unknown user id, or a database error.
pub async fn activate_mentor(pool: &PgPool, user_id: Uuid) -> Result<SessionUser, MentorError> {
    let row = sqlx::query_as::<_, (Uuid, String, Option<String>, bool)>(
        "UPDATE users SET is_mentor = TRUE WHERE id = $1 RETURNING id, name, avatar_url, is_mentor",
    )
    .bind(user_id)
    .fetch_optional(pool)
    .await?
    .ok_or(MentorError::NotFound(user_id))?;

    tracing::info!(%user_id, "mentor role activated");
    Ok(SessionUser { id: row.0, name: row.1, avatar_url: row.2, is_mentor: row.3 })
}
