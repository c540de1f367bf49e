//! # Message Repository
//!
//! Durable append-only log of the shared room's chat messages.
//!
//! The store assigns each message a unique id at append time; insertion order
//! (the rowid sequence) is the room's canonical ordering, so `recent` queries
//! and replay batches are always consistent with what was broadcast.

use super::models::MessageForCreate;
use super::DbPool;
use chrono::Utc;
use shared::dto::ChatMessage;
use sqlx::FromRow;

#[derive(FromRow)]
struct MessageRow {
    id: i64,
    user: String,
    avatar: Option<String>,
    text: String,
    file_path: Option<String>,
    created_at: String,
}

impl From<MessageRow> for ChatMessage {
    fn from(row: MessageRow) -> Self {
        ChatMessage {
            id: row.id,
            user: row.user,
            avatar: row.avatar.filter(|a| !a.is_empty()),
            text: row.text,
            file_path: row.file_path,
            created_at: row.created_at,
        }
    }
}

/// Message repository for the append-only room log.
pub struct MessageRepository;

impl MessageRepository {
    /// Append a message to the log.
    ///
    /// Stamps the creation timestamp server-side and returns the persisted
    /// record with its store-assigned id.
    pub async fn append(pool: &DbPool, data: MessageForCreate) -> Result<ChatMessage, sqlx::Error> {
        let created_at = Utc::now().to_rfc3339();

        let result = sqlx::query(
            "INSERT INTO messages (user, avatar, text, file_path, created_at) VALUES (?, ?, ?, ?, ?)"
        )
        .bind(&data.user)
        .bind(&data.avatar)
        .bind(&data.text)
        .bind(&data.file_path)
        .bind(&created_at)
        .execute(pool)
        .await?;

        let id = result.last_insert_rowid();

        let row = sqlx::query_as::<_, MessageRow>(
            "SELECT id, user, avatar, text, file_path, created_at FROM messages WHERE id = ?"
        )
        .bind(id)
        .fetch_one(pool)
        .await?;

        Ok(row.into())
    }

    /// Fetch a single message by id.
    pub async fn find_by_id(pool: &DbPool, id: i64) -> Result<Option<ChatMessage>, sqlx::Error> {
        let row = sqlx::query_as::<_, MessageRow>(
            "SELECT id, user, avatar, text, file_path, created_at FROM messages WHERE id = ?"
        )
        .bind(id)
        .fetch_optional(pool)
        .await?;

        Ok(row.map(Into::into))
    }

    /// Fetch the most recent `limit` messages, ordered oldest-first.
    ///
    /// The inner query selects the newest rows; the outer one flips them back
    /// into insertion order so clients can render the batch top-to-bottom.
    pub async fn recent(pool: &DbPool, limit: i64) -> Result<Vec<ChatMessage>, sqlx::Error> {
        let rows = sqlx::query_as::<_, MessageRow>(
            r#"
            SELECT id, user, avatar, text, file_path, created_at FROM (
                SELECT id, user, avatar, text, file_path, created_at
                FROM messages
                ORDER BY id DESC
                LIMIT ?
            )
            ORDER BY id ASC
            "#,
        )
        .bind(limit)
        .fetch_all(pool)
        .await?;

        Ok(rows.into_iter().map(Into::into).collect())
    }

    /// Delete a message by id.
    ///
    /// Returns `true` if a row was deleted, `false` if the id did not exist
    /// (a no-op, not an error).
    pub async fn delete_by_id(pool: &DbPool, id: i64) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM messages WHERE id = ?")
            .bind(id)
            .execute(pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}
