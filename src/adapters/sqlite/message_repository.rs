//! SQLite implementation of the MessageRepository.
//!
//! `upsert` is a single INSERT .. ON CONFLICT(id) statement whose update arm
//! touches only status and delivery bookkeeping, so a retried message can
//! never duplicate a row or rewrite its content.

use async_trait::async_trait;
use sqlx::SqlitePool;
use std::str::FromStr;
use uuid::Uuid;

use crate::adapters::sqlite::{parse_datetime, parse_optional_datetime, parse_uuid};
use crate::domain::errors::{DomainError, DomainResult};
use crate::domain::models::{Delivery, Message, MessageKind, MessageMetadata, MessageStatus};
use crate::domain::ports::MessageRepository;

const MESSAGE_COLUMNS: &str = "id, session_id, idx, kind, content, metadata, status, \
attempts, last_attempt_at, received_at, error, created_at";

#[derive(Clone)]
pub struct SqliteMessageRepository {
    pool: SqlitePool,
}

impl SqliteMessageRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl MessageRepository for SqliteMessageRepository {
    async fn upsert(&self, message: &Message) -> DomainResult<()> {
        let metadata_json = serde_json::to_string(&message.metadata)?;

        sqlx::query(
            r#"INSERT INTO messages (id, session_id, idx, kind, content, metadata, status, attempts, last_attempt_at, received_at, error, created_at)
               VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
               ON CONFLICT(id) DO UPDATE SET
                   status = excluded.status,
                   attempts = excluded.attempts,
                   last_attempt_at = excluded.last_attempt_at,
                   received_at = excluded.received_at,
                   error = excluded.error"#,
        )
        .bind(message.id.to_string())
        .bind(message.session_id.to_string())
        .bind(i64::from(message.index))
        .bind(message.kind.as_str())
        .bind(&message.content)
        .bind(&metadata_json)
        .bind(message.status.as_str())
        .bind(i64::from(message.delivery.attempts))
        .bind(message.delivery.last_attempt_at.map(|t| t.to_rfc3339()))
        .bind(message.delivery.received_at.map(|t| t.to_rfc3339()))
        .bind(&message.delivery.error)
        .bind(message.created_at.to_rfc3339())
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn get(&self, id: Uuid) -> DomainResult<Option<Message>> {
        let row: Option<MessageRow> = sqlx::query_as(&format!(
            "SELECT {MESSAGE_COLUMNS} FROM messages WHERE id = ?"
        ))
        .bind(id.to_string())
        .fetch_optional(&self.pool)
        .await?;

        row.map(TryInto::try_into).transpose()
    }

    async fn list_by_session(&self, session_id: Uuid) -> DomainResult<Vec<Message>> {
        let rows: Vec<MessageRow> = sqlx::query_as(&format!(
            "SELECT {MESSAGE_COLUMNS} FROM messages WHERE session_id = ? ORDER BY idx"
        ))
        .bind(session_id.to_string())
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(TryInto::try_into).collect()
    }

    async fn delete_by_session(&self, session_id: Uuid) -> DomainResult<u64> {
        let result = sqlx::query("DELETE FROM messages WHERE session_id = ?")
            .bind(session_id.to_string())
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected())
    }

    async fn count_by_session(&self, session_id: Uuid) -> DomainResult<u32> {
        let (count,): (i64,) =
            sqlx::query_as("SELECT COUNT(*) FROM messages WHERE session_id = ?")
                .bind(session_id.to_string())
                .fetch_one(&self.pool)
                .await?;
        Ok(u32::try_from(count).unwrap_or(0))
    }
}

#[derive(sqlx::FromRow)]
struct MessageRow {
    id: String,
    session_id: String,
    idx: i64,
    kind: String,
    content: String,
    metadata: String,
    status: String,
    attempts: i64,
    last_attempt_at: Option<String>,
    received_at: Option<String>,
    error: Option<String>,
    created_at: String,
}

impl TryFrom<MessageRow> for Message {
    type Error = DomainError;

    fn try_from(row: MessageRow) -> Result<Self, Self::Error> {
        let kind = MessageKind::from_str(&row.kind).map_err(DomainError::SerializationError)?;
        let status =
            MessageStatus::from_str(&row.status).map_err(DomainError::SerializationError)?;
        let metadata: MessageMetadata = serde_json::from_str(&row.metadata)?;

        Ok(Message {
            id: parse_uuid(&row.id)?,
            session_id: parse_uuid(&row.session_id)?,
            index: u32::try_from(row.idx).unwrap_or(0),
            kind,
            content: row.content,
            metadata,
            status,
            delivery: Delivery {
                attempts: u32::try_from(row.attempts).unwrap_or(0),
                last_attempt_at: parse_optional_datetime(row.last_attempt_at)?,
                received_at: parse_optional_datetime(row.received_at)?,
                error: row.error,
            },
            created_at: parse_datetime(&row.created_at)?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::sqlite::{create_migrated_test_pool, SqliteSessionRepository};
    use crate::domain::models::{MessageDraft, QuestionBank, Session};
    use crate::domain::ports::SessionRepository;

    async fn setup() -> (SqliteMessageRepository, Session) {
        let pool = create_migrated_test_pool().await.unwrap();
        let sessions = SqliteSessionRepository::new(pool.clone());
        let session = Session::new("alice", &QuestionBank::default());
        sessions.insert(&session).await.unwrap();
        (SqliteMessageRepository::new(pool), session)
    }

    #[tokio::test]
    async fn test_upsert_and_get_round_trips() {
        let (repo, session) = setup().await;
        let mut message = Message::from_draft(
            MessageDraft::user("Bachelor's degree"),
            session.id,
            0,
        );
        message.mark_sent();

        repo.upsert(&message).await.unwrap();

        let retrieved = repo.get(message.id).await.unwrap().unwrap();
        assert_eq!(retrieved.content, "Bachelor's degree");
        assert_eq!(retrieved.status, MessageStatus::Sent);
        assert_eq!(retrieved.delivery.attempts, 1);
        assert!(retrieved.delivery.received_at.is_some());
    }

    #[tokio::test]
    async fn test_upsert_conflict_updates_status_not_content() {
        let (repo, session) = setup().await;
        let mut message = Message::from_draft(MessageDraft::user("original"), session.id, 0);
        message.mark_failed("boom");
        repo.upsert(&message).await.unwrap();

        // Retry path re-persists the same id; content in the struct is
        // unchanged by contract, only bookkeeping moves.
        message.begin_retry().unwrap();
        message.mark_sent();
        repo.upsert(&message).await.unwrap();

        let retrieved = repo.get(message.id).await.unwrap().unwrap();
        assert_eq!(retrieved.content, "original");
        assert_eq!(retrieved.status, MessageStatus::Sent);
        assert_eq!(retrieved.delivery.attempts, 2);
        assert!(retrieved.delivery.error.is_none());

        assert_eq!(repo.count_by_session(session.id).await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_list_by_session_orders_by_index() {
        let (repo, session) = setup().await;
        for index in [2u32, 0, 1] {
            let message = Message::from_draft(
                MessageDraft::bot(format!("turn {index}")),
                session.id,
                index,
            );
            repo.upsert(&message).await.unwrap();
        }

        let messages = repo.list_by_session(session.id).await.unwrap();
        let indices: Vec<u32> = messages.iter().map(|m| m.index).collect();
        assert_eq!(indices, vec![0, 1, 2]);
    }

    #[tokio::test]
    async fn test_duplicate_index_is_rejected() {
        let (repo, session) = setup().await;
        let first = Message::from_draft(MessageDraft::user("a"), session.id, 0);
        let second = Message::from_draft(MessageDraft::user("b"), session.id, 0);

        repo.upsert(&first).await.unwrap();
        assert!(repo.upsert(&second).await.is_err());
    }

    #[tokio::test]
    async fn test_delete_by_session_reports_count() {
        let (repo, session) = setup().await;
        for index in 0..3 {
            let message =
                Message::from_draft(MessageDraft::user(format!("m{index}")), session.id, index);
            repo.upsert(&message).await.unwrap();
        }

        assert_eq!(repo.delete_by_session(session.id).await.unwrap(), 3);
        assert!(repo.list_by_session(session.id).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_metadata_round_trips_payload() {
        let (repo, session) = setup().await;
        let metadata = MessageMetadata {
            suggestions: vec!["Option A".to_string()],
            category: Some(crate::domain::models::Category::Skills),
            payload: Some(serde_json::json!({"recommendations": []})),
        };
        let message = Message::from_draft(
            MessageDraft::bot("question").with_metadata(metadata.clone()),
            session.id,
            0,
        );
        repo.upsert(&message).await.unwrap();

        let retrieved = repo.get(message.id).await.unwrap().unwrap();
        assert_eq!(retrieved.metadata, metadata);
    }
}
