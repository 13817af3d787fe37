//! SQLite implementation of the SessionRepository.

use async_trait::async_trait;
use sqlx::SqlitePool;
use std::collections::HashMap;
use uuid::Uuid;

use crate::adapters::sqlite::{parse_datetime, parse_uuid};
use crate::domain::errors::{DomainError, DomainResult};
use crate::domain::models::{Category, Session, SessionMetadata, SessionStatus};
use crate::domain::ports::SessionRepository;

const SESSION_COLUMNS: &str =
    "id, owner_id, status, metadata, progress_data, total_messages, created_at, updated_at";

#[derive(Clone)]
pub struct SqliteSessionRepository {
    pool: SqlitePool,
}

impl SqliteSessionRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl SessionRepository for SqliteSessionRepository {
    async fn insert(&self, session: &Session) -> DomainResult<()> {
        let metadata_json = serde_json::to_string(&session.metadata)?;
        let progress_json = serde_json::to_string(&session.progress_data)?;

        sqlx::query(
            r#"INSERT INTO sessions (id, owner_id, status, metadata, progress_data, total_messages, created_at, updated_at)
               VALUES (?, ?, ?, ?, ?, ?, ?, ?)"#,
        )
        .bind(session.id.to_string())
        .bind(&session.owner_id)
        .bind(session.status.as_str())
        .bind(&metadata_json)
        .bind(&progress_json)
        .bind(i64::from(session.total_messages))
        .bind(session.created_at.to_rfc3339())
        .bind(session.updated_at.to_rfc3339())
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn update(&self, session: &Session) -> DomainResult<()> {
        let metadata_json = serde_json::to_string(&session.metadata)?;
        let progress_json = serde_json::to_string(&session.progress_data)?;

        let result = sqlx::query(
            r#"UPDATE sessions SET status = ?, metadata = ?, progress_data = ?,
               total_messages = ?, updated_at = ?
               WHERE id = ?"#,
        )
        .bind(session.status.as_str())
        .bind(&metadata_json)
        .bind(&progress_json)
        .bind(i64::from(session.total_messages))
        .bind(session.updated_at.to_rfc3339())
        .bind(session.id.to_string())
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DomainError::SessionNotFound(session.id));
        }

        Ok(())
    }

    async fn get(&self, id: Uuid) -> DomainResult<Option<Session>> {
        let row: Option<SessionRow> = sqlx::query_as(&format!(
            "SELECT {SESSION_COLUMNS} FROM sessions WHERE id = ?"
        ))
        .bind(id.to_string())
        .fetch_optional(&self.pool)
        .await?;

        row.map(TryInto::try_into).transpose()
    }

    async fn find_active_by_owner(&self, owner_id: &str) -> DomainResult<Option<Session>> {
        let row: Option<SessionRow> = sqlx::query_as(&format!(
            "SELECT {SESSION_COLUMNS} FROM sessions
             WHERE owner_id = ? AND status = 'active'
             ORDER BY updated_at DESC LIMIT 1"
        ))
        .bind(owner_id)
        .fetch_optional(&self.pool)
        .await?;

        row.map(TryInto::try_into).transpose()
    }

    async fn list_by_owner(&self, owner_id: &str) -> DomainResult<Vec<Session>> {
        let rows: Vec<SessionRow> = sqlx::query_as(&format!(
            "SELECT {SESSION_COLUMNS} FROM sessions
             WHERE owner_id = ? ORDER BY updated_at DESC"
        ))
        .bind(owner_id)
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(TryInto::try_into).collect()
    }

    async fn delete(&self, id: Uuid) -> DomainResult<()> {
        let result = sqlx::query("DELETE FROM sessions WHERE id = ?")
            .bind(id.to_string())
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DomainError::SessionNotFound(id));
        }

        Ok(())
    }
}

#[derive(sqlx::FromRow)]
struct SessionRow {
    id: String,
    owner_id: String,
    status: String,
    metadata: String,
    progress_data: String,
    total_messages: i64,
    created_at: String,
    updated_at: String,
}

impl TryFrom<SessionRow> for Session {
    type Error = DomainError;

    fn try_from(row: SessionRow) -> Result<Self, Self::Error> {
        let status: SessionStatus = row
            .status
            .parse()
            .map_err(DomainError::SerializationError)?;
        let metadata: SessionMetadata = serde_json::from_str(&row.metadata)?;
        let progress_data: HashMap<Category, u8> = serde_json::from_str(&row.progress_data)?;

        Ok(Session {
            id: parse_uuid(&row.id)?,
            owner_id: row.owner_id,
            status,
            metadata,
            progress_data,
            total_messages: u32::try_from(row.total_messages).unwrap_or(0),
            created_at: parse_datetime(&row.created_at)?,
            updated_at: parse_datetime(&row.updated_at)?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::sqlite::create_migrated_test_pool;
    use crate::domain::models::QuestionBank;

    async fn setup_repo() -> SqliteSessionRepository {
        let pool = create_migrated_test_pool().await.unwrap();
        SqliteSessionRepository::new(pool)
    }

    fn session(owner: &str) -> Session {
        Session::new(owner, &QuestionBank::default())
    }

    #[tokio::test]
    async fn test_insert_and_get_round_trips_metadata() {
        let repo = setup_repo().await;
        let mut session = session("alice");
        session.record_answer(Category::Education);

        repo.insert(&session).await.unwrap();

        let retrieved = repo.get(session.id).await.unwrap().unwrap();
        assert_eq!(retrieved.owner_id, "alice");
        assert_eq!(retrieved.metadata, session.metadata);
        assert_eq!(retrieved.progress_data, session.progress_data);
    }

    #[tokio::test]
    async fn test_update_persists_status_and_counters() {
        let repo = setup_repo().await;
        let mut session = session("alice");
        repo.insert(&session).await.unwrap();

        session.total_messages = 9;
        session.mark_complete();
        repo.update(&session).await.unwrap();

        let retrieved = repo.get(session.id).await.unwrap().unwrap();
        assert_eq!(retrieved.status, SessionStatus::Completed);
        assert_eq!(retrieved.total_messages, 9);
        assert!(retrieved.metadata.is_complete);
    }

    #[tokio::test]
    async fn test_update_missing_session_fails() {
        let repo = setup_repo().await;
        let result = repo.update(&session("ghost")).await;
        assert!(matches!(result, Err(DomainError::SessionNotFound(_))));
    }

    #[tokio::test]
    async fn test_find_active_by_owner_skips_completed() {
        let repo = setup_repo().await;
        let mut completed = session("alice");
        completed.mark_complete();
        repo.insert(&completed).await.unwrap();

        assert!(repo.find_active_by_owner("alice").await.unwrap().is_none());

        let active = session("alice");
        repo.insert(&active).await.unwrap();
        let found = repo.find_active_by_owner("alice").await.unwrap().unwrap();
        assert_eq!(found.id, active.id);
    }

    #[tokio::test]
    async fn test_list_by_owner_is_scoped_and_ordered() {
        let repo = setup_repo().await;
        let mut older = session("alice");
        older.updated_at = chrono::Utc::now() - chrono::Duration::minutes(5);
        repo.insert(&older).await.unwrap();
        repo.insert(&session("alice")).await.unwrap();
        repo.insert(&session("bob")).await.unwrap();

        let sessions = repo.list_by_owner("alice").await.unwrap();
        assert_eq!(sessions.len(), 2);
        assert_eq!(sessions[1].id, older.id);
    }

    #[tokio::test]
    async fn test_delete() {
        let repo = setup_repo().await;
        let session = session("alice");
        repo.insert(&session).await.unwrap();

        repo.delete(session.id).await.unwrap();
        assert!(repo.get(session.id).await.unwrap().is_none());
        assert!(matches!(
            repo.delete(session.id).await,
            Err(DomainError::SessionNotFound(_))
        ));
    }
}
