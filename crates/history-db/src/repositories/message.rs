//! PostgreSQL implementation of MessageRepository

use async_trait::async_trait;
use sqlx::PgPool;
use tracing::instrument;

use history_core::entities::StoredMessage;
use history_core::traits::{Closeable, MessageRepository, RepoResult};
use history_core::value_objects::Snowflake;

use crate::mappers::MessageBatch;
use crate::models::MessageModel;

use super::error::{map_db_error, sql_limit};

/// PostgreSQL implementation of MessageRepository
#[derive(Clone)]
pub struct PgMessageRepository {
    pool: PgPool,
}

impl PgMessageRepository {
    /// Create a new PgMessageRepository
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Underlying pool, shared with the channel status repository
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

#[async_trait]
impl MessageRepository for PgMessageRepository {
    #[instrument(skip(self, message), fields(message_id = %message.message_id))]
    async fn upsert(&self, message: &StoredMessage) -> RepoResult<()> {
        sqlx::query(
            r#"
            INSERT INTO messages (message_id, channel_id, author_id, author_name, content, created_at, timestamp_str)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            ON CONFLICT (message_id) DO UPDATE
            SET content = EXCLUDED.content, timestamp_str = EXCLUDED.timestamp_str
            "#,
        )
        .bind(message.message_id.into_inner())
        .bind(message.channel_id.into_inner())
        .bind(message.author_id.into_inner())
        .bind(&message.author_name)
        .bind(&message.content)
        .bind(message.created_at)
        .bind(&message.timestamp_str)
        .execute(&self.pool)
        .await
        .map_err(map_db_error)?;

        Ok(())
    }

    #[instrument(skip(self, messages), fields(count = messages.len()))]
    async fn upsert_many(&self, messages: &[StoredMessage]) -> RepoResult<u64> {
        let batch = MessageBatch::new(messages);
        if batch.is_empty() {
            return Ok(0);
        }

        let result = sqlx::query(
            r#"
            INSERT INTO messages (message_id, channel_id, author_id, author_name, content, created_at, timestamp_str)
            SELECT * FROM UNNEST($1::BIGINT[], $2::BIGINT[], $3::BIGINT[], $4::TEXT[], $5::TEXT[], $6::TIMESTAMPTZ[], $7::TEXT[])
            ON CONFLICT (message_id) DO UPDATE
            SET content = EXCLUDED.content, timestamp_str = EXCLUDED.timestamp_str
            "#,
        )
        .bind(&batch.message_ids)
        .bind(&batch.channel_ids)
        .bind(&batch.author_ids)
        .bind(&batch.author_names)
        .bind(&batch.contents)
        .bind(&batch.created_ats)
        .bind(&batch.timestamp_strs)
        .execute(&self.pool)
        .await
        .map_err(map_db_error)?;

        Ok(result.rows_affected())
    }

    #[instrument(skip(self))]
    async fn delete(&self, message_id: Snowflake) -> RepoResult<bool> {
        let result = sqlx::query("DELETE FROM messages WHERE message_id = $1")
            .bind(message_id.into_inner())
            .execute(&self.pool)
            .await
            .map_err(map_db_error)?;

        Ok(result.rows_affected() > 0)
    }

    #[instrument(skip(self, message_ids), fields(count = message_ids.len()))]
    async fn delete_many(
        &self,
        channel_id: Snowflake,
        message_ids: &[Snowflake],
    ) -> RepoResult<u64> {
        if message_ids.is_empty() {
            return Ok(0);
        }

        let ids: Vec<i64> = message_ids.iter().map(|s| s.into_inner()).collect();

        let result = sqlx::query(
            r#"
            DELETE FROM messages
            WHERE channel_id = $1 AND message_id = ANY($2)
            "#,
        )
        .bind(channel_id.into_inner())
        .bind(&ids)
        .execute(&self.pool)
        .await
        .map_err(map_db_error)?;

        Ok(result.rows_affected())
    }

    #[instrument(skip(self))]
    async fn find_by_id(&self, message_id: Snowflake) -> RepoResult<Option<StoredMessage>> {
        let result = sqlx::query_as::<_, MessageModel>(
            r#"
            SELECT message_id, channel_id, author_id, author_name, content, created_at, timestamp_str
            FROM messages
            WHERE message_id = $1
            "#,
        )
        .bind(message_id.into_inner())
        .fetch_optional(&self.pool)
        .await
        .map_err(map_db_error)?;

        Ok(result.map(StoredMessage::from))
    }

    #[instrument(skip(self))]
    async fn get_recent(&self, channel_id: Snowflake, limit: usize) -> RepoResult<Vec<StoredMessage>> {
        let rows = sqlx::query_as::<_, MessageModel>(
            r#"
            SELECT message_id, channel_id, author_id, author_name, content, created_at, timestamp_str
            FROM messages
            WHERE channel_id = $1
            ORDER BY created_at DESC, message_id DESC
            LIMIT $2
            "#,
        )
        .bind(channel_id.into_inner())
        .bind(sql_limit(limit))
        .fetch_all(&self.pool)
        .await
        .map_err(map_db_error)?;

        // Newest first from the index, callers want chronological order
        Ok(rows.into_iter().rev().map(StoredMessage::from).collect())
    }

    #[instrument(skip(self))]
    async fn get_before(
        &self,
        channel_id: Snowflake,
        before: Snowflake,
        limit: usize,
    ) -> RepoResult<Vec<StoredMessage>> {
        let rows = sqlx::query_as::<_, MessageModel>(
            r#"
            SELECT message_id, channel_id, author_id, author_name, content, created_at, timestamp_str
            FROM messages
            WHERE channel_id = $1 AND message_id < $2
            ORDER BY message_id DESC
            LIMIT $3
            "#,
        )
        .bind(channel_id.into_inner())
        .bind(before.into_inner())
        .bind(sql_limit(limit))
        .fetch_all(&self.pool)
        .await
        .map_err(map_db_error)?;

        Ok(rows.into_iter().rev().map(StoredMessage::from).collect())
    }

    #[instrument(skip(self))]
    async fn recent_ids(&self, channel_id: Snowflake, limit: usize) -> RepoResult<Vec<Snowflake>> {
        let ids: Vec<i64> = sqlx::query_scalar(
            r#"
            SELECT message_id
            FROM messages
            WHERE channel_id = $1
            ORDER BY message_id DESC
            LIMIT $2
            "#,
        )
        .bind(channel_id.into_inner())
        .bind(sql_limit(limit))
        .fetch_all(&self.pool)
        .await
        .map_err(map_db_error)?;

        Ok(ids.into_iter().map(Snowflake::new).collect())
    }

    #[instrument(skip(self))]
    async fn count(&self, channel_id: Snowflake) -> RepoResult<i64> {
        sqlx::query_scalar("SELECT COUNT(*) FROM messages WHERE channel_id = $1")
            .bind(channel_id.into_inner())
            .fetch_one(&self.pool)
            .await
            .map_err(map_db_error)
    }

    #[instrument(skip(self))]
    async fn latest_id(&self, channel_id: Snowflake) -> RepoResult<Option<Snowflake>> {
        let id: Option<i64> =
            sqlx::query_scalar("SELECT MAX(message_id) FROM messages WHERE channel_id = $1")
                .bind(channel_id.into_inner())
                .fetch_one(&self.pool)
                .await
                .map_err(map_db_error)?;

        Ok(id.map(Snowflake::new))
    }

    #[instrument(skip(self))]
    async fn oldest_id(&self, channel_id: Snowflake) -> RepoResult<Option<Snowflake>> {
        let id: Option<i64> =
            sqlx::query_scalar("SELECT MIN(message_id) FROM messages WHERE channel_id = $1")
                .bind(channel_id.into_inner())
                .fetch_one(&self.pool)
                .await
                .map_err(map_db_error)?;

        Ok(id.map(Snowflake::new))
    }
}

#[async_trait]
impl Closeable for PgMessageRepository {
    fn name(&self) -> &'static str {
        "postgres"
    }

    async fn close(&self) {
        self.pool.close().await;
    }
}
