//! PostgreSQL implementation of ChannelStatusRepository

use async_trait::async_trait;
use sqlx::PgPool;
use tracing::instrument;

use history_core::entities::{ChannelCount, ChannelStatus};
use history_core::traits::{ChannelStatusRepository, RepoResult};
use history_core::value_objects::Snowflake;

use crate::models::{ChannelCountModel, ChannelStatusModel};

use super::error::{map_db_error, sql_limit};

/// PostgreSQL implementation of ChannelStatusRepository
#[derive(Clone)]
pub struct PgChannelStatusRepository {
    pool: PgPool,
}

impl PgChannelStatusRepository {
    /// Create a new PgChannelStatusRepository
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ChannelStatusRepository for PgChannelStatusRepository {
    #[instrument(skip(self))]
    async fn find(&self, channel_id: Snowflake) -> RepoResult<Option<ChannelStatus>> {
        let result = sqlx::query_as::<_, ChannelStatusModel>(
            r#"
            SELECT channel_id, is_fully_backfilled, last_updated
            FROM channel_status
            WHERE channel_id = $1
            "#,
        )
        .bind(channel_id.into_inner())
        .fetch_optional(&self.pool)
        .await
        .map_err(map_db_error)?;

        Ok(result.map(ChannelStatus::from))
    }

    #[instrument(skip(self))]
    async fn is_backfilled(&self, channel_id: Snowflake) -> RepoResult<bool> {
        let flag: Option<bool> = sqlx::query_scalar(
            "SELECT is_fully_backfilled FROM channel_status WHERE channel_id = $1",
        )
        .bind(channel_id.into_inner())
        .fetch_optional(&self.pool)
        .await
        .map_err(map_db_error)?;

        Ok(flag.unwrap_or(false))
    }

    #[instrument(skip(self))]
    async fn mark_backfilled(&self, channel_id: Snowflake, complete: bool) -> RepoResult<()> {
        sqlx::query(
            r#"
            INSERT INTO channel_status (channel_id, is_fully_backfilled, last_updated)
            VALUES ($1, $2, NOW())
            ON CONFLICT (channel_id) DO UPDATE
            SET is_fully_backfilled = EXCLUDED.is_fully_backfilled, last_updated = NOW()
            "#,
        )
        .bind(channel_id.into_inner())
        .bind(complete)
        .execute(&self.pool)
        .await
        .map_err(map_db_error)?;

        Ok(())
    }

    #[instrument(skip(self))]
    async fn reset_backfilled_below(&self, threshold: i64) -> RepoResult<Vec<Snowflake>> {
        let ids: Vec<i64> = sqlx::query_scalar(
            r#"
            UPDATE channel_status cs
            SET is_fully_backfilled = FALSE, last_updated = NOW()
            WHERE cs.is_fully_backfilled
              AND (SELECT COUNT(*) FROM messages m WHERE m.channel_id = cs.channel_id) < $1
            RETURNING cs.channel_id
            "#,
        )
        .bind(threshold)
        .fetch_all(&self.pool)
        .await
        .map_err(map_db_error)?;

        Ok(ids.into_iter().map(Snowflake::new).collect())
    }

    #[instrument(skip(self))]
    async fn channel_counts(&self, limit: usize) -> RepoResult<Vec<ChannelCount>> {
        let rows = sqlx::query_as::<_, ChannelCountModel>(
            r#"
            SELECT c.channel_id,
                   (SELECT COUNT(*) FROM messages m WHERE m.channel_id = c.channel_id) AS message_count,
                   COALESCE(cs.is_fully_backfilled, FALSE) AS is_fully_backfilled
            FROM (
                SELECT DISTINCT channel_id FROM messages
                UNION
                SELECT channel_id FROM channel_status
            ) c
            LEFT JOIN channel_status cs ON cs.channel_id = c.channel_id
            ORDER BY message_count DESC, c.channel_id
            LIMIT $1
            "#,
        )
        .bind(sql_limit(limit))
        .fetch_all(&self.pool)
        .await
        .map_err(map_db_error)?;

        Ok(rows.into_iter().map(ChannelCount::from).collect())
    }
}
