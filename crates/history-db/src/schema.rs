//! Idempotent schema bootstrap
//!
//! Every statement is `IF NOT EXISTS`, so running this on each startup is safe.

use sqlx::PgPool;

const STATEMENTS: &[&str] = &[
    r#"
    CREATE TABLE IF NOT EXISTS messages (
        message_id    BIGINT PRIMARY KEY,
        channel_id    BIGINT NOT NULL,
        author_id     BIGINT NOT NULL,
        author_name   TEXT NOT NULL,
        content       TEXT NOT NULL,
        created_at    TIMESTAMPTZ NOT NULL,
        timestamp_str TEXT NOT NULL
    )
    "#,
    r#"
    CREATE INDEX IF NOT EXISTS idx_messages_channel_created
        ON messages (channel_id, created_at DESC)
    "#,
    r#"
    CREATE INDEX IF NOT EXISTS idx_messages_channel_id
        ON messages (channel_id, message_id)
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS channel_status (
        channel_id          BIGINT PRIMARY KEY,
        is_fully_backfilled BOOLEAN NOT NULL DEFAULT FALSE,
        last_updated        TIMESTAMPTZ NOT NULL DEFAULT NOW()
    )
    "#,
];

/// Create tables and indexes if they are missing
pub async fn ensure_schema(pool: &PgPool) -> Result<(), sqlx::Error> {
    for statement in STATEMENTS {
        sqlx::query(statement).execute(pool).await?;
    }
    tracing::info!("Database schema ready");
    Ok(())
}
