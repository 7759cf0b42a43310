//! SQLite implementation of MessageStore

use async_trait::async_trait;
use chrono::DateTime;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions};
use std::path::Path;
use std::str::FromStr;
use tracing::instrument;

use relay_core::{ChatMessage, MessageStore, StoreError, StoreResult};

const CREATE_TABLE: &str = r"
    CREATE TABLE IF NOT EXISTS message (
        timestamp INTEGER,
        nick TEXT,
        channel TEXT,
        message TEXT
    )
";

/// Append-only message table in a single SQLite file
#[derive(Debug, Clone)]
pub struct SqliteMessageStore {
    pool: SqlitePool,
}

impl SqliteMessageStore {
    /// Open (creating if needed) the database at `path`
    pub async fn open(path: &Path) -> StoreResult<Self> {
        let options = SqliteConnectOptions::new()
            .filename(path)
            .create_if_missing(true);
        let store = Self::connect(options).await?;
        tracing::info!(path = %path.display(), "Message store opened");
        Ok(store)
    }

    /// Private in-memory database
    pub async fn in_memory() -> StoreResult<Self> {
        let options = SqliteConnectOptions::from_str("sqlite::memory:").map_err(StoreError::backend)?;
        Self::connect(options).await
    }

    async fn connect(options: SqliteConnectOptions) -> StoreResult<Self> {
        // One connection: writes are serialized and `:memory:` stays a single database
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .idle_timeout(None)
            .max_lifetime(None)
            .connect_with(options)
            .await
            .map_err(StoreError::backend)?;

        sqlx::query(CREATE_TABLE)
            .execute(&pool)
            .await
            .map_err(StoreError::backend)?;

        Ok(Self { pool })
    }

    /// Newest messages first
    #[instrument(skip(self))]
    pub async fn recent(&self, limit: u32) -> StoreResult<Vec<ChatMessage>> {
        let rows: Vec<(i64, String, String, String)> = sqlx::query_as(
            r"
            SELECT timestamp, nick, channel, message
            FROM message
            ORDER BY rowid DESC
            LIMIT ?
            ",
        )
        .bind(i64::from(limit))
        .fetch_all(&self.pool)
        .await
        .map_err(StoreError::backend)?;

        Ok(rows
            .into_iter()
            .map(|(timestamp, nick, channel, text)| ChatMessage {
                timestamp: DateTime::from_timestamp(timestamp, 0).unwrap_or_default(),
                nick,
                channel,
                text,
            })
            .collect())
    }

    pub async fn close(&self) {
        self.pool.close().await;
    }
}

#[async_trait]
impl MessageStore for SqliteMessageStore {
    #[instrument(skip(self, message), fields(channel = %message.channel))]
    async fn store_message(&self, message: &ChatMessage) -> StoreResult<()> {
        sqlx::query("INSERT INTO message (timestamp, nick, channel, message) VALUES (?, ?, ?, ?)")
            .bind(message.unix_timestamp())
            .bind(&message.nick)
            .bind(&message.channel)
            .bind(&message.text)
            .execute(&self.pool)
            .await
            .map_err(StoreError::backend)?;
        Ok(())
    }

    async fn count(&self) -> StoreResult<u64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM message")
            .fetch_one(&self.pool)
            .await
            .map_err(StoreError::backend)?;
        Ok(count as u64)
    }
}
