use anyhow::Result;
use chrono::{DateTime, Utc};
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions};
use sqlx::{Executor, Pool, Sqlite};
use std::str::FromStr;
use std::time::Duration;
use tracing::info;

use crate::assets::MigrationAssets;
use crate::config::DatabaseConfig;
use crate::errors::{RepositoryError, RepositoryResult};
use crate::utils::datetime::DateTimeParser;

pub mod channels;
pub mod videos;

const BUSY_TIMEOUT: Duration = Duration::from_secs(30);

/// Storage handle passed explicitly to every operation
#[derive(Clone)]
pub struct Database {
    pool: Pool<Sqlite>,
}

impl Database {
    pub fn pool(&self) -> Pool<Sqlite> {
        self.pool.clone()
    }

    pub async fn new(config: &DatabaseConfig) -> Result<Self> {
        let in_memory = config.url.contains(":memory:");
        let mut options = SqliteConnectOptions::from_str(&config.url)?
            .create_if_missing(true)
            .foreign_keys(true)
            .busy_timeout(BUSY_TIMEOUT);
        if !in_memory {
            // dashboard reads must not wait on an update batch
            options = options.journal_mode(SqliteJournalMode::Wal);
        }

        // Every connection to `sqlite::memory:` is its own database, so an
        // in-memory store must live on exactly one connection that never expires.
        let pool_options = if in_memory {
            SqlitePoolOptions::new()
                .max_connections(1)
                .idle_timeout(None)
                .max_lifetime(None)
        } else {
            SqlitePoolOptions::new().max_connections(config.max_connections.unwrap_or(5))
        };

        let pool = pool_options.connect_with(options).await?;
        info!("Connected to database {}", config.url);

        Ok(Self { pool })
    }

    pub async fn migrate(&self) -> Result<()> {
        self.run_embedded_migrations().await?;
        Ok(())
    }

    async fn run_embedded_migrations(&self) -> RepositoryResult<()> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS _migrations (
                version INTEGER PRIMARY KEY,
                name TEXT NOT NULL,
                checksum BLOB NOT NULL,
                installed_on TEXT NOT NULL,
                execution_time INTEGER NOT NULL
            )
            "#,
        )
        .execute(&self.pool)
        .await?;

        for (name, content) in MigrationAssets::get_migrations() {
            // "001_initial_schema.sql" -> 1
            let version: i64 = name
                .split('_')
                .next()
                .and_then(|v| v.parse().ok())
                .ok_or_else(|| RepositoryError::MigrationFailed {
                    version: name.clone(),
                    message: "file name does not start with a numeric version".to_string(),
                })?;

            let applied: i64 =
                sqlx::query_scalar("SELECT COUNT(*) FROM _migrations WHERE version = ?")
                    .bind(version)
                    .fetch_one(&self.pool)
                    .await?;
            if applied > 0 {
                continue;
            }

            let start = std::time::Instant::now();
            let mut tx = self.pool.begin().await?;

            (&mut *tx)
                .execute(content.as_str())
                .await
                .map_err(|e| RepositoryError::MigrationFailed {
                    version: name.clone(),
                    message: e.to_string(),
                })?;

            let execution_time = start.elapsed().as_millis() as i64;
            sqlx::query(
                "INSERT INTO _migrations (version, name, checksum, installed_on, execution_time)
                 VALUES (?, ?, ?, ?, ?)",
            )
            .bind(version)
            .bind(&name)
            .bind(Self::calculate_checksum(&content))
            .bind(DateTimeParser::format_for_storage(&Utc::now()))
            .bind(execution_time)
            .execute(&mut *tx)
            .await?;

            tx.commit().await?;
            info!("Applied migration: {} ({}ms)", name, execution_time);
        }

        Ok(())
    }

    fn calculate_checksum(content: &str) -> Vec<u8> {
        use std::collections::hash_map::DefaultHasher;
        use std::hash::{Hash, Hasher};
        let mut hasher = DefaultHasher::new();
        content.hash(&mut hasher);
        hasher.finish().to_be_bytes().to_vec()
    }
}

/// Parse a stored timestamp column, reporting the column on failure
pub(crate) fn parse_timestamp(table: &str, field: &str, value: &str) -> RepositoryResult<DateTime<Utc>> {
    DateTimeParser::parse_flexible(value)
        .map_err(|e| RepositoryError::corrupt_row(table, field, e.to_string()))
}

/// Counters are unsigned upstream but SQLite integers are signed
pub(crate) fn to_db_count(count: u64) -> i64 {
    i64::try_from(count).unwrap_or(i64::MAX)
}

#[cfg(test)]
pub(crate) async fn test_database() -> Database {
    let config = DatabaseConfig {
        url: "sqlite::memory:".to_string(),
        max_connections: None,
    };
    let database = Database::new(&config).await.unwrap();
    database.migrate().await.unwrap();
    database
}
