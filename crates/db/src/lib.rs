//! SQLite connection factory and schema migration ledger.
//!
//! [`Database`] owns the process-wide connection pool. It is created once by the
//! entry point, handed to whatever needs it, and closed at shutdown.

use std::str::FromStr;

use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePool, SqlitePoolOptions};
use thiserror::Error;
use time::OffsetDateTime;

const LEDGER_TABLE: &str = r#"
    CREATE TABLE IF NOT EXISTS _schema_migrations (
        scope      TEXT NOT NULL,
        id         TEXT NOT NULL,
        applied_at TEXT NOT NULL,
        PRIMARY KEY (scope, id)
    )
"#;

/// Errors raised by the database layer.
#[derive(Error, Debug)]
pub enum DbError {
    #[error("invalid database url '{url}'")]
    InvalidUrl {
        url: String,
        #[source]
        source: sqlx::Error,
    },

    #[error("failed to connect to database")]
    Connect(#[source] sqlx::Error),

    #[error("migration '{scope}/{id}' failed")]
    Migration {
        scope: String,
        id: String,
        #[source]
        source: sqlx::Error,
    },

    #[error(transparent)]
    Query(#[from] sqlx::Error),
}

/// Handle to the SQLite connection pool.
#[derive(Debug, Clone)]
pub struct Database {
    pool: SqlitePool,
}

impl Database {
    /// Open a pool for `url`, creating the database file if it is missing.
    ///
    /// In-memory databases live and die with a single connection, so the pool is
    /// pinned to one connection that never expires.
    pub async fn connect(url: &str, max_connections: u32) -> Result<Self, DbError> {
        let in_memory = is_in_memory(url);

        let mut options = SqliteConnectOptions::from_str(url)
            .map_err(|source| DbError::InvalidUrl {
                url: url.to_string(),
                source,
            })?
            .create_if_missing(true)
            .foreign_keys(true);

        if !in_memory {
            options = options.journal_mode(SqliteJournalMode::Wal);
        }

        let pool_options = if in_memory {
            SqlitePoolOptions::new()
                .max_connections(1)
                .min_connections(1)
                .idle_timeout(None)
                .max_lifetime(None)
        } else {
            SqlitePoolOptions::new().max_connections(max_connections.max(1))
        };

        let pool = pool_options
            .connect_with(options)
            .await
            .map_err(DbError::Connect)?;

        tracing::info!(target: "bookstore-db", url, in_memory, "database pool ready");

        Ok(Self { pool })
    }

    /// Borrow the underlying pool.
    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Round-trip a trivial query to verify connectivity.
    pub async fn ping(&self) -> Result<(), DbError> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }

    /// Apply a migration unless the ledger already records it.
    ///
    /// Returns `true` when the migration ran, `false` when it was already applied.
    /// The statements and the ledger entry are committed in one transaction.
    pub async fn apply_migration(&self, scope: &str, id: &str, sql: &str) -> Result<bool, DbError> {
        let failed = |source: sqlx::Error| DbError::Migration {
            scope: scope.to_string(),
            id: id.to_string(),
            source,
        };

        sqlx::raw_sql(LEDGER_TABLE)
            .execute(&self.pool)
            .await
            .map_err(failed)?;

        let mut tx = self.pool.begin().await.map_err(failed)?;

        let applied: Option<String> =
            sqlx::query_scalar("SELECT applied_at FROM _schema_migrations WHERE scope = ? AND id = ?")
                .bind(scope)
                .bind(id)
                .fetch_optional(&mut *tx)
                .await
                .map_err(failed)?;

        if applied.is_some() {
            tracing::debug!(target: "bookstore-db", scope, id, "migration already applied");
            return Ok(false);
        }

        sqlx::raw_sql(sql).execute(&mut *tx).await.map_err(failed)?;

        sqlx::query("INSERT INTO _schema_migrations (scope, id, applied_at) VALUES (?, ?, ?)")
            .bind(scope)
            .bind(id)
            .bind(OffsetDateTime::now_utc())
            .execute(&mut *tx)
            .await
            .map_err(failed)?;

        tx.commit().await.map_err(failed)?;

        tracing::info!(target: "bookstore-db", scope, id, "migration applied");
        Ok(true)
    }

    /// Close every pooled connection. Pending acquisitions fail afterwards.
    pub async fn close(&self) {
        self.pool.close().await;
        tracing::info!(target: "bookstore-db", "database pool closed");
    }
}

fn is_in_memory(url: &str) -> bool {
    url.contains(":memory:") || url.contains("mode=memory")
}
