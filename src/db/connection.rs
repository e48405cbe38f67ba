use sea_orm::{ConnectOptions, Database, DatabaseConnection, DbErr};
use std::time::Duration;
use tokio::time::sleep;
use tracing::{info, warn};

use crate::db::schema;
use crate::server::config::ServerConfig;

/// Connects to the configured database, waiting for it to come up.
///
/// Each failed attempt is logged and retried after
/// `db_connect_retry_interval_secs`, up to `db_connect_retries` retries.
/// The last connection error is returned once retries are exhausted.
pub async fn connect(config: &ServerConfig) -> Result<DatabaseConnection, DbErr> {
    let mut opt = ConnectOptions::new(config.database_url.to_owned());
    opt.max_connections(config.db_max_connections)
        .sqlx_logging(false);

    let retry_interval = Duration::from_secs(config.db_connect_retry_interval_secs);
    let mut attempt: u32 = 0;
    loop {
        match Database::connect(opt.clone()).await {
            Ok(db) => {
                info!(attempts = attempt + 1, "Database connected.");
                return Ok(db);
            }
            Err(e) if attempt < config.db_connect_retries => {
                attempt += 1;
                warn!(
                    error = %e,
                    attempt,
                    max_retries = config.db_connect_retries,
                    "Database unavailable, waiting before retrying."
                );
                sleep(retry_interval).await;
            }
            Err(e) => return Err(e),
        }
    }
}

/// Connects and makes sure every table exists.
pub async fn connect_and_sync(config: &ServerConfig) -> Result<DatabaseConnection, DbErr> {
    let db = connect(config).await?;
    schema::sync_schema(&db).await?;
    Ok(db)
}

/// Fresh in-memory SQLite database with all tables created.
///
/// Pinned to a single pooled connection: every SQLite in-memory connection
/// is its own database.
pub async fn open_in_memory() -> Result<DatabaseConnection, DbErr> {
    let mut opt = ConnectOptions::new("sqlite::memory:");
    opt.max_connections(1)
        .min_connections(1)
        .sqlx_logging(false);
    let db = Database::connect(opt).await?;
    schema::sync_schema(&db).await?;
    Ok(db)
}

#[cfg(test)]
mod tests {
    use super::*;
    use sea_orm::{ConnectionTrait, Statement};

    #[tokio::test]
    async fn test_open_in_memory_creates_tables() {
        let db = open_in_memory().await.unwrap();
        let backend = db.get_database_backend();

        for table in ["users", "auth_tokens", "tags", "ingredients"] {
            let row = db
                .query_one(Statement::from_sql_and_values(
                    backend,
                    "SELECT COUNT(*) AS n FROM sqlite_master WHERE type = 'table' AND name = ?",
                    [table.into()],
                ))
                .await
                .unwrap()
                .unwrap();
            let n: i64 = row.try_get("", "n").unwrap();
            assert_eq!(n, 1, "missing table {table}");
        }
    }

    #[tokio::test]
    async fn test_sync_schema_is_idempotent() {
        let db = open_in_memory().await.unwrap();
        schema::sync_schema(&db).await.unwrap();
    }

    #[tokio::test]
    async fn test_connect_gives_up_after_retries() {
        let config = ServerConfig {
            database_url: "postgres://nobody@127.0.0.1:1/none".to_string(),
            ..ServerConfig::for_tests()
        };
        assert!(connect(&config).await.is_err());
    }
}
