//! Registry schema migrations

use crate::error::Result;
use sqlx::SqlitePool;
use tracing::{info, instrument};

const SCHEMA_VERSION: i64 = 1;

/// Bring the schema up to the current version
#[instrument(skip(pool))]
pub async fn run(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS schema_version (
            version INTEGER PRIMARY KEY
        )
        "#,
    )
    .execute(pool)
    .await?;

    let current_version: Option<i64> =
        sqlx::query_scalar("SELECT version FROM schema_version LIMIT 1")
            .fetch_optional(pool)
            .await?;

    let current_version = current_version.unwrap_or(0);

    if current_version >= SCHEMA_VERSION {
        return Ok(());
    }

    info!(
        "Migrating registry from version {} to {}",
        current_version, SCHEMA_VERSION
    );

    if current_version < 1 {
        migrate_to_v1(pool).await?;
    }

    Ok(())
}

#[instrument(skip(pool))]
async fn migrate_to_v1(pool: &SqlitePool) -> Result<()> {
    let mut tx = pool.begin().await?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS containers (
            id INTEGER NOT NULL PRIMARY KEY AUTOINCREMENT,
            container_name TEXT NOT NULL,
            service_name TEXT NOT NULL,
            image TEXT NOT NULL DEFAULT '',
            manifest_path TEXT NOT NULL,
            status TEXT NOT NULL,
            created_at INTEGER NOT NULL,
            UNIQUE (container_name, service_name)
        )
        "#,
    )
    .execute(&mut *tx)
    .await?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS stores (
            id INTEGER NOT NULL PRIMARY KEY AUTOINCREMENT,
            uid TEXT NOT NULL UNIQUE,
            path TEXT NOT NULL,
            env_file TEXT,
            created_at INTEGER NOT NULL
        )
        "#,
    )
    .execute(&mut *tx)
    .await?;

    sqlx::query("INSERT INTO schema_version (version) VALUES (?)")
        .bind(1_i64)
        .execute(&mut *tx)
        .await?;

    tx.commit().await?;
    Ok(())
}
