//! SQLite backed registry

use super::{migrations, ContainerInstance, InstanceStatus, Registry, Store};
use crate::error::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::sqlite::{
    SqliteConnectOptions, SqliteJournalMode, SqlitePool, SqlitePoolOptions, SqliteRow,
};
use sqlx::Row;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;
use tracing::{debug, info, instrument};

/// Registry stored in a local SQLite database
#[derive(Clone)]
pub struct SqliteRegistry {
    pool: SqlitePool,
}

impl SqliteRegistry {
    /// Open (or create) the registry database at `db_path`
    #[instrument(skip(db_path))]
    pub async fn open(db_path: impl AsRef<Path>) -> Result<Self> {
        let db_path = db_path.as_ref();
        info!("Opening registry at {}", db_path.display());

        if let Some(parent) = db_path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }

        let options = SqliteConnectOptions::new()
            .filename(db_path)
            .create_if_missing(true)
            .journal_mode(SqliteJournalMode::Wal)
            .busy_timeout(Duration::from_secs(5));

        let pool = SqlitePoolOptions::new()
            .max_connections(5)
            .connect_with(options)
            .await?;

        Self::with_pool(pool).await
    }

    /// Registry in an in-memory database (for tests).
    ///
    /// An in-memory database lives as long as its connection, so the pool is
    /// pinned to a single connection that never expires.
    pub async fn in_memory() -> Result<Self> {
        let options = SqliteConnectOptions::from_str("sqlite::memory:")?;

        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .min_connections(1)
            .idle_timeout(None)
            .max_lifetime(None)
            .connect_with(options)
            .await?;

        Self::with_pool(pool).await
    }

    async fn with_pool(pool: SqlitePool) -> Result<Self> {
        migrations::run(&pool).await?;
        Ok(Self { pool })
    }

    fn row_to_instance(row: SqliteRow) -> Result<ContainerInstance> {
        let status: String = row.try_get("status")?;
        let manifest_path: String = row.try_get("manifest_path")?;

        Ok(ContainerInstance {
            id: row.try_get("id")?,
            service_name: row.try_get("service_name")?,
            container_name: row.try_get("container_name")?,
            image: row.try_get("image")?,
            manifest_path: PathBuf::from(manifest_path),
            status: status.parse::<InstanceStatus>()?,
            created_at: from_timestamp(row.try_get("created_at")?),
        })
    }

    fn row_to_store(row: SqliteRow) -> Result<Store> {
        let path: String = row.try_get("path")?;
        let env_file: Option<String> = row.try_get("env_file")?;

        Ok(Store {
            id: row.try_get("id")?,
            uid: row.try_get("uid")?,
            path: PathBuf::from(path),
            env_file: env_file.filter(|e| !e.is_empty()).map(PathBuf::from),
            created_at: from_timestamp(row.try_get("created_at")?),
        })
    }
}

fn from_timestamp(secs: i64) -> DateTime<Utc> {
    DateTime::from_timestamp(secs, 0).unwrap_or_default()
}

#[async_trait]
impl Registry for SqliteRegistry {
    #[instrument(skip(self))]
    async fn list_instances(&self) -> Result<Vec<ContainerInstance>> {
        let rows = sqlx::query("SELECT * FROM containers ORDER BY created_at ASC, id ASC")
            .fetch_all(&self.pool)
            .await?;

        rows.into_iter().map(Self::row_to_instance).collect()
    }

    #[instrument(skip(self, instance), fields(container = %instance.container_name))]
    async fn upsert_instance(&self, instance: &ContainerInstance) -> Result<()> {
        debug!("Recording {} as {}", instance.service_name, instance.status);

        sqlx::query(
            r#"
            INSERT INTO containers (container_name, service_name, image, manifest_path, status, created_at)
            VALUES (?, ?, ?, ?, ?, ?)
            ON CONFLICT (container_name, service_name) DO UPDATE SET
                image = excluded.image,
                manifest_path = excluded.manifest_path,
                status = excluded.status
            "#,
        )
        .bind(&instance.container_name)
        .bind(&instance.service_name)
        .bind(&instance.image)
        .bind(instance.manifest_path.to_string_lossy().to_string())
        .bind(instance.status.to_string())
        .bind(instance.created_at.timestamp())
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    #[instrument(skip(self, instance), fields(container = %instance.container_name))]
    async fn delete_instance(&self, instance: &ContainerInstance) -> Result<()> {
        sqlx::query("DELETE FROM containers WHERE container_name = ? AND service_name = ?")
            .bind(&instance.container_name)
            .bind(&instance.service_name)
            .execute(&self.pool)
            .await?;

        Ok(())
    }

    #[instrument(skip(self))]
    async fn list_stores(&self) -> Result<Vec<Store>> {
        let rows = sqlx::query("SELECT * FROM stores ORDER BY created_at ASC, id ASC")
            .fetch_all(&self.pool)
            .await?;

        rows.into_iter().map(Self::row_to_store).collect()
    }

    #[instrument(skip(self, store), fields(uid = %store.uid))]
    async fn upsert_store(&self, store: &Store) -> Result<()> {
        let mut tx = self.pool.begin().await?;

        sqlx::query("DELETE FROM stores WHERE uid = ?")
            .bind(&store.uid)
            .execute(&mut *tx)
            .await?;

        sqlx::query("INSERT INTO stores (uid, path, env_file, created_at) VALUES (?, ?, ?, ?)")
            .bind(&store.uid)
            .bind(store.path.to_string_lossy().to_string())
            .bind(
                store
                    .env_file
                    .as_ref()
                    .map(|e| e.to_string_lossy().to_string()),
            )
            .bind(store.created_at.timestamp())
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(())
    }

    #[instrument(skip(self, store), fields(uid = %store.uid))]
    async fn delete_store(&self, store: &Store) -> Result<()> {
        sqlx::query("DELETE FROM stores WHERE uid = ?")
            .bind(&store.uid)
            .execute(&self.pool)
            .await?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[tokio::test]
    async fn test_registry_init() {
        let registry = SqliteRegistry::in_memory().await.unwrap();
        assert!(registry.list_instances().await.unwrap().is_empty());
        assert!(registry.list_stores().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_open_creates_database_file() {
        let temp = tempdir().unwrap();
        let db_path = temp.path().join("carbon").join("database.db");

        let registry = SqliteRegistry::open(&db_path).await.unwrap();
        registry
            .upsert_store(&Store::new("ab12", "/tmp/store", None))
            .await
            .unwrap();
        drop(registry);

        assert!(db_path.exists());

        // Reopening keeps the data and does not re-run the migration
        let reopened = SqliteRegistry::open(&db_path).await.unwrap();
        assert_eq!(reopened.list_stores().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_insert_and_list_instances() {
        let registry = SqliteRegistry::in_memory().await.unwrap();

        let web = ContainerInstance::new("web", "web-aaaaaaaaaa", "nginx", "/tmp/a.yml");
        let db = ContainerInstance::new("db", "db-bbbbbbbbbb", "postgres", "/tmp/a.yml");
        registry.upsert_instance(&web).await.unwrap();
        registry.upsert_instance(&db).await.unwrap();

        let instances = registry.list_instances().await.unwrap();
        assert_eq!(instances.len(), 2);

        let stored = instances
            .iter()
            .find(|i| i.service_name == "web")
            .unwrap();
        assert!(stored.id > 0);
        assert_eq!(stored.container_name, "web-aaaaaaaaaa");
        assert_eq!(stored.image, "nginx");
        assert_eq!(stored.manifest_path, PathBuf::from("/tmp/a.yml"));
        assert_eq!(stored.status, InstanceStatus::Requested);
    }

    #[tokio::test]
    async fn test_upsert_instance_overwrites() {
        let registry = SqliteRegistry::in_memory().await.unwrap();

        let mut web = ContainerInstance::new("web", "web-aaaaaaaaaa", "nginx", "/tmp/a.yml");
        registry.upsert_instance(&web).await.unwrap();

        web.status = InstanceStatus::Running;
        registry.upsert_instance(&web).await.unwrap();
        registry.upsert_instance(&web).await.unwrap();

        let instances = registry.list_instances().await.unwrap();
        assert_eq!(instances.len(), 1);
        assert_eq!(instances[0].status, InstanceStatus::Running);
    }

    #[tokio::test]
    async fn test_delete_instance_is_idempotent() {
        let registry = SqliteRegistry::in_memory().await.unwrap();

        let web = ContainerInstance::new("web", "web-aaaaaaaaaa", "nginx", "/tmp/a.yml");
        let other = ContainerInstance::new("web", "web-cccccccccc", "nginx", "/tmp/b.yml");
        registry.upsert_instance(&web).await.unwrap();
        registry.upsert_instance(&other).await.unwrap();

        registry.delete_instance(&web).await.unwrap();
        registry.delete_instance(&web).await.unwrap();

        let instances = registry.list_instances().await.unwrap();
        assert_eq!(instances.len(), 1);
        assert_eq!(instances[0].container_name, "web-cccccccccc");
    }

    #[tokio::test]
    async fn test_upsert_store_replaces_same_uid() {
        let registry = SqliteRegistry::in_memory().await.unwrap();

        for _ in 0..3 {
            registry
                .upsert_store(&Store::new("mine", "/tmp/store", None))
                .await
                .unwrap();
        }
        registry
            .upsert_store(&Store::new(
                "mine",
                "/tmp/other",
                Some(PathBuf::from("/tmp/other/.env")),
            ))
            .await
            .unwrap();

        let stores = registry.list_stores().await.unwrap();
        assert_eq!(stores.len(), 1);
        assert_eq!(stores[0].path, PathBuf::from("/tmp/other"));
        assert_eq!(stores[0].env_file, Some(PathBuf::from("/tmp/other/.env")));
    }

    #[tokio::test]
    async fn test_delete_store() {
        let registry = SqliteRegistry::in_memory().await.unwrap();

        let first = Store::new("one", "/tmp/one", None);
        let second = Store::new("two", "/tmp/two", None);
        registry.upsert_store(&first).await.unwrap();
        registry.upsert_store(&second).await.unwrap();

        registry.delete_store(&first).await.unwrap();
        registry.delete_store(&first).await.unwrap();

        let stores = registry.list_stores().await.unwrap();
        assert_eq!(stores.len(), 1);
        assert_eq!(stores[0].uid, "two");
        assert_eq!(stores[0].env_file, None);
    }

    #[tokio::test]
    async fn test_stores_listed_in_insertion_order() {
        let registry = SqliteRegistry::in_memory().await.unwrap();

        for uid in ["c", "a", "b"] {
            registry
                .upsert_store(&Store::new(uid, format!("/tmp/{}", uid), None))
                .await
                .unwrap();
        }

        let uids: Vec<String> = registry
            .list_stores()
            .await
            .unwrap()
            .into_iter()
            .map(|s| s.uid)
            .collect();
        assert_eq!(uids, vec!["c", "a", "b"]);
    }
}
