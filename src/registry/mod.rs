//! Local registry of stores and started container instances
//!
//! The registry is an intent log: instance rows are written before the
//! container tool is asked to bring them up (status `requested`), flipped to
//! `running` once the `up` command exits successfully, and deleted as soon as
//! a stop is dispatched, without waiting for the tool to finish. It can
//! therefore describe instances that never started or never stopped.

pub mod migrations;
pub mod storage;

pub use storage::SqliteRegistry;

use crate::error::{CarbonError, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

/// Status of a recorded container instance
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum InstanceStatus {
    /// Written before the container tool confirmed anything
    #[default]
    Requested,
    /// The `up` command exited successfully
    Running,
}

impl fmt::Display for InstanceStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            InstanceStatus::Requested => write!(f, "requested"),
            InstanceStatus::Running => write!(f, "running"),
        }
    }
}

impl FromStr for InstanceStatus {
    type Err = CarbonError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "requested" => Ok(InstanceStatus::Requested),
            "running" => Ok(InstanceStatus::Running),
            other => Err(CarbonError::Storage(format!(
                "unknown instance status '{}'",
                other
            ))),
        }
    }
}

/// A started service instance
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContainerInstance {
    /// Storage key, 0 until stored
    pub id: i64,
    /// Service name from the carbon file
    pub service_name: String,
    /// Generated container name (service name + random suffix)
    pub container_name: String,
    /// Image the service runs
    pub image: String,
    /// Compose file the instance was started from
    pub manifest_path: PathBuf,
    /// Instance status
    pub status: InstanceStatus,
    /// Created timestamp
    pub created_at: DateTime<Utc>,
}

impl ContainerInstance {
    /// Create a new instance record
    pub fn new(
        service_name: &str,
        container_name: &str,
        image: &str,
        manifest_path: impl Into<PathBuf>,
    ) -> Self {
        Self {
            id: 0,
            service_name: service_name.to_string(),
            container_name: container_name.to_string(),
            image: image.to_string(),
            manifest_path: manifest_path.into(),
            status: InstanceStatus::Requested,
            created_at: Utc::now(),
        }
    }

    /// Whether any identifier names this instance, by service or container name
    pub fn matches(&self, identifiers: &[String]) -> bool {
        identifiers
            .iter()
            .any(|id| *id == self.service_name || *id == self.container_name)
    }
}

/// A registered directory scanned for carbon files
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Store {
    /// Storage key, 0 until stored
    pub id: i64,
    /// User facing identifier
    pub uid: String,
    /// Absolute store directory
    pub path: PathBuf,
    /// Environment file passed to compose for services of this store
    pub env_file: Option<PathBuf>,
    /// Created timestamp
    pub created_at: DateTime<Utc>,
}

impl Store {
    /// Create a new store record
    pub fn new(uid: &str, path: impl Into<PathBuf>, env_file: Option<PathBuf>) -> Self {
        Self {
            id: 0,
            uid: uid.to_string(),
            path: path.into(),
            env_file,
            created_at: Utc::now(),
        }
    }
}

/// Storage for stores and container instances.
///
/// Upserts and deletes are idempotent: repeating one with the same identity
/// overwrites or does nothing.
#[async_trait]
pub trait Registry: Send + Sync {
    /// All recorded instances, oldest first
    async fn list_instances(&self) -> Result<Vec<ContainerInstance>>;

    /// Insert an instance, or update the one with the same container and service name
    async fn upsert_instance(&self, instance: &ContainerInstance) -> Result<()>;

    /// Delete the instance with the same container and service name
    async fn delete_instance(&self, instance: &ContainerInstance) -> Result<()>;

    /// All stores, in the order they were added
    async fn list_stores(&self) -> Result<Vec<Store>>;

    /// Replace any store with the same uid by this one
    async fn upsert_store(&self, store: &Store) -> Result<()>;

    /// Delete the store with the same uid
    async fn delete_store(&self, store: &Store) -> Result<()>;
}
