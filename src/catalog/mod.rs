//! Service catalog
//!
//! The catalog is the set of services declared in carbon files across all
//! registered stores, keyed by service name.

pub mod parser;

use crate::error::Result;
use crate::registry::{Registry, Store};
use async_trait::async_trait;
use serde_yaml::Value;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, warn};
use walkdir::WalkDir;

/// Raw compose fields of a service, copied verbatim into generated compose files
pub type ServiceFields = BTreeMap<String, Value>;

/// Services by name
pub type Catalog = BTreeMap<String, ServiceDefinition>;

/// Field the resolver injects with the generated container name
pub const CONTAINER_NAME_FIELD: &str = "container_name";

/// A service declared in a carbon file
#[derive(Debug, Clone, PartialEq)]
pub struct ServiceDefinition {
    /// Service name
    pub name: String,
    /// Image, empty when the service only builds
    pub image: String,
    /// Services this one depends on
    pub depends_on: Vec<String>,
    /// All fields of the service definition
    pub fields: ServiceFields,
    /// Carbon file the service was read from
    pub source_file: PathBuf,
    /// Store the carbon file belongs to
    pub store_path: PathBuf,
    /// Environment file of that store
    pub env_file: Option<PathBuf>,
    /// Generated container name, set once resolved
    pub container: Option<String>,
}

impl ServiceDefinition {
    /// Create a definition from its fields
    pub fn new(name: &str, fields: ServiceFields) -> Self {
        let image = fields
            .get("image")
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string();
        let depends_on = parser::depends_on(&fields);

        Self {
            name: name.to_string(),
            image,
            depends_on,
            fields,
            source_file: PathBuf::new(),
            store_path: PathBuf::new(),
            env_file: None,
            container: None,
        }
    }

    /// Attach the owning store
    pub fn in_store(mut self, store: &Store) -> Self {
        self.store_path = store.path.clone();
        self.env_file = store.env_file.clone();
        self
    }
}

/// Source of declared services
#[async_trait]
pub trait ServiceCatalog: Send + Sync {
    /// All declared services
    async fn services(&self) -> Result<Catalog>;
}

#[async_trait]
impl ServiceCatalog for Catalog {
    async fn services(&self) -> Result<Catalog> {
        Ok(self.clone())
    }
}

/// Catalog built by scanning the stores of a registry
pub struct StoreCatalog {
    registry: Arc<dyn Registry>,
    depth: usize,
}

impl StoreCatalog {
    /// Create a catalog over the registry's stores
    pub fn new(registry: Arc<dyn Registry>, depth: usize) -> Self {
        Self { registry, depth }
    }
}

#[async_trait]
impl ServiceCatalog for StoreCatalog {
    async fn services(&self) -> Result<Catalog> {
        let stores = self.registry.list_stores().await?;
        let depth = self.depth;

        let catalog = tokio::task::spawn_blocking(move || scan_stores(&stores, depth)).await?;
        Ok(catalog)
    }
}

/// Scan stores in order. A service declared again in a later store replaces
/// the earlier one, so the most recently added store wins.
pub fn scan_stores(stores: &[Store], depth: usize) -> Catalog {
    let mut catalog = Catalog::new();

    for store in stores {
        if !store.path.is_dir() {
            warn!(
                "Store {} points at {} which is not a directory, skipping",
                store.uid,
                store.path.display()
            );
            continue;
        }

        for file in find_carbon_files(&store.path, depth) {
            let services = match parser::parse_file(&file) {
                Ok(services) => services,
                Err(e) => {
                    warn!("{}", e);
                    continue;
                }
            };

            for service in services {
                let service = service.in_store(store);

                if let Some(previous) = catalog.get(&service.name) {
                    warn!(
                        "Service {} from {} replaces the one from {}",
                        service.name,
                        service.source_file.display(),
                        previous.source_file.display()
                    );
                }

                catalog.insert(service.name.clone(), service);
            }
        }
    }

    catalog
}

/// Carbon files in `root` and up to `depth - 1` directories below it
pub fn find_carbon_files(root: &Path, depth: usize) -> Vec<PathBuf> {
    WalkDir::new(root)
        .max_depth(depth)
        .sort_by_file_name()
        .into_iter()
        .filter_map(|entry| match entry {
            Ok(entry) => Some(entry),
            Err(e) => {
                debug!("Skipping unreadable entry: {}", e);
                None
            }
        })
        .filter(|entry| entry.file_type().is_file())
        .filter(|entry| {
            entry
                .file_name()
                .to_str()
                .is_some_and(|name| parser::CARBON_FILES.contains(&name))
        })
        .map(|entry| entry.into_path())
        .collect()
}
