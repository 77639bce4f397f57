//! Generated compose files

use super::resolver::ResolvedSet;
use crate::catalog::{ServiceFields, CONTAINER_NAME_FIELD};
use crate::digest::short_hash;
use crate::error::{CarbonError, Result};
use serde::{Deserialize, Serialize};
use serde_yaml::Value;
use std::collections::BTreeMap;
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Compose file format version written to generated files
pub const COMPOSE_VERSION: &str = "3";

/// Suffix of every generated compose file name
pub const MANIFEST_BASE_NAME: &str = "docker-compose.yml";

/// Length of the service set hash prefixed to the file name
pub const MANIFEST_HASH_LENGTH: usize = 16;

/// A compose file synthesized from resolved services
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Manifest {
    /// Compose file version
    pub version: String,
    /// Service fields by service name
    pub services: BTreeMap<String, ServiceFields>,
    /// Deterministic file name
    #[serde(skip)]
    pub file_name: String,
    /// Where the file was written, empty until persisted
    #[serde(skip)]
    pub path: PathBuf,
}

impl Manifest {
    /// Build a manifest from service fields
    pub fn new(services: BTreeMap<String, ServiceFields>) -> Self {
        let file_name = Self::file_name_for(services.keys().map(String::as_str));

        Self {
            version: COMPOSE_VERSION.to_string(),
            services,
            file_name,
            path: PathBuf::new(),
        }
    }

    /// `<hash of sorted service names>.docker-compose.yml`
    pub fn file_name_for<'a>(names: impl IntoIterator<Item = &'a str>) -> String {
        let mut names: Vec<&str> = names.into_iter().collect();
        names.sort_unstable();
        names.dedup();

        format!(
            "{}.{}",
            short_hash(&names.join(","), MANIFEST_HASH_LENGTH),
            MANIFEST_BASE_NAME
        )
    }

    /// Read a generated compose file back
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let mut manifest: Manifest = serde_yaml::from_str(&content)?;

        manifest.file_name = path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_default();
        manifest.path = path.to_path_buf();

        Ok(manifest)
    }

    /// Path of the persisted file
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Generated container name of a service
    pub fn container_name(&self, service: &str) -> Option<&str> {
        self.field(service, CONTAINER_NAME_FIELD)
    }

    /// Image of a service
    pub fn image(&self, service: &str) -> Option<&str> {
        self.field(service, "image")
    }

    fn field(&self, service: &str, field: &str) -> Option<&str> {
        self.services
            .get(service)
            .and_then(|fields| fields.get(field))
            .and_then(Value::as_str)
    }
}

/// A persisted manifest and the environment files its services need
#[derive(Debug, Clone)]
pub struct Materialized {
    /// Distinct environment files of the owning stores
    pub env_files: Vec<PathBuf>,
    /// The persisted manifest
    pub manifest: Manifest,
}

/// Writes manifests for resolved services
#[derive(Debug, Clone)]
pub struct ManifestMaterializer {
    dir: PathBuf,
}

impl ManifestMaterializer {
    /// Write manifests into `dir`
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// Merge the resolved services into one manifest and write it.
    ///
    /// The write has completed (and the file is closed) when this returns.
    pub async fn materialize(&self, resolved: &ResolvedSet) -> Result<Materialized> {
        if resolved.is_empty() {
            return Err(CarbonError::EmptySelection);
        }

        let services = resolved
            .iter()
            .map(|(name, service)| (name.clone(), service.fields.clone()))
            .collect();
        let mut manifest = Manifest::new(services);

        let mut env_files: Vec<PathBuf> = Vec::new();
        for service in resolved.values() {
            if let Some(env_file) = &service.env_file {
                if !env_file.as_os_str().is_empty() && !env_files.contains(env_file) {
                    env_files.push(env_file.clone());
                }
            }
        }

        let content = serde_yaml::to_string(&manifest)?;
        let dir = self.dir.clone();
        let file_name = manifest.file_name.clone();

        manifest.path =
            tokio::task::spawn_blocking(move || write_atomically(&dir, &file_name, &content))
                .await??;

        info!("Saved compose file to {}", manifest.path.display());

        Ok(Materialized {
            env_files,
            manifest,
        })
    }
}

/// Write through a temp file in the same directory and rename it into
/// place, so concurrent writers of one file name never interleave.
fn write_atomically(dir: &Path, file_name: &str, content: &str) -> Result<PathBuf> {
    std::fs::create_dir_all(dir)?;
    let path = dir.join(file_name);

    let mut file = tempfile::NamedTempFile::new_in(dir)?;
    file.write_all(content.as_bytes())?;
    file.as_file().sync_all()?;
    file.persist(&path).map_err(|e| CarbonError::Io(e.error))?;

    debug!("Wrote {} bytes to {}", content.len(), path.display());
    Ok(path)
}
