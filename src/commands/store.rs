//! `store add` and `store remove`

use super::Context;
use crate::digest::short_hash;
use crate::error::{CarbonError, Result};
use crate::registry::Store;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// Length of ids derived from a store path
pub const STORE_ID_LENGTH: usize = 4;

/// Result of a `store remove`
#[derive(Debug, Default)]
pub struct Removal {
    /// Stores that were removed
    pub removed: Vec<Store>,
    /// Requested ids that matched no store
    pub unknown: Vec<String>,
}

/// Register a store directory, replacing any store with the same id
pub async fn add(
    context: &Context,
    path: &Path,
    id: Option<&str>,
    env_file: Option<&Path>,
) -> Result<Store> {
    let path = absolute(path)?;
    if !path.is_dir() {
        return Err(CarbonError::UserInput(format!(
            "store {} is not a directory",
            path.display()
        )));
    }

    let env_file = match env_file {
        Some(env) => {
            let env = absolute(env)?;
            if env.is_dir() {
                return Err(CarbonError::UserInput(format!(
                    "environment file {} is a directory",
                    env.display()
                )));
            }
            Some(env)
        }
        None => None,
    };

    let uid = match id.map(str::trim).filter(|id| !id.is_empty()) {
        Some(id) => id.to_string(),
        None => short_hash(&path.to_string_lossy(), STORE_ID_LENGTH),
    };

    let store = Store::new(&uid, path, env_file);
    context.registry.upsert_store(&store).await?;

    info!("Added store {} at {}", store.uid, store.path.display());
    println!("{}", store.uid);

    Ok(store)
}

/// Remove every store whose id is listed
pub async fn remove(context: &Context, ids: &[String]) -> Result<Removal> {
    let mut removal = Removal::default();

    for store in context.registry.list_stores().await? {
        if ids.contains(&store.uid) {
            context.registry.delete_store(&store).await?;
            println!("Removed store {}", store.uid);
            removal.removed.push(store);
        }
    }

    for id in ids {
        if !removal.removed.iter().any(|s| &s.uid == id) && !removal.unknown.contains(id) {
            warn!("No store with id {}", id);
            removal.unknown.push(id.clone());
        }
    }

    Ok(removal)
}

fn absolute(path: &Path) -> Result<PathBuf> {
    if path.is_absolute() {
        Ok(path.to_path_buf())
    } else {
        Ok(std::env::current_dir()?.join(path))
    }
}
