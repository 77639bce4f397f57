//! Handlers behind the CLI subcommands
//!
//! Each handler takes the shared [`Context`] and prints its result to
//! stdout. Logs go to stderr through `tracing`.

pub mod lifecycle;
pub mod logs;
pub mod shell;
pub mod show;
pub mod store;

use crate::catalog::StoreCatalog;
use crate::compose::{ManifestMaterializer, Orchestrator};
use crate::config::Settings;
use crate::error::Result;
use crate::registry::{Registry, SqliteRegistry};
use crate::runner::{Executor, ShellExecutor};
use std::sync::Arc;

/// Collaborators shared by every command
#[derive(Clone)]
pub struct Context {
    pub settings: Settings,
    pub registry: Arc<dyn Registry>,
    pub executor: Arc<dyn Executor>,
}

impl Context {
    /// Create a context from explicit collaborators
    pub fn new(
        settings: Settings,
        registry: Arc<dyn Registry>,
        executor: Arc<dyn Executor>,
    ) -> Self {
        Self {
            settings,
            registry,
            executor,
        }
    }

    /// Open the registry database under the settings' home and run real
    /// processes
    pub async fn open(settings: Settings) -> Result<Self> {
        settings.ensure_dirs()?;
        let registry = SqliteRegistry::open(&settings.database_file).await?;

        Ok(Self::new(settings, Arc::new(registry), Arc::new(ShellExecutor)))
    }

    /// Catalog over the registered stores
    pub fn catalog(&self) -> StoreCatalog {
        StoreCatalog::new(self.registry.clone(), self.settings.scan_depth)
    }

    /// Orchestrator writing compose files into the compose directory
    pub fn orchestrator(&self) -> Orchestrator {
        Orchestrator::new(
            Arc::new(self.catalog()),
            self.registry.clone(),
            self.executor.clone(),
            ManifestMaterializer::new(&self.settings.compose_dir),
            &self.settings.docker_binary,
        )
    }
}

/// Keep the last `max` characters of a long string, prefixed with `...`
pub(crate) fn shorten(text: &str, max: usize) -> String {
    let count = text.chars().count();
    if count <= max {
        return text.to_string();
    }

    let tail: String = text.chars().skip(count - max).collect();
    format!("...{}", tail)
}

#[cfg(test)]
pub(crate) mod testing {
    use super::*;
    use crate::runner::testing::FakeExecutor;
    use tempfile::TempDir;

    /// Context over a temp home, an in-memory registry and a fake executor
    pub async fn context() -> (Context, Arc<FakeExecutor>, TempDir) {
        let home = tempfile::tempdir().unwrap();
        let registry = Arc::new(SqliteRegistry::in_memory().await.unwrap());
        let executor = Arc::new(FakeExecutor::new());

        let context = Context::new(
            Settings::from_home(home.path()),
            registry,
            executor.clone(),
        );

        (context, executor, home)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_shorten() {
        assert_eq!(shorten("short", 30), "short");
        assert_eq!(shorten("abcdefghij", 4), "...ghij");
    }

    #[tokio::test]
    async fn test_open_creates_home() {
        let temp = tempfile::tempdir().unwrap();
        let settings = Settings::from_home(temp.path().join("carbon"));

        let context = Context::open(settings.clone()).await.unwrap();
        assert!(settings.database_file.exists());
        assert!(context.registry.list_stores().await.unwrap().is_empty());
    }
}
