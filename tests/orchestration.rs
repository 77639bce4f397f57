//! Start and stop through the public API, against a real store on disk

use async_trait::async_trait;
use carbon::commands::{store, Context};
use carbon::compose::Manifest;
use carbon::config::Settings;
use carbon::registry::{InstanceStatus, Registry, SqliteRegistry};
use carbon::runner::{Executor, Invocation};
use carbon::{CarbonError, Result};
use std::sync::{Arc, Mutex};

#[derive(Default)]
struct RecordingExecutor {
    commands: Mutex<Vec<String>>,
}

impl RecordingExecutor {
    fn commands(&self) -> Vec<String> {
        self.commands.lock().unwrap().clone()
    }
}

#[async_trait]
impl Executor for RecordingExecutor {
    async fn run(&self, invocation: &Invocation) -> Result<()> {
        self.commands.lock().unwrap().push(invocation.text.clone());
        Ok(())
    }

    async fn capture(&self, invocation: &Invocation) -> Result<String> {
        Err(CarbonError::ExternalTool {
            command: invocation.text.clone(),
            reason: "not available in tests".to_string(),
        })
    }
}

const CARBON_FILE: &str = "\
web:
  image: nginx:latest
  depends_on:
    - api
api:
  image: example/api:1
---
worker:
  image: example/worker:1
";

async fn setup() -> (Context, Arc<RecordingExecutor>, tempfile::TempDir, tempfile::TempDir) {
    let home = tempfile::tempdir().unwrap();
    let stores = tempfile::tempdir().unwrap();

    let nested = stores.path().join("backend");
    std::fs::create_dir_all(&nested).unwrap();
    std::fs::write(nested.join("carbon.yml"), CARBON_FILE).unwrap();
    std::fs::write(stores.path().join(".env"), "TOKEN=1\n").unwrap();

    let settings = Settings::from_home(home.path());
    settings.ensure_dirs().unwrap();
    let registry = SqliteRegistry::open(&settings.database_file).await.unwrap();
    let executor = Arc::new(RecordingExecutor::default());

    let context = Context::new(settings, Arc::new(registry), executor.clone());
    store::add(
        &context,
        stores.path(),
        Some("main"),
        Some(&stores.path().join(".env")),
    )
    .await
    .unwrap();

    (context, executor, home, stores)
}

fn names(names: &[&str]) -> Vec<String> {
    names.iter().map(|n| n.to_string()).collect()
}

#[tokio::test]
async fn test_start_and_stop_two_groups() {
    let (context, executor, home, stores) = setup().await;
    let orchestrator = context.orchestrator();

    let first = orchestrator
        .start(&names(&["web", "api"]), false)
        .await
        .unwrap();
    let second = orchestrator.start(&names(&["worker"]), false).await.unwrap();

    assert_ne!(first.manifest_path, second.manifest_path);
    assert!(first.manifest_path.starts_with(home.path()));
    assert_eq!(
        first.command,
        format!(
            "docker compose -f {} --env-file {} up -d web api",
            first.manifest_path.display(),
            stores.path().join(".env").display()
        )
    );

    let manifest = Manifest::load(&first.manifest_path).unwrap();
    assert_eq!(manifest.services.len(), 2);
    assert_eq!(manifest.image("api"), Some("example/api:1"));

    let instances = context.registry.list_instances().await.unwrap();
    assert_eq!(instances.len(), 3);
    assert!(instances
        .iter()
        .all(|i| i.status == InstanceStatus::Running));

    let worker_container = instances
        .iter()
        .find(|i| i.service_name == "worker")
        .map(|i| i.container_name.clone())
        .unwrap();

    let report = orchestrator
        .stop(&[worker_container, "web".to_string()])
        .await
        .unwrap();
    assert_eq!(report.groups.len(), 2);
    assert_eq!(report.failures().count(), 0);

    let left: Vec<String> = context
        .registry
        .list_instances()
        .await
        .unwrap()
        .into_iter()
        .map(|i| i.service_name)
        .collect();
    assert_eq!(left, names(&["api"]));
    assert_eq!(executor.commands().len(), 4);
}

#[tokio::test]
async fn test_restart_reuses_manifest() {
    let (context, _executor, home, _stores) = setup().await;
    let orchestrator = context.orchestrator();

    let first = orchestrator.start(&names(&["worker"]), false).await.unwrap();
    let already = orchestrator.start(&names(&["worker"]), false).await;
    assert!(matches!(already, Err(CarbonError::AlreadyRunning(_))));

    let second = orchestrator.start(&names(&["worker"]), true).await.unwrap();
    assert_eq!(first.manifest_path, second.manifest_path);

    let manifests = std::fs::read_dir(home.path())
        .unwrap()
        .filter_map(|entry| entry.ok())
        .filter(|entry| entry.file_name().to_string_lossy().ends_with(".docker-compose.yml"))
        .count();
    assert_eq!(manifests, 1);
}
