//! `start` and `stop`

use super::Context;
use crate::error::{CarbonError, Result};
use tracing::info;

/// Start the named services as one group
pub async fn start(context: &Context, names: &[String], force: bool) -> Result<()> {
    let report = context.orchestrator().start(names, force).await?;

    info!("Compose file {}", report.manifest_path.display());
    println!("Started {}", report.started.join(", "));

    Ok(())
}

/// Stop the named services or containers. Fails with the first group whose
/// stop command failed, after every group has run.
pub async fn stop(context: &Context, identifiers: &[String]) -> Result<()> {
    let report = context.orchestrator().stop(identifiers).await?;

    if report.is_empty() {
        println!("Nothing to stop");
        return Ok(());
    }

    let mut first_failure: Option<CarbonError> = None;

    for group in report.groups {
        let services: Vec<&str> = group
            .instances
            .iter()
            .map(|i| i.service_name.as_str())
            .collect();

        match group.outcome {
            Ok(()) => println!("Stopped {}", services.join(", ")),
            Err(e) => {
                println!("Failed to stop {}", services.join(", "));
                first_failure.get_or_insert(e);
            }
        }
    }

    match first_failure {
        Some(e) => Err(e),
        None => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::testing::context;
    use crate::registry::Store;

    fn write_store(dir: &std::path::Path) {
        std::fs::write(
            dir.join("carbon.yml"),
            "web:\n  image: nginx\n  depends_on:\n    - db\ndb:\n  image: postgres\n",
        )
        .unwrap();
    }

    #[tokio::test]
    async fn test_start_then_stop() {
        let (context, executor, _home) = context().await;
        let store = tempfile::tempdir().unwrap();
        write_store(store.path());
        context
            .registry
            .upsert_store(&Store::new("main", store.path(), None))
            .await
            .unwrap();

        let names = vec!["web".to_string(), "db".to_string()];
        start(&context, &names, false).await.unwrap();
        assert_eq!(context.registry.list_instances().await.unwrap().len(), 2);

        stop(&context, &names).await.unwrap();
        assert!(context.registry.list_instances().await.unwrap().is_empty());

        let commands = executor.commands();
        assert_eq!(commands.len(), 2);
        assert!(commands[0].ends_with("up -d web db"));
        assert!(commands[1].ends_with("stop db web"));
    }

    #[tokio::test]
    async fn test_stop_surfaces_tool_failure() {
        let (context, executor, _home) = context().await;
        let store = tempfile::tempdir().unwrap();
        write_store(store.path());
        context
            .registry
            .upsert_store(&Store::new("main", store.path(), None))
            .await
            .unwrap();

        start(&context, &["db".to_string()], false).await.unwrap();
        executor.fail_when_contains(" stop ");

        let result = stop(&context, &["db".to_string()]).await;
        assert!(matches!(result, Err(CarbonError::ExternalTool { .. })));
        assert!(context.registry.list_instances().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_stop_nothing_is_ok() {
        let (context, executor, _home) = context().await;
        stop(&context, &["ghost".to_string()]).await.unwrap();
        assert!(executor.commands().is_empty());
    }
}
