//! `show`

use super::{shorten, Context};
use crate::catalog::{Catalog, ServiceCatalog};
use crate::error::Result;
use crate::registry::Store;
use crate::runner::{running_containers, RunningContainer};
use std::fmt::Write;

/// Characters of a carbon file path shown in the services table
const PATH_WIDTH: usize = 30;

/// What `show` lists
#[derive(Debug, Clone, Copy, Default)]
pub struct ShowOptions {
    pub running: bool,
    pub stores: bool,
    pub carbon: bool,
}

/// Print the requested tables. Running containers are shown when nothing
/// else was asked for.
pub async fn show(context: &Context, options: ShowOptions) -> Result<()> {
    let running = options.running || !(options.stores || options.carbon);

    if running {
        let containers =
            running_containers(context.executor.as_ref(), &context.settings.docker_binary).await?;
        print!("{}", running_table(&containers));
    }

    if options.stores {
        let stores = context.registry.list_stores().await?;
        print!("{}", stores_table(&stores));
    }

    if options.carbon {
        let catalog = context.catalog().services().await?;
        print!("{}", services_table(&catalog));
    }

    Ok(())
}

/// Table of running containers
pub fn running_table(containers: &[RunningContainer]) -> String {
    if containers.is_empty() {
        return "No running containers\n".to_string();
    }

    let mut out = String::new();
    let _ = writeln!(out, "Total running containers: {}", containers.len());
    let _ = writeln!(
        out,
        "{:<6} {:<25} {:<9} {:<25} {:<25} {:<31} {:<20}",
        "KEY", "NAME", "ID", "IMAGE", "PORTS", "CREATED", "STATUS"
    );
    for c in containers {
        let _ = writeln!(
            out,
            "{:<6} {:<25} {:<9} {:<25} {:<25} {:<31} {:<20}",
            c.key,
            c.name(),
            c.short_id(),
            c.image,
            c.ports,
            c.created_at,
            c.status
        );
    }

    out
}

/// Table of registered stores
pub fn stores_table(stores: &[Store]) -> String {
    if stores.is_empty() {
        return "No registered stores\n".to_string();
    }

    let mut out = String::new();
    let _ = writeln!(out, "Total registered stores: {}", stores.len());
    let _ = writeln!(out, "{:<10} {:<40} {:<20} {}", "KEY", "PATH", "DATE", "ENV");
    for store in stores {
        let env = store
            .env_file
            .as_ref()
            .map(|e| e.display().to_string())
            .unwrap_or_else(|| "undefined".to_string());

        let _ = writeln!(
            out,
            "{:<10} {:<40} {:<20} {}",
            store.uid,
            store.path.display().to_string(),
            store.created_at.format("%Y-%m-%d %H:%M:%S").to_string(),
            env
        );
    }

    out
}

/// Table of declared services, sorted by name
pub fn services_table(catalog: &Catalog) -> String {
    if catalog.is_empty() {
        return "No available carbon services\n".to_string();
    }

    let mut out = String::new();
    let _ = writeln!(out, "Total available carbon services: {}", catalog.len());
    let _ = writeln!(out, "{:<20} {:<30} {}", "NAME", "IMAGE", "PATH");
    for (name, service) in catalog {
        let _ = writeln!(
            out,
            "{:<20} {:<30} {}",
            name,
            service.image,
            shorten(&service.source_file.display().to_string(), PATH_WIDTH)
        );
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::{ServiceDefinition, ServiceFields};
    use crate::commands::testing::context;
    use serde_yaml::Value;
    use std::path::PathBuf;

    #[test]
    fn test_stores_table_marks_missing_env() {
        let stores = vec![
            Store::new("a1b2", "/stores/one", None),
            Store::new("main", "/stores/two", Some(PathBuf::from("/stores/two/.env"))),
        ];

        let table = stores_table(&stores);
        let lines: Vec<&str> = table.lines().collect();

        assert_eq!(lines.len(), 4);
        assert!(lines[2].starts_with("a1b2"));
        assert!(lines[2].ends_with("undefined"));
        assert!(lines[3].ends_with("/stores/two/.env"));
    }

    #[test]
    fn test_running_table_shows_creation_time() {
        let containers = vec![RunningContainer {
            key: "a1b2".to_string(),
            id: "0123456789ab".to_string(),
            image: "nginx".to_string(),
            names: "web-Ab3dE9fGh1".to_string(),
            ports: "0.0.0.0:8080->80/tcp".to_string(),
            created_at: "2024-01-01 10:00:00 +0000 UTC".to_string(),
            status: "Up 2 minutes".to_string(),
        }];

        let table = running_table(&containers);
        let lines: Vec<&str> = table.lines().collect();

        assert_eq!(lines.len(), 3);
        let header: Vec<&str> = lines[1].split_whitespace().collect();
        assert_eq!(header, ["KEY", "NAME", "ID", "IMAGE", "PORTS", "CREATED", "STATUS"]);

        let created = lines[1].find("CREATED").unwrap();
        assert_eq!(&lines[2][created..created + 10], "2024-01-01");
        assert!(lines[2].starts_with("a1b2"));
        assert!(lines[2].contains("0123456 "));
        assert!(lines[2].trim_end().ends_with("Up 2 minutes"));
    }

    #[test]
    fn test_services_table_sorted_and_shortened() {
        let mut catalog = Catalog::new();
        for name in ["zeta", "alpha"] {
            let mut fields = ServiceFields::new();
            fields.insert("image".to_string(), Value::String(format!("{}:1", name)));
            let mut service = ServiceDefinition::new(name, fields);
            service.source_file =
                PathBuf::from("/home/someone/projects/a/very/long/store/path/carbon.yml");
            catalog.insert(name.to_string(), service);
        }

        let table = services_table(&catalog);
        let lines: Vec<&str> = table.lines().collect();

        assert!(lines[2].starts_with("alpha"));
        assert!(lines[3].starts_with("zeta"));
        assert!(lines[2].ends_with("...ery/long/store/path/carbon.yml"));
    }

    #[test]
    fn test_empty_tables() {
        assert_eq!(running_table(&[]), "No running containers\n");
        assert_eq!(stores_table(&[]), "No registered stores\n");
        assert_eq!(services_table(&Catalog::new()), "No available carbon services\n");
    }

    #[tokio::test]
    async fn test_show_defaults_to_running() {
        let (context, executor, _home) = context().await;
        executor.set_output(
            "docker ps --format json",
            r#"{"ID":"0123456789ab","Image":"nginx","Names":"web-1","Status":"Up"}"#,
        );

        show(&context, ShowOptions::default()).await.unwrap();
    }

    #[tokio::test]
    async fn test_show_stores_skips_docker() {
        let (context, _, _home) = context().await;

        // no ps output configured, so asking docker would fail
        let options = ShowOptions {
            stores: true,
            carbon: true,
            ..Default::default()
        };
        show(&context, options).await.unwrap();
    }
}
