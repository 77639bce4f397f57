//! Start and stop of service groups

use super::manifest::{Manifest, ManifestMaterializer};
use super::resolver::{self, Diagnostic};
use crate::builder::compose::DockerComposeCommand;
use crate::catalog::ServiceCatalog;
use crate::error::{CarbonError, Result};
use crate::registry::{ContainerInstance, InstanceStatus, Registry};
use crate::runner::{run_all, Executor, Invocation};
use std::collections::BTreeMap;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::task::JoinSet;
use tracing::{debug, info, warn};

/// Outcome of a start request
#[derive(Debug, Clone)]
pub struct StartReport {
    /// Compose file the services were started from
    pub manifest_path: PathBuf,
    /// The `up` command that was run
    pub command: String,
    /// Services handed to `up`
    pub started: Vec<String>,
    /// Requested services that were left out
    pub diagnostics: Vec<Diagnostic>,
}

/// One compose file's share of a stop request
#[derive(Debug)]
pub struct StopGroup {
    /// Compose file the instances were started from
    pub manifest_path: PathBuf,
    /// Instances removed from the registry
    pub instances: Vec<ContainerInstance>,
    /// The `stop` command that was run
    pub command: String,
    /// Exit outcome of that command
    pub outcome: Result<()>,
}

/// Outcome of a stop request
#[derive(Debug, Default)]
pub struct StopReport {
    /// One group per compose file, ordered by path
    pub groups: Vec<StopGroup>,
}

impl StopReport {
    /// Whether nothing matched
    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }

    /// Groups whose stop command failed
    pub fn failures(&self) -> impl Iterator<Item = &StopGroup> {
        self.groups.iter().filter(|g| g.outcome.is_err())
    }
}

/// Ties catalog, resolver, materializer, registry and executor together
pub struct Orchestrator {
    catalog: Arc<dyn ServiceCatalog>,
    registry: Arc<dyn Registry>,
    executor: Arc<dyn Executor>,
    materializer: ManifestMaterializer,
    docker_binary: String,
}

impl Orchestrator {
    /// Create an orchestrator from its collaborators
    pub fn new(
        catalog: Arc<dyn ServiceCatalog>,
        registry: Arc<dyn Registry>,
        executor: Arc<dyn Executor>,
        materializer: ManifestMaterializer,
        docker_binary: &str,
    ) -> Self {
        Self {
            catalog,
            registry,
            executor,
            materializer,
            docker_binary: docker_binary.to_string(),
        }
    }

    /// Resolve, write a compose file for, record and bring up the named
    /// services.
    ///
    /// Without `force`, any requested service that already has a recorded
    /// instance rejects the whole request. With `force`, those instances are
    /// stopped first on a best-effort basis.
    pub async fn start(&self, names: &[String], force: bool) -> Result<StartReport> {
        let names = requested_names(names)?;

        let live = self.live_services(&names).await?;
        if !live.is_empty() {
            if !force {
                return Err(CarbonError::AlreadyRunning(live));
            }

            info!("Stopping {} before starting again", live.join(", "));
            match self.stop(&names).await {
                Ok(report) => {
                    for group in report.failures() {
                        if let Err(e) = &group.outcome {
                            warn!("Forced stop of {}: {}", group.manifest_path.display(), e);
                        }
                    }
                }
                Err(e) => warn!("Forced stop failed: {}", e),
            }
        }

        let catalog = self.catalog.services().await?;
        let resolution = resolver::resolve(&names, &catalog);

        let materialized = self.materializer.materialize(&resolution.services).await?;
        let manifest = &materialized.manifest;

        let mut instances = instances_for(manifest)?;
        self.record_all(&instances).await?;

        let started = services_to_start(&names, manifest);

        let mut command =
            DockerComposeCommand::with_binary(&self.docker_binary).file(manifest.path());
        for env_file in &materialized.env_files {
            command = command.env_file(env_file);
        }
        command = command.background().up();
        for service in &started {
            command = command.service(service);
        }
        let invocation = Invocation::from_command(&command);

        info!("Starting {}", started.join(", "));
        debug!("{}", invocation.text);
        self.executor.run(&invocation).await?;

        for instance in &mut instances {
            instance.status = InstanceStatus::Running;
        }
        self.record_all(&instances).await?;

        Ok(StartReport {
            manifest_path: manifest.path().to_path_buf(),
            command: invocation.text,
            started,
            diagnostics: resolution.diagnostics,
        })
    }

    /// Stop every recorded instance whose service or container name is
    /// among `identifiers`, with one `stop` command per compose file.
    ///
    /// Registry rows are deleted whether or not the commands succeed.
    pub async fn stop(&self, identifiers: &[String]) -> Result<StopReport> {
        let mut grouped: BTreeMap<PathBuf, Vec<ContainerInstance>> = BTreeMap::new();
        for instance in self.registry.list_instances().await? {
            if instance.matches(identifiers) {
                grouped
                    .entry(instance.manifest_path.clone())
                    .or_default()
                    .push(instance);
            }
        }

        if grouped.is_empty() {
            info!("Nothing to stop");
            return Ok(StopReport::default());
        }

        for members in grouped.values_mut() {
            members.sort_by(|a, b| a.service_name.cmp(&b.service_name));
        }

        let mut invocations = Vec::with_capacity(grouped.len());
        for (path, members) in &grouped {
            let mut command = DockerComposeCommand::with_binary(&self.docker_binary)
                .file(path)
                .stop();
            for member in members {
                command = command.service(&member.service_name);
            }
            let invocation = Invocation::from_command(&command);
            debug!("{}", invocation.text);
            invocations.push(invocation);
        }

        let doomed: Vec<ContainerInstance> = grouped.values().flatten().cloned().collect();
        let (deleted, outcomes) = tokio::join!(
            self.delete_all(&doomed),
            run_all(self.executor.clone(), invocations)
        );
        deleted?;

        let groups = grouped
            .into_iter()
            .zip(outcomes)
            .map(|((manifest_path, instances), (invocation, outcome))| {
                if let Err(e) = &outcome {
                    warn!("{}", e);
                }
                StopGroup {
                    manifest_path,
                    instances,
                    command: invocation.text,
                    outcome,
                }
            })
            .collect();

        Ok(StopReport { groups })
    }

    /// Requested services that already have a recorded instance
    async fn live_services(&self, names: &[String]) -> Result<Vec<String>> {
        let instances = self.registry.list_instances().await?;

        Ok(names
            .iter()
            .filter(|name| instances.iter().any(|i| &i.service_name == *name))
            .cloned()
            .collect())
    }

    async fn record_all(&self, instances: &[ContainerInstance]) -> Result<()> {
        let mut tasks = JoinSet::new();

        for instance in instances.iter().cloned() {
            let registry = self.registry.clone();
            tasks.spawn(async move { registry.upsert_instance(&instance).await });
        }

        join_all(tasks).await
    }

    async fn delete_all(&self, instances: &[ContainerInstance]) -> Result<()> {
        let mut tasks = JoinSet::new();

        for instance in instances.iter().cloned() {
            let registry = self.registry.clone();
            tasks.spawn(async move { registry.delete_instance(&instance).await });
        }

        join_all(tasks).await
    }
}

/// Wait for every task, then report the first failure
async fn join_all(mut tasks: JoinSet<Result<()>>) -> Result<()> {
    let mut first_error = None;

    while let Some(joined) = tasks.join_next().await {
        let outcome = joined.map_err(CarbonError::from).and_then(|done| done);
        if let Err(e) = outcome {
            warn!("Registry update failed: {}", e);
            first_error.get_or_insert(e);
        }
    }

    match first_error {
        Some(e) => Err(e),
        None => Ok(()),
    }
}

fn requested_names(names: &[String]) -> Result<Vec<String>> {
    let names: Vec<String> = names
        .iter()
        .map(|n| n.trim())
        .filter(|n| !n.is_empty())
        .map(str::to_string)
        .collect();

    if names.is_empty() {
        return Err(CarbonError::UserInput("no service names given".to_string()));
    }

    Ok(names)
}

fn instances_for(manifest: &Manifest) -> Result<Vec<ContainerInstance>> {
    manifest
        .services
        .keys()
        .map(|service| {
            let container = manifest.container_name(service).ok_or_else(|| {
                CarbonError::Internal(format!("service {} has no container name", service))
            })?;
            let image = manifest.image(service).unwrap_or_default();

            Ok(ContainerInstance::new(
                service,
                container,
                image,
                manifest.path(),
            ))
        })
        .collect()
}

/// Requested names present in the manifest, in request order, once each
fn services_to_start(names: &[String], manifest: &Manifest) -> Vec<String> {
    let mut started: Vec<String> = Vec::new();

    for name in names {
        if manifest.services.contains_key(name) && !started.contains(name) {
            started.push(name.clone());
        }
    }

    started
}
