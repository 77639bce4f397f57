//! `logs`

use super::Context;
use crate::builder::logs::DockerLogsCommand;
use crate::error::{CarbonError, Result};
use crate::runner::{run_all, running_containers, Invocation};
use tracing::warn;

/// Containers to read logs from: running containers whose key is listed,
/// then recorded instances whose service name is listed
pub async fn matching_containers(context: &Context, choices: &[String]) -> Result<Vec<String>> {
    let running =
        running_containers(context.executor.as_ref(), &context.settings.docker_binary).await?;

    let mut matches: Vec<String> = running
        .iter()
        .filter(|c| choices.contains(&c.key))
        .map(|c| c.name().to_string())
        .collect();

    if matches.len() == choices.len() {
        return Ok(matches);
    }

    for instance in context.registry.list_instances().await? {
        if choices.contains(&instance.service_name) && !matches.contains(&instance.container_name)
        {
            matches.push(instance.container_name);
        }
    }

    Ok(matches)
}

/// Stream the logs of every match concurrently, each line labelled with
/// its container
pub async fn logs(context: &Context, choices: &[String], follow: bool) -> Result<()> {
    let containers = matching_containers(context, choices).await?;
    if containers.is_empty() {
        return Err(CarbonError::UserInput(format!(
            "no containers found for {}",
            choices.join(", ")
        )));
    }

    let invocations = containers
        .iter()
        .map(|name| {
            let mut command =
                DockerLogsCommand::with_binary(&context.settings.docker_binary).container(name);
            if follow {
                command = command.follow();
            }
            Invocation::from_command(&command).with_label(name)
        })
        .collect();

    for (invocation, outcome) in run_all(context.executor.clone(), invocations).await {
        if let Err(e) = outcome {
            warn!("Logs of {} ended: {}", invocation.label.unwrap_or_default(), e);
        }
    }

    Ok(())
}
