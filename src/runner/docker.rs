//! Running containers as reported by the container tool

use super::{Executor, Invocation};
use crate::digest::short_hash;
use crate::error::Result;
use serde::Deserialize;

/// Length of the key shown for running containers
pub const CONTAINER_KEY_LENGTH: usize = 4;

/// Characters of the container ID shown in tables
pub const SHORT_ID_LENGTH: usize = 7;

/// One line of `docker ps --format json`
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct RunningContainer {
    /// Short, stable key derived from image and name
    #[serde(skip)]
    pub key: String,
    /// Container ID
    #[serde(rename = "ID")]
    pub id: String,
    /// Image
    #[serde(rename = "Image")]
    pub image: String,
    /// Container names, comma separated
    #[serde(rename = "Names")]
    pub names: String,
    /// Published ports
    #[serde(rename = "Ports", default)]
    pub ports: String,
    /// Creation time as printed by the tool
    #[serde(rename = "CreatedAt", default)]
    pub created_at: String,
    /// Human readable status
    #[serde(rename = "Status", default)]
    pub status: String,
}

impl RunningContainer {
    /// Primary container name, without the leading slash some tools print
    pub fn name(&self) -> &str {
        let first = self.names.split(',').next().unwrap_or_default();
        first.strip_prefix('/').unwrap_or(first)
    }

    /// Shortened container ID
    pub fn short_id(&self) -> &str {
        match self.id.char_indices().nth(SHORT_ID_LENGTH) {
            Some((end, _)) => &self.id[..end],
            None => &self.id,
        }
    }
}

/// Parse `docker ps --format json` output, one JSON object per line
pub fn parse_ps_output(output: &str) -> Result<Vec<RunningContainer>> {
    let mut containers = Vec::new();

    for line in output.lines().map(str::trim).filter(|l| !l.is_empty()) {
        let mut container: RunningContainer = serde_json::from_str(line)?;
        container.key = short_hash(
            &format!("{}{}", container.image, container.name()),
            CONTAINER_KEY_LENGTH,
        );
        containers.push(container);
    }

    Ok(containers)
}

/// Containers currently running according to `binary ps`
pub async fn running_containers(
    executor: &dyn Executor,
    binary: &str,
) -> Result<Vec<RunningContainer>> {
    let invocation = Invocation::from_args(
        [binary, "ps", "--format", "json"]
            .iter()
            .map(|arg| arg.to_string())
            .collect(),
    );
    let output = executor.capture(&invocation).await?;
    parse_ps_output(&output)
}
