//! `shell`

use super::Context;
use crate::builder::shell::{DockerShellCommand, DEFAULT_SHELL, POSIX_SHELL};
use crate::builder::CommandBuilder;
use crate::error::{CarbonError, Result};
use crate::runner::running_containers;

/// Which shell to open
#[derive(Debug, Clone, Default)]
pub struct ShellOptions {
    /// Use `/bin/sh` instead of `/bin/bash`
    pub sh: bool,
    /// Any other shell, wins over `sh`
    pub custom: Option<String>,
}

impl ShellOptions {
    fn shell(&self) -> &str {
        match &self.custom {
            Some(custom) if !custom.trim().is_empty() => custom.trim(),
            _ if self.sh => POSIX_SHELL,
            _ => DEFAULT_SHELL,
        }
    }
}

/// Print the command opening a shell in the running container with `key`
pub async fn shell(context: &Context, key: &str, options: &ShellOptions) -> Result<String> {
    let binary = &context.settings.docker_binary;
    let containers = running_containers(context.executor.as_ref(), binary).await?;

    let container = containers
        .iter()
        .find(|c| c.key == key)
        .ok_or_else(|| CarbonError::UserInput(format!("no running container with key {}", key)))?;

    let command = DockerShellCommand::with_binary(binary)
        .container(container.name())
        .shell(options.shell())
        .build();

    println!("{}", command);
    Ok(command)
}
