//! `docker exec -it` command builder

use super::{CommandBuilder, Segments, UniqueSlot, PRIORITY_FILE};
use crate::config::DEFAULT_DOCKER_BINARY;

/// Default interactive shell
pub const DEFAULT_SHELL: &str = "/bin/bash";

/// POSIX shell, for images without bash
pub const POSIX_SHELL: &str = "/bin/sh";

/// Builder for a `docker exec -it <container> <shell>` command
#[derive(Debug, Clone)]
pub struct DockerShellCommand {
    binary: String,
    command: &'static str,
    segments: Segments,
}

impl Default for DockerShellCommand {
    fn default() -> Self {
        Self::new()
    }
}

impl DockerShellCommand {
    /// Create a new `docker exec -it` builder
    pub fn new() -> Self {
        Self::with_binary(DEFAULT_DOCKER_BINARY)
    }

    /// Create a builder for a different container tool binary
    pub fn with_binary(binary: &str) -> Self {
        Self {
            binary: binary.to_string(),
            command: "exec -it",
            segments: Segments::new(),
        }
    }

    /// Container to open the shell in
    pub fn container(mut self, container: &str) -> Self {
        self.segments.add(PRIORITY_FILE, container, "");
        self
    }

    /// Shell to run, the last call wins
    pub fn shell(mut self, shell: &str) -> Self {
        self.segments.set_unique(UniqueSlot::Shell, shell);
        self
    }
}

impl CommandBuilder for DockerShellCommand {
    fn build(&self) -> String {
        self.segments.render(&format!("{} {}", self.binary, self.command))
    }

    fn args(&self) -> Vec<String> {
        self.segments.args(&self.binary, self.command)
    }
}
