//! `docker logs` command builder

use super::{CommandBuilder, Segments, PRIORITY_FILE, PRIORITY_TARGET};
use crate::config::DEFAULT_DOCKER_BINARY;

/// Builder for a `docker logs` command
#[derive(Debug, Clone)]
pub struct DockerLogsCommand {
    binary: String,
    command: &'static str,
    segments: Segments,
}

impl Default for DockerLogsCommand {
    fn default() -> Self {
        Self::new()
    }
}

impl DockerLogsCommand {
    /// Create a new `docker logs` builder
    pub fn new() -> Self {
        Self::with_binary(DEFAULT_DOCKER_BINARY)
    }

    /// Create a builder for a different container tool binary
    pub fn with_binary(binary: &str) -> Self {
        Self {
            binary: binary.to_string(),
            command: "logs",
            segments: Segments::new(),
        }
    }

    /// `-f` follow the output
    pub fn follow(mut self) -> Self {
        self.segments.add(PRIORITY_FILE, "-f", "");
        self
    }

    /// Container to read the logs of
    pub fn container(mut self, name: &str) -> Self {
        self.segments.add(PRIORITY_TARGET, name, "");
        self
    }
}

impl CommandBuilder for DockerLogsCommand {
    fn build(&self) -> String {
        self.segments.render(&format!("{} {}", self.binary, self.command))
    }

    fn args(&self) -> Vec<String> {
        self.segments.args(&self.binary, self.command)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_logs_command() {
        let command = DockerLogsCommand::new().container("web-abc").build();
        assert_eq!(command, "docker logs web-abc");
    }

    #[test]
    fn test_logs_follow_goes_first() {
        let command = DockerLogsCommand::new()
            .container("web-abc")
            .follow()
            .build();

        assert_eq!(command, "docker logs -f web-abc");
    }
}
