//! `docker compose` command builder

use super::{
    CommandBuilder, Segments, UniqueSlot, PRIORITY_BACKGROUND, PRIORITY_FILE, PRIORITY_SERVICE,
};
use crate::config::DEFAULT_DOCKER_BINARY;
use std::path::Path;

/// Builder for a `docker compose` command.
///
/// `up`, `down`, `stop` and `restart` compete for the same slot, so only the
/// last one called is rendered.
#[derive(Debug, Clone)]
pub struct DockerComposeCommand {
    binary: String,
    command: &'static str,
    segments: Segments,
}

impl Default for DockerComposeCommand {
    fn default() -> Self {
        Self::new()
    }
}

impl DockerComposeCommand {
    /// Create a new `docker compose` builder
    pub fn new() -> Self {
        Self::with_binary(DEFAULT_DOCKER_BINARY)
    }

    /// Create a builder for a different container tool binary
    pub fn with_binary(binary: &str) -> Self {
        Self {
            binary: binary.to_string(),
            command: "compose",
            segments: Segments::new(),
        }
    }

    /// `-f` compose file to use
    pub fn file(mut self, file: impl AsRef<Path>) -> Self {
        self.segments
            .add(PRIORITY_FILE, "-f", file.as_ref().display().to_string());
        self
    }

    /// `--env-file` environment file, may be repeated
    pub fn env_file(mut self, file: impl AsRef<Path>) -> Self {
        self.segments
            .add(PRIORITY_FILE, "--env-file", file.as_ref().display().to_string());
        self
    }

    /// `-d` run in the background
    pub fn background(mut self) -> Self {
        self.segments.add(PRIORITY_BACKGROUND, "-d", "");
        self
    }

    /// Service name(s), space separated
    pub fn service(mut self, service: &str) -> Self {
        self.segments.add(PRIORITY_SERVICE, service, "");
        self
    }

    /// `up` start the services
    pub fn up(mut self) -> Self {
        self.segments.set_unique(UniqueSlot::Action, "up");
        self
    }

    /// `down` take the whole compose file down
    pub fn down(mut self) -> Self {
        self.segments.set_unique(UniqueSlot::Action, "down");
        self
    }

    /// `stop` stop the services
    pub fn stop(mut self) -> Self {
        self.segments.set_unique(UniqueSlot::Action, "stop");
        self
    }

    /// `restart` restart the services
    pub fn restart(mut self) -> Self {
        self.segments.set_unique(UniqueSlot::Action, "restart");
        self
    }
}

impl CommandBuilder for DockerComposeCommand {
    fn build(&self) -> String {
        self.segments.render(&format!("{} {}", self.binary, self.command))
    }

    fn args(&self) -> Vec<String> {
        self.segments.args(&self.binary, self.command)
    }
}
