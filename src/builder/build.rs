//! `docker build` command builder

use super::{
    CommandBuilder, Segments, PRIORITY_ACTION, PRIORITY_BUILD_ARG, PRIORITY_FILE, PRIORITY_TAG,
};
use crate::config::DEFAULT_DOCKER_BINARY;

/// Default build file name
pub const DOCKERFILE_NAME: &str = "Dockerfile";

/// Builder for a `docker build` command
#[derive(Debug, Clone)]
pub struct DockerBuildCommand {
    binary: String,
    command: &'static str,
    segments: Segments,
}

impl Default for DockerBuildCommand {
    fn default() -> Self {
        Self::new()
    }
}

impl DockerBuildCommand {
    /// Create a new `docker build` builder
    pub fn new() -> Self {
        Self::with_binary(DEFAULT_DOCKER_BINARY)
    }

    /// Create a builder for a different container tool binary
    pub fn with_binary(binary: &str) -> Self {
        Self {
            binary: binary.to_string(),
            command: "build",
            segments: Segments::new(),
        }
    }

    /// Build context path (the dot in `docker build .`)
    pub fn path(mut self, path: &str) -> Self {
        self.segments.add(PRIORITY_ACTION, "", path);
        self
    }

    /// `-f` build file inside the context
    pub fn file(mut self, file: &str) -> Self {
        self.segments.add(PRIORITY_FILE, "-f", file);
        self
    }

    /// `-t` image tag
    pub fn tag(mut self, tag: &str) -> Self {
        self.segments.add(PRIORITY_TAG, "-t", tag);
        self
    }

    /// `--build-arg` build argument as `KEY=VALUE`
    pub fn build_arg(mut self, arg: &str) -> Self {
        self.segments.add(PRIORITY_BUILD_ARG, "--build-arg", arg);
        self
    }
}

impl CommandBuilder for DockerBuildCommand {
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
    fn test_build_command() {
        let command = DockerBuildCommand::new()
            .path(".")
            .file(DOCKERFILE_NAME)
            .tag("thing:latest")
            .build_arg("GITHUB_TOKEN=1241234")
            .build();

        assert_eq!(
            command,
            "docker build -f Dockerfile -t thing:latest --build-arg GITHUB_TOKEN=1241234 ."
        );
    }

    #[test]
    fn test_build_path_only() {
        assert_eq!(DockerBuildCommand::new().path(".").build(), "docker build .");
    }

    #[test]
    fn test_build_args_keep_order() {
        let command = DockerBuildCommand::new()
            .build_arg("A=1")
            .path("ctx")
            .build_arg("B=2")
            .build();

        assert_eq!(command, "docker build --build-arg A=1 --build-arg B=2 ctx");
    }
}
