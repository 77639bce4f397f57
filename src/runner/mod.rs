//! External command execution
//!
//! Carbon never talks to the container runtime itself. It builds command
//! lines and hands them to an [`Executor`], which the orchestrator receives at
//! construction time so tests can substitute a fake.

pub mod docker;

pub use docker::{running_containers, RunningContainer};

use crate::builder::CommandBuilder;
use crate::error::{CarbonError, Result};
use async_trait::async_trait;
use std::process::Stdio;
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, AsyncRead, BufReader};
use tokio::process::Command;
use tracing::debug;

/// A command to run, with an optional label for its output
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Invocation {
    /// Full command line, for display and logs
    pub text: String,
    /// Program followed by its arguments
    pub args: Vec<String>,
    /// Prefix printed before every output line
    pub label: Option<String>,
}

impl Invocation {
    /// Create an invocation from a command line whose arguments contain no
    /// spaces
    pub fn new(text: impl Into<String>) -> Self {
        let text = text.into();
        let args = text.split_whitespace().map(str::to_string).collect();

        Self {
            text,
            args,
            label: None,
        }
    }

    /// Create an invocation from a program and its arguments
    pub fn from_args(args: Vec<String>) -> Self {
        Self {
            text: args.join(" "),
            args,
            label: None,
        }
    }

    /// Create an invocation from a builder, keeping each argument whole
    pub fn from_command(command: &impl CommandBuilder) -> Self {
        Self {
            text: command.build(),
            args: command.args(),
            label: None,
        }
    }

    /// Prefix output lines with `label`
    pub fn with_label(mut self, label: &str) -> Self {
        self.label = Some(label.to_string());
        self
    }

    fn program_and_args(&self) -> Result<(&str, &[String])> {
        let (program, args) = self
            .args
            .split_first()
            .ok_or_else(|| self.failure("empty command"))?;

        Ok((program.as_str(), args))
    }

    fn failure(&self, reason: impl Into<String>) -> CarbonError {
        CarbonError::ExternalTool {
            command: self.text.clone(),
            reason: reason.into(),
        }
    }
}

/// Runs command lines
#[async_trait]
pub trait Executor: Send + Sync {
    /// Run to completion, streaming output. Fails when the command cannot
    /// start or exits non-zero.
    async fn run(&self, invocation: &Invocation) -> Result<()>;

    /// Run to completion and return its standard output
    async fn capture(&self, invocation: &Invocation) -> Result<String>;
}

/// Executor spawning real processes
#[derive(Debug, Clone, Copy, Default)]
pub struct ShellExecutor;

#[async_trait]
impl Executor for ShellExecutor {
    async fn run(&self, invocation: &Invocation) -> Result<()> {
        let (program, args) = invocation.program_and_args()?;
        debug!("Running `{}`", invocation.text);

        let mut child = Command::new(program)
            .args(args)
            .stdin(Stdio::inherit())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|e| invocation.failure(format!("failed to start: {}", e)))?;

        let label = invocation.label.clone();
        let stdout = child
            .stdout
            .take()
            .map(|out| tokio::spawn(forward(out, label.clone(), false)));
        let stderr = child
            .stderr
            .take()
            .map(|err| tokio::spawn(forward(err, label, true)));

        let status = child
            .wait()
            .await
            .map_err(|e| invocation.failure(e.to_string()))?;

        for stream in [stdout, stderr].into_iter().flatten() {
            stream.await?;
        }

        if status.success() {
            Ok(())
        } else {
            Err(invocation.failure(format!("exited with {}", status)))
        }
    }

    async fn capture(&self, invocation: &Invocation) -> Result<String> {
        let (program, args) = invocation.program_and_args()?;
        debug!("Capturing `{}`", invocation.text);

        let output = Command::new(program)
            .args(args)
            .output()
            .await
            .map_err(|e| invocation.failure(format!("failed to start: {}", e)))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(invocation.failure(format!(
                "exited with {}: {}",
                output.status,
                stderr.trim()
            )));
        }

        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }
}

async fn forward<R>(reader: R, label: Option<String>, is_stderr: bool)
where
    R: AsyncRead + Unpin,
{
    let mut lines = BufReader::new(reader).lines();

    while let Ok(Some(line)) = lines.next_line().await {
        let line = match &label {
            Some(label) => format!("[ {} ]: {}", label, line),
            None => line,
        };

        if is_stderr {
            eprintln!("{}", line);
        } else {
            println!("{}", line);
        }
    }
}

/// Run invocations concurrently. Results come back in input order and one
/// failure does not stop the others.
pub async fn run_all(
    executor: Arc<dyn Executor>,
    invocations: Vec<Invocation>,
) -> Vec<(Invocation, Result<()>)> {
    let handles: Vec<_> = invocations
        .into_iter()
        .map(|invocation| {
            let executor = executor.clone();
            let pending = invocation.clone();
            let handle = tokio::spawn(async move {
                let result = executor.run(&invocation).await;
                (invocation, result)
            });
            (pending, handle)
        })
        .collect();

    let mut results = Vec::with_capacity(handles.len());
    for (pending, handle) in handles {
        match handle.await {
            Ok(done) => results.push(done),
            Err(e) => results.push((pending, Err(e.into()))),
        }
    }

    results
}
