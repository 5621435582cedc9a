//! Command runner seam.
//!
//! A runner executes one already-rendered command for one target and reports
//! the raw `(exit status, stdout, stderr)` triple. Runners do not interpret
//! output and do not enforce timeouts; the [`RemoteExecutor`] does both.
//!
//! [`RemoteExecutor`]: super::executor::RemoteExecutor

use async_trait::async_trait;
use std::process::Stdio;
use std::sync::Arc;
use thiserror::Error;
use tokio::process::Command;
use tracing::debug;

use crate::config::SshConfig;
use crate::constants::SSH_TRANSPORT_EXIT_STATUS;
use crate::models::{Target, Transport};

/// Raw result of one process execution
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawOutput {
    pub exit_status: Option<i32>,
    pub stdout: String,
    pub stderr: String,
}

impl RawOutput {
    pub fn new(exit_status: i32, stdout: impl Into<String>, stderr: impl Into<String>) -> Self {
        Self {
            exit_status: Some(exit_status),
            stdout: stdout.into(),
            stderr: stderr.into(),
        }
    }

    pub fn succeeded(&self) -> bool {
        self.exit_status == Some(0)
    }

    fn from_process(output: std::process::Output) -> Self {
        Self {
            exit_status: output.status.code(),
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
        }
    }
}

/// Failures that prevent a command from producing a meaningful result
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum TransportError {
    #[error("failed to spawn {program}: {reason}")]
    Spawn { program: String, reason: String },

    #[error("connection to {address} failed: {reason}")]
    Connection { address: String, reason: String },

    #[error("I/O error while running command: {0}")]
    Io(String),
}

#[async_trait]
pub trait CommandRunner: Send + Sync {
    async fn run(&self, target: &Target, command: &str) -> Result<RawOutput, TransportError>;
}

#[async_trait]
impl<R: CommandRunner + ?Sized> CommandRunner for Arc<R> {
    async fn run(&self, target: &Target, command: &str) -> Result<RawOutput, TransportError> {
        (**self).run(target, command).await
    }
}

async fn capture(mut command: Command, program: &str) -> Result<RawOutput, TransportError> {
    command
        .kill_on_drop(true)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped());
    let child = command.spawn().map_err(|e| TransportError::Spawn {
        program: program.to_string(),
        reason: e.to_string(),
    })?;
    let output = child
        .wait_with_output()
        .await
        .map_err(|e| TransportError::Io(e.to_string()))?;
    Ok(RawOutput::from_process(output))
}

/// Runs commands on this machine through `sh -c`
#[derive(Debug, Clone, Default)]
pub struct LocalCommandRunner;

impl LocalCommandRunner {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl CommandRunner for LocalCommandRunner {
    async fn run(&self, target: &Target, command: &str) -> Result<RawOutput, TransportError> {
        debug!(target_id = %target.id, command = %command, "Running local command");
        let mut cmd = Command::new("sh");
        cmd.arg("-c").arg(command);
        capture(cmd, "sh").await
    }
}

/// Runs commands on remote hosts through the `ssh` client
#[derive(Debug, Clone)]
pub struct SshCommandRunner {
    config: SshConfig,
    program: String,
}

impl SshCommandRunner {
    pub fn new(config: SshConfig) -> Self {
        Self {
            config,
            program: "ssh".to_string(),
        }
    }

    /// Use a different client binary (e.g. a wrapper script)
    pub fn with_program(mut self, program: impl Into<String>) -> Self {
        self.program = program.into();
        self
    }

    /// Arguments passed to the client, ending with the destination and command
    pub fn build_args(&self, target: &Target, command: &str) -> Vec<String> {
        let (user, port) = match &target.transport {
            Transport::Ssh(params) => (
                params.user.clone().unwrap_or_else(|| self.config.user.clone()),
                params.port.unwrap_or(self.config.port),
            ),
            Transport::Local => (self.config.user.clone(), self.config.port),
        };

        let mut args = vec![
            "-o".to_string(),
            "BatchMode=yes".to_string(),
            "-o".to_string(),
            format!("ConnectTimeout={}", self.config.connect_timeout_secs),
            "-o".to_string(),
            format!(
                "StrictHostKeyChecking={}",
                self.config.strict_host_key_checking
            ),
            "-p".to_string(),
            port.to_string(),
        ];
        if let Some(identity) = &self.config.identity_file {
            args.push("-i".to_string());
            args.push(identity.display().to_string());
        }
        for option in &self.config.extra_options {
            args.push("-o".to_string());
            args.push(option.clone());
        }
        args.push(format!("{user}@{}", target.address));
        args.push(command.to_string());
        args
    }
}

#[async_trait]
impl CommandRunner for SshCommandRunner {
    async fn run(&self, target: &Target, command: &str) -> Result<RawOutput, TransportError> {
        debug!(
            target_id = %target.id,
            address = %target.address,
            command = %command,
            "Running remote command"
        );
        let mut cmd = Command::new(&self.program);
        cmd.args(self.build_args(target, command));
        let output = capture(cmd, &self.program).await?;
        // ssh reserves 255 for its own failures
        if output.exit_status == Some(SSH_TRANSPORT_EXIT_STATUS) {
            return Err(TransportError::Connection {
                address: target.address.clone(),
                reason: output.stderr.trim().to_string(),
            });
        }
        Ok(output)
    }
}

/// Picks the local or SSH runner from the target's transport
pub struct RoutingRunner {
    local: Arc<dyn CommandRunner>,
    remote: Arc<dyn CommandRunner>,
}

impl RoutingRunner {
    pub fn new(local: Arc<dyn CommandRunner>, remote: Arc<dyn CommandRunner>) -> Self {
        Self { local, remote }
    }

    pub fn from_config(ssh: &SshConfig) -> Self {
        Self::new(
            Arc::new(LocalCommandRunner::new()),
            Arc::new(SshCommandRunner::new(ssh.clone())),
        )
    }
}

impl std::fmt::Debug for RoutingRunner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RoutingRunner").finish_non_exhaustive()
    }
}

#[async_trait]
impl CommandRunner for RoutingRunner {
    async fn run(&self, target: &Target, command: &str) -> Result<RawOutput, TransportError> {
        match target.transport {
            Transport::Local => self.local.run(target, command).await,
            Transport::Ssh(_) => self.remote.run(target, command).await,
        }
    }
}
