//! Execution environments for evaluation commands
//!
//! The engine never provisions containers; it receives a handle to a
//! prepared environment (a running container with the repository checked
//! out at a known path) and runs shell commands inside it. The
//! [`ExecEnvironment`] trait is the seam that lets the pipeline run
//! against a scripted mock in tests.

use anyhow::Result;
use async_trait::async_trait;
use bollard::container::LogOutput;
use bollard::exec::{CreateExecOptions, StartExecResults};
use bollard::Docker;
use futures::StreamExt;
use std::time::Duration;
use tokio::time::{timeout_at, Instant};
use tracing::{debug, info};

/// Result of executing a command inside an environment
#[derive(Clone, Debug)]
pub struct ExecResult {
    /// Combined stdout and stderr, in arrival order
    pub output: String,
    pub exit_code: i64,
    pub duration_ms: u64,
    /// The command was cut off by the caller-supplied time limit
    pub timed_out: bool,
}

impl ExecResult {
    pub fn success(&self) -> bool {
        self.exit_code == 0 && !self.timed_out
    }
}

/// A prepared execution environment with a working tree and a shell.
#[async_trait]
pub trait ExecEnvironment: Send + Sync {
    /// Run a shell command, capturing combined output.
    ///
    /// A `time_limit` bounds the whole call; on expiry the result comes
    /// back with `timed_out` set and whatever output arrived before the
    /// cutoff. Transport-level failures (daemon unreachable, container
    /// gone) are errors.
    async fn run(&self, script: &str, time_limit: Option<Duration>) -> Result<ExecResult>;

    /// Path of the repository working tree inside the environment
    fn workdir(&self) -> &str;
}

/// Docker-backed execution environment
pub struct ContainerEnv {
    docker: Docker,
    container_id: String,
    workdir: String,
}

impl ContainerEnv {
    /// Attach to an already-running container.
    pub async fn connect(container_id: &str, workdir: &str) -> Result<Self> {
        let docker = Docker::connect_with_local_defaults()
            .map_err(|e| anyhow::anyhow!("Failed to connect to Docker: {}", e))?;

        docker
            .ping()
            .await
            .map_err(|e| anyhow::anyhow!("Failed to ping Docker: {}", e))?;

        let inspect = docker
            .inspect_container(container_id, None)
            .await
            .map_err(|e| anyhow::anyhow!("Failed to inspect container {}: {}", container_id, e))?;

        let running = inspect
            .state
            .and_then(|s| s.running)
            .unwrap_or(false);
        if !running {
            return Err(anyhow::anyhow!("Container {} is not running", container_id));
        }

        info!("Attached to container: {}", container_id);
        Ok(Self {
            docker,
            container_id: container_id.to_string(),
            workdir: workdir.to_string(),
        })
    }

    /// Wrap an existing Docker connection (for callers that manage their
    /// own client).
    pub fn with_docker(docker: Docker, container_id: String, workdir: String) -> Self {
        Self {
            docker,
            container_id,
            workdir,
        }
    }

    pub fn container_id(&self) -> &str {
        &self.container_id
    }
}

#[async_trait]
impl ExecEnvironment for ContainerEnv {
    async fn run(&self, script: &str, time_limit: Option<Duration>) -> Result<ExecResult> {
        let exec = self
            .docker
            .create_exec(
                &self.container_id,
                CreateExecOptions {
                    cmd: Some(vec![
                        "/bin/sh".to_string(),
                        "-c".to_string(),
                        script.to_string(),
                    ]),
                    attach_stdout: Some(true),
                    attach_stderr: Some(true),
                    working_dir: Some(self.workdir.clone()),
                    ..Default::default()
                },
            )
            .await
            .map_err(|e| anyhow::anyhow!("Failed to create exec: {}", e))?;

        let start = std::time::Instant::now();
        let deadline = time_limit.map(|limit| Instant::now() + limit);

        let (output, timed_out) = match self.docker.start_exec(&exec.id, None).await {
            Ok(StartExecResults::Attached { mut output, .. }) => {
                let mut buf = String::new();
                let mut timed_out = false;

                loop {
                    let next = match deadline {
                        Some(deadline) => match timeout_at(deadline, output.next()).await {
                            Ok(item) => item,
                            Err(_) => {
                                timed_out = true;
                                break;
                            }
                        },
                        None => output.next().await,
                    };

                    match next {
                        Some(Ok(LogOutput::StdOut { message }))
                        | Some(Ok(LogOutput::StdErr { message })) => {
                            buf.push_str(&String::from_utf8_lossy(&message));
                        }
                        Some(Ok(_)) => {}
                        Some(Err(e)) => {
                            return Err(anyhow::anyhow!("Exec stream error: {}", e));
                        }
                        None => break,
                    }
                }

                (buf, timed_out)
            }
            Ok(StartExecResults::Detached) => (String::new(), false),
            Err(e) => return Err(anyhow::anyhow!("Failed to start exec: {}", e)),
        };

        let exit_code = if timed_out {
            debug!(
                container_id = %self.container_id,
                "exec cut off by time limit"
            );
            -1
        } else {
            let inspect = self
                .docker
                .inspect_exec(&exec.id)
                .await
                .map_err(|e| anyhow::anyhow!("Failed to inspect exec: {}", e))?;
            inspect.exit_code.unwrap_or(-1)
        };

        Ok(ExecResult {
            output,
            exit_code,
            duration_ms: start.elapsed().as_millis() as u64,
            timed_out,
        })
    }

    fn workdir(&self) -> &str {
        &self.workdir
    }
}
