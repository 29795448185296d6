//! # Kernel Session Module / 内核会话模块
//!
//! Kernel sessions backed by a bridge process. The bridge owns one Jupyter
//! kernel and speaks newline-delimited JSON over its stdin and stdout:
//!
//! ```text
//! bridge -> runner  {"event":"ready"}
//! runner -> bridge  {"op":"execute","code":"print(1)"}
//! bridge -> runner  {"event":"result","outputs":[...],"errored":false}
//! runner -> bridge  {"op":"shutdown"}
//! ```
//!
//! The kernel name and seed are passed through the `NOTEBOOK_RUNNER_KERNEL` and
//! `NOTEBOOK_RUNNER_SEED` environment variables. A Python bridge built on
//! `jupyter_client` is bundled and used unless a custom command is configured.
//!
//! On Unix each bridge runs in its own process group. When a session is
//! released the whole group is killed, so helpers the bridge started do not
//! outlive the run.
//!
//! 由桥接进程支持的内核会话。桥接进程拥有一个 Jupyter 内核，
//! 并通过 stdin 和 stdout 以换行分隔的 JSON 进行通信。

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fs;
use std::process::Stdio;
use std::time::Duration;
use tempfile::TempDir;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader, Lines};
use tokio::process::{Child, ChildStdin, ChildStdout, Command};
use tracing::{debug, info, warn};

use crate::core::{
    config::KernelConfig,
    error::SessionError,
    execution::{Execution, ExecutorSession, SessionFactory},
    notebook::Notebook,
    output::Output,
};
use crate::infra::fs::notebook_dir;

const BRIDGE_SOURCE: &str = include_str!("../../assets/kernel_bridge.py");
const BRIDGE_FILE: &str = "kernel_bridge.py";
const DEFAULT_KERNEL: &str = "python3";
const SHUTDOWN_GRACE: Duration = Duration::from_secs(10);
/// Grace period when the bridge is still busy with a request nobody waits for.
const INTERRUPTED_GRACE: Duration = Duration::from_secs(2);

pub const KERNEL_ENV: &str = "NOTEBOOK_RUNNER_KERNEL";
pub const SEED_ENV: &str = "NOTEBOOK_RUNNER_SEED";

#[derive(Debug, Serialize)]
#[serde(tag = "op", rename_all = "snake_case")]
enum BridgeRequest<'a> {
    Execute { code: &'a str },
    Shutdown,
}

#[derive(Debug, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
enum BridgeEvent {
    Ready,
    Result {
        outputs: Vec<Output>,
        errored: bool,
    },
    Failed {
        message: String,
    },
}

/// Starts one bridge process per notebook.
///
/// When the bundled bridge is used, the script lives in a temporary directory
/// owned by the factory and is removed when the factory is dropped.
pub struct KernelFactory {
    program: String,
    args: Vec<String>,
    kernel_override: Option<String>,
    startup_timeout: Duration,
    _bridge_dir: Option<TempDir>,
}

impl KernelFactory {
    pub fn new(config: &KernelConfig, kernel_override: Option<String>) -> Result<Self, SessionError> {
        let kernel_override = kernel_override.or_else(|| config.name.clone());
        let startup_timeout = config.startup_timeout();

        if let Some(command) = &config.command {
            let expanded = shellexpand::full(command)
                .map_err(|e| SessionError::InvalidCommand(e.to_string()))?
                .to_string();
            let mut parts = shlex::split(&expanded)
                .ok_or_else(|| SessionError::InvalidCommand(expanded.clone()))?;
            if parts.is_empty() {
                return Err(SessionError::InvalidCommand(expanded));
            }
            let program = parts.remove(0);
            return Ok(Self {
                program,
                args: parts,
                kernel_override,
                startup_timeout,
                _bridge_dir: None,
            });
        }

        let bridge_dir = tempfile::Builder::new()
            .prefix("notebook_runner_")
            .tempdir()?;
        let script = bridge_dir.path().join(BRIDGE_FILE);
        fs::write(&script, BRIDGE_SOURCE)?;

        Ok(Self {
            program: config.python.clone(),
            args: vec!["-u".to_string(), script.display().to_string()],
            kernel_override,
            startup_timeout,
            _bridge_dir: Some(bridge_dir),
        })
    }

    fn command_line(&self) -> String {
        std::iter::once(self.program.as_str())
            .chain(self.args.iter().map(String::as_str))
            .collect::<Vec<_>>()
            .join(" ")
    }
}

#[async_trait]
impl SessionFactory for KernelFactory {
    async fn acquire(
        &self,
        notebook: &Notebook,
        seed: i64,
    ) -> Result<Box<dyn ExecutorSession>, SessionError> {
        let kernel = self
            .kernel_override
            .as_deref()
            .or(notebook.kernel_name())
            .unwrap_or(DEFAULT_KERNEL);

        let mut cmd = Command::new(&self.program);
        cmd.args(&self.args)
            .env(KERNEL_ENV, kernel)
            .env(SEED_ENV, seed.to_string())
            .current_dir(notebook_dir(notebook.path()))
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::inherit())
            .kill_on_drop(true);
        #[cfg(unix)]
        cmd.process_group(0);

        let mut child = cmd.spawn().map_err(|source| SessionError::Spawn {
            command: self.command_line(),
            source,
        })?;
        debug!(pid = ?child.id(), kernel, seed, "kernel bridge spawned");

        let (Some(stdin), Some(stdout)) = (child.stdin.take(), child.stdout.take()) else {
            return Err(SessionError::Closed);
        };
        let mut session = KernelSession {
            process_group: child.id(),
            child,
            stdin,
            lines: BufReader::new(stdout).lines(),
            in_flight: false,
            released: false,
        };

        // On any early return the session is dropped and the bridge is killed.
        match tokio::time::timeout(self.startup_timeout, session.read_event()).await {
            Ok(Ok(BridgeEvent::Ready)) => {}
            Ok(Ok(BridgeEvent::Failed { message })) => return Err(SessionError::Bridge(message)),
            Ok(Ok(BridgeEvent::Result { .. })) => {
                return Err(SessionError::Bridge(
                    "result received before the kernel was ready".to_string(),
                ));
            }
            Ok(Err(e)) => return Err(e),
            Err(_) => return Err(SessionError::StartupTimeout(self.startup_timeout)),
        }

        info!(
            notebook = %notebook.path().display(),
            kernel,
            language = notebook.language().unwrap_or("unknown"),
            "kernel ready"
        );
        Ok(Box::new(session))
    }
}

/// A running bridge process. Killed on drop if it was not shut down.
pub struct KernelSession {
    child: Child,
    /// The bridge's pid, which is also its process group id on Unix.
    process_group: Option<u32>,
    stdin: ChildStdin,
    lines: Lines<BufReader<ChildStdout>>,
    /// Set while a request awaits its reply. Stays set when the caller stops
    /// waiting, e.g. after a cell timeout.
    in_flight: bool,
    released: bool,
}

impl KernelSession {
    async fn send(&mut self, request: &BridgeRequest<'_>) -> Result<(), SessionError> {
        let mut line = serde_json::to_string(request)?;
        line.push('\n');
        self.stdin.write_all(line.as_bytes()).await?;
        self.stdin.flush().await?;
        Ok(())
    }

    async fn read_event(&mut self) -> Result<BridgeEvent, SessionError> {
        loop {
            match self.lines.next_line().await? {
                Some(line) if line.trim().is_empty() => continue,
                Some(line) => return Ok(serde_json::from_str(&line)?),
                None => return Err(SessionError::Closed),
            }
        }
    }

    /// Kills every process left in the bridge's process group.
    #[cfg(unix)]
    fn kill_process_group(&self) {
        use nix::errno::Errno;
        use nix::sys::signal::{killpg, Signal};
        use nix::unistd::Pid;

        let Some(pgid) = self.process_group.and_then(|id| i32::try_from(id).ok()) else {
            return;
        };
        match killpg(Pid::from_raw(pgid), Signal::SIGKILL) {
            Ok(()) => debug!(pgid, "kernel bridge process group killed"),
            Err(Errno::ESRCH) => {}
            Err(e) => warn!(pgid, error = %e, "could not kill the kernel bridge process group"),
        }
    }

    #[cfg(not(unix))]
    fn kill_process_group(&self) {}
}

impl Drop for KernelSession {
    fn drop(&mut self) {
        if !self.released {
            self.kill_process_group();
        }
    }
}

#[async_trait]
impl ExecutorSession for KernelSession {
    async fn execute(&mut self, source: &str) -> Result<Execution, SessionError> {
        self.in_flight = true;
        self.send(&BridgeRequest::Execute { code: source }).await?;
        let event = self.read_event().await?;
        self.in_flight = false;
        match event {
            BridgeEvent::Result { outputs, errored } => Ok(Execution { outputs, errored }),
            BridgeEvent::Failed { message } => Err(SessionError::Bridge(message)),
            BridgeEvent::Ready => Err(SessionError::Bridge(
                "unexpected ready event while executing".to_string(),
            )),
        }
    }

    async fn shutdown(&mut self) -> Result<(), SessionError> {
        if let Err(e) = self.send(&BridgeRequest::Shutdown).await {
            debug!(error = %e, "bridge did not accept the shutdown request");
        }

        let grace = if self.in_flight {
            INTERRUPTED_GRACE
        } else {
            SHUTDOWN_GRACE
        };
        let exited = match tokio::time::timeout(grace, self.child.wait()).await {
            Ok(status) => status.map(|status| debug!(?status, "kernel bridge exited")),
            Err(_) => {
                warn!(pid = ?self.child.id(), "kernel bridge ignored shutdown, killing it");
                self.child.kill().await
            }
        };

        self.kill_process_group();
        self.released = true;
        exited?;
        Ok(())
    }
}
