use std::fs;
use std::fs::File;
use std::io::ErrorKind;
use std::path::Path;
use std::process::Stdio;

use chrono::Utc;
use tracing::debug;
use tracing::info;
use tracing::warn;

use super::SessionId;
use super::SessionInfo;
use super::SessionRegistry;
use super::SessionStatus;
use crate::config::AppConfig;
use crate::config::HomeLayout;
use crate::error::MonitorErr;
use crate::error::Result;
use crate::installer::Installer;
use crate::process::process_state;
use crate::process::terminate_process;

pub const STDOUT_LOG: &str = "stdout.log";
pub const STDERR_LOG: &str = "stderr.log";

/// Outcome of probing a recorded session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionLiveness {
    Running,
    NotRunning,
    NotFound,
}

/// Starts, stops and probes monitor processes, keeping the registry in step.
#[derive(Debug, Clone)]
pub struct SessionManager {
    config: AppConfig,
    registry: SessionRegistry,
    installer: Installer,
}

impl SessionManager {
    pub fn new(layout: HomeLayout, config: AppConfig) -> Result<Self> {
        let installer = Installer::new(&layout, &config)?;
        Ok(Self {
            config,
            registry: SessionRegistry::new(layout),
            installer,
        })
    }

    pub fn registry(&self) -> &SessionRegistry {
        &self.registry
    }

    /// Launches the monitor in `session_dir` and records it.
    ///
    /// The child is then watched for the startup grace period. If it exits
    /// inside that window the record is marked `Error` and the call fails
    /// with [`MonitorErr::EarlyExit`] pointing at the captured stderr.
    pub async fn start(
        &self,
        id: SessionId,
        session_dir: &Path,
        tool: &str,
    ) -> Result<SessionInfo> {
        let binary = self.installer.ensure_binary().await?;
        fs::create_dir_all(session_dir)?;
        let stdout = File::create(session_dir.join(STDOUT_LOG))?;
        let stderr_path = session_dir.join(STDERR_LOG);
        let stderr = File::create(&stderr_path)?;

        let mut command = std::process::Command::new(&binary);
        command
            .current_dir(session_dir)
            .env("LOG_LEVEL", self.config.monitor_log_level())
            .env("LOG_MODE", "stdout")
            .stdin(Stdio::null())
            .stdout(stdout)
            .stderr(stderr);
        #[cfg(unix)]
        {
            use std::os::unix::process::CommandExt;
            // Detach from the terminal's process group so Ctrl-C in the CLI
            // does not reach the monitor.
            command.process_group(0);
        }

        let mut child = tokio::process::Command::from(command)
            .spawn()
            .map_err(|source| MonitorErr::Spawn {
                binary: binary.clone(),
                source,
            })?;

        let session = SessionInfo {
            id,
            tool: tool.to_string(),
            session_dir: session_dir.to_path_buf(),
            pid: child.id(),
            started_at: Utc::now(),
            status: SessionStatus::Running,
        };
        self.registry.add(session.clone())?;
        info!(
            "started session {} for {tool} (pid {:?}) in {}",
            session.id,
            session.pid,
            session_dir.display()
        );

        let grace = self.config.startup_grace();
        match tokio::time::timeout(grace, child.wait()).await {
            Err(_elapsed) => {
                debug!("session {} survived {grace:?} startup window", session.id);
                Ok(session)
            }
            Ok(Ok(status)) => {
                warn!("session {} exited during startup: {status}", session.id);
                self.registry.update_status(&session.id, SessionStatus::Error)?;
                Err(MonitorErr::EarlyExit {
                    status: status.to_string(),
                    log: stderr_path,
                })
            }
            Ok(Err(err)) => {
                warn!("failed to watch session {}: {err}", session.id);
                self.registry.update_status(&session.id, SessionStatus::Error)?;
                Err(err.into())
            }
        }
    }

    /// Terminates the session's process, deletes its directory and drops the
    /// record. Returns false, touching nothing, when `id` is unknown.
    pub fn stop(&self, id: &SessionId) -> Result<bool> {
        let Some(session) = self.registry.get(id)? else {
            return Ok(false);
        };

        if let Some(pid) = session.pid
            && let Err(err) = terminate_process(pid)
        {
            debug!("ignoring signal failure for pid {pid}: {err}");
        }
        self.registry.update_status(id, SessionStatus::Stopped)?;

        match fs::remove_dir_all(&session.session_dir) {
            Ok(()) => {}
            Err(err) if err.kind() == ErrorKind::NotFound => {}
            Err(err) => warn!(
                "could not remove {}: {err}",
                session.session_dir.display()
            ),
        }
        self.registry.remove(id)?;
        info!("stopped session {id}");
        Ok(true)
    }

    pub fn liveness(&self, id: &SessionId) -> Result<SessionLiveness> {
        let Some(session) = self.registry.get(id)? else {
            return Ok(SessionLiveness::NotFound);
        };
        probe(&session)
    }

    /// Boolean view of [`Self::liveness`]: unknown sessions and probe
    /// failures both read as not running.
    pub fn is_running(&self, id: &SessionId) -> bool {
        matches!(self.liveness(id), Ok(SessionLiveness::Running))
    }

    /// Every recorded session paired with a fresh probe of its process.
    pub fn sessions_with_liveness(&self) -> Result<Vec<(SessionInfo, SessionLiveness)>> {
        Ok(self
            .registry
            .load_all()?
            .into_iter()
            .map(|session| {
                let liveness = probe(&session).unwrap_or_else(|err| {
                    debug!("probe of session {} failed: {err}", session.id);
                    SessionLiveness::NotRunning
                });
                (session, liveness)
            })
            .collect())
    }
}

fn probe(session: &SessionInfo) -> Result<SessionLiveness> {
    let Some(pid) = session.pid else {
        return Ok(SessionLiveness::NotRunning);
    };
    if process_state(pid)? {
        Ok(SessionLiveness::Running)
    } else {
        Ok(SessionLiveness::NotRunning)
    }
}
