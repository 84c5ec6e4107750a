// crates/daemon/src/service.rs
use std::fs;
use std::panic::{self, AssertUnwindSafe};

use logging::LogKind;
use tracing::{debug, error, info, warn};

use crate::config::validator::validate_config;
use crate::config::{DaemonConfig, Reaping};
use crate::error::{DaemonError, JobFailure, Result};
use crate::job::JobUnit;
use crate::marker::MarkerFile;
use crate::registry::{Registry, TerminalStatus};

/// Where a [`Daemon`] is in its run.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Phase {
    Initialized,
    ForkedParent,
    ForkedChild,
    Running,
    Terminated,
}

/// Runs one job in a detached child process and records its lifecycle.
///
/// The parent gets the child's pid back from [`Daemon::run`] without waiting.
/// The child detaches from its session, writes its marker file, registers as
/// RUNNING, runs the job, records the terminal status, removes the marker and
/// terminates itself. It never returns into the caller's code.
pub struct Daemon<J> {
    job: J,
    config: DaemonConfig,
    registry: Registry,
    phase: Phase,
}

impl<J: JobUnit> Daemon<J> {
    pub fn new(job: J, config: DaemonConfig) -> Self {
        let registry = Registry::new(config.registry_path());
        Self {
            job,
            config,
            registry,
            phase: Phase::Initialized,
        }
    }

    pub fn config(&self) -> &DaemonConfig {
        &self.config
    }

    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    /// Validates the environment and the job, then forks.
    ///
    /// Returns the child's pid in the parent. Errors are only returned for
    /// failures that happen before the fork. They also reach the lifecycle
    /// log, but stay off stderr below debug level; reporting them is up to
    /// the caller.
    pub fn run(self) -> Result<u32> {
        let res = self.check_env().and_then(|_| self.job.validate());
        if let Err(e) = res {
            debug!(kind = %LogKind::Error, "{e}");
            return Err(e);
        }
        self.spawn()
    }

    fn check_env(&self) -> Result<()> {
        if !cfg!(unix) {
            return Err(DaemonError::Environment(
                "process forking is not supported on this platform".to_string(),
            ));
        }
        validate_config(&self.config).map_err(|e| DaemonError::Environment(e.to_string()))?;
        let dir = &self.config.pid_dir;
        fs::create_dir_all(dir).map_err(|e| {
            DaemonError::Environment(format!("cannot create {}: {e}", dir.display()))
        })?;
        if !dir.is_dir() {
            return Err(DaemonError::Environment(format!(
                "{} is not a directory",
                dir.display()
            )));
        }
        Ok(())
    }

    #[cfg(unix)]
    fn spawn(mut self) -> Result<u32> {
        use crate::os;
        use nix::unistd::ForkResult;

        match os::fork_daemon() {
            Ok(ForkResult::Parent { child }) => {
                self.enter(Phase::ForkedParent);
                let pid = child.as_raw() as u32;
                let disowned = match self.config.reaping {
                    Reaping::IgnoreSignal => os::ignore_child_exit(),
                    Reaping::BackgroundWait => os::reap_in_background(child),
                };
                if let Err(e) = disowned {
                    warn!(pid, "failed to disown child: {e}");
                }
                Ok(pid)
            }
            Ok(ForkResult::Child) => {
                self.enter(Phase::ForkedChild);
                let code = self.child_main();
                std::process::exit(code)
            }
            Err(e) => {
                let err = DaemonError::Fork(e);
                debug!(kind = %LogKind::Error, "{err}");
                Err(err)
            }
        }
    }

    #[cfg(not(unix))]
    fn spawn(self) -> Result<u32> {
        Err(DaemonError::Environment(
            "process forking is not supported on this platform".to_string(),
        ))
    }

    fn enter(&mut self, phase: Phase) {
        debug!(from = ?self.phase, to = ?phase, "daemon phase");
        self.phase = phase;
    }

    /// Body of the forked child. Returns the process exit status.
    #[cfg(unix)]
    fn child_main(&mut self) -> i32 {
        let pid = std::process::id();
        let marker = match self.setup_child(pid) {
            Ok(marker) => marker,
            Err(e) => {
                error!(kind = %LogKind::Error, pid, "{e}");
                return 1;
            }
        };
        self.enter(Phase::Running);
        info!(kind = %LogKind::Running, pid, "Process({pid}) start running");

        match self.run_job() {
            Ok(()) => match self.complete(pid, marker) {
                Ok(()) => {
                    self.enter(Phase::Terminated);
                    info!(kind = %LogKind::Completed, pid, "Process({pid}) is completed");
                    if let Err(e) = crate::os::terminate_self() {
                        warn!(pid, "failed to signal self: {e}");
                    }
                    0
                }
                Err(e) => {
                    error!(kind = %LogKind::Error, pid, "{e}");
                    1
                }
            },
            Err(failure) => {
                let err = DaemonError::Job(failure);
                error!(kind = %LogKind::Error, pid, "{err}");
                self.abandon(pid, marker);
                1
            }
        }
    }

    /// Detach, create the marker and register as running.
    #[cfg(unix)]
    fn setup_child(&mut self, pid: u32) -> Result<MarkerFile> {
        use crate::os;

        os::detach_session().map_err(DaemonError::Session)?;
        os::clear_umask();
        if self.config.redirect_stdio {
            os::redirect_stdio().map_err(|e| DaemonError::Environment(e.to_string()))?;
        }
        let marker = MarkerFile::create(&self.config.pid_dir, &self.config.marker_prefix, pid)?;
        if let Err(e) = self.registry.upsert_running(pid) {
            discard_marker(marker);
            return Err(e);
        }
        Ok(marker)
    }

    /// Runs `execute` then `finish`, turning panics into failures.
    fn run_job(&mut self) -> std::result::Result<(), JobFailure> {
        let job = &mut self.job;
        panic::catch_unwind(AssertUnwindSafe(|| {
            job.execute()?;
            job.finish()
        }))
        .unwrap_or_else(|payload| Err(panic_message(payload.as_ref()).into()))
    }

    fn complete(&mut self, pid: u32, marker: MarkerFile) -> Result<()> {
        if let Err(e) = self
            .registry
            .transition_terminal(pid, TerminalStatus::Completed)
        {
            discard_marker(marker);
            return Err(e);
        }
        marker.remove()
    }

    /// Marks a failed job STOPPED and removes its marker.
    fn abandon(&mut self, pid: u32, marker: MarkerFile) {
        match self
            .registry
            .transition_terminal(pid, TerminalStatus::Stopped)
        {
            Ok(_) => info!(kind = %LogKind::Stopped, pid, "Process({pid}) is stopped"),
            Err(e) => error!(kind = %LogKind::Error, pid, "{e}"),
        }
        discard_marker(marker);
        self.enter(Phase::Terminated);
    }
}

fn discard_marker(marker: MarkerFile) {
    if let Err(e) = marker.remove() {
        error!(kind = %LogKind::Error, "{e}");
    }
}

fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        format!("panicked: {s}")
    } else if let Some(s) = payload.downcast_ref::<String>() {
        format!("panicked: {s}")
    } else {
        "panicked".to_string()
    }
}
