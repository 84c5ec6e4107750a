// crates/daemon/src/config/model.rs

use std::path::{Path, PathBuf};

/// How the parent disowns the forked child.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Reaping {
    /// Set SIGCHLD to `SIG_IGN` so the kernel reaps the child.
    #[default]
    IgnoreSignal,
    /// Leave SIGCHLD alone and `waitpid` the child from a background thread.
    BackgroundWait,
}

/// Filesystem layout and process policy shared by a set of daemons.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DaemonConfig {
    pub pid_dir: PathBuf,
    pub marker_prefix: String,
    pub registry_file: String,
    pub log_dir: PathBuf,
    pub reaping: Reaping,
    pub redirect_stdio: bool,
}

impl Default for DaemonConfig {
    fn default() -> Self {
        let tmp = std::env::temp_dir();
        Self {
            pid_dir: tmp.join("forkjob-pid"),
            marker_prefix: "forkjob".to_string(),
            registry_file: "forkjob.pids".to_string(),
            log_dir: tmp.join("forkjob-log"),
            reaping: Reaping::IgnoreSignal,
            redirect_stdio: true,
        }
    }
}

impl DaemonConfig {
    pub fn builder() -> DaemonConfigBuilder {
        DaemonConfigBuilder::default()
    }

    pub fn registry_path(&self) -> PathBuf {
        self.pid_dir.join(&self.registry_file)
    }

    pub fn marker_path(&self, pid: u32) -> PathBuf {
        crate::marker::MarkerFile::path_for(&self.pid_dir, &self.marker_prefix, pid)
    }

    pub fn log_dir(&self) -> &Path {
        &self.log_dir
    }
}

#[derive(Default)]
pub struct DaemonConfigBuilder {
    cfg: DaemonConfig,
}

impl DaemonConfigBuilder {
    pub fn pid_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.cfg.pid_dir = dir.into();
        self
    }

    pub fn marker_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.cfg.marker_prefix = prefix.into();
        self
    }

    pub fn registry_file(mut self, name: impl Into<String>) -> Self {
        self.cfg.registry_file = name.into();
        self
    }

    pub fn log_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.cfg.log_dir = dir.into();
        self
    }

    pub fn reaping(mut self, reaping: Reaping) -> Self {
        self.cfg.reaping = reaping;
        self
    }

    pub fn redirect_stdio(mut self, redirect: bool) -> Self {
        self.cfg.redirect_stdio = redirect;
        self
    }

    pub fn build(self) -> DaemonConfig {
        self.cfg
    }
}
