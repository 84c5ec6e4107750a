// src/config.rs

use daemon::DaemonConfig;
use logging::LogFormat;
use std::path::PathBuf;

/// Configuration for one daemonized run started from library code.
#[derive(Clone, Debug)]
pub struct RunConfig {
    pub daemon: DaemonConfig,
    pub log_format: LogFormat,
    pub verbose: u8,
    pub quiet: bool,
    /// Overrides `daemon.log_dir` for the run's log sink.
    pub log_dir: Option<PathBuf>,
    pub colored: bool,
    pub timestamps: bool,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            daemon: DaemonConfig::default(),
            log_format: LogFormat::Text,
            verbose: 0,
            quiet: false,
            log_dir: None,
            colored: true,
            timestamps: false,
        }
    }
}

impl RunConfig {
    pub fn new(daemon: DaemonConfig) -> Self {
        Self {
            daemon,
            ..Self::default()
        }
    }

    pub fn log_dir(&self) -> PathBuf {
        self.log_dir
            .clone()
            .unwrap_or_else(|| self.daemon.log_dir.clone())
    }
}
