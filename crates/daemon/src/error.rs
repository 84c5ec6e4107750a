// crates/daemon/src/error.rs
use std::io;
use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::registry::Status;

/// Failure raised by a job's work or callback.
pub type JobFailure = Box<dyn std::error::Error + Send + Sync>;

/// Error type for daemon operations.
#[derive(Debug, Error)]
pub enum DaemonError {
    #[error("runtime environment error ({0})")]
    Environment(String),
    #[error("fork process error: {0}")]
    Fork(#[source] io::Error),
    #[error("separate session error: {0}")]
    Session(#[source] io::Error),
    #[error("{}: {source}", path.display())]
    File {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error(transparent)]
    Registry(#[from] RegistryError),
    #[error("work function ({0}) is not found")]
    InvalidWork(String),
    #[error("callback function ({0}) is not found")]
    InvalidCallback(String),
    #[error("job failed: {0}")]
    Job(JobFailure),
}

/// Logical inconsistencies in the registry.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum RegistryError {
    #[error("pids file error: process {0} is not registered")]
    Unregistered(u32),
    #[error("pids file error: process {pid} is already {status}")]
    AlreadyTerminal { pid: u32, status: Status },
}

/// Result type for daemon operations.
pub type Result<T> = std::result::Result<T, DaemonError>;

pub(crate) fn file_error(path: &Path, source: io::Error) -> DaemonError {
    DaemonError::File {
        path: path.to_path_buf(),
        source,
    }
}
