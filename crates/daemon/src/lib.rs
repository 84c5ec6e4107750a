// crates/daemon/src/lib.rs
//! Fork-and-forget job daemons with a shared on-disk lifecycle registry.

pub mod config;
pub mod error;
pub mod job;
pub mod marker;
mod os;
pub mod registry;
pub mod service;

pub use config::{DaemonConfig, DaemonConfigBuilder, Reaping, load_config, parse_config};
pub use error::{DaemonError, JobFailure, RegistryError, Result};
pub use job::{CallbackFn, Job, JobCatalog, JobUnit, Params, WorkFn};
pub use marker::{MarkerFile, read_pid};
pub use os::{is_alive, terminate};
pub use registry::{Entries, LifecycleRecord, Registry, Status, TerminalStatus, Timestamp};
pub use service::{Daemon, Phase};
