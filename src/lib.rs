// src/lib.rs
//! Run a job once in a detached daemon process.
//!
//! The daemon registers itself as RUNNING in a registry file shared by every
//! daemon on the host, runs the job's work function, hands the result to its
//! callback and records COMPLETED (or STOPPED when the job fails) before
//! exiting.
//!
//! ```no_run
//! use forkjob::{RunConfig, spawn};
//! use serde_json::json;
//!
//! let pid = spawn(
//!     |_| Ok(json!({"answer": 42})),
//!     |result, _| {
//!         println!("{result}");
//!         Ok(())
//!     },
//!     &RunConfig::default(),
//! )?;
//! println!("started {pid}");
//! # Ok::<(), forkjob::DaemonError>(())
//! ```

mod config;
mod run;

pub use config::RunConfig;
pub use daemon::{
    Daemon, DaemonConfig, DaemonError, Job, JobCatalog, JobFailure, JobUnit, LifecycleRecord,
    Params, Reaping, Registry, Status,
};
pub use run::{spawn, spawn_job};
