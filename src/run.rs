// src/run.rs

use daemon::{Daemon, DaemonError, Job, JobFailure, JobUnit, Params, Result};
use logging::{SubscriberConfig, subscriber};
use serde_json::Value;
use tracing::subscriber::with_default;

use crate::config::RunConfig;

/// Daemonizes `job` with the run's log subscriber installed.
///
/// Returns the child's pid in the calling process. The subscriber stays the
/// thread default inside the forked child, so its lifecycle lines reach the
/// configured log directory.
pub fn spawn_job<J: JobUnit>(job: J, cfg: &RunConfig) -> Result<u32> {
    let sub_cfg = SubscriberConfig::builder()
        .format(cfg.log_format)
        .verbose(cfg.verbose)
        .quiet(cfg.quiet)
        .log_dir(Some(cfg.log_dir()))
        .colored(cfg.colored)
        .timestamps(cfg.timestamps)
        .build();
    let sub = subscriber(sub_cfg).map_err(|e| DaemonError::Environment(e.to_string()))?;
    with_default(sub, || Daemon::new(job, cfg.daemon.clone()).run())
}

/// Runs `work` once in a detached daemon and hands its result to `callback`.
pub fn spawn<W, C>(work: W, callback: C, cfg: &RunConfig) -> Result<u32>
where
    W: FnMut(Option<&Params>) -> std::result::Result<Value, JobFailure> + Send + 'static,
    C: FnMut(&Value, Option<&Params>) -> std::result::Result<(), JobFailure> + Send + 'static,
{
    let mut job = Job::new();
    job.set_work(work, None).set_callback(callback, None);
    spawn_job(job, cfg)
}
