// crates/cli/src/commands.rs

use std::io::{self, Write};

use daemon::{
    Daemon, DaemonConfig, Job, LifecycleRecord, MarkerFile, Registry, TerminalStatus, is_alive,
    terminate,
};
use logging::LogKind;
use serde_json::{Value, json};
use tracing::{info, warn};

use crate::utils::params_object;
use crate::{CliError, RunOpts, builtin};

pub(crate) fn start(opts: &RunOpts, mut cfg: DaemonConfig) -> Result<(), CliError> {
    let catalog = builtin::catalog();
    let mut job = Job::new();
    job.set_named_work(&catalog, &opts.work, params_object(&opts.params))?;
    job.set_named_callback(
        &catalog,
        &opts.callback,
        params_object(&opts.callback_params),
    )?;
    if opts.no_redirect {
        cfg.redirect_stdio = false;
    }
    let pid = Daemon::new(job, cfg).run()?;
    let mut out = io::stdout();
    let _ = writeln!(out, "{pid}");
    let _ = out.flush();
    Ok(())
}

fn registry(cfg: &DaemonConfig) -> Registry {
    Registry::new(cfg.registry_path())
}

fn describe(cfg: &DaemonConfig, pid: u32, record: &LifecycleRecord) -> Value {
    json!({
        "pid": pid,
        "status": record.status,
        "created_at": record.created_at,
        "ended_at": record.ended_at.map(|t| t.to_string()).unwrap_or_default(),
        "marker": cfg.marker_path(pid).is_file(),
        "alive": !record.is_terminal() && is_alive(pid),
    })
}

fn print_row(out: &mut impl Write, cfg: &DaemonConfig, pid: u32, record: &LifecycleRecord) {
    let ended = record
        .ended_at
        .map(|t| t.to_string())
        .unwrap_or_else(|| "-".to_string());
    let marker = if cfg.marker_path(pid).is_file() {
        "present"
    } else {
        "absent"
    };
    let _ = writeln!(
        out,
        "{pid:<8} {:<10} {:<20} {:<20} {marker}",
        record.status.as_str(),
        record.created_at.to_string(),
        ended
    );
}

fn print_header(out: &mut impl Write) {
    let _ = writeln!(
        out,
        "{:<8} {:<10} {:<20} {:<20} MARKER",
        "PID", "STATUS", "CREATED_AT", "ENDED_AT"
    );
}

pub(crate) fn status(cfg: &DaemonConfig, pid: u32, as_json: bool) -> Result<(), CliError> {
    let record = registry(cfg).get(pid).ok_or(CliError::UnknownPid(pid))?;
    let mut out = io::stdout();
    if as_json {
        let _ = writeln!(out, "{}", describe(cfg, pid, &record));
    } else {
        print_header(&mut out);
        print_row(&mut out, cfg, pid, &record);
    }
    Ok(())
}

pub(crate) fn list(cfg: &DaemonConfig, as_json: bool) -> Result<(), CliError> {
    let entries = registry(cfg).load();
    let mut out = io::stdout();
    if as_json {
        let all: Vec<Value> = entries
            .iter()
            .map(|(pid, record)| describe(cfg, *pid, record))
            .collect();
        let _ = writeln!(out, "{}", Value::Array(all));
    } else {
        print_header(&mut out);
        for (pid, record) in &entries {
            print_row(&mut out, cfg, *pid, record);
        }
    }
    Ok(())
}

pub(crate) fn stop(cfg: &DaemonConfig, pid: u32) -> Result<(), CliError> {
    let registry = registry(cfg);
    let record = registry.get(pid).ok_or(CliError::UnknownPid(pid))?;
    if record.is_terminal() {
        return Err(CliError::NotRunning {
            pid,
            status: record.status,
        });
    }
    // Without a marker the pid may have been reused; only the record is updated.
    let marker = MarkerFile::existing(&cfg.pid_dir, &cfg.marker_prefix, pid);
    match &marker {
        Some(_) => {
            let signalled =
                terminate(pid).map_err(|source| CliError::Signal { pid, source })?;
            if !signalled {
                warn!(pid, "process already gone");
            }
        }
        None => warn!(pid, "marker file missing, not signalling"),
    }
    registry.transition_terminal(pid, TerminalStatus::Stopped)?;
    if let Some(marker) = marker {
        marker.remove()?;
    }
    info!(kind = %LogKind::Stopped, pid, "Process({pid}) is stopped");
    let mut out = io::stdout();
    let _ = writeln!(out, "stopped {pid}");
    Ok(())
}

pub(crate) fn prune(cfg: &DaemonConfig) -> Result<(), CliError> {
    let removed = registry(cfg).prune()?;
    let mut out = io::stdout();
    let _ = writeln!(out, "pruned {removed}");
    Ok(())
}
