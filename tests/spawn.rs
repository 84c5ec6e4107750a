// tests/spawn.rs
#![cfg(unix)]

use forkjob::{DaemonConfig, Reaping, Registry, RunConfig, Status, spawn};
use serde_json::json;
use serial_test::serial;
use std::fs;
use std::thread::sleep;
use std::time::{Duration, Instant};
use tempfile::tempdir;

#[test]
#[serial]
fn spawn_runs_closures_in_a_daemon() {
    let dir = tempdir().unwrap();
    let out = dir.path().join("result.json");
    let daemon = DaemonConfig::builder()
        .pid_dir(dir.path().join("pids"))
        .log_dir(dir.path().join("log"))
        .reaping(Reaping::BackgroundWait)
        .build();
    let mut cfg = RunConfig::new(daemon.clone());
    cfg.quiet = true;
    cfg.colored = false;

    let target = out.clone();
    let pid = spawn(
        |_| Ok(json!({"answer": 42})),
        move |result, _| {
            fs::write(&target, result.to_string())?;
            Ok(())
        },
        &cfg,
    )
    .unwrap();

    let reg = Registry::new(daemon.registry_path());
    let deadline = Instant::now() + Duration::from_secs(10);
    while reg.get(pid).map(|r| r.status) != Some(Status::Completed) {
        assert!(Instant::now() < deadline, "daemon {pid} did not complete");
        sleep(Duration::from_millis(20));
    }
    assert_eq!(fs::read_to_string(&out).unwrap(), r#"{"answer":42}"#);

    let log = logging::log_file_path(&cfg.log_dir());
    let line = format!("COMPLETED: Process({pid}) is completed");
    while !fs::read_to_string(&log).unwrap_or_default().contains(&line) {
        assert!(Instant::now() < deadline, "no completion line in {}", log.display());
        sleep(Duration::from_millis(20));
    }
}

#[test]
#[serial]
fn spawn_reports_environment_errors() {
    let dir = tempdir().unwrap();
    let file = dir.path().join("not-a-dir");
    fs::write(&file, "").unwrap();
    let mut cfg = RunConfig::new(
        DaemonConfig::builder()
            .pid_dir(&file)
            .log_dir(dir.path().join("log"))
            .reaping(Reaping::BackgroundWait)
            .build(),
    );
    cfg.quiet = true;
    let err = spawn(|_| Ok(json!(null)), |_, _| Ok(()), &cfg).unwrap_err();
    assert!(matches!(err, forkjob::DaemonError::Environment(_)));
}
