// tests/cli.rs
#![cfg(unix)]

use assert_cmd::Command;
use daemon::{Registry, Status};
use std::process::Command as StdCommand;
use predicates::prelude::*;
use serde_json::Value;
use std::fs;
use std::path::Path;
use std::thread::sleep;
use std::time::{Duration, Instant};
use tempfile::tempdir;

fn forkjob(dir: &Path) -> Command {
    let mut cmd = Command::cargo_bin("forkjob").unwrap();
    cmd.env_remove("FORKJOB_CONFIG_PATH").args([
        "--pid-dir",
        dir.join("pids").to_str().unwrap(),
        "--log-dir",
        dir.join("log").to_str().unwrap(),
    ]);
    cmd
}

fn start(dir: &Path, args: &[&str]) -> u32 {
    let out = forkjob(dir).arg("run").args(args).output().unwrap();
    assert!(out.status.success(), "{}", String::from_utf8_lossy(&out.stderr));
    String::from_utf8(out.stdout).unwrap().trim().parse().unwrap()
}

fn status_json(dir: &Path, pid: u32) -> Value {
    let out = forkjob(dir)
        .args(["status", &pid.to_string(), "--json"])
        .output()
        .unwrap();
    assert!(out.status.success(), "{}", String::from_utf8_lossy(&out.stderr));
    serde_json::from_slice(&out.stdout).unwrap()
}

fn wait_for_status(dir: &Path, pid: u32, status: Status) -> Value {
    let reg = Registry::new(dir.join("pids").join("forkjob.pids"));
    let deadline = Instant::now() + Duration::from_secs(10);
    while reg.get(pid).map(|r| r.status) != Some(status) {
        assert!(Instant::now() < deadline, "pid {pid} never reached {status}");
        sleep(Duration::from_millis(20));
    }
    status_json(dir, pid)
}

fn wait_for_log_line(dir: &Path, line: &str) -> String {
    let path = logging::log_file_path(&dir.join("log"));
    let deadline = Instant::now() + Duration::from_secs(10);
    loop {
        let log = fs::read_to_string(&path).unwrap_or_default();
        if log.contains(line) {
            return log;
        }
        assert!(Instant::now() < deadline, "{line:?} not found in {log}");
        sleep(Duration::from_millis(20));
    }
}

fn wait_for_marker_removal(dir: &Path, pid: u32) {
    let marker = dir.join("pids").join(format!("forkjob-{pid}.pid"));
    let deadline = Instant::now() + Duration::from_secs(10);
    while marker.exists() {
        assert!(Instant::now() < deadline, "marker for {pid} was not removed");
        sleep(Duration::from_millis(20));
    }
}

#[test]
fn run_write_job_completes() {
    let dir = tempdir().unwrap();
    let target = dir.path().join("out.txt");
    let report = dir.path().join("report.json");
    let pid = start(
        dir.path(),
        &[
            "write",
            "--param",
            &format!("path={}", target.display()),
            "--param",
            "content=ok",
            "--callback",
            "write-result",
            "--callback-param",
            &format!("path={}", report.display()),
        ],
    );

    let status = wait_for_status(dir.path(), pid, Status::Completed);
    assert_eq!(status["pid"], pid);
    assert_eq!(status["status"], "COMPLETED");
    assert_ne!(status["ended_at"], "");
    wait_for_marker_removal(dir.path(), pid);

    assert_eq!(fs::read_to_string(&target).unwrap(), "ok");
    let result: Value = serde_json::from_str(&fs::read_to_string(&report).unwrap()).unwrap();
    assert_eq!(result["bytes"], 2);

    let log = wait_for_log_line(dir.path(), &format!("COMPLETED: Process({pid}) is completed"));
    assert!(log.contains(&format!("RUNNING: Process({pid}) start running")));
}

#[test]
fn failing_job_ends_stopped() {
    let dir = tempdir().unwrap();
    let pid = start(dir.path(), &["exec", "--param", "program=false"]);
    wait_for_status(dir.path(), pid, Status::Stopped);
    wait_for_marker_removal(dir.path(), pid);
    let log = wait_for_log_line(dir.path(), &format!("STOPPED: Process({pid}) is stopped"));
    assert!(log.contains("ERROR: job failed: false exited"));
}

#[test]
fn unknown_work_is_rejected_before_fork() {
    let dir = tempdir().unwrap();
    forkjob(dir.path())
        .args(["run", "nope"])
        .assert()
        .failure()
        .code(1)
        .stderr(predicate::str::contains("work function (nope) is not found"));
    assert!(!dir.path().join("pids").join("forkjob.pids").exists());
}

#[test]
fn status_of_unknown_pid_fails() {
    let dir = tempdir().unwrap();
    forkjob(dir.path())
        .args(["status", "99999"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("process 99999 is not registered"));
}

#[test]
fn stop_marks_running_job_stopped() {
    let dir = tempdir().unwrap();
    let pid = start(dir.path(), &["sleep", "--param", "secs=30"]);
    let status = wait_for_status(dir.path(), pid, Status::Running);
    assert_eq!(status["ended_at"], "");
    assert_eq!(status["marker"], true);
    assert_eq!(status["alive"], true);

    forkjob(dir.path())
        .args(["stop", &pid.to_string()])
        .assert()
        .success()
        .stdout(predicate::str::contains(format!("stopped {pid}")));

    let status = status_json(dir.path(), pid);
    assert_eq!(status["status"], "STOPPED");
    assert_eq!(status["marker"], false);

    forkjob(dir.path())
        .args(["stop", &pid.to_string()])
        .assert()
        .failure()
        .stderr(predicate::str::contains("is not running (STOPPED)"));
}

#[test]
fn list_and_prune() {
    let dir = tempdir().unwrap();
    let pid = start(dir.path(), &["sleep", "--param", "secs=0"]);
    wait_for_status(dir.path(), pid, Status::Completed);

    let out = forkjob(dir.path()).args(["list", "--json"]).output().unwrap();
    assert!(out.status.success());
    let all: Value = serde_json::from_slice(&out.stdout).unwrap();
    assert_eq!(all.as_array().unwrap().len(), 1);
    assert_eq!(all[0]["pid"], pid);

    forkjob(dir.path())
        .arg("list")
        .assert()
        .success()
        .stdout(predicate::str::contains("COMPLETED"));

    forkjob(dir.path())
        .arg("prune")
        .assert()
        .success()
        .stdout("pruned 1\n");

    let out = forkjob(dir.path()).args(["list", "--json"]).output().unwrap();
    let all: Value = serde_json::from_slice(&out.stdout).unwrap();
    assert!(all.as_array().unwrap().is_empty());
}

#[test]
fn pre_fork_error_is_reported_once() {
    let dir = tempdir().unwrap();
    fs::write(dir.path().join("pids"), "").unwrap();
    let out = forkjob(dir.path())
        .args(["run", "sleep", "--param", "secs=0"])
        .output()
        .unwrap();
    assert_eq!(out.status.code(), Some(1));
    let stderr = String::from_utf8(out.stderr).unwrap();
    assert_eq!(
        stderr.matches("runtime environment error").count(),
        1,
        "{stderr}"
    );
    let log = fs::read_to_string(logging::log_file_path(&dir.path().join("log"))).unwrap();
    assert!(log.contains("ERROR: runtime environment error"));
}

#[test]
fn stop_without_marker_leaves_process_alone() {
    let dir = tempdir().unwrap();
    let mut bystander = StdCommand::new("sleep").arg("30").spawn().unwrap();
    let pid = bystander.id();
    let reg = Registry::new(dir.path().join("pids").join("forkjob.pids"));
    reg.upsert_running(pid).unwrap();

    forkjob(dir.path())
        .args(["stop", &pid.to_string()])
        .assert()
        .success()
        .stdout(predicate::str::contains(format!("stopped {pid}")));

    assert_eq!(reg.get(pid).unwrap().status, Status::Stopped);
    sleep(Duration::from_millis(200));
    assert!(bystander.try_wait().unwrap().is_none());
    let _ = bystander.kill();
    let _ = bystander.wait();
}
