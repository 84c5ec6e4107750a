// crates/daemon/tests/config.rs
use daemon::config::validator::{parse_bool, parse_reaping};
use daemon::{DaemonConfig, Reaping, load_config, parse_config};
use std::fs;
use std::path::PathBuf;
use tempfile::tempdir;

#[test]
fn empty_config_uses_defaults() {
    let cfg = parse_config("").unwrap();
    assert_eq!(cfg, DaemonConfig::default());
    assert_eq!(cfg.marker_prefix, "forkjob");
    assert_eq!(cfg.registry_file, "forkjob.pids");
    assert_eq!(cfg.reaping, Reaping::IgnoreSignal);
    assert!(cfg.redirect_stdio);
}

#[test]
fn parse_config_reads_all_keys() {
    let cfg = parse_config(
        "pid dir = /run/jobs\n\
         marker_prefix = worker\n\
         Registry-File = \"jobs.json\"\n\
         log dir = /var/log/jobs\n\
         reap = wait\n\
         redirect stdio = no\n",
    )
    .unwrap();
    assert_eq!(cfg.pid_dir, PathBuf::from("/run/jobs"));
    assert_eq!(cfg.marker_prefix, "worker");
    assert_eq!(cfg.registry_file, "jobs.json");
    assert_eq!(cfg.log_dir, PathBuf::from("/var/log/jobs"));
    assert_eq!(cfg.reaping, Reaping::BackgroundWait);
    assert!(!cfg.redirect_stdio);
    assert_eq!(cfg.registry_path(), PathBuf::from("/run/jobs/jobs.json"));
    assert_eq!(cfg.marker_path(12), PathBuf::from("/run/jobs/worker-12.pid"));
}

#[test]
fn parse_config_skips_comments() {
    let cfg = parse_config("# layout\n; other\nmarker prefix = a # trailing\n").unwrap();
    assert_eq!(cfg.marker_prefix, "a");
}

#[test]
fn parse_config_rejects_unknown_key() {
    let err = parse_config("port = 873").unwrap_err();
    assert!(err.to_string().contains("unknown option"));
}

#[test]
fn parse_config_rejects_bad_values() {
    assert!(parse_config("reap = sometimes").is_err());
    assert!(parse_config("redirect stdio = maybe").is_err());
    assert!(parse_config("marker prefix = a/b").is_err());
    assert!(parse_config("registry file = ..").is_err());
    assert!(parse_config("marker prefix").is_err());
}

#[test]
fn parse_bool_is_case_insensitive() {
    assert!(parse_bool("TRUE").unwrap());
    assert!(parse_bool("Yes").unwrap());
    assert!(!parse_bool("off").unwrap());
    assert!(parse_bool("2").is_err());
}

#[test]
fn parse_reaping_accepts_both_policies() {
    assert_eq!(parse_reaping("IGNORE").unwrap(), Reaping::IgnoreSignal);
    assert_eq!(parse_reaping("wait").unwrap(), Reaping::BackgroundWait);
}

#[test]
fn load_config_prefers_explicit_path() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("forkjob.conf");
    fs::write(&path, "pid dir = /srv/pids\n").unwrap();
    let cfg = load_config(Some(&path)).unwrap();
    assert_eq!(cfg.pid_dir, PathBuf::from("/srv/pids"));
    assert!(load_config(Some(&dir.path().join("missing.conf"))).is_err());
}

#[test]
fn builder_overrides_defaults() {
    let cfg = DaemonConfig::builder()
        .pid_dir("/tmp/p")
        .marker_prefix("x")
        .reaping(Reaping::BackgroundWait)
        .redirect_stdio(false)
        .build();
    assert_eq!(cfg.pid_dir, PathBuf::from("/tmp/p"));
    assert_eq!(cfg.marker_prefix, "x");
    assert_eq!(cfg.registry_file, "forkjob.pids");
    assert_eq!(cfg.reaping, Reaping::BackgroundWait);
    assert!(!cfg.redirect_stdio);
}
