// crates/cli/src/builtin.rs
//! Work and callback functions available to `forkjob run`.

use std::fs;
use std::process::Command;
use std::thread;
use std::time::Duration;

use daemon::{JobCatalog, JobFailure, Params};
use logging::LogKind;
use serde_json::{Value, json};
use tracing::info;

use crate::utils::{param_str, param_u64};

pub fn catalog() -> JobCatalog {
    let mut catalog = JobCatalog::new();
    catalog
        .register_work("sleep", sleep)
        .register_work("write", write)
        .register_work("exec", exec)
        .register_callback("log", log_result)
        .register_callback("write-result", write_result);
    catalog
}

/// Sleeps for `secs` seconds.
fn sleep(params: Option<&Params>) -> Result<Value, JobFailure> {
    let secs = param_u64(params, "secs")?;
    thread::sleep(Duration::from_secs(secs));
    Ok(json!({ "slept": secs }))
}

/// Writes `content` to `path`.
fn write(params: Option<&Params>) -> Result<Value, JobFailure> {
    let path = param_str(params, "path")?;
    let content = params
        .and_then(|p| p.get("content"))
        .and_then(Value::as_str)
        .unwrap_or_default();
    fs::write(path, content)?;
    Ok(json!({ "path": path, "bytes": content.len() }))
}

/// Runs `program` with the shell-style `args` and captures its output.
fn exec(params: Option<&Params>) -> Result<Value, JobFailure> {
    let program = param_str(params, "program")?;
    let args = match params.and_then(|p| p.get("args")).and_then(Value::as_str) {
        Some(raw) => shell_words::split(raw)?,
        None => Vec::new(),
    };
    let output = Command::new(program).args(&args).output()?;
    let result = json!({
        "status": output.status.code(),
        "stdout": String::from_utf8_lossy(&output.stdout),
        "stderr": String::from_utf8_lossy(&output.stderr),
    });
    if !output.status.success() {
        return Err(format!("{program} exited with {}", output.status).into());
    }
    Ok(result)
}

fn log_result(result: &Value, _params: Option<&Params>) -> Result<(), JobFailure> {
    info!(kind = %LogKind::Completed, "job result: {result}");
    Ok(())
}

/// Writes the result as JSON to `path`.
fn write_result(result: &Value, params: Option<&Params>) -> Result<(), JobFailure> {
    let path = param_str(params, "path")?;
    fs::write(path, serde_json::to_vec_pretty(result)?)?;
    Ok(())
}
