// crates/daemon/src/config/parser.rs

use std::env;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use super::model::DaemonConfig;
use super::validator::{parse_bool, parse_reaping, validate_config};

pub fn parse_config(contents: &str) -> io::Result<DaemonConfig> {
    let mut cfg = DaemonConfig::default();
    for (idx, raw) in contents.lines().enumerate() {
        let lineno = idx + 1;
        let line = strip_comment(raw);
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        let mut parts = line.splitn(2, '=');
        let key = parts
            .next()
            .ok_or_else(|| io::Error::new(io::ErrorKind::InvalidData, "missing key"))?
            .trim()
            .to_lowercase()
            .replace(['-', '_'], " ");
        let val = parts
            .next()
            .ok_or_else(|| {
                io::Error::new(
                    io::ErrorKind::InvalidData,
                    format!("line {lineno}: missing value for {key}"),
                )
            })?
            .trim();
        let val = unquote(val);
        let with_line =
            |e: io::Error| io::Error::new(e.kind(), format!("line {lineno}: {key}: {e}"));
        match key.as_str() {
            "pid dir" => cfg.pid_dir = PathBuf::from(val),
            "marker prefix" => cfg.marker_prefix = val.to_string(),
            "registry file" => cfg.registry_file = val.to_string(),
            "log dir" => cfg.log_dir = PathBuf::from(val),
            "reap" => cfg.reaping = parse_reaping(val).map_err(with_line)?,
            "redirect stdio" => cfg.redirect_stdio = parse_bool(val).map_err(with_line)?,
            _ => {
                return Err(io::Error::new(
                    io::ErrorKind::InvalidData,
                    format!("line {lineno}: unknown option: {key}"),
                ));
            }
        }
    }
    validate_config(&cfg)?;
    Ok(cfg)
}

fn strip_comment(raw: &str) -> String {
    let mut line = String::new();
    let mut in_quotes: Option<char> = None;
    let mut prev_ws = true;
    for c in raw.chars() {
        match c {
            '"' | '\'' => {
                if let Some(q) = in_quotes {
                    if c == q {
                        in_quotes = None;
                    }
                } else {
                    in_quotes = Some(c);
                }
                line.push(c);
                prev_ws = false;
            }
            '#' | ';' if in_quotes.is_none() && prev_ws => break,
            c => {
                prev_ws = c.is_whitespace();
                line.push(c);
            }
        }
    }
    line
}

fn unquote(val: &str) -> &str {
    if val.len() >= 2
        && ((val.starts_with('"') && val.ends_with('"'))
            || (val.starts_with('\'') && val.ends_with('\'')))
    {
        &val[1..val.len() - 1]
    } else {
        val
    }
}

pub fn parse_config_file(path: &Path) -> io::Result<DaemonConfig> {
    let contents = fs::read_to_string(path)?;
    parse_config(&contents)
}

/// Loads `path`, or `$FORKJOB_CONFIG_PATH`, or `/etc/forkjob.conf` when it
/// exists. Without any of them the defaults apply.
pub fn load_config(path: Option<&Path>) -> io::Result<DaemonConfig> {
    if let Some(p) = path {
        return parse_config_file(p);
    }
    if let Some(p) = env::var_os("FORKJOB_CONFIG_PATH") {
        return parse_config_file(Path::new(&p));
    }
    let system = Path::new("/etc/forkjob.conf");
    if system.is_file() {
        parse_config_file(system)
    } else {
        Ok(DaemonConfig::default())
    }
}
