// crates/daemon/src/config/validator.rs

use std::io;

use super::model::{DaemonConfig, Reaping};

pub fn parse_bool(val: &str) -> io::Result<bool> {
    if ["1", "yes", "true", "on"]
        .iter()
        .any(|v| val.eq_ignore_ascii_case(v))
    {
        Ok(true)
    } else if ["0", "no", "false", "off"]
        .iter()
        .any(|v| val.eq_ignore_ascii_case(v))
    {
        Ok(false)
    } else {
        Err(io::Error::new(
            io::ErrorKind::InvalidData,
            format!("invalid boolean: {val}"),
        ))
    }
}

pub fn parse_reaping(val: &str) -> io::Result<Reaping> {
    match val.to_ascii_lowercase().as_str() {
        "ignore" => Ok(Reaping::IgnoreSignal),
        "wait" => Ok(Reaping::BackgroundWait),
        _ => Err(io::Error::new(
            io::ErrorKind::InvalidData,
            format!("invalid reap policy: {val} (expected ignore or wait)"),
        )),
    }
}

fn is_plain_name(name: &str) -> bool {
    !name.is_empty() && !name.contains(['/', '\\']) && name != "." && name != ".."
}

pub fn validate_config(cfg: &DaemonConfig) -> io::Result<()> {
    if cfg.pid_dir.as_os_str().is_empty() {
        return Err(io::Error::new(io::ErrorKind::InvalidData, "pid dir is empty"));
    }
    if !is_plain_name(&cfg.marker_prefix) {
        return Err(io::Error::new(
            io::ErrorKind::InvalidData,
            format!("invalid marker prefix: {:?}", cfg.marker_prefix),
        ));
    }
    if !is_plain_name(&cfg.registry_file) {
        return Err(io::Error::new(
            io::ErrorKind::InvalidData,
            format!("invalid registry file name: {:?}", cfg.registry_file),
        ));
    }
    Ok(())
}
