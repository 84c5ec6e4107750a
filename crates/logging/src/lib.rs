// crates/logging/src/lib.rs

use std::fmt;
use std::io;
use std::str::FromStr;

use time::{OffsetDateTime, macros::format_description};
use tracing::level_filters::LevelFilter;
use tracing_subscriber::{
    EnvFilter, fmt as tracing_fmt,
    layer::{Layer, SubscriberExt},
    util::SubscriberInitExt,
};

mod flags;
mod formatter;
mod sink;

pub use flags::{LogFormat, SubscriberConfig, SubscriberConfigBuilder};
pub use formatter::KindFormatter;
pub use sink::{DailyFileLayer, append, log_file_path};

/// Type of a lifecycle log line.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash)]
pub enum LogKind {
    Running,
    Stopped,
    Completed,
    Error,
}

impl LogKind {
    pub const fn as_str(self) -> &'static str {
        match self {
            LogKind::Running => "RUNNING",
            LogKind::Stopped => "STOPPED",
            LogKind::Completed => "COMPLETED",
            LogKind::Error => "ERROR",
        }
    }
}

impl fmt::Display for LogKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for LogKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "RUNNING" => Ok(LogKind::Running),
            "STOPPED" => Ok(LogKind::Stopped),
            "COMPLETED" => Ok(LogKind::Completed),
            "ERROR" => Ok(LogKind::Error),
            other => Err(format!("unknown log kind: {other}")),
        }
    }
}

pub(crate) fn local_now() -> OffsetDateTime {
    OffsetDateTime::now_local().unwrap_or_else(|_| OffsetDateTime::now_utc())
}

pub(crate) fn now_string() -> String {
    local_now()
        .format(format_description!(
            "[year]-[month]-[day] [hour]:[minute]:[second]"
        ))
        .unwrap_or_else(|_| String::from("0000-00-00 00:00:00"))
}

pub fn subscriber(cfg: SubscriberConfig) -> io::Result<Box<dyn tracing::Subscriber + Send + Sync>> {
    let SubscriberConfig {
        format,
        verbose,
        quiet,
        log_dir,
        colored,
        timestamps,
    } = cfg;
    let level = if quiet {
        LevelFilter::ERROR
    } else if verbose > 2 {
        LevelFilter::TRACE
    } else if verbose > 1 {
        LevelFilter::DEBUG
    } else if verbose > 0 {
        LevelFilter::INFO
    } else {
        LevelFilter::WARN
    };
    let filter = EnvFilter::builder()
        .with_default_directive(level.into())
        .from_env_lossy();

    let base = tracing_fmt::layer()
        .with_writer(io::stderr)
        .with_target(false)
        .with_ansi(colored);
    let fmt_layer = match format {
        LogFormat::Json if timestamps => base.json().boxed(),
        LogFormat::Json => base.json().without_time().boxed(),
        LogFormat::Text => base.event_format(KindFormatter::new(timestamps)).boxed(),
    };

    let file_layer = match log_dir {
        Some(dir) => {
            std::fs::create_dir_all(&dir)?;
            Some(DailyFileLayer::new(dir))
        }
        None => None,
    };

    let registry = tracing_subscriber::registry()
        .with(fmt_layer.with_filter(filter))
        .with(file_layer);
    Ok(Box::new(registry))
}

pub fn init(cfg: SubscriberConfig) -> io::Result<()> {
    subscriber(cfg)?.init();
    Ok(())
}
