// crates/logging/src/sink.rs
use std::fs::{self, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use time::macros::format_description;
use tracing::{Event, Level, Subscriber};
use tracing_subscriber::layer::{Context, Layer};

use crate::formatter::MessageVisitor;
use crate::{LogKind, local_now, now_string};

/// Path of the log file for the current local date, `<dir>/YYYY-MM-DD.log`.
pub fn log_file_path(dir: &Path) -> PathBuf {
    let date = local_now()
        .format(format_description!("[year]-[month]-[day]"))
        .unwrap_or_else(|_| String::from("0000-00-00"));
    dir.join(format!("{date}.log"))
}

/// Appends `[YYYY-MM-DD HH:MM:SS] KIND: message` to today's log in `dir`.
///
/// The directory is created on first use.
pub fn append(dir: &Path, kind: LogKind, message: &str) -> io::Result<()> {
    fs::create_dir_all(dir)?;
    let mut file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(log_file_path(dir))?;
    let line = format!("[{}] {}: {}\n", now_string(), kind, message);
    file.write_all(line.as_bytes())
}

/// Layer writing lifecycle events into the date-named log file.
///
/// Events carrying a `kind` field are written with that kind; other events
/// are written only at ERROR level, as `ERROR`.
#[derive(Clone, Debug)]
pub struct DailyFileLayer {
    dir: PathBuf,
}

impl DailyFileLayer {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }
}

impl<S> Layer<S> for DailyFileLayer
where
    S: Subscriber,
{
    fn on_event(&self, event: &Event<'_>, _ctx: Context<'_, S>) {
        let mut v = MessageVisitor::default();
        event.record(&mut v);
        let kind = match v.kind {
            Some(kind) => kind,
            None if *event.metadata().level() == Level::ERROR => LogKind::Error,
            None => return,
        };
        let _ = append(&self.dir, kind, &v.msg);
    }
}
