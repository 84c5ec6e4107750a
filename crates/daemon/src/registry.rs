// crates/daemon/src/registry.rs
//! The shared PID registry.
//!
//! Every daemon on the host records its lifecycle in a single JSON file
//! keyed by process id. Mutations take an exclusive `flock` on a sidecar
//! lock file, re-read the registry, apply the change and atomically replace
//! the file, so concurrent daemons never drop each other's updates.

use std::collections::BTreeMap;
use std::fmt;
use std::fs::{self, File, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use time::{OffsetDateTime, PrimitiveDateTime, macros::format_description};

use crate::error::{RegistryError, Result, file_error};

/// Lifecycle status of a registered process.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Status {
    Running,
    Stopped,
    Completed,
}

impl Status {
    pub const fn as_str(self) -> &'static str {
        match self {
            Status::Running => "RUNNING",
            Status::Stopped => "STOPPED",
            Status::Completed => "COMPLETED",
        }
    }

    pub const fn is_terminal(self) -> bool {
        !matches!(self, Status::Running)
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The statuses a running process may end in.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TerminalStatus {
    Stopped,
    Completed,
}

impl From<TerminalStatus> for Status {
    fn from(status: TerminalStatus) -> Self {
        match status {
            TerminalStatus::Stopped => Status::Stopped,
            TerminalStatus::Completed => Status::Completed,
        }
    }
}

/// Wall-clock time with second precision, stored as `YYYY-MM-DD HH:MM:SS`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Timestamp(PrimitiveDateTime);

impl Timestamp {
    pub fn now() -> Self {
        let now = OffsetDateTime::now_local().unwrap_or_else(|_| OffsetDateTime::now_utc());
        let now = now.replace_nanosecond(0).unwrap_or(now);
        Self(PrimitiveDateTime::new(now.date(), now.time()))
    }
}

impl fmt::Display for Timestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = self
            .0
            .format(format_description!(
                "[year]-[month]-[day] [hour]:[minute]:[second]"
            ))
            .map_err(|_| fmt::Error)?;
        f.write_str(&s)
    }
}

impl FromStr for Timestamp {
    type Err = time::error::Parse;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        PrimitiveDateTime::parse(
            s,
            format_description!("[year]-[month]-[day] [hour]:[minute]:[second]"),
        )
        .map(Self)
    }
}

impl Serialize for Timestamp {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for Timestamp {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

/// `ended_at` is written as an empty string until the record is terminal.
mod empty_as_none {
    use super::Timestamp;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(
        value: &Option<Timestamp>,
        serializer: S,
    ) -> Result<S::Ok, S::Error> {
        match value {
            Some(ts) => serializer.collect_str(ts),
            None => serializer.serialize_str(""),
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<Option<Timestamp>, D::Error> {
        let s = String::deserialize(deserializer)?;
        if s.is_empty() {
            Ok(None)
        } else {
            s.parse().map(Some).map_err(serde::de::Error::custom)
        }
    }
}

/// Lifecycle entry for one process id.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct LifecycleRecord {
    pub status: Status,
    pub created_at: Timestamp,
    #[serde(with = "empty_as_none")]
    pub ended_at: Option<Timestamp>,
}

impl LifecycleRecord {
    pub fn running(now: Timestamp) -> Self {
        Self {
            status: Status::Running,
            created_at: now,
            ended_at: None,
        }
    }

    pub fn is_terminal(&self) -> bool {
        self.status.is_terminal()
    }
}

pub type Entries = BTreeMap<u32, LifecycleRecord>;

/// File-backed registry shared by every daemon using the same path.
#[derive(Clone, Debug)]
pub struct Registry {
    path: PathBuf,
    lock_path: PathBuf,
}

impl Registry {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let mut lock_name = path.file_name().map(|n| n.to_os_string()).unwrap_or_default();
        lock_name.push(".lock");
        let lock_path = path.with_file_name(lock_name);
        Self { path, lock_path }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Reads the current mapping. A missing or unparseable file reads as empty.
    pub fn load(&self) -> Entries {
        read_entries(&self.path)
    }

    pub fn get(&self, pid: u32) -> Option<LifecycleRecord> {
        self.load().remove(&pid)
    }

    /// Registers `pid` as running, replacing any previous record for it.
    pub fn upsert_running(&self, pid: u32) -> Result<LifecycleRecord> {
        self.update(|entries| {
            let record = LifecycleRecord::running(Timestamp::now());
            entries.insert(pid, record.clone());
            Ok(record)
        })
    }

    /// Moves a running record to `status` and stamps `ended_at`.
    pub fn transition_terminal(&self, pid: u32, status: TerminalStatus) -> Result<LifecycleRecord> {
        self.update(|entries| {
            let record = entries
                .get_mut(&pid)
                .ok_or(RegistryError::Unregistered(pid))?;
            if record.is_terminal() {
                return Err(RegistryError::AlreadyTerminal {
                    pid,
                    status: record.status,
                }
                .into());
            }
            let now = Timestamp::now().max(record.created_at);
            record.status = status.into();
            record.ended_at = Some(now);
            Ok(record.clone())
        })
    }

    /// Drops every terminal record and returns how many were removed.
    pub fn prune(&self) -> Result<usize> {
        self.update(|entries| {
            let before = entries.len();
            entries.retain(|_, record| !record.is_terminal());
            Ok(before - entries.len())
        })
    }

    fn update<T, F>(&self, f: F) -> Result<T>
    where
        F: FnOnce(&mut Entries) -> Result<T>,
    {
        let dir = parent_dir(&self.path);
        fs::create_dir_all(dir).map_err(|e| file_error(dir, e))?;
        let _lock = lock_exclusive(&self.lock_path)?;
        let mut entries = read_entries(&self.path);
        let out = f(&mut entries)?;
        write_entries(&self.path, &entries)?;
        Ok(out)
    }
}

fn parent_dir(path: &Path) -> &Path {
    match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => Path::new("."),
    }
}

fn read_entries(path: &Path) -> Entries {
    let content = match fs::read_to_string(path) {
        Ok(content) => content,
        Err(e) if e.kind() == io::ErrorKind::NotFound => return Entries::new(),
        Err(e) => {
            tracing::warn!(path = %path.display(), "unreadable registry treated as empty: {e}");
            return Entries::new();
        }
    };
    if content.trim().is_empty() {
        return Entries::new();
    }
    serde_json::from_str(&content).unwrap_or_else(|e| {
        tracing::warn!(path = %path.display(), "malformed registry treated as empty: {e}");
        Entries::new()
    })
}

fn write_entries(path: &Path, entries: &Entries) -> Result<()> {
    let dir = parent_dir(path);
    let content = serde_json::to_vec(entries).map_err(|e| file_error(path, e.into()))?;
    let mut tmp = tempfile::NamedTempFile::new_in(dir).map_err(|e| file_error(dir, e))?;
    tmp.write_all(&content)
        .and_then(|_| tmp.as_file().sync_all())
        .map_err(|e| file_error(tmp.path(), e))?;
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        fs::set_permissions(tmp.path(), fs::Permissions::from_mode(0o644))
            .map_err(|e| file_error(tmp.path(), e))?;
    }
    tmp.persist(path).map_err(|e| file_error(path, e.error))?;
    Ok(())
}

#[cfg(unix)]
fn lock_exclusive(path: &Path) -> Result<nix::fcntl::Flock<File>> {
    use nix::fcntl::{Flock, FlockArg};

    let file = open_lock_file(path)?;
    Flock::lock(file, FlockArg::LockExclusive).map_err(|(_, errno)| file_error(path, errno.into()))
}

#[cfg(not(unix))]
fn lock_exclusive(path: &Path) -> Result<File> {
    open_lock_file(path)
}

fn open_lock_file(path: &Path) -> Result<File> {
    OpenOptions::new()
        .create(true)
        .truncate(false)
        .write(true)
        .open(path)
        .map_err(|e| file_error(path, e))
}
