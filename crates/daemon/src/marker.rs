// crates/daemon/src/marker.rs
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use crate::error::{Result, file_error};

/// Per-process liveness file holding the owner's pid.
#[derive(Debug)]
pub struct MarkerFile {
    path: PathBuf,
    pid: u32,
}

impl MarkerFile {
    pub fn path_for(dir: &Path, prefix: &str, pid: u32) -> PathBuf {
        dir.join(format!("{prefix}-{pid}.pid"))
    }

    /// Writes `<dir>/<prefix>-<pid>.pid`, creating `dir` if needed.
    pub fn create(dir: &Path, prefix: &str, pid: u32) -> Result<Self> {
        fs::create_dir_all(dir).map_err(|e| file_error(dir, e))?;
        let path = Self::path_for(dir, prefix, pid);
        fs::write(&path, pid.to_string()).map_err(|e| file_error(&path, e))?;
        Ok(Self { path, pid })
    }

    /// The marker for `pid`, if one is present on disk.
    pub fn existing(dir: &Path, prefix: &str, pid: u32) -> Option<Self> {
        let path = Self::path_for(dir, prefix, pid);
        path.is_file().then_some(Self { path, pid })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn pid(&self) -> u32 {
        self.pid
    }

    /// Deletes the marker. Fails if it has already disappeared.
    pub fn remove(self) -> Result<()> {
        fs::remove_file(&self.path).map_err(|e| {
            if e.kind() == io::ErrorKind::NotFound {
                file_error(
                    &self.path,
                    io::Error::new(io::ErrorKind::NotFound, "pid file not exists"),
                )
            } else {
                file_error(&self.path, e)
            }
        })
    }
}

/// Reads the pid recorded in a marker file.
pub fn read_pid(path: &Path) -> Result<u32> {
    let contents = fs::read_to_string(path).map_err(|e| file_error(path, e))?;
    contents
        .trim()
        .parse()
        .map_err(|e| file_error(path, io::Error::new(io::ErrorKind::InvalidData, e)))
}
