use crate::error::{MapUnitError, Result};
use std::fs::{self, OpenOptions};
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};

pub const LOCK_FILE: &str = ".schema.lock";

/// Exclusive schema lock on a workspace, released when dropped.
#[derive(Debug)]
pub struct SchemaLock {
    path: PathBuf,
}

impl SchemaLock {
    /// Takes the lock, failing with `SchemaLocked` when another session
    /// already holds it.
    pub fn acquire(root: &Path) -> Result<Self> {
        let path = root.join(LOCK_FILE);
        let mut file = match OpenOptions::new().write(true).create_new(true).open(&path) {
            Ok(file) => file,
            Err(e) if e.kind() == ErrorKind::AlreadyExists => {
                return Err(MapUnitError::SchemaLocked(root.to_path_buf()));
            }
            Err(e) => return Err(e.into()),
        };
        writeln!(file, "{}", std::process::id())?;
        log::debug!("acquired schema lock {}", path.display());
        Ok(Self { path })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for SchemaLock {
    fn drop(&mut self) {
        if let Err(e) = fs::remove_file(&self.path) {
            log::warn!("could not release schema lock {}: {}", self.path.display(), e);
        }
    }
}
