//! Scene file change detection.
//!
//! The watcher keeps a SHA-256 fingerprint of the scene file and reports
//! when the on-disk content differs from the last fingerprint taken. Hosts
//! poll it between steps and reload the simulation when it fires.

use sha2::{Digest, Sha256};
use std::fs::File;
use std::io::{self, Read};
use std::path::{Path, PathBuf};

const READ_BUFFER_SIZE: usize = 65536;

/// Hex-encoded SHA-256 of a file's content.
pub fn file_fingerprint(path: &Path) -> io::Result<String> {
    let mut file = File::open(path)?;
    let mut hasher = Sha256::new();
    let mut buffer = vec![0u8; READ_BUFFER_SIZE];

    loop {
        let read = file.read(&mut buffer)?;
        if read == 0 {
            break;
        }
        hasher.update(&buffer[..read]);
    }

    Ok(hex::encode(hasher.finalize()))
}

/// Polls a scene file for content changes.
#[derive(Debug, Clone)]
pub struct SceneWatcher {
    path: PathBuf,
    last_fingerprint: Option<String>,
}

impl SceneWatcher {
    /// Create a watcher and take the initial fingerprint. A file that cannot
    /// be read yet is treated as having no fingerprint.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let last_fingerprint = file_fingerprint(&path).ok();
        Self { path, last_fingerprint }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Check the file and remember the new fingerprint.
    ///
    /// Returns `Ok(true)` when the content differs from the previous check.
    pub fn poll_changed(&mut self) -> io::Result<bool> {
        let fingerprint = file_fingerprint(&self.path)?;
        let changed = self.last_fingerprint.as_deref() != Some(fingerprint.as_str());
        self.last_fingerprint = Some(fingerprint);
        Ok(changed)
    }

    /// Re-baseline after the host itself rewrote the file (e.g. on save), so
    /// its own write does not trigger a reload.
    pub fn acknowledge(&mut self) -> io::Result<()> {
        self.last_fingerprint = Some(file_fingerprint(&self.path)?);
        Ok(())
    }
}
