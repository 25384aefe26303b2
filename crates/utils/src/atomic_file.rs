//! Atomic file operations so readers never observe a half-written store

use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::Path;
use tpen_core::{Error, Result};
use uuid::Uuid;

/// Replace `path` with `content` in one step.
///
/// The bytes go to a sibling temporary file that is synced and then renamed
/// over the target, so the rename never crosses file systems.
pub fn write_atomic(path: &Path, content: &[u8]) -> Result<()> {
    let Some(parent) = path.parent() else {
        return Err(Error::configuration(format!(
            "cannot write {}: path has no parent directory",
            path.display()
        )));
    };
    if !parent.as_os_str().is_empty() {
        fs::create_dir_all(parent)
            .map_err(|e| Error::file_system(parent, "create parent directory", e))?;
    }

    let staging = parent.join(format!(".tpen-{}.tmp", Uuid::new_v4()));
    if let Err(e) = stage(&staging, content).and_then(|()| {
        fs::rename(&staging, path).map_err(|e| Error::file_system(path, "replace", e))
    }) {
        let _ = fs::remove_file(&staging);
        return Err(e);
    }
    Ok(())
}

fn stage(staging: &Path, content: &[u8]) -> Result<()> {
    let mut file = OpenOptions::new()
        .create_new(true)
        .write(true)
        .open(staging)
        .map_err(|e| Error::file_system(staging, "create staging file", e))?;
    file.write_all(content)
        .and_then(|()| file.sync_all())
        .map_err(|e| Error::file_system(staging, "write staging file", e))
}

/// [`write_atomic`] for text
pub fn write_atomic_string(path: &Path, content: &str) -> Result<()> {
    write_atomic(path, content.as_bytes())
}
