use std::{
    path::{Path, PathBuf},
    sync::atomic::{AtomicU64, Ordering},
};

use crate::foundation::error::{SnapError, SnapResult};

/// Filesystem side effects of a run.
///
/// Writes are all-or-nothing: a failed write leaves no file at the destination.
pub trait Filesystem: Send + Sync {
    /// Create `path` and its parents; succeeds when it already exists.
    fn ensure_directory(&self, path: &Path) -> SnapResult<()>;

    /// Replace `path` with `bytes`.
    fn write_bytes(&self, path: &Path, bytes: &[u8]) -> SnapResult<()>;

    /// Replace `dst` with a copy of `src`.
    fn copy_file(&self, src: &Path, dst: &Path) -> SnapResult<()>;

    /// Move a finished temporary file into place.
    fn persist(&self, temp: &Path, dst: &Path) -> SnapResult<()>;

    /// Remove a temporary file, ignoring errors.
    fn discard(&self, path: &Path);
}

static TEMP_SEQ: AtomicU64 = AtomicU64::new(0);

/// Sibling path used while `path` is being written.
///
/// Unique per call, so concurrent writers of one destination never share a temp file.
pub fn temp_sibling(path: &Path) -> PathBuf {
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| "output".to_owned());
    let seq = TEMP_SEQ.fetch_add(1, Ordering::Relaxed);
    path.with_file_name(format!(".{name}.{}.{seq}.part", std::process::id()))
}

/// [`Filesystem`] on the local disk.
#[derive(Clone, Copy, Debug, Default)]
pub struct LocalFs;

impl LocalFs {
    fn ensure_parent(&self, path: &Path) -> SnapResult<()> {
        match path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => self.ensure_directory(parent),
            _ => Ok(()),
        }
    }
}

impl Filesystem for LocalFs {
    fn ensure_directory(&self, path: &Path) -> SnapResult<()> {
        std::fs::create_dir_all(path).map_err(|e| {
            SnapError::write_failed(format!("create directory '{}': {e}", path.display()))
        })
    }

    fn write_bytes(&self, path: &Path, bytes: &[u8]) -> SnapResult<()> {
        self.ensure_parent(path)?;
        let temp = temp_sibling(path);
        if let Err(e) = std::fs::write(&temp, bytes) {
            self.discard(&temp);
            return Err(SnapError::write_failed(format!(
                "write '{}': {e}",
                path.display()
            )));
        }
        self.persist(&temp, path)
    }

    fn copy_file(&self, src: &Path, dst: &Path) -> SnapResult<()> {
        self.ensure_parent(dst)?;
        let temp = temp_sibling(dst);
        if let Err(e) = std::fs::copy(src, &temp) {
            self.discard(&temp);
            return Err(SnapError::write_failed(format!(
                "copy '{}' to '{}': {e}",
                src.display(),
                dst.display()
            )));
        }
        self.persist(&temp, dst)
    }

    fn persist(&self, temp: &Path, dst: &Path) -> SnapResult<()> {
        std::fs::rename(temp, dst).map_err(|e| {
            self.discard(temp);
            SnapError::write_failed(format!("move into '{}': {e}", dst.display()))
        })
    }

    fn discard(&self, path: &Path) {
        if let Err(e) = std::fs::remove_file(path)
            && e.kind() != std::io::ErrorKind::NotFound
        {
            tracing::warn!(path = %path.display(), error = %e, "failed to remove temp file");
        }
    }
}

#[cfg(test)]
#[path = "../../tests/unit/host/fs.rs"]
mod tests;
