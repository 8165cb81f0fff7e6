//! Scoped staging directories
//!
//! Each save or load owns a uniquely named scratch directory for its whole
//! duration. The directory is removed when the guard drops, on success and
//! error paths alike.

use std::fs;
use std::io;
use std::path::Path;

use tempfile::TempDir;

/// A scratch directory removed on drop
#[derive(Debug)]
pub struct StagingDir {
    dir: Option<TempDir>,
}

impl StagingDir {
    /// Directory name prefix
    const PREFIX: &'static str = "medid-staging-";

    /// Create a fresh directory under `root`, or the system temp dir
    pub fn create(root: Option<&Path>) -> io::Result<Self> {
        let mut builder = tempfile::Builder::new();
        builder.prefix(Self::PREFIX);

        let dir = match root {
            Some(root) => {
                fs::create_dir_all(root)?;
                builder.tempdir_in(root)?
            }
            None => builder.tempdir()?,
        };

        tracing::debug!(path = %dir.path().display(), "created staging directory");
        Ok(Self { dir: Some(dir) })
    }

    pub fn path(&self) -> &Path {
        match &self.dir {
            Some(dir) => dir.path(),
            None => Path::new(""),
        }
    }
}

impl Drop for StagingDir {
    fn drop(&mut self) {
        let Some(dir) = self.dir.take() else { return };
        let path = dir.path().to_path_buf();
        match dir.close() {
            Ok(()) => tracing::debug!(path = %path.display(), "removed staging directory"),
            Err(e) if e.kind() == io::ErrorKind::NotFound => {}
            Err(e) => tracing::warn!(
                path = %path.display(),
                error = %e,
                "failed to remove staging directory"
            ),
        }
    }
}
