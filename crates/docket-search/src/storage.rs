//! Index storage locations.
//!
//! An [`IndexLocation`] is the directory a backend instance keeps its index
//! in. Production backends use a configured persistent path; test backends
//! get a fresh temporary directory that is deleted when the location is
//! dropped, whether the test passed, failed, or panicked.

use std::path::{Path, PathBuf};

use docket_core::{Error, Result};
use tempfile::TempDir;

/// Prefix of temporary index directories.
const TEMP_PREFIX: &str = "docket-index-";

/// Directory holding a backend's index data.
#[derive(Debug)]
pub enum IndexLocation {
    /// Configured path that outlives the process.
    Persistent(PathBuf),
    /// Scoped directory removed on drop.
    Temporary(TempDir),
}

impl IndexLocation {
    /// A persistent location. Nothing is touched on disk until [`ensure`](Self::ensure).
    pub fn persistent(path: impl Into<PathBuf>) -> Self {
        Self::Persistent(path.into())
    }

    /// Allocate a fresh, uniquely named temporary location.
    pub fn temporary() -> Result<Self> {
        let dir = tempfile::Builder::new()
            .prefix(TEMP_PREFIX)
            .tempdir()
            .map_err(|e| Error::storage(std::env::temp_dir(), e))?;
        log::debug!("Allocated temporary index location {}", dir.path().display());
        Ok(Self::Temporary(dir))
    }

    /// Root path of the location.
    pub fn path(&self) -> &Path {
        match self {
            Self::Persistent(path) => path,
            Self::Temporary(dir) => dir.path(),
        }
    }

    /// Whether the location is removed on drop.
    pub fn is_temporary(&self) -> bool {
        matches!(self, Self::Temporary(_))
    }

    /// Make sure the root exists and is writable.
    ///
    /// Creates missing directories, then probes writability with a scratch
    /// file that is removed immediately.
    pub fn ensure(&self) -> Result<&Path> {
        let path = self.path();
        if path.exists() && !path.is_dir() {
            return Err(Error::storage(path, "path exists and is not a directory"));
        }
        std::fs::create_dir_all(path).map_err(|e| Error::storage(path, e))?;
        tempfile::NamedTempFile::new_in(path)
            .map_err(|e| Error::storage(path, format!("not writable: {e}")))?;
        Ok(path)
    }

    /// Sub-directory holding the index of one type.
    ///
    /// The tag is percent-encoded, so distinct tags never share a directory.
    pub fn model_path(&self, type_tag: &str) -> PathBuf {
        let encoded = urlencoding::encode(type_tag);
        let dir_name = match encoded.as_ref() {
            "." => "%2E".to_string(),
            ".." => "%2E%2E".to_string(),
            _ => encoded.into_owned(),
        };
        self.path().join(dir_name)
    }
}

// ============================================================================
// Tests
// ============================================================================
