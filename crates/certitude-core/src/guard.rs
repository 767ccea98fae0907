//! Path containment and size checks applied before any file content is read.

use std::path::{Component, Path, PathBuf};

use thiserror::Error;
use tracing::warn;

#[derive(Debug, Error)]
pub enum GuardError {
    #[error("path traversal outside the data root: {0}")]
    PathTraversal(PathBuf),

    #[error("file not found: {0}")]
    NotFound(PathBuf),

    #[error("file too large: {path} is {size} bytes, limit is {limit}")]
    TooLarge { path: PathBuf, size: u64, limit: u64 },

    #[error("data root {path} is unusable: {source}")]
    RootUnavailable {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("cannot inspect {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
}

/// Gatekeeper for every file the pipeline opens.
///
/// Containment is checked twice: once on the lexically normalised path (so
/// `..` cannot climb out even for files that do not exist) and once on the
/// canonical path (so a symlink inside the root cannot point outside it).
/// Each check compares against the root in the same form, so a root that is
/// itself a symlink still admits its own files.
#[derive(Debug, Clone)]
pub struct SecurityGuard {
    /// Absolute, lexically normalised, symlinks untouched.
    lexical_root: PathBuf,
    /// Fully resolved.
    root: PathBuf,
    max_file_size: u64,
}

impl SecurityGuard {
    /// Create a guard for `root`, which must exist.
    pub fn new(root: &Path, max_file_size: u64) -> Result<Self, GuardError> {
        let unavailable = |source| GuardError::RootUnavailable {
            path: root.to_path_buf(),
            source,
        };
        let canonical = std::fs::canonicalize(root).map_err(unavailable)?;
        let lexical_root = normalize_lexically(&absolutize(root).map_err(unavailable)?);
        Ok(Self {
            lexical_root,
            root: canonical,
            max_file_size,
        })
    }

    /// The canonical data root.
    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn max_file_size(&self) -> u64 {
        self.max_file_size
    }

    /// Resolve `path` to an absolute path inside the root.
    ///
    /// Relative paths are taken from the current working directory.
    pub fn resolve(&self, path: &Path) -> Result<PathBuf, GuardError> {
        let absolute = absolutize(path).map_err(|source| GuardError::Io {
            path: path.to_path_buf(),
            source,
        })?;

        // Callers may name files through either spelling of the root.
        let normalized = normalize_lexically(&absolute);
        if !normalized.starts_with(&self.lexical_root) && !normalized.starts_with(&self.root) {
            warn!(path = %path.display(), "rejected path outside data root");
            return Err(GuardError::PathTraversal(path.to_path_buf()));
        }

        if !normalized.exists() {
            return Err(GuardError::NotFound(path.to_path_buf()));
        }

        let canonical = std::fs::canonicalize(&normalized).map_err(|source| GuardError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        if !canonical.starts_with(&self.root) {
            warn!(path = %path.display(), target = %canonical.display(), "rejected symlink escaping data root");
            return Err(GuardError::PathTraversal(path.to_path_buf()));
        }

        Ok(canonical)
    }

    /// Reject files larger than the configured ceiling. Returns the size.
    pub fn check_size(&self, path: &Path) -> Result<u64, GuardError> {
        let size = std::fs::metadata(path)
            .map_err(|source| GuardError::Io {
                path: path.to_path_buf(),
                source,
            })?
            .len();
        if size > self.max_file_size {
            return Err(GuardError::TooLarge {
                path: path.to_path_buf(),
                size,
                limit: self.max_file_size,
            });
        }
        Ok(size)
    }

    /// [`resolve`](Self::resolve) then [`check_size`](Self::check_size).
    pub fn admit(&self, path: &Path) -> Result<PathBuf, GuardError> {
        let resolved = self.resolve(path)?;
        self.check_size(&resolved)?;
        Ok(resolved)
    }
}

fn absolutize(path: &Path) -> std::io::Result<PathBuf> {
    if path.is_absolute() {
        Ok(path.to_path_buf())
    } else {
        Ok(std::env::current_dir()?.join(path))
    }
}

/// Collapse `.` and `..` without touching the filesystem.
fn normalize_lexically(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                out.pop();
            }
            other => out.push(other.as_os_str()),
        }
    }
    out
}
