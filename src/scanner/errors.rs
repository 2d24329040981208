use std::path::PathBuf;

use thiserror::Error;

/// Errors that can occur while scanning or refreshing a directory tree.
#[derive(Debug, Error)]
pub enum ScanError {
    /// The provided root is not a readable directory.
    #[error("Scan root is not a directory: {0}")]
    InvalidRoot(PathBuf),
    /// Permission to enumerate a directory was denied or revoked.
    #[error("Access denied while reading {path}")]
    AccessDenied {
        /// Directory that could not be enumerated.
        path: String,
    },
    /// Enumerating a directory failed for a reason other than permissions.
    #[error("Failed to read directory {path}: {source}")]
    DirectoryRead {
        /// Directory that could not be enumerated.
        path: String,
        /// Underlying IO error.
        source: std::io::Error,
    },
    /// A refresh targeted a folder that is not part of the current session.
    #[error("Folder not found in current scan: {0}")]
    FolderNotFound(String),
    /// A scan or refresh is already running on this coordinator.
    #[error("A scan is already in progress")]
    ScanInProgress,
}

impl ScanError {
    /// Classify a failed directory enumeration.
    pub(crate) fn from_read_failure(path: String, source: std::io::Error) -> Self {
        if source.kind() == std::io::ErrorKind::PermissionDenied {
            Self::AccessDenied { path }
        } else {
            Self::DirectoryRead { path, source }
        }
    }

    /// Relative path named by the error, when there is one.
    pub fn path(&self) -> Option<&str> {
        match self {
            Self::AccessDenied { path } | Self::DirectoryRead { path, .. } => Some(path),
            Self::FolderNotFound(path) => Some(path),
            Self::InvalidRoot(_) | Self::ScanInProgress => None,
        }
    }
}
