use std::path::PathBuf;

use thiserror::Error;

/// Errors that can occur while bundling a selection into an archive.
#[derive(Debug, Error)]
pub enum ExportError {
    /// Export was requested with nothing selected.
    #[error("Nothing is selected for export")]
    EmptySelection,
    /// A selected file could not be read; nothing was produced.
    #[error("Failed to read {path} for export: {source}")]
    ExportRead {
        /// Relative path of the first unreadable file.
        path: String,
        /// Underlying IO error.
        source: std::io::Error,
    },
    /// The archive encoder rejected an entry or failed to finish.
    #[error("Archive error: {0}")]
    Archive(#[from] zip::result::ZipError),
    /// Writing archive bytes failed.
    #[error("Failed to write archive data: {0}")]
    Io(#[from] std::io::Error),
    /// Saving the finished archive to disk failed.
    #[error("Failed to save archive to {path}: {source}")]
    Save {
        /// Destination path.
        path: PathBuf,
        /// Underlying IO error.
        source: std::io::Error,
    },
}
