use thiserror::Error;

use crate::export::ExportError;
use crate::scanner::ScanError;
use crate::store::StoreError;

/// Failures surfaced by [`super::AssetBrowser`] actions.
#[derive(Debug, Error)]
pub enum BrowserError {
    #[error(transparent)]
    Scan(#[from] ScanError),
    #[error(transparent)]
    Store(#[from] StoreError),
    #[error(transparent)]
    Export(#[from] ExportError),
    /// The action needs an open project root.
    #[error("No project folder is open")]
    NoRoot,
    /// The path is not part of the current listing.
    #[error("File not found in the current listing: {0}")]
    FileNotFound(String),
}
