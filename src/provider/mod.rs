//! Directory capability providers consumed by the walker and by export.

use std::io;
use std::path::{Path, PathBuf};

use crate::assets::EntryKind;

mod fs;
mod memory;

pub use fs::FsProvider;
pub use memory::MemoryProvider;

/// Opaque reference to a file or directory exposed by a provider.
///
/// Equality and hashing are stable within a session, so handles can key maps.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct EntryHandle {
    location: PathBuf,
}

impl EntryHandle {
    pub fn from_location(location: impl Into<PathBuf>) -> Self {
        Self {
            location: location.into(),
        }
    }

    /// Provider-specific location (absolute path for [`FsProvider`], virtual path
    /// for [`MemoryProvider`]).
    pub fn location(&self) -> &Path {
        &self.location
    }

    /// Location rendered for persistence and logs.
    pub fn to_location_string(&self) -> String {
        self.location.to_string_lossy().into_owned()
    }

    /// Handle for a direct child of this directory handle.
    pub fn child(&self, name: &str) -> Self {
        Self {
            location: self.location.join(name),
        }
    }
}

/// One child returned by [`DirectoryProvider::read_dir`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChildEntry {
    pub name: String,
    pub kind: EntryKind,
    pub handle: EntryHandle,
}

/// Hierarchical storage the scanner walks and export reads from.
///
/// Implementations report revoked or missing permission as
/// [`io::ErrorKind::PermissionDenied`]; callers turn that into an access-denied
/// failure instead of returning partial data.
pub trait DirectoryProvider: Send + Sync {
    /// Enumerate the children of a directory in provider order.
    fn read_dir(&self, dir: &EntryHandle) -> io::Result<Vec<ChildEntry>>;

    /// Read the full content of a file.
    fn read_file(&self, file: &EntryHandle) -> io::Result<Vec<u8>>;

    /// True when the handle still refers to an existing directory.
    fn is_dir(&self, handle: &EntryHandle) -> bool;
}
