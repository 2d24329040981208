use std::fs;
use std::io;
use std::path::Path;

use tracing::warn;

use crate::assets::EntryKind;

use super::{ChildEntry, DirectoryProvider, EntryHandle};

/// Provider backed by the local filesystem. Symlinks are never followed.
#[derive(Debug, Clone, Copy, Default)]
pub struct FsProvider;

impl FsProvider {
    pub fn new() -> Self {
        Self
    }

    /// Handle for a directory on disk.
    pub fn handle_for(path: &Path) -> EntryHandle {
        EntryHandle::from_location(path)
    }
}

impl DirectoryProvider for FsProvider {
    fn read_dir(&self, dir: &EntryHandle) -> io::Result<Vec<ChildEntry>> {
        let entries = fs::read_dir(dir.location())?;
        let mut children = Vec::new();
        for entry_result in entries {
            let entry = match entry_result {
                Ok(entry) => entry,
                Err(err) => {
                    warn!(
                        dir = %dir.location().display(),
                        error = %err,
                        "Failed to read directory entry during scan"
                    );
                    continue;
                }
            };
            let path = entry.path();
            let file_type = match entry.file_type() {
                Ok(file_type) => file_type,
                Err(err) => {
                    warn!(
                        path = %path.display(),
                        error = %err,
                        "Failed to read file type during scan"
                    );
                    continue;
                }
            };
            if file_type.is_symlink() {
                continue;
            }
            let kind = if file_type.is_dir() {
                EntryKind::Directory
            } else if file_type.is_file() {
                EntryKind::File
            } else {
                continue;
            };
            children.push(ChildEntry {
                name: entry.file_name().to_string_lossy().into_owned(),
                kind,
                handle: EntryHandle::from_location(path),
            });
        }
        Ok(children)
    }

    fn read_file(&self, file: &EntryHandle) -> io::Result<Vec<u8>> {
        fs::read(file.location())
    }

    fn is_dir(&self, handle: &EntryHandle) -> bool {
        handle.location().is_dir()
    }
}
