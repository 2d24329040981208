use std::collections::{HashMap, HashSet};
use std::io;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use tracing::warn;

use crate::assets::{EntryKind, join_path};

use super::{ChildEntry, DirectoryProvider, EntryHandle};

/// In-memory tree keyed by `/`-joined virtual paths (`""` is the root).
///
/// Children are listed in insertion order. Individual paths can be marked as
/// denied or failing to exercise the error paths of the walker and of export.
#[derive(Debug, Default)]
pub struct MemoryProvider {
    tree: RwLock<MemoryTree>,
    read_dir_calls: AtomicUsize,
}

#[derive(Debug)]
struct MemoryTree {
    dirs: HashMap<String, Vec<String>>,
    files: HashMap<String, Vec<u8>>,
    denied: HashSet<String>,
    failing: HashSet<String>,
}

impl Default for MemoryTree {
    fn default() -> Self {
        let mut dirs = HashMap::new();
        dirs.insert(String::new(), Vec::new());
        Self {
            dirs,
            files: HashMap::new(),
            denied: HashSet::new(),
            failing: HashSet::new(),
        }
    }
}

impl MemoryProvider {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder form of [`MemoryProvider::add_file`].
    pub fn with_file(self, path: &str, content: impl Into<Vec<u8>>) -> Self {
        self.add_file(path, content);
        self
    }

    /// Builder form of [`MemoryProvider::add_dir`].
    pub fn with_dir(self, path: &str) -> Self {
        self.add_dir(path);
        self
    }

    /// Handle of the virtual root.
    pub fn root_handle(&self) -> EntryHandle {
        EntryHandle::from_location("")
    }

    /// Handle for any virtual path, existing or not.
    pub fn handle(&self, path: &str) -> EntryHandle {
        EntryHandle::from_location(path)
    }

    /// Insert or overwrite a file, creating missing parent directories.
    pub fn add_file(&self, path: &str, content: impl Into<Vec<u8>>) {
        let mut tree = self.write_tree();
        let (parent, name) = split_parent(path);
        tree.ensure_dir(parent);
        if !tree.files.contains_key(path) {
            tree.push_child(parent, name);
        }
        tree.files.insert(path.to_string(), content.into());
    }

    /// Create a directory and any missing parents.
    pub fn add_dir(&self, path: &str) {
        self.write_tree().ensure_dir(path);
    }

    /// Delete a file or a directory with everything beneath it.
    pub fn remove(&self, path: &str) {
        let mut tree = self.write_tree();
        let (parent, name) = split_parent(path);
        if let Some(children) = tree.dirs.get_mut(parent) {
            children.retain(|child| child != name);
        }
        let nested = format!("{path}/");
        tree.dirs
            .retain(|key, _| key != path && !key.starts_with(&nested));
        tree.files
            .retain(|key, _| key != path && !key.starts_with(&nested));
    }

    /// Reads of `path` fail with `PermissionDenied` until [`MemoryProvider::allow`].
    pub fn deny(&self, path: &str) {
        self.write_tree().denied.insert(path.to_string());
    }

    /// Reads of `path` fail with a generic I/O error until [`MemoryProvider::allow`].
    pub fn fail(&self, path: &str) {
        self.write_tree().failing.insert(path.to_string());
    }

    /// Clear any injected denial or failure for `path`.
    pub fn allow(&self, path: &str) {
        let mut tree = self.write_tree();
        tree.denied.remove(path);
        tree.failing.remove(path);
    }

    /// Number of directory enumerations served so far.
    pub fn read_dir_calls(&self) -> usize {
        self.read_dir_calls.load(Ordering::Relaxed)
    }

    fn read_tree(&self) -> RwLockReadGuard<'_, MemoryTree> {
        self.tree.read().unwrap_or_else(|poisoned| {
            warn!("Memory provider lock poisoned; recovering.");
            poisoned.into_inner()
        })
    }

    fn write_tree(&self) -> RwLockWriteGuard<'_, MemoryTree> {
        self.tree.write().unwrap_or_else(|poisoned| {
            warn!("Memory provider lock poisoned; recovering.");
            poisoned.into_inner()
        })
    }
}

impl MemoryTree {
    fn ensure_dir(&mut self, path: &str) {
        let mut missing = Vec::new();
        let mut cursor = path;
        while !self.dirs.contains_key(cursor) {
            missing.push(cursor);
            cursor = split_parent(cursor).0;
        }
        for dir in missing.into_iter().rev() {
            let (parent, name) = split_parent(dir);
            self.push_child(parent, name);
            self.dirs.insert(dir.to_string(), Vec::new());
        }
    }

    fn push_child(&mut self, parent: &str, name: &str) {
        if let Some(children) = self.dirs.get_mut(parent)
            && !children.iter().any(|child| child == name)
        {
            children.push(name.to_string());
        }
    }

    fn check_access(&self, key: &str) -> io::Result<()> {
        if self.denied.contains(key) {
            return Err(io::Error::new(
                io::ErrorKind::PermissionDenied,
                format!("access to {key:?} denied"),
            ));
        }
        if self.failing.contains(key) {
            return Err(io::Error::other(format!("device error reading {key:?}")));
        }
        Ok(())
    }
}

impl DirectoryProvider for MemoryProvider {
    fn read_dir(&self, dir: &EntryHandle) -> io::Result<Vec<ChildEntry>> {
        self.read_dir_calls.fetch_add(1, Ordering::Relaxed);
        let key = handle_key(dir);
        let tree = self.read_tree();
        tree.check_access(&key)?;
        let names = tree.dirs.get(&key).ok_or_else(|| {
            io::Error::new(io::ErrorKind::NotFound, format!("no directory {key:?}"))
        })?;
        Ok(names
            .iter()
            .map(|name| {
                let child_key = join_path(&key, name);
                let kind = if tree.dirs.contains_key(&child_key) {
                    EntryKind::Directory
                } else {
                    EntryKind::File
                };
                ChildEntry {
                    name: name.clone(),
                    kind,
                    handle: EntryHandle::from_location(child_key),
                }
            })
            .collect())
    }

    fn read_file(&self, file: &EntryHandle) -> io::Result<Vec<u8>> {
        let key = handle_key(file);
        let tree = self.read_tree();
        tree.check_access(&key)?;
        tree.files
            .get(&key)
            .cloned()
            .ok_or_else(|| io::Error::new(io::ErrorKind::NotFound, format!("no file {key:?}")))
    }

    fn is_dir(&self, handle: &EntryHandle) -> bool {
        self.read_tree().dirs.contains_key(&handle_key(handle))
    }
}

fn handle_key(handle: &EntryHandle) -> String {
    handle
        .location()
        .iter()
        .map(|part| part.to_string_lossy())
        .collect::<Vec<_>>()
        .join("/")
}

fn split_parent(path: &str) -> (&str, &str) {
    path.rsplit_once('/').unwrap_or(("", path))
}
