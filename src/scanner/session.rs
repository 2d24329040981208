use std::collections::HashSet;
use std::sync::Arc;

use uuid::Uuid;

use crate::assets::{Entry, path_is_within};
use crate::provider::EntryHandle;

/// Identifier of one scan session; a new one is minted for every full scan.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SessionId(String);

impl SessionId {
    /// Create a new unique session identifier.
    pub fn new() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    /// Rehydrate an identifier from a stored string.
    pub fn from_string(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for SessionId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for SessionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Accumulated state of one root traversal, owned by the coordinator.
///
/// Collections sit behind `Arc` so snapshots are cheap; mutation clones only
/// when a published snapshot still shares the buffer.
#[derive(Debug, Clone)]
pub struct ScanSession {
    id: SessionId,
    root: Option<EntryHandle>,
    root_name: String,
    accepted_files: Arc<Vec<Entry>>,
    folders: Arc<Vec<Entry>>,
    folder_paths: HashSet<String>,
    total_entries_seen: u64,
}

impl Default for ScanSession {
    fn default() -> Self {
        Self {
            id: SessionId::new(),
            root: None,
            root_name: String::new(),
            accepted_files: Arc::new(Vec::new()),
            folders: Arc::new(Vec::new()),
            folder_paths: HashSet::new(),
            total_entries_seen: 0,
        }
    }
}

impl ScanSession {
    /// Fresh, empty session for a root.
    pub fn new(root: EntryHandle, root_name: impl Into<String>) -> Self {
        Self {
            root: Some(root),
            root_name: root_name.into(),
            ..Self::default()
        }
    }

    pub fn id(&self) -> &SessionId {
        &self.id
    }

    pub fn root(&self) -> Option<&EntryHandle> {
        self.root.as_ref()
    }

    pub fn root_name(&self) -> &str {
        &self.root_name
    }

    pub fn accepted_files(&self) -> &[Entry] {
        &self.accepted_files
    }

    pub fn folders(&self) -> &[Entry] {
        &self.folders
    }

    pub fn total_entries_seen(&self) -> u64 {
        self.total_entries_seen
    }

    /// Folder entry for an exact relative path.
    pub fn find_folder(&self, path: &str) -> Option<&Entry> {
        if !self.folder_paths.contains(path) {
            return None;
        }
        self.folders.iter().find(|folder| folder.path == path)
    }

    /// Merge a published batch. Files are appended; folders are appended only
    /// when their path is not already present.
    pub(crate) fn apply_batch(&mut self, files: Vec<Entry>, folders: Vec<Entry>, seen: u64) {
        if !files.is_empty() {
            Arc::make_mut(&mut self.accepted_files).extend(files);
        }
        let fresh: Vec<Entry> = folders
            .into_iter()
            .filter(|folder| self.folder_paths.insert(folder.path.clone()))
            .collect();
        if !fresh.is_empty() {
            Arc::make_mut(&mut self.folders).extend(fresh);
        }
        self.total_entries_seen += seen;
    }

    /// Drop every file and folder strictly beneath `folder_path`, keeping the
    /// folder's own entry. Returns the number of removed entries.
    pub(crate) fn remove_subtree(&mut self, folder_path: &str) -> usize {
        let nested = |entry: &Entry| entry.path != folder_path && path_is_within(&entry.path, folder_path);
        let mut removed = 0;
        if self.accepted_files.iter().any(nested) {
            let files = Arc::make_mut(&mut self.accepted_files);
            let before = files.len();
            files.retain(|entry| !nested(entry));
            removed += before - files.len();
        }
        if self.folders.iter().any(nested) {
            let folders = Arc::make_mut(&mut self.folders);
            let before = folders.len();
            folders.retain(|entry| !nested(entry));
            removed += before - folders.len();
            self.folder_paths
                .retain(|path| path == folder_path || !path_is_within(path, folder_path));
        }
        removed
    }

    /// Immutable view handed to observers and the browse pipeline.
    pub fn snapshot(&self, is_scanning: bool) -> SessionSnapshot {
        SessionSnapshot {
            session_id: self.id.clone(),
            root_name: self.root_name.clone(),
            accepted_files: Arc::clone(&self.accepted_files),
            folders: Arc::clone(&self.folders),
            total_entries_seen: self.total_entries_seen,
            is_scanning,
        }
    }
}

/// Read-only copy of a session's observable state.
#[derive(Debug, Clone)]
pub struct SessionSnapshot {
    pub session_id: SessionId,
    pub root_name: String,
    pub accepted_files: Arc<Vec<Entry>>,
    pub folders: Arc<Vec<Entry>>,
    pub total_entries_seen: u64,
    pub is_scanning: bool,
}

impl SessionSnapshot {
    pub fn files(&self) -> &[Entry] {
        &self.accepted_files
    }

    pub fn folders(&self) -> &[Entry] {
        &self.folders
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assets::ExtensionClassifier;

    fn file(path: &str) -> Entry {
        let name = crate::assets::last_segment(path).to_string();
        let classification = ExtensionClassifier::default().classify(&name);
        Entry::file(path.to_string(), name, classification, None)
    }

    fn folder(path: &str) -> Entry {
        Entry::directory(path.to_string(), crate::assets::last_segment(path).to_string(), None)
    }

    #[test]
    fn folders_merge_by_path() {
        let mut session = ScanSession::default();
        session.apply_batch(vec![file("a.png")], vec![folder("models")], 2);
        session.apply_batch(Vec::new(), vec![folder("models"), folder("models/tex")], 2);
        assert_eq!(session.folders().len(), 2);
        assert_eq!(session.total_entries_seen(), 4);
        assert!(session.find_folder("models/tex").is_some());
    }

    #[test]
    fn remove_subtree_keeps_folder_and_siblings() {
        let mut session = ScanSession::default();
        session.apply_batch(
            vec![
                file("models/hero.fbx"),
                file("models/tex/skin.png"),
                file("models2/other.fbx"),
            ],
            vec![folder("models"), folder("models/tex"), folder("models2")],
            6,
        );
        let removed = session.remove_subtree("models");
        assert_eq!(removed, 3);
        let files: Vec<&str> = session.accepted_files().iter().map(|f| f.path.as_str()).collect();
        assert_eq!(files, vec!["models2/other.fbx"]);
        assert!(session.find_folder("models").is_some());
        assert!(session.find_folder("models/tex").is_none());
        assert!(session.find_folder("models2").is_some());
    }

    #[test]
    fn snapshots_are_not_affected_by_later_mutation() {
        let mut session = ScanSession::default();
        session.apply_batch(vec![file("a.png")], Vec::new(), 1);
        let snapshot = session.snapshot(true);
        session.apply_batch(vec![file("b.png")], Vec::new(), 1);
        assert_eq!(snapshot.files().len(), 1);
        assert_eq!(session.accepted_files().len(), 2);
        assert!(snapshot.is_scanning);
    }
}
