//! Entry model shared by the scanner, the browse pipeline and export.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::provider::EntryHandle;

mod classify;
mod ignore;

pub use classify::{
    AUDIO_EXTENSIONS, Classification, ExtensionClassifier, IMAGE_EXTENSIONS, MODEL_EXTENSIONS,
    VIDEO_EXTENSIONS,
};
pub use ignore::{DEFAULT_IGNORED_FOLDERS, IgnoreRules};

/// Whether an entry is a file or a directory.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntryKind {
    File,
    Directory,
}

/// Coarse asset kind derived from a file extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AssetCategory {
    Model,
    Image,
    Audio,
    Video,
    Unclassified,
}

impl AssetCategory {
    /// Lowercase label used by the CLI and persisted records.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Model => "model",
            Self::Image => "image",
            Self::Audio => "audio",
            Self::Video => "video",
            Self::Unclassified => "unclassified",
        }
    }
}

/// Normalized lowercase extension including the leading dot (e.g. `.fbx`).
///
/// The empty string is the "no extension" sentinel and sorts before every
/// real extension.
#[derive(Debug, Clone, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FileType(String);

impl FileType {
    /// The sentinel used for files without an extension and for directories.
    pub fn none() -> Self {
        Self(String::new())
    }

    /// Normalize a raw extension, with or without its leading dot.
    pub fn from_extension(raw: &str) -> Self {
        let trimmed = raw.trim().to_lowercase();
        let bare = trimmed.strip_prefix('.').unwrap_or(&trimmed);
        Self(format!(".{bare}"))
    }

    /// True for the no-extension sentinel.
    pub fn is_none(&self) -> bool {
        self.0.is_empty()
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for FileType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// One file or directory discovered during traversal.
///
/// `path` is `/`-joined and relative to the scan root; it is the unique key of
/// the entry within a scan session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Entry {
    pub path: String,
    pub name: String,
    pub kind: EntryKind,
    pub file_type: FileType,
    pub category: AssetCategory,
    /// Capability used to read the entry later. Pseudo-entries rebuilt from
    /// persisted records may not carry one.
    pub handle: Option<EntryHandle>,
}

impl Entry {
    /// Build a classified file entry.
    pub fn file(
        path: String,
        name: String,
        classification: Classification,
        handle: Option<EntryHandle>,
    ) -> Self {
        Self {
            path,
            name,
            kind: EntryKind::File,
            file_type: classification.file_type,
            category: classification.category,
            handle,
        }
    }

    /// Build a directory entry.
    pub fn directory(path: String, name: String, handle: Option<EntryHandle>) -> Self {
        Self {
            path,
            name,
            kind: EntryKind::Directory,
            file_type: FileType::none(),
            category: AssetCategory::Unclassified,
            handle,
        }
    }

    pub fn is_file(&self) -> bool {
        self.kind == EntryKind::File
    }

    pub fn is_dir(&self) -> bool {
        self.kind == EntryKind::Directory
    }

    /// True when this entry is `ancestor` itself or lives anywhere beneath it.
    pub fn is_within(&self, ancestor: &str) -> bool {
        path_is_within(&self.path, ancestor)
    }
}

/// Join a relative base path and a child name with `/`.
pub fn join_path(base: &str, name: &str) -> String {
    if base.is_empty() {
        name.to_string()
    } else {
        format!("{base}/{name}")
    }
}

/// Last `/`-separated segment of a relative path.
pub fn last_segment(path: &str) -> &str {
    path.rsplit('/').next().unwrap_or(path)
}

/// True when `path` equals `ancestor` or is nested under it.
pub fn path_is_within(path: &str, ancestor: &str) -> bool {
    if ancestor.is_empty() {
        return true;
    }
    path == ancestor
        || path
            .strip_prefix(ancestor)
            .is_some_and(|rest| rest.starts_with('/'))
}

/// Scan-time bundle of the classifier and the ignore rules.
#[derive(Debug, Clone, Default)]
pub struct ScanRules {
    pub classifier: ExtensionClassifier,
    pub ignore: IgnoreRules,
}

impl ScanRules {
    pub fn new(classifier: ExtensionClassifier, ignore: IgnoreRules) -> Self {
        Self { classifier, ignore }
    }
}
