//! Selection tracking and archive export of selected files.

use std::fs;
use std::io;
use std::path::Path;

use tracing::{info, warn};

use crate::assets::{Entry, last_segment};
use crate::provider::DirectoryProvider;

mod archive;
mod errors;
mod selection;

pub use archive::{ArchiveCompression, ArchiveWriter, ZipArchiveWriter};
pub use errors::ExportError;
pub use selection::Selection;

/// Finished archive ready to be saved or offered for download.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportedArchive {
    /// Suggested file name, including the `.zip` extension.
    pub file_name: String,
    pub bytes: Vec<u8>,
    /// Number of files stored in the archive.
    pub entries: usize,
}

impl ExportedArchive {
    /// Write the archive to `path`, replacing any existing file.
    pub fn save_to(&self, path: &Path) -> Result<(), ExportError> {
        fs::write(path, &self.bytes).map_err(|source| ExportError::Save {
            path: path.to_path_buf(),
            source,
        })
    }
}

/// Base name for an export: the current folder's last segment, or the root
/// name at the root scope.
pub fn archive_name(current_path: &str, root_name: &str) -> String {
    let base = if current_path.is_empty() {
        root_name
    } else {
        last_segment(current_path)
    };
    if base.is_empty() {
        "assets".to_string()
    } else {
        base.to_string()
    }
}

/// Bundle every selected file into a zip archive keyed by its relative path.
///
/// `files` is the lookup used to resolve selected paths to readable entries.
/// The first unreadable (or unresolvable) selected file aborts the export.
pub fn export_selection(
    selection: &Selection,
    files: &[Entry],
    provider: &dyn DirectoryProvider,
    name_hint: &str,
    compression: ArchiveCompression,
) -> Result<ExportedArchive, ExportError> {
    export_with(
        ZipArchiveWriter::new(compression),
        selection,
        files,
        provider,
        name_hint,
    )
}

/// [`export_selection`] over any [`ArchiveWriter`].
pub fn export_with<W: ArchiveWriter>(
    mut writer: W,
    selection: &Selection,
    files: &[Entry],
    provider: &dyn DirectoryProvider,
    name_hint: &str,
) -> Result<ExportedArchive, ExportError> {
    if selection.is_empty() {
        return Err(ExportError::EmptySelection);
    }
    let chosen: Vec<&Entry> = files
        .iter()
        .filter(|entry| entry.is_file() && selection.contains(&entry.path))
        .collect();
    if let Some(missing) = selection
        .iter()
        .find(|path| !chosen.iter().any(|entry| entry.path == *path))
    {
        return Err(ExportError::ExportRead {
            path: missing.to_string(),
            source: io::Error::new(io::ErrorKind::NotFound, "selected file is not available"),
        });
    }
    let mut entries = 0;
    for entry in chosen {
        let Some(handle) = entry.handle.as_ref() else {
            return Err(ExportError::ExportRead {
                path: entry.path.clone(),
                source: io::Error::new(io::ErrorKind::NotFound, "file has no readable handle"),
            });
        };
        let bytes = provider.read_file(handle).map_err(|source| {
            warn!(path = %entry.path, error = %source, "Export aborted on unreadable file");
            ExportError::ExportRead {
                path: entry.path.clone(),
                source,
            }
        })?;
        writer.write(&entry.path, &bytes)?;
        entries += 1;
    }
    let bytes = writer.finalize()?;
    let file_name = format!("{name_hint}.zip");
    info!(file = %file_name, entries, size = bytes.len(), "Exported selection");
    Ok(ExportedArchive {
        file_name,
        bytes,
        entries,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assets::ExtensionClassifier;
    use crate::provider::MemoryProvider;
    use std::io::{Cursor, Read};

    fn entry(provider: &MemoryProvider, path: &str) -> Entry {
        let name = last_segment(path).to_string();
        let classification = ExtensionClassifier::default().classify(&name);
        Entry::file(path.into(), name, classification, Some(provider.handle(path)))
    }

    fn fixture() -> (MemoryProvider, Vec<Entry>) {
        let provider = MemoryProvider::new()
            .with_file("a.fbx", b"fbx-data".to_vec())
            .with_file("sub/b.png", b"png-data".to_vec())
            .with_file("sub/c.wav", b"wav-data".to_vec());
        let files = vec![
            entry(&provider, "a.fbx"),
            entry(&provider, "sub/b.png"),
            entry(&provider, "sub/c.wav"),
        ];
        (provider, files)
    }

    #[test]
    fn archive_preserves_relative_paths_and_bytes() {
        let (provider, files) = fixture();
        let selection: Selection = ["a.fbx", "sub/b.png"].into_iter().collect();
        let exported = export_selection(
            &selection,
            &files,
            &provider,
            "project",
            ArchiveCompression::Deflated,
        )
        .unwrap();
        assert_eq!(exported.file_name, "project.zip");
        assert_eq!(exported.entries, 2);
        let mut archive = zip::ZipArchive::new(Cursor::new(exported.bytes)).unwrap();
        let mut names: Vec<String> = archive.file_names().map(str::to_string).collect();
        names.sort();
        assert_eq!(names, vec!["a.fbx", "sub/b.png"]);
        let mut content = Vec::new();
        archive
            .by_name("sub/b.png")
            .unwrap()
            .read_to_end(&mut content)
            .unwrap();
        assert_eq!(content, b"png-data");
    }

    #[test]
    fn unreadable_file_aborts_with_its_path() {
        let (provider, files) = fixture();
        provider.fail("sub/b.png");
        let selection: Selection = ["a.fbx", "sub/b.png", "sub/c.wav"].into_iter().collect();
        let err = export_selection(
            &selection,
            &files,
            &provider,
            "project",
            ArchiveCompression::Stored,
        )
        .unwrap_err();
        assert!(matches!(err, ExportError::ExportRead { path, .. } if path == "sub/b.png"));
    }

    #[test]
    fn empty_and_unknown_selections_fail() {
        let (provider, files) = fixture();
        let err = export_selection(
            &Selection::new(),
            &files,
            &provider,
            "x",
            ArchiveCompression::Stored,
        )
        .unwrap_err();
        assert!(matches!(err, ExportError::EmptySelection));

        let selection: Selection = ["gone.fbx"].into_iter().collect();
        let err = export_selection(&selection, &files, &provider, "x", ArchiveCompression::Stored)
            .unwrap_err();
        assert!(matches!(err, ExportError::ExportRead { path, .. } if path == "gone.fbx"));
    }

    #[test]
    fn archive_name_uses_folder_or_root() {
        assert_eq!(archive_name("models/tex", "project"), "tex");
        assert_eq!(archive_name("", "project"), "project");
        assert_eq!(archive_name("", ""), "assets");
    }
}
