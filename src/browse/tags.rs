use std::collections::{BTreeSet, HashSet};

use serde::{Deserialize, Serialize};

use crate::assets::{Entry, ExtensionClassifier, FileType, last_segment};
use crate::provider::EntryHandle;

/// Tags attached to one file path, plus whatever was known about the file
/// when it was first tagged.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TagRecord {
    pub path: String,
    pub tags: BTreeSet<String>,
    pub name: Option<String>,
    pub file_type: Option<FileType>,
    /// Persisted handle location, if the file was tagged from a live scan.
    pub handle: Option<String>,
}

impl TagRecord {
    pub fn new(path: impl Into<String>, tags: impl IntoIterator<Item = String>) -> Self {
        Self {
            path: path.into(),
            tags: tags.into_iter().collect(),
            name: None,
            file_type: None,
            handle: None,
        }
    }
}

/// Read-only view of every tag record.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TagIndex {
    records: Vec<TagRecord>,
}

impl TagIndex {
    pub fn new(records: Vec<TagRecord>) -> Self {
        Self { records }
    }

    pub fn records(&self) -> &[TagRecord] {
        &self.records
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Paths carrying `tag`.
    pub fn paths_with_tag(&self, tag: &str) -> HashSet<&str> {
        self.records
            .iter()
            .filter(|record| record.tags.contains(tag))
            .map(|record| record.path.as_str())
            .collect()
    }

    pub fn tags_for(&self, path: &str) -> Option<&BTreeSet<String>> {
        self.records
            .iter()
            .find(|record| record.path == path)
            .map(|record| &record.tags)
    }

    /// Every distinct tag, sorted.
    pub fn unique_tags(&self) -> Vec<String> {
        self.records
            .iter()
            .flat_map(|record| record.tags.iter().cloned())
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect()
    }

    /// Pseudo-entries for a collection view, rebuilt from the records rather
    /// than from the live scan. Missing names and types are recovered from the
    /// path.
    pub fn collection_entries(&self, tag: &str, classifier: &ExtensionClassifier) -> Vec<Entry> {
        self.records
            .iter()
            .filter(|record| record.tags.contains(tag))
            .map(|record| {
                let name = record
                    .name
                    .clone()
                    .filter(|name| !name.is_empty())
                    .unwrap_or_else(|| last_segment(&record.path).to_string());
                let mut classification = classifier.classify(last_segment(&record.path));
                if let Some(file_type) = record.file_type.clone().filter(|ty| !ty.is_none()) {
                    classification.category = classifier.category_of(&file_type);
                    classification.file_type = file_type;
                }
                Entry::file(
                    record.path.clone(),
                    name,
                    classification,
                    record.handle.as_deref().map(EntryHandle::from_location),
                )
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assets::AssetCategory;

    fn index() -> TagIndex {
        let mut hero = TagRecord::new("models/hero.fbx", ["chars".to_string(), "wip".to_string()]);
        hero.name = Some("hero.fbx".into());
        hero.file_type = Some(FileType::from_extension("fbx"));
        hero.handle = Some("/assets/models/hero.fbx".into());
        let skin = TagRecord::new("models/tex/skin.png", ["chars".to_string()]);
        TagIndex::new(vec![hero, skin])
    }

    #[test]
    fn unique_tags_are_sorted_and_deduplicated() {
        assert_eq!(index().unique_tags(), vec!["chars".to_string(), "wip".to_string()]);
    }

    #[test]
    fn collection_entries_recover_missing_fields() {
        let entries = index().collection_entries("chars", &ExtensionClassifier::default());
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].name, "hero.fbx");
        assert!(entries[0].handle.is_some());
        assert_eq!(entries[1].name, "skin.png");
        assert_eq!(entries[1].file_type.as_str(), ".png");
        assert_eq!(entries[1].category, AssetCategory::Image);
        assert!(entries[1].handle.is_none());
    }

    #[test]
    fn lookup_by_tag_and_path() {
        let index = index();
        let wip = index.paths_with_tag("wip");
        assert_eq!(wip.len(), 1);
        assert!(wip.contains("models/hero.fbx"));
        assert!(index.tags_for("models/tex/skin.png").unwrap().contains("chars"));
        assert!(index.tags_for("nope.png").is_none());
    }
}
