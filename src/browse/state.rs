use std::fmt;
use std::str::FromStr;

use crate::assets::AssetCategory;

/// Which collection the visible list is derived from.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ViewMode {
    /// Live scan results scoped to the current folder.
    #[default]
    Folder,
    Recent,
    Collection,
    CollectionsOverview,
}

/// Category restriction applied to the visible list.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum CategoryFilter {
    #[default]
    All,
    Model,
    Image,
    Audio,
    Video,
}

impl CategoryFilter {
    pub fn accepts(self, category: AssetCategory) -> bool {
        match self {
            Self::All => true,
            Self::Model => category == AssetCategory::Model,
            Self::Image => category == AssetCategory::Image,
            Self::Audio => category == AssetCategory::Audio,
            Self::Video => category == AssetCategory::Video,
        }
    }
}

impl FromStr for CategoryFilter {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "all" => Ok(Self::All),
            "model" | "models" => Ok(Self::Model),
            "image" | "images" => Ok(Self::Image),
            "audio" => Ok(Self::Audio),
            "video" | "videos" => Ok(Self::Video),
            other => Err(format!("unknown category: {other}")),
        }
    }
}

/// Whether a search query targets file names or folder names.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SearchScope {
    #[default]
    File,
    Folder,
}

/// Ordering of the visible list.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SortKey {
    #[default]
    NameAsc,
    NameDesc,
    /// Extension first, then name ascending.
    Type,
}

impl FromStr for SortKey {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "name-asc" | "name" => Ok(Self::NameAsc),
            "name-desc" => Ok(Self::NameDesc),
            "type" => Ok(Self::Type),
            other => Err(format!("unknown sort key: {other}")),
        }
    }
}

impl fmt::Display for SortKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::NameAsc => "name-asc",
            Self::NameDesc => "name-desc",
            Self::Type => "type",
        })
    }
}

/// View parameters consumed by [`super::compute_visible_files`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FilterState {
    /// Folder scope; `""` is the root.
    pub current_path: String,
    pub view_mode: ViewMode,
    pub active_collection: Option<String>,
    pub category: CategoryFilter,
    pub search_query: String,
    pub search_scope: SearchScope,
    pub sort: SortKey,
    pub selected_tag: Option<String>,
}

impl FilterState {
    /// True when a file-name search overrides the folder scope.
    pub fn is_file_search(&self) -> bool {
        !self.search_query.is_empty() && self.search_scope == SearchScope::File
    }

    /// Back to defaults: root folder view, no filters, name ascending.
    pub fn reset(&mut self) {
        *self = Self::default();
    }
}
