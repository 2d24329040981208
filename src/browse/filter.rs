use crate::assets::Entry;

use super::sort::{compare_names, sort_entries};
use super::{FilterState, SearchScope, TagIndex, ViewMode};

/// Derive the ordered visible subset of `files`.
///
/// Stages run in a fixed order: folder scope (folder view without a file
/// search), category, file-name search, tag, then a stable sort. A non-empty
/// file-name search replaces the folder scope with the whole input. Inputs are
/// never mutated.
pub fn compute_visible_files<'a>(
    files: &'a [Entry],
    state: &FilterState,
    tags: &TagIndex,
) -> Vec<&'a Entry> {
    let file_search = state.is_file_search();
    let query = state.search_query.to_lowercase();
    let scoped = state.view_mode == ViewMode::Folder && !file_search;
    let tagged = state
        .selected_tag
        .as_deref()
        .filter(|tag| !tag.is_empty())
        .map(|tag| tags.paths_with_tag(tag));

    let mut visible: Vec<&Entry> = files
        .iter()
        .filter(|entry| entry.is_file())
        .filter(|entry| !scoped || is_direct_child(&entry.path, &state.current_path))
        .filter(|entry| state.category.accepts(entry.category))
        .filter(|entry| !file_search || entry.name.to_lowercase().contains(&query))
        .filter(|entry| {
            tagged
                .as_ref()
                .is_none_or(|paths| paths.contains(entry.path.as_str()))
        })
        .collect();
    sort_entries(&mut visible, state.sort);
    visible
}

/// Folders whose name contains `query` (case-insensitive), sorted by name.
/// An empty query matches nothing.
pub fn search_folders<'a>(folders: &'a [Entry], query: &str) -> Vec<&'a Entry> {
    if query.is_empty() {
        return Vec::new();
    }
    let query = query.to_lowercase();
    let mut matches: Vec<&Entry> = folders
        .iter()
        .filter(|folder| folder.name.to_lowercase().contains(&query))
        .collect();
    matches.sort_by(|a, b| compare_names(&a.name, &b.name));
    matches
}

/// Direct subfolders of `current_path`, sorted by name.
pub fn child_folders<'a>(folders: &'a [Entry], current_path: &str) -> Vec<&'a Entry> {
    let mut children: Vec<&Entry> = folders
        .iter()
        .filter(|folder| is_direct_child(&folder.path, current_path))
        .collect();
    children.sort_by(|a, b| compare_names(&a.name, &b.name));
    children
}

/// Folder matches to render next to the file list for the given state.
pub fn visible_folders<'a>(folders: &'a [Entry], state: &FilterState) -> Vec<&'a Entry> {
    match (state.view_mode, state.search_scope) {
        (ViewMode::Folder, SearchScope::Folder) if !state.search_query.is_empty() => {
            search_folders(folders, &state.search_query)
        }
        (ViewMode::Folder, _) if state.search_query.is_empty() => {
            child_folders(folders, &state.current_path)
        }
        _ => Vec::new(),
    }
}

/// True when `path` sits directly inside `parent` (`""` being the root).
pub fn is_direct_child(path: &str, parent: &str) -> bool {
    if parent.is_empty() {
        return !path.contains('/');
    }
    path.strip_prefix(parent)
        .and_then(|rest| rest.strip_prefix('/'))
        .is_some_and(|rest| !rest.is_empty() && !rest.contains('/'))
}
