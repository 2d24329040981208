//! Non-visual browsing session: one open project, its scan, the active view
//! and filters, the file selection and the persisted records behind them.

use std::sync::Arc;
use std::thread::JoinHandle;

use tracing::{debug, info, warn};

use crate::assets::{Entry, ScanRules, last_segment};
use crate::browse::{
    self, CategoryFilter, FilterState, SearchScope, SortKey, TagIndex, ViewMode,
};
use crate::config::AppConfig;
use crate::export::{self, ExportedArchive, Selection};
use crate::provider::{DirectoryProvider, EntryHandle};
use crate::scanner::{ScanCoordinator, ScanError, ScanSummary, SessionSnapshot};
use crate::store::{FolderBookmark, ProjectBookmark, RecentFile, RecentFolder, RecordStore};

mod errors;

pub use errors::BrowserError;

#[cfg(test)]
mod tests;

/// Where the files of the current view come from.
#[derive(Debug, Clone)]
enum Listing {
    /// The live scan session of the open project.
    Project,
    /// Files loaded from records for the recent and collection views.
    Loaded(Arc<Vec<Entry>>),
}

#[derive(Debug, Clone)]
struct OpenRoot {
    handle: EntryHandle,
    name: String,
}

#[derive(Debug, Clone, Default)]
struct BookmarkState {
    project: bool,
    current_path: bool,
    folders: Vec<FolderBookmark>,
}

/// Drives scanning, filtering, tagging and export for one window.
pub struct AssetBrowser {
    coordinator: ScanCoordinator,
    store: Box<dyn RecordStore>,
    config: AppConfig,
    rules: ScanRules,
    root: Option<OpenRoot>,
    listing: Listing,
    filter: FilterState,
    tags: TagIndex,
    selection: Selection,
    selected_file: Option<String>,
    bookmarks: BookmarkState,
}

impl AssetBrowser {
    /// Build a browser over `provider`, loading the persisted tags.
    pub fn new(
        provider: Arc<dyn DirectoryProvider>,
        store: Box<dyn RecordStore>,
        config: AppConfig,
    ) -> Result<Self, BrowserError> {
        let rules = config.scan.scan_rules();
        let coordinator =
            ScanCoordinator::new(provider, rules.clone(), config.scan.batch_policy());
        let tags = store.all_tags()?;
        Ok(Self {
            coordinator,
            store,
            config,
            rules,
            root: None,
            listing: Listing::Project,
            filter: FilterState::default(),
            tags,
            selection: Selection::new(),
            selected_file: None,
            bookmarks: BookmarkState::default(),
        })
    }

    /// The scan coordinator, for observers, cancellation and snapshots.
    pub fn coordinator(&self) -> &ScanCoordinator {
        &self.coordinator
    }

    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    pub fn filter(&self) -> &FilterState {
        &self.filter
    }

    pub fn tags(&self) -> &TagIndex {
        &self.tags
    }

    pub fn selection(&self) -> &Selection {
        &self.selection
    }

    pub fn selected_file(&self) -> Option<&str> {
        self.selected_file.as_deref()
    }

    /// Name of the open project, if any.
    pub fn root_name(&self) -> Option<&str> {
        self.root.as_ref().map(|root| root.name.as_str())
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        self.coordinator.snapshot()
    }

    /// Open a project folder and scan it on the calling thread.
    pub fn open_root(
        &mut self,
        root: EntryHandle,
        name: &str,
    ) -> Result<ScanSummary, BrowserError> {
        self.prepare_root(&root, name)?;
        Ok(self.coordinator.start_scan(root, name)?)
    }

    /// Open a project folder and scan it on a worker thread.
    ///
    /// The session is reset before this returns; snapshots taken afterwards
    /// belong to the new project.
    pub fn open_root_in_background(
        &mut self,
        root: EntryHandle,
        name: &str,
    ) -> Result<JoinHandle<Result<ScanSummary, ScanError>>, BrowserError> {
        self.prepare_root(&root, name)?;
        Ok(self.coordinator.scan_in_background(root, name))
    }

    fn prepare_root(&mut self, root: &EntryHandle, name: &str) -> Result<(), BrowserError> {
        if !self.coordinator.provider().is_dir(root) {
            return Err(ScanError::InvalidRoot(root.location().to_path_buf()).into());
        }
        let tags = self.store.all_tags()?;
        let bookmarks = self.load_bookmarks(name, "")?;
        self.store.save_folder_handle(name, root)?;

        // Nothing below can fail, so a store error leaves the previous project open.
        self.filter.reset();
        self.listing = Listing::Project;
        self.selection.clear();
        self.selected_file = None;
        self.tags = tags;
        self.bookmarks = bookmarks;
        self.root = Some(OpenRoot {
            handle: root.clone(),
            name: name.to_string(),
        });
        info!(root = %root.location().display(), name, "Opening project");
        Ok(())
    }

    /// Rescan the current folder, or the whole project at the root.
    pub fn refresh_current_folder(&mut self) -> Result<ScanSummary, BrowserError> {
        let root = self.root.clone().ok_or(BrowserError::NoRoot)?;
        if self.filter.current_path.is_empty() {
            return Ok(self.coordinator.start_scan(root.handle, root.name)?);
        }
        Ok(self.coordinator.refresh_folder(&self.filter.current_path)?)
    }

    /// Stop the running scan; returns false when nothing was running.
    pub fn stop_scan(&self) -> bool {
        self.coordinator.cancel_scan()
    }

    /// Close the project and go back to the start screen.
    pub fn go_home(&mut self) {
        if self.coordinator.cancel_scan() {
            debug!("Cancelled scan on leaving project");
        }
        self.root = None;
        self.listing = Listing::Project;
        self.filter.view_mode = ViewMode::Folder;
        self.filter.active_collection = None;
        self.filter.current_path.clear();
        self.selection.clear();
        self.selected_file = None;
        self.bookmarks = BookmarkState::default();
    }

    /// Enter `path` inside the open project (`""` is the root).
    pub fn navigate_to(&mut self, path: &str) -> Result<(), BrowserError> {
        let root = self.root.as_ref().ok_or(BrowserError::NoRoot)?;
        let path = path.trim_matches('/');
        if !path.is_empty()
            && !self
                .coordinator
                .snapshot()
                .folders()
                .iter()
                .any(|folder| folder.path == path)
        {
            return Err(ScanError::FolderNotFound(path.to_string()).into());
        }
        self.bookmarks.current_path = self.store.is_folder_bookmarked(&root.name, path)?;
        self.filter.view_mode = ViewMode::Folder;
        self.filter.active_collection = None;
        self.filter.current_path = path.to_string();
        self.listing = Listing::Project;
        Ok(())
    }

    /// Back from a record-backed view to the live project listing.
    pub fn show_project(&mut self) {
        self.filter.view_mode = ViewMode::Folder;
        self.filter.active_collection = None;
        self.listing = Listing::Project;
    }

    /// Show recently opened files, newest first before sorting.
    pub fn show_recent(&mut self) -> Result<(), BrowserError> {
        let files: Vec<Entry> = self
            .store
            .recent_files()?
            .into_iter()
            .map(|file| self.recent_entry(file))
            .collect();
        debug!(count = files.len(), "Showing recent files");
        self.enter_loaded_view(ViewMode::Recent, files);
        Ok(())
    }

    /// Show every file carrying `tag`.
    pub fn show_collection(&mut self, tag: &str) -> Result<(), BrowserError> {
        self.reload_tags()?;
        let files = self.tags.collection_entries(tag, &self.rules.classifier);
        debug!(tag, count = files.len(), "Showing collection");
        self.enter_loaded_view(ViewMode::Collection, files);
        self.filter.active_collection = Some(tag.to_string());
        Ok(())
    }

    /// Switch to the collection list and return the known collection names.
    pub fn show_collections_overview(&mut self) -> Result<Vec<String>, BrowserError> {
        self.reload_tags()?;
        self.enter_loaded_view(ViewMode::CollectionsOverview, Vec::new());
        Ok(self.collections())
    }

    fn enter_loaded_view(&mut self, mode: ViewMode, files: Vec<Entry>) {
        self.filter.view_mode = mode;
        self.filter.active_collection = None;
        self.filter.current_path.clear();
        self.listing = Listing::Loaded(Arc::new(files));
        self.selection.clear();
    }

    fn recent_entry(&self, file: RecentFile) -> Entry {
        let mut classification = self.rules.classifier.classify(&file.name);
        if !file.file_type.is_none() {
            classification.category = self.rules.classifier.category_of(&file.file_type);
            classification.file_type = file.file_type;
        }
        Entry::file(
            file.path,
            file.name,
            classification,
            file.location.as_deref().map(EntryHandle::from_location),
        )
    }

    /// Sorted, de-duplicated tag names.
    pub fn collections(&self) -> Vec<String> {
        self.tags.unique_tags()
    }

    pub fn set_category(&mut self, category: CategoryFilter) {
        self.filter.category = category;
    }

    pub fn set_search(&mut self, query: impl Into<String>, scope: SearchScope) {
        self.filter.search_query = query.into();
        self.filter.search_scope = scope;
    }

    pub fn set_sort(&mut self, sort: SortKey) {
        self.filter.sort = sort;
    }

    pub fn set_tag_filter(&mut self, tag: Option<String>) {
        self.filter.selected_tag = tag.filter(|tag| !tag.is_empty());
    }

    fn source_files(&self) -> Arc<Vec<Entry>> {
        match &self.listing {
            Listing::Project if self.root.is_some() => self.coordinator.snapshot().accepted_files,
            Listing::Project => Arc::new(Vec::new()),
            Listing::Loaded(files) => Arc::clone(files),
        }
    }

    /// Files of the current view after scope, category, search, tag and sort.
    pub fn visible_files(&self) -> Vec<Entry> {
        let files = self.source_files();
        browse::compute_visible_files(&files, &self.filter, &self.tags)
            .into_iter()
            .cloned()
            .collect()
    }

    /// Sub-folders of the current folder, or folder search matches.
    pub fn visible_folders(&self) -> Vec<Entry> {
        if self.root.is_none() {
            return Vec::new();
        }
        let snapshot = self.coordinator.snapshot();
        browse::visible_folders(snapshot.folders(), &self.filter)
            .into_iter()
            .cloned()
            .collect()
    }

    /// Select `path` for viewing and remember it as a recent file.
    pub fn open_file(&mut self, path: &str) -> Result<Entry, BrowserError> {
        let entry = self
            .source_files()
            .iter()
            .find(|entry| entry.path == path)
            .cloned()
            .ok_or_else(|| BrowserError::FileNotFound(path.to_string()))?;
        self.selected_file = Some(entry.path.clone());
        if entry.handle.is_some() {
            self.store
                .save_recent_file(&entry, self.config.browser.recent_files_limit)?;
        }
        Ok(entry)
    }

    /// Close the viewer and pick up tag edits made while it was open.
    pub fn close_file(&mut self) -> Result<(), BrowserError> {
        self.selected_file = None;
        self.reload_tags()
    }

    /// Move the viewer to the next visible file, wrapping at the end.
    pub fn next_file(&mut self) -> Option<Entry> {
        self.step_file(true)
    }

    /// Move the viewer to the previous visible file, wrapping at the start.
    pub fn previous_file(&mut self) -> Option<Entry> {
        self.step_file(false)
    }

    fn step_file(&mut self, forward: bool) -> Option<Entry> {
        let current = self.selected_file.as_deref()?;
        let visible = self.visible_files();
        let len = visible.len();
        if len <= 1 {
            return None;
        }
        let index = visible.iter().position(|entry| entry.path == current)?;
        let next = if forward {
            (index + 1) % len
        } else {
            (index + len - 1) % len
        };
        let entry = visible[next].clone();
        self.selected_file = Some(entry.path.clone());
        Some(entry)
    }

    pub fn tags_for(&self, path: &str) -> Result<Vec<String>, BrowserError> {
        Ok(self.store.tags_for_file(path)?)
    }

    /// Tag `path`, returning its tags afterwards.
    pub fn add_tag(&mut self, path: &str, tag: &str) -> Result<Vec<String>, BrowserError> {
        let entry = self
            .source_files()
            .iter()
            .find(|entry| entry.path == path)
            .cloned()
            .unwrap_or_else(|| {
                let name = last_segment(path).to_string();
                let classification = self.rules.classifier.classify(&name);
                Entry::file(path.to_string(), name, classification, None)
            });
        let tags = self.store.add_tag(&entry, tag)?;
        self.reload_tags()?;
        Ok(tags)
    }

    /// Untag `path`, returning its remaining tags.
    pub fn remove_tag(&mut self, path: &str, tag: &str) -> Result<Vec<String>, BrowserError> {
        let tags = self.store.remove_tag(path, tag)?;
        self.reload_tags()?;
        Ok(tags)
    }

    fn reload_tags(&mut self) -> Result<(), BrowserError> {
        self.tags = self.store.all_tags()?;
        Ok(())
    }

    /// Flip `path` in the selection; returns whether it is selected now.
    pub fn toggle_selection(&mut self, path: &str) -> bool {
        self.selection.toggle(path)
    }

    pub fn clear_selection(&mut self) {
        self.selection.clear();
    }

    /// Add every visible file to the selection and return how many are selected.
    pub fn select_all_visible(&mut self) -> usize {
        for entry in self.visible_files() {
            self.selection.insert(entry.path);
        }
        self.selection.len()
    }

    /// Zip the selected files of the current listing.
    ///
    /// The archive is named after the current folder, or the project at the root.
    pub fn export_selection(&self) -> Result<ExportedArchive, BrowserError> {
        let files = self.source_files();
        let name = export::archive_name(
            &self.filter.current_path,
            self.root_name().unwrap_or_default(),
        );
        let archive = export::export_selection(
            &self.selection,
            &files,
            self.coordinator.provider().as_ref(),
            &name,
            self.config.export.compression,
        )
        .inspect_err(|err| warn!(error = %err, "Export failed"))?;
        Ok(archive)
    }

    pub fn recent_folders(&self) -> Result<Vec<RecentFolder>, BrowserError> {
        Ok(self.store.recent_folders()?)
    }

    pub fn project_bookmarks(&self) -> Result<Vec<ProjectBookmark>, BrowserError> {
        Ok(self.store.project_bookmarks()?)
    }

    /// Bookmarked folders of the open project, newest first.
    pub fn folder_bookmarks(&self) -> &[FolderBookmark] {
        &self.bookmarks.folders
    }

    pub fn is_project_bookmarked(&self) -> bool {
        self.bookmarks.project
    }

    pub fn is_current_path_bookmarked(&self) -> bool {
        self.bookmarks.current_path
    }

    pub fn toggle_project_bookmark(&mut self) -> Result<bool, BrowserError> {
        let root = self.root.as_ref().ok_or(BrowserError::NoRoot)?;
        self.bookmarks.project = self.store.toggle_project_bookmark(&root.name, &root.handle)?;
        Ok(self.bookmarks.project)
    }

    /// Bookmark or un-bookmark the current folder of the open project.
    pub fn toggle_folder_bookmark(&mut self) -> Result<bool, BrowserError> {
        let root = self.root.as_ref().ok_or(BrowserError::NoRoot)?;
        let marked = self
            .store
            .toggle_folder_bookmark(&root.name, &self.filter.current_path)?;
        self.bookmarks.current_path = marked;
        self.bookmarks.folders = self.store.folder_bookmarks(&root.name)?;
        Ok(marked)
    }

    fn load_bookmarks(&self, root_name: &str, path: &str) -> Result<BookmarkState, BrowserError> {
        Ok(BookmarkState {
            project: self.store.is_project_bookmarked(root_name)?,
            current_path: self.store.is_folder_bookmarked(root_name, path)?,
            folders: self.store.folder_bookmarks(root_name)?,
        })
    }
}
