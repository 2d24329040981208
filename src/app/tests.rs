use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use super::*;
use crate::export::ExportError;
use crate::provider::MemoryProvider;
use crate::scanner::ScanOutcome;
use crate::store::{SqliteRecordStore, StoreError};

fn fixture() -> Arc<MemoryProvider> {
    Arc::new(
        MemoryProvider::new()
            .with_file("root.obj", b"obj".to_vec())
            .with_file("models/hero.fbx", b"hero".to_vec())
            .with_file("models/skin.png", b"skin".to_vec())
            .with_file("models/chars/npc.fbx", b"npc".to_vec())
            .with_file("textures/skin_diffuse.png", b"diffuse".to_vec())
            .with_file("audio/hit.wav", b"hit".to_vec()),
    )
}

fn browser(provider: &Arc<MemoryProvider>) -> AssetBrowser {
    let store = SqliteRecordStore::open_in_memory().unwrap();
    AssetBrowser::new(provider.clone(), Box::new(store), AppConfig::default()).unwrap()
}

fn opened(provider: &Arc<MemoryProvider>) -> AssetBrowser {
    let mut browser = browser(provider);
    browser.open_root(provider.root_handle(), "game").unwrap();
    browser
}

fn names(entries: &[Entry]) -> Vec<&str> {
    entries.iter().map(|entry| entry.name.as_str()).collect()
}

#[test]
fn open_root_scans_and_records_recent_folder() {
    let provider = fixture();
    let mut browser = browser(&provider);
    let summary = browser.open_root(provider.root_handle(), "game").unwrap();
    assert_eq!(summary.outcome, ScanOutcome::Completed);
    assert_eq!(browser.root_name(), Some("game"));
    assert_eq!(browser.recent_folders().unwrap()[0].name, "game");
    assert_eq!(names(&browser.visible_files()), vec!["root.obj"]);
    assert_eq!(
        names(&browser.visible_folders()),
        vec!["audio", "models", "textures"]
    );
}

#[test]
fn invalid_root_is_not_recorded() {
    let provider = fixture();
    let mut browser = browser(&provider);
    let err = browser
        .open_root(provider.handle("missing"), "missing")
        .unwrap_err();
    assert!(matches!(err, BrowserError::Scan(ScanError::InvalidRoot(_))));
    assert!(browser.recent_folders().unwrap().is_empty());
    assert_eq!(browser.root_name(), None);
}

#[test]
fn navigation_scopes_files_and_search_goes_global() {
    let provider = fixture();
    let mut browser = opened(&provider);
    browser.navigate_to("models").unwrap();
    assert_eq!(names(&browser.visible_files()), vec!["hero.fbx", "skin.png"]);
    assert_eq!(names(&browser.visible_folders()), vec!["chars"]);

    browser.set_search("skin", SearchScope::File);
    assert_eq!(
        names(&browser.visible_files()),
        vec!["skin.png", "skin_diffuse.png"]
    );

    browser.set_search("char", SearchScope::Folder);
    assert_eq!(names(&browser.visible_files()), vec!["hero.fbx", "skin.png"]);
    assert_eq!(names(&browser.visible_folders()), vec!["chars"]);

    let err = browser.navigate_to("nowhere").unwrap_err();
    assert!(matches!(err, BrowserError::Scan(ScanError::FolderNotFound(_))));
    assert_eq!(browser.filter().current_path, "models");
}

#[test]
fn open_root_resets_view_state() {
    let provider = fixture();
    let mut browser = opened(&provider);
    browser.navigate_to("models").unwrap();
    browser.set_category(CategoryFilter::Image);
    browser.set_search("skin", SearchScope::File);
    browser.set_sort(SortKey::Type);
    browser.toggle_selection("models/skin.png");
    browser.open_file("models/skin.png").unwrap();

    browser.open_root(provider.root_handle(), "game").unwrap();
    assert_eq!(browser.filter(), &FilterState::default());
    assert!(browser.selection().is_empty());
    assert_eq!(browser.selected_file(), None);
}

#[test]
fn file_navigation_wraps_and_opened_files_become_recent() {
    let provider = fixture();
    let mut browser = opened(&provider);
    browser.navigate_to("models").unwrap();
    assert_eq!(browser.next_file(), None);

    let opened = browser.open_file("models/hero.fbx").unwrap();
    assert_eq!(opened.name, "hero.fbx");
    assert_eq!(browser.next_file().unwrap().name, "skin.png");
    assert_eq!(browser.next_file().unwrap().name, "hero.fbx");
    assert_eq!(browser.previous_file().unwrap().name, "skin.png");
    assert_eq!(browser.selected_file(), Some("models/skin.png"));

    browser.show_recent().unwrap();
    assert_eq!(browser.filter().view_mode, ViewMode::Recent);
    let recent = browser.visible_files();
    assert_eq!(names(&recent), vec!["hero.fbx"]);
    assert_eq!(recent[0].handle, Some(provider.handle("models/hero.fbx")));

    let err = browser.open_file("gone.fbx").unwrap_err();
    assert!(matches!(err, BrowserError::FileNotFound(path) if path == "gone.fbx"));
}

#[test]
fn tags_drive_collections_and_filters() {
    let provider = fixture();
    let mut browser = opened(&provider);
    assert_eq!(
        browser.add_tag("models/hero.fbx", "hero").unwrap(),
        vec!["hero"]
    );
    browser.add_tag("audio/hit.wav", "sfx").unwrap();
    assert_eq!(browser.collections(), vec!["hero", "sfx"]);

    browser.set_search("i", SearchScope::File);
    browser.set_tag_filter(Some("sfx".into()));
    assert_eq!(names(&browser.visible_files()), vec!["hit.wav"]);
    browser.set_tag_filter(None);
    browser.set_search("", SearchScope::File);

    browser.show_collection("hero").unwrap();
    assert_eq!(browser.filter().view_mode, ViewMode::Collection);
    assert_eq!(browser.filter().active_collection.as_deref(), Some("hero"));
    let files = browser.visible_files();
    assert_eq!(files.len(), 1);
    assert_eq!(files[0].path, "models/hero.fbx");

    assert_eq!(
        browser.show_collections_overview().unwrap(),
        vec!["hero", "sfx"]
    );
    assert!(browser.visible_files().is_empty());

    assert!(browser.remove_tag("models/hero.fbx", "hero").unwrap().is_empty());
    assert_eq!(browser.collections(), vec!["sfx"]);

    browser.show_project();
    assert_eq!(names(&browser.visible_files()), vec!["root.obj"]);
}

#[test]
fn export_is_named_after_current_folder() {
    let provider = fixture();
    let mut browser = opened(&provider);
    let err = browser.export_selection().unwrap_err();
    assert!(matches!(err, BrowserError::Export(ExportError::EmptySelection)));

    browser.toggle_selection("root.obj");
    assert_eq!(browser.export_selection().unwrap().file_name, "game.zip");

    browser.navigate_to("models").unwrap();
    browser.clear_selection();
    assert_eq!(browser.select_all_visible(), 2);
    let archive = browser.export_selection().unwrap();
    assert_eq!(archive.file_name, "models.zip");
    assert_eq!(archive.entries, 2);
}

#[test]
fn bookmarks_follow_the_open_project() {
    let provider = fixture();
    let mut browser = opened(&provider);
    assert!(!browser.is_project_bookmarked());
    assert!(browser.toggle_project_bookmark().unwrap());
    browser.navigate_to("models").unwrap();
    assert!(browser.toggle_folder_bookmark().unwrap());
    assert!(browser.is_current_path_bookmarked());
    assert_eq!(browser.folder_bookmarks()[0].name, "models");

    browser.open_root(provider.root_handle(), "game").unwrap();
    assert!(browser.is_project_bookmarked());
    assert!(!browser.is_current_path_bookmarked());
    assert_eq!(browser.folder_bookmarks().len(), 1);
    assert_eq!(browser.project_bookmarks().unwrap()[0].name, "game");

    browser.navigate_to("models").unwrap();
    assert!(browser.is_current_path_bookmarked());
}

#[test]
fn refresh_picks_up_new_files() {
    let provider = fixture();
    let mut browser = opened(&provider);
    browser.navigate_to("models").unwrap();
    provider.add_file("models/new.obj", b"new".to_vec());
    browser.refresh_current_folder().unwrap();
    assert_eq!(
        names(&browser.visible_files()),
        vec!["hero.fbx", "new.obj", "skin.png"]
    );

    browser.navigate_to("").unwrap();
    provider.add_file("top.glb", b"glb".to_vec());
    browser.refresh_current_folder().unwrap();
    assert_eq!(names(&browser.visible_files()), vec!["root.obj", "top.glb"]);
}

#[test]
fn going_home_closes_the_project() {
    let provider = fixture();
    let mut browser = opened(&provider);
    browser.toggle_selection("root.obj");
    browser.go_home();
    assert_eq!(browser.root_name(), None);
    assert!(browser.visible_files().is_empty());
    assert!(browser.visible_folders().is_empty());
    assert!(browser.selection().is_empty());
    assert!(matches!(
        browser.toggle_project_bookmark(),
        Err(BrowserError::NoRoot)
    ));
    assert!(!browser.stop_scan());
}

/// Delegates to SQLite but can be told to reject recent-folder writes.
struct FailingStore {
    inner: SqliteRecordStore,
    fail_saves: Arc<AtomicBool>,
}

impl RecordStore for FailingStore {
    fn save_folder_handle(&self, name: &str, root: &EntryHandle) -> Result<(), StoreError> {
        if self.fail_saves.load(Ordering::SeqCst) {
            return Err(StoreError::Busy);
        }
        self.inner.save_folder_handle(name, root)
    }
    fn recent_folders(&self) -> Result<Vec<RecentFolder>, StoreError> {
        self.inner.recent_folders()
    }
    fn toggle_project_bookmark(&self, name: &str, root: &EntryHandle) -> Result<bool, StoreError> {
        self.inner.toggle_project_bookmark(name, root)
    }
    fn project_bookmarks(&self) -> Result<Vec<ProjectBookmark>, StoreError> {
        self.inner.project_bookmarks()
    }
    fn is_project_bookmarked(&self, name: &str) -> Result<bool, StoreError> {
        self.inner.is_project_bookmarked(name)
    }
    fn toggle_folder_bookmark(&self, root_name: &str, path: &str) -> Result<bool, StoreError> {
        self.inner.toggle_folder_bookmark(root_name, path)
    }
    fn folder_bookmarks(&self, root_name: &str) -> Result<Vec<FolderBookmark>, StoreError> {
        self.inner.folder_bookmarks(root_name)
    }
    fn is_folder_bookmarked(&self, root_name: &str, path: &str) -> Result<bool, StoreError> {
        self.inner.is_folder_bookmarked(root_name, path)
    }
    fn add_tag(&self, entry: &Entry, tag: &str) -> Result<Vec<String>, StoreError> {
        self.inner.add_tag(entry, tag)
    }
    fn remove_tag(&self, path: &str, tag: &str) -> Result<Vec<String>, StoreError> {
        self.inner.remove_tag(path, tag)
    }
    fn tags_for_file(&self, path: &str) -> Result<Vec<String>, StoreError> {
        self.inner.tags_for_file(path)
    }
    fn all_tags(&self) -> Result<TagIndex, StoreError> {
        self.inner.all_tags()
    }
    fn save_recent_file(&self, entry: &Entry, limit: usize) -> Result<(), StoreError> {
        self.inner.save_recent_file(entry, limit)
    }
    fn recent_files(&self) -> Result<Vec<RecentFile>, StoreError> {
        self.inner.recent_files()
    }
}

#[test]
fn store_failure_keeps_previous_project_open() {
    let provider = fixture();
    let fail_saves = Arc::new(AtomicBool::new(false));
    let store = FailingStore {
        inner: SqliteRecordStore::open_in_memory().unwrap(),
        fail_saves: Arc::clone(&fail_saves),
    };
    let mut browser =
        AssetBrowser::new(provider.clone(), Box::new(store), AppConfig::default()).unwrap();
    browser.open_root(provider.root_handle(), "game").unwrap();
    browser.navigate_to("models").unwrap();
    browser.toggle_selection("models/hero.fbx");

    fail_saves.store(true, Ordering::SeqCst);
    let err = browser
        .open_root(provider.handle("textures"), "textures")
        .unwrap_err();
    assert!(matches!(err, BrowserError::Store(StoreError::Busy)));
    assert_eq!(browser.root_name(), Some("game"));
    assert_eq!(browser.filter().current_path, "models");
    assert!(browser.selection().contains("models/hero.fbx"));
    assert_eq!(browser.export_selection().unwrap().file_name, "models.zip");
}
