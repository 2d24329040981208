use std::fs;
use std::io::{Cursor, Read};
use std::path::Path;
use std::sync::{Arc, Mutex};

use assetscope::app::AssetBrowser;
use assetscope::assets::{AssetCategory, ScanRules};
use assetscope::browse::{self, FilterState, SearchScope, TagIndex};
use assetscope::config::AppConfig;
use assetscope::export::{ArchiveCompression, Selection, export_selection};
use assetscope::provider::FsProvider;
use assetscope::scanner::{BatchPolicy, ScanCoordinator, ScanEvent, ScanOutcome};
use assetscope::store::SqliteRecordStore;
use tempfile::{TempDir, tempdir};

fn write(root: &Path, rel: &str, content: &[u8]) {
    let path = root.join(rel);
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(path, content).unwrap();
}

fn project() -> TempDir {
    let dir = tempdir().unwrap();
    let root = dir.path();
    write(root, "a.fbx", b"fbx");
    write(root, "models/b.png", b"png");
    write(root, "models/c.txt", b"txt");
    write(root, "models/deep/e.glb", b"glb");
    write(root, "node_modules/x.png", b"ignored");
    write(root, ".git/objects/y.png", b"ignored");
    write(root, "audio/Hit.WAV", b"wav");
    dir
}

fn coordinator(batch_size: usize) -> ScanCoordinator {
    ScanCoordinator::new(
        Arc::new(FsProvider::new()),
        ScanRules::default(),
        BatchPolicy::new(batch_size, std::time::Duration::from_secs(60)),
    )
}

#[test]
fn scan_accepts_assets_and_prunes_ignored_folders() {
    let dir = project();
    let coordinator = coordinator(250);
    let summary = coordinator
        .start_scan(FsProvider::handle_for(dir.path()), "project")
        .unwrap();
    assert_eq!(summary.outcome, ScanOutcome::Completed);

    let snapshot = coordinator.snapshot();
    let mut files: Vec<&str> = snapshot.files().iter().map(|f| f.path.as_str()).collect();
    files.sort();
    assert_eq!(
        files,
        vec!["a.fbx", "audio/Hit.WAV", "models/b.png", "models/deep/e.glb"]
    );
    let mut folders: Vec<&str> = snapshot.folders().iter().map(|f| f.path.as_str()).collect();
    folders.sort();
    assert_eq!(folders, vec!["audio", "models", "models/deep"]);

    let hit = snapshot
        .files()
        .iter()
        .find(|f| f.name == "Hit.WAV")
        .unwrap();
    assert_eq!(hit.file_type.as_str(), ".wav");
    assert_eq!(hit.category, AssetCategory::Audio);
    // 4 accepted files, models/c.txt and 3 folders.
    assert_eq!(snapshot.total_entries_seen, 8);
    assert!(!snapshot.is_scanning);
}

#[test]
fn batches_grow_monotonically_over_real_directories() {
    let dir = project();
    let coordinator = coordinator(1);
    let sizes = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&sizes);
    coordinator.observe(move |event| {
        if let ScanEvent::Batch(snapshot) = event {
            sink.lock().unwrap().push(snapshot.files().len());
        }
    });
    coordinator
        .start_scan(FsProvider::handle_for(dir.path()), "project")
        .unwrap();
    let sizes = sizes.lock().unwrap();
    assert!(sizes.windows(2).all(|pair| pair[0] <= pair[1]));
    assert_eq!(sizes.last().copied(), Some(4));
}

#[test]
fn refresh_sees_changes_on_disk() {
    let dir = project();
    let coordinator = coordinator(250);
    coordinator
        .start_scan(FsProvider::handle_for(dir.path()), "project")
        .unwrap();
    fs::remove_dir_all(dir.path().join("models/deep")).unwrap();
    write(dir.path(), "models/new.obj", b"obj");

    coordinator.refresh_folder("models").unwrap();
    let snapshot = coordinator.snapshot();
    let mut files: Vec<&str> = snapshot.files().iter().map(|f| f.path.as_str()).collect();
    files.sort();
    assert_eq!(
        files,
        vec!["a.fbx", "audio/Hit.WAV", "models/b.png", "models/new.obj"]
    );
    assert!(snapshot.folders().iter().all(|f| f.path != "models/deep"));
}

#[test]
fn filter_and_export_round_trip() {
    let dir = project();
    let coordinator = coordinator(250);
    coordinator
        .start_scan(FsProvider::handle_for(dir.path()), "project")
        .unwrap();
    let snapshot = coordinator.snapshot();

    let state = FilterState {
        current_path: "models".into(),
        ..FilterState::default()
    };
    let visible = browse::compute_visible_files(snapshot.files(), &state, &TagIndex::default());
    let names: Vec<&str> = visible.iter().map(|f| f.name.as_str()).collect();
    assert_eq!(names, vec!["b.png"]);

    let selection: Selection = ["models/b.png", "models/deep/e.glb"].into_iter().collect();
    let archive = export_selection(
        &selection,
        snapshot.files(),
        &FsProvider::new(),
        "models",
        ArchiveCompression::Deflated,
    )
    .unwrap();
    let out = dir.path().join("out.zip");
    archive.save_to(&out).unwrap();

    let mut zip = zip::ZipArchive::new(Cursor::new(fs::read(&out).unwrap())).unwrap();
    let mut content = Vec::new();
    zip.by_name("models/deep/e.glb")
        .unwrap()
        .read_to_end(&mut content)
        .unwrap();
    assert_eq!(content, b"glb");
    assert_eq!(zip.len(), 2);
}

#[test]
fn browser_lists_searches_and_exports_from_disk() {
    let dir = project();
    let store = SqliteRecordStore::open_in_memory().unwrap();
    let mut browser =
        AssetBrowser::new(Arc::new(FsProvider::new()), Box::new(store), AppConfig::default())
            .unwrap();
    browser
        .open_root(FsProvider::handle_for(dir.path()), "project")
        .unwrap();

    browser.set_search("DEEP", SearchScope::Folder);
    let folders = browser.visible_folders();
    assert_eq!(folders.len(), 1);
    assert_eq!(folders[0].path, "models/deep");

    browser.set_search("PNG", SearchScope::File);
    let files = browser.visible_files();
    assert_eq!(files.len(), 1);
    assert_eq!(files[0].path, "models/b.png");

    browser.select_all_visible();
    let archive = browser.export_selection().unwrap();
    assert_eq!(archive.file_name, "project.zip");
    assert_eq!(archive.entries, 1);
}
