//! Command-line front end: scan a folder, list the filtered view, optionally
//! zip it.

use std::path::PathBuf;
use std::sync::Arc;

use assetscope::app::AssetBrowser;
use assetscope::assets::Entry;
use assetscope::browse::{CategoryFilter, SearchScope, SortKey};
use assetscope::provider::FsProvider;
use assetscope::scanner::{ScanEvent, ScanOutcome};
use assetscope::store::{RecordStore, SqliteRecordStore};
use assetscope::{config, logging};
use serde::Serialize;

fn main() {
    if let Err(err) = run() {
        eprintln!("{err}");
        std::process::exit(1);
    }
}

#[derive(Debug, PartialEq, Eq)]
struct CliOptions {
    root: PathBuf,
    category: CategoryFilter,
    path: String,
    search: Option<String>,
    search_folders: bool,
    sort: SortKey,
    tag: Option<String>,
    export: Option<PathBuf>,
    json: bool,
    config: Option<PathBuf>,
    no_history: bool,
    verbose: bool,
}

#[derive(Serialize)]
struct ListingRow<'a> {
    kind: &'a str,
    path: &'a str,
    name: &'a str,
    file_type: &'a str,
    category: &'a str,
}

impl<'a> ListingRow<'a> {
    fn file(entry: &'a Entry) -> Self {
        Self {
            kind: "file",
            path: &entry.path,
            name: &entry.name,
            file_type: entry.file_type.as_str(),
            category: entry.category.as_str(),
        }
    }

    fn folder(entry: &'a Entry) -> Self {
        Self {
            kind: "folder",
            path: &entry.path,
            name: &entry.name,
            file_type: "",
            category: "",
        }
    }
}

fn run() -> Result<(), String> {
    let Some(options) = parse_args(std::env::args().skip(1).collect())? else {
        return Ok(());
    };
    if let Err(err) = logging::init(if options.verbose { "info" } else { "warn" }) {
        eprintln!("Logging disabled: {err}");
    }

    let settings = match &options.config {
        Some(path) => config::load_from(path),
        None => config::load_or_default(),
    }
    .map_err(|err| err.to_string())?;
    let store: Box<dyn RecordStore> = if options.no_history {
        Box::new(SqliteRecordStore::open_in_memory().map_err(|err| err.to_string())?)
    } else {
        Box::new(SqliteRecordStore::open_default().map_err(|err| err.to_string())?)
    };
    let root = options
        .root
        .canonicalize()
        .map_err(|err| format!("Cannot open {}: {err}", options.root.display()))?;
    let name = root
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| root.display().to_string());

    let mut browser = AssetBrowser::new(Arc::new(FsProvider::new()), store, settings)
        .map_err(|err| err.to_string())?;
    browser.coordinator().observe(|event| match event {
        ScanEvent::Batch(snapshot) => eprint!(
            "\rScanning: {} files, {} folders",
            snapshot.files().len(),
            snapshot.folders().len()
        ),
        ScanEvent::Finished(_) | ScanEvent::Failed { .. } => eprintln!(),
        ScanEvent::Started { .. } => {}
    });
    let summary = browser
        .open_root(FsProvider::handle_for(&root), &name)
        .map_err(|err| err.to_string())?;
    if summary.outcome != ScanOutcome::Completed {
        return Err(format!("Scan of {} did not complete", root.display()));
    }
    eprintln!(
        "Scanned {} entries in {:.2?}",
        summary.entries_visited, summary.elapsed
    );

    if !options.path.is_empty() {
        browser
            .navigate_to(&options.path)
            .map_err(|err| err.to_string())?;
    }
    browser.set_category(options.category);
    browser.set_sort(options.sort);
    browser.set_tag_filter(options.tag.clone());
    let scope = if options.search_folders {
        SearchScope::Folder
    } else {
        SearchScope::File
    };
    browser.set_search(options.search.clone().unwrap_or_default(), scope);

    let folders = if options.search_folders {
        browser.visible_folders()
    } else {
        Vec::new()
    };
    let files = browser.visible_files();
    for row in folders
        .iter()
        .map(ListingRow::folder)
        .chain(files.iter().map(ListingRow::file))
    {
        if options.json {
            let line = serde_json::to_string(&row).map_err(|err| err.to_string())?;
            println!("{line}");
        } else if row.kind == "folder" {
            println!("{}/", row.path);
        } else {
            println!("{}\t{}", row.category, row.path);
        }
    }

    if let Some(out) = &options.export {
        if browser.select_all_visible() == 0 {
            return Err("Nothing to export: no visible files".to_string());
        }
        let archive = browser.export_selection().map_err(|err| err.to_string())?;
        archive.save_to(out).map_err(|err| err.to_string())?;
        eprintln!("Exported {} files to {}", archive.entries, out.display());
    }
    Ok(())
}

fn parse_args(args: Vec<String>) -> Result<Option<CliOptions>, String> {
    if args.iter().any(|arg| arg == "--help" || arg == "-h") {
        print_help();
        return Ok(None);
    }
    let mut root = None;
    let mut category = CategoryFilter::All;
    let mut path = String::new();
    let mut search = None;
    let mut search_folders = false;
    let mut sort = SortKey::NameAsc;
    let mut tag = None;
    let mut export = None;
    let mut json = false;
    let mut config = None;
    let mut no_history = false;
    let mut verbose = false;
    let mut it = args.into_iter();
    while let Some(arg) = it.next() {
        let mut value = |flag: &str| {
            it.next()
                .ok_or_else(|| format!("Missing value for {flag}"))
        };
        match arg.as_str() {
            "--category" => category = value("--category")?.parse()?,
            "--path" => path = value("--path")?.trim_matches('/').to_string(),
            "--search" => search = Some(value("--search")?),
            "--search-folders" => search_folders = true,
            "--sort" => sort = value("--sort")?.parse()?,
            "--tag" => tag = Some(value("--tag")?),
            "--export" => export = Some(PathBuf::from(value("--export")?)),
            "--config" => config = Some(PathBuf::from(value("--config")?)),
            "--json" => json = true,
            "--no-history" => no_history = true,
            "--verbose" | "-v" => verbose = true,
            flag if flag.starts_with('-') => return Err(format!("Unknown argument: {flag}")),
            _ if root.is_none() => root = Some(PathBuf::from(&arg)),
            _ => return Err(format!("Unexpected argument: {arg}")),
        }
    }
    let root = root.ok_or_else(|| "Missing folder to scan (see --help)".to_string())?;
    Ok(Some(CliOptions {
        root,
        category,
        path,
        search,
        search_folders,
        sort,
        tag,
        export,
        json,
        config,
        no_history,
        verbose,
    }))
}

fn print_help() {
    println!("Usage: assetscope <dir> [options]");
    println!();
    println!("Options:");
    println!("  --category <c>     all, model, image, audio or video");
    println!("  --path <p>         Folder inside <dir> to list (defaults to the root)");
    println!("  --search <q>       Case-insensitive name search across the whole tree");
    println!("  --search-folders   Apply --search to folder names instead of files");
    println!("  --sort <key>       name-asc, name-desc or type");
    println!("  --tag <t>          Only files carrying this tag");
    println!("  --export <file>    Zip every listed file into <file>");
    println!("  --json             Print one JSON object per line");
    println!("  --config <file>    Settings file (defaults to the app config)");
    println!("  --no-history       Do not record recent folders and files");
    println!("  --verbose, -v      Log scan progress details");
}
