//! Incremental asset scanning, filtering and export for a local asset browser.

/// Session façade driven by front ends.
pub mod app;
/// Application directory helpers.
pub mod app_dirs;
/// Entries, file types and classification rules.
pub mod assets;
/// View state, filtering and sorting of scanned entries.
pub mod browse;
/// TOML settings.
pub mod config;
/// Selection tracking and zip export.
pub mod export;
/// Logging setup.
pub mod logging;
/// Directory capability providers.
pub mod provider;
/// Tree walking and the scan coordinator.
pub mod scanner;
/// Persistent records: recents, bookmarks and tags.
pub mod store;
