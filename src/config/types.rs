use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::assets::{ExtensionClassifier, FileType, IgnoreRules, ScanRules};
use crate::export::ArchiveCompression;
use crate::scanner::BatchPolicy;

pub(super) const MIN_BATCH_SIZE: usize = 1;
pub(super) const MAX_BATCH_SIZE: usize = 10_000;
pub(super) const MIN_FLUSH_INTERVAL_MS: u64 = 10;
pub(super) const MAX_FLUSH_INTERVAL_MS: u64 = 5_000;

fn default_batch_size() -> usize {
    250
}

fn default_flush_interval_ms() -> u64 {
    150
}

fn default_recent_files_limit() -> usize {
    50
}

/// Settings persisted in `config.toml`. Every key is optional.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub scan: ScanSettings,
    #[serde(default)]
    pub export: ExportSettings,
    #[serde(default)]
    pub browser: BrowserSettings,
}

impl AppConfig {
    /// Clamp numeric values into range and normalize extension spellings.
    pub fn normalized(mut self) -> Self {
        self.scan = self.scan.normalized();
        self
    }
}

/// Traversal and publishing knobs.
///
/// Config keys: `batch_size`, `flush_interval_ms`, `extra_extensions`,
/// `extra_ignored_folders`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScanSettings {
    #[serde(default = "default_batch_size")]
    pub batch_size: usize,
    #[serde(default = "default_flush_interval_ms")]
    pub flush_interval_ms: u64,
    /// Extensions accepted by the scan without a category.
    #[serde(default)]
    pub extra_extensions: Vec<String>,
    /// Folder names pruned in addition to the built-in list.
    #[serde(default)]
    pub extra_ignored_folders: Vec<String>,
}

impl Default for ScanSettings {
    fn default() -> Self {
        Self {
            batch_size: default_batch_size(),
            flush_interval_ms: default_flush_interval_ms(),
            extra_extensions: Vec::new(),
            extra_ignored_folders: Vec::new(),
        }
    }
}

impl ScanSettings {
    fn normalized(mut self) -> Self {
        self.batch_size = self.batch_size.clamp(MIN_BATCH_SIZE, MAX_BATCH_SIZE);
        self.flush_interval_ms = self
            .flush_interval_ms
            .clamp(MIN_FLUSH_INTERVAL_MS, MAX_FLUSH_INTERVAL_MS);
        let mut extensions: Vec<String> = self
            .extra_extensions
            .iter()
            .filter(|ext| !ext.trim().trim_start_matches('.').is_empty())
            .map(|ext| FileType::from_extension(ext).to_string())
            .collect();
        extensions.sort();
        extensions.dedup();
        self.extra_extensions = extensions;
        self.extra_ignored_folders
            .retain(|name| !name.trim().is_empty());
        self
    }

    pub fn batch_policy(&self) -> BatchPolicy {
        BatchPolicy::new(
            self.batch_size,
            Duration::from_millis(self.flush_interval_ms),
        )
    }

    pub fn scan_rules(&self) -> ScanRules {
        ScanRules::new(
            ExtensionClassifier::with_extra_allowed(&self.extra_extensions),
            IgnoreRules::with_extra(self.extra_ignored_folders.iter().cloned()),
        )
    }
}

/// Config keys: `compression`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExportSettings {
    #[serde(default)]
    pub compression: ArchiveCompression,
}

/// Config keys: `recent_files_limit`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BrowserSettings {
    #[serde(default = "default_recent_files_limit")]
    pub recent_files_limit: usize,
}

impl Default for BrowserSettings {
    fn default() -> Self {
        Self {
            recent_files_limit: default_recent_files_limit(),
        }
    }
}
