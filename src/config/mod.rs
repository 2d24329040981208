//! User settings stored as TOML in the app directory.

mod errors;
mod io;
mod types;


/// Default filename used to store the app configuration.
pub const CONFIG_FILE_NAME: &str = "config.toml";

pub use errors::ConfigError;
pub use io::{config_path, load_from, load_or_default, save, save_to_path};
pub use types::{AppConfig, BrowserSettings, ExportSettings, ScanSettings};
