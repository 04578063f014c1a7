//! Default path resolution for the configuration file

use std::path::{Path, PathBuf};

/// File name looked up when no `config_file` option is given.
pub const DEFAULT_CONFIG_FILE: &str = "analytics.yml";

/// Directory, relative to the working directory, that holds configuration files.
pub const DEFAULT_CONFIG_DIR: &str = "config";

/// Returns the default configuration directory (`./config`).
pub fn default_config_dir() -> PathBuf {
    PathBuf::from(DEFAULT_CONFIG_DIR)
}

/// Resolve a configuration file name against a configuration directory.
///
/// Absolute paths are returned unchanged; relative ones are placed under
/// `config_dir`.
pub fn resolve_config_path(config_dir: &Path, file: impl AsRef<Path>) -> PathBuf {
    let file = file.as_ref();
    if file.is_absolute() {
        file.to_path_buf()
    } else {
        config_dir.join(file)
    }
}
