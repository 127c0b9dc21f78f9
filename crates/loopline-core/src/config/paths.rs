//! Standard locations for loopline files

use std::path::PathBuf;

/// Directory holding loopline's config and store
///
/// Returns: `~/.config/loopline` (platform config dir), or `./loopline` as a fallback
pub fn default_config_dir() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("loopline")
}

/// Returns: `<config dir>/config.yaml`
pub fn default_config_path() -> PathBuf {
    default_config_dir().join("config.yaml")
}

/// Returns: `<config dir>/store.yaml`
pub fn default_store_path() -> PathBuf {
    default_config_dir().join("store.yaml")
}
