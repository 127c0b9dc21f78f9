//! YAML config I/O
//!
//! Works with any serde type that has a sensible `Default`.

use anyhow::{Context, Result};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::path::Path;

/// Load a YAML config file
///
/// A missing file yields `T::default()`. An unreadable or unparsable file is
/// logged and also yields the default, so a broken config never blocks startup.
pub fn load_config<T>(path: &Path) -> T
where
    T: DeserializeOwned + Default,
{
    if !path.exists() {
        log::info!("load_config: {:?} not found, using defaults", path);
        return T::default();
    }

    let contents = match std::fs::read_to_string(path) {
        Ok(contents) => contents,
        Err(e) => {
            log::warn!("load_config: cannot read {:?}: {}, using defaults", path, e);
            return T::default();
        }
    };

    match serde_yaml::from_str::<T>(&contents) {
        Ok(config) => {
            log::info!("load_config: loaded {:?}", path);
            config
        }
        Err(e) => {
            log::warn!("load_config: cannot parse {:?}: {}, using defaults", path, e);
            T::default()
        }
    }
}

/// Save a config as YAML, creating parent directories as needed
pub fn save_config<T>(config: &T, path: &Path) -> Result<()>
where
    T: Serialize,
{
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create config directory: {:?}", parent))?;
    }

    let yaml = serde_yaml::to_string(config).context("Failed to serialize config to YAML")?;
    std::fs::write(path, yaml).with_context(|| format!("Failed to write config file: {:?}", path))?;

    log::info!("save_config: wrote {:?}", path);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::LooplineConfig;

    #[test]
    fn test_missing_file_gives_defaults() {
        let config: LooplineConfig = load_config(Path::new("/nonexistent/loopline/config.yaml"));
        assert_eq!(config, LooplineConfig::default());
    }

    #[test]
    fn test_save_then_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("loopline").join("config.yaml");

        let mut config = LooplineConfig::default();
        config.interaction.creation_enabled = false;
        config.playback.global_speed = 0.75;

        save_config(&config, &path).unwrap();
        let loaded: LooplineConfig = load_config(&path);
        assert_eq!(loaded, config);
    }

    #[test]
    fn test_garbage_file_gives_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.yaml");
        std::fs::write(&path, "timeline: [unterminated").unwrap();
        let config: LooplineConfig = load_config(&path);
        assert_eq!(config, LooplineConfig::default());
    }
}
