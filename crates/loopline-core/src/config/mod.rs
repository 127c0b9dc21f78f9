//! Configuration for loopline
//!
//! - Generic YAML config loading/saving
//! - Standard config and store paths
//! - [`LooplineConfig`]: timeline, interaction, playback and persistence settings
//!
//! # Usage
//!
//! ```ignore
//! use loopline_core::config::{load_config, default_config_path, LooplineConfig};
//!
//! let config: LooplineConfig = load_config(&default_config_path());
//! ```

mod io;
mod paths;
mod settings;

pub use io::{load_config, save_config};
pub use paths::{default_config_dir, default_config_path, default_store_path};
pub use settings::{
    InteractionConfig, LooplineConfig, PersistenceConfig, PlaybackConfig, TimelineConfig,
};
