//! Loopline configuration sections
//!
//! Stored as YAML; every section uses `#[serde(default)]` so older files
//! missing newer keys still load.

use super::paths::default_store_path;
use crate::timeline::AdjacencyPolicy;
use crate::types::{DEFAULT_SEGMENT_LENGTH, DEFAULT_SPEED, MIN_SEGMENT_DURATION};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

/// Root configuration structure
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LooplineConfig {
    pub timeline: TimelineConfig,
    pub interaction: InteractionConfig,
    pub playback: PlaybackConfig,
    pub persistence: PersistenceConfig,
}

/// Segment geometry rules
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TimelineConfig {
    /// Shortest allowed loop (seconds)
    pub min_segment_duration: f64,
    /// Length of loops created by double-click or the keyboard shortcut (seconds)
    pub default_segment_length: f64,
    /// Whether loops may touch end-to-start
    pub adjacency: AdjacencyPolicy,
}

impl Default for TimelineConfig {
    fn default() -> Self {
        Self {
            min_segment_duration: MIN_SEGMENT_DURATION,
            default_segment_length: DEFAULT_SEGMENT_LENGTH,
            adjacency: AdjacencyPolicy::Allow,
        }
    }
}

/// Pointer, touch and keyboard tuning
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct InteractionConfig {
    /// Dragging on empty track creates a loop instead of scrubbing
    pub creation_enabled: bool,
    /// Width of the resize handles at either edge of a segment
    pub handle_width_px: f64,
    /// Movement below this is a click, not a drag
    pub click_slop_px: f64,
    /// Longest touch still treated as a tap
    pub tap_max_ms: u64,
    /// Largest touch movement still treated as a tap
    pub tap_slop_px: f64,
    /// Max gap between the two activations of a double-click/double-tap
    pub double_activation_ms: u64,
    /// How long mouse input is ignored after a touch ends
    pub synthetic_mouse_guard_ms: u64,
    /// Character key that creates a loop at the playhead
    pub create_shortcut: String,
}

impl Default for InteractionConfig {
    fn default() -> Self {
        Self {
            creation_enabled: true,
            handle_width_px: 8.0,
            click_slop_px: 3.0,
            tap_max_ms: 300,
            tap_slop_px: 10.0,
            double_activation_ms: 300,
            synthetic_mouse_guard_ms: 500,
            create_shortcut: "l".into(),
        }
    }
}

/// Loop playback settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlaybackConfig {
    /// Expected interval between transport time updates
    pub tick_interval_ms: u64,
    /// Repeat count given to new loops
    pub default_repeat_count: u32,
    /// Speed used for loops without their own mapping
    pub global_speed: f64,
}

impl Default for PlaybackConfig {
    fn default() -> Self {
        Self {
            tick_interval_ms: 250,
            default_repeat_count: 1,
            global_speed: DEFAULT_SPEED,
        }
    }
}

/// Where and how often state is persisted
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PersistenceConfig {
    /// YAML store for segments and speed mappings
    pub store_path: PathBuf,
    /// Quiet period before pending writes are flushed
    pub debounce_ms: u64,
}

impl Default for PersistenceConfig {
    fn default() -> Self {
        Self {
            store_path: default_store_path(),
            debounce_ms: 2000,
        }
    }
}

impl PersistenceConfig {
    pub fn debounce(&self) -> Duration {
        Duration::from_millis(self.debounce_ms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_yaml_fills_defaults() {
        let yaml = "interaction:\n  creation_enabled: false\ntimeline:\n  adjacency: forbid\n";
        let config: LooplineConfig = serde_yaml::from_str(yaml).unwrap();
        assert!(!config.interaction.creation_enabled);
        assert_eq!(config.interaction.tap_max_ms, 300);
        assert_eq!(config.timeline.adjacency, AdjacencyPolicy::Forbid);
        assert_eq!(config.timeline.min_segment_duration, MIN_SEGMENT_DURATION);
        assert_eq!(config.persistence.debounce(), Duration::from_secs(2));
    }
}
