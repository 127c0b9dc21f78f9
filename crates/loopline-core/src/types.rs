//! Common types for Loopline
//!
//! The loop segment model and the constants shared by the timeline,
//! playback and speed modules.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Shortest allowed loop segment (seconds)
pub const MIN_SEGMENT_DURATION: f64 = 0.1;

/// Length of loops synthesized by double-activation or the keyboard shortcut (seconds)
pub const DEFAULT_SEGMENT_LENGTH: f64 = 5.0;

/// Slowest supported playback speed
pub const MIN_SPEED: f64 = 0.25;

/// Fastest supported playback speed
pub const MAX_SPEED: f64 = 2.0;

/// Speed quantization step
pub const SPEED_STEP: f64 = 0.25;

/// Default playback speed
pub const DEFAULT_SPEED: f64 = 1.0;

/// Loop colors, assigned round-robin to new segments
pub const LOOP_COLORS: [&str; 8] = [
    "#3399CC", // Teal
    "#4DB380", // Green
    "#8080CC", // Purple
    "#B3804D", // Orange
    "#996699", // Magenta
    "#669966", // Olive
    "#999933", // Yellow
    "#806680", // Gray-purple
];

/// Stable identifier of a loop segment
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SegmentId(pub u64);

impl fmt::Display for SegmentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A named, time-bounded region with its own speed and repeat count
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoopSegment {
    pub id: SegmentId,
    pub name: String,
    /// Start position in seconds
    pub start_time: f64,
    /// End position in seconds (at least `MIN_SEGMENT_DURATION` after start)
    pub end_time: f64,
    /// Quantized playback speed in `[MIN_SPEED, MAX_SPEED]`
    pub speed: f64,
    /// How many passes to play before moving on (>= 1)
    pub repeat_count: u32,
    /// Display color as `#RRGGBB`
    pub color: String,
    /// Completed passes since the segment was created
    #[serde(default)]
    pub play_count: u32,
    /// Whether this segment is currently driving repeat playback
    #[serde(default)]
    pub is_active: bool,
}

impl LoopSegment {
    /// Create a segment with default speed, a single repeat and no play history
    pub fn new(id: SegmentId, name: impl Into<String>, start_time: f64, end_time: f64) -> Self {
        Self {
            id,
            name: name.into(),
            start_time,
            end_time,
            speed: DEFAULT_SPEED,
            repeat_count: 1,
            color: LOOP_COLORS[(id.0 as usize) % LOOP_COLORS.len()].to_string(),
            play_count: 0,
            is_active: false,
        }
    }

    /// Builder-style repeat count (clamped to at least 1)
    pub fn with_repeat_count(mut self, repeat_count: u32) -> Self {
        self.repeat_count = repeat_count.max(1);
        self
    }

    /// Length in seconds
    #[inline]
    pub fn duration(&self) -> f64 {
        self.end_time - self.start_time
    }

    /// Whether `time` lies within the closed range `[start_time, end_time]`
    #[inline]
    pub fn contains(&self, time: f64) -> bool {
        time >= self.start_time && time <= self.end_time
    }
}

/// Snap a speed to the nearest supported step, clamped to the supported range
pub fn quantize_speed(speed: f64) -> f64 {
    let snapped = (speed / SPEED_STEP).round() * SPEED_STEP;
    snapped.clamp(MIN_SPEED, MAX_SPEED)
}

/// Whether a requested speed lies within the supported range
pub fn is_supported_speed(speed: f64) -> bool {
    speed.is_finite() && (MIN_SPEED..=MAX_SPEED).contains(&speed)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_quantize_speed() {
        assert_eq!(quantize_speed(1.3), 1.25);
        assert_eq!(quantize_speed(1.4), 1.5);
        assert_eq!(quantize_speed(0.3), 0.25);
        assert_eq!(quantize_speed(2.0), 2.0);
        assert_eq!(quantize_speed(5.0), MAX_SPEED);
    }

    #[test]
    fn test_supported_speed_range() {
        assert!(is_supported_speed(0.25));
        assert!(is_supported_speed(2.0));
        assert!(!is_supported_speed(0.2));
        assert!(!is_supported_speed(2.01));
        assert!(!is_supported_speed(f64::NAN));
    }

    #[test]
    fn test_segment_contains_is_closed() {
        let seg = LoopSegment::new(SegmentId(1), "Intro", 10.0, 20.0);
        assert!(seg.contains(10.0));
        assert!(seg.contains(20.0));
        assert!(!seg.contains(20.01));
        assert_eq!(seg.duration(), 10.0);
    }

    #[test]
    fn test_repeat_count_never_zero() {
        let seg = LoopSegment::new(SegmentId(1), "A", 0.0, 1.0).with_repeat_count(0);
        assert_eq!(seg.repeat_count, 1);
    }
}
