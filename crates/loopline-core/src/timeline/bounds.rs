//! Segment bounds validation
//!
//! Clamps a candidate `[start, end]` to the track and enforces the minimum
//! segment length. Validation never fails hard: the adjusted bounds are
//! always returned so a caller can choose to auto-apply them.

use crate::types::MIN_SEGMENT_DURATION;
use thiserror::Error;

/// One adjustment made while validating a range
#[derive(Error, Debug, Clone, Copy, PartialEq)]
pub enum BoundsIssue {
    #[error("Loop cannot start before the beginning of the track ({start:.2}s)")]
    StartBeforeTrack { start: f64 },

    #[error("Loop cannot end after the track ({end:.2}s > {duration:.2}s)")]
    EndAfterTrack { end: f64, duration: f64 },

    #[error("Loop must be at least {min:.1}s long ({length:.3}s requested)")]
    TooShort { length: f64, min: f64 },

    #[error("Loop start must come before its end")]
    Inverted,
}

/// Outcome of [`validate`]
#[derive(Debug, Clone, PartialEq)]
pub struct BoundsValidation {
    /// False whenever any adjustment was made
    pub is_valid: bool,
    pub issues: Vec<BoundsIssue>,
    pub adjusted_start: f64,
    pub adjusted_end: f64,
}

impl BoundsValidation {
    /// Human-readable messages for every issue
    pub fn messages(&self) -> Vec<String> {
        self.issues.iter().map(|i| i.to_string()).collect()
    }
}

/// Validate a range against a track of `duration` seconds using the default minimum length
pub fn validate(start: f64, end: f64, duration: f64) -> BoundsValidation {
    validate_with_min(start, end, duration, MIN_SEGMENT_DURATION)
}

/// Validate a range with an explicit minimum length
///
/// Adjustments are applied in order:
/// 1. start is clamped to `>= 0`
/// 2. end is clamped to `<= duration`
/// 3. a range shorter than `min_duration` is extended and re-clamped
/// 4. if start is still not before end, end becomes `start + min_duration`
pub fn validate_with_min(start: f64, end: f64, duration: f64, min_duration: f64) -> BoundsValidation {
    let mut issues = Vec::new();
    let mut start = start;
    let mut end = end;

    if start < 0.0 {
        issues.push(BoundsIssue::StartBeforeTrack { start });
        start = 0.0;
    }

    if end > duration {
        issues.push(BoundsIssue::EndAfterTrack { end, duration });
        end = duration;
    }

    if end - start < min_duration {
        issues.push(BoundsIssue::TooShort {
            length: end - start,
            min: min_duration,
        });
        end = (start + min_duration).min(duration);
    }

    if start >= end {
        issues.push(BoundsIssue::Inverted);
        end = start + min_duration;
    }

    BoundsValidation {
        is_valid: issues.is_empty(),
        issues,
        adjusted_start: start,
        adjusted_end: end,
    }
}

/// Slide a range of `length` seconds starting at `start` so it lies inside
/// `[0, duration]`, keeping its length when the track is long enough
pub fn fit_within_track(start: f64, length: f64, duration: f64) -> (f64, f64) {
    if length >= duration {
        return (0.0, duration.max(0.0));
    }
    let start = start.clamp(0.0, duration - length);
    (start, start + length)
}
