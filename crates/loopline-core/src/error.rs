//! Error types for Loopline
//!
//! Nothing in the core is fatal: every variant describes a rejected request
//! together with whatever the caller needs to correct it.

use crate::timeline::{BoundsIssue, CollisionInfo};
use crate::types::SegmentId;
use thiserror::Error;

/// Errors from segment set mutations
#[derive(Error, Debug, Clone, PartialEq)]
pub enum SegmentError {
    /// The range needed adjusting; the adjusted bounds may be re-submitted
    #[error("Invalid loop bounds: {}", format_issues(.issues))]
    InvalidBounds {
        issues: Vec<BoundsIssue>,
        adjusted_start: f64,
        adjusted_end: f64,
    },

    /// The range overlaps committed segments
    #[error("Loop overlaps {} existing loop(s) by {:.2}s", .info.colliding_segments.len(), .info.overlap_duration)]
    Collision { info: CollisionInfo },

    /// No segment with this id
    #[error("Loop segment not found: {0}")]
    NotFound(SegmentId),

    /// Track duration is not known yet
    #[error("Track duration unknown, cannot place loop")]
    UnknownDuration,
}

fn format_issues(issues: &[BoundsIssue]) -> String {
    issues
        .iter()
        .map(|i| i.to_string())
        .collect::<Vec<_>>()
        .join("; ")
}

/// Errors from the speed resolver
#[derive(Error, Debug, Clone, Copy, PartialEq)]
pub enum SpeedError {
    #[error("Speed {requested} is outside the supported range {min}-{max}")]
    OutOfRange { requested: f64, min: f64, max: f64 },
}

/// Errors from the loop playback controller
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlaybackError {
    #[error("Loop segment not found: {0}")]
    NotFound(SegmentId),
}

/// Errors from [`crate::session::LoopSession`] calls that span several components
#[derive(Error, Debug, Clone, PartialEq)]
pub enum SessionError {
    #[error(transparent)]
    Segment(#[from] SegmentError),

    #[error(transparent)]
    Speed(#[from] SpeedError),

    #[error(transparent)]
    Playback(#[from] PlaybackError),
}

/// Errors from key/value persistence
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("Store I/O failed: {0}")]
    Io(#[from] std::io::Error),

    #[error("Store contents could not be parsed: {0}")]
    Parse(String),

    #[error("Value could not be serialized: {0}")]
    Serialize(String),
}

/// Result type for segment operations
pub type SegmentResult<T> = Result<T, SegmentError>;

/// Result type for session operations
pub type SessionResult<T> = Result<T, SessionError>;

/// Result type for store operations
pub type StoreResult<T> = Result<T, StoreError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invalid_bounds_message_lists_issues() {
        let err = SegmentError::InvalidBounds {
            issues: vec![
                BoundsIssue::StartBeforeTrack { start: -1.0 },
                BoundsIssue::Inverted,
            ],
            adjusted_start: 0.0,
            adjusted_end: 0.1,
        };
        let msg = err.to_string();
        assert!(msg.starts_with("Invalid loop bounds:"));
        assert!(msg.contains("; Loop start must come before its end"));
    }

    #[test]
    fn test_session_error_is_transparent() {
        let err: SessionError = SegmentError::NotFound(SegmentId(4)).into();
        assert_eq!(err.to_string(), "Loop segment not found: 4");
    }

    #[test]
    fn test_speed_error_message() {
        let err = SpeedError::OutOfRange {
            requested: 3.0,
            min: 0.25,
            max: 2.0,
        };
        assert_eq!(
            err.to_string(),
            "Speed 3 is outside the supported range 0.25-2"
        );
    }
}
