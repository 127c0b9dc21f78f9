//! Overlap detection and collision-aware placement
//!
//! Segments are compared as intervals. Under the default
//! [`AdjacencyPolicy::Allow`] they are half-open `[start, end)`, so two
//! segments that touch at a boundary do not collide. A candidate never
//! collides with itself: the candidate's own id is skipped.

use crate::types::{LoopSegment, SegmentId};
use serde::{Deserialize, Serialize};

/// How segments that touch exactly at a boundary are treated
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AdjacencyPolicy {
    /// Touching segments are allowed (half-open intervals)
    #[default]
    Allow,
    /// Touching segments count as a collision (closed intervals)
    Forbid,
}

/// A suggested non-colliding range for a candidate
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Placement {
    pub start: f64,
    pub end: f64,
}

/// Result of a full collision query
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CollisionInfo {
    pub has_collision: bool,
    /// Colliding segments, ordered by start time
    pub colliding_segments: Vec<LoopSegment>,
    /// Sum of per-segment overlaps (seconds)
    pub overlap_duration: f64,
    /// Candidate shifted to start right after the latest colliding segment,
    /// keeping its length. `None` when that would run past the track end.
    pub recommended_position: Option<Placement>,
}

impl CollisionInfo {
    /// Ids of the colliding segments, in start order
    pub fn colliding_ids(&self) -> Vec<SegmentId> {
        self.colliding_segments.iter().map(|s| s.id).collect()
    }
}

/// Stateless collision queries with a configurable adjacency policy
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CollisionEngine {
    pub policy: AdjacencyPolicy,
}

impl CollisionEngine {
    pub fn new(policy: AdjacencyPolicy) -> Self {
        Self { policy }
    }

    /// Whether `[a_start, a_end)` and `[b_start, b_end)` intersect under the policy
    #[inline]
    pub fn intervals_overlap(&self, a_start: f64, a_end: f64, b_start: f64, b_end: f64) -> bool {
        match self.policy {
            AdjacencyPolicy::Allow => a_start < b_end && b_start < a_end,
            AdjacencyPolicy::Forbid => a_start <= b_end && b_start <= a_end,
        }
    }

    fn colliders<'a>(
        &'a self,
        candidate: Option<SegmentId>,
        start: f64,
        end: f64,
        segments: &'a [LoopSegment],
    ) -> impl Iterator<Item = &'a LoopSegment> + 'a {
        segments.iter().filter(move |seg| {
            Some(seg.id) != candidate
                && self.intervals_overlap(start, end, seg.start_time, seg.end_time)
        })
    }

    /// True iff any segment other than `candidate` intersects `[start, end)`
    pub fn check_overlap(
        &self,
        candidate: Option<SegmentId>,
        start: f64,
        end: f64,
        segments: &[LoopSegment],
    ) -> bool {
        self.colliders(candidate, start, end, segments).next().is_some()
    }

    /// Full collision report for a candidate range on a track of `duration` seconds
    pub fn collision_info(
        &self,
        candidate: Option<SegmentId>,
        start: f64,
        end: f64,
        segments: &[LoopSegment],
        duration: f64,
    ) -> CollisionInfo {
        let mut colliding: Vec<LoopSegment> = self
            .colliders(candidate, start, end, segments)
            .cloned()
            .collect();

        if colliding.is_empty() {
            return CollisionInfo::default();
        }

        colliding.sort_by(|a, b| a.start_time.total_cmp(&b.start_time));

        let overlap_duration = colliding
            .iter()
            .map(|seg| (end.min(seg.end_time) - start.max(seg.start_time)).max(0.0))
            .sum();

        let latest_end = colliding
            .iter()
            .map(|seg| seg.end_time)
            .fold(f64::NEG_INFINITY, f64::max);
        let length = end - start;
        let shifted_start = latest_end.max(0.0);
        let shifted_end = shifted_start + length;
        let recommended_position = (shifted_end <= duration).then_some(Placement {
            start: shifted_start,
            end: shifted_end,
        });

        log::debug!(
            "collision_info: [{:.3}, {:.3}) hits {} segment(s), overlap {:.3}s",
            start,
            end,
            colliding.len(),
            overlap_duration
        );

        CollisionInfo {
            has_collision: true,
            colliding_segments: colliding,
            overlap_duration,
            recommended_position,
        }
    }
}
