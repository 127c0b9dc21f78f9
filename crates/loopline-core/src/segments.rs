//! The committed set of loop segments
//!
//! [`LoopSet`] owns every committed segment, kept sorted by start time. All
//! mutations go through the bounds validator and the collision engine, so the
//! set never holds an out-of-track or overlapping segment. Rejected requests
//! come back as [`SegmentError`] with the adjusted bounds or collision report.

use crate::config::TimelineConfig;
use crate::error::{SegmentError, SegmentResult, StoreError};
use crate::persist::{DebouncedWriter, KeyValueStore, SEGMENTS_KEY};
use crate::timeline::{validate_with_min, CollisionEngine};
use crate::types::{
    is_supported_speed, quantize_speed, LoopSegment, SegmentId, MIN_SEGMENT_DURATION,
};

/// Tolerance used to tell a move (length kept) from a resize
const LENGTH_EPSILON: f64 = 1e-6;

/// A mutation applied to the set
#[derive(Debug, Clone, PartialEq)]
pub enum SegmentEvent {
    Created(SegmentId),
    Moved { id: SegmentId, start: f64, end: f64 },
    Resized { id: SegmentId, start: f64, end: f64 },
    Updated(SegmentId),
    Deleted(SegmentId),
}

/// Collision-free, start-ordered loop segments on one track
#[derive(Debug, Clone)]
pub struct LoopSet {
    segments: Vec<LoopSegment>,
    next_id: u64,
    duration: f64,
    min_duration: f64,
    collisions: CollisionEngine,
    default_repeat_count: u32,
}

impl LoopSet {
    /// Empty set on a track of `duration` seconds (0 while unknown)
    pub fn new(duration: f64) -> Self {
        Self::with_config(&TimelineConfig::default(), duration)
    }

    pub fn with_config(config: &TimelineConfig, duration: f64) -> Self {
        Self {
            segments: Vec::new(),
            next_id: 1,
            duration: duration.max(0.0),
            min_duration: config.min_segment_duration,
            collisions: CollisionEngine::new(config.adjacency),
            default_repeat_count: 1,
        }
    }

    /// Repeat count given to segments created from now on
    pub fn set_default_repeat_count(&mut self, repeat_count: u32) {
        self.default_repeat_count = repeat_count.max(1);
    }

    /// Update the track duration once the media transport knows it
    ///
    /// Segments that no longer fit inside `[0, duration]` are removed and
    /// returned so the caller can drop anything referring to them.
    pub fn set_duration(&mut self, duration: f64) -> Vec<LoopSegment> {
        self.duration = duration.max(0.0);
        if self.duration <= 0.0 {
            return Vec::new();
        }

        let limit = self.duration;
        let (kept, dropped): (Vec<_>, Vec<_>) = std::mem::take(&mut self.segments)
            .into_iter()
            .partition(|s| s.end_time <= limit);
        self.segments = kept;

        for segment in &dropped {
            log::warn!(
                "LoopSet: dropping {} '{}' [{:.3}, {:.3}], outside the {:.2}s track",
                segment.id,
                segment.name,
                segment.start_time,
                segment.end_time,
                limit
            );
        }
        dropped
    }

    pub fn duration(&self) -> f64 {
        self.duration
    }

    pub fn min_duration(&self) -> f64 {
        self.min_duration
    }

    pub fn collision_engine(&self) -> CollisionEngine {
        self.collisions
    }

    /// All segments, ordered by start time
    pub fn segments(&self) -> &[LoopSegment] {
        &self.segments
    }

    pub fn len(&self) -> usize {
        self.segments.len()
    }

    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }

    pub fn get(&self, id: SegmentId) -> Option<&LoopSegment> {
        self.segments.iter().find(|s| s.id == id)
    }

    pub fn contains(&self, id: SegmentId) -> bool {
        self.get(id).is_some()
    }

    /// Position of a segment in start order
    pub fn index_of(&self, id: SegmentId) -> Option<usize> {
        self.segments.iter().position(|s| s.id == id)
    }

    pub fn first(&self) -> Option<&LoopSegment> {
        self.segments.first()
    }

    pub fn last(&self) -> Option<&LoopSegment> {
        self.segments.last()
    }

    /// The segment following `id` in start order
    pub fn next_after(&self, id: SegmentId) -> Option<&LoopSegment> {
        self.index_of(id).and_then(|i| self.segments.get(i + 1))
    }

    /// The segment preceding `id` in start order
    pub fn previous_before(&self, id: SegmentId) -> Option<&LoopSegment> {
        self.index_of(id)
            .and_then(|i| i.checked_sub(1))
            .and_then(|i| self.segments.get(i))
    }

    /// First segment whose closed range contains `time`
    pub fn segment_at(&self, time: f64) -> Option<&LoopSegment> {
        self.segments.iter().find(|s| s.contains(time))
    }

    fn get_mut(&mut self, id: SegmentId) -> SegmentResult<&mut LoopSegment> {
        self.segments
            .iter_mut()
            .find(|s| s.id == id)
            .ok_or(SegmentError::NotFound(id))
    }

    fn sort(&mut self) {
        self.segments
            .sort_by(|a, b| a.start_time.total_cmp(&b.start_time));
    }

    /// Validate a range for `candidate` (or a new segment) without applying it
    pub fn check_range(&self, candidate: Option<SegmentId>, start: f64, end: f64) -> SegmentResult<()> {
        if self.duration <= 0.0 {
            return Err(SegmentError::UnknownDuration);
        }

        let validation = validate_with_min(start, end, self.duration, self.min_duration);
        if !validation.is_valid {
            return Err(SegmentError::InvalidBounds {
                issues: validation.issues,
                adjusted_start: validation.adjusted_start,
                adjusted_end: validation.adjusted_end,
            });
        }

        let info = self
            .collisions
            .collision_info(candidate, start, end, &self.segments, self.duration);
        if info.has_collision {
            return Err(SegmentError::Collision { info });
        }
        Ok(())
    }

    /// Add a new segment; a missing name becomes "Loop N"
    pub fn create(&mut self, name: Option<&str>, start: f64, end: f64) -> SegmentResult<SegmentId> {
        self.check_range(None, start, end)?;

        let id = SegmentId(self.next_id);
        self.next_id += 1;
        let name = name
            .map(str::to_string)
            .unwrap_or_else(|| format!("Loop {}", self.segments.len() + 1));

        let segment = LoopSegment::new(id, name, start, end).with_repeat_count(self.default_repeat_count);
        log::info!(
            "LoopSet: created {} '{}' [{:.3}, {:.3}]",
            id,
            segment.name,
            start,
            end
        );
        self.segments.push(segment);
        self.sort();
        Ok(id)
    }

    /// Move or resize a segment
    ///
    /// Reported as `Moved` when the length is unchanged, `Resized` otherwise.
    pub fn update_bounds(&mut self, id: SegmentId, start: f64, end: f64) -> SegmentResult<SegmentEvent> {
        let old_length = self.get(id).ok_or(SegmentError::NotFound(id))?.duration();
        self.check_range(Some(id), start, end)?;

        let segment = self.get_mut(id)?;
        segment.start_time = start;
        segment.end_time = end;
        self.sort();

        let event = if ((end - start) - old_length).abs() < LENGTH_EPSILON {
            SegmentEvent::Moved { id, start, end }
        } else {
            SegmentEvent::Resized { id, start, end }
        };
        log::debug!("LoopSet: {:?}", event);
        Ok(event)
    }

    /// Remove a segment, returning it
    pub fn delete(&mut self, id: SegmentId) -> SegmentResult<LoopSegment> {
        let index = self.index_of(id).ok_or(SegmentError::NotFound(id))?;
        let removed = self.segments.remove(index);
        log::info!("LoopSet: deleted {} '{}'", id, removed.name);
        Ok(removed)
    }

    pub fn rename(&mut self, id: SegmentId, name: &str) -> SegmentResult<SegmentEvent> {
        self.get_mut(id)?.name = name.to_string();
        Ok(SegmentEvent::Updated(id))
    }

    /// Set how many passes a loop plays (at least 1)
    pub fn set_repeat_count(&mut self, id: SegmentId, repeat_count: u32) -> SegmentResult<SegmentEvent> {
        self.get_mut(id)?.repeat_count = repeat_count.max(1);
        Ok(SegmentEvent::Updated(id))
    }

    /// Store a quantized speed on the segment itself, returning the stored value
    pub fn set_segment_speed(&mut self, id: SegmentId, speed: f64) -> SegmentResult<f64> {
        let stored = quantize_speed(speed);
        self.get_mut(id)?.speed = stored;
        Ok(stored)
    }

    /// Mark exactly one segment (or none) as the active loop
    pub fn set_active_flag(&mut self, active: Option<SegmentId>) {
        for segment in &mut self.segments {
            segment.is_active = Some(segment.id) == active;
        }
    }

    /// Count one completed pass; returns the new play count
    pub fn record_pass(&mut self, id: SegmentId) -> SegmentResult<u32> {
        let segment = self.get_mut(id)?;
        segment.play_count = segment.play_count.saturating_add(1);
        Ok(segment.play_count)
    }

    // --- Persistence ---

    /// Serialize the segments as JSON
    pub fn to_json(&self) -> Result<String, StoreError> {
        serde_json::to_string(&self.segments).map_err(|e| StoreError::Serialize(e.to_string()))
    }

    /// Queue the segments for a debounced write
    pub fn save<S: KeyValueStore>(&self, writer: &mut DebouncedWriter<S>) {
        match self.to_json() {
            Ok(json) => writer.schedule(SEGMENTS_KEY, json),
            Err(e) => log::warn!("LoopSet: not persisting segments: {}", e),
        }
    }

    /// Restore segments saved by [`LoopSet::save`]
    ///
    /// Individually invalid entries (bad bounds, overlaps, duplicate ids) are
    /// dropped; an unreadable value yields an empty set.
    pub fn load<S: KeyValueStore>(
        writer: &DebouncedWriter<S>,
        config: &TimelineConfig,
        duration: f64,
    ) -> Self {
        let mut set = Self::with_config(config, duration);
        let Some(json) = writer.get(SEGMENTS_KEY) else {
            return set;
        };
        set.restore_from_json(&json);
        set
    }

    /// Replace the contents with the valid entries of a JSON array
    pub fn restore_from_json(&mut self, json: &str) -> usize {
        self.segments.clear();

        let entries: Vec<serde_json::Value> = match serde_json::from_str(json) {
            Ok(entries) => entries,
            Err(e) => {
                log::warn!("LoopSet: stored segments unreadable, starting empty: {}", e);
                return 0;
            }
        };

        let total = entries.len();
        for entry in entries {
            let mut segment: LoopSegment = match serde_json::from_value(entry) {
                Ok(segment) => segment,
                Err(e) => {
                    log::warn!("LoopSet: dropping malformed segment: {}", e);
                    continue;
                }
            };
            let following = segment.id.0.checked_add(1);
            let Some(following) = following.filter(|_| self.accepts_restored(&segment)) else {
                log::warn!("LoopSet: dropping invalid segment {} '{}'", segment.id, segment.name);
                continue;
            };
            segment.speed = quantize_speed(segment.speed);
            segment.repeat_count = segment.repeat_count.max(1);
            segment.is_active = false;
            self.next_id = self.next_id.max(following);
            self.segments.push(segment);
            self.sort();
        }

        log::info!("LoopSet: restored {}/{} segment(s)", self.segments.len(), total);
        self.segments.len()
    }

    fn accepts_restored(&self, segment: &LoopSegment) -> bool {
        let min = self.min_duration.min(MIN_SEGMENT_DURATION);
        let finite = segment.start_time.is_finite() && segment.end_time.is_finite();
        let within_track = self.duration <= 0.0 || segment.end_time <= self.duration;
        finite
            && within_track
            && segment.start_time >= 0.0
            && segment.end_time - segment.start_time >= min - 1e-9
            && is_supported_speed(segment.speed)
            && !self.contains(segment.id)
            && !self.collisions.check_overlap(
                Some(segment.id),
                segment.start_time,
                segment.end_time,
                &self.segments,
            )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::persist::{MemoryStore, DEFAULT_DEBOUNCE};

    fn two_loops() -> (LoopSet, SegmentId, SegmentId) {
        let mut set = LoopSet::new(150.0);
        let b = set.create(Some("B"), 50.0, 80.0).unwrap();
        let a = set.create(Some("A"), 10.0, 30.0).unwrap();
        (set, a, b)
    }

    #[test]
    fn test_create_keeps_start_order() {
        let (set, a, b) = two_loops();
        let ids: Vec<_> = set.segments().iter().map(|s| s.id).collect();
        assert_eq!(ids, vec![a, b]);
        assert_eq!(set.next_after(a).map(|s| s.id), Some(b));
        assert_eq!(set.previous_before(a).map(|s| s.id), None);
    }

    #[test]
    fn test_default_names_and_colors() {
        let mut set = LoopSet::new(100.0);
        let id = set.create(None, 1.0, 2.0).unwrap();
        let seg = set.get(id).unwrap();
        assert_eq!(seg.name, "Loop 1");
        assert!(seg.color.starts_with('#'));
        assert_eq!(seg.repeat_count, 1);
    }

    #[test]
    fn test_create_rejects_collision() {
        let (mut set, _, _) = two_loops();
        let err = set.create(None, 25.0, 55.0).unwrap_err();
        match err {
            SegmentError::Collision { info } => {
                assert_eq!(info.colliding_segments.len(), 2);
                assert!((info.overlap_duration - 10.0).abs() < 1e-9);
            }
            other => panic!("unexpected error: {:?}", other),
        }
        assert_eq!(set.len(), 2);
    }

    #[test]
    fn test_create_reports_adjusted_bounds() {
        let mut set = LoopSet::new(120.0);
        let err = set.create(None, 80.0, 150.0).unwrap_err();
        let SegmentError::InvalidBounds { adjusted_start, adjusted_end, .. } = err else {
            panic!("expected invalid bounds");
        };
        // Re-submitting the adjusted bounds succeeds
        assert!(set.create(None, adjusted_start, adjusted_end).is_ok());
    }

    #[test]
    fn test_unknown_duration_rejected() {
        let mut set = LoopSet::new(0.0);
        assert_eq!(set.create(None, 1.0, 2.0), Err(SegmentError::UnknownDuration));
    }

    #[test]
    fn test_update_bounds_move_vs_resize() {
        let (mut set, a, _) = two_loops();
        let moved = set.update_bounds(a, 12.0, 32.0).unwrap();
        assert!(matches!(moved, SegmentEvent::Moved { .. }));
        let resized = set.update_bounds(a, 12.0, 40.0).unwrap();
        assert!(matches!(resized, SegmentEvent::Resized { .. }));
        assert!(set.update_bounds(a, 12.0, 51.0).is_err());
        assert_eq!(set.get(a).unwrap().end_time, 40.0);
    }

    #[test]
    fn test_delete_and_missing() {
        let (mut set, a, _) = two_loops();
        assert_eq!(set.delete(a).unwrap().name, "A");
        assert_eq!(set.delete(a), Err(SegmentError::NotFound(a)));
        assert_eq!(set.len(), 1);
    }

    #[test]
    fn test_active_flag_is_exclusive() {
        let (mut set, a, b) = two_loops();
        set.set_active_flag(Some(a));
        set.set_active_flag(Some(b));
        let active: Vec<_> = set.segments().iter().filter(|s| s.is_active).map(|s| s.id).collect();
        assert_eq!(active, vec![b]);
    }

    #[test]
    fn test_persist_roundtrip_drops_invalid_entries() {
        let (set, a, b) = two_loops();
        let mut writer = DebouncedWriter::new(MemoryStore::new(), DEFAULT_DEBOUNCE);
        set.save(&mut writer);
        writer.flush();

        let restored = LoopSet::load(&writer, &TimelineConfig::default(), 150.0);
        assert_eq!(restored.len(), 2);
        assert!(restored.contains(a) && restored.contains(b));

        let mut set = LoopSet::new(150.0);
        let json = r##"[
            {"id": 1, "name": "ok", "start_time": 1.0, "end_time": 2.0, "speed": 1.0, "repeat_count": 2, "color": "#3399CC"},
            {"id": 2, "name": "overlap", "start_time": 1.5, "end_time": 3.0, "speed": 1.0, "repeat_count": 1, "color": "#3399CC"},
            {"id": 3, "name": "bad speed", "start_time": 5.0, "end_time": 6.0, "speed": 9.0, "repeat_count": 1, "color": "#3399CC"},
            {"id": "x"}
        ]"##;
        assert_eq!(set.restore_from_json(json), 1);
        // New ids continue after restored ones
        let id = set.create(None, 10.0, 11.0).unwrap();
        assert_eq!(id, SegmentId(2));
    }

    #[test]
    fn test_restore_drops_exhausted_id() {
        let mut set = LoopSet::new(150.0);
        let json = r##"[
            {"id": 18446744073709551615, "name": "last", "start_time": 1.0, "end_time": 2.0, "speed": 1.0, "repeat_count": 1, "color": "#3399CC"},
            {"id": 4, "name": "ok", "start_time": 5.0, "end_time": 6.0, "speed": 1.0, "repeat_count": 1, "color": "#3399CC"}
        ]"##;
        assert_eq!(set.restore_from_json(json), 1);
        assert!(set.contains(SegmentId(4)));
        assert_eq!(set.create(None, 10.0, 11.0).unwrap(), SegmentId(5));
    }

    #[test]
    fn test_known_duration_drops_segments_outside_track() {
        let mut set = LoopSet::new(0.0);
        let json = r##"[
            {"id": 1, "name": "early", "start_time": 10.0, "end_time": 20.0, "speed": 1.0, "repeat_count": 1, "color": "#3399CC"},
            {"id": 2, "name": "late", "start_time": 100.0, "end_time": 200.0, "speed": 1.0, "repeat_count": 1, "color": "#3399CC"}
        ]"##;
        assert_eq!(set.restore_from_json(json), 2);

        let dropped = set.set_duration(150.0);
        assert_eq!(dropped.len(), 1);
        assert_eq!(dropped[0].id, SegmentId(2));
        assert!(set.segments().iter().all(|s| s.start_time >= 0.0 && s.end_time <= 150.0));

        // A shorter report trims again
        let dropped = set.set_duration(15.0);
        assert_eq!(dropped[0].id, SegmentId(1));
        assert!(set.is_empty());
    }
}
