//! Per-loop playback speed
//!
//! [`SpeedResolver`] keeps a lazily populated `loop id → speed` mapping with a
//! global fallback. Speeds are validated against the supported range and
//! snapped to 0.25 steps. Every mutation schedules a debounced write; a
//! restore drops individually invalid entries instead of the whole mapping.

use crate::error::SpeedError;
use crate::persist::{DebouncedWriter, KeyValueStore, SPEED_MAPPING_KEY};
use crate::types::{is_supported_speed, quantize_speed, SegmentId, DEFAULT_SPEED, MAX_SPEED, MIN_SPEED};
use serde::Serialize;
use std::collections::BTreeMap;

/// Difference above which a stored speed counts as adjusted
const ADJUST_TOLERANCE: f64 = 1e-3;

/// Outcome of a successful speed change
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SpeedChange {
    pub requested: f64,
    pub stored: f64,
    /// True when quantization changed the requested value
    pub was_adjusted: bool,
}

/// In-memory speed mapping
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SpeedMapping {
    speeds: BTreeMap<SegmentId, f64>,
    global: f64,
    active: Option<SegmentId>,
}

impl SpeedMapping {
    pub fn new(global: f64) -> Self {
        Self {
            speeds: BTreeMap::new(),
            global: if is_supported_speed(global) { quantize_speed(global) } else { DEFAULT_SPEED },
            active: None,
        }
    }

    pub fn global_fallback(&self) -> f64 {
        self.global
    }

    pub fn get(&self, id: SegmentId) -> Option<f64> {
        self.speeds.get(&id).copied()
    }

    pub fn len(&self) -> usize {
        self.speeds.len()
    }

    pub fn is_empty(&self) -> bool {
        self.speeds.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (SegmentId, f64)> + '_ {
        self.speeds.iter().map(|(&id, &speed)| (id, speed))
    }

    /// The active loop, whether or not it has its own entry
    pub fn active(&self) -> Option<SegmentId> {
        self.active
    }

    /// The active loop's entry, if it has one
    pub fn active_entry(&self) -> Option<(SegmentId, f64)> {
        self.active.and_then(|id| self.get(id).map(|speed| (id, speed)))
    }

    /// Rebuild from stored JSON, skipping entries that fail validation
    fn from_json(json: &str, default_global: f64) -> Self {
        let mut mapping = Self::new(default_global);

        let value: serde_json::Value = match serde_json::from_str(json) {
            Ok(value) => value,
            Err(e) => {
                log::warn!("SpeedMapping: stored mapping unreadable, using defaults: {}", e);
                return mapping;
            }
        };

        if let Some(global) = value.get("global").and_then(|v| v.as_f64()) {
            if is_supported_speed(global) {
                mapping.global = quantize_speed(global);
            } else {
                log::warn!("SpeedMapping: ignoring invalid global speed {}", global);
            }
        }

        if let Some(entries) = value.get("speeds").and_then(|v| v.as_object()) {
            for (key, raw) in entries {
                let id = key.parse::<u64>().ok().map(SegmentId);
                let speed = raw.as_f64().filter(|s| is_supported_speed(*s));
                match (id, speed) {
                    (Some(id), Some(speed)) => {
                        mapping.speeds.insert(id, quantize_speed(speed));
                    }
                    _ => log::warn!("SpeedMapping: dropping invalid entry {}: {}", key, raw),
                }
            }
        }

        mapping.active = value.get("active").and_then(|v| v.as_u64()).map(SegmentId);
        mapping
    }
}

/// Resolves the playback speed for the active loop
pub struct SpeedResolver<S: KeyValueStore> {
    mapping: SpeedMapping,
    writer: DebouncedWriter<S>,
}

impl<S: KeyValueStore> SpeedResolver<S> {
    /// Restore the mapping from the writer's store, falling back to `default_global`
    pub fn new(writer: DebouncedWriter<S>, default_global: f64) -> Self {
        let mapping = match writer.get(SPEED_MAPPING_KEY) {
            Some(json) => SpeedMapping::from_json(&json, default_global),
            None => SpeedMapping::new(default_global),
        };
        log::info!(
            "SpeedResolver: {} loop speed(s), global {:.2}x",
            mapping.len(),
            mapping.global
        );
        Self { mapping, writer }
    }

    pub fn mapping(&self) -> &SpeedMapping {
        &self.mapping
    }

    /// Mapped speed for the loop, or the global fallback
    pub fn get_speed(&self, id: Option<SegmentId>) -> f64 {
        id.and_then(|id| self.mapping.get(id))
            .unwrap_or(self.mapping.global)
    }

    /// Speed currently in effect for the active loop
    pub fn effective_speed(&self) -> f64 {
        self.get_speed(self.mapping.active)
    }

    fn validate(requested: f64) -> Result<(f64, bool), SpeedError> {
        if !is_supported_speed(requested) {
            return Err(SpeedError::OutOfRange {
                requested,
                min: MIN_SPEED,
                max: MAX_SPEED,
            });
        }
        let stored = quantize_speed(requested);
        Ok((stored, (stored - requested).abs() > ADJUST_TOLERANCE))
    }

    /// Set a loop's speed and make it the active entry
    pub fn set_speed(&mut self, id: SegmentId, requested: f64) -> Result<SpeedChange, SpeedError> {
        let (stored, was_adjusted) = Self::validate(requested)?;
        self.mapping.speeds.insert(id, stored);
        self.mapping.active = Some(id);
        self.persist();

        log::debug!(
            "SpeedResolver: {} -> {:.2}x (requested {:.3}{})",
            id,
            stored,
            requested,
            if was_adjusted { ", adjusted" } else { "" }
        );
        Ok(SpeedChange {
            requested,
            stored,
            was_adjusted,
        })
    }

    /// Set the speed used by loops without their own entry
    pub fn set_global_speed(&mut self, requested: f64) -> Result<SpeedChange, SpeedError> {
        let (stored, was_adjusted) = Self::validate(requested)?;
        self.mapping.global = stored;
        self.persist();
        Ok(SpeedChange {
            requested,
            stored,
            was_adjusted,
        })
    }

    /// Switch the active loop; returns the speed the caller should apply
    pub fn set_active_loop(&mut self, id: Option<SegmentId>) -> f64 {
        if self.mapping.active != id {
            self.mapping.active = id;
            self.persist();
        }
        self.get_speed(id)
    }

    /// Drop a loop's entry (loop deleted or speed reset)
    ///
    /// If it was active, the active pointer clears and the global fallback applies.
    pub fn remove_speed(&mut self, id: SegmentId) -> Option<f64> {
        let removed = self.mapping.speeds.remove(&id);
        let was_active = self.mapping.active == Some(id);
        if was_active {
            self.mapping.active = None;
        }
        if removed.is_some() || was_active {
            self.persist();
        }
        removed
    }

    fn persist(&mut self) {
        match serde_json::to_string(&self.mapping) {
            Ok(json) => self.writer.schedule(SPEED_MAPPING_KEY, json),
            Err(e) => log::warn!("SpeedResolver: not persisting speeds: {}", e),
        }
    }

    /// Flush pending writes once the quiet period has passed
    pub fn poll(&mut self) -> usize {
        self.writer.poll()
    }

    /// Flush pending writes now
    pub fn flush(&mut self) -> usize {
        self.writer.flush()
    }

    pub fn writer(&self) -> &DebouncedWriter<S> {
        &self.writer
    }

    pub fn writer_mut(&mut self) -> &mut DebouncedWriter<S> {
        &mut self.writer
    }
}
