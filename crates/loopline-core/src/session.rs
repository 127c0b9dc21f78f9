//! Loop session
//!
//! [`LoopSession`] wires the committed segments, the playback controller and
//! the speed resolver together for one track. Deleting a loop cascades to its
//! speed entry and any playback reference, and whenever the active loop
//! changes the session emits the matching `SetPlaybackRate` command.

use crate::config::LooplineConfig;
use crate::error::{PlaybackError, SegmentResult, SessionResult, SpeedError};
use crate::persist::{Clock, DebouncedWriter, KeyValueStore, SystemClock};
use crate::playback::{
    LoopPlaybackController, Navigation, NavigationOutcome, PlaybackCommand, PlaybackEvent,
    TickOutcome, TransportSnapshot,
};
use crate::segments::{LoopSet, SegmentEvent};
use crate::speed::{SpeedChange, SpeedResolver};
use crate::types::SegmentId;

const RATE_EPSILON: f64 = 1e-9;

/// A speed change plus the commands needed to apply it now
#[derive(Debug, Clone, PartialEq)]
pub struct SpeedUpdate {
    pub change: SpeedChange,
    pub commands: Vec<PlaybackCommand>,
}

/// Segments, playback and speeds for one track
pub struct LoopSession<S: KeyValueStore + Clone> {
    loops: LoopSet,
    playback: LoopPlaybackController,
    speeds: SpeedResolver<S>,
    writer: DebouncedWriter<S>,
    /// Last rate the transport reported or was told to use
    applied_rate: Option<f64>,
}

impl<S: KeyValueStore + Clone> LoopSession<S> {
    /// Restore a session from `store`
    ///
    /// Segments and speeds get separate writers over clones of the store;
    /// file-backed stores clone to the same file.
    pub fn open(config: &LooplineConfig, store: S, duration: f64) -> Self {
        Self::open_with_clock(config, store, duration, SystemClock)
    }

    pub fn open_with_clock<C: Clock + Clone + 'static>(
        config: &LooplineConfig,
        store: S,
        duration: f64,
        clock: C,
    ) -> Self {
        let delay = config.persistence.debounce();
        let writer = DebouncedWriter::with_clock(store.clone(), delay, clock.clone());
        let mut speeds = SpeedResolver::new(
            DebouncedWriter::with_clock(store, delay, clock),
            config.playback.global_speed,
        );

        let mut loops = LoopSet::load(&writer, &config.timeline, duration);
        loops.set_default_repeat_count(config.playback.default_repeat_count);

        let orphaned: Vec<SegmentId> = speeds
            .mapping()
            .iter()
            .map(|(id, _)| id)
            .chain(speeds.mapping().active())
            .filter(|id| !loops.contains(*id))
            .collect();
        for id in orphaned {
            log::debug!("LoopSession: dropping speed state of missing loop {}", id);
            speeds.remove_speed(id);
        }

        log::info!(
            "LoopSession: opened with {} loop(s), duration {:.2}s",
            loops.len(),
            duration
        );
        Self {
            loops,
            playback: LoopPlaybackController::new(),
            speeds,
            writer,
            applied_rate: None,
        }
    }

    pub fn loops(&self) -> &LoopSet {
        &self.loops
    }

    pub fn playback(&self) -> &LoopPlaybackController {
        &self.playback
    }

    pub fn speeds(&self) -> &SpeedResolver<S> {
        &self.speeds
    }

    /// Rate that applies to the active loop right now
    pub fn current_rate(&self) -> f64 {
        self.speeds.get_speed(self.playback.active_loop())
    }

    fn save_loops(&mut self) {
        self.loops.save(&mut self.writer);
    }

    // --- Segment edits ---

    pub fn create_loop(&mut self, name: Option<&str>, start: f64, end: f64) -> SegmentResult<SegmentId> {
        let id = self.loops.create(name, start, end)?;
        self.save_loops();
        Ok(id)
    }

    pub fn update_loop_bounds(&mut self, id: SegmentId, start: f64, end: f64) -> SegmentResult<SegmentEvent> {
        let event = self.loops.update_bounds(id, start, end)?;
        self.save_loops();
        Ok(event)
    }

    pub fn rename_loop(&mut self, id: SegmentId, name: &str) -> SegmentResult<SegmentEvent> {
        let event = self.loops.rename(id, name)?;
        self.save_loops();
        Ok(event)
    }

    pub fn set_repeat_count(&mut self, id: SegmentId, repeat_count: u32) -> SegmentResult<SegmentEvent> {
        let event = self.loops.set_repeat_count(id, repeat_count)?;
        self.save_loops();
        Ok(event)
    }

    /// Delete a loop along with its speed entry and playback references
    pub fn delete_loop(&mut self, id: SegmentId) -> SegmentResult<TickOutcome> {
        self.loops.delete(id)?;
        let mut out = TickOutcome::default();
        self.forget_loop(id, &mut out);
        self.save_loops();
        Ok(out)
    }

    /// Drop speed and playback state of a loop that left the set
    fn forget_loop(&mut self, id: SegmentId, out: &mut TickOutcome) {
        self.speeds.remove_speed(id);

        let was_active = self.playback.active_loop() == Some(id);
        if self.playback.on_segment_deleted(id) {
            out.events.push(PlaybackEvent::LoopCancelled(id));
        }
        if was_active {
            out.events.push(PlaybackEvent::ActiveLoopChanged(None));
            self.sync_rate(out);
        }
    }

    // --- Speed ---

    /// Set a loop's speed; applied immediately when it is the active loop
    pub fn set_loop_speed(&mut self, id: SegmentId, requested: f64) -> SessionResult<SpeedUpdate> {
        if !self.loops.contains(id) {
            return Err(PlaybackError::NotFound(id).into());
        }
        let change = self.speeds.set_speed(id, requested)?;
        self.loops.set_segment_speed(id, change.stored)?;
        self.save_loops();

        let mut out = TickOutcome::default();
        if self.playback.active_loop() == Some(id) {
            self.push_rate(change.stored, &mut out);
        }
        Ok(SpeedUpdate {
            change,
            commands: out.commands,
        })
    }

    /// Set the fallback speed; applied immediately when the active loop has no own speed
    pub fn set_global_speed(&mut self, requested: f64) -> Result<SpeedUpdate, SpeedError> {
        let change = self.speeds.set_global_speed(requested)?;
        let mut out = TickOutcome::default();
        let rate = self.current_rate();
        self.push_rate(rate, &mut out);
        Ok(SpeedUpdate {
            change,
            commands: out.commands,
        })
    }

    fn push_rate(&mut self, rate: f64, out: &mut TickOutcome) {
        let unchanged = self
            .applied_rate
            .is_some_and(|applied| (applied - rate).abs() < RATE_EPSILON);
        if !unchanged {
            out.commands.push(PlaybackCommand::SetPlaybackRate(rate));
            self.applied_rate = Some(rate);
        }
    }

    fn sync_rate(&mut self, out: &mut TickOutcome) {
        let rate = self.speeds.set_active_loop(self.playback.active_loop());
        self.push_rate(rate, out);
    }

    fn sync_rate_on_change(&mut self, out: &mut TickOutcome) {
        let changed = out
            .events
            .iter()
            .any(|e| matches!(e, PlaybackEvent::ActiveLoopChanged(_)));
        if changed {
            self.sync_rate(out);
        }
    }

    // --- Playback ---

    pub fn start_loop(&mut self, id: SegmentId) -> Result<TickOutcome, PlaybackError> {
        let mut out = self.playback.start_loop(id, &mut self.loops)?;
        self.sync_rate(&mut out);
        Ok(out)
    }

    pub fn stop_loop(&mut self) -> Option<SegmentId> {
        self.playback.stop_loop()
    }

    pub fn navigate(&mut self, direction: Navigation, current_time: f64) -> NavigationOutcome {
        match self.playback.navigate(direction, current_time, &mut self.loops) {
            NavigationOutcome::Moved { id, mut outcome } => {
                self.sync_rate_on_change(&mut outcome);
                NavigationOutcome::Moved { id, outcome }
            }
            boundary => boundary,
        }
    }

    /// Process one transport time update
    pub fn tick(&mut self, snapshot: &TransportSnapshot) -> TickOutcome {
        self.applied_rate = Some(snapshot.playback_rate);

        let mut out = TickOutcome::default();
        if snapshot.duration > 0.0 && (snapshot.duration - self.loops.duration()).abs() > RATE_EPSILON {
            let dropped = self.loops.set_duration(snapshot.duration);
            for segment in &dropped {
                self.forget_loop(segment.id, &mut out);
            }
            if !dropped.is_empty() {
                self.save_loops();
            }
        }

        let mut ticked = self.playback.tick(snapshot, &mut self.loops);
        self.sync_rate_on_change(&mut ticked);
        out.merge(ticked);

        let passed = out.events.iter().any(|e| {
            matches!(
                e,
                PlaybackEvent::LoopRepeated { .. }
                    | PlaybackEvent::LoopAdvanced { .. }
                    | PlaybackEvent::LoopFinished(_)
            )
        });
        if passed {
            self.save_loops();
        }
        out
    }

    // --- Persistence ---

    /// Write whatever has been quiet long enough
    pub fn poll(&mut self) -> usize {
        self.writer.poll() + self.speeds.poll()
    }

    /// Write everything pending now
    pub fn flush(&mut self) -> usize {
        self.writer.flush() + self.speeds.flush()
    }
}
