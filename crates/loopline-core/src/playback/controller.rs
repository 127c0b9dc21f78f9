//! Active-loop detection, repeat-and-rewind and inter-loop navigation

use super::transport::{PlaybackCommand, TransportSnapshot};
use crate::error::PlaybackError;
use crate::segments::LoopSet;
use crate::types::SegmentId;

/// Ticks to wait for a rewind to land before boundary checks resume anyway
const MAX_REWIND_WAIT_TICKS: u32 = 4;

/// Something that happened during a tick or navigation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlaybackEvent {
    LoopStarted(SegmentId),
    /// A pass completed and the loop rewound; `pass` counts completed passes
    LoopRepeated { id: SegmentId, pass: u32 },
    /// Repeats exhausted, moved on to the next loop
    LoopAdvanced { from: SegmentId, to: SegmentId },
    /// Repeats exhausted and no later loop exists; looping stopped
    LoopFinished(SegmentId),
    /// The armed loop disappeared (deleted)
    LoopCancelled(SegmentId),
    ActiveLoopChanged(Option<SegmentId>),
}

/// Commands and events produced by one controller call
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TickOutcome {
    pub commands: Vec<PlaybackCommand>,
    pub events: Vec<PlaybackEvent>,
}

impl TickOutcome {
    pub(crate) fn merge(&mut self, other: TickOutcome) {
        self.commands.extend(other.commands);
        self.events.extend(other.events);
    }
}

/// Direction for inter-loop navigation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Navigation {
    Next,
    Previous,
    First,
    Last,
}

/// Which end navigation ran into
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Boundary {
    /// Already at the first loop
    Start,
    /// Already at the last loop
    End,
    /// There are no loops
    Empty,
}

/// Result of [`LoopPlaybackController::navigate`]
#[derive(Debug, Clone, PartialEq)]
pub enum NavigationOutcome {
    Moved { id: SegmentId, outcome: TickOutcome },
    Boundary(Boundary),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct ArmedLoop {
    id: SegmentId,
    /// Completed passes
    counter: u32,
    /// A seek to the loop start is in flight
    awaiting_rewind: bool,
    wait_ticks: u32,
}

impl ArmedLoop {
    fn new(id: SegmentId) -> Self {
        Self {
            id,
            counter: 0,
            awaiting_rewind: true,
            wait_ticks: 0,
        }
    }

    fn rewind(&mut self) {
        self.awaiting_rewind = true;
        self.wait_ticks = 0;
    }
}

/// Drives repeat playback of loop segments from transport time updates
#[derive(Debug, Clone, Default)]
pub struct LoopPlaybackController {
    armed: Option<ArmedLoop>,
    active: Option<SegmentId>,
}

impl LoopPlaybackController {
    pub fn new() -> Self {
        Self::default()
    }

    /// The loop marked active (containing the playhead, or armed)
    pub fn active_loop(&self) -> Option<SegmentId> {
        self.active
    }

    /// Whether repeat playback is armed
    pub fn is_looping(&self) -> bool {
        self.armed.is_some()
    }

    /// The loop being repeated, if armed
    pub fn looping_id(&self) -> Option<SegmentId> {
        self.armed.map(|a| a.id)
    }

    /// Completed passes of the armed loop (0 when not armed)
    pub fn repeat_counter(&self) -> u32 {
        self.armed.map_or(0, |a| a.counter)
    }

    fn set_active(&mut self, active: Option<SegmentId>, set: &mut LoopSet, out: &mut TickOutcome) {
        if self.active != active {
            self.active = active;
            set.set_active_flag(active);
            out.events.push(PlaybackEvent::ActiveLoopChanged(active));
            log::debug!("LoopPlaybackController: active loop -> {:?}", active);
        }
    }

    /// Find the loop containing `time`
    ///
    /// The armed loop wins while it contains the time, then the previously
    /// active loop, so touching loops do not flip back and forth at their
    /// shared boundary.
    pub fn detect_active(&self, time: f64, set: &LoopSet) -> Option<SegmentId> {
        let still_contains = |id: Option<SegmentId>| {
            id.filter(|&id| set.get(id).is_some_and(|s| s.contains(time)))
        };
        still_contains(self.looping_id())
            .or_else(|| still_contains(self.active))
            .or_else(|| set.segment_at(time).map(|s| s.id))
    }

    /// Arm looping on `id`: reset the counter, seek to its start and play
    pub fn start_loop(&mut self, id: SegmentId, set: &mut LoopSet) -> Result<TickOutcome, PlaybackError> {
        let start = set.get(id).ok_or(PlaybackError::NotFound(id))?.start_time;
        let mut out = TickOutcome::default();

        self.armed = Some(ArmedLoop::new(id));
        self.set_active(Some(id), set, &mut out);
        out.commands.push(PlaybackCommand::SeekTo(start));
        out.commands.push(PlaybackCommand::Play);
        out.events.push(PlaybackEvent::LoopStarted(id));

        log::info!("LoopPlaybackController: looping {} from {:.3}s", id, start);
        Ok(out)
    }

    /// Disarm looping, keeping the active marker; returns the loop that was armed
    pub fn stop_loop(&mut self) -> Option<SegmentId> {
        let stopped = self.armed.take().map(|a| a.id);
        if let Some(id) = stopped {
            log::info!("LoopPlaybackController: stopped looping {}", id);
        }
        stopped
    }

    /// Forget any reference to a deleted segment; returns true if looping was cancelled
    pub fn on_segment_deleted(&mut self, id: SegmentId) -> bool {
        let cancelled = self.looping_id() == Some(id);
        if cancelled {
            self.armed = None;
            log::info!("LoopPlaybackController: looping cancelled, {} deleted", id);
        }
        if self.active == Some(id) {
            self.active = None;
        }
        cancelled
    }

    /// Process one transport time update
    pub fn tick(&mut self, snapshot: &TransportSnapshot, set: &mut LoopSet) -> TickOutcome {
        let time = snapshot.current_time;
        let mut out = TickOutcome::default();

        if let Some(mut armed) = self.armed {
            let Some(segment) = set.get(armed.id) else {
                self.armed = None;
                out.events.push(PlaybackEvent::LoopCancelled(armed.id));
                let detected = self.detect_active(time, set);
                self.set_active(detected, set, &mut out);
                return out;
            };
            let (start, end, repeat_count) = (segment.start_time, segment.end_time, segment.repeat_count);

            if armed.awaiting_rewind {
                armed.wait_ticks += 1;
                if time < end || armed.wait_ticks > MAX_REWIND_WAIT_TICKS {
                    armed.awaiting_rewind = false;
                }
                self.armed = Some(armed);
            } else if time >= end {
                armed.counter += 1;
                if let Err(e) = set.record_pass(armed.id) {
                    log::warn!("LoopPlaybackController: cannot record pass: {}", e);
                }

                if armed.counter < repeat_count {
                    armed.rewind();
                    self.armed = Some(armed);
                    out.commands.push(PlaybackCommand::SeekTo(start));
                    out.events.push(PlaybackEvent::LoopRepeated {
                        id: armed.id,
                        pass: armed.counter,
                    });
                    log::debug!(
                        "LoopPlaybackController: {} pass {}/{}, rewinding",
                        armed.id,
                        armed.counter,
                        repeat_count
                    );
                } else if let Some(next) = set.next_after(armed.id).map(|s| s.id) {
                    out.events.push(PlaybackEvent::LoopAdvanced {
                        from: armed.id,
                        to: next,
                    });
                    match self.start_loop(next, set) {
                        Ok(started) => out.merge(started),
                        Err(e) => log::warn!("LoopPlaybackController: cannot advance: {}", e),
                    }
                    return out;
                } else {
                    self.armed = None;
                    out.events.push(PlaybackEvent::LoopFinished(armed.id));
                    self.set_active(None, set, &mut out);
                    log::info!("LoopPlaybackController: {} finished, no later loop", armed.id);
                    return out;
                }
            } else {
                self.armed = Some(armed);
            }
        }

        // Keep the marker on a loop whose rewind has not landed yet
        let detected = match self.armed {
            Some(armed) if armed.awaiting_rewind => Some(armed.id),
            _ => self.detect_active(time, set),
        };
        self.set_active(detected, set, &mut out);
        out
    }

    /// Move among loops ordered by start time
    ///
    /// When looping is armed the target loop is started; otherwise the
    /// playhead jumps to the target's start and it becomes the active loop.
    /// Running past either end is a no-op reported as a [`Boundary`].
    pub fn navigate(&mut self, direction: Navigation, current_time: f64, set: &mut LoopSet) -> NavigationOutcome {
        if set.is_empty() {
            return NavigationOutcome::Boundary(Boundary::Empty);
        }

        let current = self.looping_id().or(self.active);
        let target = match (direction, current) {
            (Navigation::First, _) => set.first().map(|s| s.id),
            (Navigation::Last, _) => set.last().map(|s| s.id),
            (Navigation::Next, Some(id)) => match set.next_after(id) {
                Some(s) => Some(s.id),
                None => return NavigationOutcome::Boundary(Boundary::End),
            },
            (Navigation::Previous, Some(id)) => match set.previous_before(id) {
                Some(s) => Some(s.id),
                None => return NavigationOutcome::Boundary(Boundary::Start),
            },
            (Navigation::Next, None) => match set.segments().iter().find(|s| s.start_time > current_time) {
                Some(s) => Some(s.id),
                None => return NavigationOutcome::Boundary(Boundary::End),
            },
            (Navigation::Previous, None) => {
                match set.segments().iter().rev().find(|s| s.start_time < current_time) {
                    Some(s) => Some(s.id),
                    None => return NavigationOutcome::Boundary(Boundary::Start),
                }
            }
        };

        let Some(id) = target else {
            return NavigationOutcome::Boundary(Boundary::Empty);
        };

        let outcome = if self.is_looping() {
            match self.start_loop(id, set) {
                Ok(outcome) => outcome,
                Err(_) => return NavigationOutcome::Boundary(Boundary::Empty),
            }
        } else {
            let mut out = TickOutcome::default();
            if let Some(segment) = set.get(id) {
                out.commands.push(PlaybackCommand::SeekTo(segment.start_time));
            }
            self.set_active(Some(id), set, &mut out);
            out
        };

        log::debug!("LoopPlaybackController: navigated {:?} to {}", direction, id);
        NavigationOutcome::Moved { id, outcome }
    }
}
