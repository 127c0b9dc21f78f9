//! Render state for the timeline canvas

use crate::interaction::{Hit, Intent, Phase, Preview};
use loopline_core::{LoopSegment, SegmentId};

/// Everything the timeline canvas draws
///
/// Pure data: the owner copies committed segments and the playhead in, and
/// folds the controller's presentation intents in with [`TimelineView::apply`].
#[derive(Debug, Clone, Default)]
pub struct TimelineView {
    pub segments: Vec<LoopSegment>,
    /// Track length in seconds (0 while unknown)
    pub duration: f64,
    /// Playhead in seconds
    pub playhead: f64,
    pub selected: Option<SegmentId>,
    /// Loop currently driving playback
    pub active: Option<SegmentId>,
    pub preview: Option<Preview>,
    pub hover: Option<Hit>,
    pub phase: Phase,
}

impl TimelineView {
    pub fn new(duration: f64) -> Self {
        Self {
            duration,
            ..Self::default()
        }
    }

    /// Replace the committed segments, dropping a selection that no longer exists
    pub fn set_segments(&mut self, segments: &[LoopSegment]) {
        self.segments = segments.to_vec();
        if let Some(id) = self.selected {
            if !self.segments.iter().any(|s| s.id == id) {
                self.selected = None;
            }
        }
        self.active = self.segments.iter().find(|s| s.is_active).map(|s| s.id);
    }

    pub fn set_playhead(&mut self, playhead: f64) {
        self.playhead = playhead;
    }

    /// Fold presentation intents into the view; mutations are left to the caller
    pub fn apply(&mut self, intents: &[Intent]) {
        for intent in intents {
            match intent {
                Intent::Select(id) => self.selected = Some(*id),
                Intent::Deselect => self.selected = None,
                Intent::DeleteLoop(id) if self.selected == Some(*id) => self.selected = None,
                Intent::Preview(preview) => self.preview = Some(*preview),
                Intent::PreviewCleared => self.preview = None,
                Intent::HoverChanged(hover) => self.hover = *hover,
                Intent::PhaseChanged(phase) => self.phase = *phase,
                _ => {}
            }
        }
    }

    /// Bounds to draw for a segment, following a live drag preview
    pub fn displayed_bounds(&self, segment: &LoopSegment) -> (f64, f64) {
        match self.preview {
            Some(Preview { id: Some(id), start, end, .. }) if id == segment.id => (start, end),
            _ => (segment.start_time, segment.end_time),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_apply_tracks_presentation() {
        let mut view = TimelineView::new(150.0);
        view.set_segments(&[LoopSegment::new(SegmentId(1), "A", 10.0, 30.0)]);
        let preview = Preview {
            id: Some(SegmentId(1)),
            start: 20.0,
            end: 40.0,
            colliding: false,
        };
        view.apply(&[
            Intent::Select(SegmentId(1)),
            Intent::PhaseChanged(Phase::DraggingMove),
            Intent::Preview(preview),
        ]);
        assert_eq!(view.selected, Some(SegmentId(1)));
        assert_eq!(view.phase, Phase::DraggingMove);
        assert_eq!(view.displayed_bounds(&view.segments[0]), (20.0, 40.0));

        view.apply(&[Intent::PreviewCleared, Intent::PhaseChanged(Phase::Idle)]);
        assert_eq!(view.displayed_bounds(&view.segments[0]), (10.0, 30.0));
    }

    #[test]
    fn test_selection_dropped_with_segment() {
        let mut view = TimelineView::new(150.0);
        view.set_segments(&[LoopSegment::new(SegmentId(1), "A", 10.0, 30.0)]);
        view.apply(&[Intent::Select(SegmentId(1))]);
        view.set_segments(&[]);
        assert_eq!(view.selected, None);
    }
}
