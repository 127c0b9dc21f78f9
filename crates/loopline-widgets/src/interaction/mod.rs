//! Pointer, touch and keyboard interaction for the loop timeline
//!
//! [`InteractionController`] is a pure state machine: the canvas adapter
//! feeds it [`TimelineInput`]s and it answers with [`Intent`]s. It never
//! mutates segments itself; committing a create/move/resize/delete is left
//! to whoever owns the [`loopline_core::segments::LoopSet`].

mod controller;
mod hit;

pub use controller::InteractionController;
pub use hit::{hit_test, Hit};

use loopline_core::{LoopSegment, SegmentId};

/// Presentation phase of the timeline
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Phase {
    #[default]
    Idle,
    Seeking,
    CreatingLoop,
    DraggingMove,
    DraggingResizeLeft,
    DraggingResizeRight,
}

/// Which device produced a pointer sample
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PointerKind {
    Mouse,
    Touch,
}

/// One pointer sample in track coordinates
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Pointer {
    /// Horizontal offset from the track's left edge (may lie outside while captured)
    pub x: f64,
    /// Track width in pixels at the time of the sample
    pub width: f64,
    pub kind: PointerKind,
    /// Milliseconds on a monotonic clock
    pub at_ms: u64,
    /// Start a new loop even when pressing on an existing one
    pub force_create: bool,
}

impl Pointer {
    pub fn mouse(x: f64, width: f64, at_ms: u64) -> Self {
        Self {
            x,
            width,
            kind: PointerKind::Mouse,
            at_ms,
            force_create: false,
        }
    }

    pub fn touch(x: f64, width: f64, at_ms: u64) -> Self {
        Self {
            kind: PointerKind::Touch,
            ..Self::mouse(x, width, at_ms)
        }
    }

    pub fn with_force_create(mut self, force_create: bool) -> Self {
        self.force_create = force_create;
        self
    }
}

/// Keys the timeline reacts to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimelineKey {
    Escape,
    Delete,
    Backspace,
    /// The configured create-loop shortcut
    CreateLoop,
}

/// Raw input for the controller
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum TimelineInput {
    PointerDown(Pointer),
    PointerMove(Pointer),
    PointerUp(Pointer),
    /// Pointer left the track without a gesture in progress
    PointerLeft,
    /// The platform cancelled the gesture (touch cancelled, capture lost)
    PointerCancel,
    /// The window lost focus
    Blur,
    Key(TimelineKey),
}

/// Everything the controller needs to know about the outside world
#[derive(Debug, Clone, Copy)]
pub struct InteractionContext<'a> {
    /// Committed segments
    pub segments: &'a [LoopSegment],
    /// Track length in seconds (0 while unknown)
    pub duration: f64,
    /// Playhead in seconds
    pub current_time: f64,
}

/// Live range shown while a gesture is in progress
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Preview {
    /// Segment being dragged, `None` while creating
    pub id: Option<SegmentId>,
    pub start: f64,
    pub end: f64,
    /// The range overlaps a committed segment and would be rejected
    pub colliding: bool,
}

/// Which edge a resize moved
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Edge {
    Left,
    Right,
}

/// What the controller asks its owner to do
#[derive(Debug, Clone, PartialEq)]
pub enum Intent {
    Seek(f64),
    CreateLoop { start: f64, end: f64 },
    MoveLoop { id: SegmentId, start: f64, end: f64 },
    ResizeLoop { id: SegmentId, edge: Edge, start: f64, end: f64 },
    DeleteLoop(SegmentId),
    Select(SegmentId),
    Deselect,
    Preview(Preview),
    PreviewCleared,
    /// User-facing message for a rejected request
    ValidationError(String),
    HoverChanged(Option<Hit>),
    PhaseChanged(Phase),
    /// Keep delivering pointer events to the timeline until released
    CapturePointer,
    ReleasePointer,
}
