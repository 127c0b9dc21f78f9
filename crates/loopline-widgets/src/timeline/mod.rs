//! Loop timeline widget
//!
//! - [`TimelineView`]: render state (segments, playhead, selection, preview)
//! - [`TimelineCanvas`]: canvas program turning iced events into timeline input
//! - [`timeline_view`]: view function returning an `Element`

mod canvas;
mod state;
mod view;

pub use canvas::{TimelineCanvas, TimelineInteraction};
pub use state::TimelineView;
pub use view::timeline_view;
