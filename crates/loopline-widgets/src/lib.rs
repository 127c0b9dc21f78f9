//! Loop timeline widgets
//!
//! ## Architecture (iced 0.14 patterns)
//!
//! - **Interaction**: [`InteractionController`] is a pure state machine from
//!   [`TimelineInput`] to [`Intent`]s, testable without a window
//! - **State**: [`TimelineView`] is plain render data
//! - **Canvas Program**: [`TimelineCanvas`] translates iced events into
//!   [`TimelineInput`] through a callback closure and draws the view
//!
//! ## Wiring
//!
//! The application routes each `TimelineInput` message into
//! [`InteractionController::handle`], folds the returned intents into its
//! [`TimelineView`] with [`TimelineView::apply`], and commits
//! create/move/resize/delete intents against its
//! [`loopline_core::session::LoopSession`].

pub mod interaction;
pub mod theme;
pub mod timeline;

pub use interaction::{
    hit_test, Edge, Hit, InteractionContext, InteractionController, Intent, Phase, Pointer,
    PointerKind, Preview, TimelineInput, TimelineKey,
};
pub use theme::{parse_hex_color, TIMELINE_HEIGHT};
pub use timeline::{timeline_view, TimelineCanvas, TimelineInteraction, TimelineView};
