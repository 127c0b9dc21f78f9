//! Loop playback coordination
//!
//! The controller never talks to the media transport directly. Each call
//! returns [`PlaybackCommand`]s which the caller applies with
//! [`apply_commands`], keeping the controller deterministic under test.

mod controller;
mod transport;

pub use controller::{
    Boundary, LoopPlaybackController, Navigation, NavigationOutcome, PlaybackEvent, TickOutcome,
};
pub use transport::{apply_commands, MediaTransport, PlaybackCommand, TransportSnapshot};
