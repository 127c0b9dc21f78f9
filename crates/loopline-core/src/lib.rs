//! Loopline Core - loop segment model and playback coordination
//!
//! Pure, single-threaded building blocks for marking and looping time ranges
//! over a media timeline:
//!
//! - [`timeline`]: time/percent mapping, collision detection, bounds validation
//! - [`segments`]: the committed, collision-free set of loop segments
//! - [`playback`]: active-loop detection, repeat-and-rewind, navigation
//! - [`speed`]: per-loop playback speed with a global fallback
//! - [`session`]: the above wired together for one track
//! - [`persist`]: key/value stores and the debounced writer
//! - [`config`]: YAML configuration

pub mod config;
pub mod error;
pub mod persist;
pub mod playback;
pub mod segments;
pub mod session;
pub mod speed;
pub mod timeline;
pub mod types;

pub use types::*;
