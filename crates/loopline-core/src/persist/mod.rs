//! Persistence for loop segments and speed mappings
//!
//! Two layers:
//!
//! - [`KeyValueStore`]: last-write-wins `get`/`set` of string values, with an
//!   in-memory and a YAML file implementation
//! - [`DebouncedWriter`]: batches writes behind a quiet period so a burst of
//!   edits produces a single write
//!
//! Failures are logged and swallowed by callers: an unreadable store behaves
//! like an empty one and the in-memory model keeps working on defaults.

mod debounce;
mod store;

pub use debounce::{Clock, DebouncedWriter, ManualClock, SystemClock, DEFAULT_DEBOUNCE};
pub use store::{KeyValueStore, MemoryStore, YamlFileStore};

/// Store key for the per-loop speed mapping
pub const SPEED_MAPPING_KEY: &str = "loopline.speeds";

/// Store key for the committed loop segments
pub const SEGMENTS_KEY: &str = "loopline.segments";
