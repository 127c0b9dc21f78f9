//! Timeline geometry
//!
//! Pure functions over a track of known duration:
//!
//! - [`coords`]: time ↔ percent ↔ pixel conversions
//! - [`collision`]: overlap detection and collision-aware placement
//! - [`bounds`]: clamping and minimum-duration validation

pub mod bounds;
pub mod collision;
pub mod coords;

pub use bounds::{fit_within_track, validate, validate_with_min, BoundsIssue, BoundsValidation};
pub use collision::{AdjacencyPolicy, CollisionEngine, CollisionInfo, Placement};
pub use coords::{
    delta_x_to_time, percent_to_time, percents_to_times, time_to_percent, time_to_x,
    times_to_percents, x_to_time,
};
