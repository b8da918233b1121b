//! Perception: что враг видит и смотрит ли на него игрок.
//!
//! - vision: VisibilityOracle (cone + LOS + proximity override)
//! - watch: WatchTracker (debounced "игрок смотрит на врага")

pub mod vision;
pub mod watch;

pub use vision::{can_see, line_of_sight, Sighting, VisionParams};
pub use watch::{is_watching, update_watch_tracker, WatchConfig, WatchRecord, WatchTracker};
