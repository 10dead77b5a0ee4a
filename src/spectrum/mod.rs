//! Sample-to-geometry pipeline.
//!
//! Turns successive magnitude snapshots into bar rectangles: a silence gate,
//! temporal smoothing of the snapshot, and the bar layout that splits the
//! available width into a fixed number of integer-width bars.

pub mod layout;
pub mod silence;
pub mod smoothing;

pub use layout::{layout, BarRect, Geometry, LayoutParams};
pub use silence::SilenceDetector;
pub use smoothing::SmoothedState;
