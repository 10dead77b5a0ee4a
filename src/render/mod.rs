//! Frame scheduling and painting.
//!
//! The driver owns the pipeline state and runs the fixed-period loop; the
//! terminal module paints bar rectangles and reports resize and quit events.

pub mod driver;
pub mod terminal;

pub use driver::{RenderLoop, Visualizer};
pub use terminal::{TerminalEvents, TerminalPainter};
