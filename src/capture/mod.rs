//! Audio capture and spectrum snapshots.
//!
//! Captures audio from an input device, keeps the most recent window of mono
//! samples and turns it into fixed-length magnitude snapshots on request.

pub mod analysis;
pub mod audio;
pub mod source;

pub use audio::AudioCapture;
pub use source::{CaptureSource, SnapshotSource};

/// Number of magnitude values in every snapshot.
pub const SNAPSHOT_LEN: usize = 128;
