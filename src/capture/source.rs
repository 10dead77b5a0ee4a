//! Snapshot sources for the render loop.

use anyhow::Result;
use std::time::Duration;

use super::analysis::SnapshotAnalyzer;
use super::audio::AudioCapture;

/// Longest a blocking snapshot request waits for fresh audio. Kept below the
/// frame period so a stalled device cannot stretch a frame.
pub const SNAPSHOT_TIMEOUT: Duration = Duration::from_millis(25);

/// Supplies fixed-length magnitude snapshots on demand.
pub trait SnapshotSource {
    /// Returns the latest snapshot.
    ///
    /// With `blocking`, waits (boundedly) for data newer than the previous
    /// call; otherwise returns whatever is currently buffered.
    fn snapshot(&mut self, blocking: bool) -> Result<Vec<f32>>;
}

/// Snapshot source backed by live audio capture.
pub struct CaptureSource {
    capture: AudioCapture,
    analyzer: SnapshotAnalyzer,
    seen_generation: u64,
    timeout: Duration,
}

impl CaptureSource {
    pub fn new(capture: AudioCapture, snapshot_len: usize) -> Self {
        Self {
            capture,
            analyzer: SnapshotAnalyzer::new(snapshot_len),
            seen_generation: 0,
            timeout: SNAPSHOT_TIMEOUT,
        }
    }
}

impl SnapshotSource for CaptureSource {
    fn snapshot(&mut self, blocking: bool) -> Result<Vec<f32>> {
        let timeout = blocking.then_some(self.timeout);
        let (samples, generation) = self.capture.latest_samples(self.seen_generation, timeout)?;

        if blocking && generation == self.seen_generation {
            tracing::trace!("No fresh audio within {:?}, reusing buffer", self.timeout);
        }
        self.seen_generation = generation;

        Ok(self.analyzer.analyze(&samples))
    }
}
