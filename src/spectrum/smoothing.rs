//! Temporal smoothing of magnitude snapshots.
//!
//! Each snapshot is first halved by averaging adjacent pairs, then blended into
//! the persistent state with a one-pole low-pass filter so bars rise and fall
//! smoothly instead of jumping between frames.

/// Divisor applied to the distance between the target and the current value
/// on every update. Larger values give slower, softer motion.
pub const DECAY_FACTOR: f32 = 1.3;

/// Averages consecutive pairs `(2i, 2i + 1)`.
///
/// A trailing unpaired element is dropped.
pub fn downsample(raw: &[f32]) -> Vec<f32> {
    raw.chunks_exact(2)
        .map(|pair| (pair[0] + pair[1]) / 2.0)
        .collect()
}

/// Smoothed bar heights that persist across frames.
#[derive(Debug, Default, Clone)]
pub struct SmoothedState {
    values: Vec<f32>,
    decay: f32,
}

impl SmoothedState {
    pub fn new() -> Self {
        Self::with_decay(DECAY_FACTOR)
    }

    /// Creates an empty state with a custom decay divisor.
    pub fn with_decay(decay: f32) -> Self {
        Self {
            values: Vec::new(),
            decay,
        }
    }

    /// Blends a raw snapshot into the state and returns the new values.
    ///
    /// The first non-empty snapshot is taken verbatim. If the downsampled
    /// length differs from the stored length the state restarts from the new
    /// snapshot instead of blending mismatched indices.
    pub fn update(&mut self, raw: &[f32]) -> &[f32] {
        let target = downsample(raw);

        if self.values.is_empty() || self.values.len() != target.len() {
            if !self.values.is_empty() {
                tracing::debug!(
                    "Snapshot length changed ({} -> {} bars), resetting smoothing",
                    self.values.len(),
                    target.len()
                );
            }
            self.values = target;
            return &self.values;
        }

        for (previous, next) in self.values.iter_mut().zip(target) {
            *previous += (next - *previous) / self.decay;
        }

        &self.values
    }

    pub fn values(&self) -> &[f32] {
        &self.values
    }
}
