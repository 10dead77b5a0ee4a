//! Idle detection for the render loop.

/// Number of consecutive non-positive observations tolerated before the
/// signal is treated as idle.
pub const SILENCE_THRESHOLD: u32 = 10;

/// Hysteresis counter over the first value of each snapshot.
///
/// Any positive sample resets the counter immediately, so recovery from idle
/// is instant, while idle is only reported after more than
/// [`SILENCE_THRESHOLD`] silent observations in a row.
#[derive(Debug, Default, Clone)]
pub struct SilenceDetector {
    silent_ticks: u32,
}

impl SilenceDetector {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records one observation and returns whether the signal is idle.
    pub fn observe(&mut self, sample: f32) -> bool {
        if sample > 0.0 {
            self.silent_ticks = 0;
        } else {
            self.silent_ticks = self.silent_ticks.saturating_add(1);
        }
        self.is_idle()
    }

    pub fn is_idle(&self) -> bool {
        self.silent_ticks > SILENCE_THRESHOLD
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_idle_after_eleven_silent_observations() {
        let mut detector = SilenceDetector::new();
        for _ in 0..10 {
            assert!(!detector.observe(0.0));
        }
        assert!(detector.observe(0.0));
        assert!(detector.observe(0.0));
    }

    #[test]
    fn test_positive_sample_resets_immediately() {
        let mut detector = SilenceDetector::new();
        for _ in 0..20 {
            detector.observe(0.0);
        }
        assert!(detector.is_idle());
        assert!(!detector.observe(0.001));
        assert_eq!(detector.silent_ticks, 0);
    }

    #[test]
    fn test_idle_iff_last_eleven_non_positive() {
        // Deterministic mix of silent and loud observations
        let samples: Vec<f32> = (0..200)
            .map(|i| if (i * 7 + i / 13) % 17 == 0 { 0.5 } else { 0.0 })
            .collect();

        let mut detector = SilenceDetector::new();
        for (i, &sample) in samples.iter().enumerate() {
            let idle = detector.observe(sample);
            let expected = i >= 10 && samples[i - 10..=i].iter().all(|&s| s <= 0.0);
            assert_eq!(idle, expected, "mismatch at observation {i}");
        }
    }

    #[test]
    fn test_negative_samples_count_as_silence() {
        let mut detector = SilenceDetector::new();
        for _ in 0..11 {
            detector.observe(-1.0);
        }
        assert!(detector.is_idle());
    }
}
