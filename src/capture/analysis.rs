//! Frequency analysis of captured audio.

use rustfft::{num_complex::Complex, Fft, FftPlanner};
use std::sync::Arc;

/// Samples per FFT window.
pub const FFT_SIZE: usize = 512;

/// Turns a window of mono samples into normalized FFT magnitudes.
pub struct SnapshotAnalyzer {
    fft: Arc<dyn Fft<f32>>,
    buffer: Vec<Complex<f32>>,
    len: usize,
}

impl SnapshotAnalyzer {
    /// Creates an analyzer producing snapshots of `len` values.
    pub fn new(len: usize) -> Self {
        let mut planner = FftPlanner::new();
        Self {
            fft: planner.plan_fft_forward(FFT_SIZE),
            buffer: vec![Complex::new(0.0, 0.0); FFT_SIZE],
            len,
        }
    }

    /// Returns the magnitudes of the lowest `len` frequency bins.
    ///
    /// Uses the most recent [`FFT_SIZE`] samples with a Hann window; shorter
    /// input is zero padded. Magnitudes are scaled by `2 / FFT_SIZE` so a full
    /// scale sine lands near 0.5 after windowing. Bins past the Nyquist bin are
    /// reported as zero.
    pub fn analyze(&mut self, samples: &[f32]) -> Vec<f32> {
        let mut snapshot = vec![0.0f32; self.len];
        if samples.is_empty() {
            return snapshot;
        }

        let sample_count = samples.len().min(FFT_SIZE);
        let recent = &samples[samples.len() - sample_count..];

        for (i, slot) in self.buffer.iter_mut().enumerate() {
            *slot = match recent.get(i) {
                Some(&sample) => {
                    let window = 0.5
                        * (1.0
                            - (2.0 * std::f32::consts::PI * i as f32 / sample_count as f32).cos());
                    Complex::new(sample * window, 0.0)
                }
                None => Complex::new(0.0, 0.0),
            };
        }

        self.fft.process(&mut self.buffer);

        let scale = 2.0 / FFT_SIZE as f32;
        let bins = self.len.min(FFT_SIZE / 2 + 1);
        for (value, bin) in snapshot.iter_mut().zip(&self.buffer[..bins]) {
            *value = bin.norm() * scale;
        }

        snapshot
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sine(bin: usize, amplitude: f32) -> Vec<f32> {
        (0..FFT_SIZE)
            .map(|n| {
                amplitude
                    * (2.0 * std::f32::consts::PI * bin as f32 * n as f32 / FFT_SIZE as f32).sin()
            })
            .collect()
    }

    #[test]
    fn test_silence_gives_zero_snapshot() {
        let mut analyzer = SnapshotAnalyzer::new(128);
        let snapshot = analyzer.analyze(&vec![0.0; FFT_SIZE]);
        assert_eq!(snapshot.len(), 128);
        assert!(snapshot.iter().all(|v| *v == 0.0));
    }

    #[test]
    fn test_empty_input_gives_zero_snapshot() {
        let mut analyzer = SnapshotAnalyzer::new(16);
        assert_eq!(analyzer.analyze(&[]), vec![0.0; 16]);
    }

    #[test]
    fn test_sine_peaks_in_its_bin() {
        let mut analyzer = SnapshotAnalyzer::new(128);
        let snapshot = analyzer.analyze(&sine(32, 1.0));

        let (peak, value) = snapshot
            .iter()
            .enumerate()
            .fold((0, 0.0f32), |best, (i, &v)| if v > best.1 { (i, v) } else { best });
        assert_eq!(peak, 32);
        assert!(value > 0.4 && value < 0.6, "peak magnitude {value}");
        assert!(snapshot.iter().all(|v| *v >= 0.0));
    }

    #[test]
    fn test_uses_most_recent_window() {
        let mut analyzer = SnapshotAnalyzer::new(128);
        let mut samples = sine(10, 1.0);
        samples.extend(sine(50, 1.0));
        let snapshot = analyzer.analyze(&samples);
        assert!(snapshot[50] > snapshot[10]);
    }

    #[test]
    fn test_bins_past_nyquist_are_zero() {
        let mut analyzer = SnapshotAnalyzer::new(FFT_SIZE);
        let snapshot = analyzer.analyze(&sine(3, 1.0));
        assert_eq!(snapshot.len(), FFT_SIZE);
        assert!(snapshot[FFT_SIZE / 2 + 1..].iter().all(|v| *v == 0.0));
    }
}
