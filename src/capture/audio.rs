//! Audio input capture.
//!
//! This module opens an input device, downmixes its frames to mono and keeps
//! the most recent window of samples in a shared ring buffer. The render loop
//! reads that window whenever it needs a new snapshot.

use anyhow::{anyhow, Result};
use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use cpal::SampleFormat;
use std::collections::VecDeque;
use std::sync::{Arc, Condvar, Mutex};
use std::time::Duration;

use super::analysis::FFT_SIZE;

#[cfg(target_os = "linux")]
use std::fs::OpenOptions;
#[cfg(target_os = "linux")]
use std::os::unix::io::AsRawFd;

/// Most recent mono samples plus bookkeeping shared with the stream callback.
#[derive(Debug, Default)]
struct SampleRing {
    samples: VecDeque<f32>,
    /// Incremented once per audio callback
    generation: u64,
    /// Set by the stream error callback
    failure: Option<String>,
}

impl SampleRing {
    /// Appends interleaved frames, averaging all channels of each frame.
    fn push_frames<T>(&mut self, data: &[T], channels: usize)
    where
        T: cpal::Sample,
        f32: cpal::FromSample<T>,
    {
        for frame in data.chunks_exact(channels.max(1)) {
            let sum: f32 = frame
                .iter()
                .map(|&sample| -> f32 { cpal::Sample::from_sample(sample) })
                .sum();
            self.samples.push_back(sum / frame.len() as f32);
        }

        while self.samples.len() > FFT_SIZE {
            self.samples.pop_front();
        }
        self.generation = self.generation.wrapping_add(1);
    }
}

#[derive(Debug, Default)]
struct Shared {
    ring: Mutex<SampleRing>,
    fresh: Condvar,
}

impl Shared {
    /// Called from the stream data callback.
    fn push<T>(&self, data: &[T], channels: usize)
    where
        T: cpal::Sample,
        f32: cpal::FromSample<T>,
    {
        if let Ok(mut ring) = self.ring.lock() {
            ring.push_frames(data, channels);
        }
        self.fresh.notify_all();
    }

    /// Called from the stream error callback.
    fn fail(&self, message: String) {
        if let Ok(mut ring) = self.ring.lock() {
            ring.failure = Some(message);
        }
        self.fresh.notify_all();
    }

    fn latest(&self, seen_generation: u64, timeout: Option<Duration>) -> Result<(Vec<f32>, u64)> {
        let guard = self
            .ring
            .lock()
            .map_err(|_| anyhow!("Audio buffer lock poisoned"))?;

        let ring = match timeout {
            Some(timeout) => {
                self.fresh
                    .wait_timeout_while(guard, timeout, |ring| {
                        ring.generation == seen_generation && ring.failure.is_none()
                    })
                    .map_err(|_| anyhow!("Audio buffer lock poisoned"))?
                    .0
            }
            None => guard,
        };

        if let Some(failure) = &ring.failure {
            return Err(anyhow!("Audio stream failed: {failure}"));
        }

        Ok((ring.samples.iter().copied().collect(), ring.generation))
    }
}

/// Captures audio from an input device selected by index.
///
/// The stream runs until the capture is dropped.
pub struct AudioCapture {
    shared: Arc<Shared>,
    /// Active audio input stream (kept alive while capturing)
    _stream: cpal::Stream,
    device_name: String,
    sample_rate: u32,
}

impl AudioCapture {
    /// Starts capturing from the input device at index `source`.
    ///
    /// # Errors
    /// - If the device index is out of range or no device is available
    /// - If the device reports an unsupported sample format
    /// - If the audio stream cannot be built or started
    pub fn start(source: u32) -> Result<Self> {
        let device = suppress_alsa_warnings(|| {
            let host = cpal::default_host();
            find_input_device(&host, source as usize)
        })?;

        let device_name = device
            .name()
            .unwrap_or_else(|_| "Unknown device".to_string());
        tracing::info!("Capture device: {}", device_name);

        let device_config = device.default_input_config()?;
        let sample_rate = device_config.sample_rate().0;
        let sample_format = device_config.sample_format();
        let stream_config: cpal::StreamConfig = device_config.into();

        tracing::debug!(
            "Device configuration: {}Hz, {} channels, {:?}",
            sample_rate,
            stream_config.channels,
            sample_format
        );

        let shared = Arc::new(Shared::default());
        let stream = match sample_format {
            SampleFormat::F32 => build_stream::<f32>(&device, &stream_config, &shared)?,
            SampleFormat::I16 => build_stream::<i16>(&device, &stream_config, &shared)?,
            SampleFormat::U16 => build_stream::<u16>(&device, &stream_config, &shared)?,
            other => return Err(anyhow!("Unsupported sample format: {other:?}")),
        };

        stream.play()?;
        tracing::debug!("Audio stream started");

        Ok(Self {
            shared,
            _stream: stream,
            device_name,
            sample_rate,
        })
    }

    /// Returns a copy of the newest sample window and its generation.
    ///
    /// With a `timeout`, waits until a callback newer than `seen_generation`
    /// arrives or the timeout expires, whichever is first. Without one it
    /// returns immediately.
    ///
    /// # Errors
    /// - If the stream reported an error
    /// - If the buffer lock is poisoned
    pub fn latest_samples(
        &self,
        seen_generation: u64,
        timeout: Option<Duration>,
    ) -> Result<(Vec<f32>, u64)> {
        self.shared.latest(seen_generation, timeout)
    }

    pub fn device_name(&self) -> &str {
        &self.device_name
    }

    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }
}

/// Builds an input stream that feeds the shared ring buffer.
fn build_stream<T>(
    device: &cpal::Device,
    config: &cpal::StreamConfig,
    shared: &Arc<Shared>,
) -> Result<cpal::Stream>
where
    T: cpal::Sample + cpal::SizedSample + Send + 'static,
    f32: cpal::FromSample<T>,
{
    let channels = config.channels as usize;
    let data_shared = Arc::clone(shared);
    let error_shared = Arc::clone(shared);

    let stream = device.build_input_stream(
        config,
        move |data: &[T], _: &cpal::InputCallbackInfo| data_shared.push(data, channels),
        move |err| {
            tracing::error!("Audio stream error: {}", err);
            error_shared.fail(err.to_string());
        },
        None,
    )?;

    Ok(stream)
}

/// Finds an audio input device by its position in the host's device list.
///
/// # Errors
/// - If the devices cannot be enumerated
/// - If no device exists at `index`
pub fn find_input_device(host: &cpal::Host, index: usize) -> Result<cpal::Device> {
    let devices: Vec<_> = host
        .input_devices()
        .map_err(|e| anyhow!("Failed to enumerate devices: {e}"))?
        .collect();

    if devices.is_empty() {
        return Err(anyhow!("No audio input device available"));
    }

    let count = devices.len();
    devices.into_iter().nth(index).ok_or_else(|| {
        anyhow!(
            "Audio source {} is out of range (0-{}). Use 'barscope list-devices' to see available devices.",
            index,
            count - 1
        )
    })
}

/// Temporarily redirects stderr to /dev/null to suppress ALSA library warnings on Linux.
/// On non-Linux platforms, this is a no-op since ALSA doesn't exist.
#[cfg(target_os = "linux")]
pub fn suppress_alsa_warnings<F, T>(f: F) -> Result<T>
where
    F: FnOnce() -> Result<T>,
{
    let dev_null = OpenOptions::new()
        .write(true)
        .open("/dev/null")
        .map_err(|e| anyhow!("Failed to open /dev/null: {e}"))?;

    let dev_null_fd = dev_null.as_raw_fd();

    // Save the current stderr file descriptor
    let old_stderr = unsafe { libc::dup(libc::STDERR_FILENO) };
    if old_stderr == -1 {
        return Err(anyhow!("Failed to duplicate stderr"));
    }

    let redirect_result = unsafe { libc::dup2(dev_null_fd, libc::STDERR_FILENO) };
    if redirect_result == -1 {
        unsafe { libc::close(old_stderr) };
        return Err(anyhow!("Failed to redirect stderr"));
    }

    let result = f();

    // Restore the original stderr
    unsafe {
        libc::dup2(old_stderr, libc::STDERR_FILENO);
        libc::close(old_stderr);
    }

    result
}

/// On non-Linux platforms, no stderr suppression is needed since ALSA doesn't exist.
#[cfg(not(target_os = "linux"))]
pub fn suppress_alsa_warnings<F, T>(f: F) -> Result<T>
where
    F: FnOnce() -> Result<T>,
{
    f()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;
    use std::time::Instant;

    #[test]
    fn test_stereo_frames_are_averaged() {
        let mut ring = SampleRing::default();
        ring.push_frames(&[1.0f32, 0.0, 0.5, 0.5, -1.0, 1.0], 2);
        assert_eq!(ring.samples, vec![0.5, 0.5, 0.0]);
        assert_eq!(ring.generation, 1);
    }

    #[test]
    fn test_integer_samples_are_normalized() {
        let mut ring = SampleRing::default();
        ring.push_frames(&[i16::MIN, 0i16], 1);
        assert_eq!(ring.samples[0], -1.0);
        assert_eq!(ring.samples[1], 0.0);
    }

    #[test]
    fn test_ring_keeps_latest_window() {
        let mut ring = SampleRing::default();
        let data: Vec<f32> = (0..FFT_SIZE + 100).map(|i| i as f32).collect();
        ring.push_frames(&data, 1);
        assert_eq!(ring.samples.len(), FFT_SIZE);
        assert_eq!(ring.samples.front().copied(), Some(100.0));
        assert_eq!(ring.samples.back().copied(), Some((FFT_SIZE + 99) as f32));
    }

    #[test]
    fn test_blocking_read_times_out_with_current_buffer() {
        let shared = Shared::default();
        shared.push(&[0.25f32, 0.5], 1);

        let started = Instant::now();
        let (samples, generation) = shared.latest(1, Some(Duration::from_millis(20))).unwrap();
        assert!(started.elapsed() >= Duration::from_millis(20));
        assert_eq!(samples, vec![0.25, 0.5]);
        assert_eq!(generation, 1);
    }

    #[test]
    fn test_blocking_read_wakes_on_fresh_audio() {
        let shared = Arc::new(Shared::default());
        let writer = Arc::clone(&shared);
        let handle = thread::spawn(move || {
            thread::sleep(Duration::from_millis(10));
            writer.push(&[0.75f32], 1);
        });

        let (samples, generation) = shared.latest(0, Some(Duration::from_secs(5))).unwrap();
        handle.join().unwrap();
        assert_eq!(generation, 1);
        assert_eq!(samples, vec![0.75]);
    }

    #[test]
    fn test_non_blocking_read_returns_immediately() {
        let shared = Shared::default();
        let (samples, generation) = shared.latest(0, None).unwrap();
        assert!(samples.is_empty());
        assert_eq!(generation, 0);
    }

    #[test]
    fn test_stream_failure_is_reported() {
        let shared = Arc::new(Shared::default());
        shared.push(&[0.5f32], 1);
        let writer = Arc::clone(&shared);
        let handle = thread::spawn(move || {
            thread::sleep(Duration::from_millis(10));
            writer.fail("device disconnected".to_string());
        });

        let err = shared.latest(1, Some(Duration::from_secs(5))).unwrap_err();
        handle.join().unwrap();
        assert!(err.to_string().contains("device disconnected"));
        assert!(shared.latest(1, None).is_err());
    }

    #[test]
    fn test_incomplete_trailing_frame_is_ignored() {
        let mut ring = SampleRing::default();
        ring.push_frames(&[0.2f32, 0.4, 0.6], 2);
        assert_eq!(ring.samples.len(), 1);
    }
}
