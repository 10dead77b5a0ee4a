//! Fixed-period render loop.
//!
//! Every tick pulls one snapshot, feeds the silence detector and the smoothing
//! state, and raises a redraw request unless the signal is idle. Pending
//! requests are served after the tick returns, together with resize and quit
//! events, so ticks never overlap and never paint directly.

use anyhow::Result;
use std::time::Duration;
use tokio::time::MissedTickBehavior;

use crate::capture::SnapshotSource;
use crate::config::Rgba;
use crate::spectrum::{layout, BarRect, Geometry, LayoutParams, SilenceDetector, SmoothedState};

/// Time between ticks (about 30 frames per second).
pub const FRAME_PERIOD: Duration = Duration::from_millis(33);

/// Draws bar rectangles.
pub trait PaintBackend {
    /// Fills `bars` in order with `color`.
    fn paint(&mut self, bars: &[BarRect], color: Rgba) -> Result<()>;
}

/// Input delivered to the loop between ticks.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoopEvent {
    /// New drawing area size
    Resize(u32, u32),
    Quit,
}

/// Supplies pending loop events without blocking.
pub trait EventSource {
    fn poll_events(&mut self) -> Result<Vec<LoopEvent>>;
}

/// Whether the loop is currently drawing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoopState {
    Active,
    Idle,
}

/// Pipeline state owned by the render loop.
#[derive(Debug)]
pub struct Visualizer {
    params: LayoutParams,
    geometry: Geometry,
    silence: SilenceDetector,
    smoothed: SmoothedState,
    last_snapshot: Vec<f32>,
    snapshot_len: usize,
    state: LoopState,
    redraw_requested: bool,
    failed_reads: u64,
}

impl Visualizer {
    /// Creates the pipeline for a drawing area of `width` x `height`.
    pub fn new(params: LayoutParams, snapshot_len: usize, width: u32, height: u32) -> Self {
        let geometry = Geometry::compute(width, height, &params);
        Self {
            params,
            geometry,
            silence: SilenceDetector::new(),
            smoothed: SmoothedState::new(),
            last_snapshot: Vec::new(),
            snapshot_len,
            state: LoopState::Active,
            redraw_requested: true,
            failed_reads: 0,
        }
    }

    /// Runs one tick and returns the resulting state.
    ///
    /// A redraw is requested whenever the tick ends active.
    pub fn tick(&mut self, source: &mut impl SnapshotSource) -> LoopState {
        let snapshot = self.fetch(source);

        let idle = self
            .silence
            .observe(snapshot.first().copied().unwrap_or(0.0));
        self.smoothed.update(&snapshot);
        self.last_snapshot = snapshot;

        let state = if idle {
            LoopState::Idle
        } else {
            LoopState::Active
        };
        if state != self.state {
            tracing::debug!("Render loop {:?} -> {:?}", self.state, state);
            self.state = state;
        }

        if state == LoopState::Active {
            self.redraw_requested = true;
        }
        state
    }

    /// Reads a snapshot, falling back to the previous one (or silence) when the
    /// source fails.
    fn fetch(&mut self, source: &mut impl SnapshotSource) -> Vec<f32> {
        match source.snapshot(true) {
            Ok(snapshot) => {
                if self.failed_reads > 0 {
                    tracing::info!("Snapshot source recovered after {} failed reads", self.failed_reads);
                    self.failed_reads = 0;
                }
                snapshot
            }
            Err(err) => {
                self.failed_reads += 1;
                if self.failed_reads == 1 {
                    tracing::warn!("Snapshot source failed, reusing last snapshot: {err:#}");
                } else {
                    tracing::trace!("Snapshot source still failing: {err:#}");
                }

                if self.last_snapshot.is_empty() {
                    vec![0.0; self.snapshot_len]
                } else {
                    self.last_snapshot.clone()
                }
            }
        }
    }

    /// Recomputes the geometry for a new drawing area and requests a redraw.
    pub fn resize(&mut self, width: u32, height: u32) {
        self.geometry = Geometry::compute(width, height, &self.params);
        tracing::debug!(
            "Resized to {}x{}: bar width {}, mark {}",
            width,
            self.geometry.window_height,
            self.geometry.bar_width,
            self.geometry.mark
        );
        self.redraw_requested = true;
    }

    /// Returns and clears the pending redraw request.
    pub fn take_redraw_request(&mut self) -> bool {
        std::mem::take(&mut self.redraw_requested)
    }

    /// Bar rectangles for the current smoothed state.
    pub fn bars(&self) -> Vec<BarRect> {
        layout(self.smoothed.values(), &self.params, &self.geometry)
    }

    #[cfg(test)]
    pub fn state(&self) -> LoopState {
        self.state
    }

    #[cfg(test)]
    pub fn geometry(&self) -> &Geometry {
        &self.geometry
    }

    #[cfg(test)]
    pub fn smoothed(&self) -> &[f32] {
        self.smoothed.values()
    }
}

/// Drives a [`Visualizer`] at a fixed period.
pub struct RenderLoop<S, P, E> {
    visualizer: Visualizer,
    source: S,
    painter: P,
    events: E,
    color: Rgba,
    frames_painted: u64,
}

impl<S, P, E> RenderLoop<S, P, E>
where
    S: SnapshotSource,
    P: PaintBackend,
    E: EventSource,
{
    pub fn new(visualizer: Visualizer, source: S, painter: P, events: E, color: Rgba) -> Self {
        Self {
            visualizer,
            source,
            painter,
            events,
            color,
            frames_painted: 0,
        }
    }

    /// Applies pending events. Returns `false` once the loop should stop.
    fn handle_events(&mut self) -> Result<bool> {
        for event in self.events.poll_events()? {
            match event {
                LoopEvent::Resize(width, height) => self.visualizer.resize(width, height),
                LoopEvent::Quit => return Ok(false),
            }
        }
        Ok(true)
    }

    /// Runs one tick, then paints if a redraw was requested.
    ///
    /// # Errors
    /// - If painting fails
    pub fn frame(&mut self) -> Result<()> {
        self.visualizer.tick(&mut self.source);

        if self.visualizer.take_redraw_request() {
            self.painter.paint(&self.visualizer.bars(), self.color)?;
            self.frames_painted += 1;
        }
        Ok(())
    }

    /// Ticks until a quit event or SIGINT arrives.
    ///
    /// A tick that overruns the period delays the following ticks instead of
    /// bunching them up. Frames may block on the snapshot source, so they run
    /// through `block_in_place`, which needs the multi-threaded runtime.
    ///
    /// # Errors
    /// - If event polling or painting fails
    pub async fn run(mut self) -> Result<Self> {
        let mut interval = tokio::time::interval(FRAME_PERIOD);
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                _ = interval.tick() => {}
                _ = tokio::signal::ctrl_c() => {
                    tracing::info!("Interrupted, stopping render loop");
                    break;
                }
            }

            if !self.handle_events()? {
                tracing::debug!("Quit requested");
                break;
            }
            tokio::task::block_in_place(|| self.frame())?;
        }

        tracing::debug!("Render loop stopped after {} painted frames", self.frames_painted);
        Ok(self)
    }

    #[cfg(test)]
    pub fn visualizer(&self) -> &Visualizer {
        &self.visualizer
    }

    pub fn painter_mut(&mut self) -> &mut P {
        &mut self.painter
    }

    pub fn frames_painted(&self) -> u64 {
        self.frames_painted
    }
}
