//! Visualizer command: capture audio and draw spectrum bars until quit.

use anyhow::anyhow;

use crate::capture::{AudioCapture, CaptureSource, SNAPSHOT_LEN};
use crate::config::{config_path, BarscopeConfig};
use crate::render::{RenderLoop, TerminalEvents, TerminalPainter, Visualizer};
use crate::ui::ErrorScreen;

/// Runs the visualizer with the user configuration.
///
/// Press `q`, Escape or Ctrl+C to stop.
///
/// # Errors
/// - If the configuration cannot be bootstrapped and no default is usable
/// - If the audio source cannot be opened
/// - If the terminal cannot be initialized or drawn to
pub async fn handle_run() -> anyhow::Result<()> {
    let config_path = config_path()?;
    if let Err(e) = crate::setup::ensure_config(&config_path) {
        tracing::warn!("Config setup failed for {}: {e:#}", config_path.display());
        eprintln!("Could not prepare {}: {e:#}", config_path.display());
    }
    let config = BarscopeConfig::load_or_default(&config_path)?;

    let hints = config.window_hints();
    let states: Vec<String> = config.main.state.iter().map(ToString::to_string).collect();
    tracing::debug!("Window states [{}], bar color {}", states.join(", "), config.bars.rgba);
    for flag in hints.unsupported() {
        tracing::debug!("Window state '{}' has no effect in a terminal", flag);
    }

    let capture = match AudioCapture::start(config.main.source) {
        Ok(capture) => capture,
        Err(e) => {
            tracing::error!("Failed to start audio capture: {e:#}");
            let message = format!("Could not open audio source {}:\n{e}", config.main.source);
            if let Ok(mut screen) = ErrorScreen::new() {
                let _ = screen.show_error(&message);
            }
            return Err(anyhow!("Failed to start audio capture: {e}"));
        }
    };

    tracing::info!(
        "Visualizing {} at {}Hz ({} bars, scale {})",
        capture.device_name(),
        capture.sample_rate(),
        config.layout_params().bar_count,
        config.bars.scale
    );

    let source = CaptureSource::new(capture, SNAPSHOT_LEN);
    let mut painter = TerminalPainter::new(&hints)?;
    let (width, height) = painter.size();
    tracing::debug!("Initial drawing area {}x{}", width, height);

    let visualizer = Visualizer::new(config.layout_params(), SNAPSHOT_LEN, width, height);
    let render_loop = RenderLoop::new(
        visualizer,
        source,
        painter,
        TerminalEvents::new(&hints),
        config.bars.rgba,
    );

    let result = render_loop.run().await;
    match result {
        Ok(mut finished) => {
            finished.painter_mut().cleanup()?;
            tracing::info!("Stopped after {} frames", finished.frames_painted());
            Ok(())
        }
        Err(e) => {
            tracing::error!("Render loop failed: {e:#}");
            Err(e)
        }
    }
}
