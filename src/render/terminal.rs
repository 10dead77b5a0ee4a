//! Terminal paint backend.
//!
//! One terminal cell is one pixel: bars are filled column by column from their
//! baseline upward, and the fractional top of each bar is drawn with an eighth
//! block so heights animate smoothly.

use anyhow::Result;
use crossterm::{
    event::{self, Event, KeyCode, KeyEventKind, KeyModifiers},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{
    buffer::{Buffer, Cell},
    layout::Rect,
    prelude::CrosstermBackend,
    style::Color,
    Terminal, TerminalOptions, Viewport,
};
use std::io::{stdout, Stdout};
use std::time::Duration;

use super::driver::{EventSource, LoopEvent, PaintBackend};
use crate::config::{Rgba, WindowHints};
use crate::spectrum::BarRect;

/// Rows used when drawing inline below the prompt.
pub const INLINE_HEIGHT: u16 = 12;

const EIGHTHS: [&str; 9] = [" ", "▁", "▂", "▃", "▄", "▅", "▆", "▇", "█"];

/// Size of the drawing area for a terminal of `cols` x `rows`.
pub fn viewport_size(fullscreen: bool, cols: u16, rows: u16) -> (u32, u32) {
    let rows = if fullscreen {
        rows
    } else {
        rows.min(INLINE_HEIGHT)
    };
    (u32::from(cols), u32::from(rows))
}

fn cell_at(buffer: &mut Buffer, area: Rect, x: i32, y: i32) -> Option<&mut Cell> {
    let x = i32::from(area.x).saturating_add(x);
    let y = i32::from(area.y).saturating_add(y);
    let inside = x >= i32::from(area.left())
        && x < i32::from(area.right())
        && y >= i32::from(area.top())
        && y < i32::from(area.bottom());
    if !inside {
        return None;
    }
    buffer.cell_mut((x as u16, y as u16))
}

/// Fills one bar into `buffer`, clipped to `area`.
///
/// Bar coordinates are relative to the top-left corner of `area`.
pub fn fill_bar(buffer: &mut Buffer, area: Rect, bar: &BarRect, color: Color) {
    let height = bar.height.max(0.0);
    let full_rows = height.floor() as i32;
    let eighths = ((height - full_rows as f32) * 8.0).round() as usize;
    let (full_rows, eighths) = if eighths >= 8 {
        (full_rows.saturating_add(1), 0)
    } else {
        (full_rows, eighths)
    };
    let rows = full_rows.min(i32::from(area.height));
    let first_column = bar.x.max(0);
    let end_column = bar.x.saturating_add(bar.width).min(i32::from(area.width));

    for column in first_column..end_column {
        for row in 0..rows {
            if let Some(cell) = cell_at(buffer, area, column, bar.bottom.saturating_sub(1 + row)) {
                cell.set_symbol(EIGHTHS[8]).set_fg(color);
            }
        }
        if eighths > 0 {
            let top = bar.bottom.saturating_sub(1).saturating_sub(full_rows);
            if let Some(cell) = cell_at(buffer, area, column, top) {
                cell.set_symbol(EIGHTHS[eighths]).set_fg(color);
            }
        }
    }
}

/// Paints bars into the terminal.
///
/// Fullscreen hints use the alternate screen; otherwise bars are drawn in an
/// inline strip of [`INLINE_HEIGHT`] rows.
pub struct TerminalPainter {
    terminal: Terminal<CrosstermBackend<Stdout>>,
    fullscreen: bool,
    active: bool,
}

impl TerminalPainter {
    /// Enters raw mode and sets up the viewport.
    ///
    /// # Errors
    /// - If raw mode cannot be enabled
    /// - If the alternate screen cannot be entered
    /// - If the terminal cannot be initialized
    pub fn new(hints: &WindowHints) -> Result<Self> {
        enable_raw_mode()?;
        let mut stdout = stdout();

        let viewport = if hints.fullscreen {
            execute!(stdout, EnterAlternateScreen)?;
            Viewport::Fullscreen
        } else {
            Viewport::Inline(INLINE_HEIGHT)
        };

        let backend = CrosstermBackend::new(stdout);
        let terminal = Terminal::with_options(backend, TerminalOptions { viewport })?;

        Ok(Self {
            terminal,
            fullscreen: hints.fullscreen,
            active: true,
        })
    }

    /// Current drawing area size.
    pub fn size(&mut self) -> (u32, u32) {
        let area = self.terminal.get_frame().area();
        (u32::from(area.width), u32::from(area.height))
    }

    /// Leaves raw mode and the alternate screen.
    ///
    /// # Errors
    /// - If terminal mode cannot be disabled
    /// - If cursor cannot be shown
    pub fn cleanup(&mut self) -> Result<()> {
        if !self.active {
            return Ok(());
        }
        self.active = false;

        disable_raw_mode()?;
        if self.fullscreen {
            execute!(self.terminal.backend_mut(), LeaveAlternateScreen)?;
        }
        self.terminal.show_cursor()?;
        Ok(())
    }
}

impl PaintBackend for TerminalPainter {
    fn paint(&mut self, bars: &[BarRect], color: Rgba) -> Result<()> {
        let (red, green, blue) = color.premultiplied();
        let fg = Color::Rgb(red, green, blue);

        self.terminal.draw(|frame| {
            let area = frame.area();
            let buffer = frame.buffer_mut();
            for bar in bars {
                fill_bar(buffer, area, bar, fg);
            }
        })?;
        Ok(())
    }
}

impl Drop for TerminalPainter {
    fn drop(&mut self) {
        let _ = self.cleanup();
    }
}

/// Reads keyboard and resize events from the terminal.
pub struct TerminalEvents {
    fullscreen: bool,
}

impl TerminalEvents {
    pub fn new(hints: &WindowHints) -> Self {
        Self {
            fullscreen: hints.fullscreen,
        }
    }

    fn translate(&self, event: Event) -> Option<LoopEvent> {
        match event {
            Event::Key(key) if key.kind == KeyEventKind::Press => match key.code {
                KeyCode::Char('q') | KeyCode::Esc => {
                    tracing::debug!("Escape or 'q' pressed: quitting");
                    Some(LoopEvent::Quit)
                }
                KeyCode::Char('c') if key.modifiers.contains(KeyModifiers::CONTROL) => {
                    tracing::debug!("Ctrl+C pressed: quitting");
                    Some(LoopEvent::Quit)
                }
                _ => None,
            },
            Event::Resize(cols, rows) => {
                let (width, height) = viewport_size(self.fullscreen, cols, rows);
                Some(LoopEvent::Resize(width, height))
            }
            _ => None,
        }
    }
}

impl EventSource for TerminalEvents {
    fn poll_events(&mut self) -> Result<Vec<LoopEvent>> {
        let mut events = Vec::new();
        while event::poll(Duration::ZERO)? {
            if let Some(loop_event) = self.translate(event::read()?) {
                events.push(loop_event);
            }
        }
        Ok(events)
    }
}
