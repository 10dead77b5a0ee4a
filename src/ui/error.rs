//! Full-screen error message for failures that happen before the bars start.

use crossterm::{
    event::{self, Event, KeyEventKind},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{
    prelude::*,
    widgets::{Paragraph, Wrap},
};
use std::io::{self, Stdout};
use std::time::Duration;

const BACKGROUND: Color = Color::Rgb(191, 97, 106);
const FOREGROUND: Color = Color::Rgb(236, 239, 244);

/// Error screen with centered text on a colored background.
pub struct ErrorScreen {
    terminal: Terminal<CrosstermBackend<Stdout>>,
    active: bool,
}

impl ErrorScreen {
    /// Enters raw mode and the alternate screen.
    ///
    /// # Errors
    /// - If raw mode cannot be enabled
    /// - If alternate screen cannot be entered
    pub fn new() -> anyhow::Result<Self> {
        enable_raw_mode()?;
        let mut stdout = io::stdout();
        execute!(stdout, EnterAlternateScreen)?;

        let backend = CrosstermBackend::new(stdout);
        let terminal = Terminal::new(backend)?;

        Ok(ErrorScreen {
            terminal,
            active: true,
        })
    }

    /// Shows `error_message` until any key is pressed.
    ///
    /// # Errors
    /// - If terminal rendering or event polling fails
    pub fn show_error(&mut self, error_message: &str) -> anyhow::Result<()> {
        loop {
            self.terminal.draw(|frame| {
                let area = frame.area();
                render_error(frame.buffer_mut(), area, error_message);
            })?;

            if event::poll(Duration::from_millis(100))? {
                if let Event::Key(key) = event::read()? {
                    if key.kind == KeyEventKind::Press {
                        break;
                    }
                }
            }
        }

        self.cleanup()
    }

    /// Leaves raw mode and the alternate screen.
    ///
    /// # Errors
    /// - If terminal mode cannot be disabled
    /// - If cursor cannot be shown
    pub fn cleanup(&mut self) -> anyhow::Result<()> {
        if !self.active {
            return Ok(());
        }
        self.active = false;

        disable_raw_mode()?;
        execute!(self.terminal.backend_mut(), LeaveAlternateScreen)?;
        self.terminal.show_cursor()?;
        Ok(())
    }
}

impl Drop for ErrorScreen {
    fn drop(&mut self) {
        let _ = self.cleanup();
    }
}

/// Paints the message centered in `area`, wrapped to 80% of its width.
fn render_error(buffer: &mut Buffer, area: Rect, message: &str) {
    let style = Style::default().fg(FOREGROUND).bg(BACKGROUND);
    buffer.set_style(area, style);

    let mut lines: Vec<Line> = message
        .lines()
        .map(|line| Line::from(Span::styled(line.to_string(), style)))
        .collect();
    lines.push(Line::default());
    lines.push(Line::from(Span::styled(
        "Press any key to exit",
        style.add_modifier(Modifier::DIM),
    )));

    let text_width = area.width * 8 / 10;
    let text_height = (lines.len() as u16).min(area.height);
    let text_area = Rect {
        x: area.x + (area.width - text_width) / 2,
        y: area.y + (area.height - text_height) / 2,
        width: text_width,
        height: area.height - (area.height - text_height) / 2,
    };

    Paragraph::new(lines)
        .alignment(Alignment::Center)
        .wrap(Wrap { trim: true })
        .render(text_area, buffer);
}
