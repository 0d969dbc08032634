//! Loading indicator: a braille spinner + label centred on a cell.

use ratatui::{
    buffer::Buffer,
    layout::Rect,
    text::{Line, Span},
    widgets::Widget,
};

use super::theme::Theme;

/// Braille-dot spinner frames.  Cycles through these on each tick.
const SPINNER_FRAMES: &[&str] = &["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏"];

pub fn frame(tick: u64) -> &'static str {
    SPINNER_FRAMES[(tick as usize) % SPINNER_FRAMES.len()]
}

/// Spinner drawn centred inside `area`, with an optional label when it fits.
pub struct LoadingSpinner<'a> {
    /// Monotonically increasing tick counter (drives the spinner frame).
    pub tick: u64,
    pub label: Option<&'a str>,
}

impl Widget for LoadingSpinner<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        if area.width == 0 || area.height == 0 {
            return;
        }

        let spinner = frame(self.tick);
        let text = match self.label {
            Some(label) if (label.chars().count() as u16 + 2) <= area.width => {
                format!("{spinner} {label}")
            }
            _ => spinner.to_string(),
        };

        let width = (text.chars().count() as u16).min(area.width);
        let x = area.x + (area.width - width) / 2;
        let y = area.y + area.height / 2;
        let line = Line::from(Span::styled(text, Theme::spinner_style()));
        buf.set_line(x, y, &line, width);
    }
}
