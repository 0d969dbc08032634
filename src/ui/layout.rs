//! Split the terminal between the gallery stage and the status row.

use ratatui::layout::{Constraint, Layout, Rect};

/// Terminals shorter than this give every row to the stage.
const MIN_ROWS_WITH_STATUS: u16 = 8;

pub struct AppLayout {
    pub gallery_area: Rect,
    /// `None` when the terminal is too short to spare a row.
    pub status_area: Option<Rect>,
}

impl AppLayout {
    pub fn from_area(area: Rect) -> Self {
        if area.height < MIN_ROWS_WITH_STATUS {
            return Self {
                gallery_area: area,
                status_area: None,
            };
        }
        let [gallery_area, status_area] =
            Layout::vertical([Constraint::Fill(1), Constraint::Length(1)]).areas(area);
        Self {
            gallery_area,
            status_area: Some(status_area),
        }
    }
}
