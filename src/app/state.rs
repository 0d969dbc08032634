//! Central application state.
//!
//! All mutable state lives here so that the rest of the app can be pure
//! functions over `&AppState` (rendering) or `&mut AppState` (event handling).

use ratatui::layout::Rect;
use ratatui::style::Style;

use crate::config::AppConfig;
use crate::core::gallery::Gallery;
use crate::ui::gallery_widget::ThumbCache;
use crate::ui::theme;

/// Top-level application state.
pub struct AppState {
    /// The carousel engine.
    pub gallery: Gallery,
    /// User-configurable keybindings and settings.
    pub config: AppConfig,
    /// Caption style resolved from the configured colour and font.
    pub caption_style: Style,
    /// Scaled-down textures for the current plane size.
    pub thumbs: ThumbCache,
    /// Controls the main event loop.
    pub should_quit: bool,
    /// An optional status message shown in the bottom bar.
    pub status_message: Option<String>,
    /// Area the gallery was last drawn into; mouse input is mapped
    /// relative to it.
    pub gallery_area: Rect,
    /// Frame counter (drives the loading spinner).
    pub frame: u64,
}

impl AppState {
    pub fn new(gallery: Gallery, config: AppConfig, gallery_area: Rect) -> Self {
        let caption_style = {
            let g = gallery.config();
            theme::caption_style(&g.text_color, &g.font)
        };
        Self {
            gallery,
            config,
            caption_style,
            thumbs: ThumbCache::default(),
            should_quit: false,
            status_message: None,
            gallery_area,
            frame: 0,
        }
    }

    /// One-line summary for the status bar.
    pub fn status_line(&self) -> String {
        let g = &self.gallery;
        let position = g
            .centred_index()
            .map(|i| format!("{}/{}", i + 1, g.len()))
            .unwrap_or_default();
        let loading = match g.pending_loads() {
            0 => String::new(),
            n => format!(" | loading {n}"),
        };
        let hint = self.config.status_bar_hint();
        match &self.status_message {
            Some(msg) => format!(" {position}{loading} | {msg}"),
            None => format!(" {position}{loading} | bend {:.1} | {hint}", g.config().bend),
        }
    }
}
