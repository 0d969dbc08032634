//! Colour palette and text styles used across the UI.

use ratatui::style::{Color, Modifier, Style};

/// Font size assumed when the font string carries none.
pub const DEFAULT_FONT_PX: u32 = 30;

/// Captions smaller than this render dimmed.
const SMALL_FONT_PX: u32 = 20;

/// Central theme. Change colours here and they propagate everywhere.
pub struct Theme;

impl Theme {
    // ── gallery ────────────────────────────────────────────────
    pub fn placeholder_caption_style() -> Style {
        Style::default()
            .fg(Color::Gray)
            .add_modifier(Modifier::ITALIC)
    }

    pub fn spinner_style() -> Style {
        Style::default()
            .fg(Color::Yellow)
            .add_modifier(Modifier::BOLD)
    }

    pub fn empty_plane_color() -> [u8; 3] {
        [0x20, 0x20, 0x20]
    }

    // ── chrome ─────────────────────────────────────────────────
    pub fn status_bar_style() -> Style {
        Style::default().bg(Color::DarkGray).fg(Color::White)
    }
}

/// Parse `#rgb` / `#rrggbb` (leading `#` optional).
pub fn parse_hex_color(s: &str) -> Option<Color> {
    let hex = s.trim().trim_start_matches('#');
    if !hex.is_ascii() {
        return None;
    }
    let channel = |h: &str| u8::from_str_radix(h, 16).ok();
    match hex.len() {
        3 => {
            let mut rgb = [0u8; 3];
            for (i, c) in hex.chars().enumerate() {
                let v = channel(&c.to_string())?;
                rgb[i] = v * 17;
            }
            Some(Color::Rgb(rgb[0], rgb[1], rgb[2]))
        }
        6 => Some(Color::Rgb(
            channel(&hex[0..2])?,
            channel(&hex[2..4])?,
            channel(&hex[4..6])?,
        )),
        _ => None,
    }
}

/// First `NNpx` token of a CSS font shorthand, e.g. `"bold 30px Figtree"`.
pub fn font_size_px(font: &str) -> u32 {
    font.split_whitespace()
        .find_map(|token| token.strip_suffix("px")?.parse::<f64>().ok())
        .filter(|v| v.is_finite() && *v > 0.0)
        .map_or(DEFAULT_FONT_PX, |v| v.round() as u32)
}

/// Caption style derived from the configured colour and font string.
pub fn caption_style(text_color: &str, font: &str) -> Style {
    let color = parse_hex_color(text_color).unwrap_or_else(|| {
        tracing::debug!(text_color, "unparseable caption colour, using white");
        Color::White
    });
    let mut style = Style::default().fg(color);
    let lower = font.to_ascii_lowercase();
    if lower.split_whitespace().any(|t| t == "bold" || t == "bolder" || t == "700" || t == "800" || t == "900") {
        style = style.add_modifier(Modifier::BOLD);
    }
    if lower.split_whitespace().any(|t| t == "italic" || t == "oblique") {
        style = style.add_modifier(Modifier::ITALIC);
    }
    if font_size_px(font) < SMALL_FONT_PX {
        style = style.add_modifier(Modifier::DIM);
    }
    style
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hex_colours() {
        assert_eq!(parse_hex_color("#ffffff"), Some(Color::Rgb(255, 255, 255)));
        assert_eq!(parse_hex_color("#f80"), Some(Color::Rgb(255, 136, 0)));
        assert_eq!(parse_hex_color("102030"), Some(Color::Rgb(16, 32, 48)));
        assert_eq!(parse_hex_color("#12345"), None);
        assert_eq!(parse_hex_color("#gggggg"), None);
        assert_eq!(parse_hex_color("#éé"), None);
    }

    #[test]
    fn font_sizes() {
        assert_eq!(font_size_px("bold 30px Figtree"), 30);
        assert_eq!(font_size_px("12.6px mono"), 13);
        assert_eq!(font_size_px("Figtree"), DEFAULT_FONT_PX);
        assert_eq!(font_size_px("bold 0px x"), DEFAULT_FONT_PX);
    }

    #[test]
    fn caption_styles() {
        let s = caption_style("#ffffff", "bold 30px Figtree");
        assert_eq!(s.fg, Some(Color::Rgb(255, 255, 255)));
        assert!(s.add_modifier.contains(Modifier::BOLD));
        assert!(!s.add_modifier.contains(Modifier::DIM));

        let s = caption_style("not-a-colour", "italic 12px serif");
        assert_eq!(s.fg, Some(Color::White));
        assert!(s.add_modifier.contains(Modifier::ITALIC | Modifier::DIM));
        assert!(!s.add_modifier.contains(Modifier::BOLD));
    }
}
