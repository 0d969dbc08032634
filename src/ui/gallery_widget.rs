//! The gallery stage: planes composited into a half-block framebuffer.
//!
//! Each terminal cell holds two vertically stacked pixels (`▀` with
//! foreground = top, background = bottom), so a cell is one pixel wide and
//! two tall.  Planes are drawn back-to-front by inverse-rotating every
//! framebuffer pixel into texture space, which keeps the arc rotation
//! visible even at terminal resolution.

use std::collections::HashMap;
use std::sync::Arc;

use image::{imageops, imageops::FilterType, RgbaImage};
use ratatui::{
    buffer::Buffer,
    layout::{Position, Rect},
    style::{Color, Style},
    widgets::{StatefulWidget, Widget},
};

use crate::core::gallery::Gallery;
use crate::core::layout::Screen;
use crate::core::loader::LoadState;
use crate::core::texture::TextureKind;

use super::spinner::LoadingSpinner;
use super::theme::Theme;

/// Virtual pixels per terminal cell.  Input and sizing treat the
/// terminal as a screen of `cols × 8` by `rows × 16` pixels.
pub const CELL_PX_W: f64 = 8.0;
pub const CELL_PX_H: f64 = 16.0;

/// Largest thumbnail edge kept in the cache.
const MAX_THUMB_EDGE: u32 = 1024;

/// Virtual screen size of a terminal area.
pub fn screen_for(area: Rect) -> Screen {
    Screen {
        width: area.width as f64 * CELL_PX_W,
        height: area.height as f64 * CELL_PX_H,
    }
}

// ───────────────────────────────────────── thumbnails ────────

struct Thumb {
    source: Arc<RgbaImage>,
    image: RgbaImage,
}

/// Textures scaled down to on-screen plane size, keyed by plane index.
#[derive(Default)]
pub struct ThumbCache {
    entries: HashMap<usize, Thumb>,
}

impl ThumbCache {
    pub fn clear(&mut self) {
        self.entries.clear();
    }

    fn get(&mut self, index: usize, source: &Arc<RgbaImage>, width: u32, height: u32) -> &RgbaImage {
        let width = width.clamp(1, MAX_THUMB_EDGE);
        let height = height.clamp(1, MAX_THUMB_EDGE);
        let stale = self.entries.get(&index).is_none_or(|t| {
            !Arc::ptr_eq(&t.source, source) || t.image.dimensions() != (width, height)
        });
        if stale {
            let image = imageops::resize(source.as_ref(), width, height, FilterType::Triangle);
            self.entries.insert(
                index,
                Thumb {
                    source: Arc::clone(source),
                    image,
                },
            );
        }
        &self.entries[&index].image
    }
}

// ───────────────────────────────────────── framebuffer ───────

struct Framebuffer {
    width: usize,
    height: usize,
    pixels: Vec<Option<[u8; 3]>>,
}

impl Framebuffer {
    fn new(width: usize, height: usize) -> Self {
        Self {
            width,
            height,
            pixels: vec![None; width * height],
        }
    }

    fn blend(&mut self, x: usize, y: usize, rgb: [u8; 3], alpha: u8) {
        if alpha == 0 || x >= self.width || y >= self.height {
            return;
        }
        let slot = &mut self.pixels[y * self.width + x];
        *slot = match *slot {
            Some(under) => {
                let a = alpha as f64 / 255.0;
                let mix = |top: u8, bottom: u8| (top as f64 * a + bottom as f64 * (1.0 - a)).round() as u8;
                Some([mix(rgb[0], under[0]), mix(rgb[1], under[1]), mix(rgb[2], under[2])])
            }
            // Nothing underneath: half-covered edge pixels either show or don't.
            None if alpha >= 128 => Some(rgb),
            None => None,
        };
    }

    fn get(&self, x: usize, y: usize) -> Option<[u8; 3]> {
        if x < self.width && y < self.height {
            self.pixels[y * self.width + x]
        } else {
            None
        }
    }

    fn flush(&self, area: Rect, buf: &mut Buffer) {
        let rgb = |c: [u8; 3]| Color::Rgb(c[0], c[1], c[2]);
        for row in 0..area.height {
            for col in 0..area.width {
                let top = self.get(col as usize, row as usize * 2);
                let bottom = self.get(col as usize, row as usize * 2 + 1);
                let Some(cell) = buf.cell_mut(Position::new(area.x + col, area.y + row)) else {
                    continue;
                };
                match (top, bottom) {
                    (None, None) => {}
                    (Some(t), b) => {
                        cell.set_char('▀')
                            .set_fg(rgb(t))
                            .set_bg(b.map_or(Color::Reset, rgb));
                    }
                    (None, Some(b)) => {
                        cell.set_char('▄').set_fg(rgb(b)).set_bg(Color::Reset);
                    }
                }
            }
        }
    }
}

/// A plane projected into framebuffer pixels.
#[derive(Debug, Clone, Copy)]
struct Projected {
    index: usize,
    cx: f64,
    cy: f64,
    width: f64,
    height: f64,
    rotation: f64,
}

impl Projected {
    /// Half extents of the rotated bounding box.
    fn half_extents(&self) -> (f64, f64) {
        let (sin, cos) = self.rotation.sin_cos();
        (
            (cos.abs() * self.width + sin.abs() * self.height) / 2.0,
            (sin.abs() * self.width + cos.abs() * self.height) / 2.0,
        )
    }

    /// Plane-local texture coordinates (`0..1`, top-left origin) for a
    /// framebuffer pixel centre, or `None` when outside the plane.
    fn local(&self, px: f64, py: f64) -> Option<(f64, f64)> {
        let dx = px - self.cx;
        // Framebuffer y grows downward, world y upward.
        let wy = self.cy - py;
        let (sin, cos) = self.rotation.sin_cos();
        let u = dx * cos + wy * sin;
        let v = -dx * sin + wy * cos;
        let tx = u / self.width + 0.5;
        let ty = 0.5 - v / self.height;
        ((0.0..1.0).contains(&tx) && (0.0..1.0).contains(&ty)).then_some((tx, ty))
    }

    fn paint(&self, fb: &mut Framebuffer, mut sample: impl FnMut(f64, f64) -> ([u8; 3], u8)) {
        let (hx, hy) = self.half_extents();
        let x0 = (self.cx - hx).floor().max(0.0) as usize;
        let x1 = ((self.cx + hx).ceil().max(0.0) as usize).min(fb.width);
        let y0 = (self.cy - hy).floor().max(0.0) as usize;
        let y1 = ((self.cy + hy).ceil().max(0.0) as usize).min(fb.height);
        for y in y0..y1 {
            for x in x0..x1 {
                if let Some((tx, ty)) = self.local(x as f64 + 0.5, y as f64 + 0.5) {
                    let (rgb, alpha) = sample(tx, ty);
                    fb.blend(x, y, rgb, alpha);
                }
            }
        }
    }

    /// Terminal column and row of the plane centre.
    fn centre_cell(&self, area: Rect) -> (i32, i32) {
        (
            area.x as i32 + self.cx.floor() as i32,
            area.y as i32 + (self.cy / 2.0).floor() as i32,
        )
    }
}

// ───────────────────────────────────────── widget ────────────

/// Renders every visible plane, its caption and any load indicator.
pub struct GalleryWidget<'a> {
    pub gallery: &'a Gallery,
    pub caption_style: Style,
    /// Frame counter driving the spinner.
    pub tick: u64,
}

impl GalleryWidget<'_> {
    fn project(&self, area: Rect) -> Vec<Projected> {
        let viewport = self.gallery.viewport();
        let metrics = self.gallery.metrics();
        let (fw, fh) = (area.width as f64, area.height as f64 * 2.0);
        if viewport.width <= 0.0 || fw <= 0.0 {
            return Vec::new();
        }
        let px_per_unit = fw / viewport.width;
        let half_view = viewport.width / 2.0;

        let mut planes: Vec<Projected> = self
            .gallery
            .layouts()
            .iter()
            .filter(|p| p.x.abs() - metrics.width / 2.0 < half_view)
            .map(|p| Projected {
                index: p.index,
                cx: fw / 2.0 + p.x * px_per_unit,
                cy: fh / 2.0 - p.y * px_per_unit,
                width: metrics.width * px_per_unit,
                height: metrics.height * px_per_unit,
                rotation: p.rotation,
            })
            .collect();
        // Back to front: the plane nearest the centre is drawn last.
        planes.sort_by(|a, b| {
            (b.cx - fw / 2.0)
                .abs()
                .total_cmp(&(a.cx - fw / 2.0).abs())
        });
        planes
    }

    fn draw_overlays(&self, planes: &[Projected], area: Rect, buf: &mut Buffer) {
        let item_cols = planes
            .first()
            .map(|p| p.width * self.gallery.item_width() / self.gallery.metrics().width.max(f64::EPSILON))
            .unwrap_or(0.0);
        let caption_cols = (item_cols.floor() as usize).saturating_sub(1).max(1);
        let plane_cols = |p: &Projected| (p.width.floor() as usize).max(1);

        for plane in planes {
            let slot = &self.gallery.slots()[plane.index];
            let (col, row) = plane.centre_cell(area);

            match (&slot.load, &slot.texture) {
                (LoadState::Loading | LoadState::Unloaded, _) => {
                    let cols = plane_cols(plane) as i32;
                    let x = col - cols / 2;
                    if let Some(rect) = clip(area, x, row, cols, 1) {
                        LoadingSpinner {
                            tick: self.tick,
                            label: None,
                        }
                        .render(rect, buf);
                    }
                }
                (_, Some(texture)) => {
                    if let TextureKind::Placeholder { caption } = &texture.kind {
                        put_centred(buf, area, col, row, caption, plane_cols(plane), Theme::placeholder_caption_style());
                    }
                }
                _ => {}
            }

            let (_, hy) = plane.half_extents();
            let caption_row = area.y as i32 + ((plane.cy + hy) / 2.0).ceil() as i32;
            put_centred(buf, area, col, caption_row, &slot.item.text, caption_cols, self.caption_style);
        }
    }
}

impl StatefulWidget for GalleryWidget<'_> {
    type State = ThumbCache;

    fn render(self, area: Rect, buf: &mut Buffer, cache: &mut ThumbCache) {
        if area.width == 0 || area.height == 0 {
            return;
        }
        let planes = self.project(area);
        let mut fb = Framebuffer::new(area.width as usize, area.height as usize * 2);

        for plane in &planes {
            let slot = &self.gallery.slots()[plane.index];
            match &slot.texture {
                Some(texture) => {
                    let thumb = cache.get(
                        plane.index,
                        &texture.pixels,
                        plane.width.round() as u32,
                        plane.height.round() as u32,
                    );
                    let (tw, th) = (thumb.width() as f64, thumb.height() as f64);
                    plane.paint(&mut fb, |tx, ty| {
                        let x = ((tx * tw) as u32).min(thumb.width() - 1);
                        let y = ((ty * th) as u32).min(thumb.height() - 1);
                        let p = thumb.get_pixel(x, y);
                        ([p[0], p[1], p[2]], p[3])
                    });
                }
                None => plane.paint(&mut fb, |_, _| (Theme::empty_plane_color(), 0xff)),
            }
        }

        fb.flush(area, buf);
        self.draw_overlays(&planes, area, buf);
    }
}

/// Intersect a signed rect with `area`.
fn clip(area: Rect, x: i32, y: i32, width: i32, height: i32) -> Option<Rect> {
    let left = x.max(area.x as i32);
    let top = y.max(area.y as i32);
    let right = (x + width).min(area.right() as i32);
    let bottom = (y + height).min(area.bottom() as i32);
    (right > left && bottom > top).then(|| {
        Rect::new(left as u16, top as u16, (right - left) as u16, (bottom - top) as u16)
    })
}

/// Write `text` centred on column `col`, truncated to `max_cols` with an
/// ellipsis and clipped to `area`.
fn put_centred(buf: &mut Buffer, area: Rect, col: i32, row: i32, text: &str, max_cols: usize, style: Style) {
    if row < area.y as i32 || row >= area.bottom() as i32 {
        return;
    }
    let text = truncate(text, max_cols);
    let len = text.chars().count() as i32;
    let start = col - len / 2;
    for (i, ch) in text.chars().enumerate() {
        let x = start + i as i32;
        if x < area.x as i32 || x >= area.right() as i32 {
            continue;
        }
        if let Some(cell) = buf.cell_mut(Position::new(x as u16, row as u16)) {
            cell.set_char(ch).set_style(style);
        }
    }
}

fn truncate(text: &str, max_cols: usize) -> String {
    if text.chars().count() <= max_cols {
        return text.to_string();
    }
    let mut out: String = text.chars().take(max_cols.saturating_sub(1)).collect();
    out.push('…');
    out
}
