//! Plane textures: 3∶4 center-crop, generated placeholder, rounded corners.
//!
//! Everything here is pure pixel work on `image::RgbaImage`; decoding and
//! threading live in [`super::loader`].

use std::sync::Arc;

use image::{imageops, imageops::FilterType, Rgba, RgbaImage};

/// Width ∶ height of every texture.
pub const TEXTURE_ASPECT: f64 = 3.0 / 4.0;

/// Caption drawn over the placeholder.
pub const PLACEHOLDER_CAPTION: &str = "Image Loading...";

/// Fill behind transparent source pixels.
const BACKGROUND: Rgba<u8> = Rgba([0xf0, 0xf0, 0xf0, 0xff]);

/// Placeholder gradient endpoints (the midpoint stop, #3a3a3a, is their mean).
const GRADIENT_FROM: f64 = 0x2a as f64;
const GRADIENT_TO: f64 = 0x4a as f64;

/// Dot grid on the placeholder.
const DOT_SPACING: u32 = 40;
const DOT_SIZE: u32 = 2;
const DOT_ALPHA: f64 = 0.1;

/// Half-width of the anti-aliased edge of the rounded-rect mask, in
/// normalised (−1‥1) plane coordinates.
const EDGE_SOFTNESS: f64 = 0.005;

/// Output size and corner rounding for textures.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TextureSpec {
    pub width: u32,
    /// Corner radius in normalised plane units, `0..=1`.
    pub border_radius: f64,
}

impl TextureSpec {
    pub fn new(width: u32, border_radius: f64) -> Self {
        Self {
            width: width.max(1),
            border_radius: if border_radius.is_finite() {
                border_radius.clamp(0.0, 1.0)
            } else {
                0.0
            },
        }
    }

    pub fn height(&self) -> u32 {
        ((self.width as f64 / TEXTURE_ASPECT).round() as u32).max(1)
    }
}

/// What a texture shows.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TextureKind {
    /// The decoded source image.
    Image,
    /// Generated stand-in after a failed load.
    Placeholder { caption: &'static str },
}

/// A ready-to-draw plane texture.
#[derive(Debug, Clone)]
pub struct Texture {
    pub pixels: Arc<RgbaImage>,
    pub kind: TextureKind,
}

impl Texture {
    pub fn is_placeholder(&self) -> bool {
        matches!(self.kind, TextureKind::Placeholder { .. })
    }
}

/// Source region selected by the center crop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CropRect {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

/// Largest centred region of a `src_w × src_h` image with the given aspect.
/// The longer dimension is trimmed symmetrically.
pub fn crop_rect(src_w: u32, src_h: u32, aspect: f64) -> CropRect {
    let (w, h) = (src_w as f64, src_h as f64);
    if src_w == 0 || src_h == 0 {
        return CropRect {
            x: 0,
            y: 0,
            width: src_w,
            height: src_h,
        };
    }

    let image_aspect = w / h;
    let (mut sx, mut sy, mut sw, mut sh) = (0.0, 0.0, w, h);
    if image_aspect > aspect {
        sw = h * aspect;
        sx = (w - sw) / 2.0;
    } else if image_aspect < aspect {
        sh = w / aspect;
        sy = (h - sh) / 2.0;
    }

    let width = (sw.round() as u32).clamp(1, src_w);
    let height = (sh.round() as u32).clamp(1, src_h);
    CropRect {
        x: (sx.round() as u32).min(src_w - width),
        y: (sy.round() as u32).min(src_h - height),
        width,
        height,
    }
}

/// Center-crop `source` to 3∶4, scale it to `spec`, flatten onto the
/// neutral background and round the corners.
pub fn center_crop(source: &RgbaImage, spec: TextureSpec) -> RgbaImage {
    let (w, h) = (spec.width, spec.height());
    let mut canvas = RgbaImage::from_pixel(w, h, BACKGROUND);

    if source.width() > 0 && source.height() > 0 {
        let rect = crop_rect(source.width(), source.height(), TEXTURE_ASPECT);
        let cropped = imageops::crop_imm(source, rect.x, rect.y, rect.width, rect.height).to_image();
        let scaled = imageops::resize(&cropped, w, h, FilterType::Triangle);
        imageops::overlay(&mut canvas, &scaled, 0, 0);
    }

    round_corners(&mut canvas, spec.border_radius);
    canvas
}

/// Gradient-and-dots stand-in image.  The caption is carried by
/// [`TextureKind::Placeholder`] and drawn by the front-end.
pub fn placeholder(spec: TextureSpec) -> RgbaImage {
    let (w, h) = (spec.width, spec.height());
    let (fw, fh) = (w as f64, h as f64);
    let denom = (fw * fw + fh * fh).max(1.0);

    let mut canvas = RgbaImage::from_fn(w, h, |x, y| {
        let t = ((x as f64 * fw + y as f64 * fh) / denom).clamp(0.0, 1.0);
        let mut v = GRADIENT_FROM + (GRADIENT_TO - GRADIENT_FROM) * t;
        if x % DOT_SPACING < DOT_SIZE && y % DOT_SPACING < DOT_SIZE {
            v = v * (1.0 - DOT_ALPHA) + 255.0 * DOT_ALPHA;
        }
        let v = v.round() as u8;
        Rgba([v, v, v, 0xff])
    });

    round_corners(&mut canvas, spec.border_radius);
    canvas
}

/// Multiply alpha by a rounded-rectangle mask.  `radius` is in normalised
/// plane coordinates where the plane spans −1‥1 on both axes.
pub fn round_corners(img: &mut RgbaImage, radius: f64) {
    if radius <= 0.0 {
        return;
    }
    let (w, h) = (img.width() as f64, img.height() as f64);
    for (x, y, px) in img.enumerate_pixels_mut() {
        let cx = (x as f64 + 0.5) / w * 2.0 - 1.0;
        let cy = (y as f64 + 0.5) / h * 2.0 - 1.0;
        let d = rounded_rect_sdf(cx, cy, 1.0, radius);
        let coverage = 1.0 - smoothstep(-EDGE_SOFTNESS, EDGE_SOFTNESS, d);
        px[3] = (px[3] as f64 * coverage).round() as u8;
    }
}

/// Signed distance to a rounded square of half-extent `size`.
fn rounded_rect_sdf(px: f64, py: f64, size: f64, radius: f64) -> f64 {
    let qx = px.abs() - size + radius;
    let qy = py.abs() - size + radius;
    let outside = (qx.max(0.0).powi(2) + qy.max(0.0).powi(2)).sqrt();
    qx.max(qy).min(0.0) + outside - radius
}

fn smoothstep(edge0: f64, edge1: f64, x: f64) -> f64 {
    let t = ((x - edge0) / (edge1 - edge0)).clamp(0.0, 1.0);
    t * t * (3.0 - 2.0 * t)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wide_source_is_trimmed_horizontally() {
        let r = crop_rect(400, 300, TEXTURE_ASPECT);
        assert_eq!(r.width, 225);
        assert_eq!(r.height, 300);
        assert_eq!(r.x, 88); // 87.5 rounds away from zero
        assert_eq!(r.y, 0);
    }

    #[test]
    fn tall_source_is_trimmed_vertically() {
        let r = crop_rect(300, 800, TEXTURE_ASPECT);
        assert_eq!(
            r,
            CropRect {
                x: 0,
                y: 200,
                width: 300,
                height: 400
            }
        );
    }

    #[test]
    fn exact_aspect_is_untouched() {
        let r = crop_rect(600, 800, TEXTURE_ASPECT);
        assert_eq!(
            r,
            CropRect {
                x: 0,
                y: 0,
                width: 600,
                height: 800
            }
        );
    }

    #[test]
    fn spec_height_keeps_three_by_four() {
        assert_eq!(TextureSpec::new(1536, 0.0).height(), 2048);
        assert_eq!(TextureSpec::new(768, 0.0).height(), 1024);
        assert_eq!(TextureSpec::new(0, 0.0).width, 1);
        assert_eq!(TextureSpec::new(10, 7.0).border_radius, 1.0);
    }

    #[test]
    fn center_crop_keeps_the_middle() {
        // Red | green | red stripes; the 3:4 crop of a 4:3 image keeps
        // only the green middle.
        let src = RgbaImage::from_fn(400, 300, |x, _| {
            if (88..313).contains(&x) {
                Rgba([0, 255, 0, 255])
            } else {
                Rgba([255, 0, 0, 255])
            }
        });
        let out = center_crop(&src, TextureSpec::new(30, 0.0));
        assert_eq!(out.dimensions(), (30, 40));
        for (_, _, px) in out.enumerate_pixels() {
            assert_eq!(px[1], 255);
            assert!(px[0] < 16, "red bled in: {px:?}");
        }
    }

    #[test]
    fn transparent_source_shows_background() {
        let src = RgbaImage::from_pixel(30, 40, Rgba([0, 0, 0, 0]));
        let out = center_crop(&src, TextureSpec::new(30, 0.0));
        assert_eq!(*out.get_pixel(15, 20), BACKGROUND);
    }

    #[test]
    fn placeholder_has_gradient_and_dots() {
        let img = placeholder(TextureSpec::new(120, 0.0));
        assert_eq!(img.dimensions(), (120, 160));

        let top_left = img.get_pixel(5, 5)[0];
        let bottom_right = img.get_pixel(115, 155)[0];
        assert!(top_left < bottom_right);
        assert!(top_left >= 0x2a && bottom_right <= 0x4a);

        // Dot at (40, 40) is lighter than the pixel beside it.
        assert!(img.get_pixel(40, 40)[0] > img.get_pixel(43, 40)[0]);
    }

    #[test]
    fn rounded_corners_clear_the_corners_only() {
        let mut img = RgbaImage::from_pixel(60, 80, Rgba([10, 20, 30, 255]));
        round_corners(&mut img, 0.3);
        assert_eq!(img.get_pixel(0, 0)[3], 0);
        assert_eq!(img.get_pixel(59, 79)[3], 0);
        assert_eq!(img.get_pixel(30, 40)[3], 255);
        assert_eq!(img.get_pixel(30, 1)[3], 255);
    }

    #[test]
    fn zero_radius_leaves_alpha_alone() {
        let mut img = RgbaImage::from_pixel(8, 8, Rgba([1, 2, 3, 200]));
        round_corners(&mut img, 0.0);
        assert!(img.pixels().all(|p| p[3] == 200));
    }
}
