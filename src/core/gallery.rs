//! The circular gallery: one owned state struct driven by `tick(dt)`.
//!
//! Input handlers only move the scroll target; `tick` eases toward it,
//! lays the planes out on the wrapping track and bends them along the arc.
//! Image loads happen elsewhere and report back through [`Gallery::apply_load`].

use std::time::Duration;

use super::bend::BendArc;
use super::item::{GalleryItem, ImageSource};
use super::layout::{Camera, PlaneLayout, PlaneMetrics, Screen, Sizing, Track, Viewport};
use super::loader::{CancelToken, LoadError, LoadState};
use super::scroll::{ScrollController, ScrollTuning};
use super::texture::{Texture, TextureSpec};

/// Texture width used when none is configured.
pub const DEFAULT_TEXTURE_WIDTH: u32 = 1536;
pub const COMPACT_TEXTURE_WIDTH: u32 = 768;

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum GalleryError {
    #[error("a gallery needs at least one item")]
    NoItems,
    #[error("item {index} is out of range (gallery has {len} items)")]
    IndexOutOfRange { index: usize, len: usize },
}

/// Construction parameters.
#[derive(Debug, Clone, PartialEq)]
pub struct GalleryConfig {
    /// Arc sagitta in world units; 0 lays the planes out flat.
    pub bend: f64,
    pub text_color: String,
    /// Corner radius, `0..=1` of the plane half-size.
    pub border_radius: f64,
    /// CSS-style font shorthand for captions, e.g. `"bold 30px Figtree"`.
    pub font: String,
    pub scroll: ScrollTuning,
    pub compact_scroll: ScrollTuning,
    pub sizing: Sizing,
    pub camera: Camera,
    /// Overrides the screen-dependent texture width.
    pub texture_width: Option<u32>,
}

impl Default for GalleryConfig {
    fn default() -> Self {
        Self {
            bend: 3.0,
            text_color: "#ffffff".to_string(),
            border_radius: 0.05,
            font: "bold 30px Figtree".to_string(),
            scroll: ScrollTuning::default(),
            compact_scroll: ScrollTuning::compact(),
            sizing: Sizing::default(),
            camera: Camera::default(),
            texture_width: None,
        }
    }
}

/// Programmatic navigation, handed to [`Gallery::on_initialized`] callbacks.
pub trait GalleryControls {
    /// Advance the target by one item.
    fn next(&mut self);
    /// Retreat the target by one item.
    fn prev(&mut self);
    /// Jump the target to `index × item_width`.
    fn go_to(&mut self, index: usize) -> Result<(), GalleryError>;
}

/// Load-side state of one plane.
#[derive(Debug, Clone)]
pub struct PlaneSlot {
    pub item: GalleryItem,
    pub load: LoadState,
    pub texture: Option<Texture>,
    token: CancelToken,
}

/// Work order for one image load.
#[derive(Debug, Clone)]
pub struct LoadRequest {
    pub index: usize,
    pub source: ImageSource,
    pub spec: TextureSpec,
    pub token: CancelToken,
}

/// Result of a load, sent back to the gallery.
#[derive(Debug)]
pub struct LoadOutcome {
    pub index: usize,
    pub token: CancelToken,
    pub result: Result<Texture, LoadError>,
}

#[derive(Debug)]
pub struct Gallery {
    slots: Vec<PlaneSlot>,
    track: Track,
    controller: ScrollController,
    arc: BendArc,
    config: GalleryConfig,
    compact: bool,
}

impl Gallery {
    /// Build a gallery sized for `screen`.
    pub fn new(
        items: Vec<GalleryItem>,
        config: GalleryConfig,
        screen: Screen,
    ) -> Result<Self, GalleryError> {
        let viewport = config.camera.viewport(screen);
        let metrics = config.sizing.metrics(screen, viewport);
        let compact = config.sizing.is_compact(screen);
        Self::with_layout(items, config, metrics, viewport, compact)
    }

    /// Build a gallery with explicit plane metrics and viewport.
    pub fn with_layout(
        items: Vec<GalleryItem>,
        config: GalleryConfig,
        metrics: PlaneMetrics,
        viewport: Viewport,
        compact: bool,
    ) -> Result<Self, GalleryError> {
        if items.is_empty() {
            return Err(GalleryError::NoItems);
        }
        let tuning = if compact {
            config.compact_scroll
        } else {
            config.scroll
        };
        let slots = items
            .into_iter()
            .map(|item| PlaneSlot {
                item,
                load: LoadState::Unloaded,
                texture: None,
                token: CancelToken::new(),
            })
            .collect::<Vec<_>>();

        let track = Track::new(slots.len(), metrics, viewport);
        let arc = BendArc::new(config.bend, viewport.width / 2.0);
        let mut gallery = Self {
            slots,
            track,
            controller: ScrollController::new(tuning),
            arc,
            config,
            compact,
        };
        gallery.track.reposition(0.0, &gallery.arc);
        tracing::debug!(
            planes = gallery.slots.len(),
            item_width = gallery.item_width(),
            compact,
            "gallery initialised"
        );
        Ok(gallery)
    }

    /// Run `f` once against the live control surface.
    pub fn on_initialized(&mut self, f: impl FnOnce(&mut dyn GalleryControls)) {
        f(self);
    }

    // ── accessors ───────────────────────────────────────────────

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn config(&self) -> &GalleryConfig {
        &self.config
    }

    pub fn slots(&self) -> &[PlaneSlot] {
        &self.slots
    }

    pub fn layouts(&self) -> &[PlaneLayout] {
        self.track.planes()
    }

    pub fn metrics(&self) -> PlaneMetrics {
        self.track.metrics()
    }

    pub fn viewport(&self) -> Viewport {
        self.track.viewport()
    }

    pub fn item_width(&self) -> f64 {
        self.track.item_width()
    }

    pub fn is_dragging(&self) -> bool {
        self.controller.is_dragging()
    }

    /// True while the scroll is still easing or input is active.
    pub fn is_animating(&self) -> bool {
        self.controller.is_dragging()
            || self.controller.has_pending_snap()
            || !self.controller.scroll.is_settled()
    }

    /// Plane currently nearest the centre.
    pub fn centred_index(&self) -> Option<usize> {
        self.track.centred_index()
    }

    /// Number of planes not yet ready.
    pub fn pending_loads(&self) -> usize {
        self.slots.iter().filter(|s| !s.load.is_ready()).count()
    }

    pub fn texture_spec(&self) -> TextureSpec {
        let width = self.config.texture_width.unwrap_or(if self.compact {
            COMPACT_TEXTURE_WIDTH
        } else {
            DEFAULT_TEXTURE_WIDTH
        });
        TextureSpec::new(width, self.config.border_radius)
    }

    // ── frame ───────────────────────────────────────────────────

    /// Advance by `dt`.  Returns `true` when planes moved.
    pub fn tick(&mut self, dt: Duration) -> bool {
        let width = self.track.item_width();
        match self.controller.advance(dt, width) {
            Some(direction) => {
                let current = self.controller.scroll.current;
                self.track.update(current, direction, &self.arc);
                true
            }
            None => false,
        }
    }

    /// Recompute sizes for a new screen.  Scroll offsets are rescaled so
    /// the same item stays centred.
    pub fn resize(&mut self, screen: Screen) {
        let viewport = self.config.camera.viewport(screen);
        let metrics = self.config.sizing.metrics(screen, viewport);
        self.compact = self.config.sizing.is_compact(screen);
        self.controller.set_tuning(if self.compact {
            self.config.compact_scroll
        } else {
            self.config.scroll
        });

        let ratio = self.track.resize(metrics, viewport);
        self.controller.scroll.rescale(ratio);
        self.arc = BendArc::new(self.config.bend, viewport.width / 2.0);
        self.track
            .reposition(self.controller.scroll.current, &self.arc);
        tracing::debug!(width = screen.width, height = screen.height, ratio, "gallery resized");
    }

    pub fn set_bend(&mut self, bend: f64) {
        self.config.bend = if bend.is_finite() { bend } else { 0.0 };
        self.arc = BendArc::new(self.config.bend, self.track.viewport().width / 2.0);
        self.track
            .reposition(self.controller.scroll.current, &self.arc);
    }

    // ── input ───────────────────────────────────────────────────

    pub fn pointer_down(&mut self, x: f64) {
        self.controller.pointer_down(x);
    }

    pub fn pointer_move(&mut self, x: f64) {
        self.controller.pointer_move(x);
    }

    pub fn pointer_up(&mut self) {
        let width = self.track.item_width();
        self.controller.pointer_up(width);
    }

    pub fn wheel(&mut self, delta_y: f64) {
        self.controller.wheel(delta_y);
    }

    // ── loading ─────────────────────────────────────────────────

    /// Move every unloaded plane to `Loading` and return the work orders.
    pub fn begin_loads(&mut self) -> Vec<LoadRequest> {
        let spec = self.texture_spec();
        self.slots
            .iter_mut()
            .enumerate()
            .filter(|(_, slot)| slot.load == LoadState::Unloaded)
            .map(|(index, slot)| {
                slot.load = LoadState::Loading;
                LoadRequest {
                    index,
                    source: slot.item.image.clone(),
                    spec,
                    token: slot.token.clone(),
                }
            })
            .collect()
    }

    /// Apply a finished load.  Returns `false` (and changes nothing) for
    /// cancelled, stale or duplicate outcomes.
    pub fn apply_load(&mut self, outcome: LoadOutcome) -> bool {
        let Some(slot) = self.slots.get_mut(outcome.index) else {
            return false;
        };
        if outcome.token.is_cancelled()
            || !slot.token.same_as(&outcome.token)
            || slot.load != LoadState::Loading
        {
            return false;
        }

        match outcome.result {
            Ok(texture) => {
                slot.load = if texture.is_placeholder() {
                    LoadState::PlaceholderShown
                } else {
                    LoadState::Loaded
                };
                tracing::debug!(index = outcome.index, state = ?slot.load, "plane ready");
                slot.texture = Some(texture);
                true
            }
            Err(e) => {
                tracing::debug!(index = outcome.index, error = %e, "load dropped");
                false
            }
        }
    }

    /// Cancel every in-flight load.  Called on drop.
    pub fn cancel_loads(&self) {
        for slot in &self.slots {
            slot.token.cancel();
        }
    }
}

#[cfg(test)]
impl Gallery {
    pub fn scroll(&self) -> &super::scroll::ScrollState {
        &self.controller.scroll
    }

    pub fn is_compact(&self) -> bool {
        self.compact
    }
}

impl GalleryControls for Gallery {
    fn next(&mut self) {
        let width = self.track.item_width();
        if width <= 0.0 {
            return;
        }
        self.controller.scroll.target += width;
        self.controller.scroll.snap(width);
    }

    fn prev(&mut self) {
        let width = self.track.item_width();
        if width <= 0.0 {
            return;
        }
        self.controller.scroll.target -= width;
        self.controller.scroll.snap(width);
    }

    fn go_to(&mut self, index: usize) -> Result<(), GalleryError> {
        if index >= self.slots.len() {
            return Err(GalleryError::IndexOutOfRange {
                index,
                len: self.slots.len(),
            });
        }
        let width = self.track.item_width();
        self.controller.scroll.target = width * index as f64;
        self.controller.scroll.snap(width);
        Ok(())
    }
}

impl Drop for Gallery {
    fn drop(&mut self) {
        self.cancel_loads();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::loader::placeholder_texture;
    use crate::core::texture::TextureKind;
    use std::sync::Arc;

    const FRAME: Duration = Duration::from_millis(16);

    fn items(n: usize) -> Vec<GalleryItem> {
        (0..n)
            .map(|i| GalleryItem::new(ImageSource::Path(format!("{i}.png").into()), format!("#{i}")))
            .collect()
    }

    /// 8 items, 200 wide including padding, 800 wide viewport, bend 3.
    fn scenario() -> Gallery {
        Gallery::with_layout(
            items(8),
            GalleryConfig::default(),
            PlaneMetrics {
                width: 150.0,
                height: 200.0,
                padding: 50.0,
            },
            Viewport {
                width: 800.0,
                height: 400.0,
            },
            false,
        )
        .unwrap()
    }

    fn settle(g: &mut Gallery) {
        for _ in 0..2000 {
            g.tick(FRAME);
        }
    }

    #[test]
    fn empty_gallery_is_rejected() {
        let err = Gallery::with_layout(
            Vec::new(),
            GalleryConfig::default(),
            PlaneMetrics {
                width: 1.0,
                height: 1.0,
                padding: 0.0,
            },
            Viewport {
                width: 1.0,
                height: 1.0,
            },
            false,
        )
        .unwrap_err();
        assert_eq!(err, GalleryError::NoItems);
    }

    #[test]
    fn three_nexts_centre_the_fourth_plane() {
        let mut g = scenario();
        assert_eq!(g.scroll().target, 0.0);
        g.next();
        g.next();
        g.next();
        assert_eq!(g.scroll().target, 600.0);

        settle(&mut g);
        assert!((g.scroll().current - 600.0).abs() < 1e-3);

        let plane = &g.layouts()[3];
        assert!(plane.x.abs() < 1e-3);
        assert!(plane.y.abs() < 1e-6);
        assert_eq!(g.centred_index(), Some(3));
    }

    #[test]
    fn next_then_prev_restores_target() {
        let mut g = scenario();
        g.go_to(5).unwrap();
        let before = g.scroll().target;
        g.next();
        g.prev();
        assert_eq!(g.scroll().target, before);

        g.prev();
        g.next();
        assert_eq!(g.scroll().target, before);
    }

    #[test]
    fn go_to_is_absolute() {
        let mut g = scenario();
        g.wheel(1234.0);
        for _ in 0..10 {
            g.tick(FRAME);
        }
        g.go_to(2).unwrap();
        assert_eq!(g.scroll().target, 400.0);
        g.go_to(0).unwrap();
        assert_eq!(g.scroll().target, 0.0);
    }

    #[test]
    fn go_to_rejects_out_of_range() {
        let mut g = scenario();
        g.next();
        assert_eq!(
            g.go_to(8),
            Err(GalleryError::IndexOutOfRange { index: 8, len: 8 })
        );
        assert_eq!(g.scroll().target, 200.0);
    }

    #[test]
    fn on_initialized_exposes_controls() {
        let mut g = scenario();
        g.on_initialized(|controls| {
            controls.go_to(4).unwrap();
            controls.next();
        });
        assert_eq!(g.scroll().target, 1000.0);
    }

    #[test]
    fn drag_release_snaps_to_an_item() {
        let mut g = scenario();
        g.pointer_down(1000.0);
        // 0.05 world units per pixel: 5000 px → 250 units.
        g.pointer_move(-4000.0);
        assert!(g.is_dragging());
        g.tick(FRAME);
        g.pointer_up();
        assert_eq!(g.scroll().target, 200.0);
    }

    #[test]
    fn wheel_snaps_after_debounce() {
        let mut g = scenario();
        // 0.008 per pixel: 17500 px → 140 units, nearest item 200.
        g.wheel(17_500.0);
        g.tick(Duration::from_millis(50));
        assert!((g.scroll().target - 140.0).abs() < 1e-9);
        g.tick(Duration::from_millis(60));
        assert_eq!(g.scroll().target, 200.0);
    }

    #[test]
    fn tick_is_idle_at_rest() {
        let mut g = scenario();
        assert!(!g.tick(FRAME));
        assert!(!g.is_animating());
        g.next();
        assert!(g.is_animating());
        assert!(g.tick(FRAME));
    }

    #[test]
    fn zero_bend_lays_out_flat() {
        let mut g = scenario();
        g.set_bend(0.0);
        g.go_to(2).unwrap();
        for _ in 0..30 {
            g.tick(FRAME);
            assert!(g.layouts().iter().all(|p| p.y == 0.0 && p.rotation == 0.0));
        }
    }

    #[test]
    fn resize_keeps_the_same_item_centred() {
        let screen = Screen {
            width: 1600.0,
            height: 800.0,
        };
        let mut g = Gallery::new(items(6), GalleryConfig::default(), screen).unwrap();
        g.go_to(4).unwrap();
        settle(&mut g);
        assert_eq!(g.centred_index(), Some(4));

        g.resize(Screen {
            width: 700.0,
            height: 900.0,
        });
        assert!(g.is_compact());
        assert_eq!(g.centred_index(), Some(4));
        let target = g.scroll().target;
        assert!((target - 4.0 * g.item_width()).abs() < 1e-9);
    }

    #[test]
    fn resize_through_a_collapsed_stage_stays_on_an_item() {
        let mut g = Gallery::new(
            items(6),
            GalleryConfig::default(),
            Screen {
                width: 1600.0,
                height: 800.0,
            },
        )
        .unwrap();
        g.go_to(4).unwrap();
        settle(&mut g);

        g.resize(Screen {
            width: 1600.0,
            height: 0.0,
        });
        assert_eq!(g.item_width(), 0.0);
        g.tick(FRAME);

        g.resize(Screen {
            width: 600.0,
            height: 400.0,
        });
        let w = g.item_width();
        assert!(w > 0.0);
        assert!((g.scroll().target - 4.0 * w).abs() < 1e-9);
        settle(&mut g);
        assert_eq!(g.centred_index(), Some(4));
    }

    #[test]
    fn compact_screens_use_compact_textures() {
        let g = Gallery::new(
            items(2),
            GalleryConfig::default(),
            Screen {
                width: 500.0,
                height: 800.0,
            },
        )
        .unwrap();
        assert_eq!(g.texture_spec().width, COMPACT_TEXTURE_WIDTH);
        assert_eq!(g.texture_spec().border_radius, 0.05);
    }

    #[test]
    fn load_state_machine() {
        let mut g = scenario();
        let requests = g.begin_loads();
        assert_eq!(requests.len(), 8);
        assert!(g.slots().iter().all(|s| s.load == LoadState::Loading));
        // A second call issues nothing new.
        assert!(g.begin_loads().is_empty());

        let spec = TextureSpec::new(6, 0.0);
        let image = Texture {
            pixels: Arc::new(image::RgbaImage::new(6, 8)),
            kind: TextureKind::Image,
        };
        assert!(g.apply_load(LoadOutcome {
            index: 0,
            token: requests[0].token.clone(),
            result: Ok(image),
        }));
        assert!(g.apply_load(LoadOutcome {
            index: 1,
            token: requests[1].token.clone(),
            result: Ok(placeholder_texture(spec)),
        }));
        assert_eq!(g.slots()[0].load, LoadState::Loaded);
        assert_eq!(g.slots()[1].load, LoadState::PlaceholderShown);
        assert_eq!(g.pending_loads(), 6);

        // Terminal states never go back.
        assert!(!g.apply_load(LoadOutcome {
            index: 1,
            token: requests[1].token.clone(),
            result: Ok(placeholder_texture(spec)),
        }));
        assert_eq!(g.slots()[1].load, LoadState::PlaceholderShown);
    }

    #[test]
    fn foreign_or_cancelled_tokens_are_ignored() {
        let mut g = scenario();
        let requests = g.begin_loads();
        let spec = TextureSpec::new(6, 0.0);

        assert!(!g.apply_load(LoadOutcome {
            index: 2,
            token: CancelToken::new(),
            result: Ok(placeholder_texture(spec)),
        }));

        requests[3].token.cancel();
        assert!(!g.apply_load(LoadOutcome {
            index: 3,
            token: requests[3].token.clone(),
            result: Ok(placeholder_texture(spec)),
        }));
        assert_eq!(g.slots()[3].load, LoadState::Loading);

        assert!(!g.apply_load(LoadOutcome {
            index: 99,
            token: requests[0].token.clone(),
            result: Ok(placeholder_texture(spec)),
        }));
    }

    #[test]
    fn dropping_the_gallery_cancels_loads() {
        let mut g = scenario();
        let requests = g.begin_loads();
        drop(g);
        assert!(requests.iter().all(|r| r.token.is_cancelled()));
    }
}
