//! Plane sizing and the infinite-wrap track.
//!
//! Planes live on a virtual horizontal track in world units.  Each plane
//! has a fixed nominal slot (`index × item_width`) and a wrap offset
//! (`extra`) that jumps by one full track length whenever the plane leaves
//! the viewport on the trailing side, so a finite set of planes appears
//! to repeat forever.

use super::bend::BendArc;
use super::scroll::Direction;

/// Screen size in pixels.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Screen {
    pub width: f64,
    pub height: f64,
}

/// Visible world-space extent at the plane depth.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Viewport {
    pub width: f64,
    pub height: f64,
}

/// Perspective camera looking down −z at the track.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Camera {
    pub fov_degrees: f64,
    pub distance: f64,
}

impl Default for Camera {
    fn default() -> Self {
        Self {
            fov_degrees: 45.0,
            distance: 20.0,
        }
    }
}

impl Camera {
    /// World extent visible at z = 0 for a screen of the given aspect.
    pub fn viewport(&self, screen: Screen) -> Viewport {
        let fov = self.fov_degrees.to_radians();
        let height = 2.0 * (fov / 2.0).tan() * self.distance;
        let aspect = if screen.height > 0.0 {
            screen.width / screen.height
        } else {
            1.0
        };
        Viewport {
            width: height * aspect,
            height,
        }
    }
}

/// Portrait 3∶4 (width∶height).
pub const PLANE_ASPECT: f64 = 3.0 / 4.0;

/// Screen-size driven sizing rules.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Sizing {
    /// Screens narrower than this (pixels) use the compact sizes.
    pub compact_breakpoint: f64,
    /// Plane height in reference pixels at a 1500 px tall screen.
    pub base_size: f64,
    pub compact_base_size: f64,
    /// Gap between planes, world units.
    pub padding: f64,
    pub compact_padding: f64,
}

impl Default for Sizing {
    fn default() -> Self {
        Self {
            compact_breakpoint: 768.0,
            base_size: 700.0,
            compact_base_size: 400.0,
            padding: 1.8,
            compact_padding: 1.2,
        }
    }
}

impl Sizing {
    pub fn is_compact(&self, screen: Screen) -> bool {
        screen.width < self.compact_breakpoint
    }

    pub fn metrics(&self, screen: Screen, viewport: Viewport) -> PlaneMetrics {
        if screen.height <= 0.0 {
            return PlaneMetrics {
                width: 0.0,
                height: 0.0,
                padding: 0.0,
            };
        }
        let compact = self.is_compact(screen);
        let scale = screen.height / 1500.0;
        let base = if compact {
            self.compact_base_size
        } else {
            self.base_size
        };
        let height = viewport.height * (base * scale) / screen.height;
        PlaneMetrics {
            width: height * PLANE_ASPECT,
            height,
            padding: if compact {
                self.compact_padding
            } else {
                self.padding
            },
        }
    }
}

/// World size of one plane plus the gap to its neighbour.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PlaneMetrics {
    pub width: f64,
    pub height: f64,
    pub padding: f64,
}

impl PlaneMetrics {
    /// Track distance between neighbouring plane centres.
    pub fn item_width(&self) -> f64 {
        self.width + self.padding
    }
}

/// Per-plane layout state.
#[derive(Debug, Clone, PartialEq)]
pub struct PlaneLayout {
    pub index: usize,
    /// Nominal slot on the track.
    pub base_x: f64,
    /// Wrap offset; only ever changes by ± the track length.
    pub extra: f64,
    /// Effective centre x after scroll and wrap.
    pub x: f64,
    /// Centre y after bending.
    pub y: f64,
    pub rotation: f64,
    pub is_before: bool,
    pub is_after: bool,
}

impl PlaneLayout {
    fn new(index: usize, item_width: f64) -> Self {
        Self {
            index,
            base_x: item_width * index as f64,
            extra: 0.0,
            x: 0.0,
            y: 0.0,
            rotation: 0.0,
            is_before: false,
            is_after: false,
        }
    }
}

/// The ring of planes.
#[derive(Debug, Clone)]
pub struct Track {
    planes: Vec<PlaneLayout>,
    metrics: PlaneMetrics,
    viewport: Viewport,
    /// Last non-zero item width.  Scroll offsets stay in this scale while
    /// the stage is collapsed.
    reference_width: f64,
}

impl Track {
    pub fn new(count: usize, metrics: PlaneMetrics, viewport: Viewport) -> Self {
        let item_width = metrics.item_width();
        let mut track = Self {
            planes: (0..count).map(|i| PlaneLayout::new(i, item_width)).collect(),
            metrics,
            viewport,
            reference_width: item_width,
        };
        track.place(0.0, None);
        track
    }

    pub fn planes(&self) -> &[PlaneLayout] {
        &self.planes
    }

    pub fn metrics(&self) -> PlaneMetrics {
        self.metrics
    }

    pub fn viewport(&self) -> Viewport {
        self.viewport
    }

    pub fn item_width(&self) -> f64 {
        self.metrics.item_width()
    }

    /// Length of one full lap.
    pub fn total_width(&self) -> f64 {
        self.item_width() * self.planes.len() as f64
    }

    /// Apply new metrics.  Returns the factor by which scroll offsets must
    /// be multiplied to keep the same item in view.
    ///
    /// A zero item width (collapsed stage) leaves offsets untouched; the
    /// next non-zero width rescales from the last one seen.
    pub fn resize(&mut self, metrics: PlaneMetrics, viewport: Viewport) -> f64 {
        let new = metrics.item_width();
        let ratio = if new > 0.0 && self.reference_width > 0.0 {
            new / self.reference_width
        } else {
            1.0
        };
        if new > 0.0 {
            self.reference_width = new;
        }

        self.metrics = metrics;
        self.viewport = viewport;
        for plane in &mut self.planes {
            plane.base_x = new * plane.index as f64;
            plane.extra *= ratio;
        }
        ratio
    }

    /// Position every plane for scroll offset `current`, then wrap any
    /// plane that has fully left the viewport on the trailing side.
    pub fn update(&mut self, current: f64, direction: Direction, arc: &BendArc) {
        self.place(current, Some(direction));
        self.bend(arc);
    }

    /// Re-derive positions without wrapping (after a resize or bend change).
    pub fn reposition(&mut self, current: f64, arc: &BendArc) {
        self.place(current, None);
        self.bend(arc);
    }

    fn bend(&mut self, arc: &BendArc) {
        for plane in &mut self.planes {
            let pose = arc.pose(plane.x);
            plane.y = pose.y();
            plane.rotation = pose.rotation;
        }
    }

    fn place(&mut self, current: f64, direction: Option<Direction>) {
        let total = self.total_width();
        let half_plane = self.metrics.width / 2.0;
        let half_view = self.viewport.width / 2.0;

        for plane in &mut self.planes {
            plane.x = plane.base_x - current - plane.extra;
            plane.is_before = plane.x + half_plane < -half_view;
            plane.is_after = plane.x - half_plane > half_view;

            match direction {
                Some(Direction::Right) if plane.is_before => {
                    plane.extra -= total;
                    plane.is_before = false;
                    plane.is_after = false;
                }
                Some(Direction::Left) if plane.is_after => {
                    plane.extra += total;
                    plane.is_before = false;
                    plane.is_after = false;
                }
                _ => {}
            }
        }
    }

    /// Index of the plane whose effective position is nearest the centre.
    pub fn centred_index(&self) -> Option<usize> {
        self.planes
            .iter()
            .min_by(|a, b| a.x.abs().total_cmp(&b.x.abs()))
            .map(|p| p.index)
    }
}
