//! Scroll/drag controller with exponential ease-out and snap-to-item.
//!
//! Input only ever moves the *target*.  Each tick `current` chases the
//! target by a fixed fraction of the remaining distance, which gives an
//! asymptotic, overshoot-free approach.  When input stops (pointer release,
//! or a quiet period after wheel input) the target is snapped onto the
//! nearest item boundary so the carousel never rests half-scrolled.

use std::time::Duration;

/// Below this distance between target and current the carousel is at rest.
pub const SETTLE_THRESHOLD: f64 = 0.001;

/// Which way the track moved on the last tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    /// `current` increased: planes travel toward negative x.
    Right,
    /// `current` decreased or stayed put.
    Left,
}

/// Tunables for input → target conversion.  Values are world units per
/// input pixel, so they depend on the viewport scale.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScrollTuning {
    /// Fraction of the remaining distance covered per tick, in `(0, 1)`.
    pub ease: f64,
    pub drag_sensitivity: f64,
    pub wheel_sensitivity: f64,
    /// Quiet period after the last wheel event before snapping.
    pub snap_debounce: Duration,
}

impl Default for ScrollTuning {
    fn default() -> Self {
        Self {
            ease: 0.08,
            drag_sensitivity: 0.05,
            wheel_sensitivity: 0.008,
            snap_debounce: Duration::from_millis(100),
        }
    }
}

impl ScrollTuning {
    /// Tuning used below the compact breakpoint (narrow screens).
    pub fn compact() -> Self {
        Self {
            drag_sensitivity: 0.03,
            wheel_sensitivity: 0.005,
            ..Self::default()
        }
    }
}

/// Scroll offsets along the track.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScrollState {
    pub current: f64,
    pub target: f64,
    /// `current` as of the previous tick.
    pub last: f64,
    ease: f64,
}

impl ScrollState {
    pub fn new(ease: f64) -> Self {
        Self {
            current: 0.0,
            target: 0.0,
            last: 0.0,
            ease: clamp_ease(ease),
        }
    }

    pub fn set_ease(&mut self, ease: f64) {
        self.ease = clamp_ease(ease);
    }

    /// Distance still to travel.
    pub fn remaining(&self) -> f64 {
        self.target - self.current
    }

    pub fn is_settled(&self) -> bool {
        self.remaining().abs() <= SETTLE_THRESHOLD
    }

    /// Move `current` one eased step toward `target` and report which way
    /// it went.
    pub fn step(&mut self) -> Direction {
        self.current += (self.target - self.current) * self.ease;
        let direction = if self.current > self.last {
            Direction::Right
        } else {
            Direction::Left
        };
        self.last = self.current;
        direction
    }

    /// Snap `target` onto the nearest multiple of `item_width`, rounding
    /// symmetrically around zero.
    pub fn snap(&mut self, item_width: f64) {
        if !(item_width > 0.0) {
            return;
        }
        let index = (self.target.abs() / item_width).round();
        let item = item_width * index;
        self.target = if self.target < 0.0 { -item } else { item };
    }

    /// Multiply every offset by `ratio` (used when the item width changes).
    pub fn rescale(&mut self, ratio: f64) {
        self.current *= ratio;
        self.target *= ratio;
        self.last *= ratio;
    }
}

fn clamp_ease(ease: f64) -> f64 {
    if ease.is_finite() {
        ease.clamp(0.01, 0.99)
    } else {
        ScrollTuning::default().ease
    }
}

/// Active pointer/touch drag.
#[derive(Debug, Clone, Copy, PartialEq)]
struct Drag {
    start_x: f64,
    /// `current` when the drag began.
    origin: f64,
}

/// Pointer, touch and wheel handling on top of [`ScrollState`].
#[derive(Debug, Clone)]
pub struct ScrollController {
    pub scroll: ScrollState,
    tuning: ScrollTuning,
    drag: Option<Drag>,
    /// Time left before a debounced wheel snap fires.
    pending_snap: Option<Duration>,
}

impl ScrollController {
    pub fn new(tuning: ScrollTuning) -> Self {
        Self {
            scroll: ScrollState::new(tuning.ease),
            tuning,
            drag: None,
            pending_snap: None,
        }
    }

    pub fn set_tuning(&mut self, tuning: ScrollTuning) {
        self.scroll.set_ease(tuning.ease);
        self.tuning = tuning;
    }

    pub fn is_dragging(&self) -> bool {
        self.drag.is_some()
    }

    pub fn has_pending_snap(&self) -> bool {
        self.pending_snap.is_some()
    }

    /// Pointer or touch pressed at screen x.
    pub fn pointer_down(&mut self, x: f64) {
        self.drag = Some(Drag {
            start_x: x,
            origin: self.scroll.current,
        });
    }

    /// Pointer or touch moved to screen x.  Ignored unless a drag is active.
    pub fn pointer_move(&mut self, x: f64) {
        let Some(drag) = self.drag else {
            return;
        };
        let distance = (drag.start_x - x) * self.tuning.drag_sensitivity;
        self.scroll.target = drag.origin + distance;
    }

    /// Pointer or touch released; snaps immediately.
    pub fn pointer_up(&mut self, item_width: f64) {
        self.drag = None;
        self.scroll.snap(item_width);
    }

    /// Wheel delta (pixels, positive = down/right).  Arms a debounced snap.
    pub fn wheel(&mut self, delta_y: f64) {
        self.scroll.target += delta_y * self.tuning.wheel_sensitivity;
        self.pending_snap = Some(self.tuning.snap_debounce);
    }

    /// Advance timers by `dt` and ease toward the target.
    ///
    /// Returns `None` when the carousel is at rest and nothing moved.
    pub fn advance(&mut self, dt: Duration, item_width: f64) -> Option<Direction> {
        if let Some(remaining) = self.pending_snap {
            match remaining.checked_sub(dt) {
                Some(left) if !left.is_zero() => self.pending_snap = Some(left),
                _ => {
                    self.pending_snap = None;
                    self.scroll.snap(item_width);
                }
            }
        }

        if self.is_dragging() || !self.scroll.is_settled() {
            Some(self.scroll.step())
        } else {
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const FRAME: Duration = Duration::from_millis(16);

    #[test]
    fn easing_is_contractive_without_overshoot() {
        for ease in [0.02, 0.08, 0.5, 0.95] {
            let mut s = ScrollState::new(ease);
            s.target = 600.0;
            let mut prev = s.remaining().abs();
            for _ in 0..200 {
                s.step();
                let now = s.remaining().abs();
                assert!(s.current <= s.target, "overshoot with ease {ease}");
                if prev > 1e-6 {
                    assert!(now < prev, "not contracting with ease {ease}");
                }
                prev = now;
            }
        }
    }

    #[test]
    fn easing_converges_backwards_too() {
        let mut s = ScrollState::new(0.08);
        s.target = -250.0;
        for _ in 0..400 {
            s.step();
            assert!(s.current >= s.target);
        }
        assert!(s.is_settled());
    }

    #[test]
    fn step_reports_direction() {
        let mut s = ScrollState::new(0.5);
        s.target = 10.0;
        assert_eq!(s.step(), Direction::Right);
        assert_eq!(s.current, 5.0);
        assert_eq!(s.last, s.current);

        s.target = 0.0;
        assert_eq!(s.step(), Direction::Left);
    }

    #[test]
    fn snap_rounds_to_nearest_item() {
        let mut s = ScrollState::new(0.08);
        for (target, expected) in [
            (0.0, 0.0),
            (99.0, 0.0),
            (101.0, 200.0),
            (590.0, 600.0),
            (-101.0, -200.0),
            (-299.0, -200.0),
        ] {
            s.target = target;
            s.snap(200.0);
            assert_eq!(s.target, expected, "target {target}");
        }
    }

    #[test]
    fn snap_ignores_degenerate_width() {
        let mut s = ScrollState::new(0.08);
        s.target = 42.5;
        s.snap(0.0);
        s.snap(-3.0);
        s.snap(f64::NAN);
        assert_eq!(s.target, 42.5);
    }

    #[test]
    fn ease_is_kept_inside_unit_interval() {
        let first_step = |ease: f64| {
            let mut s = ScrollState::new(ease);
            s.target = 100.0;
            s.step();
            s.current
        };
        assert!(first_step(0.0) > 0.0);
        assert!(first_step(1.0) < 100.0);
        assert!((first_step(f64::NAN) - 8.0).abs() < 1e-9);
    }

    #[test]
    fn drag_moves_target_relative_to_press() {
        let mut c = ScrollController::new(ScrollTuning::default());
        c.scroll.current = 10.0;
        c.pointer_down(500.0);
        c.pointer_move(300.0);
        assert_eq!(c.scroll.target, 10.0 + 200.0 * 0.05);
        c.pointer_move(700.0);
        assert_eq!(c.scroll.target, 10.0 - 200.0 * 0.05);
    }

    #[test]
    fn move_without_press_is_ignored() {
        let mut c = ScrollController::new(ScrollTuning::default());
        c.pointer_move(100.0);
        assert_eq!(c.scroll.target, 0.0);
    }

    #[test]
    fn release_snaps_immediately() {
        let mut c = ScrollController::new(ScrollTuning::default());
        c.pointer_down(0.0);
        c.pointer_move(130.0); // 6.5 units to the left
        c.pointer_up(4.0);
        assert!(!c.is_dragging());
        assert_eq!(c.scroll.target, -8.0);
    }

    #[test]
    fn wheel_snap_waits_for_quiet_period() {
        let mut c = ScrollController::new(ScrollTuning::default());
        c.wheel(100.0);
        assert!((c.scroll.target - 0.8).abs() < 1e-12);

        // Still inside the debounce window: no snap yet.
        c.advance(Duration::from_millis(60), 2.0);
        assert!(c.has_pending_snap());
        assert_ne!(c.scroll.target, 0.0);

        // Another wheel event re-arms the full window.
        c.wheel(100.0);
        c.advance(Duration::from_millis(60), 2.0);
        assert!(c.has_pending_snap());

        c.advance(Duration::from_millis(60), 2.0);
        assert!(!c.has_pending_snap());
        assert_eq!(c.scroll.target, 2.0);
    }

    #[test]
    fn advance_is_idle_when_settled() {
        let mut c = ScrollController::new(ScrollTuning::default());
        assert!(c.advance(FRAME, 5.0).is_none());
        c.scroll.target = 5.0;
        assert!(c.advance(FRAME, 5.0).is_some());
    }

    #[test]
    fn dragging_keeps_ticking_even_when_settled() {
        let mut c = ScrollController::new(ScrollTuning::default());
        c.pointer_down(10.0);
        assert!(c.advance(FRAME, 5.0).is_some());
    }

    #[test]
    fn rescale_preserves_item_alignment() {
        let mut s = ScrollState::new(0.08);
        s.target = 3.0 * 7.6;
        s.current = 3.0 * 7.6;
        s.rescale(5.0 / 7.6);
        s.snap(5.0);
        assert!((s.target - 15.0).abs() < 1e-9);
    }
}
