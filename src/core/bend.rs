//! Circular-arc bend applied to planes as a function of horizontal offset.
//!
//! The track is treated as a chord of length `2H` (the viewport width) on a
//! circle whose sagitta is the configured bend `B`.  Solving for the radius
//! gives `R = (H² + B²) / 2B`; a plane at offset `x` then sits
//! `R − √(R² − x²)` below (or above, for negative bend) the baseline and is
//! rotated to follow the tangent.

/// Vertical displacement and in-plane rotation for one plane.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct ArcPose {
    /// Signed sag along the arc.  `>= 0` for positive bend, `<= 0` for
    /// negative bend.  World `y` is `-displacement`.
    pub displacement: f64,
    /// Rotation around the view axis, radians (counter-clockwise positive).
    pub rotation: f64,
}

impl ArcPose {
    /// World-space `y` of the plane centre.
    pub fn y(self) -> f64 {
        -self.displacement
    }
}

/// Precomputed arc for a bend magnitude and half viewport width.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BendArc {
    bend: f64,
    half_width: f64,
    /// `None` when the bend is zero (flat layout).
    radius: Option<f64>,
}

impl BendArc {
    pub fn new(bend: f64, half_width: f64) -> Self {
        let half_width = half_width.max(0.0);
        let b = bend.abs();
        let radius = if bend == 0.0 || !bend.is_finite() {
            None
        } else {
            Some((half_width * half_width + b * b) / (2.0 * b))
        };
        Self {
            bend,
            half_width,
            radius,
        }
    }

    /// Pose of a plane whose centre sits at horizontal offset `x`.
    pub fn pose(&self, x: f64) -> ArcPose {
        let Some(r) = self.radius else {
            return ArcPose::default();
        };

        let ex = x.abs().min(self.half_width);
        // R >= H always holds, so this only clamps float noise at the rim.
        let arc = r - (r * r - ex * ex).max(0.0).sqrt();
        let angle = (ex / r).clamp(-1.0, 1.0).asin();
        let side = if x > 0.0 {
            1.0
        } else if x < 0.0 {
            -1.0
        } else {
            0.0
        };

        if self.bend > 0.0 {
            ArcPose {
                displacement: arc,
                rotation: -side * angle,
            }
        } else {
            ArcPose {
                displacement: -arc,
                rotation: side * angle,
            }
        }
    }
}
