use serde::{Deserialize, Serialize};

use crate::core::types::Timestamp;
use crate::error::{ChartError, ChartResult};

const SCALE_EPSILON: f64 = 0.001;
const TRANSLATE_EPSILON: f64 = 0.01;

/// 2D affine pan/zoom state: uniform scale `k` plus translate `(x, y)`.
///
/// Pixel mapping is `p' = k * p + t`; composing a transform with its own
/// inverse is the identity within floating-point tolerance.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Transform {
    pub k: f64,
    pub x: f64,
    pub y: f64,
}

impl Default for Transform {
    fn default() -> Self {
        Self::identity()
    }
}

impl Transform {
    #[must_use]
    pub const fn identity() -> Self {
        Self {
            k: 1.0,
            x: 0.0,
            y: 0.0,
        }
    }

    pub fn new(k: f64, x: f64, y: f64) -> ChartResult<Self> {
        if !k.is_finite() || k <= 0.0 {
            return Err(ChartError::InvalidParameter(format!(
                "transform scale must be finite and > 0, got {k}"
            )));
        }
        if !x.is_finite() || !y.is_finite() {
            return Err(ChartError::InvalidParameter(
                "transform translate must be finite".to_owned(),
            ));
        }
        Ok(Self { k, x, y })
    }

    /// Post-composes a translation in untransformed coordinates.
    #[must_use]
    pub fn translate(self, tx: f64, ty: f64) -> Self {
        Self {
            k: self.k,
            x: self.x + self.k * tx,
            y: self.y + self.k * ty,
        }
    }

    /// Post-composes a scale factor.
    #[must_use]
    pub fn scale(self, factor: f64) -> Self {
        Self {
            k: self.k * factor,
            x: self.x,
            y: self.y,
        }
    }

    #[must_use]
    pub fn apply(self, point: (f64, f64)) -> (f64, f64) {
        (self.apply_x(point.0), self.apply_y(point.1))
    }

    #[must_use]
    pub fn invert(self, point: (f64, f64)) -> (f64, f64) {
        (self.invert_x(point.0), self.invert_y(point.1))
    }

    #[must_use]
    pub fn apply_x(self, x: f64) -> f64 {
        self.k * x + self.x
    }

    #[must_use]
    pub fn apply_y(self, y: f64) -> f64 {
        self.k * y + self.y
    }

    #[must_use]
    pub fn invert_x(self, x: f64) -> f64 {
        (x - self.x) / self.k
    }

    #[must_use]
    pub fn invert_y(self, y: f64) -> f64 {
        (y - self.y) / self.k
    }

    /// Equality within the interaction epsilons used for identity checks.
    #[must_use]
    pub fn approx_eq(self, other: Self) -> bool {
        (self.k - other.k).abs() <= SCALE_EPSILON
            && (self.x - other.x).abs() <= TRANSLATE_EPSILON
            && (self.y - other.y).abs() <= TRANSLATE_EPSILON
    }

    #[must_use]
    pub fn is_identity(self) -> bool {
        self.approx_eq(Self::identity())
    }

    /// Returns the transform with `k` clamped into `[min_k, max_k]`.
    #[must_use]
    pub fn with_scale_clamped(self, min_k: f64, max_k: f64) -> Self {
        Self {
            k: self.k.clamp(min_k, max_k),
            x: self.x,
            y: self.y,
        }
    }

    /// Constrains the translate so the view stays inside `translate_extent`.
    ///
    /// `extent` is the plot size in pixels; `translate_extent` bounds the
    /// untransformed coordinates that may become visible.
    #[must_use]
    pub fn constrained(
        self,
        extent: (f64, f64),
        translate_extent: ((f64, f64), (f64, f64)),
    ) -> Self {
        let dx0 = self.invert_x(0.0) - translate_extent.0.0;
        let dx1 = self.invert_x(extent.0) - translate_extent.1.0;
        let dy0 = self.invert_y(0.0) - translate_extent.0.1;
        let dy1 = self.invert_y(extent.1) - translate_extent.1.1;

        self.translate(
            constrain_axis(dx0, dx1),
            constrain_axis(dy0, dy1),
        )
    }
}

fn constrain_axis(d0: f64, d1: f64) -> f64 {
    if d1 > d0 {
        (d0 + d1) / 2.0
    } else {
        let low = d0.min(0.0);
        if low != 0.0 { low } else { d1.max(0.0) }
    }
}

/// Interpolated transition between two transforms (and Y-scale multipliers),
/// advanced by the host clock.
///
/// Starting a new transition supersedes the previous one's effect on the
/// shared transform state: last started wins.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TransformTransition {
    from: Transform,
    to: Transform,
    from_y_multiplier: f64,
    to_y_multiplier: f64,
    started_at: Timestamp,
    duration_ms: i64,
}

impl TransformTransition {
    pub fn new(
        from: Transform,
        to: Transform,
        from_y_multiplier: f64,
        to_y_multiplier: f64,
        started_at: Timestamp,
        duration_ms: i64,
    ) -> ChartResult<Self> {
        if duration_ms <= 0 {
            return Err(ChartError::InvalidParameter(format!(
                "transition duration must be > 0 ms, got {duration_ms}"
            )));
        }
        Ok(Self {
            from,
            to,
            from_y_multiplier,
            to_y_multiplier,
            started_at,
            duration_ms,
        })
    }

    #[must_use]
    pub fn target(&self) -> (Transform, f64) {
        (self.to, self.to_y_multiplier)
    }

    /// Samples the tween at `now`; the flag reports completion.
    ///
    /// `k`, `x`, `y` and the Y multiplier interpolate independently and
    /// linearly, so the tween is deterministic for a given clock.
    #[must_use]
    pub fn sample(&self, now: Timestamp) -> (Transform, f64, bool) {
        let elapsed = now - self.started_at;
        if elapsed >= self.duration_ms {
            return (self.to, self.to_y_multiplier, true);
        }
        if elapsed <= 0 {
            return (self.from, self.from_y_multiplier, false);
        }
        let t = elapsed as f64 / self.duration_ms as f64;
        let transform = Transform {
            k: lerp(self.from.k, self.to.k, t),
            x: lerp(self.from.x, self.to.x, t),
            y: lerp(self.from.y, self.to.y, t),
        };
        let multiplier = lerp(self.from_y_multiplier, self.to_y_multiplier, t);
        (transform, multiplier, false)
    }
}

fn lerp(a: f64, b: f64, t: f64) -> f64 {
    a * (1.0 - t) + b * t
}
