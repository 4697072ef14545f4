use crate::core::scale::LinearScale;
use crate::core::transform::Transform;
use crate::core::types::Timestamp;
use crate::error::{ChartError, ChartResult};

/// Horizontal brush selection in plot-area pixels.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BrushSelectionX {
    pub x0: f64,
    pub x1: f64,
}

/// Rectangular brush selection in plot-area pixels, top-left to bottom-right.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BrushSelection2D {
    pub x0: f64,
    pub y0: f64,
    pub x1: f64,
    pub y1: f64,
}

/// Converts a released horizontal brush into a time interval request.
pub fn brush_to_time_interval(
    selection: BrushSelectionX,
    x_scale: &LinearScale,
) -> ChartResult<(Timestamp, Timestamp)> {
    if !selection.x0.is_finite() || !selection.x1.is_finite() {
        return Err(ChartError::InvalidParameter(
            "brush selection must be finite".to_owned(),
        ));
    }
    let (left, right) = if selection.x0 <= selection.x1 {
        (selection.x0, selection.x1)
    } else {
        (selection.x1, selection.x0)
    };
    let from = x_scale.invert(left).round() as Timestamp;
    let to = x_scale.invert(right).round() as Timestamp;
    if from >= to {
        return Err(ChartError::InvalidParameter(
            "brush selection is narrower than one millisecond".to_owned(),
        ));
    }
    Ok((from, to))
}

/// Requested view bounds of an XY chart, in domain units.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ViewLimits {
    pub x_min: f64,
    pub x_max: f64,
    pub y_min: f64,
    pub y_max: f64,
}

impl ViewLimits {
    pub fn new(x_min: f64, x_max: f64, y_min: f64, y_max: f64) -> ChartResult<Self> {
        for (name, value) in [
            ("x_min", x_min),
            ("x_max", x_max),
            ("y_min", y_min),
            ("y_max", y_max),
        ] {
            if !value.is_finite() {
                return Err(ChartError::InvalidParameter(format!(
                    "view limit `{name}` must be a finite number, got {value}"
                )));
            }
        }
        if x_min >= x_max || y_min >= y_max {
            return Err(ChartError::InvalidParameter(format!(
                "view limits must satisfy min < max, got x [{x_min}, {x_max}], y [{y_min}, {y_max}]"
            )));
        }
        Ok(Self {
            x_min,
            x_max,
            y_min,
            y_max,
        })
    }
}

/// Converts a released rectangular brush into view limits via the inverse
/// scales.
///
/// The Y pixel axis grows downward, so the rectangle's bottom edge maps to
/// `y_min` and its top edge to `y_max`.
pub fn brush_to_limits(
    selection: BrushSelection2D,
    x_scale: &LinearScale,
    y_scale: &LinearScale,
) -> ChartResult<ViewLimits> {
    ViewLimits::new(
        x_scale.invert(selection.x0),
        x_scale.invert(selection.x1),
        y_scale.invert(selection.y1),
        y_scale.invert(selection.y0),
    )
}

/// Solves the transform (and new Y multiplier) that makes `limits` the
/// visible domain.
///
/// With independent X/Y zoom the Y-axis multiplier is solved as
/// `(old_y_size * new_x_size) / (old_x_size * new_y_size)` relative to X so
/// the two axes stay coupled through one uniform `k`.
pub fn limits_to_transform(
    limits: ViewLimits,
    x_scale: &LinearScale,
    y_scale: &LinearScale,
    current: Transform,
    current_y_multiplier: f64,
) -> ChartResult<(Transform, f64)> {
    let new_x_size = limits.x_max - limits.x_min;
    let new_y_size = limits.y_max - limits.y_min;
    let (x_d0, x_d1) = x_scale.domain();
    let (y_d0, y_d1) = y_scale.domain();
    let old_x_size = x_d1 - x_d0;
    let old_y_size = y_d1 - y_d0;

    if old_x_size <= 0.0 || old_y_size <= 0.0 {
        return Err(ChartError::InvalidData(
            "current scale domains must be ascending and non-degenerate".to_owned(),
        ));
    }

    let scale_factor = (old_y_size * new_x_size) / (old_x_size * new_y_size);
    let new_y_multiplier = scale_factor * current_y_multiplier;

    let top_left = current.invert((x_scale.scale(limits.x_min), y_scale.scale(limits.y_max)));
    let transform = Transform::identity()
        .scale(current.k * old_x_size / new_x_size)
        .translate(-top_left.0, -top_left.1 * scale_factor);

    Ok((transform, new_y_multiplier))
}
