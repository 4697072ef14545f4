use serde::{Deserialize, Serialize};

use crate::error::{ChartError, ChartResult};

/// Milliseconds since the Unix epoch.
pub type Timestamp = i64;

/// Identifier of a signal set (a named collection of series sharing a time axis).
pub type SignalSetId = String;

/// Identifier of a single signal within a signal set.
pub type SignalId = String;

/// Margin box around the plotting area, in pixels.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Margin {
    pub left: f64,
    pub right: f64,
    pub top: f64,
    pub bottom: f64,
}

impl Margin {
    #[must_use]
    pub const fn new(left: f64, right: f64, top: f64, bottom: f64) -> Self {
        Self {
            left,
            right,
            top,
            bottom,
        }
    }

    pub fn validate(self) -> ChartResult<()> {
        for (side, value) in [
            ("left", self.left),
            ("right", self.right),
            ("top", self.top),
            ("bottom", self.bottom),
        ] {
            if !value.is_finite() || value < 0.0 {
                return Err(ChartError::Config(format!(
                    "margin `{side}` must be finite and >= 0"
                )));
            }
        }
        Ok(())
    }
}

impl Default for Margin {
    fn default() -> Self {
        Self::new(40.0, 5.0, 5.0, 20.0)
    }
}

/// Outer chart size plus margin box model.
///
/// All internal coordinate systems are relative to the margin-inset plotting
/// area returned by `inner_width`/`inner_height`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ChartGeometry {
    pub width: f64,
    pub height: f64,
    pub margin: Margin,
}

impl ChartGeometry {
    pub fn new(width: f64, height: f64, margin: Margin) -> ChartResult<Self> {
        margin.validate()?;
        if !width.is_finite() || !height.is_finite() || width <= 0.0 || height <= 0.0 {
            return Err(ChartError::InvalidViewport {
                width: width as u32,
                height: height as u32,
            });
        }

        let geometry = Self {
            width,
            height,
            margin,
        };
        if geometry.inner_width() <= 0.0 || geometry.inner_height() <= 0.0 {
            return Err(ChartError::Config(
                "margins leave no room for the plotting area".to_owned(),
            ));
        }
        Ok(geometry)
    }

    #[must_use]
    pub fn inner_width(self) -> f64 {
        self.width - self.margin.left - self.margin.right
    }

    #[must_use]
    pub fn inner_height(self) -> f64 {
        self.height - self.margin.top - self.margin.bottom
    }

    /// Converts an outer (SVG-root) position into plot-area coordinates.
    #[must_use]
    pub fn to_plot_coords(self, x: f64, y: f64) -> (f64, f64) {
        (x - self.margin.left, y - self.margin.top)
    }

    /// True when the outer position lies inside the plotting area.
    #[must_use]
    pub fn contains(self, x: f64, y: f64) -> bool {
        let (px, py) = self.to_plot_coords(x, y);
        px >= 0.0 && px <= self.inner_width() && py >= 0.0 && py <= self.inner_height()
    }
}

/// Euclidean distance between two points.
#[must_use]
pub fn distance(a: (f64, f64), b: (f64, f64)) -> f64 {
    (a.0 - b.0).hypot(a.1 - b.1)
}
