use serde::{Deserialize, Serialize};

use crate::core::transform::Transform;
use crate::error::{ChartError, ChartResult};

/// Continuous linear mapping from a data domain onto a pixel range.
///
/// Both time axes (milliseconds) and value axes use this scale; value axes
/// typically pass an inverted pixel range (`(height, 0)`).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LinearScale {
    domain: (f64, f64),
    range: (f64, f64),
}

impl LinearScale {
    pub fn new(domain: (f64, f64), range: (f64, f64)) -> ChartResult<Self> {
        if !domain.0.is_finite() || !domain.1.is_finite() || domain.0 == domain.1 {
            return Err(ChartError::InvalidData(
                "scale domain must be finite and non-degenerate".to_owned(),
            ));
        }
        if !range.0.is_finite() || !range.1.is_finite() || range.0 == range.1 {
            return Err(ChartError::InvalidData(
                "scale range must be finite and non-degenerate".to_owned(),
            ));
        }
        Ok(Self { domain, range })
    }

    #[must_use]
    pub fn domain(self) -> (f64, f64) {
        self.domain
    }

    #[must_use]
    pub fn range(self) -> (f64, f64) {
        self.range
    }

    /// Maps a domain value to a pixel position.
    #[must_use]
    pub fn scale(self, value: f64) -> f64 {
        let normalized = (value - self.domain.0) / (self.domain.1 - self.domain.0);
        self.range.0 + normalized * (self.range.1 - self.range.0)
    }

    /// Maps a pixel position back to a domain value.
    #[must_use]
    pub fn invert(self, pixel: f64) -> f64 {
        let normalized = (pixel - self.range.0) / (self.range.1 - self.range.0);
        self.domain.0 + normalized * (self.domain.1 - self.domain.0)
    }

    /// Re-derives the domain under a horizontal zoom transform.
    ///
    /// The returned scale keeps the pixel range and maps the untransformed
    /// range endpoints through the transform inverse.
    pub fn rescaled_x(self, transform: Transform) -> ChartResult<Self> {
        Self::new(
            (
                self.invert(transform.invert_x(self.range.0)),
                self.invert(transform.invert_x(self.range.1)),
            ),
            self.range,
        )
    }

    /// Re-derives the domain under a vertical zoom transform with an
    /// independent Y scale multiplier.
    pub fn rescaled_y(self, transform: Transform, y_multiplier: f64) -> ChartResult<Self> {
        let composed = transform.scale(y_multiplier);
        Self::new(
            (
                self.invert(composed.invert_y(self.range.0)),
                self.invert(composed.invert_y(self.range.1)),
            ),
            self.range,
        )
    }

    /// Round tick values covering the domain, at most roughly `count` of them.
    #[must_use]
    pub fn ticks(self, count: usize) -> Vec<f64> {
        if count == 0 {
            return Vec::new();
        }
        let (start, stop) = if self.domain.0 <= self.domain.1 {
            self.domain
        } else {
            (self.domain.1, self.domain.0)
        };
        let step = tick_step(start, stop, count);
        if step <= 0.0 || !step.is_finite() {
            return Vec::new();
        }
        let first = (start / step).ceil() as i64;
        let last = (stop / step).floor() as i64;
        (first..=last).map(|idx| idx as f64 * step).collect()
    }
}

fn tick_step(start: f64, stop: f64, count: usize) -> f64 {
    let raw = (stop - start) / count as f64;
    if raw <= 0.0 || !raw.is_finite() {
        return 0.0;
    }
    let mut step = 10f64.powf(raw.log10().floor());
    let error = raw / step;
    if error >= 7.5 {
        step *= 10.0;
    } else if error >= 3.5 {
        step *= 5.0;
    } else if error >= 1.5 {
        step *= 2.0;
    }
    step
}

/// Ordinal mapping of ordered categories onto evenly spaced pixel bands.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BandScale {
    categories: Vec<String>,
    range: (f64, f64),
    padding_ratio: f64,
}

impl BandScale {
    pub fn new(
        categories: Vec<String>,
        range: (f64, f64),
        padding_ratio: f64,
    ) -> ChartResult<Self> {
        if categories.is_empty() {
            return Err(ChartError::InvalidData(
                "band scale requires at least one category".to_owned(),
            ));
        }
        if !range.0.is_finite() || !range.1.is_finite() || range.0 == range.1 {
            return Err(ChartError::InvalidData(
                "band scale range must be finite and non-degenerate".to_owned(),
            ));
        }
        if !padding_ratio.is_finite() || !(0.0..1.0).contains(&padding_ratio) {
            return Err(ChartError::InvalidData(
                "band scale padding ratio must be in [0, 1)".to_owned(),
            ));
        }
        Ok(Self {
            categories,
            range,
            padding_ratio,
        })
    }

    #[must_use]
    pub fn categories(&self) -> &[String] {
        &self.categories
    }

    #[must_use]
    pub fn step(&self) -> f64 {
        (self.range.1 - self.range.0) / self.categories.len() as f64
    }

    #[must_use]
    pub fn bandwidth(&self) -> f64 {
        (self.step() * (1.0 - self.padding_ratio)).abs()
    }

    /// Left edge of a category's band, or `None` for unknown categories.
    #[must_use]
    pub fn position(&self, category: &str) -> Option<f64> {
        let idx = self.categories.iter().position(|c| c == category)?;
        let step = self.step();
        Some(self.range.0 + idx as f64 * step + step * self.padding_ratio / 2.0)
    }
}
