use serde::{Deserialize, Serialize};

use crate::error::{ChartError, ChartResult};

/// RGBA color in normalized 0..=1 channel values.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Color {
    pub red: f64,
    pub green: f64,
    pub blue: f64,
    pub alpha: f64,
}

impl Color {
    #[must_use]
    pub const fn rgba(red: f64, green: f64, blue: f64, alpha: f64) -> Self {
        Self {
            red,
            green,
            blue,
            alpha,
        }
    }

    #[must_use]
    pub const fn rgb(red: f64, green: f64, blue: f64) -> Self {
        Self::rgba(red, green, blue, 1.0)
    }

    pub fn validate(self) -> ChartResult<()> {
        for (channel, value) in [
            ("red", self.red),
            ("green", self.green),
            ("blue", self.blue),
            ("alpha", self.alpha),
        ] {
            if !value.is_finite() || !(0.0..=1.0).contains(&value) {
                return Err(ChartError::Config(format!(
                    "color channel `{channel}` must be finite and in [0, 1]"
                )));
            }
        }
        Ok(())
    }

    /// Copy of the color with a replaced opacity.
    #[must_use]
    pub fn with_opacity(self, alpha: f64) -> Self {
        Self { alpha, ..self }
    }

    /// CSS serialization used for SVG attributes.
    #[must_use]
    pub fn to_css(self) -> String {
        let r = (self.red * 255.0).round() as u8;
        let g = (self.green * 255.0).round() as u8;
        let b = (self.blue * 255.0).round() as u8;
        if (self.alpha - 1.0).abs() < f64::EPSILON {
            format!("rgb({r}, {g}, {b})")
        } else {
            format!("rgba({r}, {g}, {b}, {})", self.alpha)
        }
    }
}

/// Linear gradient over a numeric domain, subdivided evenly per color stop.
#[derive(Debug, Clone, PartialEq)]
pub struct ColorScale {
    domain: (f64, f64),
    stops: Vec<Color>,
}

impl ColorScale {
    /// Builds a scale from at least one color; a single color is duplicated
    /// into a flat gradient.
    pub fn new(domain: (f64, f64), colors: &[Color]) -> ChartResult<Self> {
        if colors.is_empty() {
            return Err(ChartError::Config(
                "color scale requires at least one color".to_owned(),
            ));
        }
        for color in colors {
            color.validate()?;
        }
        if !domain.0.is_finite() || !domain.1.is_finite() || domain.0 >= domain.1 {
            return Err(ChartError::InvalidData(
                "color scale domain must be finite and ascending".to_owned(),
            ));
        }

        let stops = if colors.len() == 1 {
            vec![colors[0], colors[0]]
        } else {
            colors.to_vec()
        };
        Ok(Self { domain, stops })
    }

    /// Samples the gradient; values outside the domain clamp to the ends.
    #[must_use]
    pub fn sample(&self, value: f64) -> Color {
        let (min, max) = self.domain;
        let clamped = value.clamp(min, max);
        let segments = (self.stops.len() - 1) as f64;
        let position = (clamped - min) / (max - min) * segments;
        let idx = (position.floor() as usize).min(self.stops.len() - 2);
        let t = position - idx as f64;
        let a = self.stops[idx];
        let b = self.stops[idx + 1];
        Color::rgba(
            a.red + (b.red - a.red) * t,
            a.green + (b.green - a.green) * t,
            a.blue + (b.blue - a.blue) * t,
            a.alpha + (b.alpha - a.alpha) * t,
        )
    }
}
