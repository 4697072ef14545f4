use serde::{Deserialize, Serialize};

use crate::error::{ChartError, ChartResult};

/// Maximum number of simultaneously visible Y axes.
pub const MAX_VISIBLE_Y_AXES: usize = 4;

/// Per-axis domain configuration.
///
/// `included_min`/`included_max` seed the extent, `below_min`/`above_max`
/// expand it by a fraction of the span, and `limit_min`/`limit_max` are hard
/// clamps that win over both data and expansion.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct YAxisConfig {
    pub visible: bool,
    pub label: Option<String>,
    pub included_min: Option<f64>,
    pub included_max: Option<f64>,
    pub below_min: Option<f64>,
    pub above_max: Option<f64>,
    pub limit_min: Option<f64>,
    pub limit_max: Option<f64>,
}

impl Default for YAxisConfig {
    fn default() -> Self {
        Self {
            visible: true,
            label: None,
            included_min: None,
            included_max: None,
            below_min: None,
            above_max: None,
            limit_min: None,
            limit_max: None,
        }
    }
}

/// Screen position assigned to the n-th visible Y axis.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AxisPosition {
    Left,
    Right,
    RightInner,
    LeftInner,
}

/// Maps a visible-axis ordinal to its screen position.
///
/// Requesting a fifth visible axis is a configuration error.
pub fn axis_position(visible_idx: usize) -> ChartResult<AxisPosition> {
    match visible_idx {
        0 => Ok(AxisPosition::Left),
        1 => Ok(AxisPosition::Right),
        2 => Ok(AxisPosition::RightInner),
        3 => Ok(AxisPosition::LeftInner),
        _ => Err(ChartError::Config(format!(
            "at most {MAX_VISIBLE_Y_AXES} visible y axes are supported"
        ))),
    }
}

/// Accumulates per-axis min/max candidates across all visible signals.
#[derive(Debug, Clone)]
pub struct AxisExtents {
    mins: Vec<Option<f64>>,
    maxs: Vec<Option<f64>>,
}

impl AxisExtents {
    /// Seeds the accumulator with the axes' `included_min`/`included_max`.
    #[must_use]
    pub fn seeded(axes: &[YAxisConfig]) -> Self {
        Self {
            mins: axes.iter().map(|axis| axis.included_min).collect(),
            maxs: axes.iter().map(|axis| axis.included_max).collect(),
        }
    }

    /// Observes one candidate value on the given axis.
    ///
    /// Non-finite candidates are ignored; an out-of-range axis index is a
    /// configuration error.
    pub fn observe(&mut self, axis_idx: usize, value: f64) -> ChartResult<()> {
        if axis_idx >= self.mins.len() {
            return Err(ChartError::Config(format!(
                "signal references axis {axis_idx} but only {} axes are configured",
                self.mins.len()
            )));
        }
        if !value.is_finite() {
            return Ok(());
        }

        let min = &mut self.mins[axis_idx];
        if min.is_none_or(|current| current > value) {
            *min = Some(value);
        }
        let max = &mut self.maxs[axis_idx];
        if max.is_none_or(|current| current < value) {
            *max = Some(value);
        }
        Ok(())
    }

    /// Resolves final per-axis numeric domains.
    ///
    /// Expansion and clamping are applied in order: expand below, clamp to
    /// `limit_min`, expand above, clamp to `limit_max`. An axis that observed
    /// no finite value resolves to `None` and renders without an axis line.
    #[must_use]
    pub fn resolve(&self, axes: &[YAxisConfig]) -> Vec<Option<(f64, f64)>> {
        axes.iter()
            .enumerate()
            .map(|(idx, axis)| {
                let (mut min, mut max) = match (self.mins[idx], self.maxs[idx]) {
                    (Some(min), Some(max)) => (min, max),
                    _ => return None,
                };

                if let Some(fraction) = axis.below_min {
                    min -= (max - min) * fraction;
                }
                if let Some(limit) = axis.limit_min {
                    min = min.max(limit);
                }
                if let Some(fraction) = axis.above_max {
                    max += (max - min) * fraction;
                }
                if let Some(limit) = axis.limit_max {
                    max = max.min(limit);
                }

                Some((min, max))
            })
            .collect()
    }
}

/// Validates the axis list and returns positions for the visible axes.
pub fn assign_axis_positions(axes: &[YAxisConfig]) -> ChartResult<Vec<Option<AxisPosition>>> {
    let mut visible_idx = 0;
    axes.iter()
        .map(|axis| {
            if axis.visible {
                let position = axis_position(visible_idx)?;
                visible_idx += 1;
                Ok(Some(position))
            } else {
                Ok(None)
            }
        })
        .collect()
}

/// Ordered categorical domain: first-seen order, duplicates removed.
#[must_use]
pub fn resolve_categorical_domain<I>(values: I) -> Vec<String>
where
    I: IntoIterator<Item = String>,
{
    let mut domain: Vec<String> = Vec::new();
    for value in values {
        if !domain.contains(&value) {
            domain.push(value);
        }
    }
    domain
}
