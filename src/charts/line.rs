use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::charts::base::{
    ChartShape, ConfigDifference, DrawContext, RenderOutcome, TimeChartOptions, TimeSeriesChart,
};
use crate::core::bucket::{Agg, Bucket, SignalSetWindow};
use crate::core::domain::{AxisExtents, YAxisConfig, assign_axis_positions};
use crate::core::interpolate::{PathPoint, split_discontinuities, stitch_window};
use crate::core::interval::{IntervalAuthority, SharedTimeInterval, TimeInterval};
use crate::core::scale::LinearScale;
use crate::core::types::{ChartGeometry, SignalId, SignalSetId};
use crate::data::query::{Query, QueryResult, SignalSetQuery, TimeSeriesSpec};
use crate::error::{ChartError, ChartResult};
use crate::render::color::Color;
use crate::render::engine::{
    LineVisibility, PointsVisibility, SelectedState, YAxisRender, draw_area_series,
    draw_line_series, draw_point_markers, draw_y_axes,
};

const Y_AXIS_TICK_COUNT: usize = 6;

/// One plotted signal of a signal set.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SignalConfig {
    pub cid: SignalId,
    /// Signals without a label are fetched but not plotted.
    pub label: Option<String>,
    pub enabled: bool,
    pub color: Color,
    /// Index into the chart's `y_axes`.
    pub axis: usize,
    pub line_width: Option<f64>,
}

impl SignalConfig {
    #[must_use]
    pub fn new(cid: impl Into<SignalId>, label: impl Into<String>, color: Color) -> Self {
        Self {
            cid: cid.into(),
            label: Some(label.into()),
            enabled: true,
            color,
            axis: 0,
            line_width: None,
        }
    }

    #[must_use]
    pub fn is_visible(&self) -> bool {
        self.label.is_some() && self.enabled
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SignalSetConfig {
    pub cid: SignalSetId,
    pub ts_sig_cid: SignalId,
    pub signals: Vec<SignalConfig>,
}

/// Line/point visibility strategy resolved per draw pass.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum LineVisibilityPolicy {
    /// Lines only; markers never shown.
    LineWithoutPoints,
    /// Markers only; no connecting line.
    NoLinePointsAlways,
    /// Lines plus markers on hover while the point density stays below one
    /// point per `width_fraction` pixels.
    LinePointsOnHover { width_fraction: f64 },
    /// Markers instead of lines when the interval is unaggregated.
    PointsOnRawData,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LineChartConfig {
    pub signal_sets: Vec<SignalSetConfig>,
    pub y_axes: Vec<YAxisConfig>,
    /// Aggregates fetched per signal.
    pub signal_aggs: Vec<Agg>,
    /// Aggregate the line follows.
    pub line_agg: Agg,
    pub line_width: f64,
    /// Maximum gap between consecutive points, in seconds, before the line
    /// is split into disjoint segments.
    pub discontinuity_interval_s: Option<f64>,
    pub visibility: LineVisibilityPolicy,
    /// Fill the area between the line and the plot floor (area chart).
    pub area_fill: bool,
    pub fill_opacity: f64,
}

impl LineChartConfig {
    #[must_use]
    pub fn new(signal_sets: Vec<SignalSetConfig>) -> Self {
        Self {
            signal_sets,
            y_axes: vec![YAxisConfig::default()],
            signal_aggs: vec![Agg::Avg],
            line_agg: Agg::Avg,
            line_width: 1.5,
            discontinuity_interval_s: None,
            visibility: LineVisibilityPolicy::LinePointsOnHover {
                width_fraction: 20.0,
            },
            area_fill: false,
            fill_opacity: 0.3,
        }
    }

    pub fn validate(&self) -> ChartResult<()> {
        if self.signal_sets.is_empty() {
            return Err(ChartError::Config(
                "line chart requires at least one signal set".to_owned(),
            ));
        }
        if self.y_axes.is_empty() {
            return Err(ChartError::Config(
                "line chart requires at least one y axis".to_owned(),
            ));
        }
        assign_axis_positions(&self.y_axes)?;
        if self.signal_aggs.is_empty() {
            return Err(ChartError::Config(
                "line chart requires at least one signal aggregate".to_owned(),
            ));
        }
        if !self.signal_aggs.contains(&self.line_agg) {
            return Err(ChartError::Config(format!(
                "line aggregate `{}` must be among the fetched aggregates",
                self.line_agg.as_str()
            )));
        }
        if !self.line_width.is_finite() || self.line_width <= 0.0 {
            return Err(ChartError::Config(
                "line width must be finite and > 0".to_owned(),
            ));
        }
        if !self.fill_opacity.is_finite() || !(0.0..=1.0).contains(&self.fill_opacity) {
            return Err(ChartError::Config(
                "fill opacity must be in [0, 1]".to_owned(),
            ));
        }
        for set in &self.signal_sets {
            for signal in &set.signals {
                signal.color.validate()?;
                if signal.axis >= self.y_axes.len() {
                    return Err(ChartError::Config(format!(
                        "signal `{}` references axis {} but only {} axes are configured",
                        signal.cid,
                        signal.axis,
                        self.y_axes.len()
                    )));
                }
            }
        }
        Ok(())
    }

    fn visible_signals(&self, set: &SignalSetConfig) -> Vec<SignalId> {
        set.signals
            .iter()
            .filter(|signal| signal.is_visible())
            .map(|signal| signal.cid.clone())
            .collect()
    }
}

/// Line/area chart shape: boundary stitching, per-axis domains, visibility
/// policies, and marker selection caching.
pub struct LineShape {
    config: LineChartConfig,
    marker_states: IndexMap<SignalSetId, IndexMap<SignalId, Vec<SelectedState>>>,
}

impl LineShape {
    pub fn new(config: LineChartConfig) -> ChartResult<Self> {
        config.validate()?;
        Ok(Self {
            config,
            marker_states: IndexMap::new(),
        })
    }

    #[must_use]
    pub fn config(&self) -> &LineChartConfig {
        &self.config
    }

    fn resolve_visibility(
        &self,
        windows: &IndexMap<SignalSetId, SignalSetWindow>,
        inner_width: f64,
        interval: &TimeInterval,
    ) -> LineVisibility {
        match self.config.visibility {
            LineVisibilityPolicy::LineWithoutPoints => LineVisibility {
                line_visible: true,
                points_visible: PointsVisibility::Never,
                selected_points_visible: false,
            },
            LineVisibilityPolicy::NoLinePointsAlways => LineVisibility {
                line_visible: false,
                points_visible: PointsVisibility::Always,
                selected_points_visible: true,
            },
            LineVisibilityPolicy::LinePointsOnHover { width_fraction } => {
                let mut points_visible = PointsVisibility::Never;
                for set in &self.config.signal_sets {
                    let Some(window) = windows.get(&set.cid) else {
                        continue;
                    };
                    let count = window.main.len();
                    if count > 0
                        && (count as f64) <= inner_width / width_fraction
                        && set.signals.iter().any(SignalConfig::is_visible)
                    {
                        points_visible = PointsVisibility::Hover;
                        break;
                    }
                }
                LineVisibility {
                    line_visible: true,
                    points_visible,
                    selected_points_visible: true,
                }
            }
            LineVisibilityPolicy::PointsOnRawData => {
                if interval.is_aggregated() {
                    LineVisibility {
                        line_visible: true,
                        points_visible: PointsVisibility::Never,
                        selected_points_visible: true,
                    }
                } else {
                    LineVisibility {
                        line_visible: false,
                        points_visible: PointsVisibility::Always,
                        selected_points_visible: true,
                    }
                }
            }
        }
    }
}

impl ChartShape for LineShape {
    type Config = LineChartConfig;

    fn queries(&self, interval: &TimeInterval) -> ChartResult<Vec<Query>> {
        let mut spec = TimeSeriesSpec::new();
        for set in &self.config.signal_sets {
            let mut signals = IndexMap::new();
            for signal in &set.signals {
                signals.insert(signal.cid.clone(), self.config.signal_aggs.clone());
            }
            spec.insert(
                set.cid.clone(),
                SignalSetQuery {
                    ts_sig_cid: set.ts_sig_cid.clone(),
                    signals,
                },
            );
        }
        Ok(vec![Query::TimeSeries(spec, *interval)])
    }

    fn prepare(
        &mut self,
        results: Vec<QueryResult>,
    ) -> ChartResult<IndexMap<SignalSetId, SignalSetWindow>> {
        let mut results = results.into_iter();
        let first = results.next().ok_or_else(|| {
            ChartError::InvalidData("time-series fetch returned no results".to_owned())
        })?;
        first.into_time_series()
    }

    fn draw(&mut self, ctx: &mut DrawContext<'_>) -> ChartResult<RenderOutcome> {
        let visibility = self.resolve_visibility(ctx.windows, ctx.geometry.inner_width(), &ctx.interval);
        let inner_height = ctx.geometry.inner_height();
        let inner_width = ctx.geometry.inner_width();

        // Stitch each window to cover the interval exactly, then accumulate
        // per-axis extents over the stitched points.
        let mut stitched: IndexMap<SignalSetId, Vec<Bucket>> = IndexMap::new();
        let mut extents = AxisExtents::seeded(&self.config.y_axes);

        for set in &self.config.signal_sets {
            let Some(window) = ctx.windows.get(&set.cid) else {
                continue;
            };
            let signals = self.config.visible_signals(set);
            let points = stitch_window(
                window,
                ctx.interval.from,
                ctx.interval.to,
                &signals,
                &self.config.signal_aggs,
            );
            if points.is_empty() {
                continue;
            }

            for bucket in &points {
                for signal in &set.signals {
                    if !signal.is_visible() {
                        continue;
                    }
                    for agg in &self.config.signal_aggs {
                        if let Some(value) = bucket.value(&signal.cid, *agg) {
                            extents.observe(signal.axis, value)?;
                        }
                    }
                }
            }

            stitched.insert(set.cid.clone(), points);
        }

        let domains = extents.resolve(&self.config.y_axes);
        let positions = assign_axis_positions(&self.config.y_axes)?;

        let mut y_scales: Vec<Option<LinearScale>> = Vec::with_capacity(domains.len());
        let mut axis_renders: Vec<YAxisRender> = Vec::new();
        for (idx, domain) in domains.iter().enumerate() {
            let scale = match domain {
                Some((min, max)) => {
                    // A constant series still gets a usable scale.
                    let (min, max) = if min == max {
                        (min - 0.5, max + 0.5)
                    } else {
                        (*min, *max)
                    };
                    Some(LinearScale::new((min, max), (inner_height, 0.0))?)
                }
                None => None,
            };
            if let (Some(scale), Some(position)) = (scale, positions[idx]) {
                axis_renders.push(YAxisRender {
                    position,
                    scale,
                    label: self.config.y_axes[idx].label.clone(),
                });
            }
            y_scales.push(scale);
        }

        draw_y_axes(
            ctx.y_axis(),
            &axis_renders,
            inner_width,
            inner_height,
            Y_AXIS_TICK_COUNT,
        );

        let x_scale = ctx.x_scale;
        let windows = ctx.windows;
        let selection = ctx.selection;
        let hovering = ctx.hovering;
        let line_agg = self.config.line_agg;

        // Keyed series groups: signals that leave the config exit the scene.
        let expected_keys: Vec<String> = self
            .config
            .signal_sets
            .iter()
            .flat_map(|set| {
                set.signals
                    .iter()
                    .filter(|signal| signal.is_visible())
                    .map(|signal| series_key(&set.cid, &signal.cid))
                    .collect::<Vec<_>>()
            })
            .collect();

        let series_root = ctx.plot().ensure_child("series", "g");
        let stale: Vec<String> = series_root
            .children()
            .map(|(key, _)| key.to_owned())
            .filter(|key| !expected_keys.contains(key))
            .collect();
        for key in stale {
            series_root.remove_child(&key);
        }

        for set in &self.config.signal_sets {
            let Some(points) = stitched.get(&set.cid) else {
                continue;
            };
            let window = &windows[&set.cid];
            let path_points: Vec<PathPoint> =
                split_discontinuities(points.clone(), self.config.discontinuity_interval_s);

            let set_states = self
                .marker_states
                .entry(set.cid.clone())
                .or_default();

            for signal in &set.signals {
                if !signal.is_visible() {
                    continue;
                }
                let Some(y_scale) = y_scales[signal.axis] else {
                    // All values on this axis were null; nothing to draw.
                    continue;
                };

                let series = series_root.ensure_child(&series_key(&set.cid, &signal.cid), "g");
                let sig_cid = signal.cid.clone();
                let value_of =
                    move |bucket: &Bucket| -> Option<f64> { bucket.value(&sig_cid, line_agg) };

                if self.config.area_fill {
                    draw_area_series(
                        series,
                        "area",
                        &path_points,
                        &x_scale,
                        &y_scale,
                        &value_of,
                        signal.color.with_opacity(self.config.fill_opacity),
                        inner_height,
                    );
                }

                draw_line_series(
                    series,
                    "line",
                    &path_points,
                    &x_scale,
                    &y_scale,
                    &value_of,
                    signal.color,
                    signal.line_width.unwrap_or(self.config.line_width),
                    visibility.line_visible,
                );

                let selected_index = selection
                    .and_then(|selection| selection.by_set.get(&set.cid))
                    .map(|point| point.index);
                let show_all_points = match visibility.points_visible {
                    PointsVisibility::Always => true,
                    PointsVisibility::Hover => hovering,
                    PointsVisibility::Never => false,
                };

                let states = set_states.entry(signal.cid.clone()).or_default();
                draw_point_markers(
                    series.ensure_child("points", "g"),
                    &window.main,
                    &x_scale,
                    &y_scale,
                    &value_of,
                    signal.color,
                    visibility,
                    show_all_points,
                    selected_index,
                    states,
                );
            }
        }

        if stitched.is_empty() {
            Ok(RenderOutcome::NoData)
        } else {
            Ok(RenderOutcome::Success)
        }
    }

    fn apply_config(&mut self, config: LineChartConfig) -> ChartResult<ConfigDifference> {
        config.validate()?;
        let diff = compare_line_configs(&self.config, &config);
        if diff >= ConfigDifference::Data {
            self.marker_states.clear();
        }
        self.config = config;
        Ok(diff)
    }
}

fn series_key(set_cid: &str, sig_cid: &str) -> String {
    format!("series-{set_cid}-{sig_cid}")
}

/// Compares two configurations the way re-render decisions need it: identity
/// or aggregate changes invalidate the data, style changes only the render.
#[must_use]
pub fn compare_line_configs(a: &LineChartConfig, b: &LineChartConfig) -> ConfigDifference {
    if a.signal_sets.len() != b.signal_sets.len()
        || a.signal_aggs != b.signal_aggs
        || a.line_agg != b.line_agg
    {
        return ConfigDifference::Data;
    }

    let mut diff = ConfigDifference::None;
    for (set_a, set_b) in a.signal_sets.iter().zip(&b.signal_sets) {
        if set_a.cid != set_b.cid
            || set_a.ts_sig_cid != set_b.ts_sig_cid
            || set_a.signals.len() != set_b.signals.len()
        {
            return ConfigDifference::Data;
        }
        for (sig_a, sig_b) in set_a.signals.iter().zip(&set_b.signals) {
            if sig_a.cid != sig_b.cid {
                return ConfigDifference::Data;
            }
            if sig_a.color != sig_b.color
                || sig_a.label != sig_b.label
                || sig_a.enabled != sig_b.enabled
                || sig_a.axis != sig_b.axis
            {
                diff = diff.max(ConfigDifference::Render);
            }
        }
    }

    if a.y_axes != b.y_axes
        || a.visibility != b.visibility
        || a.line_width != b.line_width
        || a.area_fill != b.area_fill
        || a.fill_opacity != b.fill_opacity
        || a.discontinuity_interval_s != b.discontinuity_interval_s
    {
        diff = diff.max(ConfigDifference::Render);
    }

    diff
}

/// Interactive multi-series line chart.
pub type LineChart<A = SharedTimeInterval> = TimeSeriesChart<LineShape, A>;

/// Builds a line chart over the given interval authority.
pub fn line_chart<A: IntervalAuthority>(
    config: LineChartConfig,
    authority: A,
    geometry: ChartGeometry,
    options: TimeChartOptions,
) -> ChartResult<TimeSeriesChart<LineShape, A>> {
    TimeSeriesChart::new(LineShape::new(config)?, authority, geometry, options)
}

/// Builds an area chart: a line chart filling down to the plot floor.
pub fn area_chart<A: IntervalAuthority>(
    mut config: LineChartConfig,
    authority: A,
    geometry: ChartGeometry,
    options: TimeChartOptions,
) -> ChartResult<TimeSeriesChart<LineShape, A>> {
    config.area_fill = true;
    TimeSeriesChart::new(LineShape::new(config)?, authority, geometry, options)
}
