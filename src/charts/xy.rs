use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::debug;

#[cfg(feature = "parallel-projection")]
use rayon::prelude::*;

use crate::charts::base::StatusMessage;
use crate::core::domain::AxisPosition;
use crate::core::scale::LinearScale;
use crate::core::transform::Transform;
use crate::core::types::{ChartGeometry, SignalId, SignalSetId, Timestamp, distance};
use crate::data::query::{DocsQuery, Query, QueryError, QueryResult};
use crate::data::session::{DataBackend, DataFetchSession};
use crate::error::{ChartError, ChartResult};
use crate::interaction::brush::{
    BrushSelection2D, ViewLimits, brush_to_limits, limits_to_transform,
};
use crate::interaction::zoom::{ZoomConfig, ZoomController, ZoomTick};
use crate::interaction::{InteractionState, Modifier};
use crate::render::color::Color;
use crate::render::engine::{YAxisRender, draw_numeric_axis, draw_y_axes};
use crate::render::scene::SceneNode;

/// Pixel radius within which a dot can be picked up by the pointer.
const MAX_SNAP_DISTANCE_PX: f64 = 30.0;

/// Fraction of the data extent added on each side of the initial view.
const EXTENT_MARGIN_RATIO: f64 = 0.05;

#[cfg(feature = "parallel-projection")]
const PARALLEL_PROJECTION_THRESHOLD: usize = 4_096;

const AXIS_TICK_COUNT: usize = 6;

/// One scatter series: a pair of signals read from raw documents.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct XySignalConfig {
    pub cid: SignalSetId,
    pub x_sig: SignalId,
    pub y_sig: SignalId,
    pub label: Option<String>,
    pub enabled: bool,
    pub color: Color,
    pub dot_radius: f64,
}

impl XySignalConfig {
    #[must_use]
    pub fn is_visible(&self) -> bool {
        self.enabled
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct XyChartConfig {
    pub signal_sets: Vec<XySignalConfig>,
    /// Upper bound on fetched dots per signal set; `None` is unlimited.
    pub max_dot_count: Option<u64>,
    /// Refetch with a view-range filter after each brush zoom.
    pub auto_refresh_on_brush: bool,
    pub zoom: ZoomConfig,
}

impl XyChartConfig {
    #[must_use]
    pub fn new(signal_sets: Vec<XySignalConfig>) -> Self {
        Self {
            signal_sets,
            max_dot_count: Some(100),
            auto_refresh_on_brush: false,
            zoom: ZoomConfig {
                scale_extent: (1.0, 10.0),
                // XY zoom stays client-side; a refetch is driven by brush.
                reload_debounce_ms: None,
                ..ZoomConfig::default()
            },
        }
    }

    pub fn validate(&self) -> ChartResult<()> {
        if self.signal_sets.is_empty() {
            return Err(ChartError::Config(
                "xy chart requires at least one signal set".to_owned(),
            ));
        }
        for set in &self.signal_sets {
            set.color.validate()?;
            if !set.dot_radius.is_finite() || set.dot_radius <= 0.0 {
                return Err(ChartError::Config(format!(
                    "dot radius of `{}` must be finite and > 0",
                    set.cid
                )));
            }
        }
        Ok(())
    }
}

/// Dot picked up by the pointer.
#[derive(Debug, Clone, PartialEq)]
pub struct XySelection {
    pub set_cid: SignalSetId,
    pub index: usize,
    pub x: f64,
    pub y: f64,
}

/// Scatter-style XY chart: raw-document dots, independent X/Y zoom with a
/// solved Y multiplier, brush-to-limits, and explicit view bounds.
pub struct XyChart {
    config: XyChartConfig,
    geometry: ChartGeometry,
    session: DataFetchSession,
    zoom: ZoomController,
    interaction: InteractionState,
    scene: SceneNode,
    dots: IndexMap<SignalSetId, Vec<(f64, f64)>>,
    base_x: Option<LinearScale>,
    base_y: Option<LinearScale>,
    status: Option<StatusMessage>,
    loading: bool,
    selection: Option<XySelection>,
    view_refresh_pending: bool,
}

impl XyChart {
    pub fn new(config: XyChartConfig, geometry: ChartGeometry) -> ChartResult<Self> {
        config.validate()?;
        let inner = (geometry.inner_width(), geometry.inner_height());
        let zoom = ZoomController::new(config.zoom, inner, ((0.0, 0.0), (inner.0, inner.1)))?;

        Ok(Self {
            config,
            geometry,
            session: DataFetchSession::new(),
            zoom,
            interaction: InteractionState::default(),
            scene: build_xy_scene(geometry),
            dots: IndexMap::new(),
            base_x: None,
            base_y: None,
            status: Some(StatusMessage::Loading),
            loading: true,
            selection: None,
            view_refresh_pending: false,
        })
    }

    #[must_use]
    pub fn status(&self) -> Option<StatusMessage> {
        self.status
    }

    #[must_use]
    pub fn selection(&self) -> Option<&XySelection> {
        self.selection.as_ref()
    }

    #[must_use]
    pub fn transform(&self) -> Transform {
        self.zoom.transform()
    }

    #[must_use]
    pub fn y_multiplier(&self) -> f64 {
        self.zoom.y_multiplier()
    }

    #[must_use]
    pub fn scene(&self) -> &SceneNode {
        &self.scene
    }

    #[must_use]
    pub fn to_svg(&self) -> String {
        self.scene.to_svg()
    }

    /// A brush with `auto_refresh_on_brush` set has requested a filtered
    /// refetch; cleared by [`XyChart::refresh_view`].
    #[must_use]
    pub fn view_refresh_pending(&self) -> bool {
        self.view_refresh_pending
    }

    /// Fetches all configured signal sets without a range filter.
    pub fn refresh(&mut self, backend: &mut dyn DataBackend) -> ChartResult<bool> {
        let queries = self.build_queries(None)?;
        self.run_fetch(backend, &queries, true)
    }

    /// Fetches with the current view limits as a range filter.
    pub fn refresh_view(&mut self, backend: &mut dyn DataBackend) -> ChartResult<bool> {
        self.view_refresh_pending = false;
        let limits = self.view()?;
        let queries = self.build_queries(Some(limits))?;
        self.run_fetch(backend, &queries, false)
    }

    fn run_fetch(
        &mut self,
        backend: &mut dyn DataBackend,
        queries: &[Query],
        refit_scales: bool,
    ) -> ChartResult<bool> {
        self.loading = true;
        self.status = Some(StatusMessage::Loading);

        match self.session.fetch_latest(backend, queries) {
            Err(QueryError::TooManyPoints) => {
                self.loading = false;
                self.status = Some(StatusMessage::TooManyPoints);
                Ok(false)
            }
            Err(err) => {
                self.loading = false;
                self.status = Some(StatusMessage::LoadError);
                Err(err.into())
            }
            Ok(None) => {
                self.loading = false;
                Ok(false)
            }
            Ok(Some(results)) => {
                self.apply_results(results, refit_scales)?;
                Ok(true)
            }
        }
    }

    fn build_queries(&self, limits: Option<ViewLimits>) -> ChartResult<Vec<Query>> {
        let mut queries = Vec::with_capacity(self.config.signal_sets.len());
        for set in &self.config.signal_sets {
            let filter = match limits {
                Some(limits) => json!([
                    {
                        "type": "range",
                        "sigCid": set.x_sig,
                        "gte": limits.x_min,
                        "lte": limits.x_max,
                    },
                    {
                        "type": "range",
                        "sigCid": set.y_sig,
                        "gte": limits.y_min,
                        "lte": limits.y_max,
                    }
                ]),
                None => serde_json::Value::Null,
            };
            queries.push(Query::Docs(DocsQuery {
                sig_set_cid: set.cid.clone(),
                fields: vec![set.x_sig.clone(), set.y_sig.clone()],
                filter,
                sort: Vec::new(),
                limit: self.config.max_dot_count,
            }));
        }
        Ok(queries)
    }

    fn apply_results(&mut self, results: Vec<QueryResult>, refit_scales: bool) -> ChartResult<()> {
        if results.len() != self.config.signal_sets.len() {
            return Err(ChartError::InvalidData(format!(
                "expected {} docs results, got {}",
                self.config.signal_sets.len(),
                results.len()
            )));
        }

        let mut dots: IndexMap<SignalSetId, Vec<(f64, f64)>> = IndexMap::new();
        for (set, result) in self.config.signal_sets.iter().zip(results) {
            let rows = result.into_docs()?;
            let mut points = Vec::with_capacity(rows.len());
            for row in rows {
                let x = row.get(set.x_sig.as_str()).and_then(serde_json::Value::as_f64);
                let y = row.get(set.y_sig.as_str()).and_then(serde_json::Value::as_f64);
                // Rows with missing or non-finite coordinates are dropped.
                if let (Some(x), Some(y)) = (x, y) {
                    if x.is_finite() && y.is_finite() {
                        points.push((x, y));
                    }
                }
            }
            dots.insert(set.cid.clone(), points);
        }

        debug!(sets = dots.len(), "applied xy fetch results");
        self.dots = dots;
        self.selection = None;
        self.loading = false;

        if self.dots.values().all(Vec::is_empty) {
            self.status = Some(StatusMessage::NoData);
            return Ok(());
        }
        self.status = None;

        if refit_scales || self.base_x.is_none() {
            self.refit_scales()?;
            self.zoom.reset();
        }
        Ok(())
    }

    fn refit_scales(&mut self) -> ChartResult<()> {
        let mut x_min = f64::INFINITY;
        let mut x_max = f64::NEG_INFINITY;
        let mut y_min = f64::INFINITY;
        let mut y_max = f64::NEG_INFINITY;
        for points in self.dots.values() {
            for (x, y) in points {
                x_min = x_min.min(*x);
                x_max = x_max.max(*x);
                y_min = y_min.min(*y);
                y_max = y_max.max(*y);
            }
        }
        if !x_min.is_finite() || !y_min.is_finite() {
            return Err(ChartError::InvalidData(
                "cannot fit scales without finite data".to_owned(),
            ));
        }
        if x_min == x_max {
            x_min -= 0.5;
            x_max += 0.5;
        }
        if y_min == y_max {
            y_min -= 0.5;
            y_max += 0.5;
        }

        let x_margin = (x_max - x_min) * EXTENT_MARGIN_RATIO;
        let y_margin = (y_max - y_min) * EXTENT_MARGIN_RATIO;
        self.base_x = Some(LinearScale::new(
            (x_min - x_margin, x_max + x_margin),
            (0.0, self.geometry.inner_width()),
        )?);
        self.base_y = Some(LinearScale::new(
            (y_min - y_margin, y_max + y_margin),
            (self.geometry.inner_height(), 0.0),
        )?);
        Ok(())
    }

    fn current_scales(&self) -> ChartResult<(LinearScale, LinearScale)> {
        let base_x = self.base_x.ok_or_else(|| {
            ChartError::InvalidData("xy chart has no data to derive scales from".to_owned())
        })?;
        let base_y = self.base_y.expect("base scales are set together");
        let transform = self.zoom.transform();
        Ok((
            base_x.rescaled_x(transform)?,
            base_y.rescaled_y(transform, self.zoom.y_multiplier())?,
        ))
    }

    /// Current view bounds in domain units.
    pub fn view(&self) -> ChartResult<ViewLimits> {
        let (x_scale, y_scale) = self.current_scales()?;
        let (x_min, x_max) = x_scale.domain();
        let (y_min, y_max) = y_scale.domain();
        ViewLimits::new(x_min, x_max, y_min, y_max)
    }

    /// Programmatically sets the view bounds.
    ///
    /// Bounds are validated synchronously; the resulting scale factor is
    /// clamped into the configured zoom level extent like every other zoom
    /// path.
    pub fn set_view(
        &mut self,
        x_min: f64,
        x_max: f64,
        y_min: f64,
        y_max: f64,
        now: Timestamp,
    ) -> ChartResult<()> {
        let limits = ViewLimits::new(x_min, x_max, y_min, y_max)?;
        self.apply_limits(limits, now)
    }

    fn apply_limits(&mut self, limits: ViewLimits, now: Timestamp) -> ChartResult<()> {
        let (x_scale, y_scale) = self.current_scales()?;
        let (transform, y_multiplier) = limits_to_transform(
            limits,
            &x_scale,
            &y_scale,
            self.zoom.transform(),
            self.zoom.y_multiplier(),
        )?;
        let inner = (self.geometry.inner_width(), self.geometry.inner_height());
        self.zoom
            .set_translate_extent(((0.0, 0.0), (inner.0, inner.1 * y_multiplier)));
        self.zoom
            .set_transform(transform, y_multiplier, self.config.zoom.with_transition, now)
    }

    pub fn key_down(&mut self, modifier: Modifier) {
        self.interaction.on_key_down(modifier);
    }

    pub fn key_up(&mut self, modifier: Modifier) {
        self.interaction.on_key_up(modifier);
    }

    /// Handles pointer movement: picks the nearest dot within snap range.
    pub fn pointer_move(&mut self, x: f64, y: f64) -> ChartResult<()> {
        self.interaction.on_pointer_move(x, y);
        if self.dots.is_empty() {
            return Ok(());
        }
        let (x_scale, y_scale) = self.current_scales()?;
        let pointer = self.geometry.to_plot_coords(x, y);

        let mut best: Option<(f64, XySelection)> = None;
        for (set_cid, points) in &self.dots {
            for (index, (dot_x, dot_y)) in points.iter().enumerate() {
                let projected = (x_scale.scale(*dot_x), y_scale.scale(*dot_y));
                let dist = distance(pointer, projected);
                if dist <= MAX_SNAP_DISTANCE_PX
                    && best.as_ref().is_none_or(|(current, _)| dist < *current)
                {
                    best = Some((
                        dist,
                        XySelection {
                            set_cid: set_cid.clone(),
                            index,
                            x: *dot_x,
                            y: *dot_y,
                        },
                    ));
                }
            }
        }
        self.selection = best.map(|(_, selection)| selection);
        Ok(())
    }

    pub fn pointer_leave(&mut self) {
        self.interaction.on_pointer_leave();
        self.selection = None;
    }

    /// Applies a wheel zoom step at the given outer position.
    pub fn wheel(&mut self, delta_y: f64, x: f64, y: f64, now: Timestamp) {
        if self.interaction.brush_armed() {
            return;
        }
        let pointer = self.geometry.to_plot_coords(x, y);
        self.zoom.wheel(delta_y, pointer, now);
    }

    pub fn begin_zoom_drag(&mut self) -> bool {
        if self.interaction.begin_zoom_drag() {
            self.zoom.begin_gesture();
            true
        } else {
            false
        }
    }

    pub fn zoom_drag_by(&mut self, dx: f64, dy: f64) {
        self.zoom.drag_by(dx, dy);
    }

    pub fn end_zoom_drag(&mut self, now: Timestamp) {
        self.interaction.end_zoom_drag();
        self.zoom.end_gesture(now);
    }

    pub fn begin_brush_drag(&mut self) -> bool {
        self.interaction.begin_brush_drag()
    }

    /// Converts a released brush rectangle into new view limits.
    pub fn brush_end(&mut self, selection: BrushSelection2D, now: Timestamp) -> ChartResult<bool> {
        if !self.interaction.brush_armed() {
            return Ok(false);
        }
        self.interaction.end_brush_drag();
        let (x_scale, y_scale) = self.current_scales()?;
        let limits = brush_to_limits(selection, &x_scale, &y_scale)?;
        self.apply_limits(limits, now)?;
        self.selection = None;
        if self.config.auto_refresh_on_brush {
            self.view_refresh_pending = true;
        }
        Ok(true)
    }

    /// Steps the zoom level by the given factor around the plot center.
    pub fn zoom_by(&mut self, factor: f64, now: Timestamp) -> ChartResult<()> {
        if !factor.is_finite() || factor <= 0.0 {
            return Err(ChartError::InvalidParameter(format!(
                "zoom factor must be finite and > 0, got {factor}"
            )));
        }
        let current = self.zoom.transform();
        let center = (
            self.geometry.inner_width() / 2.0,
            self.geometry.inner_height() / 2.0,
        );
        let anchor = current.invert(center);
        let k = current.k * factor;
        let target = Transform {
            k,
            x: center.0 - k * anchor.0,
            y: center.1 - k * anchor.1,
        };
        self.zoom
            .set_transform(target, self.zoom.y_multiplier(), self.config.zoom.with_transition, now)
    }

    pub fn reset_zoom(&mut self) {
        let inner = (self.geometry.inner_width(), self.geometry.inner_height());
        self.zoom.set_translate_extent(((0.0, 0.0), inner));
        self.zoom.reset();
    }

    /// Advances zoom tweens.
    pub fn advance(&mut self, now: Timestamp) -> ZoomTick {
        self.zoom.advance(now)
    }

    /// Draws dots, axes, and the crosshair into the retained scene.
    pub fn render(&mut self) -> ChartResult<()> {
        let scales = match self.current_scales() {
            Ok(scales) => Some(scales),
            Err(_) => None,
        };

        if let Some((x_scale, y_scale)) = scales {
            draw_numeric_axis(
                self.scene.ensure_child("x-axis", "g"),
                &x_scale,
                AXIS_TICK_COUNT,
            );
            draw_y_axes(
                self.scene.ensure_child("y-axis", "g"),
                &[YAxisRender {
                    position: AxisPosition::Left,
                    scale: y_scale,
                    label: None,
                }],
                self.geometry.inner_width(),
                self.geometry.inner_height(),
                AXIS_TICK_COUNT,
            );

            let dots_root = self.scene.ensure_child("graph-content", "g").ensure_child("dots", "g");
            for set in &self.config.signal_sets {
                let group = dots_root.ensure_child(&set.cid, "g");
                if !set.is_visible() {
                    group.set_attr("visibility", "hidden");
                    continue;
                }
                group.set_attr("visibility", "visible");

                let points = self.dots.get(&set.cid).map_or(&[][..], Vec::as_slice);
                let projected = project_dots(points, &x_scale, &y_scale);
                let selected_index = self
                    .selection
                    .as_ref()
                    .filter(|selection| selection.set_cid == set.cid)
                    .map(|selection| selection.index);

                group.sync_keyed_children(
                    "circle",
                    &projected.iter().enumerate().collect::<Vec<_>>(),
                    |(index, _)| index.to_string(),
                    |node, (index, (px, py))| {
                        node.set_number_attr("cx", *px);
                        node.set_number_attr("cy", *py);
                        let radius = if selected_index == Some(*index) {
                            set.dot_radius * 1.5
                        } else {
                            set.dot_radius
                        };
                        node.set_number_attr("r", radius);
                        node.set_attr("fill", set.color.to_css());
                    },
                );
            }

            // Crosshair lines track the selected dot.
            let crosshair = self
                .selection
                .as_ref()
                .map(|selection| (x_scale.scale(selection.x), y_scale.scale(selection.y)));
            let left = self.geometry.margin.left;
            let top = self.geometry.margin.top;
            let inner_width = self.geometry.inner_width();
            let inner_height = self.geometry.inner_height();

            let cursor_x = self.scene.ensure_child("cursor-x", "line");
            cursor_x.set_attr("stroke", "rgb(67, 67, 67)");
            cursor_x.set_attr("pointer-events", "none");
            match crosshair {
                Some((px, _)) => {
                    cursor_x.set_number_attr("x1", left + px);
                    cursor_x.set_number_attr("x2", left + px);
                    cursor_x.set_number_attr("y1", top);
                    cursor_x.set_number_attr("y2", top + inner_height);
                    cursor_x.set_attr("visibility", "visible");
                }
                None => {
                    cursor_x.set_attr("visibility", "hidden");
                }
            }

            let cursor_y = self.scene.ensure_child("cursor-y", "line");
            cursor_y.set_attr("stroke", "rgb(67, 67, 67)");
            cursor_y.set_attr("pointer-events", "none");
            match crosshair {
                Some((_, py)) => {
                    cursor_y.set_number_attr("x1", left);
                    cursor_y.set_number_attr("x2", left + inner_width);
                    cursor_y.set_number_attr("y1", top + py);
                    cursor_y.set_number_attr("y2", top + py);
                    cursor_y.set_attr("visibility", "visible");
                }
                None => {
                    cursor_y.set_attr("visibility", "hidden");
                }
            }
        }

        let status_text = self.status.map(StatusMessage::text);
        self.scene
            .ensure_child("status", "text")
            .set_text(status_text);
        Ok(())
    }
}

fn project_dots(
    dots: &[(f64, f64)],
    x_scale: &LinearScale,
    y_scale: &LinearScale,
) -> Vec<(f64, f64)> {
    #[cfg(feature = "parallel-projection")]
    {
        if dots.len() >= PARALLEL_PROJECTION_THRESHOLD {
            return dots
                .par_iter()
                .map(|(x, y)| (x_scale.scale(*x), y_scale.scale(*y)))
                .collect();
        }
    }

    dots.iter()
        .map(|(x, y)| (x_scale.scale(*x), y_scale.scale(*y)))
        .collect()
}

fn build_xy_scene(geometry: ChartGeometry) -> SceneNode {
    let mut root = SceneNode::new("svg");
    root.set_attr("xmlns", "http://www.w3.org/2000/svg");
    root.set_number_attr("height", geometry.height);
    root.set_attr("width", "100%");

    let plot = root.ensure_child("graph-content", "g");
    plot.set_attr(
        "transform",
        format!("translate({}, {})", geometry.margin.left, geometry.margin.top),
    );

    let x_axis = root.ensure_child("x-axis", "g");
    x_axis.set_attr(
        "transform",
        format!(
            "translate({}, {})",
            geometry.margin.left,
            geometry.height - geometry.margin.bottom
        ),
    );

    let y_axis = root.ensure_child("y-axis", "g");
    y_axis.set_attr(
        "transform",
        format!("translate({}, {})", geometry.margin.left, geometry.margin.top),
    );

    for key in ["cursor-x", "cursor-y"] {
        let cursor = root.ensure_child(key, "line");
        cursor.set_attr("visibility", "hidden");
        cursor.set_attr("pointer-events", "none");
    }

    let status = root.ensure_child("status", "text");
    status.set_attr("text-anchor", "middle");
    status.set_attr("x", "50%");
    status.set_attr("y", "50%");
    status.set_attr("font-size", "14");
    status.set_attr("fill", "currentColor");

    root
}
