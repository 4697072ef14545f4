use std::sync::atomic::{AtomicU64, Ordering};

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use tracing::{debug, trace, warn};

use crate::context::cursor::{CursorHub, CursorSubscription};
use crate::core::bucket::SignalSetWindow;
use crate::core::interval::{IntervalAuthority, IntervalSpec, SharedTimeInterval, TimeInterval};
use crate::core::scale::LinearScale;
use crate::core::transform::Transform;
use crate::core::types::{ChartGeometry, SignalSetId, Timestamp};
use crate::data::query::{Query, QueryError, QueryResult};
use crate::data::session::{DataBackend, DataFetchSession};
use crate::error::{ChartError, ChartResult};
use crate::interaction::brush::{BrushSelectionX, brush_to_time_interval};
use crate::interaction::selection::{Selection, select_nearest};
use crate::interaction::zoom::{ZoomConfig, ZoomController, ZoomTick};
use crate::interaction::{InteractionPhase, InteractionState, Modifier};
use crate::render::engine::{draw_cursor_line, draw_time_axis};
use crate::render::scene::SceneNode;

static NEXT_CHART_ID: AtomicU64 = AtomicU64::new(0);

const PLOT_KEY: &str = "graph-content";
const X_AXIS_KEY: &str = "x-axis";
const Y_AXIS_KEY: &str = "y-axis";
const CURSOR_KEY: &str = "cursor";
const STATUS_KEY: &str = "status";
const LOADING_OVERLAY_KEY: &str = "loading-overlay";

const X_AXIS_TICK_SPACING_PX: f64 = 80.0;

/// User-visible chart status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum StatusMessage {
    Loading,
    NoData,
    TooManyPoints,
    LoadError,
}

impl StatusMessage {
    #[must_use]
    pub const fn text(self) -> &'static str {
        match self {
            StatusMessage::Loading => "Loading...",
            StatusMessage::NoData => "No data.",
            StatusMessage::TooManyPoints => "Too many data points.",
            StatusMessage::LoadError => "Error loading data.",
        }
    }
}

/// Severity of a configuration change, from most benign to worst.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum ConfigDifference {
    None,
    Render,
    Data,
    DataWithClear,
}

/// Result of one draw pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RenderOutcome {
    Success,
    NoData,
}

/// Behavior switches of a time-series chart.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TimeChartOptions {
    pub with_brush: bool,
    pub with_zoom: bool,
    /// A requested interval narrower than this is expanded forward from its
    /// start before being handed to the interval authority.
    pub minimum_interval_ms: i64,
    pub zoom: ZoomConfig,
}

impl Default for TimeChartOptions {
    fn default() -> Self {
        Self {
            with_brush: true,
            with_zoom: true,
            minimum_interval_ms: 10_000,
            zoom: ZoomConfig {
                // Time charts zoom nearly unbounded in both directions; the
                // refetch loop re-anchors the interval instead of running
                // out of zoom headroom.
                scale_extent: (0.1, f64::INFINITY),
                ..ZoomConfig::default()
            },
        }
    }
}

/// Everything a chart shape needs for one draw pass.
pub struct DrawContext<'a> {
    pub root: &'a mut SceneNode,
    pub geometry: ChartGeometry,
    pub interval: TimeInterval,
    pub x_scale: LinearScale,
    pub windows: &'a IndexMap<SignalSetId, SignalSetWindow>,
    pub selection: Option<&'a Selection>,
    pub hovering: bool,
}

impl DrawContext<'_> {
    /// Clipped group holding the chart's data marks.
    pub fn plot(&mut self) -> &mut SceneNode {
        self.root.ensure_child(PLOT_KEY, "g")
    }

    /// Group holding the Y axes.
    pub fn y_axis(&mut self) -> &mut SceneNode {
        self.root.ensure_child(Y_AXIS_KEY, "g")
    }
}

/// Strategy object supplying the type-specific pieces of a time-series
/// chart: the query shape, result preparation, and the draw routine.
pub trait ChartShape {
    type Config;

    /// Builds the backend queries for the given absolute interval.
    fn queries(&self, interval: &TimeInterval) -> ChartResult<Vec<Query>>;

    /// Extracts per signal-set windows from the positional results.
    fn prepare(
        &mut self,
        results: Vec<QueryResult>,
    ) -> ChartResult<IndexMap<SignalSetId, SignalSetWindow>>;

    /// Draws the shape into the scene. Must be idempotent for identical
    /// inputs.
    fn draw(&mut self, ctx: &mut DrawContext<'_>) -> ChartResult<RenderOutcome>;

    /// Replaces the configuration, reporting how disruptive the change is.
    fn apply_config(&mut self, config: Self::Config) -> ChartResult<ConfigDifference>;
}

struct CursorBinding {
    hub: CursorHub,
    name: String,
    subscription: CursorSubscription,
    publish: bool,
    follow: bool,
}

/// Interactive time-series chart composing fetch, scales, zoom/brush/cursor
/// interaction, and a retained SVG scene around a [`ChartShape`].
///
/// The chart is event-driven and deterministic: the host feeds pointer,
/// wheel, and key events in, drives tweens and the refetch debounce through
/// [`TimeSeriesChart::advance`], and reads the scene (or serialized SVG) out.
pub struct TimeSeriesChart<S: ChartShape, A: IntervalAuthority = SharedTimeInterval> {
    shape: S,
    authority: A,
    options: TimeChartOptions,
    geometry: ChartGeometry,
    session: DataFetchSession,
    zoom: ZoomController,
    interaction: InteractionState,
    scene: SceneNode,
    windows: IndexMap<SignalSetId, SignalSetWindow>,
    selection: Option<Selection>,
    status: Option<StatusMessage>,
    loading: bool,
    last_spec: IntervalSpec,
    last_abs: TimeInterval,
    x_scale: Option<LinearScale>,
    cursor: Option<CursorBinding>,
    external_cursor_px: Option<f64>,
}

impl<S: ChartShape, A: IntervalAuthority> TimeSeriesChart<S, A> {
    pub fn new(
        shape: S,
        authority: A,
        geometry: ChartGeometry,
        options: TimeChartOptions,
    ) -> ChartResult<Self> {
        if options.minimum_interval_ms <= 0 {
            return Err(ChartError::Config(format!(
                "minimum interval must be > 0 ms, got {}",
                options.minimum_interval_ms
            )));
        }

        let inner = (geometry.inner_width(), geometry.inner_height());
        let zoom = ZoomController::new(
            options.zoom,
            inner,
            ((f64::NEG_INFINITY, 0.0), (f64::INFINITY, inner.1)),
        )?;

        let last_spec = authority.interval_spec();
        let last_abs = authority.interval_absolute();

        Ok(Self {
            shape,
            authority,
            options,
            geometry,
            session: DataFetchSession::new(),
            zoom,
            interaction: InteractionState::default(),
            scene: build_scene_skeleton(geometry),
            windows: IndexMap::new(),
            selection: None,
            status: Some(StatusMessage::Loading),
            loading: true,
            last_spec,
            last_abs,
            x_scale: None,
            cursor: None,
            external_cursor_px: None,
        })
    }

    /// Mirrors pointer selection into a shared cursor hub and/or follows the
    /// cursor published by sibling charts.
    pub fn bind_cursor_hub(&mut self, hub: &CursorHub, name: &str, publish: bool, follow: bool) {
        self.cursor = Some(CursorBinding {
            hub: hub.clone(),
            name: name.to_owned(),
            subscription: hub.subscribe(),
            publish,
            follow,
        });
    }

    #[must_use]
    pub fn shape(&self) -> &S {
        &self.shape
    }

    #[must_use]
    pub fn authority(&self) -> &A {
        &self.authority
    }

    #[must_use]
    pub fn status(&self) -> Option<StatusMessage> {
        self.status
    }

    #[must_use]
    pub fn is_loading(&self) -> bool {
        self.loading
    }

    #[must_use]
    pub fn windows(&self) -> &IndexMap<SignalSetId, SignalSetWindow> {
        &self.windows
    }

    #[must_use]
    pub fn selection(&self) -> Option<&Selection> {
        self.selection.as_ref()
    }

    #[must_use]
    pub fn transform(&self) -> Transform {
        self.zoom.transform()
    }

    #[must_use]
    pub fn interaction(&self) -> InteractionState {
        self.interaction
    }

    #[must_use]
    pub fn scene(&self) -> &SceneNode {
        &self.scene
    }

    /// Serialized SVG markup of the current scene.
    #[must_use]
    pub fn to_svg(&self) -> String {
        self.scene.to_svg()
    }

    /// Current zoom-rescaled X scale, available after the first render.
    #[must_use]
    pub fn x_scale(&self) -> Option<LinearScale> {
        self.x_scale
    }

    /// Replaces the shape configuration.
    ///
    /// A difference of `Data` or worse clears the fetched windows; the
    /// caller follows up with [`TimeSeriesChart::refresh`].
    pub fn set_config(&mut self, config: S::Config) -> ChartResult<ConfigDifference> {
        let diff = self.shape.apply_config(config)?;
        if diff >= ConfigDifference::Data {
            self.windows.clear();
            self.selection = None;
            self.zoom.reset();
            self.status = Some(StatusMessage::Loading);
            self.loading = true;
        }
        Ok(diff)
    }

    /// Fetches the current absolute interval and applies the result.
    ///
    /// Stale results and too-many-points are absorbed (`Ok(false)`); any
    /// other fetch failure sets the status and is then propagated so an
    /// enclosing error reporter still observes it.
    pub fn refresh(&mut self, backend: &mut dyn DataBackend) -> ChartResult<bool> {
        self.loading = true;
        self.status = Some(StatusMessage::Loading);

        let interval = self.authority.interval_absolute();
        let queries = self.shape.queries(&interval)?;

        match self.session.fetch_latest(backend, &queries) {
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
                // A newer fetch superseded this one; its own completion will
                // update the chart.
                self.loading = false;
                Ok(false)
            }
            Ok(Some(results)) => {
                self.apply_results(results, interval)?;
                Ok(true)
            }
        }
    }

    /// Applies externally fetched results for hosts driving the session
    /// begin/settle split themselves.
    pub fn apply_results(
        &mut self,
        results: Vec<QueryResult>,
        interval: TimeInterval,
    ) -> ChartResult<()> {
        let mut windows = self.shape.prepare(results)?;
        for window in windows.values_mut() {
            window.normalize();
            window.validate()?;
        }
        debug!(sets = windows.len(), "applied fetch results");
        self.windows = windows;
        self.selection = None;
        self.status = None;
        self.loading = false;
        self.last_abs = interval;
        Ok(())
    }

    /// Session handle for hosts with asynchronous transports.
    pub fn session(&mut self) -> &mut DataFetchSession {
        &mut self.session
    }

    /// Reconciles the chart against the interval authority.
    ///
    /// A replaced spec resets the local zoom and refetches with a cleared
    /// chart; a changed absolute interval (refresh tick) refetches in place,
    /// first converting a live local zoom into an interval request so the
    /// fetched window matches what the user is looking at.
    pub fn process_interval_change(&mut self, backend: &mut dyn DataBackend) -> ChartResult<bool> {
        let spec = self.authority.interval_spec();
        if spec != self.last_spec {
            debug!("interval spec changed, clearing chart");
            self.last_spec = spec;
            self.last_abs = self.authority.interval_absolute();
            self.zoom.reset();
            self.windows.clear();
            self.selection = None;
            self.refresh(backend)?;
            return Ok(true);
        }

        let abs = self.authority.interval_absolute();
        if abs != self.last_abs {
            if !self.zoom.transform().is_identity() {
                self.request_visible_interval()?;
                // The request may round back onto the unchanged spec; only a
                // real spec change re-enters the clearing path.
                if self.authority.interval_spec() != self.last_spec {
                    return self.process_interval_change(backend);
                }
            }
            self.refresh(backend)?;
            return Ok(true);
        }

        Ok(false)
    }

    /// Requests a new canonical interval.
    ///
    /// The requested width is expanded forward from `from` to the configured
    /// minimum, then rounded outward to the aggregation grid.
    pub fn set_interval(&mut self, from: Timestamp, mut to: Timestamp) -> ChartResult<()> {
        if to - from < self.options.minimum_interval_ms {
            to = from + self.options.minimum_interval_ms;
        }
        let (from, to) = self.authority.round_to_min_aggregation_interval(from, to);
        let spec = IntervalSpec::auto(from, to)?;
        self.authority.set_spec(spec)
    }

    /// Requests the currently visible domain as the new canonical interval.
    pub fn request_visible_interval(&mut self) -> ChartResult<()> {
        let scale = self.current_x_scale()?;
        let (d0, d1) = scale.domain();
        self.set_interval(d0.round() as Timestamp, d1.round() as Timestamp)
    }

    pub fn key_down(&mut self, modifier: Modifier) {
        self.interaction.on_key_down(modifier);
    }

    pub fn key_up(&mut self, modifier: Modifier) {
        self.interaction.on_key_up(modifier);
    }

    /// Handles pointer movement in outer (SVG-root) coordinates.
    pub fn pointer_move(&mut self, x: f64, y: f64) -> ChartResult<()> {
        self.interaction.on_pointer_move(x, y);
        self.external_cursor_px = None;

        let scale = self.current_x_scale()?;
        let (plot_x, _) = self.geometry.to_plot_coords(x, y);
        let ts = scale.invert(plot_x);

        self.selection = select_nearest(&self.windows, ts, (x, y));

        if let Some(binding) = &mut self.cursor {
            if binding.publish {
                binding.hub.publish(&binding.name, Some(ts))?;
            }
        }
        Ok(())
    }

    /// Pointer left the chart: cancels hover, clears the selection and the
    /// published cursor.
    pub fn pointer_leave(&mut self) -> ChartResult<()> {
        self.interaction.on_pointer_leave();
        self.selection = None;
        self.external_cursor_px = None;
        if let Some(binding) = &mut self.cursor {
            if binding.publish {
                binding.hub.publish(&binding.name, None)?;
            }
        }
        Ok(())
    }

    /// Applies a wheel step at the given outer position.
    pub fn wheel(&mut self, delta_y: f64, x: f64, y: f64, now: Timestamp) -> ChartResult<()> {
        if !self.options.with_zoom || self.interaction.brush_armed() {
            return Ok(());
        }
        let pointer = self.geometry.to_plot_coords(x, y);
        if self.zoom.wheel(delta_y, pointer, now) {
            self.request_visible_interval()?;
        }
        Ok(())
    }

    /// Starts a pan drag; refused while brush mode is armed.
    pub fn begin_zoom_drag(&mut self) -> bool {
        if !self.options.with_zoom {
            return false;
        }
        if self.interaction.begin_zoom_drag() {
            self.zoom.begin_gesture();
            true
        } else {
            false
        }
    }

    pub fn zoom_drag_by(&mut self, dx: f64, dy: f64) {
        if self.interaction.phase() == InteractionPhase::DragZoom {
            self.zoom.drag_by(dx, dy);
        }
    }

    pub fn end_zoom_drag(&mut self, now: Timestamp) -> ChartResult<()> {
        self.interaction.end_zoom_drag();
        if self.zoom.end_gesture(now) {
            self.request_visible_interval()?;
        }
        Ok(())
    }

    /// Converts a released brush selection into an interval request.
    ///
    /// Returns `false` when brushing is disabled or not armed.
    pub fn brush_end(&mut self, selection: BrushSelectionX) -> ChartResult<bool> {
        if !self.options.with_brush || !self.interaction.brush_armed() {
            return Ok(false);
        }
        self.interaction.end_brush_drag();
        let scale = self.current_x_scale()?;
        let (from, to) = brush_to_time_interval(selection, &scale)?;
        self.set_interval(from, to)?;
        Ok(true)
    }

    pub fn begin_brush_drag(&mut self) -> bool {
        self.options.with_brush && self.interaction.begin_brush_drag()
    }

    /// Replaces the zoom transform programmatically.
    pub fn set_zoom(&mut self, transform: Transform, animate: bool, now: Timestamp) -> ChartResult<()> {
        self.zoom.set_transform(transform, 1.0, animate, now)
    }

    pub fn reset_zoom(&mut self) {
        self.zoom.reset();
    }

    /// Advances tweens and the refetch debounce, and follows the shared
    /// cursor when bound.
    pub fn advance(&mut self, now: Timestamp) -> ChartResult<ZoomTick> {
        let tick = self.zoom.advance(now);
        if tick.refetch_due {
            self.request_visible_interval()?;
        }
        self.sync_cursor_from_hub()?;
        Ok(tick)
    }

    fn sync_cursor_from_hub(&mut self) -> ChartResult<()> {
        let Some(binding) = &mut self.cursor else {
            return Ok(());
        };
        if !binding.follow {
            return Ok(());
        }
        let Some(value) = binding.subscription.poll_cursor(&binding.name) else {
            return Ok(());
        };
        // The locally hovered chart already reflects its own pointer; only
        // charts without a live pointer follow the shared cursor.
        if self.interaction.pointer().is_some() {
            return Ok(());
        }

        match value {
            Some(ts) => {
                let scale = self.current_x_scale()?;
                let outer_x = scale.scale(ts) + self.geometry.margin.left;
                if self
                    .external_cursor_px
                    .is_none_or(|current| (current - outer_x).abs() > 1.0)
                {
                    self.external_cursor_px = Some(outer_x);
                    self.selection =
                        select_nearest(&self.windows, ts, (outer_x, self.geometry.margin.top));
                }
            }
            None => {
                self.external_cursor_px = None;
                self.selection = None;
            }
        }
        Ok(())
    }

    /// Draws the chart into the retained scene.
    ///
    /// Idempotent: a second call with unchanged state leaves the scene's
    /// mutation count untouched.
    pub fn render(&mut self) -> ChartResult<RenderOutcome> {
        let interval = self.last_abs;
        let base = LinearScale::new(
            (interval.from as f64, interval.to as f64),
            (0.0, self.geometry.inner_width()),
        )?;
        let x_scale = base.rescaled_x(self.zoom.transform())?;
        self.x_scale = Some(x_scale);

        let outcome = if self.windows.is_empty() {
            RenderOutcome::NoData
        } else {
            let mut ctx = DrawContext {
                root: &mut self.scene,
                geometry: self.geometry,
                interval,
                x_scale,
                windows: &self.windows,
                selection: self.selection.as_ref(),
                hovering: self.interaction.pointer().is_some(),
            };
            self.shape.draw(&mut ctx)?
        };

        let tick_count =
            (self.geometry.inner_width() / X_AXIS_TICK_SPACING_PX).floor().max(2.0) as usize;
        draw_time_axis(
            self.scene.ensure_child(X_AXIS_KEY, "g"),
            &x_scale,
            tick_count,
        );

        let cursor_px = self
            .interaction
            .pointer()
            .map(|(x, _)| x)
            .or(self.external_cursor_px);
        draw_cursor_line(
            self.scene.ensure_child(CURSOR_KEY, "line"),
            cursor_px,
            self.geometry.margin.top,
            self.geometry.height - self.geometry.margin.bottom,
        );

        let overlay_visible = self.loading || !self.zoom.transform().is_identity();
        let overlay = self
            .scene
            .ensure_child(PLOT_KEY, "g")
            .ensure_child(LOADING_OVERLAY_KEY, "rect");
        overlay.set_attr("fill", "rgba(255, 255, 255, 0.2)");
        overlay.set_number_attr("width", self.geometry.inner_width());
        overlay.set_number_attr("height", self.geometry.inner_height());
        overlay.set_attr(
            "visibility",
            if overlay_visible { "visible" } else { "hidden" },
        );

        if outcome == RenderOutcome::NoData && self.status.is_none() {
            self.status = Some(StatusMessage::NoData);
        }
        let status_text = self.status.map(StatusMessage::text);
        self.scene
            .ensure_child(STATUS_KEY, "text")
            .set_text(status_text);

        trace!(?outcome, "rendered chart");
        Ok(outcome)
    }

    /// X scale derived from the fetched interval and the live transform.
    ///
    /// Computed fresh so interaction math never reads a scale staler than
    /// the transform (the cached `x_scale` only tracks the last render).
    fn current_x_scale(&self) -> ChartResult<LinearScale> {
        let interval = self.last_abs;
        let base = LinearScale::new(
            (interval.from as f64, interval.to as f64),
            (0.0, self.geometry.inner_width()),
        )?;
        base.rescaled_x(self.zoom.transform())
    }
}

impl<S: ChartShape, A: IntervalAuthority> Drop for TimeSeriesChart<S, A> {
    fn drop(&mut self) {
        // The cursor subscription's own Drop releases the hub registration;
        // a still-armed debounce timer dies with the controller.
        if self.zoom.has_pending_refetch() {
            warn!("chart dropped with a pending zoom refetch");
        }
    }
}

fn build_scene_skeleton(geometry: ChartGeometry) -> SceneNode {
    let chart_id = NEXT_CHART_ID.fetch_add(1, Ordering::Relaxed);
    let clip_id = format!("plot-rect-{chart_id}");

    let mut root = SceneNode::new("svg");
    root.set_attr("xmlns", "http://www.w3.org/2000/svg");
    root.set_number_attr("height", geometry.height);
    root.set_attr("width", "100%");

    let defs = root.ensure_child("defs", "defs");
    let clip = defs.ensure_child("clip", "clipPath");
    clip.set_attr("id", clip_id.clone());
    let clip_rect = clip.ensure_child("rect", "rect");
    clip_rect.set_number_attr("x", 0.0);
    clip_rect.set_number_attr("y", 0.0);
    clip_rect.set_number_attr("width", geometry.inner_width());
    clip_rect.set_number_attr("height", geometry.inner_height());

    let plot = root.ensure_child(PLOT_KEY, "g");
    plot.set_attr(
        "transform",
        format!("translate({}, {})", geometry.margin.left, geometry.margin.top),
    );
    plot.set_attr("clip-path", format!("url(#{clip_id})"));

    let x_axis = root.ensure_child(X_AXIS_KEY, "g");
    x_axis.set_attr(
        "transform",
        format!(
            "translate({}, {})",
            geometry.margin.left,
            geometry.height - geometry.margin.bottom
        ),
    );

    let y_axis = root.ensure_child(Y_AXIS_KEY, "g");
    y_axis.set_attr(
        "transform",
        format!("translate({}, {})", geometry.margin.left, geometry.margin.top),
    );

    let cursor = root.ensure_child(CURSOR_KEY, "line");
    cursor.set_attr("visibility", "hidden");
    cursor.set_attr("pointer-events", "none");

    let status = root.ensure_child(STATUS_KEY, "text");
    status.set_attr("text-anchor", "middle");
    status.set_attr("x", "50%");
    status.set_attr("y", "50%");
    status.set_attr("font-size", "14");
    status.set_attr("fill", "currentColor");

    root
}
