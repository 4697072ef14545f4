use serde::{Deserialize, Serialize};

use crate::core::bucket::Bucket;
use crate::core::domain::AxisPosition;
use crate::core::interpolate::PathPoint;
use crate::core::primitives::timestamp_to_datetime;
use crate::core::scale::LinearScale;
use crate::core::types::Timestamp;
use crate::render::color::Color;
use crate::render::path::{area_path, line_path};
use crate::render::scene::SceneNode;

/// Point marker policy of a line series.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PointsVisibility {
    Never,
    /// Markers appear only while the pointer hovers the plot, and only when
    /// the point density is low enough for markers to be readable.
    Hover,
    Always,
}

/// Cached per-point marker state.
///
/// Attribute writes cost style recalculation on real DOM surfaces, so marker
/// updates go through this cache and only write on actual transitions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SelectedState {
    Hidden,
    Visible,
    Selected,
}

/// Resolved visibility flags of one line series draw pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LineVisibility {
    pub line_visible: bool,
    pub points_visible: PointsVisibility,
    pub selected_points_visible: bool,
}

const POINT_RADIUS: f64 = 3.0;
const SELECTED_POINT_RADIUS: f64 = 6.0;

/// Draws or updates one series line path.
pub fn draw_line_series(
    container: &mut SceneNode,
    key: &str,
    points: &[PathPoint],
    x_scale: &LinearScale,
    y_scale: &LinearScale,
    value_of: impl Fn(&Bucket) -> Option<f64>,
    color: Color,
    width: f64,
    visible: bool,
) {
    let node = container.ensure_child(key, "path");
    node.set_attr("d", line_path(points, x_scale, y_scale, value_of));
    node.set_attr("fill", "none");
    node.set_attr("stroke", color.to_css());
    node.set_attr("stroke-linejoin", "round");
    node.set_attr("stroke-linecap", "round");
    node.set_number_attr("stroke-width", width);
    node.set_attr("visibility", if visible { "visible" } else { "hidden" });
}

/// Draws or updates one series area fill below the line.
pub fn draw_area_series(
    container: &mut SceneNode,
    key: &str,
    points: &[PathPoint],
    x_scale: &LinearScale,
    y_scale: &LinearScale,
    value_of: impl Fn(&Bucket) -> Option<f64>,
    color: Color,
    baseline_px: f64,
) {
    let node = container.ensure_child(key, "path");
    node.set_attr(
        "d",
        area_path(points, x_scale, y_scale, value_of, baseline_px),
    );
    node.set_attr("fill", color.to_css());
    node.set_attr("stroke", "none");
}

/// Draws or updates the circle markers of one series.
///
/// Circles are keyed by bucket timestamp; `states` caches the last applied
/// marker state per point so redundant radius/visibility writes are skipped.
#[allow(clippy::too_many_arguments)]
pub fn draw_point_markers(
    group: &mut SceneNode,
    main: &[Bucket],
    x_scale: &LinearScale,
    y_scale: &LinearScale,
    value_of: impl Fn(&Bucket) -> Option<f64>,
    color: Color,
    visibility: LineVisibility,
    show_all_points: bool,
    selected_index: Option<usize>,
    states: &mut Vec<SelectedState>,
) {
    // A fresh data generation rebuilds the cache and every marker node, so
    // initial attributes are written even when the state matches the reset.
    let fresh = states.len() != main.len();
    if fresh {
        *states = vec![SelectedState::Hidden; main.len()];
        for key in group
            .children()
            .map(|(key, _)| key.to_owned())
            .collect::<Vec<_>>()
        {
            group.remove_child(&key);
        }
    }

    for (idx, bucket) in main.iter().enumerate() {
        let node = group.ensure_child(&bucket.ts.to_string(), "circle");
        node.set_number_attr("cx", x_scale.scale(bucket.ts as f64));
        match value_of(bucket) {
            Some(value) => {
                node.set_number_attr("cy", y_scale.scale(value));
                node.set_attr("display", "inline");
            }
            None => {
                node.set_attr("display", "none");
            }
        }
        node.set_attr("fill", color.to_css());

        let desired = if selected_index == Some(idx) && visibility.selected_points_visible {
            SelectedState::Selected
        } else if show_all_points {
            SelectedState::Visible
        } else {
            SelectedState::Hidden
        };

        if fresh || states[idx] != desired {
            match desired {
                SelectedState::Selected => {
                    node.set_number_attr("r", SELECTED_POINT_RADIUS);
                    node.set_attr("visibility", "visible");
                }
                SelectedState::Visible => {
                    node.set_number_attr("r", POINT_RADIUS);
                    node.set_attr("visibility", "visible");
                }
                SelectedState::Hidden => {
                    node.set_number_attr("r", POINT_RADIUS);
                    node.set_attr("visibility", "hidden");
                }
            }
            states[idx] = desired;
        }
    }
}

/// One rectangle of a keyed bar draw pass.
#[derive(Debug, Clone, PartialEq)]
pub struct BarRect {
    pub key: String,
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
    pub color: Color,
}

/// Draws a set of rectangles with keyed enter/update/exit semantics.
pub fn draw_bars(container: &mut SceneNode, bars: &[BarRect]) {
    container.sync_keyed_children(
        "rect",
        bars,
        |bar| bar.key.clone(),
        |node, bar| {
            node.set_number_attr("x", bar.x);
            node.set_number_attr("y", bar.y);
            node.set_number_attr("width", bar.width);
            node.set_number_attr("height", bar.height);
            node.set_attr("fill", bar.color.to_css());
        },
    );
}

/// Positions the vertical cursor line, hiding it when no pointer is active.
pub fn draw_cursor_line(node: &mut SceneNode, x_px: Option<f64>, y1: f64, y2: f64) {
    node.set_attr("pointer-events", "none");
    node.set_attr("stroke", "rgb(67, 67, 67)");
    node.set_number_attr("y1", y1);
    node.set_number_attr("y2", y2);
    match x_px {
        Some(x) => {
            node.set_number_attr("x1", x);
            node.set_number_attr("x2", x);
            node.set_attr("visibility", "visible");
        }
        None => {
            node.set_attr("visibility", "hidden");
        }
    }
}

const TICK_SIZE_PX: f64 = 6.0;
const TICK_LABEL_OFFSET_PX: f64 = 9.0;

/// Draws the bottom time axis: domain line plus keyed tick marks with
/// span-appropriate timestamp labels.
pub fn draw_time_axis(node: &mut SceneNode, scale: &LinearScale, tick_count: usize) {
    let (d0, d1) = scale.domain();
    let span_ms = (d1 - d0).abs();
    let (r0, r1) = scale.range();

    let domain = node.ensure_child("domain", "path");
    domain.set_attr(
        "d",
        format!(
            "M{},0H{}",
            crate::render::scene::format_number(r0),
            crate::render::scene::format_number(r1)
        ),
    );
    domain.set_attr("stroke", "currentColor");
    domain.set_attr("fill", "none");

    let ticks_node = node.ensure_child("ticks", "g");
    let ticks = scale.ticks(tick_count);
    ticks_node.sync_keyed_children(
        "g",
        &ticks,
        |tick| format!("{tick}"),
        |tick_node, tick| {
            tick_node.set_attr(
                "transform",
                format!(
                    "translate({}, 0)",
                    crate::render::scene::format_number(scale.scale(*tick))
                ),
            );
            let line = tick_node.ensure_child("line", "line");
            line.set_attr("stroke", "currentColor");
            line.set_number_attr("y2", TICK_SIZE_PX);
            let label = tick_node.ensure_child("label", "text");
            label.set_number_attr("y", TICK_LABEL_OFFSET_PX);
            label.set_attr("dy", "0.71em");
            label.set_attr("text-anchor", "middle");
            label.set_attr("font-size", "10");
            label.set_attr("fill", "currentColor");
            label.set_text(Some(&format_time_tick(*tick as Timestamp, span_ms)));
        },
    );
}

/// Draws the bottom numeric axis used by XY charts.
pub fn draw_numeric_axis(node: &mut SceneNode, scale: &LinearScale, tick_count: usize) {
    let (r0, r1) = scale.range();

    let domain = node.ensure_child("domain", "path");
    domain.set_attr(
        "d",
        format!(
            "M{},0H{}",
            crate::render::scene::format_number(r0),
            crate::render::scene::format_number(r1)
        ),
    );
    domain.set_attr("stroke", "currentColor");
    domain.set_attr("fill", "none");

    let ticks_node = node.ensure_child("ticks", "g");
    let ticks = scale.ticks(tick_count);
    ticks_node.sync_keyed_children(
        "g",
        &ticks,
        |tick| format!("{tick}"),
        |tick_node, tick| {
            tick_node.set_attr(
                "transform",
                format!(
                    "translate({}, 0)",
                    crate::render::scene::format_number(scale.scale(*tick))
                ),
            );
            let line = tick_node.ensure_child("line", "line");
            line.set_attr("stroke", "currentColor");
            line.set_number_attr("y2", TICK_SIZE_PX);
            let label = tick_node.ensure_child("label", "text");
            label.set_number_attr("y", TICK_LABEL_OFFSET_PX);
            label.set_attr("dy", "0.71em");
            label.set_attr("text-anchor", "middle");
            label.set_attr("font-size", "10");
            label.set_attr("fill", "currentColor");
            label.set_text(Some(&crate::render::scene::format_number(*tick)));
        },
    );
}

/// One resolved, visible Y axis to render.
#[derive(Debug, Clone, PartialEq)]
pub struct YAxisRender {
    pub position: AxisPosition,
    pub scale: LinearScale,
    pub label: Option<String>,
}

/// Draws up to four Y axes at their assigned positions.
///
/// Axes whose domain resolved to `None` are simply absent from `axes`; their
/// keyed groups exit while the remaining axes still render.
pub fn draw_y_axes(
    node: &mut SceneNode,
    axes: &[YAxisRender],
    inner_width: f64,
    inner_height: f64,
    tick_count: usize,
) {
    node.sync_keyed_children(
        "g",
        axes,
        |axis| format!("{:?}", axis.position),
        |axis_node, axis| {
            let (shift, ticks_left, label_offset) = match axis.position {
                AxisPosition::Left => (0.0, true, -40.0),
                AxisPosition::Right => (inner_width, false, 40.0),
                AxisPosition::RightInner => (0.0, false, 40.0),
                AxisPosition::LeftInner => (inner_width, true, -40.0),
            };
            axis_node.set_attr(
                "transform",
                format!("translate({}, 0)", crate::render::scene::format_number(shift)),
            );

            let domain = axis_node.ensure_child("domain", "path");
            domain.set_attr(
                "d",
                format!("M0,0V{}", crate::render::scene::format_number(inner_height)),
            );
            domain.set_attr("stroke", "currentColor");
            domain.set_attr("fill", "none");

            let ticks_node = axis_node.ensure_child("ticks", "g");
            let ticks = axis.scale.ticks(tick_count);
            let tick_direction = if ticks_left { -1.0 } else { 1.0 };
            ticks_node.sync_keyed_children(
                "g",
                &ticks,
                |tick| format!("{tick}"),
                |tick_node, tick| {
                    tick_node.set_attr(
                        "transform",
                        format!(
                            "translate(0, {})",
                            crate::render::scene::format_number(axis.scale.scale(*tick))
                        ),
                    );
                    let line = tick_node.ensure_child("line", "line");
                    line.set_attr("stroke", "currentColor");
                    line.set_number_attr("x2", tick_direction * TICK_SIZE_PX);
                    let label = tick_node.ensure_child("label", "text");
                    label.set_number_attr("x", tick_direction * TICK_LABEL_OFFSET_PX);
                    label.set_attr("dy", "0.32em");
                    label.set_attr(
                        "text-anchor",
                        if ticks_left { "end" } else { "start" },
                    );
                    label.set_attr("font-size", "10");
                    label.set_attr("fill", "currentColor");
                    label.set_text(Some(&crate::render::scene::format_number(*tick)));
                },
            );

            match &axis.label {
                Some(text) => {
                    let label = axis_node.ensure_child("axis-label", "text");
                    label.set_attr("transform", "rotate(-90)");
                    label.set_number_attr("y", label_offset);
                    label.set_number_attr("x", -inner_height / 2.0);
                    label.set_attr("text-anchor", "middle");
                    label.set_attr("font-size", "12");
                    label.set_attr("fill", "currentColor");
                    label.set_text(Some(text));
                }
                None => {
                    axis_node.remove_child("axis-label");
                }
            }
        },
    );
}

/// Formats one time-axis tick label at a resolution matched to the visible
/// span.
#[must_use]
pub fn format_time_tick(ts: Timestamp, span_ms: f64) -> String {
    let Ok(time) = timestamp_to_datetime(ts) else {
        return ts.to_string();
    };
    if span_ms <= 120_000.0 {
        time.format("%H:%M:%S").to_string()
    } else if span_ms <= 2.0 * 86_400_000.0 {
        time.format("%H:%M").to_string()
    } else {
        time.format("%Y-%m-%d").to_string()
    }
}
