use std::collections::HashSet;

use indexmap::IndexMap;
use signal_charts::ChartError;
use signal_charts::charts::{
    ConfigDifference, LineChartConfig, LineVisibilityPolicy, RenderOutcome, SignalConfig,
    SignalSetConfig, StatusMessage, TimeChartOptions, compare_line_configs, line_chart,
};
use signal_charts::context::CursorHub;
use signal_charts::core::{
    Agg, Bucket, IntervalAuthority, IntervalSpec, Margin, ChartGeometry, SharedTimeInterval,
    SignalSetWindow, TimeIntervalHub, single_agg_values,
};
use signal_charts::data::{DataBackend, Query, QueryError, QueryResult};
use signal_charts::interaction::{BrushSelectionX, Modifier};
use signal_charts::render::{Color, SceneNode, segment_count};

enum BackendMode {
    Ok,
    TooManyPoints,
    Fail,
}

struct MockBackend {
    mode: BackendMode,
    missing_ts: HashSet<i64>,
    calls: usize,
}

impl MockBackend {
    fn new() -> Self {
        Self {
            mode: BackendMode::Ok,
            missing_ts: HashSet::new(),
            calls: 0,
        }
    }

    fn with_missing(missing_ts: &[i64]) -> Self {
        Self {
            mode: BackendMode::Ok,
            missing_ts: missing_ts.iter().copied().collect(),
            calls: 0,
        }
    }
}

fn bucket_value(ts: i64) -> f64 {
    (ts / 60_000) as f64
}

impl DataBackend for MockBackend {
    fn run_queries(&mut self, queries: &[Query]) -> Result<Vec<QueryResult>, QueryError> {
        self.calls += 1;
        match self.mode {
            BackendMode::TooManyPoints => return Err(QueryError::TooManyPoints),
            BackendMode::Fail => return Err(QueryError::Backend("broken pipe".to_owned())),
            BackendMode::Ok => {}
        }

        let mut results = Vec::with_capacity(queries.len());
        for query in queries {
            let Query::TimeSeries(spec, interval) = query else {
                return Err(QueryError::Backend("unexpected query type".to_owned()));
            };
            let step = interval.aggregation_interval_ms.unwrap_or(60_000);

            let mut windows = IndexMap::new();
            for (set_cid, set_query) in spec {
                let make_bucket = |ts: i64| {
                    let mut bucket = Bucket::new(ts);
                    for (sig_cid, aggs) in &set_query.signals {
                        let mut values = signal_charts::core::SignalValues::new();
                        for agg in aggs {
                            values.insert(*agg, Some(bucket_value(ts)));
                        }
                        bucket = bucket.with_signal(sig_cid.clone(), values);
                    }
                    bucket
                };

                let mut main = Vec::new();
                let mut ts = interval.from;
                while ts < interval.to {
                    if !self.missing_ts.contains(&ts) {
                        main.push(make_bucket(ts));
                    }
                    ts += step;
                }

                windows.insert(
                    set_cid.clone(),
                    SignalSetWindow {
                        prev: Some(make_bucket(interval.from - step)),
                        main,
                        next: Some(make_bucket(interval.to)),
                    },
                );
            }
            results.push(QueryResult::TimeSeries(windows));
        }
        Ok(results)
    }
}

fn config() -> LineChartConfig {
    LineChartConfig::new(vec![SignalSetConfig {
        cid: "set1".to_owned(),
        ts_sig_cid: "ts".to_owned(),
        signals: vec![SignalConfig::new("sig1", "Signal 1", Color::rgb(0.1, 0.4, 0.8))],
    }])
}

fn authority() -> SharedTimeInterval {
    SharedTimeInterval::new(TimeIntervalHub::new(
        IntervalSpec::auto(0, 3_600_000).expect("spec"),
    ))
}

fn geometry() -> ChartGeometry {
    ChartGeometry::new(1_000.0, 500.0, Margin::new(0.0, 0.0, 0.0, 0.0)).expect("geometry")
}

fn options() -> TimeChartOptions {
    let mut options = TimeChartOptions::default();
    options.zoom.with_transition = false;
    options
}

fn line_path_d(scene: &SceneNode) -> String {
    scene
        .child("graph-content")
        .and_then(|plot| plot.child("series"))
        .and_then(|series| series.child("series-set1-sig1"))
        .and_then(|series| series.child("line"))
        .and_then(|line| line.attr("d"))
        .expect("line path")
        .to_owned()
}

#[test]
fn refresh_applies_results_and_clears_the_status() {
    let mut backend = MockBackend::new();
    let mut chart = line_chart(config(), authority(), geometry(), options()).expect("chart");

    assert_eq!(chart.status(), Some(StatusMessage::Loading));
    let applied = chart.refresh(&mut backend).expect("refresh");

    assert!(applied);
    assert!(!chart.is_loading());
    assert_eq!(chart.status(), None);
    assert_eq!(chart.windows()["set1"].main.len(), 60);
}

#[test]
fn missing_buckets_render_as_two_disjoint_segments() {
    // Buckets 30 and 31 are missing: a 180 s hole against the 120 s
    // discontinuity threshold splits the line.
    let mut backend = MockBackend::with_missing(&[1_800_000, 1_860_000]);
    let mut chart_config = config();
    chart_config.discontinuity_interval_s = Some(120.0);
    chart_config.visibility = LineVisibilityPolicy::LineWithoutPoints;

    let mut chart =
        line_chart(chart_config, authority(), geometry(), options()).expect("chart");
    chart.refresh(&mut backend).expect("refresh");

    let outcome = chart.render().expect("render");
    assert_eq!(outcome, RenderOutcome::Success);
    assert_eq!(segment_count(&line_path_d(chart.scene())), 2);
}

#[test]
fn render_is_idempotent_for_identical_state() {
    let mut backend = MockBackend::new();
    let mut chart = line_chart(config(), authority(), geometry(), options()).expect("chart");
    chart.refresh(&mut backend).expect("refresh");

    chart.render().expect("first render");
    let after_first = chart.scene().mutation_count();
    let first_svg = chart.to_svg();

    chart.render().expect("second render");
    assert_eq!(chart.scene().mutation_count(), after_first);
    assert_eq!(chart.to_svg(), first_svg);
}

#[test]
fn pointer_move_selects_the_nearest_bucket() {
    let mut backend = MockBackend::new();
    let mut chart = line_chart(config(), authority(), geometry(), options()).expect("chart");
    chart.refresh(&mut backend).expect("refresh");
    chart.render().expect("render");

    // Pixel 250 of 1000 maps to ts 900_000, exactly bucket 15.
    chart.pointer_move(250.0, 100.0).expect("pointer move");
    let selection = chart.selection().expect("selection");
    assert_eq!(selection.by_set["set1"].ts, 900_000);

    chart.pointer_leave().expect("pointer leave");
    assert!(chart.selection().is_none());
}

#[test]
fn brush_requests_a_rounded_interval_and_refetches() {
    let mut backend = MockBackend::new();
    let authority = authority();
    let mut chart =
        line_chart(config(), authority.clone(), geometry(), options()).expect("chart");
    chart.refresh(&mut backend).expect("refresh");
    chart.render().expect("render");

    chart.key_down(Modifier::Control);
    let handled = chart
        .brush_end(BrushSelectionX { x0: 250.0, x1: 500.0 })
        .expect("brush");
    assert!(handled);

    let expected = IntervalSpec::auto(900_000, 1_800_000).expect("spec");
    assert_eq!(authority.interval_spec(), expected);

    let refetched = chart.process_interval_change(&mut backend).expect("process");
    assert!(refetched);
    assert!(chart.transform().is_identity());
    let first_ts = chart.windows()["set1"].main[0].ts;
    assert!(first_ts >= 900_000);
}

#[test]
fn brush_without_the_control_modifier_is_ignored() {
    let mut backend = MockBackend::new();
    let mut chart = line_chart(config(), authority(), geometry(), options()).expect("chart");
    chart.refresh(&mut backend).expect("refresh");
    chart.render().expect("render");

    let handled = chart
        .brush_end(BrushSelectionX { x0: 250.0, x1: 500.0 })
        .expect("brush");
    assert!(!handled);
}

#[test]
fn narrow_brush_expands_forward_to_the_minimum_interval() {
    let mut backend = MockBackend::new();
    let authority = authority();
    let mut chart =
        line_chart(config(), authority.clone(), geometry(), options()).expect("chart");
    chart.refresh(&mut backend).expect("refresh");
    chart.render().expect("render");

    chart.key_down(Modifier::Control);
    chart
        .brush_end(BrushSelectionX { x0: 0.0, x1: 1.0 })
        .expect("brush");

    let abs = authority.interval_absolute();
    assert_eq!(abs.to - abs.from, 10_000);
}

#[test]
fn wheel_zoom_schedules_a_debounced_interval_request() {
    let mut backend = MockBackend::new();
    let authority = authority();
    let mut chart =
        line_chart(config(), authority.clone(), geometry(), options()).expect("chart");
    chart.refresh(&mut backend).expect("refresh");
    chart.render().expect("render");

    let spec_before = authority.interval_spec();
    chart.wheel(-120.0, 500.0, 250.0, 0).expect("wheel");
    assert!(!chart.transform().is_identity());

    let tick = chart.advance(999).expect("advance");
    assert!(!tick.refetch_due);
    assert_eq!(authority.interval_spec(), spec_before);

    let tick = chart.advance(1_000).expect("advance");
    assert!(tick.refetch_due);
    let spec_after = authority.interval_spec();
    assert_ne!(spec_after, spec_before);

    let abs = authority.interval_absolute();
    assert!(abs.to - abs.from < 3_600_000);

    // The spec change resets the local zoom and refetches.
    chart.process_interval_change(&mut backend).expect("process");
    assert!(chart.transform().is_identity());
}

#[test]
fn too_many_points_becomes_a_status_not_an_error() {
    let mut backend = MockBackend::new();
    backend.mode = BackendMode::TooManyPoints;
    let mut chart = line_chart(config(), authority(), geometry(), options()).expect("chart");

    let applied = chart.refresh(&mut backend).expect("refresh must not fail");
    assert!(!applied);
    assert_eq!(chart.status(), Some(StatusMessage::TooManyPoints));
}

#[test]
fn generic_fetch_failure_surfaces_and_rethrows() {
    let mut backend = MockBackend::new();
    backend.mode = BackendMode::Fail;
    let mut chart = line_chart(config(), authority(), geometry(), options()).expect("chart");

    let err = chart.refresh(&mut backend).expect_err("fetch failure");
    assert!(matches!(err, ChartError::DataLoad(_)));
    assert_eq!(chart.status(), Some(StatusMessage::LoadError));
}

#[test]
fn stale_results_settle_to_none_through_the_chart_session() {
    let mut backend = MockBackend::new();
    let mut chart = line_chart(config(), authority(), geometry(), options()).expect("chart");

    let stale_ticket = chart.session().begin();
    chart.refresh(&mut backend).expect("refresh");

    assert!(chart.session().settle(stale_ticket, "stale").is_none());
    assert_eq!(chart.windows()["set1"].main.len(), 60);
}

#[test]
fn cursor_hub_mirrors_selection_across_charts() {
    let mut backend = MockBackend::new();
    let hub = CursorHub::new(&["time"]).expect("hub");
    let authority = authority();

    let mut publisher =
        line_chart(config(), authority.clone(), geometry(), options()).expect("publisher");
    publisher.bind_cursor_hub(&hub, "time", true, false);
    let mut follower =
        line_chart(config(), authority.clone(), geometry(), options()).expect("follower");
    follower.bind_cursor_hub(&hub, "time", false, true);

    publisher.refresh(&mut backend).expect("refresh");
    follower.refresh(&mut backend).expect("refresh");
    publisher.render().expect("render");
    follower.render().expect("render");

    publisher.pointer_move(250.0, 100.0).expect("pointer move");
    assert_eq!(hub.get("time"), Some(900_000.0));

    follower.advance(0).expect("advance");
    let selection = follower.selection().expect("followed selection");
    assert_eq!(selection.by_set["set1"].ts, 900_000);

    publisher.pointer_leave().expect("pointer leave");
    follower.advance(1).expect("advance");
    assert!(follower.selection().is_none());
}

#[test]
fn config_changes_grade_from_render_to_data() {
    let base = config();

    let mut recolored = config();
    recolored.signal_sets[0].signals[0].color = Color::rgb(0.9, 0.1, 0.1);
    assert_eq!(compare_line_configs(&base, &recolored), ConfigDifference::Render);

    let mut renamed_set = config();
    renamed_set.signal_sets[0].cid = "other".to_owned();
    assert_eq!(compare_line_configs(&base, &renamed_set), ConfigDifference::Data);

    let mut other_aggs = config();
    other_aggs.signal_aggs = vec![Agg::Min, Agg::Avg];
    assert_eq!(compare_line_configs(&base, &other_aggs), ConfigDifference::Data);
}

#[test]
fn applying_a_data_config_change_clears_fetched_windows() {
    let mut backend = MockBackend::new();
    let mut chart = line_chart(config(), authority(), geometry(), options()).expect("chart");
    chart.refresh(&mut backend).expect("refresh");
    assert!(!chart.windows().is_empty());

    let mut renamed = config();
    renamed.signal_sets[0].cid = "other".to_owned();
    let diff = chart.set_config(renamed).expect("set config");

    assert_eq!(diff, ConfigDifference::Data);
    assert!(chart.windows().is_empty());
    assert_eq!(chart.status(), Some(StatusMessage::Loading));
}

#[test]
fn invalid_configs_fail_construction_synchronously() {
    let mut five_axes = config();
    five_axes.y_axes = vec![Default::default(); 5];
    assert!(matches!(
        line_chart(five_axes, authority(), geometry(), options()),
        Err(ChartError::Config(_))
    ));

    let mut wrong_agg = config();
    wrong_agg.line_agg = Agg::Max;
    assert!(matches!(
        line_chart(wrong_agg, authority(), geometry(), options()),
        Err(ChartError::Config(_))
    ));

    let mut bad_axis_ref = config();
    bad_axis_ref.signal_sets[0].signals[0].axis = 3;
    assert!(matches!(
        line_chart(bad_axis_ref, authority(), geometry(), options()),
        Err(ChartError::Config(_))
    ));
}

#[test]
fn area_chart_fills_down_to_the_plot_floor() {
    use signal_charts::charts::area_chart;

    let mut backend = MockBackend::new();
    let mut chart = area_chart(config(), authority(), geometry(), options()).expect("chart");
    chart.refresh(&mut backend).expect("refresh");
    chart.render().expect("render");

    let series = chart
        .scene()
        .child("graph-content")
        .and_then(|plot| plot.child("series"))
        .and_then(|series| series.child("series-set1-sig1"))
        .expect("series group");
    let area_d = series
        .child("area")
        .and_then(|area| area.attr("d"))
        .expect("area path");
    assert!(area_d.ends_with('Z'));
    assert!(series.child("line").is_some());
}

#[test]
fn no_data_outcome_sets_the_status_message() {
    struct EmptyBackend;
    impl DataBackend for EmptyBackend {
        fn run_queries(&mut self, queries: &[Query]) -> Result<Vec<QueryResult>, QueryError> {
            Ok(queries
                .iter()
                .map(|query| {
                    let Query::TimeSeries(spec, _) = query else {
                        unreachable!("line charts only issue timeSeries queries");
                    };
                    let mut windows = IndexMap::new();
                    for set_cid in spec.keys() {
                        windows.insert(set_cid.clone(), SignalSetWindow::default());
                    }
                    QueryResult::TimeSeries(windows)
                })
                .collect())
        }
    }

    let mut chart = line_chart(config(), authority(), geometry(), options()).expect("chart");
    chart.refresh(&mut EmptyBackend).expect("refresh");

    let outcome = chart.render().expect("render");
    assert_eq!(outcome, RenderOutcome::NoData);
    assert_eq!(chart.status(), Some(StatusMessage::NoData));
}

#[test]
fn all_null_values_omit_the_axis_but_still_render() {
    struct NullBackend;
    impl DataBackend for NullBackend {
        fn run_queries(&mut self, queries: &[Query]) -> Result<Vec<QueryResult>, QueryError> {
            Ok(queries
                .iter()
                .map(|query| {
                    let Query::TimeSeries(spec, interval) = query else {
                        unreachable!("line charts only issue timeSeries queries");
                    };
                    let step = interval.aggregation_interval_ms.unwrap_or(60_000);
                    let mut windows = IndexMap::new();
                    for set_cid in spec.keys() {
                        let main = (0..3)
                            .map(|idx| {
                                Bucket::new(interval.from + idx * step).with_signal(
                                    "sig1",
                                    single_agg_values(Agg::Avg, None),
                                )
                            })
                            .collect();
                        windows.insert(set_cid.clone(), SignalSetWindow::from_main(main));
                    }
                    QueryResult::TimeSeries(windows)
                })
                .collect())
        }
    }

    let mut chart = line_chart(config(), authority(), geometry(), options()).expect("chart");
    chart.refresh(&mut NullBackend).expect("refresh");

    let outcome = chart.render().expect("render");
    // The window has buckets, so the draw succeeds, but the axis resolves
    // to no domain and is omitted.
    assert_eq!(outcome, RenderOutcome::Success);
    let y_axis = chart.scene().child("y-axis").expect("y axis group");
    assert_eq!(y_axis.child_count(), 0);
}
