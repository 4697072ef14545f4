use approx::assert_abs_diff_eq;
use signal_charts::ChartError;
use signal_charts::core::{LinearScale, Transform};
use signal_charts::interaction::{
    BrushSelection2D, BrushSelectionX, ViewLimits, brush_to_limits, brush_to_time_interval,
    limits_to_transform,
};

#[test]
fn horizontal_brush_inverts_through_the_x_scale() {
    let scale = LinearScale::new((0.0, 1_000.0), (0.0, 100.0)).expect("scale");
    let (from, to) = brush_to_time_interval(BrushSelectionX { x0: 25.0, x1: 75.0 }, &scale)
        .expect("interval");

    assert_eq!(from, 250);
    assert_eq!(to, 750);
}

#[test]
fn reversed_brush_coordinates_normalize() {
    let scale = LinearScale::new((0.0, 1_000.0), (0.0, 100.0)).expect("scale");
    let (from, to) = brush_to_time_interval(BrushSelectionX { x0: 75.0, x1: 25.0 }, &scale)
        .expect("interval");

    assert!(from < to);
}

#[test]
fn view_limits_reject_non_finite_bounds() {
    let err = ViewLimits::new(f64::NAN, 1.0, 0.0, 1.0).expect_err("nan bound");
    assert!(matches!(err, ChartError::InvalidParameter(_)));

    let err = ViewLimits::new(0.0, 1.0, 2.0, 1.0).expect_err("inverted bounds");
    assert!(matches!(err, ChartError::InvalidParameter(_)));
}

#[test]
fn rect_brush_maps_top_edge_to_y_max() {
    let x_scale = LinearScale::new((0.0, 100.0), (0.0, 100.0)).expect("x scale");
    let y_scale = LinearScale::new((0.0, 100.0), (100.0, 0.0)).expect("y scale");

    let limits = brush_to_limits(
        BrushSelection2D {
            x0: 20.0,
            y0: 10.0,
            x1: 60.0,
            y1: 90.0,
        },
        &x_scale,
        &y_scale,
    )
    .expect("limits");

    assert_eq!(limits.x_min, 20.0);
    assert_eq!(limits.x_max, 60.0);
    // Pixel y grows downward: y1 (bottom) is the smaller domain value.
    assert_eq!(limits.y_min, 10.0);
    assert_eq!(limits.y_max, 90.0);
}

#[test]
fn limits_to_transform_reproduces_the_requested_view() {
    let width = 800.0;
    let height = 400.0;
    let base_x = LinearScale::new((0.0, 100.0), (0.0, width)).expect("x scale");
    let base_y = LinearScale::new((0.0, 100.0), (height, 0.0)).expect("y scale");

    let limits = ViewLimits::new(20.0, 40.0, 30.0, 60.0).expect("limits");
    let (transform, y_multiplier) =
        limits_to_transform(limits, &base_x, &base_y, Transform::identity(), 1.0)
            .expect("transform");

    // Independent X/Y zoom: the Y multiplier absorbs the aspect difference.
    assert_abs_diff_eq!(transform.k, 5.0, epsilon = 1e-9);
    assert_abs_diff_eq!(y_multiplier, 2.0 / 3.0, epsilon = 1e-9);

    let x_domain = base_x.rescaled_x(transform).expect("rescale x").domain();
    let y_domain = base_y
        .rescaled_y(transform, y_multiplier)
        .expect("rescale y")
        .domain();

    assert_abs_diff_eq!(x_domain.0, 20.0, epsilon = 1e-9);
    assert_abs_diff_eq!(x_domain.1, 40.0, epsilon = 1e-9);
    assert_abs_diff_eq!(y_domain.0, 30.0, epsilon = 1e-9);
    assert_abs_diff_eq!(y_domain.1, 60.0, epsilon = 1e-9);
}

#[test]
fn limits_to_transform_composes_with_an_existing_zoom() {
    let width = 800.0;
    let height = 400.0;
    let base_x = LinearScale::new((0.0, 100.0), (0.0, width)).expect("x scale");
    let base_y = LinearScale::new((0.0, 100.0), (height, 0.0)).expect("y scale");

    // First zoom into [20, 40] x [30, 60].
    let first = ViewLimits::new(20.0, 40.0, 30.0, 60.0).expect("limits");
    let (transform, multiplier) =
        limits_to_transform(first, &base_x, &base_y, Transform::identity(), 1.0)
            .expect("transform");

    let x_scale = base_x.rescaled_x(transform).expect("rescale x");
    let y_scale = base_y.rescaled_y(transform, multiplier).expect("rescale y");

    // Then zoom further into [25, 35] x [40, 50] of the already-zoomed view.
    let second = ViewLimits::new(25.0, 35.0, 40.0, 50.0).expect("limits");
    let (transform, multiplier) =
        limits_to_transform(second, &x_scale, &y_scale, transform, multiplier)
            .expect("transform");

    let x_domain = base_x.rescaled_x(transform).expect("rescale x").domain();
    let y_domain = base_y
        .rescaled_y(transform, multiplier)
        .expect("rescale y")
        .domain();

    assert_abs_diff_eq!(x_domain.0, 25.0, epsilon = 1e-6);
    assert_abs_diff_eq!(x_domain.1, 35.0, epsilon = 1e-6);
    assert_abs_diff_eq!(y_domain.0, 40.0, epsilon = 1e-6);
    assert_abs_diff_eq!(y_domain.1, 50.0, epsilon = 1e-6);
}
