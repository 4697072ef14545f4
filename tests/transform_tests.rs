use signal_charts::ChartError;
use signal_charts::core::{Transform, TransformTransition};

#[test]
fn apply_then_invert_round_trips() {
    let transform = Transform::new(2.5, -120.0, 40.0).expect("valid transform");
    let point = (123.4, -56.7);

    let projected = transform.apply(point);
    let recovered = transform.invert(projected);

    assert!((recovered.0 - point.0).abs() <= 1e-9);
    assert!((recovered.1 - point.1).abs() <= 1e-9);
}

#[test]
fn translate_composes_in_untransformed_units() {
    let transform = Transform::new(2.0, 10.0, 0.0).expect("valid transform");
    let translated = transform.translate(5.0, 0.0);

    assert_eq!(translated.k, 2.0);
    assert_eq!(translated.x, 20.0);
}

#[test]
fn non_finite_or_non_positive_scale_is_rejected() {
    assert!(matches!(
        Transform::new(0.0, 0.0, 0.0),
        Err(ChartError::InvalidParameter(_))
    ));
    assert!(matches!(
        Transform::new(f64::NAN, 0.0, 0.0),
        Err(ChartError::InvalidParameter(_))
    ));
    assert!(matches!(
        Transform::new(1.0, f64::INFINITY, 0.0),
        Err(ChartError::InvalidParameter(_))
    ));
}

#[test]
fn approx_eq_uses_interaction_epsilons() {
    let identity = Transform::identity();
    let nearly = Transform {
        k: 1.0005,
        x: 0.005,
        y: -0.005,
    };
    let clearly_not = Transform {
        k: 1.1,
        x: 0.0,
        y: 0.0,
    };

    assert!(identity.approx_eq(nearly));
    assert!(nearly.is_identity());
    assert!(!identity.approx_eq(clearly_not));
}

#[test]
fn scale_clamp_bounds_k() {
    let transform = Transform::new(25.0, 0.0, 0.0).expect("valid transform");
    let clamped = transform.with_scale_clamped(1.0, 10.0);
    assert_eq!(clamped.k, 10.0);

    let transform = Transform::new(0.2, 0.0, 0.0).expect("valid transform");
    let clamped = transform.with_scale_clamped(1.0, 10.0);
    assert_eq!(clamped.k, 1.0);
}

#[test]
fn constrain_pulls_an_overscrolled_view_back_inside() {
    // Scale 2 with zero translate shows the first half of the extent; a
    // large positive translate scrolls before the extent start.
    let transform = Transform::new(2.0, 500.0, 0.0).expect("valid transform");
    let constrained = transform.constrained((100.0, 100.0), ((0.0, 0.0), (100.0, 100.0)));

    // The visible window must start at the extent origin again.
    assert!((constrained.invert_x(0.0) - 0.0).abs() <= 1e-9);
}

#[test]
fn infinite_translate_extent_leaves_the_transform_unchanged() {
    let transform = Transform::new(3.0, -250.0, 12.0).expect("valid transform");
    let constrained = transform.constrained(
        (640.0, 480.0),
        ((f64::NEG_INFINITY, f64::NEG_INFINITY), (f64::INFINITY, f64::INFINITY)),
    );
    assert_eq!(constrained, transform);
}

#[test]
fn transition_samples_linearly_and_reports_completion() {
    let from = Transform::identity();
    let to = Transform::new(3.0, -100.0, 0.0).expect("valid transform");
    let transition =
        TransformTransition::new(from, to, 1.0, 2.0, 1_000, 100).expect("valid transition");

    let (mid, mid_mult, done) = transition.sample(1_050);
    assert!(!done);
    assert!((mid.k - 2.0).abs() <= 1e-9);
    assert!((mid.x - (-50.0)).abs() <= 1e-9);
    assert!((mid_mult - 1.5).abs() <= 1e-9);

    let (end, end_mult, done) = transition.sample(1_100);
    assert!(done);
    assert_eq!(end, to);
    assert_eq!(end_mult, 2.0);
}

#[test]
fn transition_before_start_returns_the_origin() {
    let from = Transform::identity();
    let to = Transform::new(2.0, 10.0, 10.0).expect("valid transform");
    let transition =
        TransformTransition::new(from, to, 1.0, 1.0, 1_000, 100).expect("valid transition");

    let (sampled, _, done) = transition.sample(500);
    assert!(!done);
    assert_eq!(sampled, from);
}

#[test]
fn zero_duration_transition_is_rejected() {
    let err = TransformTransition::new(
        Transform::identity(),
        Transform::identity(),
        1.0,
        1.0,
        0,
        0,
    )
    .expect_err("zero duration");
    assert!(matches!(err, ChartError::InvalidParameter(_)));
}
