use proptest::prelude::*;
use signal_charts::core::{LinearScale, Transform};

proptest! {
    #[test]
    fn linear_scale_round_trip_property(
        domain_start in -1_000_000.0f64..1_000_000.0,
        domain_span in 0.001f64..1_000_000.0,
        value_factor in 0.0f64..1.0
    ) {
        let domain_end = domain_start + domain_span;
        let value = domain_start + value_factor * domain_span;

        let scale = LinearScale::new((domain_start, domain_end), (0.0, 2_048.0))
            .expect("valid scale");

        let px = scale.scale(value);
        let recovered = scale.invert(px);

        prop_assert!((recovered - value).abs() <= 1e-6 * (1.0 + value.abs()));
    }

    #[test]
    fn inverted_range_round_trip_property(
        domain_span in 0.001f64..1_000_000.0,
        value_factor in 0.0f64..1.0
    ) {
        let value = value_factor * domain_span;
        let scale = LinearScale::new((0.0, domain_span), (1_024.0, 0.0)).expect("valid scale");

        let recovered = scale.invert(scale.scale(value));
        prop_assert!((recovered - value).abs() <= 1e-6 * (1.0 + value.abs()));
    }

    #[test]
    fn rescaled_domain_matches_the_transformed_view(
        k in 0.5f64..50.0,
        x in -5_000.0f64..5_000.0
    ) {
        let scale = LinearScale::new((0.0, 1_000.0), (0.0, 500.0)).expect("valid scale");
        let transform = Transform::new(k, x, 0.0).expect("valid transform");
        let rescaled = scale.rescaled_x(transform).expect("rescaled");

        // A domain value rendered through the zoomed scale lands where the
        // transform maps its untransformed pixel.
        let value = 400.0;
        let direct = transform.apply_x(scale.scale(value));
        let via_rescaled = rescaled.scale(value);
        prop_assert!((direct - via_rescaled).abs() <= 1e-6 * (1.0 + direct.abs()));
    }

    #[test]
    fn ticks_are_sorted_and_inside_the_domain(
        start in -10_000.0f64..10_000.0,
        span in 1.0f64..100_000.0,
        count in 2usize..12
    ) {
        let scale = LinearScale::new((start, start + span), (0.0, 1_000.0))
            .expect("valid scale");
        let ticks = scale.ticks(count);

        for pair in ticks.windows(2) {
            prop_assert!(pair[0] < pair[1]);
        }
        for tick in &ticks {
            prop_assert!(*tick >= start - 1e-9 * span.abs());
            prop_assert!(*tick <= start + span + 1e-9 * span.abs());
        }
    }
}
