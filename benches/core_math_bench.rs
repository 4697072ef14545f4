use criterion::{Criterion, criterion_group, criterion_main};
use std::hint::black_box;

use signal_charts::core::{
    Agg, Bucket, LinearScale, SignalSetWindow, Transform, single_agg_values,
    split_discontinuities, stitch_window,
};
use signal_charts::interaction::nearest_index;
use signal_charts::render::line_path;

fn bench_transform_round_trip(c: &mut Criterion) {
    let transform = Transform::new(2.5, -320.0, 48.0).expect("valid transform");

    c.bench_function("transform_round_trip", |b| {
        b.iter(|| {
            let projected = transform.apply(black_box((431.25, 88.5)));
            let _ = transform.invert(black_box(projected));
        })
    });
}

fn window_10k() -> SignalSetWindow {
    let main: Vec<Bucket> = (0..10_000)
        .map(|idx| {
            let ts = idx * 60_000;
            Bucket::new(ts).with_signal(
                "sig",
                single_agg_values(Agg::Avg, Some((idx % 100) as f64)),
            )
        })
        .collect();

    SignalSetWindow {
        prev: Some(Bucket::new(-60_000).with_signal("sig", single_agg_values(Agg::Avg, Some(0.0)))),
        main,
        next: Some(
            Bucket::new(600_000_000).with_signal("sig", single_agg_values(Agg::Avg, Some(0.0))),
        ),
    }
}

fn bench_stitch_window_10k(c: &mut Criterion) {
    let window = window_10k();
    let signals = vec!["sig".to_owned()];

    c.bench_function("stitch_window_10k", |b| {
        b.iter(|| {
            let _ = stitch_window(
                black_box(&window),
                black_box(-30_000),
                black_box(599_990_000),
                black_box(&signals),
                black_box(&[Agg::Avg]),
            );
        })
    });
}

fn bench_line_path_10k(c: &mut Criterion) {
    let window = window_10k();
    let points = split_discontinuities(window.main.clone(), Some(120.0));
    let x_scale = LinearScale::new((0.0, 600_000_000.0), (0.0, 1_920.0)).expect("x scale");
    let y_scale = LinearScale::new((0.0, 100.0), (1_080.0, 0.0)).expect("y scale");

    c.bench_function("line_path_10k", |b| {
        b.iter(|| {
            let _ = line_path(
                black_box(&points),
                black_box(&x_scale),
                black_box(&y_scale),
                |bucket| bucket.value("sig", Agg::Avg),
            );
        })
    });
}

fn bench_nearest_index_10k(c: &mut Criterion) {
    let window = window_10k();

    c.bench_function("nearest_index_10k", |b| {
        b.iter(|| {
            let _ = nearest_index(black_box(&window.main), black_box(299_987_123.0));
        })
    });
}

criterion_group!(
    benches,
    bench_transform_round_trip,
    bench_stitch_window_10k,
    bench_line_path_10k,
    bench_nearest_index_10k
);
criterion_main!(benches);
