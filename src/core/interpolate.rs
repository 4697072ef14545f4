use crate::core::bucket::{Agg, Bucket, SignalSetWindow, SignalValues};
use crate::core::types::{SignalId, Timestamp};

/// One entry of a stitched series: a real/synthetic sample, or a gap marker
/// that forces the path builder to start a new segment.
#[derive(Debug, Clone, PartialEq)]
pub enum PathPoint {
    Sample(Bucket),
    Gap,
}

impl PathPoint {
    #[must_use]
    pub fn as_sample(&self) -> Option<&Bucket> {
        match self {
            PathPoint::Sample(bucket) => Some(bucket),
            PathPoint::Gap => None,
        }
    }
}

/// Stitches a fetched window into an ordered sample sequence covering
/// exactly `[from, to]`.
///
/// When `prev`/`next` exist and `main` does not already touch the boundary,
/// a synthetic endpoint is interpolated at the boundary timestamp. With an
/// empty `main` and both neighbours present, exactly two synthetic points
/// (at `from` and `to`) are produced; no intermediate points are fabricated.
#[must_use]
pub fn stitch_window(
    window: &SignalSetWindow,
    from: Timestamp,
    to: Timestamp,
    signals: &[SignalId],
    aggs: &[Agg],
) -> Vec<Bucket> {
    if window.main.is_empty() {
        return match (&window.prev, &window.next) {
            (Some(prev), Some(next)) => vec![
                interpolate_bucket(from, prev, next, signals, aggs),
                interpolate_bucket(to, prev, next, signals, aggs),
            ],
            _ => Vec::new(),
        };
    }

    let mut points = window.main.clone();

    if let Some(prev) = &window.prev {
        let first = &points[0];
        if first.ts > from {
            let boundary = interpolate_bucket(from, prev, first, signals, aggs);
            points.insert(0, boundary);
        }
    }

    if let Some(next) = &window.next {
        let last = points.last().expect("non-empty points");
        if last.ts < to {
            let boundary = interpolate_bucket(to, last, next, signals, aggs);
            points.push(boundary);
        }
    }

    points
}

/// Linearly interpolates a synthetic bucket at `at`, per signal and per
/// aggregate field.
///
/// If either endpoint value is missing, the interpolated value is missing as
/// well; interpolation never fabricates data across a no-data endpoint.
#[must_use]
pub fn interpolate_bucket(
    at: Timestamp,
    before: &Bucket,
    after: &Bucket,
    signals: &[SignalId],
    aggs: &[Agg],
) -> Bucket {
    let delta = (at - before.ts) as f64 / (after.ts - before.ts) as f64;

    let mut bucket = Bucket::new(at);
    for signal in signals {
        let mut values = SignalValues::new();
        for agg in aggs {
            let interpolated = match (before.value(signal, *agg), after.value(signal, *agg)) {
                (Some(a), Some(b)) => Some(a * (1.0 - delta) + b * delta),
                _ => None,
            };
            values.insert(*agg, interpolated);
        }
        bucket.data.insert(signal.clone(), values);
    }
    bucket
}

/// Splits a stitched sequence at gaps wider than `max_gap_seconds`.
///
/// A `Gap` marker is inserted between consecutive samples farther apart than
/// the threshold so the line renders disjoint segments instead of connecting
/// across the gap.
#[must_use]
pub fn split_discontinuities(points: Vec<Bucket>, max_gap_seconds: Option<f64>) -> Vec<PathPoint> {
    let Some(max_gap_seconds) = max_gap_seconds else {
        return points.into_iter().map(PathPoint::Sample).collect();
    };

    let max_gap_ms = max_gap_seconds * 1000.0;
    let mut result = Vec::with_capacity(points.len());
    let mut last_ts: Option<Timestamp> = None;

    for bucket in points {
        if let Some(last) = last_ts {
            if (bucket.ts - last) as f64 > max_gap_ms {
                result.push(PathPoint::Gap);
            }
        }
        last_ts = Some(bucket.ts);
        result.push(PathPoint::Sample(bucket));
    }

    result
}
