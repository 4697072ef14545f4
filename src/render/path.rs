use std::fmt::Write as _;

use crate::core::bucket::Bucket;
use crate::core::interpolate::PathPoint;
use crate::core::scale::LinearScale;
use crate::render::scene::format_number;

/// Builds a line path string for a stitched series.
///
/// A point is defined when it is a sample whose value resolves to `Some`;
/// undefined points and `Gap` sentinels end the current segment, so the
/// resulting `d` contains one `M...L...` run per contiguous defined stretch.
#[must_use]
pub fn line_path(
    points: &[PathPoint],
    x_scale: &LinearScale,
    y_scale: &LinearScale,
    value_of: impl Fn(&Bucket) -> Option<f64>,
) -> String {
    let mut path = String::new();
    let mut segment_open = false;

    for point in points {
        let defined = point.as_sample().and_then(|bucket| {
            value_of(bucket).map(|value| (bucket.ts as f64, value))
        });

        match defined {
            Some((ts, value)) => {
                let px = x_scale.scale(ts);
                let py = y_scale.scale(value);
                let command = if segment_open { 'L' } else { 'M' };
                let _ = write!(path, "{command}{},{}", format_number(px), format_number(py));
                segment_open = true;
            }
            None => segment_open = false,
        }
    }

    path
}

/// Builds a closed area path between the series line and a pixel baseline.
///
/// Each contiguous defined run becomes its own closed subpath: the top line
/// left to right, then down to the baseline and back.
#[must_use]
pub fn area_path(
    points: &[PathPoint],
    x_scale: &LinearScale,
    y_scale: &LinearScale,
    value_of: impl Fn(&Bucket) -> Option<f64>,
    baseline_px: f64,
) -> String {
    let mut path = String::new();
    let mut run: Vec<(f64, f64)> = Vec::new();

    let mut close_run = |path: &mut String, run: &mut Vec<(f64, f64)>| {
        if run.len() < 2 {
            run.clear();
            return;
        }
        for (idx, (px, py)) in run.iter().enumerate() {
            let command = if idx == 0 { 'M' } else { 'L' };
            let _ = write!(path, "{command}{},{}", format_number(*px), format_number(*py));
        }
        let first = run[0];
        let last = run[run.len() - 1];
        let _ = write!(
            path,
            "L{},{}L{},{}Z",
            format_number(last.0),
            format_number(baseline_px),
            format_number(first.0),
            format_number(baseline_px)
        );
        run.clear();
    };

    for point in points {
        let defined = point.as_sample().and_then(|bucket| {
            value_of(bucket).map(|value| (bucket.ts as f64, value))
        });

        match defined {
            Some((ts, value)) => run.push((x_scale.scale(ts), y_scale.scale(value))),
            None => close_run(&mut path, &mut run),
        }
    }
    close_run(&mut path, &mut run);

    path
}

/// Number of disjoint segments in a path string (one per `M` command).
#[must_use]
pub fn segment_count(path: &str) -> usize {
    path.matches('M').count()
}
