use indexmap::IndexMap;
use ordered_float::OrderedFloat;
use smallvec::SmallVec;

use crate::core::bucket::{Bucket, SignalSetWindow};
use crate::core::types::{SignalSetId, Timestamp};

/// One selected bucket: its index into the window's `main` array plus its
/// timestamp.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SelectedPoint {
    pub index: usize,
    pub ts: Timestamp,
}

/// Transient pointer-derived selection shared with tooltips and markers.
///
/// Recomputed on every pointer move and cleared on pointer leave; never
/// persisted.
#[derive(Debug, Clone, PartialEq)]
pub struct Selection {
    pub by_set: IndexMap<SignalSetId, SelectedPoint>,
    pub mouse: (f64, f64),
}

/// Index of the bucket nearest to `ts_ms` in a timestamp-sorted slice.
///
/// Bisects to the insertion point, then ties break toward the neighbour with
/// the smaller absolute time delta.
#[must_use]
pub fn nearest_index(main: &[Bucket], ts_ms: f64) -> Option<usize> {
    if main.is_empty() {
        return None;
    }

    let mut idx = main.partition_point(|bucket| (bucket.ts as f64) <= ts_ms);
    if idx >= main.len() {
        idx = main.len() - 1;
    } else if idx > 0 {
        let left = main[idx - 1].ts as f64;
        let right = main[idx].ts as f64;
        if ts_ms - left < right - ts_ms {
            idx -= 1;
        }
    }
    Some(idx)
}

/// Selects the nearest bucket per signal set, then keeps only the sets whose
/// candidate lies within the globally smallest time distance.
///
/// Ties are inclusive, so two sets with equidistant points both stay
/// selected; this produces the single-timestamp cross-series selection that
/// multi-line tooltips rely on. Returns `None` when no set has data.
#[must_use]
pub fn select_nearest(
    windows: &IndexMap<SignalSetId, SignalSetWindow>,
    ts_ms: f64,
    mouse: (f64, f64),
) -> Option<Selection> {
    let mut candidates: SmallVec<[(&SignalSetId, SelectedPoint, OrderedFloat<f64>); 4]> =
        SmallVec::new();

    for (set_cid, window) in windows {
        let Some(index) = nearest_index(&window.main, ts_ms) else {
            continue;
        };
        let ts = window.main[index].ts;
        let distance = OrderedFloat((ts as f64 - ts_ms).abs());
        candidates.push((set_cid, SelectedPoint { index, ts }, distance));
    }

    let min_distance = candidates.iter().map(|(_, _, dist)| *dist).min()?;

    let by_set = candidates
        .into_iter()
        .filter(|(_, _, dist)| *dist <= min_distance)
        .map(|(set_cid, point, _)| (set_cid.clone(), point))
        .collect();

    Some(Selection { by_set, mouse })
}
