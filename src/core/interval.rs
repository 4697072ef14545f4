use std::cell::RefCell;
use std::rc::Rc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::core::primitives::datetime_to_timestamp;
use crate::core::types::Timestamp;
use crate::error::{ChartError, ChartResult};

/// Ladder of round bucket widths used when negotiating an aggregation
/// interval, in milliseconds (1 ms up to 30 days).
const PREDEFINED_AGGREGATION_INTERVALS_MS: &[i64] = &[
    1,
    2,
    5,
    10,
    20,
    50,
    100,
    200,
    500,
    1_000,
    2_000,
    5_000,
    10_000,
    15_000,
    30_000,
    60_000,
    120_000,
    300_000,
    600_000,
    900_000,
    1_800_000,
    3_600_000,
    7_200_000,
    14_400_000,
    21_600_000,
    43_200_000,
    86_400_000,
    172_800_000,
    604_800_000,
    1_209_600_000,
    2_592_000_000,
];

/// Default pixel width budgeted per aggregation bucket when the chart width
/// drives the negotiated bucket count.
const DEFAULT_PX_PER_BUCKET: f64 = 10.0;

const DEFAULT_TARGET_BUCKET_COUNT: usize = 100;

/// Canonical absolute time interval handed to queries.
///
/// `aggregation_interval_ms` of `None` denotes unaggregated (raw-point) mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeInterval {
    pub from: Timestamp,
    pub to: Timestamp,
    pub aggregation_interval_ms: Option<i64>,
}

impl TimeInterval {
    pub fn new(
        from: Timestamp,
        to: Timestamp,
        aggregation_interval_ms: Option<i64>,
    ) -> ChartResult<Self> {
        if from >= to {
            return Err(ChartError::InvalidParameter(format!(
                "interval `from` ({from}) must precede `to` ({to})"
            )));
        }
        // An explicit zero means raw mode; store it as the canonical `None`.
        let aggregation_interval_ms = match aggregation_interval_ms {
            Some(width) if width < 0 => {
                return Err(ChartError::InvalidParameter(format!(
                    "aggregation interval must be >= 0, got {width}"
                )));
            }
            Some(0) | None => None,
            Some(width) => Some(width),
        };
        Ok(Self {
            from,
            to,
            aggregation_interval_ms,
        })
    }

    #[must_use]
    pub fn span_ms(self) -> i64 {
        self.to - self.from
    }

    #[must_use]
    pub fn is_aggregated(self) -> bool {
        self.aggregation_interval_ms.is_some()
    }
}

/// Aggregation requested by an interval spec.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AggregationSpec {
    /// Negotiate a bucket width from the span and the target bucket count.
    Auto,
    /// Unaggregated raw points.
    Raw,
    /// Fixed bucket width in milliseconds.
    FixedMs(i64),
}

/// Opaque interval token owned by the interval authority.
///
/// Consumers compare specs only by equality; the fields are interpreted
/// solely by [`TimeIntervalHub`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct IntervalSpec {
    from: Timestamp,
    to: Timestamp,
    aggregation: AggregationSpec,
}

impl IntervalSpec {
    pub fn new(from: Timestamp, to: Timestamp, aggregation: AggregationSpec) -> ChartResult<Self> {
        if from >= to {
            return Err(ChartError::InvalidParameter(format!(
                "interval spec `from` ({from}) must precede `to` ({to})"
            )));
        }
        if let AggregationSpec::FixedMs(width) = aggregation {
            if width <= 0 {
                return Err(ChartError::InvalidParameter(format!(
                    "fixed aggregation interval must be > 0, got {width}"
                )));
            }
        }
        Ok(Self {
            from,
            to,
            aggregation,
        })
    }

    /// Spec covering `[from, to]` with auto-negotiated aggregation.
    pub fn auto(from: Timestamp, to: Timestamp) -> ChartResult<Self> {
        Self::new(from, to, AggregationSpec::Auto)
    }

    /// Spec between two absolute datetimes with auto-negotiated aggregation.
    pub fn auto_between(from: DateTime<Utc>, to: DateTime<Utc>) -> ChartResult<Self> {
        Self::auto(datetime_to_timestamp(from), datetime_to_timestamp(to))
    }
}

/// Time interval authority protocol consumed by charts.
///
/// The spec token is opaque: implementations may carry whatever state they
/// need, consumers only compare tokens for equality.
pub trait IntervalAuthority {
    fn interval_absolute(&self) -> TimeInterval;
    fn interval_spec(&self) -> IntervalSpec;
    fn set_spec(&self, spec: IntervalSpec) -> ChartResult<()>;
    fn round_to_min_aggregation_interval(
        &self,
        from: Timestamp,
        to: Timestamp,
    ) -> (Timestamp, Timestamp);
}

/// Owns the canonical time interval shared by the charts of one dashboard.
///
/// Change detection is polling-based: every mutation bumps `revision`, and
/// consumers re-check the spec/absolute interval on their next tick.
#[derive(Debug)]
pub struct TimeIntervalHub {
    spec: IntervalSpec,
    min_aggregation_interval_ms: i64,
    target_bucket_count: usize,
    revision: u64,
}

impl TimeIntervalHub {
    pub fn new(spec: IntervalSpec) -> Self {
        Self {
            spec,
            min_aggregation_interval_ms: 0,
            target_bucket_count: DEFAULT_TARGET_BUCKET_COUNT,
            revision: 0,
        }
    }

    #[must_use]
    pub fn with_min_aggregation_interval_ms(mut self, min_ms: i64) -> Self {
        self.min_aggregation_interval_ms = min_ms.max(0);
        self
    }

    #[must_use]
    pub fn revision(&self) -> u64 {
        self.revision
    }

    #[must_use]
    pub fn spec(&self) -> IntervalSpec {
        self.spec
    }

    pub fn set_spec(&mut self, spec: IntervalSpec) {
        if self.spec != spec {
            debug!(from = spec.from, to = spec.to, "interval spec replaced");
            self.spec = spec;
            self.revision += 1;
        }
    }

    /// Negotiates the bucket count from the rendered chart width.
    ///
    /// Returns `true` when the change affects the absolute interval, in which
    /// case consumers should refetch.
    pub fn set_chart_width(&mut self, width_px: f64) -> bool {
        if !width_px.is_finite() || width_px <= 0.0 {
            return false;
        }
        let target = ((width_px / DEFAULT_PX_PER_BUCKET).floor() as usize).max(1);
        if target == self.target_bucket_count {
            return false;
        }
        let before = self.absolute();
        self.target_bucket_count = target;
        let changed = self.absolute() != before;
        if changed {
            self.revision += 1;
        }
        changed
    }

    /// Resolves the absolute interval, negotiating the aggregation interval
    /// when the spec asks for `Auto`.
    #[must_use]
    pub fn absolute(&self) -> TimeInterval {
        let aggregation_interval_ms = match self.spec.aggregation {
            AggregationSpec::Raw => None,
            AggregationSpec::FixedMs(width) => Some(width.max(self.min_aggregation_interval_ms)),
            AggregationSpec::Auto => self.negotiated_interval_ms(self.spec.to - self.spec.from),
        };
        TimeInterval {
            from: self.spec.from,
            to: self.spec.to,
            aggregation_interval_ms,
        }
    }

    /// Rounds `[from, to]` outward to the bucket grid the span would be
    /// aggregated with, so a zoom/brush request starts on bucket boundaries.
    #[must_use]
    pub fn round_to_min_aggregation_interval(
        &self,
        from: Timestamp,
        to: Timestamp,
    ) -> (Timestamp, Timestamp) {
        match self.negotiated_interval_ms(to - from) {
            None => (from, to),
            Some(width) => (
                from.div_euclid(width) * width,
                to.div_euclid(width) * width + if to.rem_euclid(width) == 0 { 0 } else { width },
            ),
        }
    }

    fn negotiated_interval_ms(&self, span_ms: i64) -> Option<i64> {
        if span_ms <= 0 {
            return None;
        }
        let needed = (span_ms as f64 / self.target_bucket_count as f64).ceil() as i64;
        let needed = needed.max(self.min_aggregation_interval_ms);
        if needed <= 1 && self.min_aggregation_interval_ms == 0 {
            // Fewer candidate points than target buckets: raw mode.
            return None;
        }
        let width = PREDEFINED_AGGREGATION_INTERVALS_MS
            .iter()
            .copied()
            .find(|candidate| *candidate >= needed)
            .unwrap_or_else(|| *PREDEFINED_AGGREGATION_INTERVALS_MS.last().expect("ladder"));
        Some(width)
    }
}

/// Cloneable handle sharing one [`TimeIntervalHub`] across sibling charts.
#[derive(Debug, Clone)]
pub struct SharedTimeInterval {
    inner: Rc<RefCell<TimeIntervalHub>>,
}

impl SharedTimeInterval {
    #[must_use]
    pub fn new(hub: TimeIntervalHub) -> Self {
        Self {
            inner: Rc::new(RefCell::new(hub)),
        }
    }

    #[must_use]
    pub fn revision(&self) -> u64 {
        self.inner.borrow().revision()
    }

    /// See [`TimeIntervalHub::set_chart_width`].
    pub fn set_chart_width(&self, width_px: f64) -> bool {
        self.inner.borrow_mut().set_chart_width(width_px)
    }
}

impl IntervalAuthority for SharedTimeInterval {
    fn interval_absolute(&self) -> TimeInterval {
        self.inner.borrow().absolute()
    }

    fn interval_spec(&self) -> IntervalSpec {
        self.inner.borrow().spec()
    }

    fn set_spec(&self, spec: IntervalSpec) -> ChartResult<()> {
        self.inner.borrow_mut().set_spec(spec);
        Ok(())
    }

    fn round_to_min_aggregation_interval(
        &self,
        from: Timestamp,
        to: Timestamp,
    ) -> (Timestamp, Timestamp) {
        self.inner.borrow().round_to_min_aggregation_interval(from, to)
    }
}
