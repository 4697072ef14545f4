use indexmap::IndexMap;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::core::primitives::decimal_to_f64;
use crate::core::types::{SignalId, Timestamp};
use crate::error::{ChartError, ChartResult};

/// Aggregate statistic computed per bucket and signal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Agg {
    Min,
    Max,
    Avg,
    Sum,
    Count,
}

impl Agg {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Agg::Min => "min",
            Agg::Max => "max",
            Agg::Avg => "avg",
            Agg::Sum => "sum",
            Agg::Count => "count",
        }
    }
}

/// Per-signal aggregate values of one bucket.
///
/// A value of `None` means "no data". Non-finite numbers never survive
/// ingestion; `normalize` rewrites them to `None`.
pub type SignalValues = IndexMap<Agg, Option<f64>>;

/// One aggregated time-window's worth of per-signal statistics.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Bucket {
    pub ts: Timestamp,
    pub data: IndexMap<SignalId, SignalValues>,
}

impl Bucket {
    #[must_use]
    pub fn new(ts: Timestamp) -> Self {
        Self {
            ts,
            data: IndexMap::new(),
        }
    }

    #[must_use]
    pub fn with_signal(mut self, signal: impl Into<SignalId>, values: SignalValues) -> Self {
        self.data.insert(signal.into(), values);
        self
    }

    /// Ingestion helper for backends reporting exact decimal aggregates.
    pub fn with_decimal_signal(
        mut self,
        signal: impl Into<SignalId>,
        agg: Agg,
        value: Decimal,
    ) -> ChartResult<Self> {
        let signal = signal.into();
        let value = decimal_to_f64(value, &signal)?;
        self.data
            .entry(signal)
            .or_default()
            .insert(agg, Some(value));
        Ok(self)
    }

    /// Looks up one aggregate value; absent signals and aggregates read as `None`.
    #[must_use]
    pub fn value(&self, signal: &str, agg: Agg) -> Option<f64> {
        self.data.get(signal).and_then(|values| values.get(&agg).copied().flatten())
    }

    /// Rewrites non-finite aggregate values to `None`.
    ///
    /// Returns the number of rewritten values.
    pub fn normalize(&mut self) -> usize {
        let mut rewritten = 0;
        for values in self.data.values_mut() {
            for value in values.values_mut() {
                if let Some(number) = *value {
                    if !number.is_finite() {
                        *value = None;
                        rewritten += 1;
                    }
                }
            }
        }
        rewritten
    }
}

/// Convenience constructor for buckets carrying a single-aggregate signal.
#[must_use]
pub fn single_agg_values(agg: Agg, value: Option<f64>) -> SignalValues {
    let mut values = SignalValues::new();
    values.insert(agg, value);
    values
}

/// Per signal-set fetch result for one time window.
///
/// `main` holds the buckets whose timestamp falls inside `[from, to)`;
/// `prev`/`next` are the single closest buckets immediately outside the
/// window on each side, used for boundary interpolation.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SignalSetWindow {
    pub prev: Option<Bucket>,
    pub main: Vec<Bucket>,
    pub next: Option<Bucket>,
}

impl SignalSetWindow {
    #[must_use]
    pub fn from_main(main: Vec<Bucket>) -> Self {
        Self {
            prev: None,
            main,
            next: None,
        }
    }

    /// Checks the window ordering invariants.
    ///
    /// `main` must be timestamp-sorted ascending, `prev` must precede the
    /// first main bucket and `next` must follow the last one.
    pub fn validate(&self) -> ChartResult<()> {
        for pair in self.main.windows(2) {
            if pair[0].ts >= pair[1].ts {
                return Err(ChartError::InvalidData(format!(
                    "window buckets out of order at ts {} >= {}",
                    pair[0].ts, pair[1].ts
                )));
            }
        }

        if let (Some(prev), Some(first)) = (&self.prev, self.main.first()) {
            if prev.ts >= first.ts {
                return Err(ChartError::InvalidData(format!(
                    "prev bucket ts {} must precede first main bucket ts {}",
                    prev.ts, first.ts
                )));
            }
        }

        if let (Some(next), Some(last)) = (&self.next, self.main.last()) {
            if next.ts <= last.ts {
                return Err(ChartError::InvalidData(format!(
                    "next bucket ts {} must follow last main bucket ts {}",
                    next.ts, last.ts
                )));
            }
        }

        if let (Some(prev), Some(next)) = (&self.prev, &self.next) {
            if self.main.is_empty() && prev.ts >= next.ts {
                return Err(ChartError::InvalidData(format!(
                    "prev bucket ts {} must precede next bucket ts {}",
                    prev.ts, next.ts
                )));
            }
        }

        Ok(())
    }

    /// Normalizes every bucket in the window; see [`Bucket::normalize`].
    pub fn normalize(&mut self) -> usize {
        let mut rewritten = 0;
        if let Some(prev) = &mut self.prev {
            rewritten += prev.normalize();
        }
        for bucket in &mut self.main {
            rewritten += bucket.normalize();
        }
        if let Some(next) = &mut self.next {
            rewritten += next.normalize();
        }
        if rewritten > 0 {
            warn!(rewritten, "normalized non-finite aggregate values to null");
        }
        rewritten
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.prev.is_none() && self.main.is_empty() && self.next.is_none()
    }
}
