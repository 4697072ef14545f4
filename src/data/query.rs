use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::core::bucket::{Agg, SignalSetWindow};
use crate::core::interval::TimeInterval;
use crate::core::types::{SignalId, SignalSetId};
use crate::error::{ChartError, ChartResult};

/// Per signal-set portion of a time-series query.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SignalSetQuery {
    pub ts_sig_cid: SignalId,
    pub signals: IndexMap<SignalId, Vec<Agg>>,
}

/// All signal sets requested by one time-series query.
pub type TimeSeriesSpec = IndexMap<SignalSetId, SignalSetQuery>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortOrder {
    Asc,
    Desc,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DocsSort {
    pub sig_cid: SignalId,
    pub order: SortOrder,
}

/// Raw-document query used by XY-style charts.
///
/// `limit` of `None` means unlimited; backends signal
/// [`QueryError::TooManyPoints`] when the match count would exceed what they
/// are willing to return.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DocsQuery {
    pub sig_set_cid: SignalSetId,
    pub fields: Vec<SignalId>,
    #[serde(default)]
    pub filter: serde_json::Value,
    #[serde(default)]
    pub sort: Vec<DocsSort>,
    pub limit: Option<u64>,
}

/// Typed query envelope sent to the aggregation backend.
///
/// Serializes as `{"type": ..., "args": [...]}`; responses are positionally
/// matched to the request array.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "args", rename_all = "camelCase")]
pub enum Query {
    TimeSeries(TimeSeriesSpec, TimeInterval),
    Aggs(SignalSetId, serde_json::Value),
    Docs(DocsQuery),
    Summary(SignalSetId, serde_json::Value),
    Histogram(SignalSetId, serde_json::Value),
}

/// One positional backend response.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum QueryResult {
    TimeSeries(IndexMap<SignalSetId, SignalSetWindow>),
    Aggs(serde_json::Value),
    Docs(Vec<serde_json::Map<String, serde_json::Value>>),
    Summary(serde_json::Value),
    Histogram(serde_json::Value),
}

impl QueryResult {
    /// Unwraps a time-series response; any other shape is a data error.
    pub fn into_time_series(self) -> ChartResult<IndexMap<SignalSetId, SignalSetWindow>> {
        match self {
            QueryResult::TimeSeries(windows) => Ok(windows),
            other => Err(ChartError::InvalidData(format!(
                "expected a timeSeries result, got {}",
                other.kind()
            ))),
        }
    }

    /// Unwraps a docs response; any other shape is a data error.
    pub fn into_docs(self) -> ChartResult<Vec<serde_json::Map<String, serde_json::Value>>> {
        match self {
            QueryResult::Docs(rows) => Ok(rows),
            other => Err(ChartError::InvalidData(format!(
                "expected a docs result, got {}",
                other.kind()
            ))),
        }
    }

    #[must_use]
    pub fn kind(&self) -> &'static str {
        match self {
            QueryResult::TimeSeries(_) => "timeSeries",
            QueryResult::Aggs(_) => "aggs",
            QueryResult::Docs(_) => "docs",
            QueryResult::Summary(_) => "summary",
            QueryResult::Histogram(_) => "histogram",
        }
    }
}

/// Failure modes reported by the aggregation backend.
#[derive(Debug, Error)]
pub enum QueryError {
    #[error("query would return too many data points")]
    TooManyPoints,

    #[error("backend failure: {0}")]
    Backend(String),
}

impl From<QueryError> for ChartError {
    fn from(err: QueryError) -> Self {
        match err {
            QueryError::TooManyPoints => ChartError::TooManyPoints,
            QueryError::Backend(message) => ChartError::DataLoad(message),
        }
    }
}
