use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use rust_decimal::prelude::ToPrimitive;

use crate::core::types::Timestamp;
use crate::error::{ChartError, ChartResult};

pub fn decimal_to_f64(value: Decimal, field_name: &str) -> ChartResult<f64> {
    value.to_f64().ok_or_else(|| {
        ChartError::InvalidData(format!("{field_name} cannot be represented as f64"))
    })
}

#[must_use]
pub fn datetime_to_timestamp(time: DateTime<Utc>) -> Timestamp {
    time.timestamp_millis()
}

pub fn timestamp_to_datetime(ts: Timestamp) -> ChartResult<DateTime<Utc>> {
    DateTime::<Utc>::from_timestamp_millis(ts)
        .ok_or_else(|| ChartError::InvalidData(format!("timestamp {ts} is out of range")))
}
