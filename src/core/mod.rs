pub mod bucket;
pub mod domain;
pub mod interpolate;
pub mod interval;
pub mod primitives;
pub mod scale;
pub mod transform;
pub mod types;

pub use bucket::{Agg, Bucket, SignalSetWindow, SignalValues, single_agg_values};
pub use domain::{
    AxisExtents, AxisPosition, MAX_VISIBLE_Y_AXES, YAxisConfig, assign_axis_positions,
    axis_position, resolve_categorical_domain,
};
pub use interpolate::{PathPoint, interpolate_bucket, split_discontinuities, stitch_window};
pub use interval::{
    AggregationSpec, IntervalAuthority, IntervalSpec, SharedTimeInterval, TimeInterval,
    TimeIntervalHub,
};
pub use primitives::{datetime_to_timestamp, decimal_to_f64, timestamp_to_datetime};
pub use scale::{BandScale, LinearScale};
pub use transform::{Transform, TransformTransition};
pub use types::{ChartGeometry, Margin, SignalId, SignalSetId, Timestamp, distance};
