pub mod base;
pub mod line;
pub mod xy;

pub use base::{
    ChartShape, ConfigDifference, DrawContext, RenderOutcome, StatusMessage, TimeChartOptions,
    TimeSeriesChart,
};
pub use line::{
    LineChart, LineChartConfig, LineShape, LineVisibilityPolicy, SignalConfig, SignalSetConfig,
    area_chart, compare_line_configs, line_chart,
};
pub use xy::{XyChart, XyChartConfig, XySelection, XySignalConfig};
