//! signal-charts: interactive time-series and statistical chart components
//! for dashboards.
//!
//! The crate is headless: charts are deterministic state machines that turn
//! interval changes, fetch results, and pointer/wheel/key events into a
//! retained SVG scene. Hosts drive animated transitions and debounce timers
//! through an explicit `advance(now)` clock and read the scene (or its
//! serialized markup) back out.

pub mod charts;
pub mod context;
pub mod core;
pub mod data;
pub mod error;
pub mod interaction;
pub mod render;
pub mod telemetry;

pub use charts::{LineChart, LineChartConfig, TimeChartOptions, TimeSeriesChart, XyChart};
pub use error::{ChartError, ChartResult};
