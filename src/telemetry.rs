//! Telemetry helpers for applications embedding `signal-charts`.
//!
//! Tracing setup stays explicit and opt-in: dashboards embedding many charts
//! usually own the global subscriber themselves and only want the crate's
//! structured events to flow through it. `init_default_tracing` exists for
//! small hosts and test harnesses that have no subscriber of their own.

/// Initializes a default `tracing` subscriber when the `telemetry` feature is
/// enabled.
///
/// The filter honors `RUST_LOG` and otherwise defaults to `info` globally
/// with `debug` for this crate, which is enough to follow the fetch/zoom
/// lifecycle of a chart.
///
/// Returns `true` when initialization succeeds.
/// Returns `false` when no initialization is performed (feature disabled) or
/// if a global subscriber was already set by the host application.
#[must_use]
pub fn init_default_tracing() -> bool {
    #[cfg(feature = "telemetry")]
    {
        let filter = tracing_subscriber::EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info,signal_charts=debug"));

        return tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_target(false)
            .compact()
            .try_init()
            .is_ok();
    }

    #[cfg(not(feature = "telemetry"))]
    {
        false
    }
}
