//! Pool telemetry.
//!
//! Counters are always collected. The task latency histogram needs the
//! `telemetry` feature; without it latency fields of a snapshot stay zero.

pub mod metrics;

pub use metrics::{Metrics, MetricsSnapshot};
