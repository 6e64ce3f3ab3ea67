//! Observability ambient stack: id generation, structured JSON logging,
//! counter metrics, and OTEL tracing bootstrap.

pub mod ids;
pub mod logger;
pub mod metrics;
pub mod telemetry;

pub use ids::{new_run_id, new_step_attempt_id, new_trace_id, trace_export_path, utc_now_iso};
pub use logger::StructuredLogger;
pub use metrics::MetricsRegistry;
