//! OTEL tracing bootstrap: console output always, OTLP export when an
//! endpoint is configured. Adapted from the runner's own telemetry
//! conventions — `tracing-subscriber` drives an `EnvFilter`, and
//! `tracing-opentelemetry` bridges spans to an OTLP exporter when present.

use opentelemetry::global;
use opentelemetry::trace::TraceError;
use opentelemetry_sdk::{trace as sdktrace, Resource};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

pub struct TelemetryConfig {
    pub service_name: String,
    pub otlp_endpoint: Option<String>,
    pub log_level: String,
}

impl TelemetryConfig {
    pub fn from_env(app_name: &str, log_level: &str) -> Self {
        Self {
            service_name: app_name.to_string(),
            otlp_endpoint: std::env::var("OTEL_EXPORTER_OTLP_ENDPOINT").ok().filter(|s| !s.is_empty()),
            log_level: log_level.to_string(),
        }
    }
}

fn init_otlp_tracer(config: &TelemetryConfig, endpoint: &str) -> Result<sdktrace::Tracer, TraceError> {
    opentelemetry_otlp::new_pipeline()
        .tracing()
        .with_exporter(opentelemetry_otlp::new_exporter().tonic().with_endpoint(endpoint))
        .with_trace_config(
            sdktrace::config().with_resource(Resource::new(vec![opentelemetry::KeyValue::new(
                "service.name",
                config.service_name.clone(),
            )])),
        )
        .install_batch(opentelemetry_sdk::runtime::Tokio)
}

/// Installs the global `tracing` subscriber. Call once, at process start.
pub fn init_telemetry(config: &TelemetryConfig) {
    let env_filter = EnvFilter::try_new(&config.log_level).unwrap_or_else(|_| EnvFilter::new("info"));
    let fmt_layer = tracing_subscriber::fmt::layer().with_target(false);

    match config.otlp_endpoint.as_deref() {
        Some(endpoint) => match init_otlp_tracer(config, endpoint) {
            Ok(tracer) => {
                let otel_layer = tracing_opentelemetry::layer().with_tracer(tracer);
                let _ = tracing_subscriber::registry().with(env_filter).with(fmt_layer).with(otel_layer).try_init();
            }
            Err(err) => {
                eprintln!("failed to initialize OTLP exporter at {endpoint}: {err}");
                let _ = tracing_subscriber::registry().with(env_filter).with(fmt_layer).try_init();
            }
        },
        None => {
            let _ = tracing_subscriber::registry().with(env_filter).with(fmt_layer).try_init();
        }
    }
}

pub fn shutdown_telemetry() {
    global::shutdown_tracer_provider();
}
