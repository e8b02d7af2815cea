use crate::config::{self, CONFIG};
use once_cell::sync::Lazy;
use opentelemetry::trace::TracerProvider as _;
use opentelemetry_sdk::trace::TracerProvider;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Installs the global subscriber, `RUST_LOG` overrides the default `info`.
/// With `TRACE_STDOUT` set, spans are exported to stdout as well.
pub fn init() -> Option<TracerProvider> {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    let provider = if config::trace_stdout() {
        Some(
            TracerProvider::builder()
                .with_simple_exporter(opentelemetry_stdout::SpanExporter::default())
                .build(),
        )
    } else {
        None
    };
    let telemetry = provider
        .as_ref()
        .map(|provider| tracing_opentelemetry::layer().with_tracer(provider.tracer("agri")));

    let _ = tracing_subscriber::registry()
        .with(env_filter)
        .with(fmt::layer().with_target(true))
        .with(telemetry)
        .try_init();
    // Configuration warnings need the subscriber above
    Lazy::force(&CONFIG);
    provider
}
