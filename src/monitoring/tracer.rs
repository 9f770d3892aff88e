/*!
 * Structured Tracing
 * Subscriber setup for the `tracing` crate
 *
 * Environment variables:
 * - RUST_LOG: Set log level (default: info)
 * - RESALLOC_TRACE_JSON: Enable JSON output (default: false)
 */

use tracing::info;
use tracing_subscriber::{
    fmt::format::FmtSpan, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter,
};

/// Initialize structured tracing
///
/// Safe to call more than once; later calls are no-ops.
pub fn init_tracing() {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    let use_json = std::env::var("RESALLOC_TRACE_JSON")
        .map(|v| v == "1" || v == "true")
        .unwrap_or(false);

    let registry = tracing_subscriber::registry().with(env_filter);

    if use_json {
        // JSON output for production/parsing
        let initialized = registry
            .with(
                tracing_subscriber::fmt::layer()
                    .json()
                    .with_target(true)
                    .with_thread_names(true)
                    .with_current_span(true)
                    .with_span_list(false),
            )
            .try_init()
            .is_ok();
        if initialized {
            info!("Structured tracing initialized with JSON output");
        }
    } else {
        // Human-readable output for development
        let initialized = registry
            .with(
                tracing_subscriber::fmt::layer()
                    .with_target(true)
                    .with_thread_names(true)
                    .with_span_events(FmtSpan::NONE)
                    .compact(),
            )
            .try_init()
            .is_ok();
        if initialized {
            info!("Structured tracing initialized");
        }
    }
}
