//! Logging initialization and span helpers.

use std::sync::Once;

use tracing::Span;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Environment variable holding the log filter, e.g. `heddle=debug`.
pub const LOG_ENV: &str = "HEDDLE_LOG";

static INIT: Once = Once::new();

/// Install the global subscriber, writing to stderr.
///
/// The filter comes from `HEDDLE_LOG`, falling back to `default_level`.
/// Safe to call multiple times; subsequent calls are no-ops.
pub fn init_logging(default_level: &str) {
    INIT.call_once(|| {
        let filter = EnvFilter::try_from_env(LOG_ENV)
            .or_else(|_| EnvFilter::try_new(default_level))
            .unwrap_or_else(|_| EnvFilter::new("info"));

        tracing_subscriber::registry()
            .with(filter)
            .with(
                fmt::layer()
                    .with_target(false)
                    .with_writer(std::io::stderr),
            )
            .init();
    });
}

/// Span covering the processing of one notification.
#[must_use]
pub fn notification_span(job_id: &str, message_type: &str, stage: &str) -> Span {
    tracing::info_span!(
        "notification",
        job_id = job_id,
        message_type = message_type,
        stage = stage,
    )
}

/// Initialize logging for tests, honouring `HEDDLE_LOG`.
#[cfg(test)]
pub fn init_test_logging() {
    let _ = fmt()
        .with_env_filter(EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new("warn")))
        .with_test_writer()
        .try_init();
}
