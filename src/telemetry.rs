//! Logging setup for the relay
//!
//! Everything the service logs goes through `tracing`: one span per HTTP
//! request from `tower_http`'s `TraceLayer`, plus events from the handlers and
//! the dispatcher carrying `request_id`, `provider`, upstream `status` and
//! `duration_ms` fields. Credentials never appear in any field.

use std::sync::Once;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

static INIT: Once = Once::new();

/// Filter directive used when `RUST_LOG` is not set
///
/// Our own events follow `observability.log_level`. Request spans and the
/// response events from `tower_http` are kept at debug whatever that level is.
pub fn default_directive(level: &str) -> String {
    format!("flarerelay={},tower_http=debug", level)
}

/// Install the global subscriber writing human-readable lines to stdout
///
/// `RUST_LOG` replaces [`default_directive`] entirely. Only the first call in
/// a process installs anything, so tests may call it freely.
///
/// ```no_run
/// flarerelay::telemetry::init("debug");
/// tracing::info!(provider = "openrouter", "relay ready");
/// ```
pub fn init(log_level: &str) {
    INIT.call_once(|| {
        let filter = EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new(default_directive(log_level)));

        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer().with_target(false))
            .init();
    });
}
