#![forbid(unsafe_code)]

//! Subscriber setup for applications embedding pagetree.
//!
//! Library code only emits `tracing` spans and events (`pagetree.toggle`,
//! `pagetree.action.*`, `pagetree.dispatch`, `pagetree.notify`). Installing
//! a subscriber is the application's call; these helpers cover the common
//! case.
//!
//! The filter is read from `PAGETREE_LOG` using `EnvFilter` syntax, e.g.
//! `PAGETREE_LOG=pagetree_runtime=debug,info`. When unset or unparsable it
//! falls back to [`DEFAULT_FILTER`].

use tracing_subscriber::EnvFilter;
use tracing_subscriber::util::TryInitError;

/// Environment variable holding the log filter.
pub const LOG_ENV: &str = "PAGETREE_LOG";

/// Filter used when [`LOG_ENV`] is unset or invalid.
pub const DEFAULT_FILTER: &str = "info";

/// Build the filter from [`LOG_ENV`].
#[must_use]
pub fn env_filter() -> EnvFilter {
    EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER))
}

/// Install a human-readable fmt subscriber as the global default.
///
/// # Errors
///
/// Fails if a global subscriber is already set.
pub fn try_init() -> Result<(), TryInitError> {
    use tracing_subscriber::layer::SubscriberExt;
    use tracing_subscriber::util::SubscriberInitExt;

    tracing_subscriber::registry()
        .with(env_filter())
        .with(tracing_subscriber::fmt::layer().with_target(true))
        .try_init()
}

/// Like [`try_init`], ignoring an already-installed subscriber.
pub fn init() {
    let _ = try_init();
}

/// Install a JSON-lines subscriber as the global default.
///
/// # Errors
///
/// Fails if a global subscriber is already set.
#[cfg(feature = "json-logs")]
pub fn try_init_json() -> Result<(), TryInitError> {
    use tracing_subscriber::layer::SubscriberExt;
    use tracing_subscriber::util::SubscriberInitExt;

    tracing_subscriber::registry()
        .with(env_filter())
        .with(
            tracing_subscriber::fmt::layer()
                .json()
                .with_current_span(true),
        )
        .try_init()
}
