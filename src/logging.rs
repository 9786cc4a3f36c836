//! Tracing subscriber setup.
//!
//! The library itself only emits `tracing` events (target
//! `appup::update`); hosts and tests call [`init_logging`] to see them.

use std::sync::Once;
use tracing::Level;
use tracing_subscriber::EnvFilter;

static INIT_LOGGING: Once = Once::new();

/// Install a formatting subscriber writing to stderr, at most once per
/// process.
///
/// With `Some(level)` that level is used; with `None` the `RUST_LOG`
/// environment variable decides, and nothing is installed when it is
/// unset. Calls after the first are ignored, as is an already installed
/// global subscriber.
///
/// ```rust,no_run
/// appup::logging::init_logging(Some(tracing::Level::DEBUG));
/// ```
pub fn init_logging(level: Option<Level>) {
    install(level, Sink::Stderr);
}

/// Like [`init_logging`], but output goes through the test harness so it
/// is captured per test.
pub fn init_test_logging(level: Option<Level>) {
    install(level, Sink::TestHarness);
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Sink {
    Stderr,
    TestHarness,
}

fn install(level: Option<Level>, sink: Sink) {
    INIT_LOGGING.call_once(|| {
        let Some(filter) = filter_for(level) else {
            return;
        };

        let builder = tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_target(true);
        let _ = match sink {
            Sink::Stderr => builder.with_writer(std::io::stderr).try_init(),
            Sink::TestHarness => builder.with_test_writer().try_init(),
        };
    });
}

fn filter_for(level: Option<Level>) -> Option<EnvFilter> {
    match level {
        Some(level) => Some(EnvFilter::new(level.to_string())),
        None if std::env::var("RUST_LOG").is_ok() => Some(EnvFilter::from_default_env()),
        None => None,
    }
}
