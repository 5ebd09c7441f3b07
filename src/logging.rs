//! Tracing subscriber setup for the command line.

use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Install a stderr subscriber. `RUST_LOG` takes precedence; otherwise only
/// this crate logs, at `warn` (or `debug` when `verbose` is set).
///
/// Calling this more than once is harmless; later calls are ignored.
pub fn init(verbose: bool) {
    let level = if verbose { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("budgetbook={level}")));

    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_writer(std::io::stderr).with_target(false))
        .try_init();
}
