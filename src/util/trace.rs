//! Creates a `tracing_subscriber` registry which prints the spans
//! emitted by an instrumented match to stdout.
//!
//! The output is filtered by the environment, for example:
//! ```bash
//! RUST_LOG=branchmatch=debug
//! ```

use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

/// Initialises the tracer, using tracing subscription.
/// This is optional, not calling this function will simply
/// not log traces.
///
/// Returns `false` if a global subscriber was already installed.
pub fn initialize_tracer() -> bool {
    let fmt_layer = tracing_subscriber::fmt::layer().with_target(true);

    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::from_default_env())
        .with(fmt_layer)
        .try_init()
        .is_ok()
}
