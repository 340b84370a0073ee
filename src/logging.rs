//! Terminal logging for the CLI.
//!
//! The library only emits `tracing` events; installing a subscriber is left
//! to the binary (or to a host embedding the crate).

use tracing_subscriber::{EnvFilter, Layer, fmt, layer::SubscriberExt, util::SubscriberInitExt};

/// Install a compact stderr subscriber.
///
/// `RUST_LOG` overrides the level; otherwise `debug` when `verbose`, else `info`.
/// A second call is a no-op.
pub fn init(verbose: bool) {
    let level = if verbose { "debug" } else { "info" };
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("html_inject={level}")));

    let layer = fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_file(false)
        .with_line_number(false)
        .without_time()
        .compact()
        .with_filter(env_filter);

    tracing_subscriber::registry().with(layer).try_init().ok();
}
