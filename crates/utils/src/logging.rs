//! provides logging helpers

use tracing_subscriber::filter::{self};
use tracing_subscriber::fmt::layer;
use tracing_subscriber::prelude::*;
use tracing_subscriber::registry;

/// initiate the global tracing subscriber
///
/// Output goes to stderr so stdout stays free for reports. `RUST_LOG`
/// directives take precedence over `default_level`.
pub fn init(default_level: filter::LevelFilter) {
    let env_filter = filter::EnvFilter::builder()
        .with_default_directive(default_level.into())
        .from_env_lossy();

    let fmt_layer = layer()
        .with_writer(std::io::stderr)
        .with_target(default_level >= filter::LevelFilter::DEBUG)
        .with_filter(env_filter);

    if registry().with(fmt_layer).try_init().is_err() {
        tracing::debug!("global subscriber already installed");
    }
}
