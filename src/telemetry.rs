//! Tracing setup.
//!
//! Structural events (fetch start/finish, queue warnings, firehose warnings)
//! go through `tracing`; raw transfer progress and "new ref" lines are
//! written directly to stderr by the archive layer and bypass the subscriber.

use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt};

/// Install the global subscriber: `LOG` env filter over an stderr fmt layer.
///
/// Defaults to `info` when `LOG` is unset. Safe to call once per process;
/// in tests the global default may already be set, so failures to install
/// are ignored.
pub fn init() {
    let filter = EnvFilter::builder()
        .with_default_directive(tracing::Level::INFO.into())
        .with_env_var("LOG")
        .from_env_lossy();

    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_writer(std::io::stderr).with_target(false))
        .try_init();
}
