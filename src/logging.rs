// Logging setup
// Logs go to stderr so stdout carries only the SQL and the result table

use tracing::Subscriber;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

/// Install the global fmt subscriber
///
/// `RUST_LOG` wins when set; otherwise `default_level` applies. Calling this
/// twice is harmless, the second call is ignored.
pub fn init_logging(default_level: &str) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    if subscriber(filter).try_init().is_ok() {
        tracing::debug!("logging initialized (default level {})", default_level);
    }
}

/// The fmt subscriber used by the binary, without installing it
pub fn subscriber(filter: EnvFilter) -> impl Subscriber + Send + Sync {
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .finish()
}
