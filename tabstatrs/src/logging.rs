//! Subscriber setup for binaries. Library code only emits `tracing` events.

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::error::Result;

/// Environment variable holding an `EnvFilter` directive, e.g. `tabstat=debug`.
pub const LOG_ENV: &str = "TABSTAT_LOG";

/// Install a fmt subscriber filtered by `TABSTAT_LOG`, falling back to
/// `default_filter`. Fails if a global subscriber is already set.
pub fn init(default_filter: &str) -> Result<()> {
    let filter = EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new(default_filter));
    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .try_init()
        .map_err(|e| anyhow::anyhow!("install tracing subscriber: {e}"))?;
    Ok(())
}
