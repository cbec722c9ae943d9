//! Logging setup.
//!
//! Diagnostics of one connection are scoped to the span returned by
//! [`client_span`]. Components receive that span when the client builds
//! them and create children of it, so nothing logs through a global that
//! outlives the connection.

use crate::error::{Error, Result};
use tracing::{Span, info_span};
use tracing_subscriber::EnvFilter;

/// Install a global fmt subscriber. `RUST_LOG` takes precedence over
/// `level` when it is set.
///
/// # Errors
///
/// Returns [`Error::Config`] if the filter is invalid or a subscriber is
/// already installed.
pub fn configure_logging(level: &str) -> Result<()> {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(level))
        .map_err(|e| Error::Config(format!("Invalid log filter {level:?}: {e}")))?;

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_thread_names(true)
        .try_init()
        .map_err(|e| Error::Config(format!("Failed to install subscriber: {e}")))
}

/// Root span of one client connection.
#[must_use]
pub fn client_span(endpoint_url: &str) -> Span {
    info_span!("ua_client", endpoint = %endpoint_url)
}
