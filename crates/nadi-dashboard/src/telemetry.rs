//! Tracing subscriber setup for the binary

use crate::config::LoggingConfig;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Install the global subscriber
///
/// `NADI_LOG` has already been folded into `config.filter` by
/// [`crate::DashboardConfig::load`]; an unparsable filter falls back to
/// `info`. Logs go to stderr so command output on stdout stays clean.
/// Calling this twice leaves the first subscriber in place.
pub fn init_tracing(config: &LoggingConfig) {
    let filter = EnvFilter::try_new(&config.filter).unwrap_or_else(|err| {
        eprintln!("ignoring log filter {:?}: {err}", config.filter);
        EnvFilter::new("info")
    });

    let registry = tracing_subscriber::registry().with(filter);
    let result = if config.json {
        registry
            .with(tracing_subscriber::fmt::layer().json().with_writer(std::io::stderr))
            .try_init()
    } else {
        registry
            .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
            .try_init()
    };

    if let Err(err) = result {
        tracing::debug!(error = %err, "tracing already initialised");
    }
}
