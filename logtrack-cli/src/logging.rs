//! tracing subscriber setup for the `logtrack` binary.
//!
//! Log events go to stderr; stdout is reserved for command reports.

use anyhow::Result;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::fmt;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

use logtrack_core::config::GeneralConfig;

/// Install the global subscriber from `[general]`.
///
/// `RUST_LOG` overrides `log_level` when set. `log_format` selects one
/// event layer, `json` or `pretty`; anything else is an error.
pub fn init_tracing(config: &GeneralConfig) -> Result<()> {
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.log_level));

    let (json, pretty) = match config.log_format.as_str() {
        "json" => (Some(fmt::layer().json().with_writer(std::io::stderr)), None),
        "pretty" => (None, Some(fmt::layer().pretty().with_writer(std::io::stderr))),
        other => anyhow::bail!("unknown log format '{other}', expected 'json' or 'pretty'"),
    };

    tracing_subscriber::registry()
        .with(env_filter)
        .with(json)
        .with(pretty)
        .try_init()
        .map_err(|e| anyhow::anyhow!("failed to install tracing subscriber: {e}"))
}
