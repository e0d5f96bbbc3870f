//! Process-wide `tracing` setup.
//!
//! Logging starts at `info` so configuration loading is visible, then moves
//! to `logging.level` once the config file has been read. `RUST_LOG`
//! overrides both.

use std::sync::OnceLock;

use tracing_subscriber::{EnvFilter, Registry, fmt, prelude::*, reload};

type FilterHandle = reload::Handle<EnvFilter, Registry>;

const STARTUP_LEVEL: &str = "info";

static FILTER: OnceLock<FilterHandle> = OnceLock::new();

/// Installs the global subscriber. Later calls are no-ops.
pub fn init_tracing() {
    let filter = filter_from_env().unwrap_or_else(|| EnvFilter::new(STARTUP_LEVEL));
    let (layer, handle) = reload::Layer::new(filter);
    if FILTER.set(handle).is_err() {
        return;
    }

    let _ = tracing_subscriber::registry()
        .with(layer)
        .with(fmt::layer())
        .try_init();
}

fn filter_from_env() -> Option<EnvFilter> {
    std::env::var_os("RUST_LOG")?;
    EnvFilter::try_from_default_env().ok()
}

/// Switches to the configured `logging.level` unless `RUST_LOG` is set.
///
/// An unparsable level is logged and the startup level stays in effect.
pub fn apply_logging_level(level: &str) {
    if std::env::var_os("RUST_LOG").is_some() {
        return;
    }
    let Some(handle) = FILTER.get() else {
        return;
    };

    match EnvFilter::try_new(level) {
        Ok(filter) => {
            if let Err(e) = handle.reload(filter) {
                tracing::warn!(error = %e, "Could not change log level");
            }
        }
        Err(e) => tracing::warn!(level, error = %e, "Ignoring invalid logging.level"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_level_change_before_init_is_noop() {
        apply_logging_level("debug,[broken");
        apply_logging_level("warn");
    }

    #[test]
    fn test_config_levels_parse_as_filters() {
        for level in ["info", "debug", "formgate_server=trace,warn"] {
            assert!(EnvFilter::try_new(level).is_ok(), "{level}");
        }
    }
}
