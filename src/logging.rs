// src/logging.rs

//! Logging setup for `histdag` using `tracing` + `tracing-subscriber`.
//!
//! The filter comes from, in order:
//! 1. `--log-level` CLI flag, applied to every target
//! 2. `HISTDAG_LOG`, read as `EnvFilter` directives
//!    (e.g. `"debug"` or `"histdag=debug,reqwest=warn"`)
//! 3. `info`
//!
//! Logs go to STDERR; STDOUT carries only the history / DAG summaries.

use anyhow::Result;
use tracing_subscriber::{EnvFilter, fmt};

use crate::cli::LogLevel;

pub const LOG_ENV: &str = "HISTDAG_LOG";

const DEFAULT_DIRECTIVE: &str = "info";

/// Initialise the global logging subscriber. Call once at startup.
pub fn init_logging(cli_level: Option<LogLevel>) -> Result<()> {
    let env_value = std::env::var(LOG_ENV).ok();
    let (filter, rejected) = build_filter(cli_level, env_value.as_deref());

    fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_thread_ids(false)
        .with_thread_names(false)
        .with_writer(std::io::stderr)
        .try_init()
        .map_err(|e| anyhow::anyhow!("failed to install tracing subscriber: {e}"))?;

    if let Some(value) = rejected {
        tracing::warn!(%value, "ignoring invalid {LOG_ENV}; using {DEFAULT_DIRECTIVE}");
    }
    Ok(())
}

/// The filter to install, plus the `HISTDAG_LOG` value if it was rejected.
fn build_filter(
    cli_level: Option<LogLevel>,
    env_value: Option<&str>,
) -> (EnvFilter, Option<String>) {
    if let Some(level) = cli_level {
        return (EnvFilter::new(level_directive(level)), None);
    }

    match env_value.map(str::trim).filter(|v| !v.is_empty()) {
        Some(value) => match EnvFilter::try_new(value) {
            Ok(filter) => (filter, None),
            Err(_) => (EnvFilter::new(DEFAULT_DIRECTIVE), Some(value.to_string())),
        },
        None => (EnvFilter::new(DEFAULT_DIRECTIVE), None),
    }
}

fn level_directive(level: LogLevel) -> &'static str {
    match level {
        LogLevel::Error => "error",
        LogLevel::Warn => "warn",
        LogLevel::Info => "info",
        LogLevel::Debug => "debug",
        LogLevel::Trace => "trace",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cli_flag_wins_over_environment() {
        let (filter, rejected) = build_filter(Some(LogLevel::Debug), Some("histdag=trace"));
        assert_eq!(filter.to_string(), "debug");
        assert!(rejected.is_none());
    }

    #[test]
    fn environment_accepts_per_target_directives() {
        let (filter, rejected) = build_filter(None, Some(" histdag=debug,reqwest=warn "));
        let rendered = filter.to_string();
        assert!(rendered.contains("histdag=debug"), "{rendered}");
        assert!(rendered.contains("reqwest=warn"), "{rendered}");
        assert!(rejected.is_none());
    }

    #[test]
    fn invalid_or_missing_environment_falls_back_to_info() {
        let (filter, rejected) = build_filter(None, Some("histdag=loud"));
        assert_eq!(filter.to_string(), "info");
        assert_eq!(rejected.as_deref(), Some("histdag=loud"));

        let (filter, rejected) = build_filter(None, None);
        assert_eq!(filter.to_string(), "info");
        assert!(rejected.is_none());
    }
}
