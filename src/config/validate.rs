// src/config/validate.rs

use std::time::Duration;

use url::Url;

use crate::config::model::{
    ConfigFile, RawConfigFile, RawPollSection, RawServerSection, ServerConfig,
};
use crate::errors::{HistdagError, Result};
use crate::poll::{BackoffPolicy, PollSettings};

pub const API_KEY_ENV: &str = "HISTDAG_API_KEY";

impl TryFrom<RawConfigFile> for ConfigFile {
    type Error = crate::errors::HistdagError;

    fn try_from(raw: RawConfigFile) -> std::result::Result<Self, Self::Error> {
        let server = validate_server(&raw.server)?;
        let poll = validate_poll(&raw.poll)?;
        let page_size = validate_page_size(raw.poll.page_size)?;
        Ok(ConfigFile::new_unchecked(server, poll, page_size, raw.filter))
    }
}

fn validate_server(raw: &RawServerSection) -> Result<ServerConfig> {
    let base_url = Url::parse(&raw.base_url).map_err(|e| {
        HistdagError::ConfigError(format!("[server].base_url '{}' is not a URL: {e}", raw.base_url))
    })?;
    if !matches!(base_url.scheme(), "http" | "https") {
        return Err(HistdagError::ConfigError(format!(
            "[server].base_url must be http or https (got '{}')",
            base_url.scheme()
        )));
    }

    let api_key = raw
        .api_key
        .clone()
        .or_else(|| std::env::var(API_KEY_ENV).ok())
        .filter(|k| !k.trim().is_empty());

    Ok(ServerConfig {
        base_url,
        api_key,
        connect_timeout: positive_duration("server", "connect_timeout", &raw.connect_timeout)?,
        request_timeout: positive_duration("server", "request_timeout", &raw.request_timeout)?,
    })
}

fn validate_poll(raw: &RawPollSection) -> Result<PollSettings> {
    let initial = positive_duration("poll", "initial_interval", &raw.initial_interval)?;
    let max = positive_duration("poll", "max_interval", &raw.max_interval)?;
    if initial > max {
        return Err(HistdagError::ConfigError(format!(
            "[poll].initial_interval ({initial:?}) must not exceed max_interval ({max:?})"
        )));
    }

    let step = field_duration("poll", "backoff_step", &raw.backoff_step)?;

    if !raw.backoff_factor.is_finite() || raw.backoff_factor < 1.0 {
        return Err(HistdagError::ConfigError(format!(
            "[poll].backoff_factor must be >= 1.0 (got {})",
            raw.backoff_factor
        )));
    }

    if raw.max_consecutive_failures == 0 {
        return Err(HistdagError::ConfigError(
            "[poll].max_consecutive_failures must be >= 1 (got 0)".to_string(),
        ));
    }

    let max_duration = raw
        .max_duration
        .as_deref()
        .map(|s| positive_duration("poll", "max_duration", s))
        .transpose()?;

    Ok(PollSettings {
        backoff: BackoffPolicy {
            kind: raw.backoff,
            initial,
            max,
            step,
            factor: raw.backoff_factor,
        },
        max_consecutive_failures: raw.max_consecutive_failures,
        max_attempts: raw.max_attempts,
        max_duration,
    })
}

fn validate_page_size(page_size: Option<usize>) -> Result<Option<usize>> {
    match page_size {
        Some(0) => Err(HistdagError::ConfigError(
            "[poll].page_size must be >= 1 (got 0)".to_string(),
        )),
        other => Ok(other),
    }
}

fn field_duration(section: &str, field: &str, value: &str) -> Result<Duration> {
    parse_duration(value)
        .map_err(|e| HistdagError::ConfigError(format!("[{section}].{field}: {e}")))
}

fn positive_duration(section: &str, field: &str, value: &str) -> Result<Duration> {
    let d = field_duration(section, field, value)?;
    if d.is_zero() {
        return Err(HistdagError::ConfigError(format!(
            "[{section}].{field} must be greater than zero"
        )));
    }
    Ok(d)
}

/// Parse durations like `500ms`, `3s`, `2m`, `1h`.
pub fn parse_duration(s: &str) -> std::result::Result<Duration, String> {
    let s = s.trim();
    if s.is_empty() {
        return Err("empty duration string".to_string());
    }

    let idx = s
        .chars()
        .position(|c| !c.is_ascii_digit())
        .ok_or_else(|| format!("duration '{s}' missing unit suffix"))?;

    let (num_part, unit_part) = s.split_at(idx);
    let value: u64 = num_part
        .parse()
        .map_err(|e| format!("invalid duration number '{num_part}': {e}"))?;

    match unit_part.trim().to_lowercase().as_str() {
        "ms" => Ok(Duration::from_millis(value)),
        "s" => Ok(Duration::from_secs(value)),
        "m" => Ok(Duration::from_secs(value.saturating_mul(60))),
        "h" => Ok(Duration::from_secs(value.saturating_mul(3600))),
        unit => Err(format!(
            "unsupported duration unit '{unit}'; expected ms, s, m, or h"
        )),
    }
}
