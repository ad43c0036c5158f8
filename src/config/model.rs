// src/config/model.rs

use std::time::Duration;

use serde::Deserialize;
use url::Url;

use crate::poll::PollSettings;
use crate::types::BackoffKind;

/// Configuration as read from TOML, before validation.
///
/// ```toml
/// [server]
/// base_url = "https://usegalaxy.org"
/// request_timeout = "30s"
///
/// [poll]
/// initial_interval = "2s"
/// max_interval = "30s"
/// backoff = "exponential"
///
/// [filter]
/// visible = true
/// ```
///
/// Durations are strings with an `ms`, `s`, `m` or `h` suffix.
#[derive(Debug, Clone, Deserialize)]
pub struct RawConfigFile {
    pub server: RawServerSection,

    #[serde(default)]
    pub poll: RawPollSection,

    #[serde(default)]
    pub filter: FilterSection,
}

/// `[server]`
#[derive(Debug, Clone, Deserialize)]
pub struct RawServerSection {
    pub base_url: String,

    /// Falls back to `HISTDAG_API_KEY` when unset.
    #[serde(default)]
    pub api_key: Option<String>,

    #[serde(default = "default_connect_timeout")]
    pub connect_timeout: String,

    #[serde(default = "default_request_timeout")]
    pub request_timeout: String,
}

/// `[poll]`
#[derive(Debug, Clone, Deserialize)]
pub struct RawPollSection {
    #[serde(default = "default_initial_interval")]
    pub initial_interval: String,

    #[serde(default = "default_max_interval")]
    pub max_interval: String,

    #[serde(default)]
    pub backoff: BackoffKind,

    /// Increment for `backoff = "linear"`.
    #[serde(default = "default_backoff_step")]
    pub backoff_step: String,

    /// Multiplier for `backoff = "exponential"`.
    #[serde(default = "default_backoff_factor")]
    pub backoff_factor: f64,

    #[serde(default = "default_max_consecutive_failures")]
    pub max_consecutive_failures: u32,

    #[serde(default)]
    pub max_attempts: Option<u32>,

    #[serde(default)]
    pub max_duration: Option<String>,

    /// Page through results `page_size` records at a time. Unset: one
    /// unbounded request per refresh.
    #[serde(default)]
    pub page_size: Option<usize>,
}

impl Default for RawPollSection {
    fn default() -> Self {
        Self {
            initial_interval: default_initial_interval(),
            max_interval: default_max_interval(),
            backoff: BackoffKind::default(),
            backoff_step: default_backoff_step(),
            backoff_factor: default_backoff_factor(),
            max_consecutive_failures: default_max_consecutive_failures(),
            max_attempts: None,
            max_duration: None,
            page_size: None,
        }
    }
}

/// `[filter]`: fixed query parameters sent with every refresh.
#[derive(Debug, Clone, Copy, Default, Deserialize, PartialEq, Eq)]
pub struct FilterSection {
    #[serde(default)]
    pub deleted: Option<bool>,

    #[serde(default)]
    pub visible: Option<bool>,
}

fn default_connect_timeout() -> String {
    "10s".to_string()
}

fn default_request_timeout() -> String {
    "30s".to_string()
}

fn default_initial_interval() -> String {
    "2s".to_string()
}

fn default_max_interval() -> String {
    "30s".to_string()
}

fn default_backoff_step() -> String {
    "2s".to_string()
}

fn default_backoff_factor() -> f64 {
    2.0
}

fn default_max_consecutive_failures() -> u32 {
    5
}

/// Validated configuration. Only obtainable through `TryFrom<RawConfigFile>`
/// (see `config::validate`).
#[derive(Debug, Clone)]
pub struct ConfigFile {
    pub server: ServerConfig,
    pub poll: PollSettings,
    pub page_size: Option<usize>,
    pub filter: FilterSection,
}

#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub base_url: Url,
    pub api_key: Option<String>,
    pub connect_timeout: Duration,
    pub request_timeout: Duration,
}

impl ConfigFile {
    pub(crate) fn new_unchecked(
        server: ServerConfig,
        poll: PollSettings,
        page_size: Option<usize>,
        filter: FilterSection,
    ) -> Self {
        Self {
            server,
            poll,
            page_size,
            filter,
        }
    }
}
