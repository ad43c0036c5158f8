// src/config/mod.rs

//! Configuration: TOML model, loading and validation.

pub mod loader;
pub mod model;
pub mod validate;

pub use loader::{default_config_path, load_and_validate, load_from_path, load_from_str};
pub use model::{
    ConfigFile, FilterSection, RawConfigFile, RawPollSection, RawServerSection, ServerConfig,
};
pub use validate::{API_KEY_ENV, parse_duration};
