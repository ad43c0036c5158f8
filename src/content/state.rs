// src/content/state.rs

//! Content lifecycle states and their classification.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::types::StateClass;

/// Lifecycle state of a dataset or collection.
///
/// The server owns this enumeration and may add states at any time, so
/// anything unrecognised is kept verbatim in [`ContentState::Other`].
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum ContentState {
    New,
    Upload,
    Queued,
    Running,
    Ok,
    Empty,
    Error,
    Discarded,
    Paused,
    SettingMetadata,
    FailedMetadata,
    Deferred,
    Other(String),
}

impl ContentState {
    pub fn as_str(&self) -> &str {
        match self {
            ContentState::New => "new",
            ContentState::Upload => "upload",
            ContentState::Queued => "queued",
            ContentState::Running => "running",
            ContentState::Ok => "ok",
            ContentState::Empty => "empty",
            ContentState::Error => "error",
            ContentState::Discarded => "discarded",
            ContentState::Paused => "paused",
            ContentState::SettingMetadata => "setting_metadata",
            ContentState::FailedMetadata => "failed_metadata",
            ContentState::Deferred => "deferred",
            ContentState::Other(s) => s,
        }
    }

    pub fn class(&self) -> StateClass {
        classify(self)
    }

    pub fn is_terminal(&self) -> bool {
        self.class().is_terminal()
    }
}

/// Classify a content state.
///
/// Unknown states are `Pending`: a state the server introduces later must
/// never end a polling loop early.
pub fn classify(state: &ContentState) -> StateClass {
    match state {
        ContentState::Ok
        | ContentState::Empty
        | ContentState::Deferred
        | ContentState::Discarded => StateClass::TerminalOk,
        ContentState::Error | ContentState::FailedMetadata => StateClass::TerminalError,
        _ => StateClass::Pending,
    }
}

/// Classify a raw state string as received from the server.
pub fn classify_str(raw: &str) -> StateClass {
    classify(&ContentState::from(raw))
}

impl From<&str> for ContentState {
    fn from(s: &str) -> Self {
        match s {
            "new" => ContentState::New,
            "upload" => ContentState::Upload,
            "queued" => ContentState::Queued,
            "running" => ContentState::Running,
            "ok" => ContentState::Ok,
            "empty" => ContentState::Empty,
            "error" => ContentState::Error,
            "discarded" => ContentState::Discarded,
            "paused" => ContentState::Paused,
            "setting_metadata" => ContentState::SettingMetadata,
            "failed_metadata" => ContentState::FailedMetadata,
            "deferred" => ContentState::Deferred,
            other => ContentState::Other(other.to_string()),
        }
    }
}

impl From<String> for ContentState {
    fn from(s: String) -> Self {
        match ContentState::from(s.as_str()) {
            ContentState::Other(_) => ContentState::Other(s),
            known => known,
        }
    }
}

impl From<ContentState> for String {
    fn from(state: ContentState) -> Self {
        match state {
            ContentState::Other(s) => s,
            known => known.as_str().to_string(),
        }
    }
}

impl fmt::Display for ContentState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
