// src/content/record.rs

use serde::{Deserialize, Serialize};

use crate::content::state::ContentState;
use crate::content::timestamp::Timestamp;
use crate::errors::SyncError;

/// Opaque content id as issued by the server.
pub type ContentId = String;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HistoryContentType {
    Dataset,
    DatasetCollection,
}

/// One dataset or dataset collection inside a history.
///
/// Records are replaced wholesale when the server sends a newer copy; nothing
/// outside the owning collection mutates them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContentRecord {
    pub id: ContentId,

    pub history_content_type: HistoryContentType,

    /// Per-history display index. Unique only within one history.
    pub hid: i64,

    #[serde(alias = "populated_state")]
    pub state: ContentState,

    #[serde(default)]
    pub deleted: bool,

    #[serde(default = "default_visible")]
    pub visible: bool,

    #[serde(default)]
    pub purged: bool,

    pub update_time: Timestamp,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub history_id: Option<String>,
}

fn default_visible() -> bool {
    true
}

impl ContentRecord {
    pub fn is_terminal(&self) -> bool {
        self.state.is_terminal()
    }
}

/// Decode a contents page. The payload must be a JSON array of records.
pub fn decode_page(bytes: &[u8]) -> Result<Vec<ContentRecord>, SyncError> {
    serde_json::from_slice(bytes).map_err(|e| SyncError::Decode(format!("history contents: {e}")))
}
