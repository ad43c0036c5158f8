// src/dag/job.rs

//! Job records as returned by the jobs endpoint.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Deserializer, Serialize};

use crate::content::{ContentId, Timestamp};
use crate::errors::SyncError;
use crate::types::StateClass;

pub type JobId = String;

/// Job lifecycle state. Distinct from content state but shares the
/// pending / terminal buckets.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum JobState {
    New,
    Resubmitted,
    Upload,
    Waiting,
    Queued,
    Running,
    Ok,
    Error,
    Failed,
    Paused,
    Deleting,
    Deleted,
    Stop,
    Stopped,
    Skipped,
    Other(String),
}

impl JobState {
    pub fn as_str(&self) -> &str {
        match self {
            JobState::New => "new",
            JobState::Resubmitted => "resubmitted",
            JobState::Upload => "upload",
            JobState::Waiting => "waiting",
            JobState::Queued => "queued",
            JobState::Running => "running",
            JobState::Ok => "ok",
            JobState::Error => "error",
            JobState::Failed => "failed",
            JobState::Paused => "paused",
            JobState::Deleting => "deleting",
            JobState::Deleted => "deleted",
            JobState::Stop => "stop",
            JobState::Stopped => "stopped",
            JobState::Skipped => "skipped",
            JobState::Other(s) => s,
        }
    }

    /// Unknown states are `Pending`, same policy as content states.
    pub fn class(&self) -> StateClass {
        match self {
            JobState::Ok | JobState::Deleted | JobState::Stopped | JobState::Skipped => {
                StateClass::TerminalOk
            }
            JobState::Error | JobState::Failed => StateClass::TerminalError,
            _ => StateClass::Pending,
        }
    }
}

impl From<String> for JobState {
    fn from(s: String) -> Self {
        match s.as_str() {
            "new" => JobState::New,
            "resubmitted" => JobState::Resubmitted,
            "upload" => JobState::Upload,
            "waiting" => JobState::Waiting,
            "queued" => JobState::Queued,
            "running" => JobState::Running,
            "ok" => JobState::Ok,
            "error" => JobState::Error,
            "failed" => JobState::Failed,
            "paused" => JobState::Paused,
            "deleting" => JobState::Deleting,
            "deleted" => JobState::Deleted,
            "stop" => JobState::Stop,
            "stopped" => JobState::Stopped,
            "skipped" => JobState::Skipped,
            _ => JobState::Other(s),
        }
    }
}

impl From<&str> for JobState {
    fn from(s: &str) -> Self {
        JobState::from(s.to_string())
    }
}

impl From<JobState> for String {
    fn from(state: JobState) -> Self {
        match state {
            JobState::Other(s) => s,
            known => known.as_str().to_string(),
        }
    }
}

impl fmt::Display for JobState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One job and the content it consumed and produced.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobRecord {
    pub id: JobId,
    pub tool_id: String,
    pub state: JobState,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub create_time: Option<Timestamp>,

    /// Parameter name -> content ids.
    #[serde(default, deserialize_with = "deserialize_refs")]
    pub inputs: BTreeMap<String, Vec<ContentId>>,

    #[serde(default, deserialize_with = "deserialize_refs")]
    pub outputs: BTreeMap<String, Vec<ContentId>>,
}

impl JobRecord {
    pub fn input_ids(&self) -> impl Iterator<Item = (&str, &str)> {
        flatten(&self.inputs)
    }

    pub fn output_ids(&self) -> impl Iterator<Item = (&str, &str)> {
        flatten(&self.outputs)
    }
}

fn flatten(map: &BTreeMap<String, Vec<ContentId>>) -> impl Iterator<Item = (&str, &str)> {
    map.iter()
        .flat_map(|(param, ids)| ids.iter().map(move |id| (param.as_str(), id.as_str())))
}

/// A content reference: a bare id or `{"id": ..., "src": "hda"}`.
#[derive(Deserialize)]
#[serde(untagged)]
enum RawRef {
    Id(String),
    Object { id: String },
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RawRefs {
    One(RawRef),
    Many(Vec<RawRef>),
}

fn deserialize_refs<'de, D>(deserializer: D) -> Result<BTreeMap<String, Vec<ContentId>>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw: Option<BTreeMap<String, Option<RawRefs>>> = Option::deserialize(deserializer)?;
    let ids = |r: RawRef| match r {
        RawRef::Id(id) | RawRef::Object { id } => id,
    };

    Ok(raw
        .unwrap_or_default()
        .into_iter()
        .map(|(param, refs)| {
            let list = match refs {
                None => Vec::new(),
                Some(RawRefs::One(r)) => vec![ids(r)],
                Some(RawRefs::Many(rs)) => rs.into_iter().map(ids).collect(),
            };
            (param, list)
        })
        .collect())
}

/// Decode a jobs listing. The payload must be a JSON array.
pub fn decode_jobs(bytes: &[u8]) -> Result<Vec<JobRecord>, SyncError> {
    serde_json::from_slice(bytes).map_err(|e| SyncError::Decode(format!("jobs: {e}")))
}
