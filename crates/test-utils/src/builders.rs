#![allow(dead_code)]

use std::time::Duration;

use histdag::content::{ContentRecord, ContentState, HistoryContentType, Timestamp};
use histdag::dag::{JobRecord, JobState};
use histdag::poll::{BackoffPolicy, PollSettings};

/// Shorthand for a visible, undeleted dataset.
pub fn record(id: &str, hid: i64, state: &str, update_time: i64) -> ContentRecord {
    ContentRecordBuilder::new(id, hid)
        .state(state)
        .update_time(update_time)
        .build()
}

/// Builder for `ContentRecord` to simplify test setup.
pub struct ContentRecordBuilder {
    record: ContentRecord,
}

impl ContentRecordBuilder {
    pub fn new(id: &str, hid: i64) -> Self {
        Self {
            record: ContentRecord {
                id: id.to_string(),
                history_content_type: HistoryContentType::Dataset,
                hid,
                state: ContentState::New,
                deleted: false,
                visible: true,
                purged: false,
                update_time: Timestamp::EPOCH,
                name: None,
                history_id: None,
            },
        }
    }

    pub fn state(mut self, state: &str) -> Self {
        self.record.state = ContentState::from(state);
        self
    }

    pub fn update_time(mut self, micros: i64) -> Self {
        self.record.update_time = Timestamp::from_micros(micros);
        self
    }

    pub fn collection(mut self) -> Self {
        self.record.history_content_type = HistoryContentType::DatasetCollection;
        self
    }

    pub fn deleted(mut self, val: bool) -> Self {
        self.record.deleted = val;
        self
    }

    pub fn visible(mut self, val: bool) -> Self {
        self.record.visible = val;
        self
    }

    pub fn name(mut self, name: &str) -> Self {
        self.record.name = Some(name.to_string());
        self
    }

    pub fn build(self) -> ContentRecord {
        self.record
    }
}

/// Builder for `JobRecord`.
pub struct JobRecordBuilder {
    job: JobRecord,
}

impl JobRecordBuilder {
    pub fn new(id: &str, tool_id: &str) -> Self {
        Self {
            job: JobRecord {
                id: id.to_string(),
                tool_id: tool_id.to_string(),
                state: JobState::Ok,
                create_time: None,
                inputs: Default::default(),
                outputs: Default::default(),
            },
        }
    }

    pub fn state(mut self, state: &str) -> Self {
        self.job.state = JobState::from(state);
        self
    }

    pub fn input(mut self, param: &str, content_id: &str) -> Self {
        self.job
            .inputs
            .entry(param.to_string())
            .or_default()
            .push(content_id.to_string());
        self
    }

    pub fn output(mut self, param: &str, content_id: &str) -> Self {
        self.job
            .outputs
            .entry(param.to_string())
            .or_default()
            .push(content_id.to_string());
        self
    }

    pub fn build(self) -> JobRecord {
        self.job
    }
}

/// Constant interval, no attempt or time ceiling.
pub fn fixed_poll_settings(interval: Duration, max_consecutive_failures: u32) -> PollSettings {
    PollSettings {
        backoff: BackoffPolicy::fixed(interval),
        max_consecutive_failures,
        max_attempts: None,
        max_duration: None,
    }
}
