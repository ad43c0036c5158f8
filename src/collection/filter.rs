// src/collection/filter.rs

use crate::content::Timestamp;

/// Query for one history-contents request.
///
/// `history_id` goes into the request path; every other field becomes an
/// optional query parameter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchFilter {
    pub history_id: String,
    pub deleted: Option<bool>,
    pub visible: Option<bool>,
    /// Only records updated after this cursor.
    pub since: Option<Timestamp>,
    pub limit: Option<usize>,
    pub offset: Option<usize>,
}

impl FetchFilter {
    pub fn new(history_id: impl Into<String>) -> Self {
        Self {
            history_id: history_id.into(),
            deleted: None,
            visible: None,
            since: None,
            limit: None,
            offset: None,
        }
    }

    pub fn deleted(mut self, deleted: bool) -> Self {
        self.deleted = Some(deleted);
        self
    }

    pub fn visible(mut self, visible: bool) -> Self {
        self.visible = Some(visible);
        self
    }

    pub fn since(mut self, cursor: Timestamp) -> Self {
        self.since = Some(cursor);
        self
    }

    pub fn page(mut self, limit: usize, offset: usize) -> Self {
        self.limit = Some(limit);
        self.offset = Some(offset);
        self
    }

    /// Query parameters in a stable order.
    pub fn query_pairs(&self) -> Vec<(&'static str, String)> {
        let mut pairs = Vec::new();
        if let Some(deleted) = self.deleted {
            pairs.push(("deleted", deleted.to_string()));
        }
        if let Some(visible) = self.visible {
            pairs.push(("visible", visible.to_string()));
        }
        if let Some(since) = self.since {
            pairs.push(("since", since.to_iso()));
        }
        if let Some(limit) = self.limit {
            pairs.push(("limit", limit.to_string()));
        }
        if let Some(offset) = self.offset {
            pairs.push(("offset", offset.to_string()));
        }
        pairs
    }
}
