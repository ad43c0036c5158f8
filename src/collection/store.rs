// src/collection/store.rs

//! Pure merge logic for a history's contents.
//!
//! No IO and no locking here; [`super::ControlledFetchCollection`] wraps a
//! [`ContentStore`] and feeds it fetched pages.

use std::collections::{BTreeSet, HashMap};
use std::ops::AddAssign;

use tracing::{debug, warn};

use crate::content::{ContentId, ContentRecord, Timestamp};

/// Counters describing what a merge did.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MergeSummary {
    /// Ids seen for the first time.
    pub inserted: usize,
    /// Held records replaced by a newer or different copy.
    pub replaced: usize,
    /// Incoming records identical to the held copy.
    pub unchanged: usize,
    /// Incoming records older than the held copy, dropped.
    pub stale_ignored: usize,
}

impl MergeSummary {
    pub fn changed(&self) -> bool {
        self.inserted > 0 || self.replaced > 0
    }
}

impl AddAssign for MergeSummary {
    fn add_assign(&mut self, rhs: Self) {
        self.inserted += rhs.inserted;
        self.replaced += rhs.replaced;
        self.unchanged += rhs.unchanged;
        self.stale_ignored += rhs.stale_ignored;
    }
}

/// Records keyed by id, iterated in ascending `hid` order.
#[derive(Debug, Clone, Default)]
pub struct ContentStore {
    by_id: HashMap<ContentId, ContentRecord>,
    /// `(hid, id)` so equal hids still have a total, stable order.
    order: BTreeSet<(i64, ContentId)>,
    /// Highest `update_time` observed.
    cursor: Option<Timestamp>,
}

impl ContentStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.by_id.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_id.is_empty()
    }

    pub fn cursor(&self) -> Option<Timestamp> {
        self.cursor
    }

    pub fn get(&self, id: &str) -> Option<&ContentRecord> {
        self.by_id.get(id)
    }

    pub fn iter(&self) -> impl Iterator<Item = &ContentRecord> {
        self.order.iter().filter_map(|(_, id)| self.by_id.get(id))
    }

    /// Records in ascending `hid` order.
    pub fn to_vec(&self) -> Vec<ContentRecord> {
        self.iter().cloned().collect()
    }

    /// `true` iff every held record is terminal. Empty is vacuously terminal.
    pub fn all_terminal(&self) -> bool {
        self.by_id.values().all(ContentRecord::is_terminal)
    }

    /// Merge a fetched page.
    ///
    /// Each incoming record replaces the held record with the same id as a
    /// whole, unless it is strictly older than what we hold. Ids that are
    /// not in the page are left alone.
    pub fn merge(&mut self, records: impl IntoIterator<Item = ContentRecord>) -> MergeSummary {
        let mut summary = MergeSummary::default();

        for incoming in records {
            self.cursor = Some(match self.cursor {
                Some(cur) => cur.max(incoming.update_time),
                None => incoming.update_time,
            });

            match self.by_id.get(&incoming.id) {
                Some(held) if incoming.update_time < held.update_time => {
                    warn!(
                        id = %incoming.id,
                        held = %held.update_time,
                        incoming = %incoming.update_time,
                        "ignoring stale record"
                    );
                    summary.stale_ignored += 1;
                }
                Some(held) if *held == incoming => {
                    summary.unchanged += 1;
                }
                Some(held) => {
                    debug!(
                        id = %incoming.id,
                        hid = incoming.hid,
                        from = %held.state,
                        to = %incoming.state,
                        "replacing record"
                    );
                    if held.hid != incoming.hid {
                        self.order.remove(&(held.hid, incoming.id.clone()));
                    }
                    self.order.insert((incoming.hid, incoming.id.clone()));
                    self.by_id.insert(incoming.id.clone(), incoming);
                    summary.replaced += 1;
                }
                None => {
                    debug!(
                        id = %incoming.id,
                        hid = incoming.hid,
                        state = %incoming.state,
                        "inserting record"
                    );
                    self.order.insert((incoming.hid, incoming.id.clone()));
                    self.by_id.insert(incoming.id.clone(), incoming);
                    summary.inserted += 1;
                }
            }
        }

        summary
    }
}
