// src/content/mod.rs

//! History content records.
//!
//! - [`record`] holds the [`ContentRecord`] type and page decoding.
//! - [`state`] holds the open [`ContentState`] enumeration and the
//!   pending / terminal classification used to decide whether polling goes on.
//! - [`timestamp`] holds the `update_time` cursor type.

pub mod record;
pub mod state;
pub mod timestamp;

pub use record::{ContentId, ContentRecord, HistoryContentType, decode_page};
pub use state::{ContentState, classify, classify_str};
pub use timestamp::Timestamp;
