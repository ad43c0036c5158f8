// src/dag/mod.rs

//! Job dependency graph.
//!
//! - [`job`] holds the [`JobRecord`] type, job states and listing decoding.
//! - [`graph`] holds the built [`JobDag`] and its read-only accessors.
//! - [`builder`] turns a job listing (plus the content collection, for node
//!   details) into a [`JobDag`], rejecting cycles.

pub mod builder;
pub mod graph;
pub mod job;

pub use builder::build_dag;
pub use graph::{Edge, EdgeKind, JobDag, Node, NodeDetail, NodeKey};
pub use job::{JobId, JobRecord, JobState, decode_jobs};
