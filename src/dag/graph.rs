// src/dag/graph.rs

use std::collections::HashMap;
use std::fmt;

use petgraph::Direction;
use petgraph::graph::{DiGraph, NodeIndex};

use crate::content::ContentState;
use crate::dag::job::JobState;

/// Node identity. Job ids and content ids live in separate namespaces.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum NodeKey {
    Job(String),
    Content(String),
}

impl NodeKey {
    pub fn id(&self) -> &str {
        match self {
            NodeKey::Job(id) | NodeKey::Content(id) => id,
        }
    }
}

impl fmt::Display for NodeKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NodeKey::Job(id) => write!(f, "job:{id}"),
            NodeKey::Content(id) => write!(f, "content:{id}"),
        }
    }
}

/// What the renderer needs to draw a node.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NodeDetail {
    Job {
        tool_id: String,
        state: JobState,
    },
    /// `hid`/`state`/`name` are `None` when the content is referenced by a job
    /// but not present in the collection (e.g. hidden or from another history).
    Content {
        hid: Option<i64>,
        state: Option<ContentState>,
        name: Option<String>,
    },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Node {
    pub key: NodeKey,
    pub detail: NodeDetail,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EdgeKind {
    /// content -> job
    Consumes,
    /// job -> content
    Produces,
}

/// Edge weight: one edge per (from, to) pair, carrying every parameter name
/// that links them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct EdgeWeight {
    pub(crate) kind: EdgeKind,
    pub(crate) params: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Edge {
    pub from: NodeKey,
    pub to: NodeKey,
    pub kind: EdgeKind,
    pub params: Vec<String>,
}

/// Dependency graph of jobs and the content flowing between them.
///
/// Built wholesale by [`crate::dag::build_dag`]; never patched in place.
/// Construction guarantees acyclicity.
#[derive(Debug, Clone)]
pub struct JobDag {
    pub(crate) graph: DiGraph<Node, EdgeWeight>,
    pub(crate) index: HashMap<NodeKey, NodeIndex>,
    pub(crate) topo: Vec<NodeIndex>,
}

impl JobDag {
    pub fn node_count(&self) -> usize {
        self.graph.node_count()
    }

    pub fn edge_count(&self) -> usize {
        self.graph.edge_count()
    }

    /// Nodes in insertion order.
    pub fn nodes(&self) -> Vec<Node> {
        self.graph.node_weights().cloned().collect()
    }

    /// Edges in insertion order.
    pub fn edges(&self) -> Vec<Edge> {
        self.graph
            .raw_edges()
            .iter()
            .map(|e| Edge {
                from: self.graph[e.source()].key.clone(),
                to: self.graph[e.target()].key.clone(),
                kind: e.weight.kind,
                params: e.weight.params.clone(),
            })
            .collect()
    }

    pub fn node(&self, key: &NodeKey) -> Option<&Node> {
        self.index.get(key).map(|ix| &self.graph[*ix])
    }

    pub fn contains(&self, key: &NodeKey) -> bool {
        self.index.contains_key(key)
    }

    /// Node keys such that every edge points forward.
    pub fn topological_order(&self) -> Vec<NodeKey> {
        self.topo.iter().map(|ix| self.graph[*ix].key.clone()).collect()
    }

    /// Jobs that produced `content_id`.
    pub fn producers_of(&self, content_id: &str) -> Vec<&str> {
        self.neighbours(&NodeKey::Content(content_id.to_string()), Direction::Incoming)
    }

    /// Jobs that consumed `content_id`.
    pub fn consumers_of(&self, content_id: &str) -> Vec<&str> {
        self.neighbours(&NodeKey::Content(content_id.to_string()), Direction::Outgoing)
    }

    fn neighbours(&self, key: &NodeKey, dir: Direction) -> Vec<&str> {
        let Some(ix) = self.index.get(key) else {
            return Vec::new();
        };
        let mut ids: Vec<&str> = self
            .graph
            .neighbors_directed(*ix, dir)
            .map(|n| self.graph[n].key.id())
            .collect();
        ids.sort_unstable();
        ids
    }
}
