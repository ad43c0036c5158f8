// src/dag/builder.rs

use std::collections::HashMap;

use petgraph::algo::{tarjan_scc, toposort};
use petgraph::graph::{DiGraph, NodeIndex};
use tracing::{debug, warn};

use crate::content::ContentRecord;
use crate::dag::graph::{EdgeKind, EdgeWeight, JobDag, Node, NodeDetail, NodeKey};
use crate::dag::job::JobRecord;
use crate::errors::SyncError;

/// Build the dependency graph for `jobs`.
///
/// Edge direction:
/// - input `d` of job `j`: `d -> j` (consumed)
/// - output `d` of job `j`: `j -> d` (produced)
///
/// Content nodes pick up `hid`/`state`/`name` from `contents` when the id is
/// known there. Fails with [`SyncError::CyclicGraph`] listing every id in the
/// offending cycle.
pub fn build_dag(jobs: &[JobRecord], contents: &[ContentRecord]) -> Result<JobDag, SyncError> {
    let known: HashMap<&str, &ContentRecord> =
        contents.iter().map(|c| (c.id.as_str(), c)).collect();

    let mut builder = Builder {
        graph: DiGraph::new(),
        index: HashMap::new(),
        known,
    };

    for job in jobs {
        let Some(job_ix) = builder.job_node(job) else {
            continue;
        };
        for (param, content_id) in job.input_ids() {
            let content_ix = builder.content_node(content_id);
            builder.edge(content_ix, job_ix, EdgeKind::Consumes, param);
        }
        for (param, content_id) in job.output_ids() {
            let content_ix = builder.content_node(content_id);
            builder.edge(job_ix, content_ix, EdgeKind::Produces, param);
        }
    }

    let Builder { graph, index, .. } = builder;

    let topo = match toposort(&graph, None) {
        Ok(order) => order,
        Err(cycle) => {
            let ids = cycle_members(&graph, cycle.node_id());
            warn!(?ids, "job graph contains a cycle");
            return Err(SyncError::CyclicGraph(ids));
        }
    };

    debug!(
        nodes = graph.node_count(),
        edges = graph.edge_count(),
        jobs = jobs.len(),
        "built job DAG"
    );

    Ok(JobDag { graph, index, topo })
}

struct Builder<'a> {
    graph: DiGraph<Node, EdgeWeight>,
    index: HashMap<NodeKey, NodeIndex>,
    known: HashMap<&'a str, &'a ContentRecord>,
}

impl Builder<'_> {
    /// `None` for a job id already in the graph; the repeat and its edges
    /// are skipped.
    fn job_node(&mut self, job: &JobRecord) -> Option<NodeIndex> {
        let key = NodeKey::Job(job.id.clone());
        if self.index.contains_key(&key) {
            warn!(job = %job.id, "duplicate job id in listing; keeping first");
            return None;
        }
        let ix = self.graph.add_node(Node {
            key: key.clone(),
            detail: NodeDetail::Job {
                tool_id: job.tool_id.clone(),
                state: job.state.clone(),
            },
        });
        self.index.insert(key, ix);
        Some(ix)
    }

    fn content_node(&mut self, content_id: &str) -> NodeIndex {
        let key = NodeKey::Content(content_id.to_string());
        if let Some(ix) = self.index.get(&key) {
            return *ix;
        }
        let record = self.known.get(content_id);
        let ix = self.graph.add_node(Node {
            key: key.clone(),
            detail: NodeDetail::Content {
                hid: record.map(|r| r.hid),
                state: record.map(|r| r.state.clone()),
                name: record.and_then(|r| r.name.clone()),
            },
        });
        self.index.insert(key, ix);
        ix
    }

    fn edge(&mut self, from: NodeIndex, to: NodeIndex, kind: EdgeKind, param: &str) {
        match self.graph.find_edge(from, to) {
            Some(e) => {
                let params = &mut self.graph[e].params;
                if !params.iter().any(|p| p == param) {
                    params.push(param.to_string());
                }
            }
            None => {
                self.graph.add_edge(
                    from,
                    to,
                    EdgeWeight {
                        kind,
                        params: vec![param.to_string()],
                    },
                );
            }
        }
    }
}

/// Every node in the strongly connected component that contains `start`,
/// jobs first, rendered as `job:<id>` / `content:<id>`.
fn cycle_members(graph: &DiGraph<Node, EdgeWeight>, start: NodeIndex) -> Vec<String> {
    let mut keys: Vec<&NodeKey> = tarjan_scc(graph)
        .into_iter()
        .find(|component| component.contains(&start))
        .unwrap_or_else(|| vec![start])
        .into_iter()
        .map(|ix| &graph[ix].key)
        .collect();
    keys.sort();
    keys.into_iter().map(NodeKey::to_string).collect()
}
