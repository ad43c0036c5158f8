mod common;
use crate::common::{ContentRecordBuilder, JobRecordBuilder, init_tracing};

use pretty_assertions::assert_eq;

use histdag::content::ContentState;
use histdag::dag::{EdgeKind, JobState, NodeDetail, NodeKey, build_dag, decode_jobs};
use histdag::errors::SyncError;

fn job(id: &str) -> JobRecordBuilder {
    JobRecordBuilder::new(id, "cat1")
}

#[test]
fn two_jobs_feeding_each_other_is_a_cycle() {
    init_tracing();
    let jobs = [
        job("A").input("input1", "X").output("out_file1", "Y").build(),
        job("B").input("input1", "Y").output("out_file1", "X").build(),
    ];

    let err = build_dag(&jobs, &[]).unwrap_err();

    match err {
        SyncError::CyclicGraph(ids) => {
            assert!(ids.contains(&"job:A".to_string()), "{ids:?}");
            assert!(ids.contains(&"job:B".to_string()), "{ids:?}");
        }
        other => panic!("expected a cycle, got {other:?}"),
    }
}

#[test]
fn cycle_report_names_only_the_cycle() {
    let jobs = [
        job("upload").output("output0", "raw").build(),
        job("A").input("input", "raw").input("loop", "X").output("out", "Y").build(),
        job("B").input("input", "Y").output("out", "X").build(),
    ];

    let err = build_dag(&jobs, &[]).unwrap_err();

    assert_eq!(
        err,
        SyncError::CyclicGraph(vec![
            "job:A".into(),
            "job:B".into(),
            "content:X".into(),
            "content:Y".into(),
        ])
    );
}

#[test]
fn chain_orders_producers_before_consumers() {
    init_tracing();
    let jobs = [
        // Listed out of order on purpose.
        job("align").input("reads", "d1").output("bam", "d2").build(),
        job("upload").output("output0", "d1").build(),
        job("stats").input("input", "d2").output("report", "d3").build(),
    ];

    let dag = build_dag(&jobs, &[]).unwrap();

    assert_eq!(dag.node_count(), 6);
    assert_eq!(dag.edge_count(), 5);

    let order = dag.topological_order();
    let pos = |key: NodeKey| order.iter().position(|k| *k == key).unwrap();
    assert!(pos(NodeKey::Job("upload".into())) < pos(NodeKey::Content("d1".into())));
    assert!(pos(NodeKey::Content("d1".into())) < pos(NodeKey::Job("align".into())));
    assert!(pos(NodeKey::Job("align".into())) < pos(NodeKey::Job("stats".into())));

    assert_eq!(dag.producers_of("d2"), vec!["align"]);
    assert_eq!(dag.consumers_of("d2"), vec!["stats"]);
    assert_eq!(dag.consumers_of("d3"), Vec::<&str>::new());
}

#[test]
fn edges_carry_direction_and_parameter_names() {
    let jobs = [job("J").input("query", "q").output("hits", "h").build()];

    let dag = build_dag(&jobs, &[]).unwrap();
    let mut edges = dag.edges();
    edges.sort_by(|a, b| a.from.id().cmp(b.from.id()));

    assert_eq!(edges.len(), 2);
    assert_eq!(edges[0].from, NodeKey::Job("J".into()));
    assert_eq!(edges[0].to, NodeKey::Content("h".into()));
    assert_eq!(edges[0].kind, EdgeKind::Produces);
    assert_eq!(edges[0].params, vec!["hits".to_string()]);
    assert_eq!(edges[1].from, NodeKey::Content("q".into()));
    assert_eq!(edges[1].kind, EdgeKind::Consumes);
}

#[test]
fn content_nodes_are_enriched_from_the_collection() {
    let jobs = [job("J").state("running").input("input", "d1").output("out", "d9").build()];
    let contents = [ContentRecordBuilder::new("d1", 4)
        .state("ok")
        .name("reads.fastq")
        .build()];

    let dag = build_dag(&jobs, &contents).unwrap();

    match &dag.node(&NodeKey::Content("d1".into())).unwrap().detail {
        NodeDetail::Content { hid, state, name } => {
            assert_eq!(*hid, Some(4));
            assert_eq!(*state, Some(ContentState::Ok));
            assert_eq!(name.as_deref(), Some("reads.fastq"));
        }
        other => panic!("expected content detail, got {other:?}"),
    }

    // Unknown ids still get a node, just without detail.
    match &dag.node(&NodeKey::Content("d9".into())).unwrap().detail {
        NodeDetail::Content { hid, state, name } => {
            assert_eq!((*hid, state.clone(), name.clone()), (None, None, None));
        }
        other => panic!("expected content detail, got {other:?}"),
    }

    match &dag.node(&NodeKey::Job("J".into())).unwrap().detail {
        NodeDetail::Job { tool_id, state } => {
            assert_eq!(tool_id, "cat1");
            assert_eq!(*state, JobState::Running);
        }
        other => panic!("expected job detail, got {other:?}"),
    }
}

#[test]
fn shared_input_is_one_node() {
    let jobs = [
        job("J1").input("input", "ref").build(),
        job("J2").input("input", "ref").build(),
    ];

    let dag = build_dag(&jobs, &[]).unwrap();

    assert_eq!(dag.node_count(), 3);
    assert_eq!(dag.consumers_of("ref"), vec!["J1", "J2"]);
    assert!(dag.contains(&NodeKey::Content("ref".into())));
    assert!(!dag.contains(&NodeKey::Job("ref".into())));
}

#[test]
fn empty_job_list_is_an_empty_dag() {
    let dag = build_dag(&[], &[]).unwrap();
    assert_eq!(dag.node_count(), 0);
    assert!(dag.topological_order().is_empty());
}

#[test]
fn decoded_listing_builds_a_dag() {
    let body = br#"[
        {"id": "j1", "tool_id": "upload1", "state": "ok",
         "outputs": {"output0": {"id": "d1", "src": "hda"}}},
        {"id": "j2", "tool_id": "cat1", "state": "queued",
         "inputs": {"input1": {"id": "d1", "src": "hda"}, "queries": [{"id": "d1"}]},
         "outputs": {"out_file1": {"id": "d2", "src": "hda"}}}
    ]"#;

    let jobs = decode_jobs(body).unwrap();
    let dag = build_dag(&jobs, &[]).unwrap();

    assert_eq!(dag.producers_of("d1"), vec!["j1"]);
    assert_eq!(dag.consumers_of("d1"), vec!["j2"]);
    let edge = dag
        .edges()
        .into_iter()
        .find(|e| e.from == NodeKey::Content("d1".into()))
        .unwrap();
    assert_eq!(edge.params, vec!["input1".to_string(), "queries".to_string()]);
}
