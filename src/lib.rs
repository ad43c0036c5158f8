// src/lib.rs

pub mod api;
pub mod cli;
pub mod collection;
pub mod config;
pub mod content;
pub mod context;
pub mod dag;
pub mod errors;
pub mod logging;
pub mod poll;
pub mod types;
pub mod view;

use std::sync::Arc;

use anyhow::Result;
use tracing::{debug, info, warn};

use crate::cli::CliArgs;
use crate::config::ConfigFile;
use crate::config::loader::load_and_validate;
use crate::context::AppContext;
use crate::dag::{JobDag, NodeDetail, NodeKey};
use crate::poll::{ChannelObserver, PollEvent, PollObserver, PollUpdate};
use crate::view::HistoryView;

/// High-level entry point used by `main.rs`.
///
/// This wires together:
/// - config loading
/// - the API client and the history's content collection
/// - the poller and its event channel
/// - DAG rebuilds after every changed tick
/// - Ctrl-C handling
pub async fn run(args: CliArgs) -> Result<()> {
    let cfg = load_and_validate(&args.config)?;

    if args.dry_run {
        print_dry_run(&cfg, &args.history);
        return Ok(());
    }

    let ctx = AppContext::from_config(cfg)?;
    let collection = ctx.collection_for(&args.history);
    let mut view = HistoryView::new();

    if args.once {
        let summary = collection.refresh().await?;
        view.on_update(&PollUpdate {
            tick: 1,
            summary,
            contents: collection.to_array(),
            all_terminal: collection.all_terminal(),
        });
        rebuild_and_print(&ctx, &args.history, &mut view).await?;
        return Ok(());
    }

    let poller = Arc::new(ctx.poller_for(collection));
    let (observer, mut events) = ChannelObserver::channel();
    let handle = Arc::clone(&poller).start(observer);

    // Ctrl-C → cooperative cancel.
    {
        let token = poller.cancellation_token();
        tokio::spawn(async move {
            tokio::select! {
                res = tokio::signal::ctrl_c() => match res {
                    Ok(()) => {
                        info!("Ctrl-C received; cancelling poller");
                        token.cancel();
                    }
                    Err(e) => eprintln!("failed to listen for Ctrl+C: {e}"),
                },
                _ = token.cancelled() => {}
            }
        });
    }

    while let Some(event) = events.recv().await {
        view.apply(&event);
        match event {
            PollEvent::Updated(update) => {
                let merge = update.summary.merge;
                debug!(
                    tick = update.tick,
                    changed = merge.inserted + merge.replaced,
                    "history changed"
                );
                // A failed DAG rebuild is logged; polling carries on.
                if let Err(err) = rebuild_and_print(&ctx, &args.history, &mut view).await {
                    warn!(%err, "could not rebuild job DAG");
                }
            }
            PollEvent::Done(state) => info!(?state, "polling finished"),
            PollEvent::Failed(err) => warn!(%err, "polling failed"),
        }
    }

    let outcome = handle.await?;
    match outcome.error {
        Some(err) => Err(err.into()),
        None => Ok(()),
    }
}

async fn rebuild_and_print(
    ctx: &AppContext,
    history_id: &str,
    view: &mut HistoryView,
) -> Result<()> {
    let jobs = ctx.api().fetch_jobs(history_id).await?;
    print_contents(view);
    let dag = view.rebuild_dag(&jobs)?;
    print_dag(dag);
    Ok(())
}

fn print_contents(view: &HistoryView) {
    println!(
        "history contents ({}, all terminal: {}):",
        view.contents().len(),
        view.all_terminal()
    );
    for item in view.contents() {
        let flags = match (item.deleted, item.visible) {
            (true, _) => " [deleted]",
            (false, false) => " [hidden]",
            _ => "",
        };
        println!(
            "  {:>4}  {:<16} {}{}",
            item.hid,
            item.state.as_str(),
            item.name.as_deref().unwrap_or(&item.id),
            flags
        );
    }
}

fn print_dag(dag: &JobDag) {
    println!("job DAG ({} nodes, {} edges):", dag.node_count(), dag.edge_count());
    for key in dag.topological_order() {
        let NodeKey::Job(job_id) = &key else {
            continue;
        };
        let Some(node) = dag.node(&key) else {
            continue;
        };
        if let NodeDetail::Job { tool_id, state } = &node.detail {
            println!("  - {job_id} ({tool_id}, {state})");
        }
        for edge in dag.edges().iter().filter(|e| e.to == key) {
            println!("      in:  {} via {}", edge.from.id(), edge.params.join(","));
        }
        for edge in dag.edges().iter().filter(|e| e.from == key) {
            println!("      out: {} via {}", edge.to.id(), edge.params.join(","));
        }
    }
}

/// Simple dry-run output: print the effective configuration.
fn print_dry_run(cfg: &ConfigFile, history_id: &str) {
    println!("histdag dry-run");
    println!("  history = {history_id}");
    println!("  server.base_url = {}", cfg.server.base_url);
    let api_key = if cfg.server.api_key.is_some() { "<set>" } else { "<unset>" };
    println!("  server.api_key = {api_key}");
    println!("  server.connect_timeout = {:?}", cfg.server.connect_timeout);
    println!("  server.request_timeout = {:?}", cfg.server.request_timeout);
    println!();
    println!("  poll.backoff = {:?}", cfg.poll.backoff.kind);
    println!("  poll.initial_interval = {:?}", cfg.poll.backoff.initial);
    println!("  poll.max_interval = {:?}", cfg.poll.backoff.max);
    println!("  poll.max_consecutive_failures = {}", cfg.poll.max_consecutive_failures);
    if let Some(n) = cfg.poll.max_attempts {
        println!("  poll.max_attempts = {n}");
    }
    if let Some(d) = cfg.poll.max_duration {
        println!("  poll.max_duration = {d:?}");
    }
    if let Some(n) = cfg.page_size {
        println!("  poll.page_size = {n}");
    }
    if let Some(deleted) = cfg.filter.deleted {
        println!("  filter.deleted = {deleted}");
    }
    if let Some(visible) = cfg.filter.visible {
        println!("  filter.visible = {visible}");
    }

    debug!("dry-run complete (no requests)");
}
