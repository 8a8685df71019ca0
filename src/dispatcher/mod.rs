//! The single dispatcher task.
//!
//! Every external entry point and every suspension continuation funnels
//! into one command stream consumed here, so all graph traversal and all
//! shared-state mutation happen on one task. Nothing outside this module
//! interprets a graph.

use std::{
    collections::HashMap,
    hash::{DefaultHasher, Hash, Hasher},
    sync::Arc,
};

use tokio::runtime::Runtime;

use crate::{
    common::{MemCache, Queue, Shutdown},
    events::TelemetryEvent,
    graph::{
        Graph,
        edge::{EdgeSelect, SourceHandle},
        executors::Outcome,
        node::NodeId,
    },
    model::{GraphModel, ItemId, OwnerId, PageModel},
    runtime::{ConfirmationChoice, Context, PreviewState, RuntimeCommand, Session},
};

/// The click event name, the only event that releases click-waits.
const CLICK_EVENT: &str = "click";

pub struct Dispatcher {
    session: Arc<Session>,
    commands: Arc<Queue<RuntimeCommand>>,
    /// Compiled graphs keyed by content fingerprint, so reloading an
    /// unchanged page skips recompilation.
    graph_cache: Arc<MemCache<String, Arc<Graph>>>,
    runtime: Arc<Runtime>,
    shutdown: Arc<Shutdown>,
}

impl Dispatcher {
    pub fn new(
        session: Arc<Session>,
        commands: Arc<Queue<RuntimeCommand>>,
        graph_cache: Arc<MemCache<String, Arc<Graph>>>,
        runtime: Arc<Runtime>,
        shutdown: Arc<Shutdown>,
    ) -> Self {
        Self {
            session,
            commands,
            graph_cache,
            runtime,
            shutdown,
        }
    }

    /// Spawn the dispatcher loop. It runs until a shutdown signal or a
    /// [`RuntimeCommand::Shutdown`] command arrives.
    pub fn start(self: Arc<Self>) {
        let dispatcher = self.clone();
        self.runtime.spawn(async move {
            let shutdown = dispatcher.shutdown.clone();
            loop {
                tokio::select! {
                    _ = shutdown.wait() => break,
                    cmd = dispatcher.commands.next_async() => {
                        match cmd {
                            Some(RuntimeCommand::Shutdown) | None => break,
                            Some(cmd) => dispatcher.handle(cmd).await,
                        }
                    }
                }
            }
            tracing::debug!("dispatcher stopped");
        });
    }

    async fn handle(
        &self,
        cmd: RuntimeCommand,
    ) {
        match cmd {
            RuntimeCommand::Dispatch {
                event,
                origin,
            } => self.handle_dispatch(&event, &origin).await,
            RuntimeCommand::Resume {
                owner,
                node_id,
                handle,
                trigger_item,
                generation,
            } => self.handle_resume(owner, node_id, handle, trigger_item, generation).await,
            RuntimeCommand::ResolveConfirmation {
                node_id,
                choice,
            } => self.handle_resolve_confirmation(node_id, choice).await,
            RuntimeCommand::LoadPage(page) => self.load_page(*page),
            RuntimeCommand::Reset => self.reset(),
            RuntimeCommand::Shutdown => {}
        }
    }

    /// Route one external UI event: first release any click-waits parked
    /// on the origin item, then start fresh chains from every matching
    /// event node across all owners.
    async fn handle_dispatch(
        &self,
        event: &str,
        origin: &ItemId,
    ) {
        self.emit_engine_event(TelemetryEvent::Dispatched {
            event: event.to_string(),
            origin: origin.clone(),
        });

        if event == CLICK_EVENT {
            for token in self.session.listeners().resolve(origin) {
                if token.generation != self.session.generation() {
                    continue;
                }
                let Some(graph) = self.session.graph(&token.owner) else {
                    continue;
                };
                // the resumed chain is re-bound to the clicked item
                let ctx = Arc::new(Context::new(
                    self.session.clone(),
                    token.owner.clone(),
                    graph.clone(),
                    Some(origin.clone()),
                ));
                let seeds = graph.successors(&token.node_id, &EdgeSelect::default());
                self.run_traversal(ctx, seeds).await;
            }
        }

        for (owner, graph) in self.session.all_graphs() {
            let seeds: Vec<NodeId> = graph
                .event_nodes()
                .filter(|node| {
                    node.event.as_ref().is_some_and(|spec| spec.matches(event, origin, &owner))
                })
                .map(|node| node.id.clone())
                .collect();
            if seeds.is_empty() {
                continue;
            }
            let ctx = Arc::new(Context::new(
                self.session.clone(),
                owner,
                graph,
                Some(origin.clone()),
            ));
            self.run_traversal(ctx, seeds).await;
        }
    }

    async fn handle_resume(
        &self,
        owner: OwnerId,
        node_id: NodeId,
        handle: SourceHandle,
        trigger_item: Option<ItemId>,
        generation: u64,
    ) {
        if generation != self.session.generation() {
            tracing::debug!(node = %node_id, "discarding stale resume");
            return;
        }
        let Some(graph) = self.session.graph(&owner) else {
            return;
        };
        let seeds = graph.successors(&node_id, &EdgeSelect::Handle(handle));
        let ctx = Arc::new(Context::new(self.session.clone(), owner, graph, trigger_item));
        self.run_traversal(ctx, seeds).await;
    }

    async fn handle_resolve_confirmation(
        &self,
        node_id: NodeId,
        choice: ConfirmationChoice,
    ) {
        let Some(pending) = self.session.take_confirmation(&node_id) else {
            tracing::debug!(node = %node_id, "no pending confirmation for node");
            return;
        };
        if pending.generation != self.session.generation() {
            return;
        }

        self.session.state().update_preview_state(&mut |state| {
            state.confirmation = None;
        });

        let Some(graph) = self.session.graph(&pending.owner) else {
            return;
        };
        let ctx = Arc::new(Context::new(
            self.session.clone(),
            pending.owner.clone(),
            graph.clone(),
            pending.trigger_item.clone(),
        ));
        ctx.emit_event(&node_id, TelemetryEvent::ConfirmationResolved {
            choice: choice.as_ref().to_string(),
        });
        let seeds = graph.successors(&node_id, &EdgeSelect::Handle(choice.handle().into()));
        self.run_traversal(ctx, seeds).await;
    }

    /// Level-order traversal from `seeds`. Each node emits its telemetry
    /// record before its executor runs; an executor error is reported and
    /// the rest of the level continues.
    async fn run_traversal(
        &self,
        ctx: Arc<Context>,
        seeds: Vec<NodeId>,
    ) {
        let graph = ctx.graph().clone();
        tracing::debug!(run = %ctx.run_id(), owner = %ctx.owner(), seeds = seeds.len(), "traversal started");
        let mut level = seeds;
        while !level.is_empty() {
            let mut next = Vec::new();
            for nid in level {
                let Some(node) = graph.get_node(&nid) else {
                    continue;
                };
                ctx.emit_event(&nid, TelemetryEvent::NodeExecuted {
                    kind: node.kind,
                });
                match node.executor.run(ctx.clone(), nid.clone()).await {
                    Ok(Outcome::Next(handle)) => {
                        next.extend(graph.successors(&nid, &EdgeSelect::Handle(handle)));
                    }
                    Ok(Outcome::AnyNext) => {
                        next.extend(graph.successors(&nid, &EdgeSelect::Any));
                    }
                    Ok(Outcome::Halt) | Ok(Outcome::Suspended) => {}
                    Err(e) => {
                        tracing::error!(node = %nid, kind = %node.kind.as_ref(), error = %e, "executor failed");
                        ctx.emit_event(&nid, TelemetryEvent::Error {
                            kind: node.kind,
                            message: e.to_string(),
                        });
                    }
                }
            }
            level = next;
        }
    }

    /// Swap in a page: compile (or re-use) its graphs, replace the item
    /// list, reinitialize preview state, and invalidate every suspension.
    fn load_page(
        &self,
        page: PageModel,
    ) {
        let mut graphs = HashMap::new();
        for (owner, model) in page.logic.iter() {
            match self.compile(model) {
                Ok(graph) => {
                    graphs.insert(owner.clone(), graph);
                }
                Err(e) => {
                    // one broken graph must not take the whole page down
                    tracing::warn!(owner = %owner, error = %e, "skipping graph that failed to compile");
                }
            }
        }

        self.session.replace_page(graphs, page.items.clone());
        self.session.state().set_preview_state(PreviewState::initialize(&page.id, &page.items));
        self.emit_engine_event(TelemetryEvent::PageLoaded {
            page_id: page.id.clone(),
        });
        tracing::info!(page = %page.id, graphs = page.logic.len(), items = page.items.len(), "page loaded");
    }

    fn compile(
        &self,
        model: &GraphModel,
    ) -> crate::Result<Arc<Graph>> {
        let key = fingerprint(model);
        if let Some(graph) = self.graph_cache.get(&key) {
            return Ok(graph);
        }
        let graph = Arc::new(Graph::try_from(model)?);
        self.graph_cache.set(key, graph.clone());
        Ok(graph)
    }

    /// Reinitialize the current page's preview state in place and drop
    /// every outstanding suspension. Variables survive a reset.
    fn reset(&self) {
        self.session.bump_generation();
        // before the first page load there is no state to reinitialize
        let Some(page_id) = self.session.state().preview_state().current_page_id else {
            return;
        };
        let items = self.session.items();
        self.session.state().set_preview_state(PreviewState::initialize(&page_id, &items));
    }

    fn emit_engine_event(
        &self,
        event: TelemetryEvent,
    ) {
        let _ = self.session.channel().event_queue().send(crate::events::Event::new(&crate::events::Message {
            owner: String::new(),
            nid: String::new(),
            event,
        }));
    }
}

/// Content fingerprint of a persisted graph, used as the compile-cache key.
fn fingerprint(model: &GraphModel) -> String {
    let serialized = serde_json::to_string(model).unwrap_or_default();
    let mut hasher = DefaultHasher::new();
    serialized.hash(&mut hasher);
    format!("{:016x}", hasher.finish())
}
