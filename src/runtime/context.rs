//! Per-traversal execution context handed to every executor.

use std::{sync::Arc, time::Duration};

use serde_json::Value;

use crate::{
    common::Vars,
    events::{Event, Log, Message, TelemetryEvent},
    graph::{
        Graph,
        edge::SourceHandle,
        node::{NodeId, TargetRef},
    },
    model::{ItemId, ItemModel, OwnerId},
    runtime::{
        command::RuntimeCommand,
        effects::Effects,
        listeners::ResumeToken,
        session::{PendingConfirmation, Session},
        state::{ItemState, PreviewState},
    },
    utils,
};

/// One traversal's view of the session: the graph being walked, its owner,
/// and the item id that originated the chain.
#[derive(Clone)]
pub struct Context {
    session: Arc<Session>,
    owner: OwnerId,
    graph: Arc<Graph>,
    trigger_item: Option<ItemId>,
    generation: u64,
    /// correlation id shared by every step and log entry of one chain
    run_id: String,
}

impl Context {
    pub fn new(
        session: Arc<Session>,
        owner: OwnerId,
        graph: Arc<Graph>,
        trigger_item: Option<ItemId>,
    ) -> Self {
        let generation = session.generation();
        Self {
            session,
            owner,
            graph,
            trigger_item,
            generation,
            run_id: utils::longid(),
        }
    }

    pub fn run_id(&self) -> &str {
        &self.run_id
    }

    pub fn owner(&self) -> &OwnerId {
        &self.owner
    }

    pub fn graph(&self) -> &Arc<Graph> {
        &self.graph
    }

    pub fn trigger_item(&self) -> Option<&ItemId> {
        self.trigger_item.as_ref()
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Whether the session has moved on since this traversal began.
    pub fn is_stale(&self) -> bool {
        self.session.generation() != self.generation
    }

    pub fn effects(&self) -> &Arc<dyn Effects> {
        self.session.effects()
    }

    pub fn animate_safety_margin(&self) -> Duration {
        self.session.animate_safety_margin()
    }

    // --- items -----------------------------------------------------------

    pub fn items(&self) -> Arc<Vec<ItemModel>> {
        self.session.items()
    }

    pub fn find_item(
        &self,
        id: &ItemId,
    ) -> Option<ItemModel> {
        self.session.items().iter().find(|item| &item.id == id).cloned()
    }

    /// Resolve a target reference against this chain's trigger item.
    pub fn resolve_target(
        &self,
        target: &TargetRef,
    ) -> Option<ItemId> {
        target.resolve(self.trigger_item.as_ref())
    }

    // --- shared state ----------------------------------------------------

    pub fn preview_state(&self) -> PreviewState {
        self.session.state().preview_state()
    }

    pub fn update_preview_state(
        &self,
        mut f: impl FnMut(&mut PreviewState),
    ) {
        self.session.state().update_preview_state(&mut f);
    }

    /// Mutate one item's runtime state. Returns false when the item has no
    /// preview-state entry ("item not found", a non-fatal no-op).
    pub fn update_item_state(
        &self,
        item_id: &ItemId,
        mut f: impl FnMut(&mut ItemState),
    ) -> bool {
        let mut found = false;
        self.session.state().update_preview_state(&mut |state| {
            if let Some(item_state) = state.items.get_mut(item_id) {
                f(item_state);
                found = true;
            }
        });
        found
    }

    pub fn item_state(
        &self,
        item_id: &ItemId,
    ) -> Option<ItemState> {
        self.preview_state().items.get(item_id).cloned()
    }

    pub fn variables(&self) -> Vars {
        self.session.state().variables()
    }

    pub fn set_variable(
        &self,
        name: &str,
        value: Value,
    ) {
        self.session.state().update_variables(&mut |vars| {
            vars.insert(name.to_string(), value.clone());
        });
    }

    pub fn request_page_change(
        &self,
        page_id: &str,
    ) {
        self.session.state().request_page_change(page_id);
    }

    // --- telemetry -------------------------------------------------------

    /// Publish a telemetry event for `nid` on the engine channel.
    pub fn emit_event(
        &self,
        nid: &NodeId,
        event: TelemetryEvent,
    ) {
        let _ = self.session.channel().event_queue().send(Event::new(&Message {
            owner: self.owner.clone(),
            nid: nid.clone(),
            event,
        }));
    }

    /// Write a structured entry to the debug-log stream.
    pub fn emit_log(
        &self,
        nid: &NodeId,
        content: Vars,
    ) {
        let log = Log {
            owner: self.owner.clone(),
            nid: nid.clone(),
            content,
            timestamp: utils::time::time_millis(),
        };
        let _ = self.session.channel().log_queue().send(Event::new(&log));
    }

    // --- suspension protocol ---------------------------------------------

    /// Re-enter the dispatcher from a suspended branch. Dropped silently
    /// when the captured generation has gone stale.
    pub fn send_resume(
        &self,
        node_id: &NodeId,
        handle: SourceHandle,
        trigger_item: Option<ItemId>,
    ) {
        if self.is_stale() {
            tracing::debug!(node = %node_id, "dropping resume for stale generation");
            return;
        }
        let _ = self.session.commands().send(RuntimeCommand::Resume {
            owner: self.owner.clone(),
            node_id: node_id.clone(),
            handle,
            trigger_item,
            generation: self.generation,
        });
    }

    /// Schedule a timed resume along `handle` after `delay`.
    pub fn schedule_resume(
        self: &Arc<Self>,
        node_id: &NodeId,
        handle: SourceHandle,
        delay: Duration,
    ) {
        let ctx = self.clone();
        let node_id = node_id.clone();
        tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            let trigger = ctx.trigger_item.clone();
            ctx.send_resume(&node_id, handle, trigger);
        });
    }

    /// Park a wait-for-click branch until `item_id` is clicked.
    pub fn register_click_wait(
        &self,
        item_id: ItemId,
        node_id: &NodeId,
    ) {
        self.session.listeners().register(item_id, ResumeToken {
            owner: self.owner.clone(),
            node_id: node_id.clone(),
            generation: self.generation,
        });
    }

    /// Park a confirmation branch until it is resolved externally.
    pub fn register_confirmation(
        &self,
        node_id: &NodeId,
    ) {
        self.session.register_confirmation(node_id.clone(), PendingConfirmation {
            owner: self.owner.clone(),
            trigger_item: self.trigger_item.clone(),
            generation: self.generation,
        });
    }
}
