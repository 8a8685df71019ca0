//! Shared interpreter session state.
//!
//! One [`Session`] lives for the Engine's lifetime and owns everything the
//! dispatcher and executors share: compiled graphs, the item list, the
//! host's state accessors, effects, suspension bookkeeping, and the
//! generation counter that invalidates in-flight timers on page change.

use std::{
    collections::HashMap,
    sync::{
        Arc,
        atomic::{AtomicU64, Ordering},
    },
    time::Duration,
};

use crate::{
    ShareLock,
    common::Queue,
    graph::{Graph, node::NodeId},
    model::{ItemId, ItemModel, OwnerId},
    runtime::{
        Channel,
        command::RuntimeCommand,
        effects::Effects,
        listeners::ListenerRegistry,
        state::StateHost,
    },
};

/// A confirmation branch waiting for external resolution.
#[derive(Debug, Clone)]
pub struct PendingConfirmation {
    pub owner: OwnerId,
    pub trigger_item: Option<ItemId>,
    pub generation: u64,
}

pub struct Session {
    graphs: ShareLock<HashMap<OwnerId, Arc<Graph>>>,
    items: ShareLock<Arc<Vec<ItemModel>>>,
    state: Arc<dyn StateHost>,
    effects: Arc<dyn Effects>,
    listeners: ListenerRegistry,
    pending_confirmations: ShareLock<HashMap<NodeId, PendingConfirmation>>,
    commands: Arc<Queue<RuntimeCommand>>,
    channel: Arc<Channel>,
    /// Bumped on page change/reset; suspensions capture it and no-op when
    /// their captured value goes stale.
    generation: AtomicU64,
    animate_safety_margin: Duration,
}

impl Session {
    pub fn new(
        state: Arc<dyn StateHost>,
        effects: Arc<dyn Effects>,
        commands: Arc<Queue<RuntimeCommand>>,
        channel: Arc<Channel>,
        animate_safety_margin: Duration,
    ) -> Self {
        Self {
            graphs: Arc::new(std::sync::RwLock::new(HashMap::new())),
            items: Arc::new(std::sync::RwLock::new(Arc::new(Vec::new()))),
            state,
            effects,
            listeners: ListenerRegistry::new(),
            pending_confirmations: Arc::new(std::sync::RwLock::new(HashMap::new())),
            commands,
            channel,
            generation: AtomicU64::new(0),
            animate_safety_margin,
        }
    }

    pub fn graph(
        &self,
        owner: &OwnerId,
    ) -> Option<Arc<Graph>> {
        self.graphs.read().unwrap().get(owner).cloned()
    }

    /// Snapshot of every owner's graph, for event-node scanning.
    pub fn all_graphs(&self) -> Vec<(OwnerId, Arc<Graph>)> {
        self.graphs.read().unwrap().iter().map(|(k, v)| (k.clone(), v.clone())).collect()
    }

    pub fn items(&self) -> Arc<Vec<ItemModel>> {
        self.items.read().unwrap().clone()
    }

    /// Swap in a new page's graphs and items and invalidate every
    /// outstanding suspension.
    pub fn replace_page(
        &self,
        graphs: HashMap<OwnerId, Arc<Graph>>,
        items: Vec<ItemModel>,
    ) {
        self.bump_generation();
        *self.graphs.write().unwrap() = graphs;
        *self.items.write().unwrap() = Arc::new(items);
        self.listeners.clear();
        self.pending_confirmations.write().unwrap().clear();
    }

    pub fn state(&self) -> &Arc<dyn StateHost> {
        &self.state
    }

    pub fn effects(&self) -> &Arc<dyn Effects> {
        &self.effects
    }

    pub fn listeners(&self) -> &ListenerRegistry {
        &self.listeners
    }

    pub fn commands(&self) -> &Arc<Queue<RuntimeCommand>> {
        &self.commands
    }

    pub fn channel(&self) -> &Arc<Channel> {
        &self.channel
    }

    pub fn generation(&self) -> u64 {
        self.generation.load(Ordering::SeqCst)
    }

    pub fn bump_generation(&self) -> u64 {
        let bumped = self.generation.fetch_add(1, Ordering::SeqCst) + 1;
        self.listeners.clear();
        self.pending_confirmations.write().unwrap().clear();
        bumped
    }

    pub fn animate_safety_margin(&self) -> Duration {
        self.animate_safety_margin
    }

    pub fn register_confirmation(
        &self,
        node_id: NodeId,
        pending: PendingConfirmation,
    ) {
        self.pending_confirmations.write().unwrap().insert(node_id, pending);
    }

    pub fn take_confirmation(
        &self,
        node_id: &NodeId,
    ) -> Option<PendingConfirmation> {
        self.pending_confirmations.write().unwrap().remove(node_id)
    }
}
