//! Telemetry emitted during graph interpretation.
//!
//! Events are broadcast on the engine channel so hosts can observe
//! traversal progress, branch decisions, validation failures, and
//! executor errors without injecting their own effects.

use crate::{
    common::Vars,
    graph::node::{NodeId, NodeKind},
    model::{ItemId, OwnerId},
};

/// Generic event wrapper.
#[derive(Debug, Clone)]
pub struct Event<T> {
    inner: T,
}

impl<T> std::ops::Deref for Event<T>
where
    T: std::fmt::Debug + Clone,
{
    type Target = T;
    fn deref(&self) -> &Self::Target {
        &self.inner
    }
}

impl<T> Event<T>
where
    T: std::fmt::Debug + Clone,
{
    pub fn new(inner: &T) -> Self {
        Self {
            inner: inner.clone(),
        }
    }

    pub fn inner(&self) -> &T {
        &self.inner
    }
}

/// Telemetry message carrying owner and node context.
#[derive(Debug, Clone)]
pub struct Message {
    /// Logic owner whose graph produced the event (empty for engine events).
    pub owner: OwnerId,
    /// Node that produced the event (empty for graph-level events).
    pub nid: NodeId,
    /// The actual event data.
    pub event: TelemetryEvent,
}

/// Structured debug-log entry, e.g. external API request/response records.
#[derive(Debug, Clone)]
pub struct Log {
    pub owner: OwnerId,
    pub nid: NodeId,
    /// Structured payload (request data, response body, error details).
    pub content: Vars,
    /// Timestamp in milliseconds.
    pub timestamp: i64,
}

/// Interpreter telemetry event kinds.
#[derive(Debug, Clone)]
pub enum TelemetryEvent {
    /// A page's graphs and items were loaded.
    PageLoaded {
        page_id: String,
    },
    /// An external event entered the dispatcher.
    Dispatched {
        event: String,
        origin: ItemId,
    },
    /// A node's executor is about to run. Emitted exactly once per node
    /// execution, before the node's own logic.
    NodeExecuted {
        kind: NodeKind,
    },
    /// A branching node chose an output handle.
    BranchTaken {
        handle: String,
        detail: Vars,
    },
    /// Input validation blocked a page transition or confirmation.
    ValidationFailed {
        item_ids: Vec<ItemId>,
    },
    /// A page node requested a transition.
    PageChangeRequested {
        page_id: String,
    },
    /// A confirmation modal opened and its branch suspended.
    ConfirmationOpened,
    /// A suspended confirmation was resolved externally.
    ConfirmationResolved {
        choice: String,
    },
    /// An executor failed; the rest of the traversal continued.
    Error {
        kind: NodeKind,
        message: String,
    },
}

impl TelemetryEvent {
    pub fn str(&self) -> &str {
        match self {
            TelemetryEvent::PageLoaded { .. } => "PageLoaded",
            TelemetryEvent::Dispatched { .. } => "Dispatched",
            TelemetryEvent::NodeExecuted { .. } => "NodeExecuted",
            TelemetryEvent::BranchTaken { .. } => "BranchTaken",
            TelemetryEvent::ValidationFailed { .. } => "ValidationFailed",
            TelemetryEvent::PageChangeRequested { .. } => "PageChangeRequested",
            TelemetryEvent::ConfirmationOpened => "ConfirmationOpened",
            TelemetryEvent::ConfirmationResolved { .. } => "ConfirmationResolved",
            TelemetryEvent::Error { .. } => "Error",
        }
    }

    pub fn is_error(&self) -> bool {
        matches!(self, TelemetryEvent::Error { .. })
    }
}
