//! Commands consumed by the single dispatcher task.
//!
//! Every external entry point and every suspension continuation re-enters
//! the interpreter through this stream, which serializes all state
//! mutation onto one task.

use crate::{
    graph::{edge::SourceHandle, node::NodeId},
    model::{ItemId, OwnerId, PageModel},
    runtime::state::ConfirmationChoice,
};

#[derive(Debug, Clone)]
pub enum RuntimeCommand {
    /// External UI event (click, input-complete, image-load, ...).
    Dispatch {
        event: String,
        origin: ItemId,
    },
    /// Continuation of a suspended branch: traverse the suspended node's
    /// successors along `handle`.
    Resume {
        owner: OwnerId,
        node_id: NodeId,
        handle: SourceHandle,
        /// trigger item for the resumed chain; rebound to the clicked item
        /// when a click-wait releases
        trigger_item: Option<ItemId>,
        /// session generation captured at suspension; stale resumes no-op
        generation: u64,
    },
    /// External resolution of an open confirmation modal.
    ResolveConfirmation {
        node_id: NodeId,
        choice: ConfirmationChoice,
    },
    /// Swap in a page's graphs and items, reinitializing preview state.
    LoadPage(Box<PageModel>),
    /// Reinitialize the current page's preview state and drop suspensions.
    Reset,
    Shutdown,
}
