//! Runtime-state contracts: the per-item preview state, the named-variable
//! map accessors, and the confirmation-modal descriptor.
//!
//! The interpreter never constructs its own storage. Both mutable state
//! slices are reached through a host-supplied [`StateHost`], whose base
//! contract is whole-structure read/replace; hosts that can lock override
//! the `update_*` methods with in-place mutation so each mutation closure
//! is applied atomically.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::{
    ShareLock,
    common::Vars,
    graph::{
        edge::FixedHandle,
        node::NodeId,
    },
    model::{ItemId, ItemModel},
};

/// Per-item runtime visual/behavioral state.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ItemState {
    #[serde(rename = "isVisible")]
    pub is_visible: bool,
    pub x: f64,
    pub y: f64,
    pub opacity: f64,
    pub scale: f64,
    /// degrees
    pub rotation: f64,
    /// CSS-transition descriptor for an observing renderer; `"none"`
    /// forces an instant snap
    #[serde(default)]
    pub transition: Option<String>,
    /// user-facing validation error, set by page/confirmation validation
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl Default for ItemState {
    fn default() -> Self {
        Self {
            is_visible: true,
            x: 0.0,
            y: 0.0,
            opacity: 1.0,
            scale: 1.0,
            rotation: 0.0,
            transition: None,
            error: None,
        }
    }
}

impl ItemState {
    /// Initial state derived from an item's placed geometry.
    pub fn from_item(item: &ItemModel) -> Self {
        Self {
            x: item.x,
            y: item.y,
            ..Default::default()
        }
    }
}

/// Choice a user makes on an open confirmation modal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, strum::AsRefStr, strum::EnumString)]
#[serde(rename_all = "camelCase")]
#[strum(serialize_all = "camelCase")]
pub enum ConfirmationChoice {
    Confirm,
    Back,
}

impl ConfirmationChoice {
    /// The edge handle traversal continues from.
    pub fn handle(&self) -> FixedHandle {
        match self {
            ConfirmationChoice::Confirm => FixedHandle::Confirm,
            ConfirmationChoice::Back => FixedHandle::Back,
        }
    }
}

/// Descriptor for the user-confirmation modal, embedded in preview state
/// while a confirmation node's branch is suspended.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ConfirmationModal {
    #[serde(rename = "isOpen")]
    pub is_open: bool,
    #[serde(rename = "nodeId")]
    pub node_id: NodeId,
    /// snapshot of the variable map at open time
    pub variables: Vars,
    #[serde(rename = "headerText")]
    pub header_text: String,
    #[serde(rename = "noticeText")]
    pub notice_text: String,
    #[serde(rename = "targetItemIds")]
    pub target_item_ids: Vec<ItemId>,
    #[serde(default, rename = "backPageId")]
    pub back_page_id: Option<String>,
    #[serde(rename = "isSubmitConfirmation")]
    pub is_submit_confirmation: bool,
}

/// The whole preview-state slice: one entry per item on the current page
/// plus page-level fields.
///
/// Reinitialized wholesale whenever the active page changes; individual
/// entries are then mutated in place by executors for the remainder of
/// that page's session.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PreviewState {
    pub items: HashMap<ItemId, ItemState>,
    #[serde(rename = "currentPageId")]
    pub current_page_id: Option<String>,
    #[serde(rename = "isFinished")]
    pub is_finished: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub confirmation: Option<ConfirmationModal>,
}

impl PreviewState {
    /// Fresh state for a page: one entry per placed item.
    pub fn initialize(
        page_id: &str,
        items: &[ItemModel],
    ) -> Self {
        Self {
            items: items.iter().map(|item| (item.id.clone(), ItemState::from_item(item))).collect(),
            current_page_id: Some(page_id.to_string()),
            is_finished: false,
            confirmation: None,
        }
    }
}

/// Host-supplied accessors for the two shared state slices and the
/// page-transition side effect.
pub trait StateHost: Send + Sync {
    fn preview_state(&self) -> PreviewState;
    fn set_preview_state(
        &self,
        state: PreviewState,
    );

    fn variables(&self) -> Vars;
    fn set_variables(
        &self,
        vars: Vars,
    );

    /// Request that the host switch the active page.
    fn request_page_change(
        &self,
        page_id: &str,
    );

    /// Apply a mutation to the preview state. The base implementation is
    /// read-modify-replace; lock-backed hosts should override it so the
    /// closure runs under the lock.
    fn update_preview_state(
        &self,
        f: &mut dyn FnMut(&mut PreviewState),
    ) {
        let mut state = self.preview_state();
        f(&mut state);
        self.set_preview_state(state);
    }

    /// Apply a mutation to the variable map. Same contract as
    /// [`StateHost::update_preview_state`].
    fn update_variables(
        &self,
        f: &mut dyn FnMut(&mut Vars),
    ) {
        let mut vars = self.variables();
        f(&mut vars);
        self.set_variables(vars);
    }
}

/// Lock-backed [`StateHost`] for embedding and tests.
#[derive(Default)]
pub struct MemoryStateHost {
    preview: ShareLock<PreviewState>,
    vars: ShareLock<Vars>,
    page_changes: ShareLock<Vec<String>>,
}

impl MemoryStateHost {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every page id passed to [`StateHost::request_page_change`], oldest first.
    pub fn page_changes(&self) -> Vec<String> {
        self.page_changes.read().unwrap().clone()
    }
}

impl StateHost for MemoryStateHost {
    fn preview_state(&self) -> PreviewState {
        self.preview.read().unwrap().clone()
    }

    fn set_preview_state(
        &self,
        state: PreviewState,
    ) {
        *self.preview.write().unwrap() = state;
    }

    fn variables(&self) -> Vars {
        self.vars.read().unwrap().clone()
    }

    fn set_variables(
        &self,
        vars: Vars,
    ) {
        *self.vars.write().unwrap() = vars;
    }

    fn request_page_change(
        &self,
        page_id: &str,
    ) {
        self.page_changes.write().unwrap().push(page_id.to_string());
    }

    fn update_preview_state(
        &self,
        f: &mut dyn FnMut(&mut PreviewState),
    ) {
        f(&mut self.preview.write().unwrap());
    }

    fn update_variables(
        &self,
        f: &mut dyn FnMut(&mut Vars),
    ) {
        f(&mut self.vars.write().unwrap());
    }
}
