//! Logic edge definitions connecting nodes.
//!
//! Edges define traversal flow between nodes, supporting branch handles
//! (e.g. true/false for conditionals, success/error for network calls).

use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::{
    PageflowError, Result,
    graph::node::NodeId,
    model::EdgeModel,
};

/// Unique identifier for an edge within a graph.
pub type EdgeId = String;

/// Fixed branch handles emitted by the built-in node kinds.
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq, Eq, strum::AsRefStr, strum::EnumString)]
#[serde(rename_all = "camelCase")]
#[strum(serialize_all = "camelCase")]
pub enum FixedHandle {
    /// Default output handle for sequential flow (a model-level `null`).
    #[default]
    Source,
    /// True branch of a conditional.
    True,
    /// False branch of a conditional.
    False,
    /// A branch of an A/B split.
    PathA,
    /// B branch of an A/B split.
    PathB,
    /// Success branch of a network-bound node.
    Success,
    /// Error branch of a network-bound node.
    Error,
    /// Confirm branch of a confirmation modal.
    Confirm,
    /// Back branch of a confirmation modal.
    Back,
}

/// Which output port of a node an edge originates from.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(untagged)]
pub enum SourceHandle {
    /// One of the built-in branch handles.
    Fixed(FixedHandle),
    /// A free-form handle emitted by authoring extensions.
    Custom(String),
}

impl Default for SourceHandle {
    fn default() -> Self {
        SourceHandle::Fixed(FixedHandle::default())
    }
}

impl SourceHandle {
    /// Map a persisted handle string; `None` is the default sequential port.
    pub fn from_model(handle: Option<&str>) -> Self {
        match handle {
            None => SourceHandle::default(),
            Some(s) => FixedHandle::from_str(s).map(SourceHandle::Fixed).unwrap_or_else(|_| SourceHandle::Custom(s.to_string())),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            SourceHandle::Fixed(h) => h.as_ref(),
            SourceHandle::Custom(s) => s.as_str(),
        }
    }
}

impl From<FixedHandle> for SourceHandle {
    fn from(h: FixedHandle) -> Self {
        SourceHandle::Fixed(h)
    }
}

/// Runtime edge connecting two nodes.
#[derive(Debug, Clone)]
pub struct Edge {
    pub id: EdgeId,
    pub source: NodeId,
    pub target: NodeId,
    pub source_handle: SourceHandle,
}

impl Edge {
    pub fn new(model: &EdgeModel) -> Result<Self> {
        if model.source.is_empty() || model.target.is_empty() {
            return Err(PageflowError::Edge(format!("edge {} is missing an endpoint", model.id)));
        }
        Ok(Self {
            id: model.id.clone(),
            source: model.source.clone(),
            target: model.target.clone(),
            source_handle: SourceHandle::from_model(model.source_handle.as_deref()),
        })
    }
}

/// Edge filter used when collecting a node's successors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EdgeSelect {
    /// Follow every outgoing edge regardless of handle. Used when seeding
    /// traversal from an event node's successors.
    Any,
    /// Follow only edges whose handle matches exactly. A default-handle
    /// filter never matches a labeled edge, and vice versa.
    Handle(SourceHandle),
}

impl Default for EdgeSelect {
    fn default() -> Self {
        EdgeSelect::Handle(SourceHandle::default())
    }
}
