use serde::{Deserialize, Serialize};

use crate::{
    PageflowError, Result,
    graph::executors::{self, Executor},
    model::{ItemId, NodeModel, OwnerId},
};

/// node id
pub type NodeId = String;

/// Sentinel string the authoring surface stores for "the item that
/// triggered the current chain".
pub const TRIGGER_ITEM: &str = "TRIGGER_ITEM";

/// The kind of a logic node, one variant per executor.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, strum::AsRefStr, strum::EnumString)]
pub enum NodeKind {
    #[serde(rename = "eventNode")]
    #[strum(serialize = "eventNode")]
    Event,
    #[serde(rename = "actionNode")]
    #[strum(serialize = "actionNode")]
    Action,
    #[serde(rename = "ifNode")]
    #[strum(serialize = "ifNode")]
    If,
    #[serde(rename = "pageNode")]
    #[strum(serialize = "pageNode")]
    Page,
    #[serde(rename = "setVariableNode")]
    #[strum(serialize = "setVariableNode")]
    SetVariable,
    #[serde(rename = "delayNode")]
    #[strum(serialize = "delayNode")]
    Delay,
    #[serde(rename = "animateNode")]
    #[strum(serialize = "animateNode")]
    Animate,
    #[serde(rename = "waitForClickNode")]
    #[strum(serialize = "waitForClickNode")]
    WaitForClick,
    #[serde(rename = "abTestNode")]
    #[strum(serialize = "abTestNode")]
    AbTest,
    #[serde(rename = "confirmationNode")]
    #[strum(serialize = "confirmationNode")]
    Confirmation,
    #[serde(rename = "submitFormNode")]
    #[strum(serialize = "submitFormNode")]
    SubmitForm,
    #[serde(rename = "externalApiNode")]
    #[strum(serialize = "externalApiNode")]
    ExternalApi,
}

/// A target-item reference inside node configuration.
///
/// The authoring surface stores either a literal item id or the
/// `"TRIGGER_ITEM"` sentinel; in memory the sentinel is a proper variant
/// resolved against the chain's trigger item at executor entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum TargetRef {
    TriggerItem,
    Item(ItemId),
}

impl From<String> for TargetRef {
    fn from(s: String) -> Self {
        if s == TRIGGER_ITEM {
            TargetRef::TriggerItem
        } else {
            TargetRef::Item(s)
        }
    }
}

impl From<TargetRef> for String {
    fn from(t: TargetRef) -> Self {
        match t {
            TargetRef::TriggerItem => TRIGGER_ITEM.to_string(),
            TargetRef::Item(id) => id,
        }
    }
}

impl TargetRef {
    /// Resolve against the chain's trigger item. `None` when the sentinel
    /// is used outside an event chain.
    pub fn resolve(
        &self,
        trigger_item: Option<&ItemId>,
    ) -> Option<ItemId> {
        match self {
            TargetRef::TriggerItem => trigger_item.cloned(),
            TargetRef::Item(id) => Some(id.clone()),
        }
    }
}

/// Event-node configuration, read by the dispatcher when matching an
/// incoming event against a graph's entry points.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EventSpec {
    /// event name this node reacts to, e.g. `"click"`, `"onInputComplete"`
    #[serde(default = "EventSpec::default_event_type", rename = "eventType")]
    pub event_type: String,
    /// explicit multi-target list; highest matching priority when non-empty
    #[serde(default, rename = "targetItemIds")]
    pub target_item_ids: Vec<ItemId>,
    /// explicit single target; consulted when the list is empty
    #[serde(default, rename = "targetItemId")]
    pub target_item_id: Option<ItemId>,
}

impl EventSpec {
    fn default_event_type() -> String {
        "click".to_string()
    }

    /// Targeting rules, in priority order: explicit list membership,
    /// single-target equality, then implicit self-targeting via the
    /// graph's owner.
    pub fn matches(
        &self,
        event: &str,
        origin: &ItemId,
        owner: &OwnerId,
    ) -> bool {
        if self.event_type != event {
            return false;
        }
        if !self.target_item_ids.is_empty() {
            return self.target_item_ids.iter().any(|id| id == origin);
        }
        if let Some(target) = &self.target_item_id {
            return target == origin;
        }
        owner == origin
    }
}

/// Runtime logic node. Immutable during traversal; all mutable state lives
/// in the preview state and variable map, never on the node.
pub struct Node {
    pub id: NodeId,
    pub kind: NodeKind,
    /// present only on event nodes
    pub event: Option<EventSpec>,
    pub executor: Box<dyn Executor>,
}

impl Node {
    pub fn new(model: &NodeModel) -> Result<Self> {
        let kind: NodeKind = model.kind.parse().map_err(|_| PageflowError::Node(format!("unknown node kind '{}'", model.kind)))?;

        let data = if model.data.is_null() {
            serde_json::json!({})
        } else {
            model.data.clone()
        };

        let executor = executors::create(kind, data.clone())?;

        let event = if kind == NodeKind::Event {
            let spec = serde_json::from_value::<EventSpec>(data).map_err(|e| PageflowError::Node(format!("invalid event node data: {}", e)))?;
            Some(spec)
        } else {
            None
        };

        Ok(Self {
            id: model.id.clone(),
            kind,
            event,
            executor,
        })
    }
}
