use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::{
    PageflowError, Result,
    model::{EdgeModel, ItemModel, NodeModel},
};

/// logic-owner id: the item (or page-level owner) a graph is attached to
pub type OwnerId = String;

/// One logic graph: the nodes and edges attached to a single logic owner.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GraphModel {
    #[serde(default)]
    pub nodes: Vec<NodeModel>,
    #[serde(default)]
    pub edges: Vec<EdgeModel>,
}

/// Everything the interpreter consumes for one page: the placed items and
/// the logic graphs keyed by owner id (an item id, or a page-level owner).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PageModel {
    pub id: String,
    #[serde(default)]
    pub items: Vec<ItemModel>,
    #[serde(default)]
    pub logic: HashMap<String, GraphModel>,
}

impl PageModel {
    pub fn from_json(s: &str) -> Result<Self> {
        serde_json::from_str::<PageModel>(s).map_err(|e| PageflowError::Convert(format!("invalid page model: {}", e)))
    }
}
