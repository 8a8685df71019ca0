use serde::{Deserialize, Serialize};

/// Persisted edge shape as produced by the authoring surface.
///
/// `source_handle` is `None` for plain sequential flow and carries a branch
/// label (`"true"`, `"pathA"`, `"success"`, ...) for branching nodes.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EdgeModel {
    pub id: String,
    pub source: String,
    pub target: String,
    #[serde(default, rename = "sourceHandle")]
    pub source_handle: Option<String>,
}
