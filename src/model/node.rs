use serde::{Deserialize, Serialize};

/// Editor-side canvas position. Layout-only, ignored by the interpreter.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct Position {
    #[serde(default)]
    pub x: f64,
    #[serde(default)]
    pub y: f64,
}

/// Persisted node shape as produced by the authoring surface.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NodeModel {
    pub id: String,
    /// node kind discriminator, e.g. `"eventNode"`, `"ifNode"`
    #[serde(rename = "type")]
    pub kind: String,
    /// kind-specific configuration payload
    #[serde(default)]
    pub data: serde_json::Value,
    #[serde(default)]
    pub position: Position,
}
