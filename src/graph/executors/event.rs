use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::json;

use crate::{
    Result,
    graph::node::{NodeId, NodeKind},
    runtime::Context,
};

use super::{Executor, Outcome};

/// Entry-point node. Targeting and event matching live on the node's
/// [`EventSpec`](crate::graph::node::EventSpec) and are evaluated by the
/// dispatcher; the node itself fans out along every outgoing edge
/// regardless of handle.
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct EventExecutor;

#[async_trait]
impl Executor for EventExecutor {
    fn create(_: serde_json::Value) -> Result<Self> {
        Ok(EventExecutor)
    }

    fn schema() -> serde_json::Value {
        json!({})
    }

    fn kind(&self) -> NodeKind {
        NodeKind::Event
    }

    async fn run(
        &self,
        _: Arc<Context>,
        _: NodeId,
    ) -> Result<Outcome> {
        Ok(Outcome::AnyNext)
    }
}
