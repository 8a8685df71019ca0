use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::json;

use crate::{
    Result,
    graph::node::{NodeId, NodeKind, TargetRef},
    runtime::Context,
};

use super::{Executor, Outcome, validate_params};

/// Parks the branch until the target item receives a click. The resumed
/// chain is re-bound to the clicked item as its trigger.
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct WaitForClickExecutor {
    #[serde(rename = "targetItemId")]
    target_item_id: TargetRef,
}

#[async_trait]
impl Executor for WaitForClickExecutor {
    fn create(params: serde_json::Value) -> Result<Self> {
        validate_params(&Self::schema(), &params)?;
        Ok(serde_json::from_value::<Self>(params)?)
    }

    fn schema() -> serde_json::Value {
        json!({
            "type": "object",
            "required": ["targetItemId"],
            "properties": {
                "targetItemId": { "type": "string" }
            }
        })
    }

    fn kind(&self) -> NodeKind {
        NodeKind::WaitForClick
    }

    async fn run(
        &self,
        ctx: Arc<Context>,
        nid: NodeId,
    ) -> Result<Outcome> {
        match ctx.resolve_target(&self.target_item_id) {
            Some(item_id) => {
                ctx.register_click_wait(item_id, &nid);
                Ok(Outcome::Suspended)
            }
            None => {
                tracing::warn!(node = %nid, "wait-for-click target cannot be resolved, halting branch");
                Ok(Outcome::Halt)
            }
        }
    }
}
