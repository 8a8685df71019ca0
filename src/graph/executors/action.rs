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

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, strum::AsRefStr)]
#[serde(rename_all = "camelCase")]
#[strum(serialize_all = "camelCase")]
pub enum ActionMode {
    Show,
    Hide,
    Toggle,
}

/// Shows, hides, or toggles a target item's visibility.
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct ActionExecutor {
    #[serde(rename = "targetItemId")]
    target_item_id: TargetRef,
    mode: ActionMode,
}

#[async_trait]
impl Executor for ActionExecutor {
    fn create(params: serde_json::Value) -> Result<Self> {
        validate_params(&Self::schema(), &params)?;
        Ok(serde_json::from_value::<Self>(params)?)
    }

    fn schema() -> serde_json::Value {
        json!({
            "type": "object",
            "required": ["targetItemId", "mode"],
            "properties": {
                "targetItemId": { "type": "string" },
                "mode": { "type": "string", "enum": ["show", "hide", "toggle"] }
            }
        })
    }

    fn kind(&self) -> NodeKind {
        NodeKind::Action
    }

    async fn run(
        &self,
        ctx: Arc<Context>,
        _nid: NodeId,
    ) -> Result<Outcome> {
        // An unresolvable or unknown target is a non-fatal no-op; the
        // branch still continues.
        if let Some(target) = ctx.resolve_target(&self.target_item_id) {
            ctx.update_item_state(&target, |state| {
                state.is_visible = match self.mode {
                    ActionMode::Show => true,
                    ActionMode::Hide => false,
                    ActionMode::Toggle => !state.is_visible,
                };
            });
        }
        Ok(Outcome::proceed())
    }
}
