use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::json;

use crate::{
    Result,
    common::Vars,
    events::TelemetryEvent,
    graph::{
        node::{NodeId, NodeKind},
        validate::validate_input_item,
    },
    model::ItemId,
    runtime::Context,
};

use super::{Executor, Outcome, validate_params};

/// Terminal node: optionally validates the page's text inputs, then
/// requests a transition to the target page.
#[derive(Serialize, Deserialize, Debug, Clone)]
#[serde(rename_all = "camelCase")]
pub struct PageExecutor {
    #[serde(default)]
    target_page_id: Option<String>,
    #[serde(default)]
    enable_validation: bool,
}

#[async_trait]
impl Executor for PageExecutor {
    fn create(params: serde_json::Value) -> Result<Self> {
        validate_params(&Self::schema(), &params)?;
        Ok(serde_json::from_value::<Self>(params)?)
    }

    fn schema() -> serde_json::Value {
        json!({
            "type": "object",
            "properties": {
                "targetPageId": { "type": "string" },
                "enableValidation": { "type": "boolean" }
            }
        })
    }

    fn kind(&self) -> NodeKind {
        NodeKind::Page
    }

    async fn run(
        &self,
        ctx: Arc<Context>,
        nid: NodeId,
    ) -> Result<Outcome> {
        if self.enable_validation {
            let items = ctx.items();
            let vars = ctx.variables();
            let mut failed: Vec<ItemId> = Vec::new();
            ctx.update_preview_state(|state| {
                failed.clear();
                for item in items.iter().filter(|i| i.is_text_input()) {
                    let error = validate_input_item(item, &vars);
                    if error.is_some() {
                        failed.push(item.id.clone());
                    }
                    if let Some(item_state) = state.items.get_mut(&item.id) {
                        // a passing item clears any stale error
                        item_state.error = error.clone();
                    }
                }
            });
            if !failed.is_empty() {
                ctx.effects().log_event(
                    "validation_failed",
                    Vars::new().with("itemIds", &failed),
                );
                ctx.emit_event(&nid, TelemetryEvent::ValidationFailed {
                    item_ids: failed,
                });
                return Ok(Outcome::Halt);
            }
        }

        if let Some(page_id) = &self.target_page_id {
            ctx.request_page_change(page_id);
            ctx.effects().log_event("page_change", Vars::new().with("pageId", page_id));
            ctx.emit_event(&nid, TelemetryEvent::PageChangeRequested {
                page_id: page_id.clone(),
            });
        }
        // page nodes have no outgoing edges
        Ok(Outcome::Halt)
    }
}
