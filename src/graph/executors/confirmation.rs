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
    runtime::{ConfirmationModal, Context},
};

use super::{Executor, Outcome, validate_params};

/// Validates the configured inputs, then opens a confirmation modal and
/// suspends the branch until the user confirms or goes back.
#[derive(Serialize, Deserialize, Debug, Clone, Default)]
#[serde(rename_all = "camelCase")]
pub struct ConfirmationExecutor {
    /// Inputs to validate and echo in the modal; empty means every text
    /// input on the page.
    #[serde(default)]
    target_item_ids: Vec<ItemId>,
    #[serde(default)]
    header_text: String,
    #[serde(default)]
    notice_text: String,
    #[serde(default)]
    back_page_id: Option<String>,
    #[serde(default)]
    is_submit_confirmation: bool,
}

#[async_trait]
impl Executor for ConfirmationExecutor {
    fn create(params: serde_json::Value) -> Result<Self> {
        validate_params(&Self::schema(), &params)?;
        Ok(serde_json::from_value::<Self>(params)?)
    }

    fn schema() -> serde_json::Value {
        json!({
            "type": "object",
            "properties": {
                "targetItemIds": { "type": "array", "items": { "type": "string" } },
                "headerText": { "type": "string" },
                "noticeText": { "type": "string" },
                "backPageId": { "type": "string" },
                "isSubmitConfirmation": { "type": "boolean" }
            }
        })
    }

    fn kind(&self) -> NodeKind {
        NodeKind::Confirmation
    }

    async fn run(
        &self,
        ctx: Arc<Context>,
        nid: NodeId,
    ) -> Result<Outcome> {
        let items = ctx.items();
        let vars = ctx.variables();
        let targets: Vec<ItemId> = if self.target_item_ids.is_empty() {
            items.iter().filter(|i| i.is_text_input()).map(|i| i.id.clone()).collect()
        } else {
            self.target_item_ids.clone()
        };

        let mut failed: Vec<ItemId> = Vec::new();
        ctx.update_preview_state(|state| {
            failed.clear();
            for id in &targets {
                let Some(item) = items.iter().find(|i| &i.id == id) else {
                    continue;
                };
                let error = validate_input_item(item, &vars);
                if error.is_some() {
                    failed.push(id.clone());
                }
                if let Some(item_state) = state.items.get_mut(id) {
                    item_state.error = error.clone();
                }
            }
        });
        if !failed.is_empty() {
            ctx.effects().log_event("validation_failed", Vars::new().with("itemIds", &failed));
            ctx.emit_event(&nid, TelemetryEvent::ValidationFailed {
                item_ids: failed,
            });
            return Ok(Outcome::Halt);
        }

        let modal = ConfirmationModal {
            is_open: true,
            node_id: nid.clone(),
            variables: vars,
            header_text: self.header_text.clone(),
            notice_text: self.notice_text.clone(),
            target_item_ids: targets,
            back_page_id: self.back_page_id.clone(),
            is_submit_confirmation: self.is_submit_confirmation,
        };
        ctx.update_preview_state(|state| {
            state.confirmation = Some(modal.clone());
        });
        ctx.register_confirmation(&nid);
        ctx.effects().log_event("confirmation_opened", Vars::new().with("nodeId", &nid));
        ctx.emit_event(&nid, TelemetryEvent::ConfirmationOpened);
        Ok(Outcome::Suspended)
    }
}
