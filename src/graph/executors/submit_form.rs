use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::json;

use crate::{
    Result,
    common::Vars,
    events::TelemetryEvent,
    graph::{
        edge::{FixedHandle, SourceHandle},
        node::{NodeId, NodeKind},
    },
    runtime::Context,
};

use super::{Executor, Outcome, validate_params};

fn value_kind(value: &serde_json::Value) -> &'static str {
    match value {
        serde_json::Value::Null => "null",
        serde_json::Value::Bool(_) => "boolean",
        serde_json::Value::Number(_) => "number",
        serde_json::Value::String(_) => "string",
        serde_json::Value::Array(_) => "array",
        serde_json::Value::Object(_) => "object",
    }
}

/// Submits the collected variable map as a lead, then resumes along the
/// success or error edge depending on the outcome.
#[derive(Serialize, Deserialize, Debug, Clone, Default)]
pub struct SubmitFormExecutor {}

#[async_trait]
impl Executor for SubmitFormExecutor {
    fn create(params: serde_json::Value) -> Result<Self> {
        validate_params(&Self::schema(), &params)?;
        Ok(serde_json::from_value::<Self>(params)?)
    }

    fn schema() -> serde_json::Value {
        json!({ "type": "object" })
    }

    fn kind(&self) -> NodeKind {
        NodeKind::SubmitForm
    }

    async fn run(
        &self,
        ctx: Arc<Context>,
        nid: NodeId,
    ) -> Result<Outcome> {
        tokio::spawn(async move {
            let vars = ctx.variables();
            let fields: Vec<serde_json::Value> = vars
                .iter()
                .map(|(name, value)| json!({ "name": name, "type": value_kind(value) }))
                .collect();
            let result = ctx.effects().submit_lead(vars).await;
            let handle = match &result {
                Ok(true) => FixedHandle::Success,
                Ok(false) => FixedHandle::Error,
                Err(e) => {
                    tracing::warn!(node = %nid, error = %e, "lead submission failed");
                    FixedHandle::Error
                }
            };
            let detail = Vars::new()
                .with("result", handle.as_ref())
                .with("fields", &fields);
            ctx.effects().log_event("submit_form", detail.clone());
            ctx.emit_event(&nid, TelemetryEvent::BranchTaken {
                handle: handle.as_ref().to_string(),
                detail,
            });
            let trigger = ctx.trigger_item().cloned();
            ctx.send_resume(&nid, SourceHandle::Fixed(handle), trigger);
        });
        Ok(Outcome::Suspended)
    }
}
