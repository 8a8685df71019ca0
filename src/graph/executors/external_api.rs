use std::{collections::HashMap, sync::Arc};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};

use crate::{
    Result,
    common::Vars,
    events::TelemetryEvent,
    graph::{
        edge::{FixedHandle, SourceHandle},
        node::{NodeId, NodeKind},
    },
    runtime::{Context, FetchOptions},
};

use super::{Executor, Outcome, validate_params};

fn default_method() -> String {
    "GET".to_string()
}

/// Calls an external HTTP endpoint, optionally stores the response in a
/// variable, then resumes along the success or error edge. Request and
/// response records land on the debug-log stream.
#[derive(Serialize, Deserialize, Debug, Clone)]
#[serde(rename_all = "camelCase")]
pub struct ExternalApiExecutor {
    #[serde(default)]
    url: Option<String>,
    #[serde(default = "default_method")]
    method: String,
    #[serde(default)]
    headers: HashMap<String, String>,
    #[serde(default)]
    variable_name: Option<String>,
}

#[async_trait]
impl Executor for ExternalApiExecutor {
    fn create(params: serde_json::Value) -> Result<Self> {
        validate_params(&Self::schema(), &params)?;
        Ok(serde_json::from_value::<Self>(params)?)
    }

    fn schema() -> serde_json::Value {
        json!({
            "type": "object",
            "properties": {
                "url": { "type": "string" },
                "method": { "type": "string" },
                "headers": { "type": "object", "additionalProperties": { "type": "string" } },
                "variableName": { "type": "string" }
            }
        })
    }

    fn kind(&self) -> NodeKind {
        NodeKind::ExternalApi
    }

    async fn run(
        &self,
        ctx: Arc<Context>,
        nid: NodeId,
    ) -> Result<Outcome> {
        let url = match self.url.as_deref() {
            Some(u) if !u.trim().is_empty() => u.to_string(),
            _ => {
                // a node with no URL fails synchronously along the error edge
                ctx.emit_log(
                    &nid,
                    Vars::new().with("phase", "error").with("message", "missing url"),
                );
                return Ok(Outcome::branch(FixedHandle::Error));
            }
        };

        let spec = self.clone();
        tokio::spawn(async move {
            let is_body_method =
                !spec.method.eq_ignore_ascii_case("GET") && !spec.method.eq_ignore_ascii_case("HEAD");
            let body: Option<Value> = if is_body_method {
                Some(ctx.variables().into())
            } else {
                None
            };
            ctx.emit_log(
                &nid,
                Vars::new()
                    .with("phase", "request")
                    .with("method", &spec.method)
                    .with("url", &url),
            );
            let options = FetchOptions {
                method: spec.method.clone(),
                headers: spec.headers.clone(),
                body,
            };
            let handle = match ctx.effects().fetch_api(&url, options).await {
                Ok(value) => {
                    if let Some(name) = &spec.variable_name {
                        if !ctx.is_stale() {
                            ctx.set_variable(name, value.clone());
                        }
                    }
                    ctx.emit_log(
                        &nid,
                        Vars::new().with("phase", "response").with("body", value),
                    );
                    FixedHandle::Success
                }
                Err(e) => {
                    ctx.emit_log(
                        &nid,
                        Vars::new().with("phase", "error").with("message", e.to_string()),
                    );
                    FixedHandle::Error
                }
            };
            let detail = Vars::new().with("url", &url).with("result", handle.as_ref());
            ctx.effects().log_event("external_api", detail.clone());
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
