use std::{sync::Arc, time::Duration};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::json;

use crate::{
    Result,
    graph::{
        edge::SourceHandle,
        node::{NodeId, NodeKind},
    },
    runtime::Context,
};

use super::{Executor, Outcome, validate_params};

/// Suspends the branch for a timer, then resumes along the default handle.
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct DelayExecutor {
    #[serde(rename = "durationS", default)]
    duration_s: f64,
}

#[async_trait]
impl Executor for DelayExecutor {
    fn create(params: serde_json::Value) -> Result<Self> {
        validate_params(&Self::schema(), &params)?;
        Ok(serde_json::from_value::<Self>(params)?)
    }

    fn schema() -> serde_json::Value {
        json!({
            "type": "object",
            "properties": {
                "durationS": { "type": "number", "minimum": 0 }
            }
        })
    }

    fn kind(&self) -> NodeKind {
        NodeKind::Delay
    }

    async fn run(
        &self,
        ctx: Arc<Context>,
        nid: NodeId,
    ) -> Result<Outcome> {
        let delay = Duration::from_secs_f64(self.duration_s.max(0.0));
        ctx.schedule_resume(&nid, SourceHandle::default(), delay);
        Ok(Outcome::Suspended)
    }
}
