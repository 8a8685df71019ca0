use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::json;

use crate::{
    Result,
    common::Vars,
    events::TelemetryEvent,
    graph::{
        edge::FixedHandle,
        node::{NodeId, NodeKind},
    },
    runtime::Context,
};

use super::{Executor, Outcome, validate_params};

fn default_ratio() -> f64 {
    50.0
}

/// Random split: routes `pathA` with probability `ratioA` percent,
/// otherwise `pathB`.
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct AbTestExecutor {
    #[serde(rename = "ratioA", default = "default_ratio")]
    ratio_a: f64,
}

/// Pick the branch for one draw in `[0, 100)`.
fn choose(
    ratio_a: f64,
    draw: f64,
) -> FixedHandle {
    if draw < ratio_a {
        FixedHandle::PathA
    } else {
        FixedHandle::PathB
    }
}

#[async_trait]
impl Executor for AbTestExecutor {
    fn create(params: serde_json::Value) -> Result<Self> {
        validate_params(&Self::schema(), &params)?;
        Ok(serde_json::from_value::<Self>(params)?)
    }

    fn schema() -> serde_json::Value {
        json!({
            "type": "object",
            "properties": {
                "ratioA": { "type": "number", "minimum": 0, "maximum": 100 }
            }
        })
    }

    fn kind(&self) -> NodeKind {
        NodeKind::AbTest
    }

    async fn run(
        &self,
        ctx: Arc<Context>,
        nid: NodeId,
    ) -> Result<Outcome> {
        let draw = rand::random::<f64>() * 100.0;
        let handle = choose(self.ratio_a, draw);
        let detail = Vars::new()
            .with("probability", self.ratio_a)
            .with("draw", draw)
            .with("path", handle.as_ref());
        ctx.effects().log_event("ab_test_branch", detail.clone());
        ctx.emit_event(&nid, TelemetryEvent::BranchTaken {
            handle: handle.as_ref().to_string(),
            detail,
        });
        Ok(Outcome::branch(handle))
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_ratio_hundred_always_takes_path_a() {
        for i in 0..1000 {
            let draw = i as f64 / 10.0;
            assert_eq!(choose(100.0, draw), FixedHandle::PathA);
        }
    }

    #[test]
    fn test_ratio_zero_always_takes_path_b() {
        for i in 0..1000 {
            let draw = i as f64 / 10.0;
            assert_eq!(choose(0.0, draw), FixedHandle::PathB);
        }
    }

    #[test]
    fn test_boundary_draw_takes_path_b() {
        assert_eq!(choose(30.0, 30.0), FixedHandle::PathB);
        assert_eq!(choose(30.0, 29.999), FixedHandle::PathA);
    }
}
