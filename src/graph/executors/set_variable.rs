use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};

use crate::{
    Result,
    common::coerce_number,
    graph::node::{NodeId, NodeKind},
    runtime::Context,
};

use super::{Executor, Outcome, validate_params};

#[derive(Serialize, Deserialize, Debug, Clone, Copy, Default, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub enum VariableOperation {
    #[default]
    Set,
    Add,
}

/// Writes a named variable, either replacing it or adding to it numerically.
#[derive(Serialize, Deserialize, Debug, Clone)]
#[serde(rename_all = "camelCase")]
pub struct SetVariableExecutor {
    variable_name: String,
    #[serde(default)]
    operation: VariableOperation,
    #[serde(default)]
    value: Value,
}

#[async_trait]
impl Executor for SetVariableExecutor {
    fn create(params: serde_json::Value) -> Result<Self> {
        validate_params(&Self::schema(), &params)?;
        Ok(serde_json::from_value::<Self>(params)?)
    }

    fn schema() -> serde_json::Value {
        json!({
            "type": "object",
            "required": ["variableName"],
            "properties": {
                "variableName": { "type": "string" },
                "operation": { "type": "string", "enum": ["set", "add"] },
                "value": {}
            }
        })
    }

    fn kind(&self) -> NodeKind {
        NodeKind::SetVariable
    }

    async fn run(
        &self,
        ctx: Arc<Context>,
        _nid: NodeId,
    ) -> Result<Outcome> {
        match self.operation {
            VariableOperation::Set => {
                ctx.set_variable(&self.variable_name, self.value.clone());
            }
            VariableOperation::Add => {
                let current = ctx.variables().number(&self.variable_name);
                let sum = current + coerce_number(&self.value);
                ctx.set_variable(&self.variable_name, Value::from(sum));
            }
        }
        Ok(Outcome::proceed())
    }
}
