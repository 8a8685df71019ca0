use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};

use crate::{
    Result,
    common::{coerce_number, coerce_string},
    graph::{
        edge::FixedHandle,
        node::{NodeId, NodeKind, TargetRef},
    },
    runtime::Context,
};

use super::{Executor, Outcome, validate_params};

#[derive(Serialize, Deserialize, Debug, Clone, Copy, Default, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub enum ConditionSource {
    /// test a target item's visibility
    Item,
    /// compare a named variable against a literal
    #[default]
    Variable,
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, Default, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub enum ConditionType {
    #[default]
    IsVisible,
    IsHidden,
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, Default, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub enum ComparisonType {
    #[default]
    String,
    Number,
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Comparison {
    #[default]
    #[serde(rename = "==")]
    Eq,
    #[serde(rename = "!=")]
    Ne,
    #[serde(rename = ">")]
    Gt,
    #[serde(rename = ">=")]
    Ge,
    #[serde(rename = "<")]
    Lt,
    #[serde(rename = "<=")]
    Le,
    #[serde(rename = "contains")]
    Contains,
    #[serde(rename = "not_contains")]
    NotContains,
}

/// Conditional branch on item visibility or a variable comparison.
#[derive(Serialize, Deserialize, Debug, Clone)]
#[serde(rename_all = "camelCase")]
pub struct IfExecutor {
    #[serde(default)]
    condition_source: ConditionSource,
    #[serde(default)]
    target_item_id: Option<TargetRef>,
    #[serde(default)]
    condition_type: ConditionType,
    #[serde(default)]
    variable_name: Option<String>,
    #[serde(default)]
    comparison_type: ComparisonType,
    #[serde(default)]
    comparison: Comparison,
    #[serde(default)]
    comparison_value: Value,
}

impl IfExecutor {
    fn evaluate(
        &self,
        ctx: &Context,
    ) -> bool {
        match self.condition_source {
            ConditionSource::Item => self.evaluate_item(ctx),
            ConditionSource::Variable => self.evaluate_variable(ctx),
        }
    }

    fn evaluate_item(
        &self,
        ctx: &Context,
    ) -> bool {
        let visible = self
            .target_item_id
            .as_ref()
            .and_then(|t| ctx.resolve_target(t))
            .and_then(|id| ctx.item_state(&id))
            .map(|state| state.is_visible);
        match (visible, self.condition_type) {
            (Some(v), ConditionType::IsVisible) => v,
            (Some(v), ConditionType::IsHidden) => !v,
            // missing item never satisfies the condition
            (None, _) => false,
        }
    }

    fn evaluate_variable(
        &self,
        ctx: &Context,
    ) -> bool {
        let vars = ctx.variables();
        let actual = self.variable_name.as_deref().and_then(|name| vars.get_value(name).cloned());
        self.compare(actual.as_ref())
    }

    fn compare(
        &self,
        actual: Option<&Value>,
    ) -> bool {
        match self.comparison_type {
            ComparisonType::Number => {
                let a = actual.map(coerce_number).unwrap_or(0.0);
                let b = coerce_number(&self.comparison_value);
                match self.comparison {
                    Comparison::Eq => a == b,
                    Comparison::Ne => a != b,
                    Comparison::Gt => a > b,
                    Comparison::Ge => a >= b,
                    Comparison::Lt => a < b,
                    Comparison::Le => a <= b,
                    // substring operators are undefined over numbers
                    Comparison::Contains | Comparison::NotContains => false,
                }
            }
            ComparisonType::String => {
                let a = actual.map(coerce_string).unwrap_or_default();
                let b = coerce_string(&self.comparison_value);
                match self.comparison {
                    Comparison::Eq => a == b,
                    Comparison::Ne => a != b,
                    Comparison::Contains => a.contains(&b),
                    Comparison::NotContains => !a.contains(&b),
                    // ordering operators are undefined over strings
                    _ => false,
                }
            }
        }
    }
}

#[async_trait]
impl Executor for IfExecutor {
    fn create(params: serde_json::Value) -> Result<Self> {
        validate_params(&Self::schema(), &params)?;
        Ok(serde_json::from_value::<Self>(params)?)
    }

    fn schema() -> serde_json::Value {
        json!({
            "type": "object",
            "properties": {
                "conditionSource": { "type": "string", "enum": ["item", "variable"] },
                "targetItemId": { "type": "string" },
                "conditionType": { "type": "string", "enum": ["isVisible", "isHidden"] },
                "variableName": { "type": "string" },
                "comparisonType": { "type": "string", "enum": ["number", "string"] },
                "comparison": { "type": "string", "enum": ["==", "!=", ">", ">=", "<", "<=", "contains", "not_contains"] },
                "comparisonValue": {}
            }
        })
    }

    fn kind(&self) -> NodeKind {
        NodeKind::If
    }

    async fn run(
        &self,
        ctx: Arc<Context>,
        _nid: NodeId,
    ) -> Result<Outcome> {
        if self.evaluate(&ctx) {
            Ok(Outcome::branch(FixedHandle::True))
        } else {
            Ok(Outcome::branch(FixedHandle::False))
        }
    }
}
