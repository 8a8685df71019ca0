use std::{sync::Arc, time::Duration};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::json;

use crate::{
    Result,
    graph::{
        edge::SourceHandle,
        node::{NodeId, NodeKind, TargetRef},
    },
    runtime::{Context, ItemState},
};

use super::{Executor, Outcome, validate_params};

/// One renderer frame; long enough for an observer to commit the snap
/// position before the transition starts.
const FRAME_TICK: Duration = Duration::from_millis(16);

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub enum AnimateProperty {
    Opacity,
    X,
    Y,
    Scale,
    Rotation,
}

impl AnimateProperty {
    fn get(
        &self,
        state: &ItemState,
    ) -> f64 {
        match self {
            AnimateProperty::Opacity => state.opacity,
            AnimateProperty::X => state.x,
            AnimateProperty::Y => state.y,
            AnimateProperty::Scale => state.scale,
            AnimateProperty::Rotation => state.rotation,
        }
    }

    fn set(
        &self,
        state: &mut ItemState,
        value: f64,
    ) {
        match self {
            AnimateProperty::Opacity => state.opacity = value,
            AnimateProperty::X => state.x = value,
            AnimateProperty::Y => state.y = value,
            AnimateProperty::Scale => state.scale = value,
            AnimateProperty::Rotation => state.rotation = value,
        }
    }

    /// Name of the CSS property an observing renderer should transition.
    fn css_name(&self) -> &'static str {
        match self {
            AnimateProperty::Opacity => "opacity",
            _ => "transform",
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, Default, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub enum AnimateMode {
    #[default]
    Absolute,
    Relative,
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, Default, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub enum RelativeOperation {
    #[default]
    Add,
    Subtract,
    Multiply,
}

impl RelativeOperation {
    fn apply(
        &self,
        start: f64,
        value: f64,
    ) -> f64 {
        match self {
            RelativeOperation::Add => start + value,
            RelativeOperation::Subtract => start - value,
            RelativeOperation::Multiply => start * value,
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, Default, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub enum LoopMode {
    #[default]
    None,
    Count,
}

fn default_duration() -> f64 {
    0.3
}

fn default_easing() -> String {
    "ease".to_string()
}

fn default_loop_count() -> u32 {
    1
}

/// Animates one numeric property of a target item, suspending the branch
/// until the transition (all iterations of it) has had time to finish.
///
/// The executor writes target values plus a CSS-transition descriptor; an
/// observing renderer performs the actual tweening. Each iteration snaps
/// back to its start value with `transition: none` first so looping moves
/// restart from the same place.
#[derive(Serialize, Deserialize, Debug, Clone)]
#[serde(rename_all = "camelCase")]
pub struct AnimateExecutor {
    target_item_id: TargetRef,
    property: AnimateProperty,
    #[serde(default)]
    mode: AnimateMode,
    #[serde(default)]
    value: f64,
    #[serde(default)]
    relative_operation: RelativeOperation,
    #[serde(rename = "durationS", default = "default_duration")]
    duration_s: f64,
    #[serde(rename = "delayS", default)]
    delay_s: f64,
    #[serde(default = "default_easing")]
    easing: String,
    #[serde(default)]
    loop_mode: LoopMode,
    #[serde(default = "default_loop_count")]
    loop_count: u32,
}

#[async_trait]
impl Executor for AnimateExecutor {
    fn create(params: serde_json::Value) -> Result<Self> {
        validate_params(&Self::schema(), &params)?;
        Ok(serde_json::from_value::<Self>(params)?)
    }

    fn schema() -> serde_json::Value {
        json!({
            "type": "object",
            "required": ["targetItemId", "property"],
            "properties": {
                "targetItemId": { "type": "string" },
                "property": { "type": "string", "enum": ["opacity", "x", "y", "scale", "rotation"] },
                "mode": { "type": "string", "enum": ["absolute", "relative"] },
                "value": { "type": "number" },
                "relativeOperation": { "type": "string", "enum": ["add", "subtract", "multiply"] },
                "durationS": { "type": "number", "minimum": 0 },
                "delayS": { "type": "number", "minimum": 0 },
                "easing": { "type": "string" },
                "loopMode": { "type": "string", "enum": ["none", "count"] },
                "loopCount": { "type": "integer", "minimum": 1 }
            }
        })
    }

    fn kind(&self) -> NodeKind {
        NodeKind::Animate
    }

    async fn run(
        &self,
        ctx: Arc<Context>,
        nid: NodeId,
    ) -> Result<Outcome> {
        let Some(target) = ctx.resolve_target(&self.target_item_id) else {
            // unknown target animates nothing; the branch continues at once
            return Ok(Outcome::proceed());
        };
        let Some(initial_state) = ctx.item_state(&target) else {
            return Ok(Outcome::proceed());
        };

        let spec = self.clone();
        let initial = spec.property.get(&initial_state);
        let iterations = match spec.loop_mode {
            LoopMode::None => 1,
            LoopMode::Count => spec.loop_count.max(1),
        };
        let transition = format!(
            "{} {}s {} {}s",
            spec.property.css_name(),
            spec.duration_s,
            spec.easing,
            spec.delay_s
        );
        let iteration_time =
            Duration::from_secs_f64((spec.duration_s + spec.delay_s).max(0.0)) + ctx.animate_safety_margin();

        tokio::spawn(async move {
            for _ in 0..iterations {
                if ctx.is_stale() {
                    return;
                }
                let Some(current_state) = ctx.item_state(&target) else {
                    // page changed under us
                    return;
                };
                let start = match spec.mode {
                    AnimateMode::Absolute => initial,
                    AnimateMode::Relative => spec.property.get(&current_state),
                };
                ctx.update_item_state(&target, |state| {
                    spec.property.set(state, start);
                    state.transition = Some("none".to_string());
                });
                tokio::time::sleep(FRAME_TICK).await;
                if ctx.is_stale() {
                    return;
                }
                let target_value = match spec.mode {
                    AnimateMode::Absolute => spec.value,
                    AnimateMode::Relative => spec.relative_operation.apply(start, spec.value),
                };
                ctx.update_item_state(&target, |state| {
                    spec.property.set(state, target_value);
                    state.transition = Some(transition.clone());
                });
                tokio::time::sleep(iteration_time).await;
            }
            let trigger = ctx.trigger_item().cloned();
            ctx.send_resume(&nid, SourceHandle::default(), trigger);
        });
        Ok(Outcome::Suspended)
    }
}
