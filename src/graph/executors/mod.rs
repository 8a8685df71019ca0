//! Node executors: one per node kind, each implementing a single-node step.
//!
//! An executor reads inputs from the shared runtime state, produces a state
//! mutation and/or a branch decision, and may signal asynchronous
//! suspension. A suspended executor alone owns re-entering the dispatcher
//! via the command queue once its async operation completes.

pub mod ab_test;
pub mod action;
pub mod animate;
pub mod condition;
pub mod confirmation;
pub mod delay;
pub mod event;
pub mod external_api;
pub mod page;
pub mod set_variable;
pub mod submit_form;
pub mod wait_for_click;

use std::sync::Arc;

use async_trait::async_trait;

use crate::{
    Result,
    graph::{
        edge::{FixedHandle, SourceHandle},
        node::{NodeId, NodeKind},
    },
    runtime::Context,
};

pub use ab_test::AbTestExecutor;
pub use action::ActionExecutor;
pub use animate::AnimateExecutor;
pub use condition::IfExecutor;
pub use confirmation::ConfirmationExecutor;
pub use delay::DelayExecutor;
pub use event::EventExecutor;
pub use external_api::ExternalApiExecutor;
pub use page::PageExecutor;
pub use set_variable::SetVariableExecutor;
pub use submit_form::SubmitFormExecutor;
pub use wait_for_click::WaitForClickExecutor;

/// How traversal proceeds after one node step.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// Follow edges whose handle matches.
    Next(SourceHandle),
    /// Follow every outgoing edge regardless of handle.
    AnyNext,
    /// Stop this branch here (terminal side effect or validation block).
    Halt,
    /// This branch is parked; the executor re-enters the dispatcher itself
    /// once its timer, listener, or I/O completes.
    Suspended,
}

impl Outcome {
    /// Follow the default sequential edge.
    pub fn proceed() -> Self {
        Outcome::Next(SourceHandle::default())
    }

    /// Follow a fixed branch handle.
    pub fn branch(handle: FixedHandle) -> Self {
        Outcome::Next(SourceHandle::Fixed(handle))
    }
}

#[async_trait]
pub trait Executor: Send + Sync {
    /// Creates a new instance of the executor from a node's `data` payload,
    /// validating it against [`Executor::schema`].
    fn create(params: serde_json::Value) -> Result<Self>
    where
        Self: Sized;

    /// JSON schema of the node kind's `data` payload.
    fn schema() -> serde_json::Value
    where
        Self: Sized;

    /// The node kind this executor handles.
    fn kind(&self) -> NodeKind;

    /// Executes the single-node step.
    async fn run(
        &self,
        ctx: Arc<Context>,
        nid: NodeId,
    ) -> Result<Outcome>;
}

/// Build the executor for a node kind. The match is exhaustive; adding a
/// kind without an executor is a compile error.
pub fn create(
    kind: NodeKind,
    params: serde_json::Value,
) -> Result<Box<dyn Executor>> {
    let params = if params.is_null() {
        serde_json::json!({})
    } else {
        params
    };
    match kind {
        NodeKind::Event => Ok(Box::new(EventExecutor::create(params)?)),
        NodeKind::Action => Ok(Box::new(ActionExecutor::create(params)?)),
        NodeKind::If => Ok(Box::new(IfExecutor::create(params)?)),
        NodeKind::Page => Ok(Box::new(PageExecutor::create(params)?)),
        NodeKind::SetVariable => Ok(Box::new(SetVariableExecutor::create(params)?)),
        NodeKind::Delay => Ok(Box::new(DelayExecutor::create(params)?)),
        NodeKind::Animate => Ok(Box::new(AnimateExecutor::create(params)?)),
        NodeKind::WaitForClick => Ok(Box::new(WaitForClickExecutor::create(params)?)),
        NodeKind::AbTest => Ok(Box::new(AbTestExecutor::create(params)?)),
        NodeKind::Confirmation => Ok(Box::new(ConfirmationExecutor::create(params)?)),
        NodeKind::SubmitForm => Ok(Box::new(SubmitFormExecutor::create(params)?)),
        NodeKind::ExternalApi => Ok(Box::new(ExternalApiExecutor::create(params)?)),
    }
}

/// Shared schema-check step for executor constructors.
pub(crate) fn validate_params(
    schema: &serde_json::Value,
    params: &serde_json::Value,
) -> Result<()> {
    jsonschema::validate(schema, params).map_err(crate::PageflowError::from)
}
