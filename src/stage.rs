use crate::{client::TextGenerator, error::Result, state::WorkflowState};
use async_trait::async_trait;

/// A named unit of work in a workflow.
///
/// A stage reads fields written by earlier stages (or present in the
/// initial state), usually performs one text-generation call, and writes
/// derived fields back. The generator is injected by the runner so that
/// handlers never construct their own client.
#[async_trait]
pub trait StageHandler: Send + Sync {
    async fn run(&self, llm: &dyn TextGenerator, state: &mut WorkflowState) -> Result<()>;
}

/// Adapter for synchronous stages that only transform state — cursor
/// advances, post-processing, tone filters.
pub struct FnStage<F>(F);

impl<F> FnStage<F>
where
    F: Fn(&mut WorkflowState) -> Result<()> + Send + Sync,
{
    pub fn new(f: F) -> Self {
        Self(f)
    }
}

#[async_trait]
impl<F> StageHandler for FnStage<F>
where
    F: Fn(&mut WorkflowState) -> Result<()> + Send + Sync,
{
    async fn run(&self, _llm: &dyn TextGenerator, state: &mut WorkflowState) -> Result<()> {
        (self.0)(state)
    }
}
