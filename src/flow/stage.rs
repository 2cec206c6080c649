use anyhow::Result;
use async_trait::async_trait;
use tracing::debug;

use crate::flow::graph::{Action, Node};
use crate::flow::retry::{run_with_retry, RetryPolicy};
use crate::flow::{FlowError, SharedContext};

/// A single unit of work in a flow.
///
/// Lifecycle per run: `prepare` reads the context and produces an immutable
/// input; `execute` is a pure function of that input, invoked up to
/// `retry().max_attempts()` times; when every attempt fails, `fallback` runs
/// exactly once with the last error; `postprocess` receives the original
/// input and the execute (or fallback) result, mutates the context, and
/// returns the action label selecting the next node.
///
/// The default `fallback` re-raises, which makes exhausted retries fatal to
/// the run.
#[async_trait]
pub trait Stage: Send + Sync {
    type Input: Send + Sync;
    type Output: Send;

    fn name(&self) -> &'static str;

    fn retry(&self) -> RetryPolicy {
        RetryPolicy::none()
    }

    /// Read from the context; must not mutate it.
    fn prepare(&self, ctx: &SharedContext) -> Result<Self::Input>;

    async fn execute(&self, input: &Self::Input) -> Result<Self::Output>;

    async fn fallback(&self, _input: &Self::Input, error: anyhow::Error) -> Result<Self::Output> {
        Err(error)
    }

    /// Mutate the context with the result and pick the outgoing action label.
    fn postprocess(
        &self,
        ctx: &mut SharedContext,
        input: Self::Input,
        output: Self::Output,
    ) -> Result<Action>;
}

/// Lifts a [`Stage`] into a flow [`Node`], supplying the retry-then-fallback
/// execution semantics.
pub struct StageNode<S: Stage>(S);

impl<S: Stage> StageNode<S> {
    pub fn new(stage: S) -> Self {
        Self(stage)
    }
}

#[async_trait]
impl<S: Stage> Node for StageNode<S> {
    fn name(&self) -> &str {
        self.0.name()
    }

    async fn run(&self, ctx: &mut SharedContext) -> Result<Action, FlowError> {
        let name = self.0.name();
        let input = self
            .0
            .prepare(ctx)
            .map_err(|e| FlowError::stage(name, e))?;

        let policy = self.0.retry();
        let output = match run_with_retry(name, &policy, || self.0.execute(&input)).await {
            Ok(output) => output,
            Err(error) => {
                debug!("{}: retries exhausted, invoking fallback", name);
                self.0
                    .fallback(&input, error)
                    .await
                    .map_err(|e| FlowError::exhausted(name, policy.max_attempts(), e))?
            }
        };

        self.0
            .postprocess(ctx, input, output)
            .map_err(|e| FlowError::stage(name, e))
    }
}
