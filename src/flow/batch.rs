use anyhow::Result;
use async_trait::async_trait;
use tracing::debug;

use crate::flow::graph::{Action, Node};
use crate::flow::retry::{run_with_retry, RetryPolicy};
use crate::flow::{FlowError, SharedContext};

/// A stage that fans the execute/fallback procedure of [`super::Stage`] out
/// over a sequence of items.
///
/// Each item runs the retry-then-fallback procedure independently: one item
/// exhausting its retries triggers only that item's fallback and never skips
/// the remaining items. Outputs are collected in item order — `outputs[i]`
/// always corresponds to `items[i]` — and handed to `postprocess` in a single
/// call, which is the only place the context is touched.
#[async_trait]
pub trait BatchStage: Send + Sync {
    type Item: Send + Sync;
    type ItemOutput: Send;

    fn name(&self) -> &'static str;

    fn retry(&self) -> RetryPolicy {
        RetryPolicy::none()
    }

    /// Read from the context and produce the ordered item sequence; must not
    /// mutate the context.
    fn prepare(&self, ctx: &SharedContext) -> Result<Vec<Self::Item>>;

    async fn execute_item(&self, item: &Self::Item) -> Result<Self::ItemOutput>;

    async fn fallback_item(
        &self,
        _item: &Self::Item,
        error: anyhow::Error,
    ) -> Result<Self::ItemOutput> {
        Err(error)
    }

    /// Aggregate the per-item outputs and mutate the context.
    fn postprocess(
        &self,
        ctx: &mut SharedContext,
        items: Vec<Self::Item>,
        outputs: Vec<Self::ItemOutput>,
    ) -> Result<Action>;
}

/// Lifts a [`BatchStage`] into a flow [`Node`].
pub struct BatchNode<B: BatchStage>(B);

impl<B: BatchStage> BatchNode<B> {
    pub fn new(stage: B) -> Self {
        Self(stage)
    }
}

#[async_trait]
impl<B: BatchStage> Node for BatchNode<B> {
    fn name(&self) -> &str {
        self.0.name()
    }

    async fn run(&self, ctx: &mut SharedContext) -> Result<Action, FlowError> {
        let name = self.0.name();
        let items = self
            .0
            .prepare(ctx)
            .map_err(|e| FlowError::stage(name, e))?;

        let policy = self.0.retry();
        let mut outputs = Vec::with_capacity(items.len());

        for (index, item) in items.iter().enumerate() {
            let output = match run_with_retry(name, &policy, || self.0.execute_item(item)).await {
                Ok(output) => output,
                Err(error) => {
                    debug!("{}: item {} exhausted retries, invoking fallback", name, index);
                    self.0
                        .fallback_item(item, error)
                        .await
                        .map_err(|e| FlowError::exhausted(name, policy.max_attempts(), e))?
                }
            };
            outputs.push(output);
        }

        self.0
            .postprocess(ctx, items, outputs)
            .map_err(|e| FlowError::stage(name, e))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{PersonalizationFactor, RunInput};
    use std::time::Duration;

    fn test_context() -> SharedContext {
        SharedContext::new(RunInput {
            first_name: "Ada".to_string(),
            last_name: "Lovelace".to_string(),
            keywords: "computing".to_string(),
            personalization_factors: vec![PersonalizationFactor {
                name: "alumni_tie".to_string(),
                description: "Check for a shared school".to_string(),
                action: "mention shared school".to_string(),
            }],
            style: "Concise and casual, 30 words or less.".to_string(),
        })
        .unwrap()
    }

    /// Doubles even items; odd items fail and fall back to zero.
    struct DoublerBatch;

    #[async_trait]
    impl BatchStage for DoublerBatch {
        type Item = u32;
        type ItemOutput = u32;

        fn name(&self) -> &'static str {
            "doubler"
        }

        fn retry(&self) -> RetryPolicy {
            RetryPolicy::new(1, Duration::ZERO)
        }

        fn prepare(&self, _ctx: &SharedContext) -> Result<Vec<u32>> {
            Ok(vec![1, 2, 3, 4, 5])
        }

        async fn execute_item(&self, item: &u32) -> Result<u32> {
            if item % 2 == 1 {
                anyhow::bail!("odd item {item}")
            }
            Ok(item * 2)
        }

        async fn fallback_item(&self, _item: &u32, _error: anyhow::Error) -> Result<u32> {
            Ok(0)
        }

        fn postprocess(
            &self,
            _ctx: &mut SharedContext,
            items: Vec<u32>,
            outputs: Vec<u32>,
        ) -> Result<Action> {
            assert_eq!(items.len(), outputs.len());
            assert_eq!(outputs, vec![0, 4, 0, 8, 0]);
            Ok("default".to_string())
        }
    }

    #[tokio::test]
    async fn test_failed_items_fall_back_without_skipping_rest() {
        let node = BatchNode::new(DoublerBatch);
        let mut ctx = test_context();
        let action = node.run(&mut ctx).await.unwrap();
        assert_eq!(action, "default");
    }

    /// No fallback: the first failing item surfaces as an exhausted error.
    struct StrictBatch;

    #[async_trait]
    impl BatchStage for StrictBatch {
        type Item = u32;
        type ItemOutput = u32;

        fn name(&self) -> &'static str {
            "strict"
        }

        fn prepare(&self, _ctx: &SharedContext) -> Result<Vec<u32>> {
            Ok(vec![2, 3])
        }

        async fn execute_item(&self, item: &u32) -> Result<u32> {
            if *item == 3 {
                anyhow::bail!("bad item")
            }
            Ok(*item)
        }

        fn postprocess(
            &self,
            _ctx: &mut SharedContext,
            _items: Vec<u32>,
            _outputs: Vec<u32>,
        ) -> Result<Action> {
            Ok("default".to_string())
        }
    }

    #[tokio::test]
    async fn test_item_without_fallback_aborts() {
        let node = BatchNode::new(StrictBatch);
        let mut ctx = test_context();
        let err = node.run(&mut ctx).await.unwrap_err();
        assert!(matches!(err, FlowError::Exhausted { .. }));
    }

    /// Empty batches are legal and still reach postprocess.
    struct EmptyBatch;

    #[async_trait]
    impl BatchStage for EmptyBatch {
        type Item = u32;
        type ItemOutput = u32;

        fn name(&self) -> &'static str {
            "empty"
        }

        fn prepare(&self, _ctx: &SharedContext) -> Result<Vec<u32>> {
            Ok(vec![])
        }

        async fn execute_item(&self, _item: &u32) -> Result<u32> {
            unreachable!("no items to execute")
        }

        fn postprocess(
            &self,
            _ctx: &mut SharedContext,
            items: Vec<u32>,
            outputs: Vec<u32>,
        ) -> Result<Action> {
            assert!(items.is_empty());
            assert!(outputs.is_empty());
            Ok("default".to_string())
        }
    }

    #[tokio::test]
    async fn test_empty_batch_still_postprocesses() {
        let node = BatchNode::new(EmptyBatch);
        let mut ctx = test_context();
        assert_eq!(node.run(&mut ctx).await.unwrap(), "default");
    }
}
