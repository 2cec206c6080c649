use std::collections::HashMap;

use async_trait::async_trait;
use tracing::{debug, info};

use crate::flow::{FlowError, SharedContext};

/// Action label returned by a node's postprocess step; selects the next node.
pub type Action = String;

/// Label used when a node has a single outgoing path.
pub const DEFAULT_ACTION: &str = "default";

/// Object-safe unit of execution inside a [`Flow`].
///
/// Business code rarely implements this directly; [`super::StageNode`] and
/// [`super::BatchNode`] lift the richer [`super::Stage`] and
/// [`super::BatchStage`] contracts into nodes.
#[async_trait]
pub trait Node: Send + Sync {
    fn name(&self) -> &str;

    async fn run(&self, ctx: &mut SharedContext) -> Result<Action, FlowError>;
}

/// Builder for a [`Flow`]; validates the wiring at `build` time.
#[derive(Default)]
pub struct FlowBuilder {
    start: Option<String>,
    nodes: HashMap<String, Box<dyn Node>>,
    edges: HashMap<(String, Action), String>,
}

impl FlowBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a node and mark it as the entry point.
    pub fn start(mut self, node: impl Node + 'static) -> Self {
        self.start = Some(node.name().to_string());
        self.node(node)
    }

    /// Register a node.
    pub fn node(mut self, node: impl Node + 'static) -> Self {
        self.nodes.insert(node.name().to_string(), Box::new(node));
        self
    }

    /// Connect `from` to `to` along `action`.
    pub fn edge(mut self, from: &str, action: &str, to: &str) -> Self {
        self.edges
            .insert((from.to_string(), action.to_string()), to.to_string());
        self
    }

    /// Validate the graph: the start node must exist and every edge must
    /// connect two registered nodes. An action label with no outgoing edge is
    /// legal — it terminates the run.
    pub fn build(self) -> Result<Flow, FlowError> {
        let start = self
            .start
            .ok_or_else(|| FlowError::Config("no start node set".to_string()))?;

        if !self.nodes.contains_key(&start) {
            return Err(FlowError::Config(format!(
                "start node '{start}' is not registered"
            )));
        }

        for ((from, action), to) in &self.edges {
            if !self.nodes.contains_key(from) {
                return Err(FlowError::Config(format!(
                    "edge ({from}, {action}) starts at unregistered node '{from}'"
                )));
            }
            if !self.nodes.contains_key(to) {
                return Err(FlowError::Config(format!(
                    "edge ({from}, {action}) points at unregistered node '{to}'"
                )));
            }
        }

        Ok(Flow {
            start,
            nodes: self.nodes,
            edges: self.edges,
        })
    }
}

/// A directed graph of nodes connected by `(node, action label)` edges,
/// executed sequentially from a designated start node.
pub struct Flow {
    start: String,
    nodes: HashMap<String, Box<dyn Node>>,
    edges: HashMap<(String, Action), String>,
}

impl std::fmt::Debug for Flow {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Flow")
            .field("start", &self.start)
            .field("nodes", &self.nodes.keys().collect::<Vec<_>>())
            .field("edges", &self.edges)
            .finish()
    }
}

impl Flow {
    pub fn builder() -> FlowBuilder {
        FlowBuilder::new()
    }

    /// Execute the flow against `ctx`, one node at a time, following the
    /// edge matching each returned action label until no edge matches.
    ///
    /// The flow performs no recovery of its own: the first error a node
    /// surfaces (after its own retries and fallback) aborts the run.
    pub async fn run(&self, ctx: &mut SharedContext) -> Result<(), FlowError> {
        let mut current = self.start.as_str();

        loop {
            let node = self
                .nodes
                .get(current)
                .ok_or_else(|| FlowError::Config(format!("node '{current}' not found")))?;

            debug!("running node '{}'", current);
            let action = node.run(ctx).await?;

            match self.edges.get(&(current.to_string(), action.clone())) {
                Some(next) => {
                    debug!("'{}' --[{}]--> '{}'", current, action, next);
                    current = next;
                }
                None => {
                    info!("flow finished at '{}' (no edge for action '{}')", current, action);
                    return Ok(());
                }
            }
        }
    }
}
