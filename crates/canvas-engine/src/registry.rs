//! Executor registry and dispatch
//!
//! The registry holds exactly one executor per runnable node type. The
//! invariant is checked eagerly by [`NodeRegistry::validate`] when the
//! engine is assembled, so dispatch never has to fall back or guess.
//!
//! # Usage
//!
//! ```ignore
//! use canvas_engine::NodeRegistry;
//!
//! let mut registry = NodeRegistry::new();
//! registry.register(Arc::new(InstructionExecutor::new(services.clone())));
//! registry.register(Arc::new(ImageExecutor::new(services.clone())));
//! // ...one per runnable type
//! registry.validate()?;
//! ```

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::context::ExecutionContext;
use crate::error::{CanvasEngineError, Result};
use crate::types::{EdgeId, NodeId, NodeType};

/// What a successful executor run changed
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum ExecutionOutcome {
    /// A new node and its connecting edge were appended
    #[serde(rename_all = "camelCase")]
    Synthesized {
        node_id: NodeId,
        edge_id: EdgeId,
        node_type: NodeType,
    },
    /// The run wrote its result onto the node itself
    #[serde(rename_all = "camelCase")]
    Updated { node_id: NodeId },
    /// Output lives with a collaborator; the graph is unchanged
    #[serde(rename_all = "camelCase")]
    Generated { node_id: NodeId, output: String },
}

/// Per-node-type executor
///
/// `run` is called with a freshly built context. It must commit at most once
/// and leave the graph untouched when it returns an error.
#[async_trait]
pub trait NodeExecutor: Send + Sync {
    /// The node type this executor is registered for
    fn handles(&self) -> NodeType;

    /// Whether this executor accepts the node in `ctx`
    fn can_handle(&self, ctx: &ExecutionContext) -> bool {
        ctx.current_node().node_type() == self.handles()
    }

    /// Execute the node
    async fn run(&self, ctx: &ExecutionContext) -> Result<ExecutionOutcome>;
}

/// Registry of executors keyed by the node type they handle
pub struct NodeRegistry {
    executors: Vec<Arc<dyn NodeExecutor>>,
}

impl NodeRegistry {
    /// Create a new empty registry
    pub fn new() -> Self {
        Self {
            executors: Vec::new(),
        }
    }

    /// Register an executor.
    ///
    /// Registering two executors for the same type is not rejected here;
    /// [`validate`](Self::validate) reports it.
    pub fn register(&mut self, executor: Arc<dyn NodeExecutor>) {
        self.executors.push(executor);
    }

    /// Check that every runnable type has exactly one executor and that
    /// nothing is registered for comments
    pub fn validate(&self) -> Result<()> {
        let mut counts: HashMap<NodeType, usize> = HashMap::new();
        for executor in &self.executors {
            *counts.entry(executor.handles()).or_default() += 1;
        }

        for node_type in NodeType::RUNNABLE {
            match counts.get(&node_type).copied().unwrap_or(0) {
                1 => {}
                0 => {
                    return Err(CanvasEngineError::configuration(format!(
                        "no executor registered for '{}'",
                        node_type
                    )))
                }
                n => {
                    return Err(CanvasEngineError::configuration(format!(
                        "{} executors registered for '{}'",
                        n, node_type
                    )))
                }
            }
        }
        if counts.contains_key(&NodeType::Comment) {
            return Err(CanvasEngineError::configuration(
                "comment nodes must not have an executor",
            ));
        }
        Ok(())
    }

    /// Find the unique executor accepting `ctx`
    pub fn select(&self, ctx: &ExecutionContext) -> Result<Arc<dyn NodeExecutor>> {
        let mut matching = self.executors.iter().filter(|e| e.can_handle(ctx));
        let node = ctx.current_node();
        match (matching.next(), matching.next()) {
            (Some(executor), None) => Ok(executor.clone()),
            (None, _) => Err(CanvasEngineError::configuration(format!(
                "no executor accepts {} node '{}'",
                node.node_type(),
                node.id
            ))),
            (Some(_), Some(_)) => Err(CanvasEngineError::configuration(format!(
                "several executors accept {} node '{}'",
                node.node_type(),
                node.id
            ))),
        }
    }

    /// Types with a registered executor
    pub fn node_types(&self) -> Vec<NodeType> {
        self.executors.iter().map(|e| e.handles()).collect()
    }

    pub fn len(&self) -> usize {
        self.executors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.executors.is_empty()
    }
}

impl Default for NodeRegistry {
    fn default() -> Self {
        Self::new()
    }
}
