//! Execution context: what one run attempt of one node gets to see and touch
//!
//! A context is built immediately before an executor runs and dropped right
//! after. It carries the target node, its resolved source nodes, and bounded
//! accessors into the [`GraphStore`]: full-snapshot reads plus append and
//! replace commits. Executors never hold the store itself.

use std::collections::HashSet;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use crate::config::LimitsConfig;
use crate::error::{CanvasEngineError, Result};
use crate::history::CommitCause;
use crate::store::GraphStore;
use crate::synthesizer::{NodeSynthesizer, Synthesis};
use crate::types::{CanvasEdge, CanvasNode, GraphSnapshot, NodeType};

/// Cooperative stop signal shared between the store and a running executor
#[derive(Debug, Clone, Default)]
pub struct CancellationFlag(Arc<AtomicBool>);

impl CancellationFlag {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }

    /// Fail with `Cancelled` if a stop was requested
    pub fn checkpoint(&self) -> Result<()> {
        if self.is_cancelled() {
            Err(CanvasEngineError::Cancelled)
        } else {
            Ok(())
        }
    }
}

/// Resolve the source nodes of `target_id`.
///
/// One entry per edge ending at the target, in edge order. Edges whose
/// source no longer exists are skipped; a source reached by several edges
/// appears once, at its first position.
pub fn resolve_source_nodes(snapshot: &GraphSnapshot, target_id: &str) -> Vec<CanvasNode> {
    let mut seen = HashSet::new();
    snapshot
        .incoming_edges(target_id)
        .filter_map(|edge| snapshot.find_node(&edge.source))
        .filter(|node| seen.insert(node.id.clone()))
        .cloned()
        .collect()
}

/// Per-attempt bundle handed to a node executor
pub struct ExecutionContext {
    execution_id: String,
    current_node: CanvasNode,
    source_nodes: Vec<CanvasNode>,
    store: Arc<GraphStore>,
    synthesizer: Arc<NodeSynthesizer>,
    cancel: CancellationFlag,
}

impl ExecutionContext {
    /// Build the context for `target_node_id` against the store's current snapshot
    pub fn build(
        store: Arc<GraphStore>,
        target_node_id: &str,
        synthesizer: Arc<NodeSynthesizer>,
        cancel: CancellationFlag,
        execution_id: impl Into<String>,
    ) -> Result<Self> {
        let snapshot = store.snapshot();
        let current_node = snapshot
            .find_node(target_node_id)
            .cloned()
            .ok_or_else(|| CanvasEngineError::NodeNotFound(target_node_id.to_string()))?;
        let source_nodes = resolve_source_nodes(&snapshot, target_node_id);

        Ok(Self {
            execution_id: execution_id.into(),
            current_node,
            source_nodes,
            store,
            synthesizer,
            cancel,
        })
    }

    pub fn execution_id(&self) -> &str {
        &self.execution_id
    }

    /// The node being run, as it was when the context was built
    pub fn current_node(&self) -> &CanvasNode {
        &self.current_node
    }

    /// Upstream nodes in edge order
    pub fn source_nodes(&self) -> &[CanvasNode] {
        &self.source_nodes
    }

    /// First source node of the given type, if any
    pub fn first_source_of(&self, node_type: NodeType) -> Option<&CanvasNode> {
        self.source_nodes.iter().find(|n| n.node_type() == node_type)
    }

    pub fn synthesizer(&self) -> &NodeSynthesizer {
        &self.synthesizer
    }

    pub fn limits(&self) -> &LimitsConfig {
        self.store.limits()
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancel.is_cancelled()
    }

    /// Resumption checkpoint; call after every suspension point
    pub fn checkpoint(&self) -> Result<()> {
        self.cancel.checkpoint()
    }

    /// Read the full current snapshot
    pub fn snapshot(&self) -> GraphSnapshot {
        self.store.snapshot()
    }

    /// Append nodes and edges in one commit, unless the run was stopped
    pub fn append(&self, nodes: Vec<CanvasNode>, edges: Vec<CanvasEdge>) -> Result<GraphSnapshot> {
        self.checkpoint()?;
        self.store.append(self.commit_cause(), nodes, edges)
    }

    /// Commit a synthesized node together with its edge
    pub fn commit_synthesis(&self, synthesis: Synthesis) -> Result<GraphSnapshot> {
        self.append(vec![synthesis.node], vec![synthesis.edge])
    }

    /// Replace the current node with `f` applied to its latest stored value
    pub fn replace_current<F>(&self, f: F) -> Result<GraphSnapshot>
    where
        F: FnOnce(&CanvasNode) -> Result<CanvasNode>,
    {
        self.checkpoint()?;
        self.store
            .replace_node(self.commit_cause(), &self.current_node.id, f)
    }

    fn commit_cause(&self) -> CommitCause {
        CommitCause::run(self.execution_id.as_str(), self.current_node.id.as_str())
    }
}
