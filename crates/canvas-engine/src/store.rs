//! The Graph Store: canonical owner of the canvas collections
//!
//! All reads and writes funnel through [`GraphStore`]. Reads hand out cheap
//! [`GraphSnapshot`] clones; writes build the next collection and swap it in
//! under the write lock, merging against whatever is current at commit time.
//! A collection a write does not touch keeps its allocation, so callers can
//! compare snapshots by pointer.
//!
//! Commits are logged for undo while the write lock is still held, so the
//! log's order is always the order the commits were applied in. Lock order
//! is `state`, then `history`.

use std::collections::{HashMap, HashSet};

use parking_lot::{Mutex, RwLock};

use crate::config::{EngineConfig, LimitsConfig};
use crate::context::CancellationFlag;
use crate::error::{CanvasEngineError, Result};
use crate::history::{CommitCause, CommitLog, EditAction};
use crate::types::{CanvasEdge, CanvasNode, GraphSnapshot, ImageStyle, NodeData, NodeId};
use crate::validation::{has_cycle, text_length, validate_graph};

/// Bookkeeping for one in-flight run
struct ActiveRun {
    execution_id: String,
    cancel: CancellationFlag,
}

/// Shared, synchronously locked owner of nodes and edges
pub struct GraphStore {
    state: RwLock<GraphSnapshot>,
    history: Mutex<Option<CommitLog>>,
    runs: Mutex<HashMap<NodeId, ActiveRun>>,
    limits: LimitsConfig,
}

impl GraphStore {
    /// Create an empty store
    pub fn new(config: &EngineConfig) -> Self {
        let history = (config.history_depth > 0).then(|| CommitLog::new(config.history_depth));
        Self {
            state: RwLock::new(GraphSnapshot::default()),
            history: Mutex::new(history),
            runs: Mutex::new(HashMap::new()),
            limits: config.limits.clone(),
        }
    }

    /// Create a store holding an existing graph, validating it first
    pub fn with_snapshot(snapshot: GraphSnapshot, config: &EngineConfig) -> Result<Self> {
        let store = Self::new(config);
        store.replace_all(snapshot)?;
        if let Some(history) = store.history.lock().as_mut() {
            history.clear();
        }
        Ok(store)
    }

    /// Current snapshot of both collections
    pub fn snapshot(&self) -> GraphSnapshot {
        self.state.read().clone()
    }

    /// Look up a node in the current snapshot
    pub fn find_node(&self, id: &str) -> Option<CanvasNode> {
        self.state.read().find_node(id).cloned()
    }

    /// Limits this store enforces
    pub fn limits(&self) -> &LimitsConfig {
        &self.limits
    }

    // =========================================================================
    // Commit primitives (used by executors through the execution context)
    // =========================================================================

    /// Append nodes and edges as one update.
    ///
    /// The merge is computed against the snapshot current at commit time, so
    /// concurrent appends never drop each other's contribution. Either every
    /// node and edge is added or nothing is.
    pub fn append(
        &self,
        cause: CommitCause,
        nodes: Vec<CanvasNode>,
        edges: Vec<CanvasEdge>,
    ) -> Result<GraphSnapshot> {
        let mut state = self.state.write();

        if let Some(max) = self.limits.max_nodes {
            if state.nodes.len() + nodes.len() > max {
                return Err(CanvasEngineError::NodeLimit(max));
            }
        }

        let mut ids: HashSet<&str> = state.nodes.iter().map(|n| n.id.as_str()).collect();
        for node in &nodes {
            if !ids.insert(node.id.as_str()) {
                return Err(CanvasEngineError::DuplicateNodeId(node.id.clone()));
            }
        }
        for edge in &edges {
            for endpoint in [&edge.source, &edge.target] {
                if !ids.contains(endpoint.as_str()) {
                    return Err(CanvasEngineError::UnknownEdgeEndpoint {
                        edge_id: edge.id.clone(),
                        node_id: endpoint.clone(),
                    });
                }
            }
        }

        let mut next = state.clone();
        if !nodes.is_empty() {
            let mut merged = Vec::with_capacity(state.nodes.len() + nodes.len());
            merged.extend(state.nodes.iter().cloned());
            merged.extend(nodes);
            next.nodes = merged.into();
        }
        if !edges.is_empty() {
            let mut merged = Vec::with_capacity(state.edges.len() + edges.len());
            merged.extend(state.edges.iter().cloned());
            merged.extend(edges);
            next.edges = merged.into();
        }

        self.commit(&mut state, next.clone(), cause);
        Ok(next)
    }

    /// Replace one node with the result of `f` applied to its current value.
    ///
    /// The node is re-read at commit time. Its id and type must not change.
    pub fn replace_node<F>(&self, cause: CommitCause, id: &str, f: F) -> Result<GraphSnapshot>
    where
        F: FnOnce(&CanvasNode) -> Result<CanvasNode>,
    {
        let mut state = self.state.write();
        let index = state
            .nodes
            .iter()
            .position(|n| n.id == id)
            .ok_or_else(|| CanvasEngineError::NodeNotFound(id.to_string()))?;

        let current = &state.nodes[index];
        let updated = f(current)?;
        if updated.id != current.id || updated.node_type() != current.node_type() {
            return Err(CanvasEngineError::WrongNodeType {
                node_id: current.id.clone(),
                node_type: current.node_type(),
            });
        }

        let mut nodes: Vec<CanvasNode> = state.nodes.as_ref().clone();
        nodes[index] = updated;
        let next = GraphSnapshot {
            nodes: nodes.into(),
            edges: state.edges.clone(),
        };

        self.commit(&mut state, next.clone(), cause);
        Ok(next)
    }

    /// Replace both collections wholesale (e.g. after loading a document)
    pub fn replace_all(&self, snapshot: GraphSnapshot) -> Result<()> {
        if let Some(error) = validate_graph(&snapshot, &self.limits).into_iter().next() {
            log::warn!("Rejected graph replacement: {}", error);
            return Err(error.into());
        }
        let mut state = self.state.write();
        self.commit(&mut state, snapshot, CommitCause::Load);
        Ok(())
    }

    // =========================================================================
    // Edit-boundary operations
    // =========================================================================

    /// Add a node placed by the user
    pub fn add_node(&self, node: CanvasNode) -> Result<GraphSnapshot> {
        self.check_text_limit(&node.data)?;
        let cause = CommitCause::edit(EditAction::AddNode, node.id.clone());
        self.append(cause, vec![node], Vec::new())
    }

    /// Connect two existing nodes with a default edge
    pub fn add_edge(&self, source: &str, target: &str) -> Result<CanvasEdge> {
        let edge = CanvasEdge::new(uuid::Uuid::new_v4().to_string(), source, target);
        let mut state = self.state.write();

        for endpoint in [source, target] {
            if !state.contains_node(endpoint) {
                return Err(CanvasEngineError::UnknownEdgeEndpoint {
                    edge_id: edge.id.clone(),
                    node_id: endpoint.to_string(),
                });
            }
        }

        let mut edges: Vec<CanvasEdge> = state.edges.as_ref().clone();
        edges.push(edge.clone());
        if source == target || has_cycle(&state.nodes, &edges) {
            return Err(CanvasEngineError::CycleDetected {
                source_id: source.to_string(),
                target_id: target.to_string(),
            });
        }

        let next = GraphSnapshot {
            nodes: state.nodes.clone(),
            edges: edges.into(),
        };
        self.commit(&mut state, next, CommitCause::edit(EditAction::AddEdge, target));
        Ok(edge)
    }

    /// Replace the text of a text-editor, comment or instruction node
    pub fn update_text(&self, id: &str, text: impl Into<String>) -> Result<GraphSnapshot> {
        let text = text.into();
        let actual = text_length(&text);
        if actual > self.limits.max_text_length {
            return Err(CanvasEngineError::ContentLimit {
                max: self.limits.max_text_length,
                actual,
            });
        }
        self.replace_node(CommitCause::edit(EditAction::UpdateText, id), id, |node| {
            ensure_unlocked(node)?;
            let mut updated = node.clone();
            let slot = updated
                .data
                .text_mut()
                .ok_or_else(|| wrong_type(node))?;
            *slot = text;
            Ok(updated)
        })
    }

    /// Lock or unlock a node
    pub fn set_locked(&self, id: &str, locked: bool) -> Result<GraphSnapshot> {
        self.replace_node(CommitCause::edit(EditAction::SetLocked, id), id, |node| {
            let mut updated = node.clone();
            updated.data.set_locked(locked);
            Ok(updated)
        })
    }

    /// Change the style of an image node
    pub fn set_style(&self, id: &str, style: ImageStyle) -> Result<GraphSnapshot> {
        self.replace_node(CommitCause::edit(EditAction::SetStyle, id), id, |node| {
            ensure_unlocked(node)?;
            let mut updated = node.clone();
            match &mut updated.data {
                NodeData::Image(data) => data.style = style,
                _ => return Err(wrong_type(node)),
            }
            Ok(updated)
        })
    }

    /// Resize a node; locked nodes are never resizable
    pub fn resize(&self, id: &str, width: f64, height: f64) -> Result<GraphSnapshot> {
        self.replace_node(CommitCause::edit(EditAction::Resize, id), id, |node| {
            ensure_unlocked(node)?;
            Ok(node.clone().with_size(width, height))
        })
    }

    // =========================================================================
    // History
    // =========================================================================

    /// Revert the newest logged commit.
    ///
    /// Returns what the reverted commit was, or `None` with nothing to undo.
    pub fn undo(&self) -> Result<Option<CommitCause>> {
        let mut state = self.state.write();
        let mut history = self.history.lock();
        let Some(commits) = history.as_mut() else {
            return Ok(None);
        };
        Ok(commits.undo(&state)?.map(|(restored, cause)| {
            *state = restored;
            cause
        }))
    }

    /// Re-apply the newest undone commit
    pub fn redo(&self) -> Result<Option<CommitCause>> {
        let mut state = self.state.write();
        let mut history = self.history.lock();
        let Some(commits) = history.as_mut() else {
            return Ok(None);
        };
        Ok(commits.redo(&state)?.map(|(restored, cause)| {
            *state = restored;
            cause
        }))
    }

    /// Revert the commit of run `execution_id`, if nothing has been
    /// committed on top of it. Returns false otherwise.
    pub fn undo_run(&self, execution_id: &str) -> Result<bool> {
        let mut state = self.state.write();
        let mut history = self.history.lock();
        let Some(commits) = history.as_mut() else {
            return Ok(false);
        };
        if commits.last_cause().and_then(CommitCause::execution_id) != Some(execution_id) {
            return Ok(false);
        }
        match commits.undo(&state)? {
            Some((restored, _)) => {
                *state = restored;
                log::info!("Reverted run {}", execution_id);
                Ok(true)
            }
            None => Ok(false),
        }
    }

    /// What the next `undo` would revert
    pub fn last_commit(&self) -> Option<CommitCause> {
        self.history.lock().as_ref().and_then(|commits| commits.last_cause().cloned())
    }

    /// Swap in `next`, logging `cause` against the graph it replaces.
    /// Callers hold the state write lock for the whole commit.
    fn commit(&self, state: &mut GraphSnapshot, next: GraphSnapshot, cause: CommitCause) {
        if let Some(commits) = self.history.lock().as_mut() {
            if let Err(e) = commits.record(cause, state) {
                log::warn!("Failed to log commit for undo: {}", e);
            }
        }
        *state = next;
    }

    // =========================================================================
    // Run-state tracking
    // =========================================================================

    /// Mark a node as running. Returns `None` if it already is.
    pub fn begin_run(&self, node_id: &str, execution_id: &str) -> Option<CancellationFlag> {
        let mut runs = self.runs.lock();
        if runs.contains_key(node_id) {
            return None;
        }
        let cancel = CancellationFlag::new();
        runs.insert(
            node_id.to_string(),
            ActiveRun {
                execution_id: execution_id.to_string(),
                cancel: cancel.clone(),
            },
        );
        Some(cancel)
    }

    /// Clear the running indicator set by `begin_run`
    pub fn finish_run(&self, node_id: &str, execution_id: &str) {
        let mut runs = self.runs.lock();
        if runs
            .get(node_id)
            .is_some_and(|run| run.execution_id == execution_id)
        {
            runs.remove(node_id);
        }
    }

    pub fn is_running(&self, node_id: &str) -> bool {
        self.runs.lock().contains_key(node_id)
    }

    /// Ask an in-flight run to stop at its next checkpoint.
    ///
    /// Returns false if the node is not running.
    pub fn request_stop(&self, node_id: &str) -> bool {
        match self.runs.lock().get(node_id) {
            Some(run) => {
                run.cancel.cancel();
                true
            }
            None => false,
        }
    }

    fn check_text_limit(&self, data: &NodeData) -> Result<()> {
        if let Some(text) = data.text() {
            let actual = text_length(text);
            if actual > self.limits.max_text_length {
                return Err(CanvasEngineError::ContentLimit {
                    max: self.limits.max_text_length,
                    actual,
                });
            }
        }
        Ok(())
    }
}

fn ensure_unlocked(node: &CanvasNode) -> Result<()> {
    if node.is_locked() {
        Err(CanvasEngineError::NodeLocked(node.id.clone()))
    } else {
        Ok(())
    }
}

fn wrong_type(node: &CanvasNode) -> CanvasEngineError {
    CanvasEngineError::WrongNodeType {
        node_id: node.id.clone(),
        node_type: node.node_type(),
    }
}
