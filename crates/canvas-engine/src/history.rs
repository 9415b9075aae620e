//! Commit log behind undo and redo
//!
//! The store logs every commit together with what caused it: a node run
//! (by execution id) or a user edit at the canvas boundary. Each entry keeps
//! the graph as it was *before* that commit, as zstd-compressed JSON, so
//! undoing a run puts back exactly what the run found.

use std::collections::VecDeque;

use serde::{Deserialize, Serialize};

use crate::constants::defaults;
use crate::error::{CanvasEngineError, Result};
use crate::types::{CanvasEdge, CanvasNode, GraphSnapshot, NodeId};

/// Edit-boundary operations that commit to the store
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum EditAction {
    AddNode,
    AddEdge,
    UpdateText,
    SetLocked,
    SetStyle,
    Resize,
}

/// What produced a commit
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum CommitCause {
    /// A node run committed its result
    #[serde(rename_all = "camelCase")]
    Run { execution_id: String, node_id: NodeId },

    /// A user edit; `node_id` is the node edited (the target, for edges)
    #[serde(rename_all = "camelCase")]
    Edit { action: EditAction, node_id: NodeId },

    /// Both collections replaced wholesale
    Load,
}

impl CommitCause {
    pub fn run(execution_id: impl Into<String>, node_id: impl Into<NodeId>) -> Self {
        Self::Run {
            execution_id: execution_id.into(),
            node_id: node_id.into(),
        }
    }

    pub fn edit(action: EditAction, node_id: impl Into<NodeId>) -> Self {
        Self::Edit {
            action,
            node_id: node_id.into(),
        }
    }

    /// Execution id, if a run caused the commit
    pub fn execution_id(&self) -> Option<&str> {
        match self {
            Self::Run { execution_id, .. } => Some(execution_id),
            _ => None,
        }
    }
}

#[derive(Serialize)]
struct Encode<'a> {
    nodes: &'a [CanvasNode],
    edges: &'a [CanvasEdge],
}

#[derive(Deserialize)]
struct Decode {
    nodes: Vec<CanvasNode>,
    edges: Vec<CanvasEdge>,
}

/// A logged commit and the graph on the far side of it
struct Entry {
    cause: CommitCause,
    graph: Vec<u8>,
}

fn encode(snapshot: &GraphSnapshot) -> Result<Vec<u8>> {
    let json = serde_json::to_vec(&Encode {
        nodes: &snapshot.nodes,
        edges: &snapshot.edges,
    })?;
    zstd::encode_all(&json[..], defaults::COMPRESSION_LEVEL)
        .map_err(|e| CanvasEngineError::Compression(e.to_string()))
}

fn decode(bytes: &[u8]) -> Result<GraphSnapshot> {
    let json = zstd::decode_all(bytes).map_err(|e| CanvasEngineError::Compression(e.to_string()))?;
    let graph: Decode = serde_json::from_slice(&json)?;
    Ok(GraphSnapshot::new(graph.nodes, graph.edges))
}

/// Move the newest entry of `from` to `to`, swapping in `current`.
///
/// The entry is put back if either side fails to encode or decode.
fn step(
    from: &mut VecDeque<Entry>,
    to: &mut VecDeque<Entry>,
    current: &GraphSnapshot,
) -> Result<Option<(GraphSnapshot, CommitCause)>> {
    let Some(entry) = from.pop_back() else {
        return Ok(None);
    };
    let swapped = decode(&entry.graph).and_then(|restored| encode(current).map(|graph| (restored, graph)));
    match swapped {
        Ok((restored, graph)) => {
            let cause = entry.cause.clone();
            to.push_back(Entry {
                cause: entry.cause,
                graph,
            });
            Ok(Some((restored, cause)))
        }
        Err(e) => {
            from.push_back(entry);
            Err(e)
        }
    }
}

/// Bounded log of commits that can be undone and redone
pub struct CommitLog {
    undo: VecDeque<Entry>,
    redo: VecDeque<Entry>,
    depth: usize,
}

impl CommitLog {
    /// Keep at most `depth` undoable commits
    pub fn new(depth: usize) -> Self {
        Self {
            undo: VecDeque::new(),
            redo: VecDeque::new(),
            depth: depth.max(1),
        }
    }

    /// Log a commit. `before` is the graph the commit replaced.
    ///
    /// A new commit makes everything previously undone unreachable.
    pub fn record(&mut self, cause: CommitCause, before: &GraphSnapshot) -> Result<()> {
        let graph = encode(before)?;
        self.redo.clear();
        self.undo.push_back(Entry { cause, graph });
        if self.undo.len() > self.depth {
            self.undo.pop_front();
        }
        Ok(())
    }

    /// Revert the newest commit. Returns the graph to restore and what it reverts.
    pub fn undo(&mut self, current: &GraphSnapshot) -> Result<Option<(GraphSnapshot, CommitCause)>> {
        step(&mut self.undo, &mut self.redo, current)
    }

    /// Re-apply the newest undone commit
    pub fn redo(&mut self, current: &GraphSnapshot) -> Result<Option<(GraphSnapshot, CommitCause)>> {
        step(&mut self.redo, &mut self.undo, current)
    }

    /// Cause of the commit `undo` would revert
    pub fn last_cause(&self) -> Option<&CommitCause> {
        self.undo.back().map(|e| &e.cause)
    }

    /// Undoable commits, oldest first
    pub fn causes(&self) -> impl Iterator<Item = &CommitCause> {
        self.undo.iter().map(|e| &e.cause)
    }

    pub fn clear(&mut self) {
        self.undo.clear();
        self.redo.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{NodeData, Position, TextData};

    fn graph(ids: &[&str]) -> GraphSnapshot {
        let nodes = ids
            .iter()
            .map(|id| CanvasNode::new(*id, NodeData::TextEditor(TextData::default()), Position::default()))
            .collect();
        GraphSnapshot::new(nodes, Vec::new())
    }

    fn ids(snapshot: &GraphSnapshot) -> Vec<&str> {
        snapshot.nodes.iter().map(|n| n.id.as_str()).collect()
    }

    #[test]
    fn test_undo_restores_graph_before_run() {
        let mut log = CommitLog::new(10);
        log.record(CommitCause::edit(EditAction::AddNode, "a"), &graph(&[])).unwrap();
        log.record(CommitCause::run("x1", "a"), &graph(&["a"])).unwrap();

        let current = graph(&["a", "b"]);
        let (restored, cause) = log.undo(&current).unwrap().unwrap();
        assert_eq!(ids(&restored), vec!["a"]);
        assert_eq!(cause.execution_id(), Some("x1"));
        assert_eq!(log.last_cause(), Some(&CommitCause::edit(EditAction::AddNode, "a")));

        let (again, cause) = log.redo(&restored).unwrap().unwrap();
        assert_eq!(ids(&again), vec!["a", "b"]);
        assert_eq!(cause, CommitCause::run("x1", "a"));
        assert!(log.redo(&again).unwrap().is_none());
    }

    #[test]
    fn test_new_commit_drops_redo() {
        let mut log = CommitLog::new(10);
        log.record(CommitCause::Load, &graph(&[])).unwrap();
        let (restored, _) = log.undo(&graph(&["a"])).unwrap().unwrap();

        log.record(CommitCause::edit(EditAction::AddNode, "b"), &restored).unwrap();
        assert!(log.redo(&graph(&["b"])).unwrap().is_none());
    }

    #[test]
    fn test_depth_keeps_newest() {
        let mut log = CommitLog::new(2);
        for i in 0..4 {
            log.record(CommitCause::run(format!("x{}", i), "n"), &graph(&[])).unwrap();
        }
        let kept: Vec<_> = log.causes().filter_map(|c| c.execution_id()).collect();
        assert_eq!(kept, vec!["x2", "x3"]);
    }

    #[test]
    fn test_cause_wire_format() {
        let json = serde_json::to_value(CommitCause::run("x1", "n1")).unwrap();
        assert_eq!(json["kind"], "run");
        assert_eq!(json["executionId"], "x1");
        let json = serde_json::to_value(CommitCause::edit(EditAction::UpdateText, "n1")).unwrap();
        assert_eq!(json["action"], "updateText");
    }
}
