//! Executability evaluation
//!
//! Decides whether a node may be run right now. The answer is data, not an
//! error: a node that cannot run yields a short reason string the canvas
//! shows next to the disabled run control.

use serde::{Deserialize, Serialize};

use crate::types::{CanvasEdge, CanvasNode, GraphSnapshot, NodeData, NodeType};

/// Result of an executability check
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Executability {
    pub executable: bool,
    pub reason: Option<String>,
}

impl Executability {
    pub fn runnable() -> Self {
        Self {
            executable: true,
            reason: None,
        }
    }

    pub fn blocked(reason: impl Into<String>) -> Self {
        Self {
            executable: false,
            reason: Some(reason.into()),
        }
    }
}

pub const REASON_RUNNING: &str = "Node is already running";
pub const REASON_COMMENT: &str = "Comment nodes cannot be run";
pub const REASON_LOCKED: &str = "Node is locked";
pub const REASON_EMPTY_INSTRUCTION: &str = "Instruction text is empty";
pub const REASON_NO_INPUT: &str = "Connect an input node first";

/// Evaluate the structural and content preconditions of `node`.
///
/// Only edges ending at the node are considered, so the full edge list can
/// be passed as-is.
pub fn evaluate(node: &CanvasNode, edges: &[CanvasEdge]) -> Executability {
    if node.node_type() == NodeType::Comment {
        return Executability::blocked(REASON_COMMENT);
    }
    if node.is_locked() {
        return Executability::blocked(REASON_LOCKED);
    }

    match &node.data {
        NodeData::Instruction(data) if data.text.trim().is_empty() => {
            Executability::blocked(REASON_EMPTY_INSTRUCTION)
        }
        NodeData::Instruction(_) => Executability::runnable(),
        _ if !edges.iter().any(|e| e.target == node.id) => Executability::blocked(REASON_NO_INPUT),
        _ => Executability::runnable(),
    }
}

/// [`evaluate`], with the running indicator checked first
pub fn evaluate_with_state(node: &CanvasNode, edges: &[CanvasEdge], running: bool) -> Executability {
    if running {
        return Executability::blocked(REASON_RUNNING);
    }
    evaluate(node, edges)
}

/// [`evaluate_with_state`] against a whole snapshot. An edge only counts as
/// an input while its source node still exists.
pub fn evaluate_in(snapshot: &GraphSnapshot, node: &CanvasNode, running: bool) -> Executability {
    let inputs: Vec<CanvasEdge> = snapshot
        .incoming_edges(&node.id)
        .filter(|e| snapshot.contains_node(&e.source))
        .cloned()
        .collect();
    evaluate_with_state(node, &inputs, running)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{ImageData, Position, SpeechData, TextData};

    fn instruction(text: &str) -> CanvasNode {
        CanvasNode::new(
            "instr",
            NodeData::Instruction(TextData {
                text: text.to_string(),
                is_locked: false,
            }),
            Position::default(),
        )
    }

    fn edge_into(target: &str) -> CanvasEdge {
        CanvasEdge::new("e1", "src", target)
    }

    #[test]
    fn test_comment_never_runs() {
        let node = CanvasNode::new("c", NodeData::default_for(NodeType::Comment), Position::default());
        let result = evaluate(&node, &[edge_into("c")]);
        assert!(!result.executable);
        assert_eq!(result.reason.as_deref(), Some(REASON_COMMENT));
    }

    #[test]
    fn test_locked_node() {
        let node = CanvasNode::new(
            "img",
            NodeData::Image(ImageData {
                is_locked: true,
                ..ImageData::default()
            }),
            Position::default(),
        );
        assert_eq!(
            evaluate(&node, &[edge_into("img")]).reason.as_deref(),
            Some(REASON_LOCKED)
        );
    }

    #[test]
    fn test_instruction_rules() {
        assert_eq!(
            evaluate(&instruction("   \n"), &[]).reason.as_deref(),
            Some(REASON_EMPTY_INSTRUCTION)
        );
        // No upstream input is required for an instruction
        assert_eq!(evaluate(&instruction("draw a cat"), &[]), Executability::runnable());
    }

    #[test]
    fn test_generators_need_an_input() {
        let speech = CanvasNode::new("sp", NodeData::Speech(SpeechData::default()), Position::default());
        assert_eq!(
            evaluate(&speech, &[CanvasEdge::new("e", "sp", "other")]).reason.as_deref(),
            Some(REASON_NO_INPUT)
        );
        assert!(evaluate(&speech, &[edge_into("sp")]).executable);

        let text = CanvasNode::new("t", NodeData::default_for(NodeType::TextEditor), Position::default());
        assert!(!evaluate(&text, &[]).executable);
        assert!(evaluate(&text, &[edge_into("t")]).executable);
    }

    #[test]
    fn test_running_checked_first() {
        let node = CanvasNode::new(
            "c",
            NodeData::Comment(TextData {
                text: String::new(),
                is_locked: true,
            }),
            Position::default(),
        );
        assert_eq!(
            evaluate_with_state(&node, &[], true).reason.as_deref(),
            Some(REASON_RUNNING)
        );
        assert_eq!(
            evaluate_with_state(&node, &[], false).reason.as_deref(),
            Some(REASON_COMMENT)
        );
    }

    #[test]
    fn test_evaluation_is_pure() {
        let node = instruction("summarise");
        let edges = vec![edge_into("instr")];
        let first = evaluate(&node, &edges);
        for _ in 0..10 {
            assert_eq!(evaluate(&node, &edges), first);
        }
        assert_eq!(node, instruction("summarise"));
    }

    #[test]
    fn test_dangling_edge_is_not_an_input() {
        let speech = CanvasNode::new("sp", NodeData::Speech(SpeechData::default()), Position::default());
        let orphaned = GraphSnapshot::new(vec![speech.clone()], vec![CanvasEdge::new("e1", "deleted", "sp")]);
        // The pure rule only sees edges
        assert!(evaluate(&speech, &orphaned.edges).executable);
        assert_eq!(
            evaluate_in(&orphaned, &speech, false).reason.as_deref(),
            Some(REASON_NO_INPUT)
        );

        let source = CanvasNode::new("src", NodeData::default_for(NodeType::TextEditor), Position::default());
        let connected = GraphSnapshot::new(vec![source, speech.clone()], vec![CanvasEdge::new("e1", "src", "sp")]);
        assert!(evaluate_in(&connected, &speech, false).executable);
        assert_eq!(
            evaluate_in(&connected, &speech, true).reason.as_deref(),
            Some(REASON_RUNNING)
        );
    }
}
