//! Graph validation for canvas snapshots
//!
//! Checks id uniqueness, edge endpoints, payload limits and acyclicity.
//! All problems are collected, not just the first.

use std::collections::{HashMap, HashSet, VecDeque};

use crate::config::LimitsConfig;
use crate::types::{CanvasEdge, CanvasNode, GraphSnapshot, NodeId};

/// Validation error with location context
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ValidationError {
    #[error("Cycle detected in graph")]
    CycleDetected,

    #[error("Duplicate node id '{node_id}'")]
    DuplicateNodeId { node_id: NodeId },

    #[error("Edge '{edge_id}' references unknown node '{node_id}'")]
    UnknownNode { edge_id: String, node_id: NodeId },

    #[error("Node '{node_id}' has {length} characters of text (limit {max})")]
    TextTooLong { node_id: NodeId, length: usize, max: usize },

    #[error("Graph has {count} nodes (limit {max})")]
    TooManyNodes { count: usize, max: usize },
}

/// Validate a full snapshot against the given limits
pub fn validate_graph(snapshot: &GraphSnapshot, limits: &LimitsConfig) -> Vec<ValidationError> {
    let mut errors = Vec::new();

    validate_unique_ids(&snapshot.nodes, &mut errors);
    validate_edge_references(&snapshot.nodes, &snapshot.edges, &mut errors);
    validate_limits(&snapshot.nodes, limits, &mut errors);
    if has_cycle(&snapshot.nodes, &snapshot.edges) {
        errors.push(ValidationError::CycleDetected);
    }

    errors
}

/// Number of characters in a text payload, as the editor counts them
pub fn text_length(text: &str) -> usize {
    text.chars().count()
}

fn validate_unique_ids(nodes: &[CanvasNode], errors: &mut Vec<ValidationError>) {
    let mut seen: HashSet<&str> = HashSet::new();
    for node in nodes {
        if !seen.insert(node.id.as_str()) {
            errors.push(ValidationError::DuplicateNodeId {
                node_id: node.id.clone(),
            });
        }
    }
}

/// Check that all edge source/target nodes exist
fn validate_edge_references(
    nodes: &[CanvasNode],
    edges: &[CanvasEdge],
    errors: &mut Vec<ValidationError>,
) {
    let node_ids: HashSet<&str> = nodes.iter().map(|n| n.id.as_str()).collect();

    for edge in edges {
        if !node_ids.contains(edge.source.as_str()) {
            errors.push(ValidationError::UnknownNode {
                edge_id: edge.id.clone(),
                node_id: edge.source.clone(),
            });
        }
        if !node_ids.contains(edge.target.as_str()) {
            errors.push(ValidationError::UnknownNode {
                edge_id: edge.id.clone(),
                node_id: edge.target.clone(),
            });
        }
    }
}

fn validate_limits(nodes: &[CanvasNode], limits: &LimitsConfig, errors: &mut Vec<ValidationError>) {
    for node in nodes {
        if let Some(text) = node.data.text() {
            let length = text_length(text);
            if length > limits.max_text_length {
                errors.push(ValidationError::TextTooLong {
                    node_id: node.id.clone(),
                    length,
                    max: limits.max_text_length,
                });
            }
        }
    }
    if let Some(max) = limits.max_nodes {
        if nodes.len() > max {
            errors.push(ValidationError::TooManyNodes {
                count: nodes.len(),
                max,
            });
        }
    }
}

/// Detect cycles using Kahn's algorithm (topological sort)
///
/// Edges with an unknown endpoint are ignored here; they are reported by
/// the reference check.
pub fn has_cycle(nodes: &[CanvasNode], edges: &[CanvasEdge]) -> bool {
    let mut in_degree: HashMap<&str, usize> = HashMap::new();
    for node in nodes {
        in_degree.insert(&node.id, 0);
    }
    let known = |id: &str| in_degree.contains_key(id);
    let live_edges: Vec<&CanvasEdge> = edges
        .iter()
        .filter(|e| known(&e.source) && known(&e.target))
        .collect();
    for edge in &live_edges {
        if let Some(deg) = in_degree.get_mut(edge.target.as_str()) {
            *deg += 1;
        }
    }

    let mut queue: VecDeque<&str> = in_degree
        .iter()
        .filter(|(_, &deg)| deg == 0)
        .map(|(&id, _)| id)
        .collect();

    let mut visited = 0;
    while let Some(node_id) = queue.pop_front() {
        visited += 1;
        for edge in &live_edges {
            if edge.source == node_id {
                if let Some(deg) = in_degree.get_mut(edge.target.as_str()) {
                    *deg -= 1;
                    if *deg == 0 {
                        queue.push_back(&edge.target);
                    }
                }
            }
        }
    }

    visited < in_degree.len()
}
