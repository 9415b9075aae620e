//! Error types for the canvas engine

use thiserror::Error;

use crate::types::{NodeId, NodeType};
use crate::validation::ValidationError;

/// Result type alias using CanvasEngineError
pub type Result<T> = std::result::Result<T, CanvasEngineError>;

/// Errors that can occur in the canvas engine
#[derive(Debug, Error)]
pub enum CanvasEngineError {
    /// A node id did not resolve against the current snapshot
    #[error("Node not found: {0}")]
    NodeNotFound(NodeId),

    /// A node id is already present in the graph
    #[error("Duplicate node id: {0}")]
    DuplicateNodeId(NodeId),

    /// An edge references a node that is not in the graph
    #[error("Edge '{edge_id}' references unknown node '{node_id}'")]
    UnknownEdgeEndpoint { edge_id: String, node_id: NodeId },

    /// Adding an edge would close a cycle
    #[error("Edge {source_id} -> {target_id} would create a cycle")]
    CycleDetected { source_id: NodeId, target_id: NodeId },

    /// Locked nodes reject content and geometry edits
    #[error("Node '{0}' is locked")]
    NodeLocked(NodeId),

    /// Text payload longer than the configured maximum
    #[error("Text content exceeds maximum length of {max} characters (got {actual})")]
    ContentLimit { max: usize, actual: usize },

    /// Node count cap reached
    #[error("Node count exceeds limit of {0} nodes")]
    NodeLimit(usize),

    /// The operation does not apply to this node type
    #[error("Operation not supported for {node_type} node '{node_id}'")]
    WrongNodeType { node_id: NodeId, node_type: NodeType },

    /// The classifier answered with a type the canvas does not know
    #[error("Unsupported output node type: {0}")]
    UnsupportedOutputType(String),

    /// Missing required input from source nodes
    #[error("Missing required input: {0}")]
    MissingInput(String),

    /// A loaded graph failed validation
    #[error("Invalid graph: {0}")]
    InvalidGraph(#[from] ValidationError),

    /// Zero or several executors match a node type
    #[error("Executor configuration fault: {0}")]
    Configuration(String),

    /// An external classification/generation/storage call failed
    #[error("Collaborator failed: {0}")]
    Collaborator(String),

    /// The run was stopped at a checkpoint
    #[error("Execution cancelled")]
    Cancelled,

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Compression error
    #[error("Compression error: {0}")]
    Compression(String),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl CanvasEngineError {
    /// Create a collaborator failure with a message
    pub fn collaborator(msg: impl Into<String>) -> Self {
        Self::Collaborator(msg.into())
    }

    /// Create a configuration-integrity fault with a message
    pub fn configuration(msg: impl Into<String>) -> Self {
        Self::Configuration(msg.into())
    }
}
