//! Core types for canvas graphs
//!
//! These types mirror the canvas document: a tagged union of node variants,
//! directed edges between them, and immutable snapshots of both collections.

use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::error::CanvasEngineError;

/// Unique identifier for a node
pub type NodeId = String;

/// Unique identifier for an edge
pub type EdgeId = String;

/// The closed set of node variants
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum NodeType {
    /// Free text, can be generated from its inputs
    TextEditor,
    /// Rendered image with a style tag
    Image,
    /// Synthesized speech (audio tracked outside the node)
    Speech,
    /// Annotation, never executed
    Comment,
    /// Directive describing what to produce from upstream inputs
    Instruction,
}

impl NodeType {
    /// Every variant, in declaration order
    pub const ALL: [NodeType; 5] = [
        NodeType::TextEditor,
        NodeType::Image,
        NodeType::Speech,
        NodeType::Comment,
        NodeType::Instruction,
    ];

    /// Variants that have an executor
    pub const RUNNABLE: [NodeType; 4] = [
        NodeType::TextEditor,
        NodeType::Image,
        NodeType::Speech,
        NodeType::Instruction,
    ];

    /// Wire name of the type tag
    pub fn as_str(&self) -> &'static str {
        match self {
            NodeType::TextEditor => "textEditor",
            NodeType::Image => "image",
            NodeType::Speech => "speech",
            NodeType::Comment => "comment",
            NodeType::Instruction => "instruction",
        }
    }

    /// Whether an edge from this type may feed an instruction directive
    pub fn is_directive_input(&self) -> bool {
        matches!(self, NodeType::TextEditor | NodeType::Image | NodeType::Speech)
    }
}

impl fmt::Display for NodeType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for NodeType {
    type Err = CanvasEngineError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        NodeType::ALL
            .into_iter()
            .find(|t| t.as_str() == s)
            .ok_or_else(|| CanvasEngineError::UnsupportedOutputType(s.to_string()))
    }
}

/// Visual style of an image node
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ImageStyle {
    #[default]
    Auto,
    Anime,
    PixelArt,
    Cyberpunk,
    #[serde(rename = "3d-model")]
    ThreeDModel,
    LowPoly,
    LineArt,
    Watercolor,
    PopArt,
    Surrealism,
}

/// Payload shared by text-editor, comment and instruction nodes
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TextData {
    pub text: String,
    pub is_locked: bool,
}

/// Payload of an image node
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImageData {
    /// Handle of the rendered output, if any
    pub image_url: Option<String>,
    pub is_locked: bool,
    pub style: ImageStyle,
}

/// Payload of a speech node
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SpeechData {
    pub is_locked: bool,
}

/// Type tag plus type-specific payload
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "data", rename_all = "camelCase")]
pub enum NodeData {
    TextEditor(TextData),
    Image(ImageData),
    Speech(SpeechData),
    Comment(TextData),
    Instruction(TextData),
}

impl NodeData {
    /// Default payload for a freshly created node of the given type
    pub fn default_for(node_type: NodeType) -> Self {
        match node_type {
            NodeType::TextEditor => NodeData::TextEditor(TextData::default()),
            NodeType::Image => NodeData::Image(ImageData::default()),
            NodeType::Speech => NodeData::Speech(SpeechData::default()),
            NodeType::Comment => NodeData::Comment(TextData::default()),
            NodeType::Instruction => NodeData::Instruction(TextData::default()),
        }
    }

    pub fn node_type(&self) -> NodeType {
        match self {
            NodeData::TextEditor(_) => NodeType::TextEditor,
            NodeData::Image(_) => NodeType::Image,
            NodeData::Speech(_) => NodeType::Speech,
            NodeData::Comment(_) => NodeType::Comment,
            NodeData::Instruction(_) => NodeType::Instruction,
        }
    }

    pub fn is_locked(&self) -> bool {
        match self {
            NodeData::TextEditor(d) | NodeData::Comment(d) | NodeData::Instruction(d) => {
                d.is_locked
            }
            NodeData::Image(d) => d.is_locked,
            NodeData::Speech(d) => d.is_locked,
        }
    }

    pub fn set_locked(&mut self, locked: bool) {
        match self {
            NodeData::TextEditor(d) | NodeData::Comment(d) | NodeData::Instruction(d) => {
                d.is_locked = locked
            }
            NodeData::Image(d) => d.is_locked = locked,
            NodeData::Speech(d) => d.is_locked = locked,
        }
    }

    /// Text content, for the text-bearing variants
    pub fn text(&self) -> Option<&str> {
        match self {
            NodeData::TextEditor(d) | NodeData::Comment(d) | NodeData::Instruction(d) => {
                Some(&d.text)
            }
            _ => None,
        }
    }

    pub fn text_mut(&mut self) -> Option<&mut String> {
        match self {
            NodeData::TextEditor(d) | NodeData::Comment(d) | NodeData::Instruction(d) => {
                Some(&mut d.text)
            }
            _ => None,
        }
    }
}

/// Position on the canvas
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Position {
    pub x: f64,
    pub y: f64,
}

impl Position {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

/// A node instance on the canvas
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CanvasNode {
    /// Unique, immutable identifier
    pub id: NodeId,
    /// Type tag and payload (the type never changes after creation)
    #[serde(flatten)]
    pub data: NodeData,
    pub position: Position,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub z_index: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub width: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub height: Option<f64>,
}

impl CanvasNode {
    /// Create a node with the given payload and no explicit geometry
    pub fn new(id: impl Into<NodeId>, data: NodeData, position: Position) -> Self {
        Self {
            id: id.into(),
            data,
            position,
            z_index: None,
            width: None,
            height: None,
        }
    }

    /// Set an explicit size
    pub fn with_size(mut self, width: f64, height: f64) -> Self {
        self.width = Some(width);
        self.height = Some(height);
        self
    }

    pub fn node_type(&self) -> NodeType {
        self.data.node_type()
    }

    pub fn is_locked(&self) -> bool {
        self.data.is_locked()
    }

    /// Style of an image node
    pub fn image_style(&self) -> Option<ImageStyle> {
        match &self.data {
            NodeData::Image(d) => Some(d.style),
            _ => None,
        }
    }
}

/// Kind of edge; the canvas draws only one
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum EdgeType {
    #[default]
    Default,
}

/// A directed connection: the source's output feeds the target
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CanvasEdge {
    pub id: EdgeId,
    pub source: NodeId,
    pub target: NodeId,
    #[serde(rename = "type", default)]
    pub edge_type: EdgeType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub animated: Option<bool>,
}

impl CanvasEdge {
    /// Create an unanimated default edge
    pub fn new(id: impl Into<EdgeId>, source: impl Into<NodeId>, target: impl Into<NodeId>) -> Self {
        Self {
            id: id.into(),
            source: source.into(),
            target: target.into(),
            edge_type: EdgeType::Default,
            animated: None,
        }
    }
}

/// Immutable view of both collections at one point in time
///
/// Cloning is cheap. Every store mutation produces a new vector for the
/// collection it touches, so a collection that was not modified stays
/// pointer-equal to the one in older snapshots.
#[derive(Debug, Clone, Default)]
pub struct GraphSnapshot {
    pub nodes: Arc<Vec<CanvasNode>>,
    pub edges: Arc<Vec<CanvasEdge>>,
}

impl GraphSnapshot {
    pub fn new(nodes: Vec<CanvasNode>, edges: Vec<CanvasEdge>) -> Self {
        Self {
            nodes: Arc::new(nodes),
            edges: Arc::new(edges),
        }
    }

    /// Find a node by ID
    pub fn find_node(&self, id: &str) -> Option<&CanvasNode> {
        self.nodes.iter().find(|n| n.id == id)
    }

    pub fn contains_node(&self, id: &str) -> bool {
        self.nodes.iter().any(|n| n.id == id)
    }

    /// Get edges coming into a node, in edge sequence order
    pub fn incoming_edges<'a>(&'a self, node_id: &'a str) -> impl Iterator<Item = &'a CanvasEdge> + 'a {
        self.edges.iter().filter(move |e| e.target == node_id)
    }

    /// Get edges going out of a node
    pub fn outgoing_edges<'a>(&'a self, node_id: &'a str) -> impl Iterator<Item = &'a CanvasEdge> + 'a {
        self.edges.iter().filter(move |e| e.source == node_id)
    }

    /// Whether both collections are the same allocations as in `other`
    pub fn ptr_eq(&self, other: &GraphSnapshot) -> bool {
        Arc::ptr_eq(&self.nodes, &other.nodes) && Arc::ptr_eq(&self.edges, &other.edges)
    }

    /// Copy the graph under fresh node and edge ids
    ///
    /// Edges are remapped onto the new node ids; an endpoint that does not
    /// resolve keeps its old id.
    pub fn duplicate(&self) -> GraphSnapshot {
        let mut id_map = std::collections::HashMap::new();
        let nodes: Vec<CanvasNode> = self
            .nodes
            .iter()
            .map(|node| {
                let new_id = uuid::Uuid::new_v4().to_string();
                id_map.insert(node.id.clone(), new_id.clone());
                CanvasNode {
                    id: new_id,
                    ..node.clone()
                }
            })
            .collect();
        let edges = self
            .edges
            .iter()
            .map(|edge| CanvasEdge {
                id: uuid::Uuid::new_v4().to_string(),
                source: id_map.get(&edge.source).cloned().unwrap_or_else(|| edge.source.clone()),
                target: id_map.get(&edge.target).cloned().unwrap_or_else(|| edge.target.clone()),
                ..edge.clone()
            })
            .collect();
        GraphSnapshot::new(nodes, edges)
    }
}

/// Starter content for a new canvas: a single unlocked text node
pub fn seed_graph() -> GraphSnapshot {
    use crate::constants::seed;

    let node = CanvasNode::new(
        uuid::Uuid::new_v4().to_string(),
        NodeData::TextEditor(TextData {
            text: seed::TEXT.to_string(),
            is_locked: false,
        }),
        Position::new(0.0, 0.0),
    )
    .with_size(seed::WIDTH, seed::HEIGHT);
    GraphSnapshot::new(vec![node], Vec::new())
}
