//! Node synthesis: building the node and edge a run appends to the graph
//!
//! The new node is placed directly below its anchor so chained generations
//! read top-to-bottom, and gets the default payload for its type.

use std::sync::Arc;

use crate::config::LayoutConfig;
use crate::types::{CanvasEdge, CanvasNode, ImageStyle, NodeData, NodeId, NodeType, Position};

/// Source of fresh node ids
pub trait IdGenerator: Send + Sync {
    fn next_id(&self) -> NodeId;
}

/// Random v4 UUIDs
pub struct UuidGenerator;

impl IdGenerator for UuidGenerator {
    fn next_id(&self) -> NodeId {
        uuid::Uuid::new_v4().to_string()
    }
}

/// A synthesized node and the edge linking it to its origin.
///
/// Both must be committed together.
#[derive(Debug, Clone, PartialEq)]
pub struct Synthesis {
    pub node: CanvasNode,
    pub edge: CanvasEdge,
}

/// Builds new nodes from a classified output type
pub struct NodeSynthesizer {
    layout: LayoutConfig,
    ids: Arc<dyn IdGenerator>,
}

impl NodeSynthesizer {
    /// Create a synthesizer that issues UUID node ids
    pub fn new(layout: LayoutConfig) -> Self {
        Self::with_id_generator(layout, Arc::new(UuidGenerator))
    }

    pub fn with_id_generator(layout: LayoutConfig, ids: Arc<dyn IdGenerator>) -> Self {
        Self { layout, ids }
    }

    /// Build a node of `desired` type below `anchor`, plus the anchor → node edge.
    ///
    /// `style_hint` only applies to image nodes, where it replaces the default
    /// style.
    pub fn synthesize(
        &self,
        desired: NodeType,
        anchor: &CanvasNode,
        style_hint: Option<ImageStyle>,
    ) -> Synthesis {
        let id = self.ids.next_id();

        let mut data = NodeData::default_for(desired);
        if let (NodeData::Image(image), Some(style)) = (&mut data, style_hint) {
            image.style = style;
        }

        let position = Position::new(anchor.position.x, anchor.position.y + self.layout.vertical_gap);
        let mut node = CanvasNode::new(id.clone(), data, position);
        if desired == NodeType::TextEditor {
            node = node.with_size(self.layout.text_node_width, self.layout.text_node_height);
        }

        let edge = CanvasEdge::new(format!("edge-{}-{}", anchor.id, id), anchor.id.clone(), id);

        log::debug!(
            "Synthesized {} node '{}' from '{}'",
            desired,
            node.id,
            anchor.id
        );
        Synthesis { node, edge }
    }
}

impl Default for NodeSynthesizer {
    fn default() -> Self {
        Self::new(LayoutConfig::default())
    }
}
