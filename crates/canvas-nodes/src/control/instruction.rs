//! Instruction Executor
//!
//! Treats the instruction text as a directive describing what to produce
//! from the upstream inputs. The output type is decided by the classifier;
//! the result is a new node below the instruction, linked by a new edge.

use async_trait::async_trait;
use canvas_engine::{ExecutionContext, ExecutionOutcome, NodeExecutor, NodeType, Result};

use crate::services::{normalize_output_type, CanvasServices};

/// Instruction Executor
///
/// # Steps
/// 1. Collect the type tags of text-editor, image and speech source nodes
/// 2. Remember the style of the first image source, if any
/// 3. Classify the instruction (mandatory; failure fails the run)
/// 4. Normalise the answer to a node type
/// 5. Synthesize the node, inheriting the style only for image output
/// 6. Append node and edge in one commit
pub struct InstructionExecutor {
    services: CanvasServices,
}

impl InstructionExecutor {
    pub fn new(services: CanvasServices) -> Self {
        Self { services }
    }
}

#[async_trait]
impl NodeExecutor for InstructionExecutor {
    fn handles(&self) -> NodeType {
        NodeType::Instruction
    }

    async fn run(&self, ctx: &ExecutionContext) -> Result<ExecutionOutcome> {
        let node = ctx.current_node();
        let instruction = node.data.text().unwrap_or_default();

        let input_types: Vec<NodeType> = ctx
            .source_nodes()
            .iter()
            .map(|n| n.node_type())
            .filter(|t| t.is_directive_input())
            .collect();
        let source_style = ctx
            .first_source_of(NodeType::Image)
            .and_then(|n| n.image_style());

        log::debug!(
            "InstructionExecutor {}: classifying with inputs {:?}",
            node.id,
            input_types
        );
        let raw = self
            .services
            .call(self.services.classifier.classify(instruction, &input_types))
            .await?;
        ctx.checkpoint()?;

        let desired = normalize_output_type(&raw)?;
        let style_hint = match desired {
            NodeType::Image => source_style,
            _ => None,
        };

        let synthesis = ctx.synthesizer().synthesize(desired, node, style_hint);
        let outcome = ExecutionOutcome::Synthesized {
            node_id: synthesis.node.id.clone(),
            edge_id: synthesis.edge.id.clone(),
            node_type: desired,
        };
        ctx.commit_synthesis(synthesis)?;

        log::info!("InstructionExecutor {}: created {} node", node.id, desired);
        Ok(outcome)
    }
}
