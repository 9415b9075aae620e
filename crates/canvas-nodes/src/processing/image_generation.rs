//! Image Generation Executor
//!
//! Renders an image from the text of upstream text-editor and instruction
//! nodes, optionally guided by the first upstream image, and writes the
//! result onto the image node itself.

use async_trait::async_trait;
use canvas_engine::{
    CanvasEngineError, ExecutionContext, ExecutionOutcome, NodeData, NodeExecutor, NodeType, Result,
};

use crate::services::CanvasServices;

/// Image Generation Executor
///
/// # Inputs (from source nodes)
/// - text-editor / instruction text, joined by blank lines, as the prompt
/// - the first image source's `imageUrl` as a reference
///
/// At least one of the two must be present.
pub struct ImageExecutor {
    services: CanvasServices,
}

impl ImageExecutor {
    pub fn new(services: CanvasServices) -> Self {
        Self { services }
    }
}

/// Prompt built from text-bearing sources in edge order
pub(crate) fn collect_prompt(ctx: &ExecutionContext, types: &[NodeType]) -> String {
    ctx.source_nodes()
        .iter()
        .filter(|n| types.contains(&n.node_type()))
        .filter_map(|n| n.data.text())
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .collect::<Vec<_>>()
        .join("\n\n")
}

#[async_trait]
impl NodeExecutor for ImageExecutor {
    fn handles(&self) -> NodeType {
        NodeType::Image
    }

    async fn run(&self, ctx: &ExecutionContext) -> Result<ExecutionOutcome> {
        let node = ctx.current_node();
        let prompt = collect_prompt(ctx, &[NodeType::TextEditor, NodeType::Instruction]);
        let reference = ctx
            .first_source_of(NodeType::Image)
            .and_then(|n| match &n.data {
                NodeData::Image(data) => data.image_url.clone(),
                _ => None,
            });

        if prompt.is_empty() && reference.is_none() {
            return Err(CanvasEngineError::MissingInput(
                "image generation needs a text prompt or a rendered reference image".to_string(),
            ));
        }

        let style = node.image_style().unwrap_or_default();
        log::debug!(
            "ImageExecutor {}: generating ({} chars prompt, style {:?}, reference: {})",
            node.id,
            prompt.len(),
            style,
            reference.is_some()
        );

        let image_url = self
            .services
            .call(self.services.images.generate(&prompt, style, reference.as_deref()))
            .await?;
        ctx.checkpoint()?;

        ctx.replace_current(|current| {
            let mut updated = current.clone();
            match &mut updated.data {
                NodeData::Image(data) if data.is_locked => {
                    return Err(CanvasEngineError::NodeLocked(current.id.clone()))
                }
                NodeData::Image(data) => data.image_url = Some(image_url),
                _ => {
                    return Err(CanvasEngineError::WrongNodeType {
                        node_id: current.id.clone(),
                        node_type: current.node_type(),
                    })
                }
            }
            Ok(updated)
        })?;

        log::info!("ImageExecutor {}: image written", node.id);
        Ok(ExecutionOutcome::Updated {
            node_id: node.id.clone(),
        })
    }
}
