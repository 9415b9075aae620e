//! Text Generation Executor
//!
//! Generates text for a text-editor node from its upstream text and images
//! and writes it into the node.

use async_trait::async_trait;
use canvas_engine::{
    text_length, CanvasEngineError, ExecutionContext, ExecutionOutcome, NodeData, NodeExecutor,
    NodeType, Result,
};

use crate::services::{CanvasServices, TextInputs};

/// Text Generation Executor
///
/// # Inputs (from source nodes)
/// - text of text-editor and instruction sources, in edge order
/// - `imageUrl` of rendered image sources
///
/// Results longer than the configured text limit are rejected.
pub struct TextExecutor {
    services: CanvasServices,
}

impl TextExecutor {
    pub fn new(services: CanvasServices) -> Self {
        Self { services }
    }
}

fn gather_inputs(ctx: &ExecutionContext) -> TextInputs {
    let mut inputs = TextInputs::default();
    for source in ctx.source_nodes() {
        match &source.data {
            NodeData::TextEditor(data) | NodeData::Instruction(data) => {
                let text = data.text.trim();
                if !text.is_empty() {
                    inputs.texts.push(text.to_string());
                }
            }
            NodeData::Image(data) => {
                if let Some(url) = &data.image_url {
                    inputs.image_urls.push(url.clone());
                }
            }
            NodeData::Speech(_) | NodeData::Comment(_) => {}
        }
    }
    inputs
}

#[async_trait]
impl NodeExecutor for TextExecutor {
    fn handles(&self) -> NodeType {
        NodeType::TextEditor
    }

    async fn run(&self, ctx: &ExecutionContext) -> Result<ExecutionOutcome> {
        let node = ctx.current_node();
        let inputs = gather_inputs(ctx);
        if inputs.is_empty() {
            return Err(CanvasEngineError::MissingInput(
                "text generation needs connected text or a rendered image".to_string(),
            ));
        }

        log::debug!(
            "TextExecutor {}: generating from {} texts and {} images",
            node.id,
            inputs.texts.len(),
            inputs.image_urls.len()
        );
        let generated = self
            .services
            .call(self.services.text.generate(&inputs))
            .await?;
        ctx.checkpoint()?;

        let max = ctx.limits().max_text_length;
        let actual = text_length(&generated);
        if actual > max {
            return Err(CanvasEngineError::ContentLimit { max, actual });
        }

        ctx.replace_current(|current| {
            if current.is_locked() {
                return Err(CanvasEngineError::NodeLocked(current.id.clone()));
            }
            let mut updated = current.clone();
            match updated.data.text_mut() {
                Some(text) => *text = generated,
                None => {
                    return Err(CanvasEngineError::WrongNodeType {
                        node_id: current.id.clone(),
                        node_type: current.node_type(),
                    })
                }
            }
            Ok(updated)
        })?;

        log::info!("TextExecutor {}: wrote {} chars", node.id, actual);
        Ok(ExecutionOutcome::Updated {
            node_id: node.id.clone(),
        })
    }
}
