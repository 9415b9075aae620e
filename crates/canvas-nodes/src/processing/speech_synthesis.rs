//! Speech Synthesis Executor
//!
//! Speaks the text of upstream text-editor nodes. The audio is stored by the
//! speech collaborator in its own side-record keyed by node id; the speech
//! node's payload does not change.
//!
//! A stop is only honoured before the collaborator is called. Once it
//! returns, the audio is already stored, so the run reports it as generated.

use async_trait::async_trait;
use canvas_engine::{
    CanvasEngineError, ExecutionContext, ExecutionOutcome, NodeExecutor, NodeType, Result,
};

use super::image_generation::collect_prompt;
use crate::services::CanvasServices;

pub struct SpeechExecutor {
    services: CanvasServices,
}

impl SpeechExecutor {
    pub fn new(services: CanvasServices) -> Self {
        Self { services }
    }
}

#[async_trait]
impl NodeExecutor for SpeechExecutor {
    fn handles(&self) -> NodeType {
        NodeType::Speech
    }

    async fn run(&self, ctx: &ExecutionContext) -> Result<ExecutionOutcome> {
        let node = ctx.current_node();
        let text = collect_prompt(ctx, &[NodeType::TextEditor]);
        if text.is_empty() {
            return Err(CanvasEngineError::MissingInput(
                "speech needs text from a connected text node".to_string(),
            ));
        }

        ctx.checkpoint()?;
        log::debug!("SpeechExecutor {}: synthesizing {} chars", node.id, text.len());
        let audio = self
            .services
            .call(self.services.speech.synthesize(&node.id, &text))
            .await?;
        if ctx.is_cancelled() {
            log::warn!("SpeechExecutor {}: stop arrived after audio was stored", node.id);
        }

        log::info!("SpeechExecutor {}: audio stored as {}", node.id, audio);
        Ok(ExecutionOutcome::Generated {
            node_id: node.id.clone(),
            output: audio,
        })
    }
}
