//! Registry setup for host applications.
//!
//! Hosts call [`builtin_registry`] at startup with their collaborators and
//! hand the result to `CanvasEngine::new`. The registry it returns always
//! passes validation: one executor per runnable node type.

use std::sync::Arc;

use canvas_engine::{CanvasEngine, EngineConfig, NodeRegistry, Result};

use crate::control::InstructionExecutor;
use crate::processing::{ImageExecutor, SpeechExecutor, TextExecutor};
use crate::services::CanvasServices;

/// Build the registry of built-in executors.
///
/// # Example
///
/// ```ignore
/// let registry = canvas_nodes::builtin_registry(services);
/// let engine = CanvasEngine::from_config(&config, registry)?;
/// ```
pub fn builtin_registry(services: CanvasServices) -> NodeRegistry {
    let mut registry = NodeRegistry::new();
    registry.register(Arc::new(InstructionExecutor::new(services.clone())));
    registry.register(Arc::new(ImageExecutor::new(services.clone())));
    registry.register(Arc::new(SpeechExecutor::new(services.clone())));
    registry.register(Arc::new(TextExecutor::new(services)));
    registry
}

/// Assemble an engine with an empty graph and the built-in executors
pub fn builtin_engine(config: &EngineConfig, services: CanvasServices) -> Result<CanvasEngine> {
    let engine = CanvasEngine::from_config(config, builtin_registry(services))?;
    log::info!("Canvas engine ready");
    Ok(engine)
}
