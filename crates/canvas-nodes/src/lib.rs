//! Canvas Nodes
//!
//! Executor implementations for the canvas engine, one per runnable node
//! type, plus the collaborator services they call.
//!
//! # Categories
//!
//! - **Control**: Nodes whose output type is decided at run time (instruction)
//! - **Processing**: Nodes that generate content onto themselves (image,
//!   speech, text editor)
//! - **Services**: Classifier and generator traits with HTTP clients

pub mod config;
pub mod control;
pub mod processing;
pub mod services;
pub mod setup;

#[cfg(test)]
pub(crate) mod testing;

// Re-export executors for convenience
pub use config::{ExecutorConfig, HttpServiceConfig};
pub use control::*;
pub use processing::*;
pub use services::{
    normalize_output_type, CanvasServices, HttpOutputTypeClassifier, HttpTextGenerator,
    ImageGenerator, OutputTypeClassifier, ServiceError, SpeechSynthesizer, TextGenerator,
    TextInputs,
};
pub use setup::{builtin_engine, builtin_registry};
