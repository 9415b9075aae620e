//! Processing nodes
//!
//! Nodes that generate content onto themselves from their inputs.

mod image_generation;
mod speech_synthesis;
mod text_generation;

pub use image_generation::ImageExecutor;
pub use speech_synthesis::SpeechExecutor;
pub use text_generation::TextExecutor;
