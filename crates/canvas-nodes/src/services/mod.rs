//! External collaborators called by the executors
//!
//! Classification and generation happen outside the engine. Each service is
//! an async trait so hosts can plug in HTTP clients, local models or test
//! doubles. Every call an executor makes goes through
//! [`CanvasServices::call`], which applies the configured deadline.

mod http;

use std::future::Future;
use std::sync::Arc;

use async_trait::async_trait;
use canvas_engine::{CanvasEngineError, ImageStyle, NodeType};
use thiserror::Error;

use crate::config::ExecutorConfig;

pub use http::{HttpOutputTypeClassifier, HttpTextGenerator};

/// Errors reported by collaborators
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ServiceError {
    /// The service could not be reached
    #[error("Service unavailable: {0}")]
    Unavailable(String),

    /// The call did not finish within the deadline
    #[error("Service call timed out after {0} ms")]
    Timeout(u64),

    /// The service answered with an error status
    #[error("Service error ({status}): {message}")]
    Status { status: u16, message: String },

    /// The answer could not be understood
    #[error("Invalid service response: {0}")]
    InvalidResponse(String),
}

impl From<ServiceError> for CanvasEngineError {
    fn from(error: ServiceError) -> Self {
        CanvasEngineError::Collaborator(error.to_string())
    }
}

/// Decides what kind of node an instruction should produce
#[async_trait]
pub trait OutputTypeClassifier: Send + Sync {
    /// Classify `instruction` given the types of its inputs.
    ///
    /// Returns the raw type answer; the caller normalises it.
    async fn classify(&self, instruction: &str, input_types: &[NodeType]) -> Result<String, ServiceError>;
}

/// Renders images
#[async_trait]
pub trait ImageGenerator: Send + Sync {
    /// Returns a handle (URL) to the rendered image
    async fn generate(
        &self,
        prompt: &str,
        style: ImageStyle,
        reference_url: Option<&str>,
    ) -> Result<String, ServiceError>;
}

/// Synthesizes speech and records it in the speech side-record
#[async_trait]
pub trait SpeechSynthesizer: Send + Sync {
    /// Returns a handle to the stored audio
    async fn synthesize(&self, node_id: &str, text: &str) -> Result<String, ServiceError>;
}

/// Inputs gathered for text generation
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TextInputs {
    pub texts: Vec<String>,
    pub image_urls: Vec<String>,
}

impl TextInputs {
    pub fn is_empty(&self) -> bool {
        self.texts.is_empty() && self.image_urls.is_empty()
    }
}

/// Generates text
#[async_trait]
pub trait TextGenerator: Send + Sync {
    async fn generate(&self, inputs: &TextInputs) -> Result<String, ServiceError>;
}

/// The full set of collaborators the built-in executors need
#[derive(Clone)]
pub struct CanvasServices {
    pub classifier: Arc<dyn OutputTypeClassifier>,
    pub images: Arc<dyn ImageGenerator>,
    pub speech: Arc<dyn SpeechSynthesizer>,
    pub text: Arc<dyn TextGenerator>,
    pub config: ExecutorConfig,
}

impl CanvasServices {
    /// Await a collaborator call under the configured deadline
    pub async fn call<T, F>(&self, call: F) -> Result<T, ServiceError>
    where
        F: Future<Output = Result<T, ServiceError>>,
    {
        match tokio::time::timeout(self.config.collaborator_timeout(), call).await {
            Ok(result) => result,
            Err(_) => Err(ServiceError::Timeout(self.config.collaborator_timeout_ms)),
        }
    }
}

/// Turn a raw classifier answer into a node type.
///
/// `texteditor` is accepted as the text-editor tag; every other answer must
/// be a known wire name.
pub fn normalize_output_type(raw: &str) -> Result<NodeType, CanvasEngineError> {
    let raw = raw.trim();
    if raw == "texteditor" {
        return Ok(NodeType::TextEditor);
    }
    raw.parse()
}
