//! Test doubles for the collaborator services

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use canvas_engine::{
    CanvasEngine, EngineConfig, GraphSnapshot, GraphStore, IdGenerator, ImageStyle, NodeId,
    NodeSynthesizer, NodeType,
};
use tokio::sync::{Barrier, Notify};

use crate::config::ExecutorConfig;
use crate::services::{
    CanvasServices, ImageGenerator, OutputTypeClassifier, ServiceError, SpeechSynthesizer,
    TextGenerator, TextInputs,
};
use crate::setup::builtin_registry;

/// Node ids `gen-1`, `gen-2`, ... with a count of how many were issued
#[derive(Default)]
pub struct CountingIds(AtomicUsize);

impl CountingIds {
    pub fn issued(&self) -> usize {
        self.0.load(Ordering::SeqCst)
    }
}

impl IdGenerator for CountingIds {
    fn next_id(&self) -> NodeId {
        format!("gen-{}", self.0.fetch_add(1, Ordering::SeqCst) + 1)
    }
}

/// Answers every classification with a fixed type and records the calls
pub struct ScriptedClassifier {
    answer: String,
    calls: Mutex<Vec<(String, Vec<NodeType>)>>,
}

impl ScriptedClassifier {
    pub fn answering(answer: &str) -> Self {
        Self {
            answer: answer.to_string(),
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn calls(&self) -> Vec<(String, Vec<NodeType>)> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl OutputTypeClassifier for ScriptedClassifier {
    async fn classify(&self, instruction: &str, input_types: &[NodeType]) -> Result<String, ServiceError> {
        self.calls
            .lock()
            .unwrap()
            .push((instruction.to_string(), input_types.to_vec()));
        Ok(self.answer.clone())
    }
}

/// Always unavailable
pub struct FailingClassifier;

#[async_trait]
impl OutputTypeClassifier for FailingClassifier {
    async fn classify(&self, _instruction: &str, _input_types: &[NodeType]) -> Result<String, ServiceError> {
        Err(ServiceError::Unavailable("classifier offline".to_string()))
    }
}

/// Holds every caller until `n` calls are in flight
pub struct BarrierClassifier {
    barrier: Barrier,
    answer: String,
}

impl BarrierClassifier {
    pub fn new(n: usize, answer: &str) -> Self {
        Self {
            barrier: Barrier::new(n),
            answer: answer.to_string(),
        }
    }
}

#[async_trait]
impl OutputTypeClassifier for BarrierClassifier {
    async fn classify(&self, _instruction: &str, _input_types: &[NodeType]) -> Result<String, ServiceError> {
        self.barrier.wait().await;
        Ok(self.answer.clone())
    }
}

/// Signals `started`, then answers "image" once `release` is notified
#[derive(Default)]
pub struct SlowClassifier {
    pub started: Notify,
    pub release: Notify,
}

#[async_trait]
impl OutputTypeClassifier for SlowClassifier {
    async fn classify(&self, _instruction: &str, _input_types: &[NodeType]) -> Result<String, ServiceError> {
        self.started.notify_one();
        self.release.notified().await;
        Ok("image".to_string())
    }
}

type ImageCall = (String, ImageStyle, Option<String>);

/// Returns a fixed URL (or fails) and records the calls
pub struct RecordingImages {
    result: Result<String, ServiceError>,
    calls: Mutex<Vec<ImageCall>>,
}

impl RecordingImages {
    pub fn returning(url: &str) -> Self {
        Self {
            result: Ok(url.to_string()),
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn failing() -> Self {
        Self {
            result: Err(ServiceError::Status {
                status: 503,
                message: "renderer busy".to_string(),
            }),
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn calls(&self) -> Vec<ImageCall> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl ImageGenerator for RecordingImages {
    async fn generate(
        &self,
        prompt: &str,
        style: ImageStyle,
        reference_url: Option<&str>,
    ) -> Result<String, ServiceError> {
        self.calls.lock().unwrap().push((
            prompt.to_string(),
            style,
            reference_url.map(str::to_string),
        ));
        self.result.clone()
    }
}

/// Returns `audio/{node_id}.mp3`, optionally waiting for `release` first
#[derive(Default)]
pub struct RecordingSpeech {
    gated: bool,
    pub started: Notify,
    pub release: Notify,
    calls: Mutex<Vec<(String, String)>>,
}

impl RecordingSpeech {
    pub fn gated() -> Self {
        Self {
            gated: true,
            ..Self::default()
        }
    }

    pub fn calls(&self) -> Vec<(String, String)> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl SpeechSynthesizer for RecordingSpeech {
    async fn synthesize(&self, node_id: &str, text: &str) -> Result<String, ServiceError> {
        self.calls
            .lock()
            .unwrap()
            .push((node_id.to_string(), text.to_string()));
        if self.gated {
            self.started.notify_one();
            self.release.notified().await;
        }
        Ok(format!("audio/{}.mp3", node_id))
    }
}

/// Returns fixed text, optionally waiting for `release` first
pub struct ScriptedText {
    output: String,
    gated: bool,
    pub started: Notify,
    pub release: Notify,
    calls: Mutex<Vec<TextInputs>>,
}

impl ScriptedText {
    pub fn returning(output: impl Into<String>) -> Self {
        Self {
            output: output.into(),
            gated: false,
            started: Notify::new(),
            release: Notify::new(),
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn gated(output: impl Into<String>) -> Self {
        Self {
            gated: true,
            ..Self::returning(output)
        }
    }

    pub fn calls(&self) -> Vec<TextInputs> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl TextGenerator for ScriptedText {
    async fn generate(&self, inputs: &TextInputs) -> Result<String, ServiceError> {
        self.calls.lock().unwrap().push(inputs.clone());
        if self.gated {
            self.started.notify_one();
            self.release.notified().await;
        }
        Ok(self.output.clone())
    }
}

/// Services around `classifier` with working defaults for the rest
pub fn services(classifier: Arc<dyn OutputTypeClassifier>) -> CanvasServices {
    CanvasServices {
        classifier,
        images: Arc::new(RecordingImages::returning("https://cdn/generated.png")),
        speech: Arc::new(RecordingSpeech::default()),
        text: Arc::new(ScriptedText::returning("generated text")),
        config: ExecutorConfig::default(),
    }
}

/// Engine over `graph` with the built-in executors and counted node ids
pub fn engine_with(graph: GraphSnapshot, services: CanvasServices, ids: Arc<CountingIds>) -> CanvasEngine {
    let config = EngineConfig::default();
    let store = GraphStore::with_snapshot(graph, &config).unwrap();
    CanvasEngine::new(
        Arc::new(store),
        builtin_registry(services),
        NodeSynthesizer::with_id_generator(config.layout.clone(), ids),
    )
    .unwrap()
}
