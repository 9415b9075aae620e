//! Canvas Engine - node-graph execution for the AI canvas
//!
//! Users compose AI processing steps as typed nodes joined by edges. This
//! crate decides whether a node may run, dispatches it to the executor for
//! its type, hands that executor its resolved upstream inputs, and commits
//! the result (a new synthesized node, or an update to the node itself)
//! back into the shared graph.
//!
//! # Architecture
//!
//! - `GraphStore`: sole owner of the node and edge collections; every
//!   commit swaps in a new immutable snapshot
//! - `evaluate`: pure executability check with a reason for the canvas
//! - `NodeRegistry`: exactly one `NodeExecutor` per runnable node type
//! - `ExecutionContext`: per-attempt view of the target node, its source
//!   nodes and bounded store accessors
//! - `NodeSynthesizer`: builds the node and edge a run appends
//! - `CanvasEngine`: the `run`/`stop` entry points
//!
//! Executors live in the `canvas-nodes` crate.
//!
//! # Example
//!
//! ```ignore
//! use canvas_engine::{CanvasEngine, EngineConfig};
//!
//! let engine = CanvasEngine::from_config(&EngineConfig::default(), registry)?;
//! match engine.run("instruction-1").await {
//!     Ok(outcome) => println!("{:?}", outcome.outcome),
//!     Err(failure) => println!("run failed: {}", failure.message),
//! }
//! ```

pub mod config;
pub mod constants;
pub mod context;
pub mod engine;
pub mod error;
pub mod evaluator;
pub mod events;
pub mod history;
pub mod persistence;
pub mod registry;
pub mod store;
pub mod synthesizer;
pub mod types;
pub mod validation;

// Re-export key types
pub use config::{EngineConfig, LayoutConfig, LimitsConfig};
pub use context::{resolve_source_nodes, CancellationFlag, ExecutionContext};
pub use engine::{CanvasEngine, FailureKind, RunFailure, RunOutcome};
pub use error::{CanvasEngineError, Result};
pub use evaluator::{evaluate, evaluate_in, evaluate_with_state, Executability};
pub use events::{CanvasEvent, ChannelEventSink, EventError, EventSink, NullEventSink, VecEventSink};
pub use history::{CommitCause, CommitLog, EditAction};
pub use persistence::{FilePersistence, GraphDocument, GraphPersistence, MemoryPersistence};
pub use registry::{ExecutionOutcome, NodeExecutor, NodeRegistry};
pub use store::GraphStore;
pub use synthesizer::{IdGenerator, NodeSynthesizer, Synthesis, UuidGenerator};
pub use types::{
    seed_graph, CanvasEdge, CanvasNode, EdgeId, EdgeType, GraphSnapshot, ImageData, ImageStyle,
    NodeData, NodeId, NodeType, Position, SpeechData, TextData,
};
pub use validation::{text_length, validate_graph, ValidationError};
