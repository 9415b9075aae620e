//! Run entry point
//!
//! [`CanvasEngine::run`] is the single entry point the canvas calls when the
//! user triggers a node. It gates the run on executability, marks the node
//! running, builds the execution context, dispatches to the registered
//! executor and reports a plain success/failure outcome. Errors from nested
//! collaborator calls never escape it.

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::config::EngineConfig;
use crate::context::{CancellationFlag, ExecutionContext};
use crate::error::CanvasEngineError;
use crate::evaluator::{evaluate_in, Executability};
use crate::events::{CanvasEvent, EventSink, NullEventSink};
use crate::registry::{ExecutionOutcome, NodeRegistry};
use crate::store::GraphStore;
use crate::synthesizer::NodeSynthesizer;
use crate::types::NodeType;

/// A completed run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RunOutcome {
    pub execution_id: String,
    pub outcome: ExecutionOutcome,
}

/// Why a run did not complete
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum FailureKind {
    /// Preconditions not met; nothing was attempted
    NotExecutable,
    /// The executor or one of its collaborators failed
    Failed,
    /// Stopped by the user at a checkpoint
    Cancelled,
}

/// A run that did not complete. The graph is unchanged.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, thiserror::Error)]
#[serde(rename_all = "camelCase")]
#[error("{kind:?}: {message}")]
pub struct RunFailure {
    pub kind: FailureKind,
    pub message: String,
}

impl RunFailure {
    fn not_executable(reason: impl Into<String>) -> Self {
        Self {
            kind: FailureKind::NotExecutable,
            message: reason.into(),
        }
    }
}

impl From<CanvasEngineError> for RunFailure {
    fn from(error: CanvasEngineError) -> Self {
        let kind = match error {
            CanvasEngineError::Cancelled => FailureKind::Cancelled,
            _ => FailureKind::Failed,
        };
        Self {
            kind,
            message: error.to_string(),
        }
    }
}

/// Clears the running indicator however the run ends, including when the
/// run future is dropped mid-flight
struct RunGuard<'a> {
    store: &'a GraphStore,
    node_id: String,
    execution_id: String,
}

impl Drop for RunGuard<'_> {
    fn drop(&mut self) {
        self.store.finish_run(&self.node_id, &self.execution_id);
    }
}

/// The node-graph execution engine
pub struct CanvasEngine {
    store: Arc<GraphStore>,
    registry: Arc<NodeRegistry>,
    synthesizer: Arc<NodeSynthesizer>,
    events: Arc<dyn EventSink>,
}

impl CanvasEngine {
    /// Assemble an engine, validating the registry up front.
    ///
    /// An incomplete or ambiguous registry is a configuration fault and
    /// fails here rather than at run time.
    pub fn new(
        store: Arc<GraphStore>,
        registry: NodeRegistry,
        synthesizer: NodeSynthesizer,
    ) -> crate::error::Result<Self> {
        registry.validate()?;
        Ok(Self {
            store,
            registry: Arc::new(registry),
            synthesizer: Arc::new(synthesizer),
            events: Arc::new(NullEventSink),
        })
    }

    /// Empty store and UUID node ids, from configuration
    pub fn from_config(config: &EngineConfig, registry: NodeRegistry) -> crate::error::Result<Self> {
        Self::new(
            Arc::new(GraphStore::new(config)),
            registry,
            NodeSynthesizer::new(config.layout.clone()),
        )
    }

    /// Report run progress to `events`
    pub fn with_event_sink(mut self, events: Arc<dyn EventSink>) -> Self {
        self.events = events;
        self
    }

    pub fn store(&self) -> &Arc<GraphStore> {
        &self.store
    }

    /// Whether `node_id` may be run right now
    pub fn evaluate_executability(&self, node_id: &str) -> Executability {
        let snapshot = self.store.snapshot();
        match snapshot.find_node(node_id) {
            Some(node) => evaluate_in(&snapshot, node, self.store.is_running(node_id)),
            None => Executability::blocked(format!("Node not found: {}", node_id)),
        }
    }

    /// Run one node.
    ///
    /// On any failure the node and edge collections are left exactly as they
    /// were and the running indicator is cleared.
    pub async fn run(&self, node_id: &str) -> Result<RunOutcome, RunFailure> {
        let snapshot = self.store.snapshot();
        let node = snapshot
            .find_node(node_id)
            .ok_or_else(|| RunFailure::not_executable(format!("Node not found: {}", node_id)))?;

        let check = evaluate_in(&snapshot, node, self.store.is_running(node_id));
        if !check.executable {
            let reason = check.reason.unwrap_or_default();
            log::debug!("Node '{}' not executable: {}", node_id, reason);
            return Err(RunFailure::not_executable(reason));
        }

        let node_type = node.node_type();
        let execution_id = uuid::Uuid::new_v4().to_string();
        let cancel = self
            .store
            .begin_run(node_id, &execution_id)
            .ok_or_else(|| RunFailure::not_executable(crate::evaluator::REASON_RUNNING))?;
        let _guard = RunGuard {
            store: &self.store,
            node_id: node_id.to_string(),
            execution_id: execution_id.clone(),
        };

        log::debug!("Running {} node '{}' ({})", node_type, node_id, execution_id);
        self.emit(CanvasEvent::RunStarted {
            node_id: node_id.to_string(),
            execution_id: execution_id.clone(),
            node_type,
        });

        match self.execute(node_id, &execution_id, cancel).await {
            Ok(outcome) => {
                log::info!("Node '{}' completed: {:?}", node_id, outcome);
                self.emit_outcome(node_id, &outcome);
                self.emit(CanvasEvent::RunCompleted {
                    node_id: node_id.to_string(),
                    execution_id: execution_id.clone(),
                });
                Ok(RunOutcome {
                    execution_id,
                    outcome,
                })
            }
            Err(CanvasEngineError::Cancelled) => {
                log::warn!("Node '{}' stopped before committing", node_id);
                self.emit(CanvasEvent::RunCancelled {
                    node_id: node_id.to_string(),
                    execution_id,
                });
                Err(CanvasEngineError::Cancelled.into())
            }
            Err(e) => {
                log::error!("Node '{}' ({}) failed: {}", node_id, node_type, e);
                self.emit(CanvasEvent::RunFailed {
                    node_id: node_id.to_string(),
                    execution_id,
                    error: e.to_string(),
                });
                Err(e.into())
            }
        }
    }

    /// Ask the in-flight run of `node_id` to stop.
    ///
    /// Cancellation is cooperative: an external call already under way is
    /// not aborted, but its result is discarded at the next checkpoint and
    /// nothing is committed. Returns false if the node is not running.
    pub fn stop(&self, node_id: &str) -> bool {
        let stopped = self.store.request_stop(node_id);
        if stopped {
            log::info!("Stop requested for node '{}'", node_id);
        }
        stopped
    }

    async fn execute(
        &self,
        node_id: &str,
        execution_id: &str,
        cancel: CancellationFlag,
    ) -> crate::error::Result<ExecutionOutcome> {
        let ctx = ExecutionContext::build(
            self.store.clone(),
            node_id,
            self.synthesizer.clone(),
            cancel,
            execution_id,
        )?;
        let executor = self.registry.select(&ctx)?;
        let outcome = executor.run(&ctx).await?;
        Ok(outcome)
    }

    fn emit_outcome(&self, origin_id: &str, outcome: &ExecutionOutcome) {
        match outcome {
            ExecutionOutcome::Synthesized {
                node_id,
                edge_id,
                node_type,
            } => self.emit(CanvasEvent::NodeSynthesized {
                origin_id: origin_id.to_string(),
                node_id: node_id.clone(),
                edge_id: edge_id.clone(),
                node_type: *node_type,
            }),
            ExecutionOutcome::Updated { node_id } => self.emit(CanvasEvent::NodeUpdated {
                node_id: node_id.clone(),
            }),
            ExecutionOutcome::Generated { .. } => {}
        }
    }

    fn emit(&self, event: CanvasEvent) {
        if let Err(e) = self.events.send(event) {
            log::warn!("Failed to send canvas event: {}", e);
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::AtomicUsize;

    use async_trait::async_trait;
    use tokio::sync::Notify;

    use super::*;
    use crate::evaluator::{REASON_COMMENT, REASON_RUNNING};
    use crate::events::VecEventSink;
    use crate::registry::tests::StubExecutor;
    use crate::registry::NodeExecutor;
    use crate::synthesizer::tests::SequentialIds;
    use crate::types::{CanvasEdge, CanvasNode, GraphSnapshot, NodeData, Position, TextData};

    /// Instruction executor that always synthesizes an image node
    struct AppendImage;

    #[async_trait]
    impl NodeExecutor for AppendImage {
        fn handles(&self) -> NodeType {
            NodeType::Instruction
        }

        async fn run(&self, ctx: &ExecutionContext) -> crate::error::Result<ExecutionOutcome> {
            let synthesis = ctx
                .synthesizer()
                .synthesize(NodeType::Image, ctx.current_node(), None);
            let outcome = ExecutionOutcome::Synthesized {
                node_id: synthesis.node.id.clone(),
                edge_id: synthesis.edge.id.clone(),
                node_type: NodeType::Image,
            };
            ctx.commit_synthesis(synthesis)?;
            Ok(outcome)
        }
    }

    /// Waits for a release signal between start and commit
    struct Gated {
        started: Arc<Notify>,
        release: Arc<Notify>,
    }

    #[async_trait]
    impl NodeExecutor for Gated {
        fn handles(&self) -> NodeType {
            NodeType::Instruction
        }

        async fn run(&self, ctx: &ExecutionContext) -> crate::error::Result<ExecutionOutcome> {
            self.started.notify_one();
            self.release.notified().await;
            ctx.checkpoint()?;
            let synthesis = ctx
                .synthesizer()
                .synthesize(NodeType::TextEditor, ctx.current_node(), None);
            let outcome = ExecutionOutcome::Synthesized {
                node_id: synthesis.node.id.clone(),
                edge_id: synthesis.edge.id.clone(),
                node_type: NodeType::TextEditor,
            };
            ctx.commit_synthesis(synthesis)?;
            Ok(outcome)
        }
    }

    struct Failing;

    #[async_trait]
    impl NodeExecutor for Failing {
        fn handles(&self) -> NodeType {
            NodeType::Instruction
        }

        async fn run(&self, _ctx: &ExecutionContext) -> crate::error::Result<ExecutionOutcome> {
            Err(CanvasEngineError::collaborator("classifier unavailable"))
        }
    }

    fn registry_with(instruction: Arc<dyn NodeExecutor>) -> NodeRegistry {
        let mut registry = NodeRegistry::new();
        registry.register(instruction);
        for node_type in [NodeType::TextEditor, NodeType::Image, NodeType::Speech] {
            registry.register(Arc::new(StubExecutor(node_type)));
        }
        registry
    }

    fn graph() -> GraphSnapshot {
        GraphSnapshot::new(
            vec![
                CanvasNode::new(
                    "instr",
                    NodeData::Instruction(TextData {
                        text: "draw a lighthouse".to_string(),
                        is_locked: false,
                    }),
                    Position::new(100.0, 50.0),
                ),
                CanvasNode::new("note", NodeData::default_for(NodeType::Comment), Position::default()),
                CanvasNode::new("txt", NodeData::default_for(NodeType::TextEditor), Position::default()),
            ],
            vec![CanvasEdge::new("e1", "instr", "txt")],
        )
    }

    fn engine_with(instruction: Arc<dyn NodeExecutor>) -> CanvasEngine {
        let config = EngineConfig::default();
        let store = GraphStore::with_snapshot(graph(), &config).unwrap();
        CanvasEngine::new(
            Arc::new(store),
            registry_with(instruction),
            NodeSynthesizer::with_id_generator(
                config.layout.clone(),
                Arc::new(SequentialIds(AtomicUsize::new(0))),
            ),
        )
        .unwrap()
    }

    #[test]
    fn test_incomplete_registry_rejected_at_assembly() {
        let result = CanvasEngine::from_config(&EngineConfig::default(), NodeRegistry::new());
        assert!(matches!(result, Err(CanvasEngineError::Configuration(_))));
    }

    #[tokio::test]
    async fn test_run_synthesizes_and_emits_events() {
        let _ = env_logger::builder().is_test(true).try_init();
        let events = Arc::new(VecEventSink::new());
        let engine = engine_with(Arc::new(AppendImage)).with_event_sink(events.clone());

        let outcome = engine.run("instr").await.unwrap();
        assert_eq!(
            outcome.outcome,
            ExecutionOutcome::Synthesized {
                node_id: "node-1".to_string(),
                edge_id: "edge-instr-node-1".to_string(),
                node_type: NodeType::Image,
            }
        );

        let snapshot = engine.store().snapshot();
        let created = snapshot.find_node("node-1").unwrap();
        assert_eq!(created.position, Position::new(100.0, 350.0));
        assert_eq!(snapshot.edges.len(), 2);
        assert!(!engine.store().is_running("instr"));

        let events = events.events();
        assert!(matches!(events[0], CanvasEvent::RunStarted { .. }));
        assert!(matches!(events[1], CanvasEvent::NodeSynthesized { .. }));
        assert!(matches!(events[2], CanvasEvent::RunCompleted { .. }));
    }

    #[tokio::test]
    async fn test_not_executable_is_reported_not_raised() {
        let engine = engine_with(Arc::new(AppendImage));
        let before = engine.store().snapshot();

        let failure = engine.run("note").await.unwrap_err();
        assert_eq!(failure.kind, FailureKind::NotExecutable);
        assert_eq!(failure.message, REASON_COMMENT);

        let missing = engine.run("ghost").await.unwrap_err();
        assert_eq!(missing.kind, FailureKind::NotExecutable);
        assert!(engine.store().snapshot().ptr_eq(&before));
    }

    #[tokio::test]
    async fn test_failure_leaves_graph_untouched() {
        let events = Arc::new(VecEventSink::new());
        let engine = engine_with(Arc::new(Failing)).with_event_sink(events.clone());
        let before = engine.store().snapshot();

        let failure = engine.run("instr").await.unwrap_err();
        assert_eq!(failure.kind, FailureKind::Failed);
        assert!(failure.message.contains("classifier unavailable"));
        assert!(failure.to_string().starts_with("Failed: "));
        assert!(engine.store().snapshot().ptr_eq(&before));
        assert!(!engine.store().is_running("instr"));
        assert!(matches!(
            events.events().last(),
            Some(CanvasEvent::RunFailed { .. })
        ));
    }

    #[tokio::test]
    async fn test_stop_discards_result_at_checkpoint() {
        let started = Arc::new(Notify::new());
        let release = Arc::new(Notify::new());
        let engine = Arc::new(engine_with(Arc::new(Gated {
            started: started.clone(),
            release: release.clone(),
        })));
        let before = engine.store().snapshot();

        let runner = engine.clone();
        let handle = tokio::spawn(async move { runner.run("instr").await });
        started.notified().await;

        // A second trigger while in flight is refused
        assert_eq!(
            engine.evaluate_executability("instr").reason.as_deref(),
            Some(REASON_RUNNING)
        );
        let second = engine.run("instr").await.unwrap_err();
        assert_eq!(second.kind, FailureKind::NotExecutable);

        assert!(engine.stop("instr"));
        release.notify_one();

        let failure = handle.await.unwrap().unwrap_err();
        assert_eq!(failure.kind, FailureKind::Cancelled);
        assert!(engine.store().snapshot().ptr_eq(&before));
        assert!(!engine.store().is_running("instr"));
        assert!(!engine.stop("instr"));
    }
}
