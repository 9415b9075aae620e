//! Event types for reporting run progress
//!
//! Events are sent from the engine to the canvas (or any consumer)
//! to report run lifecycle and graph changes made by executors.

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;

use crate::types::{EdgeId, NodeId, NodeType};

/// Where the engine reports run progress
pub trait EventSink: Send + Sync {
    fn send(&self, event: CanvasEvent) -> Result<(), EventError>;
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum EventError {
    #[error("event receiver dropped")]
    Closed,
}

/// Events emitted while running nodes
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum CanvasEvent {
    /// A node run was admitted and dispatched
    #[serde(rename_all = "camelCase")]
    RunStarted {
        node_id: NodeId,
        execution_id: String,
        node_type: NodeType,
    },

    /// A node run finished and committed its result
    #[serde(rename_all = "camelCase")]
    RunCompleted { node_id: NodeId, execution_id: String },

    /// A node run failed; the graph was left untouched
    #[serde(rename_all = "camelCase")]
    RunFailed {
        node_id: NodeId,
        execution_id: String,
        error: String,
    },

    /// A node run was stopped at a checkpoint
    #[serde(rename_all = "camelCase")]
    RunCancelled { node_id: NodeId, execution_id: String },

    /// A run appended a new node and its connecting edge
    #[serde(rename_all = "camelCase")]
    NodeSynthesized {
        origin_id: NodeId,
        node_id: NodeId,
        edge_id: EdgeId,
        node_type: NodeType,
    },

    /// A run wrote its result back onto an existing node
    #[serde(rename_all = "camelCase")]
    NodeUpdated { node_id: NodeId },
}

/// Discards every event
pub struct NullEventSink;

impl EventSink for NullEventSink {
    fn send(&self, _event: CanvasEvent) -> Result<(), EventError> {
        Ok(())
    }
}

/// Forwards events to the canvas over an unbounded channel
pub struct ChannelEventSink(mpsc::UnboundedSender<CanvasEvent>);

impl ChannelEventSink {
    pub fn new() -> (Self, mpsc::UnboundedReceiver<CanvasEvent>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self(tx), rx)
    }
}

impl EventSink for ChannelEventSink {
    fn send(&self, event: CanvasEvent) -> Result<(), EventError> {
        self.0.send(event).map_err(|_| EventError::Closed)
    }
}

/// Collects events in memory
#[derive(Default)]
pub struct VecEventSink {
    events: Mutex<Vec<CanvasEvent>>,
}

impl VecEventSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> Vec<CanvasEvent> {
        self.events.lock().clone()
    }
}

impl EventSink for VecEventSink {
    fn send(&self, event: CanvasEvent) -> Result<(), EventError> {
        self.events.lock().push(event);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_channel_sink_forwards_until_receiver_drops() {
        let (sink, mut rx) = ChannelEventSink::new();
        let event = CanvasEvent::NodeUpdated {
            node_id: "n1".to_string(),
        };

        sink.send(event.clone()).unwrap();
        assert_eq!(rx.recv().await, Some(event.clone()));

        drop(rx);
        assert_eq!(sink.send(event), Err(EventError::Closed));
    }

    #[test]
    fn test_event_serialization() {
        let event = CanvasEvent::RunStarted {
            node_id: "n1".to_string(),
            execution_id: "x".to_string(),
            node_type: NodeType::TextEditor,
        };
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["type"], "runStarted");
        assert_eq!(json["nodeId"], "n1");
        assert_eq!(json["nodeType"], "textEditor");
    }
}
