//! Graph persistence collaborator
//!
//! The engine only mutates in-memory state. Saving and loading canvas
//! documents is the surrounding application's job; these implementations
//! give it something to call.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};

use crate::error::{CanvasEngineError, Result};
use crate::types::{CanvasEdge, CanvasNode, GraphSnapshot};

/// The stored form of a canvas graph
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GraphDocument {
    pub nodes: Vec<CanvasNode>,
    pub edges: Vec<CanvasEdge>,
}

impl From<&GraphSnapshot> for GraphDocument {
    fn from(snapshot: &GraphSnapshot) -> Self {
        Self {
            nodes: snapshot.nodes.as_ref().clone(),
            edges: snapshot.edges.as_ref().clone(),
        }
    }
}

impl From<GraphDocument> for GraphSnapshot {
    fn from(document: GraphDocument) -> Self {
        GraphSnapshot::new(document.nodes, document.edges)
    }
}

/// Save and load canvas graphs by id
#[async_trait]
pub trait GraphPersistence: Send + Sync {
    async fn save(&self, graph_id: &str, nodes: &[CanvasNode], edges: &[CanvasEdge]) -> Result<()>;

    /// Load a graph; `None` if nothing was saved under `graph_id`
    async fn load(&self, graph_id: &str) -> Result<Option<GraphSnapshot>>;
}

/// Keeps documents in a map. Useful for tests and ephemeral canvases.
#[derive(Debug, Default)]
pub struct MemoryPersistence {
    graphs: RwLock<HashMap<String, GraphDocument>>,
}

impl MemoryPersistence {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.graphs.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.graphs.read().is_empty()
    }
}

#[async_trait]
impl GraphPersistence for MemoryPersistence {
    async fn save(&self, graph_id: &str, nodes: &[CanvasNode], edges: &[CanvasEdge]) -> Result<()> {
        self.graphs.write().insert(
            graph_id.to_string(),
            GraphDocument {
                nodes: nodes.to_vec(),
                edges: edges.to_vec(),
            },
        );
        Ok(())
    }

    async fn load(&self, graph_id: &str) -> Result<Option<GraphSnapshot>> {
        Ok(self.graphs.read().get(graph_id).cloned().map(Into::into))
    }
}

/// One pretty-printed JSON document per graph in a directory.
///
/// The directory is created on first save.
#[derive(Debug, Clone)]
pub struct FilePersistence {
    root: PathBuf,
}

impl FilePersistence {
    pub fn new(root: impl AsRef<Path>) -> Self {
        Self {
            root: root.as_ref().to_path_buf(),
        }
    }

    fn path_for(&self, graph_id: &str) -> Result<PathBuf> {
        let valid = !graph_id.is_empty()
            && graph_id
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_');
        if !valid {
            return Err(CanvasEngineError::Io(std::io::Error::new(
                std::io::ErrorKind::InvalidInput,
                format!("invalid graph id '{}'", graph_id),
            )));
        }
        Ok(self.root.join(format!("{}.json", graph_id)))
    }
}

#[async_trait]
impl GraphPersistence for FilePersistence {
    async fn save(&self, graph_id: &str, nodes: &[CanvasNode], edges: &[CanvasEdge]) -> Result<()> {
        let path = self.path_for(graph_id)?;
        tokio::fs::create_dir_all(&self.root).await?;

        let document = GraphDocument {
            nodes: nodes.to_vec(),
            edges: edges.to_vec(),
        };
        let json = serde_json::to_string_pretty(&document)?;
        tokio::fs::write(&path, json).await?;

        log::debug!("Saved graph '{}' to {:?}", graph_id, path);
        Ok(())
    }

    async fn load(&self, graph_id: &str) -> Result<Option<GraphSnapshot>> {
        let path = self.path_for(graph_id)?;
        if !tokio::fs::try_exists(&path).await? {
            return Ok(None);
        }
        let content = tokio::fs::read_to_string(&path).await?;
        let document: GraphDocument = serde_json::from_str(&content)?;
        Ok(Some(document.into()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{seed_graph, NodeData, NodeType, Position};

    fn sample() -> GraphSnapshot {
        let seed = seed_graph().nodes[0].clone();
        let edge = CanvasEdge::new("e1", seed.id.clone(), "img");
        let image = CanvasNode::new("img", NodeData::default_for(NodeType::Image), Position::new(0.0, 300.0));
        GraphSnapshot::new(vec![seed, image], vec![edge])
    }

    #[tokio::test]
    async fn test_memory_persistence() {
        let persistence = MemoryPersistence::new();
        assert!(persistence.load("g1").await.unwrap().is_none());

        let graph = sample();
        persistence.save("g1", &graph.nodes, &graph.edges).await.unwrap();
        let loaded = persistence.load("g1").await.unwrap().unwrap();
        assert_eq!(loaded.nodes.as_ref(), graph.nodes.as_ref());
        assert_eq!(GraphDocument::from(&loaded), GraphDocument::from(&graph));
        assert_eq!(persistence.len(), 1);
    }

    #[tokio::test]
    async fn test_file_persistence() {
        let dir = tempfile::tempdir().unwrap();
        let persistence = FilePersistence::new(dir.path().join("graphs"));
        assert!(persistence.load("canvas-1").await.unwrap().is_none());

        let graph = sample();
        persistence
            .save("canvas-1", &graph.nodes, &graph.edges)
            .await
            .unwrap();

        let raw = std::fs::read_to_string(dir.path().join("graphs/canvas-1.json")).unwrap();
        assert!(raw.contains("\"textEditor\""));

        let loaded = persistence.load("canvas-1").await.unwrap().unwrap();
        assert_eq!(loaded.nodes.as_ref(), graph.nodes.as_ref());
        assert_eq!(loaded.edges[0].source, graph.nodes[0].id);
    }

    #[tokio::test]
    async fn test_file_persistence_rejects_path_like_ids() {
        let dir = tempfile::tempdir().unwrap();
        let persistence = FilePersistence::new(dir.path());
        let graph = sample();
        assert!(persistence
            .save("../escape", &graph.nodes, &graph.edges)
            .await
            .is_err());
        assert!(persistence.load("").await.is_err());
    }
}
