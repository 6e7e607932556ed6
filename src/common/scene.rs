//! Scene loading, saving, and validation logic.
//!
//! A scene is the topology description consumed by the simulation: a JSON
//! array of node records.
//!
//! ```json
//! [
//!   { "id": 0, "pos": { "x": 0, "y": 0 }, "power": 5, "status": "online", "type": "flooding" }
//! ]
//! ```

use anyhow::Context;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fs;
use std::path::Path;

use crate::error::{MeshError, MeshResult};
use crate::simulation::geometry::Position;
use crate::simulation::types::{NodeId, NodeKind, NodeStatus};

/// Error type for scene file failures.
#[derive(Debug, thiserror::Error)]
pub enum SceneLoadError {
    #[error("Failed to read file: {0}")]
    FileReadError(String),
    #[error("Failed to parse JSON: {0}")]
    ParseError(String),
    #[error("Validation error: {0}")]
    ValidationError(String),
    #[error("Failed to write file: {0}")]
    FileWriteError(String),
}

/// Construction parameters for one node.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NodeRecord {
    pub id: NodeId,
    pub pos: Position,
    /// Broadcast radius in world units.
    pub power: u32,
    pub status: NodeStatus,
    #[serde(rename = "type")]
    pub kind: NodeKind,
}

/// Root structure representing a topology.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Scene {
    pub nodes: Vec<NodeRecord>,
}

/// Validate a scene for a homogeneous network.
///
/// # Returns
///
/// The protocol kind shared by every node (flooding for an empty scene), or
/// `InvalidTopology` on a duplicate id or a record whose type differs from
/// the first one.
pub fn validate_scene(scene: &Scene) -> MeshResult<NodeKind> {
    let protocol = scene.nodes.first().map(|n| n.kind).unwrap_or_default();

    let mut node_ids = HashSet::new();
    for node in &scene.nodes {
        if !node_ids.insert(node.id) {
            return Err(MeshError::InvalidTopology(format!("duplicate node id {}", node.id)));
        }
        if node.kind != protocol {
            return Err(MeshError::InvalidTopology(format!(
                "node {} is {} but the network is {}",
                node.id, node.kind, protocol
            )));
        }
    }

    Ok(protocol)
}

/// Parse and validate a scene from JSON text.
pub fn parse_scene(data: &str) -> Result<Scene, SceneLoadError> {
    let scene: Scene = serde_json::from_str(data)
        .context("Invalid JSON format")
        .map_err(|e| SceneLoadError::ParseError(format!("{:#}", e)))?;

    validate_scene(&scene).map_err(|e| SceneLoadError::ValidationError(e.to_string()))?;

    Ok(scene)
}

/// Load and parse a scene from a file.
///
/// # Parameters
///
/// * `path` - Path to the scene JSON file
///
/// # Returns
///
/// Parsed and validated Scene or an error.
pub fn load_scene(path: &Path) -> Result<Scene, SceneLoadError> {
    let data = fs::read_to_string(path)
        .with_context(|| format!("Failed to read file: {}", path.display()))
        .map_err(|e| SceneLoadError::FileReadError(format!("{:#}", e)))?;

    let scene = parse_scene(&data)?;
    log::info!("Loaded scene {} with {} nodes", path.display(), scene.nodes.len());
    Ok(scene)
}

/// Write a scene back to disk in the same record shape it was loaded from.
pub fn save_scene(path: &Path, scene: &Scene) -> Result<(), SceneLoadError> {
    let data = serde_json::to_string_pretty(scene)
        .context("Failed to serialize scene")
        .map_err(|e| SceneLoadError::FileWriteError(format!("{:#}", e)))?;

    fs::write(path, data + "\n")
        .with_context(|| format!("Failed to write file: {}", path.display()))
        .map_err(|e| SceneLoadError::FileWriteError(format!("{:#}", e)))?;

    log::info!("Nodes saved in {}", path.display());
    Ok(())
}
