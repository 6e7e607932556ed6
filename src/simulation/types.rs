//! Type definitions shared across the simulation.
//!
//! Contains:
//! - Node and message identifiers
//! - The `Message` unit flooded through the medium
//! - Protocol kind and online status as they appear in topology records

use serde::{Deserialize, Serialize};
use std::fmt;

/// Node identity, unique within a medium.
pub type NodeId = u32;

/// Message identity assigned at the origin node and reused by every relay.
pub type MessageId = u32;

/// Payload used when the host does not configure one.
pub const DEFAULT_PAYLOAD: &str = "test";

/// A unit of data flooded through the mesh.
///
/// Messages are never mutated after creation. The medium hands every
/// recipient its own clone, so bookkeeping at one node can never leak into
/// another node's copy.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Message {
    /// Identity at the origin; shared by every clone of the same broadcast.
    pub id: MessageId,
    /// Node expected to consume the message.
    pub destination_id: NodeId,
    pub payload: String,
}

impl Message {
    pub fn new(id: MessageId, destination_id: NodeId, payload: impl Into<String>) -> Self {
        Self {
            id,
            destination_id,
            payload: payload.into(),
        }
    }
}

impl fmt::Display for Message {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Message(id={}, destination_id={}, payload={})",
            self.id, self.destination_id, self.payload
        )
    }
}

/// Protocol spoken by a node, as named in topology records.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum NodeKind {
    #[default]
    Flooding,
    /// Declared extension point; produces no traffic.
    Routing,
}

impl NodeKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            NodeKind::Flooding => "flooding",
            NodeKind::Routing => "routing",
        }
    }
}

impl fmt::Display for NodeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Online/offline status, as named in topology records.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NodeStatus {
    Online,
    Offline,
}

impl NodeStatus {
    pub fn from_online(online: bool) -> Self {
        if online { NodeStatus::Online } else { NodeStatus::Offline }
    }

    pub fn is_online(&self) -> bool {
        matches!(self, NodeStatus::Online)
    }
}
