//! Spatial broadcast medium.
//!
//! The medium owns the node table and is the only path between nodes: an
//! emitted message is cloned into the input queue of every node within the
//! emitter's power radius. Nodes are addressed by id and hold no reference
//! back to the medium.

use std::collections::HashMap;

use crate::error::{MeshError, MeshResult};

use super::geometry::{Position, within_range};
use super::node::Node;
use super::types::{Message, MessageId, NodeId, NodeKind};

/// One broadcast performed by the medium.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Emission {
    pub emitter: NodeId,
    pub message: Message,
    /// Nodes that accepted the clone into their input queue (online and in
    /// range). Offline nodes in range are not listed.
    pub recipients: Vec<NodeId>,
}

/// Owner of every node in a simulated network.
#[derive(Debug, Clone, Default)]
pub struct Medium {
    nodes: Vec<Node>,
    /// Position of each node id in `nodes`.
    slots: HashMap<NodeId, usize>,
}

impl Medium {
    pub fn new() -> Self {
        Self::default()
    }

    /// Nodes in stable insertion order.
    pub fn nodes(&self) -> &[Node] {
        &self.nodes
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Append a node, rejecting an id already present.
    pub fn add_node(&mut self, node: Node) -> MeshResult<()> {
        if self.slots.contains_key(&node.id()) {
            return Err(MeshError::InvalidTopology(format!("duplicate node id {}", node.id())));
        }
        self.push(node);
        Ok(())
    }

    /// Append a node built with the smallest free id. Returns that id.
    pub fn spawn_node(&mut self, pos: Position, power: u32, kind: NodeKind) -> NodeId {
        let id = self.find_first_free_id();
        self.push(Node::new(id, pos, power, true, kind));
        id
    }

    fn push(&mut self, node: Node) {
        self.slots.insert(node.id(), self.nodes.len());
        self.nodes.push(node);
    }

    /// Remove a node by id, keeping the order of the remaining nodes.
    pub fn remove_node(&mut self, id: NodeId) -> Option<Node> {
        let index = self.slots.remove(&id)?;
        let node = self.nodes.remove(index);
        for (i, shifted) in self.nodes.iter().enumerate().skip(index) {
            self.slots.insert(shifted.id(), i);
        }
        Some(node)
    }

    pub fn find_node_by_id(&self, id: NodeId) -> Option<&Node> {
        self.index_of(id).map(|i| &self.nodes[i])
    }

    pub fn find_node_by_id_mut(&mut self, id: NodeId) -> Option<&mut Node> {
        let index = self.index_of(id)?;
        Some(&mut self.nodes[index])
    }

    fn index_of(&self, id: NodeId) -> Option<usize> {
        self.slots.get(&id).copied()
    }

    /// Node at `index` in insertion order.
    pub fn node_at_mut(&mut self, index: usize) -> Option<&mut Node> {
        self.nodes.get_mut(index)
    }

    /// Ids of every node at most `radius` away from `center`, regardless of
    /// online status.
    pub fn nodes_in_range(&self, center: &Position, radius: u32) -> Vec<NodeId> {
        self.nodes
            .iter()
            .filter(|n| within_range(center, &n.pos(), radius))
            .map(|n| n.id())
            .collect()
    }

    /// Ids of every node within `id`'s broadcast radius. The node itself is
    /// included. Returns an empty list for an unknown id.
    pub fn get_nodes_in_range_of(&self, id: NodeId) -> Vec<NodeId> {
        match self.find_node_by_id(id) {
            Some(node) => self.nodes_in_range(&node.pos(), node.power()),
            None => Vec::new(),
        }
    }

    /// Deliver an independent clone of `message` to every node in range of
    /// `emitter`, excluding the emitter itself.
    ///
    /// Offline nodes are offered the message too; their own online check
    /// drops it. Returns the ids that accepted the clone.
    pub fn propagate_message(&mut self, message: &Message, emitter: NodeId) -> Vec<NodeId> {
        let (center, radius) = match self.find_node_by_id(emitter) {
            Some(node) => (node.pos(), node.power()),
            None => return Vec::new(),
        };

        let mut recipients = Vec::new();
        for node in self.nodes.iter_mut() {
            if node.id() == emitter || !within_range(&center, &node.pos(), radius) {
                continue;
            }
            if node.receive(message.clone()) {
                recipients.push(node.id());
            }
        }
        recipients
    }

    /// Pop `emitter`'s next outbound message and broadcast it.
    ///
    /// Returns `None` when the node is unknown, offline or has nothing to
    /// emit.
    pub fn emit_next(&mut self, emitter: NodeId) -> Option<Emission> {
        let index = self.index_of(emitter)?;
        self.emit_next_at(index)
    }

    /// Same as `emit_next`, addressing the emitter by its insertion index.
    pub fn emit_next_at(&mut self, index: usize) -> Option<Emission> {
        let node = self.nodes.get_mut(index)?;
        let emitter = node.id();
        let message = node.emit_next()?;
        let recipients = self.propagate_message(&message, emitter);
        log::debug!("[{}] emitted {} to {:?}", emitter, message, recipients);
        Some(Emission {
            emitter,
            message,
            recipients,
        })
    }

    /// Originate a message at `origin`, addressed to the highest node id in
    /// the medium.
    pub fn create_message_at(&mut self, origin: NodeId, payload: &str) -> MeshResult<MessageId> {
        let destination = self.get_highest_node_id();
        let node = self.find_node_by_id_mut(origin).ok_or(MeshError::NodeNotFound(origin))?;
        node.create_message(destination, payload)
    }

    /// Smallest non-negative id not used by any node.
    pub fn find_first_free_id(&self) -> NodeId {
        let mut ids: Vec<NodeId> = self.nodes.iter().map(|n| n.id()).collect();
        ids.sort_unstable();

        let mut candidate: NodeId = 0;
        for id in ids {
            if id != candidate {
                break;
            }
            candidate += 1;
        }
        candidate
    }

    /// Highest id present, or `0` for an empty medium.
    pub fn get_highest_node_id(&self) -> NodeId {
        self.nodes.iter().map(|n| n.id()).max().unwrap_or(0)
    }

    /// Directed reachability between distinct online nodes: `(from, to)` is
    /// listed when `to` lies within `from`'s power.
    pub fn links(&self) -> Vec<(NodeId, NodeId)> {
        let mut links = Vec::new();
        for from in self.nodes.iter().filter(|n| n.is_online()) {
            for to in self.nodes.iter().filter(|n| n.is_online()) {
                if from.id() != to.id() && within_range(&from.pos(), &to.pos(), from.power()) {
                    links.push((from.id(), to.id()));
                }
            }
        }
        links
    }
}
