//! Per-node protocol state machine.
//!
//! A node owns two FIFO queues:
//! - `input_queue`: messages delivered by the medium, waiting to be processed
//! - `output_queue`: messages the node decided to relay, waiting to be emitted
//!
//! Each scheduler step drains at most one message from each queue, so a
//! burst of duplicate deliveries is worked off one per step. Deduplication
//! happens at processing time, never at receive time.
//!
//! The protocol behavior is a tagged variant (`Protocol`). Flooding carries
//! the full dedup and relay logic; routing is a declared extension point
//! whose operations are explicit no-ops.

use std::collections::{HashSet, VecDeque};

use crate::error::{MeshError, MeshResult};

use super::geometry::Position;
use super::types::{Message, MessageId, NodeId, NodeKind, NodeStatus};

/// Dedup and origin bookkeeping for a flooding node.
///
/// Both id sets are append-only for the lifetime of the node and are never
/// evicted, so each message id is consumed or relayed at most once.
#[derive(Debug, Clone, Default)]
pub struct FloodingState {
    /// Next id handed out by `create_message` at this node.
    next_message_id: MessageId,
    consumed_ids: HashSet<MessageId>,
    relayed_ids: HashSet<MessageId>,
}

/// Protocol variant spoken by a node.
#[derive(Debug, Clone)]
pub enum Protocol {
    Flooding(FloodingState),
    /// Not yet supported: queues what it receives but never processes it.
    Routing,
}

impl Protocol {
    pub fn for_kind(kind: NodeKind) -> Self {
        match kind {
            NodeKind::Flooding => Protocol::Flooding(FloodingState::default()),
            NodeKind::Routing => Protocol::Routing,
        }
    }

    pub fn kind(&self) -> NodeKind {
        match self {
            Protocol::Flooding(_) => NodeKind::Flooding,
            Protocol::Routing => NodeKind::Routing,
        }
    }
}

/// Why a dequeued message was dropped without action.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DiscardReason {
    AlreadyRelayed,
    AlreadyConsumed,
}

/// Terminal action taken on a dequeued message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProcessOutcome {
    /// The message reached its destination at this node.
    Consumed(Message),
    /// The message was queued for emission.
    Relayed(Message),
    /// The message id had already been handled here.
    Discarded(Message, DiscardReason),
}

impl ProcessOutcome {
    pub fn message(&self) -> &Message {
        match self {
            ProcessOutcome::Consumed(m)
            | ProcessOutcome::Relayed(m)
            | ProcessOutcome::Discarded(m, _) => m,
        }
    }
}

/// A participant in the mesh.
#[derive(Debug, Clone)]
pub struct Node {
    id: NodeId,
    pos: Position,
    /// Broadcast radius, in the same units as `pos`.
    power: u32,
    online: bool,
    input_queue: VecDeque<Message>,
    output_queue: VecDeque<Message>,
    protocol: Protocol,
}

impl Node {
    pub fn new(id: NodeId, pos: Position, power: u32, online: bool, kind: NodeKind) -> Self {
        Self {
            id,
            pos,
            power,
            online,
            input_queue: VecDeque::new(),
            output_queue: VecDeque::new(),
            protocol: Protocol::for_kind(kind),
        }
    }

    /// Shorthand for an online flooding node.
    pub fn flooding(id: NodeId, pos: Position, power: u32) -> Self {
        Self::new(id, pos, power, true, NodeKind::Flooding)
    }

    pub fn id(&self) -> NodeId {
        self.id
    }

    pub fn pos(&self) -> Position {
        self.pos
    }

    pub fn power(&self) -> u32 {
        self.power
    }

    pub fn is_online(&self) -> bool {
        self.online
    }

    pub fn status(&self) -> NodeStatus {
        NodeStatus::from_online(self.online)
    }

    pub fn kind(&self) -> NodeKind {
        self.protocol.kind()
    }

    pub fn protocol(&self) -> &Protocol {
        &self.protocol
    }

    pub fn input_queue(&self) -> &VecDeque<Message> {
        &self.input_queue
    }

    pub fn output_queue(&self) -> &VecDeque<Message> {
        &self.output_queue
    }

    pub fn set_online(&mut self, online: bool) {
        self.online = online;
    }

    /// Flip the online flag, returning the new value.
    pub fn toggle_online(&mut self) -> bool {
        self.online = !self.online;
        self.online
    }

    pub fn set_power(&mut self, power: u32) {
        self.power = power;
    }

    /// Grow or shrink the broadcast radius, saturating at zero.
    pub fn adjust_power(&mut self, delta: i64) -> u32 {
        let adjusted = (self.power as i64).saturating_add(delta).clamp(0, u32::MAX as i64);
        self.power = adjusted as u32;
        self.power
    }

    pub fn has_consumed(&self, id: MessageId) -> bool {
        match &self.protocol {
            Protocol::Flooding(state) => state.consumed_ids.contains(&id),
            Protocol::Routing => false,
        }
    }

    pub fn has_relayed(&self, id: MessageId) -> bool {
        match &self.protocol {
            Protocol::Flooding(state) => state.relayed_ids.contains(&id),
            Protocol::Routing => false,
        }
    }

    /// Append `message` to the input queue if the node is online.
    ///
    /// Offline nodes drop the message silently. Returns whether the message
    /// was queued.
    pub fn receive(&mut self, message: Message) -> bool {
        if !self.online {
            log::trace!("[{}] offline, dropping {}", self.id, message);
            return false;
        }
        log::info!("[{}] received {}", self.id, message);
        self.input_queue.push_back(message);
        true
    }

    /// Dequeue and handle at most one inbound message.
    ///
    /// Returns `None` when the node is offline or has nothing queued. Routing
    /// nodes always return `None` and leave their input queue untouched.
    pub fn process_next(&mut self) -> Option<ProcessOutcome> {
        if !self.online {
            return None;
        }
        let Protocol::Flooding(state) = &mut self.protocol else {
            return None;
        };
        let message = self.input_queue.pop_front()?;
        let id = self.id;

        let outcome = if state.relayed_ids.contains(&message.id) {
            log::debug!("[{}] ignoring already relayed {}", id, message);
            ProcessOutcome::Discarded(message, DiscardReason::AlreadyRelayed)
        } else if state.consumed_ids.contains(&message.id) {
            log::debug!("[{}] ignoring already consumed {}", id, message);
            ProcessOutcome::Discarded(message, DiscardReason::AlreadyConsumed)
        } else if message.destination_id == id {
            log::info!("[{}] {} reached final destination", id, message);
            state.consumed_ids.insert(message.id);
            ProcessOutcome::Consumed(message)
        } else {
            log::debug!("[{}] relaying {}", id, message);
            state.relayed_ids.insert(message.id);
            self.output_queue.push_back(message.clone());
            ProcessOutcome::Relayed(message)
        };

        Some(outcome)
    }

    /// Dequeue the next outbound message for the medium to broadcast.
    ///
    /// Returns `None` when the node is offline or has nothing to emit.
    pub fn emit_next(&mut self) -> Option<Message> {
        if !self.online {
            return None;
        }
        self.output_queue.pop_front()
    }

    /// Originate a new message addressed to `destination_id` and deliver it
    /// to this node's own input queue, seeding the flood.
    ///
    /// Ids come from a counter local to this node. The seed follows the
    /// normal `receive` rules, so an offline origin drops it.
    pub fn create_message(&mut self, destination_id: NodeId, payload: &str) -> MeshResult<MessageId> {
        let message_id = match &mut self.protocol {
            Protocol::Flooding(state) => {
                let message_id = state.next_message_id;
                state.next_message_id = state.next_message_id.wrapping_add(1);
                message_id
            }
            Protocol::Routing => {
                return Err(MeshError::NotImplemented {
                    node: self.id,
                    protocol: NodeKind::Routing.as_str(),
                    operation: "create_message",
                });
            }
        };

        self.receive(Message::new(message_id, destination_id, payload));
        Ok(message_id)
    }
}

impl std::fmt::Display for Node {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self.kind() {
            NodeKind::Flooding => "FloodingNode",
            NodeKind::Routing => "RoutingNode",
        };
        write!(f, "{}(id={})", name, self.id)
    }
}
