//! Discrete-step scheduler driving the medium.
//!
//! High-level flow of each `step`:
//! 1) Every node, in node-set order, processes at most one queued inbound
//!    message (consume, relay or discard).
//! 2) Every node, in node-set order, emits at most one queued outbound
//!    message through the medium.
//! 3) The step counter advances.
//!
//! All processing finishes before any emission starts, so a message relayed
//! in step N is first seen by its recipients in step N+1: one hop per step.

use crate::common::scene::{NodeRecord, Scene, validate_scene};
use crate::error::{MeshError, MeshResult};

use super::geometry::Position;
use super::medium::{Emission, Medium};
use super::node::{Node, ProcessOutcome};
use super::types::{DEFAULT_PAYLOAD, Message, MessageId, NodeId, NodeKind, NodeStatus};

/// Fallback broadcast radius for new nodes when the origin node is missing.
pub const DEFAULT_POWER: u32 = 3;

/// Engine-level settings supplied by the host.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SimulationConfig {
    /// Node that originates injected messages.
    pub origin_node_id: NodeId,
    /// Power given to created nodes when the origin node is absent.
    pub default_power: u32,
    /// Payload carried by injected messages.
    pub payload: String,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            origin_node_id: 0,
            default_power: DEFAULT_POWER,
            payload: DEFAULT_PAYLOAD.to_string(),
        }
    }
}

/// Cumulative traffic counters since the last (re)load.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SimulationStats {
    pub injected: u64,
    pub processed: u64,
    pub relayed: u64,
    pub delivered: u64,
    pub discarded: u64,
    pub emissions: u64,
    /// Clones accepted into an input queue by the medium.
    pub receptions: u64,
}

/// What happened during one call to `Simulation::step`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StepReport {
    /// Index of the step that ran (the counter value before it advanced).
    pub step: u64,
    /// Processing outcomes, in node-set order.
    pub outcomes: Vec<(NodeId, ProcessOutcome)>,
    /// Broadcasts, in node-set order.
    pub emissions: Vec<Emission>,
}

impl StepReport {
    /// Messages that reached their destination this step.
    pub fn deliveries(&self) -> impl Iterator<Item = (NodeId, &Message)> {
        self.outcomes.iter().filter_map(|(node, outcome)| match outcome {
            ProcessOutcome::Consumed(message) => Some((*node, message)),
            _ => None,
        })
    }
}

/// Owner of a medium and its notion of time.
#[derive(Debug, Clone)]
pub struct Simulation {
    medium: Medium,
    step: u64,
    protocol: NodeKind,
    config: SimulationConfig,
    default_power: u32,
    stats: SimulationStats,
}

impl Simulation {
    /// Build a simulation from topology records.
    ///
    /// The network is homogeneous: the protocol of the first record applies
    /// to all nodes and to nodes created later. An empty scene yields an
    /// empty flooding network.
    ///
    /// # Errors
    ///
    /// `InvalidTopology` for duplicate ids or mixed protocol types.
    pub fn from_scene(scene: &Scene, config: &SimulationConfig) -> MeshResult<Self> {
        let mut simulation = Self {
            medium: Medium::new(),
            step: 0,
            protocol: NodeKind::default(),
            config: config.clone(),
            default_power: config.default_power,
            stats: SimulationStats::default(),
        };
        simulation.reload(scene)?;
        Ok(simulation)
    }

    /// Rebuild the medium from `scene`, resetting the step counter and the
    /// traffic counters. On error the current state is left untouched.
    pub fn reload(&mut self, scene: &Scene) -> MeshResult<()> {
        let protocol = validate_scene(scene)?;

        let mut medium = Medium::new();
        for record in &scene.nodes {
            medium.add_node(Node::new(
                record.id,
                record.pos,
                record.power,
                record.status.is_online(),
                protocol,
            ))?;
        }

        self.default_power = medium
            .find_node_by_id(self.config.origin_node_id)
            .map(|n| n.power())
            .unwrap_or(self.config.default_power);
        self.medium = medium;
        self.protocol = protocol;
        self.step = 0;
        self.stats = SimulationStats::default();

        log::info!(
            "Simulation initialized: {} {} nodes, default power {}",
            self.medium.len(),
            self.protocol,
            self.default_power
        );
        Ok(())
    }

    /// Serialize the node set back into topology records.
    pub fn to_scene(&self) -> Scene {
        Scene {
            nodes: self
                .medium
                .nodes()
                .iter()
                .map(|n| NodeRecord {
                    id: n.id(),
                    pos: n.pos(),
                    power: n.power(),
                    status: n.status(),
                    kind: n.kind(),
                })
                .collect(),
        }
    }

    /// Advance the simulation by one step.
    pub fn step(&mut self) -> StepReport {
        log::info!("Running step #{}", self.step);
        let mut report = StepReport {
            step: self.step,
            ..StepReport::default()
        };

        // The node set is fixed for the duration of a step.
        let count = self.medium.len();

        for index in 0..count {
            let Some(node) = self.medium.node_at_mut(index) else {
                continue;
            };
            let id = node.id();
            if let Some(outcome) = node.process_next() {
                self.record_outcome(&outcome);
                report.outcomes.push((id, outcome));
            }
        }

        for index in 0..count {
            if let Some(emission) = self.medium.emit_next_at(index) {
                self.stats.emissions += 1;
                self.stats.receptions += emission.recipients.len() as u64;
                report.emissions.push(emission);
            }
        }

        self.step += 1;
        report
    }

    fn record_outcome(&mut self, outcome: &ProcessOutcome) {
        self.stats.processed += 1;
        match outcome {
            ProcessOutcome::Consumed(_) => self.stats.delivered += 1,
            ProcessOutcome::Relayed(_) => self.stats.relayed += 1,
            ProcessOutcome::Discarded(..) => self.stats.discarded += 1,
        }
    }

    /// Seed a new flood at the origin node, addressed to the highest node id.
    ///
    /// # Errors
    ///
    /// `NodeNotFound` when the origin node is absent, `NotImplemented` for a
    /// routing network.
    pub fn inject_new_message(&mut self) -> MeshResult<MessageId> {
        let id = self.medium.create_message_at(self.config.origin_node_id, &self.config.payload)?;
        self.stats.injected += 1;
        Ok(id)
    }

    /// Add an online node at `pos` with the smallest free id and the default
    /// power. Returns the new id.
    pub fn create_node(&mut self, pos: Position) -> NodeId {
        let id = self.medium.spawn_node(pos, self.default_power, self.protocol);
        log::info!("Created node {} at {}", id, pos);
        id
    }

    pub fn remove_node(&mut self, id: NodeId) -> Option<Node> {
        let removed = self.medium.remove_node(id);
        if removed.is_some() {
            log::info!("Removed node {}", id);
        }
        removed
    }

    /// Flip a node between online and offline. Returns the new status.
    pub fn toggle_node(&mut self, id: NodeId) -> MeshResult<NodeStatus> {
        let node = self.medium.find_node_by_id_mut(id).ok_or(MeshError::NodeNotFound(id))?;
        let online = node.toggle_online();
        Ok(NodeStatus::from_online(online))
    }

    /// Grow or shrink a node's power. Returns the new power.
    pub fn adjust_node_power(&mut self, id: NodeId, delta: i64) -> MeshResult<u32> {
        let node = self.medium.find_node_by_id_mut(id).ok_or(MeshError::NodeNotFound(id))?;
        Ok(node.adjust_power(delta))
    }

    pub fn step_count(&self) -> u64 {
        self.step
    }

    pub fn medium(&self) -> &Medium {
        &self.medium
    }

    pub fn medium_mut(&mut self) -> &mut Medium {
        &mut self.medium
    }

    pub fn protocol(&self) -> NodeKind {
        self.protocol
    }

    pub fn default_power(&self) -> u32 {
        self.default_power
    }

    pub fn stats(&self) -> SimulationStats {
        self.stats
    }
}
