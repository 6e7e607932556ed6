//! Mesh simulation core module.
//!
//! This module provides the simulation engine for a flooding mesh network.
//! It integrates:
//! - Integer plane geometry and inclusive range checks
//! - The message unit and its identifiers
//! - Per-node queueing, deduplication and relay/consume decisions
//! - The broadcast medium owning the node table
//! - The discrete-step scheduler
//!
//! ## Module Organization
//!
//! - `types`: Identifiers, `Message`, protocol kind and status
//! - `geometry`: `Position` and distance helpers
//! - `node`: Per-node protocol state machine
//! - `medium`: Node table, range queries and fan-out
//! - `scheduler`: `Simulation`, the two-phase step loop
//!
//! Everything here is synchronous and deterministic: the same topology and
//! the same sequence of calls always yield the same queues.

pub mod geometry;
pub mod medium;
pub mod node;
pub mod scheduler;
pub mod types;

pub use geometry::Position;
pub use medium::{Emission, Medium};
pub use node::{DiscardReason, Node, ProcessOutcome, Protocol};
pub use scheduler::{Simulation, SimulationConfig, SimulationStats, StepReport};
pub use types::{Message, MessageId, NodeId, NodeKind, NodeStatus};
