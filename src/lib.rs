//! # Flooding Mesh Simulator
//!
//! Discrete-step simulation of message flooding over an ad-hoc wireless
//! mesh. Nodes sit on an integer plane, broadcast within a power radius and
//! relay every message they have not seen before until it reaches its
//! destination or every reachable node has relayed it once.
//!
//! ```text
//! Simulation::step()
//!   ├─ phase 1: each node processes ≤ 1 inbound message  (consume / relay / discard)
//!   └─ phase 2: each node emits ≤ 1 outbound message
//!                 └─ Medium clones it into every in-range node's input queue
//! ```
//!
//! The engine lives in [`simulation`]. [`common`] handles topology files and
//! [`control`] drives a simulation headlessly from text commands.

pub mod common;
pub mod control;
pub mod error;
pub mod simulation;

pub use error::{MeshError, MeshResult};
pub use simulation::{
    Emission, Medium, Message, MessageId, Node, NodeId, NodeKind, NodeStatus, Position, ProcessOutcome, Simulation,
    SimulationConfig, StepReport,
};
