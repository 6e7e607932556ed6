//! Control module for driving a simulation without a UI.
//!
//! Commands replace the interactive bindings (inject, step, node edits,
//! save, reload); the runner applies them and keeps the simulation in sync
//! with its scene file.

pub mod command;
pub mod config;
pub mod runner;

pub use command::{CommandParseError, ControlCommand, parse_script};
pub use config::{LogLevel, SimulatorConfig};
pub use runner::{Delivery, Runner};
