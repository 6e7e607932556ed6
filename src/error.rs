//! Error types for the mesh simulation engine.
//!
//! Only construction and host-level operations are fallible. Per-message
//! conditions (duplicate delivery, unreachable destination, offline
//! recipient) are ordinary flooding behavior and never surface here.

use crate::simulation::types::NodeId;

/// Top-level error type for the simulation engine.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum MeshError {
    /// The node set cannot form a valid network (duplicate ids, mixed
    /// protocol types in a homogeneous network).
    #[error("invalid topology: {0}")]
    InvalidTopology(String),

    /// The operation is declared for this protocol variant but has no
    /// implementation yet.
    #[error("{operation} is not implemented for {protocol} node {node}")]
    NotImplemented {
        node: NodeId,
        protocol: &'static str,
        operation: &'static str,
    },

    /// A node id was referenced but is not part of the medium.
    #[error("node {0} not found")]
    NodeNotFound(NodeId),
}

/// Convenience alias for `Result<T, MeshError>`.
pub type MeshResult<T> = Result<T, MeshError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_invalid_topology() {
        let e = MeshError::InvalidTopology("duplicate node id 3".to_string());
        assert_eq!(e.to_string(), "invalid topology: duplicate node id 3");
    }

    #[test]
    fn display_not_implemented_names_operation() {
        let e = MeshError::NotImplemented {
            node: 2,
            protocol: "routing",
            operation: "create_message",
        };
        assert_eq!(e.to_string(), "create_message is not implemented for routing node 2");
    }

    #[test]
    fn is_std_error() {
        let e: Box<dyn std::error::Error> = Box::new(MeshError::NodeNotFound(7));
        assert_eq!(e.to_string(), "node 7 not found");
    }
}
