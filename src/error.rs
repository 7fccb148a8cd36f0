//! Error types for elaboration, compute boundaries and simulation runs.
//!
//! Elaboration faults are configuration errors and abort before any process
//! executes. Compute faults abort a running simulation. A terminal actor
//! ending the run is not an error at all; see [`crate::engine::RunOutcome`].

use thiserror::Error;

use crate::types::{Direction, NodeId, PortIndex, SimTime, Width};

/// Contract violations detected while elaborating a graph.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ElaborationError {
    #[error("duplicate node id {0}")]
    DuplicateNode(NodeId),

    #[error("edge references unknown node {0}")]
    UnknownNode(NodeId),

    #[error("node {node} {direction} port {port} has zero width")]
    ZeroWidth {
        node: NodeId,
        direction: Direction,
        port: PortIndex,
    },

    #[error("node {node} has {arity} {direction} ports, port {port} is out of range")]
    PortOutOfRange {
        node: NodeId,
        direction: Direction,
        port: PortIndex,
        arity: usize,
    },

    #[error("node {node} {direction} port {port} is connected more than once")]
    PortAlreadyConnected {
        node: NodeId,
        direction: Direction,
        port: PortIndex,
    },

    #[error("node {node} {direction} port {port} is not connected")]
    UnconnectedPort {
        node: NodeId,
        direction: Direction,
        port: PortIndex,
    },

    #[error(
        "width mismatch on edge {edge}: source is {src_width} bits, \
         destination is {dst_width} bits"
    )]
    WidthMismatch {
        edge: String,
        src_width: Width,
        dst_width: Width,
    },

    #[error("edge {edge} is declared {declared} bits but its ports are {port_width} bits")]
    DeclaredWidthMismatch {
        edge: String,
        declared: Width,
        port_width: Width,
    },

    #[error("node {node} is declared {declared} but its behaviour is {behavior}")]
    KindMismatch {
        node: NodeId,
        declared: String,
        behavior: String,
    },

    #[error("queue capacity must be at least 1")]
    ZeroCapacity,

    #[error("node {0} already has an interactive body registered")]
    DuplicateInteractive(NodeId),

    #[error("unknown behaviour type '{type_name}' for node {node}")]
    UnknownBehavior { node: NodeId, type_name: String },

    #[error("node {node}: invalid attribute {attr}='{value}'")]
    InvalidAttribute {
        node: NodeId,
        attr: String,
        value: String,
    },

    #[error("invalid simulation parameters: {0}")]
    InvalidParams(String),
}

/// Failures reported by an external compute boundary.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ComputeError {
    #[error("{0}")]
    Failed(String),

    #[error("expected {expected} values, got {got}")]
    ArityMismatch { expected: usize, got: usize },

    #[error("port {port} expects {expected} bits, got {got}")]
    WidthMismatch {
        port: PortIndex,
        expected: Width,
        got: Width,
    },

    #[error("{direction} port {port} does not exist")]
    PortOutOfRange { direction: Direction, port: PortIndex },
}

impl ComputeError {
    /// Convenience constructor for free-form failures.
    pub fn failed(msg: impl Into<String>) -> Self {
        ComputeError::Failed(msg.into())
    }
}

/// Errors that abort a simulation.
#[derive(Error, Debug)]
pub enum SimError {
    #[error("elaboration failed: {0}")]
    Elaboration(#[from] ElaborationError),

    #[error("compute step of '{actor}' failed: {source}")]
    Compute {
        actor: String,
        #[source]
        source: ComputeError,
    },

    #[error("handshake violated on '{channel}': {detail}")]
    Protocol { channel: String, detail: String },

    #[error("more than {limit} delta cycles at time {time}")]
    DeltaLimit { limit: u32, time: SimTime },

    #[error("graph '{0}' has already been run")]
    AlreadyRun(String),
}

impl SimError {
    /// Wraps a compute failure with the name of the actor that raised it.
    pub fn compute(actor: impl Into<String>, source: ComputeError) -> Self {
        SimError::Compute {
            actor: actor.into(),
            source,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_elaboration_messages() {
        let err = ElaborationError::WidthMismatch {
            edge: "wire_0_0_1_0".to_string(),
            src_width: 8,
            dst_width: 16,
        };
        assert!(err.to_string().contains("wire_0_0_1_0"));
        assert!(err.to_string().contains("8 bits"));

        let err = ElaborationError::UnconnectedPort {
            node: 3,
            direction: Direction::Input,
            port: 1,
        };
        assert_eq!(err.to_string(), "node 3 input port 1 is not connected");
    }

    #[test]
    fn test_sim_error_from_elaboration() {
        let err: SimError = ElaborationError::ZeroCapacity.into();
        assert!(matches!(err, SimError::Elaboration(ElaborationError::ZeroCapacity)));
    }

    #[test]
    fn test_compute_error_source() {
        let err = SimError::compute("add_2", ComputeError::failed("overflow trap"));
        assert_eq!(err.to_string(), "compute step of 'add_2' failed: overflow trap");
        assert!(std::error::Error::source(&err).is_some());
    }
}
