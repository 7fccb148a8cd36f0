//! Core type definitions for the co-simulation framework.
//!
//! Identifiers for graph entities are plain aliases; handles into the channel
//! arena are newtypes so a queue handle can never be passed where a wire
//! handle is expected.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Simulation time unit (picoseconds).
///
/// The clock, the reset release and every trace record share this timeline.
pub type SimTime = u64;

/// Unique identifier for a node in the dataflow graph.
pub type NodeId = u64;

/// Index of a port within a node's ordered input or output list.
pub type PortIndex = usize;

/// Bit width of a port, channel or value. Always at least 1 once elaborated.
pub type Width = usize;

/// Index of a process registered with the engine.
pub type ProcessId = usize;

macro_rules! arena_handle {
    ($(#[$meta:meta])* $name:ident, $prefix:literal) => {
        $(#[$meta])*
        #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
        pub struct $name(pub(crate) usize);

        impl $name {
            /// Returns the raw arena index.
            pub fn index(self) -> usize {
                self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, concat!($prefix, "#{}"), self.0)
            }
        }
    };
}

arena_handle!(
    /// Handle to a queue channel.
    QueueId,
    "queue"
);
arena_handle!(
    /// Handle to a bit-vector wire.
    WireId,
    "wire"
);
arena_handle!(
    /// Handle to a boolean wire (clock, reset).
    FlagId,
    "flag"
);
arena_handle!(
    /// Handle to a signal channel (a data/valid/ready wire triple).
    SignalChannelId,
    "signal"
);

/// Direction of a port relative to its node.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    Input,
    Output,
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Direction::Input => f.write_str("input"),
            Direction::Output => f.write_str("output"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_handle_display() {
        assert_eq!(QueueId(3).to_string(), "queue#3");
        assert_eq!(WireId(0).to_string(), "wire#0");
        assert_eq!(FlagId(1).to_string(), "flag#1");
        assert_eq!(SignalChannelId(7).index(), 7);
    }

    #[test]
    fn test_direction_display() {
        assert_eq!(Direction::Input.to_string(), "input");
        assert_eq!(Direction::Output.to_string(), "output");
    }
}
