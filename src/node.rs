//! Node and edge descriptions.
//!
//! A node is one actor of the dataflow graph. Its description fixes identity,
//! execution model and the ordered, fixed-width port lists; the behaviour is
//! supplied separately when the node is added to a graph.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

use crate::types::{NodeId, PortIndex, Width};

/// The execution model a node belongs to.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NodeKind {
    /// Unclocked actor with blocking queue ports
    Software,
    /// Clock-synchronous actor with valid/ready signal ports
    Hardware,
}

impl fmt::Display for NodeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NodeKind::Software => f.write_str("software"),
            NodeKind::Hardware => f.write_str("hardware"),
        }
    }
}

/// Describes an input or output port of a node.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct NodePort {
    /// Name of the port (e.g., "a", "sum", "result")
    pub name: String,
    /// Bit width of every value carried by the port
    pub width: Width,
}

impl NodePort {
    /// Creates a new `NodePort` with the given name and width.
    pub fn new(name: impl Into<String>, width: Width) -> Self {
        Self {
            name: name.into(),
            width,
        }
    }
}

/// Static description of a node in the dataflow graph.
///
/// A node with no outputs is *terminal*: its first completed firing ends the
/// whole run. A node with no inputs is a *source*.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct NodeDesc {
    /// Unique identifier for this node
    pub id: NodeId,
    /// Human-readable name, used in logs and errors
    pub name: String,
    /// Execution model
    pub kind: NodeKind,
    /// Additional attributes as key-value pairs
    #[serde(default)]
    pub attrs: HashMap<String, String>,
    /// Input ports, in order
    #[serde(default)]
    pub inputs: Vec<NodePort>,
    /// Output ports, in order
    #[serde(default)]
    pub outputs: Vec<NodePort>,
    /// Maximum number of firings of a software actor
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub firing_limit: Option<u64>,
}

impl NodeDesc {
    /// Creates a new `NodeDesc` with the given id, name and kind.
    pub fn new(id: NodeId, name: impl Into<String>, kind: NodeKind) -> Self {
        Self {
            id,
            name: name.into(),
            kind,
            attrs: HashMap::new(),
            inputs: Vec::new(),
            outputs: Vec::new(),
            firing_limit: None,
        }
    }

    /// Shorthand for a software node.
    pub fn software(id: NodeId, name: impl Into<String>) -> Self {
        Self::new(id, name, NodeKind::Software)
    }

    /// Shorthand for a hardware node.
    pub fn hardware(id: NodeId, name: impl Into<String>) -> Self {
        Self::new(id, name, NodeKind::Hardware)
    }

    /// Adds an attribute to this node description.
    pub fn with_attr(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.attrs.insert(key.into(), value.into());
        self
    }

    /// Adds an input port to this node description.
    pub fn with_input(mut self, name: impl Into<String>, width: Width) -> Self {
        self.inputs.push(NodePort::new(name, width));
        self
    }

    /// Adds an output port to this node description.
    pub fn with_output(mut self, name: impl Into<String>, width: Width) -> Self {
        self.outputs.push(NodePort::new(name, width));
        self
    }

    /// Caps the number of firings of a software actor.
    pub fn with_firing_limit(mut self, limit: u64) -> Self {
        self.firing_limit = Some(limit);
        self
    }

    /// Returns true if the node has no outputs.
    pub fn is_terminal(&self) -> bool {
        self.outputs.is_empty()
    }

    /// Returns true if the node has no inputs.
    pub fn is_source(&self) -> bool {
        self.inputs.is_empty()
    }

    /// Returns an attribute value, if present.
    pub fn attr(&self, key: &str) -> Option<&str> {
        self.attrs.get(key).map(String::as_str)
    }
}

fn default_trace() -> bool {
    true
}

/// A directed connection from one output port to one input port.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct EdgeDesc {
    /// Source node
    pub src: NodeId,
    /// Output port index on the source node
    pub src_port: PortIndex,
    /// Destination node
    pub dst: NodeId,
    /// Input port index on the destination node
    pub dst_port: PortIndex,
    /// Declared width; must match both endpoints when given
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub width: Option<Width>,
    /// Record committed values of this edge
    #[serde(default = "default_trace")]
    pub trace: bool,
}

impl EdgeDesc {
    /// Creates an edge from `src:src_port` to `dst:dst_port`.
    pub fn new(src: NodeId, src_port: PortIndex, dst: NodeId, dst_port: PortIndex) -> Self {
        Self {
            src,
            src_port,
            dst,
            dst_port,
            width: None,
            trace: true,
        }
    }

    /// Declares the width the edge is expected to carry.
    pub fn with_width(mut self, width: Width) -> Self {
        self.width = Some(width);
        self
    }

    /// Enables or disables value recording for this edge.
    pub fn with_trace(mut self, trace: bool) -> Self {
        self.trace = trace;
        self
    }

    /// Name of the channel realizing this edge: `wire_{src}_{srcport}_{dst}_{dstport}`.
    pub fn channel_name(&self) -> String {
        format!(
            "wire_{}_{}_{}_{}",
            self.src, self.src_port, self.dst, self.dst_port
        )
    }
}
