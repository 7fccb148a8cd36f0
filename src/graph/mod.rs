//! Graph construction and elaboration.
//!
//! A [`GraphBuilder`] collects node descriptions, behaviours and edges.
//! [`GraphBuilder::elaborate`] validates the whole topology first and only
//! then allocates channels, adaptors, bridges and actors, producing a
//! runnable [`GraphInstance`].
//!
//! Each edge becomes one channel named `wire_{src}_{srcport}_{dst}_{dstport}`:
//!
//! | source   | destination | realization                                   |
//! |----------|-------------|-----------------------------------------------|
//! | software | software    | queue                                         |
//! | hardware | hardware    | valid/ready signal channel                    |
//! | software | hardware    | queue, signal channel and a `QueueToSignal`   |
//! | hardware | software    | signal channel, queue and a `SignalToQueue`   |

mod instance;

pub use instance::{ActorInfo, GraphInstance};

use std::collections::{HashMap, HashSet};

use tracing::debug;

use crate::actor::{
    Actor, Behavior, HardwareActor, InteractiveActor, InteractiveRegistry, SoftwareActor,
};
use crate::bridge::{FlagBridge, QueueToSignal, SignalToQueue};
use crate::channel::{Channels, SignalChannel, DEFAULT_QUEUE_CAPACITY};
use crate::engine::SimulationEngine;
use crate::error::ElaborationError;
use crate::node::{EdgeDesc, NodeDesc, NodeKind};
use crate::trace::TraceContext;
use crate::types::{Direction, NodeId, PortIndex, QueueId, Width};

#[derive(Clone, Copy, Debug)]
enum Binding {
    Queue(QueueId),
    Signal(SignalChannel),
}

type PortKey = (NodeId, Direction, PortIndex);

/// Collects the static topology of a graph.
///
/// # Example
///
/// ```
/// use cosim::actor::software::compute_fn;
/// use cosim::actor::Behavior;
/// use cosim::bits::BitVector;
/// use cosim::config::SimulationParams;
/// use cosim::graph::GraphBuilder;
/// use cosim::node::{EdgeDesc, NodeDesc};
///
/// let mut graph = GraphBuilder::new("pair")
///     .add_node(
///         NodeDesc::software(0, "source").with_output("y", 8),
///         Behavior::Software(compute_fn(|_: &[BitVector]| {
///             Ok(vec![Some(BitVector::from_u64(8, 5))])
///         })),
///     )
///     .add_node(
///         NodeDesc::software(1, "sink").with_input("x", 8),
///         Behavior::Software(compute_fn(|_: &[BitVector]| Ok(vec![]))),
///     )
///     .connect(EdgeDesc::new(0, 0, 1, 0))
///     .elaborate(None)
///     .unwrap();
///
/// let outcome = graph.run(&SimulationParams::default()).unwrap();
/// assert!(outcome.is_finished());
/// ```
pub struct GraphBuilder {
    name: String,
    queue_capacity: usize,
    nodes: Vec<(NodeDesc, Behavior)>,
    edges: Vec<EdgeDesc>,
}

impl GraphBuilder {
    /// Creates an empty graph description.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            queue_capacity: DEFAULT_QUEUE_CAPACITY,
            nodes: Vec::new(),
            edges: Vec::new(),
        }
    }

    /// Sets the capacity of every queue channel.
    pub fn queue_capacity(mut self, capacity: usize) -> Self {
        self.queue_capacity = capacity;
        self
    }

    /// Adds a node with its behaviour.
    pub fn add_node(mut self, desc: NodeDesc, behavior: Behavior) -> Self {
        self.nodes.push((desc, behavior));
        self
    }

    /// Adds an edge.
    pub fn connect(mut self, edge: EdgeDesc) -> Self {
        self.edges.push(edge);
        self
    }

    /// Validates the topology and builds the runnable instance.
    pub fn elaborate(self, trace: Option<TraceContext>) -> Result<GraphInstance, ElaborationError> {
        let widths = self.validate()?;

        let mut channels = Channels::new(trace);
        let clock = channels.add_flag("clk", false, true);
        let reset = channels.add_flag("rst", true, true);
        let clock_wire = channels.add_wire("clk_bv", 1, true);
        let reset_wire = channels.add_wire("rst_bv", 1, true);

        let kinds: HashMap<NodeId, NodeKind> =
            self.nodes.iter().map(|(d, _)| (d.id, d.kind)).collect();
        let mut bindings: HashMap<PortKey, Binding> = HashMap::new();
        let mut adaptors = Vec::new();

        for (edge, width) in self.edges.iter().zip(widths) {
            let name = edge.channel_name();
            let src_key = (edge.src, Direction::Output, edge.src_port);
            let dst_key = (edge.dst, Direction::Input, edge.dst_port);

            match (kinds[&edge.src], kinds[&edge.dst]) {
                (NodeKind::Software, NodeKind::Software) => {
                    let q = channels.add_queue(&name, width, self.queue_capacity, edge.trace);
                    bindings.insert(src_key, Binding::Queue(q));
                    bindings.insert(dst_key, Binding::Queue(q));
                    debug!(channel = %name, width, "queue channel");
                }
                (NodeKind::Hardware, NodeKind::Hardware) => {
                    let id = channels.add_signal_channel(&name, width, edge.trace);
                    let sig = channels.signal_channel(id);
                    bindings.insert(src_key, Binding::Signal(sig));
                    bindings.insert(dst_key, Binding::Signal(sig));
                    debug!(channel = %name, width, "signal channel");
                }
                (NodeKind::Software, NodeKind::Hardware) => {
                    let q = channels.add_queue(
                        format!("{name}.fifo"),
                        width,
                        self.queue_capacity,
                        edge.trace,
                    );
                    let id = channels.add_signal_channel(&name, width, edge.trace);
                    let sig = channels.signal_channel(id);
                    bindings.insert(src_key, Binding::Queue(q));
                    bindings.insert(dst_key, Binding::Signal(sig));
                    adaptors.push(AdaptorSpec::QueueToSignal(name.clone(), q, sig));
                    debug!(channel = %name, width, "queue to signal adaptor");
                }
                (NodeKind::Hardware, NodeKind::Software) => {
                    let id = channels.add_signal_channel(&name, width, edge.trace);
                    let sig = channels.signal_channel(id);
                    let q = channels.add_queue(
                        format!("{name}.fifo"),
                        width,
                        self.queue_capacity,
                        edge.trace,
                    );
                    bindings.insert(src_key, Binding::Signal(sig));
                    bindings.insert(dst_key, Binding::Queue(q));
                    adaptors.push(AdaptorSpec::SignalToQueue(name.clone(), sig, q));
                    debug!(channel = %name, width, "signal to queue adaptor");
                }
            }
        }

        let mut engine = SimulationEngine::new(channels, InteractiveRegistry::new(), clock, reset);
        engine.add_process(Box::new(FlagBridge::clock(clock, clock_wire)));
        engine.add_process(Box::new(FlagBridge::reset(reset, reset_wire)));
        for spec in adaptors {
            match spec {
                AdaptorSpec::QueueToSignal(name, q, sig) => {
                    engine.add_process(Box::new(QueueToSignal::new(format!("{name}.q2s"), q, sig)))
                }
                AdaptorSpec::SignalToQueue(name, sig, q) => {
                    engine.add_process(Box::new(SignalToQueue::new(format!("{name}.s2q"), sig, q)))
                }
            };
        }

        let mut actors = Vec::with_capacity(self.nodes.len());
        for (desc, behavior) in self.nodes {
            let info = match behavior {
                Behavior::Software(compute) => {
                    let limit = desc
                        .firing_limit
                        .or_else(|| desc.is_source().then_some(1));
                    let actor = SoftwareActor::new(
                        desc.id,
                        desc.name.clone(),
                        queue_inputs(&bindings, &desc)?,
                        queue_outputs(&bindings, &desc)?,
                        compute,
                    )
                    .with_firing_limit(limit);
                    register(&mut engine, &desc, actor)
                }
                Behavior::Interactive(body) => {
                    engine.interactive_mut().register(desc.id, body)?;
                    let actor = InteractiveActor::new(
                        desc.id,
                        desc.name.clone(),
                        queue_inputs(&bindings, &desc)?,
                        queue_outputs(&bindings, &desc)?,
                    );
                    register(&mut engine, &desc, actor)
                }
                Behavior::Hardware(logic) => {
                    let actor = HardwareActor::new(
                        desc.id,
                        desc.name.clone(),
                        reset_wire,
                        signal_ports(&bindings, &desc, Direction::Input)?,
                        signal_ports(&bindings, &desc, Direction::Output)?,
                        logic,
                    );
                    register(&mut engine, &desc, actor)
                }
            };
            actors.push(info);
        }

        debug!(
            graph = %self.name,
            actors = actors.len(),
            processes = engine.process_count(),
            "elaborated"
        );
        Ok(GraphInstance::new(self.name, engine, actors, reset_wire))
    }

    /// Checks every node and edge. Returns the width of each edge, in order.
    fn validate(&self) -> Result<Vec<Width>, ElaborationError> {
        if self.queue_capacity == 0 {
            return Err(ElaborationError::ZeroCapacity);
        }

        let mut nodes: HashMap<NodeId, &NodeDesc> = HashMap::new();
        for (desc, behavior) in &self.nodes {
            if nodes.insert(desc.id, desc).is_some() {
                return Err(ElaborationError::DuplicateNode(desc.id));
            }
            let ports = desc
                .inputs
                .iter()
                .enumerate()
                .map(|(i, p)| (Direction::Input, i, p))
                .chain(
                    desc.outputs
                        .iter()
                        .enumerate()
                        .map(|(i, p)| (Direction::Output, i, p)),
                );
            for (direction, port, p) in ports {
                if p.width == 0 {
                    return Err(ElaborationError::ZeroWidth {
                        node: desc.id,
                        direction,
                        port,
                    });
                }
            }
            if behavior.kind() != desc.kind {
                return Err(ElaborationError::KindMismatch {
                    node: desc.id,
                    declared: desc.kind.to_string(),
                    behavior: behavior.label().to_string(),
                });
            }
        }

        let mut bound: HashSet<PortKey> = HashSet::new();
        let mut widths = Vec::with_capacity(self.edges.len());
        for edge in &self.edges {
            let src = nodes
                .get(&edge.src)
                .ok_or(ElaborationError::UnknownNode(edge.src))?;
            let dst = nodes
                .get(&edge.dst)
                .ok_or(ElaborationError::UnknownNode(edge.dst))?;

            let src_port = src.outputs.get(edge.src_port).ok_or(
                ElaborationError::PortOutOfRange {
                    node: edge.src,
                    direction: Direction::Output,
                    port: edge.src_port,
                    arity: src.outputs.len(),
                },
            )?;
            let dst_port = dst.inputs.get(edge.dst_port).ok_or(
                ElaborationError::PortOutOfRange {
                    node: edge.dst,
                    direction: Direction::Input,
                    port: edge.dst_port,
                    arity: dst.inputs.len(),
                },
            )?;

            for (node, direction, port) in [
                (edge.src, Direction::Output, edge.src_port),
                (edge.dst, Direction::Input, edge.dst_port),
            ] {
                if !bound.insert((node, direction, port)) {
                    return Err(ElaborationError::PortAlreadyConnected {
                        node,
                        direction,
                        port,
                    });
                }
            }

            if src_port.width != dst_port.width {
                return Err(ElaborationError::WidthMismatch {
                    edge: edge.channel_name(),
                    src_width: src_port.width,
                    dst_width: dst_port.width,
                });
            }
            if let Some(declared) = edge.width.filter(|w| *w != src_port.width) {
                return Err(ElaborationError::DeclaredWidthMismatch {
                    edge: edge.channel_name(),
                    declared,
                    port_width: src_port.width,
                });
            }
            widths.push(src_port.width);
        }

        for (desc, _) in &self.nodes {
            let inputs = (0..desc.inputs.len()).map(|i| (Direction::Input, i));
            let outputs = (0..desc.outputs.len()).map(|i| (Direction::Output, i));
            for (direction, port) in inputs.chain(outputs) {
                if !bound.contains(&(desc.id, direction, port)) {
                    return Err(ElaborationError::UnconnectedPort {
                        node: desc.id,
                        direction,
                        port,
                    });
                }
            }
        }

        Ok(widths)
    }
}

enum AdaptorSpec {
    QueueToSignal(String, QueueId, SignalChannel),
    SignalToQueue(String, SignalChannel, QueueId),
}

fn register<A: Actor + 'static>(
    engine: &mut SimulationEngine,
    desc: &NodeDesc,
    actor: A,
) -> ActorInfo {
    let (inputs, outputs) = (actor.input_arity(), actor.output_arity());
    let process = engine.add_process(Box::new(actor));
    ActorInfo {
        node: desc.id,
        name: desc.name.clone(),
        kind: desc.kind,
        inputs,
        outputs,
        process,
    }
}

fn binding(
    bindings: &HashMap<PortKey, Binding>,
    node: NodeId,
    direction: Direction,
    port: PortIndex,
) -> Result<Binding, ElaborationError> {
    bindings
        .get(&(node, direction, port))
        .copied()
        .ok_or(ElaborationError::UnconnectedPort {
            node,
            direction,
            port,
        })
}

fn queue_inputs(
    bindings: &HashMap<PortKey, Binding>,
    desc: &NodeDesc,
) -> Result<Vec<QueueId>, ElaborationError> {
    (0..desc.inputs.len())
        .map(|port| match binding(bindings, desc.id, Direction::Input, port)? {
            Binding::Queue(q) => Ok(q),
            Binding::Signal(_) => Err(flavor_mismatch(desc, "signal")),
        })
        .collect()
}

fn queue_outputs(
    bindings: &HashMap<PortKey, Binding>,
    desc: &NodeDesc,
) -> Result<Vec<(QueueId, Width)>, ElaborationError> {
    desc.outputs
        .iter()
        .enumerate()
        .map(|(port, p)| match binding(bindings, desc.id, Direction::Output, port)? {
            Binding::Queue(q) => Ok((q, p.width)),
            Binding::Signal(_) => Err(flavor_mismatch(desc, "signal")),
        })
        .collect()
}

fn signal_ports(
    bindings: &HashMap<PortKey, Binding>,
    desc: &NodeDesc,
    direction: Direction,
) -> Result<Vec<SignalChannel>, ElaborationError> {
    let arity = match direction {
        Direction::Input => desc.inputs.len(),
        Direction::Output => desc.outputs.len(),
    };
    (0..arity)
        .map(|port| match binding(bindings, desc.id, direction, port)? {
            Binding::Signal(sig) => Ok(sig),
            Binding::Queue(_) => Err(flavor_mismatch(desc, "queue")),
        })
        .collect()
}

fn flavor_mismatch(desc: &NodeDesc, channel: &str) -> ElaborationError {
    ElaborationError::KindMismatch {
        node: desc.id,
        declared: desc.kind.to_string(),
        behavior: format!("{channel} port binding"),
    }
}
