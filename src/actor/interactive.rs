//! Interactive actors.
//!
//! An interactive actor is a software actor whose external body chooses its
//! own sequence of blocking receives and sends instead of firing on a fixed
//! read-all/write-all pattern. The body is resumed with the outcome of the
//! previous request and answers with the next one.
//!
//! Bodies are kept in an [`InteractiveRegistry`] owned by the graph instance,
//! one body per node.

use std::collections::HashMap;

use tracing::debug;

use crate::bits::BitVector;
use crate::error::{ComputeError, ElaborationError, SimError};
use crate::process::{Context, Process, Wait};
use crate::types::{Direction, NodeId, PortIndex, QueueId, Width};

use super::Actor;

/// What the body is resumed with.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Resume {
    /// First resumption.
    Start,
    /// A requested receive completed.
    Received { port: PortIndex, value: BitVector },
    /// A requested send completed.
    Sent { port: PortIndex },
}

/// What the body asks for next.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Request {
    /// Blocking read on an input port.
    Receive(PortIndex),
    /// Blocking write on an output port.
    Send(PortIndex, BitVector),
    /// End the whole run.
    Exit,
    /// Stop this actor; the rest of the graph continues.
    Done,
}

/// The external, resumable body of an interactive actor.
pub trait InteractiveBody: Send {
    fn resume(&mut self, event: Resume) -> Result<Request, ComputeError>;
}

/// Owner of all interactive bodies of a graph, keyed by node.
#[derive(Default)]
pub struct InteractiveRegistry {
    bodies: HashMap<NodeId, Box<dyn InteractiveBody>>,
}

impl InteractiveRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers the body of `node`. A node can have only one body.
    pub fn register(
        &mut self,
        node: NodeId,
        body: Box<dyn InteractiveBody>,
    ) -> Result<(), ElaborationError> {
        if self.bodies.contains_key(&node) {
            return Err(ElaborationError::DuplicateInteractive(node));
        }
        self.bodies.insert(node, body);
        Ok(())
    }

    pub fn contains(&self, node: NodeId) -> bool {
        self.bodies.contains_key(&node)
    }

    pub fn len(&self) -> usize {
        self.bodies.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bodies.is_empty()
    }

    fn resume(&mut self, node: NodeId, event: Resume) -> Result<Request, ComputeError> {
        match self.bodies.get_mut(&node) {
            Some(body) => body.resume(event),
            None => Err(ComputeError::failed(format!(
                "no interactive body registered for node {node}"
            ))),
        }
    }
}

impl std::fmt::Debug for InteractiveRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InteractiveRegistry")
            .field("nodes", &self.bodies.keys().collect::<Vec<_>>())
            .finish()
    }
}

#[derive(Debug)]
enum Pending {
    Resume(Resume),
    Receive(PortIndex),
    Send(PortIndex, BitVector),
}

/// Software actor driven by an [`InteractiveBody`].
pub struct InteractiveActor {
    node: NodeId,
    name: String,
    inputs: Vec<QueueId>,
    outputs: Vec<(QueueId, Width)>,
    pending: Option<Pending>,
}

impl InteractiveActor {
    pub fn new(
        node: NodeId,
        name: impl Into<String>,
        inputs: Vec<QueueId>,
        outputs: Vec<(QueueId, Width)>,
    ) -> Self {
        Self {
            node,
            name: name.into(),
            inputs,
            outputs,
            pending: Some(Pending::Resume(Resume::Start)),
        }
    }

    fn check(&self, request: &Request) -> Result<(), ComputeError> {
        match request {
            Request::Receive(port) if *port >= self.inputs.len() => {
                Err(ComputeError::PortOutOfRange {
                    direction: Direction::Input,
                    port: *port,
                })
            }
            Request::Send(port, value) => match self.outputs.get(*port) {
                None => Err(ComputeError::PortOutOfRange {
                    direction: Direction::Output,
                    port: *port,
                }),
                Some((_, width)) if value.width() != *width => Err(ComputeError::WidthMismatch {
                    port: *port,
                    expected: *width,
                    got: value.width(),
                }),
                Some(_) => Ok(()),
            },
            _ => Ok(()),
        }
    }
}

impl Process for InteractiveActor {
    fn name(&self) -> &str {
        &self.name
    }

    fn step(&mut self, ctx: &mut Context<'_>) -> Result<Wait, SimError> {
        loop {
            let event = match self.pending.take() {
                None => return Ok(Wait::Halt),
                Some(Pending::Resume(event)) => event,
                Some(Pending::Receive(port)) => {
                    let queue = self.inputs[port];
                    match ctx.channels.try_read(queue) {
                        Some(value) => Resume::Received { port, value },
                        None => {
                            self.pending = Some(Pending::Receive(port));
                            return Ok(Wait::Readable(queue));
                        }
                    }
                }
                Some(Pending::Send(port, value)) => {
                    let queue = self.outputs[port].0;
                    match ctx.channels.try_write(queue, value) {
                        Ok(()) => Resume::Sent { port },
                        Err(value) => {
                            self.pending = Some(Pending::Send(port, value));
                            return Ok(Wait::Writable(queue));
                        }
                    }
                }
            };

            let request = ctx
                .interactive
                .resume(self.node, event)
                .and_then(|request| self.check(&request).map(|_| request))
                .map_err(|e| SimError::compute(&self.name, e))?;

            match request {
                Request::Receive(port) => self.pending = Some(Pending::Receive(port)),
                Request::Send(port, value) => self.pending = Some(Pending::Send(port, value)),
                Request::Exit => return Ok(Wait::Finish),
                Request::Done => {
                    debug!(actor = %self.name, "interactive body done");
                    return Ok(Wait::Halt);
                }
            }
        }
    }
}

impl Actor for InteractiveActor {
    fn node(&self) -> NodeId {
        self.node
    }

    fn input_arity(&self) -> usize {
        self.inputs.len()
    }

    fn output_arity(&self) -> usize {
        self.outputs.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::channel::Channels;

    /// Receives on port 0, sends the value plus one on port 0, then exits.
    struct Echo;

    impl InteractiveBody for Echo {
        fn resume(&mut self, event: Resume) -> Result<Request, ComputeError> {
            Ok(match event {
                Resume::Start => Request::Receive(0),
                Resume::Received { value, .. } => {
                    Request::Send(0, value.wrapping_add(&BitVector::from_u64(value.width(), 1)))
                }
                Resume::Sent { .. } => Request::Exit,
            })
        }
    }

    #[test]
    fn test_registry_rejects_duplicates() {
        let mut registry = InteractiveRegistry::new();
        registry.register(4, Box::new(Echo)).unwrap();
        assert_eq!(
            registry.register(4, Box::new(Echo)),
            Err(ElaborationError::DuplicateInteractive(4))
        );
        assert_eq!(registry.len(), 1);
        assert!(registry.contains(4));
    }

    #[test]
    fn test_receive_send_exit() {
        let mut channels = Channels::new(None);
        let input = channels.add_queue("in", 8, 1, false);
        let output = channels.add_queue("out", 8, 1, false);
        let mut registry = InteractiveRegistry::new();
        registry.register(4, Box::new(Echo)).unwrap();

        let mut actor = InteractiveActor::new(4, "echo", vec![input], vec![(output, 8)]);
        channels.try_write(output, BitVector::from_u64(8, 0)).unwrap();

        let mut ctx = Context {
            channels: &mut channels,
            interactive: &mut registry,
        };
        assert_eq!(actor.step(&mut ctx).unwrap(), Wait::Readable(input));

        ctx.channels.try_write(input, BitVector::from_u64(8, 9)).unwrap();
        // Output still full from before
        assert_eq!(actor.step(&mut ctx).unwrap(), Wait::Writable(output));

        ctx.channels.try_read(output);
        assert_eq!(actor.step(&mut ctx).unwrap(), Wait::Finish);
        assert_eq!(ctx.channels.try_read(output), Some(BitVector::from_u64(8, 10)));
    }

    #[test]
    fn test_missing_body_is_compute_error() {
        let mut channels = Channels::new(None);
        let mut registry = InteractiveRegistry::new();
        let mut actor = InteractiveActor::new(9, "orphan", vec![], vec![]);
        let mut ctx = Context {
            channels: &mut channels,
            interactive: &mut registry,
        };
        assert!(matches!(
            actor.step(&mut ctx),
            Err(SimError::Compute { .. })
        ));
    }

    #[test]
    fn test_bad_port_rejected() {
        struct Stray;
        impl InteractiveBody for Stray {
            fn resume(&mut self, _event: Resume) -> Result<Request, ComputeError> {
                Ok(Request::Receive(2))
            }
        }

        let mut channels = Channels::new(None);
        let mut registry = InteractiveRegistry::new();
        registry.register(1, Box::new(Stray)).unwrap();
        let mut actor = InteractiveActor::new(1, "stray", vec![], vec![]);
        let mut ctx = Context {
            channels: &mut channels,
            interactive: &mut registry,
        };
        let err = actor.step(&mut ctx).unwrap_err();
        assert!(err.to_string().contains("input port 2 does not exist"));
    }
}
