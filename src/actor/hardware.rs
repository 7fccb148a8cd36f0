//! Hardware actors.
//!
//! A hardware actor is evaluated once per rising clock edge. It samples every
//! port into a [`HardwareIo`], lets its [`ClockedLogic`] decide the next output
//! values and input readiness, and stages the resulting wire writes. Because
//! wire writes commit at the end of the delta cycle, every actor and adaptor
//! evaluated at the same edge sees the values from before the edge.

use tracing::trace;

use crate::bits::BitVector;
use crate::channel::SignalChannel;
use crate::error::{ComputeError, SimError};
use crate::process::{Context, Process, Wait};
use crate::types::{Direction, NodeId, PortIndex, WireId, Width};

use super::Actor;

/// Clocked behaviour of a hardware node.
pub trait ClockedLogic: Send {
    /// Called on every edge while reset is asserted.
    fn reset(&mut self) {}

    /// Called on every edge outside reset.
    fn clock(&mut self, io: &mut HardwareIo) -> Result<(), ComputeError>;
}

#[derive(Clone, Debug)]
struct InputSample {
    data: BitVector,
    valid: bool,
    ready: bool,
}

#[derive(Clone, Debug)]
struct OutputSample {
    width: Width,
    valid: bool,
    ready: bool,
}

/// Port values sampled at a clock edge, plus the writes the logic requests.
///
/// Anything the logic does not drive keeps its previous value.
#[derive(Clone, Debug)]
pub struct HardwareIo {
    reset: bool,
    inputs: Vec<InputSample>,
    outputs: Vec<OutputSample>,
    drives: Vec<Option<Option<BitVector>>>,
    readies: Vec<Option<bool>>,
}

impl HardwareIo {
    /// Returns true while reset is asserted.
    pub fn in_reset(&self) -> bool {
        self.reset
    }

    pub fn input_count(&self) -> usize {
        self.inputs.len()
    }

    pub fn output_count(&self) -> usize {
        self.outputs.len()
    }

    /// The value transferred on input `port` at this edge, if the handshake
    /// completed (`valid` and our own `ready` both set).
    pub fn input(&self, port: PortIndex) -> Option<&BitVector> {
        self.inputs
            .get(port)
            .filter(|s| s.valid && s.ready)
            .map(|s| &s.data)
    }

    /// The raw `valid` of input `port`.
    pub fn input_valid(&self, port: PortIndex) -> bool {
        self.inputs.get(port).is_some_and(|s| s.valid)
    }

    /// The raw `data` of input `port`, whether or not it is valid.
    pub fn input_data(&self, port: PortIndex) -> Option<&BitVector> {
        self.inputs.get(port).map(|s| &s.data)
    }

    /// The downstream `ready` of output `port`.
    pub fn output_ready(&self, port: PortIndex) -> bool {
        self.outputs.get(port).is_some_and(|s| s.ready)
    }

    /// Returns true if the value we offered on output `port` was taken at this
    /// edge.
    pub fn output_accepted(&self, port: PortIndex) -> bool {
        self.outputs.get(port).is_some_and(|s| s.valid && s.ready)
    }

    /// Drives output `port`: `Some(v)` offers `v` with `valid=1`, `None`
    /// deasserts `valid`.
    pub fn drive(&mut self, port: PortIndex, value: Option<BitVector>) -> Result<(), ComputeError> {
        let sample = self.outputs.get(port).ok_or(ComputeError::PortOutOfRange {
            direction: Direction::Output,
            port,
        })?;
        if let Some(value) = &value {
            if value.width() != sample.width {
                return Err(ComputeError::WidthMismatch {
                    port,
                    expected: sample.width,
                    got: value.width(),
                });
            }
        }
        self.drives[port] = Some(value);
        Ok(())
    }

    /// Sets our `ready` on input `port`.
    pub fn set_ready(&mut self, port: PortIndex, ready: bool) -> Result<(), ComputeError> {
        if port >= self.inputs.len() {
            return Err(ComputeError::PortOutOfRange {
                direction: Direction::Input,
                port,
            });
        }
        self.readies[port] = Some(ready);
        Ok(())
    }
}

/// Clock-driven actor around a [`ClockedLogic`].
pub struct HardwareActor {
    node: NodeId,
    name: String,
    reset: WireId,
    inputs: Vec<SignalChannel>,
    outputs: Vec<SignalChannel>,
    logic: Box<dyn ClockedLogic>,
}

impl HardwareActor {
    /// Creates an actor bound to its signal channels and the 1-bit reset wire.
    pub fn new(
        node: NodeId,
        name: impl Into<String>,
        reset: WireId,
        inputs: Vec<SignalChannel>,
        outputs: Vec<SignalChannel>,
        logic: Box<dyn ClockedLogic>,
    ) -> Self {
        Self {
            node,
            name: name.into(),
            reset,
            inputs,
            outputs,
            logic,
        }
    }

    fn sample(&self, ctx: &Context<'_>) -> HardwareIo {
        let channels = &*ctx.channels;
        HardwareIo {
            reset: channels.read_wire(self.reset).is_set(),
            inputs: self
                .inputs
                .iter()
                .map(|sig| InputSample {
                    data: channels.read_wire(sig.data).clone(),
                    valid: channels.read_wire(sig.valid).is_set(),
                    ready: channels.read_wire(sig.ready).is_set(),
                })
                .collect(),
            outputs: self
                .outputs
                .iter()
                .map(|sig| OutputSample {
                    width: sig.width,
                    valid: channels.read_wire(sig.valid).is_set(),
                    ready: channels.read_wire(sig.ready).is_set(),
                })
                .collect(),
            drives: vec![None; self.outputs.len()],
            readies: vec![None; self.inputs.len()],
        }
    }
}

impl Process for HardwareActor {
    fn name(&self) -> &str {
        &self.name
    }

    fn initial_wait(&self) -> Option<Wait> {
        Some(Wait::ClockEdge)
    }

    fn step(&mut self, ctx: &mut Context<'_>) -> Result<Wait, SimError> {
        let mut io = self.sample(ctx);

        if io.reset {
            self.logic.reset();
            for sig in &self.outputs {
                ctx.channels.write_wire(sig.valid, BitVector::from_bool(false));
            }
            for sig in &self.inputs {
                ctx.channels.write_wire(sig.ready, BitVector::from_bool(false));
            }
            return Ok(Wait::ClockEdge);
        }

        self.logic
            .clock(&mut io)
            .map_err(|e| SimError::compute(&self.name, e))?;

        for (sig, drive) in self.outputs.iter().zip(io.drives) {
            match drive {
                Some(Some(value)) => {
                    trace!(actor = %self.name, value = %value, "drive");
                    ctx.channels.write_wire(sig.data, value);
                    ctx.channels.write_wire(sig.valid, BitVector::from_bool(true));
                }
                Some(None) => ctx.channels.write_wire(sig.valid, BitVector::from_bool(false)),
                None => {}
            }
        }
        for (sig, ready) in self.inputs.iter().zip(io.readies) {
            if let Some(ready) = ready {
                ctx.channels.write_wire(sig.ready, BitVector::from_bool(ready));
            }
        }
        Ok(Wait::ClockEdge)
    }
}

impl Actor for HardwareActor {
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
