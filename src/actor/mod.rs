//! Actors: the processes that realize graph nodes.
//!
//! - [`software::SoftwareActor`]: blocking queue ports, computation delegated
//!   to a [`ComputeStep`].
//! - [`hardware::HardwareActor`]: clocked valid/ready ports, computation
//!   delegated to a [`ClockedLogic`].
//! - [`interactive::InteractiveActor`]: a software actor whose body decides
//!   its own receive/send sequence.

pub mod hardware;
pub mod interactive;
pub mod software;

pub use hardware::{ClockedLogic, HardwareActor, HardwareIo};
pub use interactive::{InteractiveActor, InteractiveBody, InteractiveRegistry, Request, Resume};
pub use software::{ComputeStep, SoftwareActor};

use crate::node::NodeKind;
use crate::process::Process;
use crate::types::NodeId;

/// A process that stands for one node of the graph.
pub trait Actor: Process {
    /// The node this actor realizes.
    fn node(&self) -> NodeId;

    /// Number of bound input ports.
    fn input_arity(&self) -> usize;

    /// Number of bound output ports.
    fn output_arity(&self) -> usize;
}

/// The external behaviour attached to a node.
pub enum Behavior {
    /// One compute call per firing.
    Software(Box<dyn ComputeStep>),
    /// One logic evaluation per clock edge.
    Hardware(Box<dyn ClockedLogic>),
    /// A resumable body driving its own channel operations.
    Interactive(Box<dyn InteractiveBody>),
}

impl Behavior {
    /// Wraps a compute step.
    pub fn software(step: impl ComputeStep + 'static) -> Self {
        Behavior::Software(Box::new(step))
    }

    /// Wraps clocked logic.
    pub fn hardware(logic: impl ClockedLogic + 'static) -> Self {
        Behavior::Hardware(Box::new(logic))
    }

    /// Wraps an interactive body.
    pub fn interactive(body: impl InteractiveBody + 'static) -> Self {
        Behavior::Interactive(Box::new(body))
    }

    /// The node kind this behaviour can be attached to.
    pub fn kind(&self) -> NodeKind {
        match self {
            Behavior::Software(_) | Behavior::Interactive(_) => NodeKind::Software,
            Behavior::Hardware(_) => NodeKind::Hardware,
        }
    }

    /// Short label for logs and errors.
    pub fn label(&self) -> &'static str {
        match self {
            Behavior::Software(_) => "software",
            Behavior::Hardware(_) => "hardware",
            Behavior::Interactive(_) => "interactive",
        }
    }
}

impl std::fmt::Debug for Behavior {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Behavior::{}", self.label())
    }
}
