//! Processes and suspension points.
//!
//! Every actor, adaptor and bridge is a resumable state machine. The engine
//! calls [`Process::step`]; the process runs until it would block and returns
//! the [`Wait`] condition it is suspended on. The next `step` call continues
//! from that point once the condition holds.

use crate::actor::interactive::InteractiveRegistry;
use crate::channel::Channels;
use crate::error::SimError;
use crate::types::{FlagId, QueueId};

/// The condition a suspended process waits for.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Wait {
    /// The next rising edge of the clock.
    ClockEdge,
    /// The next committed change of a boolean wire.
    Change(FlagId),
    /// The queue holds at least one value.
    Readable(QueueId),
    /// The queue has at least one free slot.
    Writable(QueueId),
    /// Never resume this process again.
    Halt,
    /// End the whole run; the process is a terminal actor.
    Finish,
}

/// What a process can touch while it runs.
pub struct Context<'a> {
    /// The channel arena of the running graph.
    pub channels: &'a mut Channels,
    /// External bodies of interactive actors.
    pub interactive: &'a mut InteractiveRegistry,
}

/// A schedulable unit of the simulation.
pub trait Process: Send {
    /// Name used in logs, errors and statistics.
    fn name(&self) -> &str;

    /// Condition to wait on before the first step.
    ///
    /// `None` makes the process runnable during initialization.
    fn initial_wait(&self) -> Option<Wait> {
        None
    }

    /// Runs until the next suspension point.
    fn step(&mut self, ctx: &mut Context<'_>) -> Result<Wait, SimError>;
}
