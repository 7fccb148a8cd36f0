//! Signal wires with delta-cycle update semantics.

use crate::types::{WireId, Width};

/// A single wire holding the most recently committed value.
///
/// Writes are staged and only become visible after [`Signal::commit`], which
/// the engine calls at the end of every delta cycle. Repeated writes within one
/// delta keep the last value.
#[derive(Clone, Debug)]
pub struct Signal<T> {
    name: String,
    current: T,
    pending: Option<T>,
    traced: bool,
}

impl<T: Clone + PartialEq> Signal<T> {
    /// Creates a wire with an initial committed value.
    pub fn new(name: impl Into<String>, initial: T) -> Self {
        Self {
            name: name.into(),
            current: initial,
            pending: None,
            traced: false,
        }
    }

    /// Marks this wire for value recording.
    pub fn with_trace(mut self, traced: bool) -> Self {
        self.traced = traced;
        self
    }

    /// Returns the committed value.
    pub fn read(&self) -> &T {
        &self.current
    }

    /// Stages `value` for the next commit. Returns true if this is the first
    /// staged write since the last commit.
    pub fn write(&mut self, value: T) -> bool {
        let first = self.pending.is_none();
        self.pending = Some(value);
        first
    }

    /// Overwrites the committed value without a change notification.
    pub fn force(&mut self, value: T) {
        self.current = value;
        self.pending = None;
    }

    /// Commits the staged value. Returns true if the committed value changed.
    pub fn commit(&mut self) -> bool {
        match self.pending.take() {
            Some(value) if value != self.current => {
                self.current = value;
                true
            }
            _ => false,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn is_traced(&self) -> bool {
        self.traced
    }
}

/// The three wires making up one valid/ready channel.
///
/// Only handles are stored here; the wires themselves live in the
/// [`Channels`](super::Channels) arena. A value is transferred at a clock edge
/// iff `valid` and `ready` both read 1 at that edge.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SignalChannel {
    /// Payload wire, `width` bits
    pub data: WireId,
    /// 1-bit valid, driven by the producer
    pub valid: WireId,
    /// 1-bit ready, driven by the consumer
    pub ready: WireId,
    /// Payload width
    pub width: Width,
}
