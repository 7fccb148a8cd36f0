//! Channel arena.
//!
//! [`Channels`] owns every queue, wire and boolean flag of an elaborated graph.
//! Actors and adaptors only hold typed handles into it, so ownership of the
//! whole topology stays with the graph instance.
//!
//! Two update disciplines coexist:
//!
//! - queue operations take effect immediately;
//! - wire and flag writes are staged and committed by [`Channels::update`] at
//!   the end of the delta cycle.
//!
//! # Example
//!
//! ```
//! use cosim::bits::BitVector;
//! use cosim::channel::Channels;
//!
//! let mut channels = Channels::new(None);
//! let q = channels.add_queue("wire_0_0_1_0", 8, 2, false);
//! let w = channels.add_wire("w", 8, false);
//!
//! channels.try_write(q, BitVector::from_u64(8, 5)).unwrap();
//! assert_eq!(channels.num_available(q), 1);
//!
//! channels.write_wire(w, BitVector::from_u64(8, 7));
//! assert_eq!(channels.read_wire(w).to_u64(), 0);
//! channels.update();
//! assert_eq!(channels.read_wire(w).to_u64(), 7);
//! ```

mod queue;
mod signal;

pub use queue::{QueueChannel, QueueStats, DEFAULT_QUEUE_CAPACITY};
pub use signal::{Signal, SignalChannel};

use crate::bits::BitVector;
use crate::trace::TraceContext;
use crate::types::{FlagId, QueueId, SignalChannelId, SimTime, WireId, Width};

/// Owner of all channels of one graph.
#[derive(Debug)]
pub struct Channels {
    now: SimTime,
    queues: Vec<QueueChannel>,
    wires: Vec<Signal<BitVector>>,
    flags: Vec<Signal<bool>>,
    signals: Vec<SignalChannel>,
    dirty_wires: Vec<WireId>,
    dirty_flags: Vec<FlagId>,
    trace: Option<TraceContext>,
}

impl Channels {
    /// Creates an empty arena, optionally recording into `trace`.
    pub fn new(trace: Option<TraceContext>) -> Self {
        Self {
            now: 0,
            queues: Vec::new(),
            wires: Vec::new(),
            flags: Vec::new(),
            signals: Vec::new(),
            dirty_wires: Vec::new(),
            dirty_flags: Vec::new(),
            trace,
        }
    }

    /// Current simulation time.
    pub fn now(&self) -> SimTime {
        self.now
    }

    pub(crate) fn set_time(&mut self, time: SimTime) {
        self.now = time;
    }

    // ==== Allocation ====

    /// Allocates a bounded queue channel.
    pub fn add_queue(
        &mut self,
        name: impl Into<String>,
        width: Width,
        capacity: usize,
        traced: bool,
    ) -> QueueId {
        let id = QueueId(self.queues.len());
        self.queues
            .push(QueueChannel::new(name, width, capacity).with_trace(traced));
        id
    }

    /// Allocates a bit-vector wire initialised to zero.
    pub fn add_wire(&mut self, name: impl Into<String>, width: Width, traced: bool) -> WireId {
        let id = WireId(self.wires.len());
        self.wires
            .push(Signal::new(name, BitVector::zero(width)).with_trace(traced));
        id
    }

    /// Allocates a boolean wire.
    pub fn add_flag(&mut self, name: impl Into<String>, initial: bool, traced: bool) -> FlagId {
        let id = FlagId(self.flags.len());
        self.flags.push(Signal::new(name, initial).with_trace(traced));
        id
    }

    /// Allocates a valid/ready channel: `{name}` for data, `{name}.valid`
    /// and `{name}.ready` for the handshake.
    pub fn add_signal_channel(
        &mut self,
        name: impl Into<String>,
        width: Width,
        traced: bool,
    ) -> SignalChannelId {
        let name = name.into();
        let data = self.add_wire(name.clone(), width, traced);
        let valid = self.add_wire(format!("{name}.valid"), 1, traced);
        let ready = self.add_wire(format!("{name}.ready"), 1, traced);

        let id = SignalChannelId(self.signals.len());
        self.signals.push(SignalChannel {
            data,
            valid,
            ready,
            width,
        });
        id
    }

    // ==== Queues ====

    /// Enqueues `value`, handing it back if the queue is full.
    pub fn try_write(&mut self, id: QueueId, value: BitVector) -> Result<(), BitVector> {
        let queue = &mut self.queues[id.0];
        if queue.is_traced() {
            if let Some(trace) = &self.trace {
                if !queue.is_full() {
                    trace.record(self.now, queue.name(), &value);
                }
            }
        }
        queue.try_write(value)
    }

    /// Dequeues the oldest value, if any.
    pub fn try_read(&mut self, id: QueueId) -> Option<BitVector> {
        self.queues[id.0].try_read()
    }

    pub fn num_free(&self, id: QueueId) -> usize {
        self.queues[id.0].num_free()
    }

    pub fn num_available(&self, id: QueueId) -> usize {
        self.queues[id.0].num_available()
    }

    pub fn queue(&self, id: QueueId) -> &QueueChannel {
        &self.queues[id.0]
    }

    /// Finds a queue by channel name.
    pub fn queue_named(&self, name: &str) -> Option<&QueueChannel> {
        self.queues.iter().find(|q| q.name() == name)
    }

    pub fn queues(&self) -> impl Iterator<Item = &QueueChannel> {
        self.queues.iter()
    }

    // ==== Wires ====

    /// Returns the committed value of a wire.
    pub fn read_wire(&self, id: WireId) -> &BitVector {
        self.wires[id.0].read()
    }

    /// Stages a wire write for the end of the delta cycle.
    pub fn write_wire(&mut self, id: WireId, value: BitVector) {
        let wire = &mut self.wires[id.0];
        debug_assert_eq!(wire.read().width(), value.width(), "wire {}", wire.name());
        if wire.write(value) {
            self.dirty_wires.push(id);
        }
    }

    /// Sets a wire's committed value directly, before a run starts.
    pub fn init_wire(&mut self, id: WireId, value: BitVector) {
        self.wires[id.0].force(value);
    }

    pub fn wire_name(&self, id: WireId) -> &str {
        self.wires[id.0].name()
    }

    /// Returns the handles of a valid/ready channel.
    pub fn signal_channel(&self, id: SignalChannelId) -> SignalChannel {
        self.signals[id.0]
    }

    // ==== Flags ====

    pub fn read_flag(&self, id: FlagId) -> bool {
        *self.flags[id.0].read()
    }

    /// Stages a flag write for the end of the delta cycle.
    pub fn write_flag(&mut self, id: FlagId, value: bool) {
        if self.flags[id.0].write(value) {
            self.dirty_flags.push(id);
        }
    }

    /// Sets a flag's committed value directly, before a run starts.
    pub fn init_flag(&mut self, id: FlagId, value: bool) {
        self.flags[id.0].force(value);
    }

    pub fn flag_name(&self, id: FlagId) -> &str {
        self.flags[id.0].name()
    }

    // ==== Update phase ====

    /// Commits all staged writes. Returns the flags whose value changed.
    pub fn update(&mut self) -> Vec<FlagId> {
        for id in std::mem::take(&mut self.dirty_wires) {
            let wire = &mut self.wires[id.0];
            if wire.commit() && wire.is_traced() {
                if let Some(trace) = &self.trace {
                    trace.record(self.now, wire.name(), wire.read());
                }
            }
        }

        let mut changed = Vec::new();
        for id in std::mem::take(&mut self.dirty_flags) {
            let flag = &mut self.flags[id.0];
            if flag.commit() {
                if flag.is_traced() {
                    if let Some(trace) = &self.trace {
                        trace.record_flag(self.now, flag.name(), *flag.read());
                    }
                }
                changed.push(id);
            }
        }
        changed
    }

    /// The trace context this arena records into, if any.
    pub fn trace(&self) -> Option<&TraceContext> {
        self.trace.as_ref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::trace::MemoryTrace;

    #[test]
    fn test_queue_handles() {
        let mut channels = Channels::new(None);
        let a = channels.add_queue("a", 4, 1, false);
        let b = channels.add_queue("b", 4, 3, false);
        assert_ne!(a, b);

        channels.try_write(a, BitVector::from_u64(4, 1)).unwrap();
        assert!(channels.try_write(a, BitVector::from_u64(4, 2)).is_err());
        assert_eq!(channels.num_free(b), 3);
        assert_eq!(channels.queue_named("b").map(|q| q.capacity()), Some(3));
    }

    #[test]
    fn test_flag_change_reported_once() {
        let mut channels = Channels::new(None);
        let f = channels.add_flag("clk", false, false);

        channels.write_flag(f, true);
        channels.write_flag(f, true);
        assert_eq!(channels.update(), vec![f]);
        assert!(channels.read_flag(f));

        channels.write_flag(f, true);
        assert!(channels.update().is_empty());
    }

    #[test]
    fn test_signal_channel_wires() {
        let mut channels = Channels::new(None);
        let id = channels.add_signal_channel("wire_1_0_2_0", 32, false);
        let sig = channels.signal_channel(id);

        assert_eq!(sig.width, 32);
        assert_eq!(channels.read_wire(sig.data).width(), 32);
        assert_eq!(channels.read_wire(sig.valid).width(), 1);
        assert_eq!(channels.wire_name(sig.ready), "wire_1_0_2_0.ready");
    }

    #[test]
    fn test_trace_records_commits_only() {
        let memory = MemoryTrace::new();
        let mut channels = Channels::new(Some(TraceContext::new(memory.clone())));
        let q = channels.add_queue("q", 8, 1, true);
        let w = channels.add_wire("w", 8, true);
        let hidden = channels.add_wire("hidden", 8, false);

        channels.set_time(40);
        channels.try_write(q, BitVector::from_u64(8, 1)).unwrap();
        // Rejected writes are not recorded
        assert!(channels.try_write(q, BitVector::from_u64(8, 2)).is_err());

        channels.write_wire(w, BitVector::from_u64(8, 3));
        channels.write_wire(hidden, BitVector::from_u64(8, 3));
        channels.update();

        // Unchanged value: no record
        channels.write_wire(w, BitVector::from_u64(8, 3));
        channels.update();

        let records = memory.records();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].channel, "q");
        assert_eq!(records[1].channel, "w");
        assert_eq!(records[1].time, 40);
    }
}
