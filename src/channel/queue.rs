//! Bounded FIFO queue channel.
//!
//! The queue itself never blocks. Blocking `read`/`write` are expressed by the
//! calling process: on `None`/`Err` it suspends with
//! [`Wait::Readable`](crate::process::Wait::Readable) or
//! [`Wait::Writable`](crate::process::Wait::Writable) and the engine resumes
//! it once the condition holds.

use std::collections::VecDeque;

use serde::{Deserialize, Serialize};

use crate::bits::BitVector;
use crate::types::Width;

/// Default queue capacity used when a graph does not configure one.
pub const DEFAULT_QUEUE_CAPACITY: usize = 16;

/// Counters kept by every queue channel.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueueStats {
    /// Values enqueued
    pub writes: u64,
    /// Values dequeued
    pub reads: u64,
    /// Highest occupancy observed
    pub peak_occupancy: usize,
}

/// A bounded single-producer single-consumer FIFO of fixed-width values.
///
/// # Example
///
/// ```
/// use cosim::bits::BitVector;
/// use cosim::channel::QueueChannel;
///
/// let mut q = QueueChannel::new("wire_0_0_1_0", 8, 2);
/// assert!(q.try_write(BitVector::from_u64(8, 1)).is_ok());
/// assert!(q.try_write(BitVector::from_u64(8, 2)).is_ok());
///
/// // Full: the value is handed back to the caller
/// let rejected = q.try_write(BitVector::from_u64(8, 3)).unwrap_err();
/// assert_eq!(rejected.to_u64(), 3);
///
/// assert_eq!(q.try_read().map(|v| v.to_u64()), Some(1));
/// assert_eq!(q.num_free(), 1);
/// ```
#[derive(Clone, Debug)]
pub struct QueueChannel {
    name: String,
    width: Width,
    capacity: usize,
    buffer: VecDeque<BitVector>,
    traced: bool,
    stats: QueueStats,
}

impl QueueChannel {
    /// Creates an empty queue.
    pub fn new(name: impl Into<String>, width: Width, capacity: usize) -> Self {
        Self {
            name: name.into(),
            width,
            capacity,
            buffer: VecDeque::with_capacity(capacity),
            traced: false,
            stats: QueueStats::default(),
        }
    }

    /// Marks this queue for value recording.
    pub fn with_trace(mut self, traced: bool) -> Self {
        self.traced = traced;
        self
    }

    /// Enqueues `value` if a slot is free; otherwise returns it unchanged.
    pub fn try_write(&mut self, value: BitVector) -> Result<(), BitVector> {
        debug_assert_eq!(value.width(), self.width, "width checked by the producer");
        if self.buffer.len() >= self.capacity {
            return Err(value);
        }
        self.buffer.push_back(value);
        self.stats.writes += 1;
        self.stats.peak_occupancy = self.stats.peak_occupancy.max(self.buffer.len());
        Ok(())
    }

    /// Dequeues the oldest value, if any. Never suspends.
    pub fn try_read(&mut self) -> Option<BitVector> {
        let value = self.buffer.pop_front()?;
        self.stats.reads += 1;
        Some(value)
    }

    /// Returns the oldest value without removing it.
    pub fn peek(&self) -> Option<&BitVector> {
        self.buffer.front()
    }

    /// Number of free slots.
    pub fn num_free(&self) -> usize {
        self.capacity - self.buffer.len()
    }

    /// Number of values waiting to be read.
    pub fn num_available(&self) -> usize {
        self.buffer.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buffer.is_empty()
    }

    pub fn is_full(&self) -> bool {
        self.buffer.len() >= self.capacity
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn width(&self) -> Width {
        self.width
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn is_traced(&self) -> bool {
        self.traced
    }

    pub fn stats(&self) -> &QueueStats {
        &self.stats
    }
}
