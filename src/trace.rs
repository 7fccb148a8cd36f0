//! Value tracing for channels.
//!
//! A [`TraceContext`] is handed to graph elaboration and threaded into the
//! channel arena. Traced queue channels record every committed write; traced
//! wires and flags record every committed change. The record format is a
//! plain serde struct so sinks can persist it however they like.

use std::io::Write;
use std::sync::Arc;

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};

use crate::bits::BitVector;
use crate::types::SimTime;

/// One committed value on a named channel.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TraceRecord {
    /// Simulation time of the commit
    pub time: SimTime,
    /// Channel or wire name (e.g. `wire_0_0_2_0`, `wire_0_0_2_0.valid`, `clk`)
    pub channel: String,
    /// Value, most significant bit first
    pub value: String,
}

/// Destination for trace records.
pub trait TraceSink: Send {
    /// Records one committed value.
    fn record(&mut self, record: &TraceRecord);

    /// Flushes buffered output, if any.
    fn flush(&mut self) -> std::io::Result<()> {
        Ok(())
    }
}

/// Cloneable handle to a shared trace sink.
#[derive(Clone)]
pub struct TraceContext {
    sink: Arc<Mutex<Box<dyn TraceSink>>>,
}

impl TraceContext {
    /// Wraps a sink in a shareable context.
    pub fn new(sink: impl TraceSink + 'static) -> Self {
        Self {
            sink: Arc::new(Mutex::new(Box::new(sink))),
        }
    }

    /// Records a bit-vector value committed on `channel` at `time`.
    pub fn record(&self, time: SimTime, channel: &str, value: &BitVector) {
        self.sink.lock().record(&TraceRecord {
            time,
            channel: channel.to_string(),
            value: value.to_string(),
        });
    }

    /// Records a boolean value committed on `channel` at `time`.
    pub fn record_flag(&self, time: SimTime, channel: &str, value: bool) {
        self.sink.lock().record(&TraceRecord {
            time,
            channel: channel.to_string(),
            value: if value { "1" } else { "0" }.to_string(),
        });
    }

    /// Flushes the underlying sink.
    pub fn flush(&self) -> std::io::Result<()> {
        self.sink.lock().flush()
    }
}

impl std::fmt::Debug for TraceContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TraceContext").finish_non_exhaustive()
    }
}

/// In-memory sink whose records stay readable through any clone.
///
/// # Example
///
/// ```
/// use cosim::bits::BitVector;
/// use cosim::trace::{MemoryTrace, TraceContext};
///
/// let memory = MemoryTrace::new();
/// let ctx = TraceContext::new(memory.clone());
/// ctx.record(10, "wire_0_0_1_0", &BitVector::from_u64(4, 3));
///
/// let records = memory.records();
/// assert_eq!(records[0].value, "0011");
/// ```
#[derive(Clone, Debug, Default)]
pub struct MemoryTrace {
    records: Arc<Mutex<Vec<TraceRecord>>>,
}

impl MemoryTrace {
    /// Creates an empty in-memory trace.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns a snapshot of all records so far.
    pub fn records(&self) -> Vec<TraceRecord> {
        self.records.lock().clone()
    }

    /// Returns the records committed on one channel, in order.
    pub fn channel(&self, name: &str) -> Vec<TraceRecord> {
        self.records
            .lock()
            .iter()
            .filter(|r| r.channel == name)
            .cloned()
            .collect()
    }

    /// Returns the number of records.
    pub fn len(&self) -> usize {
        self.records.lock().len()
    }

    /// Returns true if nothing was recorded.
    pub fn is_empty(&self) -> bool {
        self.records.lock().is_empty()
    }
}

impl TraceSink for MemoryTrace {
    fn record(&mut self, record: &TraceRecord) {
        self.records.lock().push(record.clone());
    }
}

/// Sink writing one JSON object per line.
#[derive(Debug)]
pub struct JsonLinesTrace<W: Write + Send> {
    writer: W,
    failures: u64,
}

impl<W: Write + Send> JsonLinesTrace<W> {
    /// Creates a sink over any writer.
    pub fn new(writer: W) -> Self {
        Self { writer, failures: 0 }
    }

    /// Number of records that could not be written.
    pub fn failures(&self) -> u64 {
        self.failures
    }

    /// Consumes the sink and returns the writer.
    pub fn into_inner(self) -> W {
        self.writer
    }
}

impl<W: Write + Send> TraceSink for JsonLinesTrace<W> {
    fn record(&mut self, record: &TraceRecord) {
        let result = serde_json::to_writer(&mut self.writer, record)
            .map_err(std::io::Error::from)
            .and_then(|_| self.writer.write_all(b"\n"));
        if let Err(e) = result {
            self.failures += 1;
            tracing::warn!(channel = %record.channel, error = %e, "dropping trace record");
        }
    }

    fn flush(&mut self) -> std::io::Result<()> {
        self.writer.flush()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_memory_trace_shared_between_clones() {
        let memory = MemoryTrace::new();
        let ctx = TraceContext::new(memory.clone());

        ctx.record(0, "a", &BitVector::from_u64(2, 1));
        ctx.record_flag(5, "clk", true);
        ctx.record(10, "a", &BitVector::from_u64(2, 2));

        assert_eq!(memory.len(), 3);
        let a = memory.channel("a");
        assert_eq!(a.len(), 2);
        assert_eq!(a[1].value, "10");
        assert_eq!(memory.channel("clk")[0].value, "1");
    }

    #[test]
    fn test_json_lines_output() {
        let mut sink = JsonLinesTrace::new(Vec::new());
        sink.record(&TraceRecord {
            time: 3,
            channel: "wire_0_0_1_0".to_string(),
            value: "101".to_string(),
        });
        sink.record(&TraceRecord {
            time: 4,
            channel: "wire_0_0_1_0".to_string(),
            value: "110".to_string(),
        });

        let text = String::from_utf8(sink.into_inner()).unwrap();
        let lines: Vec<_> = text.lines().collect();
        assert_eq!(lines.len(), 2);

        let parsed: TraceRecord = serde_json::from_str(lines[1]).unwrap();
        assert_eq!(parsed.time, 4);
        assert_eq!(parsed.value, "110");
    }
}
