//! Queue/signal adaptors.
//!
//! Both adaptors are clocked processes that run once per rising edge and never
//! block. The width of the bridged values is a runtime property of the channels
//! they are bound to.

use tracing::trace;

use crate::bits::BitVector;
use crate::channel::SignalChannel;
use crate::error::SimError;
use crate::process::{Context, Process, Wait};
use crate::types::QueueId;

/// Drains a queue into a valid/ready channel.
///
/// On every edge where the consumer's `ready` reads 1, one value is taken from
/// the queue and offered with `valid=1`; an empty queue deasserts `valid`.
/// While `ready` reads 0 the current offer is held unchanged.
pub struct QueueToSignal {
    name: String,
    queue: QueueId,
    signal: SignalChannel,
}

impl QueueToSignal {
    pub fn new(name: impl Into<String>, queue: QueueId, signal: SignalChannel) -> Self {
        Self {
            name: name.into(),
            queue,
            signal,
        }
    }
}

impl Process for QueueToSignal {
    fn name(&self) -> &str {
        &self.name
    }

    fn initial_wait(&self) -> Option<Wait> {
        Some(Wait::ClockEdge)
    }

    fn step(&mut self, ctx: &mut Context<'_>) -> Result<Wait, SimError> {
        let channels = &mut *ctx.channels;
        if !channels.read_wire(self.signal.ready).is_set() {
            return Ok(Wait::ClockEdge);
        }
        match channels.try_read(self.queue) {
            Some(value) => {
                trace!(adaptor = %self.name, value = %value, "offer");
                channels.write_wire(self.signal.data, value);
                channels.write_wire(self.signal.valid, BitVector::from_bool(true));
            }
            None => channels.write_wire(self.signal.valid, BitVector::from_bool(false)),
        }
        Ok(Wait::ClockEdge)
    }
}

/// Commits completed handshakes into a queue and drives `ready` from the
/// queue's free capacity.
///
/// The commit uses `valid` and `ready` as sampled at the edge, so a value is
/// committed exactly when the producer saw it accepted. `ready` is only ever
/// raised with a free slot behind it and this adaptor is the queue's only
/// producer, so the commit always fits.
pub struct SignalToQueue {
    name: String,
    signal: SignalChannel,
    queue: QueueId,
}

impl SignalToQueue {
    pub fn new(name: impl Into<String>, signal: SignalChannel, queue: QueueId) -> Self {
        Self {
            name: name.into(),
            signal,
            queue,
        }
    }
}

impl Process for SignalToQueue {
    fn name(&self) -> &str {
        &self.name
    }

    fn initial_wait(&self) -> Option<Wait> {
        Some(Wait::ClockEdge)
    }

    fn step(&mut self, ctx: &mut Context<'_>) -> Result<Wait, SimError> {
        let channels = &mut *ctx.channels;
        let valid = channels.read_wire(self.signal.valid).is_set();
        let ready = channels.read_wire(self.signal.ready).is_set();

        if valid && ready {
            let data = channels.read_wire(self.signal.data).clone();
            trace!(adaptor = %self.name, value = %data, "commit");
            channels
                .try_write(self.queue, data)
                .map_err(|_| SimError::Protocol {
                    channel: self.name.clone(),
                    detail: "queue full although ready was asserted".to_string(),
                })?;
        }

        let free = channels.num_free(self.queue) > 0;
        channels.write_wire(self.signal.ready, BitVector::from_bool(free));
        Ok(Wait::ClockEdge)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::actor::interactive::InteractiveRegistry;
    use crate::channel::Channels;

    fn edge(process: &mut dyn Process, channels: &mut Channels) -> Result<Wait, SimError> {
        let mut interactive = InteractiveRegistry::new();
        let mut ctx = Context {
            channels: &mut *channels,
            interactive: &mut interactive,
        };
        let wait = process.step(&mut ctx);
        channels.update();
        wait
    }

    fn bv(x: u64) -> BitVector {
        BitVector::from_u64(8, x)
    }

    #[test]
    fn test_queue_to_signal_holds_while_not_ready() {
        let mut channels = Channels::new(None);
        let q = channels.add_queue("q", 8, 4, false);
        let sig = channels.add_signal_channel("s", 8, false);
        let sig = channels.signal_channel(sig);
        let mut adaptor = QueueToSignal::new("q2s", q, sig);

        channels.try_write(q, bv(1)).unwrap();
        edge(&mut adaptor, &mut channels).unwrap();
        // ready=0: nothing drained, nothing offered
        assert_eq!(channels.num_available(q), 1);
        assert!(!channels.read_wire(sig.valid).is_set());

        channels.init_wire(sig.ready, BitVector::from_bool(true));
        edge(&mut adaptor, &mut channels).unwrap();
        assert_eq!(channels.num_available(q), 0);
        assert!(channels.read_wire(sig.valid).is_set());
        assert_eq!(channels.read_wire(sig.data).to_u64(), 1);

        // Empty queue: valid drops, data is left alone
        edge(&mut adaptor, &mut channels).unwrap();
        assert!(!channels.read_wire(sig.valid).is_set());
        assert_eq!(channels.read_wire(sig.data).to_u64(), 1);
    }

    #[test]
    fn test_signal_to_queue_commits_on_handshake() {
        let mut channels = Channels::new(None);
        let q = channels.add_queue("q", 8, 1, false);
        let sig = channels.add_signal_channel("s", 8, false);
        let sig = channels.signal_channel(sig);
        let mut adaptor = SignalToQueue::new("s2q", sig, q);

        channels.init_wire(sig.data, bv(7));
        channels.init_wire(sig.valid, BitVector::from_bool(true));

        // ready not yet asserted: no commit, ready goes up
        edge(&mut adaptor, &mut channels).unwrap();
        assert_eq!(channels.num_available(q), 0);
        assert!(channels.read_wire(sig.ready).is_set());

        // handshake completes; queue is now full so ready drops
        edge(&mut adaptor, &mut channels).unwrap();
        assert_eq!(channels.try_read(q), Some(bv(7)));
        assert!(!channels.read_wire(sig.ready).is_set());
    }

    #[test]
    fn test_signal_to_queue_reports_overcommit() {
        let mut channels = Channels::new(None);
        let q = channels.add_queue("q", 8, 1, false);
        let sig = channels.add_signal_channel("s", 8, false);
        let sig = channels.signal_channel(sig);
        let mut adaptor = SignalToQueue::new("s2q", sig, q);

        // Someone else filled the queue behind the adaptor's back
        channels.try_write(q, bv(1)).unwrap();
        channels.init_wire(sig.valid, BitVector::from_bool(true));
        channels.init_wire(sig.ready, BitVector::from_bool(true));

        let err = edge(&mut adaptor, &mut channels).unwrap_err();
        assert!(matches!(err, SimError::Protocol { ref channel, .. } if channel == "s2q"));
    }
}
