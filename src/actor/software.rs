//! Software actors.
//!
//! A software actor fires repeatedly: it reads one value from every input
//! queue in port order, hands the values to its compute step, then writes each
//! produced value to the matching output queue in port order. Reads and writes
//! block; the actor is a state machine that suspends on the queue it is stuck
//! on and resumes at the same port.

use tracing::{debug, trace};

use crate::bits::BitVector;
use crate::error::{ComputeError, SimError};
use crate::process::{Context, Process, Wait};
use crate::types::{NodeId, QueueId, Width};

use super::Actor;

/// The external compute boundary of a software actor.
///
/// `fire` receives one value per input port and returns one optional value per
/// output port; `None` sends nothing on that port for this firing.
///
/// Closures with the matching signature implement this trait:
///
/// ```
/// use cosim::actor::software::compute_fn;
/// use cosim::actor::ComputeStep;
/// use cosim::bits::BitVector;
///
/// let mut add = compute_fn(|inputs: &[BitVector]| {
///     Ok(vec![Some(inputs[0].wrapping_add(&inputs[1]))])
/// });
/// let out = add
///     .fire(&[BitVector::from_u64(8, 200), BitVector::from_u64(8, 100)])
///     .unwrap();
/// assert_eq!(out[0].as_ref().map(|v| v.to_u64()), Some(44));
/// ```
pub trait ComputeStep: Send {
    fn fire(&mut self, inputs: &[BitVector]) -> Firing;
}

/// Result of one firing: one optional value per output port.
pub type Firing = Result<Vec<Option<BitVector>>, ComputeError>;

impl<F> ComputeStep for F
where
    F: FnMut(&[BitVector]) -> Firing + Send,
{
    fn fire(&mut self, inputs: &[BitVector]) -> Firing {
        (*self)(inputs)
    }
}

/// Boxes a closure as a compute step.
pub fn compute_fn<F>(f: F) -> Box<dyn ComputeStep>
where
    F: FnMut(&[BitVector]) -> Firing + Send + 'static,
{
    Box::new(f)
}

#[derive(Debug)]
enum Phase {
    Gather,
    Emit { next: usize },
}

/// Queue-driven actor around a [`ComputeStep`].
pub struct SoftwareActor {
    node: NodeId,
    name: String,
    inputs: Vec<QueueId>,
    outputs: Vec<(QueueId, Width)>,
    compute: Box<dyn ComputeStep>,
    phase: Phase,
    gathered: Vec<BitVector>,
    pending: Vec<Option<BitVector>>,
    firings: u64,
    firing_limit: Option<u64>,
}

impl SoftwareActor {
    /// Creates an actor bound to its input queues and `(queue, width)` outputs.
    pub fn new(
        node: NodeId,
        name: impl Into<String>,
        inputs: Vec<QueueId>,
        outputs: Vec<(QueueId, Width)>,
        compute: Box<dyn ComputeStep>,
    ) -> Self {
        Self {
            node,
            name: name.into(),
            gathered: Vec::with_capacity(inputs.len()),
            pending: Vec::new(),
            inputs,
            outputs,
            compute,
            phase: Phase::Gather,
            firings: 0,
            firing_limit: None,
        }
    }

    /// Halts the actor after `limit` firings.
    pub fn with_firing_limit(mut self, limit: Option<u64>) -> Self {
        self.firing_limit = limit;
        self
    }

    /// Number of completed firings.
    pub fn firings(&self) -> u64 {
        self.firings
    }

    fn limit_reached(&self) -> bool {
        self.firing_limit.is_some_and(|limit| self.firings >= limit)
    }

    fn check_results(&self, results: &[Option<BitVector>]) -> Result<(), ComputeError> {
        if results.len() != self.outputs.len() {
            return Err(ComputeError::ArityMismatch {
                expected: self.outputs.len(),
                got: results.len(),
            });
        }
        for (port, (value, (_, width))) in results.iter().zip(&self.outputs).enumerate() {
            if let Some(value) = value {
                if value.width() != *width {
                    return Err(ComputeError::WidthMismatch {
                        port,
                        expected: *width,
                        got: value.width(),
                    });
                }
            }
        }
        Ok(())
    }
}

impl Process for SoftwareActor {
    fn name(&self) -> &str {
        &self.name
    }

    fn step(&mut self, ctx: &mut Context<'_>) -> Result<Wait, SimError> {
        loop {
            match self.phase {
                Phase::Gather => {
                    if self.limit_reached() {
                        return Ok(Wait::Halt);
                    }
                    while self.gathered.len() < self.inputs.len() {
                        let queue = self.inputs[self.gathered.len()];
                        match ctx.channels.try_read(queue) {
                            Some(value) => self.gathered.push(value),
                            None => return Ok(Wait::Readable(queue)),
                        }
                    }

                    let inputs = std::mem::take(&mut self.gathered);
                    let results = self
                        .compute
                        .fire(&inputs)
                        .and_then(|results| self.check_results(&results).map(|_| results))
                        .map_err(|e| SimError::compute(&self.name, e))?;
                    self.firings += 1;
                    trace!(actor = %self.name, firing = self.firings, "fired");

                    if self.outputs.is_empty() {
                        let time = ctx.channels.now();
                        debug!(actor = %self.name, time, "terminal actor fired");
                        return Ok(Wait::Finish);
                    }
                    self.pending = results;
                    self.phase = Phase::Emit { next: 0 };
                }
                Phase::Emit { next } => {
                    for port in next..self.outputs.len() {
                        let Some(value) = self.pending[port].take() else {
                            continue;
                        };
                        let queue = self.outputs[port].0;
                        if let Err(value) = ctx.channels.try_write(queue, value) {
                            self.pending[port] = Some(value);
                            self.phase = Phase::Emit { next: port };
                            return Ok(Wait::Writable(queue));
                        }
                    }
                    self.phase = Phase::Gather;
                }
            }
        }
    }
}

impl Actor for SoftwareActor {
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
    use crate::actor::interactive::InteractiveRegistry;
    use crate::channel::Channels;

    fn v(x: u64) -> BitVector {
        BitVector::from_u64(8, x)
    }

    fn step(actor: &mut SoftwareActor, channels: &mut Channels) -> Wait {
        let mut interactive = InteractiveRegistry::new();
        let mut ctx = Context {
            channels,
            interactive: &mut interactive,
        };
        actor.step(&mut ctx).unwrap()
    }

    fn doubler() -> Box<dyn ComputeStep> {
        compute_fn(|inputs: &[BitVector]| Ok(vec![Some(inputs[0].wrapping_add(&inputs[0]))]))
    }

    #[test]
    fn test_blocks_on_empty_input() {
        let mut channels = Channels::new(None);
        let input = channels.add_queue("in", 8, 4, false);
        let output = channels.add_queue("out", 8, 4, false);
        let mut actor = SoftwareActor::new(1, "double", vec![input], vec![(output, 8)], doubler());

        assert_eq!(step(&mut actor, &mut channels), Wait::Readable(input));

        channels.try_write(input, v(3)).unwrap();
        channels.try_write(input, v(4)).unwrap();
        assert_eq!(step(&mut actor, &mut channels), Wait::Readable(input));

        assert_eq!(channels.try_read(output), Some(v(6)));
        assert_eq!(channels.try_read(output), Some(v(8)));
        assert_eq!(actor.firings(), 2);
    }

    #[test]
    fn test_backpressure_resumes_at_same_port() {
        let mut channels = Channels::new(None);
        let input = channels.add_queue("in", 8, 4, false);
        let output = channels.add_queue("out", 8, 1, false);
        let mut actor = SoftwareActor::new(1, "double", vec![input], vec![(output, 8)], doubler());

        channels.try_write(input, v(1)).unwrap();
        channels.try_write(input, v(2)).unwrap();

        // Second result does not fit
        assert_eq!(step(&mut actor, &mut channels), Wait::Writable(output));
        assert_eq!(channels.try_read(output), Some(v(2)));

        assert_eq!(step(&mut actor, &mut channels), Wait::Readable(input));
        assert_eq!(channels.try_read(output), Some(v(4)));
    }

    #[test]
    fn test_source_halts_at_limit() {
        let mut channels = Channels::new(None);
        let output = channels.add_queue("out", 8, 4, false);
        let mut actor = SoftwareActor::new(
            1,
            "const",
            vec![],
            vec![(output, 8)],
            compute_fn(|_: &[BitVector]| Ok(vec![Some(BitVector::from_u64(8, 9))])),
        )
        .with_firing_limit(Some(2));

        assert_eq!(step(&mut actor, &mut channels), Wait::Halt);
        assert_eq!(channels.num_available(output), 2);
    }

    #[test]
    fn test_terminal_actor_finishes() {
        let mut channels = Channels::new(None);
        let input = channels.add_queue("in", 8, 4, false);
        let mut actor = SoftwareActor::new(
            2,
            "sink",
            vec![input],
            vec![],
            compute_fn(|_: &[BitVector]| Ok(vec![])),
        );

        channels.try_write(input, v(1)).unwrap();
        assert_eq!(step(&mut actor, &mut channels), Wait::Finish);
    }

    #[test]
    fn test_none_result_sends_nothing() {
        let mut channels = Channels::new(None);
        let input = channels.add_queue("in", 8, 4, false);
        let a = channels.add_queue("a", 8, 4, false);
        let b = channels.add_queue("b", 8, 4, false);
        let mut actor = SoftwareActor::new(
            1,
            "split",
            vec![input],
            vec![(a, 8), (b, 8)],
            compute_fn(|inputs: &[BitVector]| Ok(vec![None, Some(inputs[0].clone())])),
        );

        channels.try_write(input, v(5)).unwrap();
        step(&mut actor, &mut channels);
        assert_eq!(channels.num_available(a), 0);
        assert_eq!(channels.try_read(b), Some(v(5)));
    }

    #[test]
    fn test_result_checks() {
        let mut channels = Channels::new(None);
        let output = channels.add_queue("out", 8, 4, false);
        let mut interactive = InteractiveRegistry::new();

        let mut wrong_width = SoftwareActor::new(
            1,
            "bad",
            vec![],
            vec![(output, 8)],
            compute_fn(|_: &[BitVector]| Ok(vec![Some(BitVector::from_u64(4, 1))])),
        );
        let mut ctx = Context {
            channels: &mut channels,
            interactive: &mut interactive,
        };
        let err = wrong_width.step(&mut ctx).unwrap_err();
        assert!(matches!(
            err,
            SimError::Compute {
                source: ComputeError::WidthMismatch { port: 0, expected: 8, got: 4 },
                ..
            }
        ));

        let mut wrong_arity = SoftwareActor::new(
            1,
            "bad",
            vec![],
            vec![(output, 8)],
            compute_fn(|_: &[BitVector]| Ok(vec![])),
        );
        let err = wrong_arity.step(&mut ctx).unwrap_err();
        assert!(matches!(
            err,
            SimError::Compute {
                source: ComputeError::ArityMismatch { expected: 1, got: 0 },
                ..
            }
        ));
    }
}
