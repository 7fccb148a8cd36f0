//! Delta-cycle simulation kernel.
//!
//! The `SimulationEngine` owns the channel arena and every process of an
//! elaborated graph and advances them in evaluate/update rounds:
//!
//! 1. **Evaluate**: every runnable process is stepped, in registration order,
//!    until it suspends.
//! 2. **Update**: staged wire and flag writes are committed.
//! 3. **Wake**: suspended processes whose condition now holds become runnable.
//!
//! Time only advances once no process is runnable. The only timed activity is
//! the free-running clock and the single reset release, both expressed as
//! scheduled flag writes.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use tracing::{debug, info, trace, warn};

use crate::actor::interactive::InteractiveRegistry;
use crate::channel::Channels;
use crate::config::SimulationParams;
use crate::error::{ElaborationError, SimError};
use crate::process::{Context, Process, Wait};
use crate::types::{FlagId, ProcessId, SimTime};

/// How a run ended.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum RunOutcome {
    /// A terminal actor completed a firing.
    Finished { by: String, time: SimTime },
    /// Nothing is runnable and nothing waits for the clock.
    Quiescent { time: SimTime },
    /// The next scheduled event lies past the time limit.
    TimedOut { time: SimTime },
}

impl RunOutcome {
    /// Simulation time at which the run ended.
    pub fn time(&self) -> SimTime {
        match self {
            RunOutcome::Finished { time, .. }
            | RunOutcome::Quiescent { time }
            | RunOutcome::TimedOut { time } => *time,
        }
    }

    /// Returns true if a terminal actor ended the run.
    pub fn is_finished(&self) -> bool {
        matches!(self, RunOutcome::Finished { .. })
    }
}

/// Statistics collected by the simulation engine.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EngineStats {
    /// Evaluate phases executed, over all time steps
    pub delta_cycles: u64,
    /// Rising clock edges
    pub clock_edges: u64,
    /// Distinct simulation times visited
    pub time_steps: u64,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum State {
    Runnable,
    Waiting(Wait),
    Halted,
}

struct Slot {
    process: Box<dyn Process>,
    state: State,
    activations: u64,
}

/// The delta-cycle kernel.
///
/// # Example
///
/// ```
/// use cosim::actor::interactive::InteractiveRegistry;
/// use cosim::channel::Channels;
/// use cosim::config::SimulationParams;
/// use cosim::engine::{RunOutcome, SimulationEngine};
///
/// let mut channels = Channels::new(None);
/// let clk = channels.add_flag("clk", false, false);
/// let rst = channels.add_flag("rst", true, false);
///
/// let mut engine = SimulationEngine::new(channels, InteractiveRegistry::new(), clk, rst);
/// let outcome = engine.run(&SimulationParams::default()).unwrap();
///
/// // No process at all: nothing can happen
/// assert_eq!(outcome, RunOutcome::Quiescent { time: 0 });
/// ```
pub struct SimulationEngine {
    channels: Channels,
    interactive: InteractiveRegistry,
    slots: Vec<Slot>,
    clock: FlagId,
    reset: FlagId,
    clock_period: SimTime,
    scheduled: BTreeMap<SimTime, Vec<(FlagId, bool)>>,
    outcome: Option<RunOutcome>,
    stats: EngineStats,
}

impl SimulationEngine {
    /// Creates an engine over an arena that already holds the clock and reset
    /// flags.
    pub fn new(
        channels: Channels,
        interactive: InteractiveRegistry,
        clock: FlagId,
        reset: FlagId,
    ) -> Self {
        Self {
            channels,
            interactive,
            slots: Vec::new(),
            clock,
            reset,
            clock_period: 0,
            scheduled: BTreeMap::new(),
            outcome: None,
            stats: EngineStats::default(),
        }
    }

    /// Registers a process. Processes are evaluated in registration order.
    pub fn add_process(&mut self, process: Box<dyn Process>) -> ProcessId {
        let id = self.slots.len();
        debug!(process = process.name(), id, "registering process");
        self.slots.push(Slot {
            process,
            state: State::Halted,
            activations: 0,
        });
        id
    }

    pub fn channels(&self) -> &Channels {
        &self.channels
    }

    pub fn channels_mut(&mut self) -> &mut Channels {
        &mut self.channels
    }

    pub fn interactive(&self) -> &InteractiveRegistry {
        &self.interactive
    }

    pub fn interactive_mut(&mut self) -> &mut InteractiveRegistry {
        &mut self.interactive
    }

    pub fn clock(&self) -> FlagId {
        self.clock
    }

    pub fn reset(&self) -> FlagId {
        self.reset
    }

    /// Returns the current simulation time.
    pub fn current_time(&self) -> SimTime {
        self.channels.now()
    }

    /// Returns the number of registered processes.
    pub fn process_count(&self) -> usize {
        self.slots.len()
    }

    /// Returns `(name, activations)` for every process, in registration order.
    pub fn process_activity(&self) -> Vec<(String, u64)> {
        self.slots
            .iter()
            .map(|s| (s.process.name().to_string(), s.activations))
            .collect()
    }

    /// Outcome of the last run, if any.
    pub fn outcome(&self) -> Option<&RunOutcome> {
        self.outcome.as_ref()
    }

    /// Returns the engine statistics.
    pub fn stats(&self) -> &EngineStats {
        &self.stats
    }

    fn schedule(&mut self, time: SimTime, flag: FlagId, value: bool) {
        self.scheduled.entry(time).or_default().push((flag, value));
    }

    /// Runs until a terminal actor finishes, nothing can happen any more, or
    /// the time limit is reached.
    pub fn run(&mut self, params: &SimulationParams) -> Result<RunOutcome, SimError> {
        params.check().map_err(ElaborationError::InvalidParams)?;

        self.clock_period = params.clock_period;
        let half = params.clock_period / 2;
        let in_reset = params.reset_cycles > 0;

        self.scheduled.clear();
        self.stats = EngineStats::default();
        self.channels.set_time(0);
        self.channels.init_flag(self.clock, false);
        self.channels.init_flag(self.reset, in_reset);
        self.schedule(0, self.clock, true);
        if in_reset {
            let release = params.reset_cycles.saturating_mul(params.clock_period);
            self.schedule(release, self.reset, false);
        }

        for slot in &mut self.slots {
            slot.activations = 0;
            slot.state = match slot.process.initial_wait() {
                None => State::Runnable,
                Some(wait) => State::Waiting(wait),
            };
        }

        info!(
            processes = self.slots.len(),
            clock_period = params.clock_period,
            reset_cycles = params.reset_cycles,
            "starting simulation"
        );

        let mut now = 0;
        loop {
            self.channels.set_time(now);
            self.stats.time_steps += 1;

            let writes = self.scheduled.remove(&now).unwrap_or_default();
            for (flag, value) in writes {
                if flag == self.clock {
                    self.schedule(now + half, flag, !value);
                }
                self.channels.write_flag(flag, value);
            }
            let changed = self.channels.update();
            let posedge = changed.contains(&self.clock) && self.channels.read_flag(self.clock);
            if posedge {
                self.stats.clock_edges += 1;
                trace!(time = now, "clock edge");
            }
            self.wake(&changed, posedge);

            if let Some(outcome) = self.settle(now, params.max_deltas)? {
                return Ok(self.conclude(outcome));
            }

            let clocked = self
                .slots
                .iter()
                .any(|s| s.state == State::Waiting(Wait::ClockEdge));
            if !clocked {
                return Ok(self.conclude(RunOutcome::Quiescent { time: now }));
            }

            let next = match self.scheduled.keys().next() {
                Some(&t) => t,
                None => return Ok(self.conclude(RunOutcome::Quiescent { time: now })),
            };
            if params.max_time.is_some_and(|limit| next > limit) {
                return Ok(self.conclude(RunOutcome::TimedOut { time: now }));
            }
            now = next;
        }
    }

    /// Runs delta cycles at `now` until nothing is runnable.
    fn settle(&mut self, now: SimTime, max_deltas: u32) -> Result<Option<RunOutcome>, SimError> {
        let mut deltas = 0u32;
        loop {
            let runnable: Vec<usize> = self
                .slots
                .iter()
                .enumerate()
                .filter(|(_, s)| s.state == State::Runnable)
                .map(|(i, _)| i)
                .collect();
            if runnable.is_empty() {
                return Ok(None);
            }

            deltas += 1;
            if deltas > max_deltas {
                return Err(SimError::DeltaLimit {
                    limit: max_deltas,
                    time: now,
                });
            }
            self.stats.delta_cycles += 1;
            trace!(time = now, delta = deltas, runnable = runnable.len(), "evaluate");

            for index in runnable {
                let slot = &mut self.slots[index];
                let mut ctx = Context {
                    channels: &mut self.channels,
                    interactive: &mut self.interactive,
                };
                slot.activations += 1;
                match slot.process.step(&mut ctx)? {
                    Wait::Finish => {
                        return Ok(Some(RunOutcome::Finished {
                            by: slot.process.name().to_string(),
                            time: now,
                        }));
                    }
                    Wait::Halt => {
                        debug!(process = slot.process.name(), time = now, "process halted");
                        slot.state = State::Halted;
                    }
                    wait => slot.state = State::Waiting(wait),
                }
            }

            let changed = self.channels.update();
            self.wake(&changed, false);
        }
    }

    fn wake(&mut self, changed: &[FlagId], posedge: bool) {
        for slot in &mut self.slots {
            let State::Waiting(wait) = slot.state else {
                continue;
            };
            let ready = match wait {
                Wait::ClockEdge => posedge,
                Wait::Change(flag) => changed.contains(&flag),
                Wait::Readable(queue) => self.channels.num_available(queue) > 0,
                Wait::Writable(queue) => self.channels.num_free(queue) > 0,
                Wait::Halt | Wait::Finish => false,
            };
            if ready {
                slot.state = State::Runnable;
            }
        }
    }

    fn conclude(&mut self, outcome: RunOutcome) -> RunOutcome {
        if let Some(trace) = self.channels.trace() {
            if let Err(e) = trace.flush() {
                warn!(error = %e, "failed to flush trace sink");
            }
        }
        info!(
            outcome = ?outcome,
            delta_cycles = self.stats.delta_cycles,
            clock_edges = self.stats.clock_edges,
            "simulation finished"
        );
        self.outcome = Some(outcome.clone());
        outcome
    }

    /// Exports statistics from the engine and all processes.
    pub fn export_stats(&self) -> serde_json::Value {
        let mut processes = serde_json::Map::new();
        for slot in &self.slots {
            processes.insert(
                slot.process.name().to_string(),
                serde_json::json!(slot.activations),
            );
        }

        serde_json::json!({
            "engine": {
                "current_time": self.channels.now(),
                "clock_period": self.clock_period,
                "delta_cycles": self.stats.delta_cycles,
                "clock_edges": self.stats.clock_edges,
                "time_steps": self.stats.time_steps,
                "process_count": self.slots.len(),
                "queue_count": self.channels.queues().count(),
            },
            "outcome": self.outcome,
            "processes": processes,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use parking_lot::Mutex;
    use std::sync::Arc;

    fn engine() -> SimulationEngine {
        let mut channels = Channels::new(None);
        let clk = channels.add_flag("clk", false, false);
        let rst = channels.add_flag("rst", true, false);
        SimulationEngine::new(channels, InteractiveRegistry::new(), clk, rst)
    }

    fn params() -> SimulationParams {
        SimulationParams::default()
    }

    /// Counts rising clock edges; finishes after `stop_after` of them.
    struct EdgeCounter {
        seen: Arc<Mutex<Vec<SimTime>>>,
        stop_after: Option<usize>,
    }

    impl Process for EdgeCounter {
        fn name(&self) -> &str {
            "edge_counter"
        }

        fn initial_wait(&self) -> Option<Wait> {
            Some(Wait::ClockEdge)
        }

        fn step(&mut self, ctx: &mut Context<'_>) -> Result<Wait, SimError> {
            let mut seen = self.seen.lock();
            seen.push(ctx.channels.now());
            if self.stop_after == Some(seen.len()) {
                return Ok(Wait::Finish);
            }
            Ok(Wait::ClockEdge)
        }
    }

    /// Records the value of a flag on every change.
    struct FlagWatcher {
        flag: FlagId,
        seen: Arc<Mutex<Vec<(SimTime, bool)>>>,
    }

    impl Process for FlagWatcher {
        fn name(&self) -> &str {
            "flag_watcher"
        }

        fn step(&mut self, ctx: &mut Context<'_>) -> Result<Wait, SimError> {
            self.seen
                .lock()
                .push((ctx.channels.now(), ctx.channels.read_flag(self.flag)));
            Ok(Wait::Change(self.flag))
        }
    }

    /// Flips a flag and waits for the flip: a zero-delay loop.
    struct Oscillator {
        flag: FlagId,
    }

    impl Process for Oscillator {
        fn name(&self) -> &str {
            "oscillator"
        }

        fn step(&mut self, ctx: &mut Context<'_>) -> Result<Wait, SimError> {
            let value = ctx.channels.read_flag(self.flag);
            ctx.channels.write_flag(self.flag, !value);
            Ok(Wait::Change(self.flag))
        }
    }

    // ==== Outcome Tests ====

    #[test]
    fn test_empty_engine_is_quiescent() {
        let mut engine = engine();
        let outcome = engine.run(&params()).unwrap();
        assert_eq!(outcome, RunOutcome::Quiescent { time: 0 });
        assert_eq!(engine.outcome(), Some(&outcome));
    }

    #[test]
    fn test_clock_edges_until_timeout() {
        let mut engine = engine();
        let seen = Arc::new(Mutex::new(Vec::new()));
        engine.add_process(Box::new(EdgeCounter {
            seen: seen.clone(),
            stop_after: None,
        }));

        let mut p = params();
        p.max_time = Some(4500);
        let outcome = engine.run(&p).unwrap();

        assert_eq!(outcome, RunOutcome::TimedOut { time: 4500 });
        assert_eq!(*seen.lock(), vec![0, 1000, 2000, 3000, 4000]);
        assert_eq!(engine.stats().clock_edges, 5);
    }

    #[test]
    fn test_finish_ends_run() {
        let mut engine = engine();
        let seen = Arc::new(Mutex::new(Vec::new()));
        engine.add_process(Box::new(EdgeCounter {
            seen: seen.clone(),
            stop_after: Some(3),
        }));

        let outcome = engine.run(&params()).unwrap();
        assert_eq!(
            outcome,
            RunOutcome::Finished {
                by: "edge_counter".to_string(),
                time: 2000
            }
        );
        assert!(outcome.is_finished());
    }

    #[test]
    fn test_delta_limit() {
        let mut channels = Channels::new(None);
        let clk = channels.add_flag("clk", false, false);
        let rst = channels.add_flag("rst", true, false);
        let osc = channels.add_flag("osc", false, false);
        let mut engine = SimulationEngine::new(channels, InteractiveRegistry::new(), clk, rst);
        engine.add_process(Box::new(Oscillator { flag: osc }));

        let mut p = params();
        p.max_deltas = 50;
        let err = engine.run(&p).unwrap_err();
        assert!(matches!(err, SimError::DeltaLimit { limit: 50, time: 0 }));
    }

    #[test]
    fn test_invalid_clock_period() {
        let mut engine = engine();
        let mut p = params();
        p.clock_period = 999;
        let err = engine.run(&p).unwrap_err();
        assert!(matches!(
            err,
            SimError::Elaboration(ElaborationError::InvalidParams(_))
        ));
    }

    // ==== Clock and Reset Tests ====

    #[test]
    fn test_reset_release() {
        let mut engine = engine();
        let reset = engine.reset();
        let seen = Arc::new(Mutex::new(Vec::new()));
        engine.add_process(Box::new(FlagWatcher {
            flag: reset,
            seen: seen.clone(),
        }));
        // Keep the clock relevant so the run does not go quiescent
        engine.add_process(Box::new(EdgeCounter {
            seen: Arc::new(Mutex::new(Vec::new())),
            stop_after: Some(6),
        }));

        let mut p = params();
        p.reset_cycles = 3;
        engine.run(&p).unwrap();

        assert_eq!(*seen.lock(), vec![(0, true), (3000, false)]);
    }

    #[test]
    fn test_no_reset_cycles() {
        let mut engine = engine();
        let reset = engine.reset();
        let seen = Arc::new(Mutex::new(Vec::new()));
        engine.add_process(Box::new(FlagWatcher {
            flag: reset,
            seen: seen.clone(),
        }));

        let mut p = params();
        p.reset_cycles = 0;
        engine.run(&p).unwrap();

        assert_eq!(*seen.lock(), vec![(0, false)]);
    }

    #[test]
    fn test_clock_watcher_sees_both_edges() {
        let mut engine = engine();
        let clock = engine.clock();
        let seen = Arc::new(Mutex::new(Vec::new()));
        engine.add_process(Box::new(FlagWatcher {
            flag: clock,
            seen: seen.clone(),
        }));
        engine.add_process(Box::new(EdgeCounter {
            seen: Arc::new(Mutex::new(Vec::new())),
            stop_after: Some(2),
        }));

        engine.run(&params()).unwrap();

        // Initial evaluation already observes the rising edge at t=0
        assert_eq!(*seen.lock(), vec![(0, true), (500, false), (1000, true)]);
    }

    #[test]
    fn test_export_stats() {
        let mut engine = engine();
        engine.add_process(Box::new(EdgeCounter {
            seen: Arc::new(Mutex::new(Vec::new())),
            stop_after: Some(4),
        }));
        engine.run(&params()).unwrap();

        let stats = engine.export_stats();
        assert_eq!(stats["engine"]["clock_edges"], 4);
        assert_eq!(stats["engine"]["current_time"], 3000);
        assert_eq!(stats["processes"]["edge_counter"], 4);
        assert_eq!(stats["outcome"]["kind"], "finished");
    }
}
