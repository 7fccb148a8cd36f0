//! Runnable graph instances.

use tracing::info;

use crate::bits::BitVector;
use crate::channel::Channels;
use crate::config::{SimConfig, SimulationParams};
use crate::engine::{RunOutcome, SimulationEngine};
use crate::error::{ElaborationError, SimError};
use crate::node::NodeKind;
use crate::registry::BehaviorRegistry;
use crate::stats::SimulationStats;
use crate::trace::TraceContext;
use crate::types::{NodeId, ProcessId, WireId};

use super::GraphBuilder;

/// Summary of one elaborated actor.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ActorInfo {
    pub node: NodeId,
    pub name: String,
    pub kind: NodeKind,
    pub inputs: usize,
    pub outputs: usize,
    /// Index of the actor's process in the engine
    pub process: ProcessId,
}

/// An elaborated graph: channels, adaptors, bridges and actors, ready to run
/// once.
pub struct GraphInstance {
    name: String,
    engine: SimulationEngine,
    actors: Vec<ActorInfo>,
    reset_wire: WireId,
    ran: bool,
}

impl GraphInstance {
    pub(super) fn new(
        name: String,
        engine: SimulationEngine,
        actors: Vec<ActorInfo>,
        reset_wire: WireId,
    ) -> Self {
        Self {
            name,
            engine,
            actors,
            reset_wire,
            ran: false,
        }
    }

    /// Elaborates a graph from a configuration, creating each node's
    /// behaviour through `registry`.
    pub fn from_config(
        config: &SimConfig,
        registry: &BehaviorRegistry,
        trace: Option<TraceContext>,
    ) -> Result<Self, ElaborationError> {
        let mut builder =
            GraphBuilder::new(config.name.clone()).queue_capacity(config.queue_capacity);

        for node in &config.nodes {
            let desc = node.to_desc();
            let behavior = registry.create(&node.node_type, &desc)?;
            builder = builder.add_node(desc, behavior);
        }
        for edge in &config.edges {
            builder = builder.connect(edge.clone());
        }
        builder.elaborate(trace)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the elaborated actors, in node order.
    pub fn actors(&self) -> &[ActorInfo] {
        &self.actors
    }

    /// Looks up an actor by node id.
    pub fn actor(&self, node: NodeId) -> Option<&ActorInfo> {
        self.actors.iter().find(|a| a.node == node)
    }

    pub fn channels(&self) -> &Channels {
        self.engine.channels()
    }

    pub fn engine(&self) -> &SimulationEngine {
        &self.engine
    }

    /// Names of every registered process, in evaluation order.
    pub fn process_names(&self) -> Vec<String> {
        self.engine
            .process_activity()
            .into_iter()
            .map(|(name, _)| name)
            .collect()
    }

    /// Runs the simulation. An instance can only be run once.
    pub fn run(&mut self, params: &SimulationParams) -> Result<RunOutcome, SimError> {
        if self.ran {
            return Err(SimError::AlreadyRun(self.name.clone()));
        }
        params.check().map_err(ElaborationError::InvalidParams)?;
        self.ran = true;

        info!(graph = %self.name, actors = self.actors.len(), "running graph");
        // Hardware actors sample the vector reset, which the bridge only
        // updates one delta after the flag.
        self.engine
            .channels_mut()
            .init_wire(self.reset_wire, BitVector::from_bool(params.reset_cycles > 0));
        self.engine.run(params)
    }

    /// Collects the statistics of the last run.
    pub fn stats(&self) -> SimulationStats {
        SimulationStats::collect(&self.name, &self.engine)
    }

    /// Exports engine statistics as JSON.
    pub fn export_stats(&self) -> serde_json::Value {
        self.engine.export_stats()
    }
}

impl std::fmt::Debug for GraphInstance {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GraphInstance")
            .field("name", &self.name)
            .field("actors", &self.actors)
            .field("processes", &self.engine.process_count())
            .field("ran", &self.ran)
            .finish()
    }
}
