//! # cosim
//!
//! Software/hardware dataflow co-simulation on a single discrete-event kernel.
//!
//! A graph mixes two kinds of actors:
//!
//! - **Software** actors fire by reading one value from every input queue,
//!   computing, and writing one value to every output queue. Queue reads and
//!   writes block.
//! - **Hardware** actors are clocked. On every rising edge they sample their
//!   valid/ready signal channels and drive new values that become visible one
//!   delta cycle later.
//!
//! Edges between the two worlds are bridged automatically by adaptors that
//! turn a queue into a valid/ready channel and back. Every value crossing an
//! edge is a fixed-width [`BitVector`].
//!
//! ## Quick Start
//!
//! ```rust
//! use cosim::config::SimulationParams;
//! use cosim::graph::GraphBuilder;
//! use cosim::node::{EdgeDesc, NodeDesc};
//! use cosim::nodes::{Constant, RegisterStage, ReportLog, Reporter};
//! use cosim::actor::Behavior;
//!
//! let log = ReportLog::new();
//! let mut graph = GraphBuilder::new("increment")
//!     .add_node(
//!         NodeDesc::software(0, "source").with_output("y", 8),
//!         Behavior::software(Constant::new(8, 41)),
//!     )
//!     .add_node(
//!         NodeDesc::hardware(1, "inc").with_input("d", 8).with_output("q", 8),
//!         Behavior::hardware(RegisterStage::increment()),
//!     )
//!     .add_node(
//!         NodeDesc::software(2, "sink").with_input("x", 8),
//!         Behavior::software(Reporter::new("sink", log.clone())),
//!     )
//!     .connect(EdgeDesc::new(0, 0, 1, 0))
//!     .connect(EdgeDesc::new(1, 0, 2, 0))
//!     .elaborate(None)
//!     .unwrap();
//!
//! let outcome = graph.run(&SimulationParams::default()).unwrap();
//! assert!(outcome.is_finished());
//! assert_eq!(log.reports()[0].first_u64(), Some(42));
//! ```
//!
//! ## Configuration-Driven Setup
//!
//! ```rust,ignore
//! use cosim::config::SimConfig;
//! use cosim::graph::GraphInstance;
//! use cosim::nodes::ReportLog;
//! use cosim::registry::create_default_registry;
//!
//! let config = SimConfig::from_file("graph.yaml")?;
//! let registry = create_default_registry(ReportLog::new());
//! let mut graph = GraphInstance::from_config(&config, &registry, None)?;
//! graph.run(&config.simulation)?;
//! ```

pub mod actor;
pub mod bits;
pub mod bridge;
pub mod channel;
pub mod config;
pub mod engine;
pub mod error;
pub mod graph;
pub mod node;
pub mod nodes;
pub mod process;
pub mod registry;
pub mod stats;
pub mod trace;
pub mod types;

// Re-export commonly used types
pub use actor::{Behavior, ClockedLogic, ComputeStep, HardwareIo, InteractiveBody, Request, Resume};
pub use bits::BitVector;
pub use channel::{Channels, QueueChannel, SignalChannel};
pub use config::{ConfigError, SimConfig, SimConfigBuilder, SimulationParams};
pub use engine::{EngineStats, RunOutcome, SimulationEngine};
pub use error::{ComputeError, ElaborationError, SimError};
pub use graph::{ActorInfo, GraphBuilder, GraphInstance};
pub use node::{EdgeDesc, NodeDesc, NodeKind, NodePort};
pub use registry::{create_default_registry, BehaviorRegistry};
pub use stats::SimulationStats;
pub use trace::{JsonLinesTrace, MemoryTrace, TraceContext, TraceRecord, TraceSink};
pub use types::{NodeId, SimTime};

/// Initialize the tracing subscriber for logging.
///
/// Call this at the start of your program to enable logging. `RUST_LOG`
/// takes precedence over `level`.
///
/// # Example
///
/// ```rust,ignore
/// cosim::init_logging("info");
/// ```
pub fn init_logging(level: &str) {
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .init();
}
