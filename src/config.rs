//! Configuration system for the co-simulation framework.
//!
//! This module provides YAML/JSON configuration file support for describing
//! graphs and run parameters declaratively.
//!
//! # Configuration File Structure
//!
//! ```yaml
//! simulation:
//!   clock_period: 1000
//!   reset_cycles: 5
//!   max_time: 100000
//!
//! name: add_64
//! queue_capacity: 16
//!
//! nodes:
//!   - id: 0
//!     type: Constant
//!     kind: software
//!     outputs: [{ name: value, width: 64 }]
//!     attrs:
//!       value: "7"
//!   - id: 2
//!     type: Add
//!     kind: software
//!     inputs: [{ name: a, width: 64 }, { name: b, width: 64 }]
//!     outputs: [{ name: sum, width: 64 }]
//!
//! edges:
//!   - { src: 0, src_port: 0, dst: 2, dst_port: 0 }
//! ```

use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::path::Path;
use thiserror::Error;

use crate::channel::DEFAULT_QUEUE_CAPACITY;
use crate::node::{EdgeDesc, NodeDesc, NodeKind, NodePort};
use crate::types::{NodeId, SimTime};

/// Errors that can occur during configuration loading.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("YAML parsing error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("JSON parsing error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Unknown file format: {0}")]
    UnknownFormat(String),
}

/// Result type for configuration operations.
pub type ConfigResult<T> = Result<T, ConfigError>;

/// Run parameters for one simulation.
///
/// Queue capacity is fixed at elaboration and lives on [`SimConfig`].
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SimulationParams {
    /// Clock period in picoseconds; even and at least 2
    #[serde(default = "default_clock_period")]
    pub clock_period: SimTime,

    /// Clock cycles during which reset is asserted from t=0
    #[serde(default = "default_reset_cycles")]
    pub reset_cycles: u64,

    /// Stop once the next event lies past this time (`None` runs unbounded)
    #[serde(default = "default_max_time")]
    pub max_time: Option<SimTime>,

    /// Delta cycles allowed at a single simulation time
    #[serde(default = "default_max_deltas")]
    pub max_deltas: u32,

    /// Logging level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

fn default_clock_period() -> SimTime {
    1000
}

fn default_reset_cycles() -> u64 {
    5
}

fn default_max_time() -> Option<SimTime> {
    Some(1_000_000)
}

fn default_max_deltas() -> u32 {
    10_000
}

fn default_queue_capacity() -> usize {
    DEFAULT_QUEUE_CAPACITY
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for SimulationParams {
    fn default() -> Self {
        Self {
            clock_period: default_clock_period(),
            reset_cycles: default_reset_cycles(),
            max_time: default_max_time(),
            max_deltas: default_max_deltas(),
            log_level: default_log_level(),
        }
    }
}

impl SimulationParams {
    /// Returns a description of the first invalid parameter, if any.
    pub(crate) fn check(&self) -> Result<(), String> {
        if self.clock_period < 2 || self.clock_period % 2 != 0 {
            return Err(format!(
                "clock_period must be even and at least 2, got {}",
                self.clock_period
            ));
        }
        if self.max_deltas == 0 {
            return Err("max_deltas must be at least 1".to_string());
        }
        Ok(())
    }
}

/// Configuration for a node.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct NodeConfig {
    /// Unique node identifier
    pub id: NodeId,

    /// Display name; defaults to `{type}_{id}`
    #[serde(default)]
    pub name: Option<String>,

    /// Behaviour type name, looked up in the registry
    #[serde(rename = "type")]
    pub node_type: String,

    /// Execution model
    pub kind: NodeKind,

    /// Input ports
    #[serde(default)]
    pub inputs: Vec<NodePort>,

    /// Output ports
    #[serde(default)]
    pub outputs: Vec<NodePort>,

    /// Custom attributes as key-value pairs
    #[serde(default)]
    pub attrs: HashMap<String, String>,

    /// Maximum number of firings (software only)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub firing_limit: Option<u64>,
}

impl NodeConfig {
    /// Converts to the node description used at elaboration.
    pub fn to_desc(&self) -> NodeDesc {
        let name = self
            .name
            .clone()
            .unwrap_or_else(|| format!("{}_{}", self.node_type, self.id));
        NodeDesc {
            id: self.id,
            name,
            kind: self.kind,
            attrs: self.attrs.clone(),
            inputs: self.inputs.clone(),
            outputs: self.outputs.clone(),
            firing_limit: self.firing_limit,
        }
    }
}

fn default_graph_name() -> String {
    "graph".to_string()
}

/// Complete simulation configuration.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct SimConfig {
    /// Run parameters
    #[serde(default)]
    pub simulation: SimulationParams,

    /// Graph name
    #[serde(default = "default_graph_name")]
    pub name: String,

    /// Capacity of every queue channel, applied at elaboration
    #[serde(default = "default_queue_capacity")]
    pub queue_capacity: usize,

    /// Node definitions
    #[serde(default)]
    pub nodes: Vec<NodeConfig>,

    /// Edge definitions
    #[serde(default)]
    pub edges: Vec<EdgeDesc>,
}

impl SimConfig {
    /// Creates a new empty configuration.
    pub fn new() -> Self {
        Self::default()
    }

    /// Loads configuration from a YAML file.
    pub fn from_yaml_file<P: AsRef<Path>>(path: P) -> ConfigResult<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_yaml(&content)
    }

    /// Loads configuration from a YAML string.
    pub fn from_yaml(yaml: &str) -> ConfigResult<Self> {
        let config: SimConfig = serde_yaml::from_str(yaml)?;
        config.validate()?;
        Ok(config)
    }

    /// Loads configuration from a JSON file.
    pub fn from_json_file<P: AsRef<Path>>(path: P) -> ConfigResult<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_json(&content)
    }

    /// Loads configuration from a JSON string.
    pub fn from_json(json: &str) -> ConfigResult<Self> {
        let config: SimConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Loads configuration from a file, auto-detecting format.
    pub fn from_file<P: AsRef<Path>>(path: P) -> ConfigResult<Self> {
        let path = path.as_ref();
        let ext = path.extension().and_then(|e| e.to_str()).unwrap_or("");

        match ext.to_lowercase().as_str() {
            "yaml" | "yml" => Self::from_yaml_file(path),
            "json" => Self::from_json_file(path),
            _ => Err(ConfigError::UnknownFormat(ext.to_string())),
        }
    }

    /// Validates run parameters and node ids.
    ///
    /// Topology checks (ports, widths, kinds) happen at elaboration.
    pub fn validate(&self) -> ConfigResult<()> {
        self.simulation.check().map_err(ConfigError::Validation)?;
        if self.queue_capacity == 0 {
            return Err(ConfigError::Validation(
                "queue_capacity must be at least 1".to_string(),
            ));
        }

        let mut node_ids = HashSet::new();
        for node in &self.nodes {
            if !node_ids.insert(node.id) {
                return Err(ConfigError::Validation(format!(
                    "Duplicate node ID: {}",
                    node.id
                )));
            }
        }

        for edge in &self.edges {
            for id in [edge.src, edge.dst] {
                if !node_ids.contains(&id) {
                    return Err(ConfigError::Validation(format!(
                        "Edge {} references non-existent node: {}",
                        edge.channel_name(),
                        id
                    )));
                }
            }
        }

        Ok(())
    }

    /// Saves configuration to a YAML file.
    pub fn to_yaml_file<P: AsRef<Path>>(&self, path: P) -> ConfigResult<()> {
        let yaml = serde_yaml::to_string(self)?;
        std::fs::write(path, yaml)?;
        Ok(())
    }

    /// Saves configuration to a JSON file.
    pub fn to_json_file<P: AsRef<Path>>(&self, path: P) -> ConfigResult<()> {
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json)?;
        Ok(())
    }

    /// Converts to YAML string.
    pub fn to_yaml(&self) -> ConfigResult<String> {
        Ok(serde_yaml::to_string(self)?)
    }

    /// Converts to JSON string.
    pub fn to_json(&self) -> ConfigResult<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Returns the number of nodes.
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    /// Returns the number of edges.
    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }

    /// Finds a node configuration by ID.
    pub fn find_node(&self, id: NodeId) -> Option<&NodeConfig> {
        self.nodes.iter().find(|n| n.id == id)
    }
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            simulation: SimulationParams::default(),
            name: default_graph_name(),
            queue_capacity: default_queue_capacity(),
            nodes: Vec::new(),
            edges: Vec::new(),
        }
    }
}

/// Builder for creating SimConfig programmatically.
#[derive(Default)]
pub struct SimConfigBuilder {
    config: SimConfig,
}

impl SimConfigBuilder {
    /// Creates a new builder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the graph name.
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.config.name = name.into();
        self
    }

    /// Sets the clock period.
    pub fn clock_period(mut self, period: SimTime) -> Self {
        self.config.simulation.clock_period = period;
        self
    }

    /// Sets the number of reset cycles.
    pub fn reset_cycles(mut self, cycles: u64) -> Self {
        self.config.simulation.reset_cycles = cycles;
        self
    }

    /// Sets the time limit.
    pub fn max_time(mut self, time: Option<SimTime>) -> Self {
        self.config.simulation.max_time = time;
        self
    }

    /// Sets the queue capacity.
    pub fn queue_capacity(mut self, capacity: usize) -> Self {
        self.config.queue_capacity = capacity;
        self
    }

    /// Sets the log level.
    pub fn log_level(mut self, level: impl Into<String>) -> Self {
        self.config.simulation.log_level = level.into();
        self
    }

    /// Adds a node of the given behaviour type.
    pub fn add_node(mut self, desc: &NodeDesc, node_type: impl Into<String>) -> Self {
        self.config.nodes.push(NodeConfig {
            id: desc.id,
            name: Some(desc.name.clone()),
            node_type: node_type.into(),
            kind: desc.kind,
            inputs: desc.inputs.clone(),
            outputs: desc.outputs.clone(),
            attrs: desc.attrs.clone(),
            firing_limit: desc.firing_limit,
        });
        self
    }

    /// Adds an edge.
    pub fn add_edge(mut self, edge: EdgeDesc) -> Self {
        self.config.edges.push(edge);
        self
    }

    /// Builds and validates the configuration.
    pub fn build(self) -> ConfigResult<SimConfig> {
        self.config.validate()?;
        Ok(self.config)
    }
}
