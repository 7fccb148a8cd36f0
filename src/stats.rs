//! Statistics collection and export for a graph run.

use serde::Serialize;
use std::io::Write;
use std::path::Path;

use crate::engine::{RunOutcome, SimulationEngine};
use crate::types::SimTime;

/// Aggregate statistics for a simulation run.
#[derive(Clone, Debug, Default, Serialize)]
pub struct SimulationStats {
    /// Graph name
    pub name: String,

    /// How the run ended, if it ran
    pub outcome: Option<RunOutcome>,

    /// Simulation time when the run ended
    pub final_time: SimTime,

    /// Delta cycles evaluated across all time steps
    pub delta_cycles: u64,

    /// Rising clock edges seen
    pub clock_edges: u64,

    /// Per-process activation counts, in evaluation order
    pub processes: Vec<ProcessStats>,

    /// Per-queue traffic
    pub queues: Vec<QueueSummary>,
}

/// Activation count of one process.
#[derive(Clone, Debug, Default, Serialize)]
pub struct ProcessStats {
    pub name: String,
    pub activations: u64,
}

/// Traffic through one queue channel.
#[derive(Clone, Debug, Default, Serialize)]
pub struct QueueSummary {
    pub name: String,
    pub capacity: usize,
    pub writes: u64,
    pub reads: u64,
    pub peak_occupancy: usize,
}

impl SimulationStats {
    /// Collects statistics from an engine.
    pub fn collect(name: &str, engine: &SimulationEngine) -> Self {
        let stats = engine.stats();
        Self {
            name: name.to_string(),
            outcome: engine.outcome().cloned(),
            final_time: engine.current_time(),
            delta_cycles: stats.delta_cycles,
            clock_edges: stats.clock_edges,
            processes: engine
                .process_activity()
                .into_iter()
                .map(|(name, activations)| ProcessStats { name, activations })
                .collect(),
            queues: engine
                .channels()
                .queues()
                .map(|q| {
                    let s = q.stats();
                    QueueSummary {
                        name: q.name().to_string(),
                        capacity: q.capacity(),
                        writes: s.writes,
                        reads: s.reads,
                        peak_occupancy: s.peak_occupancy,
                    }
                })
                .collect(),
        }
    }

    /// Exports statistics to JSON.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    /// Exports statistics to a JSON file.
    pub fn to_json_file<P: AsRef<Path>>(&self, path: P) -> std::io::Result<()> {
        let json = self
            .to_json()
            .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e))?;
        std::fs::write(path, json)
    }

    /// Writes a human-readable summary to a writer.
    pub fn write_summary<W: Write>(&self, mut w: W) -> std::io::Result<()> {
        writeln!(w, "=== Simulation Statistics ===")?;
        if !self.name.is_empty() {
            writeln!(w, "Graph: {}", self.name)?;
        }
        match &self.outcome {
            Some(RunOutcome::Finished { by, time }) => {
                writeln!(w, "Outcome: finished by {} at {}", by, time)?
            }
            Some(RunOutcome::Quiescent { time }) => writeln!(w, "Outcome: quiescent at {}", time)?,
            Some(RunOutcome::TimedOut { time }) => writeln!(w, "Outcome: timed out at {}", time)?,
            None => writeln!(w, "Outcome: not run")?,
        }
        writeln!(w, "Final simulation time: {}", self.final_time)?;
        writeln!(w, "Delta cycles: {}", self.delta_cycles)?;
        writeln!(w, "Clock edges: {}", self.clock_edges)?;
        writeln!(w)?;

        writeln!(w, "--- Processes ---")?;
        for p in &self.processes {
            writeln!(w, "{}: {}", p.name, p.activations)?;
        }
        writeln!(w)?;

        writeln!(w, "--- Queues ---")?;
        for q in &self.queues {
            writeln!(
                w,
                "{} (capacity {}): {} written, {} read, peak {}",
                q.name, q.capacity, q.writes, q.reads, q.peak_occupancy
            )?;
        }

        Ok(())
    }

    /// Returns the summary as a string.
    pub fn summary(&self) -> String {
        let mut buf = Vec::new();
        // Writing to a Vec cannot fail
        let _ = self.write_summary(&mut buf);
        String::from_utf8_lossy(&buf).into_owned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> SimulationStats {
        SimulationStats {
            name: "adder".to_string(),
            outcome: Some(RunOutcome::Finished {
                by: "sink".to_string(),
                time: 1000,
            }),
            final_time: 1000,
            delta_cycles: 12,
            clock_edges: 1,
            processes: vec![ProcessStats {
                name: "sink".to_string(),
                activations: 3,
            }],
            queues: vec![QueueSummary {
                name: "wire_0_0_1_0".to_string(),
                capacity: 16,
                writes: 1,
                reads: 1,
                peak_occupancy: 1,
            }],
        }
    }

    #[test]
    fn test_stats_json_export() {
        let json = sample().to_json().unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value["outcome"]["kind"], "finished");
        assert_eq!(value["queues"][0]["writes"], 1);
    }

    #[test]
    fn test_summary_output() {
        let summary = sample().summary();
        assert!(summary.contains("Graph: adder"));
        assert!(summary.contains("finished by sink at 1000"));
        assert!(summary.contains("wire_0_0_1_0 (capacity 16)"));
    }

    #[test]
    fn test_json_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("stats.json");
        sample().to_json_file(&path).unwrap();
        assert!(std::fs::read_to_string(path).unwrap().contains("adder"));
    }
}
