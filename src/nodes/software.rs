//! Software behaviours.

use std::sync::Arc;

use parking_lot::Mutex;
use tracing::info;

use crate::actor::software::{ComputeStep, Firing};
use crate::bits::BitVector;
use crate::error::ComputeError;
use crate::types::Width;

/// Emits the same value on its single output every firing.
///
/// As a source it fires once unless the node sets a firing limit.
#[derive(Clone, Debug)]
pub struct Constant {
    value: BitVector,
}

impl Constant {
    pub fn new(width: Width, value: u64) -> Self {
        Self {
            value: BitVector::from_u64(width, value),
        }
    }

    pub fn value(&self) -> &BitVector {
        &self.value
    }
}

impl ComputeStep for Constant {
    fn fire(&mut self, _inputs: &[BitVector]) -> Firing {
        Ok(vec![Some(self.value.clone())])
    }
}

/// Two-input operator. The result has the width of the first input and
/// arithmetic wraps.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BinaryOp {
    Add,
    Sub,
    And,
    Or,
    Xor,
}

impl BinaryOp {
    pub const ALL: [BinaryOp; 5] = [
        BinaryOp::Add,
        BinaryOp::Sub,
        BinaryOp::And,
        BinaryOp::Or,
        BinaryOp::Xor,
    ];

    /// Registry name of the operator.
    pub fn type_name(self) -> &'static str {
        match self {
            BinaryOp::Add => "Add",
            BinaryOp::Sub => "Sub",
            BinaryOp::And => "And",
            BinaryOp::Or => "Or",
            BinaryOp::Xor => "Xor",
        }
    }

    pub fn apply(self, a: &BitVector, b: &BitVector) -> BitVector {
        match self {
            BinaryOp::Add => a.wrapping_add(b),
            BinaryOp::Sub => a.wrapping_sub(b),
            BinaryOp::And => a.and(b),
            BinaryOp::Or => a.or(b),
            BinaryOp::Xor => a.xor(b),
        }
    }
}

impl ComputeStep for BinaryOp {
    fn fire(&mut self, inputs: &[BitVector]) -> Firing {
        match inputs {
            [a, b] => Ok(vec![Some(self.apply(a, b))]),
            _ => Err(ComputeError::ArityMismatch {
                expected: 2,
                got: inputs.len(),
            }),
        }
    }
}

/// One firing of a [`Reporter`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Report {
    pub reporter: String,
    pub values: Vec<BitVector>,
}

impl Report {
    /// The first reported value as an integer.
    pub fn first_u64(&self) -> Option<u64> {
        self.values.first().map(BitVector::to_u64)
    }
}

/// Shared log of everything reporters received.
#[derive(Clone, Debug, Default)]
pub struct ReportLog {
    inner: Arc<Mutex<Vec<Report>>>,
}

impl ReportLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&self, report: Report) {
        self.inner.lock().push(report);
    }

    pub fn reports(&self) -> Vec<Report> {
        self.inner.lock().clone()
    }

    /// Reports from the reporter called `name`.
    pub fn from_reporter(&self, name: &str) -> Vec<Report> {
        self.inner
            .lock()
            .iter()
            .filter(|r| r.reporter == name)
            .cloned()
            .collect()
    }

    pub fn len(&self) -> usize {
        self.inner.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.lock().is_empty()
    }
}

/// Terminal sink: logs and records its inputs.
#[derive(Debug)]
pub struct Reporter {
    name: String,
    log: ReportLog,
}

impl Reporter {
    pub fn new(name: impl Into<String>, log: ReportLog) -> Self {
        Self {
            name: name.into(),
            log,
        }
    }
}

impl ComputeStep for Reporter {
    fn fire(&mut self, inputs: &[BitVector]) -> Firing {
        let rendered: Vec<String> = inputs
            .iter()
            .map(|v| format!("{} ({})", v.to_u64(), v))
            .collect();
        info!(reporter = %self.name, values = ?rendered, "report");
        self.log.push(Report {
            reporter: self.name.clone(),
            values: inputs.to_vec(),
        });
        Ok(Vec::new())
    }
}
