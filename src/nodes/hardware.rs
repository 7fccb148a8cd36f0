//! Hardware behaviours.

use crate::actor::hardware::{ClockedLogic, HardwareIo};
use crate::bits::BitVector;
use crate::error::ComputeError;

type Transform = fn(&BitVector) -> BitVector;

/// One-slot register between a valid/ready input and output.
///
/// The slot is filled on a completed input handshake and drained on a
/// completed output handshake. `ready` is raised only while the slot is
/// empty, so a value never overwrites another.
#[derive(Clone, Debug, Default)]
pub struct RegisterStage {
    slot: Option<BitVector>,
    transform: Option<Transform>,
}

impl RegisterStage {
    /// A plain register.
    pub fn new() -> Self {
        Self::default()
    }

    /// A register applying `transform` to every value it latches.
    pub fn with_transform(transform: Transform) -> Self {
        Self {
            slot: None,
            transform: Some(transform),
        }
    }

    /// A register that adds 1 (wrapping) to every value.
    pub fn increment() -> Self {
        Self::with_transform(|v| v.wrapping_add(&BitVector::from_u64(v.width(), 1)))
    }

    /// The value currently held, if any.
    pub fn held(&self) -> Option<&BitVector> {
        self.slot.as_ref()
    }
}

impl ClockedLogic for RegisterStage {
    fn reset(&mut self) {
        self.slot = None;
    }

    fn clock(&mut self, io: &mut HardwareIo) -> Result<(), ComputeError> {
        for got in [io.input_count(), io.output_count()] {
            if got != 1 {
                return Err(ComputeError::ArityMismatch { expected: 1, got });
            }
        }

        if io.output_accepted(0) {
            self.slot = None;
        }
        if let Some(value) = io.input(0) {
            let value = match self.transform {
                Some(f) => f(value),
                None => value.clone(),
            };
            self.slot = Some(value);
        }

        io.drive(0, self.slot.clone())?;
        io.set_ready(0, self.slot.is_none())
    }
}
