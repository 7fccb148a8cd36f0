//! Clock and reset bridges.

use crate::bits::BitVector;
use crate::error::SimError;
use crate::process::{Context, Process, Wait};
use crate::types::{FlagId, WireId};

/// Copies a boolean wire onto a 1-bit vector wire on every change.
///
/// Runs once at initialization so the vector wire starts in sync.
pub struct FlagBridge {
    name: String,
    flag: FlagId,
    wire: WireId,
}

impl FlagBridge {
    pub fn new(name: impl Into<String>, flag: FlagId, wire: WireId) -> Self {
        Self {
            name: name.into(),
            flag,
            wire,
        }
    }

    /// Bridge for the clock.
    pub fn clock(flag: FlagId, wire: WireId) -> Self {
        Self::new("clk_to_bv", flag, wire)
    }

    /// Bridge for the reset.
    pub fn reset(flag: FlagId, wire: WireId) -> Self {
        Self::new("rst_to_bv", flag, wire)
    }
}

impl Process for FlagBridge {
    fn name(&self) -> &str {
        &self.name
    }

    fn step(&mut self, ctx: &mut Context<'_>) -> Result<Wait, SimError> {
        let value = ctx.channels.read_flag(self.flag);
        ctx.channels.write_wire(self.wire, BitVector::from_bool(value));
        Ok(Wait::Change(self.flag))
    }
}
