//! Logic gate co-simulation example.
//!
//! Two software sources generate pseudo-random bits and feed a clocked
//! hardware AND gate through queue-to-signal adaptors. The gate's result comes
//! back to an interactive software printer through a signal-to-queue adaptor.
//!
//! Run with: `cargo run --example and_gate`

use cosim::actor::software::compute_fn;
use cosim::bits::BitVector;
use cosim::{
    Behavior, ClockedLogic, ComputeError, EdgeDesc, GraphBuilder, HardwareIo, InteractiveBody,
    NodeDesc, Request, Resume, SimulationParams,
};

const SAMPLES: u64 = 8;

// -----------------------------------------------------------------------------
// Software random bit source
// -----------------------------------------------------------------------------

fn random_bits(seed: u64) -> Behavior {
    let mut state = seed;
    Behavior::Software(compute_fn(move |_: &[BitVector]| {
        // Xorshift64*
        state ^= state << 13;
        state ^= state >> 7;
        state ^= state << 17;
        let bit = state.wrapping_mul(0x2545_f491_4f6c_dd1d) >> 63;
        Ok(vec![Some(BitVector::from_u64(1, bit))])
    }))
}

// -----------------------------------------------------------------------------
// Hardware AND gate
// -----------------------------------------------------------------------------

/// Joins both inputs, registers `a & b`.
#[derive(Default)]
struct AndGate {
    result: Option<BitVector>,
}

impl ClockedLogic for AndGate {
    fn reset(&mut self) {
        self.result = None;
    }

    fn clock(&mut self, io: &mut HardwareIo) -> Result<(), ComputeError> {
        if io.output_accepted(0) {
            self.result = None;
        }
        if let (Some(a), Some(b)) = (io.input(0), io.input(1)) {
            self.result = Some(a.and(b));
        }
        io.drive(0, self.result.clone())?;

        // Accept only when both operands are offered, so they transfer together
        let accept = self.result.is_none() && io.input_valid(0) && io.input_valid(1);
        io.set_ready(0, accept)?;
        io.set_ready(1, accept)
    }
}

// -----------------------------------------------------------------------------
// Interactive printer
// -----------------------------------------------------------------------------

struct Printer {
    received: u64,
}

impl InteractiveBody for Printer {
    fn resume(&mut self, event: Resume) -> Result<Request, ComputeError> {
        if let Resume::Received { value, .. } = event {
            self.received += 1;
            println!("sample {:>2}: a & b = {}", self.received, value);
            if self.received == SAMPLES {
                return Ok(Request::Exit);
            }
        }
        Ok(Request::Receive(0))
    }
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    cosim::init_logging("info");

    let mut graph = GraphBuilder::new("and_gate")
        .add_node(
            NodeDesc::software(0, "bits_a")
                .with_output("y", 1)
                .with_firing_limit(SAMPLES),
            random_bits(0x9e37_79b9_7f4a_7c15),
        )
        .add_node(
            NodeDesc::software(1, "bits_b")
                .with_output("y", 1)
                .with_firing_limit(SAMPLES),
            random_bits(0xdead_beef_cafe_f00d),
        )
        .add_node(
            NodeDesc::hardware(2, "and")
                .with_input("a", 1)
                .with_input("b", 1)
                .with_output("y", 1),
            Behavior::hardware(AndGate::default()),
        )
        .add_node(
            NodeDesc::software(3, "printer").with_input("x", 1),
            Behavior::interactive(Printer { received: 0 }),
        )
        .connect(EdgeDesc::new(0, 0, 2, 0))
        .connect(EdgeDesc::new(1, 0, 2, 1))
        .connect(EdgeDesc::new(2, 0, 3, 0))
        .elaborate(None)?;

    let outcome = graph.run(&SimulationParams::default())?;
    println!();
    println!("Outcome: {:?}", outcome);
    print!("{}", graph.stats().summary());
    Ok(())
}
