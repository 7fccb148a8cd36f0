//! Performance benchmarks for cosim.
//!
//! Run with: `cargo bench`
//! Or for specific bench: `cargo bench --bench simulation_bench`

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};

use cosim::actor::software::compute_fn;
use cosim::bits::BitVector;
use cosim::channel::QueueChannel;
use cosim::nodes::{RegisterStage, ReportLog};
use cosim::{
    Behavior, ComputeError, EdgeDesc, GraphBuilder, GraphInstance, InteractiveBody, NodeDesc,
    Request, Resume, SimulationParams,
};

// ============================================================================
// Benchmark Graphs
// ============================================================================

/// Receives `want` values, then ends the run.
struct Sink {
    want: u64,
    seen: u64,
}

impl InteractiveBody for Sink {
    fn resume(&mut self, event: Resume) -> Result<Request, ComputeError> {
        if let Resume::Received { .. } = event {
            self.seen += 1;
            if self.seen == self.want {
                return Ok(Request::Exit);
            }
        }
        Ok(Request::Receive(0))
    }
}

/// source -> `stages` hardware registers -> interactive sink, streaming
/// `values` values.
fn pipeline(stages: u64, values: u64) -> GraphInstance {
    let mut next = 0u64;
    let mut builder = GraphBuilder::new("pipeline").add_node(
        NodeDesc::software(0, "source")
            .with_output("y", 32)
            .with_firing_limit(values),
        Behavior::Software(compute_fn(move |_: &[BitVector]| {
            next += 1;
            Ok(vec![Some(BitVector::from_u64(32, next))])
        })),
    );
    for id in 1..=stages {
        builder = builder
            .add_node(
                NodeDesc::hardware(id, format!("stage_{id}"))
                    .with_input("d", 32)
                    .with_output("q", 32),
                Behavior::hardware(RegisterStage::increment()),
            )
            .connect(EdgeDesc::new(id - 1, 0, id, 0));
    }
    let sink = stages + 1;
    builder
        .add_node(
            NodeDesc::software(sink, "sink").with_input("x", 32),
            Behavior::interactive(Sink {
                want: values,
                seen: 0,
            }),
        )
        .connect(EdgeDesc::new(stages, 0, sink, 0))
        .elaborate(None)
        .expect("pipeline elaborates")
}

/// A chain of software pass-through actors ending in a reporter.
fn software_chain(length: u64) -> GraphInstance {
    let log = ReportLog::new();
    let mut builder = GraphBuilder::new("chain").add_node(
        NodeDesc::software(0, "source").with_output("y", 32),
        Behavior::software(cosim::nodes::Constant::new(32, 1)),
    );
    for id in 1..=length {
        builder = builder
            .add_node(
                NodeDesc::software(id, format!("pass_{id}"))
                    .with_input("x", 32)
                    .with_output("y", 32),
                Behavior::Software(compute_fn(|inputs: &[BitVector]| {
                    Ok(vec![Some(inputs[0].clone())])
                })),
            )
            .connect(EdgeDesc::new(id - 1, 0, id, 0));
    }
    let sink = length + 1;
    builder
        .add_node(
            NodeDesc::software(sink, "report").with_input("x", 32),
            Behavior::software(cosim::nodes::Reporter::new("report", log)),
        )
        .connect(EdgeDesc::new(length, 0, sink, 0))
        .elaborate(None)
        .expect("chain elaborates")
}

fn params() -> SimulationParams {
    SimulationParams {
        reset_cycles: 1,
        max_time: None,
        ..SimulationParams::default()
    }
}

// ============================================================================
// Benchmarks
// ============================================================================

fn bench_elaboration(c: &mut Criterion) {
    let mut group = c.benchmark_group("elaboration");

    for stages in [4u64, 16, 64].iter() {
        group.throughput(Throughput::Elements(*stages));
        group.bench_with_input(BenchmarkId::new("stages", stages), stages, |b, &stages| {
            b.iter(|| black_box(pipeline(stages, 1)));
        });
    }

    group.finish();
}

fn bench_hardware_pipeline(c: &mut Criterion) {
    let mut group = c.benchmark_group("hardware_pipeline");
    group.sample_size(20);

    for values in [10u64, 100].iter() {
        group.throughput(Throughput::Elements(*values));
        group.bench_with_input(BenchmarkId::new("values", values), values, |b, &values| {
            b.iter_batched(
                || pipeline(8, values),
                |mut graph| black_box(graph.run(&params()).expect("pipeline runs")),
                criterion::BatchSize::SmallInput,
            );
        });
    }

    group.finish();
}

fn bench_software_chain(c: &mut Criterion) {
    let mut group = c.benchmark_group("software_chain");

    for length in [10u64, 100].iter() {
        group.throughput(Throughput::Elements(*length));
        group.bench_with_input(BenchmarkId::new("actors", length), length, |b, &length| {
            b.iter_batched(
                || software_chain(length),
                |mut graph| black_box(graph.run(&params()).expect("chain runs")),
                criterion::BatchSize::SmallInput,
            );
        });
    }

    group.finish();
}

fn bench_queue(c: &mut Criterion) {
    let mut group = c.benchmark_group("queue_channel");

    for capacity in [16usize, 1024].iter() {
        group.throughput(Throughput::Elements(*capacity as u64));
        group.bench_with_input(
            BenchmarkId::new("fill_drain", capacity),
            capacity,
            |b, &capacity| {
                let value = BitVector::from_u64(32, 0xdead_beef);
                b.iter_batched(
                    || QueueChannel::new("bench", 32, capacity),
                    |mut queue| {
                        while queue.try_write(value.clone()).is_ok() {}
                        while queue.try_read().is_some() {}
                        black_box(queue.stats().reads);
                    },
                    criterion::BatchSize::SmallInput,
                );
            },
        );
    }

    group.finish();
}

// ============================================================================
// Criterion Groups
// ============================================================================

criterion_group!(
    benches,
    bench_elaboration,
    bench_hardware_pipeline,
    bench_software_chain,
    bench_queue,
);

criterion_main!(benches);
