// Benchmark for trajectory calculation and cached cycles
// Run with: cargo bench

use std::hint::black_box;

use criterion::{criterion_group, criterion_main, Criterion};
use otg_motion::{InputParameter, Otg, OutputParameter, Trajectory};

fn three_axes() -> InputParameter<3> {
    let mut input = InputParameter::new();
    input.current_position = [0.0, -2.0, 1.0];
    input.current_velocity = [0.2, 0.0, -0.4];
    input.current_acceleration = [0.0, 0.3, 0.0];
    input.target_position = [5.0, 3.0, -1.5];
    input.target_velocity = [0.0, 0.5, 0.0];
    input.max_velocity = [1.0, 2.0, 1.5];
    input.max_acceleration = [2.0, 1.0, 3.0];
    input.max_jerk = [4.0, 2.0, 6.0];
    input
}

fn bench_calculation(c: &mut Criterion) {
    let input = three_axes();
    c.bench_function("calculate synchronized 3-dof trajectory", |b| {
        b.iter(|| {
            let trajectory = Trajectory::calculate(black_box(&input), 0.001).unwrap();
            black_box(trajectory.duration());
        });
    });
}

fn bench_cached_cycle(c: &mut Criterion) {
    let mut input = three_axes();
    let mut otg = Otg::new(0.001);
    let mut output = OutputParameter::new();
    otg.update(&input, &mut output).unwrap();
    output.pass_to_input(&mut input);
    c.bench_function("update along cached trajectory", |b| {
        b.iter(|| {
            // Replays the second cycle: the input equals the resumed state
            let mut cycle_otg = otg.clone();
            let mut cycle_output = output.clone();
            cycle_otg.update(black_box(&input), &mut cycle_output).unwrap();
            assert!(!cycle_output.new_calculation);
        });
    });
}

criterion_group!(benches, bench_calculation, bench_cached_cycle);
criterion_main!(benches);
