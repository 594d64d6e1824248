//! Behavioural properties of the simulation stage
//!
//! Runs against the CPU backend, which is available everywhere. The GPU
//! backend is compared against it in `gpu_consistency.rs`.
//!
//! Run tests with: cargo test --test `simulation_properties`

use proptest::prelude::*;
use ripple_core::solver::kernels::drop_distance;
use ripple_core::{
    height_at, height_energy, CpuWaveSolver, Disturbance, SimulationConfig, Texel, WaveSolver,
};

#[ctor::ctor]
fn init_logging() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

fn solver(resolution: u32) -> CpuWaveSolver {
    let config = SimulationConfig {
        resolution,
        ..SimulationConfig::default()
    };
    CpuWaveSolver::new(&config).expect("valid config")
}

fn snapshot(solver: &CpuWaveSolver) -> Vec<Texel> {
    solver.read_field().expect("cpu readback").into_owned()
}

/// Deterministic non-trivial field
fn bumpy_field(resolution: usize) -> Vec<Texel> {
    (0..resolution * resolution)
        .map(|k| {
            let (i, j) = ((k % resolution) as f32, (k / resolution) as f32);
            Texel::with_height((i * 0.37).sin() * (j * 0.21).cos() * 0.3)
        })
        .collect()
}

fn bits(texels: &[Texel]) -> Vec<[u32; 4]> {
    texels
        .iter()
        .map(|t| {
            [
                t.height.to_bits(),
                t.velocity.to_bits(),
                t.normal_x.to_bits(),
                t.normal_z.to_bits(),
            ]
        })
        .collect()
}

#[test]
fn test_zero_field_is_fixed_point() {
    for resolution in [1, 2, 7, 64] {
        let mut solver = solver(resolution);
        for _ in 0..5 {
            solver.step_simulation();
        }
        let field = snapshot(&solver);
        assert!(
            field.iter().all(|t| t.height == 0.0),
            "zero field drifted at N = {resolution}"
        );
    }
}

#[test]
fn test_zero_strength_drop_is_identity() {
    let mut solver = solver(48);
    solver.load_field(&bumpy_field(48)).unwrap();
    let before = bits(&snapshot(&solver));

    solver.add_drop(&Disturbance::new([0.1, -0.4], 0.2, 0.0));

    assert_eq!(bits(&snapshot(&solver)), before);
}

#[test]
fn test_drop_is_local() {
    let n = 48;
    let drop = Disturbance::new([0.3, -0.2], 0.1, 0.5);
    let mut solver = solver(n as u32);
    solver.load_field(&bumpy_field(n)).unwrap();
    let before = snapshot(&solver);

    solver.add_drop(&drop);
    let after = snapshot(&solver);

    let mut touched = 0;
    for j in 0..n {
        for i in 0..n {
            let k = j * n + i;
            if drop_distance(drop.center, i, j, n) >= drop.radius {
                assert_eq!(
                    bits(&after[k..=k]),
                    bits(&before[k..=k]),
                    "texel ({i}, {j}) outside the radius changed"
                );
            } else if after[k].height != before[k].height {
                touched += 1;
            }
        }
    }
    assert!(touched > 0, "drop changed nothing");
}

#[test]
fn test_every_pass_swaps_buffers() {
    let mut solver = solver(16);
    let ops: [fn(&mut CpuWaveSolver); 3] = [
        |s| s.add_drop(&Disturbance::new([0.0, 0.0], 0.1, 0.1)),
        |s| s.step_simulation(),
        |s| s.update_normals(),
    ];
    for op in ops.iter().cycle().take(9) {
        let before = solver.current_id();
        op(&mut solver);
        assert_ne!(solver.current_id(), before);
    }
}

#[test]
fn test_normals_are_deterministic() {
    let mut solver = solver(40);
    solver.load_field(&bumpy_field(40)).unwrap();

    solver.update_normals();
    let first = bits(&snapshot(&solver));
    solver.update_normals();
    let second = bits(&snapshot(&solver));

    assert_eq!(first, second);
}

#[test]
fn test_single_drop_settles() {
    let n = 64;
    let mut solver = solver(n);
    solver.add_drop(&Disturbance::new([0.0, 0.0], 0.1, 1.0));

    let mut centre = Vec::new();
    let mut energy = Vec::new();
    for _ in 0..50 {
        solver.step_simulation();
        let field = snapshot(&solver);
        centre.push(height_at(&field, n as usize, 0.0, 0.0));
        energy.push(height_energy(&field));
    }

    for step in 5..50 {
        assert!(
            centre[step] < centre[step - 1],
            "centre rose at step {}: {} -> {}",
            step + 1,
            centre[step - 1],
            centre[step]
        );
    }
    assert!(
        energy[49] < energy[0] * 0.1,
        "energy {} at step 50 vs {} at step 1",
        energy[49],
        energy[0]
    );
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn prop_step_never_adds_energy(
        (n, heights) in (1usize..24).prop_flat_map(|n| {
            (Just(n), prop::collection::vec(-1.0f32..1.0, n * n))
        })
    ) {
        let mut solver = solver(n as u32);
        let field: Vec<Texel> = heights.into_iter().map(Texel::with_height).collect();
        solver.load_field(&field).unwrap();

        let mut energy = height_energy(&field);
        for _ in 0..4 {
            solver.step_simulation();
            let next = height_energy(&snapshot(&solver));
            prop_assert!(next <= energy * (1.0 + 1e-6) + 1e-12, "{} -> {}", energy, next);
            energy = next;
        }
    }
}
