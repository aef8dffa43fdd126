//! Benchmark the culling engine at various roster and occluder scales.
//!
//! Run with: cargo run --release --bin bench_cull
//!
//! Usage:
//!   bench_cull                      Default scene (20 players, 100 walls)
//!   bench_cull -p 64 -c 500         64 players, 500 walls
//!   bench_cull -t 5000              Run 5000 ticks
//!
//! Set SIGHTLINE_LOG=1 for per-window cull-time reports from the engine.

use clap::Parser;
use glam::{Mat4, Vec3};
use rand::Rng;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use sightline::{CullingConfig, CullingEngine, CuboidSpec, PlayerPose, Snapshot};
use std::time::Instant;

#[derive(Parser)]
#[command(name = "bench_cull")]
#[command(about = "Benchmark the sightline culling engine")]
struct Args {
    /// Number of players, split evenly across two teams
    #[arg(short, long, default_value_t = 20)]
    players: usize,

    /// Number of cuboid occluders
    #[arg(short, long, default_value_t = 100)]
    cuboids: usize,

    /// Number of server ticks to simulate
    #[arg(short, long, default_value_t = 1000)]
    ticks: u64,

    /// Arena half extent, world units
    #[arg(long, default_value_t = 4000.0)]
    arena: f32,

    /// Random seed
    #[arg(short, long, default_value_t = 12345)]
    seed: u64,
}

fn random_walls<R: Rng>(count: usize, arena: f32, rng: &mut R) -> Vec<CuboidSpec> {
    (0..count)
        .map(|_| {
            let center = Vec3::new(
                rng.gen_range(-arena..arena),
                rng.gen_range(-arena..arena),
                90.0,
            );
            let half_extents = Vec3::new(
                rng.gen_range(10.0..40.0),
                rng.gen_range(50.0..300.0),
                rng.gen_range(60.0..120.0),
            );
            CuboidSpec::axis_aligned(center, half_extents)
        })
        .collect()
}

fn player_pose(position: Vec3) -> PlayerPose {
    PlayerPose {
        camera: position + Vec3::new(0.0, 0.0, 80.0),
        transform: Mat4::from_translation(position),
        alive: true,
    }
}

fn main() {
    let args = Args::parse();
    let mut rng = ChaCha8Rng::seed_from_u64(args.seed);

    println!("sightline bench");
    println!("===============");
    println!(
        "players = {}, cuboids = {}, ticks = {}, arena = {}",
        args.players, args.cuboids, args.ticks, args.arena
    );

    let walls = random_walls(args.cuboids, args.arena, &mut rng);
    let teams: Vec<u8> = (0..args.players).map(|i| (i % 2) as u8).collect();
    let mut engine = CullingEngine::new(&walls, &[], &teams, CullingConfig::default())
        .expect("generated world should validate");

    // Players orbit the arena at individual speeds so the visible set keeps
    // changing and caches are actually exercised.
    let orbits: Vec<(f32, f32, f32)> = (0..args.players)
        .map(|_| {
            (
                rng.gen_range(0.2..0.9) * args.arena,
                rng.gen_range(0.0..std::f32::consts::TAU),
                rng.gen_range(0.001..0.01),
            )
        })
        .collect();

    let mut players = vec![player_pose(Vec3::ZERO); args.players];
    let mut total_reveals = 0u64;
    let mut total_micros = 0u64;
    let mut max_micros = 0u64;

    for tick in 1..=args.ticks {
        for (i, (radius, phase, speed)) in orbits.iter().enumerate() {
            let angle = phase + speed * tick as f32;
            players[i] = player_pose(Vec3::new(
                radius * angle.cos(),
                radius * angle.sin(),
                90.0,
            ));
        }

        let mut reveals = 0u64;
        let started = Instant::now();
        engine.tick(&Snapshot {
            players: &players,
            tick,
        }, |_, _| reveals += 1);
        let micros = started.elapsed().as_micros() as u64;

        total_reveals += reveals;
        total_micros += micros;
        max_micros = max_micros.max(micros);
    }

    println!("\nResults:");
    println!("  Avg tick:     {:>8} us", total_micros / args.ticks.max(1));
    println!("  Max tick:     {:>8} us", max_micros);
    println!(
        "  Avg reveals:  {:>8.1} per tick",
        total_reveals as f64 / args.ticks.max(1) as f64
    );
    println!("\nBench complete.");
}
