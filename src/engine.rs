//! The culling engine: per-pair state, bundle scheduling, and the tiered
//! occlusion pipeline.

use std::sync::OnceLock;
use std::time::Instant;

use rand::Rng;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

#[cfg(feature = "parallel")]
use rayon::prelude::*;

use crate::bounds::CharacterBounds;
use crate::cuboid::Cuboid;
use crate::error::CullingError;
use crate::occlusion::broadphase::BroadPhase;
use crate::occlusion::frustum::{is_blocking, peek_positions};
use crate::occlusion::scratch::CullScratch;
use crate::occlusion::sphere;
use crate::stats::RollingStats;
use crate::types::{Bundle, CuboidSpec, Snapshot, SphereOccluder};
use crate::CullingConfig;

/// Cached blocking-cuboid slots per ordered pair.
pub const CUBOID_CACHE_SIZE: usize = 3;

const EMPTY_SLOT: u32 = u32::MAX;

fn log_enabled() -> bool {
    static ENABLED: OnceLock<bool> = OnceLock::new();
    *ENABLED.get_or_init(|| {
        std::env::var("SIGHTLINE_LOG")
            .ok()
            .map_or(false, |v| v == "1" || v.eq_ignore_ascii_case("true"))
    })
}

/// Server-side visibility culling over a fixed roster of characters and a
/// static occluder set.
///
/// The engine owns all per-pair state. Hosts drive it with one
/// [`tick`](Self::tick) per server tick, handing in a read-only
/// [`Snapshot`] and receiving reveal callbacks for every (viewer, target)
/// pair whose position may be sent to that viewer's client.
pub struct CullingEngine {
    config: CullingConfig,
    cuboids: Vec<Cuboid>,
    spheres: Vec<SphereOccluder>,
    teams: Vec<u8>,
    broadphase: BroadPhase,
    num_characters: usize,

    alive: Vec<bool>,
    bounds: Vec<Option<CharacterBounds>>,

    // Per-pair tables, row-major [viewer][target].
    visibility_timers: Vec<u32>,
    cuboid_caches: Vec<[u32; CUBOID_CACHE_SIZE]>,
    cache_timers: Vec<[u64; CUBOID_CACHE_SIZE]>,

    bundle_queue: Vec<Bundle>,
    bundle_queue2: Vec<Bundle>,
    scratch: CullScratch,
    #[cfg(not(feature = "parallel"))]
    candidates: Vec<u32>,

    stats: RollingStats,
    timer_increment: u32,
    rng: ChaCha8Rng,
    last_tick: Option<u64>,
}

impl CullingEngine {
    /// Build an engine for a fixed roster and occluder set.
    ///
    /// `teams[i]` is the team of character `i`; the roster size and order
    /// are fixed for the engine's lifetime. Occluder geometry is validated
    /// here so the tick path never has to.
    pub fn new(
        cuboid_specs: &[CuboidSpec],
        spheres: &[SphereOccluder],
        teams: &[u8],
        config: CullingConfig,
    ) -> Result<Self, CullingError> {
        config.validate()?;
        let cuboids: Vec<Cuboid> = cuboid_specs
            .iter()
            .enumerate()
            .map(|(i, spec)| Cuboid::from_spec(i, spec))
            .collect::<Result<_, _>>()?;
        for (i, s) in spheres.iter().enumerate() {
            if !(s.radius > 0.0) {
                return Err(CullingError::DegenerateSphere { sphere: i });
            }
        }

        let broadphase = BroadPhase::new(&cuboids);
        let n = teams.len();
        let timer_increment = config.min_timer_increment;
        let rng = ChaCha8Rng::seed_from_u64(config.rng_seed);
        let stats = RollingStats::new(config.rolling_window_length);

        Ok(Self {
            config,
            cuboids,
            spheres: spheres.to_vec(),
            teams: teams.to_vec(),
            broadphase,
            num_characters: n,
            alive: vec![false; n],
            bounds: vec![None; n],
            visibility_timers: vec![0; n * n],
            cuboid_caches: vec![[EMPTY_SLOT; CUBOID_CACHE_SIZE]; n * n],
            cache_timers: vec![[0; CUBOID_CACHE_SIZE]; n * n],
            bundle_queue: Vec::new(),
            bundle_queue2: Vec::new(),
            scratch: CullScratch::new(),
            #[cfg(not(feature = "parallel"))]
            candidates: Vec::new(),
            stats,
            timer_increment,
            rng,
            last_tick: None,
        })
    }

    pub fn num_characters(&self) -> usize {
        self.num_characters
    }

    /// Whether `target`'s position is currently authorized for `viewer`.
    pub fn is_revealed(&self, viewer: usize, target: usize) -> bool {
        self.visibility_timers[viewer * self.num_characters + target] > 0
    }

    /// Run one server tick: update bounds, re-evaluate expired pairs, and
    /// invoke `reveal` for every pair whose target is currently visible.
    pub fn tick<F>(&mut self, snapshot: &Snapshot<'_>, mut reveal: F)
    where
        F: FnMut(usize, usize),
    {
        assert_eq!(
            snapshot.players.len(),
            self.num_characters,
            "snapshot roster size does not match the engine roster"
        );
        debug_assert!(
            self.last_tick.map_or(true, |last| snapshot.tick > last),
            "snapshot ticks must be strictly increasing"
        );
        self.last_tick = Some(snapshot.tick);

        let started = Instant::now();
        self.update_bounds(snapshot);
        let run_cull = snapshot.tick % self.config.culling_period == 0;
        self.populate_bundles(run_cull);
        if run_cull {
            self.cull_with_cache(snapshot.tick);
            self.cull_spheres();
            self.cull_remaining(snapshot.tick);
        }
        let micros = started.elapsed().as_micros() as u64;
        self.finish_cull_timing(micros, snapshot.tick);

        self.emit(&mut reveal);
    }

    fn update_bounds(&mut self, snapshot: &Snapshot<'_>) {
        for (i, pose) in snapshot.players.iter().enumerate() {
            self.alive[i] = pose.alive;
            self.bounds[i] = pose.alive.then(|| {
                CharacterBounds::new(
                    pose.camera,
                    &pose.transform,
                    self.config.character_half_width,
                    self.config.character_half_height,
                )
            });
        }
    }

    /// Walk every viewer row: running timers count down one tick, and on
    /// cull ticks the expired cross-team pairs are queued for evaluation.
    /// While a timer is positive the pair is already revealed; re-checking
    /// it would be wasted work and would make reveals flicker.
    fn populate_bundles(&mut self, run_cull: bool) {
        self.bundle_queue.clear();
        let n = self.num_characters;
        for i in 0..n {
            if !self.alive[i] {
                continue;
            }
            let team = self.teams[i];
            for j in 0..n {
                let timer = &mut self.visibility_timers[i * n + j];
                if *timer > 0 {
                    *timer -= 1;
                }
                if run_cull && self.alive[j] && self.teams[j] != team && *timer == 0 {
                    self.bundle_queue.push(Bundle {
                        viewer: i,
                        target: j,
                    });
                }
            }
        }
    }

    /// Stage 1: probe the pair's cached blockers. The occluder that hid a
    /// pair last tick almost always still hides it, so a hit here skips the
    /// broad phase and the candidate scan entirely.
    fn cull_with_cache(&mut self, tick: u64) {
        let n = self.num_characters;
        self.bundle_queue2.clear();
        for idx in 0..self.bundle_queue.len() {
            let b = self.bundle_queue[idx];
            let row = b.viewer * n + b.target;
            let viewer = self.bounds[b.viewer]
                .as_ref()
                .expect("scheduled viewer has bounds");
            let enemy = self.bounds[b.target]
                .as_ref()
                .expect("scheduled target has bounds");
            let peeks = peek_positions(
                viewer.camera,
                enemy.center,
                self.config.max_delta_horizontal,
                self.config.max_delta_vertical,
            );

            let mut blocked = false;
            for k in 0..CUBOID_CACHE_SIZE {
                let slot = self.cuboid_caches[row][k];
                if slot == EMPTY_SLOT {
                    continue;
                }
                if is_blocking(
                    &peeks,
                    &self.cuboids[slot as usize],
                    enemy,
                    &mut self.scratch,
                ) {
                    self.cache_timers[row][k] = tick;
                    blocked = true;
                    break;
                }
            }
            if !blocked {
                self.bundle_queue2.push(b);
            }
        }
    }

    /// Stage 2: conservative sphere pre-check. Skipped outright when the
    /// world has no sphere occluders.
    fn cull_spheres(&mut self) {
        if self.spheres.is_empty() {
            return;
        }
        let bounds = &self.bounds;
        let spheres = &self.spheres;
        let delta_h = self.config.max_delta_horizontal;
        let delta_v = self.config.max_delta_vertical;
        self.bundle_queue2.retain(|b| {
            let viewer = bounds[b.viewer].as_ref().expect("scheduled viewer has bounds");
            let enemy = bounds[b.target].as_ref().expect("scheduled target has bounds");
            let peeks = peek_positions(viewer.camera, enemy.center, delta_h, delta_v);
            !spheres
                .iter()
                .any(|s| sphere::blocks_all_peeks(&peeks, s, enemy))
        });
    }

    /// Stage 3: full shadow-frustum test over the broad-phase candidates.
    #[cfg(not(feature = "parallel"))]
    fn cull_remaining(&mut self, tick: u64) {
        for idx in 0..self.bundle_queue2.len() {
            let b = self.bundle_queue2[idx];
            let viewer = self.bounds[b.viewer]
                .as_ref()
                .expect("scheduled viewer has bounds");
            let enemy = self.bounds[b.target]
                .as_ref()
                .expect("scheduled target has bounds");
            let verdict = first_blocking_cuboid(
                &self.cuboids,
                &self.broadphase,
                viewer,
                enemy,
                &self.config,
                &mut self.scratch,
                &mut self.candidates,
            );
            self.apply_verdict(b, verdict, tick);
        }
    }

    /// Stage 3, fanned out across bundles. Each bundle touches only its own
    /// row of the per-pair tables, so verdicts are computed in parallel with
    /// per-worker scratch and applied serially afterwards.
    #[cfg(feature = "parallel")]
    fn cull_remaining(&mut self, tick: u64) {
        let cuboids = &self.cuboids;
        let broadphase = &self.broadphase;
        let bounds = &self.bounds;
        let config = &self.config;
        let verdicts: Vec<Option<u32>> = self
            .bundle_queue2
            .par_iter()
            .map_init(
                || (CullScratch::new(), Vec::new()),
                |(scratch, candidates), b| {
                    let viewer = bounds[b.viewer]
                        .as_ref()
                        .expect("scheduled viewer has bounds");
                    let enemy = bounds[b.target]
                        .as_ref()
                        .expect("scheduled target has bounds");
                    first_blocking_cuboid(
                        cuboids, broadphase, viewer, enemy, config, scratch, candidates,
                    )
                },
            )
            .collect();
        for (idx, verdict) in verdicts.into_iter().enumerate() {
            let b = self.bundle_queue2[idx];
            self.apply_verdict(b, verdict, tick);
        }
    }

    /// A blocking cuboid replaces the least recently validated cache slot;
    /// an unblocked pair opens its reveal window. The 0/1 jitter staggers
    /// expirations so pairs unblocked together do not all re-check on the
    /// same future tick.
    fn apply_verdict(&mut self, b: Bundle, blocking: Option<u32>, tick: u64) {
        let row = b.viewer * self.num_characters + b.target;
        match blocking {
            Some(cuboid_index) => {
                let stamps = &mut self.cache_timers[row];
                let mut lru = 0;
                for k in 1..CUBOID_CACHE_SIZE {
                    if stamps[k] < stamps[lru] {
                        lru = k;
                    }
                }
                self.cuboid_caches[row][lru] = cuboid_index;
                stamps[lru] = tick;
            }
            None => {
                let jitter: u32 = self.rng.gen_range(0..=1);
                self.visibility_timers[row] = self.timer_increment + jitter;
            }
        }
    }

    /// Fold one tick's cull time into the rolling window; at window
    /// boundaries re-select the reveal TTL from the window's worst tick.
    fn finish_cull_timing(&mut self, micros: u64, tick: u64) {
        if self.stats.record(micros) {
            self.timer_increment =
                if self.stats.last_window_max > self.config.timer_load_threshold_micros {
                    self.config.max_timer_increment
                } else {
                    self.config.min_timer_increment
                };
            if log_enabled() {
                self.stats.report(tick, self.timer_increment);
            }
        }
    }

    fn emit<F>(&mut self, reveal: &mut F)
    where
        F: FnMut(usize, usize),
    {
        let n = self.num_characters;
        for i in 0..n {
            if !self.alive[i] {
                continue;
            }
            for j in 0..n {
                if self.alive[j] && self.visibility_timers[i * n + j] > 0 {
                    reveal(i, j);
                }
            }
        }
    }
}

/// First broad-phase candidate that occludes the pair, if any.
fn first_blocking_cuboid(
    cuboids: &[Cuboid],
    broadphase: &BroadPhase,
    viewer: &CharacterBounds,
    enemy: &CharacterBounds,
    config: &CullingConfig,
    scratch: &mut CullScratch,
    candidates: &mut Vec<u32>,
) -> Option<u32> {
    let peeks = peek_positions(
        viewer.camera,
        enemy.center,
        config.max_delta_horizontal,
        config.max_delta_vertical,
    );
    broadphase.candidates(
        viewer.camera,
        enemy.center,
        config.max_delta_horizontal + config.max_delta_vertical,
        candidates,
    );
    candidates
        .iter()
        .copied()
        .find(|&ci| is_blocking(&peeks, &cuboids[ci as usize], enemy, scratch))
}
