//! Server-authoritative line-of-sight culling for competitive shooters.
//!
//! On every server tick the engine decides, for each ordered pair of living
//! players on opposing teams, whether the viewer's client is authorized to
//! receive the target's position. Enemies whose entire peek-adjusted
//! silhouette is hidden behind world geometry are withheld, which defeats
//! wallhack cheats at the source: the client never learns the position.
//!
//! The pipeline is tiered. Pairs inside their reveal window are skipped
//! outright; expired pairs probe a small per-pair cache of recent blockers,
//! then an optional sphere pre-check, and finally the full shadow-frustum
//! test against broad-phase cuboid candidates. Occlusion is evaluated for
//! four "peek" camera positions bracketing where the viewer's camera could
//! be once in-flight input arrives, so latency cannot be abused to see a
//! frame early.
//!
//! # Example
//!
//! ```
//! use glam::{Mat4, Vec3};
//! use sightline::{CullingConfig, CullingEngine, PlayerPose, Snapshot};
//!
//! // Two opposing players in an empty arena.
//! let mut engine = CullingEngine::new(&[], &[], &[0, 1], CullingConfig::default()).unwrap();
//! let players = [
//!     PlayerPose {
//!         camera: Vec3::new(0.0, 0.0, 170.0),
//!         transform: Mat4::from_translation(Vec3::new(0.0, 0.0, 90.0)),
//!         alive: true,
//!     },
//!     PlayerPose {
//!         camera: Vec3::new(500.0, 0.0, 170.0),
//!         transform: Mat4::from_translation(Vec3::new(500.0, 0.0, 90.0)),
//!         alive: true,
//!     },
//! ];
//!
//! let mut revealed = Vec::new();
//! engine.tick(&Snapshot { players: &players, tick: 1 }, |viewer, target| {
//!     revealed.push((viewer, target));
//! });
//! assert_eq!(revealed, vec![(0, 1), (1, 0)]);
//! ```

mod bounds;
mod cuboid;
mod engine;
mod error;
mod geometry;
mod occlusion;
mod stats;
mod types;

pub use engine::{CullingEngine, CUBOID_CACHE_SIZE};
pub use error::CullingError;
pub use occlusion::frustum::NUM_PEEKS;
pub use types::{Bundle, CuboidSpec, PlayerPose, Snapshot, SphereOccluder};

/// Tunables for a [`CullingEngine`].
///
/// The defaults match a 64-tick server with Unreal-scale world units. Timer
/// increments are reveal TTLs in ticks: once a pair is found visible it is
/// not re-evaluated until the TTL runs out, which both amortizes cull work
/// and keeps reveals from flickering.
#[derive(Debug, Clone)]
pub struct CullingConfig {
    /// Ticks between occlusion re-cull phases. Timers still count down on
    /// every tick; only the evaluation of expired pairs is gated.
    pub culling_period: u64,
    /// Reveal TTL under light load.
    pub min_timer_increment: u32,
    /// Reveal TTL when the previous window ran hot.
    pub max_timer_increment: u32,
    /// Ticks per load-measurement window.
    pub rolling_window_length: u64,
    /// A window whose worst cull tick exceeds this many microseconds flips
    /// the engine to `max_timer_increment` for the next window.
    pub timer_load_threshold_micros: u64,
    /// Worst-case horizontal camera displacement within the latency
    /// horizon, world units.
    pub max_delta_horizontal: f32,
    /// Worst-case vertical camera displacement, world units.
    pub max_delta_vertical: f32,
    /// Character bounding-box half extent along X and Y.
    pub character_half_width: f32,
    /// Character bounding-box half extent along Z.
    pub character_half_height: f32,
    /// Seed for the reveal-timer jitter; fixed so server replays are
    /// deterministic.
    pub rng_seed: u64,
}

impl Default for CullingConfig {
    fn default() -> Self {
        Self {
            culling_period: 1,
            min_timer_increment: 4,
            max_timer_increment: 10,
            rolling_window_length: 128,
            timer_load_threshold_micros: 500,
            max_delta_horizontal: 20.0,
            max_delta_vertical: 5.0,
            character_half_width: 35.0,
            character_half_height: 90.0,
            rng_seed: 0x5eed,
        }
    }
}

impl CullingConfig {
    pub(crate) fn validate(&self) -> Result<(), CullingError> {
        if self.culling_period == 0 {
            return Err(CullingError::InvalidConfig("culling_period must be >= 1".into()));
        }
        if self.rolling_window_length == 0 {
            return Err(CullingError::InvalidConfig(
                "rolling_window_length must be >= 1".into(),
            ));
        }
        if self.min_timer_increment == 0 || self.min_timer_increment > self.max_timer_increment {
            return Err(CullingError::InvalidConfig(
                "timer increments must satisfy 0 < min <= max".into(),
            ));
        }
        if !(self.character_half_width > 0.0) || !(self.character_half_height > 0.0) {
            return Err(CullingError::InvalidConfig(
                "character half extents must be positive".into(),
            ));
        }
        if self.max_delta_horizontal < 0.0 || self.max_delta_vertical < 0.0 {
            return Err(CullingError::InvalidConfig(
                "peek displacements must be non-negative".into(),
            ));
        }
        Ok(())
    }
}
