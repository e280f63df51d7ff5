//! Ember Serpent - a grid-based snake arcade simulation
//!
//! Core modules:
//! - `sim`: Deterministic simulation (entities, collisions, abilities, particles)
//! - `tuning`: Data-driven game balance
//!
//! Presentation, input-device mapping and persistence live outside this
//! crate; they consume the per-tick [`sim::Snapshot`] and feed abstract
//! [`sim::Action`]s back in.

pub mod sim;
pub mod tuning;

pub use tuning::LevelTuning;

use glam::Vec2;

/// Game configuration constants
pub mod consts {
    /// Fixed simulation timestep (60 Hz)
    pub const SIM_DT: f32 = 1.0 / 60.0;
    /// Maximum frame delta fed to the clock (tab-stall protection)
    pub const MAX_FRAME_DT: f32 = 0.25;
    /// Maximum snake grid steps in a single tick
    pub const MAX_STEPS_PER_TICK: u32 = 4;

    /// World units per grid cell (continuous particle space)
    pub const CELL_SIZE: f32 = 20.0;

    /// Snake length bounds
    pub const BASE_LENGTH: usize = 3;
    pub const MAX_LENGTH: usize = 64;

    /// Hard cap on the transient particle pool
    pub const MAX_PARTICLES: usize = 512;
}

/// Center of a grid cell in continuous space
#[inline]
pub fn cell_center(col: i32, row: i32) -> Vec2 {
    Vec2::new(
        (col as f32 + 0.5) * consts::CELL_SIZE,
        (row as f32 + 0.5) * consts::CELL_SIZE,
    )
}
