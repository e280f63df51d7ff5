//! Deterministic simulation module
//!
//! All gameplay logic lives here. This module must be pure and deterministic:
//! - Fixed subsystem order within a tick
//! - Seeded RNG only
//! - Stable iteration order (spawn order)
//! - No rendering or platform dependencies

pub mod abilities;
pub mod clock;
pub mod collision;
pub mod particles;
pub mod snapshot;
pub mod state;
pub mod tick;
pub mod transform;

pub use abilities::{AbilityEffect, AbilityId, AbilityKit, ActivationError, FireMeter};
pub use clock::GameClock;
pub use collision::{FatalCause, Outcome, resolve};
pub use particles::{Particle, ParticleKind, ParticleSystem};
pub use snapshot::Snapshot;
pub use state::{
    CollisionLayer, Direction, EntityStore, GamePhase, GridPos, HorseKind, InvalidTransition,
    PortalKind, Snake, StateMachine,
};
pub use tick::{Action, Game, SimState};
pub use transform::TransformationTracker;
