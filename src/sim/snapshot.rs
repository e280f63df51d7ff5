//! Read-only projection of simulation state for presentation
//!
//! Captured once per tick. The renderer and minimap draw from this and
//! only this; they never hold a live handle into the simulation, so a
//! render cadence different from the tick cadence cannot race mutation.

use serde::Serialize;

use crate::sim::abilities::AbilityId;
use crate::sim::clock::GameClock;
use crate::sim::particles::ParticleKind;
use crate::sim::state::{GamePhase, GridPos, HorseKind, PortalKind};
use crate::sim::tick::SimState;
use crate::tuning::LevelTuning;

#[derive(Debug, Clone, Serialize)]
pub struct AbilityView {
    pub id: AbilityId,
    /// 0.0 = ready, 1.0 = just used
    pub cooldown_fraction: f32,
    pub unlocked: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct HorseView {
    pub pos: GridPos,
    pub kind: HorseKind,
}

#[derive(Debug, Clone, Serialize)]
pub struct PortalView {
    pub pos: GridPos,
    pub kind: PortalKind,
    pub ready: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct ParticleView {
    pub kind: ParticleKind,
    pub pos: [f32; 2],
    pub size: f32,
    pub color: u32,
    pub rotation: f32,
    pub opacity: f32,
}

#[derive(Debug, Clone, Serialize)]
pub struct Snapshot {
    pub phase: GamePhase,
    pub score: u64,
    pub elapsed: f32,

    pub fire_current: f32,
    pub fire_max: f32,

    pub shield_remaining: f32,
    /// Danger-warning cue from a sentinel horse; 0 when inactive
    pub warning_remaining: f32,

    pub stage_index: usize,
    pub stage_name: String,
    /// Fraction toward the next stage; 1.0 at the final stage
    pub stage_progress: f32,

    pub abilities: Vec<AbilityView>,

    pub snake: Vec<GridPos>,
    pub collectibles: Vec<GridPos>,
    pub horses: Vec<HorseView>,
    pub portals: Vec<PortalView>,
    pub obstacles: Vec<GridPos>,

    pub particles: Vec<ParticleView>,
}

impl Snapshot {
    pub fn capture(
        phase: GamePhase,
        sim: &SimState,
        clock: &GameClock,
        tuning: &LevelTuning,
    ) -> Self {
        let stage_index = sim.transformation.current_stage_index(tuning);
        let unlocks = sim.transformation.unlocks(tuning);

        let abilities = AbilityId::ALL
            .iter()
            .map(|&id| AbilityView {
                id,
                cooldown_fraction: sim.abilities.cooldown_fraction(id, tuning),
                unlocked: unlocks.contains(id),
            })
            .collect();

        Self {
            phase,
            score: sim.score,
            elapsed: clock.elapsed,
            fire_current: sim.abilities.fire.current,
            fire_max: sim.abilities.fire.max,
            shield_remaining: sim.effects.shield_remaining,
            warning_remaining: sim.effects.warning_remaining,
            stage_index,
            stage_name: tuning.stages[stage_index].name.clone(),
            stage_progress: sim.transformation.progress_to_next(tuning),
            abilities,
            snake: sim.store.snake.segments.clone(),
            collectibles: sim.store.collectibles.iter().map(|c| c.pos).collect(),
            horses: sim
                .store
                .horses
                .iter()
                .map(|h| HorseView {
                    pos: h.pos,
                    kind: h.kind,
                })
                .collect(),
            portals: sim
                .store
                .portals
                .iter()
                .map(|p| PortalView {
                    pos: p.pos,
                    kind: p.kind,
                    ready: p.entry && p.cooldown_remaining <= 0.0,
                })
                .collect(),
            obstacles: sim.store.obstacles.iter().map(|o| o.pos).collect(),
            particles: sim
                .particles
                .iter()
                .map(|p| ParticleView {
                    kind: p.kind,
                    pos: [p.pos.x, p.pos.y],
                    size: p.size * p.size_scale(),
                    color: p.color,
                    rotation: p.rotation,
                    opacity: p.opacity(),
                })
                .collect(),
        }
    }
}
