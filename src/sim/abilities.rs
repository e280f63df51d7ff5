//! Fire meter and cooldown-gated abilities
//!
//! Activation is atomic: every failure path leaves the meter and all
//! cooldowns untouched; success debits the cost and arms the cooldown in
//! one move.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::tuning::{LevelTuning, StageUnlocks};

/// The four special abilities
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AbilityId {
    FlameBreath,
    FireShield,
    PhoenixDash,
    InfernoBurst,
}

impl AbilityId {
    pub const ALL: [AbilityId; 4] = [
        AbilityId::FlameBreath,
        AbilityId::FireShield,
        AbilityId::PhoenixDash,
        AbilityId::InfernoBurst,
    ];

    fn index(self) -> usize {
        match self {
            AbilityId::FlameBreath => 0,
            AbilityId::FireShield => 1,
            AbilityId::PhoenixDash => 2,
            AbilityId::InfernoBurst => 3,
        }
    }
}

/// Why an activation was refused; surfaced as a UI cue, never fatal
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum ActivationError {
    #[error("ability is cooling down")]
    OnCooldown,
    #[error("not enough fire")]
    InsufficientResource,
    #[error("ability not unlocked at this stage")]
    Locked,
}

/// Effect descriptor handed to the tick loop on successful activation
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AbilityEffect {
    pub id: AbilityId,
    pub damage: f32,
    pub range: u32,
    pub duration: f32,
    pub radius: u32,
}

/// Depletable, regenerating resource gating activation
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct FireMeter {
    pub current: f32,
    pub max: f32,
}

impl FireMeter {
    pub fn full(max: f32) -> Self {
        Self { current: max, max }
    }

    /// Regenerate, ceiling at max
    pub fn regen(&mut self, amount: f32) {
        self.current = (self.current + amount).min(self.max);
    }

    /// Debit `cost` if available; false leaves the meter untouched
    pub fn spend(&mut self, cost: f32) -> bool {
        if cost > self.current {
            return false;
        }
        self.current = (self.current - cost).max(0.0);
        true
    }
}

/// Per-ability cooldowns plus the shared fire meter
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AbilityKit {
    pub fire: FireMeter,
    cooldowns: [f32; 4],
}

impl AbilityKit {
    pub fn new(tuning: &LevelTuning) -> Self {
        Self {
            fire: FireMeter::full(tuning.fire_max),
            cooldowns: [0.0; 4],
        }
    }

    pub fn cooldown_remaining(&self, id: AbilityId) -> f32 {
        self.cooldowns[id.index()]
    }

    /// Fraction of the cooldown still pending, for presentation
    pub fn cooldown_fraction(&self, id: AbilityId, tuning: &LevelTuning) -> f32 {
        let duration = tuning.ability(id).cooldown;
        if duration <= 0.0 {
            return 0.0;
        }
        (self.cooldowns[id.index()] / duration).clamp(0.0, 1.0)
    }

    /// Decay cooldowns and regenerate fire. Holds the invariants
    /// `0 <= fire <= max` and `0 <= cooldown <= duration` for any dt >= 0.
    pub fn tick(&mut self, dt: f32, tuning: &LevelTuning) {
        for cd in &mut self.cooldowns {
            *cd = (*cd - dt).max(0.0);
        }
        self.fire.regen(tuning.fire_regen * dt);
    }

    /// Attempt an activation under the current stage's unlock set
    pub fn activate(
        &mut self,
        id: AbilityId,
        tuning: &LevelTuning,
        unlocks: &StageUnlocks,
    ) -> Result<AbilityEffect, ActivationError> {
        if !unlocks.contains(id) {
            return Err(ActivationError::Locked);
        }
        if self.cooldowns[id.index()] > 0.0 {
            return Err(ActivationError::OnCooldown);
        }
        let spec = tuning.ability(id);
        if !self.fire.spend(spec.cost) {
            return Err(ActivationError::InsufficientResource);
        }
        self.cooldowns[id.index()] = spec.cooldown;
        Ok(AbilityEffect {
            id,
            damage: spec.damage,
            range: spec.range,
            duration: spec.duration,
            radius: spec.radius,
        })
    }
}
