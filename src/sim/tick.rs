//! Per-tick simulation orchestration
//!
//! One tick runs to completion with subsystems in a fixed order: clock,
//! snake movement (collision resolved after every grid step), horse
//! movement, ability cooldowns and timed effects, transformation check,
//! particle update, snapshot. A fatal collision stops the tick at the
//! point it is raised; nothing else mutates afterwards.

use rand::{Rng, SeedableRng};
use rand_pcg::Pcg32;
use serde::{Deserialize, Serialize};

use crate::sim::abilities::{AbilityEffect, AbilityId, AbilityKit, ActivationError};
use crate::sim::clock::GameClock;
use crate::sim::collision::{FatalCause, Outcome, resolve};
use crate::sim::particles::{ParticleKind, ParticleSystem};
use crate::sim::snapshot::Snapshot;
use crate::sim::state::{
    CollisionLayer, Direction, EntityStore, GamePhase, GridPos, HorseKind, PortalKind,
    StateMachine,
};
use crate::sim::transform::TransformationTracker;
use crate::tuning::{HorseEffect, LevelTuning};

/// Abstract input events, decoupled from physical keys
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    MoveDirection(Direction),
    ActivateAbility(AbilityId),
    TogglePause,
    SelectLevel(u32),
    Restart,
}

/// Score bonus for destroying an obstacle
const MELT_BONUS: u64 = 5;
/// Score bonus for defeating a hostile horse with the shield up
const HOSTILE_DEFEAT_BONUS: u64 = 25;
/// Score bonus for a formation fly-by
const FORMATION_BONUS: u64 = 15;
/// Cells a path-maker horse clears ahead of the snake
const PATH_RANGE: u32 = 6;

/// Timed effects granted by horses and abilities
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct ActiveEffects {
    pub shield_remaining: f32,
    pub speed_boost_remaining: f32,
    /// Danger-warning cue for the HUD
    pub warning_remaining: f32,
}

impl ActiveEffects {
    pub fn shield_active(&self) -> bool {
        self.shield_remaining > 0.0
    }

    pub fn speed_multiplier(&self, tuning: &LevelTuning) -> f32 {
        if self.speed_boost_remaining > 0.0 {
            tuning.speed_boost_factor
        } else {
            1.0
        }
    }

    pub fn tick(&mut self, dt: f32) {
        self.shield_remaining = (self.shield_remaining - dt).max(0.0);
        self.speed_boost_remaining = (self.speed_boost_remaining - dt).max(0.0);
        self.warning_remaining = (self.warning_remaining - dt).max(0.0);
    }
}

/// Everything owned by one level instance
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SimState {
    pub seed: u64,
    pub rng: Pcg32,
    pub level: u32,
    pub store: EntityStore,
    pub abilities: AbilityKit,
    pub transformation: TransformationTracker,
    pub particles: ParticleSystem,
    pub effects: ActiveEffects,
    pub score: u64,
    pub time_ticks: u64,
}

impl SimState {
    /// Fresh, fully populated level
    pub fn new(seed: u64, level: u32, tuning: &LevelTuning) -> Self {
        let mut state = Self {
            seed,
            rng: Pcg32::seed_from_u64(seed.wrapping_add(level as u64)),
            level,
            store: EntityStore::new(tuning.grid_cols, tuning.grid_rows),
            abilities: AbilityKit::new(tuning),
            transformation: TransformationTracker::new(),
            particles: ParticleSystem::new(),
            effects: ActiveEffects::default(),
            score: 0,
            time_ticks: 0,
        };
        generate_level(&mut state, tuning);
        state
    }
}

/// Seeded level population: obstacles by density, starter collectibles,
/// rarity-weighted horses, linked portal pairs.
pub fn generate_level(state: &mut SimState, tuning: &LevelTuning) {
    for _ in 0..tuning.obstacle_count {
        if let Some(cell) = state.store.free_cell(&mut state.rng) {
            state.store.spawn_obstacle(cell);
        }
    }
    for _ in 0..tuning.collectible_count {
        if let Some(cell) = state.store.free_cell(&mut state.rng) {
            state.store.spawn_collectible(cell, tuning.collectible_value);
        }
    }
    for _ in 0..tuning.horse_count {
        let kind = roll_horse_kind(&mut state.rng, tuning);
        if let Some(cell) = state.store.free_cell(&mut state.rng) {
            state.store.spawn_horse(cell, kind);
        }
    }
    let kinds = [
        PortalKind::Stable,
        PortalKind::Arch,
        PortalKind::Flicker,
        PortalKind::Ancient,
    ];
    for i in 0..tuning.portal_pairs {
        let kind = kinds[i as usize % kinds.len()];
        let one_way = tuning.portal(kind).one_way;
        let (Some(a), Some(b)) = (
            state.store.free_cell(&mut state.rng),
            state.store.free_cell(&mut state.rng),
        ) else {
            break;
        };
        if a != b {
            state.store.spawn_portal_pair(kind, a, b, one_way);
        }
    }
    log::info!(
        "level {} generated: {} obstacles, {} collectibles, {} horses, {} portals",
        state.level,
        state.store.obstacles.len(),
        state.store.collectibles.len(),
        state.store.horses.len(),
        state.store.portals.len()
    );
}

/// Rarity-weighted horse kind draw
fn roll_horse_kind(rng: &mut Pcg32, tuning: &LevelTuning) -> HorseKind {
    let total: u32 = HorseKind::ALL.iter().map(|&k| tuning.horse(k).rarity).sum();
    let mut roll = rng.random_range(0..total.max(1));
    for kind in HorseKind::ALL {
        let weight = tuning.horse(kind).rarity;
        if roll < weight {
            return kind;
        }
        roll -= weight;
    }
    HorseKind::Pony
}

/// The whole game: phase machine, clock, tuning and the live level
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Game {
    machine: StateMachine,
    pub clock: GameClock,
    pub tuning: LevelTuning,
    pub sim: SimState,
    seed: u64,
}

impl Game {
    pub fn new(tuning: LevelTuning, seed: u64) -> Self {
        let sim = SimState::new(seed, 0, &tuning);
        Self {
            machine: StateMachine::new(),
            clock: GameClock::new(),
            tuning,
            sim,
            seed,
        }
    }

    pub fn phase(&self) -> GamePhase {
        self.machine.phase()
    }

    /// Assets and config are ready
    pub fn finish_loading(&mut self) {
        let _ = self.machine.transition(GamePhase::MainMenu);
    }

    /// User asked for the level list
    pub fn open_level_select(&mut self) {
        let _ = self.machine.transition(GamePhase::LevelSelect);
    }

    /// Consume one abstract input action
    pub fn handle_action(&mut self, action: Action) {
        match action {
            Action::MoveDirection(dir) => {
                if self.phase() == GamePhase::Playing {
                    self.sim.store.snake.set_direction(dir);
                }
            }
            Action::ActivateAbility(id) => {
                if self.phase() == GamePhase::Playing {
                    if let Err(err) = self.activate_ability(id) {
                        log::debug!("ability {:?} refused: {}", id, err);
                    }
                }
            }
            Action::TogglePause => {
                let target = match self.phase() {
                    GamePhase::Playing => GamePhase::Paused,
                    GamePhase::Paused => GamePhase::Playing,
                    other => other,
                };
                if target != self.phase() {
                    let _ = self.machine.transition(target);
                }
            }
            Action::SelectLevel(level) => {
                // From a terminal phase, route back through level select
                if matches!(self.phase(), GamePhase::GameOver | GamePhase::Victory) {
                    let _ = self.machine.transition(GamePhase::LevelSelect);
                }
                if self.phase() == GamePhase::LevelSelect
                    && self.machine.transition(GamePhase::Playing).is_ok()
                {
                    self.start_level(level);
                }
            }
            Action::Restart => {
                if matches!(self.phase(), GamePhase::GameOver | GamePhase::Victory)
                    && self.machine.transition(GamePhase::Playing).is_ok()
                {
                    let level = self.sim.level;
                    self.start_level(level);
                }
            }
        }
    }

    /// Full reset: store, fire meter, cooldowns, counter, particle pool
    fn start_level(&mut self, level: u32) {
        self.sim = SimState::new(self.seed, level, &self.tuning);
        self.clock.reset();
    }

    /// Try to fire an ability under the current stage's unlock set.
    /// Failures are non-fatal UI cues; success applies the effect at once.
    pub fn activate_ability(&mut self, id: AbilityId) -> Result<(), ActivationError> {
        let unlocks = self.sim.transformation.unlocks(&self.tuning).clone();
        let effect = self.sim.abilities.activate(id, &self.tuning, &unlocks)?;
        self.apply_ability_effect(effect);
        Ok(())
    }

    /// Advance the simulation by one frame's worth of time
    pub fn tick(&mut self, raw_dt: f32) -> Snapshot {
        let dt = self.clock.tick(raw_dt, self.machine.phase());
        if dt > 0.0 {
            self.sim.time_ticks += 1;

            // Snake movement; collisions resolve after every grid step so
            // a fast snake cannot tunnel through a cell's contents
            let speed = self.tuning.snake_speed * self.sim.effects.speed_multiplier(&self.tuning);
            let steps = self.sim.store.snake.due_steps(dt, speed);
            for _ in 0..steps {
                let (cols, rows) = (self.sim.store.cols, self.sim.store.rows);
                self.sim.store.snake.advance(cols, rows);
                if self.resolve_and_apply() {
                    break;
                }
            }

            // A fatal outcome freezes the rest of the tick
            if self.machine.phase() == GamePhase::Playing {
                self.sim
                    .store
                    .advance_horses(dt, &mut self.sim.rng, &self.tuning);
                self.sim.store.tick_portals(dt);
                self.sim.abilities.tick(dt, &self.tuning);
                self.sim.effects.tick(dt);
                self.sim.particles.tick(dt, &self.tuning);

                if self.sim.score >= self.tuning.victory_score {
                    let _ = self.machine.transition(GamePhase::Victory);
                }
            }
        }
        self.snapshot()
    }

    pub fn snapshot(&self) -> Snapshot {
        Snapshot::capture(self.machine.phase(), &self.sim, &self.clock, &self.tuning)
    }

    /// Resolve collisions at the current head cell and apply the
    /// outcomes. A teleport relocates the head, so the destination cell
    /// is resolved again like a movement step; each use arms portal
    /// cooldowns, which bounds the chain. Returns true if a fatal
    /// outcome ended the run.
    fn resolve_and_apply(&mut self) -> bool {
        loop {
            let outcomes = resolve(
                &self.sim.store,
                self.sim.effects.shield_active(),
                &self.tuning,
            );
            match self.apply_outcomes(outcomes) {
                Err(cause) => {
                    log::info!("fatal collision: {:?}", cause);
                    let _ = self.machine.transition(GamePhase::GameOver);
                    return true;
                }
                Ok(true) => continue,
                Ok(false) => return false,
            }
        }
    }

    /// Ok(true) means a teleport moved the head and the new cell still
    /// needs resolution
    fn apply_outcomes(&mut self, outcomes: Vec<Outcome>) -> Result<bool, FatalCause> {
        let mut head_moved = false;
        for outcome in outcomes {
            match outcome {
                Outcome::Fatal(cause) => return Err(cause),
                Outcome::ObstacleMelted { pos } => {
                    self.sim.store.remove_entity(CollisionLayer::Obstacle, pos);
                    self.sim.score += MELT_BONUS;
                    self.burst(ParticleKind::Smoke, pos, None, 0.3);
                }
                Outcome::Consume { pos, value } => self.consume_collectible(pos, value),
                Outcome::Teleport { from, dest, kind } => {
                    self.teleport(from, dest, kind);
                    head_moved = true;
                }
                Outcome::HorseContact { pos, kind } => self.horse_contact(pos, kind),
            }
        }
        Ok(head_moved)
    }

    fn consume_collectible(&mut self, pos: GridPos, value: u32) {
        self.sim.store.remove_entity(CollisionLayer::Collectible, pos);
        self.sim.score += value as u64;
        self.sim.store.snake.pending_growth += 1;

        let before = self.sim.transformation.current_stage_index(&self.tuning);
        self.sim.transformation.on_collectible_consumed();
        self.note_stage_change(before);

        self.burst(ParticleKind::Fire, pos, None, 0.25);

        // Keep the level stocked
        if let Some(cell) = self.sim.store.free_cell(&mut self.sim.rng) {
            self.sim
                .store
                .spawn_collectible(cell, self.tuning.collectible_value);
        }
    }

    fn teleport(&mut self, from: GridPos, dest: GridPos, kind: PortalKind) {
        let spec = *self.tuning.portal(kind);
        self.sim.store.snake.teleport_head(dest);

        // Arm the cooldown on both ends so a two-way pair cannot ping-pong
        for portal in &mut self.sim.store.portals {
            if portal.pos == from || portal.pos == dest {
                portal.cooldown_remaining = spec.cooldown;
            }
        }
        if spec.temporary {
            self.sim.store.remove_entity(CollisionLayer::Portal, from);
        }

        self.burst(ParticleKind::Portal, from, None, 0.4);
        self.burst(ParticleKind::Portal, dest, None, 0.4);
    }

    fn horse_contact(&mut self, pos: GridPos, kind: HorseKind) {
        let spec = *self.tuning.horse(kind);
        match spec.effect {
            HorseEffect::SpeedBoost => {
                self.sim.effects.speed_boost_remaining = spec.duration;
                self.sim.store.remove_entity(CollisionLayer::Horse, pos);
                self.burst(ParticleKind::Fire, pos, None, 0.3);
            }
            HorseEffect::TransformBoost => {
                let before = self.sim.transformation.current_stage_index(&self.tuning);
                self.sim
                    .transformation
                    .add_bonus(self.tuning.transform_boost_bonus);
                self.note_stage_change(before);
                self.sim.store.remove_entity(CollisionLayer::Horse, pos);
                self.burst(ParticleKind::Transformation, pos, None, 0.5);
            }
            HorseEffect::ChasePlayer => {
                // Only reachable with the shield policy in force
                self.sim.store.remove_entity(CollisionLayer::Horse, pos);
                self.sim.score += HOSTILE_DEFEAT_BONUS;
                self.burst(ParticleKind::Smoke, pos, None, 0.4);
            }
            HorseEffect::DropTreasures => {
                self.sim.store.remove_entity(CollisionLayer::Horse, pos);
                for _ in 0..self.tuning.treasure_drop_count {
                    if let Some(cell) = self.sim.store.free_cell(&mut self.sim.rng) {
                        self.sim
                            .store
                            .spawn_collectible(cell, self.tuning.collectible_value);
                    }
                }
                self.burst(ParticleKind::Transformation, pos, None, 0.3);
            }
            HorseEffect::CreatePath => {
                self.sim.store.remove_entity(CollisionLayer::Horse, pos);
                let dir = self.sim.store.snake.direction;
                self.clear_ray(pos, dir, PATH_RANGE, ParticleKind::Smoke);
            }
            HorseEffect::DangerWarning => {
                self.sim.effects.warning_remaining = spec.duration;
                // Mark every hostile on the map, then the sentinel flees
                let hostiles: Vec<GridPos> = self
                    .sim
                    .store
                    .horses
                    .iter()
                    .filter(|h| self.tuning.horse(h.kind).effect == HorseEffect::ChasePlayer)
                    .map(|h| h.pos)
                    .collect();
                for cell in hostiles {
                    self.burst(ParticleKind::Smoke, cell, None, 0.3);
                }
                self.relocate_horse(pos);
            }
            HorseEffect::Formation => {
                self.sim.score += FORMATION_BONUS;
                self.relocate_horse(pos);
            }
        }
    }

    /// Move a non-consumed horse off the head cell
    fn relocate_horse(&mut self, pos: GridPos) {
        if let Some(cell) = self.sim.store.free_cell(&mut self.sim.rng) {
            if let Some(horse) = self.sim.store.horses.iter_mut().find(|h| h.pos == pos) {
                horse.pos = cell;
            }
        }
    }

    /// Transformation burst when the derived stage index moved up
    fn note_stage_change(&mut self, before: usize) {
        let after = self.sim.transformation.current_stage_index(&self.tuning);
        if after > before {
            let head = self.sim.store.snake.head();
            log::info!(
                "transformation: {}",
                self.tuning.stages[after].name.as_str()
            );
            self.burst(ParticleKind::Transformation, head, None, 0.8);
        }
    }

    fn apply_ability_effect(&mut self, effect: AbilityEffect) {
        let head = self.sim.store.snake.head();
        let dir = self.sim.store.snake.direction;
        match effect.id {
            AbilityId::FlameBreath => {
                self.clear_ray(head, dir, effect.range, ParticleKind::Fire);
            }
            AbilityId::FireShield => {
                self.sim.effects.shield_remaining = effect.duration;
                self.burst(ParticleKind::Fire, head, None, 0.5);
            }
            AbilityId::PhoenixDash => {
                let (cols, rows) = (self.sim.store.cols, self.sim.store.rows);
                let mut cell = head;
                for _ in 0..effect.range {
                    cell = cell.step(dir, cols, rows);
                    if self.sim.store.obstacle_at(cell) {
                        self.sim.store.remove_entity(CollisionLayer::Obstacle, cell);
                        self.sim.score += MELT_BONUS;
                    }
                    self.burst(ParticleKind::Fire, cell, Some(dir.opposite()), 0.15);
                }
                self.sim.store.snake.teleport_head(cell);
                // The landing cell resolves like a movement step
                self.resolve_and_apply();
            }
            AbilityId::InfernoBurst => {
                let radius = effect.radius as i32;
                let (cols, rows) = (self.sim.store.cols, self.sim.store.rows);
                for dc in -radius..=radius {
                    for dr in -radius..=radius {
                        let cell = GridPos::new(
                            (head.col + dc).rem_euclid(cols),
                            (head.row + dr).rem_euclid(rows),
                        );
                        if self.sim.store.obstacle_at(cell) {
                            self.sim.store.remove_entity(CollisionLayer::Obstacle, cell);
                            self.sim.score += MELT_BONUS;
                        }
                        self.defeat_horses_at(cell);
                    }
                }
                self.burst(ParticleKind::Fire, head, None, 0.8);
                self.burst(ParticleKind::Smoke, head, None, 0.6);
            }
        }
    }

    /// Burn a ray of cells ahead: obstacles melt, horses are defeated
    fn clear_ray(&mut self, from: GridPos, dir: Direction, range: u32, kind: ParticleKind) {
        let (cols, rows) = (self.sim.store.cols, self.sim.store.rows);
        let mut cell = from;
        for _ in 0..range {
            cell = cell.step(dir, cols, rows);
            if self.sim.store.obstacle_at(cell) {
                self.sim.store.remove_entity(CollisionLayer::Obstacle, cell);
                self.sim.score += MELT_BONUS;
            }
            self.defeat_horses_at(cell);
            self.burst(kind, cell, Some(dir), 0.2);
        }
    }

    /// Fire removes every horse in the cell; only hostile kinds score
    fn defeat_horses_at(&mut self, cell: GridPos) {
        while let Some(i) = self.sim.store.horses.iter().position(|h| h.pos == cell) {
            let kind = self.sim.store.horses[i].kind;
            self.sim.store.horses.remove(i);
            if self.tuning.horse(kind).effect == HorseEffect::ChasePlayer {
                self.sim.score += HOSTILE_DEFEAT_BONUS;
            }
        }
    }

    fn burst(&mut self, kind: ParticleKind, cell: GridPos, dir: Option<Direction>, duration: f32) {
        self.sim
            .particles
            .request_spawn(&mut self.sim.rng, kind, cell, dir, duration, &self.tuning);
    }
}
