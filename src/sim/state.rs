//! Entity storage and the coarse game-state machine
//!
//! Every gameplay entity except particles lives on the integer grid and
//! carries exactly one collision layer tag.

use rand::Rng;
use rand_pcg::Pcg32;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::consts::{BASE_LENGTH, MAX_LENGTH, MAX_STEPS_PER_TICK};
use crate::tuning::{HorseEffect, LevelTuning};

/// Integer grid position
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct GridPos {
    pub col: i32,
    pub row: i32,
}

impl GridPos {
    pub fn new(col: i32, row: i32) -> Self {
        Self { col, row }
    }

    /// Neighbor cell in a direction, wrapped to the grid torus
    pub fn step(self, dir: Direction, cols: i32, rows: i32) -> Self {
        let (dc, dr) = dir.delta();
        Self {
            col: (self.col + dc).rem_euclid(cols),
            row: (self.row + dr).rem_euclid(rows),
        }
    }
}

/// One of the four movement directions
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Direction {
    Up,
    Down,
    Left,
    Right,
}

impl Direction {
    pub const ALL: [Direction; 4] = [
        Direction::Up,
        Direction::Down,
        Direction::Left,
        Direction::Right,
    ];

    /// Unit grid delta (row axis points down)
    pub fn delta(self) -> (i32, i32) {
        match self {
            Direction::Up => (0, -1),
            Direction::Down => (0, 1),
            Direction::Left => (-1, 0),
            Direction::Right => (1, 0),
        }
    }

    pub fn opposite(self) -> Self {
        match self {
            Direction::Up => Direction::Down,
            Direction::Down => Direction::Up,
            Direction::Left => Direction::Right,
            Direction::Right => Direction::Left,
        }
    }
}

/// Closed collision category set; resolution rules key off this tag
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CollisionLayer {
    Snake,
    Obstacle,
    Collectible,
    Horse,
    Portal,
    FireEffect,
}

/// The player snake: segments head-first on the grid
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Snake {
    pub segments: Vec<GridPos>,
    pub direction: Direction,
    /// Segments still owed from consumed collectibles; paid out one per
    /// movement step so growth lags consumption by exactly one step
    pub pending_growth: u32,
    /// Fractional-step accumulator so movement rate is frame-rate independent
    step_accumulator: f32,
}

impl Snake {
    /// Spawn with BASE_LENGTH segments trailing opposite the direction
    pub fn new(head: GridPos, direction: Direction, cols: i32, rows: i32) -> Self {
        let back = direction.opposite();
        let mut segments = Vec::with_capacity(BASE_LENGTH);
        let mut cell = head;
        for _ in 0..BASE_LENGTH {
            segments.push(cell);
            cell = cell.step(back, cols, rows);
        }
        Self {
            segments,
            direction,
            pending_growth: 0,
            step_accumulator: 0.0,
        }
    }

    pub fn head(&self) -> GridPos {
        self.segments[0]
    }

    /// Change heading; a reversal onto the neck is ignored
    pub fn set_direction(&mut self, dir: Direction) {
        if self.segments.len() > 1 && dir == self.direction.opposite() {
            return;
        }
        self.direction = dir;
    }

    /// Whole grid steps owed for this tick at `speed` cells/second
    pub fn due_steps(&mut self, dt: f32, speed: f32) -> u32 {
        self.step_accumulator += dt * speed;
        let mut steps = self.step_accumulator.floor() as u32;
        self.step_accumulator -= steps as f32;
        if steps > MAX_STEPS_PER_TICK {
            steps = MAX_STEPS_PER_TICK;
            self.step_accumulator = 0.0;
        }
        steps
    }

    /// Advance the head one cell; the tail is retained when growth is due
    pub fn advance(&mut self, cols: i32, rows: i32) -> GridPos {
        let new_head = self.head().step(self.direction, cols, rows);
        self.segments.insert(0, new_head);
        if self.pending_growth > 0 {
            self.pending_growth -= 1;
            // Growth beyond the length cap is dropped
            if self.segments.len() > MAX_LENGTH {
                self.segments.pop();
            }
        } else {
            self.segments.pop();
        }
        new_head
    }

    /// Relocate the head (portal/dash); body stays where it is and the
    /// tail catches up on subsequent steps
    pub fn teleport_head(&mut self, dest: GridPos) {
        self.segments[0] = dest;
    }

    /// Whether `cell` is occupied by the body, head excluded
    pub fn body_contains(&self, cell: GridPos) -> bool {
        self.segments[1..].contains(&cell)
    }
}

/// Score pickup, consumed on contact
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct Collectible {
    pub pos: GridPos,
    pub value: u32,
}

/// The seven horse variants; parameters live in [`LevelTuning`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum HorseKind {
    Mustang,
    Unicorn,
    Nightmare,
    Clydesdale,
    Pegasus,
    Sentinel,
    Pony,
}

impl HorseKind {
    pub const ALL: [HorseKind; 7] = [
        HorseKind::Mustang,
        HorseKind::Unicorn,
        HorseKind::Nightmare,
        HorseKind::Clydesdale,
        HorseKind::Pegasus,
        HorseKind::Sentinel,
        HorseKind::Pony,
    ];
}

/// A roaming horse with its own movement cadence
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Horse {
    pub pos: GridPos,
    pub kind: HorseKind,
    step_accumulator: f32,
}

impl Horse {
    pub fn new(pos: GridPos, kind: HorseKind) -> Self {
        Self {
            pos,
            kind,
            step_accumulator: 0.0,
        }
    }
}

/// The four portal variants; parameters live in [`LevelTuning`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PortalKind {
    Stable,
    /// One-way: only the entry half teleports
    Arch,
    /// Temporary: removed after first use
    Flicker,
    Ancient,
}

/// One end of a linked portal pair
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Portal {
    pub pos: GridPos,
    pub kind: PortalKind,
    pub dest: GridPos,
    /// False for the exit half of a one-way pair
    pub entry: bool,
    pub cooldown_remaining: f32,
}

/// Static blocker; never moves or expires
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct Obstacle {
    pub pos: GridPos,
}

/// Owns every grid entity for one level instance
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EntityStore {
    pub cols: i32,
    pub rows: i32,
    pub snake: Snake,
    pub collectibles: Vec<Collectible>,
    pub horses: Vec<Horse>,
    pub portals: Vec<Portal>,
    pub obstacles: Vec<Obstacle>,
}

impl EntityStore {
    pub fn new(cols: i32, rows: i32) -> Self {
        let head = GridPos::new(cols / 2, rows / 2);
        Self {
            cols,
            rows,
            snake: Snake::new(head, Direction::Right, cols, rows),
            collectibles: Vec::new(),
            horses: Vec::new(),
            portals: Vec::new(),
            obstacles: Vec::new(),
        }
    }

    /// Whether any entity (or the snake) occupies `cell`
    pub fn occupied(&self, cell: GridPos) -> bool {
        self.snake.segments.contains(&cell)
            || self.collectibles.iter().any(|c| c.pos == cell)
            || self.horses.iter().any(|h| h.pos == cell)
            || self.portals.iter().any(|p| p.pos == cell)
            || self.obstacle_at(cell)
    }

    pub fn obstacle_at(&self, cell: GridPos) -> bool {
        self.obstacles.iter().any(|o| o.pos == cell)
    }

    /// Draw an unoccupied cell from the RNG; None if the grid is saturated
    pub fn free_cell(&self, rng: &mut Pcg32) -> Option<GridPos> {
        for _ in 0..256 {
            let cell = GridPos::new(
                rng.random_range(0..self.cols),
                rng.random_range(0..self.rows),
            );
            if !self.occupied(cell) {
                return Some(cell);
            }
        }
        None
    }

    pub fn spawn_collectible(&mut self, pos: GridPos, value: u32) {
        self.collectibles.push(Collectible { pos, value });
    }

    pub fn spawn_horse(&mut self, pos: GridPos, kind: HorseKind) {
        self.horses.push(Horse::new(pos, kind));
    }

    pub fn spawn_obstacle(&mut self, pos: GridPos) {
        self.obstacles.push(Obstacle { pos });
    }

    /// Insert both halves of a linked portal pair
    pub fn spawn_portal_pair(&mut self, kind: PortalKind, a: GridPos, b: GridPos, one_way: bool) {
        self.portals.push(Portal {
            pos: a,
            kind,
            dest: b,
            entry: true,
            cooldown_remaining: 0.0,
        });
        self.portals.push(Portal {
            pos: b,
            kind,
            dest: a,
            entry: !one_way,
            cooldown_remaining: 0.0,
        });
    }

    /// Delete one entity of `layer` at `pos`; true if something was removed
    pub fn remove_entity(&mut self, layer: CollisionLayer, pos: GridPos) -> bool {
        fn remove_first<T>(items: &mut Vec<T>, pred: impl Fn(&T) -> bool) -> bool {
            if let Some(i) = items.iter().position(pred) {
                items.remove(i);
                true
            } else {
                false
            }
        }
        match layer {
            CollisionLayer::Collectible => remove_first(&mut self.collectibles, |c| c.pos == pos),
            CollisionLayer::Horse => remove_first(&mut self.horses, |h| h.pos == pos),
            CollisionLayer::Portal => remove_first(&mut self.portals, |p| p.pos == pos),
            CollisionLayer::Obstacle => remove_first(&mut self.obstacles, |o| o.pos == pos),
            CollisionLayer::Snake | CollisionLayer::FireEffect => false,
        }
    }

    /// Advance every horse at its own cadence. Chase horses home in on the
    /// snake head; the rest wander, never stepping onto obstacles.
    pub fn advance_horses(&mut self, dt: f32, rng: &mut Pcg32, tuning: &LevelTuning) {
        let head = self.snake.head();
        let (cols, rows) = (self.cols, self.rows);
        let obstacles: Vec<GridPos> = self.obstacles.iter().map(|o| o.pos).collect();

        for horse in &mut self.horses {
            let spec = tuning.horse(horse.kind);
            horse.step_accumulator += dt * spec.speed;
            while horse.step_accumulator >= 1.0 {
                horse.step_accumulator -= 1.0;

                let dir = if spec.effect == HorseEffect::ChasePlayer {
                    chase_direction(horse.pos, head, cols, rows)
                } else {
                    Direction::ALL[rng.random_range(0..4)]
                };
                let next = horse.pos.step(dir, cols, rows);
                if !obstacles.contains(&next) {
                    horse.pos = next;
                }
            }
        }
    }

    /// Decay per-instance portal cooldowns
    pub fn tick_portals(&mut self, dt: f32) {
        for portal in &mut self.portals {
            portal.cooldown_remaining = (portal.cooldown_remaining - dt).max(0.0);
        }
    }
}

/// Greedy torus-aware step toward `target`
fn chase_direction(from: GridPos, target: GridPos, cols: i32, rows: i32) -> Direction {
    let wrap = |d: i32, n: i32| {
        let d = d.rem_euclid(n);
        if d > n / 2 { d - n } else { d }
    };
    let dc = wrap(target.col - from.col, cols);
    let dr = wrap(target.row - from.row, rows);
    if dc.abs() >= dr.abs() {
        if dc >= 0 { Direction::Right } else { Direction::Left }
    } else if dr >= 0 {
        Direction::Down
    } else {
        Direction::Up
    }
}

/// Coarse phase of the whole game instance
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum GamePhase {
    Loading,
    MainMenu,
    LevelSelect,
    Playing,
    Paused,
    GameOver,
    Victory,
}

/// Rejected state-machine transition; reported, never fatal
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("invalid game state transition {from:?} -> {to:?}")]
pub struct InvalidTransition {
    pub from: GamePhase,
    pub to: GamePhase,
}

/// Gates which subsystems run; phase changes only through [`Self::transition`]
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StateMachine {
    phase: GamePhase,
}

impl StateMachine {
    pub fn new() -> Self {
        Self {
            phase: GamePhase::Loading,
        }
    }

    pub fn phase(&self) -> GamePhase {
        self.phase
    }

    /// Apply a transition if the table allows it; otherwise warn and no-op
    pub fn transition(&mut self, to: GamePhase) -> Result<(), InvalidTransition> {
        use GamePhase::*;
        let valid = matches!(
            (self.phase, to),
            (Loading, MainMenu)
                | (MainMenu, LevelSelect)
                | (LevelSelect, Playing)
                | (Playing, Paused)
                | (Paused, Playing)
                | (Playing, GameOver)
                | (Playing, Victory)
                | (GameOver, LevelSelect)
                | (GameOver, Playing)
                | (Victory, LevelSelect)
                | (Victory, Playing)
        );
        if valid {
            log::info!("game phase {:?} -> {:?}", self.phase, to);
            self.phase = to;
            Ok(())
        } else {
            let err = InvalidTransition {
                from: self.phase,
                to,
            };
            log::warn!("{err}");
            Err(err)
        }
    }
}

impl Default for StateMachine {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;

    #[test]
    fn test_snake_spawns_at_base_length() {
        let snake = Snake::new(GridPos::new(10, 10), Direction::Right, 32, 24);
        assert_eq!(snake.segments.len(), BASE_LENGTH);
        assert_eq!(snake.head(), GridPos::new(10, 10));
        // Body trails to the left
        assert_eq!(snake.segments[1], GridPos::new(9, 10));
    }

    #[test]
    fn test_growth_lags_by_one_step() {
        let mut snake = Snake::new(GridPos::new(10, 10), Direction::Right, 32, 24);
        snake.pending_growth = 1;
        assert_eq!(snake.segments.len(), BASE_LENGTH);
        snake.advance(32, 24);
        assert_eq!(snake.segments.len(), BASE_LENGTH + 1);
        assert_eq!(snake.pending_growth, 0);
        snake.advance(32, 24);
        assert_eq!(snake.segments.len(), BASE_LENGTH + 1);
    }

    #[test]
    fn test_reversal_is_ignored() {
        let mut snake = Snake::new(GridPos::new(10, 10), Direction::Right, 32, 24);
        snake.set_direction(Direction::Left);
        assert_eq!(snake.direction, Direction::Right);
        snake.set_direction(Direction::Up);
        assert_eq!(snake.direction, Direction::Up);
    }

    #[test]
    fn test_movement_wraps_the_grid() {
        let mut snake = Snake::new(GridPos::new(31, 10), Direction::Right, 32, 24);
        let head = snake.advance(32, 24);
        assert_eq!(head, GridPos::new(0, 10));
    }

    #[test]
    fn test_due_steps_accumulates_fractions() {
        let mut snake = Snake::new(GridPos::new(5, 5), Direction::Right, 32, 24);
        // 8 cells/s at 60 Hz: 0.1333 cells per tick
        let mut total = 0;
        for _ in 0..60 {
            total += snake.due_steps(1.0 / 60.0, 8.0);
        }
        assert_eq!(total, 8);
    }

    #[test]
    fn test_due_steps_clamps_huge_delta() {
        let mut snake = Snake::new(GridPos::new(5, 5), Direction::Right, 32, 24);
        let steps = snake.due_steps(10.0, 8.0);
        assert_eq!(steps, MAX_STEPS_PER_TICK);
        // Clamp also drops the backlog
        assert_eq!(snake.due_steps(0.0, 8.0), 0);
    }

    #[test]
    fn test_free_cell_avoids_occupied() {
        let mut store = EntityStore::new(8, 8);
        let mut rng = Pcg32::seed_from_u64(7);
        for _ in 0..20 {
            let cell = store.free_cell(&mut rng).unwrap();
            assert!(!store.occupied(cell));
            store.spawn_obstacle(cell);
        }
    }

    #[test]
    fn test_portal_pair_linking() {
        let mut store = EntityStore::new(16, 16);
        let a = GridPos::new(2, 2);
        let b = GridPos::new(12, 12);
        store.spawn_portal_pair(PortalKind::Arch, a, b, true);
        assert_eq!(store.portals.len(), 2);
        assert!(store.portals[0].entry);
        assert!(!store.portals[1].entry);
        assert_eq!(store.portals[0].dest, b);
    }

    #[test]
    fn test_machine_happy_path() {
        let mut machine = StateMachine::new();
        assert_eq!(machine.phase(), GamePhase::Loading);
        machine.transition(GamePhase::MainMenu).unwrap();
        machine.transition(GamePhase::LevelSelect).unwrap();
        machine.transition(GamePhase::Playing).unwrap();
        machine.transition(GamePhase::Paused).unwrap();
        machine.transition(GamePhase::Playing).unwrap();
        machine.transition(GamePhase::GameOver).unwrap();
        machine.transition(GamePhase::Playing).unwrap();
    }

    #[test]
    fn test_machine_rejects_out_of_order() {
        let mut machine = StateMachine::new();
        let err = machine.transition(GamePhase::Playing).unwrap_err();
        assert_eq!(err.from, GamePhase::Loading);
        // No-op: phase unchanged
        assert_eq!(machine.phase(), GamePhase::Loading);
        // Pausing from a menu is also invalid
        machine.transition(GamePhase::MainMenu).unwrap();
        assert!(machine.transition(GamePhase::Paused).is_err());
        assert_eq!(machine.phase(), GamePhase::MainMenu);
    }
}
