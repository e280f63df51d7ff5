//! Bounded pool of transient visual particles
//!
//! Particles are the only entities living in continuous space. The pool
//! is exclusively owned here; everything else talks to it through spawn
//! requests. At capacity a request issues nothing - silent backpressure,
//! never eviction.

use glam::Vec2;
use rand::Rng;
use rand_pcg::Pcg32;
use serde::{Deserialize, Serialize};
use std::f32::consts::{PI, TAU};

use crate::cell_center;
use crate::consts::MAX_PARTICLES;
use crate::sim::state::{Direction, GridPos};
use crate::tuning::LevelTuning;

/// Particle flavor; palette/size/lifetime/emission come from tuning
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ParticleKind {
    Fire,
    Smoke,
    Portal,
    Transformation,
}

/// Canonical simulation fields only; opacity and size scale are derived
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Particle {
    pub kind: ParticleKind,
    pub pos: Vec2,
    pub vel: Vec2,
    pub size: f32,
    /// Packed 0x00RRGGBB, chosen once at spawn
    pub color: u32,
    pub rotation: f32,
    pub rotation_speed: f32,
    pub age: f32,
    pub max_lifetime: f32,
}

impl Particle {
    fn life_ratio(&self) -> f32 {
        (self.age / self.max_lifetime).clamp(0.0, 1.0)
    }

    /// Rendering opacity as a function of age; per-kind curve
    pub fn opacity(&self) -> f32 {
        let t = self.life_ratio();
        match self.kind {
            ParticleKind::Fire => 1.0 - t,
            ParticleKind::Smoke => (1.0 - t) * 0.6,
            // Pulse that still dies out by end of life
            ParticleKind::Portal => (0.6 + 0.4 * (t * TAU * 3.0).sin()) * (1.0 - t),
            ParticleKind::Transformation => 1.0 - t * t,
        }
    }

    /// Rendering size multiplier as a function of age; per-kind curve
    pub fn size_scale(&self) -> f32 {
        let t = self.life_ratio();
        match self.kind {
            // Embers shrink as they cool
            ParticleKind::Fire => 1.0 - 0.6 * t,
            // Smoke expands as it disperses
            ParticleKind::Smoke => 1.0 + 1.2 * t,
            ParticleKind::Portal => 1.0 + 0.25 * (t * TAU * 3.0).sin(),
            // Grow then collapse
            ParticleKind::Transformation => 0.4 + (PI * t).sin(),
        }
    }
}

/// Per-second drag applied to every particle
const PARTICLE_DRAG: f32 = 1.2;
/// Spawn speed range, world units/second
const SPAWN_SPEED: (f32, f32) = (25.0, 75.0);

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ParticleSystem {
    particles: Vec<Particle>,
    capacity: usize,
}

impl ParticleSystem {
    pub fn new() -> Self {
        Self::with_capacity(MAX_PARTICLES)
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            particles: Vec::with_capacity(capacity),
            capacity,
        }
    }

    pub fn len(&self) -> usize {
        self.particles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.particles.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Particle> {
        self.particles.iter()
    }

    pub fn clear(&mut self) {
        self.particles.clear();
    }

    /// Emit a burst at a grid cell. Count is an emission-rate sample times
    /// the requested duration; every particle's velocity, size, color,
    /// lifetime and spin are sampled independently. Requests that do not
    /// fit in the pool are dropped without error.
    pub fn request_spawn(
        &mut self,
        rng: &mut Pcg32,
        kind: ParticleKind,
        cell: GridPos,
        direction: Option<Direction>,
        duration: f32,
        tuning: &LevelTuning,
    ) {
        let spec = tuning.particles(kind);
        let rate = rng.random_range(spec.emission.0..=spec.emission.1);
        let count = (rate * duration).floor() as usize;
        let origin = cell_center(cell.col, cell.row);
        let bias = direction.map_or(Vec2::ZERO, dir_vec);

        for _ in 0..count {
            if self.particles.len() >= self.capacity {
                return;
            }
            let angle = rng.random_range(0.0..TAU);
            let noise = Vec2::new(angle.cos(), angle.sin());
            let speed = rng.random_range(SPAWN_SPEED.0..SPAWN_SPEED.1);
            let vel = (bias * 0.7 + noise * 0.5).normalize_or_zero() * speed;
            let palette = &spec.palette;
            let color = palette[rng.random_range(0..palette.len())];

            self.particles.push(Particle {
                kind,
                pos: origin + noise * rng.random_range(0.0..4.0),
                vel,
                size: rng.random_range(spec.size.0..=spec.size.1),
                color,
                rotation: rng.random_range(0.0..TAU),
                rotation_speed: rng.random_range(-4.0..4.0),
                age: 0.0,
                max_lifetime: rng.random_range(spec.lifetime.0..=spec.lifetime.1),
            });
        }
    }

    /// Integrate positions, apply per-kind rise bias and drag, age and cull
    pub fn tick(&mut self, dt: f32, tuning: &LevelTuning) {
        for p in &mut self.particles {
            p.pos += p.vel * dt;
            // Negative y is up in particle space
            p.vel.y -= tuning.particles(p.kind).rise * dt;
            p.vel *= (1.0 - PARTICLE_DRAG * dt).max(0.0);
            p.rotation += p.rotation_speed * dt;
            p.age += dt;
        }
        self.particles.retain(|p| p.age < p.max_lifetime);
    }
}

impl Default for ParticleSystem {
    fn default() -> Self {
        Self::new()
    }
}

fn dir_vec(dir: Direction) -> Vec2 {
    let (dc, dr) = dir.delta();
    Vec2::new(dc as f32, dr as f32)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;

    fn rng() -> Pcg32 {
        Pcg32::seed_from_u64(42)
    }

    #[test]
    fn test_spawn_produces_particles() {
        let tuning = LevelTuning::default();
        let mut rng = rng();
        let mut pool = ParticleSystem::new();
        pool.request_spawn(
            &mut rng,
            ParticleKind::Fire,
            GridPos::new(4, 4),
            Some(Direction::Right),
            1.0,
            &tuning,
        );
        // Default fire emission is 20-40/s
        assert!(pool.len() >= 20 && pool.len() <= 40);
        for p in pool.iter() {
            assert!(tuning.fire_particles.palette.contains(&p.color));
            assert_eq!(p.age, 0.0);
            assert!(p.max_lifetime > 0.0);
        }
    }

    #[test]
    fn test_pool_never_exceeds_capacity() {
        let tuning = LevelTuning::default();
        let mut rng = rng();
        let mut pool = ParticleSystem::with_capacity(50);
        for _ in 0..40 {
            pool.request_spawn(
                &mut rng,
                ParticleKind::Smoke,
                GridPos::new(1, 1),
                None,
                2.0,
                &tuning,
            );
            assert!(pool.len() <= 50);
        }
        assert_eq!(pool.len(), 50);
    }

    #[test]
    fn test_full_pool_drops_without_eviction() {
        let tuning = LevelTuning::default();
        let mut rng = rng();
        let mut pool = ParticleSystem::with_capacity(30);
        pool.request_spawn(
            &mut rng,
            ParticleKind::Fire,
            GridPos::new(2, 2),
            None,
            5.0,
            &tuning,
        );
        assert_eq!(pool.len(), 30);
        let snapshot: Vec<f32> = pool.iter().map(|p| p.max_lifetime).collect();
        pool.request_spawn(
            &mut rng,
            ParticleKind::Portal,
            GridPos::new(3, 3),
            None,
            5.0,
            &tuning,
        );
        // Existing particles untouched
        let after: Vec<f32> = pool.iter().map(|p| p.max_lifetime).collect();
        assert_eq!(snapshot, after);
    }

    #[test]
    fn test_particles_age_out() {
        let tuning = LevelTuning::default();
        let mut rng = rng();
        let mut pool = ParticleSystem::new();
        pool.request_spawn(
            &mut rng,
            ParticleKind::Fire,
            GridPos::new(0, 0),
            None,
            0.5,
            &tuning,
        );
        assert!(!pool.is_empty());
        // Default fire lifetime tops out at 0.9s
        for _ in 0..70 {
            pool.tick(1.0 / 60.0, &tuning);
        }
        assert!(pool.is_empty());
    }

    #[test]
    fn test_derived_curves_stay_sane() {
        let tuning = LevelTuning::default();
        let mut rng = rng();
        let mut pool = ParticleSystem::new();
        for kind in [
            ParticleKind::Fire,
            ParticleKind::Smoke,
            ParticleKind::Portal,
            ParticleKind::Transformation,
        ] {
            pool.request_spawn(&mut rng, kind, GridPos::new(5, 5), None, 0.8, &tuning);
        }
        for _ in 0..40 {
            pool.tick(1.0 / 60.0, &tuning);
            for p in pool.iter() {
                assert!((0.0..=1.0).contains(&p.opacity()));
                assert!(p.size_scale() > 0.0);
            }
        }
    }

    #[test]
    fn test_spawn_is_deterministic_for_a_seed() {
        let tuning = LevelTuning::default();
        let mut a = Pcg32::seed_from_u64(7);
        let mut b = Pcg32::seed_from_u64(7);
        let mut pool_a = ParticleSystem::new();
        let mut pool_b = ParticleSystem::new();
        pool_a.request_spawn(
            &mut a,
            ParticleKind::Transformation,
            GridPos::new(6, 2),
            Some(Direction::Up),
            1.0,
            &tuning,
        );
        pool_b.request_spawn(
            &mut b,
            ParticleKind::Transformation,
            GridPos::new(6, 2),
            Some(Direction::Up),
            1.0,
            &tuning,
        );
        assert_eq!(pool_a.len(), pool_b.len());
        for (x, y) in pool_a.iter().zip(pool_b.iter()) {
            assert_eq!(x.pos, y.pos);
            assert_eq!(x.vel, y.vel);
            assert_eq!(x.color, y.color);
        }
    }
}
