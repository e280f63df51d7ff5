//! Property tests for the simulation's core invariants
//!
//! These hammer the subsystems with arbitrary but bounded inputs: frame
//! deltas, spawn requests and collectible streams in any order must keep
//! the fire meter, cooldowns, stage index, snake length and particle
//! pool inside their documented bounds.

use proptest::prelude::*;
use rand::SeedableRng;
use rand_pcg::Pcg32;

use ember_serpent::consts::{BASE_LENGTH, MAX_LENGTH, MAX_PARTICLES, MAX_STEPS_PER_TICK};
use ember_serpent::sim::{
    AbilityId, AbilityKit, Direction, GamePhase, GridPos, ParticleKind, ParticleSystem, Snake,
    TransformationTracker,
};
use ember_serpent::tuning::{LevelTuning, StageUnlocks};

proptest! {
    /// Fire stays in [0, max] and every cooldown in [0, duration] no
    /// matter how deltas and activation attempts interleave.
    #[test]
    fn ability_kit_bounds_hold(
        steps in prop::collection::vec((0.0f32..0.5, 0u8..4), 1..200),
    ) {
        let tuning = LevelTuning::default();
        let mut kit = AbilityKit::new(&tuning);
        for (dt, pick) in steps {
            let id = AbilityId::ALL[pick as usize];
            let _ = kit.activate(id, &tuning, &StageUnlocks::All);
            kit.tick(dt, &tuning);

            prop_assert!(kit.fire.current >= 0.0);
            prop_assert!(kit.fire.current <= kit.fire.max);
            for id in AbilityId::ALL {
                let cd = kit.cooldown_remaining(id);
                prop_assert!(cd >= 0.0);
                prop_assert!(cd <= tuning.ability(id).cooldown);
            }
        }
    }

    /// A refused activation never changes the meter or any cooldown.
    #[test]
    fn refused_activation_is_a_noop(
        fire in 0.0f32..15.0,
        pick in 0u8..4,
    ) {
        let tuning = LevelTuning::default();
        let mut kit = AbilityKit::new(&tuning);
        kit.fire.current = fire; // below every default cost
        let before = kit.fire.current;

        let id = AbilityId::ALL[pick as usize];
        prop_assert!(kit.activate(id, &tuning, &StageUnlocks::All).is_err());
        prop_assert_eq!(kit.fire.current, before);
        for id in AbilityId::ALL {
            prop_assert_eq!(kit.cooldown_remaining(id), 0.0);
        }
    }

    /// The derived stage index never decreases along any consumption
    /// stream, and never exceeds the ladder.
    #[test]
    fn stage_index_is_monotone(bonuses in prop::collection::vec(0u32..5, 1..100)) {
        let tuning = LevelTuning::default();
        let mut tracker = TransformationTracker::new();
        let mut last = tracker.current_stage_index(&tuning);
        for bonus in bonuses {
            if bonus == 0 {
                tracker.on_collectible_consumed();
            } else {
                tracker.add_bonus(bonus);
            }
            let index = tracker.current_stage_index(&tuning);
            prop_assert!(index >= last);
            prop_assert!(index < tuning.stages.len());
            last = index;
        }
    }

    /// Pool occupancy never exceeds capacity for any request sequence,
    /// and ticking only ever shrinks it.
    #[test]
    fn particle_pool_respects_capacity(
        requests in prop::collection::vec((0u8..4, 0.0f32..3.0), 1..60),
        seed in any::<u64>(),
    ) {
        let tuning = LevelTuning::default();
        let mut rng = Pcg32::seed_from_u64(seed);
        let mut pool = ParticleSystem::new();
        for (pick, duration) in requests {
            let kind = [
                ParticleKind::Fire,
                ParticleKind::Smoke,
                ParticleKind::Portal,
                ParticleKind::Transformation,
            ][pick as usize];
            pool.request_spawn(&mut rng, kind, GridPos::new(4, 4), None, duration, &tuning);
            prop_assert!(pool.len() <= MAX_PARTICLES);

            let before = pool.len();
            pool.tick(1.0 / 60.0, &tuning);
            prop_assert!(pool.len() <= before);
        }
    }

    /// Snake length equals BASE_LENGTH plus paid-out growth, capped at
    /// MAX_LENGTH, for any interleaving of feeding and stepping.
    #[test]
    fn snake_length_tracks_growth(feeds in prop::collection::vec(any::<bool>(), 1..300)) {
        let mut snake = Snake::new(GridPos::new(16, 12), Direction::Right, 64, 64);
        let mut paid = 0usize;
        for feed in feeds {
            if feed {
                snake.pending_growth += 1;
            }
            let owed = snake.pending_growth;
            snake.advance(64, 64);
            if owed > 0 {
                paid += 1;
            }
            prop_assert_eq!(
                snake.segments.len(),
                (BASE_LENGTH + paid).min(MAX_LENGTH)
            );
        }
    }

    /// Whole steps owed over any frame-delta sequence stay within one
    /// cell of speed * elapsed, and no single tick exceeds the clamp.
    #[test]
    fn due_steps_tracks_real_time(deltas in prop::collection::vec(0.0f32..0.05, 1..300)) {
        let speed = 8.0;
        let mut snake = Snake::new(GridPos::new(5, 5), Direction::Right, 32, 24);
        let mut total_steps = 0u32;
        let mut total_time = 0.0f32;
        for dt in deltas {
            let steps = snake.due_steps(dt, speed);
            prop_assert!(steps <= MAX_STEPS_PER_TICK);
            total_steps += steps;
            total_time += dt;
        }
        // Small per-tick deltas never hit the clamp, so no backlog is lost
        let expected = total_time * speed;
        prop_assert!((total_steps as f32) <= expected + 1.0);
        prop_assert!((total_steps as f32) >= expected - 1.0);
    }

    /// The clock emits zero outside Playing and clamped values inside,
    /// for arbitrary (even hostile) raw deltas.
    #[test]
    fn clock_output_is_bounded(raw in -10.0f32..100.0, playing in any::<bool>()) {
        use ember_serpent::consts::MAX_FRAME_DT;
        use ember_serpent::sim::GameClock;

        let mut clock = GameClock::new();
        let phase = if playing { GamePhase::Playing } else { GamePhase::Paused };
        let dt = clock.tick(raw, phase);
        prop_assert!(dt >= 0.0);
        prop_assert!(dt <= MAX_FRAME_DT);
        if !playing {
            prop_assert_eq!(dt, 0.0);
        }
    }
}
