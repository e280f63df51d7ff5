//! Layer-based collision resolution
//!
//! A pure query over the entity store: intersections at the snake head
//! (full body for self-collision) become outcome events that the tick
//! loop applies. Nothing here mutates state, so ability, transformation
//! and particle updates all consume the same event list within the tick.
//!
//! Tie-break policy: any fatal outcome preempts everything else in the
//! cell. Non-fatal outcomes are emitted in the fixed order
//! Collectible -> Portal -> Horse so score, teleports and horse effects
//! compose predictably. Same-layer entities sharing the cell are each
//! evaluated; they are never merged.

use serde::{Deserialize, Serialize};

use crate::sim::state::{EntityStore, GridPos, HorseKind, PortalKind};
use crate::tuning::{HorseEffect, LevelTuning};

/// What killed the snake
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FatalCause {
    SelfCollision,
    Obstacle,
    HostileHorse,
}

/// A resolved collision result for one tick
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum Outcome {
    Fatal(FatalCause),
    /// Obstacle destroyed by an active fire shield instead of killing
    ObstacleMelted { pos: GridPos },
    Consume { pos: GridPos, value: u32 },
    Teleport {
        from: GridPos,
        dest: GridPos,
        kind: PortalKind,
    },
    HorseContact { pos: GridPos, kind: HorseKind },
}

/// Resolve the current head cell against every other layer
pub fn resolve(store: &EntityStore, shield_active: bool, tuning: &LevelTuning) -> Vec<Outcome> {
    let head = store.snake.head();

    // Self-collision checks the whole body, head excluded
    if store.snake.body_contains(head) {
        return vec![Outcome::Fatal(FatalCause::SelfCollision)];
    }

    if store.obstacle_at(head) && !shield_active {
        return vec![Outcome::Fatal(FatalCause::Obstacle)];
    }

    for horse in &store.horses {
        if horse.pos == head
            && tuning.horse(horse.kind).effect == HorseEffect::ChasePlayer
            && !(shield_active && tuning.shield_blocks_hostiles)
        {
            return vec![Outcome::Fatal(FatalCause::HostileHorse)];
        }
    }

    let mut outcomes = Vec::new();

    if store.obstacle_at(head) {
        // Shield is active or we'd have returned above
        outcomes.push(Outcome::ObstacleMelted { pos: head });
    }

    for c in &store.collectibles {
        if c.pos == head {
            outcomes.push(Outcome::Consume {
                pos: head,
                value: c.value,
            });
        }
    }

    for p in &store.portals {
        if p.pos == head && p.entry && p.cooldown_remaining <= 0.0 {
            outcomes.push(Outcome::Teleport {
                from: head,
                dest: p.dest,
                kind: p.kind,
            });
        }
    }

    for h in &store.horses {
        if h.pos == head {
            outcomes.push(Outcome::HorseContact {
                pos: head,
                kind: h.kind,
            });
        }
    }

    outcomes
}

#[cfg(test)]
mod tests {
    use super::*;

    fn store() -> EntityStore {
        EntityStore::new(32, 24)
    }

    fn head(store: &EntityStore) -> GridPos {
        store.snake.head()
    }

    #[test]
    fn test_empty_cell_no_outcomes() {
        let s = store();
        assert!(resolve(&s, false, &LevelTuning::default()).is_empty());
    }

    #[test]
    fn test_self_collision_is_fatal_and_exclusive() {
        let tuning = LevelTuning::default();
        let mut s = store();
        // Fold the snake so the head overlaps a body segment
        let overlap = s.snake.segments[2];
        s.snake.segments[0] = overlap;
        // A collectible in the same cell must be ignored
        s.spawn_collectible(overlap, 10);
        let outcomes = resolve(&s, false, &tuning);
        assert_eq!(outcomes, vec![Outcome::Fatal(FatalCause::SelfCollision)]);
    }

    #[test]
    fn test_obstacle_fatal_without_shield() {
        let tuning = LevelTuning::default();
        let mut s = store();
        s.spawn_obstacle(head(&s));
        assert_eq!(
            resolve(&s, false, &tuning),
            vec![Outcome::Fatal(FatalCause::Obstacle)]
        );
    }

    #[test]
    fn test_shield_melts_obstacle_instead() {
        let tuning = LevelTuning::default();
        let mut s = store();
        let cell = head(&s);
        s.spawn_obstacle(cell);
        assert_eq!(
            resolve(&s, true, &tuning),
            vec![Outcome::ObstacleMelted { pos: cell }]
        );
    }

    #[test]
    fn test_collectible_then_portal_ordering() {
        // Head lands on a cell holding both a collectible and a ready
        // portal: consume first, teleport second.
        let tuning = LevelTuning::default();
        let mut s = store();
        let cell = head(&s);
        let dest = GridPos::new(1, 1);
        s.spawn_collectible(cell, 10);
        s.spawn_portal_pair(PortalKind::Stable, cell, dest, false);

        let outcomes = resolve(&s, false, &tuning);
        assert_eq!(
            outcomes,
            vec![
                Outcome::Consume {
                    pos: cell,
                    value: 10
                },
                Outcome::Teleport {
                    from: cell,
                    dest,
                    kind: PortalKind::Stable
                },
            ]
        );
    }

    #[test]
    fn test_portal_on_cooldown_is_inert() {
        let tuning = LevelTuning::default();
        let mut s = store();
        let cell = head(&s);
        s.spawn_portal_pair(PortalKind::Stable, cell, GridPos::new(1, 1), false);
        s.portals[0].cooldown_remaining = 1.5;
        assert!(resolve(&s, false, &tuning).is_empty());
    }

    #[test]
    fn test_same_layer_entities_each_evaluated() {
        let tuning = LevelTuning::default();
        let mut s = store();
        let cell = head(&s);
        s.spawn_collectible(cell, 10);
        s.spawn_collectible(cell, 25);
        let outcomes = resolve(&s, false, &tuning);
        assert_eq!(outcomes.len(), 2);
    }

    #[test]
    fn test_hostile_horse_fatal_without_shield() {
        let tuning = LevelTuning::default();
        let mut s = store();
        s.spawn_horse(head(&s), HorseKind::Nightmare);
        assert_eq!(
            resolve(&s, false, &tuning),
            vec![Outcome::Fatal(FatalCause::HostileHorse)]
        );
    }

    #[test]
    fn test_shield_policy_blocks_hostile() {
        let mut tuning = LevelTuning::default();
        let mut s = store();
        let cell = head(&s);
        s.spawn_horse(cell, HorseKind::Nightmare);

        // Default policy: shield converts the hit into a contact
        assert_eq!(
            resolve(&s, true, &tuning),
            vec![Outcome::HorseContact {
                pos: cell,
                kind: HorseKind::Nightmare
            }]
        );

        // Policy off: fatal even with the shield up
        tuning.shield_blocks_hostiles = false;
        assert_eq!(
            resolve(&s, true, &tuning),
            vec![Outcome::Fatal(FatalCause::HostileHorse)]
        );
    }

    #[test]
    fn test_friendly_horse_is_contact() {
        let tuning = LevelTuning::default();
        let mut s = store();
        let cell = head(&s);
        s.spawn_horse(cell, HorseKind::Mustang);
        assert_eq!(
            resolve(&s, false, &tuning),
            vec![Outcome::HorseContact {
                pos: cell,
                kind: HorseKind::Mustang
            }]
        );
    }

    #[test]
    fn test_one_way_exit_half_does_not_teleport() {
        let tuning = LevelTuning::default();
        let mut s = store();
        // Put the snake head on the exit half of a one-way pair
        let entry = GridPos::new(1, 1);
        let exit = head(&s);
        s.spawn_portal_pair(PortalKind::Arch, entry, exit, true);
        assert!(resolve(&s, false, &tuning).is_empty());
    }
}
