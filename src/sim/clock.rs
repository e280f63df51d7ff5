//! Frame-time gate for the simulation
//!
//! One clock drives every subsystem: it clamps wild frame deltas and
//! emits zero for any non-Playing phase, so pausing freezes the whole
//! tick pipeline without per-system checks.

use serde::{Deserialize, Serialize};

use crate::consts::MAX_FRAME_DT;
use crate::sim::state::GamePhase;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GameClock {
    /// In-level seconds accumulated while Playing
    pub elapsed: f32,
}

impl GameClock {
    pub fn new() -> Self {
        Self::default()
    }

    /// Effective delta for this tick: clamped while Playing, zero otherwise
    pub fn tick(&mut self, raw_dt: f32, phase: GamePhase) -> f32 {
        if phase != GamePhase::Playing {
            return 0.0;
        }
        let dt = raw_dt.clamp(0.0, MAX_FRAME_DT);
        self.elapsed += dt;
        dt
    }

    /// Fresh level instance
    pub fn reset(&mut self) {
        self.elapsed = 0.0;
    }
}
