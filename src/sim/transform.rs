//! Transformation-stage progression
//!
//! The stage is never stored; it is derived from the cumulative
//! collectible counter on every query, so counter and stage cannot drift
//! apart and the index is monotonically non-decreasing by construction.

use serde::{Deserialize, Serialize};

use crate::tuning::{LevelTuning, StageSpec, StageUnlocks};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TransformationTracker {
    pub collectibles_obtained: u32,
}

impl TransformationTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn on_collectible_consumed(&mut self) {
        self.collectibles_obtained += 1;
    }

    /// Horse transform-boost bonus
    pub fn add_bonus(&mut self, bonus: u32) {
        self.collectibles_obtained += bonus;
    }

    /// Largest stage index whose threshold is <= the counter
    pub fn current_stage_index(&self, tuning: &LevelTuning) -> usize {
        tuning
            .stages
            .iter()
            .rposition(|s| s.threshold <= self.collectibles_obtained)
            .unwrap_or(0)
    }

    pub fn current_stage<'a>(&self, tuning: &'a LevelTuning) -> &'a StageSpec {
        &tuning.stages[self.current_stage_index(tuning)]
    }

    pub fn unlocks<'a>(&self, tuning: &'a LevelTuning) -> &'a StageUnlocks {
        &self.current_stage(tuning).unlocks
    }

    /// Fraction of the way from the current stage to the next, for the HUD.
    /// 1.0 once the final stage is reached.
    pub fn progress_to_next(&self, tuning: &LevelTuning) -> f32 {
        let index = self.current_stage_index(tuning);
        let Some(next) = tuning.stages.get(index + 1) else {
            return 1.0;
        };
        let current = tuning.stages[index].threshold;
        let span = next.threshold.saturating_sub(current).max(1);
        ((self.collectibles_obtained - current) as f32 / span as f32).clamp(0.0, 1.0)
    }
}
