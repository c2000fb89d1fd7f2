//! Pure scoring rules for the reflex game.
//!
//! A hit earns `base_points` plus a streak bonus that grows in steps of
//! `bonus_step` every `bonus_every` consecutive hits, capped at `bonus_cap`.
//! A miss breaks the streak and costs `miss_penalty`, never taking the score
//! below zero.

use serde::{Deserialize, Serialize};

/// Floor for points credited by a generic match.
pub const MIN_MATCH_POINTS: u32 = 5;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScoringRules {
    pub base_points: u32,
    pub bonus_every: u32,
    pub bonus_step: u32,
    pub bonus_cap: u32,
    pub miss_penalty: u32,
}

impl Default for ScoringRules {
    fn default() -> Self {
        Self {
            base_points: 10,
            bonus_every: 5,
            bonus_step: 5,
            bonus_cap: 20,
            miss_penalty: 5,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HitOutcome {
    pub points: u32,
    pub streak: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MissOutcome {
    pub penalty: u32,
    pub score: u32,
}

impl ScoringRules {
    pub fn streak_bonus(&self, streak: u32) -> u32 {
        if self.bonus_every == 0 {
            return 0;
        }
        (streak / self.bonus_every)
            .saturating_mul(self.bonus_step)
            .min(self.bonus_cap)
    }

    /// Bonus is computed on the streak *after* counting this hit.
    pub fn on_hit(&self, streak: u32) -> HitOutcome {
        let streak = streak.saturating_add(1);
        HitOutcome {
            points: self.base_points.saturating_add(self.streak_bonus(streak)),
            streak,
        }
    }

    pub fn on_miss(&self, score: u32) -> MissOutcome {
        let next = score.saturating_sub(self.miss_penalty);
        MissOutcome {
            penalty: score - next,
            score: next,
        }
    }
}

/// Share of inputs that were hits; a run without input counts as perfect.
pub fn accuracy(hits: u32, misses: u32) -> f64 {
    let total = u64::from(hits) + u64::from(misses);
    if total == 0 {
        return 1.0;
    }
    f64::from(hits) / total as f64
}

/// Profile points credited for recording a generic match.
pub fn points_earned(score: u32) -> u32 {
    (score / 2).max(MIN_MATCH_POINTS)
}

#[cfg(test)]
#[path = "tests/scoring_tests.rs"]
mod tests;
