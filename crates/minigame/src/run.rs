//! Lifecycle of a single timed run: `Idle -> Running -> Ended`.

use std::{fmt, time::Duration};

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

use crate::{
    scoring::{accuracy, HitOutcome, MissOutcome, ScoringRules},
    target::{Arena, Point, RandomSpawner, Target, TargetSpawner},
};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GameConfig {
    pub run_seconds: u64,
    /// `None` keeps each target in place until it is hit.
    pub target_lifetime_ms: Option<u64>,
    pub target_radius: f32,
    pub arena: Arena,
    pub scoring: ScoringRules,
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            run_seconds: 60,
            target_lifetime_ms: Some(650),
            target_radius: 22.0,
            arena: Arena::default(),
            scoring: ScoringRules::default(),
        }
    }
}

impl GameConfig {
    pub fn run_duration(&self) -> Duration {
        Duration::from_secs(self.run_seconds)
    }

    pub fn target_lifetime(&self) -> Option<Duration> {
        self.target_lifetime_ms.map(Duration::from_millis)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RunId(pub u64);

impl fmt::Display for RunId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunPhase {
    Idle,
    Running,
    Ended,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EndReason {
    TimerExpired,
    Stopped,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Tally {
    pub score: u32,
    pub streak: u32,
    pub best_streak: u32,
    pub hits: u32,
    pub misses: u32,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ActiveRun {
    pub id: RunId,
    pub tally: Tally,
    pub elapsed: Duration,
    pub remaining: Duration,
    pub target: Target,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RunSummary {
    pub run_id: RunId,
    pub score: u32,
    pub hits: u32,
    pub misses: u32,
    pub best_streak: u32,
    pub remaining: Duration,
    pub reason: EndReason,
}

impl RunSummary {
    pub fn accuracy(&self) -> f64 {
        accuracy(self.hits, self.misses)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum RunState {
    Idle,
    Running(ActiveRun),
    Ended(RunSummary),
}

impl RunState {
    pub fn phase(&self) -> RunPhase {
        match self {
            RunState::Idle => RunPhase::Idle,
            RunState::Running(_) => RunPhase::Running,
            RunState::Ended(_) => RunPhase::Ended,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputOutcome {
    Hit(HitOutcome),
    Miss(MissOutcome),
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum RunError {
    #[error("run {0} is still in progress")]
    AlreadyRunning(RunId),
}

pub struct RunController<S: TargetSpawner = RandomSpawner> {
    config: GameConfig,
    spawner: S,
    state: RunState,
    next_run: u64,
}

impl RunController<RandomSpawner> {
    pub fn with_random_targets(config: GameConfig) -> Self {
        Self::new(config, RandomSpawner::from_entropy())
    }
}

impl<S: TargetSpawner> RunController<S> {
    pub fn new(config: GameConfig, spawner: S) -> Self {
        Self {
            config,
            spawner,
            state: RunState::Idle,
            next_run: 1,
        }
    }

    pub fn config(&self) -> &GameConfig {
        &self.config
    }

    pub fn state(&self) -> &RunState {
        &self.state
    }

    pub fn phase(&self) -> RunPhase {
        self.state.phase()
    }

    pub fn is_running(&self) -> bool {
        self.phase() == RunPhase::Running
    }

    pub fn active(&self) -> Option<&ActiveRun> {
        match &self.state {
            RunState::Running(run) => Some(run),
            _ => None,
        }
    }

    pub fn target(&self) -> Option<&Target> {
        self.active().map(|run| &run.target)
    }

    /// Countdown shown to the player; a fresh run's full length while idle.
    pub fn time_remaining(&self) -> Duration {
        match &self.state {
            RunState::Idle => self.config.run_duration(),
            RunState::Running(run) => run.remaining,
            RunState::Ended(summary) => summary.remaining,
        }
    }

    pub fn start(&mut self) -> Result<RunId, RunError> {
        if let RunState::Running(run) = &self.state {
            return Err(RunError::AlreadyRunning(run.id));
        }

        let id = RunId(self.next_run);
        self.next_run += 1;
        let target = self.spawn_target(Duration::ZERO);
        self.state = RunState::Running(ActiveRun {
            id,
            tally: Tally::default(),
            elapsed: Duration::ZERO,
            remaining: self.config.run_duration(),
            target,
        });
        debug!(run = id.0, seconds = self.config.run_seconds, "run started");
        Ok(id)
    }

    /// Advances the countdown. Returns the summary on the tick that ends the run.
    pub fn tick(&mut self, dt: Duration) -> Option<RunSummary> {
        let (elapsed, remaining, expired) = {
            let RunState::Running(run) = &mut self.state else {
                return None;
            };
            run.elapsed += dt;
            run.remaining = run.remaining.saturating_sub(dt);
            (run.elapsed, run.remaining, run.target.is_expired(run.elapsed))
        };

        if remaining.is_zero() {
            return self.finish(EndReason::TimerExpired);
        }

        if expired {
            let target = self.spawn_target(elapsed);
            if let RunState::Running(run) = &mut self.state {
                run.target = target;
            }
        }
        None
    }

    pub fn hit(&mut self) -> Option<HitOutcome> {
        let rules = self.config.scoring;
        let elapsed = {
            let RunState::Running(run) = &mut self.state else {
                return None;
            };
            run.elapsed
        };
        let target = self.spawn_target(elapsed);

        let RunState::Running(run) = &mut self.state else {
            return None;
        };
        let outcome = rules.on_hit(run.tally.streak);
        run.tally.streak = outcome.streak;
        run.tally.best_streak = run.tally.best_streak.max(outcome.streak);
        run.tally.hits += 1;
        run.tally.score = run.tally.score.saturating_add(outcome.points);
        run.target = target;
        Some(outcome)
    }

    pub fn miss(&mut self) -> Option<MissOutcome> {
        let rules = self.config.scoring;
        let RunState::Running(run) = &mut self.state else {
            return None;
        };
        let outcome = rules.on_miss(run.tally.score);
        run.tally.streak = 0;
        run.tally.misses += 1;
        run.tally.score = outcome.score;
        Some(outcome)
    }

    /// Pointer input: inside the current target is a hit, anywhere else a miss.
    pub fn click(&mut self, point: Point) -> Option<InputOutcome> {
        let on_target = self.target()?.contains(point);
        if on_target {
            self.hit().map(InputOutcome::Hit)
        } else {
            self.miss().map(InputOutcome::Miss)
        }
    }

    /// Ends the run early. Only the first call for a run yields a summary.
    pub fn stop(&mut self) -> Option<RunSummary> {
        self.finish(EndReason::Stopped)
    }

    pub fn reset(&mut self) -> Result<(), RunError> {
        if let RunState::Running(run) = &self.state {
            return Err(RunError::AlreadyRunning(run.id));
        }
        self.state = RunState::Idle;
        Ok(())
    }

    fn finish(&mut self, reason: EndReason) -> Option<RunSummary> {
        let RunState::Running(run) = &self.state else {
            return None;
        };
        let summary = RunSummary {
            run_id: run.id,
            score: run.tally.score,
            hits: run.tally.hits,
            misses: run.tally.misses,
            best_streak: run.tally.best_streak,
            remaining: run.remaining,
            reason,
        };
        self.state = RunState::Ended(summary);
        debug!(
            run = summary.run_id.0,
            score = summary.score,
            hits = summary.hits,
            misses = summary.misses,
            reason = ?reason,
            "run ended"
        );
        Some(summary)
    }

    fn spawn_target(&mut self, now: Duration) -> Target {
        let radius = self.config.target_radius;
        Target {
            position: self.spawner.place(&self.config.arena, radius),
            radius,
            expires_at: self.config.target_lifetime().map(|lifetime| now + lifetime),
        }
    }
}

#[cfg(test)]
#[path = "tests/run_tests.rs"]
mod tests;
