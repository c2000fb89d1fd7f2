//! Reflex mini-game core: run lifecycle, scoring and target placement.
//!
//! Nothing here touches the network or a clock; callers feed elapsed time
//! through [`RunController::tick`] and player input through
//! [`RunController::hit`], [`RunController::miss`] or [`RunController::click`].

pub mod run;
pub mod scoring;
pub mod target;

pub use run::{
    ActiveRun, EndReason, GameConfig, InputOutcome, RunController, RunError, RunId, RunPhase,
    RunState, RunSummary, Tally,
};
pub use scoring::{accuracy, points_earned, HitOutcome, MissOutcome, ScoringRules};
pub use target::{Arena, Point, RandomSpawner, Target, TargetSpawner};
