//! Controller for the daily competition screen: resolves today's
//! competition, drives runs, submits finished runs and keeps the leaderboard
//! current. Rendering layers read its state and forward input to it.

use std::{sync::Arc, time::Duration};

use minigame::{
    InputOutcome, Point, RandomSpawner, RunController, RunError, RunId, RunSummary, TargetSpawner,
};
use shared::{
    domain::{CompetitionDay, CompetitionId},
    protocol::AuthUser,
};
use thiserror::Error;
use tracing::{info, warn};

use crate::{
    backend::CompetitionBackend,
    error::BackendError,
    leaderboard::{Leaderboard, LeaderboardFetcher},
    submission::{SubmissionGate, SubmissionReceipt, SubmitError},
};

#[derive(Debug, Error)]
pub enum CompetitionError {
    #[error("sign in to play")]
    SignInRequired,
    #[error(transparent)]
    Backend(#[from] BackendError),
    #[error(transparent)]
    Submit(#[from] SubmitError),
    #[error(transparent)]
    Run(#[from] RunError),
}

pub struct DailyCompetition<B, S = RandomSpawner>
where
    B: CompetitionBackend + ?Sized,
    S: TargetSpawner,
{
    backend: Arc<B>,
    user: AuthUser,
    day: CompetitionDay,
    competition_id: CompetitionId,
    best_saved: Option<u32>,
    fetcher: LeaderboardFetcher,
    leaderboard: Leaderboard,
    run: RunController<S>,
    gate: Arc<SubmissionGate>,
    last_error: Option<String>,
}

impl<B, S> DailyCompetition<B, S>
where
    B: CompetitionBackend + ?Sized,
    S: TargetSpawner,
{
    pub async fn open(
        backend: Arc<B>,
        day: CompetitionDay,
        run: RunController<S>,
        leaderboard_limit: u32,
    ) -> Result<Self, CompetitionError> {
        let user = backend
            .current_user()
            .await?
            .ok_or(CompetitionError::SignInRequired)?;

        let competition_id = backend.get_or_create_daily_competition(day).await?;
        let best_saved = backend.fetch_best_score(competition_id, user.id).await?;
        info!(%day, competition = %competition_id, user = %user.id, "daily competition opened");

        let mut competition = Self {
            backend,
            user,
            day,
            competition_id,
            best_saved,
            fetcher: LeaderboardFetcher::new(competition_id, leaderboard_limit),
            leaderboard: Leaderboard::default(),
            run,
            gate: Arc::new(SubmissionGate::new()),
            last_error: None,
        };
        if let Err(err) = competition.refresh_leaderboard().await {
            warn!(error = %err, "initial leaderboard fetch failed");
        }
        Ok(competition)
    }

    pub fn user(&self) -> &AuthUser {
        &self.user
    }

    pub fn day(&self) -> CompetitionDay {
        self.day
    }

    pub fn competition_id(&self) -> CompetitionId {
        self.competition_id
    }

    pub fn best_saved(&self) -> Option<u32> {
        self.best_saved
    }

    pub fn leaderboard(&self) -> &Leaderboard {
        &self.leaderboard
    }

    pub fn run(&self) -> &RunController<S> {
        &self.run
    }

    pub fn gate(&self) -> Arc<SubmissionGate> {
        Arc::clone(&self.gate)
    }

    /// Message to surface to the player for the most recent failure.
    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    pub fn start(&mut self) -> Result<RunId, CompetitionError> {
        let id = self.run.start()?;
        self.last_error = None;
        Ok(id)
    }

    pub fn tick(&mut self, dt: Duration) -> Option<RunSummary> {
        self.run.tick(dt)
    }

    pub fn hit(&mut self) -> bool {
        self.run.hit().is_some()
    }

    pub fn miss(&mut self) -> bool {
        self.run.miss().is_some()
    }

    pub fn click(&mut self, point: Point) -> Option<InputOutcome> {
        self.run.click(point)
    }

    pub fn stop(&mut self) -> Option<RunSummary> {
        self.run.stop()
    }

    /// Submits a finished run. On success the backend's best replaces the
    /// displayed one and the leaderboard is fetched again.
    pub async fn complete_run(
        &mut self,
        summary: RunSummary,
    ) -> Result<SubmissionReceipt, CompetitionError> {
        let receipt = match self
            .gate
            .submit(self.backend.as_ref(), self.competition_id, &summary)
            .await
        {
            Ok(receipt) => receipt,
            Err(err) => {
                self.last_error = Some(err.to_string());
                return Err(err.into());
            }
        };

        self.best_saved = Some(receipt.best_score);
        self.last_error = None;
        if let Err(err) = self.refresh_leaderboard().await {
            warn!(error = %err, "leaderboard refresh after submit failed");
            self.last_error = Some(err.to_string());
        }
        Ok(receipt)
    }

    pub async fn refresh_leaderboard(&mut self) -> Result<&Leaderboard, BackendError> {
        self.leaderboard = self.fetcher.fetch(self.backend.as_ref()).await?;
        Ok(&self.leaderboard)
    }
}

#[cfg(test)]
#[path = "tests/competition_tests.rs"]
mod tests;
