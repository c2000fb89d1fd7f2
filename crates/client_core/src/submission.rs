//! Single-flight forwarding of a finished run's score to the backend.

use minigame::{RunId, RunSummary};
use shared::domain::CompetitionId;
use thiserror::Error;
use tokio::sync::Mutex;
use tracing::{info, warn};

use crate::{backend::CompetitionBackend, error::BackendError};

#[derive(Debug, Error)]
pub enum SubmitError {
    #[error("a score submission is already in flight")]
    InFlight,
    #[error("run {0} was already submitted")]
    AlreadySubmitted(RunId),
    #[error("could not save the score: {0}")]
    Backend(#[from] BackendError),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SubmissionReceipt {
    pub run_id: RunId,
    pub competition_id: CompetitionId,
    pub submitted_score: u32,
    /// The backend's best for this player after the submit; it may exceed
    /// `submitted_score` when an earlier run was better.
    pub best_score: u32,
}

/// At most one submission is outstanding at a time, and each run is offered
/// to the backend at most once, whether or not that attempt succeeded.
#[derive(Default)]
pub struct SubmissionGate {
    in_flight: Mutex<()>,
    last_attempted: Mutex<Option<RunId>>,
}

impl SubmissionGate {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_in_flight(&self) -> bool {
        self.in_flight.try_lock().is_err()
    }

    pub async fn submit<B>(
        &self,
        backend: &B,
        competition_id: CompetitionId,
        summary: &RunSummary,
    ) -> Result<SubmissionReceipt, SubmitError>
    where
        B: CompetitionBackend + ?Sized,
    {
        // Held until the backend call resolves or the future is dropped.
        let _slot = self.in_flight.try_lock().map_err(|_| SubmitError::InFlight)?;

        {
            let mut last = self.last_attempted.lock().await;
            if *last == Some(summary.run_id) {
                return Err(SubmitError::AlreadySubmitted(summary.run_id));
            }
            *last = Some(summary.run_id);
        }

        match backend
            .submit_daily_score(competition_id, summary.score)
            .await
        {
            Ok(best_score) => {
                info!(
                    run = summary.run_id.0,
                    competition = %competition_id,
                    score = summary.score,
                    best = best_score,
                    "score submitted"
                );
                Ok(SubmissionReceipt {
                    run_id: summary.run_id,
                    competition_id,
                    submitted_score: summary.score,
                    best_score,
                })
            }
            Err(err) => {
                warn!(
                    run = summary.run_id.0,
                    competition = %competition_id,
                    error = %err,
                    "score submission failed"
                );
                Err(err.into())
            }
        }
    }
}

#[cfg(test)]
#[path = "tests/submission_tests.rs"]
mod tests;
