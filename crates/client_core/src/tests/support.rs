//! In-memory backend used by the controller and gate tests.

use std::sync::Arc;

use async_trait::async_trait;
use shared::{
    domain::{CompetitionDay, CompetitionId, UserId},
    protocol::{
        AuthUser, MatchScoreRow, NewProfile, ProfileEmail, ProfileRow, SubmitMatchParams,
    },
};
use tokio::sync::{Mutex, Notify};
use uuid::Uuid;

use crate::{backend::CompetitionBackend, error::BackendError};

pub(crate) fn test_user() -> AuthUser {
    AuthUser {
        id: UserId(Uuid::from_u128(0x7f1a_3c2e_52a4_4b8e_9d0e_7f3a_7c1d_2b9e)),
        email: Some("ana@example.com".to_string()),
    }
}

/// Parks `submit_daily_score` until the test releases it.
#[derive(Default)]
pub(crate) struct SubmitPause {
    pub entered: Notify,
    pub release: Notify,
}

#[derive(Default)]
pub(crate) struct FakeState {
    pub best: Option<u32>,
    pub submitted: Vec<(CompetitionId, u32)>,
    pub rivals: Vec<MatchScoreRow>,
    pub leaderboard_calls: u32,
    pub leaderboard_limits: Vec<u32>,
    pub days: Vec<CompetitionDay>,
    pub matches: Vec<SubmitMatchParams>,
    pub profile: Option<ProfileRow>,
    pub created_profiles: Vec<NewProfile>,
    pub email_updates: Vec<String>,
    pub fail_submit: Option<String>,
    pub fail_leaderboard: Option<String>,
}

pub(crate) struct FakeBackend {
    pub user: Option<AuthUser>,
    pub competition_id: CompetitionId,
    pub pause: Option<Arc<SubmitPause>>,
    pub state: Mutex<FakeState>,
}

impl FakeBackend {
    pub fn signed_in() -> Self {
        Self {
            user: Some(test_user()),
            competition_id: CompetitionId(42),
            pause: None,
            state: Mutex::new(FakeState::default()),
        }
    }

    pub fn signed_out() -> Self {
        Self {
            user: None,
            ..Self::signed_in()
        }
    }

    pub fn with_pause(mut self, pause: Arc<SubmitPause>) -> Self {
        self.pause = Some(pause);
        self
    }

    pub async fn update(self, apply: impl FnOnce(&mut FakeState)) -> Self {
        apply(&mut *self.state.lock().await);
        self
    }
}

#[async_trait]
impl CompetitionBackend for FakeBackend {
    async fn current_user(&self) -> Result<Option<AuthUser>, BackendError> {
        Ok(self.user.clone())
    }

    async fn get_or_create_daily_competition(
        &self,
        day: CompetitionDay,
    ) -> Result<CompetitionId, BackendError> {
        self.state.lock().await.days.push(day);
        Ok(self.competition_id)
    }

    async fn fetch_best_score(
        &self,
        _competition_id: CompetitionId,
        _user_id: UserId,
    ) -> Result<Option<u32>, BackendError> {
        Ok(self.state.lock().await.best)
    }

    async fn submit_daily_score(
        &self,
        competition_id: CompetitionId,
        score: u32,
    ) -> Result<u32, BackendError> {
        if let Some(pause) = &self.pause {
            pause.entered.notify_one();
            pause.release.notified().await;
        }

        let mut state = self.state.lock().await;
        state.submitted.push((competition_id, score));
        if let Some(message) = &state.fail_submit {
            return Err(BackendError::rejected(500, message.clone()));
        }
        let best = state.best.map_or(score, |best| best.max(score));
        state.best = Some(best);
        Ok(best)
    }

    async fn submit_match(&self, params: SubmitMatchParams) -> Result<(), BackendError> {
        self.state.lock().await.matches.push(params);
        Ok(())
    }

    async fn fetch_leaderboard(
        &self,
        _competition_id: CompetitionId,
        limit: u32,
    ) -> Result<Vec<MatchScoreRow>, BackendError> {
        let mut state = self.state.lock().await;
        state.leaderboard_calls += 1;
        state.leaderboard_limits.push(limit);
        if let Some(message) = &state.fail_leaderboard {
            return Err(BackendError::rejected(503, message.clone()));
        }

        let mut rows = state.rivals.clone();
        if let Some(best) = state.best {
            rows.push(MatchScoreRow {
                score: best,
                profiles: Some(ProfileEmail {
                    email: self.user.as_ref().and_then(|user| user.email.clone()),
                }),
            });
        }
        rows.sort_by(|a, b| b.score.cmp(&a.score));
        rows.truncate(limit as usize);
        Ok(rows)
    }

    async fn fetch_profile(&self, _user_id: UserId) -> Result<Option<ProfileRow>, BackendError> {
        Ok(self.state.lock().await.profile.clone())
    }

    async fn create_profile(&self, profile: NewProfile) -> Result<ProfileRow, BackendError> {
        let mut state = self.state.lock().await;
        let row = ProfileRow {
            id: profile.id,
            email: profile.email.clone(),
            points: Some(profile.points),
            created_at: None,
        };
        state.created_profiles.push(profile);
        state.profile = Some(row.clone());
        Ok(row)
    }

    async fn update_profile_email(
        &self,
        _user_id: UserId,
        email: &str,
    ) -> Result<(), BackendError> {
        self.state.lock().await.email_updates.push(email.to_string());
        Ok(())
    }
}
