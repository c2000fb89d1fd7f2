use async_trait::async_trait;
use shared::{
    domain::{CompetitionDay, CompetitionId, UserId},
    protocol::{
        AuthSession, AuthUser, MatchScoreRow, NewProfile, PasswordCredentials, ProfileRow,
        SubmitMatchParams,
    },
};

use crate::error::BackendError;

#[async_trait]
pub trait AuthBackend: Send + Sync {
    async fn sign_up(&self, credentials: &PasswordCredentials) -> Result<AuthUser, BackendError>;
    async fn sign_in(&self, credentials: &PasswordCredentials)
        -> Result<AuthSession, BackendError>;
    async fn sign_out(&self) -> Result<(), BackendError>;
}

/// Reads and remote procedures the game pages depend on.
#[async_trait]
pub trait CompetitionBackend: Send + Sync {
    /// `None` when there is no session or the backend no longer accepts it.
    async fn current_user(&self) -> Result<Option<AuthUser>, BackendError>;
    async fn get_or_create_daily_competition(
        &self,
        day: CompetitionDay,
    ) -> Result<CompetitionId, BackendError>;
    async fn fetch_best_score(
        &self,
        competition_id: CompetitionId,
        user_id: UserId,
    ) -> Result<Option<u32>, BackendError>;
    /// Returns the caller's best score for the competition after the submit.
    async fn submit_daily_score(
        &self,
        competition_id: CompetitionId,
        score: u32,
    ) -> Result<u32, BackendError>;
    async fn submit_match(&self, params: SubmitMatchParams) -> Result<(), BackendError>;
    async fn fetch_leaderboard(
        &self,
        competition_id: CompetitionId,
        limit: u32,
    ) -> Result<Vec<MatchScoreRow>, BackendError>;
    async fn fetch_profile(&self, user_id: UserId) -> Result<Option<ProfileRow>, BackendError>;
    async fn create_profile(&self, profile: NewProfile) -> Result<ProfileRow, BackendError>;
    async fn update_profile_email(&self, user_id: UserId, email: &str)
        -> Result<(), BackendError>;
}
