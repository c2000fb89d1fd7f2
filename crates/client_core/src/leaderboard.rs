use shared::{
    domain::CompetitionId,
    protocol::{LeaderboardEntry, MatchScoreRow},
};
use tracing::debug;

use crate::{backend::CompetitionBackend, error::BackendError};

pub const DEFAULT_LEADERBOARD_LIMIT: u32 = 10;
pub const MAX_LEADERBOARD_LIMIT: u32 = 100;
const ANONYMOUS_IDENTITY: &str = "user";

/// Top scores in the order the backend returned them.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Leaderboard {
    pub entries: Vec<LeaderboardEntry>,
}

impl Leaderboard {
    pub fn from_rows(rows: Vec<MatchScoreRow>) -> Self {
        let entries = rows
            .into_iter()
            .zip(1u32..)
            .map(|(row, rank)| LeaderboardEntry {
                rank,
                identity: row
                    .profiles
                    .and_then(|profile| profile.email)
                    .filter(|email| !email.is_empty())
                    .unwrap_or_else(|| ANONYMOUS_IDENTITY.to_string()),
                best_score: row.score,
            })
            .collect();
        Self { entries }
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[derive(Debug, Clone, Copy)]
pub struct LeaderboardFetcher {
    competition_id: CompetitionId,
    limit: u32,
}

impl LeaderboardFetcher {
    pub fn new(competition_id: CompetitionId, limit: u32) -> Self {
        Self {
            competition_id,
            limit: limit.clamp(1, MAX_LEADERBOARD_LIMIT),
        }
    }

    pub fn competition_id(&self) -> CompetitionId {
        self.competition_id
    }

    pub fn limit(&self) -> u32 {
        self.limit
    }

    pub async fn fetch<B>(&self, backend: &B) -> Result<Leaderboard, BackendError>
    where
        B: CompetitionBackend + ?Sized,
    {
        let rows = backend
            .fetch_leaderboard(self.competition_id, self.limit)
            .await?;
        debug!(
            competition = %self.competition_id,
            rows = rows.len(),
            "leaderboard fetched"
        );
        Ok(Leaderboard::from_rows(rows))
    }
}
