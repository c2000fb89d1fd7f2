//! Client side of the mini-game competitions: the backend client, the
//! single-flight score submission, leaderboard reads and the daily
//! competition controller that ties them to a [`minigame::RunController`].

pub mod auth;
pub mod backend;
pub mod competition;
pub mod config;
pub mod error;
pub mod leaderboard;
pub mod profile;
pub mod rest;
pub mod submission;

pub use auth::{validate_credentials, AuthMode};
pub use backend::{AuthBackend, CompetitionBackend};
pub use competition::{CompetitionError, DailyCompetition};
pub use config::BackendConfig;
pub use error::BackendError;
pub use leaderboard::{Leaderboard, LeaderboardFetcher, DEFAULT_LEADERBOARD_LIMIT};
pub use profile::{load_or_create_profile, Badge, ProfileProgress};
pub use rest::RestBackend;
pub use submission::{SubmissionGate, SubmissionReceipt, SubmitError};

#[cfg(test)]
#[path = "tests/support.rs"]
pub(crate) mod test_support;
