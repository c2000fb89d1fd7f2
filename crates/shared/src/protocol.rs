//! Request and response bodies exchanged with the hosted backend.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::{CompetitionId, GameKind, UserId};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PasswordCredentials {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthUser {
    pub id: UserId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthSession {
    pub access_token: String,
    #[serde(default)]
    pub token_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub refresh_token: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expires_in: Option<i64>,
    pub user: AuthUser,
}

/// Sign-up answers with a full session when the project does not require
/// email confirmation, and with the bare user otherwise.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum SignUpResponse {
    Session(AuthSession),
    User(AuthUser),
}

impl SignUpResponse {
    pub fn user(&self) -> &AuthUser {
        match self {
            SignUpResponse::Session(session) => &session.user,
            SignUpResponse::User(user) => user,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GetOrCreateDailyCompetitionParams {
    #[serde(rename = "_day")]
    pub day: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompetitionRow {
    pub id: CompetitionId,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SubmitDailyScoreParams {
    #[serde(rename = "_competition_id")]
    pub competition_id: CompetitionId,
    #[serde(rename = "_score")]
    pub score: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SubmitMatchParams {
    #[serde(rename = "p_competition_id")]
    pub competition_id: CompetitionId,
    #[serde(rename = "p_score")]
    pub score: u32,
    #[serde(rename = "p_points_earned")]
    pub points_earned: u32,
    #[serde(rename = "p_game")]
    pub game: GameKind,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProfileEmail {
    #[serde(default)]
    pub email: Option<String>,
}

/// One row of `matches` joined with the owner's profile email.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MatchScoreRow {
    pub score: u32,
    #[serde(default)]
    pub profiles: Option<ProfileEmail>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LeaderboardEntry {
    pub rank: u32,
    pub identity: String,
    pub best_score: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProfileRow {
    pub id: UserId,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub points: Option<i64>,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewProfile {
    pub id: UserId,
    pub email: Option<String>,
    pub points: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProfileEmailPatch {
    pub email: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rpc_params_use_backend_argument_names() {
        let body = serde_json::to_value(SubmitDailyScoreParams {
            competition_id: CompetitionId(4),
            score: 120,
        })
        .expect("json");
        assert_eq!(body, serde_json::json!({ "_competition_id": 4, "_score": 120 }));

        let body = serde_json::to_value(SubmitMatchParams {
            competition_id: CompetitionId(1),
            score: 40,
            points_earned: 20,
            game: GameKind::MinigameDaily,
        })
        .expect("json");
        assert_eq!(
            body,
            serde_json::json!({
                "p_competition_id": 1,
                "p_score": 40,
                "p_points_earned": 20,
                "p_game": "minigame_daily"
            })
        );
    }

    #[test]
    fn sign_up_response_accepts_bare_user() {
        let raw = r#"{"id":"7f1a3c2e-52a4-4b8e-9d0e-7f3a7c1d2b9e","email":"ana@example.com"}"#;
        let parsed: SignUpResponse = serde_json::from_str(raw).expect("parse");
        assert!(matches!(parsed, SignUpResponse::User(_)));
        assert_eq!(parsed.user().email.as_deref(), Some("ana@example.com"));
    }

    #[test]
    fn match_row_tolerates_missing_profile() {
        let rows: Vec<MatchScoreRow> =
            serde_json::from_str(r#"[{"score":90,"profiles":null},{"score":80}]"#).expect("parse");
        assert_eq!(rows.len(), 2);
        assert!(rows.iter().all(|row| row.profiles.is_none()));
    }
}
