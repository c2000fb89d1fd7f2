//! HTTP implementation of the backend traits: auth endpoints under
//! `auth/v1`, table reads/writes and remote procedures under `rest/v1`.

use async_trait::async_trait;
use reqwest::{header::ACCEPT, Client, Method, RequestBuilder, Response, StatusCode};
use serde::{de::DeserializeOwned, Deserialize};
use shared::{
    domain::{CompetitionDay, CompetitionId, UserId},
    protocol::{
        AuthSession, AuthUser, CompetitionRow, GetOrCreateDailyCompetitionParams, MatchScoreRow,
        NewProfile, PasswordCredentials, ProfileEmailPatch, ProfileRow, SignUpResponse,
        SubmitDailyScoreParams, SubmitMatchParams,
    },
};
use tokio::sync::RwLock;
use tracing::{debug, info, warn};
use url::Url;

use crate::{
    backend::{AuthBackend, CompetitionBackend},
    config::BackendConfig,
    error::{BackendError, ErrorBody},
};

const API_KEY_HEADER: &str = "apikey";
const PREFER_HEADER: &str = "Prefer";
const SINGLE_OBJECT: &str = "application/vnd.pgrst.object+json";
const PROFILE_COLUMNS: &str = "id,email,points,created_at";

#[derive(Debug, Deserialize)]
struct ScoreRow {
    score: u32,
}

pub struct RestBackend {
    http: Client,
    config: BackendConfig,
    session: RwLock<Option<AuthSession>>,
}

impl RestBackend {
    pub fn new(config: BackendConfig) -> Result<Self, BackendError> {
        let http = Client::builder()
            .timeout(config.request_timeout())
            .build()?;
        Ok(Self {
            http,
            config,
            session: RwLock::new(None),
        })
    }

    pub fn config(&self) -> &BackendConfig {
        &self.config
    }

    pub async fn restore_session(&self, session: AuthSession) {
        *self.session.write().await = Some(session);
    }

    pub async fn session(&self) -> Option<AuthSession> {
        self.session.read().await.clone()
    }

    async fn access_token(&self) -> Option<String> {
        self.session
            .read()
            .await
            .as_ref()
            .map(|session| session.access_token.clone())
    }

    async fn require_session(&self) -> Result<String, BackendError> {
        self.access_token().await.ok_or(BackendError::NotSignedIn)
    }

    /// Every request carries the project key; the bearer is the user's access
    /// token when signed in and the project key otherwise.
    async fn request(&self, method: Method, url: Url) -> RequestBuilder {
        let bearer = self
            .access_token()
            .await
            .unwrap_or_else(|| self.config.anon_key().to_string());
        self.http
            .request(method, url)
            .header(API_KEY_HEADER, self.config.anon_key())
            .bearer_auth(bearer)
    }

    async fn call_rpc<P, T>(&self, function: &str, params: &P) -> Result<T, BackendError>
    where
        P: serde::Serialize + Sync,
        T: DeserializeOwned + Send,
    {
        debug!(function, "backend rpc");
        let builder = self
            .request(Method::POST, self.config.rpc_url(function)?)
            .await
            .json(params);
        read_json(builder.send().await?).await
    }
}

async fn checked(response: Response) -> Result<Response, BackendError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let fallback = status
        .canonical_reason()
        .unwrap_or("request failed")
        .to_string();
    let body = response.text().await.unwrap_or_default();
    let message = match serde_json::from_str::<ErrorBody>(&body) {
        Ok(parsed) => parsed.into_message(&fallback),
        Err(_) if body.trim().is_empty() => fallback,
        Err(_) => body.trim().to_string(),
    };
    warn!(status = status.as_u16(), %message, "backend rejected request");
    Err(BackendError::rejected(status.as_u16(), message))
}

async fn read_json<T: DeserializeOwned>(response: Response) -> Result<T, BackendError> {
    let body = checked(response).await?.text().await?;
    serde_json::from_str(&body).map_err(|err| {
        BackendError::UnexpectedResponse(format!("{err}; body was {}", truncate(&body, 200)))
    })
}

async fn read_empty(response: Response) -> Result<(), BackendError> {
    checked(response).await?;
    Ok(())
}

fn truncate(text: &str, max_chars: usize) -> &str {
    match text.char_indices().nth(max_chars) {
        Some((idx, _)) => &text[..idx],
        None => text,
    }
}

#[async_trait]
impl AuthBackend for RestBackend {
    async fn sign_up(&self, credentials: &PasswordCredentials) -> Result<AuthUser, BackendError> {
        let response = self
            .request(Method::POST, self.config.auth_url("signup")?)
            .await
            .json(credentials)
            .send()
            .await?;
        let signed_up: SignUpResponse = read_json(response).await?;
        let user = signed_up.user().clone();
        if let SignUpResponse::Session(session) = signed_up {
            *self.session.write().await = Some(session);
        }
        info!(user = %user.id, "account created");
        Ok(user)
    }

    async fn sign_in(
        &self,
        credentials: &PasswordCredentials,
    ) -> Result<AuthSession, BackendError> {
        let mut url = self.config.auth_url("token")?;
        url.query_pairs_mut().append_pair("grant_type", "password");
        let response = self
            .request(Method::POST, url)
            .await
            .json(credentials)
            .send()
            .await?;
        let session: AuthSession = read_json(response).await?;
        *self.session.write().await = Some(session.clone());
        info!(user = %session.user.id, "signed in");
        Ok(session)
    }

    async fn sign_out(&self) -> Result<(), BackendError> {
        if self.access_token().await.is_none() {
            return Ok(());
        }
        let builder = self
            .request(Method::POST, self.config.auth_url("logout")?)
            .await;
        // The local session is dropped even when the server call fails.
        self.session.write().await.take();
        read_empty(builder.send().await?).await
    }
}

#[async_trait]
impl CompetitionBackend for RestBackend {
    async fn current_user(&self) -> Result<Option<AuthUser>, BackendError> {
        if self.access_token().await.is_none() {
            return Ok(None);
        }
        let response = self
            .request(Method::GET, self.config.auth_url("user")?)
            .await
            .send()
            .await?;
        if matches!(
            response.status(),
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN
        ) {
            warn!("stored session was rejected; treating as signed out");
            self.session.write().await.take();
            return Ok(None);
        }
        read_json(response).await.map(Some)
    }

    async fn get_or_create_daily_competition(
        &self,
        day: CompetitionDay,
    ) -> Result<CompetitionId, BackendError> {
        let builder = self
            .request(
                Method::POST,
                self.config.rpc_url("get_or_create_daily_competition")?,
            )
            .await
            .header(ACCEPT, SINGLE_OBJECT)
            .json(&GetOrCreateDailyCompetitionParams {
                day: day.to_string(),
            });
        let row: CompetitionRow = read_json(builder.send().await?).await?;
        debug!(%day, competition = %row.id, "daily competition resolved");
        Ok(row.id)
    }

    async fn fetch_best_score(
        &self,
        competition_id: CompetitionId,
        user_id: UserId,
    ) -> Result<Option<u32>, BackendError> {
        let builder = self
            .request(Method::GET, self.config.table_url("matches")?)
            .await
            .query(&[
                ("select", "score".to_string()),
                ("competition_id", format!("eq.{competition_id}")),
                ("user_id", format!("eq.{user_id}")),
                ("order", "score.desc".to_string()),
                ("limit", "1".to_string()),
            ]);
        let rows: Vec<ScoreRow> = read_json(builder.send().await?).await?;
        Ok(rows.first().map(|row| row.score))
    }

    async fn submit_daily_score(
        &self,
        competition_id: CompetitionId,
        score: u32,
    ) -> Result<u32, BackendError> {
        self.require_session().await?;
        let best: Option<u32> = self
            .call_rpc(
                "submit_daily_score",
                &SubmitDailyScoreParams {
                    competition_id,
                    score,
                },
            )
            .await?;
        Ok(best.unwrap_or(score))
    }

    async fn submit_match(&self, params: SubmitMatchParams) -> Result<(), BackendError> {
        self.require_session().await?;
        debug!(function = "submit_match", "backend rpc");
        let builder = self
            .request(Method::POST, self.config.rpc_url("submit_match")?)
            .await
            .json(&params);
        read_empty(builder.send().await?).await
    }

    async fn fetch_leaderboard(
        &self,
        competition_id: CompetitionId,
        limit: u32,
    ) -> Result<Vec<MatchScoreRow>, BackendError> {
        let builder = self
            .request(Method::GET, self.config.table_url("matches")?)
            .await
            .query(&[
                ("select", "score,profiles(email)".to_string()),
                ("competition_id", format!("eq.{competition_id}")),
                ("order", "score.desc".to_string()),
                ("limit", limit.to_string()),
            ]);
        read_json(builder.send().await?).await
    }

    async fn fetch_profile(&self, user_id: UserId) -> Result<Option<ProfileRow>, BackendError> {
        let builder = self
            .request(Method::GET, self.config.table_url("profiles")?)
            .await
            .query(&[
                ("select", PROFILE_COLUMNS.to_string()),
                ("id", format!("eq.{user_id}")),
            ]);
        let rows: Vec<ProfileRow> = read_json(builder.send().await?).await?;
        Ok(rows.into_iter().next())
    }

    async fn create_profile(&self, profile: NewProfile) -> Result<ProfileRow, BackendError> {
        self.require_session().await?;
        let builder = self
            .request(Method::POST, self.config.table_url("profiles")?)
            .await
            .query(&[("select", PROFILE_COLUMNS)])
            .header(PREFER_HEADER, "return=representation")
            .header(ACCEPT, SINGLE_OBJECT)
            .json(&profile);
        read_json(builder.send().await?).await
    }

    async fn update_profile_email(
        &self,
        user_id: UserId,
        email: &str,
    ) -> Result<(), BackendError> {
        self.require_session().await?;
        let builder = self
            .request(Method::PATCH, self.config.table_url("profiles")?)
            .await
            .query(&[("id", format!("eq.{user_id}"))])
            .header(PREFER_HEADER, "return=minimal")
            .json(&ProfileEmailPatch {
                email: email.to_string(),
            });
        read_empty(builder.send().await?).await
    }
}

#[cfg(test)]
#[path = "tests/rest_tests.rs"]
mod tests;
