use std::{collections::HashMap, sync::Arc};

use anyhow::Result;
use axum::{
    extract::State,
    http::{HeaderMap, Method, StatusCode, Uri},
    Router,
};
use chrono::NaiveDate;
use serde_json::{json, Value};
use shared::{domain::GameKind, error::ErrorCode};
use tokio::{net::TcpListener, sync::Mutex};
use uuid::Uuid;

use super::*;

const ANON_KEY: &str = "anon-key";

#[derive(Debug, Clone)]
struct Recorded {
    method: Method,
    path: String,
    query: Vec<(String, String)>,
    headers: HeaderMap,
    body: String,
}

impl Recorded {
    fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).and_then(|value| value.to_str().ok())
    }

    fn query_value(&self, key: &str) -> Option<&str> {
        self.query
            .iter()
            .find(|(name, _)| name == key)
            .map(|(_, value)| value.as_str())
    }

    fn json(&self) -> Value {
        serde_json::from_str(&self.body).expect("json body")
    }
}

#[derive(Clone, Default)]
struct MockState {
    replies: Arc<HashMap<String, (StatusCode, String)>>,
    seen: Arc<Mutex<Vec<Recorded>>>,
}

impl MockState {
    async fn requests(&self) -> Vec<Recorded> {
        self.seen.lock().await.clone()
    }
}

async fn record(
    State(state): State<MockState>,
    method: Method,
    uri: Uri,
    headers: HeaderMap,
    body: String,
) -> (StatusCode, String) {
    let query = uri
        .query()
        .map(|raw| {
            url::form_urlencoded::parse(raw.as_bytes())
                .into_owned()
                .collect()
        })
        .unwrap_or_default();
    state.seen.lock().await.push(Recorded {
        method,
        path: uri.path().to_string(),
        query,
        headers,
        body,
    });
    state
        .replies
        .get(uri.path())
        .cloned()
        .unwrap_or((StatusCode::NOT_FOUND, r#"{"message":"no route"}"#.to_string()))
}

async fn spawn_backend(replies: &[(&str, StatusCode, Value)]) -> Result<(RestBackend, MockState)> {
    std::env::set_var("NO_PROXY", "127.0.0.1,localhost");
    let listener = TcpListener::bind("127.0.0.1:0").await?;
    let addr = listener.local_addr()?;
    let state = MockState {
        replies: Arc::new(
            replies
                .iter()
                .map(|(path, status, body)| (path.to_string(), (*status, body.to_string())))
                .collect(),
        ),
        seen: Arc::default(),
    };
    let app = Router::new().fallback(record).with_state(state.clone());
    tokio::spawn(async move {
        let _ = axum::serve(listener, app).await;
    });

    let config = BackendConfig::new(&format!("http://{addr}"), ANON_KEY)?;
    Ok((RestBackend::new(config)?, state))
}

fn user_json() -> Value {
    json!({ "id": Uuid::from_u128(1), "email": "ana@example.com" })
}

fn session(token: &str) -> AuthSession {
    serde_json::from_value(json!({
        "access_token": token,
        "token_type": "bearer",
        "user": user_json(),
    }))
    .expect("session")
}

fn credentials() -> PasswordCredentials {
    PasswordCredentials {
        email: "ana@example.com".into(),
        password: "hunter22".into(),
    }
}

#[tokio::test]
async fn sign_in_stores_session_for_later_requests() {
    let (backend, mock) = spawn_backend(&[
        (
            "/auth/v1/token",
            StatusCode::OK,
            json!({ "access_token": "tok-1", "token_type": "bearer", "user": user_json() }),
        ),
        ("/rest/v1/rpc/submit_daily_score", StatusCode::OK, json!(90)),
    ])
    .await
    .expect("spawn backend");

    let signed_in = backend.sign_in(&credentials()).await.expect("sign in");
    assert_eq!(signed_in.access_token, "tok-1");
    assert_eq!(backend.session().await.expect("stored").access_token, "tok-1");

    let best = backend
        .submit_daily_score(CompetitionId(42), 70)
        .await
        .expect("submit");
    assert_eq!(best, 90);

    let requests = mock.requests().await;
    let login = &requests[0];
    assert_eq!(login.method, Method::POST);
    assert_eq!(login.query_value("grant_type"), Some("password"));
    assert_eq!(login.header("apikey"), Some(ANON_KEY));
    assert_eq!(login.header("authorization"), Some("Bearer anon-key"));
    assert_eq!(
        login.json(),
        json!({ "email": "ana@example.com", "password": "hunter22" })
    );

    let submit = &requests[1];
    assert_eq!(submit.path, "/rest/v1/rpc/submit_daily_score");
    assert_eq!(submit.header("apikey"), Some(ANON_KEY));
    assert_eq!(submit.header("authorization"), Some("Bearer tok-1"));
    assert_eq!(submit.json(), json!({ "_competition_id": 42, "_score": 70 }));
}

#[tokio::test]
async fn null_best_falls_back_to_submitted_score() {
    let (backend, _mock) = spawn_backend(&[(
        "/rest/v1/rpc/submit_daily_score",
        StatusCode::OK,
        Value::Null,
    )])
    .await
    .expect("spawn backend");
    backend.restore_session(session("tok-1")).await;

    let best = backend
        .submit_daily_score(CompetitionId(42), 70)
        .await
        .expect("submit");
    assert_eq!(best, 70);
}

#[tokio::test]
async fn writes_without_session_never_reach_the_server() {
    let (backend, mock) = spawn_backend(&[]).await.expect("spawn backend");

    let err = backend
        .submit_daily_score(CompetitionId(42), 70)
        .await
        .expect_err("signed out");
    assert!(matches!(err, BackendError::NotSignedIn));
    assert!(err.requires_reauth());
    assert!(backend.current_user().await.expect("user").is_none());
    assert!(mock.requests().await.is_empty());
}

#[tokio::test]
async fn rejected_token_clears_the_session() {
    let (backend, mock) = spawn_backend(&[(
        "/auth/v1/user",
        StatusCode::UNAUTHORIZED,
        json!({ "msg": "JWT expired" }),
    )])
    .await
    .expect("spawn backend");
    backend.restore_session(session("stale")).await;

    assert!(backend.current_user().await.expect("user").is_none());
    assert!(backend.session().await.is_none());
    assert_eq!(
        mock.requests().await[0].header("authorization"),
        Some("Bearer stale")
    );
}

#[tokio::test]
async fn current_user_reads_auth_identity() {
    let (backend, _mock) = spawn_backend(&[("/auth/v1/user", StatusCode::OK, user_json())])
        .await
        .expect("spawn backend");
    backend.restore_session(session("tok-1")).await;

    let user = backend.current_user().await.expect("user").expect("signed in");
    assert_eq!(user.id.0, Uuid::from_u128(1));
    assert_eq!(user.email.as_deref(), Some("ana@example.com"));
}

#[tokio::test]
async fn daily_competition_is_requested_as_single_object() {
    let (backend, mock) = spawn_backend(&[(
        "/rest/v1/rpc/get_or_create_daily_competition",
        StatusCode::OK,
        json!({ "id": 7 }),
    )])
    .await
    .expect("spawn backend");

    let day = CompetitionDay(NaiveDate::from_ymd_opt(2026, 10, 18).expect("date"));
    let id = backend
        .get_or_create_daily_competition(day)
        .await
        .expect("competition");
    assert_eq!(id, CompetitionId(7));

    let requests = mock.requests().await;
    let request = &requests[0];
    assert_eq!(request.header("accept"), Some(SINGLE_OBJECT));
    assert_eq!(request.json(), json!({ "_day": "2026-10-18" }));
}

#[tokio::test]
async fn leaderboard_query_orders_and_limits_rows() {
    let (backend, mock) = spawn_backend(&[(
        "/rest/v1/matches",
        StatusCode::OK,
        json!([
            { "score": 90, "profiles": { "email": "bo@example.com" } },
            { "score": 40, "profiles": null },
        ]),
    )])
    .await
    .expect("spawn backend");

    let rows = backend
        .fetch_leaderboard(CompetitionId(42), 10)
        .await
        .expect("leaderboard");
    assert_eq!(rows.len(), 2);
    assert_eq!(rows[0].score, 90);
    assert!(rows[1].profiles.is_none());

    let requests = mock.requests().await;
    let request = &requests[0];
    assert_eq!(request.method, Method::GET);
    assert_eq!(request.query_value("select"), Some("score,profiles(email)"));
    assert_eq!(request.query_value("competition_id"), Some("eq.42"));
    assert_eq!(request.query_value("order"), Some("score.desc"));
    assert_eq!(request.query_value("limit"), Some("10"));
}

#[tokio::test]
async fn best_score_is_none_without_a_row() {
    let (backend, mock) = spawn_backend(&[("/rest/v1/matches", StatusCode::OK, json!([]))])
        .await
        .expect("spawn backend");
    let user = UserId(Uuid::from_u128(1));

    let best = backend
        .fetch_best_score(CompetitionId(42), user)
        .await
        .expect("best");
    assert_eq!(best, None);
    let requests = mock.requests().await;
    let request = &requests[0];
    assert_eq!(
        request.query_value("user_id"),
        Some(format!("eq.{user}").as_str())
    );
}

#[tokio::test]
async fn best_score_asks_for_the_highest_row() {
    let (backend, mock) = spawn_backend(&[(
        "/rest/v1/matches",
        StatusCode::OK,
        json!([{ "score": 90 }]),
    )])
    .await
    .expect("spawn backend");

    let best = backend
        .fetch_best_score(CompetitionId(42), UserId(Uuid::from_u128(1)))
        .await
        .expect("best");
    assert_eq!(best, Some(90));

    let requests = mock.requests().await;
    let request = &requests[0];
    assert_eq!(request.query_value("select"), Some("score"));
    assert_eq!(request.query_value("competition_id"), Some("eq.42"));
    assert_eq!(request.query_value("order"), Some("score.desc"));
    assert_eq!(request.query_value("limit"), Some("1"));
}

#[tokio::test]
async fn match_submission_carries_game_and_points() {
    let (backend, mock) = spawn_backend(&[(
        "/rest/v1/rpc/submit_match",
        StatusCode::NO_CONTENT,
        Value::Null,
    )])
    .await
    .expect("spawn backend");
    backend.restore_session(session("tok-1")).await;

    backend
        .submit_match(SubmitMatchParams {
            competition_id: CompetitionId(3),
            score: 120,
            points_earned: 60,
            game: GameKind::MinigameDaily,
        })
        .await
        .expect("submit match");

    assert_eq!(
        mock.requests().await[0].json(),
        json!({
            "p_competition_id": 3,
            "p_score": 120,
            "p_points_earned": 60,
            "p_game": "minigame_daily",
        })
    );
}

#[tokio::test]
async fn rejection_keeps_status_and_server_message() {
    let (backend, _mock) = spawn_backend(&[(
        "/rest/v1/rpc/submit_daily_score",
        StatusCode::NOT_FOUND,
        json!({ "message": "function submit_daily_score does not exist", "hint": null }),
    )])
    .await
    .expect("spawn backend");
    backend.restore_session(session("tok-1")).await;

    let err = backend
        .submit_daily_score(CompetitionId(42), 70)
        .await
        .expect_err("missing rpc");
    assert!(matches!(err, BackendError::Rejected { status: 404, .. }));
    assert_eq!(err.code(), ErrorCode::NotFound);
    assert!(err
        .to_string()
        .contains("function submit_daily_score does not exist"));
}

#[tokio::test]
async fn malformed_body_is_reported() {
    let (backend, _mock) = spawn_backend(&[(
        "/rest/v1/rpc/get_or_create_daily_competition",
        StatusCode::OK,
        json!({ "competition": "today" }),
    )])
    .await
    .expect("spawn backend");

    let day = CompetitionDay(NaiveDate::from_ymd_opt(2026, 10, 18).expect("date"));
    let err = backend
        .get_or_create_daily_competition(day)
        .await
        .expect_err("bad body");
    assert!(matches!(err, BackendError::UnexpectedResponse(_)));
}

#[tokio::test]
async fn sign_out_drops_local_session_even_if_server_fails() {
    let (backend, mock) = spawn_backend(&[(
        "/auth/v1/logout",
        StatusCode::INTERNAL_SERVER_ERROR,
        Value::Null,
    )])
    .await
    .expect("spawn backend");
    backend.restore_session(session("tok-1")).await;

    backend.sign_out().await.expect_err("server failure");
    assert!(backend.session().await.is_none());
    assert_eq!(
        mock.requests().await[0].header("authorization"),
        Some("Bearer tok-1")
    );

    backend.sign_out().await.expect("no-op when signed out");
    assert_eq!(mock.requests().await.len(), 1);
}

#[tokio::test]
async fn sign_up_without_confirmation_keeps_session() {
    let (backend, _mock) = spawn_backend(&[(
        "/auth/v1/signup",
        StatusCode::OK,
        json!({ "access_token": "tok-new", "user": user_json() }),
    )])
    .await
    .expect("spawn backend");

    let user = backend.sign_up(&credentials()).await.expect("sign up");
    assert_eq!(user.email.as_deref(), Some("ana@example.com"));
    assert_eq!(backend.session().await.expect("session").access_token, "tok-new");
}

#[tokio::test]
async fn sign_up_with_confirmation_returns_bare_user() {
    let (backend, _mock) = spawn_backend(&[("/auth/v1/signup", StatusCode::OK, user_json())])
        .await
        .expect("spawn backend");

    let user = backend.sign_up(&credentials()).await.expect("sign up");
    assert_eq!(user.id.0, Uuid::from_u128(1));
    assert!(backend.session().await.is_none());
}
