use std::{path::PathBuf, sync::Arc};

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use client_core::{
    load_or_create_profile, validate_credentials, AuthBackend, AuthMode, CompetitionBackend,
    CompetitionError, DailyCompetition, LeaderboardFetcher, ProfileProgress, RestBackend,
};
use minigame::{points_earned, RunController};
use shared::{
    domain::{CompetitionDay, CompetitionId, CompetitionPeriod, GameKind},
    protocol::{AuthUser, SubmitMatchParams},
};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

mod config;
mod play;
mod session_store;

use config::{load_settings, Settings};
use session_store::SessionStore;

#[derive(Parser, Debug)]
#[command(name = "minigames", about = "Daily mini-game competitions in the terminal")]
struct Cli {
    /// Settings file; defaults to ./minigames.toml when present.
    #[arg(long, global = true)]
    config: Option<PathBuf>,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Create an account.
    Register {
        #[arg(long)]
        email: String,
        #[arg(long)]
        password: String,
    },
    Login {
        #[arg(long)]
        email: String,
        #[arg(long)]
        password: String,
    },
    Logout,
    Whoami,
    /// Points, level and badges.
    Profile,
    /// List competition periods.
    Competitions,
    /// Top scores for a day's competition.
    Leaderboard {
        /// YYYY-MM-DD; today when omitted.
        #[arg(long)]
        day: Option<CompetitionDay>,
        #[arg(long)]
        limit: Option<u32>,
    },
    /// Play today's run and submit the score.
    Play,
    /// Record a finished match against a competition.
    RecordMatch {
        #[arg(long)]
        competition_id: i64,
        #[arg(long)]
        score: u32,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let settings = load_settings(cli.config.as_deref())?;
    init_tracing(&settings.log_filter);

    if let Command::Competitions = cli.command {
        list_competitions();
        return Ok(());
    }

    let store = SessionStore::from_settings(settings.session_path.clone())?;
    let backend = Arc::new(RestBackend::new(settings.backend_config()?)?);
    if let Some(session) = store.load()? {
        backend.restore_session(session).await;
    }

    match cli.command {
        Command::Register { email, password } => {
            register(&backend, &store, &email, &password).await
        }
        Command::Login { email, password } => login(&backend, &store, &email, &password).await,
        Command::Logout => logout(&backend, &store).await,
        Command::Whoami => {
            let user = require_user(&backend, &store).await?;
            println!(
                "{} ({})",
                user.email.as_deref().unwrap_or("no email"),
                user.id
            );
            Ok(())
        }
        Command::Profile => show_profile(&backend, &store).await,
        Command::Competitions => Ok(()),
        Command::Leaderboard { day, limit } => {
            show_leaderboard(&backend, &settings, day.unwrap_or_else(CompetitionDay::today), limit)
                .await
        }
        Command::Play => play_today(backend, &settings).await,
        Command::RecordMatch {
            competition_id,
            score,
        } => record_match(&backend, CompetitionId(competition_id), score).await,
    }
}

fn init_tracing(default_filter: &str) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

async fn register(
    backend: &RestBackend,
    store: &SessionStore,
    email: &str,
    password: &str,
) -> Result<()> {
    let credentials = validate_credentials(email, password, AuthMode::Register)?;
    let user = backend.sign_up(&credentials).await?;

    let Some(session) = backend.session().await else {
        println!(
            "Account created for {}. Confirm your email, then run `minigames login`.",
            credentials.email
        );
        return Ok(());
    };
    store.save(&session)?;
    ensure_profile(backend, &user).await;
    println!("Account created; signed in as {}", credentials.email);
    Ok(())
}

async fn login(
    backend: &RestBackend,
    store: &SessionStore,
    email: &str,
    password: &str,
) -> Result<()> {
    let credentials = validate_credentials(email, password, AuthMode::SignIn)?;
    let session = backend
        .sign_in(&credentials)
        .await
        .context("sign in failed")?;
    store.save(&session)?;
    ensure_profile(backend, &session.user).await;
    println!("Signed in as {}", credentials.email);
    Ok(())
}

async fn logout(backend: &RestBackend, store: &SessionStore) -> Result<()> {
    if let Err(err) = backend.sign_out().await {
        warn!(error = %err, "server sign out failed; dropping local session anyway");
    }
    store.clear()?;
    println!("Signed out");
    Ok(())
}

async fn ensure_profile(backend: &RestBackend, user: &AuthUser) {
    if let Err(err) = load_or_create_profile(backend, user).await {
        warn!(user = %user.id, error = %err, "profile bootstrap failed");
    }
}

/// Resolves the signed-in user, dropping a session file the backend no
/// longer accepts.
async fn require_user(backend: &RestBackend, store: &SessionStore) -> Result<AuthUser> {
    let had_session = backend.session().await.is_some();
    match backend.current_user().await? {
        Some(user) => Ok(user),
        None => {
            if had_session {
                info!(path = %store.path().display(), "clearing expired session");
                store.clear()?;
            }
            bail!("not signed in; run `minigames login --email <email> --password <password>`")
        }
    }
}

async fn show_profile(backend: &RestBackend, store: &SessionStore) -> Result<()> {
    let user = require_user(backend, store).await?;
    let profile = load_or_create_profile(backend, &user).await?;
    let progress = ProfileProgress::from_points(profile.points.unwrap_or(0));

    println!("{}", profile.email.as_deref().unwrap_or("no email"));
    if let Some(created_at) = profile.created_at {
        println!("member since {}", created_at.format("%Y-%m-%d"));
    }
    println!(
        "level {} | {} points | {:.0}% to level {} ({} points)",
        progress.level,
        progress.points,
        progress.percent,
        progress.level + 1,
        progress.next_level_at
    );
    for badge in progress.badges() {
        let mark = if badge.earned { "x" } else { " " };
        println!("[{mark}] {} - {}", badge.title, badge.description);
    }
    Ok(())
}

fn list_competitions() {
    for period in CompetitionPeriod::ALL {
        let status = if period.is_playable() {
            "open"
        } else {
            "coming soon"
        };
        println!("{:<8} {:<12} {}", period.label(), status, period.blurb());
    }
}

async fn show_leaderboard(
    backend: &RestBackend,
    settings: &Settings,
    day: CompetitionDay,
    limit: Option<u32>,
) -> Result<()> {
    let competition_id = backend.get_or_create_daily_competition(day).await?;
    let fetcher =
        LeaderboardFetcher::new(competition_id, limit.unwrap_or(settings.leaderboard_limit));
    let board = fetcher.fetch(backend).await?;
    let me = match backend.current_user().await {
        Ok(user) => user.and_then(|user| user.email),
        Err(err) => {
            warn!(error = %err, "could not resolve current user");
            None
        }
    };

    println!("Daily competition {day} (top {})", fetcher.limit());
    print!("{}", play::render_leaderboard(&board, me.as_deref()));
    Ok(())
}

async fn play_today(backend: Arc<RestBackend>, settings: &Settings) -> Result<()> {
    let run = RunController::with_random_targets(settings.game);
    let mut competition = match DailyCompetition::open(
        backend,
        CompetitionDay::today(),
        run,
        settings.leaderboard_limit,
    )
    .await
    {
        Ok(competition) => competition,
        Err(CompetitionError::SignInRequired) => {
            bail!("sign in to play: run `minigames login --email <email> --password <password>`")
        }
        Err(err) => return Err(err).context("could not open today's competition"),
    };
    play::play_daily(&mut competition).await
}

async fn record_match(
    backend: &RestBackend,
    competition_id: CompetitionId,
    score: u32,
) -> Result<()> {
    let points = points_earned(score);
    backend
        .submit_match(SubmitMatchParams {
            competition_id,
            score,
            points_earned: points,
            game: GameKind::MinigameDaily,
        })
        .await
        .context("could not record match")?;
    println!("Match recorded: score {score}, +{points} points");
    Ok(())
}
