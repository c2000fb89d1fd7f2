//! Player profile bootstrap and the level/badge view derived from points.

use shared::protocol::{AuthUser, NewProfile, ProfileRow};
use tracing::{info, warn};

use crate::{backend::CompetitionBackend, error::BackendError};

pub const POINTS_PER_LEVEL: i64 = 250;

/// Reads the caller's profile, creating it on first access and backfilling a
/// missing email from the auth identity.
pub async fn load_or_create_profile<B>(
    backend: &B,
    user: &AuthUser,
) -> Result<ProfileRow, BackendError>
where
    B: CompetitionBackend + ?Sized,
{
    let Some(mut profile) = backend.fetch_profile(user.id).await? else {
        let created = backend
            .create_profile(NewProfile {
                id: user.id,
                email: user.email.clone(),
                points: 0,
            })
            .await?;
        info!(user = %user.id, "profile created");
        return Ok(created);
    };

    let missing_email = profile.email.as_deref().map_or(true, str::is_empty);
    if let (true, Some(email)) = (missing_email, user.email.as_deref()) {
        match backend.update_profile_email(user.id, email).await {
            Ok(()) => profile.email = Some(email.to_string()),
            Err(err) => warn!(user = %user.id, error = %err, "could not backfill profile email"),
        }
    }
    Ok(profile)
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ProfileProgress {
    pub points: i64,
    pub level: i64,
    pub level_floor: i64,
    pub next_level_at: i64,
    pub percent: f64,
}

impl ProfileProgress {
    pub fn from_points(points: i64) -> Self {
        let points = points.max(0);
        let level = points / POINTS_PER_LEVEL + 1;
        let level_floor = (level - 1) * POINTS_PER_LEVEL;
        let next_level_at = level * POINTS_PER_LEVEL;
        let span = (next_level_at - level_floor) as f64;
        let percent = ((points - level_floor) as f64 / span * 100.0).clamp(0.0, 100.0);
        Self {
            points,
            level,
            level_floor,
            next_level_at,
            percent,
        }
    }

    pub fn badges(&self) -> Vec<Badge> {
        vec![
            Badge::new("First steps", "Created an account", true),
            Badge::new("100 points", "Collect 100 points", self.points >= 100),
            Badge::new("Level 3", "Reach level 3", self.level >= 3),
            Badge::new("Level 5", "Reach level 5", self.level >= 5),
        ]
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Badge {
    pub title: &'static str,
    pub description: &'static str,
    pub earned: bool,
}

impl Badge {
    fn new(title: &'static str, description: &'static str, earned: bool) -> Self {
        Self {
            title,
            description,
            earned,
        }
    }
}
