use std::{
    fs,
    path::{Path, PathBuf},
};

use anyhow::{anyhow, Context};
use client_core::{BackendConfig, DEFAULT_LEADERBOARD_LIMIT};
use minigame::{GameConfig, ScoringRules};
use serde::Deserialize;

const DEFAULT_SETTINGS_FILE: &str = "minigames.toml";

#[derive(Debug, Clone, PartialEq)]
pub struct Settings {
    pub backend_url: Option<String>,
    pub anon_key: Option<String>,
    pub log_filter: String,
    pub session_path: Option<PathBuf>,
    pub leaderboard_limit: u32,
    pub game: GameConfig,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            backend_url: None,
            anon_key: None,
            log_filter: "info".into(),
            session_path: None,
            leaderboard_limit: DEFAULT_LEADERBOARD_LIMIT,
            game: terminal_game(),
        }
    }
}

/// Typed answers are too slow for timed relocation, so targets stay put
/// until they are hit.
pub fn terminal_game() -> GameConfig {
    GameConfig {
        target_lifetime_ms: None,
        ..GameConfig::default()
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct FileSettings {
    backend_url: Option<String>,
    anon_key: Option<String>,
    log_filter: Option<String>,
    session_path: Option<PathBuf>,
    leaderboard_limit: Option<u32>,
    game: Option<GameOverrides>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct GameOverrides {
    run_seconds: Option<u64>,
    /// 0 keeps targets in place until hit.
    target_lifetime_ms: Option<u64>,
    target_radius: Option<f32>,
    scoring: Option<ScoringRules>,
}

/// Defaults, then `minigames.toml` (or the explicit `--config` file), then
/// environment variables.
pub fn load_settings(explicit: Option<&Path>) -> anyhow::Result<Settings> {
    let mut settings = Settings::default();

    match explicit {
        Some(path) => {
            let raw = fs::read_to_string(path)
                .with_context(|| format!("failed to read settings file '{}'", path.display()))?;
            settings.apply_file(&raw).with_context(|| {
                format!("failed to parse settings file '{}'", path.display())
            })?;
        }
        None => {
            if let Ok(raw) = fs::read_to_string(DEFAULT_SETTINGS_FILE) {
                settings
                    .apply_file(&raw)
                    .with_context(|| format!("failed to parse {DEFAULT_SETTINGS_FILE}"))?;
            }
        }
    }

    settings.apply_env(|key| std::env::var(key).ok());
    Ok(settings)
}

impl Settings {
    fn apply_file(&mut self, raw: &str) -> anyhow::Result<()> {
        let file_cfg: FileSettings = toml::from_str(raw)?;
        if let Some(v) = file_cfg.backend_url {
            self.backend_url = Some(v);
        }
        if let Some(v) = file_cfg.anon_key {
            self.anon_key = Some(v);
        }
        if let Some(v) = file_cfg.log_filter {
            self.log_filter = v;
        }
        if let Some(v) = file_cfg.session_path {
            self.session_path = Some(v);
        }
        if let Some(v) = file_cfg.leaderboard_limit {
            self.leaderboard_limit = v;
        }
        if let Some(game) = file_cfg.game {
            if let Some(v) = game.run_seconds {
                self.game.run_seconds = v;
            }
            if let Some(v) = game.target_lifetime_ms {
                self.game.target_lifetime_ms = (v > 0).then_some(v);
            }
            if let Some(v) = game.target_radius {
                self.game.target_radius = v;
            }
            if let Some(v) = game.scoring {
                self.game.scoring = v;
            }
        }
        Ok(())
    }

    fn apply_env(&mut self, var: impl Fn(&str) -> Option<String>) {
        if let Some(v) = var("SUPABASE_URL") {
            self.backend_url = Some(v);
        }
        if let Some(v) = var("APP__BACKEND_URL") {
            self.backend_url = Some(v);
        }

        if let Some(v) = var("SUPABASE_ANON_KEY") {
            self.anon_key = Some(v);
        }
        if let Some(v) = var("APP__ANON_KEY") {
            self.anon_key = Some(v);
        }

        if let Some(v) = var("APP__LOG_FILTER") {
            self.log_filter = v;
        }
        if let Some(v) = var("APP__SESSION_PATH") {
            self.session_path = Some(PathBuf::from(v));
        }

        if let Some(v) = var("APP__RUN_SECONDS") {
            if let Ok(parsed) = v.parse::<u64>() {
                self.game.run_seconds = parsed;
            }
        }
        if let Some(v) = var("APP__LEADERBOARD_LIMIT") {
            if let Ok(parsed) = v.parse::<u32>() {
                self.leaderboard_limit = parsed;
            }
        }
    }

    pub fn backend_config(&self) -> anyhow::Result<BackendConfig> {
        let url = self
            .backend_url
            .as_deref()
            .ok_or_else(|| anyhow!("backend url is not configured (set APP__BACKEND_URL)"))?;
        let key = self
            .anon_key
            .as_deref()
            .ok_or_else(|| anyhow!("anon key is not configured (set APP__ANON_KEY)"))?;
        Ok(BackendConfig::new(url, key)?)
    }
}
