use std::{
    fs, io,
    path::{Path, PathBuf},
};

use anyhow::{anyhow, Context};
use shared::protocol::AuthSession;

/// Signed-in session persisted between CLI invocations.
#[derive(Debug, Clone)]
pub struct SessionStore {
    path: PathBuf,
}

impl SessionStore {
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }

    /// `<config dir>/minigame-competitions/session.json` unless overridden.
    pub fn from_settings(explicit: Option<PathBuf>) -> anyhow::Result<Self> {
        if let Some(path) = explicit {
            return Ok(Self::new(path));
        }
        let base =
            dirs::config_dir().ok_or_else(|| anyhow!("unable to resolve user config dir"))?;
        Ok(Self::new(
            base.join("minigame-competitions").join("session.json"),
        ))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn load(&self) -> anyhow::Result<Option<AuthSession>> {
        let raw = match fs::read_to_string(&self.path) {
            Ok(raw) => raw,
            Err(err) if err.kind() == io::ErrorKind::NotFound => return Ok(None),
            Err(err) => {
                return Err(err).with_context(|| {
                    format!("failed to read session file '{}'", self.path.display())
                })
            }
        };
        let session = serde_json::from_str(&raw).with_context(|| {
            format!("session file '{}' is corrupt", self.path.display())
        })?;
        Ok(Some(session))
    }

    pub fn save(&self, session: &AuthSession) -> anyhow::Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent).with_context(|| {
                format!("failed to create session dir '{}'", parent.display())
            })?;
        }
        let raw = serde_json::to_string_pretty(session)?;
        fs::write(&self.path, raw)
            .with_context(|| format!("failed to write session file '{}'", self.path.display()))
    }

    pub fn clear(&self) -> anyhow::Result<()> {
        match fs::remove_file(&self.path) {
            Ok(()) => Ok(()),
            Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(err) => Err(err).with_context(|| {
                format!("failed to remove session file '{}'", self.path.display())
            }),
        }
    }
}
