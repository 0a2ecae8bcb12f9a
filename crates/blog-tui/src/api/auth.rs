use std::fs;
use std::io::ErrorKind;
use std::path::PathBuf;

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// The backend's `auth_token` cookie value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthToken {
    pub auth_token: String,
    #[serde(default)]
    pub saved_at: Option<DateTime<Utc>>,
}

impl AuthToken {
    pub fn new(token: impl Into<String>) -> Self {
        Self {
            auth_token: token.into(),
            saved_at: None,
        }
    }
}

/// A token file on disk. A missing file means signed out.
#[derive(Debug, Clone)]
pub struct TokenStore {
    path: PathBuf,
}

impl TokenStore {
    pub fn at(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// `<config dir>/blog-tui/auth.json`
    pub fn user_default() -> Result<Self> {
        let dir = dirs::config_dir().context("Could not find config directory")?;
        Ok(Self::at(dir.join("blog-tui").join("auth.json")))
    }

    pub fn load(&self) -> Result<Option<AuthToken>> {
        let contents = match fs::read_to_string(&self.path) {
            Ok(contents) => contents,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(e) => {
                return Err(e).with_context(|| format!("Could not read {}", self.path.display()))
            }
        };

        let token = serde_json::from_str(&contents)
            .with_context(|| format!("Could not parse {}", self.path.display()))?;
        Ok(Some(token))
    }

    pub fn save(&self, token: &AuthToken) -> Result<()> {
        if let Some(dir) = self.path.parent() {
            fs::create_dir_all(dir).context("Could not create config directory")?;
        }

        let stamped = AuthToken {
            saved_at: Some(Utc::now()),
            ..token.clone()
        };
        let contents = serde_json::to_string_pretty(&stamped)?;
        fs::write(&self.path, contents)
            .with_context(|| format!("Could not write {}", self.path.display()))
    }

    pub fn clear(&self) -> Result<()> {
        match fs::remove_file(&self.path) {
            Err(e) if e.kind() != ErrorKind::NotFound => {
                Err(e).with_context(|| format!("Could not delete {}", self.path.display()))
            }
            _ => Ok(()),
        }
    }
}
