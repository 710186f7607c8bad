//! Bearer token storage for the relay.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use tracing::info;
use uuid::Uuid;

use crate::infra::paths::app_data_dir;

const TOKEN_FILE: &str = "token";

/// Token file at `<data_dir>/atelier/token`.
#[derive(Debug, Clone)]
pub struct TokenStore {
    path: PathBuf,
}

impl TokenStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn discover() -> Result<Self> {
        let dir = app_data_dir().context("unable to determine data directory")?;
        Ok(Self::new(dir.join(TOKEN_FILE)))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn load(&self) -> Result<Option<String>> {
        if !self.path.exists() {
            return Ok(None);
        }
        let token = fs::read_to_string(&self.path)
            .with_context(|| format!("failed to read token file {}", self.path.display()))?;
        let token = token.trim();
        Ok((!token.is_empty()).then(|| token.to_string()))
    }

    /// Write `token` with owner-only permissions.
    pub fn save(&self, token: &str) -> Result<()> {
        let token = token.trim();
        if token.is_empty() {
            bail!("refusing to save an empty token");
        }
        if let Some(dir) = self.path.parent() {
            fs::create_dir_all(dir)
                .with_context(|| format!("failed to create directory {}", dir.display()))?;
        }
        fs::write(&self.path, format!("{token}\n"))
            .with_context(|| format!("failed to write token file {}", self.path.display()))?;
        restrict_permissions(&self.path)?;
        Ok(())
    }

    /// Stored token, generating and saving a fresh one when none exists.
    pub fn load_or_create(&self) -> Result<String> {
        if let Some(token) = self.load()? {
            return Ok(token);
        }
        let token = generate_token();
        self.save(&token)?;
        info!(path = %self.path.display(), "generated relay token");
        Ok(token)
    }
}

/// 32 lowercase hex characters.
pub fn generate_token() -> String {
    Uuid::new_v4().simple().to_string()
}

/// `override_token` when set, otherwise the stored (or newly generated) token.
pub fn resolve_token(override_token: Option<&str>, store: &TokenStore) -> Result<String> {
    match override_token.map(str::trim).filter(|token| !token.is_empty()) {
        Some(token) => Ok(token.to_string()),
        None => store.load_or_create(),
    }
}

/// Compare a presented token against the expected one without short-circuiting on the first
/// differing byte.
pub fn tokens_match(presented: &str, expected: &str) -> bool {
    let (presented, expected) = (presented.as_bytes(), expected.as_bytes());
    if presented.len() != expected.len() || expected.is_empty() {
        return false;
    }
    presented
        .iter()
        .zip(expected)
        .fold(0u8, |diff, (a, b)| diff | (a ^ b))
        == 0
}

#[cfg(unix)]
fn restrict_permissions(path: &Path) -> Result<()> {
    use std::os::unix::fs::PermissionsExt;
    fs::set_permissions(path, fs::Permissions::from_mode(0o600))
        .with_context(|| format!("failed to restrict permissions on {}", path.display()))
}

#[cfg(not(unix))]
fn restrict_permissions(_path: &Path) -> Result<()> {
    Ok(())
}
