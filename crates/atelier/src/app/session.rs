//! Last attached session persistence, used by `attach --resume`.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use time::format_description::well_known::Rfc3339;

use crate::domain::names::sanitize;
use crate::infra::paths::app_state_dir;

const SESSIONS_DIR: &str = "sessions";
const LOCAL_CLIENT: &str = "local";

/// The session most recently attached from this client.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct LastSession {
    pub id: String,
    /// RFC 3339 timestamp.
    pub attached_at: String,
}

impl LastSession {
    pub fn now(id: impl Into<String>) -> Self {
        let attached_at = OffsetDateTime::now_utc()
            .format(&Rfc3339)
            .unwrap_or_default();
        Self {
            id: id.into(),
            attached_at,
        }
    }
}

/// Persists [`LastSession`] as `<state_dir>/atelier/sessions/<client>.json`.
#[derive(Debug, Clone)]
pub struct LastSessionStore {
    path: PathBuf,
}

impl LastSessionStore {
    /// Store for `client` under the given state directory.
    pub fn new(state_dir: impl AsRef<Path>, client: &str) -> Self {
        let client = match sanitize(client) {
            name if name.is_empty() => LOCAL_CLIENT.to_string(),
            name => name,
        };
        let path = state_dir
            .as_ref()
            .join(SESSIONS_DIR)
            .join(format!("{client}.json"));
        Self { path }
    }

    /// Store under the standard state directory. `remote` selects a per-host file.
    pub fn for_client(remote: Option<&str>) -> Result<Self> {
        let dir = app_state_dir().context("unable to determine state directory")?;
        Ok(Self::new(dir, remote.unwrap_or(LOCAL_CLIENT)))
    }

    /// Location of the persisted file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn load(&self) -> Result<Option<LastSession>> {
        if !self.path.exists() {
            return Ok(None);
        }

        let data = fs::read_to_string(&self.path)
            .with_context(|| format!("failed to read session file at {}", self.path.display()))?;
        let last = serde_json::from_str(&data)
            .with_context(|| format!("invalid session data in {}", self.path.display()))?;
        Ok(Some(last))
    }

    /// Persist `last`, creating parent directories as needed.
    pub fn save(&self, last: &LastSession) -> Result<()> {
        if let Some(dir) = self.path.parent() {
            fs::create_dir_all(dir)
                .with_context(|| format!("failed to create session directory {}", dir.display()))?;
        }

        let data = serde_json::to_string_pretty(last).context("failed to serialize last session")?;
        fs::write(&self.path, data)
            .with_context(|| format!("failed to write session file to {}", self.path.display()))?;
        Ok(())
    }

    /// Forget the last session. Missing files are fine.
    pub fn clear(&self) -> Result<()> {
        match fs::remove_file(&self.path) {
            Ok(()) => Ok(()),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(err) => Err(err)
                .with_context(|| format!("failed to remove session file {}", self.path.display())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn save_load_and_clear() -> Result<()> {
        let temp = tempfile::tempdir()?;
        let store = LastSessionStore::new(temp.path(), "local");
        assert!(store.load()?.is_none());

        let last = LastSession::now("api:build");
        store.save(&last)?;
        assert_eq!(store.path(), temp.path().join("sessions/local.json"));
        assert_eq!(store.load()?, Some(last));

        store.clear()?;
        assert!(store.load()?.is_none());
        store.clear()?;
        Ok(())
    }

    #[test]
    fn timestamp_is_rfc3339() {
        let last = LastSession::now("api");
        assert!(OffsetDateTime::parse(&last.attached_at, &Rfc3339).is_ok());
    }

    #[test]
    fn remote_clients_get_their_own_file() {
        let store = LastSessionStore::new("/state", "devbox.lan:7391");
        assert_eq!(store.path(), Path::new("/state/sessions/devbox-lan-7391.json"));
    }

    #[test]
    fn corrupt_file_is_reported() -> Result<()> {
        let temp = tempfile::tempdir()?;
        let store = LastSessionStore::new(temp.path(), "local");
        fs::create_dir_all(temp.path().join("sessions"))?;
        fs::write(store.path(), "{")?;
        assert!(store.load().is_err());
        Ok(())
    }
}
