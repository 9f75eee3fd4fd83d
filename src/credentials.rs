// Credential storage: the API key, API token and resolved board id are
// cached between runs so the tool only prompts when something is
// missing or stale. Storage sits behind a small trait so the
// interactive flows can be exercised against an in-memory store.

use std::fs;
use std::path::PathBuf;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

/// The three opaque strings the rest of the tool needs: nothing
/// outside this module and the prompts cares what is inside them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Credentials {
    pub api_key: String,
    pub api_token: String,
    pub board_id: String,
}

/// Load/save seam for cached credentials.
pub trait CredentialStore {
    /// Returns the stored credentials, or `None` when nothing (or
    /// nothing readable) has been saved yet.
    fn load(&self) -> Result<Option<Credentials>>;

    /// Persist credentials for future runs.
    fn save(&self, credentials: &Credentials) -> Result<()>;
}

/// File-backed store keeping a JSON dotfile in the home directory.
pub struct FileCredentialStore {
    path: PathBuf,
}

const CREDENTIALS_FILE: &str = ".cardfile_credentials.json";

impl FileCredentialStore {
    /// Store located at `~/.cardfile_credentials.json` (falling back to
    /// the current directory when no home directory is available).
    pub fn default_location() -> Self {
        let dir = dirs::home_dir().unwrap_or_else(|| PathBuf::from("."));
        FileCredentialStore {
            path: dir.join(CREDENTIALS_FILE),
        }
    }

    pub fn at_path(path: PathBuf) -> Self {
        FileCredentialStore { path }
    }
}

impl CredentialStore for FileCredentialStore {
    fn load(&self) -> Result<Option<Credentials>> {
        if !self.path.exists() {
            return Ok(None);
        }
        let data = fs::read_to_string(&self.path)
            .with_context(|| format!("Failed to read '{}'", self.path.display()))?;
        match serde_json::from_str(&data) {
            Ok(credentials) => Ok(Some(credentials)),
            Err(err) => {
                // A corrupt file is treated as absent so the user is
                // simply re-prompted instead of being locked out.
                log::warn!(
                    "Ignoring unreadable credentials file '{}': {}",
                    self.path.display(),
                    err
                );
                Ok(None)
            }
        }
    }

    fn save(&self, credentials: &Credentials) -> Result<()> {
        let data = serde_json::to_string_pretty(credentials)?;
        fs::write(&self.path, data)
            .with_context(|| format!("Failed to write '{}'", self.path.display()))
    }
}
