use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::persist::{read_json, write_json_atomic};

#[derive(Debug, Default, Serialize, Deserialize)]
struct CachedToken {
    #[serde(default)]
    token: Option<String>,
}

/// File-backed cache for a single API token, stored as `{"token": "..."}`.
///
/// Lets a restarted process reuse the last login instead of hitting the
/// vendor's login endpoint on every start. Best-effort: unreadable files
/// read as "no token" and failed writes are only logged.
#[derive(Debug, Clone)]
pub struct TokenCache {
    path: PathBuf,
}

impl TokenCache {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Returns the cached token, if one is stored and non-empty.
    pub fn load(&self) -> Option<String> {
        match read_json::<CachedToken>(&self.path) {
            Ok(cached) => cached
                .and_then(|c| c.token)
                .filter(|token| !token.trim().is_empty()),
            Err(err) => {
                tracing::debug!("Token cache {} unreadable: {}", self.path.display(), err);
                None
            }
        }
    }

    pub fn store(&self, token: &str) {
        let cached = CachedToken {
            token: Some(token.to_string()),
        };
        if let Err(err) = write_json_atomic(&self.path, &cached) {
            tracing::warn!(
                "Could not write token cache {}: {}",
                self.path.display(),
                err
            );
        }
    }
}
