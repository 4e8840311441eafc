//! On-disk store for the auth service's own session (access + refresh token).
//!
//! This is the backend's credential cache, separate from the client state the
//! UI keeps. The directory is created `0700` and the file written `0600` on Unix.

use std::fs;
use std::path::{Path, PathBuf};

use tj_core::Session;

use crate::error::BaasError;

#[derive(Debug, Clone)]
pub struct TokenFile {
    path: PathBuf,
}

impl TokenFile {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Persist `session`, replacing any previous one.
    ///
    /// # Errors
    ///
    /// Returns `BaasError::TokenStore` if the directory or file cannot be written.
    pub fn store(&self, session: &Session) -> Result<(), BaasError> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent).map_err(|e| {
                BaasError::TokenStore(format!("mkdir {}: {e}", parent.display()))
            })?;
            #[cfg(unix)]
            {
                use std::os::unix::fs::PermissionsExt;
                if let Err(e) = fs::set_permissions(parent, fs::Permissions::from_mode(0o700)) {
                    tracing::warn!("failed to chmod 0700 {}: {e}", parent.display());
                }
            }
        }

        let body = serde_json::to_string(session)
            .map_err(|e| BaasError::TokenStore(format!("encode session: {e}")))?;
        fs::write(&self.path, body)
            .map_err(|e| BaasError::TokenStore(format!("write {}: {e}", self.path.display())))?;

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            fs::set_permissions(&self.path, fs::Permissions::from_mode(0o600)).map_err(|e| {
                BaasError::TokenStore(format!("chmod {}: {e}", self.path.display()))
            })?;
        }

        Ok(())
    }

    /// Load the stored session; unreadable or empty files read as `None`.
    #[must_use]
    pub fn load(&self) -> Option<Session> {
        let body = fs::read_to_string(&self.path)
            .ok()
            .filter(|s| !s.trim().is_empty())?;
        match serde_json::from_str(&body) {
            Ok(session) => Some(session),
            Err(error) => {
                tracing::warn!(%error, path = %self.path.display(), "ignoring unreadable session file");
                None
            }
        }
    }

    /// Remove the stored session. Missing files are not an error.
    ///
    /// # Errors
    ///
    /// Returns `BaasError::TokenStore` if an existing file cannot be removed.
    pub fn delete(&self) -> Result<(), BaasError> {
        if self.path.exists() {
            fs::remove_file(&self.path).map_err(|e| {
                BaasError::TokenStore(format!("failed to delete {}: {e}", self.path.display()))
            })?;
        }
        Ok(())
    }
}
