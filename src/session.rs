//! Login session persistence.

use std::fs;
use std::io;
use std::path::PathBuf;
use std::sync::{Mutex, MutexGuard, PoisonError};

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::error::Result;
use crate::traits::{Credentials, SessionProvider, TokenStore};

#[derive(Debug, Serialize, Deserialize)]
struct StoredToken {
    token: String,
}

/// Keeps the session token in a small JSON file.
#[derive(Debug, Clone)]
pub struct FileTokenStore {
    path: PathBuf,
}

impl FileTokenStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl TokenStore for FileTokenStore {
    fn load(&self) -> Result<Option<String>> {
        let contents = match fs::read_to_string(&self.path) {
            Ok(contents) => contents,
            Err(err) if err.kind() == io::ErrorKind::NotFound => return Ok(None),
            Err(err) => return Err(err.into()),
        };
        let stored: StoredToken = serde_json::from_str(&contents)?;
        Ok(Some(stored.token))
    }

    fn save(&self, token: &str) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        let body = serde_json::to_string(&StoredToken {
            token: token.to_string(),
        })?;
        let tmp_path = self.path.with_extension("tmp");
        fs::write(&tmp_path, body)?;
        fs::rename(tmp_path, &self.path)?;
        Ok(())
    }

    fn clear(&self) -> Result<()> {
        match fs::remove_file(&self.path) {
            Err(err) if err.kind() != io::ErrorKind::NotFound => Err(err.into()),
            _ => Ok(()),
        }
    }
}

#[derive(Debug, Default)]
pub struct MemoryTokenStore {
    token: Mutex<Option<String>>,
}

impl MemoryTokenStore {
    // A writer that panicked leaves either the old or the new token behind,
    // so a poisoned slot is still usable.
    fn slot(&self) -> MutexGuard<'_, Option<String>> {
        self.token.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl TokenStore for MemoryTokenStore {
    fn load(&self) -> Result<Option<String>> {
        Ok(self.slot().clone())
    }

    fn save(&self, token: &str) -> Result<()> {
        *self.slot() = Some(token.to_string());
        Ok(())
    }

    fn clear(&self) -> Result<()> {
        *self.slot() = None;
        Ok(())
    }
}

/// A session provider whose token survives restarts.
pub struct Session<P, S> {
    provider: P,
    store: S,
}

impl<P: SessionProvider, S: TokenStore> Session<P, S> {
    pub fn new(provider: P, store: S) -> Self {
        Self { provider, store }
    }

    /// Loads a persisted token into the provider. Returns whether one existed.
    pub fn restore(&mut self) -> Result<bool> {
        match self.store.load()? {
            Some(token) => {
                self.provider.restore(token);
                debug!("restored session token");
                Ok(true)
            }
            None => Ok(false),
        }
    }

    pub fn login(&mut self, credentials: &Credentials) -> Result<()> {
        let token = self.provider.login(credentials)?;
        self.store.save(&token)?;
        info!(email = %credentials.email, "logged in");
        Ok(())
    }

    /// Drops the token locally even if the provider fails to log out.
    pub fn logout(&mut self) -> Result<()> {
        let result = self.provider.logout();
        self.store.clear()?;
        result
    }

    pub fn is_authenticated(&self) -> bool {
        self.provider.token().is_some()
    }

    pub fn provider(&self) -> &P {
        &self.provider
    }

    pub fn provider_mut(&mut self) -> &mut P {
        &mut self.provider
    }
}
