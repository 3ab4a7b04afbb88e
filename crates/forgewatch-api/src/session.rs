// Session persistence
//
// The bearer token, optional refresh token, and the signed-in user record
// live behind the `SessionStorage` trait so callers decide where they are
// kept (memory, a file, the OS keyring). `SessionStore` layers the typed
// accessors the API client needs over any storage backend.

use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use secrecy::{ExposeSecret, SecretString};
use tracing::{debug, warn};

use crate::error::Error;
use crate::models::{Session, User};

/// Storage key for the bearer access token.
pub const TOKEN_KEY: &str = "token";
/// Storage key for the refresh token.
pub const REFRESH_TOKEN_KEY: &str = "refreshToken";
/// Storage key for the JSON-encoded user record.
pub const USER_KEY: &str = "user";

/// String key/value storage for session state.
///
/// Implementations must be safe to share across tasks; every call is a
/// short synchronous read or write.
pub trait SessionStorage: Send + Sync {
    fn get(&self, key: &str) -> Result<Option<String>, Error>;
    fn set(&self, key: &str, value: &str) -> Result<(), Error>;
    fn remove(&self, key: &str) -> Result<(), Error>;
}

/// Process-local storage. Nothing survives a restart.
#[derive(Debug, Default)]
pub struct MemoryStorage {
    entries: RwLock<HashMap<String, String>>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }
}

fn poisoned() -> Error {
    Error::Storage("session lock poisoned".into())
}

impl SessionStorage for MemoryStorage {
    fn get(&self, key: &str) -> Result<Option<String>, Error> {
        let entries = self.entries.read().map_err(|_| poisoned())?;
        Ok(entries.get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<(), Error> {
        let mut entries = self.entries.write().map_err(|_| poisoned())?;
        entries.insert(key.to_owned(), value.to_owned());
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), Error> {
        let mut entries = self.entries.write().map_err(|_| poisoned())?;
        entries.remove(key);
        Ok(())
    }
}

/// Typed view over a [`SessionStorage`] backend.
///
/// Cheap to clone; all clones share the same backend.
#[derive(Clone)]
pub struct SessionStore {
    storage: Arc<dyn SessionStorage>,
}

impl std::fmt::Debug for SessionStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionStore").finish_non_exhaustive()
    }
}

impl SessionStore {
    pub fn new(storage: Arc<dyn SessionStorage>) -> Self {
        Self { storage }
    }

    /// A store backed by a fresh [`MemoryStorage`].
    pub fn in_memory() -> Self {
        Self::new(Arc::new(MemoryStorage::new()))
    }

    /// The stored access token, if any. Empty values count as absent.
    pub fn token(&self) -> Result<Option<SecretString>, Error> {
        Ok(self
            .storage
            .get(TOKEN_KEY)?
            .filter(|t| !t.is_empty())
            .map(SecretString::from))
    }

    /// The stored access token, or [`Error::MissingToken`].
    pub fn require_token(&self) -> Result<SecretString, Error> {
        self.token()?.ok_or(Error::MissingToken)
    }

    pub fn refresh_token(&self) -> Result<Option<SecretString>, Error> {
        Ok(self
            .storage
            .get(REFRESH_TOKEN_KEY)?
            .filter(|t| !t.is_empty())
            .map(SecretString::from))
    }

    /// `true` when an access token is stored.
    pub fn is_authenticated(&self) -> bool {
        matches!(self.token(), Ok(Some(_)))
    }

    /// The persisted user record.
    ///
    /// A record that no longer parses is reported as absent rather than
    /// failing every caller.
    pub fn current_user(&self) -> Result<Option<User>, Error> {
        let Some(raw) = self.storage.get(USER_KEY)? else {
            return Ok(None);
        };
        match serde_json::from_str::<User>(&raw) {
            Ok(user) => Ok(Some(user)),
            Err(e) => {
                warn!(error = %e, "discarding unreadable stored user record");
                Ok(None)
            }
        }
    }

    /// Overwrite the persisted user record.
    pub fn set_user(&self, user: &User) -> Result<(), Error> {
        let encoded = serde_json::to_string(user).map_err(|e| Error::Storage(e.to_string()))?;
        self.storage.set(USER_KEY, &encoded)
    }

    /// Persist a freshly issued session.
    pub fn save(&self, session: &Session) -> Result<(), Error> {
        debug!("persisting session");
        self.storage
            .set(TOKEN_KEY, session.access_token.expose_secret())?;
        if let Some(refresh) = &session.refresh_token {
            self.storage
                .set(REFRESH_TOKEN_KEY, refresh.expose_secret())?;
        }
        self.set_user(&session.user)
    }

    /// Drop the access token and user record. The refresh token is kept.
    pub fn clear(&self) -> Result<(), Error> {
        debug!("clearing session");
        self.storage.remove(TOKEN_KEY)?;
        self.storage.remove(USER_KEY)
    }
}
