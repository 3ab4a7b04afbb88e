// ── Persistent session storage ──
//
// `SessionStorage` backends that survive a restart: a per-profile JSON
// file in the data directory, or one OS keyring entry per key.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use tracing::debug;

use forgewatch_api::Error as ApiError;
use forgewatch_core::SessionStorage;

use crate::data_dir;

const KEYRING_SERVICE: &str = "forgewatch";

fn storage_err(context: &str, err: impl std::fmt::Display) -> ApiError {
    ApiError::Storage(format!("{context}: {err}"))
}

// ── File ────────────────────────────────────────────────────────────

/// Session entries kept as a flat JSON object in one file.
///
/// Every call reads or rewrites the whole file; the mutex serializes
/// writers within the process.
#[derive(Debug)]
pub struct FileSessionStorage {
    path: PathBuf,
    lock: Mutex<()>,
}

impl FileSessionStorage {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            lock: Mutex::new(()),
        }
    }

    /// `<data dir>/sessions/<profile>.json`
    pub fn for_profile(profile: &str) -> Self {
        Self::new(data_dir().join("sessions").join(format!("{profile}.json")))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read(&self) -> Result<BTreeMap<String, String>, ApiError> {
        let raw = match std::fs::read_to_string(&self.path) {
            Ok(raw) => raw,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(BTreeMap::new()),
            Err(e) => return Err(storage_err("reading session file", e)),
        };
        if raw.trim().is_empty() {
            return Ok(BTreeMap::new());
        }
        serde_json::from_str(&raw).map_err(|e| storage_err("parsing session file", e))
    }

    fn write(&self, entries: &BTreeMap<String, String>) -> Result<(), ApiError> {
        if entries.is_empty() {
            return match std::fs::remove_file(&self.path) {
                Err(e) if e.kind() != std::io::ErrorKind::NotFound => {
                    Err(storage_err("removing session file", e))
                }
                _ => Ok(()),
            };
        }
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| storage_err("creating data dir", e))?;
        }
        let json = serde_json::to_string_pretty(entries)
            .map_err(|e| storage_err("encoding session file", e))?;
        std::fs::write(&self.path, json).map_err(|e| storage_err("writing session file", e))?;
        restrict_permissions(&self.path)?;
        debug!(path = %self.path.display(), "session file written");
        Ok(())
    }

    fn locked(&self) -> Result<std::sync::MutexGuard<'_, ()>, ApiError> {
        self.lock
            .lock()
            .map_err(|_| ApiError::Storage("session lock poisoned".into()))
    }
}

#[cfg(unix)]
fn restrict_permissions(path: &Path) -> Result<(), ApiError> {
    use std::os::unix::fs::PermissionsExt;
    std::fs::set_permissions(path, std::fs::Permissions::from_mode(0o600))
        .map_err(|e| storage_err("setting session file permissions", e))
}

#[cfg(not(unix))]
#[allow(clippy::unnecessary_wraps)]
fn restrict_permissions(_path: &Path) -> Result<(), ApiError> {
    Ok(())
}

impl SessionStorage for FileSessionStorage {
    fn get(&self, key: &str) -> Result<Option<String>, ApiError> {
        let _guard = self.locked()?;
        Ok(self.read()?.remove(key))
    }

    fn set(&self, key: &str, value: &str) -> Result<(), ApiError> {
        let _guard = self.locked()?;
        let mut entries = self.read()?;
        entries.insert(key.to_owned(), value.to_owned());
        self.write(&entries)
    }

    fn remove(&self, key: &str) -> Result<(), ApiError> {
        let _guard = self.locked()?;
        let mut entries = self.read()?;
        if entries.remove(key).is_some() {
            self.write(&entries)?;
        }
        Ok(())
    }
}

// ── Keyring ─────────────────────────────────────────────────────────

/// One keyring entry per key, named `<profile>/<key>` under the
/// `forgewatch` service.
#[derive(Debug, Clone)]
pub struct KeyringSessionStorage {
    profile: String,
}

impl KeyringSessionStorage {
    pub fn new(profile: &str) -> Self {
        Self {
            profile: profile.to_owned(),
        }
    }

    fn entry(&self, key: &str) -> Result<keyring::Entry, ApiError> {
        keyring::Entry::new(KEYRING_SERVICE, &format!("{}/{key}", self.profile))
            .map_err(|e| storage_err("opening keyring entry", e))
    }
}

impl SessionStorage for KeyringSessionStorage {
    fn get(&self, key: &str) -> Result<Option<String>, ApiError> {
        match self.entry(key)?.get_password() {
            Ok(value) => Ok(Some(value)),
            Err(keyring::Error::NoEntry) => Ok(None),
            Err(e) => Err(storage_err("reading keyring", e)),
        }
    }

    fn set(&self, key: &str, value: &str) -> Result<(), ApiError> {
        self.entry(key)?
            .set_password(value)
            .map_err(|e| storage_err("writing keyring", e))
    }

    fn remove(&self, key: &str) -> Result<(), ApiError> {
        match self.entry(key)?.delete_credential() {
            Ok(()) | Err(keyring::Error::NoEntry) => Ok(()),
            Err(e) => Err(storage_err("deleting keyring entry", e)),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn file_storage_round_trips_and_cleans_up() {
        let dir = tempfile::tempdir().unwrap();
        let storage = FileSessionStorage::new(dir.path().join("sessions").join("default.json"));

        assert_eq!(storage.get("token").unwrap(), None);
        storage.set("token", "tok-1").unwrap();
        storage.set("user", r#"{"username":"ops"}"#).unwrap();
        assert_eq!(storage.get("token").unwrap().as_deref(), Some("tok-1"));

        // a second handle on the same file sees the same entries
        let other = FileSessionStorage::new(storage.path());
        assert_eq!(other.get("user").unwrap().as_deref(), Some(r#"{"username":"ops"}"#));

        storage.remove("token").unwrap();
        storage.remove("user").unwrap();
        assert!(!storage.path().exists());
    }

    #[test]
    fn corrupt_file_is_storage_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bad.json");
        std::fs::write(&path, "{not json").unwrap();
        let err = FileSessionStorage::new(&path).get("token").unwrap_err();
        assert!(matches!(err, ApiError::Storage(_)));
    }

    #[cfg(unix)]
    #[test]
    fn file_is_private() {
        use std::os::unix::fs::PermissionsExt;

        let dir = tempfile::tempdir().unwrap();
        let storage = FileSessionStorage::new(dir.path().join("s.json"));
        storage.set("token", "tok").unwrap();
        let mode = std::fs::metadata(storage.path()).unwrap().permissions().mode();
        assert_eq!(mode & 0o777, 0o600);
    }
}
