// ── Auth context ──
//
// Process-wide view of who is signed in. Built once from persisted
// session storage; later logins and logouts are broadcast to subscribers
// over a `watch` channel so every screen sees the same user.

use std::sync::Arc;

use secrecy::{ExposeSecret, SecretString};
use tokio::sync::watch;
use tracing::debug;

use forgewatch_api::{SessionStore, User};

use crate::error::CoreError;

/// Minimum accepted password length at registration.
pub const MIN_PASSWORD_LEN: usize = 6;

/// Snapshot of the auth context.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AuthState {
    pub user: Option<User>,
    /// `true` until the persisted session has been read.
    pub loading: bool,
}

impl AuthState {
    pub fn is_authenticated(&self) -> bool {
        self.user.is_some()
    }
}

/// Shared, cheaply cloneable auth context.
#[derive(Clone)]
pub struct AuthContext {
    store: SessionStore,
    state: Arc<watch::Sender<AuthState>>,
}

impl AuthContext {
    /// A context that has not read storage yet (`loading == true`).
    pub fn new(store: SessionStore) -> Self {
        let (tx, _rx) = watch::channel(AuthState {
            user: None,
            loading: true,
        });
        Self {
            store,
            state: Arc::new(tx),
        }
    }

    /// Build a context and immediately load the persisted session.
    pub fn restore(store: SessionStore) -> Self {
        let ctx = Self::new(store);
        ctx.initialize();
        ctx
    }

    /// Read the persisted session. When a token is stored, the stored user
    /// becomes the current user.
    pub fn initialize(&self) {
        let user = if self.store.is_authenticated() {
            self.store.current_user().ok().flatten()
        } else {
            None
        };
        debug!(restored = user.is_some(), "auth context initialized");
        self.state.send_replace(AuthState {
            user,
            loading: false,
        });
    }

    pub fn snapshot(&self) -> AuthState {
        self.state.borrow().clone()
    }

    pub fn user(&self) -> Option<User> {
        self.state.borrow().user.clone()
    }

    pub fn is_authenticated(&self) -> bool {
        self.state.borrow().is_authenticated()
    }

    pub fn is_loading(&self) -> bool {
        self.state.borrow().loading
    }

    /// Make `user` the signed-in user. Storage is written by the API
    /// client during login; this only updates the shared state.
    pub fn login(&self, user: User) {
        self.state.send_modify(|s| {
            s.user = Some(user);
            s.loading = false;
        });
    }

    /// Clear persisted token and user, then the in-memory user.
    ///
    /// The in-memory user is cleared even when storage fails.
    pub fn logout(&self) -> Result<(), CoreError> {
        let cleared = self.store.clear();
        self.state.send_modify(|s| s.user = None);
        cleared.map_err(CoreError::from)
    }

    /// Receive every subsequent change.
    pub fn subscribe(&self) -> watch::Receiver<AuthState> {
        self.state.subscribe()
    }

    pub fn store(&self) -> &SessionStore {
        &self.store
    }
}

// ── Registration ─────────────────────────────────────────────────────

/// Account details collected by the registration form.
#[derive(Debug)]
pub struct Registration {
    pub username: String,
    pub email: String,
    pub password: SecretString,
    pub confirm_password: SecretString,
}

impl Registration {
    /// Client-side checks run before anything is sent.
    pub fn validate(&self) -> Result<(), CoreError> {
        if self.username.trim().is_empty() {
            return Err(invalid("username", "Username is required"));
        }
        if self.email.trim().is_empty() {
            return Err(invalid("email", "Email is required"));
        }
        let password = self.password.expose_secret();
        if password != self.confirm_password.expose_secret() {
            return Err(invalid("confirm_password", "Passwords do not match"));
        }
        if password.chars().count() < MIN_PASSWORD_LEN {
            return Err(invalid(
                "password",
                "Password must be at least 6 characters",
            ));
        }
        Ok(())
    }
}

fn invalid(field: &str, reason: &str) -> CoreError {
    CoreError::Validation {
        field: field.into(),
        reason: reason.into(),
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::sync::Arc;

    use forgewatch_api::session::{TOKEN_KEY, USER_KEY};
    use forgewatch_api::{MemoryStorage, SessionStorage};

    use super::*;

    fn registration(password: &str, confirm: &str) -> Registration {
        Registration {
            username: "ops".into(),
            email: "ops@plant.io".into(),
            password: SecretString::from(password.to_owned()),
            confirm_password: SecretString::from(confirm.to_owned()),
        }
    }

    #[test]
    fn starts_loading_until_initialized() {
        let ctx = AuthContext::new(SessionStore::in_memory());
        assert!(ctx.is_loading());
        ctx.initialize();
        assert!(!ctx.is_loading());
        assert!(!ctx.is_authenticated());
    }

    #[test]
    fn restores_user_when_token_present() {
        let storage = Arc::new(MemoryStorage::new());
        storage.set(TOKEN_KEY, "tok").unwrap();
        storage.set(USER_KEY, r#"{"username":"ops"}"#).unwrap();

        let ctx = AuthContext::restore(SessionStore::new(storage));
        assert!(ctx.is_authenticated());
        assert_eq!(ctx.user().unwrap().username.as_deref(), Some("ops"));
    }

    #[test]
    fn ignores_user_without_token() {
        let storage = Arc::new(MemoryStorage::new());
        storage.set(USER_KEY, r#"{"username":"ops"}"#).unwrap();

        let ctx = AuthContext::restore(SessionStore::new(storage));
        assert!(!ctx.is_authenticated());
    }

    #[test]
    fn logout_clears_storage_and_notifies() {
        let storage = Arc::new(MemoryStorage::new());
        storage.set(TOKEN_KEY, "tok").unwrap();
        storage.set(USER_KEY, r#"{"username":"ops"}"#).unwrap();
        let ctx = AuthContext::restore(SessionStore::new(storage.clone()));
        let mut rx = ctx.subscribe();

        ctx.logout().unwrap();

        assert!(rx.has_changed().unwrap());
        assert!(!rx.borrow_and_update().is_authenticated());
        assert!(storage.get(TOKEN_KEY).unwrap().is_none());
    }

    #[test]
    fn login_sets_user() {
        let ctx = AuthContext::restore(SessionStore::in_memory());
        ctx.login(User {
            email: Some("a@b.c".into()),
            ..User::default()
        });
        assert!(ctx.is_authenticated());
    }

    #[test]
    fn registration_rejects_mismatch() {
        let err = registration("secret1", "secret2").validate().unwrap_err();
        assert_eq!(err.to_string(), "Passwords do not match");
    }

    #[test]
    fn registration_rejects_short_password() {
        let err = registration("abc", "abc").validate().unwrap_err();
        assert_eq!(err.to_string(), "Password must be at least 6 characters");
    }

    #[test]
    fn registration_accepts_valid() {
        registration("secret1", "secret1").validate().unwrap();
    }
}
