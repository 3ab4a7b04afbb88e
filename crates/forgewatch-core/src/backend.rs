// ── Backend facade ──
//
// Single entry point for the CLI and TUI. Owns the API client and the
// auth context, dispatches dashboard queries to the right endpoint, and
// maps transport errors into `CoreError`.

use std::sync::Arc;

use secrecy::SecretString;
use tracing::{info, warn};

use forgewatch_api::{
    Alert, ApiClient, ChatExchange, Machine, MachineStatistics, Page, RegisterResponse,
    ResourceId, SessionStorage, SessionStore, Severity, User,
};

use crate::auth::{AuthContext, Registration};
use crate::config::BackendConfig;
use crate::dashboard::{MachineQuery, Mode};
use crate::error::CoreError;

/// Cheaply cloneable handle to one backend.
#[derive(Clone)]
pub struct Backend {
    inner: Arc<BackendInner>,
}

struct BackendInner {
    config: BackendConfig,
    client: ApiClient,
    auth: AuthContext,
}

impl Backend {
    /// Build the client and restore the persisted session from `storage`.
    pub fn new(config: BackendConfig, storage: Arc<dyn SessionStorage>) -> Result<Self, CoreError> {
        let session = SessionStore::new(storage);
        let client = ApiClient::new(config.url.clone(), session.clone(), &config.transport())?;
        Ok(Self::with_client(config, client))
    }

    /// Wrap an existing client. Its session store backs the auth context.
    pub fn with_client(config: BackendConfig, client: ApiClient) -> Self {
        let auth = AuthContext::restore(client.session().clone());
        Self {
            inner: Arc::new(BackendInner {
                config,
                client,
                auth,
            }),
        }
    }

    pub fn config(&self) -> &BackendConfig {
        &self.inner.config
    }

    pub fn auth(&self) -> &AuthContext {
        &self.inner.auth
    }

    pub fn client(&self) -> &ApiClient {
        &self.inner.client
    }

    pub fn page_size(&self) -> u32 {
        self.inner.config.page_size
    }

    // ── Session ──────────────────────────────────────────────────────

    /// Log in, persist the session, and make the user current.
    pub async fn login(&self, email: &str, password: &SecretString) -> Result<User, CoreError> {
        let session = self.inner.client.login(email, password).await?;
        self.inner.auth.login(session.user.clone());
        Ok(session.user)
    }

    /// Validate locally, then create the account. Does not log in.
    pub async fn register(&self, registration: &Registration) -> Result<RegisterResponse, CoreError> {
        registration.validate()?;
        let resp = self
            .inner
            .client
            .register(
                registration.username.trim(),
                registration.email.trim(),
                &registration.password,
                &registration.confirm_password,
            )
            .await?;
        info!(username = %registration.username.trim(), "account registered");
        Ok(resp)
    }

    pub fn logout(&self) -> Result<(), CoreError> {
        self.inner.auth.logout()
    }

    /// Fetch the profile and make it current. On failure the cached user
    /// stays in place and the error is returned for display only.
    pub async fn refresh_profile(&self) -> Result<User, CoreError> {
        match self.inner.client.profile().await {
            Ok(user) => {
                self.inner.auth.login(user.clone());
                Ok(user)
            }
            Err(e) => {
                warn!(error = %e, "profile refresh failed, keeping cached user");
                Err(e.into())
            }
        }
    }

    // ── Machines ─────────────────────────────────────────────────────

    /// Run a dashboard query against the endpoint its mode selects.
    pub async fn fetch_machines(&self, query: &MachineQuery) -> Result<Page<Machine>, CoreError> {
        let client = &self.inner.client;
        let (page, limit) = (query.page, query.limit);
        let result = match &query.mode {
            Mode::None => client.list_machines(page, limit).await,
            Mode::Search(term) => client.search_machines(term, page, limit).await,
            Mode::FilterType(t) => client.machines_by_type(*t, page, limit).await,
            Mode::FilterRisk(r) => client.machines_by_risk(*r, page, limit).await,
            Mode::FilterSeverity(s) => client.machines_by_severity(*s, page, limit).await,
        };
        Ok(result?)
    }

    pub async fn machine(&self, machine_id: &str) -> Result<Machine, CoreError> {
        self.inner
            .client
            .machine(machine_id)
            .await
            .map_err(|e| CoreError::from(e).not_found_as("Machine", machine_id))
    }

    pub async fn statistics(&self) -> Result<MachineStatistics, CoreError> {
        Ok(self.inner.client.machine_statistics().await?)
    }

    // ── Alerts ───────────────────────────────────────────────────────

    /// All alerts, or only those of `severity`.
    pub async fn alerts(&self, severity: Option<Severity>) -> Result<Vec<Alert>, CoreError> {
        let client = &self.inner.client;
        let alerts = match severity {
            Some(severity) => client.alerts_by_severity(severity).await?,
            None => client.list_alerts().await?,
        };
        Ok(alerts)
    }

    pub async fn alert(&self, id: &ResourceId) -> Result<Alert, CoreError> {
        let id = id.to_string();
        self.inner
            .client
            .alert(&id)
            .await
            .map_err(|e| CoreError::from(e).not_found_as("Alert", &id))
    }

    pub async fn resolve_alert(&self, id: &ResourceId) -> Result<Option<Alert>, CoreError> {
        let id = id.to_string();
        let updated = self
            .inner
            .client
            .resolve_alert(&id)
            .await
            .map_err(|e| CoreError::from(e).not_found_as("Alert", &id))?;
        info!(alert = %id, "alert resolved");
        Ok(updated)
    }

    // ── Chat ─────────────────────────────────────────────────────────

    pub async fn chat_history(&self) -> Result<Vec<ChatExchange>, CoreError> {
        Ok(self.inner.client.chat_history().await?)
    }

    pub async fn send_chat(&self, prompt: &str) -> Result<String, CoreError> {
        Ok(self.inner.client.generate_reply(prompt).await?)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::sync::Arc;

    use forgewatch_api::MemoryStorage;
    use secrecy::SecretString;

    use super::*;

    fn backend() -> Backend {
        let config = BackendConfig::from_url("http://127.0.0.1:9").unwrap();
        Backend::new(config, Arc::new(MemoryStorage::new())).unwrap()
    }

    #[tokio::test]
    async fn register_validates_before_sending() {
        let registration = Registration {
            username: "ops".into(),
            email: "ops@plant.io".into(),
            password: SecretString::from("secret1".to_owned()),
            confirm_password: SecretString::from("secret2".to_owned()),
        };
        let err = backend().register(&registration).await.unwrap_err();
        assert!(matches!(err, CoreError::Validation { .. }));
        assert_eq!(err.to_string(), "Passwords do not match");
    }

    #[tokio::test]
    async fn queries_without_token_fail_fast() {
        let backend = backend();
        assert!(!backend.auth().is_authenticated());
        let err = backend
            .fetch_machines(&MachineQuery {
                mode: Mode::None,
                page: 1,
                limit: 10,
            })
            .await
            .unwrap_err();
        assert!(err.is_auth());
    }
}
