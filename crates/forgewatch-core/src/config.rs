// ── Runtime backend configuration ──
//
// Describes *where* the backend lives and how to talk to it. The CLI/TUI
// builds a `BackendConfig` from profiles and flags; core never reads files.

use std::path::PathBuf;
use std::time::Duration;

use url::Url;

use forgewatch_api::transport::{TlsMode, TransportConfig};
use forgewatch_api::DEFAULT_PAGE_SIZE;

use crate::error::CoreError;

/// TLS verification strategy.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum TlsVerification {
    /// System CA store (strict).
    #[default]
    SystemDefaults,
    /// Additional CA certificate file.
    CustomCa(PathBuf),
    /// Skip verification (development backends with self-signed certs).
    DangerAcceptInvalid,
}

/// Connection settings for one backend.
#[derive(Debug, Clone)]
pub struct BackendConfig {
    /// Backend root, e.g. [`forgewatch_api::DEFAULT_BASE_URL`].
    pub url: Url,
    pub tls: TlsVerification,
    /// Per-request timeout. `None` waits on the transport.
    pub timeout: Option<Duration>,
    /// Rows per dashboard page.
    pub page_size: u32,
}

impl BackendConfig {
    /// Config for the given URL with default tuning.
    pub fn new(url: Url) -> Self {
        Self {
            url,
            tls: TlsVerification::default(),
            timeout: None,
            page_size: DEFAULT_PAGE_SIZE,
        }
    }

    /// Parse a URL string into a config.
    pub fn from_url(url: &str) -> Result<Self, CoreError> {
        let url = Url::parse(url).map_err(|e| CoreError::Config {
            message: format!("invalid backend URL '{url}': {e}"),
        })?;
        Ok(Self::new(url))
    }

    pub(crate) fn transport(&self) -> TransportConfig {
        TransportConfig {
            tls: match &self.tls {
                TlsVerification::SystemDefaults => TlsMode::System,
                TlsVerification::CustomCa(path) => TlsMode::CustomCa(path.clone()),
                TlsVerification::DangerAcceptInvalid => TlsMode::DangerAcceptInvalid,
            },
            timeout: self.timeout,
        }
    }
}
