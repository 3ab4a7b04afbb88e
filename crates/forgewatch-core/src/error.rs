// ── Core error types ──
//
// User-facing errors from forgewatch-core. Consumers see these rather
// than raw HTTP or JSON failures; the `From<forgewatch_api::Error>` impl
// translates transport-layer errors into domain variants.

use thiserror::Error;

/// Unified error type for the core crate.
#[derive(Debug, Error)]
pub enum CoreError {
    // ── Session errors ───────────────────────────────────────────────
    #[error("Not logged in: No authentication token found")]
    NotAuthenticated,

    #[error("Authentication failed: {message}")]
    AuthenticationFailed { message: String },

    #[error("Session storage error: {message}")]
    Storage { message: String },

    // ── Connection errors ────────────────────────────────────────────
    #[error("Cannot reach backend at {url}: {reason}")]
    ConnectionFailed { url: String, reason: String },

    // ── Data errors ──────────────────────────────────────────────────
    #[error("{entity} not found: {identifier}")]
    NotFound { entity: String, identifier: String },

    #[error("Unexpected response from backend: {message}")]
    MalformedResponse { message: String },

    // ── Operation errors ─────────────────────────────────────────────
    #[error("{reason}")]
    Validation { field: String, reason: String },

    #[error("{message}")]
    Api { message: String, status: Option<u16> },

    // ── Configuration errors ─────────────────────────────────────────
    #[error("Configuration error: {message}")]
    Config { message: String },
}

impl CoreError {
    /// `true` when logging in again is the way out.
    pub fn is_auth(&self) -> bool {
        matches!(
            self,
            Self::NotAuthenticated | Self::AuthenticationFailed { .. }
        )
    }

    /// Re-tag a 404 from the backend as a missing entity.
    pub(crate) fn not_found_as(self, entity: &str, identifier: &str) -> Self {
        match self {
            Self::Api {
                status: Some(404), ..
            } => Self::NotFound {
                entity: entity.into(),
                identifier: identifier.into(),
            },
            other => other,
        }
    }
}

// ── Conversion from transport-layer errors ───────────────────────────

impl From<forgewatch_api::Error> for CoreError {
    fn from(err: forgewatch_api::Error) -> Self {
        use forgewatch_api::Error as Api;

        match err {
            Api::MissingToken => Self::NotAuthenticated,
            Api::Authentication { message } => Self::AuthenticationFailed { message },
            Api::Storage(message) => Self::Storage { message },
            Api::Transport(e) => Self::ConnectionFailed {
                url: e
                    .url()
                    .map_or_else(|| "<unknown>".into(), ToString::to_string),
                reason: e.to_string(),
            },
            Api::InvalidUrl(e) => Self::Config {
                message: format!("invalid backend URL: {e}"),
            },
            Api::Tls(message) => Self::Config { message },
            Api::Http { status, message } => Self::Api {
                message,
                status: Some(status),
            },
            Api::MalformedResponse { message } => Self::MalformedResponse { message },
            Api::Deserialization { message, .. } => Self::MalformedResponse { message },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_token_is_auth() {
        let err = CoreError::from(forgewatch_api::Error::MissingToken);
        assert!(err.is_auth());
    }

    #[test]
    fn http_404_retags() {
        let err = CoreError::from(forgewatch_api::Error::Http {
            status: 404,
            message: "gone".into(),
        })
        .not_found_as("Machine", "M_1");
        assert_eq!(err.to_string(), "Machine not found: M_1");
    }

    #[test]
    fn http_message_passes_through() {
        let err = CoreError::from(forgewatch_api::Error::Http {
            status: 500,
            message: "HTTP error! status: 500".into(),
        });
        assert_eq!(err.to_string(), "HTTP error! status: 500");
    }
}
