use thiserror::Error;

/// Top-level error type for the `forgewatch-api` crate.
///
/// Mirrors the four failure classes a dashboard client can hit: a missing
/// session token, a non-2xx response, a response that decodes but does not
/// carry what the endpoint promises, and transport failures.
/// `forgewatch-core` maps these into user-facing diagnostics.
#[derive(Debug, Error)]
pub enum Error {
    // ── Session ─────────────────────────────────────────────────────
    /// No bearer token in session storage. Raised before any request is sent.
    #[error("No authentication token found")]
    MissingToken,

    /// Backend rejected the credentials or the token (HTTP 401/403).
    #[error("Authentication failed: {message}")]
    Authentication { message: String },

    /// Reading or writing session storage failed.
    #[error("Session storage error: {0}")]
    Storage(String),

    // ── Transport ───────────────────────────────────────────────────
    /// HTTP transport error (connection refused, DNS failure, etc.)
    #[error("HTTP transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// URL parsing error.
    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    /// TLS setup or certificate error.
    #[error("TLS error: {0}")]
    Tls(String),

    // ── Backend ─────────────────────────────────────────────────────
    /// Non-2xx response. `message` is the backend's `message` field when
    /// present, otherwise a generic status line.
    #[error("{message}")]
    Http { status: u16, message: String },

    /// 2xx response that is missing a field the endpoint requires.
    #[error("{message}")]
    MalformedResponse { message: String },

    // ── Data ────────────────────────────────────────────────────────
    /// JSON deserialization failed, with the raw body for debugging.
    #[error("Deserialization error: {message}")]
    Deserialization { message: String, body: String },
}

impl Error {
    /// Returns `true` if the request never left the client because no
    /// token was stored.
    pub fn is_missing_token(&self) -> bool {
        matches!(self, Self::MissingToken)
    }

    /// Returns `true` if logging in again might resolve this error.
    pub fn is_auth_expired(&self) -> bool {
        matches!(self, Self::MissingToken | Self::Authentication { .. })
    }

    /// Returns `true` if this is a "not found" error.
    pub fn is_not_found(&self) -> bool {
        self.status() == Some(404)
    }

    /// The HTTP status code that produced this error, if any.
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Http { status, .. } => Some(*status),
            Self::Transport(e) => e.status().map(|s| s.as_u16()),
            _ => None,
        }
    }
}
