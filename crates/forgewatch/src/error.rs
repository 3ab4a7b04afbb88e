//! CLI error types with miette diagnostics.
//!
//! Maps `CoreError` and `ConfigError` into user-facing errors with
//! actionable help text and stable exit codes.

use miette::Diagnostic;
use thiserror::Error;

use forgewatch_config::ConfigError;
use forgewatch_core::CoreError;

/// Process exit codes.
pub mod exit_code {
    pub const GENERAL: i32 = 1;
    pub const USAGE: i32 = 2;
    pub const AUTH: i32 = 3;
    pub const NOT_FOUND: i32 = 4;
    pub const VALIDATION: i32 = 5;
    pub const API: i32 = 6;
    pub const CONNECTION: i32 = 7;
    pub const CONFIG: i32 = 9;
}

#[derive(Debug, Error, Diagnostic)]
pub enum CliError {
    // ── Connection ───────────────────────────────────────────────────
    #[error("Could not reach the backend at {url}")]
    #[diagnostic(
        code(forgewatch::connection_failed),
        help(
            "Check the backend URL and your network connection.\n\
             Reason: {reason}\n\
             Try: forgewatch --api-url <URL> machines stats"
        )
    )]
    ConnectionFailed { url: String, reason: String },

    // ── Authentication ───────────────────────────────────────────────
    #[error("Not logged in")]
    #[diagnostic(
        code(forgewatch::not_logged_in),
        help("Run: forgewatch login --profile {profile}")
    )]
    NotLoggedIn { profile: String },

    #[error("{message}")]
    #[diagnostic(
        code(forgewatch::auth_failed),
        help(
            "Your session may have expired or the credentials are wrong.\n\
             Run: forgewatch login --profile {profile}"
        )
    )]
    AuthFailed { message: String, profile: String },

    // ── Resources ────────────────────────────────────────────────────
    #[error("{resource_type} '{identifier}' not found")]
    #[diagnostic(
        code(forgewatch::not_found),
        help("Run: forgewatch {list_command} to see available {resource_type}s")
    )]
    NotFound {
        resource_type: String,
        identifier: String,
        list_command: String,
    },

    // ── API ──────────────────────────────────────────────────────────
    #[error("{message}")]
    #[diagnostic(code(forgewatch::api_error))]
    ApiError { message: String, status: Option<u16> },

    #[error("Unexpected response from backend: {message}")]
    #[diagnostic(
        code(forgewatch::malformed_response),
        help("Run with -vv to see the request and response details.")
    )]
    MalformedResponse { message: String },

    // ── Validation ───────────────────────────────────────────────────
    #[error("Invalid value for {field}: {reason}")]
    #[diagnostic(code(forgewatch::validation))]
    Validation { field: String, reason: String },

    // ── Configuration ────────────────────────────────────────────────
    #[error("Configuration error: {message}")]
    #[diagnostic(
        code(forgewatch::config),
        help("Inspect it with: forgewatch config show\nOr rebuild it with: forgewatch config init")
    )]
    Config { message: String },

    #[error("Session storage error: {message}")]
    #[diagnostic(
        code(forgewatch::session_storage),
        help("Switch storage with: forgewatch config set session_store file")
    )]
    Storage { message: String },

    // ── Interactive ──────────────────────────────────────────────────
    #[error("Operation '{action}' requires confirmation")]
    #[diagnostic(
        code(forgewatch::confirmation_required),
        help("Use --yes (-y) to skip confirmation in non-interactive contexts.")
    )]
    NonInteractiveRequiresYes { action: String },

    // ── IO / Serialization ───────────────────────────────────────────
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl CliError {
    /// Map this error to an exit code for process termination.
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::ConnectionFailed { .. } => exit_code::CONNECTION,
            Self::NotLoggedIn { .. } | Self::AuthFailed { .. } => exit_code::AUTH,
            Self::NotFound { .. } => exit_code::NOT_FOUND,
            Self::Validation { .. } => exit_code::VALIDATION,
            Self::ApiError { .. } | Self::MalformedResponse { .. } => exit_code::API,
            Self::Config { .. } | Self::Storage { .. } => exit_code::CONFIG,
            Self::NonInteractiveRequiresYes { .. } => exit_code::USAGE,
            Self::Io(_) => exit_code::GENERAL,
        }
    }

    /// Attach the active profile name to auth errors for the help text.
    pub fn for_profile(self, name: &str) -> Self {
        match self {
            Self::NotLoggedIn { .. } => Self::NotLoggedIn {
                profile: name.into(),
            },
            Self::AuthFailed { message, .. } => Self::AuthFailed {
                message,
                profile: name.into(),
            },
            other => other,
        }
    }
}

// ── CoreError → CliError mapping ─────────────────────────────────────

impl From<CoreError> for CliError {
    fn from(err: CoreError) -> Self {
        match err {
            CoreError::NotAuthenticated => Self::NotLoggedIn {
                profile: "default".into(),
            },
            CoreError::AuthenticationFailed { message } => Self::AuthFailed {
                message,
                profile: "default".into(),
            },
            CoreError::Storage { message } => Self::Storage { message },
            CoreError::ConnectionFailed { url, reason } => Self::ConnectionFailed { url, reason },
            CoreError::NotFound { entity, identifier } => Self::NotFound {
                list_command: format!("{} list", entity.to_lowercase()),
                resource_type: entity,
                identifier,
            },
            CoreError::MalformedResponse { message } => Self::MalformedResponse { message },
            CoreError::Validation { field, reason } => Self::Validation { field, reason },
            CoreError::Api { message, status } => Self::ApiError { message, status },
            CoreError::Config { message } => Self::Config { message },
        }
    }
}

impl From<ConfigError> for CliError {
    fn from(err: ConfigError) -> Self {
        match err {
            ConfigError::Validation { field, reason } => Self::Validation { field, reason },
            ConfigError::Io(e) => Self::Io(e),
            ConfigError::Storage(message) => Self::Storage { message },
            other => Self::Config {
                message: other.to_string(),
            },
        }
    }
}
