//! CLI configuration: thin wrapper around `forgewatch_config` shared types.
//!
//! Re-exports the shared types and adds resolution that respects
//! `GlobalOpts` flag overrides (--api-url, --insecure, --timeout).

use std::time::Duration;

use forgewatch_core::{BackendConfig, TlsVerification};

use crate::cli::GlobalOpts;
use crate::error::CliError;

// ── Re-exports from shared crate ────────────────────────────────────

pub use forgewatch_config::{
    Config, Profile, SessionStoreKind, config_path, load_config, load_config_or_default,
    save_config, session_storage,
};

// ── CLI-specific helpers ────────────────────────────────────────────

/// Resolve the active profile name from CLI flags and config.
pub fn active_profile_name(global: &GlobalOpts, config: &Config) -> String {
    config.profile_name(global.profile.as_deref())
}

/// The active profile with every flag override applied.
pub struct Resolved {
    pub name: String,
    pub profile: Profile,
    pub backend: BackendConfig,
}

/// Translate the active profile + global flags into a `BackendConfig`.
///
/// Flags take priority over profile values, which take priority over
/// the `[defaults]` table.
pub fn resolve(global: &GlobalOpts, cfg: &Config) -> Result<Resolved, CliError> {
    let name = active_profile_name(global, cfg);
    let mut profile = cfg.profile_or_default(&name);

    // 1. Backend URL (flag > env > profile)
    if let Some(ref url) = global.api_url {
        profile.api_url.clone_from(url);
    }

    let mut backend = forgewatch_config::profile_to_backend_config(&profile, &cfg.defaults)?;

    // 2. TLS
    if global.insecure {
        backend.tls = TlsVerification::DangerAcceptInvalid;
    }

    // 3. Timeout
    if let Some(secs) = global.timeout {
        backend.timeout = Some(Duration::from_secs(secs));
    }

    Ok(Resolved {
        name,
        profile,
        backend,
    })
}
