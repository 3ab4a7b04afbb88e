//! Config subcommand handlers.

use dialoguer::{Input, Select};
use url::Url;

use forgewatch_core::DEFAULT_BASE_URL;

use crate::cli::{ConfigArgs, ConfigCommand, GlobalOpts};
use crate::config::{self, Config, Profile, SessionStoreKind};
use crate::error::CliError;
use crate::output;

use super::util::prompt_err;

// ── Helpers ─────────────────────────────────────────────────────────

fn store_label(kind: SessionStoreKind) -> &'static str {
    match kind {
        SessionStoreKind::File => "file",
        SessionStoreKind::Keyring => "keyring",
        SessionStoreKind::Memory => "memory",
    }
}

fn parse_store(value: &str) -> Result<SessionStoreKind, CliError> {
    match value {
        "file" => Ok(SessionStoreKind::File),
        "keyring" => Ok(SessionStoreKind::Keyring),
        "memory" => Ok(SessionStoreKind::Memory),
        _ => Err(CliError::Validation {
            field: "session_store".into(),
            reason: "must be 'file', 'keyring', or 'memory'".into(),
        }),
    }
}

fn validate_url(value: &str) -> Result<(), CliError> {
    Url::parse(value).map(|_| ()).map_err(|e| CliError::Validation {
        field: "api_url".into(),
        reason: format!("invalid URL: {e}"),
    })
}

/// Format config for display. Nothing in a profile is secret; tokens
/// live in session storage, never in the config file.
fn format_config(cfg: &Config) -> String {
    use std::fmt::Write;
    let mut out = String::new();

    if let Some(ref default) = cfg.default_profile {
        let _ = writeln!(out, "default_profile = \"{default}\"");
    }
    let _ = writeln!(out);
    let _ = writeln!(out, "[defaults]");
    let _ = writeln!(out, "output = \"{}\"", cfg.defaults.output);
    let _ = writeln!(out, "color = \"{}\"", cfg.defaults.color);
    let _ = writeln!(out, "page_size = {}", cfg.defaults.page_size);
    if let Some(timeout) = cfg.defaults.timeout {
        let _ = writeln!(out, "timeout = {timeout}");
    }

    let mut names: Vec<_> = cfg.profiles.keys().collect();
    names.sort();
    for name in names {
        let p = &cfg.profiles[name];
        let _ = writeln!(out);
        let _ = writeln!(out, "[profiles.{name}]");
        let _ = writeln!(out, "api_url = \"{}\"", p.api_url);
        if let Some(ref email) = p.email {
            let _ = writeln!(out, "email = \"{email}\"");
        }
        let _ = writeln!(out, "session_store = \"{}\"", store_label(p.session_store));
        if let Some(ref ca) = p.ca_cert {
            let _ = writeln!(out, "ca_cert = \"{}\"", ca.display());
        }
        if let Some(insecure) = p.insecure {
            let _ = writeln!(out, "insecure = {insecure}");
        }
        if let Some(timeout) = p.timeout {
            let _ = writeln!(out, "timeout = {timeout}");
        }
    }

    out
}

/// Apply `key = value` to a profile.
fn apply(profile: &mut Profile, key: &str, value: String) -> Result<(), CliError> {
    match key {
        "api_url" | "api-url" => {
            validate_url(&value)?;
            profile.api_url = value;
        }
        "email" => profile.email = Some(value),
        "session_store" | "session-store" => profile.session_store = parse_store(&value)?,
        "ca_cert" | "ca-cert" => profile.ca_cert = Some(value.into()),
        "insecure" => {
            profile.insecure = Some(value.parse().map_err(|_| CliError::Validation {
                field: "insecure".into(),
                reason: "must be 'true' or 'false'".into(),
            })?);
        }
        "timeout" => {
            profile.timeout = Some(value.parse().map_err(|_| CliError::Validation {
                field: "timeout".into(),
                reason: "must be a number (seconds)".into(),
            })?);
        }
        other => {
            return Err(CliError::Validation {
                field: other.into(),
                reason: format!(
                    "unknown config key '{other}'. Valid keys: api_url, email, \
                     session_store, ca_cert, insecure, timeout"
                ),
            });
        }
    }
    Ok(())
}

// ── Handler ─────────────────────────────────────────────────────────

pub fn handle(args: ConfigArgs, global: &GlobalOpts) -> Result<(), CliError> {
    match args.command {
        ConfigCommand::Init => {
            let config_path = config::config_path();
            eprintln!("forgewatch configuration wizard");
            eprintln!("   Config path: {}\n", config_path.display());

            let profile_name: String = Input::new()
                .with_prompt("Profile name")
                .default("default".into())
                .interact_text()
                .map_err(prompt_err)?;

            let api_url: String = Input::new()
                .with_prompt("Backend URL")
                .default(DEFAULT_BASE_URL.into())
                .validate_with(|v: &String| Url::parse(v).map(|_| ()).map_err(|e| e.to_string()))
                .interact_text()
                .map_err(prompt_err)?;

            let email: String = Input::new()
                .with_prompt("Email (optional)")
                .allow_empty(true)
                .interact_text()
                .map_err(prompt_err)?;

            let stores = &[
                "File in the data directory (default)",
                "System keyring",
                "Memory only (log in every run)",
            ];
            let store = match Select::new()
                .with_prompt("Where should the session token be kept?")
                .items(stores)
                .default(0)
                .interact()
                .map_err(prompt_err)?
            {
                1 => SessionStoreKind::Keyring,
                2 => SessionStoreKind::Memory,
                _ => SessionStoreKind::File,
            };

            let profile = Profile {
                api_url,
                email: (!email.trim().is_empty()).then(|| email.trim().to_owned()),
                session_store: store,
                ..Profile::default()
            };

            // Keep other profiles when re-running the wizard.
            let mut cfg = config::load_config_or_default();
            cfg.profiles.insert(profile_name.clone(), profile);
            cfg.default_profile = Some(profile_name.clone());

            config::save_config(&cfg)?;

            eprintln!("\n✓ Configuration written to {}", config_path.display());
            eprintln!("  Active profile: {profile_name}");
            eprintln!("\n  Next: forgewatch login");
            Ok(())
        }

        ConfigCommand::Show => {
            let cfg = config::load_config_or_default();
            let out = output::render_single(&global.output, &cfg, format_config, |_| {
                "config".into()
            });
            output::print_output(&out, global.quiet);
            Ok(())
        }

        ConfigCommand::Set { key, value } => {
            let mut cfg = config::load_config_or_default();
            let profile_name = config::active_profile_name(global, &cfg);

            let profile = cfg.profiles.entry(profile_name.clone()).or_default();
            apply(profile, &key, value)?;

            config::save_config(&cfg)?;
            eprintln!("✓ Set {key} on profile '{profile_name}'");
            Ok(())
        }

        ConfigCommand::Path => {
            println!("{}", config::config_path().display());
            Ok(())
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn set_known_keys() {
        let mut p = Profile::default();
        apply(&mut p, "api_url", "http://localhost:8000".into()).unwrap();
        apply(&mut p, "session-store", "keyring".into()).unwrap();
        apply(&mut p, "timeout", "15".into()).unwrap();
        apply(&mut p, "insecure", "true".into()).unwrap();
        assert_eq!(p.api_url, "http://localhost:8000");
        assert_eq!(p.session_store, SessionStoreKind::Keyring);
        assert_eq!(p.timeout, Some(15));
        assert_eq!(p.insecure, Some(true));
    }

    #[test]
    fn set_rejects_bad_values() {
        let mut p = Profile::default();
        assert!(apply(&mut p, "api_url", "not a url".into()).is_err());
        assert!(apply(&mut p, "session_store", "vault".into()).is_err());
        assert!(apply(&mut p, "timeout", "soon".into()).is_err());
        assert!(apply(&mut p, "colour", "red".into()).is_err());
    }

    #[test]
    fn show_lists_profiles_sorted() {
        let mut cfg = Config::default();
        cfg.profiles.insert("staging".into(), Profile::default());
        cfg.profiles.insert(
            "lab".into(),
            Profile {
                email: Some("ops@example.com".into()),
                ..Profile::default()
            },
        );
        let text = format_config(&cfg);
        let lab = text.find("[profiles.lab]").unwrap();
        let staging = text.find("[profiles.staging]").unwrap();
        assert!(lab < staging);
        assert!(text.contains("email = \"ops@example.com\""));
        assert!(text.contains("session_store = \"file\""));
    }
}
